//! Delegate/callback event system.
//!
//! The [`DelegateManager`] owns every [`Delegate`] (named event source) and
//! every [`Callback`] (subscription) in the engine. Delegates are created by
//! components, callbacks are registered by components, and both are deleted
//! explicitly by the component that created them.
//!
//! # Dispatch
//!
//! [`DelegateManager::trigger_delegate_for`] walks the callbacks registered on
//! a delegate in registration order and picks the first *eligible* one:
//!
//! - a callback on a delegate sourced in a scene other than the active one is
//!   skipped (delegates sourced by the system are always eligible);
//! - when an entity filter is given, a callback whose target entity (the
//!   entity of the delegate's source) is not in the filter is skipped.
//!
//! An immediate trigger runs that callback synchronously. A deferred trigger
//! clones it with the arguments and queues it; the queue is drained in FIFO
//! order by [`DelegateManager::on_update`], which the engine runs after every
//! other manager has updated. Both modes stop after the first eligible
//! callback.
//!
//! Callbacks receive the [`CommandBuffer`] owned by the manager. Commands they
//! queue are drained by the engine at the after-update boundary.

pub mod args;
pub mod callback;
pub mod command;
pub mod delegate;

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::component::ComponentKind;
use crate::ider::{CallbackId, DelegateId, EngineId, EntityId, ManagerId, SceneId};
use crate::lifecycle::{EngineObject, Phase};

pub use args::EventArgs;
pub use callback::{signature, Callback, Signature};
pub use command::{ApplyReport, Command, CommandBuffer, SceneSwitch};
pub use delegate::{Delegate, EventOwner};

/// Event raised when two colliders overlap.
pub const ON_COLLISION: &str = "on-collision";
/// Event raised when an entity is destroyed by its scene.
pub const ON_DESTROY: &str = "on-destroy";
/// Event raised when an entity is loaded by its scene.
pub const ON_LOAD: &str = "on-load";

// ---------------------------------------------------------------------------
// DefaultDelegates
// ---------------------------------------------------------------------------

/// The standing system delegates created by [`DelegateManager::on_init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDelegates {
    pub collision: DelegateId,
    pub destroy: DelegateId,
    pub load: DelegateId,
}

impl DefaultDelegates {
    /// The default delegate for one of [`ON_COLLISION`], [`ON_DESTROY`] or
    /// [`ON_LOAD`].
    pub fn for_event(&self, event_name: &str) -> Option<DelegateId> {
        match event_name {
            ON_COLLISION => Some(self.collision),
            ON_DESTROY => Some(self.destroy),
            ON_LOAD => Some(self.load),
            _ => None,
        }
    }

    pub fn contains(&self, delegate: DelegateId) -> bool {
        delegate == self.collision || delegate == self.destroy || delegate == self.load
    }
}

// ---------------------------------------------------------------------------
// DelegateQuery
// ---------------------------------------------------------------------------

/// Lookup key for a delegate by its source.
///
/// `entity` and `kind` must match the delegate source exactly, so a query
/// with both unset finds system delegates. `event_name` narrows the match
/// when the source owns several delegates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DelegateQuery {
    pub entity: Option<EntityId>,
    pub kind: Option<ComponentKind>,
    pub event_name: Option<String>,
}

impl DelegateQuery {
    /// Match the delegate of a component kind on an entity.
    pub fn component(entity: EntityId, kind: ComponentKind) -> Self {
        Self {
            entity: Some(entity),
            kind: Some(kind),
            event_name: None,
        }
    }

    /// Match a system delegate by event name.
    pub fn system(event_name: impl Into<String>) -> Self {
        Self {
            entity: None,
            kind: None,
            event_name: Some(event_name.into()),
        }
    }

    /// Narrow the query to one event name.
    pub fn with_event(mut self, event_name: impl Into<String>) -> Self {
        self.event_name = Some(event_name.into());
        self
    }

    fn matches(&self, delegate: &Delegate) -> bool {
        let source = delegate.source();
        source.entity == self.entity
            && source.kind == self.kind
            && self
                .event_name
                .as_deref()
                .map_or(true, |name| name == delegate.event_name())
    }
}

// ---------------------------------------------------------------------------
// DelegateManager
// ---------------------------------------------------------------------------

/// Owner of the delegate table, the callback table and the pending queue.
pub struct DelegateManager {
    object: EngineObject<ManagerId>,
    /// Delegate table keyed by id. Ids are monotonic, so iteration follows
    /// creation order.
    delegates: BTreeMap<DelegateId, Delegate>,
    /// Callbacks per delegate, in registration order.
    callbacks: HashMap<DelegateId, Vec<Callback>>,
    /// Deferred calls waiting for the next drain.
    pending: Vec<Callback>,
    defaults: Option<DefaultDelegates>,
    /// Scene whose subscribers are eligible for dispatch.
    active_scene: Option<SceneId>,
    commands: CommandBuffer,
}

impl DelegateManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(ManagerId::next(), name),
            delegates: BTreeMap::new(),
            callbacks: HashMap::new(),
            pending: Vec::new(),
            defaults: None,
            active_scene: None,
            commands: CommandBuffer::new(),
        }
    }

    pub fn object(&self) -> &EngineObject<ManagerId> {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut EngineObject<ManagerId> {
        &mut self.object
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    // -- delegates ----------------------------------------------------------

    /// Create a delegate owned by `source`. Several delegates may share an
    /// event name as long as their sources differ.
    pub fn create_delegate(&mut self, source: EventOwner, event_name: &str) -> DelegateId {
        let name = format!("{}/{}", self.object.name(), event_name);
        let delegate = Delegate::new(name, source, event_name);
        let id = delegate.id();
        tracing::debug!(
            delegate = %id,
            event = event_name,
            source = ?source.component,
            "delegate created"
        );
        self.delegates.insert(id, delegate);
        id
    }

    /// Remove a delegate from the table. Callbacks registered against it are
    /// left in place; their owners deregister them.
    pub fn delete_delegate(&mut self, delegate: DelegateId) -> Option<Delegate> {
        let removed = self.delegates.remove(&delegate);
        tracing::debug!(delegate = %delegate, found = removed.is_some(), "delegate deleted");
        removed
    }

    pub fn get_delegate(&self, delegate: DelegateId) -> Option<&Delegate> {
        self.delegates.get(&delegate)
    }

    /// All delegates in creation order.
    pub fn delegates(&self) -> impl Iterator<Item = &Delegate> {
        self.delegates.values()
    }

    /// The first delegate, in creation order, whose source matches `query`.
    pub fn find_delegate(&self, query: &DelegateQuery) -> Option<DelegateId> {
        self.delegates
            .values()
            .find(|delegate| query.matches(delegate))
            .map(Delegate::id)
    }

    /// The standing system delegates, once [`on_init`](Self::on_init) ran.
    pub fn defaults(&self) -> Option<DefaultDelegates> {
        self.defaults
    }

    // -- callbacks ----------------------------------------------------------

    /// Register `signature` on `delegate` on behalf of `subscriber`.
    ///
    /// Returns `None` when the delegate is not in the table.
    pub fn register_callback_to_delegate(
        &mut self,
        subscriber: EventOwner,
        delegate: DelegateId,
        signature: Signature,
    ) -> Option<CallbackId> {
        let Some(source) = self.delegates.get(&delegate).map(|d| *d.source()) else {
            tracing::warn!(delegate = %delegate, "register on unknown delegate");
            return None;
        };
        let id = CallbackId::next();
        let name = format!(
            "{}/{}",
            subscriber.component.map_or_else(|| "system".to_owned(), |c| c.to_string()),
            source.component.map_or_else(|| "system".to_owned(), |c| c.to_string()),
        );
        self.callbacks.entry(delegate).or_default().push(Callback {
            id,
            name,
            subscriber,
            target_entity: source.entity,
            target_component: source.component,
            target_scene: source.scene,
            delegate,
            signature,
            pending_args: EventArgs::new(),
        });
        tracing::debug!(delegate = %delegate, callback = %id, "callback registered");
        Some(id)
    }

    /// Remove a callback from a delegate. Returns `false` if it was not
    /// registered there.
    pub fn deregister_callback_from_delegate(
        &mut self,
        delegate: DelegateId,
        callback: CallbackId,
    ) -> bool {
        let Some(callbacks) = self.callbacks.get_mut(&delegate) else {
            return false;
        };
        let Some(index) = callbacks.iter().position(|c| c.id == callback) else {
            return false;
        };
        callbacks.remove(index);
        if callbacks.is_empty() {
            self.callbacks.remove(&delegate);
        }
        tracing::debug!(delegate = %delegate, callback = %callback, "callback deregistered");
        true
    }

    /// Callbacks registered on `delegate`, in registration order.
    pub fn callbacks_for(&self, delegate: DelegateId) -> &[Callback] {
        self.callbacks.get(&delegate).map_or(&[], Vec::as_slice)
    }

    /// Total number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.callbacks.values().map(Vec::len).sum()
    }

    // -- dispatch -----------------------------------------------------------

    /// Trigger `delegate` with no entity filter.
    pub fn trigger_delegate(
        &mut self,
        delegate: DelegateId,
        immediate: bool,
        args: EventArgs,
    ) -> bool {
        self.trigger_delegate_for(delegate, None, immediate, args)
    }

    /// Run or queue the first eligible callback of `delegate`.
    ///
    /// Returns whether a callback was run or queued. Triggering a delegate
    /// without eligible callbacks is a no-op.
    pub fn trigger_delegate_for(
        &mut self,
        delegate: DelegateId,
        entity_filter: Option<&HashSet<EntityId>>,
        immediate: bool,
        args: EventArgs,
    ) -> bool {
        let active_scene = self.active_scene;
        let Some(callback) = self
            .callbacks
            .get(&delegate)
            .into_iter()
            .flatten()
            .find(|callback| is_eligible(callback, active_scene, entity_filter))
        else {
            tracing::trace!(delegate = %delegate, "trigger without eligible callback");
            return false;
        };

        if immediate {
            let signature = Signature::clone(&callback.signature);
            tracing::trace!(delegate = %delegate, callback = %callback.id, "immediate trigger");
            signature(&mut self.commands, &args);
        } else {
            let mut queued = callback.clone();
            queued.pending_args = args;
            tracing::trace!(delegate = %delegate, callback = %queued.id, "deferred trigger");
            self.pending.push(queued);
        }
        true
    }

    /// Number of deferred calls waiting for the next drain.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Set the scene whose delegates are eligible for dispatch.
    pub fn set_active_scene(&mut self, scene: Option<SceneId>) {
        self.active_scene = scene;
    }

    pub fn active_scene(&self) -> Option<SceneId> {
        self.active_scene
    }

    // -- commands -----------------------------------------------------------

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Take every queued command.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.commands.drain()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Attach to the engine and create the standing system delegates.
    pub fn on_init(&mut self, engine: Option<EngineId>) {
        self.object.record(Phase::Init);
        self.object.attach_engine(engine);
        if self.defaults.is_none() {
            let system = EventOwner::system();
            self.defaults = Some(DefaultDelegates {
                collision: self.create_delegate(system, ON_COLLISION),
                destroy: self.create_delegate(system, ON_DESTROY),
                load: self.create_delegate(system, ON_LOAD),
            });
        }
    }

    pub fn on_create(&mut self) {
        self.object.record(Phase::Create);
    }

    pub fn on_start(&mut self) {
        self.object.record(Phase::Start);
        self.object.flags_mut().started = true;
    }

    pub fn on_frame_start(&mut self) {
        self.object.record(Phase::FrameStart);
    }

    /// Drain the pending queue in FIFO order. The queue is empty afterwards.
    pub fn on_update(&mut self) {
        self.object.record(Phase::Update);
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            tracing::trace!(count = pending.len(), "draining deferred callbacks");
        }
        for callback in &pending {
            callback.invoke(&mut self.commands, &callback.pending_args);
        }
    }

    pub fn on_after_update(&mut self) {
        self.object.record(Phase::AfterUpdate);
    }

    pub fn on_render(&mut self) {
        self.object.record(Phase::Render);
    }

    pub fn on_frame_end(&mut self) {
        self.object.record(Phase::FrameEnd);
    }

    /// Drop queued work without touching the tables.
    pub fn on_unload(&mut self) {
        self.object.record(Phase::Unload);
        self.pending.clear();
        self.commands.drain();
        self.object.reset_load_state();
    }

    /// Clear every table, including the system delegates.
    pub fn on_destroy(&mut self) {
        self.object.record(Phase::Destroy);
        self.pending.clear();
        self.commands.drain();
        self.callbacks.clear();
        self.delegates.clear();
        self.defaults = None;
        self.object.reset_load_state();
    }

    pub fn on_cleanup(&mut self) {
        self.object.record(Phase::Cleanup);
    }

    pub fn on_end(&mut self) {
        self.object.record(Phase::End);
    }
}

impl Default for DelegateManager {
    fn default() -> Self {
        Self::new("delegate-manager")
    }
}

impl std::fmt::Debug for DelegateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegateManager")
            .field("name", &self.object.name())
            .field("delegates", &self.delegates.len())
            .field("callbacks", &self.callback_count())
            .field("pending", &self.pending.len())
            .field("active_scene", &self.active_scene)
            .finish()
    }
}

fn is_eligible(
    callback: &Callback,
    active_scene: Option<SceneId>,
    entity_filter: Option<&HashSet<EntityId>>,
) -> bool {
    if let Some(scene) = callback.target_scene {
        if Some(scene) != active_scene {
            return false;
        }
    }
    match entity_filter {
        Some(filter) => callback.target_entity.is_some_and(|entity| filter.contains(&entity)),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
