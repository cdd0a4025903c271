//! Components: behavior units attached to exactly one entity.
//!
//! A component is any type implementing [`Component`]. The trait only asks
//! for access to the shared [`ComponentCore`]; every lifecycle hook has a
//! no-op default. Bookkeeping (phase recording, flags, delegate and callback
//! cleanup) is done by the drivers in this module, which the owning entity
//! calls before running the hook, so a component overriding a hook never has
//! to call a base implementation.
//!
//! # Subscriptions
//!
//! Components subscribe to delegates through [`ComponentCore::subscribe`].
//! A subscription names either a concrete delegate, the delegate of a
//! component kind on some entity, or a system delegate by event name. The
//! last two are resolved lazily on every start of the subscriber, so a
//! component can subscribe to a sibling that is not loaded yet.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::context::ComponentContext;
use crate::event::{DelegateManager, DelegateQuery, EventOwner, Signature};
use crate::ider::{CallbackId, ComponentId, DelegateId, EngineId, EntityId, SceneId};
use crate::lifecycle::{EngineObject, Phase};
use crate::math::Rect;
use crate::surface::RenderSurface;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Compile-time stable identifier of a component type.
///
/// Two kinds are equal when they name the same Rust type. The short type
/// name only serves logs.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    /// The unqualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.name)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ---------------------------------------------------------------------------
// AsAny
// ---------------------------------------------------------------------------

/// Upcast to [`Any`] for typed component lookups.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionTarget {
    /// A delegate known at subscription time.
    Delegate(DelegateId),
    /// The delegate of a component kind. `entity: None` means the
    /// subscriber's own entity; `event_name` picks one of several delegates.
    Component {
        entity: Option<EntityId>,
        kind: ComponentKind,
        event_name: Option<String>,
    },
    /// A system delegate, by event name.
    System(String),
}

impl SubscriptionTarget {
    /// The delegate of a sibling component of kind `T`.
    pub fn sibling<T: Component>() -> Self {
        Self::Component {
            entity: None,
            kind: ComponentKind::of::<T>(),
            event_name: None,
        }
    }
}

/// A callback a component wants registered while it is started.
#[derive(Clone)]
pub struct Subscription {
    target: SubscriptionTarget,
    delegate: Option<DelegateId>,
    callback: Option<CallbackId>,
    signature: Signature,
}

impl Subscription {
    pub fn target(&self) -> &SubscriptionTarget {
        &self.target
    }

    /// The resolved delegate, if resolution succeeded.
    pub fn delegate(&self) -> Option<DelegateId> {
        self.delegate
    }

    /// The live callback id, while registered.
    pub fn callback(&self) -> Option<CallbackId> {
        self.callback
    }

    pub fn is_registered(&self) -> bool {
        self.callback.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("target", &self.target)
            .field("delegate", &self.delegate)
            .field("callback", &self.callback)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ComponentCore
// ---------------------------------------------------------------------------

/// State shared by every component.
#[derive(Debug)]
pub struct ComponentCore {
    object: EngineObject<ComponentId>,
    /// Set when the component is attached to an entity.
    kind: Option<ComponentKind>,
    entity: Option<EntityId>,
    scene: Option<SceneId>,
    /// Delegates this component created, by event name, in creation order.
    delegates: Vec<(String, DelegateId)>,
    subscriptions: Vec<Subscription>,
    remove_on_destroy: bool,
}

impl ComponentCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(ComponentId::next(), name),
            kind: None,
            entity: None,
            scene: None,
            delegates: Vec::new(),
            subscriptions: Vec::new(),
            remove_on_destroy: true,
        }
    }

    pub fn object(&self) -> &EngineObject<ComponentId> {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut EngineObject<ComponentId> {
        &mut self.object
    }

    pub fn id(&self) -> ComponentId {
        self.object.id()
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    /// The kind recorded when the component was attached.
    pub fn kind(&self) -> Option<ComponentKind> {
        self.kind
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn engine(&self) -> Option<EngineId> {
        self.object.engine()
    }

    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    pub fn set_active(&mut self, active: bool) {
        self.object.set_active(active);
    }

    pub fn remove_on_destroy(&self) -> bool {
        self.remove_on_destroy
    }

    pub fn set_remove_on_destroy(&mut self, remove_on_destroy: bool) {
        self.remove_on_destroy = remove_on_destroy;
    }

    /// The component as seen by the event system.
    pub fn owner(&self) -> EventOwner {
        EventOwner {
            component: Some(self.id()),
            kind: self.kind,
            entity: self.entity,
            scene: self.scene,
        }
    }

    // -- delegates ----------------------------------------------------------

    /// Create a delegate sourced by this component. It is deleted when the
    /// component unloads.
    pub fn create_delegate(
        &mut self,
        events: &mut DelegateManager,
        event_name: &str,
    ) -> DelegateId {
        let delegate = events.create_delegate(self.owner(), event_name);
        self.delegates.push((event_name.to_owned(), delegate));
        delegate
    }

    /// The first delegate this component created.
    pub fn delegate(&self) -> Option<DelegateId> {
        self.delegates.first().map(|(_, id)| *id)
    }

    /// The delegate created for `event_name`.
    pub fn delegate_for(&self, event_name: &str) -> Option<DelegateId> {
        self.delegates
            .iter()
            .find(|(name, _)| name == event_name)
            .map(|(_, id)| *id)
    }

    pub fn delegates(&self) -> impl Iterator<Item = (&str, DelegateId)> {
        self.delegates.iter().map(|(name, id)| (name.as_str(), *id))
    }

    // -- subscriptions ------------------------------------------------------

    /// Ask for `signature` to be registered on `target` while this component
    /// is started.
    pub fn subscribe(&mut self, target: SubscriptionTarget, signature: Signature) -> &mut Self {
        tracing::debug!(component = %self.id(), target = ?target, "subscription added");
        self.subscriptions.push(Subscription {
            target,
            delegate: None,
            callback: None,
            signature,
        });
        self
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Deregister and forget every subscription to `target`. Returns `false`
    /// if there was none.
    pub fn remove_subscription(
        &mut self,
        events: &mut DelegateManager,
        target: &SubscriptionTarget,
    ) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| {
            if subscription.target != *target {
                return true;
            }
            if let (Some(delegate), Some(callback)) =
                (subscription.delegate, subscription.callback)
            {
                events.deregister_callback_from_delegate(delegate, callback);
            }
            false
        });
        before != self.subscriptions.len()
    }

    // -- attachment ---------------------------------------------------------

    pub(crate) fn attach(
        &mut self,
        kind: ComponentKind,
        entity: EntityId,
        scene: Option<SceneId>,
        engine: Option<EngineId>,
    ) {
        self.kind = Some(kind);
        self.entity = Some(entity);
        self.scene = scene;
        self.object.attach_engine(engine);
    }

    pub(crate) fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
    }

    /// Clear the entity, scene and engine back-references.
    pub(crate) fn detach(&mut self) {
        self.entity = None;
        self.scene = None;
        self.object.detach_engine();
    }

    /// Register every subscription without a live callback, resolving lazy
    /// targets first.
    fn register_subscriptions(&mut self, events: &mut DelegateManager) {
        let owner = self.owner();
        for subscription in &mut self.subscriptions {
            if subscription.callback.is_some() {
                continue;
            }
            if subscription.delegate.is_none() {
                subscription.delegate = resolve(&subscription.target, self.entity, events);
            }
            let Some(delegate) = subscription.delegate else {
                tracing::trace!(
                    component = ?owner.component,
                    target = ?subscription.target,
                    "subscription unresolved"
                );
                continue;
            };
            let signature = Rc::clone(&subscription.signature);
            subscription.callback =
                events.register_callback_to_delegate(owner, delegate, signature);
            let pinned = matches!(subscription.target, SubscriptionTarget::Delegate(_));
            if subscription.callback.is_none() && !pinned {
                subscription.delegate = None;
            }
        }
    }

    /// Deregister callbacks and delete owned delegates.
    fn release(&mut self, events: &mut DelegateManager) {
        for subscription in &mut self.subscriptions {
            if let (Some(delegate), Some(callback)) =
                (subscription.delegate, subscription.callback.take())
            {
                events.deregister_callback_from_delegate(delegate, callback);
            }
            if let SubscriptionTarget::Component { .. } = subscription.target {
                subscription.delegate = None;
            }
        }
        for (_, delegate) in self.delegates.drain(..) {
            events.delete_delegate(delegate);
        }
    }
}

fn resolve(
    target: &SubscriptionTarget,
    own_entity: Option<EntityId>,
    events: &DelegateManager,
) -> Option<DelegateId> {
    match target {
        SubscriptionTarget::Delegate(delegate) => Some(*delegate),
        SubscriptionTarget::Component {
            entity,
            kind,
            event_name,
        } => {
            let query = DelegateQuery {
                entity: Some(entity.or(own_entity)?),
                kind: Some(*kind),
                event_name: event_name.clone(),
            };
            events.find_delegate(&query)
        }
        SubscriptionTarget::System(event_name) => events
            .defaults()
            .and_then(|defaults| defaults.for_event(event_name))
            .or_else(|| events.find_delegate(&DelegateQuery::system(event_name.as_str()))),
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A behavior unit attached to one entity.
///
/// Hooks receive a [`ComponentContext`] exposing the owning entity's
/// transform and the event system. They are only called while the component
/// is active, and per-frame hooks only once it is loaded.
pub trait Component: AsAny {
    fn core(&self) -> &ComponentCore;

    fn core_mut(&mut self) -> &mut ComponentCore;

    /// The behavior kind. At most one component per kind per entity.
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Self>()
    }

    /// The rectangle this component contributes to the collision sweep.
    /// Components returning `Some` make their entity a collider.
    fn collider_rect(&self, _transform: &Transform) -> Option<Rect> {
        None
    }

    fn on_init(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_load(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_start(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_frame_start(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_after_update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_render(&mut self, _ctx: &mut ComponentContext<'_>, _surface: &mut dyn RenderSurface) {}

    fn on_frame_end(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_unload(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_end(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

// ---------------------------------------------------------------------------
// Lifecycle drivers
// ---------------------------------------------------------------------------

pub(crate) fn init(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    let core = component.core_mut();
    core.object.record(Phase::Init);
    core.object.attach_engine(ctx.engine);
    component.on_init(ctx);
}

pub(crate) fn load(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    let core = component.core_mut();
    core.object.record(Phase::Load);
    core.object.attach_engine(ctx.engine);
    core.object.flags_mut().loaded = true;
    tracing::debug!(component = %core.id(), entity = %ctx.entity, "component loaded");
    component.on_load(ctx);
}

/// Start the component once. Later calls only retry unresolved
/// subscriptions.
pub(crate) fn start(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    let started = component.core().object.is_started();
    if !started {
        component.core_mut().object.record(Phase::Start);
        component.on_start(ctx);
    }
    let core = component.core_mut();
    core.register_subscriptions(ctx.events);
    core.object.flags_mut().started = true;
}

pub(crate) fn frame_start(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::FrameStart);
    component.on_frame_start(ctx);
}

pub(crate) fn update(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::Update);
    component.on_update(ctx);
}

pub(crate) fn after_update(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::AfterUpdate);
    component.on_after_update(ctx);
}

pub(crate) fn render(
    component: &mut dyn Component,
    ctx: &mut ComponentContext<'_>,
    surface: &mut dyn RenderSurface,
) {
    component.core_mut().object.record(Phase::Render);
    component.on_render(ctx, surface);
}

pub(crate) fn frame_end(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::FrameEnd);
    component.on_frame_end(ctx);
}

/// Unload the component: run the hook, deregister its callbacks and delete
/// its delegates. Safe to call on an already unloaded component.
pub(crate) fn unload(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::Unload);
    component.on_unload(ctx);
    let core = component.core_mut();
    core.release(ctx.events);
    core.object.reset_load_state();
    tracing::debug!(component = %core.id(), entity = %ctx.entity, "component unloaded");
}

/// Destroy the component. Subscriptions are dropped for good.
pub(crate) fn destroy(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::Destroy);
    component.on_destroy(ctx);
    let core = component.core_mut();
    core.release(ctx.events);
    core.subscriptions.clear();
    core.object.reset_load_state();
}

pub(crate) fn end(component: &mut dyn Component, ctx: &mut ComponentContext<'_>) {
    component.core_mut().object.record(Phase::End);
    component.on_end(ctx);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::context::FrameState;
    use crate::event::{signature, EventArgs};

    #[derive(Debug)]
    struct Emitter {
        core: ComponentCore,
        starts: u32,
    }

    impl Emitter {
        fn new() -> Self {
            Self {
                core: ComponentCore::new("emitter"),
                starts: 0,
            }
        }
    }

    impl Component for Emitter {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn on_load(&mut self, ctx: &mut ComponentContext<'_>) {
            self.core.create_delegate(ctx.events, "emit");
        }

        fn on_start(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.starts += 1;
        }
    }

    struct Listener {
        core: ComponentCore,
    }

    impl Component for Listener {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }
    }

    struct Harness {
        events: DelegateManager,
        frame: FrameState,
        transform: Transform,
        entity: EntityId,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                events: DelegateManager::default(),
                frame: FrameState::default(),
                transform: Transform::default(),
                entity: EntityId::next(),
            }
        }

        fn ctx(&mut self) -> ComponentContext<'_> {
            ComponentContext {
                engine: None,
                entity: self.entity,
                scene: None,
                transform: &mut self.transform,
                die_on_out_of_bounds: false,
                events: &mut self.events,
                frame: &self.frame,
            }
        }

        fn attach(&self, component: &mut dyn Component) {
            let kind = component.kind();
            component.core_mut().attach(kind, self.entity, None, None);
        }
    }

    #[test]
    fn kinds_compare_by_type() {
        let emitter = Emitter::new();
        let boxed: Box<dyn Component> = Box::new(Emitter::new());
        assert_eq!(emitter.kind(), ComponentKind::of::<Emitter>());
        assert_eq!(boxed.kind(), ComponentKind::of::<Emitter>());
        assert_ne!(boxed.kind(), ComponentKind::of::<Listener>());
        assert_eq!(ComponentKind::of::<Emitter>().name(), "Emitter");
        assert_eq!(short_type_name("a::b::Thing<c::D>"), "Thing");
    }

    #[test]
    fn boxed_component_downcasts_to_its_type() {
        let boxed: Box<dyn Component> = Box::new(Emitter::new());
        assert!((*boxed).as_any().downcast_ref::<Emitter>().is_some());
        assert!((*boxed).as_any().downcast_ref::<Listener>().is_none());
    }

    #[test]
    fn start_runs_the_hook_once() {
        let mut harness = Harness::new();
        let mut emitter = Emitter::new();
        harness.attach(&mut emitter);
        load(&mut emitter, &mut harness.ctx());
        start(&mut emitter, &mut harness.ctx());
        start(&mut emitter, &mut harness.ctx());
        assert_eq!(emitter.starts, 1);
        assert!(emitter.core.object().is_started());
        assert_eq!(emitter.core.phase(), Phase::Start);
    }

    #[test]
    fn forward_reference_resolves_once_the_target_loads() {
        let mut harness = Harness::new();
        let hits = Rc::new(Cell::new(0));
        let mut listener = Listener {
            core: ComponentCore::new("listener"),
        };
        let sink = Rc::clone(&hits);
        listener.core.subscribe(
            SubscriptionTarget::sibling::<Emitter>(),
            signature(move |_, _| sink.set(sink.get() + 1)),
        );
        harness.attach(&mut listener);

        load(&mut listener, &mut harness.ctx());
        start(&mut listener, &mut harness.ctx());
        assert!(!listener.core.subscriptions()[0].is_registered());

        let mut emitter = Emitter::new();
        harness.attach(&mut emitter);
        load(&mut emitter, &mut harness.ctx());
        start(&mut listener, &mut harness.ctx());
        let subscription = &listener.core.subscriptions()[0];
        assert!(subscription.is_registered());
        assert_eq!(subscription.delegate(), emitter.core.delegate());

        let delegate = emitter.core.delegate_for("emit").unwrap();
        assert!(harness.events.trigger_delegate(delegate, true, EventArgs::new()));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unload_deregisters_and_deletes_delegates() {
        let mut harness = Harness::new();
        let mut emitter = Emitter::new();
        harness.attach(&mut emitter);
        load(&mut emitter, &mut harness.ctx());
        let delegate = emitter.core.delegate().unwrap();

        let mut listener = Listener {
            core: ComponentCore::new("listener"),
        };
        listener
            .core
            .subscribe(SubscriptionTarget::Delegate(delegate), signature(|_, _| {}));
        harness.attach(&mut listener);
        load(&mut listener, &mut harness.ctx());
        start(&mut listener, &mut harness.ctx());
        assert_eq!(harness.events.callbacks_for(delegate).len(), 1);

        unload(&mut listener, &mut harness.ctx());
        unload(&mut listener, &mut harness.ctx());
        assert!(harness.events.callbacks_for(delegate).is_empty());
        assert!(!listener.core.object().is_loaded());
        assert_eq!(listener.core.subscriptions()[0].delegate(), Some(delegate));

        unload(&mut emitter, &mut harness.ctx());
        assert!(harness.events.get_delegate(delegate).is_none());
        assert!(emitter.core.delegate().is_none());
    }

    #[test]
    fn system_subscription_resolves_by_event_name() {
        let mut harness = Harness::new();
        harness.events.on_init(None);
        let mut listener = Listener {
            core: ComponentCore::new("listener"),
        };
        listener.core.subscribe(
            SubscriptionTarget::System(crate::event::ON_LOAD.to_owned()),
            signature(|_, _| {}),
        );
        harness.attach(&mut listener);
        start(&mut listener, &mut harness.ctx());
        let defaults = harness.events.defaults().unwrap();
        assert_eq!(listener.core.subscriptions()[0].delegate(), Some(defaults.load));
    }

    #[test]
    fn remove_subscription_deregisters_the_callback() {
        let mut harness = Harness::new();
        let delegate = harness.events.create_delegate(EventOwner::system(), "ping");
        let mut listener = Listener {
            core: ComponentCore::new("listener"),
        };
        let target = SubscriptionTarget::Delegate(delegate);
        listener.core.subscribe(target.clone(), signature(|_, _| {}));
        harness.attach(&mut listener);
        start(&mut listener, &mut harness.ctx());
        assert_eq!(harness.events.callbacks_for(delegate).len(), 1);

        assert!(listener.core.remove_subscription(&mut harness.events, &target));
        assert!(!listener.core.remove_subscription(&mut harness.events, &target));
        assert!(harness.events.callbacks_for(delegate).is_empty());
    }
}
