//! Callback subscriptions.

use std::fmt;
use std::rc::Rc;

use crate::event::args::EventArgs;
use crate::event::command::CommandBuffer;
use crate::event::delegate::EventOwner;
use crate::ider::{CallbackId, ComponentId, DelegateId, EntityId, SceneId};

/// The invocable part of a callback.
///
/// Callbacks receive the trigger arguments and the command buffer through
/// which they request structural changes.
pub type Signature = Rc<dyn Fn(&mut CommandBuffer, &EventArgs)>;

/// Wrap a closure into a [`Signature`].
pub fn signature(f: impl Fn(&mut CommandBuffer, &EventArgs) + 'static) -> Signature {
    Rc::new(f)
}

/// A registered subscription tying a [`Signature`] to a delegate.
#[derive(Clone)]
pub struct Callback {
    pub(crate) id: CallbackId,
    pub(crate) name: String,
    pub(crate) subscriber: EventOwner,
    pub(crate) target_entity: Option<EntityId>,
    pub(crate) target_component: Option<ComponentId>,
    pub(crate) target_scene: Option<SceneId>,
    pub(crate) delegate: DelegateId,
    pub(crate) signature: Signature,
    /// Arguments captured by a deferred trigger.
    pub(crate) pending_args: EventArgs,
}

impl Callback {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component that registered the callback.
    pub fn subscriber(&self) -> &EventOwner {
        &self.subscriber
    }

    /// The entity of the delegate's source component.
    pub fn target_entity(&self) -> Option<EntityId> {
        self.target_entity
    }

    /// The delegate's source component.
    pub fn target_component(&self) -> Option<ComponentId> {
        self.target_component
    }

    /// The scene of the delegate's source component.
    pub fn target_scene(&self) -> Option<SceneId> {
        self.target_scene
    }

    pub fn delegate(&self) -> DelegateId {
        self.delegate
    }

    pub fn pending_args(&self) -> &EventArgs {
        &self.pending_args
    }

    /// Run the signature with the given arguments.
    pub fn invoke(&self, commands: &mut CommandBuffer, args: &EventArgs) {
        (self.signature)(commands, args);
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("subscriber", &self.subscriber)
            .field("target_entity", &self.target_entity)
            .field("target_component", &self.target_component)
            .field("target_scene", &self.target_scene)
            .field("delegate", &self.delegate)
            .field("pending_args", &self.pending_args)
            .finish_non_exhaustive()
    }
}
