//! Named event sources.

use crate::component::ComponentKind;
use crate::ider::{ComponentId, DelegateId, EntityId, SceneId};

// ---------------------------------------------------------------------------
// EventOwner
// ---------------------------------------------------------------------------

/// The component side of a delegate or callback.
///
/// Every field is a weak reference by id. A system-level owner (the event
/// system itself) has every field unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOwner {
    /// The owning component.
    pub component: Option<ComponentId>,
    /// The behavior kind of the owning component.
    pub kind: Option<ComponentKind>,
    /// The entity the component is attached to.
    pub entity: Option<EntityId>,
    /// The scene the entity belongs to.
    pub scene: Option<SceneId>,
}

impl EventOwner {
    /// The owner used for delegates and callbacks of the event system itself.
    pub fn system() -> Self {
        Self::default()
    }

    pub fn is_system(&self) -> bool {
        self.component.is_none()
    }
}

// ---------------------------------------------------------------------------
// Delegate
// ---------------------------------------------------------------------------

/// A named, sourced event channel callbacks can subscribe to.
#[derive(Debug, Clone, PartialEq)]
pub struct Delegate {
    id: DelegateId,
    name: String,
    source: EventOwner,
    event_name: String,
}

impl Delegate {
    pub(crate) fn new(
        name: impl Into<String>,
        source: EventOwner,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            id: DelegateId::next(),
            name: name.into(),
            source,
            event_name: event_name.into(),
        }
    }

    pub fn id(&self) -> DelegateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component that created the delegate.
    pub fn source(&self) -> &EventOwner {
        &self.source
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }
}
