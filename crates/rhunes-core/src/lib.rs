//! Rhunes core -- lifecycle objects, delegates, entities and scenes.
//!
//! This crate holds the data side of the Rhunes engine: every object walks
//! the same lifecycle state machine, components publish and subscribe to
//! events through the [`DelegateManager`](event::DelegateManager), entities
//! stage their components, scenes stage their entities and sweep colliders,
//! and the [`SceneManager`](scene_manager::SceneManager) keeps one scene
//! active. The frame loop itself lives in `rhunes-engine`.
//!
//! # Quick Start
//!
//! ```
//! use rhunes_core::prelude::*;
//!
//! let mut events = DelegateManager::default();
//! events.on_init(None);
//! let frame = FrameState::with_surface_size(640.0, 480.0);
//! let mut ctx = Context::new(None, &mut events, &frame);
//!
//! let mut scene = Scene::new("level-1");
//! let hero = scene.add_entity(Entity::new("hero").activated());
//! scene.on_load(&mut ctx);
//!
//! assert_eq!(scene.loaded_entities(), &[hero]);
//! assert_eq!(scene.layer(Layer::Middle), &[hero]);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod context;
pub mod entity;
pub mod event;
pub mod ider;
pub mod input;
pub mod lifecycle;
pub mod math;
pub mod object;
pub mod scene;
pub mod scene_manager;
pub mod surface;
pub mod transform;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Invariant violations raised by the core.
///
/// Lookup misses are reported as `None`/`false`, never as errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity already holds a component of this kind.
    #[error("entity {entity} already holds a component of kind '{kind}'")]
    DuplicateComponent {
        entity: ider::EntityId,
        kind: &'static str,
    },

    /// The component is already attached to an entity.
    #[error("component {component} is already attached to entity {entity}")]
    ComponentAlreadyAttached {
        component: ider::ComponentId,
        entity: ider::EntityId,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{
        Component, ComponentCore, ComponentKind, Subscription, SubscriptionTarget,
    };
    pub use crate::context::{ComponentContext, Context, FrameState};
    pub use crate::entity::{ChildLink, Entity, Layer};
    pub use crate::event::{
        signature, ApplyReport, Callback, Command, CommandBuffer, Delegate, DelegateManager,
        DelegateQuery, EventArgs, EventOwner, SceneSwitch, Signature, ON_COLLISION, ON_DESTROY,
        ON_LOAD,
    };
    pub use crate::ider::{
        CallbackId, ComponentId, DelegateId, EngineId, EntityId, ManagerId, SceneId,
    };
    pub use crate::input::{Key, KeyState};
    pub use crate::lifecycle::{EngineObject, Phase};
    pub use crate::math::{Color, Rect, Vec2};
    pub use crate::scene::{Scene, SceneHandler};
    pub use crate::scene_manager::{ActiveScene, SceneManager};
    pub use crate::surface::{DrawCall, RecordingSurface, RenderSurface};
    pub use crate::transform::Transform;
    pub use crate::CoreError;
}
