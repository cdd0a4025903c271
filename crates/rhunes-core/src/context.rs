//! Services threaded through every lifecycle call.
//!
//! There is no global engine instance. The engine builds a [`Context`] for
//! each phase and passes it down to managers, scenes and entities. Entities
//! narrow it into a [`ComponentContext`] that also exposes the owning
//! entity's id and transform to the component being called.

use crate::event::{CommandBuffer, DelegateManager};
use crate::ider::{EngineId, EntityId, SceneId};
use crate::input::KeyState;
use crate::math::Vec2;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// FrameState
// ---------------------------------------------------------------------------

/// Per-frame inputs supplied by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameState {
    /// Frame counter, starting at `1` for the first frame.
    pub frame: u64,
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
    /// Keys held down this frame.
    pub keys: KeyState,
    /// Width and height of the render surface.
    pub surface_size: Vec2,
}

impl FrameState {
    /// A frame state for a surface of the given size.
    pub fn with_surface_size(width: f32, height: f32) -> Self {
        Self {
            surface_size: Vec2::new(width, height),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Services available to managers, scenes and entities.
pub struct Context<'a> {
    pub engine: Option<EngineId>,
    pub events: &'a mut DelegateManager,
    pub frame: &'a FrameState,
}

impl<'a> Context<'a> {
    pub fn new(
        engine: Option<EngineId>,
        events: &'a mut DelegateManager,
        frame: &'a FrameState,
    ) -> Self {
        Self { engine, events, frame }
    }

    /// A shorter-lived copy of this context.
    pub fn reborrow(&mut self) -> Context<'_> {
        Context {
            engine: self.engine,
            events: &mut *self.events,
            frame: self.frame,
        }
    }

    /// The command buffer callbacks and hooks queue structural changes in.
    pub fn commands(&mut self) -> &mut CommandBuffer {
        self.events.commands_mut()
    }
}

// ---------------------------------------------------------------------------
// ComponentContext
// ---------------------------------------------------------------------------

/// Services available to a component hook.
pub struct ComponentContext<'a> {
    pub engine: Option<EngineId>,
    /// The entity owning the component.
    pub entity: EntityId,
    /// The scene the entity belongs to, if any.
    pub scene: Option<SceneId>,
    /// The owning entity's transform.
    pub transform: &'a mut Transform,
    /// Whether the owning entity asked to be removed once out of bounds.
    pub die_on_out_of_bounds: bool,
    pub events: &'a mut DelegateManager,
    pub frame: &'a FrameState,
}

impl ComponentContext<'_> {
    /// Keys held down this frame.
    pub fn keys(&self) -> &KeyState {
        &self.frame.keys
    }

    /// Width and height of the render surface.
    pub fn surface_size(&self) -> Vec2 {
        self.frame.surface_size
    }

    pub fn commands(&mut self) -> &mut CommandBuffer {
        self.events.commands_mut()
    }
}
