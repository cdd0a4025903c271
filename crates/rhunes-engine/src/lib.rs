//! Rhunes Engine -- the frame loop driving `rhunes-core` scenes.
//!
//! This crate owns the outer loop: it boots the delegate, game and scene
//! managers, ticks a frame clock, polls input, applies the commands queued by
//! callbacks at the after-update boundary and renders the active scene to a
//! [`RenderSurface`](rhunes_core::surface::RenderSurface). It also ships the
//! built-in components (box sprite, 2D collider, key controller, move-to and
//! out-of-bounds).
//!
//! # Quick Start
//!
//! ```
//! use rhunes_engine::prelude::*;
//!
//! let mut scene = Scene::new("level-1");
//! let hero = Entity::new("hero")
//!     .with_transform(Transform::from_rect(Rect::new(10.0, 10.0, 8.0, 8.0)))
//!     .with_component(BoxSprite::new(Color::RED))
//!     .unwrap()
//!     .activated();
//! scene.add_entity(hero);
//!
//! let mut engine = Engine::new(EngineConfig::headless(320, 240))
//!     .with_clock(SteppedClock::at_fps(30))
//!     .with_end_condition(|status| status.frame == 2);
//! engine.add_scene(scene).unwrap();
//!
//! assert_eq!(engine.run().unwrap(), 2);
//! assert_eq!(engine.phase(), Phase::End);
//! assert_eq!(engine.surface().rects().count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod components;
pub mod config;
pub mod engine;
pub mod game_manager;
pub mod input;
pub mod logging;

/// Re-export the core crate for convenience.
pub use rhunes_core;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while booting or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A manager another manager or helper depends on is not installed.
    #[error("'{required_by}' requires the '{manager}' to be installed")]
    MissingManager {
        manager: &'static str,
        required_by: &'static str,
    },

    /// No scene with this id is registered with the scene manager.
    #[error("no scene {0} is registered")]
    UnknownScene(rhunes_core::ider::SceneId),

    /// The engine already ended and cannot run again.
    #[error("the engine has already run to completion")]
    AlreadyRan,

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// A core invariant was violated.
    #[error(transparent)]
    Core(#[from] rhunes_core::CoreError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use rhunes_core::prelude::*;

    pub use crate::clock::{Clock, FixedRateClock, SteppedClock, UnboundedClock};
    pub use crate::components::{
        BoundsSide, BoxSprite, Collider2D, KeyBindings, KeyController, MoveTo, OutOfBounds,
        KEYBOARD_EVENT, OUT_OF_BOUNDS_EVENT,
    };
    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::engine::{EndCondition, Engine, EngineStatus, FrameDiagnostics};
    pub use crate::game_manager::{GameLogic, GameManager};
    pub use crate::input::{InputFrame, InputSource, NoInput, ScriptedInput};
    pub use crate::EngineError;
}
