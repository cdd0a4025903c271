//! Lifecycle phases and the engine-aware object.
//!
//! Every container (engine, managers, scenes, entities, components) walks the
//! same state machine:
//!
//! ```text
//! created -> on-init -> on-load -> on-start
//!         -> [on-frame-start -> on-update -> on-after-update -> on-render -> on-frame-end]*
//!         -> on-unload -> on-destroy -> on-end
//! ```
//!
//! Transitions are driven top-down by the owner of an object. Each hook
//! records its phase on the object before fanning out to children, so a
//! failure in the middle of a fan-out leaves a deterministic trail.

use std::fmt;

use crate::ider::EngineId;
use crate::object::{Flags, ObjectCore};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The last lifecycle hook an object went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Created,
    Init,
    Create,
    Load,
    Start,
    Active,
    Run,
    FrameStart,
    Update,
    AfterUpdate,
    Render,
    FrameEnd,
    SwapFrom,
    SwapBack,
    Unload,
    Destroy,
    Cleanup,
    End,
}

impl Phase {
    /// The phase name as it appears in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Created => "created",
            Phase::Init => "on-init",
            Phase::Create => "on-create",
            Phase::Load => "on-load",
            Phase::Start => "on-start",
            Phase::Active => "on-active",
            Phase::Run => "on-run",
            Phase::FrameStart => "on-frame-start",
            Phase::Update => "on-update",
            Phase::AfterUpdate => "on-after-update",
            Phase::Render => "on-render",
            Phase::FrameEnd => "on-frame-end",
            Phase::SwapFrom => "on-swap-from",
            Phase::SwapBack => "on-swap-back",
            Phase::Unload => "on-unload",
            Phase::Destroy => "on-destroy",
            Phase::Cleanup => "on-cleanup",
            Phase::End => "on-end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EngineObject
// ---------------------------------------------------------------------------

/// A lifecycle object that knows which engine it belongs to and the last
/// phase it went through.
///
/// The engine back-reference is an id, never an owning handle. It is
/// assigned by the owner that attaches the object and cleared when the
/// object is removed.
#[derive(Debug, Clone)]
pub struct EngineObject<I> {
    core: ObjectCore<I>,
    engine: Option<EngineId>,
    phase: Phase,
}

impl<I: Copy> EngineObject<I> {
    /// Create a detached object in [`Phase::Created`].
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            core: ObjectCore::new(id, name),
            engine: None,
            phase: Phase::Created,
        }
    }

    /// The underlying lifecycle object.
    pub fn core(&self) -> &ObjectCore<I> {
        &self.core
    }

    /// Mutable access to the underlying lifecycle object.
    pub fn core_mut(&mut self) -> &mut ObjectCore<I> {
        &mut self.core
    }

    /// Shorthand for `core().id()`.
    pub fn id(&self) -> I {
        self.core.id()
    }

    /// Shorthand for `core().name()`.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    /// Shorthand for `core().flags()`.
    pub fn flags(&self) -> Flags {
        self.core.flags()
    }

    /// Shorthand for `core_mut().flags_mut()`.
    pub fn flags_mut(&mut self) -> &mut Flags {
        self.core.flags_mut()
    }

    /// The last phase recorded by a lifecycle hook.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Record that the object entered `phase`.
    pub fn record(&mut self, phase: Phase) {
        self.phase = phase;
    }

    // -- engine back-reference ----------------------------------------------

    /// The engine this object is attached to, if any.
    pub fn engine(&self) -> Option<EngineId> {
        self.engine
    }

    /// Attach the object to `engine`. An object already attached keeps its
    /// engine; passing `None` is a no-op.
    pub fn attach_engine(&mut self, engine: Option<EngineId>) {
        if self.engine.is_none() {
            self.engine = engine;
        }
    }

    /// Clear the engine back-reference.
    pub fn detach_engine(&mut self) {
        self.engine = None;
    }

    // -- flag shortcuts -----------------------------------------------------

    pub fn is_loaded(&self) -> bool {
        self.core.flags().loaded
    }

    pub fn is_started(&self) -> bool {
        self.core.flags().started
    }

    pub fn is_active(&self) -> bool {
        self.core.flags().active
    }

    pub fn is_visible(&self) -> bool {
        self.core.flags().visible
    }

    /// Set the `active` flag.
    pub fn set_active(&mut self, active: bool) {
        self.core.flags_mut().active = active;
    }

    /// Set the `visible` flag.
    pub fn set_visible(&mut self, visible: bool) {
        self.core.flags_mut().visible = visible;
    }

    /// Clear `loaded` and `started`, as every unload/destroy path does.
    pub fn reset_load_state(&mut self) {
        let flags = self.core.flags_mut();
        flags.loaded = false;
        flags.started = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ider::SceneId;

    #[test]
    fn new_object_is_created_and_detached() {
        let object = EngineObject::new(SceneId::from_raw(3), "level-1");
        assert_eq!(object.phase(), Phase::Created);
        assert_eq!(object.phase().to_string(), "created");
        assert!(object.engine().is_none());
        assert_eq!(object.name(), "level-1");
    }

    #[test]
    fn engine_is_assigned_at_most_once() {
        let mut object = EngineObject::new(SceneId::from_raw(3), "level-1");
        let first = EngineId::from_raw(100);
        let second = EngineId::from_raw(200);
        object.attach_engine(Some(first));
        object.attach_engine(Some(second));
        assert_eq!(object.engine(), Some(first));
        object.detach_engine();
        assert!(object.engine().is_none());
        object.attach_engine(Some(second));
        assert_eq!(object.engine(), Some(second));
    }

    #[test]
    fn record_tracks_last_phase() {
        let mut object = EngineObject::new(SceneId::from_raw(3), "level-1");
        object.record(Phase::Init);
        object.record(Phase::End);
        assert_eq!(object.phase(), Phase::End);
        assert_eq!(object.phase().as_str(), "on-end");
    }

    #[test]
    fn reset_load_state_clears_loaded_and_started() {
        let mut object = EngineObject::new(SceneId::from_raw(3), "level-1");
        object.flags_mut().loaded = true;
        object.flags_mut().started = true;
        object.set_active(true);
        object.reset_load_state();
        assert!(!object.is_loaded());
        assert!(!object.is_started());
        assert!(object.is_active());
    }
}
