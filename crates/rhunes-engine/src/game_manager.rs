//! The game manager: a home for game-wide logic outside any scene.
//!
//! The manager walks the same lifecycle as the other managers and forwards a
//! few hooks to an optional user-supplied [`GameLogic`]. It runs before the
//! scene manager in every phase.

use rhunes_core::context::Context;
use rhunes_core::ider::ManagerId;
use rhunes_core::lifecycle::{EngineObject, Phase};

/// Game-wide hooks. Every hook defaults to a no-op.
pub trait GameLogic {
    fn on_start(&mut self, _ctx: &mut Context<'_>) {}

    fn on_update(&mut self, _ctx: &mut Context<'_>) {}

    fn on_after_update(&mut self, _ctx: &mut Context<'_>) {}

    fn on_frame_end(&mut self, _ctx: &mut Context<'_>) {}
}

/// Drives an optional [`GameLogic`] through the engine lifecycle.
pub struct GameManager {
    object: EngineObject<ManagerId>,
    logic: Option<Box<dyn GameLogic>>,
}

impl GameManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(ManagerId::next(), name),
            logic: None,
        }
    }

    pub fn with_logic(mut self, logic: impl GameLogic + 'static) -> Self {
        self.logic = Some(Box::new(logic));
        self
    }

    pub fn set_logic(&mut self, logic: Box<dyn GameLogic>) {
        self.logic = Some(logic);
    }

    pub fn has_logic(&self) -> bool {
        self.logic.is_some()
    }

    pub fn object(&self) -> &EngineObject<ManagerId> {
        &self.object
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    // -- lifecycle ----------------------------------------------------------

    pub fn on_init(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Init);
        self.object.attach_engine(ctx.engine);
    }

    pub fn on_create(&mut self) {
        self.object.record(Phase::Create);
    }

    pub fn on_start(&mut self, ctx: &mut Context<'_>) {
        if self.object.is_started() {
            return;
        }
        self.object.record(Phase::Start);
        if let Some(logic) = self.logic.as_mut() {
            logic.on_start(ctx);
        }
        self.object.flags_mut().started = true;
    }

    pub fn on_frame_start(&mut self) {
        self.object.record(Phase::FrameStart);
    }

    pub fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Update);
        if let Some(logic) = self.logic.as_mut() {
            logic.on_update(ctx);
        }
    }

    pub fn on_after_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::AfterUpdate);
        if let Some(logic) = self.logic.as_mut() {
            logic.on_after_update(ctx);
        }
    }

    pub fn on_render(&mut self) {
        self.object.record(Phase::Render);
    }

    pub fn on_frame_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameEnd);
        if let Some(logic) = self.logic.as_mut() {
            logic.on_frame_end(ctx);
        }
    }

    pub fn on_unload(&mut self) {
        self.object.record(Phase::Unload);
        self.object.reset_load_state();
    }

    pub fn on_destroy(&mut self) {
        self.object.record(Phase::Destroy);
        self.object.reset_load_state();
    }

    pub fn on_cleanup(&mut self) {
        self.object.record(Phase::Cleanup);
    }

    pub fn on_end(&mut self) {
        self.object.record(Phase::End);
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new("game-manager")
    }
}

impl std::fmt::Debug for GameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameManager")
            .field("id", &self.object.id())
            .field("name", &self.name())
            .field("phase", &self.phase())
            .field("logic", &self.logic.is_some())
            .finish()
    }
}
