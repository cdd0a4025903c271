//! The engine loop.
//!
//! An [`Engine`] owns the managers, the render surface, the frame clock and
//! the input source. A run goes through
//!
//! ```text
//! on-init -> on-create -> on-start -> on-run [frame]* -> on-cleanup -> on-end
//! ```
//!
//! and every frame executes, in order:
//!
//! 1. **frame-start**: advance the frame counter, tick the clock, poll input.
//! 2. **update**: game manager, scene manager, then the delegate manager
//!    drains its deferred queue.
//! 3. **after-update**: apply the commands callbacks queued this frame, then
//!    let scenes flush their staged deletions.
//! 4. **render**: clear the surface, render the active scene, present.
//! 5. **frame-end**, then the end condition is checked.
//!
//! Managers are optional, but the delegate manager is required as soon as a
//! game or scene manager is installed.

use std::fmt;
use std::time::{Duration, Instant};

use rhunes_core::component::Component;
use rhunes_core::context::{Context, FrameState};
use rhunes_core::entity::Entity;
use rhunes_core::event::{ApplyReport, Command, DelegateManager};
use rhunes_core::ider::{EngineId, EntityId, SceneId};
use rhunes_core::lifecycle::{EngineObject, Phase};
use rhunes_core::scene::Scene;
use rhunes_core::scene_manager::SceneManager;
use rhunes_core::surface::{RecordingSurface, RenderSurface};

use crate::clock::{Clock, FixedRateClock, UnboundedClock};
use crate::config::EngineConfig;
use crate::game_manager::GameManager;
use crate::input::{InputSource, NoInput};
use crate::EngineError;

// ---------------------------------------------------------------------------
// EngineStatus
// ---------------------------------------------------------------------------

/// Engine state handed to the end condition once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    /// Frames completed so far.
    pub frame: u64,
    /// Seconds the last frame took.
    pub dt: f32,
    /// Seconds accumulated over every frame.
    pub elapsed: f32,
    /// The scene receiving frame hooks.
    pub active_scene: Option<SceneId>,
    /// A stop was requested by a command or [`Engine::stop`].
    pub stop_requested: bool,
}

/// Predicate ending the run loop after the current frame.
pub type EndCondition = Box<dyn FnMut(&EngineStatus) -> bool>;

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing and command statistics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Time spent in the update phase, deferred drain included.
    pub update_time: Duration,
    /// Time spent applying queued commands.
    pub command_apply_time: Duration,
    /// Time spent in the render phase.
    pub render_time: Duration,
    /// Total wall-clock time of the frame, clock wait excluded.
    pub total_time: Duration,
    /// Outcome of the commands applied this frame.
    pub commands: ApplyReport,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The frame-driven runtime.
pub struct Engine<S: RenderSurface = RecordingSurface> {
    object: EngineObject<EngineId>,
    config: EngineConfig,
    events: Option<DelegateManager>,
    game: Option<GameManager>,
    scenes: Option<SceneManager>,
    surface: S,
    clock: Box<dyn Clock>,
    input: Box<dyn InputSource>,
    end_condition: Option<EndCondition>,
    frame: FrameState,
    elapsed: f32,
    booted: bool,
    running: bool,
    ended: bool,
    stop_requested: bool,
    diagnostics: FrameDiagnostics,
}

impl Engine<RecordingSurface> {
    /// An engine with the standard managers and a headless recording
    /// surface sized from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let surface = RecordingSurface::new(config.width as f32, config.height as f32);
        Self::with_surface(config, surface)
    }

    /// An engine without any manager. Install them with the `with_*`
    /// builders.
    pub fn empty(config: EngineConfig) -> Self {
        let surface = RecordingSurface::new(config.width as f32, config.height as f32);
        Self::bare(config, surface)
    }
}

impl<S: RenderSurface> Engine<S> {
    /// An engine with the standard managers drawing to `surface`.
    pub fn with_surface(config: EngineConfig, surface: S) -> Self {
        Self::bare(config, surface)
            .with_delegate_manager(DelegateManager::default())
            .with_game_manager(GameManager::default())
            .with_scene_manager(SceneManager::default())
    }

    fn bare(config: EngineConfig, surface: S) -> Self {
        let clock: Box<dyn Clock> = if config.headless {
            Box::new(UnboundedClock::new())
        } else {
            Box::new(FixedRateClock::new(config.target_fps))
        };
        let frame = FrameState {
            surface_size: surface.size(),
            ..FrameState::default()
        };
        Self {
            object: EngineObject::new(EngineId::next(), config.name.clone()),
            config,
            events: None,
            game: None,
            scenes: None,
            surface,
            clock,
            input: Box::new(NoInput),
            end_condition: None,
            frame,
            elapsed: 0.0,
            booted: false,
            running: false,
            ended: false,
            stop_requested: false,
            diagnostics: FrameDiagnostics::default(),
        }
    }

    // -- builders -----------------------------------------------------------

    pub fn with_delegate_manager(mut self, manager: DelegateManager) -> Self {
        self.events = Some(manager);
        self
    }

    pub fn with_game_manager(mut self, manager: GameManager) -> Self {
        self.game = Some(manager);
        self
    }

    pub fn with_scene_manager(mut self, manager: SceneManager) -> Self {
        self.scenes = Some(manager);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    /// End the run once `condition` holds after a frame.
    pub fn with_end_condition(
        mut self,
        condition: impl FnMut(&EngineStatus) -> bool + 'static,
    ) -> Self {
        self.end_condition = Some(Box::new(condition));
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> EngineId {
        self.object.id()
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frame.frame
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn events(&self) -> Option<&DelegateManager> {
        self.events.as_ref()
    }

    pub fn events_mut(&mut self) -> Option<&mut DelegateManager> {
        self.events.as_mut()
    }

    pub fn game(&self) -> Option<&GameManager> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GameManager> {
        self.game.as_mut()
    }

    pub fn scenes(&self) -> Option<&SceneManager> {
        self.scenes.as_ref()
    }

    pub fn scenes_mut(&mut self) -> Option<&mut SceneManager> {
        self.scenes.as_mut()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.diagnostics
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            frame: self.frame.frame,
            dt: self.frame.dt,
            elapsed: self.elapsed,
            active_scene: self.scenes.as_ref().and_then(|m| m.active()).map(|a| a.scene),
            stop_requested: self.stop_requested,
        }
    }

    // -- helpers ------------------------------------------------------------

    /// Add a scene to the scene manager.
    pub fn add_scene(&mut self, scene: Scene) -> Result<SceneId, EngineError> {
        let manager = self.scenes.as_mut().ok_or(EngineError::MissingManager {
            manager: "scene-manager",
            required_by: "add_scene",
        })?;
        tracing::debug!(engine = %self.object.name(), scene = %scene.name(), "adding scene");
        Ok(manager.add_scene(scene))
    }

    /// Attach `components` to `entity`, then add it to the scene `scene`.
    /// Components joining an active entity are activated with it.
    ///
    /// A component the entity rejects fails the call with
    /// [`EngineError::Core`] and nothing is added.
    pub fn spawn(
        &mut self,
        scene: SceneId,
        mut entity: Entity,
        components: impl IntoIterator<Item = Box<dyn Component>>,
    ) -> Result<EntityId, EngineError> {
        let manager = self.scenes.as_mut().ok_or(EngineError::MissingManager {
            manager: "scene-manager",
            required_by: "spawn",
        })?;
        let target = manager
            .get_scene_by_id_mut(scene)
            .ok_or(EngineError::UnknownScene(scene))?;
        for component in components {
            entity.add_boxed_component(component)?;
        }
        if entity.is_active() {
            entity.on_active();
        }
        let id = target.add_entity(entity);
        tracing::debug!(
            engine = %self.object.name(),
            scene = %scene,
            entity = %id,
            "entity spawned"
        );
        Ok(id)
    }

    /// Stage `entity` for removal from the active scene and deactivate it.
    /// Returns `false` if the active scene does not hold it.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        let Some(scene) = self.scenes.as_mut().and_then(SceneManager::active_scene_mut) else {
            return false;
        };
        if !scene.remove_entity(entity) {
            return false;
        }
        if let Some(target) = scene.entity_mut(entity) {
            target.set_active(false);
        }
        tracing::debug!(engine = %self.object.name(), entity = %entity, "entity destroyed");
        true
    }

    /// Ask the loop to end after the current frame.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    // -- run loop -----------------------------------------------------------

    /// Run until the end condition holds, a quit is polled or a stop is
    /// requested, then clean up. Returns the number of frames run.
    pub fn run(&mut self) -> Result<u64, EngineError> {
        while self.step()? {}
        self.shutdown()?;
        Ok(self.frame.frame)
    }

    /// Run a single frame, booting the engine first if needed. Returns
    /// whether the loop should keep going.
    pub fn step(&mut self) -> Result<bool, EngineError> {
        if self.ended {
            return Err(EngineError::AlreadyRan);
        }
        if !self.booted {
            self.boot()?;
        }
        self.running = true;

        let quit = self.frame_start();
        let frame_begin = Instant::now();
        let update_begin = Instant::now();
        self.update();
        let update_time = update_begin.elapsed();
        let (commands, command_apply_time) = self.after_update();
        let render_begin = Instant::now();
        self.render();
        let render_time = render_begin.elapsed();
        self.frame_end();
        self.diagnostics = FrameDiagnostics {
            update_time,
            command_apply_time,
            render_time,
            total_time: frame_begin.elapsed(),
            commands,
        };

        let status = self.status();
        let mut done = quit || self.stop_requested;
        if let Some(condition) = self.end_condition.as_mut() {
            if condition(&status) {
                tracing::info!(
                    engine = %self.object.name(),
                    frame = status.frame,
                    "end condition reached"
                );
                done = true;
            }
        }
        if done {
            self.running = false;
            self.stop_requested = false;
        }
        Ok(!done)
    }

    /// Clean up and end the run. The engine cannot run again afterwards.
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.ended {
            return Err(EngineError::AlreadyRan);
        }
        tracing::info!(engine = %self.object.name(), frames = self.frame.frame, "engine exiting");
        self.running = false;

        self.object.record(Phase::Cleanup);
        if let Some(events) = self.events.as_mut() {
            events.on_cleanup();
        }
        if let Some(game) = self.game.as_mut() {
            game.on_cleanup();
        }
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.on_cleanup();
        }

        self.object.record(Phase::End);
        let engine = Some(self.object.id());
        if let Some(events) = self.events.as_mut() {
            events.on_end();
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_end();
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_end(&mut ctx);
            }
        }
        self.ended = true;
        tracing::info!(
            engine = %self.object.name(),
            phase = %self.object.phase().as_str(),
            "engine ended"
        );
        Ok(())
    }

    // -- phases -------------------------------------------------------------

    fn validate(&self) -> Result<(), EngineError> {
        self.config.validate()?;
        if self.events.is_none() {
            if self.game.is_some() {
                return Err(EngineError::MissingManager {
                    manager: "delegate-manager",
                    required_by: "game-manager",
                });
            }
            if self.scenes.is_some() {
                return Err(EngineError::MissingManager {
                    manager: "delegate-manager",
                    required_by: "scene-manager",
                });
            }
        }
        Ok(())
    }

    /// on-init, on-create and on-start across every manager.
    fn boot(&mut self) -> Result<(), EngineError> {
        self.validate()?;
        let engine = Some(self.object.id());
        self.frame.surface_size = self.surface.size();

        self.object.record(Phase::Init);
        if let Some(events) = self.events.as_mut() {
            events.on_init(engine);
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_init(&mut ctx);
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_init(&mut ctx);
            }
        }

        self.object.record(Phase::Create);
        if let Some(events) = self.events.as_mut() {
            events.on_create();
        }
        if let Some(game) = self.game.as_mut() {
            game.on_create();
        }
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.on_create();
        }

        self.object.record(Phase::Start);
        if let Some(events) = self.events.as_mut() {
            events.on_start();
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_start(&mut ctx);
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_start(&mut ctx);
            }
        }
        self.object.flags_mut().started = true;
        self.object.set_active(true);

        self.object.record(Phase::Run);
        self.booted = true;
        tracing::info!(
            engine = %self.object.name(),
            width = self.config.width,
            height = self.config.height,
            headless = self.config.headless,
            "engine started"
        );
        Ok(())
    }

    /// Returns whether the input asked to quit.
    fn frame_start(&mut self) -> bool {
        self.object.record(Phase::FrameStart);
        self.frame.dt = self.clock.tick();
        self.frame.frame += 1;
        self.elapsed += self.frame.dt;
        let input = self.input.poll(self.frame.frame);
        self.frame.keys = input.keys;
        self.frame.surface_size = self.surface.size();
        tracing::trace!(
            engine = %self.object.name(),
            frame = self.frame.frame,
            dt = self.frame.dt,
            "frame start"
        );

        let engine = Some(self.object.id());
        if let Some(events) = self.events.as_mut() {
            events.on_frame_start();
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_frame_start();
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_frame_start(&mut ctx);
            }
        }
        if input.quit {
            tracing::info!(
                engine = %self.object.name(),
                frame = self.frame.frame,
                "quit requested"
            );
        }
        input.quit
    }

    fn update(&mut self) {
        self.object.record(Phase::Update);
        let engine = Some(self.object.id());
        let Some(events) = self.events.as_mut() else {
            return;
        };
        let mut ctx = Context::new(engine, events, &self.frame);
        if let Some(game) = self.game.as_mut() {
            game.on_update(&mut ctx);
        }
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.on_update(&mut ctx);
        }
        ctx.events.on_update();
    }

    fn after_update(&mut self) -> (ApplyReport, Duration) {
        self.object.record(Phase::AfterUpdate);
        let engine = Some(self.object.id());
        let mut report = ApplyReport::default();
        let Some(events) = self.events.as_mut() else {
            return (report, Duration::ZERO);
        };

        let apply_begin = Instant::now();
        let (stops, commands): (Vec<Command>, Vec<Command>) = events
            .take_commands()
            .into_iter()
            .partition(|command| matches!(command, Command::StopEngine));
        if !stops.is_empty() {
            tracing::info!(
                engine = %self.object.name(),
                frame = self.frame.frame,
                "stop requested"
            );
            self.stop_requested = true;
            for _ in &stops {
                report.record(true);
            }
        }

        events.on_after_update();
        let mut ctx = Context::new(engine, events, &self.frame);
        match self.scenes.as_mut() {
            Some(scenes) => report.merge(scenes.apply_commands(&mut ctx, commands)),
            None => {
                for command in commands {
                    tracing::warn!(
                        engine = %self.object.name(),
                        ?command,
                        "no scene manager for command"
                    );
                    report.record(false);
                }
            }
        }
        let apply_time = apply_begin.elapsed();
        if report.success_count + report.failed_count > 0 {
            tracing::debug!(
                engine = %self.object.name(),
                applied = report.success_count,
                failed = report.failed_count,
                "commands applied"
            );
        }

        if let Some(game) = self.game.as_mut() {
            game.on_after_update(&mut ctx);
        }
        if let Some(scenes) = self.scenes.as_mut() {
            scenes.on_after_update(&mut ctx);
        }
        (report, apply_time)
    }

    fn render(&mut self) {
        self.object.record(Phase::Render);
        self.surface.clear(self.config.background);
        let engine = Some(self.object.id());
        if let Some(events) = self.events.as_mut() {
            events.on_render();
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_render();
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_render(&mut ctx, &mut self.surface);
            }
        }
        self.surface.present();
    }

    fn frame_end(&mut self) {
        self.object.record(Phase::FrameEnd);
        let engine = Some(self.object.id());
        if let Some(events) = self.events.as_mut() {
            events.on_frame_end();
            let mut ctx = Context::new(engine, events, &self.frame);
            if let Some(game) = self.game.as_mut() {
                game.on_frame_end(&mut ctx);
            }
            if let Some(scenes) = self.scenes.as_mut() {
                scenes.on_frame_end(&mut ctx);
            }
        }
    }
}

impl<S: RenderSurface> fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.object.id())
            .field("name", &self.object.name())
            .field("phase", &self.object.phase())
            .field("frame", &self.frame.frame)
            .field("running", &self.running)
            .field("events", &self.events)
            .field("game", &self.game)
            .field("scenes", &self.scenes)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
