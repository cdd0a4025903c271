//! Whole-engine runs: lifecycle bookkeeping, same-frame deferred dispatch and
//! removal staging across the frame loop.

use std::cell::RefCell;
use std::rc::Rc;

use rhunes_engine::prelude::*;

type Log = Rc<RefCell<Vec<String>>>;

// -- components ---------------------------------------------------------------

/// Records the hooks it goes through.
struct HookRecorder {
    core: ComponentCore,
    log: Log,
}

impl HookRecorder {
    fn new(log: &Log) -> Self {
        Self {
            core: ComponentCore::new("hook-recorder"),
            log: Rc::clone(log),
        }
    }

    fn push(&self, hook: &str) {
        self.log.borrow_mut().push(hook.to_owned());
    }
}

impl Component for HookRecorder {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.push("update");
    }

    fn on_unload(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.push("unload");
    }

    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) {
        self.push("destroy");
    }
}

/// Triggers its `shout` delegate deferred on every update.
struct Shouter {
    core: ComponentCore,
}

impl Shouter {
    fn new() -> Self {
        Self {
            core: ComponentCore::new("shouter"),
        }
    }
}

impl Component for Shouter {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_load(&mut self, ctx: &mut ComponentContext<'_>) {
        self.core.create_delegate(ctx.events, "shout");
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        if let Some(delegate) = self.core.delegate() {
            let args = EventArgs::new().with("frame", ctx.frame.frame);
            ctx.events.trigger_delegate(delegate, false, args);
        }
    }
}

/// Listens to the sibling `Shouter`.
struct Listener {
    core: ComponentCore,
}

impl Listener {
    fn new(log: &Log) -> Self {
        let mut core = ComponentCore::new("listener");
        let log = Rc::clone(log);
        core.subscribe(
            SubscriptionTarget::sibling::<Shouter>(),
            signature(move |_, args| {
                let frame = args.get_as::<u64>("frame").unwrap_or_default();
                log.borrow_mut().push(format!("heard:{frame}"));
            }),
        );
        Self { core }
    }
}

impl Component for Listener {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
}

/// Queues the removal of `target` on its first update.
struct Reaper {
    core: ComponentCore,
    target: EntityId,
    done: bool,
}

impl Component for Reaper {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        if !self.done {
            ctx.commands().remove_entity(self.target);
            self.done = true;
        }
    }
}

/// Stops the engine from game logic.
struct StopAt(u64);

impl GameLogic for StopAt {
    fn on_update(&mut self, ctx: &mut Context<'_>) {
        if ctx.frame.frame == self.0 {
            ctx.commands().stop_engine();
        }
    }
}

fn headless() -> EngineConfig {
    EngineConfig::headless(320, 240)
}

fn active_scene<S: RenderSurface>(engine: &Engine<S>) -> &Scene {
    engine.scenes().and_then(SceneManager::active_scene).unwrap()
}

// -- tests --------------------------------------------------------------------

#[test]
fn two_frame_run_ends_every_object() {
    let log: Log = Rc::default();
    let mut scene = Scene::new("main");
    let player = Entity::new("player")
        .with_component(HookRecorder::new(&log))
        .unwrap()
        .activated();
    let player_id = scene.add_entity(player);

    let mut engine = Engine::new(headless())
        .with_clock(SteppedClock::at_fps(30))
        .with_end_condition(|status| status.frame == 2);
    engine.add_scene(scene).unwrap();

    assert_eq!(engine.run().unwrap(), 2);
    assert_eq!(engine.frame_count(), 2);
    assert_eq!(*log.borrow(), vec!["update", "update"]);

    assert_eq!(engine.phase().as_str(), "on-end");
    assert_eq!(engine.events().unwrap().phase().as_str(), "on-end");
    assert_eq!(engine.game().unwrap().phase().as_str(), "on-end");
    assert_eq!(engine.scenes().unwrap().phase().as_str(), "on-end");

    let scene = active_scene(&engine);
    assert_eq!(scene.phase(), Phase::End);
    let player = scene.entity(player_id).unwrap();
    assert_eq!(player.phase(), Phase::End);
    assert_eq!(player.get_component::<HookRecorder>().unwrap().core().phase(), Phase::End);
}

#[test]
fn engine_accepts_a_json_config() {
    let json = r#"{ "name": "json", "width": 64, "height": 32, "headless": true }"#;
    let config = EngineConfig::from_json_str(json).unwrap();
    let mut engine = Engine::new(config).with_end_condition(|status| status.frame == 1);
    engine.run().unwrap();
    assert_eq!(engine.name(), "json");
    assert_eq!(engine.frame_state().surface_size, Vec2::new(64.0, 32.0));
}

#[test]
fn deferred_triggers_run_in_the_same_frame() {
    let log: Log = Rc::default();
    let mut scene = Scene::new("main");
    let speaker = Entity::new("speaker")
        .with_component(Shouter::new())
        .unwrap()
        .with_component(Listener::new(&log))
        .unwrap()
        .activated();
    scene.add_entity(speaker);

    let mut engine = Engine::new(headless());
    engine.add_scene(scene).unwrap();

    assert!(engine.step().unwrap());
    assert_eq!(*log.borrow(), vec!["heard:1"]);
    assert_eq!(engine.events().unwrap().pending_len(), 0);

    assert!(engine.step().unwrap());
    assert_eq!(*log.borrow(), vec!["heard:1", "heard:2"]);
    assert_eq!(engine.events().unwrap().pending_len(), 0);
}

#[test]
fn removal_mid_update_waits_for_after_update() {
    let log: Log = Rc::default();
    let mut scene = Scene::new("main");
    let victim = Entity::new("victim")
        .with_component(HookRecorder::new(&log))
        .unwrap()
        .activated();
    let victim_id = victim.id();
    let reaper = Entity::new("reaper")
        .with_component(Reaper {
            core: ComponentCore::new("reaper"),
            target: victim_id,
            done: false,
        })
        .unwrap()
        .activated();
    scene.add_entity(reaper);
    scene.add_entity(victim);

    let mut engine = Engine::new(headless());
    engine.add_scene(scene).unwrap();
    assert!(engine.step().unwrap());

    // The victim still updated in the frame its removal was queued.
    assert_eq!(*log.borrow(), vec!["update", "unload", "destroy"]);
    let scene = active_scene(&engine);
    assert!(scene.entity(victim_id).is_none());
    assert!(!scene.loaded_entities().contains(&victim_id));
    assert!(scene.to_delete_entities().is_empty());
    assert_eq!(engine.last_diagnostics().commands.success_count, 1);
}

#[test]
fn commands_for_missing_entities_are_counted_as_failed() {
    let mut engine = Engine::new(headless());
    engine.add_scene(Scene::new("main")).unwrap();
    engine.step().unwrap();

    engine.events_mut().unwrap().commands_mut().remove_entity(EntityId::next());
    engine.step().unwrap();
    let report = engine.last_diagnostics().commands;
    assert_eq!((report.success_count, report.failed_count), (0, 1));
}

#[test]
fn game_logic_can_stop_the_engine() {
    let game = GameManager::default().with_logic(StopAt(3));
    let mut engine = Engine::new(headless()).with_game_manager(game);
    assert_eq!(engine.run().unwrap(), 3);
    assert_eq!(engine.phase(), Phase::End);
}

#[test]
fn engine_stop_ends_after_the_next_frame() {
    let mut engine = Engine::new(headless());
    assert!(engine.step().unwrap());
    engine.stop();
    assert!(engine.status().stop_requested);
    assert!(!engine.step().unwrap());
    assert!(!engine.is_running());
    engine.shutdown().unwrap();
    assert!(engine.has_ended());
}
