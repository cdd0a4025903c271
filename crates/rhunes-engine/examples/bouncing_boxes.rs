//! Headless demo: a key-driven box among drifting boxes.
//!
//! The player box follows scripted arrow presses. Drifters bounce off the
//! surface edges by flipping their speed whenever their out-of-bounds
//! delegate reports a side, and every collision with the player is counted
//! through the scene handler.
//!
//! Run with: `cargo run --example bouncing_boxes`

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context as _;
use rhunes_engine::logging::init_tracing;
use rhunes_engine::prelude::*;

/// Flips a sibling [`MoveTo`] speed on the axis of every reported side.
struct Bouncer {
    core: ComponentCore,
}

impl Bouncer {
    fn new(speed: Rc<Cell<Vec2>>) -> Self {
        let mut core = ComponentCore::new("bouncer");
        core.subscribe(
            SubscriptionTarget::sibling::<OutOfBounds>(),
            signature(move |_, args| {
                let mut next = speed.get();
                match args.get_as::<BoundsSide>("location") {
                    Some(BoundsSide::Left) => next.x = next.x.abs(),
                    Some(BoundsSide::Right) => next.x = -next.x.abs(),
                    Some(BoundsSide::Top) => next.y = next.y.abs(),
                    Some(BoundsSide::Down) => next.y = -next.y.abs(),
                    None => return,
                }
                speed.set(next);
            }),
        );
        Self { core }
    }
}

impl Component for Bouncer {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
}

/// Counts collisions reported by the scene handler.
struct Scoreboard {
    core: ComponentCore,
}

impl Scoreboard {
    fn new(handler: EntityId, hits: Rc<Cell<u32>>) -> Self {
        let mut core = ComponentCore::new("scoreboard");
        core.subscribe(
            SubscriptionTarget::Component {
                entity: Some(handler),
                kind: ComponentKind::of::<SceneHandler>(),
                event_name: Some(ON_COLLISION.to_owned()),
            },
            signature(move |_, _| hits.set(hits.get() + 1)),
        );
        Self { core }
    }
}

impl Component for Scoreboard {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
}

fn drifter(name: &str, rect: Rect, speed: Vec2, color: Color) -> anyhow::Result<Entity> {
    let movement = MoveTo::new(speed);
    let bouncer = Bouncer::new(movement.speed_cell());
    let entity = Entity::new(name)
        .with_transform(Transform::from_rect(rect))
        .with_component(BoxSprite::new(color))?
        .with_component(Collider2D::new())?
        .with_component(movement)?
        .with_component(OutOfBounds::bouncing())?
        .with_component(bouncer)?
        .activated();
    Ok(entity)
}

fn main() -> anyhow::Result<()> {
    init_tracing("info")?;

    let config = EngineConfig {
        name: "bouncing-boxes".to_owned(),
        ..EngineConfig::headless(320, 240)
    };

    let hits = Rc::new(Cell::new(0));
    let mut scene = Scene::new("playground").with_handler()?;
    let handler = scene.handler().context("scene handler missing")?;
    scene.add_entity(
        Entity::new("scoreboard")
            .with_component(Scoreboard::new(handler, Rc::clone(&hits)))?
            .activated(),
    );

    let bindings = KeyBindings::from([
        (Key::Up, Vec2::new(0.0, -3.0)),
        (Key::Down, Vec2::new(0.0, 3.0)),
        (Key::Left, Vec2::new(-3.0, 0.0)),
        (Key::Right, Vec2::new(3.0, 0.0)),
    ]);
    let player = scene.add_entity(
        Entity::new("player")
            .with_transform(Transform::from_rect(Rect::new(150.0, 110.0, 16.0, 16.0)))
            .with_layer(Layer::Top)
            .with_component(BoxSprite::outlined(Color::RED, 2))?
            .with_component(Collider2D::new())?
            .with_component(KeyController::new())?
            .with_component(MoveTo::new(Vec2::ZERO).with_key_bindings(bindings))?
            .activated(),
    );
    for (i, speed) in [Vec2::new(4.0, 2.0), Vec2::new(-3.0, 5.0), Vec2::new(2.0, -4.0)]
        .into_iter()
        .enumerate()
    {
        let offset = 40.0 + 60.0 * i as f32;
        scene.add_entity(drifter(
            &format!("drifter-{i}"),
            Rect::new(offset, offset / 2.0, 12.0, 12.0),
            speed,
            Color::BLUE,
        )?);
    }

    let input = ScriptedInput::new()
        .press(Key::Left, 10..=30)
        .press(Key::Down, 60..=90)
        .press(Key::Right, 120..=150);

    let mut engine = Engine::new(config)
        .with_input(input)
        .with_end_condition(|status| status.frame >= 180);
    engine.add_scene(scene)?;
    let frames = engine.run()?;

    let end = engine
        .scenes()
        .and_then(SceneManager::active_scene)
        .and_then(|scene| scene.entity(player))
        .map(|player| player.transform().position)
        .context("player not found after the run")?;
    println!("frames run:      {frames}");
    println!("player position: ({:.1}, {:.1})", end.x, end.y);
    println!("collisions:      {}", hits.get());
    println!("draw calls:      {}", engine.surface().calls().len());
    Ok(())
}
