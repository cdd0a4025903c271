//! Per-frame movement, optionally steered by a [`KeyController`].

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rhunes_core::component::{Component, ComponentCore, ComponentKind, SubscriptionTarget};
use rhunes_core::context::ComponentContext;
use rhunes_core::event::signature;
use rhunes_core::ider::EntityId;
use rhunes_core::input::Key;
use rhunes_core::math::Vec2;

use super::key_controller::{KeyController, KEYBOARD_EVENT};

/// Speed to switch to when a key is reported.
pub type KeyBindings = BTreeMap<Key, Vec2>;

/// Moves its entity by `speed` every update.
///
/// The speed is per frame, not per second. Key bindings subscribe to a
/// [`KeyController`] delegate; each reported key with a binding replaces the
/// speed, and the speed is kept once the key is released.
#[derive(Debug)]
pub struct MoveTo {
    core: ComponentCore,
    speed: Rc<Cell<Vec2>>,
}

impl MoveTo {
    pub fn new(speed: Vec2) -> Self {
        Self {
            core: ComponentCore::new("move-to"),
            speed: Rc::new(Cell::new(speed)),
        }
    }

    /// Follow the [`KeyController`] on the same entity.
    pub fn with_key_bindings(self, bindings: KeyBindings) -> Self {
        self.bind(SubscriptionTarget::sibling::<KeyController>(), bindings)
    }

    /// Follow the [`KeyController`] on `entity`. The controller may load
    /// after this component; the subscription resolves on a later start.
    pub fn with_key_bindings_from(self, entity: EntityId, bindings: KeyBindings) -> Self {
        let target = SubscriptionTarget::Component {
            entity: Some(entity),
            kind: ComponentKind::of::<KeyController>(),
            event_name: Some(KEYBOARD_EVENT.to_owned()),
        };
        self.bind(target, bindings)
    }

    fn bind(mut self, target: SubscriptionTarget, bindings: KeyBindings) -> Self {
        let speed = Rc::clone(&self.speed);
        self.core.subscribe(
            target,
            signature(move |_, args| {
                if let Some(next) = args.get_as::<Key>("key").and_then(|key| bindings.get(&key)) {
                    speed.set(*next);
                }
            }),
        );
        self
    }

    pub fn speed(&self) -> Vec2 {
        self.speed.get()
    }

    pub fn set_speed(&self, speed: Vec2) {
        self.speed.set(speed);
    }

    /// Shared handle on the speed, for sibling components that steer it.
    pub fn speed_cell(&self) -> Rc<Cell<Vec2>> {
        Rc::clone(&self.speed)
    }
}

impl Component for MoveTo {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.transform.position += self.speed.get();
    }
}

#[cfg(test)]
mod tests {
    use rhunes_core::prelude::*;

    use super::*;

    fn arrows(step: f32) -> KeyBindings {
        KeyBindings::from([
            (Key::Up, Vec2::new(0.0, -step)),
            (Key::Down, Vec2::new(0.0, step)),
            (Key::Left, Vec2::new(-step, 0.0)),
            (Key::Right, Vec2::new(step, 0.0)),
        ])
    }

    #[test]
    fn speed_is_added_every_update() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("drifter")
            .with_component(MoveTo::new(Vec2::new(2.0, 1.0)))
            .unwrap()
            .activated();
        entity.on_load(&mut ctx);
        entity.on_update(&mut ctx);
        entity.on_update(&mut ctx);
        assert_eq!(entity.transform().position, Vec2::new(4.0, 2.0));
    }

    #[test]
    fn sibling_key_controller_steers() {
        let mut events = DelegateManager::default();
        let mut entity = Entity::new("player")
            .with_component(KeyController::new())
            .unwrap()
            .with_component(MoveTo::new(Vec2::ZERO).with_key_bindings(arrows(3.0)))
            .unwrap()
            .activated();

        let idle = FrameState::default();
        entity.on_load(&mut Context::new(None, &mut events, &idle));
        let move_to = entity.get_component::<MoveTo>().unwrap();
        assert!(move_to.core().subscriptions()[0].is_registered());

        let pressed = FrameState {
            keys: KeyState::pressed([Key::Right]),
            ..FrameState::default()
        };
        entity.on_update(&mut Context::new(None, &mut events, &pressed));
        assert_eq!(entity.get_component::<MoveTo>().unwrap().speed(), Vec2::new(3.0, 0.0));

        entity.on_update(&mut Context::new(None, &mut events, &idle));
        assert_eq!(entity.transform().position, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn unbound_keys_keep_the_speed() {
        let mut events = DelegateManager::default();
        let bindings = KeyBindings::from([(Key::Up, Vec2::new(0.0, -1.0))]);
        let mut entity = Entity::new("player")
            .with_component(KeyController::with_keys([Key::Up, Key::Space]))
            .unwrap()
            .with_component(MoveTo::new(Vec2::new(1.0, 1.0)).with_key_bindings(bindings))
            .unwrap()
            .activated();
        let frame = FrameState {
            keys: KeyState::pressed([Key::Space]),
            ..FrameState::default()
        };
        let mut ctx = Context::new(None, &mut events, &frame);
        entity.on_load(&mut ctx);
        entity.on_update(&mut ctx);
        let move_to = entity.get_component::<MoveTo>().unwrap();
        assert_eq!(move_to.speed(), Vec2::new(1.0, 1.0));
        move_to.set_speed(Vec2::ZERO);
        assert_eq!(move_to.speed(), Vec2::ZERO);
        move_to.speed_cell().set(Vec2::ONE);
        assert_eq!(move_to.speed(), Vec2::ONE);
    }
}
