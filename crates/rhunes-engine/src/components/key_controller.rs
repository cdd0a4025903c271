//! Keyboard publishing for game components.

use rhunes_core::component::{Component, ComponentCore};
use rhunes_core::context::ComponentContext;
use rhunes_core::event::EventArgs;
use rhunes_core::input::Key;

/// Event name of the delegate a [`KeyController`] publishes.
pub const KEYBOARD_EVENT: &str = "keyboard-event";

/// Publishes every watched key held down this frame.
///
/// Once loaded, the controller owns a `keyboard-event` delegate. On each
/// update it triggers that delegate immediately, once per pressed key, with
/// the arguments `key` (a serialized [`Key`]) and `entity`. Watched keys
/// default to the arrows.
#[derive(Debug)]
pub struct KeyController {
    core: ComponentCore,
    keys: Vec<Key>,
}

impl KeyController {
    pub fn new() -> Self {
        Self::with_keys(Key::ARROWS)
    }

    /// A controller watching `keys`, polled in the given order.
    pub fn with_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            core: ComponentCore::new("key-controller"),
            keys: keys.into_iter().collect(),
        }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl Default for KeyController {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for KeyController {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_load(&mut self, ctx: &mut ComponentContext<'_>) {
        self.core.create_delegate(ctx.events, KEYBOARD_EVENT);
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(delegate) = self.core.delegate_for(KEYBOARD_EVENT) else {
            return;
        };
        for &key in &self.keys {
            if !ctx.keys().is_pressed(key) {
                continue;
            }
            match EventArgs::new().with_entity("entity", ctx.entity).with_serialized("key", &key) {
                Ok(args) => {
                    ctx.events.trigger_delegate(delegate, true, args);
                }
                Err(err) => {
                    tracing::warn!(
                        component = %self.core.id(),
                        ?key,
                        error = %err,
                        "key not serializable"
                    );
                }
            }
        }
    }
}
