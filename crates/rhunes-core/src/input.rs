//! Key-state snapshot consumed by components once per update.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A keyboard key the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Char(char),
}

impl Key {
    /// The four arrow keys, in the order controllers poll them.
    pub const ARROWS: [Key; 4] = [Key::Up, Key::Down, Key::Left, Key::Right];
}

/// The set of keys held down during the current frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    pressed: BTreeSet<Key>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list of pressed keys.
    pub fn pressed(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            pressed: keys.into_iter().collect(),
        }
    }

    /// Whether `key` is held down.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.remove(&key);
    }

    /// Iterate over pressed keys in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.pressed.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}
