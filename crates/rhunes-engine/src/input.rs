//! Input sources polled once per frame.
//!
//! The windowing backend is an external collaborator. The engine only sees an
//! [`InputFrame`] per frame: the keys held down and whether the user asked to
//! quit. [`ScriptedInput`] replays a fixed input timeline, which is how tests
//! and headless demos drive key-controlled components.

use std::collections::BTreeMap;

use rhunes_core::input::{Key, KeyState};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// InputFrame
// ---------------------------------------------------------------------------

/// Input for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Keys held down during the frame.
    pub keys: KeyState,
    /// The user asked to close the window.
    pub quit: bool,
}

impl InputFrame {
    pub fn pressed(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: KeyState::pressed(keys),
            quit: false,
        }
    }
}

// ---------------------------------------------------------------------------
// InputSource
// ---------------------------------------------------------------------------

/// Something the engine can poll for input.
pub trait InputSource {
    /// Input for `frame` (1-based).
    fn poll(&mut self, frame: u64) -> InputFrame;
}

/// No keys, never quits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _frame: u64) -> InputFrame {
        InputFrame::default()
    }
}

// ---------------------------------------------------------------------------
// ScriptedInput
// ---------------------------------------------------------------------------

/// A fixed timeline of input frames. Frames without an entry poll as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptedInput {
    frames: BTreeMap<u64, InputFrame>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `key` down for every frame in `frames`.
    pub fn press(mut self, key: Key, frames: impl IntoIterator<Item = u64>) -> Self {
        for frame in frames {
            self.frames.entry(frame).or_default().keys.press(key);
        }
        self
    }

    /// Request a quit at `frame`.
    pub fn quit_at(mut self, frame: u64) -> Self {
        self.frames.entry(frame).or_default().quit = true;
        self
    }

    /// Number of frames with scripted input.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, frame: u64) -> InputFrame {
        self.frames.get(&frame).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_replays_its_timeline() {
        let mut input = ScriptedInput::new()
            .press(Key::Right, 2..=3)
            .press(Key::Up, [3])
            .quit_at(5);
        assert_eq!(input.len(), 3);

        assert_eq!(input.poll(1), InputFrame::default());
        assert!(input.poll(2).keys.is_pressed(Key::Right));
        let third = input.poll(3);
        assert!(third.keys.is_pressed(Key::Right) && third.keys.is_pressed(Key::Up));
        assert!(!input.poll(4).quit);
        assert!(input.poll(5).quit);
    }

    #[test]
    fn no_input_is_always_empty() {
        let mut input = NoInput;
        let frame = input.poll(42);
        assert!(frame.keys.is_empty());
        assert!(!frame.quit);
    }

    #[test]
    fn scripted_input_loads_from_json() {
        let input = ScriptedInput::new().press(Key::Char('w'), [1]).quit_at(2);
        let json = serde_json::to_string(&input).unwrap();
        let mut back: ScriptedInput = serde_json::from_str(&json).unwrap();
        assert!(back.poll(1).keys.is_pressed(Key::Char('w')));
        assert!(back.poll(2).quit);
    }
}
