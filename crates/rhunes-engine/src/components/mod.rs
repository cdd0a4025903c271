//! Built-in components.
//!
//! | Component       | Role                                                  |
//! |-----------------|-------------------------------------------------------|
//! | [`BoxSprite`]   | draws the entity rectangle                            |
//! | [`Collider2D`]  | puts the entity in the scene collision sweep          |
//! | [`KeyController`] | publishes pressed keys on `keyboard-event`          |
//! | [`MoveTo`]      | moves the entity by a per-frame speed                 |
//! | [`OutOfBounds`] | publishes the sides the entity crossed                |
//!
//! Every built-in starts inactive, like any other component. Activating the
//! owning entity activates them.

mod box_sprite;
mod collider;
mod key_controller;
mod move_to;
mod out_of_bounds;

pub use box_sprite::BoxSprite;
pub use collider::Collider2D;
pub use key_controller::{KeyController, KEYBOARD_EVENT};
pub use move_to::{KeyBindings, MoveTo};
pub use out_of_bounds::{BoundsSide, OutOfBounds, OUT_OF_BOUNDS_EVENT};
