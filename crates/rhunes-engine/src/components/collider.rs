//! The collider marker component.

use rhunes_core::component::{Component, ComponentCore};
use rhunes_core::math::Rect;
use rhunes_core::transform::Transform;

/// Gives its entity an axis-aligned collider matching the entity rectangle.
#[derive(Debug)]
pub struct Collider2D {
    core: ComponentCore,
}

impl Collider2D {
    pub fn new() -> Self {
        Self {
            core: ComponentCore::new("collider-2d"),
        }
    }
}

impl Default for Collider2D {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Collider2D {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn collider_rect(&self, transform: &Transform) -> Option<Rect> {
        Some(transform.rect())
    }
}
