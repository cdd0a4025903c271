//! Static geometric information for an entity.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, Vec2};

/// Position, rotation, scale and dimension of an entity.
///
/// The entity rectangle is anchored at `position` and measures
/// `dimension * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: Vec2,
    pub scale: Vec2,
    pub dimension: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: Vec2::ZERO,
            scale: Vec2::ONE,
            dimension: Vec2::ZERO,
        }
    }
}

impl Transform {
    /// A transform covering `rect` with unit scale.
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            position: Vec2::new(rect.x, rect.y),
            dimension: Vec2::new(rect.w, rect.h),
            ..Self::default()
        }
    }

    /// The rectangle the entity covers.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.dimension.x * self.scale.x,
            self.dimension.y * self.scale.y,
        )
    }
}
