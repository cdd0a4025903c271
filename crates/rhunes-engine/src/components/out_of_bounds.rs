//! Surface-edge detection.
//!
//! [`OutOfBounds`] compares its entity rectangle with the surface size each
//! update and publishes one `out-of-bounds-event` per crossed [`BoundsSide`].
//! In bounce mode a side counts as soon as the rectangle pokes past it.

use rhunes_core::component::{Component, ComponentCore};
use rhunes_core::context::ComponentContext;
use rhunes_core::event::EventArgs;
use rhunes_core::math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Event name of the delegate an [`OutOfBounds`] publishes.
pub const OUT_OF_BOUNDS_EVENT: &str = "out-of-bounds-event";

/// A surface edge an entity went past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundsSide {
    Left,
    Right,
    Top,
    Down,
}

impl BoundsSide {
    pub const ALL: [BoundsSide; 4] = [
        BoundsSide::Left,
        BoundsSide::Right,
        BoundsSide::Top,
        BoundsSide::Down,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoundsSide::Left => "left",
            BoundsSide::Right => "right",
            BoundsSide::Top => "top",
            BoundsSide::Down => "down",
        }
    }

    /// Whether `rect` is past this edge of a `size` surface.
    ///
    /// With `bounce`, touching past the edge with any side counts. Without
    /// it, the rectangle has to be completely outside.
    pub fn is_crossed(self, rect: Rect, size: Vec2, bounce: bool) -> bool {
        match (self, bounce) {
            (BoundsSide::Left, true) => rect.x < 0.0,
            (BoundsSide::Right, true) => rect.x + rect.w > size.x,
            (BoundsSide::Top, true) => rect.y < 0.0,
            (BoundsSide::Down, true) => rect.y + rect.h > size.y,
            (BoundsSide::Left, false) => rect.x + rect.w < 0.0,
            (BoundsSide::Right, false) => rect.x > size.x,
            (BoundsSide::Top, false) => rect.y + rect.h < 0.0,
            (BoundsSide::Down, false) => rect.y > size.y,
        }
    }
}

/// Reports when its entity leaves the render surface.
///
/// Once loaded, the component owns an `out-of-bounds-event` delegate. Every
/// update it triggers that delegate immediately for each crossed side, with
/// the arguments `entity` and `location` (`"left"`, `"right"`, `"top"` or
/// `"down"`). An entity flagged `die_on_out_of_bounds` is also queued for
/// removal.
#[derive(Debug)]
pub struct OutOfBounds {
    core: ComponentCore,
    bounce: bool,
}

impl OutOfBounds {
    /// Fires once the entity is completely outside the surface.
    pub fn new() -> Self {
        Self {
            core: ComponentCore::new("out-of-bounds"),
            bounce: false,
        }
    }

    /// Fires as soon as any side of the entity crosses an edge.
    pub fn bouncing() -> Self {
        Self {
            bounce: true,
            ..Self::new()
        }
    }

    pub fn bounce(&self) -> bool {
        self.bounce
    }
}

impl Default for OutOfBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for OutOfBounds {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_load(&mut self, ctx: &mut ComponentContext<'_>) {
        self.core.create_delegate(ctx.events, OUT_OF_BOUNDS_EVENT);
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        let rect = ctx.transform.rect();
        let size = ctx.surface_size();
        let mut crossed = false;
        for side in BoundsSide::ALL {
            if !side.is_crossed(rect, size, self.bounce) {
                continue;
            }
            crossed = true;
            tracing::trace!(entity = %ctx.entity, side = side.as_str(), "out of bounds");
            if let Some(delegate) = self.core.delegate_for(OUT_OF_BOUNDS_EVENT) {
                let args = EventArgs::new()
                    .with_entity("entity", ctx.entity)
                    .with("location", side.as_str());
                ctx.events.trigger_delegate(delegate, true, args);
            }
        }
        if crossed && ctx.die_on_out_of_bounds {
            let entity = ctx.entity;
            ctx.commands().remove_entity(entity);
        }
    }
}
