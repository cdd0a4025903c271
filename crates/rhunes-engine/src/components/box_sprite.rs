//! Rectangle rendering.

use rhunes_core::component::{Component, ComponentCore};
use rhunes_core::context::ComponentContext;
use rhunes_core::math::Color;
use rhunes_core::surface::RenderSurface;

/// Draws its entity's rectangle every render pass.
#[derive(Debug)]
pub struct BoxSprite {
    core: ComponentCore,
    color: Color,
    border: u32,
}

impl BoxSprite {
    /// A filled box.
    pub fn new(color: Color) -> Self {
        Self {
            core: ComponentCore::new("box"),
            color,
            border: 0,
        }
    }

    /// An outlined box with a `border` pixels wide stroke.
    pub fn outlined(color: Color, border: u32) -> Self {
        Self {
            border,
            ..Self::new(color)
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn border(&self) -> u32 {
        self.border
    }
}

impl Component for BoxSprite {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_render(&mut self, ctx: &mut ComponentContext<'_>, surface: &mut dyn RenderSurface) {
        surface.draw_rect(ctx.transform.rect(), self.color, self.border);
    }
}

#[cfg(test)]
mod tests {
    use rhunes_core::prelude::*;

    use super::*;

    #[test]
    fn draws_the_current_entity_rect() {
        let mut events = DelegateManager::default();
        let frame = FrameState::with_surface_size(100.0, 100.0);
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut surface = RecordingSurface::new(100.0, 100.0);

        let mut entity = Entity::new("crate")
            .with_transform(Transform::from_rect(Rect::new(4.0, 6.0, 10.0, 10.0)))
            .with_component(BoxSprite::outlined(Color::BLUE, 2))
            .unwrap()
            .activated();
        entity.on_load(&mut ctx);
        entity.transform_mut().position = Vec2::new(20.0, 30.0);
        entity.on_render(&mut ctx, &mut surface);

        assert_eq!(
            surface.calls(),
            &[DrawCall::Rect {
                rect: Rect::new(20.0, 30.0, 10.0, 10.0),
                color: Color::BLUE,
                border: 2,
            }]
        );
    }

    #[test]
    fn inactive_sprite_draws_nothing() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut surface = RecordingSurface::new(10.0, 10.0);

        let mut entity = Entity::new("ghost").with_component(BoxSprite::new(Color::RED)).unwrap();
        entity.on_load(&mut ctx);
        entity.on_render(&mut ctx, &mut surface);
        assert!(surface.calls().is_empty());
        assert_eq!(entity.get_component::<BoxSprite>().unwrap().color(), Color::RED);
    }
}
