//! The component a scene routes its own events through.

use crate::component::{Component, ComponentCore};
use crate::context::ComponentContext;
use crate::event::{ON_COLLISION, ON_DESTROY, ON_LOAD};

/// Name of the entity created by `Scene::add_handler`.
pub const SCENE_HANDLER_ENTITY: &str = "scene-handler";

/// Owns the scene-scoped `on-collision`, `on-destroy` and `on-load`
/// delegates.
///
/// The collision sweep triggers `on-collision` immediately; entity loads and
/// destructions trigger the other two deferred. Game code subscribes to them
/// with `SubscriptionTarget::Component` pointing at the handler entity.
#[derive(Debug)]
pub struct SceneHandler {
    core: ComponentCore,
}

impl SceneHandler {
    pub fn new() -> Self {
        let mut core = ComponentCore::new("scene-handler");
        core.set_active(true);
        Self { core }
    }
}

impl Default for SceneHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SceneHandler {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn on_load(&mut self, ctx: &mut ComponentContext<'_>) {
        for event_name in [ON_COLLISION, ON_DESTROY, ON_LOAD] {
            self.core.create_delegate(ctx.events, event_name);
        }
    }
}
