//! Scenes: owners of entities, render layers and the collision sweep.
//!
//! A scene keeps its entities in one flat list and stages them through
//! partitions, mirroring how entities stage components:
//!
//! - `unloaded_entities`: added but not loaded yet, or inactive;
//! - `loaded_entities`: loaded, started and placed in a render layer;
//! - `to_delete_entities`: staged by [`Scene::remove_entity`] and only
//!   unlinked and destroyed in [`Scene::on_after_update`], once the update
//!   pass no longer iterates the entity list.
//!
//! Entities carrying a collider capability when they load join the collision
//! collection, swept once per frame at the end of [`Scene::on_update`].

pub mod collision;
pub mod handler;

use std::collections::HashMap;

use crate::component::Component;
use crate::context::Context;
use crate::entity::{Entity, Layer};
use crate::event::{EventArgs, ON_COLLISION, ON_DESTROY, ON_LOAD};
use crate::ider::{DelegateId, EntityId, SceneId};
use crate::lifecycle::{EngineObject, Phase};
use crate::math::Rect;
use crate::surface::RenderSurface;
use crate::CoreError;

pub use handler::{SceneHandler, SCENE_HANDLER_ENTITY};

/// Customization hook run every time a scene becomes active.
pub type SceneCode = Box<dyn FnMut(&mut Scene)>;

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A set of entities activated and deactivated together.
pub struct Scene {
    object: EngineObject<SceneId>,
    tag: Option<String>,
    entities: Vec<Entity>,
    unloaded_entities: Vec<EntityId>,
    loaded_entities: Vec<EntityId>,
    to_delete_entities: Vec<EntityId>,
    /// Loaded entities per layer, in load order. Indexed by [`Layer::index`].
    layers: [Vec<EntityId>; 3],
    collision_collection: Vec<EntityId>,
    collision_check: bool,
    /// Entity holding the [`SceneHandler`].
    handler: Option<EntityId>,
    code: Option<SceneCode>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(SceneId::next(), name),
            tag: None,
            entities: Vec::new(),
            unloaded_entities: Vec::new(),
            loaded_entities: Vec::new(),
            to_delete_entities: Vec::new(),
            layers: Default::default(),
            collision_collection: Vec::new(),
            collision_check: true,
            handler: None,
            code: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Install the code hook run on every activation. A destroyed scene is
    /// empty, so the hook is where a scene populates itself.
    pub fn with_code(mut self, code: impl FnMut(&mut Scene) + 'static) -> Self {
        self.code = Some(Box::new(code));
        self
    }

    /// Builder form of [`add_handler`](Self::add_handler).
    pub fn with_handler(mut self) -> Result<Self, CoreError> {
        self.add_handler()?;
        Ok(self)
    }

    // -- accessors ----------------------------------------------------------

    pub fn object(&self) -> &EngineObject<SceneId> {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut EngineObject<SceneId> {
        &mut self.object
    }

    pub fn id(&self) -> SceneId {
        self.object.id()
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    pub fn is_loaded(&self) -> bool {
        self.object.is_loaded()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn collision_check(&self) -> bool {
        self.collision_check
    }

    pub fn set_collision_check(&mut self, enabled: bool) {
        self.collision_check = enabled;
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn entity_by_name_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name() == name)
    }

    pub fn unloaded_entities(&self) -> &[EntityId] {
        &self.unloaded_entities
    }

    pub fn loaded_entities(&self) -> &[EntityId] {
        &self.loaded_entities
    }

    pub fn to_delete_entities(&self) -> &[EntityId] {
        &self.to_delete_entities
    }

    /// Loaded entities of one layer, in render order.
    pub fn layer(&self, layer: Layer) -> &[EntityId] {
        &self.layers[layer.index()]
    }

    pub fn collision_collection(&self) -> &[EntityId] {
        &self.collision_collection
    }

    // -- handler ------------------------------------------------------------

    /// Add an active entity holding a [`SceneHandler`] and make it the
    /// scene's handler.
    pub fn add_handler(&mut self) -> Result<EntityId, CoreError> {
        let mut entity = Entity::new(SCENE_HANDLER_ENTITY);
        entity.add_component(SceneHandler::new())?;
        entity.on_active();
        let id = self.add_entity(entity);
        self.handler = Some(id);
        Ok(id)
    }

    /// Designate an entity of this scene as handler. Returns `false` if the
    /// entity is not in the scene.
    pub fn set_handler(&mut self, entity: EntityId) -> bool {
        if self.entity(entity).is_none() {
            return false;
        }
        self.handler = Some(entity);
        true
    }

    pub fn handler(&self) -> Option<EntityId> {
        self.handler
    }

    /// The handler delegate for `event_name`, once the handler has loaded.
    pub fn handler_delegate(&self, event_name: &str) -> Option<DelegateId> {
        self.entity(self.handler?)?
            .get_component::<SceneHandler>()?
            .core()
            .delegate_for(event_name)
    }

    // -- entities -----------------------------------------------------------

    /// Add an entity and its whole detached subtree, parent first, depth
    /// first. Everything lands in the unloaded partition.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = entity.id();
        let children = entity.take_detached_children();
        entity.attach_to_scene(self.id(), self.object.engine());
        tracing::debug!(scene = %self.name(), entity = %id, name = entity.name(), "entity added");
        self.entities.push(entity);
        self.unloaded_entities.push(id);
        for child in children {
            self.add_entity(child);
        }
        id
    }

    /// Add `child` under an entity already in the scene.
    pub fn add_child(&mut self, parent: EntityId, mut child: Entity) -> Option<EntityId> {
        self.entity_mut(parent)?.link_child(&mut child);
        Some(self.add_entity(child))
    }

    /// Stage an entity and, recursively, its children for removal at the
    /// end of the after-update phase. Returns `false` if the entity is not
    /// in the scene.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entity(id) else {
            return false;
        };
        if self.to_delete_entities.contains(&id) {
            return true;
        }
        let children: Vec<EntityId> = entity.children().iter().map(|link| link.id).collect();
        tracing::debug!(scene = %self.name(), entity = %id, "entity staged for removal");
        self.to_delete_entities.push(id);
        for child in children {
            self.remove_entity(child);
        }
        true
    }

    /// Load every active unloaded entity: init it on first load, load it,
    /// start it, place it in its layer and, if it is a collider, in the
    /// collision collection. Returns the number of entities loaded.
    pub fn load_unloaded_entities(&mut self, ctx: &mut Context<'_>) -> usize {
        let mut still_unloaded = Vec::new();
        let mut loaded_now = Vec::new();
        for id in std::mem::take(&mut self.unloaded_entities) {
            let Some(entity) = self.entities.iter_mut().find(|e| e.id() == id) else {
                continue;
            };
            if !entity.is_active() {
                still_unloaded.push(id);
                continue;
            }
            if matches!(entity.phase(), Phase::Created | Phase::Active) {
                entity.on_init(ctx);
            }
            entity.on_load(ctx);
            entity.on_start(ctx);
            self.layers[entity.layer().index()].push(id);
            if entity.has_collider() && !self.collision_collection.contains(&id) {
                self.collision_collection.push(id);
            }
            self.loaded_entities.push(id);
            loaded_now.push(id);
        }
        self.unloaded_entities = still_unloaded;

        for id in &loaded_now {
            tracing::debug!(scene = %self.name(), entity = %id, "entity loaded");
            self.notify(ctx, ON_LOAD, *id);
        }
        loaded_now.len()
    }

    /// Trigger the handler and system delegates for `event_name`, deferred.
    fn notify(&self, ctx: &mut Context<'_>, event_name: &str, entity: EntityId) {
        let args = EventArgs::new().with_entity("entity", entity);
        if let Some(delegate) = self.handler_delegate(event_name) {
            ctx.events.trigger_delegate(delegate, false, args.clone());
        }
        if let Some(delegate) = ctx.events.defaults().and_then(|d| d.for_event(event_name)) {
            ctx.events.trigger_delegate(delegate, false, args);
        }
    }

    /// Sweep the collision collection once.
    ///
    /// Each overlapping pair triggers the handler's `on-collision` delegate
    /// immediately and the system one deferred, with the pair as `entity`
    /// and `other`. Entities flagged `die_on_collision` are staged for
    /// removal. Returns the number of overlapping pairs.
    pub fn check_collisions(&mut self, ctx: &mut Context<'_>) -> usize {
        if !self.collision_check || self.collision_collection.len() < 2 {
            return 0;
        }
        let by_id: HashMap<EntityId, &Entity> = self.entities.iter().map(|e| (e.id(), e)).collect();
        let colliders: Vec<(EntityId, Option<Rect>)> = self
            .collision_collection
            .iter()
            .map(|id| {
                let rect = if self.to_delete_entities.contains(id) {
                    None
                } else {
                    by_id.get(id).and_then(|entity| entity.collider_rect())
                };
                (*id, rect)
            })
            .collect();
        let pairs = collision::overlapping_pairs(&colliders);
        let doomed: Vec<EntityId> = pairs
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .filter(|id| by_id.get(id).is_some_and(|entity| entity.die_on_collision()))
            .collect();
        drop(by_id);

        let handler = self.handler_delegate(ON_COLLISION);
        let system = ctx.events.defaults().map(|defaults| defaults.collision);
        for (a, b) in &pairs {
            tracing::trace!(scene = %self.name(), entity = %a, other = %b, "collision");
            let args = EventArgs::new().with_entity("entity", *a).with_entity("other", *b);
            if let Some(delegate) = handler {
                ctx.events.trigger_delegate(delegate, true, args.clone());
            }
            if let Some(delegate) = system {
                ctx.events.trigger_delegate(delegate, false, args);
            }
        }
        for id in doomed {
            self.remove_entity(id);
        }
        pairs.len()
    }

    /// Unlink and destroy every staged entity.
    fn flush_deletions(&mut self, ctx: &mut Context<'_>) {
        for id in std::mem::take(&mut self.to_delete_entities) {
            let Some(index) = self.entities.iter().position(|e| e.id() == id) else {
                continue;
            };
            let mut entity = self.entities.remove(index);
            self.loaded_entities.retain(|e| *e != id);
            self.unloaded_entities.retain(|e| *e != id);
            for layer in &mut self.layers {
                layer.retain(|e| *e != id);
            }
            self.collision_collection.retain(|e| *e != id);
            if self.handler == Some(id) {
                self.handler = None;
            }
            if let Some(parent) = entity.parent().and_then(|parent| self.entity_mut(parent)) {
                parent.delete_child(id);
            }

            entity.on_unload(ctx);
            entity.on_destroy(ctx);
            entity.detach_from_scene();
            entity.clear_parent();
            tracing::debug!(scene = %self.name(), entity = %id, "entity removed");
            self.notify(ctx, ON_DESTROY, id);
        }
    }

    /// Run `f` on every loaded, active entity in list order.
    fn for_each_loaded(&mut self, mut f: impl FnMut(&mut Entity)) {
        for entity in self
            .entities
            .iter_mut()
            .filter(|e| e.is_loaded() && e.is_active())
        {
            f(entity);
        }
    }

    /// Run the code hook, if any.
    pub fn run_code(&mut self) {
        if let Some(mut code) = self.code.take() {
            tracing::debug!(scene = %self.name(), "running scene code");
            code(self);
            if self.code.is_none() {
                self.code = Some(code);
            }
        }
    }

    // -- lifecycle ----------------------------------------------------------

    pub fn on_init(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Init);
        self.object.attach_engine(ctx.engine);
        let (scene, engine) = (self.id(), self.object.engine());
        for entity in &mut self.entities {
            entity.attach_to_scene(scene, engine);
        }
    }

    pub fn on_create(&mut self) {
        self.object.record(Phase::Create);
    }

    /// Bind entities to the engine and load the active ones.
    pub fn on_load(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Load);
        self.object.attach_engine(ctx.engine);
        let (scene, engine) = (self.id(), self.object.engine());
        for entity in &mut self.entities {
            entity.attach_to_scene(scene, engine);
        }
        self.object.flags_mut().loaded = true;
        self.load_unloaded_entities(ctx);
    }

    pub fn on_start(&mut self, ctx: &mut Context<'_>) {
        if !self.object.is_started() {
            self.object.record(Phase::Start);
        }
        self.for_each_loaded(|entity| entity.on_start(ctx));
        self.object.flags_mut().started = true;
    }

    pub fn on_frame_start(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameStart);
        self.load_unloaded_entities(ctx);
        self.for_each_loaded(|entity| entity.on_frame_start(ctx));
    }

    /// Update loaded entities, then sweep collisions.
    pub fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Update);
        self.for_each_loaded(|entity| entity.on_update(ctx));
        self.check_collisions(ctx);
    }

    /// Run after-update hooks, then destroy staged entities.
    pub fn on_after_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::AfterUpdate);
        self.for_each_loaded(|entity| entity.on_after_update(ctx));
        self.flush_deletions(ctx);
    }

    /// Render layer by layer, background first.
    pub fn on_render(&mut self, ctx: &mut Context<'_>, surface: &mut dyn RenderSurface) {
        self.object.record(Phase::Render);
        let index: HashMap<EntityId, usize> = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i))
            .collect();
        for layer in Layer::ALL {
            for id in &self.layers[layer.index()] {
                if let Some(&i) = index.get(id) {
                    self.entities[i].on_render(ctx, surface);
                }
            }
        }
    }

    pub fn on_frame_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameEnd);
        self.for_each_loaded(|entity| entity.on_frame_end(ctx));
    }

    /// Unload every entity without destroying it, so the scene can be
    /// swapped back later.
    pub fn on_swap_from(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::SwapFrom);
        self.unload_loaded_entities(ctx);
        self.unloaded_entities = self.entities.iter().map(Entity::id).collect();
        self.to_delete_entities.clear();
    }

    /// Reload the entities unloaded by [`on_swap_from`](Self::on_swap_from).
    pub fn on_swap_back(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::SwapBack);
        self.load_unloaded_entities(ctx);
    }

    /// Unload loaded entities and forget every entity.
    pub fn on_unload(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Unload);
        self.unload_loaded_entities(ctx);
        self.entities.clear();
        self.unloaded_entities.clear();
        self.to_delete_entities.clear();
        self.handler = None;
        self.object.reset_load_state();
    }

    /// Destroy and drop every entity. Safe to call on an empty scene.
    pub fn on_destroy(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Destroy);
        if !self.entities.is_empty() {
            tracing::debug!(
                scene = %self.name(),
                entities = self.entities.len(),
                "scene destroyed"
            );
        }
        for mut entity in std::mem::take(&mut self.entities) {
            entity.on_destroy(ctx);
            entity.detach_from_scene();
        }
        self.unloaded_entities.clear();
        self.loaded_entities.clear();
        self.to_delete_entities.clear();
        self.collision_collection.clear();
        for layer in &mut self.layers {
            layer.clear();
        }
        self.handler = None;
        self.object.reset_load_state();
    }

    pub fn on_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::End);
        self.for_each_loaded(|entity| entity.on_end(ctx));
    }

    fn unload_loaded_entities(&mut self, ctx: &mut Context<'_>) {
        for id in std::mem::take(&mut self.loaded_entities) {
            if let Some(entity) = self.entities.iter_mut().find(|e| e.id() == id) {
                entity.on_unload(ctx);
            }
        }
        for layer in &mut self.layers {
            layer.clear();
        }
        self.collision_collection.clear();
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("tag", &self.tag)
            .field("entities", &self.entities.len())
            .field("loaded_entities", &self.loaded_entities)
            .field("unloaded_entities", &self.unloaded_entities)
            .field("to_delete_entities", &self.to_delete_entities)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::component::{ComponentCore, ComponentKind, SubscriptionTarget};
    use crate::context::FrameState;
    use crate::event::{signature, DelegateManager};
    use crate::transform::Transform;

    struct Solid {
        core: ComponentCore,
    }

    impl Solid {
        fn new() -> Self {
            let mut core = ComponentCore::new("solid");
            core.set_active(true);
            Self { core }
        }
    }

    impl Component for Solid {
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

    /// Records the `entity`/`other` pairs of every collision it hears of.
    struct Witness {
        core: ComponentCore,
    }

    impl Witness {
        fn new(handler: EntityId, seen: Rc<RefCell<Vec<(EntityId, EntityId)>>>) -> Self {
            let mut core = ComponentCore::new("witness");
            core.set_active(true);
            core.subscribe(
                SubscriptionTarget::Component {
                    entity: Some(handler),
                    kind: ComponentKind::of::<SceneHandler>(),
                    event_name: Some(ON_COLLISION.to_owned()),
                },
                signature(move |_, args| {
                    if let (Some(a), Some(b)) = (args.entity("entity"), args.entity("other")) {
                        seen.borrow_mut().push((a, b));
                    }
                }),
            );
            Self { core }
        }
    }

    impl Component for Witness {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }
    }

    fn solid(name: &str, rect: Rect) -> Entity {
        Entity::new(name)
            .with_transform(Transform::from_rect(rect))
            .with_component(Solid::new())
            .unwrap()
            .activated()
    }

    #[test]
    fn add_entity_registers_the_whole_subtree() {
        let mut scene = Scene::new("level");
        let grandchild = Entity::new("grandchild");
        let child = Entity::new("child").with_child(grandchild);
        let root = Entity::new("root").with_layer(Layer::Top).with_child(child);
        let root_id = scene.add_entity(root);

        let names: Vec<&str> = scene.entities().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["root", "child", "grandchild"]);
        assert_eq!(scene.unloaded_entities().len(), 3);
        let child = scene.entity_by_name("child").unwrap();
        assert_eq!(child.parent(), Some(root_id));
        assert_eq!(child.layer(), Layer::Top);
        assert_eq!(child.scene(), Some(scene.id()));
    }

    #[test]
    fn only_active_entities_load_into_their_layer() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        let idle = scene.add_entity(Entity::new("idle"));
        let hero = scene.add_entity(Entity::new("hero").with_layer(Layer::Background).activated());

        assert_eq!(scene.load_unloaded_entities(&mut ctx), 1);
        assert_eq!(scene.loaded_entities(), &[hero]);
        assert_eq!(scene.unloaded_entities(), &[idle]);
        assert_eq!(scene.layer(Layer::Background), &[hero]);
        assert!(scene.layer(Layer::Middle).is_empty());
        assert!(scene.entity(hero).unwrap().object().is_started());
    }

    #[test]
    fn removal_is_deferred_to_after_update() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        let parent = Entity::new("parent").with_child(Entity::new("child").activated()).activated();
        let parent = scene.add_entity(parent);
        scene.on_load(&mut ctx);
        assert_eq!(scene.loaded_entities().len(), 2);

        assert!(scene.remove_entity(parent));
        assert_eq!(scene.to_delete_entities().len(), 2);
        scene.on_update(&mut ctx);
        assert_eq!(scene.entity_count(), 2);

        scene.on_after_update(&mut ctx);
        assert_eq!(scene.entity_count(), 0);
        assert!(scene.loaded_entities().is_empty());
        assert!(scene.to_delete_entities().is_empty());
        assert!(scene.layer(Layer::Middle).is_empty());
        assert!(!scene.remove_entity(parent));
    }

    #[test]
    fn handler_delegates_appear_once_the_handler_loads() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        scene.add_handler().unwrap();
        assert!(scene.handler_delegate(ON_COLLISION).is_none());

        scene.on_load(&mut ctx);
        let collision = scene.handler_delegate(ON_COLLISION).unwrap();
        assert_ne!(Some(collision), scene.handler_delegate(ON_LOAD));
        assert!(scene.handler_delegate(ON_DESTROY).is_some());
        assert!(scene.handler_delegate("on-jump").is_none());
    }

    #[test]
    fn overlapping_colliders_fire_the_handler_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events = DelegateManager::default();
        events.on_init(None);
        let frame = FrameState::default();
        let mut scene = Scene::new("level");
        events.set_active_scene(Some(scene.id()));
        let mut ctx = Context::new(None, &mut events, &frame);

        let handler = scene.add_handler().unwrap();
        let a = scene.add_entity(solid("a", Rect::new(0.0, 0.0, 10.0, 10.0)));
        let b = scene.add_entity(solid("b", Rect::new(5.0, 5.0, 10.0, 10.0)));
        let observer = Entity::new("observer")
            .with_component(Witness::new(handler, Rc::clone(&seen)))
            .unwrap()
            .activated();
        scene.add_entity(observer);
        scene.on_load(&mut ctx);
        assert_eq!(scene.collision_collection(), &[a, b]);

        scene.on_update(&mut ctx);
        assert_eq!(*seen.borrow(), vec![(a, b)]);
    }

    #[test]
    fn distant_colliders_never_fire() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut scene = Scene::new("level");
        events.set_active_scene(Some(scene.id()));
        let mut ctx = Context::new(None, &mut events, &frame);

        let handler = scene.add_handler().unwrap();
        scene.add_entity(solid("a", Rect::new(0.0, 0.0, 10.0, 10.0)));
        scene.add_entity(solid("b", Rect::new(100.0, 100.0, 10.0, 10.0)));
        scene.add_entity(
            Entity::new("observer")
                .with_component(Witness::new(handler, Rc::clone(&seen)))
                .unwrap()
                .activated(),
        );
        scene.on_load(&mut ctx);
        assert_eq!(scene.check_collisions(&mut ctx), 0);
        scene.on_update(&mut ctx);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn die_on_collision_stages_removal() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        let fragile = scene.add_entity(
            solid("fragile", Rect::new(0.0, 0.0, 10.0, 10.0)).with_die_on_collision(true),
        );
        let rock = scene.add_entity(solid("rock", Rect::new(5.0, 0.0, 10.0, 10.0)));
        scene.on_load(&mut ctx);

        assert_eq!(scene.check_collisions(&mut ctx), 1);
        assert_eq!(scene.to_delete_entities(), &[fragile]);
        assert_eq!(scene.check_collisions(&mut ctx), 0);
        scene.on_after_update(&mut ctx);
        assert!(scene.entity(fragile).is_none());
        assert_eq!(scene.collision_collection(), &[rock]);
    }

    #[test]
    fn load_and_destroy_are_announced_on_system_delegates() {
        let loads = Rc::new(RefCell::new(Vec::new()));
        let mut events = DelegateManager::default();
        events.on_init(None);
        let defaults = events.defaults().unwrap();
        let sink = Rc::clone(&loads);
        events.register_callback_to_delegate(
            crate::event::EventOwner::system(),
            defaults.load,
            signature(move |_, args| sink.borrow_mut().extend(args.entity("entity"))),
        );
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        let hero = scene.add_entity(Entity::new("hero").activated());
        scene.on_load(&mut ctx);
        assert!(loads.borrow().is_empty());

        events.on_update();
        assert_eq!(*loads.borrow(), vec![hero]);
    }

    #[test]
    fn swap_from_and_back_reload_entities() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level");
        let a = scene.add_entity(solid("a", Rect::new(0.0, 0.0, 1.0, 1.0)));
        scene.on_load(&mut ctx);

        scene.on_swap_from(&mut ctx);
        assert!(scene.loaded_entities().is_empty());
        assert_eq!(scene.unloaded_entities(), &[a]);
        assert!(scene.collision_collection().is_empty());
        assert_eq!(scene.entity(a).unwrap().unloaded_components().len(), 1);

        scene.on_swap_back(&mut ctx);
        assert_eq!(scene.loaded_entities(), &[a]);
        assert_eq!(scene.collision_collection(), &[a]);
        assert_eq!(scene.entity(a).unwrap().loaded_components().len(), 1);
    }

    #[test]
    fn destroy_is_idempotent_and_code_repopulates() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut scene = Scene::new("level").with_code(|scene| {
            scene.add_entity(Entity::new("spawned").activated());
        });
        scene.run_code();
        scene.on_load(&mut ctx);
        assert_eq!(scene.loaded_entities().len(), 1);

        scene.on_destroy(&mut ctx);
        scene.on_destroy(&mut ctx);
        assert_eq!(scene.entity_count(), 0);
        assert!(!scene.is_loaded());

        scene.run_code();
        scene.on_load(&mut ctx);
        assert_eq!(scene.loaded_entities().len(), 1);
    }
}
