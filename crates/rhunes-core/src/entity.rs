//! Entities: tree nodes owning components.
//!
//! An entity owns at most one component per [`ComponentKind`] and stages
//! them through two disjoint partitions:
//!
//! - `unloaded_components`: added, or inactive, or unloaded by a scene swap;
//! - `loaded_components`: loaded and eligible for per-frame hooks.
//!
//! Their union is always the full component list. Components move from
//! unloaded to loaded in [`Entity::load_unloaded_components`], which runs at
//! every frame start. Whenever at least one component loads, every active
//! loaded component is (re)started together, so siblings can resolve
//! subscriptions to each other.
//!
//! Children are owned by the scene once the entity joins one. Before that, a
//! detached entity keeps its children and hands them over in
//! `Scene::add_entity`.

use serde::{Deserialize, Serialize};

use crate::component::{self, Component, ComponentKind};
use crate::context::{ComponentContext, Context};
use crate::ider::{ComponentId, DelegateId, EngineId, EntityId, SceneId};
use crate::lifecycle::{EngineObject, Phase};
use crate::math::Rect;
use crate::surface::RenderSurface;
use crate::transform::Transform;
use crate::CoreError;

// ---------------------------------------------------------------------------
// Layer
// ---------------------------------------------------------------------------

/// Render layer. Layers are drawn in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layer {
    Background,
    #[default]
    Middle,
    Top,
}

impl Layer {
    /// Every layer, in render order.
    pub const ALL: [Layer; 3] = [Layer::Background, Layer::Middle, Layer::Top];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Middle => "middle",
            Layer::Top => "top",
        }
    }

    /// Position in [`Layer::ALL`].
    pub fn index(self) -> usize {
        match self {
            Layer::Background => 0,
            Layer::Middle => 1,
            Layer::Top => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// ChildLink
// ---------------------------------------------------------------------------

/// A parent's reference to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    pub id: EntityId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// The entity-level data copied into every component context.
#[derive(Clone, Copy)]
struct Host {
    entity: EntityId,
    scene: Option<SceneId>,
    die_on_out_of_bounds: bool,
}

impl Host {
    fn ctx<'b>(
        self,
        ctx: &'b mut Context<'_>,
        transform: &'b mut Transform,
    ) -> ComponentContext<'b> {
        ComponentContext {
            engine: ctx.engine,
            entity: self.entity,
            scene: self.scene,
            transform,
            die_on_out_of_bounds: self.die_on_out_of_bounds,
            events: &mut *ctx.events,
            frame: ctx.frame,
        }
    }
}

/// Run `f` on the components listed in `ids`, in list order.
fn drive(
    components: &mut [Box<dyn Component>],
    ids: &[ComponentId],
    only_active: bool,
    host: Host,
    ctx: &mut Context<'_>,
    transform: &mut Transform,
    mut f: impl FnMut(&mut dyn Component, &mut ComponentContext<'_>),
) {
    for id in ids {
        let Some(component) = components.iter_mut().find(|c| c.core().id() == *id) else {
            continue;
        };
        if only_active && !component.core().is_active() {
            continue;
        }
        let mut component_ctx = host.ctx(ctx, transform);
        f(&mut **component, &mut component_ctx);
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A node in the entity tree, with a transform, a render layer and
/// components.
pub struct Entity {
    object: EngineObject<EntityId>,
    layer: Layer,
    parent: Option<EntityId>,
    children: Vec<ChildLink>,
    /// Children not handed over to a scene yet.
    detached_children: Vec<Entity>,
    scene: Option<SceneId>,
    transform: Transform,
    components: Vec<Box<dyn Component>>,
    unloaded_components: Vec<ComponentId>,
    loaded_components: Vec<ComponentId>,
    die_on_collision: bool,
    die_on_out_of_bounds: bool,
}

impl Entity {
    /// Create an inactive, detached entity on the middle layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(EntityId::next(), name),
            layer: Layer::default(),
            parent: None,
            children: Vec::new(),
            detached_children: Vec::new(),
            scene: None,
            transform: Transform::default(),
            components: Vec::new(),
            unloaded_components: Vec::new(),
            loaded_components: Vec::new(),
            die_on_collision: false,
            die_on_out_of_bounds: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_die_on_collision(mut self, die: bool) -> Self {
        self.die_on_collision = die;
        self
    }

    pub fn with_die_on_out_of_bounds(mut self, die: bool) -> Self {
        self.die_on_out_of_bounds = die;
        self
    }

    /// Builder form of [`on_active`](Self::on_active).
    pub fn activated(mut self) -> Self {
        self.on_active();
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn object(&self) -> &EngineObject<EntityId> {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut EngineObject<EntityId> {
        &mut self.object
    }

    pub fn id(&self) -> EntityId {
        self.object.id()
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    pub fn is_active(&self) -> bool {
        self.object.is_active()
    }

    pub fn set_active(&mut self, active: bool) {
        self.object.set_active(active);
    }

    pub fn is_visible(&self) -> bool {
        self.object.is_visible()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.object.set_visible(visible);
    }

    pub fn is_loaded(&self) -> bool {
        self.object.is_loaded()
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Change the layer. Takes effect on the next load.
    pub fn set_layer(&mut self, layer: Layer) {
        self.layer = layer;
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[ChildLink] {
        &self.children
    }

    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub fn engine(&self) -> Option<EngineId> {
        self.object.engine()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn die_on_collision(&self) -> bool {
        self.die_on_collision
    }

    pub fn set_die_on_collision(&mut self, die: bool) {
        self.die_on_collision = die;
    }

    pub fn die_on_out_of_bounds(&self) -> bool {
        self.die_on_out_of_bounds
    }

    pub fn set_die_on_out_of_bounds(&mut self, die: bool) {
        self.die_on_out_of_bounds = die;
    }

    fn host(&self) -> Host {
        Host {
            entity: self.object.id(),
            scene: self.scene,
            die_on_out_of_bounds: self.die_on_out_of_bounds,
        }
    }

    // -- children -----------------------------------------------------------

    /// Adopt `child`: it takes this entity's layer and becomes part of the
    /// subtree handed to the scene by `Scene::add_entity`.
    ///
    /// Children added after the entity joined a scene must go through
    /// `Scene::add_child` instead.
    pub fn add_child(&mut self, mut child: Entity) -> EntityId {
        let id = child.id();
        tracing::debug!(entity = %self.id(), child = %id, "child added");
        child.parent = Some(self.id());
        child.layer = self.layer;
        self.children.push(ChildLink {
            id,
            name: child.name().to_owned(),
        });
        self.detached_children.push(child);
        id
    }

    /// Builder form of [`add_child`](Self::add_child).
    pub fn with_child(mut self, child: Entity) -> Self {
        self.add_child(child);
        self
    }

    /// Record a child already registered in the scene.
    pub(crate) fn link_child(&mut self, child: &mut Entity) {
        child.parent = Some(self.id());
        child.layer = self.layer;
        self.children.push(ChildLink {
            id: child.id(),
            name: child.name().to_owned(),
        });
    }

    /// Unlink a child by id. Returns `false` if it is not a child.
    pub fn delete_child(&mut self, child: EntityId) -> bool {
        let Some(index) = self.children.iter().position(|link| link.id == child) else {
            return false;
        };
        tracing::debug!(entity = %self.id(), child = %child, "child deleted");
        self.children.remove(index);
        self.detached_children.retain(|entity| entity.id() != child);
        true
    }

    /// Unlink the first child named `name`.
    pub fn delete_child_by_name(&mut self, name: &str) -> bool {
        match self.children.iter().find(|link| link.name == name) {
            Some(link) => {
                let id = link.id;
                self.delete_child(id)
            }
            None => false,
        }
    }

    pub(crate) fn take_detached_children(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.detached_children)
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
    }

    // -- components ---------------------------------------------------------

    /// Attach a component. It starts in the unloaded partition.
    ///
    /// Fails if the entity already holds a component of the same kind, or if
    /// the component is attached elsewhere.
    pub fn add_component(&mut self, component: impl Component) -> Result<&mut Self, CoreError> {
        self.add_boxed_component(Box::new(component))
    }

    /// Boxed form of [`add_component`](Self::add_component).
    pub fn add_boxed_component(
        &mut self,
        mut component: Box<dyn Component>,
    ) -> Result<&mut Self, CoreError> {
        let kind = component.kind();
        if self.has_component(kind) {
            tracing::error!(entity = %self.id(), kind = %kind, "duplicate component kind");
            return Err(CoreError::DuplicateComponent {
                entity: self.id(),
                kind: kind.name(),
            });
        }
        if let Some(entity) = component.core().entity() {
            return Err(CoreError::ComponentAlreadyAttached {
                component: component.core().id(),
                entity,
            });
        }
        let id = component.core().id();
        tracing::debug!(entity = %self.id(), component = %id, kind = %kind, "component added");
        component
            .core_mut()
            .attach(kind, self.id(), self.scene, self.object.engine());
        self.components.push(component);
        self.unloaded_components.push(id);
        Ok(self)
    }

    /// Builder form of [`add_component`](Self::add_component).
    pub fn with_component(mut self, component: impl Component) -> Result<Self, CoreError> {
        self.add_component(component)?;
        Ok(self)
    }

    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| &**c)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn unloaded_components(&self) -> &[ComponentId] {
        &self.unloaded_components
    }

    pub fn loaded_components(&self) -> &[ComponentId] {
        &self.loaded_components
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub fn get_component_by_kind(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.components.iter().find(|c| c.kind() == kind).map(|c| &**c)
    }

    pub fn get_component_by_kind_mut(&mut self, kind: ComponentKind) -> Option<&mut dyn Component> {
        match self.components.iter_mut().find(|c| c.kind() == kind) {
            Some(component) => Some(&mut **component),
            None => None,
        }
    }

    /// The component of type `T`, if attached.
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.get_component_by_kind(ComponentKind::of::<T>())?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.get_component_by_kind_mut(ComponentKind::of::<T>())?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// The first delegate of the component of the given kind.
    pub fn get_delegate_for_component(&self, kind: ComponentKind) -> Option<DelegateId> {
        self.get_component_by_kind(kind)?.core().delegate()
    }

    /// Whether an active component gives this entity a collider.
    pub fn has_collider(&self) -> bool {
        self.components
            .iter()
            .any(|c| c.core().is_active() && c.collider_rect(&self.transform).is_some())
    }

    /// The collider rectangle of the first loaded, active collider.
    pub fn collider_rect(&self) -> Option<Rect> {
        self.loaded_components.iter().find_map(|id| {
            let component = self.components.iter().find(|c| c.core().id() == *id)?;
            if !component.core().is_active() {
                return None;
            }
            component.collider_rect(&self.transform)
        })
    }

    /// Unload and detach the component of the given kind.
    pub fn remove_component(
        &mut self,
        ctx: &mut Context<'_>,
        kind: ComponentKind,
    ) -> Option<Box<dyn Component>> {
        let index = self.components.iter().position(|c| c.kind() == kind)?;
        let host = self.host();
        let mut removed = self.components.remove(index);
        let id = removed.core().id();
        component::unload(&mut *removed, &mut host.ctx(ctx, &mut self.transform));
        self.loaded_components.retain(|c| *c != id);
        self.unloaded_components.retain(|c| *c != id);
        removed.core_mut().detach();
        tracing::debug!(entity = %self.id(), component = %id, kind = %kind, "component removed");
        Some(removed)
    }

    /// Unload and detach every component.
    pub fn remove_components(&mut self, ctx: &mut Context<'_>) -> Vec<Box<dyn Component>> {
        let host = self.host();
        let mut removed = std::mem::take(&mut self.components);
        for component in &mut removed {
            component::unload(&mut **component, &mut host.ctx(ctx, &mut self.transform));
            component.core_mut().detach();
        }
        self.loaded_components.clear();
        self.unloaded_components.clear();
        tracing::debug!(entity = %self.id(), count = removed.len(), "components removed");
        removed
    }

    /// Load every active unloaded component, then start all active loaded
    /// components if anything loaded. Returns the number of components
    /// loaded by this pass.
    pub fn load_unloaded_components(&mut self, ctx: &mut Context<'_>) -> usize {
        let host = self.host();
        let Self {
            components,
            unloaded_components,
            loaded_components,
            transform,
            ..
        } = self;

        let mut loaded_now = 0;
        let mut still_unloaded = Vec::new();
        for id in std::mem::take(unloaded_components) {
            let Some(component) = components.iter_mut().find(|c| c.core().id() == id) else {
                continue;
            };
            if !component.core().is_active() {
                still_unloaded.push(id);
                continue;
            }
            let mut component_ctx = host.ctx(ctx, transform);
            if component.core().phase() == Phase::Created {
                component::init(&mut **component, &mut component_ctx);
            }
            component::load(&mut **component, &mut component_ctx);
            loaded_components.push(id);
            loaded_now += 1;
        }
        *unloaded_components = still_unloaded;

        if loaded_now > 0 {
            drive(components, loaded_components, true, host, ctx, transform, component::start);
        }
        loaded_now
    }

    // -- attachment ---------------------------------------------------------

    /// Bind the entity and its components to a scene and an engine.
    pub(crate) fn attach_to_scene(&mut self, scene: SceneId, engine: Option<EngineId>) {
        self.scene = Some(scene);
        self.object.attach_engine(engine);
        for component in &mut self.components {
            let core = component.core_mut();
            core.set_scene(Some(scene));
            core.object_mut().attach_engine(engine);
        }
    }

    /// Clear the scene and engine back-references.
    pub(crate) fn detach_from_scene(&mut self) {
        self.scene = None;
        self.object.detach_engine();
        for component in &mut self.components {
            let core = component.core_mut();
            core.set_scene(None);
            core.object_mut().detach_engine();
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Activate the entity and every component it holds.
    pub fn on_active(&mut self) {
        self.object.record(Phase::Active);
        self.object.set_active(true);
        for component in &mut self.components {
            component.core_mut().set_active(true);
        }
    }

    pub fn on_init(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Init);
        self.object.attach_engine(ctx.engine);
        let host = self.host();
        let Self {
            components, transform, ..
        } = self;
        for component in components.iter_mut() {
            if component.core().phase() == Phase::Created {
                component::init(&mut **component, &mut host.ctx(ctx, transform));
            }
        }
    }

    pub fn on_load(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Load);
        self.object.attach_engine(ctx.engine);
        self.object.flags_mut().loaded = true;
        self.load_unloaded_components(ctx);
    }

    pub fn on_start(&mut self, ctx: &mut Context<'_>) {
        if !self.object.is_started() {
            self.object.record(Phase::Start);
        }
        let host = self.host();
        let Self {
            components,
            loaded_components,
            transform,
            ..
        } = self;
        drive(components, loaded_components, true, host, ctx, transform, component::start);
        self.object.flags_mut().started = true;
    }

    pub fn on_frame_start(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameStart);
        self.load_unloaded_components(ctx);
        self.drive_loaded(ctx, component::frame_start);
    }

    pub fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Update);
        self.drive_loaded(ctx, component::update);
    }

    pub fn on_after_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::AfterUpdate);
        self.drive_loaded(ctx, component::after_update);
    }

    /// Render active loaded components. Invisible entities draw nothing.
    pub fn on_render(&mut self, ctx: &mut Context<'_>, surface: &mut dyn RenderSurface) {
        self.object.record(Phase::Render);
        if !self.object.is_visible() {
            return;
        }
        self.drive_loaded(ctx, |component, component_ctx| {
            component::render(component, component_ctx, &mut *surface)
        });
    }

    pub fn on_frame_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameEnd);
        self.drive_loaded(ctx, component::frame_end);
    }

    /// Unload every loaded component and move it back to the unloaded
    /// partition.
    pub fn on_unload(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Unload);
        let host = self.host();
        let Self {
            components,
            unloaded_components,
            loaded_components,
            transform,
            ..
        } = self;
        let loaded = std::mem::take(loaded_components);
        drive(components, &loaded, false, host, ctx, transform, component::unload);
        unloaded_components.extend(loaded);
        self.object.reset_load_state();
    }

    /// Destroy and drop every component.
    pub fn on_destroy(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Destroy);
        let host = self.host();
        let mut destroyed = std::mem::take(&mut self.components);
        for component in &mut destroyed {
            component::destroy(&mut **component, &mut host.ctx(ctx, &mut self.transform));
            component.core_mut().detach();
        }
        self.loaded_components.clear();
        self.unloaded_components.clear();
        self.object.reset_load_state();
        if !destroyed.is_empty() {
            tracing::debug!(entity = %self.id(), components = destroyed.len(), "entity destroyed");
        }
    }

    pub fn on_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::End);
        self.drive_loaded(ctx, component::end);
    }

    fn drive_loaded(
        &mut self,
        ctx: &mut Context<'_>,
        f: impl FnMut(&mut dyn Component, &mut ComponentContext<'_>),
    ) {
        let host = self.host();
        let Self {
            components,
            loaded_components,
            transform,
            ..
        } = self;
        drive(components, loaded_components, true, host, ctx, transform, f);
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("layer", &self.layer)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("scene", &self.scene)
            .field("components", &self.components.len())
            .field("loaded_components", &self.loaded_components)
            .field("unloaded_components", &self.unloaded_components)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentCore;
    use crate::context::FrameState;
    use crate::event::DelegateManager;
    use crate::math::{Color, Vec2};
    use crate::surface::RecordingSurface;

    struct Counter {
        core: ComponentCore,
        updates: u32,
        starts: u32,
    }

    impl Counter {
        fn new(active: bool) -> Self {
            let mut core = ComponentCore::new("counter");
            core.set_active(active);
            Self {
                core,
                updates: 0,
                starts: 0,
            }
        }
    }

    impl Component for Counter {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn on_start(&mut self, _ctx: &mut ComponentContext<'_>) {
            self.starts += 1;
        }

        fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
            self.updates += 1;
            ctx.transform.position += Vec2::new(1.0, 0.0);
        }
    }

    struct Painter {
        core: ComponentCore,
    }

    impl Painter {
        fn new() -> Self {
            let mut core = ComponentCore::new("painter");
            core.set_active(true);
            Self { core }
        }
    }

    impl Component for Painter {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn collider_rect(&self, transform: &Transform) -> Option<Rect> {
            Some(transform.rect())
        }

        fn on_render(&mut self, ctx: &mut ComponentContext<'_>, surface: &mut dyn RenderSurface) {
            surface.draw_rect(ctx.transform.rect(), Color::BLACK, 0);
        }
    }

    fn assert_partitions(entity: &Entity) {
        let mut all: Vec<_> = entity.components().map(|c| c.core().id()).collect();
        let mut staged: Vec<_> = entity
            .unloaded_components()
            .iter()
            .chain(entity.loaded_components())
            .copied()
            .collect();
        all.sort();
        staged.sort();
        assert_eq!(all, staged);
        for id in entity.unloaded_components() {
            assert!(!entity.loaded_components().contains(id));
        }
    }

    #[test]
    fn duplicate_kind_is_rejected() {
        let mut entity = Entity::new("player");
        entity.add_component(Counter::new(true)).unwrap();
        let err = entity.add_component(Counter::new(true)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateComponent { kind: "Counter", .. }));
        assert_eq!(entity.component_count(), 1);
        assert_eq!(entity.unloaded_components().len(), 1);
        assert_partitions(&entity);
    }

    #[test]
    fn added_component_is_bound_to_the_entity() {
        let mut entity = Entity::new("player");
        entity.add_component(Counter::new(false)).unwrap();
        let counter = entity.get_component::<Counter>().unwrap();
        assert_eq!(counter.core().entity(), Some(entity.id()));
        assert_eq!(counter.core().kind(), Some(ComponentKind::of::<Counter>()));
        assert!(entity.get_component::<Painter>().is_none());
    }

    #[test]
    fn only_active_components_load() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("player");
        entity.add_component(Counter::new(false)).unwrap();
        entity.add_component(Painter::new()).unwrap();

        assert_eq!(entity.load_unloaded_components(&mut ctx), 1);
        assert_eq!(entity.loaded_components().len(), 1);
        assert_eq!(entity.unloaded_components().len(), 1);
        assert_partitions(&entity);

        entity.get_component_mut::<Counter>().unwrap().core_mut().set_active(true);
        assert_eq!(entity.load_unloaded_components(&mut ctx), 1);
        assert!(entity.unloaded_components().is_empty());
        assert_eq!(entity.get_component::<Counter>().unwrap().starts, 1);
        assert_partitions(&entity);
    }

    #[test]
    fn updates_reach_loaded_active_components_only() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("player").activated();
        entity.add_component(Counter::new(true)).unwrap();

        entity.on_update(&mut ctx);
        assert_eq!(entity.get_component::<Counter>().unwrap().updates, 0);

        entity.on_load(&mut ctx);
        entity.on_update(&mut ctx);
        entity.get_component_mut::<Counter>().unwrap().core_mut().set_active(false);
        entity.on_update(&mut ctx);
        assert_eq!(entity.get_component::<Counter>().unwrap().updates, 1);
        assert_eq!(entity.transform().position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn remove_component_unloads_and_detaches() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("player");
        entity.add_component(Counter::new(true)).unwrap();
        entity.on_load(&mut ctx);

        let removed = entity
            .remove_component(&mut ctx, ComponentKind::of::<Counter>())
            .unwrap();
        assert!(removed.core().entity().is_none());
        assert!(removed.core().engine().is_none());
        assert_eq!(removed.core().phase(), Phase::Unload);
        assert_eq!(entity.component_count(), 0);
        assert_partitions(&entity);
        assert!(entity
            .remove_component(&mut ctx, ComponentKind::of::<Counter>())
            .is_none());
    }

    #[test]
    fn unload_moves_components_back_to_unloaded() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("player");
        entity.add_component(Counter::new(true)).unwrap();
        entity.add_component(Painter::new()).unwrap();
        entity.on_load(&mut ctx);
        assert_eq!(entity.loaded_components().len(), 2);

        entity.on_unload(&mut ctx);
        entity.on_unload(&mut ctx);
        assert!(entity.loaded_components().is_empty());
        assert_eq!(entity.unloaded_components().len(), 2);
        assert_partitions(&entity);

        entity.on_destroy(&mut ctx);
        entity.on_destroy(&mut ctx);
        assert_eq!(entity.component_count(), 0);
        assert_partitions(&entity);
    }

    #[test]
    fn children_take_the_parent_layer() {
        let mut parent = Entity::new("parent").with_layer(Layer::Top);
        let child = parent.add_child(Entity::new("child"));
        assert_eq!(parent.children().len(), 1);
        let detached = parent.take_detached_children();
        assert_eq!(detached[0].layer(), Layer::Top);
        assert_eq!(detached[0].parent(), Some(parent.id()));
        assert!(parent.delete_child(child));
        assert!(!parent.delete_child(child));
    }

    #[test]
    fn delete_child_by_name_misses_cleanly() {
        let mut parent = Entity::new("parent").with_child(Entity::new("left"));
        assert!(!parent.delete_child_by_name("right"));
        assert!(parent.delete_child_by_name("left"));
        assert!(parent.children().is_empty());
    }

    #[test]
    fn invisible_entities_do_not_render() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut surface = RecordingSurface::new(100.0, 100.0);
        let mut entity = Entity::new("box")
            .with_transform(Transform::from_rect(Rect::new(0.0, 0.0, 4.0, 4.0)));
        entity.add_component(Painter::new()).unwrap();
        entity.on_load(&mut ctx);

        entity.on_render(&mut ctx, &mut surface);
        assert_eq!(surface.rects().count(), 1);
        entity.set_visible(false);
        entity.on_render(&mut ctx, &mut surface);
        assert_eq!(surface.rects().count(), 1);
    }

    #[test]
    fn collider_rect_needs_a_loaded_collider() {
        let mut events = DelegateManager::default();
        let frame = FrameState::default();
        let mut ctx = Context::new(None, &mut events, &frame);
        let mut entity = Entity::new("box")
            .with_transform(Transform::from_rect(Rect::new(1.0, 1.0, 4.0, 4.0)));
        entity.add_component(Painter::new()).unwrap();
        assert!(entity.has_collider());
        assert!(entity.collider_rect().is_none());
        entity.on_load(&mut ctx);
        assert_eq!(entity.collider_rect(), Some(Rect::new(1.0, 1.0, 4.0, 4.0)));
    }
}
