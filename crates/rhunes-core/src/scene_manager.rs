//! The scene manager: an ordered scene list and a single active scene.
//!
//! Only the active scene receives frame hooks. Switching scenes destroys the
//! outgoing scene, then runs the incoming scene's code hook, loads it and
//! starts it. Swapping (see [`SceneManager::swap_active_scene`]) unloads the
//! outgoing scene instead, so it can be brought back with its entities.
//!
//! Navigation past either end of the list is a no-op returning `None`.

use crate::context::Context;
use crate::event::{ApplyReport, Command, SceneSwitch};
use crate::ider::{ManagerId, SceneId};
use crate::lifecycle::{EngineObject, Phase};
use crate::scene::Scene;
use crate::surface::RenderSurface;

// ---------------------------------------------------------------------------
// ActiveScene
// ---------------------------------------------------------------------------

/// The manager's pointer into its scene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveScene {
    pub scene: SceneId,
    pub index: usize,
}

// ---------------------------------------------------------------------------
// SceneManager
// ---------------------------------------------------------------------------

/// Holds every scene and drives the active one.
pub struct SceneManager {
    object: EngineObject<ManagerId>,
    scenes: Vec<Scene>,
    active: Option<ActiveScene>,
}

impl SceneManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: EngineObject::new(ManagerId::next(), name),
            scenes: Vec::new(),
            active: None,
        }
    }

    pub fn object(&self) -> &EngineObject<ManagerId> {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut EngineObject<ManagerId> {
        &mut self.object
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn phase(&self) -> Phase {
        self.object.phase()
    }

    // -- scene list ---------------------------------------------------------

    /// Append a scene. The first scene added becomes the assigned active
    /// scene, without any lifecycle transition.
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = scene.id();
        tracing::debug!(manager = %self.name(), scene = %scene.name(), "scene added");
        self.scenes.push(scene);
        if self.active.is_none() {
            self.assign_active_scene(self.scenes.len() - 1);
        }
        id
    }

    /// Remove a scene from the list. Removing the active scene leaves the
    /// manager without one.
    pub fn delete_scene(&mut self, id: SceneId) -> Option<Scene> {
        let index = self.scenes.iter().position(|s| s.id() == id)?;
        let scene = self.scenes.remove(index);
        self.active = match self.active {
            Some(active) if active.index == index => None,
            Some(active) if active.index > index => Some(ActiveScene {
                index: active.index - 1,
                ..active
            }),
            other => other,
        };
        tracing::debug!(manager = %self.name(), scene = %scene.name(), "scene deleted");
        Some(scene)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn get_scene_by_id(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id() == id)
    }

    pub fn get_scene_by_id_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id() == id)
    }

    pub fn get_scene_by_name(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name() == name)
    }

    pub fn get_scene_by_name_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.name() == name)
    }

    pub fn active(&self) -> Option<ActiveScene> {
        self.active
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.active?.index)
    }

    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.scenes.get_mut(self.active?.index)
    }

    // -- switching ----------------------------------------------------------

    /// Point at the scene at `index` without running any transition.
    /// Returns `false` if the index is out of range.
    pub fn assign_active_scene(&mut self, index: usize) -> bool {
        let Some(scene) = self.scenes.get(index) else {
            return false;
        };
        self.active = Some(ActiveScene {
            scene: scene.id(),
            index,
        });
        true
    }

    /// Switch to the scene with the given id.
    pub fn set_active_scene(&mut self, ctx: &mut Context<'_>, id: SceneId) -> bool {
        match self.scenes.iter().position(|s| s.id() == id) {
            Some(index) => {
                self.transition(ctx, index);
                true
            }
            None => false,
        }
    }

    pub fn set_active_first_scene(&mut self, ctx: &mut Context<'_>) -> Option<ActiveScene> {
        if self.scenes.is_empty() {
            return None;
        }
        Some(self.transition(ctx, 0))
    }

    pub fn set_active_last_scene(&mut self, ctx: &mut Context<'_>) -> Option<ActiveScene> {
        let last = self.scenes.len().checked_sub(1)?;
        Some(self.transition(ctx, last))
    }

    /// Step forward. At the last scene this is a no-op returning `None`.
    pub fn set_active_next_scene(&mut self, ctx: &mut Context<'_>) -> Option<ActiveScene> {
        let next = self.active?.index + 1;
        if next >= self.scenes.len() {
            return None;
        }
        Some(self.transition(ctx, next))
    }

    /// Step back. At the first scene this is a no-op returning `None`.
    pub fn set_active_prev_scene(&mut self, ctx: &mut Context<'_>) -> Option<ActiveScene> {
        let prev = self.active?.index.checked_sub(1)?;
        Some(self.transition(ctx, prev))
    }

    /// Destroy and bring up the active scene again.
    pub fn restart_scene(&mut self, ctx: &mut Context<'_>) -> bool {
        match self.active {
            Some(active) => {
                self.transition(ctx, active.index);
                true
            }
            None => false,
        }
    }

    /// Switch to the scene at `index`, unloading the current scene instead
    /// of destroying it. A scene swapped away earlier is reloaded as it was.
    pub fn swap_active_scene(
        &mut self,
        ctx: &mut Context<'_>,
        index: usize,
    ) -> Option<ActiveScene> {
        if index >= self.scenes.len() {
            return None;
        }
        if let Some(previous) = self.active.and_then(|a| self.scenes.get_mut(a.index)) {
            previous.on_swap_from(ctx);
        }
        let active = self.activate(ctx, index);
        let scene = &mut self.scenes[index];
        if scene.phase() == Phase::SwapFrom {
            scene.on_swap_back(ctx);
        } else {
            Self::bring_up(scene, ctx);
        }
        tracing::info!(
            manager = %self.name(),
            scene = %self.scenes[index].name(),
            "scene swapped in"
        );
        Some(active)
    }

    /// Destroy the active scene, then bring up the scene at `index`.
    fn transition(&mut self, ctx: &mut Context<'_>, index: usize) -> ActiveScene {
        if let Some(previous) = self.active.and_then(|a| self.scenes.get_mut(a.index)) {
            previous.on_destroy(ctx);
        }
        let active = self.activate(ctx, index);
        Self::bring_up(&mut self.scenes[index], ctx);
        tracing::info!(
            manager = %self.name(),
            scene = %self.scenes[index].name(),
            "scene activated"
        );
        active
    }

    fn activate(&mut self, ctx: &mut Context<'_>, index: usize) -> ActiveScene {
        let active = ActiveScene {
            scene: self.scenes[index].id(),
            index,
        };
        self.active = Some(active);
        ctx.events.set_active_scene(Some(active.scene));
        active
    }

    fn bring_up(scene: &mut Scene, ctx: &mut Context<'_>) {
        if scene.phase() == Phase::Created {
            scene.on_init(ctx);
        }
        scene.run_code();
        scene.on_load(ctx);
        scene.on_start(ctx);
    }

    // -- commands -----------------------------------------------------------

    /// Apply queued structural changes to the active scene, in order.
    ///
    /// `StopEngine` is not a scene concern and counts as a failure here.
    pub fn apply_commands(&mut self, ctx: &mut Context<'_>, commands: Vec<Command>) -> ApplyReport {
        let mut report = ApplyReport::default();
        for command in commands {
            let applied = self.apply_command(ctx, &command);
            if !applied {
                tracing::warn!(manager = %self.name(), ?command, "command not applied");
            }
            report.record(applied);
        }
        report
    }

    fn apply_command(&mut self, ctx: &mut Context<'_>, command: &Command) -> bool {
        match command {
            Command::RemoveEntity(entity) => self
                .active_scene_mut()
                .is_some_and(|scene| scene.remove_entity(*entity)),
            Command::SetEntityActive { entity, active } => {
                match self.active_scene_mut().and_then(|s| s.entity_mut(*entity)) {
                    Some(target) if *active => {
                        target.on_active();
                        true
                    }
                    Some(target) => {
                        target.set_active(false);
                        true
                    }
                    None => false,
                }
            }
            Command::RemoveComponent { entity, kind } => self
                .active_scene_mut()
                .and_then(|s| s.entity_mut(*entity))
                .and_then(|target| target.remove_component(ctx, *kind))
                .is_some(),
            Command::SwitchScene(switch) => match switch {
                SceneSwitch::First => self.set_active_first_scene(ctx).is_some(),
                SceneSwitch::Last => self.set_active_last_scene(ctx).is_some(),
                SceneSwitch::Next => self.set_active_next_scene(ctx).is_some(),
                SceneSwitch::Prev => self.set_active_prev_scene(ctx).is_some(),
                SceneSwitch::Restart => self.restart_scene(ctx),
                SceneSwitch::Index(index) => match self.scenes.get(*index).map(Scene::id) {
                    Some(id) => self.set_active_scene(ctx, id),
                    None => false,
                },
                SceneSwitch::Swap(index) => self.swap_active_scene(ctx, *index).is_some(),
            },
            Command::StopEngine => false,
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Initialize every scene.
    pub fn on_init(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Init);
        self.object.attach_engine(ctx.engine);
        for scene in &mut self.scenes {
            scene.on_init(ctx);
        }
    }

    pub fn on_create(&mut self) {
        self.object.record(Phase::Create);
        for scene in &mut self.scenes {
            scene.on_create();
        }
    }

    /// Bring up the assigned active scene unless it is already loaded.
    pub fn on_start(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Start);
        if let Some(active) = self.active {
            ctx.events.set_active_scene(Some(active.scene));
            let scene = &mut self.scenes[active.index];
            if !scene.is_loaded() {
                Self::bring_up(scene, ctx);
            }
            tracing::info!(
                manager = %self.object.name(),
                scene = %scene.name(),
                "active scene started"
            );
        }
        self.object.flags_mut().started = true;
    }

    pub fn on_frame_start(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameStart);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_frame_start(ctx);
        }
    }

    pub fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Update);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_update(ctx);
        }
    }

    pub fn on_after_update(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::AfterUpdate);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_after_update(ctx);
        }
    }

    pub fn on_render(&mut self, ctx: &mut Context<'_>, surface: &mut dyn RenderSurface) {
        self.object.record(Phase::Render);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_render(ctx, surface);
        }
    }

    pub fn on_frame_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::FrameEnd);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_frame_end(ctx);
        }
    }

    pub fn on_unload(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Unload);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_unload(ctx);
        }
        self.object.reset_load_state();
    }

    /// Destroy every scene. The list itself is kept.
    pub fn on_destroy(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::Destroy);
        for scene in &mut self.scenes {
            scene.on_destroy(ctx);
        }
        self.object.reset_load_state();
    }

    pub fn on_cleanup(&mut self) {
        self.object.record(Phase::Cleanup);
    }

    pub fn on_end(&mut self, ctx: &mut Context<'_>) {
        self.object.record(Phase::End);
        if let Some(scene) = self.active_scene_mut() {
            scene.on_end(ctx);
        }
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new("scene-manager")
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("id", &self.object.id())
            .field("name", &self.name())
            .field("scenes", &self.scenes.iter().map(Scene::name).collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
