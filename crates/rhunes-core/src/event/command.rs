//! Deferred structural changes raised from inside callbacks.
//!
//! Callbacks run while their owners are mid-iteration, so they never touch
//! the scene graph directly. Instead they queue a [`Command`] in the
//! [`CommandBuffer`] owned by the delegate manager. The engine drains the
//! buffer at the start of the after-update phase and hands the commands to
//! the containers that own the targets, in FIFO order.

use crate::component::ComponentKind;
use crate::ider::EntityId;

// ---------------------------------------------------------------------------
// SceneSwitch
// ---------------------------------------------------------------------------

/// Which scene to activate next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSwitch {
    First,
    Last,
    Next,
    Prev,
    /// Destroy the active scene and bring it up again.
    Restart,
    /// Activate the scene at the given index, destroying the current one.
    Index(usize),
    /// Activate the scene at the given index, keeping the current one
    /// around for a later swap back.
    Swap(usize),
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A single deferred mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Stage an entity (and its children) for removal from its scene.
    RemoveEntity(EntityId),
    /// Set the `active` flag of an entity.
    SetEntityActive { entity: EntityId, active: bool },
    /// Unload and remove the component of the given kind from an entity.
    RemoveComponent { entity: EntityId, kind: ComponentKind },
    /// Change the active scene.
    SwitchScene(SceneSwitch),
    /// Stop the engine loop once the current frame completes.
    StopEngine,
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Outcome of applying a batch of commands.
///
/// Commands whose target no longer exists are skipped with a warning and
/// counted in `failed_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Number of commands that changed something.
    pub success_count: usize,
    /// Number of commands that targeted a missing entity, component or scene.
    pub failed_count: usize,
}

impl ApplyReport {
    /// Count one command outcome.
    pub fn record(&mut self, applied: bool) {
        if applied {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ApplyReport) {
        self.success_count += other.success_count;
        self.failed_count += other.failed_count;
    }
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// FIFO queue of deferred commands.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary command.
    pub fn push(&mut self, command: Command) {
        tracing::trace!(command = ?command, "command queued");
        self.commands.push(command);
    }

    /// Queue a `RemoveEntity` command.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.push(Command::RemoveEntity(entity));
    }

    /// Queue a `SetEntityActive` command.
    pub fn set_entity_active(&mut self, entity: EntityId, active: bool) {
        self.push(Command::SetEntityActive { entity, active });
    }

    /// Queue a `RemoveComponent` command.
    pub fn remove_component(&mut self, entity: EntityId, kind: ComponentKind) {
        self.push(Command::RemoveComponent { entity, kind });
    }

    /// Queue a `SwitchScene` command.
    pub fn switch_scene(&mut self, switch: SceneSwitch) {
        self.push(Command::SwitchScene(switch));
    }

    /// Queue a `StopEngine` command.
    pub fn stop_engine(&mut self) {
        self.push(Command::StopEngine);
    }

    /// Queued commands in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_fifo_order_and_empties_the_buffer() {
        let entity = EntityId::from_raw(5);
        let mut buffer = CommandBuffer::new();
        buffer.remove_entity(entity);
        buffer.switch_scene(SceneSwitch::Next);
        buffer.stop_engine();
        assert_eq!(buffer.len(), 3);

        let drained = buffer.drain();
        assert_eq!(
            drained,
            vec![
                Command::RemoveEntity(entity),
                Command::SwitchScene(SceneSwitch::Next),
                Command::StopEngine,
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn reports_merge() {
        let mut report = ApplyReport::default();
        report.record(true);
        report.record(false);
        let mut other = ApplyReport::default();
        other.record(true);
        report.merge(other);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
    }
}
