//! Deferred Tasks
//!
//! One-shot effects that fire after a delay, each owned by an entity. Removing
//! the owner cancels its tasks, so a restore can never touch a dead entity.

use crate::components::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Put the owner's speed back to its base value
    RestoreSpeed,
    /// Reset an invader's fear multiplier
    RestoreFear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    pub owner: EntityId,
    pub kind: TaskKind,
    pub remaining: f32,
}

/// Pending tasks, at most one per (owner, kind)
#[derive(Debug, Clone, Default)]
pub struct DeferredTasks {
    tasks: Vec<ScheduledTask>,
}

impl DeferredTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` for `owner` after `delay` seconds. Re-scheduling the same
    /// pair pushes the existing task back instead of adding a second one.
    pub fn schedule(&mut self, owner: EntityId, kind: TaskKind, delay: f32) {
        match self
            .tasks
            .iter_mut()
            .find(|t| t.owner == owner && t.kind == kind)
        {
            Some(task) => task.remaining = delay,
            None => self.tasks.push(ScheduledTask {
                owner,
                kind,
                remaining: delay,
            }),
        }
    }

    /// Drop every task owned by `owner`, returning how many were cancelled
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != owner);
        before - self.tasks.len()
    }

    /// Count down by `dt` and hand back every task that came due
    pub fn advance(&mut self, dt: f32) -> Vec<ScheduledTask> {
        for task in &mut self.tasks {
            task.remaining = (task.remaining - dt).max(0.0);
        }
        let (due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.remaining <= 0.0);
        self.tasks = pending;
        due
    }

    pub fn pending_for(&self, owner: EntityId) -> usize {
        self.tasks.iter().filter(|t| t.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
