//! Deferred one-shot tasks
//!
//! At most one task of each kind is pending. Scheduling a kind replaces the
//! pending task of that kind. Every handle carries a generation so a handle
//! that outlived its cancellation can be recognised and ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Spawn the next moving block
    Spawn,
    /// Demo-mode automatic stop
    AutoStop,
    /// Loop the demo
    DemoRestart,
    /// Pay out a finished run
    Settlement,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Spawn => "spawn",
            TaskKind::AutoStop => "auto-stop",
            TaskKind::DemoRestart => "demo-restart",
            TaskKind::Settlement => "settlement",
        }
    }
}

/// Identity of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub kind: TaskKind,
    pub generation: u64,
    /// Run the task was scheduled for
    pub run_id: u64,
    /// Row of the block the task concerns (auto-stop only)
    pub row: Option<u32>,
    /// Engine clock time at which it fires
    pub due: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    pending: Vec<TaskHandle>,
    next_generation: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire `delay` seconds after `now`, replacing any
    /// pending task of the same kind.
    pub fn schedule(
        &mut self,
        kind: TaskKind,
        now: f64,
        delay: f32,
        run_id: u64,
        row: Option<u32>,
    ) -> TaskHandle {
        if let Some(old) = self.cancel(kind) {
            log::trace!("Replacing pending {} task (gen {})", kind.as_str(), old.generation);
        }
        self.next_generation += 1;
        let handle = TaskHandle {
            kind,
            generation: self.next_generation,
            run_id,
            row,
            due: now + f64::from(delay.max(0.0)),
        };
        self.pending.push(handle);
        handle
    }

    pub fn cancel(&mut self, kind: TaskKind) -> Option<TaskHandle> {
        let index = self.pending.iter().position(|t| t.kind == kind)?;
        Some(self.pending.swap_remove(index))
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self, kind: TaskKind) -> Option<&TaskHandle> {
        self.pending.iter().find(|t| t.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether `handle` is still the pending task of its kind
    pub fn is_live(&self, handle: &TaskHandle) -> bool {
        self.pending
            .iter()
            .any(|t| t.kind == handle.kind && t.generation == handle.generation)
    }

    /// Earliest due time among pending tasks
    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|t| t.due).min_by(f64::total_cmp)
    }

    /// Peek the earliest task due at or before `now` (ties fire in scheduling order)
    pub fn peek_due(&self, now: f64) -> Option<TaskHandle> {
        self.pending
            .iter()
            .filter(|t| t.due <= now)
            .min_by(|a, b| a.due.total_cmp(&b.due).then(a.generation.cmp(&b.generation)))
            .copied()
    }

    /// Remove a live task, returning true if it was pending
    pub fn take(&mut self, handle: &TaskHandle) -> bool {
        match self
            .pending
            .iter()
            .position(|t| t.kind == handle.kind && t.generation == handle.generation)
        {
            Some(index) => {
                self.pending.swap_remove(index);
                true
            }
            None => false,
        }
    }
}
