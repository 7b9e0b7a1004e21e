//! One-shot deferred tasks
//!
//! Tasks are due at a wall-clock time and run on the same timeline as ticks,
//! never concurrently with one.

/// Work that runs after a real-time delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Destroy everything a shield marked
    ShieldDetonation,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    due_ms: f64,
    seq: u64,
    task: DeferredTask,
}

/// Queue of timestamped one-shot tasks
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: Vec<ScheduledTask>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, task: DeferredTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(ScheduledTask { due_ms, seq, task });
    }

    /// Remove and return every task due at `now_ms`, earliest first
    pub fn take_due(&mut self, now_ms: f64) -> Vec<DeferredTask> {
        let mut due: Vec<ScheduledTask> = Vec::new();
        self.queue.retain(|t| {
            if t.due_ms <= now_ms {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|t| t.task).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_once_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(500.0, DeferredTask::ShieldDetonation);
        assert!(scheduler.take_due(499.0).is_empty());
        assert_eq!(scheduler.take_due(500.0), vec![DeferredTask::ShieldDetonation]);
        assert!(scheduler.take_due(10_000.0).is_empty());
    }

    #[test]
    fn test_only_due_tasks_are_taken() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(900.0, DeferredTask::ShieldDetonation);
        scheduler.schedule(100.0, DeferredTask::ShieldDetonation);
        assert_eq!(scheduler.take_due(500.0).len(), 1);
        assert_eq!(scheduler.take_due(900.0).len(), 1);
    }
}
