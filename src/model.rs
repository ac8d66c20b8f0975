/// Pool-level lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting `post`.
    Active,
    /// Stop flag set; workers are still consuming queued tasks.
    Draining,
    /// Every worker has exited.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub num_threads: usize,
    pub live_workers: usize,
    pub active_tasks: usize,
    pub idle_workers: usize,
    pub queued_tasks: usize,
    pub total_posted: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.active_tasks as f64 / self.live_workers as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }

    /// Tasks posted but not yet finished, queued or running.
    pub fn pending(&self) -> usize {
        self.total_posted
            .saturating_sub(self.completed_tasks + self.failed_tasks)
    }
}
