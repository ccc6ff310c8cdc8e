// Timed tasks - Delayed actions with cancellation handles
use std::collections::{BTreeMap, HashMap};

/// Identifies a scheduled task so a later interaction can cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
pub struct Scheduler<A> {
    next_id: u64,
    queue: BTreeMap<(i64, u64), A>,
    deadlines: HashMap<u64, i64>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<A> Scheduler<A> {
    pub fn schedule(&mut self, now_ms: i64, delay_ms: i64, action: A) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;

        let deadline = now_ms + delay_ms.max(0);
        self.queue.insert((deadline, id), action);
        self.deadlines.insert(id, deadline);
        TaskHandle(id)
    }

    /// Returns `true` when the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.queue.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns every task due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: i64) -> Vec<A> {
        let pending = self.queue.split_off(&(now_ms + 1, 0));
        let due = std::mem::replace(&mut self.queue, pending);

        due.into_iter()
            .map(|((_, id), action)| {
                self.deadlines.remove(&id);
                action
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_tasks_fire_in_deadline_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(0, 300, "hide");
        scheduler.schedule(0, 16, "step");
        scheduler.schedule(10, 6, "other");

        assert_eq!(scheduler.next_deadline(), Some(16));
        assert_eq!(scheduler.take_due(15), Vec::<&str>::new());
        assert_eq!(scheduler.take_due(16), vec!["step", "other"]);
        assert_eq!(scheduler.take_due(1_000), vec!["hide"]);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut scheduler = Scheduler::default();
        let hide = scheduler.schedule(0, 3_000, "hide");
        assert!(scheduler.is_pending(hide));

        assert!(scheduler.cancel(hide));
        assert!(!scheduler.cancel(hide));
        assert!(!scheduler.is_pending(hide));
        assert!(scheduler.take_due(10_000).is_empty());
    }
}
