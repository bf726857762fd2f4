//! Single-threaded deferred task queue
//!
//! Replaces ambient timers: every delayed action (countdown ticks, buff ticks,
//! delayed spawns, deferred notifications) is a queued task that the frame
//! loop drains once per frame. Tasks run to completion in due order, with
//! insertion order breaking ties.

/// Handle for cancelling a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A queued task
#[derive(Debug, Clone)]
pub struct Scheduled<T> {
    pub id: TaskId,
    /// Absolute due time (ms, same clock as the frame loop)
    pub due_ms: f64,
    /// Round generation this task belongs to (None = survives teardown)
    pub round: Option<u32>,
    pub task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    queue: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_seq: 0,
        }
    }

    /// Queue `task` to run once the clock reaches `due_ms`
    pub fn schedule(&mut self, due_ms: f64, round: Option<u32>, task: T) -> TaskId {
        let id = TaskId(self.next_seq);
        self.next_seq += 1;
        self.queue.push(Scheduled {
            id,
            due_ms,
            round,
            task,
        });
        id
    }

    /// Cancel one task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.id != id);
        self.queue.len() != before
    }

    /// Cancel every task tagged with `round`
    pub fn cancel_round(&mut self, round: u32) -> usize {
        self.cancel_where(|s| s.round == Some(round))
    }

    /// Cancel every task matching `pred`
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&Scheduled<T>) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|s| !pred(s));
        before - self.queue.len()
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Scheduled<T>> {
        let idx = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| {
                a.due_ms
                    .partial_cmp(&b.due_ms)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.0.cmp(&b.id.0))
            })
            .map(|(i, _)| i)?;
        Some(self.queue.remove(idx))
    }

    /// Number of queued tasks matching `pred`
    pub fn count(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.queue.iter().filter(|s| pred(&s.task)).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scheduled<T>> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_due_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(300.0, None, "c");
        s.schedule(100.0, None, "a");
        s.schedule(200.0, None, "b");

        assert!(s.pop_due(50.0).is_none());
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(1000.0))
            .map(|t| t.task)
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_due_runs_in_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(0.0, None, 1);
        s.schedule(0.0, None, 2);
        s.schedule(0.0, None, 3);
        assert_eq!(s.pop_due(0.0).map(|t| t.task), Some(1));
        assert_eq!(s.pop_due(0.0).map(|t| t.task), Some(2));
        assert_eq!(s.pop_due(0.0).map(|t| t.task), Some(3));
    }

    #[test]
    fn test_cancel_round_keeps_detached_tasks() {
        let mut s = Scheduler::new();
        s.schedule(10.0, Some(1), "spawn");
        s.schedule(10.0, Some(1), "buff");
        s.schedule(10.0, Some(2), "next round");
        s.schedule(10.0, None, "notify");

        assert_eq!(s.cancel_round(1), 2);
        assert_eq!(s.len(), 2);
        assert_eq!(s.count(|t| *t == "notify"), 1);
    }

    #[test]
    fn test_cancel_single_task() {
        let mut s = Scheduler::new();
        let id = s.schedule(10.0, None, ());
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.is_empty());
    }
}
