//! Time source and the "after next paint" task queue.
//!
//! Nothing here blocks. The host drives both: it calls `Editor::tick` when
//! timers may have expired and `Editor::on_frame` once a frame has been
//! painted.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// FIFO of tasks to run after the next paint.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    tasks: VecDeque<T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Queues a task behind the ones already waiting.
    pub fn schedule(&mut self, task: T) {
        self.tasks.push_back(task);
    }

    /// Removes every queued task, returning how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// Takes every task queued so far, in scheduling order.
    ///
    /// Tasks scheduled while the returned batch runs wait for the next frame.
    pub fn take_ready(&mut self) -> Vec<T> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn test_tasks_run_in_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule("a");
        queue.schedule("b");
        assert_eq!(queue.take_ready(), vec!["a", "b"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_all_drops_queued_tasks() {
        let mut queue = DeferredQueue::new();
        queue.schedule(1);
        queue.schedule(2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.take_ready().is_empty());

        queue.schedule(3);
        assert_eq!(queue.take_ready(), vec![3]);
    }
}
