//! Work deferred by a number of ticks.
//!
//! The host advances the scheduler once per update; nothing here looks at a
//! clock, so ordering is deterministic and testable.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Scheduled<T> {
    handle: TaskHandle,
    due: u64,
    task: T,
}

#[derive(Debug)]
pub struct TickScheduler<T> {
    now: u64,
    next_handle: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            next_handle: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TickScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks advanced so far.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Runs `task` on the `ticks`-th call to [`advance`](Self::advance) from
    /// now. Zero behaves like one: work never runs inside the tick that
    /// scheduled it.
    pub fn schedule_after(&mut self, ticks: u32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Scheduled {
            handle,
            due: self.now + u64::from(ticks.max(1)),
            task,
        });
        handle
    }

    /// Drops a pending task. Returns it if it had not run yet.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let index = self.pending.iter().position(|s| s.handle == handle)?;
        Some(self.pending.remove(index).task)
    }

    /// Drops every pending task matching `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) {
        self.pending.retain(|s| !predicate(&s.task));
    }

    /// Moves to the next tick and hands back the tasks now due, oldest first.
    pub fn advance(&mut self) -> Vec<T> {
        self.now += 1;
        let now = self.now;

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due <= now {
                due.push(self.pending.remove(index).task);
            } else {
                index += 1;
            }
        }
        due
    }
}
