//! Single-threaded task scheduler
//!
//! The dispatch engine never invokes the terminal `done` callback from within
//! the call frame that triggered it: the callback is posted here and runs on
//! the next tick, after the caller's own stack has unwound. The host drains
//! the queue (the [`Bootstrap`](crate::boot::Bootstrap) does this after every
//! navigation it issues).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

type Task = Box<dyn FnOnce()>;

/// Cooperative next-tick task queue.
///
/// Tasks run in FIFO order. A running task may defer further tasks; they are
/// picked up in the same drain.
#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a task to run on the next tick
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks currently queued
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run queued tasks until the queue is empty.
    ///
    /// Reentrant calls (a task draining the scheduler it runs on) are no-ops;
    /// the outer drain picks up whatever the task enqueued.
    pub fn run_until_idle(&self) {
        if self.draining.get() {
            return;
        }
        self.draining.set(true);

        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }

        self.draining.set(false);
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_defer_does_not_run_synchronously() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        scheduler.defer(move || flag.set(true));

        assert!(!ran.get());
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_until_idle();
        assert!(ran.get());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_tasks_run_in_order() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            scheduler.defer(move || order.borrow_mut().push(i));
        }
        scheduler.run_until_idle();

        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_task_may_defer_more_tasks() {
        let scheduler = Rc::new(Scheduler::new());
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_order = order.clone();
        let inner_scheduler = scheduler.clone();
        let outer_order = order.clone();
        scheduler.defer(move || {
            outer_order.borrow_mut().push("outer");
            inner_scheduler.defer(move || inner_order.borrow_mut().push("inner"));
        });
        scheduler.run_until_idle();

        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }
}
