//! Thread-local run loop that batches reposition requests
//!
//! Handlers installed by the dropdown run inside [`run`]. Work handed to
//! [`join`] while a loop is active is queued and executed once the outermost
//! loop finishes its current callback; outside a loop it runs right away.

use std::cell::RefCell;
use std::collections::VecDeque;

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct RunLoopState {
    depth: usize,
    queue: VecDeque<Task>,
}

thread_local! {
    static RUN_LOOP: RefCell<RunLoopState> = RefCell::new(RunLoopState::default());
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        RUN_LOOP.with(|state| state.borrow_mut().depth += 1);
        Self
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        RUN_LOOP.with(|state| {
            let mut state = state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                // A panicking task must not leak work into the next loop
                state.queue.clear();
            }
        });
    }
}

fn next_task() -> Option<Task> {
    RUN_LOOP.with(|state| state.borrow_mut().queue.pop_front())
}

fn is_outermost() -> bool {
    RUN_LOOP.with(|state| state.borrow().depth == 1)
}

/// Run `f` inside a run loop, flushing joined work when the outermost loop ends.
pub fn run<R>(f: impl FnOnce() -> R) -> R {
    let _guard = DepthGuard::enter();
    let result = f();
    if is_outermost() {
        while let Some(task) = next_task() {
            task();
        }
    }
    result
}

/// Schedule `task` into the active run loop, or run it in a fresh one.
pub fn join(task: impl FnOnce() + 'static) {
    let mut task = Some(task);
    RUN_LOOP.with(|state| {
        let mut state = state.borrow_mut();
        if state.depth > 0 {
            if let Some(task) = task.take() {
                state.queue.push_back(Box::new(task));
            }
        }
    });
    if let Some(task) = task {
        run(task);
    }
}

#[cfg(test)]
fn is_active() -> bool {
    RUN_LOOP.with(|state| state.borrow().depth > 0)
}
