//! The print barrier (part of C6): serializes `p` requests against every
//! other request while letting non-print requests run in parallel with
//! each other (spec.md §4.5, §5).
//!
//! A direct port of `original_source/main.c`'s `lock`/`cond_print`/
//! `cond_wait` trio — one shared mutex and two condition variables —
//! from `pthread_mutex_t`/`pthread_cond_t` to `std::sync::{Mutex,
//! Condvar}`. The state machine is unchanged: `is_printing` gates new
//! entrants behind any pending print, `in_execution` is what a pending
//! print waits to drain to zero.

use std::sync::{Condvar, Mutex};

#[derive(Default)]
struct State {
    /// Number of print requests that have announced themselves and not
    /// yet finished (0 or 1 at a time, but a counter mirrors the
    /// original's `int is_printing` rather than assuming it).
    is_printing: u32,
    /// Number of requests (of any kind) currently executing their
    /// namespace operation.
    in_execution: u32,
}

pub struct PrintBarrier {
    state: Mutex<State>,
    /// Signaled when a print finishes, waking any workers that queued
    /// up behind it.
    cond_print: Condvar,
    /// Signaled when an in-flight operation finishes, waking a print
    /// that is waiting to quiesce the others.
    cond_wait: Condvar,
}

/// RAII handle for one request's pass through the barrier. Dropping it
/// is step 7 of spec.md §4.5 ("reacquire the mutex, decrement
/// `in_execution`, signal `cond_wait`"); [`Admission::finish_print`]
/// is step 5, called only for print requests, only after the print
/// actually ran.
pub struct Admission<'a> {
    barrier: &'a PrintBarrier,
    is_print: bool,
}

impl PrintBarrier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            cond_print: Condvar::new(),
            cond_wait: Condvar::new(),
        }
    }

    /// Step 3 of spec.md §4.5: waits out any pending print, then, if
    /// this request itself is a print, announces it and waits for every
    /// currently-executing request to finish before admitting it.
    pub fn enter(&self, is_print: bool) -> Admission<'_> {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        while state.is_printing > 0 {
            state = self
                .cond_print
                .wait(state)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }

        if is_print {
            state.is_printing += 1;
            while state.in_execution > 0 {
                state = self
                    .cond_wait
                    .wait(state)
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
            }
        }

        state.in_execution += 1;
        Admission {
            barrier: self,
            is_print,
        }
    }
}

impl Default for PrintBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Admission<'_> {
    /// Step 5: called once the print's own `print_tree` call has
    /// returned, before the reply is sent, so queued non-print workers
    /// resume as soon as the snapshot is durable.
    pub fn finish_print(&self) {
        debug_assert!(self.is_print);
        let mut state = self
            .barrier
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.is_printing -= 1;
        self.barrier.cond_print.notify_all();
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        let mut state = self
            .barrier
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.in_execution -= 1;
        self.barrier.cond_wait.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::PrintBarrier;

    #[test]
    fn non_print_admissions_overlap() {
        let barrier = Arc::new(PrintBarrier::new());
        let a = barrier.enter(false);
        let b = barrier.enter(false); // must not block
        drop(a);
        drop(b);
    }

    #[test]
    fn print_waits_for_in_flight_work_to_drain() {
        let barrier = Arc::new(PrintBarrier::new());
        let a = barrier.enter(false);

        let barrier2 = Arc::clone(&barrier);
        let handle = thread::spawn(move || {
            let admission = barrier2.enter(true);
            admission.finish_print();
        });

        thread::sleep(Duration::from_millis(50));
        drop(a); // releases the pending print
        handle.join().unwrap();
    }
}
