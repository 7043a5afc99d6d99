//! The two-coroutine scheduler driving the emulation core.
//!
//! Strictly single-threaded *cooperative* scheduling is modeled here with a
//! background OS thread rendezvousing with the caller over a pair of
//! channels: only one side ever runs at a time, so from the caller's
//! perspective it behaves exactly like the original setjmp/longjmp-style
//! stack swap, without needing one.
//!
//! # Usage
//!
//! ```
//! use tascore_sched::Coroutine;
//!
//! let mut co = Coroutine::spawn(16 * 1024, |yielder| {
//!     yielder.yield_now();
//!     // work resumes here on the next `resume()`
//! });
//! assert!(!co.is_dead());
//! co.resume();
//! assert!(co.is_dead());
//! ```

#![warn(clippy::pedantic)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Sent from the scheduling thread to the coroutine thread.
enum Signal {
    /// Transfer control back into the coroutine body.
    Resume,
    /// Tear down the coroutine without resuming it further.
    Exit,
}

/// Sent from the coroutine thread back to the scheduling thread.
enum Event {
    /// The coroutine called [`Yielder::yield_now`].
    Yielded,
    /// The coroutine returned, or called [`Yielder::cexit`].
    Dead,
}

/// Handle passed into a coroutine's body, used to suspend it.
pub struct Yielder {
    to_main: Sender<Event>,
    from_main: Receiver<Signal>,
}

impl Yielder {
    /// Suspends the coroutine, transferring control back to whichever
    /// thread called [`Coroutine::resume`]. Returns once resumed again.
    ///
    /// # Panics
    ///
    /// Panics if the owning [`Coroutine`] was dropped without first being
    /// exited cleanly (the channel hung up).
    pub fn yield_now(&self) {
        self.to_main.send(Event::Yielded).expect("coroutine outlived its scheduler");
        match self.from_main.recv().expect("coroutine outlived its scheduler") {
            Signal::Resume => {}
            Signal::Exit => {
                // The scheduler is shutting us down from inside a yield;
                // unwind the thread cleanly via panic, caught by the
                // thread runner below, which reports it as `Dead`.
                std::panic::panic_any(Exited);
            }
        }
    }

    /// Marks the coroutine dead and suspends it one final, irrevocable
    /// time. Never returns.
    pub fn cexit(&self) -> ! {
        let _ = self.to_main.send(Event::Dead);
        loop {
            thread::park();
        }
    }
}

/// Sentinel unwound through when a coroutine is torn down mid-yield.
struct Exited;

/// A suspended or running coroutine with its own OS-thread stack.
pub struct Coroutine {
    to_coroutine: Sender<Signal>,
    from_coroutine: Receiver<Event>,
    join: Option<JoinHandle<()>>,
    dead: bool,
}

impl Coroutine {
    /// Creates a coroutine running `body` with a dedicated stack of
    /// `stack_size` bytes, and runs it until its first
    /// [`Yielder::yield_now`] (or until it returns/[`Yielder::cexit`]s).
    ///
    /// # Panics
    ///
    /// Panics if the underlying OS thread cannot be spawned.
    #[must_use]
    pub fn spawn<F>(stack_size: usize, body: F) -> Self
    where
        F: FnOnce(&Yielder) + Send + 'static,
    {
        let (to_coroutine, from_main) = mpsc::channel();
        let (to_main, from_coroutine) = mpsc::channel();

        let join = thread::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                let yielder = Yielder { to_main: to_main.clone(), from_main };
                // Either the body returns normally, genuinely panics, or
                // unwinds via `panic_any(Exited)` from inside `yield_now`
                // (the scheduler tearing us down mid-yield) — in every
                // case the coroutine is done afterward.
                let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| body(&yielder)));
                let _ = to_main.send(Event::Dead);
            })
            .expect("failed to spawn coroutine thread");

        let mut this = Self {
            to_coroutine,
            from_coroutine,
            join: Some(join),
            dead: false,
        };
        this.await_yield();
        this
    }

    /// Transfers control into the coroutine until it next yields or dies.
    ///
    /// Does nothing if the coroutine is already dead.
    pub fn resume(&mut self) {
        if self.dead {
            return;
        }
        if self.to_coroutine.send(Signal::Resume).is_err() {
            self.dead = true;
            return;
        }
        self.await_yield();
    }

    /// Whether the coroutine has returned or called [`Yielder::cexit`].
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    fn await_yield(&mut self) {
        match self.from_coroutine.recv() {
            Ok(Event::Yielded) => {}
            Ok(Event::Dead) | Err(_) => self.dead = true,
        }
    }
}

impl Drop for Coroutine {
    fn drop(&mut self) {
        if !self.dead {
            let _ = self.to_coroutine.send(Signal::Exit);
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn constructor_runs_until_first_yield() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = Arc::clone(&ran);
        let co = Coroutine::spawn(64 * 1024, move |yielder| {
            ran2.fetch_add(1, Ordering::SeqCst);
            yielder.yield_now();
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!co.is_dead());
    }

    #[test]
    fn resume_runs_until_next_yield_or_death() {
        let mut co = Coroutine::spawn(64 * 1024, |yielder| {
            yielder.yield_now();
            yielder.yield_now();
        });
        assert!(!co.is_dead());
        co.resume();
        assert!(!co.is_dead());
        co.resume();
        assert!(co.is_dead());
    }

    #[test]
    fn cexit_marks_dead_irrevocably() {
        let mut co = Coroutine::spawn(64 * 1024, |yielder| {
            yielder.yield_now();
            yielder.cexit();
        });
        co.resume();
        assert!(co.is_dead());
        co.resume(); // no-op once dead
        assert!(co.is_dead());
    }

    #[test]
    fn body_returning_without_yield_is_immediately_dead() {
        let co = Coroutine::spawn(64 * 1024, |_yielder| {});
        assert!(co.is_dead());
    }
}
