use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use scroll_utils::errors::ScrollError;

use crate::dom::{ListenerCallback, Scheduler};

/// Rate limiter running `func` at most once per `wait_ms`.
///
/// The first call of a window runs right away, calls made inside the window collapse into a
/// single trailing run at the end of the window. Nothing is queued beyond that one pending run.
pub struct Throttle<S: Scheduler> {
    state: Rc<ThrottleState<S>>,
}

struct ThrottleState<S: Scheduler> {
    wait_ms: f64,
    scheduler: Rc<S>,
    func: ListenerCallback,
    last_invoke: Cell<Option<f64>>,
    pending: RefCell<Option<S::TimerHandle>>,
}

impl<S: Scheduler> Clone for Throttle<S> {
    fn clone(&self) -> Self {
        Throttle { state: self.state.clone() }
    }
}

impl<S: Scheduler + 'static> Throttle<S> {
    pub fn new(wait_ms: f64, scheduler: Rc<S>, func: ListenerCallback) -> Self {
        Throttle {
            state: Rc::new(ThrottleState {
                wait_ms,
                scheduler,
                func,
                last_invoke: Cell::new(None),
                pending: RefCell::new(None),
            }),
        }
    }

    /// Requests a run. Errors of a run happening right away are returned, errors of the trailing
    /// run go to the scheduler.
    pub fn call(&self) -> Result<(), ScrollError> {
        let state = &self.state;
        let now = state.scheduler.now_ms();
        let remaining = match state.last_invoke.get() {
            Some(last_invoke) => last_invoke + state.wait_ms - now,
            None => 0.0,
        };

        // A clock moved backwards leaves a remaining time longer than the window.
        if remaining <= 0.0 || remaining > state.wait_ms {
            self.cancel();
            return state.invoke(now);
        }

        if state.pending.borrow().is_none() {
            let weak_state: Weak<ThrottleState<S>> = Rc::downgrade(state);
            let handle = state.scheduler.set_timeout(remaining, Box::new(move || {
                match weak_state.upgrade() {
                    Some(state) => {
                        state.pending.borrow_mut().take();
                        let now = state.scheduler.now_ms();
                        state.invoke(now)
                    },
                    None => Ok(()),
                }
            }))?;
            *state.pending.borrow_mut() = Some(handle);
        }
        Ok(())
    }

    /// Drops the pending trailing run, if any.
    pub fn cancel(&self) {
        let pending = self.state.pending.borrow_mut().take();
        if let Some(handle) = pending {
            self.state.scheduler.clear_timeout(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.borrow().is_some()
    }
}

impl<S: Scheduler> ThrottleState<S> {
    fn invoke(&self, now: f64) -> Result<(), ScrollError> {
        self.last_invoke.set(Some(now));
        (self.func)()
    }
}
