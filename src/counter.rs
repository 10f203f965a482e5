//! Free-running press-duration counter
//!
//! The stopwatch behind press classification. The counter belongs to the
//! button sampling path; nothing else writes it, except that it is forcibly
//! stopped before the CPU sleeps so a half-measured press cannot keep
//! counting across a wake (see [`CounterGuard`]).

use crate::power::{HookError, TransitionContext, TransitionObserver};

/// A free-running up-counter used as a stopwatch.
///
/// Implementations wrap a hardware timer/counter channel. All operations
/// take effect immediately and cannot fail; debouncing is not done here.
pub trait TickCounter {
    /// Starts counting from the current value.
    fn start(&mut self);

    /// Stops counting; the value is retained.
    fn stop(&mut self);

    /// Resets the count to zero. The counter must be reset before it is
    /// re-armed for a new measurement.
    fn reset(&mut self);

    /// The current tick count.
    fn read(&self) -> u32;

    /// Whether the counter is currently counting.
    fn is_running(&self) -> bool;
}

/// Stops the counter before the CPU sleeps.
///
/// Placed last in the observer order so the measurement hardware is quiesced
/// after the LED and clock hooks have run.
pub struct CounterGuard<'a, C: TickCounter> {
    counter: &'a mut C,
}

impl<'a, C: TickCounter> CounterGuard<'a, C> {
    /// Borrows the counter for the duration of one transition.
    pub fn new(counter: &'a mut C) -> Self {
        CounterGuard { counter }
    }
}

impl<C: TickCounter> TransitionObserver for CounterGuard<'_, C> {
    fn before_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        if cx.transition().halts_cpu() {
            self.counter.stop();
        }
        Ok(())
    }
}
