//! Main-loop wiring
//!
//! [`System`] owns every resource of the control loop and exposes one
//! blocking [`System::poll`] per iteration: sample the button, classify the
//! press, carry out the resulting transition with the fixed observer order,
//! and apply the post-wake settle delay. Firmware `main` reduces to
//! constructing the system and calling `poll` forever.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::button::ButtonSampler;
use crate::clocks::{ClockRetuner, ClockTree};
use crate::counter::{CounterGuard, TickCounter};
use crate::led::{LedFeedback, LedPwm};
use crate::power::{self, PowerModeController, PowerProfile, SleepControl, TransitionObserver};
use crate::press::PressEvent;

/// Settle delay after resuming from sleep or deep sleep, in milliseconds.
///
/// The wake press is still bouncing when execution resumes; waiting here
/// keeps it from being measured as a fresh press.
pub const WAKE_SETTLE_MS: u32 = 250;

/// Errors from one loop iteration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The button pin could not be read.
    Pin(E),
    /// A power transition failed.
    Power(power::Error),
}

impl<E> From<power::Error> for Error<E> {
    fn from(e: power::Error) -> Self {
        Error::Power(e)
    }
}

/// The assembled control loop.
///
/// The transition observers run in a fixed order on every transition: LED
/// feedback, clock retuner, counter guard.
pub struct System<P, C, D, W, T, S>
where
    P: InputPin,
    C: TickCounter,
    D: DelayNs,
    W: LedPwm,
    T: ClockTree,
    S: SleepControl,
{
    sampler: ButtonSampler<P>,
    counter: C,
    delay: D,
    led: LedFeedback<W>,
    clocks: ClockRetuner<T>,
    power: PowerModeController<S>,
}

impl<P, C, D, W, T, S> System<P, C, D, W, T, S>
where
    P: InputPin,
    C: TickCounter,
    D: DelayNs,
    W: LedPwm,
    T: ClockTree,
    S: SleepControl,
{
    /// Assembles the system and brings the LED up in the current profile's
    /// blink pattern.
    pub fn new(
        sampler: ButtonSampler<P>,
        counter: C,
        delay: D,
        mut led: LedFeedback<W>,
        clocks: ClockRetuner<T>,
        power: PowerModeController<S>,
    ) -> Self {
        led.power_on(power.profile());
        System {
            sampler,
            counter,
            delay,
            led,
            clocks,
            power,
        }
    }

    /// The current active profile.
    pub fn profile(&self) -> PowerProfile {
        self.power.profile()
    }

    /// Runs one main-loop iteration.
    ///
    /// Blocks for the debounce settle on a released button, for the whole
    /// duration of any sleep the press requests, and for the post-wake
    /// settle window afterwards. Returns the event that was sampled.
    pub fn poll(&mut self) -> Result<PressEvent, Error<P::Error>> {
        let event = self
            .sampler
            .poll(&mut self.counter, &mut self.delay)
            .map_err(Error::Pin)?;

        let mut guard = CounterGuard::new(&mut self.counter);
        let mut observers: [&mut dyn TransitionObserver; 3] =
            [&mut self.led, &mut self.clocks, &mut guard];
        let outcome = self.power.handle_event(event, &mut observers)?;

        if let Some(transition) = outcome {
            if transition.halts_cpu() {
                self.delay.delay_ms(WAKE_SETTLE_MS);
            }
        }
        Ok(event)
    }

    /// Tears the system apart into its resources.
    pub fn free(self) -> (ButtonSampler<P>, C, D, LedFeedback<W>, ClockRetuner<T>, PowerModeController<S>) {
        (
            self.sampler,
            self.counter,
            self.delay,
            self.led,
            self.clocks,
            self.power,
        )
    }
}
