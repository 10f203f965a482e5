//! Button sampling and wake-interrupt service
//!
//! The mode button is polled, not interrupt-driven: once per main-loop pass
//! the sampler reads the pin, runs the press-duration counter while the
//! button is held, and classifies the elapsed ticks on the release edge.
//! The release path ends with a short blocking settle delay as a software
//! debounce; presses are rare next to the loop period, so blocking there is
//! acceptable.
//!
//! The same pin doubles as the edge-sensitive wake source for sleep and deep
//! sleep. Its interrupt handler does nothing except clear the latched edge;
//! [`service_wake_interrupt`] is that entire handler body.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::counter::TickCounter;
use crate::press::{PressEvent, Thresholds};

/// Debounce settle applied after every released-button sample, in
/// milliseconds.
pub const DEBOUNCE_SETTLE_MS: u32 = 10;

/// Raw, unclassified button level.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RawButtonState {
    /// The button is held down (pin reads low).
    Pressed,
    /// The button is up (pin reads high).
    Released,
}

/// Polled sampler for the active-low mode button.
///
/// Owns the input pin; the counter and delay are borrowed per poll so other
/// parts of the system can hold them between calls.
pub struct ButtonSampler<P: InputPin> {
    pin: P,
    thresholds: Thresholds,
}

impl<P: InputPin> ButtonSampler<P> {
    /// Creates a sampler with the default press thresholds.
    pub fn new(pin: P) -> Self {
        Self::with_thresholds(pin, Thresholds::default())
    }

    /// Creates a sampler with custom press thresholds.
    pub fn with_thresholds(pin: P, thresholds: Thresholds) -> Self {
        ButtonSampler { pin, thresholds }
    }

    /// Reads the raw button level. The button is active-low.
    pub fn sample(&mut self) -> Result<RawButtonState, P::Error> {
        Ok(if self.pin.is_low()? {
            RawButtonState::Pressed
        } else {
            RawButtonState::Released
        })
    }

    /// Runs one sampling pass.
    ///
    /// On the first pass that sees the button down, the counter is reset and
    /// started; further passes while held leave it running. On a pass that
    /// sees the button up, the elapsed ticks are classified, the counter is
    /// stopped and reset, and the debounce settle delay is applied. Events
    /// are therefore only ever produced on the release edge.
    pub fn poll<C, D>(&mut self, counter: &mut C, delay: &mut D) -> Result<PressEvent, P::Error>
    where
        C: TickCounter,
        D: DelayNs,
    {
        match self.sample()? {
            RawButtonState::Pressed => {
                if !counter.is_running() {
                    counter.reset();
                    counter.start();
                }
                Ok(PressEvent::None)
            }
            RawButtonState::Released => {
                let ticks = counter.read();
                let event = self.thresholds.classify(ticks);
                counter.stop();
                counter.reset();
                delay.delay_ms(DEBOUNCE_SETTLE_MS);
                Ok(event)
            }
        }
    }

    /// Releases the pin.
    pub fn free(self) -> P {
        self.pin
    }
}

/// An edge-sensitive wake interrupt source tied to the button pin.
///
/// Must stay functional in the deepest sleep state - it is the only thing
/// that brings the core back.
pub trait WakeInterrupt {
    /// Whether a wake edge is latched and waiting to be acknowledged.
    fn pending(&mut self) -> bool;

    /// Acknowledges the latched edge.
    fn clear(&mut self);
}

/// The complete wake-ISR body: acknowledge the latched edge, nothing else.
///
/// A spurious invocation with no pending flag is a no-op, so the handler is
/// safe to run on any wake path.
pub fn service_wake_interrupt<W: WakeInterrupt>(wake: &mut W) {
    if wake.pending() {
        wake.clear();
    }
}
