//! PWM LED feedback
//!
//! The LED encodes the current power mode: fast blink while running
//! low-power, slow blink while running ultra-low-power, solid or dimmed
//! while the CPU sleeps, and off in deep sleep (the clock feeding the PWM is
//! gated there, so the block is disabled outright and restarted on the way
//! out).
//!
//! A pattern update writes the period, the compare level and the phase
//! counter together, in that order. A partial update would leave the output
//! with a mismatched period/compare pair for up to one PWM period, which is
//! visible as a glitch.

use crate::power::{HookError, PowerProfile, TransitionContext, TransitionObserver, Transition};

/// PWM period of the fast (low-power) blink pattern, in cycles.
pub const BLINK_FAST_PERIOD: u32 = 50_000;

/// PWM period of the slow (ultra-low-power) blink pattern, in cycles.
pub const BLINK_SLOW_PERIOD: u32 = 100_000;

/// PWM period used while dimming; the compare level is then a percentage.
pub const DIM_PERIOD: u32 = 100;

/// Duty percentage applied before sleeping in the ultra-low-power profile.
const SLEEP_DIM_DUTY: u32 = 10;

/// Duty percentage applied before sleeping in the low-power profile.
const SLEEP_SOLID_DUTY: u32 = 100;

/// The PWM channel driving the mode LED.
///
/// Mirrors the register set of a timer/counter PWM block: independent period
/// and compare registers, a writable phase counter, an output gate, and a
/// trigger that kicks the counter after the block comes (back) up. All
/// operations are immediate register writes and cannot fail.
pub trait LedPwm {
    /// Writes the period register.
    fn set_period(&mut self, period: u32);

    /// Writes the compare register.
    fn set_compare(&mut self, compare: u32);

    /// Resets the phase counter to zero.
    fn reset_counter(&mut self);

    /// Ungates the PWM block.
    fn enable(&mut self);

    /// Gates the PWM block; the output stops driving the LED.
    fn disable(&mut self);

    /// Starts the counter after the block has been enabled.
    fn start(&mut self);
}

/// Maps power-mode transitions onto LED patterns.
pub struct LedFeedback<W: LedPwm> {
    pwm: W,
    fast_period: u32,
    slow_period: u32,
}

impl<W: LedPwm> LedFeedback<W> {
    /// Creates the driver with the default blink periods.
    pub fn new(pwm: W) -> Self {
        Self::with_periods(pwm, BLINK_FAST_PERIOD, BLINK_SLOW_PERIOD)
    }

    /// Creates the driver with custom fast/slow blink periods.
    pub fn with_periods(pwm: W, fast_period: u32, slow_period: u32) -> Self {
        LedFeedback {
            pwm,
            fast_period,
            slow_period,
        }
    }

    /// Brings the PWM up and shows the blink pattern for `profile`.
    ///
    /// Called once at boot; also the recovery path after anything that fully
    /// disabled the block.
    pub fn power_on(&mut self, profile: PowerProfile) {
        self.pwm.enable();
        self.pwm.start();
        self.blink_for(profile == PowerProfile::UltraLowPower);
    }

    /// Applies a 50 % duty blink pattern with the given period.
    ///
    /// Period, compare and phase counter are written back-to-back so no PWM
    /// period ever sees a mismatched pair.
    pub fn apply_blink(&mut self, period: u32) {
        self.pwm.set_period(period);
        self.pwm.set_compare(period / 2);
        self.pwm.reset_counter();
    }

    /// Dims the LED to `percent` brightness (0-100) with a fixed period.
    pub fn apply_dim(&mut self, percent: u32) {
        self.pwm.set_period(DIM_PERIOD);
        self.pwm.set_compare(percent);
        self.pwm.reset_counter();
    }

    /// Releases the PWM channel.
    pub fn free(self) -> W {
        self.pwm
    }

    fn blink_for(&mut self, ulp: bool) {
        let period = if ulp { self.slow_period } else { self.fast_period };
        self.apply_blink(period);
    }
}

impl<W: LedPwm> TransitionObserver for LedFeedback<W> {
    fn before_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        match cx.transition() {
            // Sleep keeps the PWM clocked: dim in ULP, solid on in LP.
            Transition::Sleep => {
                if cx.is_ulp() {
                    self.apply_dim(SLEEP_DIM_DUTY);
                } else {
                    self.apply_dim(SLEEP_SOLID_DUTY);
                }
            }
            // The PWM clock is gated in deep sleep; turn the block off
            // before it goes away.
            Transition::DeepSleep => self.pwm.disable(),
            Transition::EnterUltraLowPower | Transition::ExitUltraLowPower => {}
        }
        Ok(())
    }

    fn after_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        match cx.transition() {
            Transition::Sleep => self.blink_for(cx.is_ulp()),
            Transition::DeepSleep => {
                self.pwm.enable();
                self.pwm.start();
                self.blink_for(cx.is_ulp());
            }
            Transition::EnterUltraLowPower => self.apply_blink(self.slow_period),
            Transition::ExitUltraLowPower => self.apply_blink(self.fast_period),
        }
        Ok(())
    }
}
