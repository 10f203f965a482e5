//! FLL retuning across power-profile changes
//!
//! Entering the ultra-low-power profile halves the target frequency of the
//! main frequency-locked loop; the peripheral-clock divider is widened or
//! narrowed in the opposite direction so downstream peripherals keep the
//! same absolute rate either way. Reconfiguration always follows disable,
//! configure, enable order - enabling first would lock onto an undefined
//! frequency.
//!
//! Lock acquisition is bounded by [`FLL_LOCK_TIMEOUT`]. A miss is not
//! retried and never swallowed: it surfaces as
//! [`HookError::HardwareTimeout`], which aborts the profile change.

use fugit::HertzU32;

use crate::power::{HookError, TransitionContext, TransitionObserver, Transition};

/// Internal main oscillator feeding the FLL reference input: 8 MHz.
pub const IMO_FREQ: HertzU32 = HertzU32::from_raw(8_000_000);

/// FLL output target while running low-power: 100 MHz.
pub const FLL_FULL_SPEED: HertzU32 = HertzU32::from_raw(100_000_000);

/// FLL output target while running ultra-low-power: 50 MHz.
pub const FLL_HALF_SPEED: HertzU32 = HertzU32::from_raw(50_000_000);

/// Cycles to wait for the FLL to report lock before giving up.
pub const FLL_LOCK_TIMEOUT: u32 = 200_000;

/// What the FLL drives its output with.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FllOutputMode {
    /// Follow the reference until lock is acquired, then the FLL output.
    Auto,
    /// Bypass: drive the output from the reference input.
    Input,
    /// Drive the FLL output unconditionally, locked or not.
    Output,
}

/// A complete FLL configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FllConfig {
    /// Reference input frequency.
    pub source: HertzU32,
    /// Output frequency the loop locks onto.
    pub target: HertzU32,
    /// Output source selection.
    pub mode: FllOutputMode,
}

impl FllConfig {
    /// Full-speed preset used by the low-power profile.
    pub const FULL_SPEED: FllConfig = FllConfig {
        source: IMO_FREQ,
        target: FLL_FULL_SPEED,
        mode: FllOutputMode::Auto,
    };

    /// Half-speed preset used by the ultra-low-power profile.
    pub const HALF_SPEED: FllConfig = FllConfig {
        source: IMO_FREQ,
        target: FLL_HALF_SPEED,
        mode: FllOutputMode::Auto,
    };
}

/// The FLL failed to lock within the allotted window.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockTimeout;

/// The tunable clock tree: the main FLL plus the peripheral-clock divider.
pub trait ClockTree {
    /// Disables the FLL; the system falls back to the reference clock.
    fn fll_disable(&mut self);

    /// Programs a new FLL configuration. Only valid while the FLL is
    /// disabled.
    fn fll_configure(&mut self, config: FllConfig);

    /// Re-enables the FLL and blocks until it reports lock, for at most
    /// `timeout` cycles.
    fn fll_enable(&mut self, timeout: u32) -> Result<(), LockTimeout>;

    /// Sets the peripheral-clock integer divider (divide by `divider + 1`).
    fn set_peri_divider(&mut self, divider: u8);
}

/// Retunes the clock tree when the LP/ULP profile toggles.
///
/// Acts entirely in the before phase so a lock timeout can abort the toggle
/// while the profile is still unchanged.
pub struct ClockRetuner<T: ClockTree> {
    clocks: T,
}

impl<T: ClockTree> ClockRetuner<T> {
    /// Takes ownership of the clock tree.
    pub fn new(clocks: T) -> Self {
        ClockRetuner { clocks }
    }

    /// Releases the clock tree.
    pub fn free(self) -> T {
        self.clocks
    }

    fn enter_ulp(&mut self) -> Result<(), LockTimeout> {
        self.clocks.fll_disable();
        self.clocks.fll_configure(FllConfig::HALF_SPEED);
        self.clocks.fll_enable(FLL_LOCK_TIMEOUT)?;
        // Source halved, divider narrowed: peripherals keep their rate.
        self.clocks.set_peri_divider(0);
        Ok(())
    }

    fn exit_ulp(&mut self) -> Result<(), LockTimeout> {
        // Widen the divider before the source speeds back up.
        self.clocks.set_peri_divider(1);
        self.clocks.fll_disable();
        self.clocks.fll_configure(FllConfig::FULL_SPEED);
        self.clocks.fll_enable(FLL_LOCK_TIMEOUT)?;
        Ok(())
    }
}

impl<T: ClockTree> TransitionObserver for ClockRetuner<T> {
    fn before_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        match cx.transition() {
            Transition::EnterUltraLowPower => {
                self.enter_ulp().map_err(|_| HookError::HardwareTimeout)
            }
            Transition::ExitUltraLowPower => {
                self.exit_ulp().map_err(|_| HookError::HardwareTimeout)
            }
            Transition::Sleep | Transition::DeepSleep => Ok(()),
        }
    }
}
