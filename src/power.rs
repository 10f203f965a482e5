//! Power-mode state machine
//!
//! The controller tracks which of the two active profiles the system runs at
//! and carries out the transitions a classified press asks for: toggling
//! between the low-power and ultra-low-power profiles while running, or
//! halting the CPU in sleep or deep sleep until the next enabled interrupt.
//! Sleep transitions are blocking; [`PowerModeController::transition`]
//! returns once the wake interrupt has fired and execution has resumed, so
//! the sleeping states have exactly one resumption edge back into the
//! running state.
//!
//! Every transition is observed in two phases by an ordered slice of
//! [`TransitionObserver`]s. Within one transition, all before-phases run in
//! slice order, then the mode change happens, then all after-phases run in
//! slice order. Observers query [`TransitionContext::is_ulp`] instead of a
//! destination state.
//!
//! Observer failures cannot veto a sleep: they are logged and the transition
//! proceeds. The single exception is a hardware lock timeout reported while
//! toggling the profile, which aborts the toggle before any state changes
//! (see [`Error::LockTimeout`]).

use crate::press::PressEvent;

/// The operating point the system runs at while the CPU is awake.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerProfile {
    /// Full-speed operation.
    LowPower,
    /// Reduced oscillator frequency and peripheral clock scaling; the CPU
    /// stays active.
    UltraLowPower,
}

/// A mode change the controller can carry out.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Switch the running system from low-power to ultra-low-power.
    EnterUltraLowPower,
    /// Switch the running system from ultra-low-power back to low-power.
    ExitUltraLowPower,
    /// Halt the CPU until the next enabled interrupt.
    Sleep,
    /// Halt the CPU and most clocks; only dedicated wake sources stay live.
    DeepSleep,
}

impl Transition {
    /// Whether this transition flips the LP/ULP profile.
    pub fn toggles_profile(self) -> bool {
        matches!(
            self,
            Transition::EnterUltraLowPower | Transition::ExitUltraLowPower
        )
    }

    /// Whether this transition suspends the CPU until an interrupt.
    pub fn halts_cpu(self) -> bool {
        matches!(self, Transition::Sleep | Transition::DeepSleep)
    }
}

/// Context handed to each observer phase.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    transition: Transition,
    ulp: bool,
}

impl TransitionContext {
    /// The transition being carried out.
    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Whether the system is in the ultra-low-power profile.
    ///
    /// Reflects the profile at the time the phase runs: during the before
    /// phase of a profile toggle this is still the old profile, during the
    /// after phase it is the new one.
    pub fn is_ulp(&self) -> bool {
        self.ulp
    }
}

#[cfg(test)]
impl TransitionContext {
    pub(crate) fn test_new(transition: Transition, ulp: bool) -> Self {
        TransitionContext { transition, ulp }
    }
}

/// Failure reported by a transition observer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HookError {
    /// A hardware operation missed its bounded completion window.
    HardwareTimeout,
    /// The observer could not apply its side effect.
    Failed,
}

/// Observes power-mode transitions in two phases.
///
/// Both methods default to a no-op so observers only implement the phases
/// they care about.
pub trait TransitionObserver {
    /// Runs before the mode change.
    fn before_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        let _ = cx;
        Ok(())
    }

    /// Runs after the mode change, or after the CPU has resumed from sleep.
    fn after_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        let _ = cx;
        Ok(())
    }
}

/// Blocking CPU suspend primitives.
///
/// Both calls return only after an enabled interrupt has woken the core.
/// [`crate::arch::CortexSleep`] implements this on Cortex-M targets.
pub trait SleepControl {
    /// Suspends the CPU; peripherals and clocks keep running.
    fn sleep(&mut self);

    /// Suspends the CPU and gates most clocks; only dedicated wake sources
    /// remain active.
    fn deep_sleep(&mut self);
}

/// Errors from a transition attempt.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// The oscillator failed to lock while toggling the profile; the profile
    /// is unchanged.
    LockTimeout,
}

/// State machine over the five power modes.
///
/// Owns the [`SleepControl`] back-end and the current [`PowerProfile`]. The
/// sleeping states are not stored: they exist for the duration of the
/// blocking call inside [`Self::transition`].
pub struct PowerModeController<S: SleepControl> {
    sleep: S,
    profile: PowerProfile,
}

impl<S: SleepControl> PowerModeController<S> {
    /// Creates a controller in the low-power profile, awake.
    pub fn new(sleep: S) -> Self {
        PowerModeController {
            sleep,
            profile: PowerProfile::LowPower,
        }
    }

    /// The current active profile.
    pub fn profile(&self) -> PowerProfile {
        self.profile
    }

    /// Whether the system is in the ultra-low-power profile.
    pub fn is_ulp(&self) -> bool {
        self.profile == PowerProfile::UltraLowPower
    }

    /// Releases the sleep back-end.
    pub fn free(self) -> S {
        self.sleep
    }

    /// Maps a press event onto a transition and carries it out.
    ///
    /// Returns the transition that ran, if any. A quick press toggles the
    /// profile, a short press sleeps, a long press deep-sleeps; sleep calls
    /// block until the core has been woken again.
    pub fn handle_event(
        &mut self,
        event: PressEvent,
        observers: &mut [&mut dyn TransitionObserver],
    ) -> Result<Option<Transition>, Error> {
        let transition = match event {
            PressEvent::None => return Ok(None),
            PressEvent::Quick => {
                if self.is_ulp() {
                    Transition::ExitUltraLowPower
                } else {
                    Transition::EnterUltraLowPower
                }
            }
            PressEvent::Short => Transition::Sleep,
            PressEvent::Long => Transition::DeepSleep,
        };
        self.transition(transition, observers)?;
        Ok(Some(transition))
    }

    /// Carries out one transition, running each observer's before phase,
    /// the mode change itself, then each after phase.
    ///
    /// A [`HookError::HardwareTimeout`] raised in the before phase of a
    /// profile toggle aborts the toggle: the profile is left unchanged,
    /// remaining hooks are skipped and [`Error::LockTimeout`] is returned.
    /// Any other hook failure is logged and ignored; in particular a sleep
    /// or wake can never be vetoed.
    pub fn transition(
        &mut self,
        transition: Transition,
        observers: &mut [&mut dyn TransitionObserver],
    ) -> Result<(), Error> {
        let cx = TransitionContext {
            transition,
            ulp: self.is_ulp(),
        };
        for observer in observers.iter_mut() {
            match observer.before_transition(&cx) {
                Ok(()) => {}
                Err(HookError::HardwareTimeout) if transition.toggles_profile() => {
                    return Err(Error::LockTimeout);
                }
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("ignoring failed before-transition hook for {}", transition);
                }
            }
        }

        match transition {
            Transition::EnterUltraLowPower => self.profile = PowerProfile::UltraLowPower,
            Transition::ExitUltraLowPower => self.profile = PowerProfile::LowPower,
            Transition::Sleep => self.sleep.sleep(),
            Transition::DeepSleep => self.sleep.deep_sleep(),
        }

        let cx = TransitionContext {
            transition,
            ulp: self.is_ulp(),
        };
        for observer in observers.iter_mut() {
            if observer.after_transition(&cx).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("ignoring failed after-transition hook for {}", transition);
            }
        }
        Ok(())
    }
}
