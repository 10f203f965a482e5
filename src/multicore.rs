//! Companion-core bring-up
//!
//! On a two-core part only one core runs the power-mode state machine. The
//! other is released from reset exactly once at boot and then spends its
//! life in deep sleep; there is no communication between the two afterwards.

use crate::power::SleepControl;

/// Errors starting the companion core.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The companion core did not acknowledge the start request.
    Unresponsive,
}

/// One-shot "start the other core" primitive.
pub trait CompanionCore {
    /// Releases the companion core from reset. Called at most once per boot.
    fn start(&mut self) -> Result<(), StartError>;
}

/// Enforces the one-shot contract of [`CompanionCore::start`].
pub struct CompanionBoot<C: CompanionCore> {
    core: C,
    started: bool,
}

impl<C: CompanionCore> CompanionBoot<C> {
    /// Wraps a not-yet-started companion core.
    pub fn new(core: C) -> Self {
        CompanionBoot {
            core,
            started: false,
        }
    }

    /// Starts the companion core if it has not been started yet.
    ///
    /// Returns `true` when this call performed the start. A failed start
    /// leaves the wrapper unstarted so boot code may retry.
    pub fn start_once(&mut self) -> Result<bool, StartError> {
        if self.started {
            return Ok(false);
        }
        self.core.start()?;
        self.started = true;
        Ok(true)
    }

    /// Whether the companion core has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

/// Parks the calling core in deep sleep forever.
///
/// This is the whole life of the boot core after it has released its
/// sibling: every wake immediately re-enters deep sleep.
pub fn idle_forever<S: SleepControl>(sleep: &mut S) -> ! {
    loop {
        sleep.deep_sleep();
    }
}
