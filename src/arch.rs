//! Cortex-M sleep back-end
//!
//! Portable wrappers whose implementation is processor-specific. The rest of
//! the crate only sees the [`SleepControl`] trait; this module supplies the
//! one real implementation, built on WFI and the SLEEPDEEP bit of the System
//! Control Block.

use cortex_m::peripheral::SCB;

use crate::power::SleepControl;

/// [`SleepControl`] implementation for Cortex-M cores.
///
/// Takes ownership of the System Control Block so nothing else can flip
/// SLEEPDEEP while a sleep is in flight.
pub struct CortexSleep {
    scb: SCB,
}

impl CortexSleep {
    /// Wraps the System Control Block.
    pub fn new(scb: SCB) -> Self {
        CortexSleep { scb }
    }

    /// Releases the System Control Block.
    pub fn free(self) -> SCB {
        self.scb
    }
}

impl SleepControl for CortexSleep {
    fn sleep(&mut self) {
        cortex_m::asm::wfi();
    }

    fn deep_sleep(&mut self) {
        self.scb.set_sleepdeep();
        cortex_m::asm::wfi();
        // Leave SLEEPDEEP clear so a plain sleep stays a plain sleep.
        self.scb.clear_sleepdeep();
    }
}
