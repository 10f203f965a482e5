//! Button-driven power-mode control
//!
//! This crate implements the control core of a five-mode power-management
//! scheme: a push button is timed by a free-running hardware counter, the
//! press duration is classified into quick, short and long presses, and the
//! resulting event drives a state machine across two active profiles
//! (low-power and ultra-low-power), CPU sleep and deep sleep. A PWM-driven
//! LED encodes the current mode and the main frequency-locked-loop oscillator
//! is retuned whenever the ultra-low-power profile is entered or left.
//!
//! Register-level peripheral access stays out of this crate. Each peripheral
//! is a narrow trait ([`counter::TickCounter`], [`led::LedPwm`],
//! [`clocks::ClockTree`], [`power::SleepControl`],
//! [`multicore::CompanionCore`]) and boards wire their PAC or HAL types to
//! those traits. The only target code shipped here is the Cortex-M WFI
//! back-end in [`arch`].
//!
//! A firmware main loop is one blocking call per iteration: poll the
//! [`system::System`], which samples the button, classifies the press,
//! carries out the transition with its observers, and applies the settle
//! delays. The entire wake-pin ISR body is
//! [`button::service_wake_interrupt`]. On a two-core part the second core is
//! released once via [`multicore::CompanionBoot`] and parked with
//! [`multicore::idle_forever`].
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types and log ignored
//!   transition-hook failures.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arch;
pub mod button;
pub mod clocks;
pub mod counter;
pub mod led;
pub mod multicore;
pub mod power;
pub mod press;
pub mod system;

#[cfg(test)]
pub(crate) mod testutil;

pub use power::{PowerModeController, PowerProfile};
pub use press::PressEvent;
pub use system::System;
