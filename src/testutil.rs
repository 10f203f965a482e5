//! Shared fakes for the unit tests.
//!
//! Every fake appends to one shared [`Log`] so tests can assert the exact
//! order of hardware operations across module boundaries. Fakes that the
//! system under test takes by value are `Clone` with `Rc`-shared state, so
//! a test can keep a handle for inspection after handing the fake over.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin};

use crate::button::WakeInterrupt;
use crate::clocks::{ClockTree, FllConfig, LockTimeout};
use crate::counter::TickCounter;
use crate::led::LedPwm;
use crate::power::{HookError, SleepControl, TransitionContext, TransitionObserver};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Active-low button pin with an externally settable level.
#[derive(Clone)]
pub struct FakePin {
    pressed: Rc<Cell<bool>>,
}

impl FakePin {
    pub fn released() -> Self {
        FakePin {
            pressed: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.set(pressed);
    }
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed.get())
    }
}

/// Stopwatch counter whose value tests set by hand.
#[derive(Clone)]
pub struct FakeCounter {
    log: Log,
    running: Rc<Cell<bool>>,
    value: Rc<Cell<u32>>,
}

impl FakeCounter {
    pub fn new(log: &Log) -> Self {
        FakeCounter {
            log: log.clone(),
            running: Rc::new(Cell::new(false)),
            value: Rc::new(Cell::new(0)),
        }
    }

    pub fn force_value(&self, ticks: u32) {
        self.value.set(ticks);
    }

    pub fn value(&self) -> u32 {
        self.value.get()
    }
}

impl TickCounter for FakeCounter {
    fn start(&mut self) {
        self.log.borrow_mut().push("counter.start".into());
        self.running.set(true);
    }

    fn stop(&mut self) {
        self.log.borrow_mut().push("counter.stop".into());
        self.running.set(false);
    }

    fn reset(&mut self) {
        self.log.borrow_mut().push("counter.reset".into());
        self.value.set(0);
    }

    fn read(&self) -> u32 {
        self.value.get()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Delay provider that records instead of waiting.
pub struct FakeDelay {
    log: Log,
}

impl FakeDelay {
    pub fn new(log: &Log) -> Self {
        FakeDelay { log: log.clone() }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(format!("delay.ns={}", ns));
    }

    // Overridden so millisecond waits show up as one entry instead of the
    // default chunked nanosecond calls.
    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(format!("delay.ms={}", ms));
    }
}

/// PWM channel that records register writes and tracks its gate.
#[derive(Clone)]
pub struct FakePwm {
    log: Log,
    enabled: Rc<Cell<bool>>,
}

impl FakePwm {
    pub fn new(log: &Log) -> Self {
        FakePwm {
            log: log.clone(),
            enabled: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl LedPwm for FakePwm {
    fn set_period(&mut self, period: u32) {
        self.log.borrow_mut().push(format!("pwm.period={}", period));
    }

    fn set_compare(&mut self, compare: u32) {
        self.log.borrow_mut().push(format!("pwm.compare={}", compare));
    }

    fn reset_counter(&mut self) {
        self.log.borrow_mut().push("pwm.ctr=0".into());
    }

    fn enable(&mut self) {
        self.log.borrow_mut().push("pwm.enable".into());
        self.enabled.set(true);
    }

    fn disable(&mut self) {
        self.log.borrow_mut().push("pwm.disable".into());
        self.enabled.set(false);
    }

    fn start(&mut self) {
        self.log.borrow_mut().push("pwm.start".into());
    }
}

/// Clock tree that remembers its last configuration and can miss one lock.
#[derive(Clone)]
pub struct FakeClocks {
    log: Log,
    config: Rc<Cell<Option<FllConfig>>>,
    divider: Rc<Cell<u8>>,
    fail_next_lock: Rc<Cell<bool>>,
}

impl FakeClocks {
    pub fn new(log: &Log) -> Self {
        FakeClocks {
            log: log.clone(),
            config: Rc::new(Cell::new(None)),
            divider: Rc::new(Cell::new(1)),
            fail_next_lock: Rc::new(Cell::new(false)),
        }
    }

    pub fn config(&self) -> Option<FllConfig> {
        self.config.get()
    }

    pub fn divider(&self) -> u8 {
        self.divider.get()
    }

    /// Makes the next enable miss its lock window; later enables succeed.
    pub fn fail_next_lock(&self) {
        self.fail_next_lock.set(true);
    }
}

impl ClockTree for FakeClocks {
    fn fll_disable(&mut self) {
        self.log.borrow_mut().push("fll.disable".into());
    }

    fn fll_configure(&mut self, config: FllConfig) {
        self.log
            .borrow_mut()
            .push(format!("fll.configure target={}", config.target.to_Hz()));
        self.config.set(Some(config));
    }

    fn fll_enable(&mut self, _timeout: u32) -> Result<(), LockTimeout> {
        if self.fail_next_lock.replace(false) {
            self.log.borrow_mut().push("fll.enable timeout".into());
            return Err(LockTimeout);
        }
        self.log.borrow_mut().push("fll.enable".into());
        Ok(())
    }

    fn set_peri_divider(&mut self, divider: u8) {
        self.log.borrow_mut().push(format!("peri.div={}", divider));
        self.divider.set(divider);
    }
}

/// Sleep back-end that records instead of halting.
pub struct FakeSleep {
    log: Log,
}

impl FakeSleep {
    pub fn new(log: &Log) -> Self {
        FakeSleep { log: log.clone() }
    }
}

impl SleepControl for FakeSleep {
    fn sleep(&mut self) {
        self.log.borrow_mut().push("cpu.sleep".into());
    }

    fn deep_sleep(&mut self) {
        self.log.borrow_mut().push("cpu.deepsleep".into());
    }
}

/// Wake-interrupt line with a latched flag and a clear counter.
pub struct FakeWake {
    pending: bool,
    clears: u32,
}

impl FakeWake {
    pub fn pending() -> Self {
        FakeWake {
            pending: true,
            clears: 0,
        }
    }

    pub fn idle() -> Self {
        FakeWake {
            pending: false,
            clears: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }
}

impl WakeInterrupt for FakeWake {
    fn pending(&mut self) -> bool {
        self.pending
    }

    fn clear(&mut self) {
        self.pending = false;
        self.clears += 1;
    }
}

/// Observer that records both phases and can be made to fail either one.
///
/// A failing phase still logs before returning its error, so tests can see
/// that the phase ran.
pub struct RecordingObserver {
    log: Log,
    name: &'static str,
    before_error: Option<HookError>,
    after_error: Option<HookError>,
}

impl RecordingObserver {
    pub fn new(log: &Log, name: &'static str) -> Self {
        RecordingObserver {
            log: log.clone(),
            name,
            before_error: None,
            after_error: None,
        }
    }

    pub fn failing_before(mut self, error: HookError) -> Self {
        self.before_error = Some(error);
        self
    }

    pub fn failing_after(mut self, error: HookError) -> Self {
        self.after_error = Some(error);
        self
    }
}

impl TransitionObserver for RecordingObserver {
    fn before_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        self.log.borrow_mut().push(format!(
            "{}.before {:?} ulp={}",
            self.name,
            cx.transition(),
            cx.is_ulp()
        ));
        match self.before_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn after_transition(&mut self, cx: &TransitionContext) -> Result<(), HookError> {
        self.log.borrow_mut().push(format!(
            "{}.after {:?} ulp={}",
            self.name,
            cx.transition(),
            cx.is_ulp()
        ));
        match self.after_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
