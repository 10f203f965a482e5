//! Press-duration classification
//!
//! Presses are measured in ticks of the free-running counter and sorted into
//! three severity tiers. Comparison is strict and runs longest-first, so a
//! tick count exactly equal to a threshold lands in the lower tier.

/// A classified button press.
///
/// Derived purely from the elapsed tick count on the release edge; the
/// variants are ordered by severity.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PressEvent {
    /// No press, or a press too short to count as deliberate.
    #[default]
    None,
    /// Quick press: toggles between the low-power and ultra-low-power
    /// profiles.
    Quick,
    /// Short press: sends the CPU to sleep.
    Short,
    /// Long press: sends the CPU to deep sleep.
    Long,
}

/// Press-duration thresholds, in counter ticks.
///
/// The thresholds must be strictly ordered (`quick < short < long`). The
/// defaults are tuned for the demo counter rate, where a quick press is
/// anything under roughly 200 ms and a long press holds the button past the
/// two second mark.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Thresholds {
    /// Minimum tick count for a press to register at all.
    pub quick: u32,
    /// Tick count above which a press counts as short rather than quick.
    pub short: u32,
    /// Tick count above which a press counts as long.
    pub long: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            quick: 5_000,    // < 200 milliseconds
            short: 100_000,  // ~ 1 second
            long: 500_000,   // > 2 seconds
        }
    }
}

impl Thresholds {
    /// Classifies an elapsed tick count.
    ///
    /// Strictly-greater-than comparisons, longest threshold first; a count
    /// exactly equal to a threshold resolves to the lower-severity event.
    pub const fn classify(&self, ticks: u32) -> PressEvent {
        if ticks > self.long {
            PressEvent::Long
        } else if ticks > self.short {
            PressEvent::Short
        } else if ticks > self.quick {
            PressEvent::Quick
        } else {
            PressEvent::None
        }
    }
}
