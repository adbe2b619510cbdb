//! Rotary encoder on the ESP32 PCNT peripheral
//!
//! The PCNT driver itself is only available when building for ESP-IDF. The wrap
//! bookkeeping it relies on is plain atomics and is tested on the host.
use std::sync::atomic::{AtomicI32, Ordering};

#[cfg(target_os = "espidf")]
mod pcnt;

#[cfg(target_os = "espidf")]
pub use pcnt::Encoder;

/// Bound of the hardware counter, it wraps to zero when reaching `±COUNTER_LIMIT`
pub const COUNTER_LIMIT: i16 = 100;

/// Counts carried over each time the hardware counter hits a limit
#[derive(Debug, Default)]
pub struct Wraps(AtomicI32);

impl Wraps {
    /// Record limit events, safe to call from an interrupt handler
    pub fn record(&self, high: bool, low: bool) {
        if high {
            self.0.fetch_add(COUNTER_LIMIT as i32, Ordering::SeqCst);
        }
        if low {
            self.0.fetch_sub(COUNTER_LIMIT as i32, Ordering::SeqCst);
        }
    }

    /// Absolute count given the current hardware counter value
    pub fn position(&self, counter: i16, sign: i32) -> i32 {
        sign * (self.0.load(Ordering::Relaxed) + counter as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_alone() {
        let wraps = Wraps::default();
        assert_eq!(wraps.position(42, 1), 42);
        assert_eq!(wraps.position(-7, 1), -7);
    }

    #[test]
    fn wraps_extend_range() {
        let wraps = Wraps::default();
        wraps.record(true, false);
        wraps.record(true, false);
        assert_eq!(wraps.position(15, 1), 215);

        wraps.record(false, true);
        wraps.record(false, true);
        wraps.record(false, true);
        assert_eq!(wraps.position(-20, 1), -120);
    }

    #[test]
    fn reversed_sign() {
        let wraps = Wraps::default();
        wraps.record(true, false);
        assert_eq!(wraps.position(3, -1), -103);
    }
}
