//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Number of whole cycles of `period_s` that fit in `duration_s`, rounded up.
///
/// Used to turn a timeout into a cycle budget. A duration that is within a nanosecond of a whole
/// number of cycles is treated as that number of cycles, so `5.0 / 0.02` gives 250 and not 251.
pub fn cycles_in(duration_s: f64, period_s: f64) -> u64 {
    let cycles = duration_s / period_s;
    let rounded = cycles.round();

    if (cycles - rounded).abs() * period_s < 1e-9 {
        rounded.max(0.0) as u64
    } else {
        cycles.ceil().max(0.0) as u64
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }

    #[test]
    fn test_cycles_in() {
        assert_eq!(cycles_in(5.0, 0.02), 250);
        assert_eq!(cycles_in(0.1, 0.02), 5);
        assert_eq!(cycles_in(0.05, 0.02), 3);
        assert_eq!(cycles_in(0.0, 0.02), 0);
    }
}
