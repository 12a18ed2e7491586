//! Elapsed-time stamps measured from a single fixed process-start instant
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::Error;

/// The stamp of the clock reference itself
pub const START_TIME: Timestamp = Timestamp(0);

/// Elapsed time in microseconds
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::from_micros(millis * 1000)
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self::from_millis(seconds * 1000)
    }

    /// Get elapsed seconds (rounded down)
    pub fn to_seconds(&self) -> u64 {
        self.0 / 1_000_000
    }

    pub fn to_millis(&self) -> u64 {
        self.0 / 1_000
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        // u64 microseconds covers more than half a million years
        Self(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
    }
}

impl std::ops::Sub<Self> for Timestamp {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(other.0))
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, other: Duration) -> Self {
        Self(self.0.saturating_add(Self::from(other).0))
    }
}

/// Renders as `seconds:millis:micros`, padded to 4/3/3 columns
impl std::fmt::Display for Timestamp {
    fn fmt(&self, w: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        let secs = self.to_seconds();
        let millis = self.to_millis() % 1000;
        let micros = self.0 % 1000;

        write!(w, "{secs:>4}:{millis:>3}:{micros:>3}")
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':').map(|part| part.trim().parse::<u64>());

        let micros = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(secs)), Some(Ok(millis)), Some(Ok(micros)), None)
                if millis < 1000 && micros < 1000 =>
            {
                secs.checked_mul(1_000_000)
                    .and_then(|total| total.checked_add(millis * 1_000 + micros))
            }
            _ => None,
        };

        micros
            .map(Self)
            .ok_or_else(|| Error::ParseLine(format!("invalid timestamp `{s}`")))
    }
}

/// The instant every actor measures its stamps against
///
/// Captured once and never mutated; clones refer to the same instant.
#[derive(Debug, Clone, Copy)]
pub struct ClockReference {
    zero_point: Instant,
}

impl ClockReference {
    pub fn start() -> Self {
        Self {
            zero_point: Instant::now(),
        }
    }

    /// Time passed since the reference was captured
    pub fn elapsed(&self) -> Timestamp {
        self.zero_point.elapsed().into()
    }
}

#[cfg(test)]
mod tests {
    use super::{ClockReference, Timestamp, START_TIME};

    use std::time::Duration;

    #[test]
    fn timestamp_from_seconds() {
        let time = Timestamp::from_seconds(2);

        assert_eq!(2, time.to_seconds());
        assert_eq!(2_000, time.to_millis());
        assert_eq!(2_000_000, time.as_micros());
        assert_eq!(Duration::from_secs(2), time.as_duration());
    }

    #[test]
    fn display_splits_into_columns() {
        let time = Timestamp::from_micros(12_345_678);
        assert_eq!("  12:345:678", time.to_string());

        assert_eq!("   0:  0:  0", START_TIME.to_string());
    }

    #[test]
    fn parse_display_output() {
        let time = Timestamp::from_micros(1_002_003);
        let parsed: Timestamp = time.to_string().parse().unwrap();

        assert_eq!(time, parsed);
        assert!("1:2".parse::<Timestamp>().is_err());
        assert!("1:1000:0".parse::<Timestamp>().is_err());
    }

    #[test]
    fn parse_rejects_oversized_seconds() {
        assert!("99999999999999999:0:0".parse::<Timestamp>().is_err());
        assert!(format!("{}:0:0", u64::MAX).parse::<Timestamp>().is_err());

        let largest = u64::MAX / 1_000_000;
        let time: Timestamp = format!("{largest}:0:0").parse().unwrap();
        assert_eq!(largest, time.to_seconds());
    }

    #[test]
    fn subtraction_saturates() {
        let early = Timestamp::from_millis(5);
        let late = Timestamp::from_millis(7);

        assert_eq!(Duration::from_millis(2), late - early);
        assert_eq!(Duration::ZERO, early - late);
    }

    #[test]
    fn clock_is_monotonic() {
        let clock = ClockReference::start();
        let first = clock.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        let second = clock.elapsed();

        assert!(second > first);
        assert!(second - first >= Duration::from_millis(2));
    }
}
