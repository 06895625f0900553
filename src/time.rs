//! # Wall-Clock Sampling
//!
//! Every frame samples the time exactly once through a [`Clock`]. A clock reports epoch
//! milliseconds plus a *cached* UTC offset: the offset is only re-read when the engine
//! asks for it (becoming visible, or the host signalling a timezone change), mirroring
//! how a watch keeps its calendar's timezone until told otherwise.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};

/// The clock reading one frame is drawn from.
///
/// # Example
/// ```
/// use lerp_face_lib::time::TimeSample;
///
/// let sample = TimeSample::from_hms_milli(15, 7, 45, 500);
/// assert_eq!(sample.hour12, 3);
/// assert_eq!(sample.seconds(), 45.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeSample {
    /// 0–11
    pub hour12: u8,
    /// 0–59
    pub minute: u8,
    /// 0–59
    pub second: u8,
    /// 0–999
    pub millisecond: u16,
    /// Offset the sample was taken in
    pub offset: FixedOffset,
}

impl TimeSample {
    /// Build a UTC sample from 24-hour components (test and CLI helper).
    pub fn from_hms_milli(hour: u8, minute: u8, second: u8, millisecond: u16) -> Self {
        Self {
            hour12: hour % 12,
            minute: minute.min(59),
            second: second.min(59),
            millisecond: millisecond.min(999),
            offset: utc_offset(),
        }
    }

    pub fn from_datetime<Tz: TimeZone>(time: &DateTime<Tz>) -> Self {
        let nanos = time.nanosecond();
        // chrono reports a leap second as nanos >= 1e9
        let (second, millisecond) = if nanos >= 1_000_000_000 {
            (59, 999)
        } else {
            (time.second() as u8, (nanos / 1_000_000) as u16)
        };
        Self {
            hour12: (time.hour() % 12) as u8,
            minute: time.minute() as u8,
            second,
            millisecond,
            offset: time.offset().fix(),
        }
    }

    /// Sample epoch milliseconds in the given offset.
    pub fn from_epoch_millis(millis: i64, offset: FixedOffset) -> Self {
        let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
        Self::from_datetime(&utc.with_timezone(&offset))
    }

    /// Seconds including the fractional millisecond part.
    pub fn seconds(&self) -> f32 {
        f32::from(self.second) + f32::from(self.millisecond) / 1000.0
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Wall-clock source with a cached timezone.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;

    /// The cached UTC offset used for sampling.
    fn offset(&self) -> FixedOffset;

    /// Re-read the system timezone into the cache.
    fn refresh_timezone(&mut self);

    fn sample(&self) -> TimeSample {
        TimeSample::from_epoch_millis(self.now_millis(), self.offset())
    }
}

/// The host's real clock.
#[derive(Clone, Debug)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            offset: *Local::now().offset(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn refresh_timezone(&mut self) {
        self.offset = *Local::now().offset();
    }
}

/// A clock that only moves when told to.
///
/// `system_offset` plays the role of the OS timezone setting: changing it has no effect
/// on samples until [`Clock::refresh_timezone`] is called.
#[derive(Clone, Debug)]
pub struct ManualClock {
    millis: i64,
    offset: FixedOffset,
    system_offset: FixedOffset,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis,
            offset: utc_offset(),
            system_offset: utc_offset(),
        }
    }

    /// Clock reading `hour:minute:second.millisecond` UTC on 2024-01-01.
    pub fn at_hms_milli(hour: u32, minute: u32, second: u32, millisecond: u32) -> Self {
        const JAN_1_2024_MS: i64 = 1_704_067_200_000;
        let offset_ms =
            ((i64::from(hour) * 60 + i64::from(minute)) * 60 + i64::from(second)) * 1000
                + i64::from(millisecond);
        Self::new(JAN_1_2024_MS + offset_ms)
    }

    pub fn advance_millis(&mut self, delta: i64) {
        self.millis += delta;
    }

    /// Change the "OS" timezone; picked up on the next refresh.
    pub fn set_system_offset(&mut self, offset: FixedOffset) {
        self.system_offset = offset;
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn refresh_timezone(&mut self) {
        self.offset = self.system_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_datetime_uses_twelve_hour_clock() {
        let time = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 15, 7, 45)
            .unwrap();
        let sample = TimeSample::from_datetime(&time);
        assert_eq!(sample.hour12, 3);
        assert_eq!(sample.minute, 7);
        assert_eq!(sample.second, 45);
        assert_eq!(sample.millisecond, 0);

        let midnight = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 0, 0, 0)
            .unwrap();
        assert_eq!(TimeSample::from_datetime(&midnight).hour12, 0);
    }

    #[test]
    fn test_manual_clock_sample() {
        let clock = ManualClock::at_hms_milli(3, 7, 45, 500);
        let sample = clock.sample();
        assert_eq!(
            (sample.hour12, sample.minute, sample.second, sample.millisecond),
            (3, 7, 45, 500)
        );
    }

    #[test]
    fn test_timezone_only_changes_on_refresh() {
        let mut clock = ManualClock::at_hms_milli(10, 0, 0, 0);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        clock.set_system_offset(plus_two);
        assert_eq!(clock.sample().hour12, 10);
        clock.refresh_timezone();
        assert_eq!(clock.offset(), plus_two);
        assert_eq!(clock.sample().hour12, 0);
    }

    #[test]
    fn test_leap_second_clamps() {
        let time = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2016, 12, 31, 23, 59, 59)
            .unwrap()
            .with_nanosecond(1_500_000_000)
            .unwrap();
        let sample = TimeSample::from_datetime(&time);
        assert_eq!((sample.second, sample.millisecond), (59, 999));
    }
}
