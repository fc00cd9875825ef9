//! Validation limits applied to every sample.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Maximum number of files per sample
pub const MAX_FILES: usize = 20;

/// Maximum size of a single file in bytes. "fid" is usually the largest
/// file at about 85,000 bytes.
pub const MAX_FILESIZE: usize = 200_000;

/// Limits and clock used when reading and validating samples.
///
/// `Default` gives the limits the upload workflow runs with. Tests pin
/// `reference_time` so the date window does not depend on the wall clock.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Ceiling on the number of files attached to one sample
    pub max_files: usize,
    /// Ceiling on the size of each file, in bytes
    pub max_file_size: usize,
    /// Oldest acceptable acquisition or calibration date
    pub earliest_date: DateTime<Utc>,
    /// How far past the reference time a date may lie
    pub future_tolerance: TimeDelta,
    /// "Now" for the date window; `None` reads the system clock
    pub reference_time: Option<DateTime<Utc>>,
}

impl SampleConfig {
    /// Pin the clock used for the upper bound of the date window.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Latest acceptable date.
    pub fn latest_date(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now) + self.future_tolerance
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_file_size: MAX_FILESIZE,
            earliest_date: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
            future_tolerance: TimeDelta::days(1),
            reference_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_date_uses_pinned_clock() {
        let now = Utc.with_ymd_and_hms(2023, 3, 1, 12, 0, 0).unwrap();
        let config = SampleConfig::default().with_reference_time(now);
        assert_eq!(
            config.latest_date(),
            Utc.with_ymd_and_hms(2023, 3, 2, 12, 0, 0).unwrap()
        );
    }
}
