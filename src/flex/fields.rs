//! Format checks and transforms for individual metadata fields.
//!
//! Each function receives the raw (already trimmed) field value and returns
//! the typed value, or a short reason that the sample wraps together with
//! the field and file names.

use chrono::{DateTime, FixedOffset, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// RFC 3339 with milliseconds, e.g. `2023-02-22T12:47:40.909+01:00`
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

lazy_static! {
    static ref SAMPLE_ID: Regex = Regex::new(r"^[a-f0-9]{32}$").unwrap();
    static ref TARGET_ID: Regex = Regex::new(r"^G[A-F0-9]{32}$").unwrap();
    static ref SERIAL_NUMBER: Regex = Regex::new(r"^[0-9]{1,12}\.[0-9]{5}$").unwrap();
    static ref INSTRUMENT_TYPE: Regex = Regex::new(r"^([0-9]|10)$").unwrap();
    static ref DIGITIZER_TYPE: Regex = Regex::new(r"^1?[0-9]$").unwrap();
    static ref POSITION: Regex = Regex::new(r"^[A-Z][0-9]{1,2}$").unwrap();
    static ref FLEX_CONTROL_VERSION: Regex = Regex::new(r"^flexControl [0-9.]+[0-9]+$").unwrap();
    static ref AIDA_VERSION: Regex = Regex::new(r"^AIDA[0-9.]+[0-9]+$").unwrap();
    // chrono accepts a missing fraction and `+0100` for DATE_FORMAT
    static ref DATE: Regex = Regex::new(
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}[+-][0-9]{2}:[0-9]{2}$"
    )
    .unwrap();
}

/// Bytes per spectrum data point
const SPECTRUM_UNIT: u64 = 4;

type Checked<T> = std::result::Result<T, &'static str>;

/// `$ID_raw`: a UUID, returned as 32 lowercase hex digits
pub fn sample_id(value: &str) -> Checked<String> {
    let id = value.replace('-', "");
    if !SAMPLE_ID.is_match(&id) {
        return Err("Invalid sample ID");
    }
    Ok(id)
}

/// `$TgIDS`: `G` followed by 32 uppercase hex digits, returned lowercased
/// without the `G`
pub fn target_id(value: &str) -> Checked<String> {
    let id = value.replace('_', "");
    if !TARGET_ID.is_match(&id) {
        return Err("Invalid target ID");
    }
    Ok(id[1..].to_lowercase())
}

pub fn instrument_serial_number(value: &str) -> Checked<String> {
    if !SERIAL_NUMBER.is_match(value) {
        return Err("Invalid instrument serial number");
    }
    Ok(value.to_string())
}

/// 0 to 10
pub fn instrument_type(value: &str) -> Checked<u8> {
    if !INSTRUMENT_TYPE.is_match(value) {
        return Err("Invalid instrument type");
    }
    value.parse().map_err(|_| "Invalid instrument type")
}

/// 0 to 19
pub fn digitizer_type(value: &str) -> Checked<u8> {
    if !DIGITIZER_TYPE.is_match(value) {
        return Err("Invalid digitizer type");
    }
    value.parse().map_err(|_| "Invalid digitizer type")
}

/// Well on the target plate, e.g. `E1`
pub fn position(value: &str) -> Checked<String> {
    if !POSITION.is_match(value) {
        return Err("Invalid sample position");
    }
    Ok(value.to_string())
}

/// Path the sample was saved to on the acquisition computer, with forward
/// slashes
pub fn original_path(value: &str) -> Checked<String> {
    let path = value.trim();
    if path.is_empty() {
        return Err("Invalid sample path");
    }
    Ok(path.replace('\\', "/"))
}

/// `flexControl 3.4.207.20` → `3.4.207.20`
pub fn flex_control_version(value: &str) -> Checked<String> {
    if !FLEX_CONTROL_VERSION.is_match(value) {
        return Err("Invalid flexControl version");
    }
    Ok(value["flexControl ".len()..].to_string())
}

/// `AIDA3.4.207.20` → `3.4.207.20`
pub fn aida_version(value: &str) -> Checked<String> {
    if !AIDA_VERSION.is_match(value) {
        return Err("Invalid AIDA version");
    }
    Ok(value["AIDA".len()..].to_string())
}

/// Parse a timestamp and check that it falls inside `[earliest, latest]`.
pub fn date(
    value: &str,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
) -> Checked<DateTime<FixedOffset>> {
    if !DATE.is_match(value) {
        return Err("Invalid date format");
    }
    let date =
        DateTime::parse_from_str(value, DATE_FORMAT).map_err(|_| "Invalid date format")?;
    if date < earliest {
        return Err("Date is too old");
    }
    if date > latest {
        return Err("Date is in the future");
    }
    Ok(date)
}

/// Number of 32-bit data points in a spectrum of `bytes` bytes, if the size is
/// a positive multiple of four.
pub fn spectrum_size(bytes: u64) -> Option<u64> {
    (bytes > 0 && bytes % SPECTRUM_UNIT == 0).then_some(bytes / SPECTRUM_UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_id() {
        assert_eq!(
            sample_id("16824b6e-acf1-4b9d-861c-d7d18b6a1237").unwrap(),
            "16824b6eacf14b9d861cd7d18b6a1237"
        );
        assert!(sample_id("16824B6E-ACF1-4B9D-861C-D7D18B6A1237").is_err());
        assert!(sample_id("16824b6e-acf1-4b9d-861c-d7d18b6a123").is_err());
    }

    #[test]
    fn test_target_id() {
        assert_eq!(
            target_id("GFE4FEFFA_0C05_4941_B01D_B2DEDEF2F95F").unwrap(),
            "fe4feffa0c054941b01db2dedef2f95f"
        );
        assert!(target_id("FE4FEFFA0C054941B01DB2DEDEF2F95F").is_err());
        assert!(target_id("Gfe4feffa0c054941b01db2dedef2f95f").is_err());
    }

    #[test]
    fn test_serial_number() {
        assert_eq!(instrument_serial_number("8604832.05252").unwrap(), "8604832.05252");
        assert!(instrument_serial_number("8604832.0525").is_err());
        assert!(instrument_serial_number("1234567890123.05252").is_err());
        assert!(instrument_serial_number(".05252").is_err());
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(instrument_type("0").unwrap(), 0);
        assert_eq!(instrument_type("10").unwrap(), 10);
        assert!(instrument_type("11").is_err());
        assert!(instrument_type("-1").is_err());

        assert_eq!(digitizer_type("19").unwrap(), 19);
        assert_eq!(digitizer_type("7").unwrap(), 7);
        assert!(digitizer_type("20").is_err());
        assert!(digitizer_type("09x").is_err());
    }

    #[test]
    fn test_position() {
        assert_eq!(position("E1").unwrap(), "E1");
        assert_eq!(position("P24").unwrap(), "P24");
        assert!(position("e1").is_err());
        assert!(position("E123").is_err());
    }

    #[test]
    fn test_original_path() {
        assert_eq!(
            original_path(r"D:\Data\23050678\0_E1\1").unwrap(),
            "D:/Data/23050678/0_E1/1"
        );
        assert!(original_path("   ").is_err());
    }

    #[test]
    fn test_versions() {
        assert_eq!(flex_control_version("flexControl 3.4.207.20").unwrap(), "3.4.207.20");
        assert!(flex_control_version("flexControl").is_err());
        assert!(flex_control_version("flexControl 3.4.").is_err());
        assert_eq!(aida_version("AIDA3.4.207.20").unwrap(), "3.4.207.20");
        assert!(aida_version("AIDA 3.4").is_err());
    }

    #[test]
    fn test_date_window() {
        let earliest = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();

        let parsed = date("2023-02-22T12:47:40.909+01:00", earliest, latest).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 3600);
        assert_eq!(
            parsed.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 2, 22, 11, 47, 40).unwrap()
                + chrono::TimeDelta::milliseconds(909)
        );

        assert_eq!(
            date("2009-12-31T23:59:59.999+00:00", earliest, latest),
            Err("Date is too old")
        );
        assert_eq!(
            date("2023-03-01T00:00:00.001+00:00", earliest, latest),
            Err("Date is in the future")
        );
        assert_eq!(date("22/02/2023", earliest, latest), Err("Invalid date format"));
        for value in [
            "2023-02-22T12:47:40+01:00",
            "2023-02-22T12:47:40.9+01:00",
            "2023-02-22T12:47:40.909123+01:00",
            "2023-02-22T12:47:40.909+0100",
            "2023-02-22T12:47:40.909Z",
            "2023-02-22 12:47:40.909+01:00",
        ] {
            assert_eq!(date(value, earliest, latest), Err("Invalid date format"), "{value}");
        }
    }

    #[test]
    fn test_spectrum_size() {
        assert_eq!(spectrum_size(21_404), Some(5_351));
        assert_eq!(spectrum_size(0), None);
        assert_eq!(spectrum_size(21), None);
    }
}
