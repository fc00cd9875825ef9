use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// The values stored for each accepted sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRecord {
    pub root_path: String,
    /// SHA-256 of the sample contents, lowercase hex
    pub digest: String,
    pub sample_id: String,
    pub target_id: String,
    pub acquisition_date: DateTime<FixedOffset>,
    pub instrument_serial_number: String,
    pub instrument_type: u8,
    pub digitizer_type: u8,
    pub position: String,
    pub original_path: String,
    pub flex_control_version: String,
    pub aida_version: String,
    pub calibration_date: DateTime<FixedOffset>,
    pub spectrum_size: u64,
}
