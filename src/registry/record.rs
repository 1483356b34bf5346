//! Device records and registry timestamps

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::nameplate::{MeterModel, NameplateFields, UNKNOWN};

/// Display offset for every timestamp the bot renders: UTC+05:00 (Tashkent).
/// The installation region does not observe daylight saving, so a fixed
/// offset is correct year-round.
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600).expect("constant offset is in range")
}

/// Timestamp format used in records, replies and reports.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Render a capture time in the fixed display offset.
pub fn format_captured_at(time: DateTime<Utc>) -> String {
    time.with_timezone(&display_offset())
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// One registered device. Written once at capture time, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub model: MeterModel,
    /// `0217` or `unknown`.
    pub metrological: String,
    /// `0575` or `unknown`.
    pub non_metrological: String,
    /// Capture time, already rendered in the display offset.
    pub captured_at: String,
}

impl DeviceRecord {
    /// Build a record from extracted fields and the capture time.
    pub fn from_fields(fields: &NameplateFields, captured: DateTime<Utc>) -> Self {
        Self {
            model: fields.model,
            metrological: fields.metrological.unwrap_or(UNKNOWN).to_string(),
            non_metrological: fields.non_metrological.unwrap_or(UNKNOWN).to_string(),
            captured_at: format_captured_at(captured),
        }
    }
}
