//! Nameplate field types

use serde::{Deserialize, Serialize};

/// Fixed firmware code of the metrological part.
pub const METROLOGICAL_CODE: &str = "0217";

/// Fixed firmware code of the non-metrological part.
pub const NON_METROLOGICAL_CODE: &str = "0575";

/// Rendered wherever a field could not be read off the plate.
pub const UNKNOWN: &str = "unknown";

/// Meter model, keyed by the serial's seventh character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterModel {
    #[serde(rename = "G1.6")]
    G1_6,
    #[serde(rename = "G2.5")]
    G2_5,
    #[serde(rename = "G4")]
    G4,
    #[serde(rename = "G6")]
    G6,
    #[serde(rename = "G10")]
    G10,
    #[serde(rename = "G16")]
    G16,
    #[serde(rename = "unknown")]
    Unknown,
}

impl MeterModel {
    /// Look up the model for a serial's selector character (0-based index 6).
    pub fn from_selector(selector: char) -> Self {
        match selector {
            '1' => Self::G1_6,
            '2' => Self::G2_5,
            '4' => Self::G4,
            '6' => Self::G6,
            '7' => Self::G10,
            '8' => Self::G16,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::G1_6 => "G1.6",
            Self::G2_5 => "G2.5",
            Self::G4 => "G4",
            Self::G6 => "G6",
            Self::G10 => "G10",
            Self::G16 => "G16",
            Self::Unknown => UNKNOWN,
        }
    }
}

impl std::fmt::Display for MeterModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields recovered from one nameplate photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameplateFields {
    /// 16-character serial as the camera saw it.
    pub serial: String,
    pub model: MeterModel,
    /// The metrological firmware code, when legible.
    pub metrological: Option<&'static str>,
    /// The non-metrological firmware code, when legible.
    pub non_metrological: Option<&'static str>,
}
