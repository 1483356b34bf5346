//! Nameplate field extraction
//!
//! Turns normalized OCR text into the structured fields stamped on a meter's
//! nameplate: the 16-character serial, the model implied by it, and the two
//! fixed firmware codes.

mod extract;
mod types;

pub use extract::extract_fields;
pub use types::{
    MeterModel, NameplateFields, METROLOGICAL_CODE, NON_METROLOGICAL_CODE, UNKNOWN,
};
