//! Text recognition
//!
//! The recognition engine is a black box behind [`OcrProvider`]; the service
//! tries the configured backends in priority order and normalizes whatever
//! raw text comes back into the single-line form field extraction expects.

mod provider;
mod service;
mod types;

pub use provider::{OcrProvider, RemoteOcrProvider, TesseractProvider};
pub use service::{normalize_text, OcrService};
pub use types::{OcrBackend, OcrError};

#[cfg(test)]
pub use provider::MockProvider;
