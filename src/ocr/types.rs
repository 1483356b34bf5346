//! OCR types

use serde::{Deserialize, Serialize};

/// Identifier for a recognition backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// Local `tesseract` binary, run as a subprocess.
    Tesseract,
    /// Remote recognition service speaking the JSON contract in `provider.rs`.
    Remote,
}

impl OcrBackend {
    /// Parse a backend name as written in configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Some(Self::Tesseract),
            "remote" | "http" => Some(Self::Remote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Remote => "remote",
        }
    }
}

impl std::fmt::Display for OcrBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("backend not available: {0}")]
    BackendUnavailable(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("recognition service error: {0}")]
    Api(String),

    #[error("failed to stage image for recognition: {0}")]
    Staging(String),
}
