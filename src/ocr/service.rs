//! OCR service
//!
//! Holds the provider chain and turns one encoded image into one normalized
//! string. Backend failure is terminal for the image, not for the call:
//! every error falls through to the next backend, and when none is left the
//! result is an empty string, which downstream treats as "nothing readable".

use std::sync::Arc;

use crate::config::OcrConfig;

use super::provider::{OcrProvider, RemoteOcrProvider, TesseractProvider};
use super::types::OcrBackend;

pub struct OcrService {
    providers: Vec<Arc<dyn OcrProvider>>,
}

impl OcrService {
    /// Build the provider chain in the configured priority order.
    pub fn new(config: &OcrConfig) -> Self {
        let providers = config
            .backends
            .iter()
            .map(|backend| -> Arc<dyn OcrProvider> {
                match backend {
                    OcrBackend::Tesseract => Arc::new(TesseractProvider::new(&config.languages)),
                    OcrBackend::Remote => {
                        Arc::new(RemoteOcrProvider::new(&config.remote_url, &config.languages))
                    }
                }
            })
            .collect();
        Self { providers }
    }

    /// Build a service over explicit providers, for tests and embedding.
    pub fn with_providers(providers: Vec<Arc<dyn OcrProvider>>) -> Self {
        Self { providers }
    }

    /// Backends that can currently serve requests.
    pub async fn available_backends(&self) -> Vec<OcrBackend> {
        let mut available = Vec::new();
        for provider in &self.providers {
            if provider.is_available().await {
                available.push(provider.backend());
            }
        }
        available
    }

    /// Recognize and normalize text from a PNG-encoded image.
    pub async fn read_text(&self, image_data: &[u8]) -> String {
        for provider in &self.providers {
            if !provider.is_available().await {
                tracing::debug!(backend = %provider.backend(), "skipping unavailable OCR backend");
                continue;
            }
            match provider.recognize(image_data).await {
                Ok(raw) => {
                    let text = normalize_text(&raw);
                    tracing::info!(
                        backend = %provider.backend(),
                        chars = text.chars().count(),
                        "text recognized"
                    );
                    tracing::debug!(%text, "normalized OCR output");
                    return text;
                }
                Err(e) => {
                    tracing::warn!(backend = %provider.backend(), "OCR backend failed: {e}");
                }
            }
        }
        tracing::warn!("no OCR backend produced text");
        String::new()
    }
}

/// Reduce raw engine output to the characters field extraction cares about:
/// keep letters, digits, whitespace, `.`, `:` and `-`, drop the rest, then
/// collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '.' | ':' | '-'))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
