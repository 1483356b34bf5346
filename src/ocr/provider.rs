//! Recognition backends
//!
//! Tesseract runs as a subprocess so the binary stays a runtime dependency
//! rather than a build one; the remote provider covers deployments that keep
//! recognition on a separate box (typically an EasyOCR sidecar, which handles
//! Cyrillic plates better than a local Tesseract install).

use async_trait::async_trait;
use tokio::process::Command;

use super::types::{OcrBackend, OcrError};

/// A single recognition backend.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Which backend this is.
    fn backend(&self) -> OcrBackend;

    /// Whether the backend can currently serve requests.
    async fn is_available(&self) -> bool;

    /// Recognize text in a PNG-encoded image. Returns the raw engine output;
    /// normalization happens in the service.
    async fn recognize(&self, image_data: &[u8]) -> Result<String, OcrError>;
}

/// Local Tesseract subprocess.
pub struct TesseractProvider {
    /// Language spec passed to `-l`, e.g. `eng+rus`.
    languages: String,
}

impl TesseractProvider {
    pub fn new(languages: &str) -> Self {
        Self {
            languages: languages.to_string(),
        }
    }
}

#[async_trait]
impl OcrProvider for TesseractProvider {
    fn backend(&self) -> OcrBackend {
        OcrBackend::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .await
            .is_ok()
    }

    async fn recognize(&self, image_data: &[u8]) -> Result<String, OcrError> {
        let stem = std::env::temp_dir().join(format!("nameplate_ocr_{}", uuid::Uuid::new_v4()));
        let input_path = stem.with_extension("png");

        tokio::fs::write(&input_path, image_data)
            .await
            .map_err(|e| OcrError::Staging(format!("failed to write temp image: {e}")))?;

        // PSM 6 treats the image as one uniform text block, the closest fit
        // for a nameplate crop.
        let output = Command::new("tesseract")
            .arg(&input_path)
            .arg(&stem)
            .arg("-l")
            .arg(&self.languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("6")
            .output()
            .await;

        let _ = tokio::fs::remove_file(&input_path).await;

        let output = output
            .map_err(|e| OcrError::Recognition(format!("failed to run tesseract: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let output_path = stem.with_extension("txt");
        let text = tokio::fs::read_to_string(&output_path)
            .await
            .map_err(|e| OcrError::Recognition(format!("failed to read tesseract output: {e}")))?;
        let _ = tokio::fs::remove_file(&output_path).await;

        Ok(text)
    }
}

/// Remote recognition service.
///
/// Contract: POST the image as base64 with the language spec, get back
/// `{"text": "..."}`. Non-2xx responses and transport failures both count
/// as backend failure so the service can fall through to the next one.
pub struct RemoteOcrProvider {
    client: reqwest::Client,
    url: String,
    languages: String,
}

impl RemoteOcrProvider {
    pub fn new(url: &str, languages: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            languages: languages.to_string(),
        }
    }
}

#[async_trait]
impl OcrProvider for RemoteOcrProvider {
    fn backend(&self) -> OcrBackend {
        OcrBackend::Remote
    }

    async fn is_available(&self) -> bool {
        !self.url.is_empty()
    }

    async fn recognize(&self, image_data: &[u8]) -> Result<String, OcrError> {
        use base64::Engine;

        if self.url.is_empty() {
            return Err(OcrError::BackendUnavailable(
                "OCR_REMOTE_URL is not configured".to_string(),
            ));
        }

        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        let request = serde_json::json!({
            "image": image_base64,
            "languages": self.languages,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::Api(format!("failed to call recognition service: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(format!(
                "recognition service returned {status}: {body}"
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::Api(format!("failed to parse response: {e}")))?;

        Ok(result["text"].as_str().unwrap_or("").to_string())
    }
}

/// Scripted provider for tests.
#[cfg(test)]
pub struct MockProvider {
    pub backend: OcrBackend,
    pub available: bool,
    /// `None` makes `recognize` fail.
    pub reply: Option<String>,
}

#[cfg(test)]
impl MockProvider {
    pub fn ok(text: &str) -> Self {
        Self {
            backend: OcrBackend::Tesseract,
            available: true,
            reply: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            backend: OcrBackend::Tesseract,
            available: true,
            reply: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            backend: OcrBackend::Remote,
            available: false,
            reply: Some("should never be returned".to_string()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProvider for MockProvider {
    fn backend(&self) -> OcrBackend {
        self.backend
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, _image_data: &[u8]) -> Result<String, OcrError> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(OcrError::Recognition("scripted failure".to_string())),
        }
    }
}
