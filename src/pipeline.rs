//! Capture processing pipeline
//!
//! One photo in, one outcome out: decode and preprocess the image, read text
//! off it, extract nameplate fields, then try to record the serial. Every
//! failure is local to the one capture; nothing here carries state across
//! messages.

use chrono::{DateTime, Utc};
use tokio::task;

use crate::imaging::{self, PreprocessOptions};
use crate::nameplate::{self, NameplateFields};
use crate::registry::{DeviceRecord, InsertOutcome};
use crate::state::AppState;

/// Why a capture produced nothing readable.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The bytes did not decode, or the processed image failed to encode.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// No backend produced text; terminal for this capture.
    #[error("no text recognized in image")]
    NoText,

    #[error("image task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Result of processing one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// New serial, now recorded.
    Recorded {
        serial: String,
        record: DeviceRecord,
    },
    /// The serial already had a record.
    Duplicate { serial: String },
    /// Text was read but no nameplate fields were in it.
    NothingFound,
}

/// Run the full pipeline over one photo.
pub async fn process_capture(
    state: &AppState,
    image_bytes: Vec<u8>,
    captured_at: DateTime<Utc>,
) -> Result<CaptureOutcome, CaptureError> {
    let opts = PreprocessOptions {
        contrast: state.config().imaging.contrast,
        binarize: state.config().imaging.binarize,
        threshold: state.config().imaging.binarize_threshold,
    };

    // Decode and the filter chain are CPU-bound; keep them off the async
    // workers.
    let encoded = task::spawn_blocking(move || -> Result<Vec<u8>, image::ImageError> {
        let processed = imaging::prepare_for_ocr(&image_bytes, &opts)?;
        imaging::encode_png(&processed)
    })
    .await??;

    let text = state.ocr().read_text(&encoded).await;
    if text.is_empty() {
        return Err(CaptureError::NoText);
    }

    match nameplate::extract_fields(&text) {
        Some(fields) => Ok(record_fields(state, fields, captured_at).await),
        None => {
            tracing::info!("no nameplate fields in recognized text");
            Ok(CaptureOutcome::NothingFound)
        }
    }
}

/// Deduplicate and record extracted fields.
pub async fn record_fields(
    state: &AppState,
    fields: NameplateFields,
    captured_at: DateTime<Utc>,
) -> CaptureOutcome {
    let serial = fields.serial.clone();
    let record = DeviceRecord::from_fields(&fields, captured_at);

    match state
        .registry()
        .insert_if_absent(&serial, record.clone())
        .await
    {
        InsertOutcome::Recorded => CaptureOutcome::Recorded { serial, record },
        InsertOutcome::Duplicate => {
            tracing::info!(%serial, "serial already recorded");
            CaptureOutcome::Duplicate { serial }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ocr::{MockProvider, OcrService};
    use crate::registry::DeviceRegistry;
    use chrono::TimeZone;
    use image::{GrayImage, Luma};
    use std::sync::Arc;

    async fn state_with_ocr(dir: &tempfile::TempDir, provider: MockProvider) -> AppState {
        let registry = DeviceRegistry::load(&dir.path().join("devices.json"))
            .await
            .unwrap();
        let ocr = OcrService::with_providers(vec![Arc::new(provider)]);
        AppState::new(Config::default(), registry, ocr)
    }

    fn photo_bytes() -> Vec<u8> {
        let image = GrayImage::from_pixel(24, 12, Luma([128]));
        crate::imaging::encode_png(&image).unwrap()
    }

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 7, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn records_a_new_device() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(
            &dir,
            MockProvider::ok("METER TPGR0A1B2C3D4E5F 0217 0575"),
        )
        .await;

        let outcome = process_capture(&state, photo_bytes(), capture_time())
            .await
            .unwrap();

        match outcome {
            CaptureOutcome::Recorded { serial, record } => {
                assert_eq!(serial, "TPGR0A1B2C3D4E5F");
                assert_eq!(record.metrological, "0217");
                assert_eq!(record.captured_at, "10/05/2024 12:00:00");
            }
            other => panic!("expected Recorded, got {other:?}"),
        }
        assert!(state.registry().contains("TPGR0A1B2C3D4E5F").await);
    }

    #[tokio::test]
    async fn repeated_captures_report_a_duplicate_and_keep_the_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(&dir, MockProvider::ok("TPGR0A1B2C3D4E5F 0217")).await;

        process_capture(&state, photo_bytes(), capture_time())
            .await
            .unwrap();
        let second = process_capture(
            &state,
            photo_bytes(),
            Utc.with_ymd_and_hms(2024, 5, 11, 7, 0, 0).unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(
            second,
            CaptureOutcome::Duplicate {
                serial: "TPGR0A1B2C3D4E5F".to_string()
            }
        );
        let snapshot = state.registry().snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].1.captured_at, "10/05/2024 12:00:00");
    }

    #[tokio::test]
    async fn text_without_a_serial_is_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(&dir, MockProvider::ok("JUST A WALL, NO PLATE")).await;

        let outcome = process_capture(&state, photo_bytes(), capture_time())
            .await
            .unwrap();
        assert_eq!(outcome, CaptureOutcome::NothingFound);
        assert!(state.registry().is_empty().await);
    }

    #[tokio::test]
    async fn empty_recognition_is_a_no_text_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(&dir, MockProvider::ok("")).await;

        let result = process_capture(&state, photo_bytes(), capture_time()).await;
        assert!(matches!(result, Err(CaptureError::NoText)));
    }

    #[tokio::test]
    async fn backend_failure_is_a_no_text_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(&dir, MockProvider::failing()).await;

        let result = process_capture(&state, photo_bytes(), capture_time()).await;
        assert!(matches!(result, Err(CaptureError::NoText)));
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_before_recognition() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_ocr(&dir, MockProvider::ok("TPGR0A1B2C3D4E5F")).await;

        let result =
            process_capture(&state, b"not an image".to_vec(), capture_time()).await;
        assert!(matches!(result, Err(CaptureError::Image(_))));
        assert!(state.registry().is_empty().await);
    }
}
