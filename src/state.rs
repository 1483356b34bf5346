//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::OcrService;
use crate::registry::DeviceRegistry;

/// Shared application state, cheap to clone into handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    registry: DeviceRegistry,
    ocr: OcrService,
}

impl AppState {
    pub fn new(config: Config, registry: DeviceRegistry, ocr: OcrService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                registry,
                ocr,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.inner.registry
    }

    pub fn ocr(&self) -> &OcrService {
        &self.inner.ocr
    }
}
