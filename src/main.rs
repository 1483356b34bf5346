//! Nameplate bot
//!
//! Watches a Telegram group for photographed gas meter nameplates, reads
//! them with OCR, keeps a deduplicated device registry on disk and answers
//! `/report` with a spreadsheet. A small HTTP listener answers liveness
//! probes from the hosting platform.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nameplate_bot::config::Config;
use nameplate_bot::ocr::OcrService;
use nameplate_bot::registry::DeviceRegistry;
use nameplate_bot::routes;
use nameplate_bot::state::AppState;
use nameplate_bot::telegram;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nameplate_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing::info!("starting nameplate bot v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config.registry.data_file.display(), "registry file");
    match config.telegram.group_chat_id {
        Some(chat_id) => tracing::info!(chat_id, "watching group chat"),
        None => tracing::warn!("GROUP_CHAT_ID not set, accepting photos from any chat"),
    }
    if config.telegram.admin_user_ids.is_empty() {
        tracing::warn!("ADMIN_USER_IDS not set, /report is disabled");
    }

    let registry = DeviceRegistry::load(&config.registry.data_file)
        .await
        .context("failed to load device registry")?;

    let ocr = OcrService::new(&config.ocr);
    let available = ocr.available_backends().await;
    if available.is_empty() {
        tracing::warn!("no OCR backend is currently available");
    } else {
        tracing::info!(?available, "OCR backends ready");
    }

    let state = AppState::new(config, registry, ocr);

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config().server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("health endpoint listening on {addr}");

    let app = routes::router(state.clone());
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
        {
            tracing::error!("health server error: {e}");
        }
    });

    // Blocks until the dispatcher is stopped (ctrl-c or SIGTERM).
    telegram::run(state, shutdown_signal()).await;

    tracing::info!("dispatcher stopped, waiting for health server");
    let _ = server.await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
