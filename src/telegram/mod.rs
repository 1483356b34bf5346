//! Telegram transport
//!
//! Long-polling dispatcher over the watched group: photo messages run the
//! capture pipeline, commands answer status requests and reports. Handler
//! errors are logged and never stop the dispatcher.

mod captures;
mod commands;

use std::future::Future;

use teloxide::prelude::*;

use crate::state::AppState;

use commands::Command;

/// Run the bot until ctrl-c or until `shutdown` resolves.
pub async fn run(state: AppState, shutdown: impl Future<Output = ()> + Send + 'static) {
    let bot = Bot::new(&state.config().telegram.token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(commands::handle),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.photo().is_some())
                .endpoint(captures::handle_photo),
        );

    tracing::info!("starting Telegram dispatcher (long polling)");

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|update| async move {
            tracing::trace!("ignoring unhandled update: {update:?}");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("update handler failed"))
        .enable_ctrlc_handler()
        .build();

    // The ctrl-c handler only covers SIGINT; other stop signals reach the
    // dispatcher through its shutdown token.
    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.await;
        if let Ok(stopped) = token.shutdown() {
            stopped.await;
        }
    });

    dispatcher.dispatch().await;
}
