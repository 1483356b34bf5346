//! Photo capture handling

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::pipeline::{self, CaptureError, CaptureOutcome};
use crate::registry::DeviceRecord;
use crate::state::AppState;

const REPLY_UNREADABLE: &str = "Could not read the image. Try a sharper, closer shot.";
const REPLY_NOTHING_FOUND: &str = "No device data found in the image.";
const REPLY_DUPLICATE: &str = "This device is already recorded.";

pub async fn handle_photo(bot: Bot, msg: Message, state: AppState) -> ResponseResult<()> {
    // Photos outside the watched chat are silently ignored.
    if !is_watched_chat(state.config().telegram.group_chat_id, msg.chat.id.0) {
        tracing::debug!(chat = msg.chat.id.0, "ignoring photo from unwatched chat");
        return Ok(());
    }

    // Telegram sends several sizes per photo; the last one is the largest.
    let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
        return Ok(());
    };

    tracing::info!(chat = msg.chat.id.0, "photo received");

    let bytes = match download_photo(&bot, &photo.file.id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("photo download failed: {e}");
            bot.send_message(msg.chat.id, REPLY_UNREADABLE).await?;
            return Ok(());
        }
    };

    match pipeline::process_capture(&state, bytes, msg.date).await {
        Ok(CaptureOutcome::Recorded { serial, record }) => {
            bot.send_message(msg.chat.id, recorded_reply(&serial, &record))
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Ok(CaptureOutcome::Duplicate { serial }) => {
            tracing::info!(%serial, "duplicate reported to chat");
            bot.send_message(msg.chat.id, REPLY_DUPLICATE).await?;
        }
        Ok(CaptureOutcome::NothingFound) => {
            bot.send_message(msg.chat.id, REPLY_NOTHING_FOUND).await?;
        }
        Err(e) => {
            match e {
                CaptureError::NoText => tracing::warn!("capture unreadable: no text recognized"),
                other => tracing::warn!("capture unreadable: {other}"),
            }
            bot.send_message(msg.chat.id, REPLY_UNREADABLE).await?;
        }
    }

    Ok(())
}

/// Chat gate: an unset watched chat accepts photos from anywhere.
fn is_watched_chat(watched: Option<i64>, chat_id: i64) -> bool {
    match watched {
        Some(id) => id == chat_id,
        None => true,
    }
}

async fn download_photo(bot: &Bot, file_id: &str) -> anyhow::Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let mut buffer = Vec::new();
    bot.download_file(&file.path, &mut buffer).await?;
    Ok(buffer)
}

fn recorded_reply(serial: &str, record: &DeviceRecord) -> String {
    format!(
        "New device recorded!\n\
         Serial: `{}`\n\
         Model: `{}`\n\
         Metrological firmware: `{}`\n\
         Non-metrological firmware: `{}`\n\
         Captured: `{}`",
        serial, record.model, record.metrological, record.non_metrological, record.captured_at
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nameplate::MeterModel;

    #[test]
    fn chat_gate_only_passes_the_watched_chat() {
        assert!(is_watched_chat(Some(-100200300), -100200300));
        assert!(!is_watched_chat(Some(-100200300), -100999999));
        assert!(is_watched_chat(None, -100200300));
        assert!(is_watched_chat(None, 42));
    }

    #[test]
    fn recorded_reply_lists_every_field() {
        let record = DeviceRecord {
            model: MeterModel::G4,
            metrological: "0217".to_string(),
            non_metrological: "unknown".to_string(),
            captured_at: "15/03/2024 18:00:00".to_string(),
        };
        let reply = recorded_reply("TPGR0A1B2C3D4E5F", &record);
        assert!(reply.contains("`TPGR0A1B2C3D4E5F`"));
        assert!(reply.contains("`G4`"));
        assert!(reply.contains("`0217`"));
        assert!(reply.contains("`unknown`"));
        assert!(reply.contains("`15/03/2024 18:00:00`"));
    }
}
