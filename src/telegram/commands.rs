//! Bot commands

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::utils::command::BotCommands;

use crate::report;
use crate::state::AppState;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show what the bot does")]
    Start,
    #[command(description = "send the device registry as a spreadsheet")]
    Report,
}

pub async fn handle(bot: Bot, msg: Message, cmd: Command, state: AppState) -> ResponseResult<()> {
    match cmd {
        Command::Start => start(bot, msg).await,
        Command::Report => send_report(bot, msg, state).await,
    }
}

async fn start(bot: Bot, msg: Message) -> ResponseResult<()> {
    bot.send_message(
        msg.chat.id,
        "Bot is running.\n\
         Post a photo of a meter nameplate and it will be read automatically.\n\
         /report sends the device registry as a spreadsheet (admins only).\n\
         All times are UTC+05:00.",
    )
    .await?;
    Ok(())
}

async fn send_report(bot: Bot, msg: Message, state: AppState) -> ResponseResult<()> {
    let requester = msg.from.as_ref().map(|user| user.id.0);
    if !is_admin(&state.config().telegram.admin_user_ids, requester) {
        tracing::warn!(user = ?requester, "report requested by non-admin");
        bot.send_message(msg.chat.id, "You are not allowed to request reports.")
            .await?;
        return Ok(());
    }

    let devices = state.registry().snapshot().await;
    if devices.is_empty() {
        bot.send_message(msg.chat.id, "No devices recorded yet.")
            .await?;
        return Ok(());
    }

    match report::build_report(&devices, Utc::now()) {
        Ok(built) => {
            let caption = format!("{} device(s), times in UTC+05:00", devices.len());
            bot.send_document(
                msg.chat.id,
                InputFile::memory(built.bytes).file_name(built.filename),
            )
            .caption(caption)
            .await?;
        }
        Err(e) => {
            tracing::error!("report build failed: {e}");
            bot.send_message(msg.chat.id, "Could not build the report.")
                .await?;
        }
    }
    Ok(())
}

/// Report access check: a known sender whose id is on the allow-list.
fn is_admin(admins: &[u64], user_id: Option<u64>) -> bool {
    match user_id {
        Some(id) => admins.contains(&id),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check_requires_a_listed_sender() {
        let admins = vec![1001, 1002];
        assert!(is_admin(&admins, Some(1001)));
        assert!(!is_admin(&admins, Some(9999)));
        assert!(!is_admin(&admins, None));
        assert!(!is_admin(&[], Some(1001)));
    }
}
