//! Message Handler module for processing incoming Telegram messages

use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{debug, error, info};

use super::order_bot::{IncomingText, OrderBot, Reply};

/// Download a Telegram file into memory
pub async fn download_file(bot: &Bot, file_id: teloxide::types::FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url)
        .await
        .context("Failed to request file")?
        .error_for_status()
        .context("Telegram refused file download")?;
    let bytes = response.bytes().await?;

    Ok(bytes.to_vec())
}

/// Send a router reply as HTML
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    match reply {
        Reply::Text(text) => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Reply::Photo { url, caption } => {
            let url = reqwest::Url::parse(&url).with_context(|| format!("Invalid photo URL {url}"))?;
            bot.send_photo(chat_id, InputFile::url(url))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }
    Ok(())
}

async fn handle_text_message(bot: &Bot, msg: &Message, text: &str, order_bot: &OrderBot) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring text without sender");
        return Ok(());
    };

    debug!(chat_id = %msg.chat.id, user_id = %user.id, message_length = text.len(), "Received text message");

    let incoming = IncomingText {
        chat_id: msg.chat.id.0,
        user_id: user.id.0 as i64,
        user_name: user.full_name(),
        username: user.username.clone(),
        text: text.to_string(),
        now: order_bot.now(),
    };

    if let Some(reply) = order_bot.handle_text(&incoming).await {
        send_reply(bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn handle_photo_message(bot: &Bot, msg: &Message, order_bot: &OrderBot) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let Some(pending) = order_bot.take_pending_photo(user.id.0 as i64, msg.chat.id.0).await else {
        debug!(chat_id = %msg.chat.id, user_id = %user.id, "No photo capture pending, ignoring photo");
        return Ok(());
    };

    // Telegram lists sizes smallest first
    let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) else {
        return Ok(());
    };

    info!(chat_id = %msg.chat.id, photo_name = %pending.name, "Saving captured photo");
    let reply = match download_file(bot, largest_photo.file.id.clone()).await {
        Ok(bytes) => order_bot.save_photo(&pending, &bytes).await,
        Err(e) => {
            error!(chat_id = %msg.chat.id, error = %e, "Failed to download photo");
            order_bot.photo_save_failed()
        }
    };

    send_reply(bot, msg.chat.id, reply).await
}

pub async fn message_handler(bot: Bot, msg: Message, order_bot: Arc<OrderBot>) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, text, &order_bot).await?;
    } else if msg.photo().is_some() {
        handle_photo_message(&bot, &msg, &order_bot).await?;
    } else {
        debug!(chat_id = %msg.chat.id, "Ignoring unsupported message type");
    }

    Ok(())
}
