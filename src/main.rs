use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lunch_order_bot::bot::{self, OrderBot};
use lunch_order_bot::config::BotConfig;
use lunch_order_bot::db::{self, PgStore};
use lunch_order_bot::localization::init_localization;
use lunch_order_bot::moderation::ModerationFilter;
use lunch_order_bot::photos::LocalBlobStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Lunch Order Telegram Bot");

    let config = BotConfig::from_env()?;
    init_localization().context("Failed to load localization bundles")?;

    let pool = db::connect(&config.storage).await?;
    db::init_database_schema(&pool).await?;
    let store = Arc::new(PgStore::new(pool));

    let blobs = Arc::new(LocalBlobStore::new(
        config.photos.storage_dir.clone(),
        &config.photos.base_url,
    ));

    let moderation = match &config.bad_words_path {
        Some(path) => ModerationFilter::from_file(path)?,
        None => ModerationFilter::default(),
    };

    info!(
        menu_mode = ?config.settings.menu_mode,
        match_policy = ?config.settings.match_policy,
        utc_offset = %config.settings.utc_offset,
        "Bot settings loaded"
    );

    let order_bot = Arc::new(
        OrderBot::new(store, blobs, config.settings.clone()).with_moderation(moderation),
    );

    let bot = Bot::new(config.telegram_token.clone());

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(bot::message_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![order_bot])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
