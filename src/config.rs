//! # Configuration Module
//!
//! This module defines the runtime configuration of the bot, loaded from the
//! process environment (optionally seeded from a `.env` file).

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::path::PathBuf;

use crate::dish_matcher::MatchPolicy;
use crate::menu::MenuMode;

// Constants for bot configuration
pub const DEFAULT_LANGUAGE: &str = "vi";
pub const DEFAULT_UTC_OFFSET: &str = "+07:00";
pub const DEFAULT_PHOTO_DIR: &str = "./photos";
pub const DEFAULT_PHOTO_BASE_URL: &str = "http://localhost/photos";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Database pool configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Seconds to wait for a connection before the call fails
    pub acquire_timeout_secs: u64,
}

/// Photo blob storage configuration
#[derive(Debug, Clone)]
pub struct PhotoConfig {
    /// Directory the filesystem blob store writes into
    pub storage_dir: PathBuf,
    /// Public URL prefix under which `storage_dir` is served
    pub base_url: String,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_PHOTO_DIR),
            base_url: DEFAULT_PHOTO_BASE_URL.to_string(),
        }
    }
}

/// Behavioural settings consumed by the order/menu router
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Reply language code ("vi" or "en")
    pub language: String,
    /// Offset used as "local time" for day, week and month windows
    pub utc_offset: FixedOffset,
    /// Which menu shape is active
    pub menu_mode: MenuMode,
    /// How free text is matched against menu entries
    pub match_policy: MatchPolicy,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            utc_offset: parse_utc_offset(DEFAULT_UTC_OFFSET).unwrap_or_else(|_| Utc.fix()),
            menu_mode: MenuMode::default(),
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub telegram_token: String,
    /// Database settings
    pub storage: StorageConfig,
    /// Photo storage settings
    pub photos: PhotoConfig,
    /// Router settings
    pub settings: BotSettings,
    /// Optional newline-separated bad word list; `None` disables moderation
    pub bad_words_path: Option<PathBuf>,
}

impl BotConfig {
    /// Load configuration from environment variables
    ///
    /// `TELEGRAM_BOT_TOKEN` and `DATABASE_URL` are required; every other
    /// variable falls back to its default. Malformed values are an error.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = parse_var("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let acquire_timeout_secs =
            parse_var("DB_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS)?;

        let language = env::var("BOT_LANGUAGE").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());
        let offset_raw =
            env::var("BOT_UTC_OFFSET").unwrap_or_else(|_| DEFAULT_UTC_OFFSET.to_string());
        let utc_offset = parse_utc_offset(&offset_raw)
            .with_context(|| format!("Invalid BOT_UTC_OFFSET: {offset_raw}"))?;

        let menu_mode = match env::var("MENU_MODE") {
            Ok(raw) => raw
                .parse::<MenuMode>()
                .map_err(|e| anyhow!(e))
                .context("Invalid MENU_MODE")?,
            Err(_) => MenuMode::default(),
        };
        let match_policy = match env::var("MATCH_POLICY") {
            Ok(raw) => raw
                .parse::<MatchPolicy>()
                .map_err(|e| anyhow!(e))
                .context("Invalid MATCH_POLICY")?,
            Err(_) => MatchPolicy::default(),
        };

        let photos = PhotoConfig {
            storage_dir: env::var("PHOTO_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PHOTO_DIR)),
            base_url: env::var("PHOTO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PHOTO_BASE_URL.to_string()),
        };

        let bad_words_path = env::var("BAD_WORDS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            telegram_token,
            storage: StorageConfig {
                database_url,
                max_connections,
                acquire_timeout_secs,
            },
            photos,
            settings: BotSettings {
                language,
                utc_offset,
                menu_mode,
                match_policy,
            },
            bad_words_path,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid {name}: {e}")),
        Err(_) => Ok(default),
    }
}

/// Parse a UTC offset such as `+07:00`, `-0530` or `+7`
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next() {
        Some('+') => (1, &raw[1..]),
        Some('-') => (-1, &raw[1..]),
        _ => return Err(anyhow!("offset must start with '+' or '-'")),
    };

    if !rest.chars().all(|c| c.is_ascii_digit() || c == ':') {
        return Err(anyhow!("offset must be digits like +07:00 or +0700"));
    }

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };

    let hours: i32 = hours.parse().context("invalid offset hours")?;
    let minutes: i32 = minutes.parse().context("invalid offset minutes")?;
    if hours > 14 || minutes > 59 {
        return Err(anyhow!("offset out of range"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("offset out of range"))
}
