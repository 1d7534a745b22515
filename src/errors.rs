//! # Error Types Module
//!
//! This module defines the error taxonomy shared by the storage adapters,
//! the photo pipeline and the order/menu services.
//!
//! "No active menu" and "no dish matched" are silent skips, not errors.

/// Custom error types for bot operations
#[derive(Debug, Clone, PartialEq)]
pub enum BotError {
    /// Database connection, query or write errors
    Storage(String),
    /// Storage call exceeded the pool acquire timeout
    Timeout(String),
    /// Menu capture input without a single "name - price" line
    InvalidMenu(String),
    /// Blob storage errors (photo upload / lookup)
    Blob(String),
    /// Telegram transport errors (file download, send)
    Transport(String),
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::Storage(msg) => write!(f, "Storage error: {msg}"),
            BotError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            BotError::InvalidMenu(msg) => write!(f, "Invalid menu: {msg}"),
            BotError::Blob(msg) => write!(f, "Blob storage error: {msg}"),
            BotError::Transport(msg) => write!(f, "Transport error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => BotError::Timeout(err.to_string()),
            other => BotError::Storage(other.to_string()),
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Blob(err.to_string())
    }
}

impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        BotError::Transport(err.to_string())
    }
}

/// Result alias used by the storage traits and services
pub type BotResult<T> = Result<T, BotError>;
