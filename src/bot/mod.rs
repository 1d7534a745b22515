//! Bot module for handling Telegram interactions
//!
//! - `commands`: Parses slash commands
//! - `order_bot`: Routes a message to menus, orders, photos and members
//! - `ui_builder`: Formats summaries, menus and lists as HTML
//! - `message_handler`: Teloxide glue that feeds updates to the router

pub mod commands;
pub mod message_handler;
pub mod order_bot;
pub mod ui_builder;

pub use commands::Command;
pub use message_handler::{download_file, message_handler, send_reply};
pub use order_bot::{IncomingText, OrderBot, PendingPhoto, Reply, MENU_TRIGGER_PHRASE};
