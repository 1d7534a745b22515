//! # Lunch Order Telegram Bot
//!
//! A Telegram bot that takes lunch orders in group chats. An admin posts the
//! menu, members reply with a dish name, and the bot keeps one order per member
//! per day with daily, weekly and monthly summaries.

pub mod bot;
pub mod config;
pub mod dates;
pub mod db;
pub mod dish_matcher;
pub mod errors;
pub mod input_mode;
pub mod localization;
pub mod members;
pub mod menu;
pub mod moderation;
pub mod orders;
pub mod photos;
pub mod store;
pub mod text_processing;
