//! # Menu Module
//!
//! The two menu shapes the bot understands, and the adapter that resolves the
//! active menu of a chat.
//!
//! - [`Menu::DailyFreeText`]: the raw text an admin posted for one calendar day.
//!   Only today's post is active.
//! - [`Menu::PersistentItems`]: a priced item list that stays active until it
//!   is replaced. It has no date dimension.
//!
//! The shape in effect is chosen once per process through [`MenuMode`].

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{BotError, BotResult};
use crate::store::MenuStore;
use crate::text_processing::{parse_menu_items, parse_menu_lines};

/// A dish with its price (in VND)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: i64,
}

/// A chat's menu in one of its two shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Menu {
    DailyFreeText {
        chat_id: i64,
        raw_text: String,
        date: NaiveDate,
    },
    PersistentItems {
        chat_id: i64,
        items: Vec<MenuItem>,
        updated_at: DateTime<Utc>,
    },
}

impl Menu {
    /// Dish names in menu order
    pub fn list_dish_names(&self) -> Vec<String> {
        match self {
            Menu::DailyFreeText { raw_text, .. } => parse_menu_lines(raw_text),
            Menu::PersistentItems { items, .. } => {
                items.iter().map(|item| item.name.clone()).collect()
            }
        }
    }

    /// Price of a dish, when the menu carries prices
    pub fn price_of(&self, dish: &str) -> Option<i64> {
        match self {
            Menu::DailyFreeText { .. } => None,
            Menu::PersistentItems { items, .. } => items
                .iter()
                .find(|item| item.name == dish)
                .map(|item| item.price),
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            Menu::DailyFreeText { chat_id, .. } | Menu::PersistentItems { chat_id, .. } => *chat_id,
        }
    }
}

/// Which menu shape the bot runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuMode {
    /// Free-text menu posted each day
    Daily,
    /// Structured item list, active until replaced
    #[default]
    Persistent,
}

impl std::str::FromStr for MenuMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(MenuMode::Daily),
            "persistent" => Ok(MenuMode::Persistent),
            other => Err(format!("unknown menu mode '{other}' (expected daily or persistent)")),
        }
    }
}

/// Resolves and replaces menus on top of a [`MenuStore`]
#[derive(Clone)]
pub struct MenuService {
    store: Arc<dyn MenuStore>,
    mode: MenuMode,
}

impl MenuService {
    pub fn new(store: Arc<dyn MenuStore>, mode: MenuMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    /// The menu currently in effect for a chat
    ///
    /// In daily mode only a menu posted on the calendar day of `now` counts;
    /// in persistent mode whatever was saved last is returned regardless of date.
    pub async fn active_menu<Tz: TimeZone>(
        &self,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<Option<Menu>> {
        let menu = match self.mode {
            MenuMode::Daily => {
                let today = now.date_naive();
                self.store.find_daily_menu(chat_id, today).await?
            }
            MenuMode::Persistent => self.store.find_item_menu(chat_id).await?,
        };

        debug!(chat_id, found = menu.is_some(), "Resolved active menu");
        Ok(menu)
    }

    /// Dish names of the active menu, `None` when there is no menu
    pub async fn active_dishes<Tz: TimeZone>(
        &self,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<Option<Vec<String>>> {
        Ok(self
            .active_menu(chat_id, now)
            .await?
            .map(|menu| menu.list_dish_names()))
    }

    /// Store the free-text menu for the calendar day of `now`, replacing any earlier post that day
    pub async fn save_daily_menu<Tz: TimeZone>(
        &self,
        chat_id: i64,
        raw_text: &str,
        now: &DateTime<Tz>,
    ) -> BotResult<Menu> {
        let date = now.date_naive();
        info!(chat_id, %date, "Saving daily menu");
        self.store.upsert_daily_menu(chat_id, date, raw_text).await
    }

    /// Parse "name - price" lines and replace the chat's persistent menu
    ///
    /// Input without a single valid line is rejected with
    /// [`BotError::InvalidMenu`] before anything is written.
    pub async fn save_item_menu(&self, chat_id: i64, text: &str) -> BotResult<Menu> {
        let items = parse_menu_items(text);
        if items.is_empty() {
            return Err(BotError::InvalidMenu(
                "no line matches the 'name - price' format".to_string(),
            ));
        }

        info!(chat_id, item_count = items.len(), "Replacing persistent menu");
        self.store.upsert_item_menu(chat_id, &items).await
    }
}
