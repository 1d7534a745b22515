//! Transport-independent message routing.
//!
//! [`OrderBot`] turns one incoming message into at most one reply. It owns the
//! domain services and the input-mode tracker; the teloxide handler only
//! converts Telegram updates into [`IncomingText`] and sends the [`Reply`] back.

use chrono::{DateTime, FixedOffset, Utc};
use rand::seq::SliceRandom;
use std::sync::Arc;
use teloxide::utils::html::escape;
use tracing::{debug, error, info, warn};

use crate::config::BotSettings;
use crate::dish_matcher::DishMatcher;
use crate::errors::BotError;
use crate::input_mode::InputModeTracker;
use crate::localization::{t_args_lang, t_lang};
use crate::members::MemberService;
use crate::menu::{MenuMode, MenuService};
use crate::moderation::ModerationFilter;
use crate::orders::{OrderService, OrderWrite, SummaryPeriod};
use crate::photos::{validate_photo_name, BlobStore, PhotoOwner, PhotoService, MAX_PHOTO_NAME_LENGTH};
use crate::store::{MemberStore, MenuStore, OrderStore, PhotoStore};
use crate::text_processing::normalize;

use super::commands::Command;
use super::ui_builder::{
    format_daily_summary, format_menu, format_pending_members, format_period_summary,
    format_photo_list,
};

/// Message prefix that posts today's menu without the /menu command
pub const MENU_TRIGGER_PHRASE: &str = "em gửi thực đơn hôm nay";

/// A text message as the router sees it
#[derive(Debug, Clone)]
pub struct IncomingText {
    pub chat_id: i64,
    pub user_id: i64,
    /// First and last name as shown in the chat
    pub user_name: String,
    pub username: Option<String>,
    pub text: String,
    pub now: DateTime<FixedOffset>,
}

/// What to send back to the chat; text is Telegram HTML
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Photo { url: String, caption: String },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::Photo { caption, .. } => caption,
        }
    }
}

/// A photo capture armed by /savephoto or /savegroupphoto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPhoto {
    pub owner: PhotoOwner,
    pub name: String,
}

pub struct OrderBot {
    menus: MenuService,
    orders: OrderService,
    members: MemberService,
    photos: PhotoService,
    tracker: InputModeTracker,
    matcher: DishMatcher,
    moderation: ModerationFilter,
    settings: BotSettings,
}

impl OrderBot {
    /// Build the bot over one store implementing every storage trait
    pub fn new<S>(store: Arc<S>, blobs: Arc<dyn BlobStore>, settings: BotSettings) -> Self
    where
        S: MenuStore + OrderStore + PhotoStore + MemberStore + 'static,
    {
        Self {
            menus: MenuService::new(store.clone(), settings.menu_mode),
            orders: OrderService::new(store.clone()),
            members: MemberService::new(store.clone()),
            photos: PhotoService::new(store, blobs),
            tracker: InputModeTracker::new(),
            matcher: DishMatcher::new(settings.match_policy),
            moderation: ModerationFilter::default(),
            settings,
        }
    }

    pub fn with_moderation(mut self, moderation: ModerationFilter) -> Self {
        self.moderation = moderation;
        self
    }

    /// Current time in the configured local offset
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.settings.utc_offset)
    }

    fn lang(&self) -> Option<&str> {
        Some(self.settings.language.as_str())
    }

    fn t(&self, key: &str) -> Reply {
        Reply::Text(t_lang(key, self.lang()))
    }

    fn t_args(&self, key: &str, args: &[(&str, &str)]) -> Reply {
        Reply::Text(t_args_lang(key, args, self.lang()))
    }

    /// Route one text message; `None` means stay silent
    pub async fn handle_text(&self, msg: &IncomingText) -> Option<Reply> {
        if let Err(e) = self
            .members
            .touch(
                msg.user_id,
                msg.chat_id,
                msg.username.as_deref(),
                &msg.user_name,
                msg.now.with_timezone(&Utc),
            )
            .await
        {
            warn!(chat_id = msg.chat_id, user_id = msg.user_id, error = %e, "Failed to record member");
        }

        if let Some(command) = Command::parse(&msg.text) {
            debug!(chat_id = msg.chat_id, command = ?command, "Handling command");
            return Some(self.handle_command(command, msg).await);
        }

        if msg.text.trim_start().starts_with('/') {
            debug!(chat_id = msg.chat_id, "Ignoring unknown command");
            return None;
        }

        if let Some(word) = self.moderation.find_violation(&msg.text) {
            info!(chat_id = msg.chat_id, user_id = msg.user_id, word = %word, "Message flagged by moderation");
            return Some(self.t_args("moderation-warning", &[("name", escape(&msg.user_name).as_str())]));
        }

        if self.tracker.take_menu(msg.chat_id).await {
            return Some(self.save_menu(msg).await);
        }

        if normalize(&msg.text).starts_with(&normalize(MENU_TRIGGER_PHRASE)) {
            return Some(self.save_menu(msg).await);
        }

        self.place_order(msg).await
    }

    async fn save_menu(&self, msg: &IncomingText) -> Reply {
        let result = match self.menus.mode() {
            MenuMode::Daily => self
                .menus
                .save_daily_menu(msg.chat_id, &msg.text, &msg.now)
                .await
                .map(|_| self.t("menu-saved")),
            MenuMode::Persistent => self
                .menus
                .save_item_menu(msg.chat_id, &msg.text)
                .await
                .map(|menu| {
                    let count = menu.list_dish_names().len().to_string();
                    self.t_args("menu-saved-items", &[("count", count.as_str())])
                }),
        };

        match result {
            Ok(reply) => reply,
            Err(BotError::InvalidMenu(reason)) => {
                debug!(chat_id = msg.chat_id, reason = %reason, "Rejected menu input");
                self.t("menu-format-help")
            }
            Err(e) => {
                error!(chat_id = msg.chat_id, error = %e, "Failed to save menu");
                self.t("menu-save-error")
            }
        }
    }

    async fn place_order(&self, msg: &IncomingText) -> Option<Reply> {
        let dishes = match self.menus.active_dishes(msg.chat_id, &msg.now).await {
            Ok(Some(dishes)) => dishes,
            Ok(None) => {
                debug!(chat_id = msg.chat_id, "No active menu, ignoring message");
                return None;
            }
            Err(e) => {
                error!(chat_id = msg.chat_id, error = %e, "Failed to load menu for order");
                return Some(self.t("order-error"));
            }
        };

        let Some(dish) = self.matcher.find_match(&msg.text, &dishes) else {
            debug!(chat_id = msg.chat_id, "Message does not name a dish");
            return None;
        };

        let name = escape(&msg.user_name);
        let dish_html = escape(dish);
        match self
            .orders
            .place_order(msg.user_id, &msg.user_name, msg.chat_id, dish, &msg.now)
            .await
        {
            Ok(OrderWrite::Created(_)) => Some(self.t_args(
                "order-created",
                &[("name", name.as_str()), ("dish", dish_html.as_str())],
            )),
            Ok(OrderWrite::Updated(_)) => Some(self.t_args(
                "order-updated",
                &[("name", name.as_str()), ("dish", dish_html.as_str())],
            )),
            Err(e) => {
                error!(chat_id = msg.chat_id, user_id = msg.user_id, error = %e, "Failed to save order");
                Some(self.t("order-error"))
            }
        }
    }

    async fn handle_command(&self, command: Command, msg: &IncomingText) -> Reply {
        let chat_id = msg.chat_id;
        let now = &msg.now;

        match command {
            Command::Start => self.t_args("start-welcome", &[("name", escape(&msg.user_name).as_str())]),
            Command::Help => self.t("help-text"),
            Command::Menu => {
                self.tracker.await_menu(chat_id).await;
                match self.menus.mode() {
                    MenuMode::Daily => self.t("menu-await"),
                    MenuMode::Persistent => self.t("menu-await-items"),
                }
            }
            Command::ShowMenu => match self.menus.active_menu(chat_id, now).await {
                Ok(Some(menu)) => Reply::Text(format_menu(&menu, self.lang())),
                Ok(None) => self.t("menu-empty"),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to show menu");
                    self.t("menu-error")
                }
            },
            Command::Cancel => match self.orders.cancel_order(msg.user_id, chat_id, now).await {
                Ok(Some(order)) => self.t_args(
                    "order-cancelled",
                    &[
                        ("name", escape(&msg.user_name).as_str()),
                        ("dish", escape(&order.dish).as_str()),
                    ],
                ),
                Ok(None) => self.t_args("order-cancel-none", &[("name", escape(&msg.user_name).as_str())]),
                Err(e) => {
                    error!(chat_id, user_id = msg.user_id, error = %e, "Failed to cancel order");
                    self.t("order-cancel-error")
                }
            },
            Command::Reset => match self.orders.reset_orders(chat_id, now).await {
                Ok(count) => self.t_args("reset-done", &[("count", count.to_string().as_str())]),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to reset orders");
                    self.t("reset-error")
                }
            },
            Command::Summary => match self.orders.daily_summary(chat_id, now).await {
                Ok(summary) => Reply::Text(format_daily_summary(&summary, self.lang())),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to get summary");
                    self.t("summary-error")
                }
            },
            Command::WeeklySummary => self.period_summary(chat_id, SummaryPeriod::Week, msg).await,
            Command::MonthlySummary => self.period_summary(chat_id, SummaryPeriod::Month, msg).await,
            Command::Pending => match self.members.without_order_today(chat_id, &self.orders, now).await {
                Ok(members) => Reply::Text(format_pending_members(&members, self.lang())),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to list pending members");
                    self.t("pending-error")
                }
            },
            Command::Random => match self.menus.active_dishes(chat_id, now).await {
                Ok(Some(dishes)) => {
                    let pick = dishes.choose(&mut rand::thread_rng()).cloned();
                    match pick {
                        Some(dish) => self.t_args("random-suggestion", &[("dish", escape(&dish).as_str())]),
                        None => self.t("menu-empty"),
                    }
                }
                Ok(None) => self.t("menu-empty"),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to pick random dish");
                    self.t("menu-error")
                }
            },
            Command::SavePhoto(name) => self.arm_photo(PhotoOwner::User(msg.user_id), &name).await,
            Command::SaveGroupPhoto(name) => self.arm_photo(PhotoOwner::Chat(chat_id), &name).await,
            Command::Photo(name) => self.find_photo(msg, &name).await,
            Command::Photos => match self.photos.list(msg.user_id, chat_id).await {
                Ok(photos) => Reply::Text(format_photo_list(&photos, self.lang())),
                Err(e) => {
                    error!(chat_id, error = %e, "Failed to list photos");
                    self.t("photo-error")
                }
            },
        }
    }

    async fn period_summary(&self, chat_id: i64, period: SummaryPeriod, msg: &IncomingText) -> Reply {
        let range = period.range(&msg.now);
        match self.orders.period_summary(chat_id, &range).await {
            Ok(summary) => Reply::Text(format_period_summary(&summary, period, self.lang())),
            Err(e) => {
                error!(chat_id, period = ?period, error = %e, "Failed to get period summary");
                match period {
                    SummaryPeriod::Week => self.t("weekly-error"),
                    SummaryPeriod::Month => self.t("monthly-error"),
                }
            }
        }
    }

    fn name_error(&self, reason: &str) -> Reply {
        match reason {
            "too_long" => self.t_args(
                "photo-name-too-long",
                &[("max", MAX_PHOTO_NAME_LENGTH.to_string().as_str())],
            ),
            _ => self.t("photo-name-empty"),
        }
    }

    async fn arm_photo(&self, owner: PhotoOwner, raw_name: &str) -> Reply {
        let name = match validate_photo_name(raw_name) {
            Ok(name) => name,
            Err(reason) => return self.name_error(reason),
        };

        match owner {
            PhotoOwner::User(user_id) => self.tracker.await_user_photo(user_id, &name).await,
            PhotoOwner::Chat(chat_id) => self.tracker.await_chat_photo(chat_id, &name).await,
        }
        self.t_args("photo-await", &[("name", escape(&name).as_str())])
    }

    async fn find_photo(&self, msg: &IncomingText, raw_name: &str) -> Reply {
        let name = match validate_photo_name(raw_name) {
            Ok(name) => name,
            Err(reason) => return self.name_error(reason),
        };

        match self.photos.find(msg.user_id, msg.chat_id, &name).await {
            Ok(Some(photo)) => Reply::Photo {
                url: photo.url,
                caption: escape(&photo.photo_name),
            },
            Ok(None) => self.t_args("photo-not-found", &[("name", escape(&name).as_str())]),
            Err(e) => {
                error!(chat_id = msg.chat_id, error = %e, "Failed to find photo");
                self.t("photo-error")
            }
        }
    }

    /// Consume the photo capture waiting for this user, or else for this chat
    pub async fn take_pending_photo(&self, user_id: i64, chat_id: i64) -> Option<PendingPhoto> {
        if let Some(name) = self.tracker.take_user_photo(user_id).await {
            return Some(PendingPhoto {
                owner: PhotoOwner::User(user_id),
                name,
            });
        }
        self.tracker
            .take_chat_photo(chat_id)
            .await
            .map(|name| PendingPhoto {
                owner: PhotoOwner::Chat(chat_id),
                name,
            })
    }

    /// Store downloaded photo bytes for a consumed capture
    pub async fn save_photo(&self, pending: &PendingPhoto, bytes: &[u8]) -> Reply {
        match self
            .photos
            .save(pending.owner, &pending.name, bytes, "image/jpeg")
            .await
        {
            Ok(photo) => self.t_args("photo-saved", &[("name", escape(&photo.photo_name).as_str())]),
            Err(e) => {
                error!(owner = ?pending.owner, error = %e, "Failed to save photo");
                self.t("photo-save-error")
            }
        }
    }

    /// Reply used when a consumed capture could not be downloaded
    pub fn photo_save_failed(&self) -> Reply {
        self.t("photo-save-error")
    }
}
