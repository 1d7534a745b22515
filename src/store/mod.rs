//! Storage abstractions.
//!
//! The services borrow a store per call through these traits and never hold
//! records between calls. [`db::PgStore`](crate::db::PgStore) is the
//! PostgreSQL implementation; [`memory::InMemoryStore`] backs tests and
//! local runs.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::dates::DateRange;
use crate::errors::BotResult;
use crate::members::GroupMember;
use crate::menu::{Menu, MenuItem};
use crate::orders::{NewOrder, Order, OrderWrite};
use crate::photos::{Photo, PhotoOwner};

pub mod memory;

pub use memory::InMemoryStore;

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Free-text menu posted for `date`
    async fn find_daily_menu(&self, chat_id: i64, date: NaiveDate) -> BotResult<Option<Menu>>;
    /// Insert or replace the free-text menu for `date`
    async fn upsert_daily_menu(&self, chat_id: i64, date: NaiveDate, raw_text: &str)
        -> BotResult<Menu>;
    /// Current structured menu
    async fn find_item_menu(&self, chat_id: i64) -> BotResult<Option<Menu>>;
    /// Atomically replace the structured menu
    async fn upsert_item_menu(&self, chat_id: i64, items: &[MenuItem]) -> BotResult<Menu>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order, or overwrite dish and timestamp of the existing order
    /// with the same (user, chat, local day) key
    async fn upsert_order(&self, order: &NewOrder) -> BotResult<OrderWrite>;
    async fn find_order(&self, user_id: i64, chat_id: i64, range: &DateRange)
        -> BotResult<Option<Order>>;
    async fn delete_order(&self, order_id: i64) -> BotResult<bool>;
    /// Orders of a chat placed within `range`, in placement order
    async fn find_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<Vec<Order>>;
    async fn delete_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<u64>;
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Record a named photo, replacing the URL of an existing name for the same owner
    async fn upsert_photo(&self, owner: PhotoOwner, name: &str, url: &str) -> BotResult<Photo>;
    async fn find_photo(&self, owner: PhotoOwner, name: &str) -> BotResult<Option<Photo>>;
    async fn list_photos(&self, owner: PhotoOwner) -> BotResult<Vec<Photo>>;
}

#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert the member or refresh their name and last-seen time
    async fn touch_member(&self, member: &GroupMember) -> BotResult<()>;
    async fn list_members(&self, chat_id: i64) -> BotResult<Vec<GroupMember>>;
}
