//! In-process store implementing every storage trait behind one mutex.
//!
//! Each trait method takes the lock once, so an order upsert is a single
//! atomic step here just as it is with `ON CONFLICT` in PostgreSQL.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::dates::DateRange;
use crate::errors::{BotError, BotResult};
use crate::members::GroupMember;
use crate::menu::{Menu, MenuItem};
use crate::orders::{NewOrder, Order, OrderWrite};
use crate::photos::{Photo, PhotoOwner};

use super::{MemberStore, MenuStore, OrderStore, PhotoStore};

#[derive(Debug, Default)]
struct State {
    daily_menus: HashMap<(i64, NaiveDate), Menu>,
    item_menus: HashMap<i64, Menu>,
    /// Insertion order doubles as placement order
    orders: Vec<Order>,
    photos: Vec<Photo>,
    members: Vec<GroupMember>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> BotResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| BotError::Storage("in-memory store lock poisoned".to_string()))
    }

    /// Number of stored orders across all chats
    pub fn order_count(&self) -> usize {
        self.lock().map(|state| state.orders.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MenuStore for InMemoryStore {
    async fn find_daily_menu(&self, chat_id: i64, date: NaiveDate) -> BotResult<Option<Menu>> {
        Ok(self.lock()?.daily_menus.get(&(chat_id, date)).cloned())
    }

    async fn upsert_daily_menu(
        &self,
        chat_id: i64,
        date: NaiveDate,
        raw_text: &str,
    ) -> BotResult<Menu> {
        let menu = Menu::DailyFreeText {
            chat_id,
            raw_text: raw_text.to_string(),
            date,
        };
        self.lock()?.daily_menus.insert((chat_id, date), menu.clone());
        Ok(menu)
    }

    async fn find_item_menu(&self, chat_id: i64) -> BotResult<Option<Menu>> {
        Ok(self.lock()?.item_menus.get(&chat_id).cloned())
    }

    async fn upsert_item_menu(&self, chat_id: i64, items: &[MenuItem]) -> BotResult<Menu> {
        let menu = Menu::PersistentItems {
            chat_id,
            items: items.to_vec(),
            updated_at: Utc::now(),
        };
        self.lock()?.item_menus.insert(chat_id, menu.clone());
        Ok(menu)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn upsert_order(&self, order: &NewOrder) -> BotResult<OrderWrite> {
        let mut state = self.lock()?;

        if let Some(existing) = state.orders.iter_mut().find(|o| {
            o.user_id == order.user_id && o.chat_id == order.chat_id && o.order_day == order.order_day
        }) {
            existing.dish = order.dish.clone();
            existing.user_name = order.user_name.clone();
            existing.created_at = order.placed_at;
            return Ok(OrderWrite::Updated(existing.clone()));
        }

        let id = state.next_id();
        let created = Order {
            id,
            user_id: order.user_id,
            user_name: order.user_name.clone(),
            chat_id: order.chat_id,
            dish: order.dish.clone(),
            order_day: order.order_day,
            order_date: order.placed_at,
            created_at: order.placed_at,
        };
        state.orders.push(created.clone());
        Ok(OrderWrite::Created(created))
    }

    async fn find_order(
        &self,
        user_id: i64,
        chat_id: i64,
        range: &DateRange,
    ) -> BotResult<Option<Order>> {
        Ok(self
            .lock()?
            .orders
            .iter()
            .find(|o| o.user_id == user_id && o.chat_id == chat_id && range.contains(&o.order_date))
            .cloned())
    }

    async fn delete_order(&self, order_id: i64) -> BotResult<bool> {
        let mut state = self.lock()?;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != order_id);
        Ok(state.orders.len() < before)
    }

    async fn find_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .lock()?
            .orders
            .iter()
            .filter(|o| o.chat_id == chat_id && range.contains(&o.order_date))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.order_date.cmp(&b.order_date).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn delete_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<u64> {
        let mut state = self.lock()?;
        let before = state.orders.len();
        state
            .orders
            .retain(|o| !(o.chat_id == chat_id && range.contains(&o.order_date)));
        Ok((before - state.orders.len()) as u64)
    }
}

#[async_trait]
impl PhotoStore for InMemoryStore {
    async fn upsert_photo(&self, owner: PhotoOwner, name: &str, url: &str) -> BotResult<Photo> {
        let mut state = self.lock()?;

        if let Some(existing) = state
            .photos
            .iter_mut()
            .find(|p| p.owner == owner && p.photo_name == name)
        {
            existing.url = url.to_string();
            existing.created_at = Utc::now();
            return Ok(existing.clone());
        }

        let id = state.next_id();
        let photo = Photo {
            id,
            owner,
            photo_name: name.to_string(),
            url: url.to_string(),
            created_at: Utc::now(),
        };
        state.photos.push(photo.clone());
        Ok(photo)
    }

    async fn find_photo(&self, owner: PhotoOwner, name: &str) -> BotResult<Option<Photo>> {
        Ok(self
            .lock()?
            .photos
            .iter()
            .find(|p| p.owner == owner && p.photo_name == name)
            .cloned())
    }

    async fn list_photos(&self, owner: PhotoOwner) -> BotResult<Vec<Photo>> {
        Ok(self
            .lock()?
            .photos
            .iter()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MemberStore for InMemoryStore {
    async fn touch_member(&self, member: &GroupMember) -> BotResult<()> {
        let mut state = self.lock()?;
        match state
            .members
            .iter()
            .position(|m| m.user_id == member.user_id && m.chat_id == member.chat_id)
        {
            Some(index) => state.members[index] = member.clone(),
            None => state.members.push(member.clone()),
        }
        Ok(())
    }

    async fn list_members(&self, chat_id: i64) -> BotResult<Vec<GroupMember>> {
        Ok(self
            .lock()?
            .members
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }
}
