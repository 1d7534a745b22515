//! Group members seen by the bot, used to list who has not ordered yet.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::errors::BotResult;
use crate::orders::OrderService;
use crate::store::MemberStore;

/// A user seen in a chat; unique per (user_id, chat_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub user_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub display_name: String,
    pub last_seen: DateTime<Utc>,
}

#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn MemberStore>,
}

impl MemberService {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    /// Record that a user spoke in a chat
    pub async fn touch(
        &self,
        user_id: i64,
        chat_id: i64,
        username: Option<&str>,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> BotResult<()> {
        let member = GroupMember {
            user_id,
            chat_id,
            username: username.map(str::to_string),
            display_name: display_name.to_string(),
            last_seen: now,
        };
        self.store.touch_member(&member).await
    }

    /// Members of the chat without an order today, ordered by display name
    pub async fn without_order_today<Tz: TimeZone>(
        &self,
        chat_id: i64,
        orders: &OrderService,
        now: &DateTime<Tz>,
    ) -> BotResult<Vec<GroupMember>> {
        let ordered: HashSet<i64> = orders
            .todays_orders(chat_id, now)
            .await?
            .into_iter()
            .map(|order| order.user_id)
            .collect();

        let mut pending: Vec<GroupMember> = self
            .store
            .list_members(chat_id)
            .await?
            .into_iter()
            .filter(|member| !ordered.contains(&member.user_id))
            .collect();
        pending.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        debug!(chat_id, pending = pending.len(), "Computed members without order");
        Ok(pending)
    }
}
