//! # Orders Module
//!
//! Order records and the upsert engine behind them.
//!
//! Each user has at most one order per chat per local calendar day. Sending
//! another dish the same day changes that order instead of adding a second
//! one. Summaries are computed from the orders inside a [`DateRange`].

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::dates::{day_range, month_range, week_range, DateRange};
use crate::errors::BotResult;
use crate::store::OrderStore;

/// A stored order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub chat_id: i64,
    pub dish: String,
    /// Local calendar day the order belongs to
    pub order_day: NaiveDate,
    /// When the order was first placed
    pub order_date: DateTime<Utc>,
    /// When the dish was last set
    pub created_at: DateTime<Utc>,
}

/// Data for placing an order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub user_name: String,
    pub chat_id: i64,
    pub dish: String,
    pub order_day: NaiveDate,
    pub placed_at: DateTime<Utc>,
}

/// Result of an order upsert
#[derive(Debug, Clone, PartialEq)]
pub enum OrderWrite {
    Created(Order),
    Updated(Order),
}

impl OrderWrite {
    pub fn order(&self) -> &Order {
        match self {
            OrderWrite::Created(order) | OrderWrite::Updated(order) => order,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, OrderWrite::Created(_))
    }
}

/// One dish line of the daily summary
#[derive(Debug, Clone, PartialEq)]
pub struct DishOrderers {
    pub dish: String,
    pub count: usize,
    /// Display names in placement order
    pub orderers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DailySummary {
    pub per_dish: Vec<DishOrderers>,
    pub total: usize,
}

/// One dish line of a week or month summary
#[derive(Debug, Clone, PartialEq)]
pub struct DishCount {
    pub dish: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodSummary {
    pub per_dish: Vec<DishCount>,
    pub total: usize,
}

/// Which period a summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPeriod {
    Week,
    Month,
}

impl SummaryPeriod {
    pub fn range<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateRange {
        match self {
            SummaryPeriod::Week => week_range(now),
            SummaryPeriod::Month => month_range(now),
        }
    }
}

/// Group orders by dish in first-seen order, listing orderers in placement order
pub fn summarize_day(orders: &[Order]) -> DailySummary {
    let mut per_dish: Vec<DishOrderers> = Vec::new();

    for order in orders {
        match per_dish.iter_mut().find(|group| group.dish == order.dish) {
            Some(group) => {
                group.count += 1;
                group.orderers.push(order.user_name.clone());
            }
            None => per_dish.push(DishOrderers {
                dish: order.dish.clone(),
                count: 1,
                orderers: vec![order.user_name.clone()],
            }),
        }
    }

    DailySummary {
        per_dish,
        total: orders.len(),
    }
}

/// Count orders per dish, most ordered first; ties keep first-seen order
pub fn summarize_period(orders: &[Order]) -> PeriodSummary {
    let mut per_dish: Vec<DishCount> = Vec::new();

    for order in orders {
        match per_dish.iter_mut().find(|entry| entry.dish == order.dish) {
            Some(entry) => entry.count += 1,
            None => per_dish.push(DishCount {
                dish: order.dish.clone(),
                count: 1,
            }),
        }
    }

    // Stable sort preserves first-seen order among equal counts
    per_dish.sort_by(|a, b| b.count.cmp(&a.count));

    PeriodSummary {
        per_dish,
        total: orders.len(),
    }
}

/// Order upsert engine and aggregations
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Create or update the caller's single order for the day of `now`
    pub async fn place_order<Tz: TimeZone>(
        &self,
        user_id: i64,
        user_name: &str,
        chat_id: i64,
        dish: &str,
        now: &DateTime<Tz>,
    ) -> BotResult<OrderWrite> {
        let new_order = NewOrder {
            user_id,
            user_name: user_name.to_string(),
            chat_id,
            dish: dish.to_string(),
            order_day: now.date_naive(),
            // Windows end at millisecond precision
            placed_at: now.with_timezone(&Utc).trunc_subsecs(3),
        };

        let write = self.store.upsert_order(&new_order).await?;
        info!(
            chat_id,
            user_id,
            dish = %dish,
            created = write.is_created(),
            "Order placed"
        );
        Ok(write)
    }

    /// Remove the caller's order for today; returns the removed order if there was one
    pub async fn cancel_order<Tz: TimeZone>(
        &self,
        user_id: i64,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<Option<Order>> {
        let range = day_range(now);
        let Some(order) = self.store.find_order(user_id, chat_id, &range).await? else {
            debug!(chat_id, user_id, "No order to cancel");
            return Ok(None);
        };

        let removed = self.store.delete_order(order.id).await?;
        info!(chat_id, user_id, removed, "Order cancelled");
        Ok(removed.then_some(order))
    }

    /// Delete every order of the chat for today, returning how many were removed
    pub async fn reset_orders<Tz: TimeZone>(
        &self,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<u64> {
        let range = day_range(now);
        let deleted = self.store.delete_orders_in_range(chat_id, &range).await?;
        info!(chat_id, deleted, "Reset today's orders");
        Ok(deleted)
    }

    /// Today's orders for the chat, in placement order
    pub async fn todays_orders<Tz: TimeZone>(
        &self,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<Vec<Order>> {
        self.store
            .find_orders_in_range(chat_id, &day_range(now))
            .await
    }

    pub async fn daily_summary<Tz: TimeZone>(
        &self,
        chat_id: i64,
        now: &DateTime<Tz>,
    ) -> BotResult<DailySummary> {
        let orders = self.todays_orders(chat_id, now).await?;
        Ok(summarize_day(&orders))
    }

    pub async fn period_summary(&self, chat_id: i64, range: &DateRange) -> BotResult<PeriodSummary> {
        let orders = self.store.find_orders_in_range(chat_id, range).await?;
        debug!(chat_id, order_count = orders.len(), "Computing period summary");
        Ok(summarize_period(&orders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, user: &str, dish: &str) -> Order {
        let at = Utc.with_ymd_and_hms(2024, 5, 8, 4, 0, 0).unwrap() + chrono::Duration::minutes(id);
        Order {
            id,
            user_id: id,
            user_name: user.to_string(),
            chat_id: 1,
            dish: dish.to_string(),
            order_day: NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
            order_date: at,
            created_at: at,
        }
    }

    #[test]
    fn test_summarize_day_groups_in_first_seen_order() {
        let orders = vec![
            order(1, "An", "Phở bò"),
            order(2, "Bình", "Cơm gà"),
            order(3, "Chi", "Phở bò"),
        ];

        let summary = summarize_day(&orders);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.per_dish.len(), 2);
        assert_eq!(summary.per_dish[0].dish, "Phở bò");
        assert_eq!(summary.per_dish[0].count, 2);
        assert_eq!(summary.per_dish[0].orderers, vec!["An", "Chi"]);
        assert_eq!(summary.per_dish[1].orderers, vec!["Bình"]);
    }

    #[test]
    fn test_summarize_period_sorts_by_count_with_stable_ties() {
        let orders = vec![
            order(1, "An", "Bún chả"),
            order(2, "Bình", "Cơm gà"),
            order(3, "Chi", "Phở bò"),
            order(4, "Dũng", "Phở bò"),
            order(5, "Em", "Cơm gà"),
        ];

        let summary = summarize_period(&orders);
        assert_eq!(summary.total, 5);
        let dishes: Vec<(&str, usize)> = summary
            .per_dish
            .iter()
            .map(|d| (d.dish.as_str(), d.count))
            .collect();
        assert_eq!(dishes, vec![("Cơm gà", 2), ("Phở bò", 2), ("Bún chả", 1)]);
    }

    #[test]
    fn test_empty_summaries() {
        assert_eq!(summarize_day(&[]), DailySummary::default());
        assert_eq!(summarize_period(&[]), PeriodSummary::default());
    }
}
