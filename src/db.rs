//! PostgreSQL persistence for menus, orders, photos and group members.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::dates::DateRange;
use crate::errors::{BotError, BotResult};
use crate::members::GroupMember;
use crate::menu::{Menu, MenuItem};
use crate::orders::{NewOrder, Order, OrderWrite};
use crate::photos::{Photo, PhotoOwner};
use crate::store::{MemberStore, MenuStore, OrderStore, PhotoStore};

/// Open a connection pool with the configured size and acquire timeout
pub async fn connect(config: &StorageConfig) -> Result<PgPool> {
    info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS menus (
            chat_id BIGINT PRIMARY KEY,
            items JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create menus table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS daily_menus (
            chat_id BIGINT NOT NULL,
            menu_date DATE NOT NULL,
            raw_text TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (chat_id, menu_date)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create daily_menus table")?;

    // One order per user, chat and local day is enforced here
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            user_name TEXT NOT NULL,
            chat_id BIGINT NOT NULL,
            dish TEXT NOT NULL,
            order_day DATE NOT NULL,
            order_date TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            UNIQUE (user_id, chat_id, order_day)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create orders table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_chat_date ON orders (chat_id, order_date)")
        .execute(pool)
        .await
        .context("Failed to create orders index")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS photos (
            id BIGSERIAL PRIMARY KEY,
            owner_kind TEXT NOT NULL,
            owner_id BIGINT NOT NULL,
            photo_name TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (owner_kind, owner_id, photo_name)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create photos table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS group_members (
            user_id BIGINT NOT NULL,
            chat_id BIGINT NOT NULL,
            username TEXT,
            display_name TEXT NOT NULL,
            last_seen TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (user_id, chat_id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create group_members table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

const ORDER_COLUMNS: &str =
    "id, user_id, user_name, chat_id, dish, order_day, order_date, created_at";

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        chat_id: row.try_get("chat_id")?,
        dish: row.try_get("dish")?,
        order_day: row.try_get("order_day")?,
        order_date: row.try_get("order_date")?,
        created_at: row.try_get("created_at")?,
    })
}

fn photo_from_row(row: &PgRow) -> BotResult<Photo> {
    let kind: String = row.try_get("owner_kind")?;
    let owner_id: i64 = row.try_get("owner_id")?;
    let owner = PhotoOwner::from_parts(&kind, owner_id)
        .ok_or_else(|| BotError::Storage(format!("unknown photo owner kind '{kind}'")))?;

    Ok(Photo {
        id: row.try_get("id")?,
        owner,
        photo_name: row.try_get("photo_name")?,
        url: row.try_get("url")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Storage traits backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MenuStore for PgStore {
    async fn find_daily_menu(&self, chat_id: i64, date: NaiveDate) -> BotResult<Option<Menu>> {
        debug!(chat_id, %date, "Reading daily menu");

        let row = sqlx::query("SELECT raw_text FROM daily_menus WHERE chat_id = $1 AND menu_date = $2")
            .bind(chat_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Menu::DailyFreeText {
                chat_id,
                raw_text: row.try_get("raw_text")?,
                date,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_daily_menu(
        &self,
        chat_id: i64,
        date: NaiveDate,
        raw_text: &str,
    ) -> BotResult<Menu> {
        info!(chat_id, %date, "Upserting daily menu");

        sqlx::query(
            "INSERT INTO daily_menus (chat_id, menu_date, raw_text)
             VALUES ($1, $2, $3)
             ON CONFLICT (chat_id, menu_date) DO UPDATE SET
                 raw_text = EXCLUDED.raw_text,
                 created_at = NOW()",
        )
        .bind(chat_id)
        .bind(date)
        .bind(raw_text)
        .execute(&self.pool)
        .await?;

        Ok(Menu::DailyFreeText {
            chat_id,
            raw_text: raw_text.to_string(),
            date,
        })
    }

    async fn find_item_menu(&self, chat_id: i64) -> BotResult<Option<Menu>> {
        debug!(chat_id, "Reading persistent menu");

        let row = sqlx::query("SELECT items, updated_at FROM menus WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(items): Json<Vec<MenuItem>> = row.try_get("items")?;
                let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
                Ok(Some(Menu::PersistentItems {
                    chat_id,
                    items,
                    updated_at,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert_item_menu(&self, chat_id: i64, items: &[MenuItem]) -> BotResult<Menu> {
        info!(chat_id, item_count = items.len(), "Upserting persistent menu");

        let updated_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO menus (chat_id, items, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (chat_id) DO UPDATE SET
                 items = EXCLUDED.items,
                 updated_at = NOW()
             RETURNING updated_at",
        )
        .bind(chat_id)
        .bind(Json(items))
        .fetch_one(&self.pool)
        .await?;

        Ok(Menu::PersistentItems {
            chat_id,
            items: items.to_vec(),
            updated_at,
        })
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn upsert_order(&self, order: &NewOrder) -> BotResult<OrderWrite> {
        info!(
            chat_id = order.chat_id,
            user_id = order.user_id,
            dish = %order.dish,
            "Upserting order"
        );

        // xmax is 0 only for a freshly inserted row
        let row = sqlx::query(&format!(
            "INSERT INTO orders (user_id, user_name, chat_id, dish, order_day, order_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             ON CONFLICT (user_id, chat_id, order_day) DO UPDATE SET
                 dish = EXCLUDED.dish,
                 user_name = EXCLUDED.user_name,
                 created_at = EXCLUDED.created_at
             RETURNING {ORDER_COLUMNS}, (xmax = 0) AS inserted"
        ))
        .bind(order.user_id)
        .bind(&order.user_name)
        .bind(order.chat_id)
        .bind(&order.dish)
        .bind(order.order_day)
        .bind(order.placed_at)
        .fetch_one(&self.pool)
        .await?;

        let inserted: bool = row.try_get("inserted")?;
        let stored = order_from_row(&row)?;
        if inserted {
            Ok(OrderWrite::Created(stored))
        } else {
            Ok(OrderWrite::Updated(stored))
        }
    }

    async fn find_order(
        &self,
        user_id: i64,
        chat_id: i64,
        range: &DateRange,
    ) -> BotResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1 AND chat_id = $2 AND order_date >= $3 AND order_date <= $4
             ORDER BY order_date
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(chat_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(order_from_row).transpose()?)
    }

    async fn delete_order(&self, order_id: i64) -> BotResult<bool> {
        info!("Deleting order with ID: {}", order_id);

        let rows_affected = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            warn!("No order found with ID: {}", order_id);
        }
        Ok(rows_affected > 0)
    }

    async fn find_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE chat_id = $1 AND order_date >= $2 AND order_date <= $3
             ORDER BY order_date, id"
        ))
        .bind(chat_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(chat_id, order_count = orders.len(), "Fetched orders in range");
        Ok(orders)
    }

    async fn delete_orders_in_range(&self, chat_id: i64, range: &DateRange) -> BotResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM orders WHERE chat_id = $1 AND order_date >= $2 AND order_date <= $3",
        )
        .bind(chat_id)
        .bind(range.start)
        .bind(range.end)
        .execute(&self.pool)
        .await?
        .rows_affected();

        info!(chat_id, deleted, "Deleted orders in range");
        Ok(deleted)
    }
}

#[async_trait]
impl PhotoStore for PgStore {
    async fn upsert_photo(&self, owner: PhotoOwner, name: &str, url: &str) -> BotResult<Photo> {
        info!(owner = ?owner, photo_name = %name, "Upserting photo");

        let row = sqlx::query(
            "INSERT INTO photos (owner_kind, owner_id, photo_name, url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (owner_kind, owner_id, photo_name) DO UPDATE SET
                 url = EXCLUDED.url,
                 created_at = NOW()
             RETURNING id, owner_kind, owner_id, photo_name, url, created_at",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .bind(name)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;

        photo_from_row(&row)
    }

    async fn find_photo(&self, owner: PhotoOwner, name: &str) -> BotResult<Option<Photo>> {
        let row = sqlx::query(
            "SELECT id, owner_kind, owner_id, photo_name, url, created_at FROM photos
             WHERE owner_kind = $1 AND owner_id = $2 AND photo_name = $3",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(photo_from_row).transpose()
    }

    async fn list_photos(&self, owner: PhotoOwner) -> BotResult<Vec<Photo>> {
        let rows = sqlx::query(
            "SELECT id, owner_kind, owner_id, photo_name, url, created_at FROM photos
             WHERE owner_kind = $1 AND owner_id = $2
             ORDER BY photo_name",
        )
        .bind(owner.kind())
        .bind(owner.id())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(photo_from_row).collect()
    }
}

#[async_trait]
impl MemberStore for PgStore {
    async fn touch_member(&self, member: &GroupMember) -> BotResult<()> {
        sqlx::query(
            "INSERT INTO group_members (user_id, chat_id, username, display_name, last_seen)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, chat_id) DO UPDATE SET
                 username = EXCLUDED.username,
                 display_name = EXCLUDED.display_name,
                 last_seen = EXCLUDED.last_seen",
        )
        .bind(member.user_id)
        .bind(member.chat_id)
        .bind(&member.username)
        .bind(&member.display_name)
        .bind(member.last_seen)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_members(&self, chat_id: i64) -> BotResult<Vec<GroupMember>> {
        let rows = sqlx::query(
            "SELECT user_id, chat_id, username, display_name, last_seen FROM group_members
             WHERE chat_id = $1
             ORDER BY display_name",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        let members = rows
            .iter()
            .map(|row| {
                Ok(GroupMember {
                    user_id: row.try_get("user_id")?,
                    chat_id: row.try_get("chat_id")?,
                    username: row.try_get("username")?,
                    display_name: row.try_get("display_name")?,
                    last_seen: row.try_get("last_seen")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(members)
    }
}
