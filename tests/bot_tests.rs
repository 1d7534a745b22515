//! # Bot Tests
//!
//! End-to-end routing tests for [`OrderBot`] over the in-memory store:
//! menu capture, ordering, summaries, photos and failure replies.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use std::sync::Arc;
use tempfile::TempDir;

use lunch_order_bot::bot::{IncomingText, OrderBot, Reply};
use lunch_order_bot::config::BotSettings;
use lunch_order_bot::dates::DateRange;
use lunch_order_bot::dish_matcher::MatchPolicy;
use lunch_order_bot::errors::{BotError, BotResult};
use lunch_order_bot::members::GroupMember;
use lunch_order_bot::menu::{Menu, MenuItem, MenuMode};
use lunch_order_bot::moderation::ModerationFilter;
use lunch_order_bot::orders::{NewOrder, Order, OrderWrite};
use lunch_order_bot::photos::{photo_blob_path, LocalBlobStore, Photo, PhotoOwner};
use lunch_order_bot::store::{InMemoryStore, MemberStore, MenuStore, OrderStore, PhotoStore};

const CHAT: i64 = -1001;
const AN: i64 = 11;
const BINH: i64 = 22;

fn offset() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    offset().with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

fn settings(menu_mode: MenuMode) -> BotSettings {
    BotSettings {
        language: "vi".to_string(),
        utc_offset: offset(),
        menu_mode,
        match_policy: MatchPolicy::Substring,
    }
}

struct Harness {
    bot: OrderBot,
    store: Arc<InMemoryStore>,
    _photos_dir: TempDir,
}

fn harness(menu_mode: MenuMode) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let photos_dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(LocalBlobStore::new(photos_dir.path(), "http://files.local"));
    let bot = OrderBot::new(store.clone(), blobs, settings(menu_mode));

    Harness {
        bot,
        store,
        _photos_dir: photos_dir,
    }
}

fn message(user_id: i64, user_name: &str, text: &str, now: DateTime<FixedOffset>) -> IncomingText {
    IncomingText {
        chat_id: CHAT,
        user_id,
        user_name: user_name.to_string(),
        username: None,
        text: text.to_string(),
        now,
    }
}

async fn send(h: &Harness, user_id: i64, user_name: &str, text: &str, now: DateTime<FixedOffset>) -> Option<String> {
    h.bot
        .handle_text(&message(user_id, user_name, text, now))
        .await
        .map(|reply| reply.text().to_string())
}

const DAILY_MENU: &str = "Em gửi thực đơn hôm nay ạ\n- Cơm gà\n- Phở bò\n- Cơm gà xối mỡ";

#[tokio::test]
async fn test_daily_menu_then_order_then_update() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    let saved = send(&h, AN, "An", DAILY_MENU, now).await.unwrap();
    assert!(saved.contains("đã lưu thực đơn hôm nay"));

    let created = send(&h, AN, "An", "cơm gà", now).await.unwrap();
    assert!(created.contains("đã đặt món <b>Cơm gà</b>"), "{created}");

    let updated = send(&h, AN, "An", "Cho em cơm gà xối mỡ nha", now).await.unwrap();
    assert!(updated.contains("cập nhật"));
    assert!(updated.contains("Cơm gà xối mỡ"));

    assert_eq!(h.store.order_count(), 1);
}

#[tokio::test]
async fn test_no_menu_or_no_match_stays_silent() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    assert_eq!(send(&h, AN, "An", "Cơm gà", now).await, None);

    send(&h, AN, "An", DAILY_MENU, now).await;
    assert_eq!(send(&h, AN, "An", "hôm nay trời đẹp quá", now).await, None);
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn test_daily_menu_expires_next_day() {
    let h = harness(MenuMode::Daily);

    send(&h, AN, "An", DAILY_MENU, at(2024, 5, 8, 10)).await;
    assert_eq!(send(&h, AN, "An", "Phở bò", at(2024, 5, 9, 10)).await, None);
}

#[tokio::test]
async fn test_persistent_menu_capture_and_show() {
    let h = harness(MenuMode::Persistent);
    let now = at(2024, 5, 8, 9);

    let prompt = send(&h, AN, "An", "/menu", now).await.unwrap();
    assert!(prompt.contains("gửi thực đơn"));
    assert!(prompt.contains("tên món - giá"));

    let saved = send(&h, AN, "An", "Cơm gà - 35k\nPhở bò - 40.000", now).await.unwrap();
    assert!(saved.contains("2 món"), "{saved}");

    let shown = send(&h, BINH, "Bình", "/showmenu", now).await.unwrap();
    assert!(shown.contains("• Cơm gà - 35.000đ"));
    assert!(shown.contains("• Phở bò - 40.000đ"));

    // Persistent menus stay valid on later days
    let order = send(&h, BINH, "Bình", "phở bò", at(2024, 5, 20, 11)).await.unwrap();
    assert!(order.contains("<b>Phở bò</b>"));
}

#[tokio::test]
async fn test_daily_menu_prompt_has_no_price_format() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 9);

    let prompt = send(&h, AN, "An", "/menu", now).await.unwrap();
    assert!(prompt.contains("mỗi dòng một món"));
    assert!(!prompt.contains("tên món - giá"));

    let saved = send(&h, AN, "An", "Cơm gà\nPhở bò", now).await.unwrap();
    assert!(saved.contains("đã lưu thực đơn"));
}

#[tokio::test]
async fn test_malformed_menu_consumes_capture() {
    let h = harness(MenuMode::Persistent);
    let now = at(2024, 5, 8, 9);

    send(&h, AN, "An", "/menu", now).await;
    let help = send(&h, AN, "An", "just some words", now).await.unwrap();
    assert!(help.contains("tên món - giá"));

    // The flag is gone, so this is an order attempt against no menu
    assert_eq!(send(&h, AN, "An", "Cơm gà - 35k", now).await, None);
    assert!(h.store.find_item_menu(CHAT).await.unwrap().is_none());
}

#[tokio::test]
async fn test_summary_cancel_and_reset() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    send(&h, AN, "An", DAILY_MENU, now).await;
    send(&h, AN, "An", "Cơm gà", now).await;
    send(&h, BINH, "Bình", "Cơm gà", now).await;
    send(&h, 33, "Chi", "Phở bò", now).await;

    let summary = send(&h, AN, "An", "/summary", now).await.unwrap();
    assert!(summary.contains("<b>Cơm gà</b>: 2 phần"));
    assert!(summary.contains("└ An, Bình"));
    assert!(summary.contains("Tổng cộng: 3 phần"));

    let cancelled = send(&h, 33, "Chi", "/cancel", now).await.unwrap();
    assert!(cancelled.contains("<b>Phở bò</b>"));
    let nothing = send(&h, 33, "Chi", "/cancel", now).await.unwrap();
    assert!(nothing.contains("chưa đặt món"));

    let reset = send(&h, AN, "An", "/reset", now).await.unwrap();
    assert!(reset.contains("xoá 2 đơn"));

    let empty = send(&h, AN, "An", "/summary", now).await.unwrap();
    assert!(empty.contains("chưa có ai đặt món"));
}

#[tokio::test]
async fn test_weekly_and_monthly_windows() {
    let h = harness(MenuMode::Persistent);
    let setup = at(2024, 5, 1, 8);
    send(&h, AN, "An", "/menu", setup).await;
    send(&h, AN, "An", "Cơm gà - 35k\nPhở bò - 40k", setup).await;

    // 2024-05-05 is a Sunday, 2024-05-11 the following Saturday
    send(&h, AN, "An", "Cơm gà", at(2024, 5, 5, 11)).await;
    send(&h, BINH, "Bình", "Phở bò", at(2024, 5, 11, 11)).await;
    send(&h, AN, "An", "Phở bò", at(2024, 5, 11, 12)).await;
    send(&h, AN, "An", "Cơm gà", at(2024, 5, 12, 11)).await;
    send(&h, BINH, "Bình", "Cơm gà", at(2024, 4, 30, 11)).await;

    let weekly = send(&h, AN, "An", "/weeklySummary@lunch_bot", at(2024, 5, 8, 9)).await.unwrap();
    assert!(weekly.contains("tuần này"));
    assert!(weekly.contains("<b>Phở bò</b>: 2 phần"));
    assert!(weekly.contains("<b>Cơm gà</b>: 1 phần"));
    assert!(weekly.contains("Tổng cộng: 3 phần"));
    assert!(weekly.find("Phở bò").unwrap() < weekly.find("Cơm gà").unwrap());

    let monthly = send(&h, AN, "An", "/monthlysummary", at(2024, 5, 31, 20)).await.unwrap();
    assert!(monthly.contains("Tổng cộng: 4 phần"));

    let empty_week = send(&h, AN, "An", "/weeklysummary", at(2024, 6, 20, 9)).await.unwrap();
    assert!(empty_week.contains("tuần này chưa ai đặt món"));
}

#[tokio::test]
async fn test_pending_lists_members_without_order() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    send(&h, AN, "An", DAILY_MENU, now).await;
    send(&h, BINH, "Bình", "chào cả nhà", now).await;
    send(&h, AN, "An", "Phở bò", now).await;

    let pending = send(&h, AN, "An", "/pending", now).await.unwrap();
    assert!(pending.contains("• Bình"));
    assert!(!pending.contains("• An"));

    send(&h, BINH, "Bình", "Cơm gà", now).await;
    let done = send(&h, AN, "An", "/pending", now).await.unwrap();
    assert!(done.contains("đặt món hết rồi"));
}

#[tokio::test]
async fn test_random_needs_menu() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    let no_menu = send(&h, AN, "An", "/random", now).await.unwrap();
    assert!(no_menu.contains("chưa có thực đơn"));

    send(&h, AN, "An", DAILY_MENU, now).await;
    let pick = send(&h, AN, "An", "/random", now).await.unwrap();
    assert!(["Cơm gà", "Phở bò", "Cơm gà xối mỡ"]
        .iter()
        .any(|dish| pick.contains(dish)));
}

#[tokio::test]
async fn test_moderation_blocks_order() {
    let mut h = harness(MenuMode::Daily);
    h.bot = OrderBot::new(
        h.store.clone(),
        Arc::new(LocalBlobStore::new(h._photos_dir.path(), "http://files.local")),
        settings(MenuMode::Daily),
    )
    .with_moderation(ModerationFilter::new(["đồ ngốc"]));
    let now = at(2024, 5, 8, 10);

    send(&h, AN, "An", DAILY_MENU, now).await;
    let warning = send(&h, AN, "An", "Cơm gà đi đồ ngốc", now).await.unwrap();
    assert!(warning.contains("nhẹ nhàng"));
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn test_unknown_commands_are_ignored() {
    let h = harness(MenuMode::Daily);
    assert_eq!(send(&h, AN, "An", "/foo", at(2024, 5, 8, 10)).await, None);

    let help = send(&h, AN, "An", "/HELP", at(2024, 5, 8, 10)).await.unwrap();
    assert!(help.contains("/summary"));
}

#[tokio::test]
async fn test_personal_and_group_photos() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    let prompt = send(&h, AN, "An", "/savephoto Mèo con", now).await.unwrap();
    assert!(prompt.contains("<b>Mèo con</b>"));

    let pending = h.bot.take_pending_photo(AN, CHAT).await.unwrap();
    assert_eq!(pending.owner, PhotoOwner::User(AN));
    let saved = h.bot.save_photo(&pending, b"jpeg").await;
    assert!(saved.text().contains("đã lưu ảnh"));
    assert!(h.bot.take_pending_photo(AN, CHAT).await.is_none());

    send(&h, BINH, "Bình", "/savegroupphoto quán cơm", now).await;
    let group = h.bot.take_pending_photo(AN, CHAT).await.unwrap();
    assert_eq!(group.owner, PhotoOwner::Chat(CHAT));
    h.bot.save_photo(&group, b"jpeg").await;

    let reply = h.bot.handle_text(&message(AN, "An", "/photo Mèo con", now)).await.unwrap();
    assert_eq!(
        reply,
        Reply::Photo {
            url: format!(
                "http://files.local/{}",
                photo_blob_path(PhotoOwner::User(AN), "Mèo con")
            ),
            caption: "Mèo con".to_string(),
        }
    );

    // Bình has no personal photo with that name, so the chat's is used
    let shared = h.bot.handle_text(&message(BINH, "Bình", "/photo quán cơm", now)).await.unwrap();
    assert!(matches!(shared, Reply::Photo { ref url, .. } if url.contains("photos/chat/")));

    let missing = send(&h, BINH, "Bình", "/photo Mèo con", now).await.unwrap();
    assert!(missing.contains("không tìm thấy"));

    let list = send(&h, AN, "An", "/photos", now).await.unwrap();
    assert!(list.contains("👤 Mèo con"));
    assert!(list.contains("👥 quán cơm"));
}

#[tokio::test]
async fn test_photo_name_validation_replies() {
    let h = harness(MenuMode::Daily);
    let now = at(2024, 5, 8, 10);

    let empty = send(&h, AN, "An", "/savephoto", now).await.unwrap();
    assert!(empty.contains("tên ảnh"));

    let long = format!("/savephoto {}", "a".repeat(70));
    let too_long = send(&h, AN, "An", &long, now).await.unwrap();
    assert!(too_long.contains("64"));
    assert!(h.bot.take_pending_photo(AN, CHAT).await.is_none());
}

/// Store whose order operations always fail
struct BrokenOrders {
    inner: InMemoryStore,
}

fn broken() -> BotError {
    BotError::Timeout("pool timed out".to_string())
}

#[async_trait]
impl MenuStore for BrokenOrders {
    async fn find_daily_menu(&self, chat_id: i64, date: NaiveDate) -> BotResult<Option<Menu>> {
        self.inner.find_daily_menu(chat_id, date).await
    }
    async fn upsert_daily_menu(&self, chat_id: i64, date: NaiveDate, raw_text: &str) -> BotResult<Menu> {
        self.inner.upsert_daily_menu(chat_id, date, raw_text).await
    }
    async fn find_item_menu(&self, chat_id: i64) -> BotResult<Option<Menu>> {
        self.inner.find_item_menu(chat_id).await
    }
    async fn upsert_item_menu(&self, chat_id: i64, items: &[MenuItem]) -> BotResult<Menu> {
        self.inner.upsert_item_menu(chat_id, items).await
    }
}

#[async_trait]
impl OrderStore for BrokenOrders {
    async fn upsert_order(&self, _order: &NewOrder) -> BotResult<OrderWrite> {
        Err(broken())
    }
    async fn find_order(&self, _user_id: i64, _chat_id: i64, _range: &DateRange) -> BotResult<Option<Order>> {
        Err(broken())
    }
    async fn delete_order(&self, _order_id: i64) -> BotResult<bool> {
        Err(broken())
    }
    async fn find_orders_in_range(&self, _chat_id: i64, _range: &DateRange) -> BotResult<Vec<Order>> {
        Err(broken())
    }
    async fn delete_orders_in_range(&self, _chat_id: i64, _range: &DateRange) -> BotResult<u64> {
        Err(broken())
    }
}

#[async_trait]
impl PhotoStore for BrokenOrders {
    async fn upsert_photo(&self, owner: PhotoOwner, name: &str, url: &str) -> BotResult<Photo> {
        self.inner.upsert_photo(owner, name, url).await
    }
    async fn find_photo(&self, owner: PhotoOwner, name: &str) -> BotResult<Option<Photo>> {
        self.inner.find_photo(owner, name).await
    }
    async fn list_photos(&self, owner: PhotoOwner) -> BotResult<Vec<Photo>> {
        self.inner.list_photos(owner).await
    }
}

#[async_trait]
impl MemberStore for BrokenOrders {
    async fn touch_member(&self, member: &GroupMember) -> BotResult<()> {
        self.inner.touch_member(member).await
    }
    async fn list_members(&self, chat_id: i64) -> BotResult<Vec<GroupMember>> {
        self.inner.list_members(chat_id).await
    }
}

#[tokio::test]
async fn test_storage_failures_get_apologetic_replies() {
    let store = Arc::new(BrokenOrders {
        inner: InMemoryStore::new(),
    });
    let dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(LocalBlobStore::new(dir.path(), "http://files.local"));
    let bot = OrderBot::new(store, blobs, settings(MenuMode::Daily));
    let now = at(2024, 5, 8, 10);

    let reply = |text: &str| message(AN, "An", text, now);

    bot.handle_text(&reply(DAILY_MENU)).await;

    let order = bot.handle_text(&reply("Cơm gà")).await.unwrap();
    assert!(order.text().contains("có lỗi khi lưu đơn đặt món"));

    let summary = bot.handle_text(&reply("/summary")).await.unwrap();
    assert!(summary.text().contains("lỗi khi xem thống kê"));

    let weekly = bot.handle_text(&reply("/weeklysummary")).await.unwrap();
    assert!(weekly.text().contains("thống kê tuần"));

    let reset = bot.handle_text(&reply("/reset")).await.unwrap();
    assert!(reset.text().contains("có lỗi khi xoá đơn"));

    let cancel = bot.handle_text(&reply("/cancel")).await.unwrap();
    assert!(cancel.text().contains("có lỗi khi huỷ đơn"));
}
