//! # Localization Tests
//!
//! This module contains unit tests for the localization functionality,
//! testing message retrieval and formatting with various edge cases.

use lunch_order_bot::localization::LocalizationManager;
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_localization() -> LocalizationManager {
        // Create a new localization manager for each test
        LocalizationManager::new().expect("Failed to create localization manager")
    }

    #[test]
    fn test_get_message_existing_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("summary-empty", "vi", None);
        assert_eq!(message, "📊 Dạ hôm nay chưa có ai đặt món hết ạ!");
    }

    #[test]
    fn test_get_message_nonexistent_key() {
        let manager = setup_localization();

        let message = manager.get_message_in_language("nonexistent-key", "vi", None);
        assert!(message.starts_with("Missing translation:"));
    }

    #[test]
    fn test_get_message_unsupported_language() {
        let manager = setup_localization();

        assert!(!manager.is_language_supported("fr"));
        let message = manager.get_message_in_language("menu-saved", "fr", None);
        // Should fall back to Vietnamese
        assert_eq!(message, manager.get_message_in_language("menu-saved", "vi", None));
    }

    #[test]
    fn test_get_message_with_args() {
        let manager = setup_localization();

        let mut args = HashMap::new();
        args.insert("name", "An");
        args.insert("dish", "Cơm gà");

        let message = manager.get_message_in_language("order-created", "vi", Some(&args));
        assert_eq!(message, "🍱 Dạ An đã đặt món <b>Cơm gà</b> thành công rồi ạ ♥️");
    }

    #[test]
    fn test_english_differs_from_vietnamese() {
        let manager = setup_localization();

        let english = manager.get_message_in_language("help-text", "en", None);
        let vietnamese = manager.get_message_in_language("help-text", "vi", None);
        assert_ne!(english, vietnamese);
        assert!(english.contains("/weeklySummary"));
        assert!(vietnamese.contains("/weeklySummary"));
    }

    #[test]
    fn test_every_key_exists_in_both_languages() {
        let manager = setup_localization();

        for key in [
            "start-welcome",
            "menu-format-help",
            "menu-await-items",
            "order-updated",
            "order-cancelled",
            "reset-done",
            "weekly-header",
            "monthly-empty",
            "pending-none",
            "photo-not-found",
            "moderation-warning",
        ] {
            for language in ["vi", "en"] {
                let message = manager.get_message_in_language(key, language, None);
                assert!(!message.starts_with("Missing translation"), "{key} missing in {language}");
            }
        }
    }

    #[test]
    fn test_convenience_functions() {
        lunch_order_bot::localization::init_localization().expect("Failed to initialize localization");

        let message = lunch_order_bot::localization::t_lang("menu-empty", None);
        assert!(message.contains("chưa có thực đơn"));

        let args = vec![("count", "3")];
        let message_with_args =
            lunch_order_bot::localization::t_args_lang("reset-done", &args, Some("en"));
        assert_eq!(message_with_args, "🧹 Deleted 3 orders for today!");
    }
}
