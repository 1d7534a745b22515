#[cfg(test)]
mod tests {
    use lunch_order_bot::dish_matcher::{DishMatcher, MatchPolicy};
    use lunch_order_bot::text_processing::{normalize, parse_menu_items, parse_menu_lines};

    fn menu_from(text: &str) -> Vec<String> {
        parse_menu_lines(text)
    }

    #[test]
    fn test_normalize_vietnamese_variants() {
        assert_eq!(normalize("Bún Bò Huế"), "bun bo hue");
        assert_eq!(normalize("ĐẬU HŨ CHIÊN"), "dau hu chien");
        assert_eq!(normalize("  Gỏi cuốn\t"), "goi cuon");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_order_text_without_accents_matches() {
        let menu = menu_from("Thực đơn thứ 4\n- Cơm gà\n- Bún bò Huế\n- Đậu hũ sốt cà");
        let matcher = DishMatcher::default();

        assert_eq!(matcher.find_match("bun bo hue", &menu), Some("Bún bò Huế"));
        assert_eq!(matcher.find_match("DAU HU SOT CA", &menu), Some("Đậu hũ sốt cà"));
    }

    #[test]
    fn test_conversational_order_uses_longest_dish() {
        let menu = menu_from("- Cơm\n- Cơm gà\n- Cơm gà xối mỡ\n- Canh chua");
        let matcher = DishMatcher::new(MatchPolicy::Substring);

        assert_eq!(
            matcher.find_match("em ơi cho chị 1 cơm gà xối mỡ nhé", &menu),
            Some("Cơm gà xối mỡ")
        );
        assert_eq!(matcher.find_match("cơm thôi", &menu), Some("Cơm"));
        assert_eq!(matcher.find_match("hôm nay ăn gì", &menu), None);
    }

    #[test]
    fn test_exact_policy_on_parsed_menu() {
        let menu = menu_from("- Cơm gà\n- Phở bò");
        let matcher = DishMatcher::new(MatchPolicy::Exact);

        assert_eq!(matcher.find_match("  PHỞ BÒ ", &menu), Some("Phở bò"));
        assert_eq!(matcher.find_match("phở bò nha", &menu), None);
    }

    #[test]
    fn test_title_markers_match_whole_words() {
        let menu = menu_from("MENU thứ 5\n- Menudo\n- Cơm gà\nThực đơn chay:\n- Đậu hũ");
        assert_eq!(menu, vec!["Menudo", "Cơm gà", "Đậu hũ"]);
    }

    #[test]
    fn test_structured_menu_parsing() {
        let items = parse_menu_items("Menu tuần này\n- Cơm gà - 35k\n• Bún chả: 40.000đ\nTrà đá - 5,000 vnd\nghi chú: hết sớm");

        let parsed: Vec<(&str, i64)> = items.iter().map(|i| (i.name.as_str(), i.price)).collect();
        assert_eq!(
            parsed,
            vec![("Cơm gà", 35000), ("Bún chả", 40000), ("Trà đá", 5000)]
        );
    }
}
