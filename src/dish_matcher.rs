//! # Dish Matcher Module
//!
//! Decides whether a free-text chat message names a dish on the active menu.
//!
//! Matching always happens on [`normalize`]d forms. An exact match wins over
//! everything. Under [`MatchPolicy::Substring`] the fallback is the longest
//! menu entry contained in the message; entries of equal normalized length
//! resolve to the one listed first on the menu.

use tracing::{debug, trace};

use crate::text_processing::normalize;

/// How a message is compared against menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Exact match first, then the longest menu entry contained in the message
    #[default]
    Substring,
    /// The whole message must equal a menu entry
    Exact,
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(MatchPolicy::Substring),
            "exact" => Ok(MatchPolicy::Exact),
            other => Err(format!(
                "unknown match policy '{other}' (expected substring or exact)"
            )),
        }
    }
}

/// Matches chat messages against a menu under a fixed policy
#[derive(Debug, Clone, Copy, Default)]
pub struct DishMatcher {
    policy: MatchPolicy,
}

impl DishMatcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Find the menu entry a message refers to
    ///
    /// Returns the menu entry as written on the menu (not its normalized form).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lunch_order_bot::dish_matcher::{DishMatcher, MatchPolicy};
    ///
    /// let menu = vec!["Cơm".to_string(), "Cơm gà".to_string()];
    /// let matcher = DishMatcher::new(MatchPolicy::Substring);
    /// assert_eq!(matcher.find_match("Cho em cơm gà nha", &menu), Some("Cơm gà"));
    ///
    /// let strict = DishMatcher::new(MatchPolicy::Exact);
    /// assert_eq!(strict.find_match("Cho em cơm gà nha", &menu), None);
    /// ```
    pub fn find_match<'m>(&self, message: &str, menu: &'m [String]) -> Option<&'m str> {
        let normalized_message = normalize(message);
        if normalized_message.is_empty() {
            return None;
        }

        let normalized_menu: Vec<(&'m str, String)> = menu
            .iter()
            .map(|entry| (entry.as_str(), normalize(entry)))
            .filter(|(_, normalized)| !normalized.is_empty())
            .collect();

        if let Some((entry, _)) = normalized_menu
            .iter()
            .find(|(_, normalized)| *normalized == normalized_message)
        {
            debug!(dish = %entry, "Exact dish match");
            return Some(*entry);
        }

        if self.policy == MatchPolicy::Exact {
            return None;
        }

        let mut best: Option<(&'m str, usize)> = None;
        for (entry, normalized) in &normalized_menu {
            if !normalized_message.contains(normalized.as_str()) {
                continue;
            }
            let length = normalized.chars().count();
            trace!(candidate = %entry, length, "Substring candidate");
            // Strictly greater keeps the earlier menu entry on equal length
            if best.map_or(true, |(_, best_length)| length > best_length) {
                best = Some((*entry, length));
            }
        }

        if let Some((entry, _)) = best {
            debug!(dish = %entry, "Substring dish match");
        }
        best.map(|(entry, _)| entry)
    }
}
