//! Keyword heuristics for the chat pipeline
//!
//! All fallback logic lives here as ordered rule tables evaluated
//! top-to-bottom, first match wins, so the routing is auditable and
//! testable without a database.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::db::{CarOrder, SortColumn, SortDirection};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 20;

/// Clamp a requested result cap into [1, MAX_LIMIT], defaulting to 10.
pub fn clamp_limit(requested: Option<u64>) -> u64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

const HELLO_REPLY: &str =
    "Hello 👋! I'm here to help you find cars. What make, model, or type of vehicle interests you? 🚗";
const SALAM_REPLY: &str =
    "Wa'alaikumussalam! I'm your car search assistant. What type of vehicle are you looking for today? 🚗";
const THANKS_REPLY: &str =
    "You're welcome! Need help finding another car or have questions about our vehicles? 🚗";
const BYE_REPLY: &str =
    "Goodbye! Feel free to return when you need help finding your next car. 🚗";
const DEFAULT_GREETING_REPLY: &str =
    "Hi! I'm your car search assistant. Tell me what kind of car you're looking for - make, model, price range, or features you need. 🚗";

/// Shown when a query carries no search intent at all, and as the terminal
/// fallback when the catalog is empty on the intent path.
pub const HELP_MESSAGE: &str = "Hi! Please search about cars, for example: Show me top 10 cars.";

pub const NO_CARS_MESSAGE: &str =
    "No cars available in the database. Please contact the administrator.";

pub const NO_MATCH_MESSAGE: &str =
    "Sorry, no cars match your search. Please try a different query! 🚗😊";

/// Greeting rules, first match wins.
static GREETING_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b(assalamualaikum|salam|salaam)\b", SALAM_REPLY),
        (r"\b(hi|hello|hey)\b", HELLO_REPLY),
        (r"\b(thanks|thank you|thx)\b", THANKS_REPLY),
        (r"\b(bye|goodbye|see you)\b", BYE_REPLY),
        (
            r"\b(good morning|good afternoon|good evening)\b",
            DEFAULT_GREETING_REPLY,
        ),
        (
            r"\b(how are you|how do you do)\b",
            DEFAULT_GREETING_REPLY,
        ),
        // Just punctuation or empty
        (r"^\s*[!?]*\s*$", DEFAULT_GREETING_REPLY),
    ]
    .into_iter()
    .map(|(pattern, reply)| (Regex::new(pattern).expect("greeting pattern"), reply))
    .collect()
});

static TOP_N: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"top\s*(\d+)").expect("top-n pattern"));

/// If the query is a greeting or small talk, the canned reply to send.
pub fn greeting_reply(query: &str) -> Option<&'static str> {
    let query = query.to_lowercase();
    let query = query.trim();
    GREETING_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(query))
        .map(|&(_, reply)| reply)
}

/// Explicit "top N" phrasing; unclamped.
pub fn parse_top_n(query: &str) -> Option<u64> {
    TOP_N
        .captures(&query.to_lowercase())
        .and_then(|caps| caps[1].parse().ok())
}

/// Keywords that mark a query as a car search even without extracted
/// constraints. Substring containment, matching the loose phrasing users
/// actually type ("cars", "newest model", ...).
const SEARCH_TRIGGERS: &[&str] = &[
    "top", "latest", "new", "recent", "model", "car", "brand", "show", "find", "get", "with",
];

pub fn has_search_trigger(query: &str) -> bool {
    let query = query.to_lowercase();
    SEARCH_TRIGGERS.iter().any(|kw| query.contains(kw))
}

/// Sort-intent buckets, first match wins; the final entry is the default.
const SORT_RULES: &[(&[&str], CarOrder)] = &[
    (&["latest", "new", "recent"], CarOrder::Recency),
    (
        &["expensive", "luxury", "high", "premium"],
        CarOrder::Scalar(SortColumn::Price, SortDirection::Desc),
    ),
    (
        &["cheap", "low", "budget", "affordable"],
        CarOrder::Scalar(SortColumn::Price, SortDirection::Asc),
    ),
    (
        &["old", "vintage", "classic"],
        CarOrder::Scalar(SortColumn::Year, SortDirection::Asc),
    ),
];

pub fn classify_sort(query: &str) -> CarOrder {
    let query = query.to_lowercase();
    SORT_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| query.contains(kw)))
        .map(|(_, order)| order.clone())
        .unwrap_or(CarOrder::Recency)
}

/// Map the query text onto the canonical feature vocabulary.
///
/// A vocabulary tag matches when every one of its lowercase words appears
/// in the word-set of the query - robust to reordering, not to typos.
/// Output is sorted for deterministic results.
pub fn reconcile_features(query: &str, vocabulary: &HashSet<String>) -> Vec<String> {
    let query = query.to_lowercase();
    let query_words: HashSet<&str> = query.split_whitespace().collect();

    let mut matched: Vec<String> = vocabulary
        .iter()
        .filter(|tag| {
            let lowered = tag.to_lowercase();
            let mut words = lowered.split_whitespace().peekable();
            words.peek().is_some() && words.all(|w| query_words.contains(w))
        })
        .cloned()
        .collect();
    matched.sort();
    matched.dedup();
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(tags: &[&str]) -> HashSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn greetings_get_canned_replies() {
        assert_eq!(greeting_reply("hi"), Some(HELLO_REPLY));
        assert_eq!(greeting_reply("Hello there"), Some(HELLO_REPLY));
        assert_eq!(greeting_reply("salam"), Some(SALAM_REPLY));
        assert_eq!(greeting_reply("thanks a lot"), Some(THANKS_REPLY));
        assert_eq!(greeting_reply("bye"), Some(BYE_REPLY));
        assert_eq!(greeting_reply("good morning"), Some(DEFAULT_GREETING_REPLY));
        assert_eq!(greeting_reply("how are you"), Some(DEFAULT_GREETING_REPLY));
        assert_eq!(greeting_reply("  !?  "), Some(DEFAULT_GREETING_REPLY));
    }

    #[test]
    fn search_queries_are_not_greetings() {
        assert_eq!(greeting_reply("show me sedans"), None);
        assert_eq!(greeting_reply("top 5 cheapest cars"), None);
    }

    #[test]
    fn greeting_rules_are_ordered() {
        // "hey, how are you" hits the hello rule before the small-talk rule
        assert_eq!(greeting_reply("hey, how are you"), Some(HELLO_REPLY));
    }

    #[test]
    fn top_n_parsing() {
        assert_eq!(parse_top_n("show me top 5 cars"), Some(5));
        assert_eq!(parse_top_n("TOP10 cars"), Some(10));
        assert_eq!(parse_top_n("show me cars"), None);
    }

    #[test]
    fn limit_clamped_to_bounds() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(100)), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
    }

    #[test]
    fn trigger_keywords_gate_intent_search() {
        assert!(has_search_trigger("show me something"));
        assert!(has_search_trigger("latest models"));
        // substring containment: "cars" contains "car"
        assert!(has_search_trigger("cars under 10k"));
        assert!(!has_search_trigger("weather tomorrow?"));
    }

    #[test]
    fn sort_classification_buckets() {
        assert!(matches!(classify_sort("latest arrivals"), CarOrder::Recency));
        assert!(matches!(
            classify_sort("luxury rides"),
            CarOrder::Scalar(SortColumn::Price, SortDirection::Desc)
        ));
        assert!(matches!(
            classify_sort("budget options"),
            CarOrder::Scalar(SortColumn::Price, SortDirection::Asc)
        ));
        assert!(matches!(
            classify_sort("classic vehicles"),
            CarOrder::Scalar(SortColumn::Year, SortDirection::Asc)
        ));
        // default bucket
        assert!(matches!(classify_sort("family suv"), CarOrder::Recency));
    }

    #[test]
    fn sort_rules_first_match_wins() {
        // "latest" outranks "expensive" because its rule comes first
        assert!(matches!(
            classify_sort("latest expensive cars"),
            CarOrder::Recency
        ));
    }

    #[test]
    fn reconciles_single_word_feature() {
        let vocabulary = vocab(&["sunroof", "navigation"]);
        let matched = reconcile_features("show me cars with sunroof", &vocabulary);
        assert_eq!(matched, vec!["sunroof"]);
    }

    #[test]
    fn reconciles_multiword_feature_in_any_order() {
        let vocabulary = vocab(&["heated seats", "backup camera"]);
        let matched = reconcile_features("seats that are heated please", &vocabulary);
        assert_eq!(matched, vec!["heated seats"]);
    }

    #[test]
    fn no_partial_word_matches() {
        // "sunroofs" is a different token than "sunroof"; subset containment
        // is word-exact, not edit-distance
        let vocabulary = vocab(&["sunroof"]);
        assert!(reconcile_features("cars with sunroofs", &vocabulary).is_empty());
    }

    #[test]
    fn reconciliation_is_case_insensitive_and_sorted() {
        let vocabulary = vocab(&["Sunroof", "Heated Seats"]);
        let matched = reconcile_features("HEATED sunroof SEATS", &vocabulary);
        assert_eq!(matched, vec!["Heated Seats", "Sunroof"]);
    }

    #[test]
    fn empty_vocabulary_matches_nothing() {
        assert!(reconcile_features("sunroof", &HashSet::new()).is_empty());
    }
}
