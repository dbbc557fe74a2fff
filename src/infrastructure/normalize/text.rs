//! Title text cleanup, counters and ids

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use super::pattern::Pattern;

static TRAILING_COMMENT_COUNT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*\[\d+\]\s*$"));
static WHITESPACE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s+"));
static LEADING_STORE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"^\s*[\[(][^\])]*[\])]\s*"));
static COUNT: Lazy<Pattern> =
    Lazy::new(|| Pattern::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kKmM만천])?"));

// &amp; goes last so "&amp;lt;" decodes to "&lt;" and not "<"
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#039;", "'"),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&amp;", "&"),
];

pub fn decode_html_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

/// Drop the trailing `[12]` comment counter, decode entities, collapse spaces
pub fn clean_title(raw: &str) -> String {
    let without_counter = TRAILING_COMMENT_COUNT.replace_all(raw, "");
    let decoded = decode_html_entities(&without_counter);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

/// Title without its leading `[store]` label
pub fn strip_store_prefix(title: &str) -> String {
    LEADING_STORE.replace_all(title, "").trim().to_string()
}

/// Board counters: `"1,234"`, `"1.2k"`, `"3.4m"`, `"1.5만"`. Garbage is 0.
///
/// Only the first number counts, so `"5 - 1"` (likes minus dislikes) is 5.
pub fn parse_count(text: &str) -> u64 {
    let Some(caps) = COUNT.captures(text) else {
        return 0;
    };
    let Some(value) = caps
        .get(1)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
    else {
        return 0;
    };
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k" | "K" | "천") => 1_000.0,
        Some("m" | "M") => 1_000_000.0,
        Some("만") => 10_000.0,
        _ => 1.0,
    };
    (value * multiplier).round() as u64
}

/// `hotdeal_{unix_millis}_{post_id}`
pub fn generate_deal_id(source_post_id: &str, now: DateTime<Utc>) -> String {
    format!("hotdeal_{}_{}", now.timestamp_millis(), source_post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("  [쿠팡]  생수   2L [12] ", "[쿠팡] 생수 2L")]
    #[case("Tom &amp; Jerry &lt;DVD&gt;", "Tom & Jerry <DVD>")]
    #[case("&quot;한정&quot;&nbsp;특가", "\"한정\" 특가")]
    #[case("[3] 번째 글", "[3] 번째 글")]
    fn titles_are_cleaned(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_title(raw), expected);
    }

    #[test]
    fn double_escaped_ampersand_decodes_once() {
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn store_prefix_is_stripped() {
        assert_eq!(strip_store_prefix("[G마켓] 라면 모음"), "라면 모음");
        assert_eq!(strip_store_prefix("라면 [G마켓]"), "라면 [G마켓]");
    }

    #[rstest]
    #[case("1,234", 1_234)]
    #[case("1.2k", 1_200)]
    #[case("3.4m", 3_400_000)]
    #[case("1.5만", 15_000)]
    #[case("조회 87", 87)]
    #[case("5 - 1", 5)]
    #[case("-", 0)]
    #[case("", 0)]
    fn counters_are_parsed(#[case] text: &str, #[case] expected: u64) {
        assert_eq!(parse_count(text), expected);
    }

    #[test]
    fn deal_id_embeds_millis_and_post_id() {
        let now = Utc.timestamp_millis_opt(1_752_300_000_123).unwrap();
        assert_eq!(generate_deal_id("4821", now), "hotdeal_1752300000123_4821");
    }

    proptest! {
        #[test]
        fn text_helpers_are_total(text in "\\PC*") {
            let _ = parse_count(&text);
            let cleaned = clean_title(&text);
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        }
    }
}
