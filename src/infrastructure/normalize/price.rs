//! Price extraction from titles and price cells

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::pattern::Pattern;
use crate::domain::deal::PriceValue;

// A group of digits with thousands separators, or a plain run of digits.
// Separated groups come first so "13,900" is not read as "900".
const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?";

fn cascade(templates: &[&str]) -> Vec<Pattern> {
    templates
        .iter()
        .map(|template| Pattern::new(&template.replace("{AMOUNT}", AMOUNT)))
        .collect()
}

static STANDARD_CASCADE: Lazy<Vec<Pattern>> = Lazy::new(|| {
    cascade(&[
        r"{AMOUNT}\s*원",
        r"\({AMOUNT}[/\s]",
        r"[￦₩]\s*{AMOUNT}",
        r"{AMOUNT}\s*/",
        r"(\d{4,})",
    ])
});

static VARIES_AWARE_CASCADE: Lazy<Vec<Pattern>> = Lazy::new(|| {
    cascade(&[
        r"{AMOUNT}\s*원",
        r"[￦₩]\s*{AMOUNT}",
        r"{AMOUNT}\s*~",
        r"\({AMOUNT}[원)]",
        r"\({AMOUNT}[/\s]",
        r"{AMOUNT}\s*/",
        r"(\d{4,})",
    ])
});

static GENERIC_CASCADE: Lazy<Vec<Pattern>> = Lazy::new(|| {
    cascade(&[
        r"{AMOUNT}\s*원",
        r"[￦₩]\s*{AMOUNT}",
        r"{AMOUNT}\s*~",
        r"\({AMOUNT}[원)]",
        r"\({AMOUNT}[/\s]",
        r"{AMOUNT}\s*/",
        r"{AMOUNT}\s*\$",
        r"\$\s*{AMOUNT}",
        r"(\d{4,})",
    ])
});

static VARIES_PHRASE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)다양|various|varied"));

static PROMO_PHRASE: Lazy<Pattern> =
    Lazy::new(|| Pattern::new(r"(?i)이벤트|event|쿠폰|coupon|프로모션|promotion|추첨|경품"));

static FREE_PHRASE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)무료|free"));

static DISCOUNT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d{1,2})(?:\.\d+)?\s*%"));

/// Which cascade a board's titles need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceRules {
    /// `N원`, `(N/…`, `￦N`, `N/`, bare 4+ digits
    #[default]
    Standard,
    /// Adds "price varies" phrasing, ranges and promotion handling
    VariesAware,
    /// Varies-aware, plus `N$` and `$N` amounts; configurable boards
    Generic,
}

fn first_amount(text: &str, cascade: &[Pattern]) -> Option<u64> {
    cascade.iter().find_map(|pattern| {
        pattern
            .capture(text)
            .and_then(|digits| digits.replace(',', "").parse::<u64>().ok())
            .filter(|amount| *amount > 0)
    })
}

/// Standard cascade; a title with no recognizable price is `NotFound`
pub fn parse_price(text: &str) -> PriceValue {
    first_amount(text, &STANDARD_CASCADE).map_or(PriceValue::NotFound, PriceValue::Amount)
}

pub fn parse_price_with_rules(text: &str, rules: PriceRules) -> PriceValue {
    match rules {
        PriceRules::Standard => parse_price(text),
        PriceRules::VariesAware => varies_aware(text, &VARIES_AWARE_CASCADE),
        PriceRules::Generic => varies_aware(text, &GENERIC_CASCADE),
    }
}

fn varies_aware(text: &str, cascade: &[Pattern]) -> PriceValue {
    if VARIES_PHRASE.is_match(text) {
        return PriceValue::Varies;
    }
    if let Some(amount) = first_amount(text, cascade) {
        return PriceValue::Amount(amount);
    }
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    if PROMO_PHRASE.is_match(text) || (!has_digit && FREE_PHRASE.is_match(text)) {
        PriceValue::NotFound
    } else {
        PriceValue::Varies
    }
}

/// `"30% 할인"` → 30; no percentage → 0
pub fn parse_discount_rate(text: &str) -> u8 {
    DISCOUNT
        .capture(text)
        .and_then(|digits| digits.parse::<u8>().ok())
        .filter(|rate| *rate < 100)
        .unwrap_or(0)
}
