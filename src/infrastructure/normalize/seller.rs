//! Seller and shipping detection

use once_cell::sync::Lazy;

use super::pattern::Pattern;

pub const DEFAULT_SELLER: &str = "기타";

/// Known storefronts: canonical name first, then the spellings boards use
const KNOWN_SELLERS: &[&[&str]] = &[
    &["쿠팡", "coupang"],
    &["G마켓", "gmarket", "지마켓"],
    &["11번가", "11st"],
    &["옥션", "auction"],
    &["위메프", "wemakeprice"],
    &["티몬", "tmon"],
    &["SSG", "신세계"],
    &["네이버", "naver", "네이버쇼핑"],
    &["인터파크", "interpark"],
    &["GS샵", "gs shop", "gsshop"],
    &["롯데온", "lotteon", "롯데몰"],
    &["마켓컬리", "kurly", "컬리"],
    &["무신사", "musinsa"],
    &["알리익스프레스", "aliexpress", "알리"],
    &["아마존", "amazon"],
    &["이베이", "ebay"],
    &["다나와", "danawa"],
    &["에누리", "enuri"],
];

const FREE_SHIPPING_KEYWORDS: &[&str] = &[
    "무료",
    "무배",
    "무료배송",
    "배송비무료",
    "배송비 무료",
    "배송료 무료",
    "택배비 무료",
    "free shipping",
    "free delivery",
];

static SELLER_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    vec![
        Pattern::new(r"[\[(]([^\])]+)[\])]"),
        Pattern::new(r"^([^:]+)\s*:"),
        Pattern::new(r"-\s*([^\-]+)$"),
    ]
});

static LEADING_BRACKET: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"^\s*[\[(]([^\])]+)[\])]"));

/// Canonical name of a known storefront mentioned by `candidate`
fn known_seller(candidate: &str) -> Option<&'static str> {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return None;
    }
    // Single letters ("(M)" size tags) would match inside most aliases
    let reverse = candidate.chars().count() >= 2;
    KNOWN_SELLERS.iter().find_map(|aliases| {
        aliases
            .iter()
            .any(|alias| {
                let alias = alias.to_lowercase();
                candidate.contains(&alias) || (reverse && alias.contains(&candidate))
            })
            .then(|| aliases[0])
    })
}

/// Seller named in the title, checked against the known storefronts.
///
/// `"[쿠팡] 생수"` → 쿠팡, `"지마켓: 라면"` → G마켓; anything unrecognized
/// resolves to `default`.
pub fn extract_seller(title: &str, default: &str) -> String {
    SELLER_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.capture(title))
        .find_map(known_seller)
        .unwrap_or(default)
        .to_string()
}

/// Leading `[store]` / `(store)` label, whatever it says
pub fn parse_store(title: &str) -> Option<String> {
    LEADING_BRACKET
        .capture(title)
        .map(str::trim)
        .filter(|store| !store.is_empty())
        .map(str::to_string)
}

pub fn is_free_shipping(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FREE_SHIPPING_KEYWORDS.iter().any(|k| lowered.contains(k))
}
