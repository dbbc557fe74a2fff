//! Field normalizers
//!
//! Pure, total functions that turn board text into canonical values. None
//! of them can fail: unrecognized input maps to a documented fallback so a
//! single malformed title never aborts a run.

pub mod category;
pub(crate) mod pattern;
pub mod date;
pub mod price;
pub mod seller;
pub mod text;

pub use category::{infer_category, infer_hardware_category, normalize_category_label};
pub use date::{kst_offset, parse_post_date, try_parse_post_date};
pub use price::{PriceRules, parse_discount_rate, parse_price, parse_price_with_rules};
pub use seller::{extract_seller, is_free_shipping, parse_store};
pub use text::{
    clean_title, decode_html_entities, generate_deal_id, parse_count, strip_store_prefix,
};
