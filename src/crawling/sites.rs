//! Board definitions
//!
//! Each module returns the `SourceConfig` for one board. Tables follow the
//! boards' live markup and are the first thing to touch when a board
//! redesigns its pages.

pub mod clien;
pub mod coolenjoy;
pub mod eomisae;
pub mod itcm;
pub mod ppomppu;
pub mod quasarzone;
pub mod ruliweb;

/// `&["a", "b"]` → owned selector list
pub(crate) fn selectors(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
