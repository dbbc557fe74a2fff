//! Page extraction bridge
//!
//! Turns a serialized DOM snapshot into plain data. Nothing here touches
//! the browser: a driver hands over `content()` and these functions parse
//! it with `scraper`, so extraction is a pure `(html) -> records` step that
//! can run against fixtures.

pub mod detail;
pub mod listing;

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::infrastructure::error::{CrawlerError, CrawlerResult};

pub use detail::{DetailExtractor, DetailSelectors, ImageRules, pick_primary_image};
pub use listing::{ListingExtractor, ListingSelectors};

/// How to read one value relative to a row (or a detail page)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Tried in order; the first one with a match wins. Empty reads the row itself.
    pub selectors: Vec<String>,
    /// Attribute to read instead of the element text
    pub attr: Option<String>,
    /// Regex whose first group (or whole match) becomes the value
    pub pattern: Option<String>,
    /// Which match to take, 0-based
    pub nth: usize,
    /// Only elements containing this child count as matches
    pub has: Option<String>,
}

impl FieldSpec {
    pub fn css(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            ..Self::default()
        }
    }

    /// Ordered fallbacks for the same field
    pub fn any_of(selectors: &[&str]) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            attr: Some(attr.to_string()),
            ..Self::css(selector)
        }
    }

    /// Attribute of the row element itself
    pub fn row_attr(attr: &str) -> Self {
        Self {
            attr: Some(attr.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    #[must_use]
    pub const fn nth(mut self, index: usize) -> Self {
        self.nth = index;
        self
    }

    #[must_use]
    pub fn having(mut self, child: &str) -> Self {
        self.has = Some(child.to_string());
        self
    }
}

/// Compile selector strings, skipping broken ones. Fails only when none compile.
pub fn compile_selectors(selector_strings: &[String]) -> CrawlerResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{}': {}", selector_str, e));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(CrawlerError::invalid_selector(
            &selector_strings.join(", "),
            errors.join(", "),
        ));
    }

    if !errors.is_empty() {
        debug!("Some selectors failed to compile: {}", errors.join(", "));
    }

    Ok(selectors)
}

pub(crate) fn compile_one(selector: &str) -> CrawlerResult<Selector> {
    Selector::parse(selector).map_err(|e| CrawlerError::invalid_selector(selector, e.to_string()))
}

/// A [`FieldSpec`] ready to run
#[derive(Debug)]
pub struct CompiledField {
    selectors: Vec<Selector>,
    attr: Option<String>,
    pattern: Option<Regex>,
    nth: usize,
    has: Option<Selector>,
}

impl CompiledField {
    pub fn compile(spec: &FieldSpec) -> CrawlerResult<Self> {
        let pattern = spec
            .pattern
            .as_deref()
            .map(|p| Regex::new(p).map_err(|e| CrawlerError::invalid_selector(p, e.to_string())))
            .transpose()?;
        let has = spec.has.as_deref().map(compile_one).transpose()?;
        Ok(Self {
            selectors: compile_selectors(&spec.selectors)?,
            attr: spec.attr.clone(),
            pattern,
            nth: spec.nth,
            has,
        })
    }

    pub fn compile_optional(spec: Option<&FieldSpec>) -> CrawlerResult<Option<Self>> {
        spec.map(Self::compile).transpose()
    }

    fn matches<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        if self.selectors.is_empty() {
            return vec![scope];
        }
        for selector in &self.selectors {
            let found: Vec<ElementRef<'a>> = scope
                .select(selector)
                .filter(|el| {
                    self.has
                        .as_ref()
                        .is_none_or(|child| el.select(child).next().is_some())
                })
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Matched element, for callers that need more than a string
    pub fn element<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.matches(scope).into_iter().nth(self.nth)
    }

    /// Marker check: a match is enough unless a pattern must also hit
    pub fn is_present(&self, scope: ElementRef<'_>) -> bool {
        match self.pattern {
            Some(_) => self.read(scope).is_some(),
            None => self.element(scope).is_some(),
        }
    }

    /// Trimmed, non-empty value
    pub fn read(&self, scope: ElementRef<'_>) -> Option<String> {
        let element = self.element(scope)?;
        let raw = match &self.attr {
            Some(attr) => element.value().attr(attr)?.to_string(),
            None => element_text(element),
        };
        let value = match &self.pattern {
            Some(pattern) => {
                let caps = pattern.captures(&raw)?;
                caps.get(1).or_else(|| caps.get(0))?.as_str().to_string()
            }
            None => raw,
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Text content with whitespace runs collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Absolute http(s) URL for `href`, including protocol-relative `//host/...`
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href == "#" {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first_row(html: &str) -> (Html, Selector) {
        (Html::parse_fragment(html), Selector::parse("div.row").unwrap())
    }

    #[test]
    fn broken_selectors_are_skipped_until_none_remain() {
        let mixed = vec!["div..bad".to_string(), "div.ok".to_string()];
        assert_eq!(compile_selectors(&mixed).unwrap().len(), 1);

        let broken = vec!["div..bad".to_string()];
        assert!(matches!(
            compile_selectors(&broken),
            Err(CrawlerError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn field_reads_attr_pattern_and_nth() {
        let (doc, row_sel) = first_row(
            r#"<div class="row" data-id="77">
                 <a class="t" href="/views/4821?page=1">  제목   여기 </a>
                 <span class="c">1</span><span class="c">2</span>
               </div>"#,
        );
        let row = doc.select(&row_sel).next().unwrap();

        let title = CompiledField::compile(&FieldSpec::css("a.t")).unwrap();
        assert_eq!(title.read(row).as_deref(), Some("제목 여기"));

        let id =
            CompiledField::compile(&FieldSpec::attr("a.t", "href").with_pattern(r"/views/(\d+)"))
                .unwrap();
        assert_eq!(id.read(row).as_deref(), Some("4821"));

        let row_id = CompiledField::compile(&FieldSpec::row_attr("data-id")).unwrap();
        assert_eq!(row_id.read(row).as_deref(), Some("77"));

        let icon = CompiledField::compile(&FieldSpec::css("span.c")).unwrap();
        assert!(icon.is_present(row));
        let label = CompiledField::compile(&FieldSpec::css("span.c").with_pattern("(종료)")).unwrap();
        assert!(!label.is_present(row));

        let second = CompiledField::compile(&FieldSpec::css("span.c").nth(1)).unwrap();
        assert_eq!(second.read(row).as_deref(), Some("2"));
        let missing = CompiledField::compile(&FieldSpec::css("span.c").nth(5)).unwrap();
        assert_eq!(missing.read(row), None);
    }

    #[test]
    fn having_filters_by_child_icon() {
        let (doc, row_sel) = first_row(
            r#"<div class="row">
                 <span class="fr"><i class="ion-ios-eye"></i>120</span>
                 <span class="fr"><i class="ion-ios-heart"></i>7</span>
               </div>"#,
        );
        let row = doc.select(&row_sel).next().unwrap();
        let likes =
            CompiledField::compile(&FieldSpec::css("span.fr").having("i.ion-ios-heart")).unwrap();
        assert_eq!(likes.read(row).as_deref(), Some("7"));
    }

    #[test]
    fn urls_resolve_against_the_board() {
        let base = Url::parse("https://www.clien.net/service/board/jirum").unwrap();
        assert_eq!(
            resolve_url(&base, "/service/board/jirum/123").as_deref(),
            Some("https://www.clien.net/service/board/jirum/123")
        );
        assert_eq!(
            resolve_url(&base, "//img.clien.net/a.jpg").as_deref(),
            Some("https://img.clien.net/a.jpg")
        );
        assert_eq!(resolve_url(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_url(&base, ""), None);
    }
}
