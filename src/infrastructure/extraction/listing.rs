//! Listing rows from a board index snapshot

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use super::{CompiledField, FieldSpec, compile_selectors, resolve_url};
use crate::domain::listing::RawListItem;
use crate::infrastructure::error::CrawlerResult;
use crate::infrastructure::normalize::pattern::Pattern;

static TRAILING_DIGITS: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d+)\D*$"));

/// Declarative selector table for one board's listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// Row selectors, tried in order until one yields rows
    pub rows: Vec<String>,
    /// Rows carrying any of these classes are notices and get skipped
    pub skip_row_classes: Vec<String>,
    /// Rows containing a match for this selector are skipped
    pub skip_row_marker: Option<String>,
    /// Rows without a match for this selector are skipped
    pub require_row_marker: Option<String>,
    /// Rows carrying any of these classes are ended deals
    pub ended_row_classes: Vec<String>,
    pub title: FieldSpec,
    pub link: FieldSpec,
    /// Falls back to the last number in the link
    pub post_id: Option<FieldSpec>,
    pub author: Option<FieldSpec>,
    pub category: Option<FieldSpec>,
    pub views: Option<FieldSpec>,
    pub likes: Option<FieldSpec>,
    pub comments: Option<FieldSpec>,
    pub date: Option<FieldSpec>,
    pub price: Option<FieldSpec>,
    pub shipping: Option<FieldSpec>,
    /// A match marks the row as ended (with a pattern, the pattern must hit)
    pub ended: Option<FieldSpec>,
    pub thumbnail: Option<FieldSpec>,
}

/// Compiled [`ListingSelectors`]
#[derive(Debug)]
pub struct ListingExtractor {
    rows: Vec<Selector>,
    skip_row_classes: Vec<String>,
    skip_row_marker: Option<Selector>,
    require_row_marker: Option<Selector>,
    ended_row_classes: Vec<String>,
    title: CompiledField,
    link: CompiledField,
    post_id: Option<CompiledField>,
    author: Option<CompiledField>,
    category: Option<CompiledField>,
    views: Option<CompiledField>,
    likes: Option<CompiledField>,
    comments: Option<CompiledField>,
    date: Option<CompiledField>,
    price: Option<CompiledField>,
    shipping: Option<CompiledField>,
    ended: Option<CompiledField>,
    thumbnail: Option<CompiledField>,
}

fn read(field: Option<&CompiledField>, row: ElementRef<'_>) -> Option<String> {
    field.and_then(|f| f.read(row))
}

impl ListingExtractor {
    pub fn compile(selectors: &ListingSelectors) -> CrawlerResult<Self> {
        let optional = CompiledField::compile_optional;
        Ok(Self {
            rows: compile_selectors(&selectors.rows)?,
            skip_row_classes: selectors.skip_row_classes.clone(),
            skip_row_marker: selectors
                .skip_row_marker
                .as_deref()
                .map(super::compile_one)
                .transpose()?,
            require_row_marker: selectors
                .require_row_marker
                .as_deref()
                .map(super::compile_one)
                .transpose()?,
            ended_row_classes: selectors.ended_row_classes.clone(),
            title: CompiledField::compile(&selectors.title)?,
            link: CompiledField::compile(&selectors.link)?,
            post_id: optional(selectors.post_id.as_ref())?,
            author: optional(selectors.author.as_ref())?,
            category: optional(selectors.category.as_ref())?,
            views: optional(selectors.views.as_ref())?,
            likes: optional(selectors.likes.as_ref())?,
            comments: optional(selectors.comments.as_ref())?,
            date: optional(selectors.date.as_ref())?,
            price: optional(selectors.price.as_ref())?,
            shipping: optional(selectors.shipping.as_ref())?,
            ended: optional(selectors.ended.as_ref())?,
            thumbnail: optional(selectors.thumbnail.as_ref())?,
        })
    }

    fn rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.rows {
            let rows: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !rows.is_empty() {
                return rows;
            }
        }
        Vec::new()
    }

    fn has_class(row: ElementRef<'_>, classes: &[String]) -> bool {
        row.value()
            .classes()
            .any(|class| classes.iter().any(|c| c == class))
    }

    /// Rows in page order. Notices and rows without title or link are dropped.
    pub fn extract(&self, html: &str, base: &Url) -> Vec<RawListItem> {
        let document = Html::parse_document(html);
        let rows = self.rows(&document);
        debug!("Found {} candidate rows", rows.len());

        let items: Vec<RawListItem> = rows
            .into_iter()
            .filter_map(|row| self.extract_row(row, base))
            .collect();
        debug!("Extracted {} listing items", items.len());
        items
    }

    fn extract_row(&self, row: ElementRef<'_>, base: &Url) -> Option<RawListItem> {
        if Self::has_class(row, &self.skip_row_classes) {
            trace!("Skipping notice row");
            return None;
        }
        if let Some(marker) = &self.skip_row_marker {
            if row.select(marker).next().is_some() {
                trace!("Skipping pinned row");
                return None;
            }
        }
        if let Some(marker) = &self.require_row_marker {
            if row.select(marker).next().is_none() {
                return None;
            }
        }

        let title = self.title.read(row)?;
        let url = self.link.read(row).and_then(|href| resolve_url(base, &href))?;
        let source_post_id = read(self.post_id.as_ref(), row)
            .or_else(|| TRAILING_DIGITS.capture(&url).map(str::to_string))?;

        let is_ended = Self::has_class(row, &self.ended_row_classes)
            || self.ended.as_ref().is_some_and(|field| field.is_present(row));

        Some(RawListItem {
            source_post_id,
            title,
            url,
            author: read(self.author.as_ref(), row),
            views_text: read(self.views.as_ref(), row),
            likes_text: read(self.likes.as_ref(), row),
            comments_text: read(self.comments.as_ref(), row),
            category_text: read(self.category.as_ref(), row),
            date_text: read(self.date.as_ref(), row),
            price_text: read(self.price.as_ref(), row),
            shipping_text: read(self.shipping.as_ref(), row),
            is_ended,
            thumbnail: read(self.thumbnail.as_ref(), row).and_then(|src| resolve_url(base, &src)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> ListingSelectors {
        ListingSelectors {
            rows: vec!["table.missing tr".into(), "ul.board li".into()],
            skip_row_classes: vec!["notice".into()],
            ended_row_classes: vec!["sold_out".into()],
            title: FieldSpec::css("a.subject"),
            link: FieldSpec::attr("a.subject", "href"),
            views: Some(FieldSpec::css(".hit")),
            date: Some(FieldSpec::css(".time")),
            thumbnail: Some(FieldSpec::attr("img", "src")),
            ended: Some(FieldSpec::css(".label").with_pattern("(종료)")),
            ..ListingSelectors::default()
        }
    }

    const PAGE: &str = r#"
      <ul class="board">
        <li class="notice"><a class="subject" href="/b/1">공지</a></li>
        <li><a class="subject" href="/b/101">[쿠팡] 생수 (5,990원/무료)</a>
            <span class="hit">1,234</span><span class="time">07-11</span>
            <img src="//img.example.com/t/101.jpg"></li>
        <li class="sold_out"><a class="subject" href="/b/100">품절된 글</a></li>
        <li><a class="subject" href="/b/99">종료 라벨</a><span class="label">종료</span></li>
        <li><a class="subject" href="javascript:void(0)">링크 없음</a></li>
        <li><span class="subject"></span></li>
      </ul>"#;

    #[test]
    fn rows_keep_page_order_and_skip_notices() {
        let extractor = ListingExtractor::compile(&board()).unwrap();
        let base = Url::parse("https://example.com/b").unwrap();
        let items = extractor.extract(PAGE, &base);

        let ids: Vec<&str> = items.iter().map(|i| i.source_post_id.as_str()).collect();
        assert_eq!(ids, vec!["101", "100", "99"]);

        let first = &items[0];
        assert_eq!(first.url, "https://example.com/b/101");
        assert_eq!(first.views_text.as_deref(), Some("1,234"));
        assert_eq!(first.date_text.as_deref(), Some("07-11"));
        assert_eq!(first.thumbnail.as_deref(), Some("https://img.example.com/t/101.jpg"));
        assert!(!first.is_ended);
        assert!(items[1].is_ended);
        assert!(items[2].is_ended);
    }

    #[test]
    fn missing_container_yields_no_rows() {
        let extractor = ListingExtractor::compile(&board()).unwrap();
        let base = Url::parse("https://example.com/b").unwrap();
        assert!(extractor.extract("<html><body>점검중</body></html>", &base).is_empty());
    }
}
