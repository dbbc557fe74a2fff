//! Detail page content and images

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{CompiledField, FieldSpec, compile_one, compile_selectors, element_text, resolve_url};
use crate::domain::listing::DetailEnrichment;
use crate::infrastructure::error::CrawlerResult;
use crate::infrastructure::normalize::date::try_parse_post_date;
use crate::infrastructure::normalize::pattern::Pattern;

/// Tried after a board's own content selectors
pub const GENERIC_CONTENT_SELECTORS: &[&str] = &[
    ".view_content",
    ".post-content",
    ".board_content",
    ".article_content",
    ".content_view",
    ".xe_content",
    "article",
    "#content",
];

/// Text containing any of these is page chrome, not a post body
const CHROME_MARKERS: &[&str] = &["로그인", "회원가입", "검색", "광고"];

const MIN_CONTENT_CHARS: usize = 20;
const FALLBACK_MIN_CHARS: usize = 50;
const FALLBACK_MAX_CHILDREN: usize = 10;

static NUMERIC_ID: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(\d{5,})"));
static DATE_TOKEN: Lazy<Pattern> =
    Lazy::new(|| Pattern::new(r"(20\d{2}[/_-]?(?:0[1-9]|1[0-2])[/_-]?(?:0[1-9]|[12]\d|3[01]))"));

/// Which `<img>` sources count as post images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRules {
    pub extensions: Vec<String>,
    /// Case-insensitive substrings that mark icons and decorations
    pub excluded_keywords: Vec<String>,
    /// Hosts/paths preferred when matching the listing thumbnail
    pub preferred_prefixes: Vec<String>,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_keywords: ["icon", "emoticon", "menu", "logo", "share", "smilie"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preferred_prefixes: Vec::new(),
        }
    }
}

impl ImageRules {
    /// Also rejects listing-size thumbnails
    #[must_use]
    pub fn excluding_thumbnails(mut self) -> Self {
        self.excluded_keywords.push("thumb".to_string());
        self
    }

    #[must_use]
    pub fn preferring(mut self, prefixes: &[&str]) -> Self {
        self.preferred_prefixes = prefixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn accepts(&self, src: &str) -> bool {
        let lowered = src.to_lowercase();
        let path = lowered.split(['?', '#']).next().unwrap_or_default();
        let has_extension = self
            .extensions
            .iter()
            .any(|ext| path.ends_with(&format!(".{ext}")) || lowered.contains(&format!(".{ext}?")));
        has_extension && !self.excluded_keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Declarative detail page table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    /// Board-specific content selectors; generic ones are appended
    pub content: Vec<String>,
    pub date: Option<FieldSpec>,
    pub images: ImageRules,
}

#[derive(Debug)]
pub struct DetailExtractor {
    content: Vec<Selector>,
    date: Option<CompiledField>,
    images: ImageRules,
    img: Selector,
    any: Selector,
}

impl DetailExtractor {
    pub fn compile(selectors: &DetailSelectors) -> CrawlerResult<Self> {
        let mut content = selectors.content.clone();
        for generic in GENERIC_CONTENT_SELECTORS {
            if !content.iter().any(|c| c == generic) {
                content.push((*generic).to_string());
            }
        }
        Ok(Self {
            content: compile_selectors(&content)?,
            date: CompiledField::compile_optional(selectors.date.as_ref())?,
            images: selectors.images.clone(),
            img: compile_one("img")?,
            any: compile_one("body *")?,
        })
    }

    fn looks_like_chrome(text: &str) -> bool {
        CHROME_MARKERS.iter().any(|marker| text.contains(marker))
    }

    fn content_element<'a>(&self, document: &'a Html) -> Option<(ElementRef<'a>, String)> {
        self.content.iter().find_map(|selector| {
            document.select(selector).find_map(|el| {
                let text = element_text(el);
                (text.chars().count() > MIN_CONTENT_CHARS && !Self::looks_like_chrome(&text))
                    .then_some((el, text))
            })
        })
    }

    /// Longest text block with few children, when no selector matched
    fn longest_block(&self, document: &Html) -> Option<String> {
        document
            .select(&self.any)
            .filter(|el| !matches!(el.value().name(), "script" | "style" | "noscript"))
            .filter(|el| {
                el.children().filter(|c| c.value().is_element()).count() < FALLBACK_MAX_CHILDREN
            })
            .map(element_text)
            .filter(|text| text.chars().count() > FALLBACK_MIN_CHARS && !text.contains("로그인"))
            .max_by_key(|text| text.chars().count())
    }

    fn images(&self, scope: ElementRef<'_>, base: &Url) -> Vec<String> {
        let mut images: Vec<String> = Vec::new();
        for img in scope.select(&self.img) {
            let src = ["data-original", "data-src", "src"]
                .iter()
                .find_map(|attr| img.value().attr(attr))
                .and_then(|src| resolve_url(base, src));
            if let Some(src) = src {
                if self.images.accepts(&src) && !images.contains(&src) {
                    images.push(src);
                }
            }
        }
        images
    }

    /// Content, images and timestamp. Never fails: a page without a usable
    /// body yields an empty enrichment.
    pub fn extract(
        &self,
        html: &str,
        base: &Url,
        thumbnail: Option<&str>,
        now: DateTime<Utc>,
    ) -> DetailEnrichment {
        let document = Html::parse_document(html);

        let matched = self.content_element(&document);
        let (content, mut images) = match &matched {
            Some((element, text)) => (Some(text.clone()), self.images(*element, base)),
            None => (self.longest_block(&document), Vec::new()),
        };

        if let Some(primary) =
            pick_primary_image(&images, thumbnail, &self.images.preferred_prefixes)
        {
            images.retain(|image| *image != primary);
            images.insert(0, primary);
        }

        let posted_at = self
            .date
            .as_ref()
            .and_then(|field| field.read(document.root_element()))
            .and_then(|text| try_parse_post_date(&text, now));

        debug!(
            "Detail extracted: {} chars, {} images",
            content.as_ref().map_or(0, |c| c.chars().count()),
            images.len()
        );

        DetailEnrichment {
            content,
            images,
            posted_at,
        }
    }
}

fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Image that best represents the listing thumbnail.
///
/// Preference: same numeric id in the file name, then same date token,
/// then a preferred path prefix, then the first candidate.
pub fn pick_primary_image(
    images: &[String],
    thumbnail: Option<&str>,
    preferred_prefixes: &[String],
) -> Option<String> {
    if images.is_empty() {
        return None;
    }

    if let Some(thumbnail) = thumbnail {
        if let Some(id) = NUMERIC_ID.capture(file_name(thumbnail)) {
            if let Some(found) = images.iter().find(|image| file_name(image).contains(id)) {
                return Some(found.clone());
            }
        }
        if let Some(token) = DATE_TOKEN.capture(thumbnail) {
            if let Some(found) = images.iter().find(|image| image.contains(token)) {
                return Some(found.clone());
            }
        }
    }

    preferred_prefixes
        .iter()
        .find_map(|prefix| images.iter().find(|image| image.starts_with(prefix.as_str())))
        .or_else(|| images.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://bbs.example.com/market/read/1").unwrap()
    }

    #[test]
    fn first_real_content_block_wins_over_chrome() {
        let extractor = DetailExtractor::compile(&DetailSelectors {
            content: vec![".nav".into(), ".board_main_view".into()],
            ..DetailSelectors::default()
        })
        .unwrap();
        let html = r#"<html><body>
            <div class="nav">로그인 회원가입 검색 메뉴가 길게 이어지는 영역입니다</div>
            <div class="board_main_view">
              <p>쿠팡에서 생수 2L 12개를 5,990원에 판매합니다. 로켓배송.</p>
              <img src="/img/icon_new.png">
              <img src="https://cdn.example.com/data/2025/07/11/deal_1.jpg">
              <img src="https://cdn.example.com/data/2025/07/11/deal_1.jpg">
              <img src="https://cdn.example.com/data/file.pdf">
            </div></body></html>"#;

        let detail = extractor.extract(html, &base(), None, Utc::now());
        assert!(detail.content.unwrap().starts_with("쿠팡에서 생수"));
        assert_eq!(detail.images, vec!["https://cdn.example.com/data/2025/07/11/deal_1.jpg"]);
    }

    #[test]
    fn falls_back_to_longest_plain_block() {
        let extractor = DetailExtractor::compile(&DetailSelectors::default()).unwrap();
        let body = "가".repeat(80);
        let html = format!("<html><body><div><span>짧음</span></div><section>{body}</section></body></html>");
        let detail = extractor.extract(&html, &base(), None, Utc::now());
        assert_eq!(detail.content.as_deref(), Some(body.as_str()));
        assert!(detail.images.is_empty());
    }

    #[test]
    fn page_without_text_is_empty_enrichment() {
        let extractor = DetailExtractor::compile(&DetailSelectors::default()).unwrap();
        let detail = extractor.extract("<html><body></body></html>", &base(), None, Utc::now());
        assert!(detail.is_empty());
    }

    #[test]
    fn thumbnail_id_then_date_then_prefix() {
        let images: Vec<String> = vec![
            "https://a.com/x/banner.jpg".into(),
            "https://cdn.com/2025/0711/other.jpg".into(),
            "https://b.com/up/98765_large.jpg".into(),
        ];
        assert_eq!(
            pick_primary_image(&images, Some("https://t.com/thumb/98765.jpg"), &[]).as_deref(),
            Some("https://b.com/up/98765_large.jpg")
        );
        assert_eq!(
            pick_primary_image(&images, Some("https://t.com/2025/0711/t.jpg"), &[]).as_deref(),
            Some("https://cdn.com/2025/0711/other.jpg")
        );
        assert_eq!(
            pick_primary_image(&images, None, &["https://b.com/".to_string()]).as_deref(),
            Some("https://b.com/up/98765_large.jpg")
        );
        assert_eq!(
            pick_primary_image(&images, None, &[]).as_deref(),
            Some("https://a.com/x/banner.jpg")
        );
        assert_eq!(pick_primary_image(&[], Some("x"), &[]), None);
    }

    #[test]
    fn image_rules_reject_icons_and_thumbnails() {
        let rules = ImageRules::default().excluding_thumbnails();
        assert!(rules.accepts("https://a.com/p/photo.JPG"));
        assert!(rules.accepts("https://a.com/p/photo.webp?w=800"));
        assert!(!rules.accepts("https://a.com/p/logo.png"));
        assert!(!rules.accepts("https://a.com/thumb/p.png"));
        assert!(!rules.accepts("https://a.com/p/file"));
    }
}
