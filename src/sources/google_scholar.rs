//! Google Scholar profile source implementation.
//!
//! Google Scholar does not have an official public API. Profile pages are
//! scraped, which may violate Google's Terms of Service. Prefer the OpenAlex
//! backend where possible.
//!
//! The profile lists at most 100 rows per request (`cstart`/`pagesize`), and
//! long titles or author lists are cut off with an ellipsis. The citation
//! detail page (`view_op=view_citation`) carries the untruncated values.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{AuthorStats, WorkIds, WorkRecord, WorkRecordBuilder};
use crate::sources::{
    BibliographicSource, PageRequest, PaginationMode, SourceCapabilities, SourceError, WorkDetail,
    WorksPage,
};
use crate::utils::HttpClient;

const GOOGLE_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Scholar serves a reduced page to unknown agents
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Google Scholar profile source
#[derive(Debug, Clone)]
pub struct ScholarProfileSource {
    client: HttpClient,
    base_url: String,
}

impl ScholarProfileSource {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: GOOGLE_SCHOLAR_URL.to_string(),
        }
    }

    /// Point the source at another host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn profile_page_url(&self, author_id: &str, start: usize, page_size: usize) -> String {
        format!(
            "{}/citations?user={}&hl=en&cstart={}&pagesize={}&sortby=pubdate",
            self.base_url,
            urlencoding::encode(author_id),
            start,
            page_size
        )
    }

    async fn fetch_html(&self, url: &str) -> Result<String, SourceError> {
        self.client
            .get_text(
                url,
                &[
                    ("User-Agent", BROWSER_USER_AGENT),
                    ("Accept", "text/html"),
                    ("Accept-Language", "en-US,en;q=0.9"),
                ],
            )
            .await
    }

    /// Resolve a relative Scholar href against the configured host
    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

#[async_trait]
impl BibliographicSource for ScholarProfileSource {
    fn id(&self) -> &str {
        "scholar"
    }

    fn name(&self) -> &str {
        "Google Scholar"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::AUTHOR_STATS | SourceCapabilities::WORKS | SourceCapabilities::WORK_DETAIL
    }

    fn pagination(&self) -> PaginationMode {
        PaginationMode::Offset
    }

    fn profile_url(&self, author_id: &str) -> Option<String> {
        Some(format!(
            "{}/citations?user={}",
            GOOGLE_SCHOLAR_URL,
            urlencoding::encode(author_id)
        ))
    }

    async fn fetch_author_stats(&self, author_id: &str) -> Result<AuthorStats, SourceError> {
        let url = self.profile_page_url(author_id, 0, super::PAGE_SIZE);
        let html = self.fetch_html(&url).await?;
        parse_stats(&html)
    }

    async fn fetch_works_page(
        &self,
        author_id: &str,
        request: &PageRequest,
    ) -> Result<WorksPage, SourceError> {
        let url = self.profile_page_url(author_id, request.offset, request.per_page);
        let html = self.fetch_html(&url).await?;
        let works = parse_profile_rows(&html, &self.base_url)?;

        tracing::debug!(
            offset = request.offset,
            received = works.len(),
            "fetched Scholar profile page"
        );

        Ok(WorksPage::new(works, None))
    }

    async fn fetch_work_detail(&self, detail_id: &str) -> Result<WorkDetail, SourceError> {
        let url = self.absolute_url(detail_id);
        let html = self.fetch_html(&url).await?;
        parse_detail(&html)
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("Bad selector '{}': {:?}", css, e)))
}

fn element_text(elem: &ElementRef) -> String {
    elem.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_count(text: &str) -> i64 {
    text.trim().parse::<i64>().unwrap_or(0)
}

/// Parse the citation table of a profile page
///
/// The table holds six `td.gsc_rsb_std` cells: all-time and recent values of
/// citations, h-index and i10-index. Only the all-time values are used.
fn parse_stats(html: &str) -> Result<AuthorStats, SourceError> {
    let document = Html::parse_document(html);
    let cell_selector = selector("td.gsc_rsb_std")?;
    let name_selector = selector("#gsc_prf_in")?;

    let values: Vec<i64> = document
        .select(&cell_selector)
        .map(|cell| parse_count(&element_text(&cell)))
        .collect();
    let value_at = |index: usize| values.get(index).copied().unwrap_or(0).max(0);

    if values.len() < 6 {
        tracing::warn!(cells = values.len(), "Scholar stats table incomplete");
    }

    let display_name = document
        .select(&name_selector)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default();

    Ok(AuthorStats {
        display_name,
        total_citations: value_at(0) as u64,
        h_index: value_at(2) as u32,
        i10_index: value_at(4) as u32,
    })
}

/// Parse publication rows of a profile page
fn parse_profile_rows(html: &str, base_url: &str) -> Result<Vec<WorkRecord>, SourceError> {
    let document = Html::parse_document(html);
    let row_selector = selector("tr.gsc_a_tr")?;
    let title_selector = selector("a.gsc_a_at")?;
    let gray_selector = selector(".gs_gray")?;
    let cites_selector = selector("a.gsc_a_ac")?;
    let year_selector = selector("span.gsc_a_h")?;

    let mut works = Vec::new();
    for row in document.select(&row_selector) {
        let Some(title_elem) = row.select(&title_selector).next() else {
            continue;
        };
        let title = element_text(&title_elem);
        if title.is_empty() {
            continue;
        }

        let href = title_elem.value().attr("href");
        let link = href.map(|h| format!("{}{}", base_url, h));
        let source_id = link.as_deref().and_then(citation_id);

        let mut gray = row.select(&gray_selector).map(|e| element_text(&e));
        let authors = gray.next().unwrap_or_default();
        let venue = gray.next();

        let citations = row
            .select(&cites_selector)
            .next()
            .map(|e| parse_count(&element_text(&e)));
        let year = row
            .select(&year_selector)
            .next()
            .map(|e| element_text(&e))
            .unwrap_or_default();

        works.push(
            WorkRecordBuilder::new(Some(&title))
                .authors_str(&authors)
                .venue(venue.as_deref())
                .year_str(&year)
                .citations(citations)
                .link(link)
                .ids(WorkIds {
                    source_id,
                    doi: None,
                    detail_id: href.map(|h| h.to_string()),
                })
                .build(),
        );
    }

    Ok(works)
}

fn citation_id(link: &str) -> Option<String> {
    Url::parse(link)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "citation_for_view")
        .map(|(_, value)| value.into_owned())
}

/// Parse the untruncated title and authors from a citation detail page
fn parse_detail(html: &str) -> Result<WorkDetail, SourceError> {
    let document = Html::parse_document(html);
    let title_selector = selector("#gsc_oci_title")?;
    let field_selector = selector(".gsc_oci_field")?;

    let title = document
        .select(&title_selector)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty());

    let authors = document
        .select(&field_selector)
        .find(|field| element_text(field).eq_ignore_ascii_case("authors"))
        .and_then(|field| field.next_siblings().find_map(ElementRef::wrap))
        .map(|value| crate::models::parse_author_list(&element_text(&value)))
        .filter(|authors| !authors.is_empty());

    Ok(WorkDetail { title, authors })
}
