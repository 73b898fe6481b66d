//! OpenAlex research source implementation.
//!
//! Works are listed with cursor pagination through
//! `/works?filter=author.id:{id}`, author statistics come from
//! `/authors/{id}` and journal metrics from `/sources?search=...`.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::models::{AuthorStats, JournalMetric, WorkIds, WorkRecord, WorkRecordBuilder};
use crate::sources::{
    BibliographicSource, JournalMetricsSource, PageRequest, PaginationMode,
    SourceError, WorksPage,
};
use crate::utils::{short_id, HttpClient};

pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Cursor value that starts a cursor-paginated listing
const FIRST_CURSOR: &str = "*";

/// OpenAlex research source
///
/// Uses the OpenAlex REST API. An email enables the polite pool.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl OpenAlexSource {
    /// Create a new OpenAlex source
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: OPENALEX_API_BASE.to_string(),
            email: None,
            api_key: None,
        }
    }

    /// Point the source at another API root (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the polite pool email
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.is_empty());
        self
    }

    /// Set the premium API key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Build a request URL with the polite pool / key parameters appended
    fn build_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, SourceError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| SourceError::InvalidRequest(format!("Bad OpenAlex URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Some(ref email) = self.email {
                query.append_pair("mailto", email);
            }
            if let Some(ref key) = self.api_key {
                query.append_pair("api_key", key);
            }
        }
        Ok(url.to_string())
    }

    /// Parse OpenAlex work data
    fn parse_work(data: OAWork) -> WorkRecord {
        let (authors, author_ids): (Vec<String>, Vec<Option<String>>) = data
            .authorships
            .into_iter()
            .filter_map(|a| {
                let name = a
                    .author
                    .as_ref()
                    .and_then(|au| au.display_name.clone())
                    .or(a.raw_author_name)?;
                let id = a.author.and_then(|au| au.id).map(|id| short_id(&id).to_string());
                Some((name, id))
            })
            .unzip();

        let source = data.primary_location.as_ref().and_then(|l| l.source.as_ref());
        let venue = source.and_then(|s| s.display_name.as_deref());
        let journal_key = source
            .and_then(|s| s.id.as_deref())
            .map(|id| short_id(id).to_string());

        let landing = data
            .primary_location
            .as_ref()
            .and_then(|l| l.landing_page_url.clone());
        let link = data.doi.clone().or(landing).or_else(|| data.id.clone());

        let title = data.title.as_deref().or(data.display_name.as_deref());

        WorkRecordBuilder::new(title)
            .authors(authors)
            .author_ids(author_ids)
            .venue(venue)
            .year(data.publication_year)
            .citations(data.cited_by_count)
            .link(link)
            .journal_key(journal_key)
            .ids(WorkIds {
                source_id: data.id.as_deref().map(|id| short_id(id).to_string()),
                doi: data.doi,
                detail_id: None,
            })
            .build()
    }
}

#[async_trait]
impl BibliographicSource for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    fn pagination(&self) -> PaginationMode {
        PaginationMode::Cursor
    }

    fn profile_url(&self, author_id: &str) -> Option<String> {
        Some(format!("https://openalex.org/authors/{}", short_id(author_id)))
    }

    async fn fetch_author_stats(&self, author_id: &str) -> Result<AuthorStats, SourceError> {
        let url = self.build_url(&format!("/authors/{}", short_id(author_id)), &[])?;
        let author: OAAuthorData = self.client.get_json(&url).await?;

        let summary = author.summary_stats.unwrap_or_default();
        Ok(AuthorStats {
            display_name: author.display_name.unwrap_or_default(),
            total_citations: author.cited_by_count.unwrap_or(0).max(0) as u64,
            h_index: summary.h_index.unwrap_or(0).max(0) as u32,
            i10_index: summary.i10_index.unwrap_or(0).max(0) as u32,
        })
    }

    async fn fetch_works_page(
        &self,
        author_id: &str,
        request: &PageRequest,
    ) -> Result<WorksPage, SourceError> {
        let filter = format!("author.id:{}", short_id(author_id));
        let per_page = request.per_page.to_string();
        let cursor = request.cursor.as_deref().unwrap_or(FIRST_CURSOR);

        let url = self.build_url(
            "/works",
            &[
                ("filter", filter.as_str()),
                ("sort", "publication_year:desc"),
                ("per-page", per_page.as_str()),
                ("cursor", cursor),
            ],
        )?;

        let data: WorksResponse = self.client.get_json(&url).await?;
        let next_cursor = data.meta.and_then(|m| m.next_cursor).filter(|c| !c.is_empty());
        let works: Vec<WorkRecord> = data.results.into_iter().map(Self::parse_work).collect();

        tracing::debug!(
            offset = request.offset,
            received = works.len(),
            has_next = next_cursor.is_some(),
            "fetched OpenAlex works page"
        );

        Ok(WorksPage::new(works, next_cursor))
    }
}

#[async_trait]
impl JournalMetricsSource for OpenAlexSource {
    async fn lookup_journal(&self, key: &str) -> Result<Option<JournalMetric>, SourceError> {
        let url = self.build_url("/sources", &[("search", key), ("per-page", "1")])?;
        let data: SourcesResponse = self.client.get_json(&url).await?;

        Ok(data.results.into_iter().next().map(|source| {
            let impact = source.summary_stats.and_then(|s| s.two_year_mean_citedness);
            JournalMetric::new(source.display_name.unwrap_or_else(|| key.to_string()), impact)
                .rounded()
        }))
    }
}

// ===== OpenAlex API Types =====

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    meta: Option<Meta>,
    #[serde(default)]
    results: Vec<OAWork>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    publication_year: Option<i64>,
    #[serde(default)]
    cited_by_count: Option<i64>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
    #[serde(default)]
    primary_location: Option<OALocation>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    #[serde(default)]
    author: Option<OAAuthor>,
    #[serde(default)]
    raw_author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OALocation {
    #[serde(default)]
    landing_page_url: Option<String>,
    #[serde(default)]
    source: Option<OASource>,
}

#[derive(Debug, Deserialize)]
struct OASource {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorData {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    cited_by_count: Option<i64>,
    #[serde(default)]
    summary_stats: Option<SummaryStats>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryStats {
    #[serde(default)]
    h_index: Option<i64>,
    #[serde(default)]
    i10_index: Option<i64>,
    #[serde(default, rename = "2yr_mean_citedness")]
    two_year_mean_citedness: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SourcesResponse {
    #[serde(default)]
    results: Vec<OASourceData>,
}

#[derive(Debug, Deserialize)]
struct OASourceData {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    summary_stats: Option<SummaryStats>,
}
