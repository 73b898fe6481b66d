//! Static HTML rendering of a [`Report`].
//!
//! The page is a minijinja template compiled into the binary. Template
//! values are HTML-escaped, so titles, author names and venues are safe to
//! embed as-is.

use minijinja::Environment;
use serde::Serialize;

use crate::models::{EnrichedWork, Report, YearGroup};

const TEMPLATE_NAME: &str = "publications.html";
const TEMPLATE: &str = include_str!("publications.html");

/// Errors raised while rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Page-level settings that are not part of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Page title
    pub title: String,
    /// Author profile linked from the footer
    pub profile_url: Option<String>,
    /// Human-readable name of the data source
    pub source_name: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Publications".to_string(),
            profile_url: None,
            source_name: String::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PageView<'a> {
    title: &'a str,
    stats: StatsView,
    groups: Vec<GroupView>,
    updated_at: String,
    profile_url: Option<&'a str>,
    source_name: &'a str,
}

#[derive(Debug, Serialize)]
struct StatsView {
    publications: usize,
    citations: u64,
    h_index: u32,
    i10_index: u32,
}

#[derive(Debug, Serialize)]
struct GroupView {
    label: String,
    count_label: String,
    works: Vec<WorkView>,
}

#[derive(Debug, Serialize)]
struct WorkView {
    title: String,
    link: Option<String>,
    authors: Vec<AuthorView>,
    venue: String,
    impact: Option<String>,
    corresponding: bool,
    citations: u32,
    cite_class: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct AuthorView {
    name: String,
    is_pi: bool,
}

/// Badge class for a citation count; no badge for uncited works
pub fn citation_class(citations: u32) -> Option<&'static str> {
    match citations {
        0 => None,
        c if c >= 50 => Some("cite-high"),
        c if c >= 10 => Some("cite-med"),
        _ => Some("cite-low"),
    }
}

/// "1 paper", "3 papers"
pub fn paper_count_label(count: usize) -> String {
    if count == 1 {
        "1 paper".to_string()
    } else {
        format!("{} papers", count)
    }
}

impl From<&EnrichedWork> for WorkView {
    fn from(enriched: &EnrichedWork) -> Self {
        let work = &enriched.work;
        let authors = work
            .authors
            .iter()
            .enumerate()
            .map(|(index, name)| AuthorView {
                name: name.clone(),
                is_pi: work.pi_author_index == Some(index),
            })
            .collect();

        Self {
            title: work.title.clone(),
            link: work.link.clone(),
            authors,
            venue: work.venue.clone(),
            impact: enriched.impact().map(|impact| format!("{:.1}", impact)),
            corresponding: enriched.corresponding,
            citations: work.citations,
            cite_class: citation_class(work.citations),
        }
    }
}

impl From<&YearGroup> for GroupView {
    fn from(group: &YearGroup) -> Self {
        Self {
            label: group.label.to_string(),
            count_label: paper_count_label(group.len()),
            works: group.works.iter().map(WorkView::from).collect(),
        }
    }
}

/// Render the publication page
pub fn render_html(report: &Report, options: &RenderOptions) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;

    let page = PageView {
        title: &options.title,
        stats: StatsView {
            publications: report.publication_count,
            citations: report.stats.total_citations,
            h_index: report.stats.h_index,
            i10_index: report.stats.i10_index,
        },
        groups: report.groups.iter().map(GroupView::from).collect(),
        updated_at: report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        profile_url: options.profile_url.as_deref(),
        source_name: &options.source_name,
    };

    let html = env.get_template(TEMPLATE_NAME)?.render(&page)?;
    tracing::debug!(bytes = html.len(), groups = page.groups.len(), "rendered publication page");
    Ok(html)
}
