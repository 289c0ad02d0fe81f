//! Categorical filtering and search over a project collection.
//!
//! At most one categorical filter applies per request. When several are
//! supplied the first in technology → category → industry → client order
//! wins. A search query then re-orders the survivors by relevance.

use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::Project;
use crate::search::rank_projects;
use crate::urls::{category_key, industry_key};

/// Filter parameters as they arrive from a query string or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    /// Tag membership; narrows the collection before the categorical filter.
    #[serde(default)]
    pub tag: Option<String>,
}

/// The single categorical filter in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Categorical<'a> {
    Technology(&'a str),
    Category(&'a str),
    Industry(&'a str),
    Client(&'a str),
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProjectFilter {
    pub fn search_query(&self) -> Option<&str> {
        non_blank(&self.search)
    }

    pub fn effective(&self) -> Option<Categorical<'_>> {
        non_blank(&self.technology)
            .map(Categorical::Technology)
            .or_else(|| non_blank(&self.category).map(Categorical::Category))
            .or_else(|| non_blank(&self.industry).map(Categorical::Industry))
            .or_else(|| non_blank(&self.client).map(Categorical::Client))
    }

    pub fn is_empty(&self) -> bool {
        self.search_query().is_none() && self.effective().is_none() && non_blank(&self.tag).is_none()
    }
}

impl Categorical<'_> {
    pub fn matches(&self, project: &Project) -> bool {
        match *self {
            Categorical::Technology(slug) => project.has_technology(slug),
            Categorical::Category(value) => project
                .category
                .as_deref()
                .is_some_and(|c| category_key(c) == category_key(value)),
            Categorical::Industry(value) => project
                .industry
                .as_deref()
                .is_some_and(|i| industry_key(i) == industry_key(value)),
            Categorical::Client(slug) => project.client.slug == slug,
        }
    }
}

/// Apply `filter` to `projects` without touching the input.
///
/// Without a search query the input order is kept; with one, results are
/// ordered by relevance.
pub fn filter_projects(
    projects: &[Project],
    filter: &ProjectFilter,
    search: &SearchConfig,
) -> Vec<Project> {
    let categorical = filter.effective();
    let tag = non_blank(&filter.tag);

    let matching: Vec<&Project> = projects
        .iter()
        .filter(|p| tag.map_or(true, |t| p.has_tag(t)))
        .filter(|p| categorical.map_or(true, |c| c.matches(p)))
        .collect();

    match filter.search_query() {
        None => matching.into_iter().cloned().collect(),
        Some(query) => {
            let owned: Vec<Project> = matching.into_iter().cloned().collect();
            let ranked = rank_projects(&owned, query, search);
            ranked
                .into_iter()
                .map(|s| owned[s.index].clone())
                .collect()
        }
    }
}
