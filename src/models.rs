//! Core content records.
//!
//! These are the typed shapes produced by the loaders. Each record is built
//! fresh from its backing file on every load and never mutated afterwards.
//! Front-matter structs (`*Meta`) mirror the on-disk keys; records add the
//! slug, the body and any resolved references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frontmatter::{deserialize_date, deserialize_optional_date};

/// A client the agency has worked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub slug: String,
    pub name: String,
    pub logo: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientMeta {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A technology; `name` is both the display text and the auto-link needle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technology {
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
    pub website: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TechnologyMeta {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl Tag {
    /// Record returned for a tag slug that has no backing file.
    pub fn synthetic(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: slug.to_string(),
            description: None,
            color: None,
            icon: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectScope {
    FullDevelopment,
    FeatureIntegration,
    TakeoverAndEvolution,
    MaintenanceAndSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOwnership {
    FromScratch,
    SharedCodebase,
    InheritedCodebase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementType {
    ProjectBased,
    ContinuousSupport,
    Consulting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(rename = "type")]
    pub kind: EngagementType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

/// Description plus bullet points, used for both challenge and solution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: Vec<String>,
}

/// A dated follow-up stored beside a project's primary file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub project: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IterationMeta {
    pub title: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub project: Option<String>,
}

/// A published case study with its client and technologies resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub slug: String,
    pub title: String,
    pub name: Option<String>,
    pub excerpt: String,
    pub overview: String,
    pub date: NaiveDate,
    pub update_date: Option<NaiveDate>,
    pub client: Client,
    pub technologies: Vec<Technology>,
    pub published: bool,
    pub scope: Option<ProjectScope>,
    pub code_ownership: Option<CodeOwnership>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub engagement: Option<Engagement>,
    pub challenge: Option<Narrative>,
    pub solution: Option<Narrative>,
    pub iterations: Vec<Iteration>,
    /// Lower-cased tag slugs; resolve with [`crate::graph::ContentGraph::project_tags`].
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub content: String,
}

impl Project {
    pub fn has_technology(&self, slug: &str) -> bool {
        self.technologies
            .iter()
            .any(|t| t.slug.eq_ignore_ascii_case(slug))
    }

    pub fn has_tag(&self, slug: &str) -> bool {
        let slug = slug.to_lowercase();
        self.tags.iter().any(|t| *t == slug)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectMeta {
    pub title: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub overview: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub update_date: Option<NaiveDate>,
    pub client: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub scope: Option<ProjectScope>,
    #[serde(default)]
    pub code_ownership: Option<CodeOwnership>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub engagement: Option<Engagement>,
    #[serde(default)]
    pub challenge: Option<Narrative>,
    #[serde(default)]
    pub solution: Option<Narrative>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
