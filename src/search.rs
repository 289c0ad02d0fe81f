//! Weighted fuzzy search over projects.
//!
//! Each searchable field is scored with nucleo's fuzzy matcher and the raw
//! score is normalized against the query's score on itself, giving a
//! similarity in `[0, 1]`. A field counts only when its similarity reaches
//! the configured threshold; a project's relevance is its best weighted
//! field.

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32String};

use crate::config::SearchConfig;
use crate::models::Project;

/// A project index paired with its relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredProject {
    pub index: usize,
    pub score: f64,
}

pub struct FuzzySearch {
    matcher: Matcher,
    pattern: Pattern,
    self_score: f64,
}

impl FuzzySearch {
    /// Returns `None` for a blank query.
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
        let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
        let haystack = Utf32String::from(query);
        let self_score = pattern.score(haystack.slice(..), &mut matcher)? as f64;
        if self_score <= 0.0 {
            return None;
        }
        Some(Self {
            matcher,
            pattern,
            self_score,
        })
    }

    /// Similarity of `text` to the query in `[0, 1]`; `0` when it does not
    /// match at all.
    pub fn similarity(&mut self, text: &str) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        let haystack = Utf32String::from(text);
        match self.pattern.score(haystack.slice(..), &mut self.matcher) {
            Some(score) => (score as f64 / self.self_score).min(1.0),
            None => 0.0,
        }
    }

    fn field(&mut self, text: &str, weight: f64, threshold: f64) -> f64 {
        let sim = self.similarity(text);
        if sim >= threshold && sim > 0.0 {
            sim * weight
        } else {
            0.0
        }
    }

    /// Relevance of one project, `0` when no field passes the threshold.
    pub fn score_project(&mut self, project: &Project, config: &SearchConfig) -> f64 {
        let w = &config.weights;
        let t = config.threshold;

        let mut best = self.field(&project.title, w.title, t);
        if let Some(name) = project.name.as_deref() {
            best = best.max(self.field(name, w.name, t));
        }
        best = best.max(self.field(&project.overview, w.overview, t));
        best = best.max(self.field(&project.client.name, w.client, t));
        for tech in &project.technologies {
            best = best.max(self.field(&tech.name, w.technologies, t));
        }
        best
    }
}

/// Rank `projects` against `query`, best first. Ties keep input order.
pub fn rank_projects(projects: &[Project], query: &str, config: &SearchConfig) -> Vec<ScoredProject> {
    let Some(mut search) = FuzzySearch::new(query) else {
        return Vec::new();
    };

    let mut scored: Vec<ScoredProject> = projects
        .iter()
        .enumerate()
        .filter_map(|(index, project)| {
            let score = search.score_project(project, config);
            (score > 0.0).then_some(ScoredProject { index, score })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });
    scored
}
