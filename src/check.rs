//! Content validation.
//!
//! Loaders deliberately hide broken records; `folio check` surfaces them.
//! Every record is loaded strictly and each problem becomes an [`Issue`]:
//! unparseable files, hidden projects and image paths that do not exist
//! under the public root.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::collection::{Collection, FlatRecord};
use crate::graph::ContentGraph;
use crate::urls::asset_exists;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub collection: String,
    pub slug: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub checked: usize,
    pub issues: Vec<Issue>,
}

impl CheckReport {
    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    fn push(&mut self, severity: Severity, collection: &str, slug: &str, message: String) {
        self.issues.push(Issue {
            severity,
            collection: collection.to_string(),
            slug: slug.to_string(),
            message,
        });
    }

    fn missing_asset(&mut self, public_root: &Path, collection: &str, slug: &str, asset: Option<&str>) {
        if let Some(asset) = asset.filter(|a| a.starts_with('/')) {
            if !asset_exists(public_root, asset) {
                self.push(
                    Severity::Warning,
                    collection,
                    slug,
                    format!("asset not found: {}", asset),
                );
            }
        }
    }
}

fn check_collection<R: FlatRecord>(
    collection: &Collection<R>,
    report: &mut CheckReport,
) -> Result<Vec<R>> {
    let mut loaded = Vec::new();
    for slug in collection.slugs()? {
        report.checked += 1;
        match collection.load(&slug) {
            Ok(Some(record)) => loaded.push(record),
            Ok(None) => {}
            Err(e) => report.push(Severity::Error, R::COLLECTION, &slug, format!("{:#}", e)),
        }
    }
    Ok(loaded)
}

pub fn check_content(graph: &ContentGraph, public_root: &Path) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for client in check_collection(graph.clients(), &mut report)? {
        report.missing_asset(public_root, "clients", &client.slug, client.logo.as_deref());
    }
    for tech in check_collection(graph.technologies(), &mut report)? {
        report.missing_asset(public_root, "technologies", &tech.slug, tech.icon.as_deref());
    }
    check_collection(graph.tags(), &mut report)?;

    let projects = graph.projects();
    for slug in projects.slugs()? {
        report.checked += 1;
        match projects.load(&slug) {
            Ok(Some(project)) => {
                report.missing_asset(public_root, "projects", &slug, project.image.as_deref());
            }
            Ok(None) => report.push(
                Severity::Warning,
                "projects",
                &slug,
                "hidden: unpublished or client not found".to_string(),
            ),
            Err(e) => report.push(Severity::Error, "projects", &slug, format!("{:#}", e)),
        }
    }

    Ok(report)
}
