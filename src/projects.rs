//! Project loading and reference resolution.
//!
//! Projects live one directory per slug: `projects/<slug>/index.<ext>` is
//! the primary file and every other `*.<ext>` file beside it is an
//! iteration. Loading a project resolves its client and technologies
//! through the flat collections; an unpublished or client-less project is
//! indistinguishable from a missing one.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::collection::{ensure_dir, is_valid_slug, Collection};
use crate::frontmatter;
use crate::models::{Client, Iteration, IterationMeta, Project, ProjectMeta, Technology};

/// Directory name under the content root.
pub const PROJECTS_DIR: &str = "projects";

#[derive(Debug, Clone)]
pub struct ProjectLoader {
    dir: PathBuf,
    extension: String,
    index_file: String,
    clients: Collection<Client>,
    technologies: Collection<Technology>,
}

impl ProjectLoader {
    pub fn new(content_root: &Path, extension: &str, index_file: &str) -> Self {
        Self {
            dir: content_root.join(PROJECTS_DIR),
            extension: extension.trim_start_matches('.').to_string(),
            index_file: index_file.to_string(),
            clients: Collection::new(content_root, extension),
            technologies: Collection::new(content_root, extension),
        }
    }

    /// Primary file of `slug`, or `None` when the slug is not a single
    /// directory name.
    pub fn index_path(&self, slug: &str) -> Option<PathBuf> {
        is_valid_slug(slug).then(|| self.dir.join(slug).join(&self.index_file))
    }

    /// Slugs of project directories that contain a primary file, sorted.
    pub fn slugs(&self) -> Result<Vec<String>> {
        ensure_dir(&self.dir)?;

        let mut slugs = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to read projects: {}", self.dir.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if !entry.path().join(&self.index_file).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                slugs.push(name.to_string());
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    /// Strict lookup. `Ok(None)` covers a missing primary file, an
    /// unpublished project and an unresolvable client; read or parse
    /// failures are errors.
    pub fn load(&self, slug: &str) -> Result<Option<Project>> {
        let Some(path) = self.index_path(slug) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let doc = frontmatter::parse::<ProjectMeta>(&source)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let meta = doc.meta;

        if !meta.published {
            return Ok(None);
        }

        let Some(client) = self.clients.get(&meta.client) else {
            tracing::warn!(project = slug, client = %meta.client, "client not found; project hidden");
            return Ok(None);
        };

        let technologies = meta
            .technologies
            .iter()
            .filter_map(|tech_slug| {
                let tech = self.technologies.get(tech_slug);
                if tech.is_none() {
                    tracing::debug!(project = slug, technology = %tech_slug, "dropping unknown technology");
                }
                tech
            })
            .collect();

        let iterations = self.load_iterations(slug)?;

        Ok(Some(Project {
            slug: slug.to_string(),
            title: meta.title,
            name: meta.name,
            excerpt: meta.excerpt,
            overview: meta.overview,
            date: meta.date,
            update_date: meta.update_date,
            client,
            technologies,
            published: meta.published,
            scope: meta.scope,
            code_ownership: meta.code_ownership,
            category: meta.category,
            industry: meta.industry,
            engagement: meta.engagement,
            challenge: meta.challenge,
            solution: meta.solution,
            iterations,
            tags: meta.tags.iter().map(|t| t.to_lowercase()).collect(),
            image: meta.image,
            url: meta.url,
            content: doc.body,
        }))
    }

    /// Lenient lookup: malformed projects are logged and treated as absent.
    pub fn get(&self, slug: &str) -> Option<Project> {
        match self.load(slug) {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(project = slug, "skipping project: {:#}", e);
                None
            }
        }
    }

    /// Published projects, newest first.
    pub fn all(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .slugs()?
            .iter()
            .filter_map(|slug| self.get(slug))
            .collect();
        projects.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(projects)
    }

    pub fn by_technology(&self, slug: &str) -> Result<Vec<Project>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.has_technology(slug))
            .collect())
    }

    pub fn by_client(&self, slug: &str) -> Result<Vec<Project>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.client.slug == slug)
            .collect())
    }

    pub fn by_tag(&self, slug: &str) -> Result<Vec<Project>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.has_tag(slug))
            .collect())
    }

    /// Sibling files of the primary file, oldest first. Unparseable
    /// iterations are skipped.
    fn load_iterations(&self, slug: &str) -> Result<Vec<Iteration>> {
        let dir = self.dir.join(slug);
        let mut iterations = Vec::new();

        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry =
                entry.with_context(|| format!("Failed to read project dir: {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if entry.file_name().to_str() == Some(self.index_file.as_str()) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            match read_iteration(path) {
                Ok(iteration) => iterations.push(iteration),
                Err(e) => tracing::warn!(project = slug, "skipping iteration: {:#}", e),
            }
        }

        iterations.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(iterations)
    }
}

fn read_iteration(path: &Path) -> Result<Iteration> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = frontmatter::parse::<IterationMeta>(&source)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let slug = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Iteration {
        slug,
        title: doc.meta.title,
        date: doc.meta.date,
        project: doc.meta.project,
        content: doc.body,
    })
}
