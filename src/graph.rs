//! Content graph accessors.
//!
//! [`ContentGraph`] is the entry point page renderers, the CLI and the HTTP
//! API use. It owns one loader per collection, all rooted at the configured
//! content directory, and answers collection and relationship queries by
//! reading the files afresh on each call.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::autolink::AutoLinker;
use crate::collection::{locale_cmp, Collection};
use crate::config::Config;
use crate::filter::{filter_projects, ProjectFilter};
use crate::markup::{parse_fragment, render};
use crate::models::{Client, Project, Tag, Technology};
use crate::paginate::{paginate, Paginated};
use crate::projects::ProjectLoader;
use crate::urls::{category_key, industry_key};

#[derive(Debug, Clone)]
pub struct ContentGraph {
    clients: Collection<Client>,
    technologies: Collection<Technology>,
    tags: Collection<Tag>,
    projects: ProjectLoader,
}

/// A labelled filter value, e.g. `{ key: "retail-and-consumer", label: "Retail & Consumer" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// Everything a client-side filter UI needs, built from published projects.
#[derive(Debug, Clone, Serialize)]
pub struct FilterVocabulary {
    pub technologies: Vec<FilterOption>,
    pub categories: Vec<FilterOption>,
    pub industries: Vec<FilterOption>,
    pub clients: Vec<FilterOption>,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub client: String,
    pub technologies: Vec<String>,
    pub category: Option<String>,
    pub industry: Option<String>,
    pub date: chrono::NaiveDate,
}

impl From<&Project> for ProjectSummary {
    fn from(p: &Project) -> Self {
        Self {
            slug: p.slug.clone(),
            title: p.title.clone(),
            excerpt: p.excerpt.clone(),
            client: p.client.slug.clone(),
            technologies: p.technologies.iter().map(|t| t.slug.clone()).collect(),
            category: p.category.clone(),
            industry: p.industry.clone(),
            date: p.date,
        }
    }
}

impl ContentGraph {
    pub fn new(content_root: &Path, extension: &str, project_index: &str) -> Self {
        Self {
            clients: Collection::new(content_root, extension),
            technologies: Collection::new(content_root, extension),
            tags: Collection::new(content_root, extension),
            projects: ProjectLoader::new(content_root, extension, project_index),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.content.root,
            &config.content.extension,
            &config.content.project_index,
        )
    }

    pub fn clients(&self) -> &Collection<Client> {
        &self.clients
    }

    pub fn technologies(&self) -> &Collection<Technology> {
        &self.technologies
    }

    pub fn tags(&self) -> &Collection<Tag> {
        &self.tags
    }

    pub fn projects(&self) -> &ProjectLoader {
        &self.projects
    }

    pub fn all_projects(&self) -> Result<Vec<Project>> {
        self.projects.all()
    }

    pub fn project(&self, slug: &str) -> Option<Project> {
        self.projects.get(slug)
    }

    pub fn all_clients(&self) -> Result<Vec<Client>> {
        self.clients.all()
    }

    pub fn client(&self, slug: &str) -> Option<Client> {
        self.clients.get(slug)
    }

    pub fn all_technologies(&self) -> Result<Vec<Technology>> {
        self.technologies.all()
    }

    pub fn technology(&self, slug: &str) -> Option<Technology> {
        self.technologies.get(slug)
    }

    pub fn tag(&self, slug: &str) -> Tag {
        self.tags.get_or_synthetic(slug)
    }

    /// Tag files plus any tag slug referenced by a published project,
    /// sorted by name.
    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        let mut by_slug: BTreeMap<String, Tag> = self
            .tags
            .all()?
            .into_iter()
            .map(|t| (t.slug.to_lowercase(), t))
            .collect();
        for project in self.projects.all()? {
            for slug in &project.tags {
                if !by_slug.contains_key(slug) {
                    by_slug.insert(slug.clone(), self.tags.get_or_synthetic(slug));
                }
            }
        }
        let mut tags: Vec<Tag> = by_slug.into_values().collect();
        tags.sort_by(|a, b| locale_cmp(&a.name, &b.name).then_with(|| a.slug.cmp(&b.slug)));
        Ok(tags)
    }

    pub fn project_tags(&self, project: &Project) -> Vec<Tag> {
        project
            .tags
            .iter()
            .map(|slug| self.tags.get_or_synthetic(slug))
            .collect()
    }

    pub fn projects_by_client(&self, slug: &str) -> Result<Vec<Project>> {
        self.projects.by_client(slug)
    }

    pub fn projects_by_technology(&self, slug: &str) -> Result<Vec<Project>> {
        self.projects.by_technology(slug)
    }

    pub fn projects_by_tag(&self, slug: &str) -> Result<Vec<Project>> {
        self.projects.by_tag(slug)
    }

    /// Filter, search and paginate the published projects in one step.
    pub fn project_listing(
        &self,
        filter: &ProjectFilter,
        config: &Config,
        page: usize,
    ) -> Result<Paginated<Project>> {
        let all = self.projects.all()?;
        let filtered = filter_projects(&all, filter, &config.search);
        Ok(paginate(&filtered, config.listing.page_size, page))
    }

    /// Distinct filter values across published projects.
    pub fn filter_vocabulary(&self) -> Result<FilterVocabulary> {
        let projects = self.projects.all()?;

        let mut technologies: BTreeMap<String, FilterOption> = BTreeMap::new();
        let mut categories: BTreeMap<String, FilterOption> = BTreeMap::new();
        let mut industries: BTreeMap<String, FilterOption> = BTreeMap::new();
        let mut clients: BTreeMap<String, FilterOption> = BTreeMap::new();

        for p in &projects {
            for t in &p.technologies {
                bump(&mut technologies, t.slug.clone(), &t.name);
            }
            if let Some(c) = p.category.as_deref() {
                bump(&mut categories, category_key(c), c);
            }
            if let Some(i) = p.industry.as_deref() {
                bump(&mut industries, industry_key(i), i);
            }
            bump(&mut clients, p.client.slug.clone(), &p.client.name);
        }

        Ok(FilterVocabulary {
            technologies: sorted_options(technologies),
            categories: sorted_options(categories),
            industries: sorted_options(industries),
            clients: sorted_options(clients),
            projects: projects.iter().map(ProjectSummary::from).collect(),
        })
    }

    /// Auto-link technology names in a rendered markup fragment.
    pub fn autolink_fragment(&self, fragment: &str) -> Result<String> {
        let linker = AutoLinker::new(&self.technologies.all()?)?;
        let nodes = parse_fragment(fragment)?;
        Ok(render(&linker.link(&nodes)))
    }
}

fn bump(map: &mut BTreeMap<String, FilterOption>, key: String, label: &str) {
    map.entry(key.clone())
        .or_insert_with(|| FilterOption {
            key,
            label: label.to_string(),
            count: 0,
        })
        .count += 1;
}

fn sorted_options(map: BTreeMap<String, FilterOption>) -> Vec<FilterOption> {
    let mut options: Vec<FilterOption> = map.into_values().collect();
    options.sort_by(|a, b| locale_cmp(&a.label, &b.label).then_with(|| a.key.cmp(&b.key)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, ContentGraph) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "clients/acme.mdx", "---\nname: Acme\n---\n");
        write(root, "clients/zenith.mdx", "---\nname: Zenith Bank\n---\n");
        write(root, "technologies/react.mdx", "---\nname: React\n---\n");
        write(root, "technologies/rust.mdx", "---\nname: Rust\n---\n");
        write(root, "tags/fintech.mdx", "---\nname: FinTech\n---\n");
        write(
            root,
            "projects/shop/index.mdx",
            "---\ntitle: Shop\ndate: 2024-05-01\nclient: acme\npublished: true\ntechnologies: [react]\ncategory: E Commerce\nindustry: Retail & Consumer\ntags: [retail]\n---\n",
        );
        write(
            root,
            "projects/ledger/index.mdx",
            "---\ntitle: Ledger\ndate: 2023-02-01\nclient: zenith\npublished: true\ntechnologies: [rust, react]\ncategory: Web App\nindustry: Finance\ntags: [fintech]\n---\n",
        );
        let graph = ContentGraph::new(root, "mdx", "index.mdx");
        (tmp, graph)
    }

    #[test]
    fn test_all_tags_includes_referenced_slugs() {
        let (_tmp, graph) = fixture();
        let tags = graph.all_tags().unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["FinTech", "retail"]);
    }

    #[test]
    fn test_project_tags_resolve_with_fallback() {
        let (_tmp, graph) = fixture();
        let ledger = graph.project("ledger").unwrap();
        assert_eq!(graph.project_tags(&ledger)[0].name, "FinTech");
        let shop = graph.project("shop").unwrap();
        assert_eq!(graph.project_tags(&shop)[0], Tag::synthetic("retail"));
    }

    #[test]
    fn test_filter_vocabulary_counts() {
        let (_tmp, graph) = fixture();
        let vocab = graph.filter_vocabulary().unwrap();
        let react = vocab.technologies.iter().find(|o| o.key == "react").unwrap();
        assert_eq!(react.count, 2);
        assert_eq!(vocab.categories[0].key, "e-commerce");
        assert_eq!(vocab.industries[1].key, "retail-and-consumer");
        assert_eq!(vocab.clients.len(), 2);
        assert_eq!(vocab.projects[0].slug, "shop");
    }

    #[test]
    fn test_project_listing_redirects_out_of_range() {
        let (tmp, graph) = fixture();
        let mut config = Config::for_root(tmp.path());
        config.listing.page_size = 1;
        let listing = graph
            .project_listing(&ProjectFilter::default(), &config, 5)
            .unwrap();
        assert_eq!(listing, Paginated::Redirect { page: 2 });
    }

    #[test]
    fn test_autolink_fragment_uses_technology_files() {
        let (_tmp, graph) = fixture();
        let html = graph.autolink_fragment("<p>Rust inside</p>").unwrap();
        assert_eq!(html, r#"<p><a href="/technologies/rust">Rust</a> inside</p>"#);
    }
}
