//! TOML configuration.
//!
//! ```toml
//! [content]
//! root = "./content"
//!
//! [site]
//! base_url = "https://agency.example"
//! public_root = "./public"
//!
//! [listing]
//! page_size = 9
//!
//! [search]
//! threshold = 0.6
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub content: ContentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    pub root: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_project_index")]
    pub project_index: String,
}

fn default_extension() -> String {
    "mdx".to_string()
}
fn default_project_index() -> String {
    "index.mdx".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            public_root: default_public_root(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_public_root() -> PathBuf {
    PathBuf::from("public")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    9
}

/// Fuzzy search tuning. A field contributes to a project's relevance only
/// when its normalized similarity is at least `threshold`.
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub weights: SearchWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            weights: SearchWeights::default(),
        }
    }
}

fn default_threshold() -> f64 {
    0.6
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchWeights {
    #[serde(default = "default_title_weight")]
    pub title: f64,
    #[serde(default = "default_name_weight")]
    pub name: f64,
    #[serde(default = "default_overview_weight")]
    pub overview: f64,
    #[serde(default = "default_client_weight")]
    pub client: f64,
    #[serde(default = "default_technologies_weight")]
    pub technologies: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            title: default_title_weight(),
            name: default_name_weight(),
            overview: default_overview_weight(),
            client: default_client_weight(),
            technologies: default_technologies_weight(),
        }
    }
}

fn default_title_weight() -> f64 {
    1.0
}
fn default_name_weight() -> f64 {
    0.8
}
fn default_overview_weight() -> f64 {
    0.6
}
fn default_client_weight() -> f64 {
    0.5
}
fn default_technologies_weight() -> f64 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Defaults for a content tree at `root`, without a config file.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            content: ContentConfig {
                root: root.into(),
                extension: default_extension(),
                project_index: default_project_index(),
            },
            site: SiteConfig::default(),
            listing: ListingConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Check value ranges the loaders and filters rely on.
    pub fn validate(&self) -> Result<()> {
        if self.content.extension.trim_start_matches('.').is_empty() {
            anyhow::bail!("content.extension must not be empty");
        }
        if self.content.project_index.trim().is_empty() {
            anyhow::bail!("content.project_index must not be empty");
        }
        if self.listing.page_size == 0 {
            anyhow::bail!("listing.page_size must be > 0");
        }
        if !(0.0..=1.0).contains(&self.search.threshold) {
            anyhow::bail!("search.threshold must be in [0.0, 1.0]");
        }
        let w = &self.search.weights;
        for (name, value) in [
            ("title", w.title),
            ("name", w.name),
            ("overview", w.overview),
            ("client", w.client),
            ("technologies", w.technologies),
        ] {
            if value < 0.0 {
                anyhow::bail!("search.weights.{} must be >= 0", name);
            }
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Relative paths are taken from the config file's directory.
    if let Some(base) = path.parent() {
        if config.content.root.is_relative() {
            config.content.root = base.join(&config.content.root);
        }
        if config.site.public_root.is_relative() {
            config.site.public_root = base.join(&config.site.public_root);
        }
    }

    config.validate()?;
    Ok(config)
}
