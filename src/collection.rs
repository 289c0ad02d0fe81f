//! Flat-file record collections (clients, technologies, tags).
//!
//! A collection is one directory holding `<slug>.<ext>` files. Records are
//! read on demand; nothing is cached between calls.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::frontmatter;
use crate::models::{Client, ClientMeta, Tag, TagMeta, Technology, TechnologyMeta};

/// A record type stored one-file-per-slug.
pub trait FlatRecord: Sized {
    /// Directory name under the content root.
    const COLLECTION: &'static str;

    /// Build the record from a slug and the raw file text.
    fn from_source(slug: &str, source: &str) -> Result<Self>;

    fn slug(&self) -> &str;

    /// Name used for listing order.
    fn display_name(&self) -> &str;
}

impl FlatRecord for Client {
    const COLLECTION: &'static str = "clients";

    fn from_source(slug: &str, source: &str) -> Result<Self> {
        let doc = frontmatter::parse::<ClientMeta>(source)?;
        Ok(Client {
            slug: slug.to_string(),
            name: doc.meta.name,
            logo: doc.meta.logo,
            content: doc.body,
        })
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl FlatRecord for Technology {
    const COLLECTION: &'static str = "technologies";

    fn from_source(slug: &str, source: &str) -> Result<Self> {
        let doc = frontmatter::parse::<TechnologyMeta>(source)?;
        Ok(Technology {
            slug: slug.to_string(),
            name: doc.meta.name,
            icon: doc.meta.icon,
            website: doc.meta.website,
            content: doc.body,
        })
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl FlatRecord for Tag {
    const COLLECTION: &'static str = "tags";

    fn from_source(slug: &str, source: &str) -> Result<Self> {
        let doc = frontmatter::parse::<TagMeta>(source)?;
        Ok(Tag {
            slug: slug.to_string(),
            name: doc.meta.name.unwrap_or_else(|| slug.to_string()),
            description: doc.meta.description,
            color: doc.meta.color,
            icon: doc.meta.icon,
        })
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Loader for one flat-file collection.
#[derive(Debug, Clone)]
pub struct Collection<R> {
    dir: PathBuf,
    extension: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: FlatRecord> Collection<R> {
    /// Collection rooted at `<content_root>/<R::COLLECTION>`.
    pub fn new(content_root: &Path, extension: &str) -> Self {
        Self {
            dir: content_root.join(R::COLLECTION),
            extension: extension.trim_start_matches('.').to_string(),
            _record: PhantomData,
        }
    }

    fn path_for(&self, slug: &str) -> Option<PathBuf> {
        is_valid_slug(slug).then(|| self.dir.join(format!("{}.{}", slug, self.extension)))
    }

    /// All slugs in the collection, sorted. Creates the directory when it
    /// does not exist yet.
    pub fn slugs(&self) -> Result<Vec<String>> {
        ensure_dir(&self.dir)?;

        let mut slugs = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to read collection: {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slugs.push(stem.to_string());
            }
        }

        slugs.sort();
        Ok(slugs)
    }

    /// Strict lookup: `Ok(None)` when no file exists, `Err` when the file
    /// cannot be read or parsed.
    pub fn load(&self, slug: &str) -> Result<Option<R>> {
        let Some(path) = self.path_for(slug) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = R::from_source(slug, &source)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(record))
    }

    /// Lenient lookup: malformed records are logged and treated as absent.
    pub fn get(&self, slug: &str) -> Option<R> {
        match self.load(slug) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(collection = R::COLLECTION, slug, "skipping record: {:#}", e);
                None
            }
        }
    }

    /// Every loadable record, sorted by display name.
    pub fn all(&self) -> Result<Vec<R>> {
        let mut records: Vec<R> = self
            .slugs()?
            .iter()
            .filter_map(|slug| self.get(slug))
            .collect();
        records.sort_by(|a, b| {
            locale_cmp(a.display_name(), b.display_name()).then_with(|| a.slug().cmp(b.slug()))
        });
        Ok(records)
    }
}

impl Collection<Tag> {
    /// Tag lookup never fails: unknown or unreadable slugs yield a synthetic
    /// record named after the slug.
    pub fn get_or_synthetic(&self, slug: &str) -> Tag {
        let slug = slug.to_lowercase();
        self.get(&slug).unwrap_or_else(|| Tag::synthetic(&slug))
    }
}

/// A slug names one entry inside its collection directory: non-empty, no
/// path separators, no `..` and no NUL.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && !slug.contains("..")
        && !slug.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
}

pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Case-insensitive ordering with the exact string as tie-break, so
/// "angular" and "Angular" sort together but deterministically.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
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

    #[test]
    fn test_missing_dir_is_created_empty() {
        let tmp = TempDir::new().unwrap();
        let clients: Collection<Client> = Collection::new(tmp.path(), "mdx");
        assert!(clients.slugs().unwrap().is_empty());
        assert!(tmp.path().join("clients").is_dir());
        // second call sees the same empty directory
        assert!(clients.slugs().unwrap().is_empty());
    }

    #[test]
    fn test_slugs_strip_extension_and_ignore_others() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "clients/acme.mdx", "---\nname: Acme\n---\n");
        write(tmp.path(), "clients/notes.txt", "ignored");
        fs::create_dir_all(tmp.path().join("clients/nested.mdx")).unwrap();
        let clients: Collection<Client> = Collection::new(tmp.path(), ".mdx");
        assert_eq!(clients.slugs().unwrap(), vec!["acme".to_string()]);
    }

    #[test]
    fn test_get_reads_front_matter_and_body() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "clients/acme.mdx",
            "---\nname: Acme Corp\nlogo: /images/acme.svg\n---\nLong-time partner.\n",
        );
        let clients: Collection<Client> = Collection::new(tmp.path(), "mdx");
        let acme = clients.get("acme").unwrap();
        assert_eq!(acme.slug, "acme");
        assert_eq!(acme.name, "Acme Corp");
        assert_eq!(acme.logo.as_deref(), Some("/images/acme.svg"));
        assert_eq!(acme.content, "Long-time partner.\n");
        assert!(clients.get("nobody").is_none());
    }

    #[test]
    fn test_malformed_record_is_absent_but_strict_load_errors() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "technologies/broken.mdx", "---\nicon: x\n---\n");
        write(tmp.path(), "technologies/rust.mdx", "---\nname: Rust\n---\n");
        let techs: Collection<Technology> = Collection::new(tmp.path(), "mdx");
        assert!(techs.get("broken").is_none());
        assert!(techs.load("broken").is_err());
        let all = techs.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Rust");
    }

    #[test]
    fn test_all_sorted_by_name_not_slug() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "technologies/a.mdx", "---\nname: vue\n---\n");
        write(tmp.path(), "technologies/b.mdx", "---\nname: Angular\n---\n");
        write(tmp.path(), "technologies/c.mdx", "---\nname: React\n---\n");
        let techs: Collection<Technology> = Collection::new(tmp.path(), "mdx");
        let names: Vec<String> = techs.all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Angular", "React", "vue"]);
        let again: Vec<String> = techs.all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_tag_fallback_is_synthetic_and_lowercased() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "tags/ecommerce.mdx",
            "---\nname: E-commerce\ncolor: '#ff0000'\n---\n",
        );
        let tags: Collection<Tag> = Collection::new(tmp.path(), "mdx");
        let known = tags.get_or_synthetic("ECommerce");
        assert_eq!(known.name, "E-commerce");
        assert_eq!(known.color.as_deref(), Some("#ff0000"));

        let unknown = tags.get_or_synthetic("Headless");
        assert_eq!(unknown, Tag::synthetic("headless"));
        assert_eq!(unknown.name, "headless");
    }

    #[test]
    fn test_slug_cannot_escape_collection_dir() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        write(&content, "clients/acme.mdx", "---\nname: Acme\n---\n");
        write(tmp.path(), "secret.mdx", "---\nname: Outside\n---\nprivate\n");
        let clients: Collection<Client> = Collection::new(&content, "mdx");

        assert!(clients.get("../../secret").is_none());
        assert!(clients.load("../../secret").unwrap().is_none());
        assert!(clients.get("..\\..\\secret").is_none());
        assert!(clients.get("").is_none());
        assert!(clients.get("acme").is_some());
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("a\0b"));
        assert!(is_valid_slug("react-native"));
    }

    #[test]
    fn test_locale_cmp_is_case_insensitive() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("Apple", "apple"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }
}
