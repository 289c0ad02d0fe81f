//! URL and key helpers shared by the filter layer, the auto-linker and the
//! HTTP API.

use std::path::{Path, PathBuf};

use crate::filter::{non_blank, Categorical, ProjectFilter};

/// Comparison key for a category: lower-cased, whitespace runs collapsed to
/// a single `-`.
pub fn category_key(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Comparison key for an industry sector: like [`category_key`] with every
/// `&` replaced by the literal `and`.
pub fn industry_key(value: &str) -> String {
    category_key(&value.replace('&', "and"))
}

pub fn project_path(slug: &str) -> String {
    format!("/projects/{}", slug)
}

pub fn client_path(slug: &str) -> String {
    format!("/clients/{}", slug)
}

pub fn technology_path(slug: &str) -> String {
    format!("/technologies/{}", slug)
}

pub fn tag_path(slug: &str) -> String {
    format!("/tags/{}", slug.to_lowercase())
}

/// Absolute URL for `path` under `base_url`. Trailing slashes are dropped
/// except for the site root.
pub fn canonical_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Listing URL for `page` with the filter's effective categorical value and
/// search query. Page 1 is implicit.
pub fn listing_path(page: usize, filter: &ProjectFilter) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if let Some(query) = filter.search_query() {
        params.push(("search", query.to_string()));
    }
    if let Some(categorical) = filter.effective() {
        let (key, value) = match categorical {
            Categorical::Technology(v) => ("technology", v),
            Categorical::Category(v) => ("category", v),
            Categorical::Industry(v) => ("industry", v),
            Categorical::Client(v) => ("client", v),
        };
        params.push((key, value.to_string()));
    }
    if let Some(tag) = non_blank(&filter.tag) {
        params.push(("tag", tag.to_string()));
    }
    if page > 1 {
        params.push(("page", page.to_string()));
    }

    if params.is_empty() {
        return "/projects".to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode_component(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("/projects?{}", query)
}

/// Percent-encode everything outside the URL unreserved set.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// On-disk location of a content-declared public asset such as
/// `/images/acme.svg`. One leading slash is stripped.
pub fn resolve_public_asset(public_root: &Path, asset: &str) -> PathBuf {
    let relative = asset.strip_prefix('/').unwrap_or(asset);
    public_root.join(relative)
}

pub fn asset_exists(public_root: &Path, asset: &str) -> bool {
    resolve_public_asset(public_root, asset).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_key() {
        assert_eq!(category_key("E-commerce"), "e-commerce");
        assert_eq!(category_key("  Web   App "), "web-app");
    }

    #[test]
    fn test_industry_key_spells_out_ampersand() {
        assert_eq!(industry_key("Retail & Consumer"), "retail-and-consumer");
        assert_eq!(industry_key("R&D"), "randd");
        assert_eq!(industry_key("Health Care"), "health-care");
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(
            canonical_url("https://agency.dev/", "/projects/shop/"),
            "https://agency.dev/projects/shop"
        );
        assert_eq!(canonical_url("https://agency.dev", "/"), "https://agency.dev/");
        assert_eq!(canonical_url("https://agency.dev", "about"), "https://agency.dev/about");
    }

    #[test]
    fn test_listing_path() {
        let mut filter = ProjectFilter::default();
        assert_eq!(listing_path(1, &filter), "/projects");
        assert_eq!(listing_path(3, &filter), "/projects?page=3");

        filter.technology = Some("react".into());
        filter.client = Some("acme".into());
        filter.search = Some("web shop".into());
        assert_eq!(
            listing_path(2, &filter),
            "/projects?search=web%20shop&technology=react&page=2"
        );
    }

    #[test]
    fn test_listing_path_skips_blank_tag() {
        let mut filter = ProjectFilter {
            tag: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(listing_path(2, &filter), "/projects?page=2");

        filter.tag = Some("fintech".into());
        assert_eq!(listing_path(1, &filter), "/projects?tag=fintech");
    }

    #[test]
    fn test_resolve_public_asset() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_public_asset(root, "/images/a.png"),
            PathBuf::from("/srv/public/images/a.png")
        );
        assert_eq!(
            resolve_public_asset(root, "images/a.png"),
            PathBuf::from("/srv/public/images/a.png")
        );
    }
}
