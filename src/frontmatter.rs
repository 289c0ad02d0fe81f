//! Front-matter splitting and typed parsing.
//!
//! Every content file is a YAML block fenced by `---` lines followed by a
//! free-text body. [`parse`] splits the two and deserializes the block into
//! the caller's front-matter struct, so a record is either fully typed or
//! rejected.

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const FENCE: &str = "---";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front-matter block is not closed by a `---` line")]
    Unterminated,

    #[error("invalid front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A parsed content file: typed metadata plus the raw body.
#[derive(Debug, Clone)]
pub struct Document<T> {
    pub meta: T,
    pub body: String,
}

/// Split `source` into its front-matter block and body.
///
/// Files without an opening fence have an empty block and the whole text as
/// body.
pub fn split(source: &str) -> Result<(&str, &str), FrontMatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let Some(rest) = strip_fence_line(source) else {
        return Ok(("", source));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return Ok((block, body));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn strip_fence_line(source: &str) -> Option<&str> {
    let rest = source.strip_prefix(FENCE)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Parse a content file into typed metadata and body.
pub fn parse<T: DeserializeOwned>(source: &str) -> Result<Document<T>, FrontMatterError> {
    let (block, body) = split(source)?;
    let meta = if block.trim().is_empty() {
        serde_yaml::from_value(serde_yaml::Value::Mapping(Default::default()))?
    } else {
        serde_yaml::from_str(block)?
    };
    Ok(Document {
        meta,
        body: body.to_string(),
    })
}

/// Parse a front-matter date: `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Meta {
        name: String,
        #[serde(default)]
        logo: Option<String>,
    }

    #[test]
    fn test_split_block_and_body() {
        let (block, body) = split("---\nname: Acme\n---\nHello\n").unwrap();
        assert_eq!(block, "name: Acme\n");
        assert_eq!(body, "Hello\n");
    }

    #[test]
    fn test_no_front_matter_is_all_body() {
        let (block, body) = split("Just text").unwrap();
        assert_eq!(block, "");
        assert_eq!(body, "Just text");
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let err = split("---\nname: Acme\nno fence").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_crlf_fences() {
        let doc: Document<Meta> = parse("---\r\nname: Acme\r\n---\r\nBody").unwrap();
        assert_eq!(doc.meta.name, "Acme");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_unknown_keys_ignored_and_optional_defaulted() {
        let doc: Document<Meta> = parse("---\nname: Acme\nwebsite: x\n---\n").unwrap();
        assert_eq!(doc.meta.name, "Acme");
        assert!(doc.meta.logo.is_none());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_missing_required_key_rejected() {
        let err = parse::<Meta>("---\nlogo: /a.png\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_missing_block_rejects_required_fields() {
        assert!(parse::<Meta>("plain body").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(d));
        assert_eq!(parse_date("2024-03-09T10:30:00Z"), Some(d));
        assert_eq!(parse_date("March 9"), None);
    }
}
