//! Post frontmatter parsing and validation.
//!
//! A post is a Markdown file opening with a YAML block between `---`
//! lines. Only the first block counts; `---` later in the body is body.

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::utils::date::DateTimeUtc;

/// Post metadata as written by hand in the YAML block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,

    /// "YYYY-MM-DD" or RFC3339
    pub published_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub draft: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crosspost: Option<Crosspost>,
}

/// Per-platform cross-post state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Crosspost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_to: Option<CrosspostTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<CrosspostTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CrosspostTarget {
    #[serde(default)]
    pub published: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Split a raw post into its YAML frontmatter and Markdown body.
///
/// Returns `None` when no valid block exists (missing opening `---`
/// or unterminated block). Tolerates CRLF line endings.
pub fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let mut lines = raw.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut pos = first.len();
    for line in lines {
        if line.trim_end() == "---" {
            let yaml = &raw[first.len()..pos];
            let body = &raw[pos + line.len()..];
            return Some((yaml, body));
        }
        pos += line.len();
    }

    None
}

impl Frontmatter {
    /// Parse the YAML block. Unknown fields are rejected.
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse frontmatter")
    }

    /// Parse a whole post file into frontmatter and body.
    pub fn from_post(raw: &str) -> Result<(Self, &str)> {
        let (yaml, body) =
            split_frontmatter(raw).context("Post has no frontmatter block (`---` ... `---`)")?;
        Ok((Self::parse(yaml)?, body))
    }

    /// Field-level validation beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        static RE_TAG: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap());

        if self.title.trim().is_empty() {
            bail!("`title` must not be empty");
        }
        if self.description.trim().is_empty() {
            bail!("`description` must not be empty");
        }

        if DateTimeUtc::parse(&self.published_at).is_none() {
            bail!(
                "`publishedAt` must be YYYY-MM-DD or RFC3339, got: {}",
                self.published_at
            );
        }
        if let Some(updated) = &self.updated_at
            && DateTimeUtc::parse(updated).is_none()
        {
            bail!("`updatedAt` must be YYYY-MM-DD or RFC3339, got: {updated}");
        }

        if let Some(tags) = &self.tags {
            for tag in tags {
                if !RE_TAG.is_match(tag) {
                    bail!("tag must be lowercase alphanumeric (dashes allowed): `{tag}`");
                }
            }
        }

        if let Some(url) = &self.canonical_url
            && !url.starts_with("http")
        {
            bail!("`canonicalUrl` must start with http:// or https://, got: {url}");
        }

        Ok(())
    }

    /// True when this post was already pushed to the article platform.
    pub fn devto_published(&self) -> bool {
        self.crosspost
            .as_ref()
            .and_then(|c| c.dev_to.as_ref())
            .is_some_and(|t| t.published)
    }

    /// Record a successful cross-post.
    pub fn mark_devto_published(&mut self, id: u64, url: String) {
        let crosspost = self.crosspost.get_or_insert_with(Crosspost::default);
        crosspost.dev_to = Some(CrosspostTarget {
            published: true,
            id: Some(id),
            url: Some(url),
        });
    }
}

/// Re-assemble a post file with updated frontmatter, body untouched.
pub fn replace_frontmatter(raw: &str, frontmatter: &Frontmatter) -> Result<String> {
    let (_, body) =
        split_frontmatter(raw).context("Post has no frontmatter block (`---` ... `---`)")?;
    let yaml = serde_yaml::to_string(frontmatter).context("Failed to serialize frontmatter")?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "---\n\
        title: Hello\n\
        description: First post\n\
        publishedAt: 2024-01-15\n\
        tags:\n\
        - rust\n\
        - cli\n\
        ---\n\
        \n\
        Body text.\n";

    #[test]
    fn test_split_frontmatter() {
        let (yaml, body) = split_frontmatter(POST).unwrap();
        assert!(yaml.contains("title: Hello"));
        assert_eq!(body, "\nBody text.\n");
    }

    #[test]
    fn test_split_frontmatter_missing_open() {
        assert!(split_frontmatter("title: Hello\n").is_none());
        assert!(split_frontmatter("").is_none());
    }

    #[test]
    fn test_split_frontmatter_unterminated() {
        assert!(split_frontmatter("---\ntitle: Hello\n").is_none());
    }

    #[test]
    fn test_split_frontmatter_crlf() {
        let raw = "---\r\ntitle: Hello\r\n---\r\nbody\r\n";
        let (yaml, body) = split_frontmatter(raw).unwrap();
        assert_eq!(yaml, "title: Hello\r\n");
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn test_split_frontmatter_dashes_in_body() {
        let raw = "---\ntitle: x\n---\nfirst\n---\nsecond\n";
        let (_, body) = split_frontmatter(raw).unwrap();
        assert_eq!(body, "first\n---\nsecond\n");
    }

    #[test]
    fn test_split_frontmatter_empty_body() {
        let raw = "---\ntitle: x\n---";
        let (yaml, body) = split_frontmatter(raw).unwrap();
        assert_eq!(yaml, "title: x\n");
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_full_post() {
        let (fm, body) = Frontmatter::from_post(POST).unwrap();
        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.description, "First post");
        assert_eq!(fm.published_at, "2024-01-15");
        assert_eq!(fm.tags, Some(vec!["rust".into(), "cli".into()]));
        assert!(!fm.draft);
        assert!(body.contains("Body text."));
        fm.validate().unwrap();
    }

    #[test]
    fn test_parse_crosspost_state() {
        let yaml = "\
            title: Hello\n\
            description: d\n\
            publishedAt: 2024-01-15\n\
            crosspost:\n\
            \x20 devTo:\n\
            \x20   published: true\n\
            \x20   id: 123\n\
            \x20   url: https://dev.to/u/hello\n";
        let fm = Frontmatter::parse(yaml).unwrap();
        assert!(fm.devto_published());
        let devto = fm.crosspost.unwrap().dev_to.unwrap();
        assert_eq!(devto.id, Some(123));
        assert_eq!(devto.url.as_deref(), Some("https://dev.to/u/hello"));
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let yaml = "title: x\ndescription: y\npublishedAt: 2024-01-01\nbogus: z\n";
        assert!(Frontmatter::parse(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let fm = Frontmatter {
            title: "t".into(),
            description: "d".into(),
            published_at: "January 2024".into(),
            ..Default::default()
        };
        assert!(fm.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        let fm = Frontmatter {
            title: "  ".into(),
            description: "d".into(),
            published_at: "2024-01-01".into(),
            ..Default::default()
        };
        assert!(fm.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tag() {
        let fm = Frontmatter {
            title: "t".into(),
            description: "d".into(),
            published_at: "2024-01-01".into(),
            tags: Some(vec!["Rust Lang".into()]),
            ..Default::default()
        };
        assert!(fm.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_canonical_url() {
        let fm = Frontmatter {
            title: "t".into(),
            description: "d".into(),
            published_at: "2024-01-01".into(),
            canonical_url: Some("example.com/post".into()),
            ..Default::default()
        };
        assert!(fm.validate().is_err());
    }

    #[test]
    fn test_replace_frontmatter_marks_published() {
        let (mut fm, _) = Frontmatter::from_post(POST).unwrap();
        fm.mark_devto_published(42, "https://dev.to/u/hello-1a2b".into());

        let rewritten = replace_frontmatter(POST, &fm).unwrap();
        assert!(rewritten.ends_with("\nBody text.\n"));

        let (reparsed, body) = Frontmatter::from_post(&rewritten).unwrap();
        assert!(reparsed.devto_published());
        assert_eq!(
            reparsed.crosspost.unwrap().dev_to.unwrap().id,
            Some(42)
        );
        assert_eq!(body, "\nBody text.\n");
    }
}
