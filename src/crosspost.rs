//! Cross-posting to a dev.to-compatible articles API.

use crate::{
    config::SiteConfig,
    frontmatter::replace_frontmatter,
    log,
    posts::{self, Post},
    rss::guid_from_slug,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, time::Duration};

#[derive(Debug, Serialize)]
struct ArticleRequest {
    title: String,
    body_markdown: String,
    published: bool,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<String>,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    id: u64,
    url: String,
    title: String,
    published: bool,
}

/// Publish a post to the configured articles endpoint.
///
/// Refuses drafts and posts already marked published; on success the
/// source file's frontmatter is rewritten so a re-run refuses too.
pub fn publish(config: &SiteConfig, slug: &str, dry_run: bool) -> Result<()> {
    let post = posts::find_post(config, slug)?;
    post.frontmatter.validate()
        .with_context(|| format!("Invalid frontmatter in `{}`", post.path.display()))?;

    if post.frontmatter.draft {
        bail!("`{slug}` is a draft; remove `draft: true` to publish");
    }
    if post.frontmatter.devto_published() {
        let known = post
            .frontmatter
            .crosspost
            .as_ref()
            .and_then(|c| c.dev_to.as_ref())
            .and_then(|t| t.url.as_deref())
            .unwrap_or("unknown url");
        bail!("`{slug}` is already published ({known})");
    }

    // key check comes before any network traffic
    let api_key = load_api_key(config)?;

    let payload = article_request(&post, config);

    if dry_run {
        log!("publish"; "dry run, payload for `{}`:", config.crosspost.endpoint);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    log!("publish"; "posting `{slug}` to `{}`", config.crosspost.endpoint);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build http client")?;

    let response = client
        .post(&config.crosspost.endpoint)
        .header("api-key", api_key)
        .json(&payload)
        .send()
        .with_context(|| format!("Request to `{}` failed", config.crosspost.endpoint))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        bail!("Publishing `{slug}` failed with {status}: {body}");
    }

    let article: ArticleResponse = response
        .json()
        .context("Failed to parse the article response")?;

    log!(
        "publish";
        "published `{}` at {} (id {}, published: {})",
        article.title, article.url, article.id, article.published
    );

    mark_published(&post, article.id, article.url)
}

/// Rewrite the source file's frontmatter with the publication record.
fn mark_published(post: &Post, id: u64, url: String) -> Result<()> {
    let mut frontmatter = post.frontmatter.clone();
    frontmatter.mark_devto_published(id, url);

    let raw = fs::read_to_string(&post.path)
        .with_context(|| format!("Failed to re-read `{}`", post.path.display()))?;
    let updated = replace_frontmatter(&raw, &frontmatter)?;
    fs::write(&post.path, updated)
        .with_context(|| format!("Failed to update `{}`", post.path.display()))?;

    Ok(())
}

fn article_request(post: &Post, config: &SiteConfig) -> ArticleRequest {
    let canonical_url = post.frontmatter.canonical_url.clone().or_else(|| {
        config
            .base
            .url
            .as_ref()
            .map(|_| guid_from_slug(&post.slug, config))
    });

    let mut body = post.body.trim_end().to_owned();
    if let Some(origin) = &canonical_url {
        body.push_str(&format!(
            "\n\n---\n\n*Originally published at [{origin}]({origin}).*\n"
        ));
    }

    ArticleRequest {
        title: post.frontmatter.title.clone(),
        body_markdown: body,
        published: true,
        tags: normalize_tags(
            post.frontmatter.tags.as_deref().unwrap_or_default(),
            config.crosspost.tag_limit,
        ),
        canonical_url,
        description: post.frontmatter.description.clone(),
    }
}

/// The platform only accepts lowercase alphanumeric tags, and few of them.
fn normalize_tags(tags: &[String], limit: usize) -> Vec<String> {
    tags.iter()
        .map(|tag| {
            tag.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|tag| !tag.is_empty())
        .take(limit)
        .collect()
}

fn load_api_key(config: &SiteConfig) -> Result<String> {
    if let Ok(key) = std::env::var(&config.crosspost.api_key_env) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_owned());
        }
    }

    if let Some(path) = &config.crosspost.api_key_file {
        let key = fs::read_to_string(path)
            .with_context(|| format!("Failed to read api key file `{}`", path.display()))?;
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_owned());
        }
        bail!("Api key file `{}` is empty", path.display());
    }

    bail!(
        "No api key: set ${} or `[crosspost] api_key_file` in the config",
        config.crosspost.api_key_env
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, CrosspostConfig};
    use std::path::Path;

    fn write_post(dir: &Path, rel: &str, frontmatter: &str, body: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("---\n{frontmatter}---\n{body}")).unwrap();
    }

    fn config_for(root: &Path) -> SiteConfig {
        SiteConfig {
            content: ContentConfig {
                dir: root.join("content"),
                ..Default::default()
            },
            crosspost: CrosspostConfig {
                // a name nothing in the environment should carry
                api_key_env: "SCRIV_TEST_MISSING_KEY".into(),
                api_key_file: None,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            "Rust".to_owned(),
            "web-dev".to_owned(),
            "C++".to_owned(),
            "---".to_owned(),
            "extra".to_owned(),
        ];
        assert_eq!(normalize_tags(&tags, 3), vec!["rust", "webdev", "c"]);
    }

    #[test]
    fn test_normalize_tags_empty() {
        assert!(normalize_tags(&[], 4).is_empty());
    }

    #[test]
    fn test_payload_omits_missing_canonical() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n",
            "text\n",
        );
        let config = config_for(tmp.path());
        let post = posts::find_post(&config, "a").unwrap();

        let payload = article_request(&post, &config);
        assert!(payload.canonical_url.is_none());
        assert_eq!(payload.body_markdown, "text");

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("canonical_url"));
        assert!(json.contains("\"published\":true"));
    }

    #[test]
    fn test_payload_uses_site_url_as_canonical() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "posts/a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n",
            "text\n",
        );
        let mut config = config_for(tmp.path());
        config.base.url = Some("https://example.com".into());
        let post = posts::find_post(&config, "posts/a").unwrap();

        let payload = article_request(&post, &config);
        assert_eq!(
            payload.canonical_url.as_deref(),
            Some("https://example.com/posts/a/")
        );
        assert!(payload.body_markdown.contains("Originally published at"));
        assert!(payload.body_markdown.contains("https://example.com/posts/a/"));
    }

    #[test]
    fn test_payload_prefers_explicit_canonical() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\ncanonicalUrl: \"https://mine.dev/a/\"\n",
            "text\n",
        );
        let mut config = config_for(tmp.path());
        config.base.url = Some("https://example.com".into());
        let post = posts::find_post(&config, "a").unwrap();

        let payload = article_request(&post, &config);
        assert_eq!(payload.canonical_url.as_deref(), Some("https://mine.dev/a/"));
    }

    #[test]
    fn test_publish_refuses_draft() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\ndraft: true\n",
            "text\n",
        );
        let config = config_for(tmp.path());

        let err = publish(&config, "a", true).unwrap_err();
        assert!(err.to_string().contains("draft"));
    }

    #[test]
    fn test_publish_refuses_already_published() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n\
             crosspost:\n\x20\x20devTo:\n\x20\x20\x20\x20published: true\n\
             \x20\x20\x20\x20id: 42\n\x20\x20\x20\x20url: \"https://dev.to/x/a\"\n",
            "text\n",
        );
        let config = config_for(tmp.path());

        let err = publish(&config, "a", true).unwrap_err();
        assert!(err.to_string().contains("already published"));
        assert!(err.to_string().contains("https://dev.to/x/a"));
    }

    #[test]
    fn test_publish_fails_without_key_before_network() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n",
            "text\n",
        );
        let config = config_for(tmp.path());

        // dry run would not hit the network anyway; the key check still fires
        let err = publish(&config, "a", true).unwrap_err();
        assert!(err.to_string().contains("SCRIV_TEST_MISSING_KEY"));
    }

    #[test]
    fn test_publish_missing_post() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("content")).unwrap();
        let config = config_for(tmp.path());
        assert!(publish(&config, "nope", true).is_err());
    }

    #[test]
    fn test_dry_run_reads_key_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n",
            "text\n",
        );
        let key_file = tmp.path().join("devto.key");
        fs::write(&key_file, "s3cret\n").unwrap();

        let mut config = config_for(tmp.path());
        config.crosspost.api_key_file = Some(key_file);

        publish(&config, "a", true).unwrap();

        // dry run must leave the source untouched
        let raw = fs::read_to_string(tmp.path().join("content/a.md")).unwrap();
        assert!(!raw.contains("crosspost"));
    }

    #[test]
    fn test_mark_published_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        write_post(
            &tmp.path().join("content"),
            "a.md",
            "title: A\ndescription: d\npublishedAt: \"2024-01-01\"\n",
            "the body\n",
        );
        let config = config_for(tmp.path());
        let post = posts::find_post(&config, "a").unwrap();

        mark_published(&post, 42, "https://dev.to/x/a".into()).unwrap();

        let rewritten = posts::find_post(&config, "a").unwrap();
        assert!(rewritten.frontmatter.devto_published());
        assert!(rewritten.body.contains("the body"));
        let target = rewritten.frontmatter.crosspost.unwrap().dev_to.unwrap();
        assert_eq!(target.id, Some(42));
        assert_eq!(target.url.as_deref(), Some("https://dev.to/x/a"));
    }
}
