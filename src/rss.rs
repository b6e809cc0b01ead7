//! RSS feed generation.
//!
//! Maps non-draft posts into a validated RSS channel.

use crate::{
    config::SiteConfig,
    log,
    posts::{self, Post},
};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::{fs, sync::LazyLock};

pub struct RssFeed {
    title: String,
    description: String,
    base_url: String,
    language: String,
    generator: String,
    items: Vec<FeedItem>,
}

struct FeedItem {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    author: Option<String>,
}

/// Generate and write the feed. Entry point for the `rss` command.
pub fn build_rss(config: &'static SiteConfig) -> Result<()> {
    let feed = RssFeed::new(config)?;
    feed.write_to_file(config)
}

/// Build the permalink GUID for a post slug.
///
/// Percent-encodes path segments but keeps `/` readable.
pub fn guid_from_slug(slug: &str, config: &SiteConfig) -> String {
    let base_url = config.base.url.clone().unwrap_or_default();
    let encoded = urlencoding::encode(slug).into_owned();
    let encoded = encoded.replace("%2F", "/");
    format!("{}/{}/", base_url.trim_end_matches('/'), encoded)
}

impl RssFeed {
    pub fn new(config: &'static SiteConfig) -> Result<Self> {
        log!("rss"; "generating rss feed started");

        let mut posts = posts::collect_posts(config)?;
        posts.retain(|post| !post.frontmatter.draft);
        posts::sort_newest_first(&mut posts);

        if let Some(limit) = config.rss.limit {
            posts.truncate(limit);
        }

        let items = posts
            .iter()
            .filter_map(|post| feed_item(post, config))
            .collect();

        Ok(Self {
            title: config.base.title.clone(),
            description: config.base.description.clone(),
            base_url: config.base.url.clone().unwrap_or_default(),
            language: config.base.language.clone(),
            generator: "scriv".to_string(),
            items,
        })
    }

    fn into_rss_xml(self) -> Result<String> {
        let items: Vec<_> = self
            .items
            .into_iter()
            .map(|item| {
                ItemBuilder::default()
                    .title(item.title)
                    .link(item.link.clone())
                    .guid(
                        GuidBuilder::default()
                            .permalink(true)
                            .value(item.link)
                            .build(),
                    )
                    .description(item.description)
                    .pub_date(item.pub_date)
                    .author(item.author)
                    .build()
            })
            .collect();

        let channel = ChannelBuilder::default()
            .title(self.title)
            .link(self.base_url)
            .description(self.description)
            .language(self.language)
            .generator(self.generator)
            .items(items)
            .build();

        channel
            .validate()
            .map_err(|e| anyhow!("rss validate: {e}"))?;

        Ok(channel.to_string())
    }

    pub fn write_to_file(self, config: &SiteConfig) -> Result<()> {
        let xml = self.into_rss_xml()?;
        let rss_path = config.rss.path.as_path();
        if let Some(parent) = rss_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(rss_path, xml)?;

        log!("rss"; "rss feed written successfully");
        Ok(())
    }
}

/// Map a post to a feed item; unparseable dates are skipped with a warning.
fn feed_item(post: &Post, config: &SiteConfig) -> Option<FeedItem> {
    let Some(date) = post.published() else {
        log!("rss"; "skipping `{}`: bad publishedAt `{}`",
            post.slug, post.frontmatter.published_at);
        return None;
    };

    Some(FeedItem {
        title: post.frontmatter.title.clone(),
        link: guid_from_slug(&post.slug, config),
        description: post.frontmatter.description.clone(),
        pub_date: date.to_rfc2822(),
        author: correct_rss_author(Some(&config.base.author), config),
    })
}

// Example for valid author(for rss): "bob@xxx.com (Bob)"
// Priority for looking up author and email:
// 1. `author` already in valid form
// 2. Combine `email` and `author` from scriv.toml
fn correct_rss_author(author: Option<&String>, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\s*\([^)]+\)$").unwrap()
    });

    let author = author?;
    let author = match RE_VALID_AUTHOR.is_match(author) {
        true => author.to_owned(),
        false => format!("{} ({})", config.base.email, author),
    };
    Some(author)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BaseConfig, ContentConfig};
    use std::path::Path;

    fn config_with_base(root: &Path) -> SiteConfig {
        SiteConfig {
            base: BaseConfig {
                title: "Ada's Notes".into(),
                description: "Blog".into(),
                author: "Ada".into(),
                email: "ada@example.com".into(),
                url: Some("https://ada.example.com".into()),
                language: "en".into(),
            },
            content: ContentConfig {
                dir: root.join("content"),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn leak(config: SiteConfig) -> &'static SiteConfig {
        Box::leak(Box::new(config))
    }

    fn write_post(content: &Path, rel: &str, extra: &str) {
        let path = content.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            format!(
                "---\ntitle: {rel}\ndescription: d\npublishedAt: 2024-01-15\n{extra}---\nbody\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_guid_from_slug() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_with_base(tmp.path());
        assert_eq!(
            guid_from_slug("posts/hello-world", &config),
            "https://ada.example.com/posts/hello-world/"
        );
    }

    #[test]
    fn test_guid_percent_encodes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_with_base(tmp.path());
        let guid = guid_from_slug("posts/café", &config);
        assert!(guid.starts_with("https://ada.example.com/posts/"));
        assert!(!guid.contains('é'));
        assert!(guid.contains('/'));
    }

    #[test]
    fn test_correct_rss_author_combines_email() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_with_base(tmp.path());
        let author = correct_rss_author(Some(&"Ada".to_string()), &config);
        assert_eq!(author.as_deref(), Some("ada@example.com (Ada)"));
    }

    #[test]
    fn test_correct_rss_author_accepts_valid_form() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_with_base(tmp.path());
        let valid = "bob@example.org (Bob)".to_string();
        let author = correct_rss_author(Some(&valid), &config);
        assert_eq!(author.as_deref(), Some("bob@example.org (Bob)"));
    }

    #[test]
    fn test_feed_excludes_drafts_and_bad_dates() {
        let tmp = tempfile::tempdir().unwrap();
        let content = tmp.path().join("content");
        write_post(&content, "good.md", "");
        write_post(&content, "hidden.md", "draft: true\n");

        let broken = content.join("broken.md");
        std::fs::write(
            &broken,
            "---\ntitle: broken\ndescription: d\npublishedAt: someday\n---\nbody\n",
        )
        .unwrap();

        let config = leak(config_with_base(tmp.path()));
        let feed = RssFeed::new(config).unwrap();
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "good.md");
    }

    #[test]
    fn test_feed_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let content = tmp.path().join("content");
        write_post(&content, "a.md", "");
        write_post(&content, "b.md", "");
        write_post(&content, "c.md", "");

        let mut config = config_with_base(tmp.path());
        config.rss.limit = Some(2);
        let feed = RssFeed::new(leak(config)).unwrap();
        assert_eq!(feed.items.len(), 2);
    }

    #[test]
    fn test_feed_xml_is_valid_rss() {
        let tmp = tempfile::tempdir().unwrap();
        let content = tmp.path().join("content");
        write_post(&content, "only.md", "");

        let config = leak(config_with_base(tmp.path()));
        let xml = RssFeed::new(config).unwrap().into_rss_xml().unwrap();
        assert!(xml.contains("<rss"));
        assert!(xml.contains("s Notes"));
        assert!(xml.contains("https://ada.example.com/only/"));
        assert!(xml.contains("15 Jan 2024"));
    }
}
