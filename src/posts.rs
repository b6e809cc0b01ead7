//! Post collection.
//!
//! Walks the content directory for Markdown posts and derives their
//! URL slugs from the file layout.

use crate::{
    config::SiteConfig,
    frontmatter::Frontmatter,
    utils::date::DateTimeUtc,
};
use anyhow::{Context, Result, anyhow, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

pub const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store"];

/// A parsed post on disk
#[derive(Debug)]
pub struct Post {
    pub path: PathBuf,
    pub slug: String,
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Post {
    /// Read and parse a single post file.
    pub fn load(path: &Path, content_dir: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read post: {}", path.display()))?;
        let (frontmatter, body) = Frontmatter::from_post(&raw)
            .with_context(|| format!("In post: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            slug: post_slug(path, content_dir)?,
            frontmatter,
            body: body.to_owned(),
        })
    }

    /// Published date, `None` when the frontmatter date fails to parse.
    pub fn published(&self) -> Option<DateTimeUtc> {
        DateTimeUtc::parse(&self.frontmatter.published_at)
    }
}

/// Derive a post's slug from its path relative to the content dir.
///
/// `content/posts/Hello World.md` → `posts/hello-world`
pub fn post_slug(path: &Path, content_dir: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(content_dir)
        .with_context(|| format!("Post outside content dir: {}", path.display()))?
        .with_extension("");

    let parts: Vec<String> = relative
        .components()
        .map(|c| slug::slugify(c.as_os_str().to_string_lossy()))
        .collect();

    if parts.is_empty() || parts.iter().any(String::is_empty) {
        bail!("Cannot derive slug from: {}", path.display());
    }

    Ok(parts.join("/"))
}

/// Collect every `.md` post under the content dir.
pub fn collect_posts(config: &SiteConfig) -> Result<Vec<Post>> {
    let content_dir = &config.content.dir;
    if !content_dir.is_dir() {
        bail!("Content directory not found: {}", content_dir.display());
    }

    let mut posts = Vec::new();
    for entry in post_files(content_dir) {
        posts.push(Post::load(&entry, content_dir)?);
    }

    Ok(posts)
}

/// Resolve a CLI slug to exactly one post.
pub fn find_post(config: &SiteConfig, slug: &str) -> Result<Post> {
    let content_dir = &config.content.dir;
    if !content_dir.is_dir() {
        bail!("Content directory not found: {}", content_dir.display());
    }

    post_files(content_dir)
        .into_iter()
        .find(|path| post_slug(path, content_dir).is_ok_and(|s| s == slug))
        .map(|path| Post::load(&path, content_dir))
        .ok_or_else(|| {
            anyhow!(
                "No post with slug `{slug}` under {}",
                content_dir.display()
            )
        })?
}

/// Sort newest-first by published date; unparseable dates sink to the end.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_key(|post| {
        let key = post
            .published()
            .map(|d| (d.year, d.month, d.day, d.hour, d.minute, d.second));
        std::cmp::Reverse(key)
    });
}

fn post_files(content_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name().to_string_lossy().as_ref()))
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path().extension().is_some_and(|ext| ext == "md")
                && !IGNORED_FILE_NAMES.contains(&e.file_name().to_string_lossy().as_ref())
        })
        .map(|e| e.into_path())
        .collect()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.') && name.len() > 1
}
