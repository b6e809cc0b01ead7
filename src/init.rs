//! Project scaffolding for the `init` command.

use crate::{config::SiteConfig, config::config_defaults, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Starter post, complete frontmatter included.
const SAMPLE_POST: &str = r#"---
title: "Hello World"
description: "The first post on this site."
publishedAt: "2024-01-01"
tags:
  - "meta"
draft: true
---

Welcome! Edit this post, set `draft: false`, and run `scriv check`.

Posts live under `content/` as Markdown files with a YAML frontmatter
block. The file path (minus extension) becomes the post slug.
"#;

/// Starter CV document. Passes `scriv check` as-is.
pub const SAMPLE_CV_JSON: &str = r#"{
  "personal": {
    "name": "Ada Example",
    "label": "Software Engineer",
    "email": "ada@example.com",
    "location": "Berlin, Germany",
    "website": "https://example.com",
    "profiles": [
      { "network": "GitHub", "url": "https://github.com/ada-example" },
      { "network": "LinkedIn", "url": "https://linkedin.com/in/ada-example" }
    ]
  },
  "summary": "Engineer with a focus on backend services and developer tooling. Enjoys small, sharp tools and writing about them.",
  "experience": [
    {
      "title": "Senior Platform Engineer",
      "company": "Acme GmbH",
      "location": "Berlin",
      "startDate": "2021-03",
      "achievements": [
        "Cut median deploy time from 40 to 6 minutes",
        "Led the migration of 30 services to a shared build pipeline"
      ],
      "technologies": ["Rust", "PostgreSQL", "Kubernetes"]
    },
    {
      "title": "Backend Developer",
      "company": "Widget AG",
      "startDate": "2018-06",
      "endDate": "2021-02",
      "achievements": [
        "Built the public REST API serving 2M requests a day"
      ],
      "technologies": ["Go", "Redis"]
    }
  ],
  "skills": {
    "technical": [
      { "category": "Languages", "items": ["Rust", "Go", "SQL"] },
      { "category": "Infrastructure", "items": ["Kubernetes", "Terraform"] }
    ],
    "soft": ["Mentoring", "Technical writing"]
  },
  "education": [
    {
      "degree": "B.Sc. Computer Science",
      "institution": "TU Berlin",
      "startDate": "2014-10",
      "endDate": "2018-03",
      "details": ["Thesis on distributed build caching"]
    }
  ],
  "projects": [
    {
      "name": "crateview",
      "description": "Terminal dashboard for crates.io download stats.",
      "url": "https://github.com/ada-example/crateview",
      "technologies": ["Rust"]
    }
  ],
  "certifications": [
    {
      "name": "CKA",
      "issuer": "Cloud Native Computing Foundation",
      "date": "2022-05"
    }
  ],
  "languages": [
    { "language": "German", "level": "Native" },
    { "language": "English", "level": "C1" }
  ]
}
"#;

/// Scaffold a new project at the config root.
///
/// `named` is true when the user passed a directory name; without one the
/// current directory must be empty.
pub fn scaffold(config: &SiteConfig, named: bool) -> Result<()> {
    let root = config.get_root();

    if named {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create `{}`", root.display()))?;
    } else if !is_empty_dir(root)? {
        bail!(
            "Directory `{}` is not empty; pass a name to scaffold into a new directory",
            root.display()
        );
    }

    write_new(&root.join("scriv.toml"), &starter_config_toml()?)?;
    fs::create_dir_all(root.join("content"))?;
    write_new(&root.join("content/hello-world.md"), SAMPLE_POST)?;
    write_new(&root.join("cv.json"), SAMPLE_CV_JSON)?;
    write_new(
        &root.join(".gitignore"),
        &format!("/{}\n", config_defaults::content::output().display()),
    )?;

    log!("init"; "scaffolded project at `{}`", root.display());
    Ok(())
}

fn starter_config_toml() -> Result<String> {
    let mut config = SiteConfig::default();
    config.base.title = "My Notes".to_owned();
    config.base.description = "Notes on software and whatever else".to_owned();

    toml::to_string_pretty(&config).context("Failed to serialize default config")
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    if !path.is_dir() {
        bail!("`{}` is not a directory", path.display());
    }
    let mut entries = fs::read_dir(path)
        .with_context(|| format!("Failed to read `{}`", path.display()))?;
    Ok(entries.next().is_none())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        bail!("Refusing to overwrite `{}`", path.display());
    }
    fs::write(path, content).with_context(|| format!("Failed to write `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_rooted(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config
    }

    #[test]
    fn test_scaffold_into_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_rooted(tmp.path());

        scaffold(&config, false).unwrap();

        for file in ["scriv.toml", "content/hello-world.md", "cv.json", ".gitignore"] {
            assert!(tmp.path().join(file).is_file(), "missing {file}");
        }
    }

    #[test]
    fn test_scaffold_refuses_non_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("existing.txt"), "x").unwrap();
        let config = config_rooted(tmp.path());

        let err = scaffold(&config, false).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_scaffold_named_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("my-site");
        let config = config_rooted(&target);

        scaffold(&config, true).unwrap();
        assert!(target.join("scriv.toml").is_file());
    }

    #[test]
    fn test_scaffold_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("site");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("scriv.toml"), "old").unwrap();
        let config = config_rooted(&target);

        let err = scaffold(&config, true).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"));
        assert_eq!(fs::read_to_string(target.join("scriv.toml")).unwrap(), "old");
    }

    #[test]
    fn test_starter_config_parses_back() {
        let toml = starter_config_toml().unwrap();
        let config = SiteConfig::from_str(&toml).unwrap();
        assert_eq!(config.base.title, "My Notes");
        assert!(config.rss.enable);
        assert_eq!(config.crosspost.api_key_env, "DEVTO_API_KEY");
    }

    #[test]
    fn test_sample_post_parses_and_validates() {
        let (frontmatter, body) = crate::frontmatter::Frontmatter::from_post(SAMPLE_POST).unwrap();
        frontmatter.validate().unwrap();
        assert!(frontmatter.draft);
        assert!(!body.trim().is_empty());
    }

    #[test]
    fn test_sample_cv_parses_and_validates() {
        let doc: crate::cv::schema::CvDocument = serde_json::from_str(SAMPLE_CV_JSON).unwrap();
        doc.validate().unwrap();
    }
}
