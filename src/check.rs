//! Content validation for the `check` command.

use crate::{config::SiteConfig, cv::schema::CvDocument, log, posts};
use anyhow::{Result, bail};

/// Validate every post's frontmatter plus the CV document.
///
/// All failures are reported before the command fails; a single bad post
/// never hides the others.
pub fn run_checks(config: &SiteConfig) -> Result<()> {
    let mut failures = 0usize;

    let posts = posts::collect_posts(config)?;
    log!("check"; "checking {} posts", posts.len());

    for post in &posts {
        if let Err(e) = post.frontmatter.validate() {
            failures += 1;
            log!("check"; "post `{}`: {e:#}", post.slug);
        }
    }

    if config.cv.data.is_file() {
        match CvDocument::from_path(&config.cv.data) {
            Ok(doc) => {
                if let Err(e) = doc.validate() {
                    failures += 1;
                    log!("check"; "cv `{}`: {e:#}", config.cv.data.display());
                }
            }
            Err(e) => {
                failures += 1;
                log!("check"; "{e:#}");
            }
        }
    } else {
        log!("check"; "no cv document at `{}`, skipping", config.cv.data.display());
    }

    if failures > 0 {
        bail!("{failures} check(s) failed");
    }

    log!("check"; "all checks passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, CvConfig};
    use std::{fs, path::Path};

    fn config_for(root: &Path) -> SiteConfig {
        SiteConfig {
            content: ContentConfig {
                dir: root.join("content"),
                ..Default::default()
            },
            cv: CvConfig {
                data: root.join("cv.json"),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_all_valid() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "content/a.md",
            "---\ntitle: A\ndescription: d\npublishedAt: \"2024-01-01\"\n---\nbody\n",
        );
        write(
            tmp.path(),
            "cv.json",
            crate::init::SAMPLE_CV_JSON,
        );

        assert!(run_checks(&config_for(tmp.path())).is_ok());
    }

    #[test]
    fn test_counts_every_failure() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "content/bad-date.md",
            "---\ntitle: A\ndescription: d\npublishedAt: \"not a date\"\n---\nbody\n",
        );
        write(
            tmp.path(),
            "content/bad-tag.md",
            "---\ntitle: B\ndescription: d\npublishedAt: \"2024-01-01\"\ntags: [\"Bad Tag\"]\n---\nbody\n",
        );

        let err = run_checks(&config_for(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("2 check(s) failed"));
    }

    #[test]
    fn test_missing_cv_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "content/a.md",
            "---\ntitle: A\ndescription: d\npublishedAt: \"2024-01-01\"\n---\nbody\n",
        );

        assert!(run_checks(&config_for(tmp.path())).is_ok());
    }

    #[test]
    fn test_invalid_cv_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "content/a.md",
            "---\ntitle: A\ndescription: d\npublishedAt: \"2024-01-01\"\n---\nbody\n",
        );
        write(tmp.path(), "cv.json", "{ not json");

        let err = run_checks(&config_for(tmp.path())).unwrap_err();
        assert!(err.to_string().contains("1 check(s) failed"));
    }

    #[test]
    fn test_post_with_bad_frontmatter_block_fails_collection() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "content/broken.md", "no frontmatter at all\n");

        // a file that cannot even be parsed fails at collection time
        assert!(run_checks(&config_for(tmp.path())).is_err());
    }
}
