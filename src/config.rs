//! Site configuration management.
//!
//! Handles loading, parsing, and validating the `scriv.toml` configuration file.

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default values for serde deserialization
pub mod config_defaults {
    pub fn r#true() -> bool {
        true
    }

    pub fn r#false() -> bool {
        false
    }

    pub mod base {
        pub fn url() -> Option<String> {
            None
        }
        pub fn author() -> String {
            "<YOUR_NAME>".into()
        }
        pub fn email() -> String {
            "user@noreply.scriv".into()
        }
        pub fn language() -> String {
            "en".into()
        }
    }

    pub mod content {
        use std::path::PathBuf;

        pub fn root() -> Option<PathBuf> {
            None
        }
        pub fn dir() -> PathBuf {
            "content".into()
        }
        pub fn output() -> PathBuf {
            "public".into()
        }
    }

    pub mod rss {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "feed.xml".into()
        }
        pub fn limit() -> Option<usize> {
            None
        }
    }

    pub mod cv {
        use std::path::PathBuf;

        pub fn data() -> PathBuf {
            "cv.json".into()
        }
        pub fn output() -> PathBuf {
            "public/cv".into()
        }
    }

    pub mod pdf {
        pub fn browser() -> Vec<String> {
            Vec::new()
        }
        pub fn page_size() -> String {
            "A4".into()
        }
    }

    pub mod crosspost {
        use std::path::PathBuf;

        pub fn endpoint() -> String {
            "https://dev.to/api/articles".into()
        }
        pub fn api_key_env() -> String {
            "DEVTO_API_KEY".into()
        }
        pub fn api_key_file() -> Option<PathBuf> {
            None
        }
        pub fn tag_limit() -> usize {
            4
        }
    }
}

/// `[base]` section in scriv.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title
    pub title: String,

    /// Author name, e.g.: "Bob"
    #[serde(default = "config_defaults::base::author")]
    #[educe(Default = config_defaults::base::author())]
    pub author: String,

    /// Author email, e.g.: "bob@example.com"
    #[serde(default = "config_defaults::base::email")]
    #[educe(Default = config_defaults::base::email())]
    pub email: String,

    /// Site description
    pub description: String,

    /// Base URL for feed links and canonical URLs, e.g.: "https://example.com"
    #[serde(default = "config_defaults::base::url")]
    #[educe(Default = config_defaults::base::url())]
    pub url: Option<String>,

    /// Language code, e.g.: "en", "de"
    #[serde(default = "config_defaults::base::language")]
    #[educe(Default = config_defaults::base::language())]
    pub language: String,
}

/// `[content]` section in scriv.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Root directory path
    #[serde(default = "config_defaults::content::root")]
    #[educe(Default = config_defaults::content::root())]
    pub root: Option<PathBuf>,

    /// Posts directory path (relative to root)
    #[serde(default = "config_defaults::content::dir")]
    #[educe(Default = config_defaults::content::dir())]
    pub dir: PathBuf,

    /// Output directory path (relative to root)
    #[serde(default = "config_defaults::content::output")]
    #[educe(Default = config_defaults::content::output())]
    pub output: PathBuf,
}

/// `[rss]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    /// Enable RSS feed generation
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// Output path for RSS feed file (relative to output dir)
    #[serde(default = "config_defaults::rss::path")]
    #[educe(Default = config_defaults::rss::path())]
    pub path: PathBuf,

    /// Max number of feed items (newest first)
    #[serde(default = "config_defaults::rss::limit")]
    #[educe(Default = config_defaults::rss::limit())]
    pub limit: Option<usize>,
}

/// `[cv]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CvConfig {
    /// CV data file (relative to root)
    #[serde(default = "config_defaults::cv::data")]
    #[educe(Default = config_defaults::cv::data())]
    pub data: PathBuf,

    /// Output directory for the rendered CV page
    #[serde(default = "config_defaults::cv::output")]
    #[educe(Default = config_defaults::cv::output())]
    pub output: PathBuf,

    /// Minify the rendered HTML page
    #[serde(default = "config_defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,
}

/// `[pdf]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PdfConfig {
    /// Browser command and arguments; empty means probe known browsers
    #[serde(default = "config_defaults::pdf::browser")]
    #[educe(Default = config_defaults::pdf::browser())]
    pub browser: Vec<String>,

    /// CSS page size for wrapped Markdown input, e.g.: "A4", "Letter"
    #[serde(default = "config_defaults::pdf::page_size")]
    #[educe(Default = config_defaults::pdf::page_size())]
    pub page_size: String,

    /// Keep the intermediate HTML next to the PDF
    #[serde(default = "config_defaults::r#false")]
    #[educe(Default = false)]
    pub keep_html: bool,
}

/// `[crosspost]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CrosspostConfig {
    /// Article API endpoint
    #[serde(default = "config_defaults::crosspost::endpoint")]
    #[educe(Default = config_defaults::crosspost::endpoint())]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "config_defaults::crosspost::api_key_env")]
    #[educe(Default = config_defaults::crosspost::api_key_env())]
    pub api_key_env: String,

    /// Path to file containing the API key, used when the env var is unset.
    /// WARNING: Never commit this key to a public repository!
    #[serde(default = "config_defaults::crosspost::api_key_file")]
    #[educe(Default = config_defaults::crosspost::api_key_file())]
    pub api_key_file: Option<PathBuf>,

    /// Max number of tags the platform accepts
    #[serde(default = "config_defaults::crosspost::tag_limit")]
    #[educe(Default = config_defaults::crosspost::tag_limit())]
    pub tag_limit: usize,
}

/// Root configuration structure representing scriv.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Content locations
    #[serde(default)]
    pub content: ContentConfig,

    /// RSS feed settings
    #[serde(default)]
    pub rss: RssConfig,

    /// CV data and rendering settings
    #[serde(default)]
    pub cv: CvConfig,

    /// PDF export settings
    #[serde(default)]
    pub pdf: PdfConfig,

    /// Cross-post publisher settings
    #[serde(default)]
    pub crosspost: CrosspostConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.content.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.content.root = Some(path.to_path_buf())
    }

    /// Get CLI arguments reference
    pub fn get_cli(&self) -> &'static Cli {
        self.cli.unwrap()
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let mut root = cli.root.as_ref().cloned().unwrap_or_else(|| self.get_root().to_owned());
        if let Commands::Init { name: Some(name) } = &cli.command {
            root = root.join(name);
        }
        self.update_path_with_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory
    fn update_path_with_root(&mut self, root: &Path) {
        let cli = self.get_cli();

        self.set_root(root);
        Self::update_option(&mut self.content.dir, cli.content.as_ref());
        Self::update_option(&mut self.content.output, cli.output.as_ref());

        self.content.dir = root.join(&self.content.dir);
        self.content.output = root.join(&self.content.output);
        self.rss.path = self.content.output.join(&self.rss.path);
        self.cv.data = root.join(&self.cv.data);
        self.cv.output = root.join(&self.cv.output);

        if let Some(key_path) = &self.crosspost.api_key_file {
            let path = shellexpand::tilde(key_path.to_str().unwrap_or_default()).into_owned();
            let path = PathBuf::from(path);
            self.crosspost.api_key_file = if path.is_relative() {
                Some(root.join(path))
            } else {
                Some(path)
            };
        }
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        let cli = self.get_cli();

        if !self.get_root().join(&cli.config).exists() {
            bail!("Config file not found");
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        match &cli.command {
            Commands::Rss => {
                if !self.rss.enable {
                    bail!("[rss.enable] is false; nothing to generate");
                }
                if self.base.url.is_none() {
                    bail!("[base.url] is required for RSS generation");
                }
            }
            Commands::Cv { .. } => {
                if !self.cv.data.is_file() {
                    bail!(ConfigError::Validation(format!(
                        "[cv.data] not found: {}",
                        self.cv.data.display()
                    )));
                }
            }
            Commands::Pdf { .. } => {
                if !self.pdf.browser.is_empty() {
                    Self::check_command_installed("[pdf.browser]", &self.pdf.browser)?;
                }
            }
            Commands::Publish { .. } => {
                if !self.crosspost.endpoint.starts_with("http") {
                    bail!(ConfigError::Validation(
                        "[crosspost.endpoint] must start with http:// or https://".into()
                    ));
                }
                if self.crosspost.api_key_env.is_empty() && self.crosspost.api_key_file.is_none() {
                    bail!(ConfigError::Validation(
                        "[crosspost] needs api_key_env or api_key_file".into()
                    ));
                }
                if let Some(path) = &self.crosspost.api_key_file
                    && path.exists()
                    && !path.is_file()
                {
                    bail!(ConfigError::Validation(
                        "[crosspost.api_key_file] is not a file".into()
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }

        let cmd = &command[0];
        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

#[test]
fn validate_base_config() {
    let config = r#"
        [base]
        title = "Ada's Notes"
        description = "Ada's blog and CV"
        url = "https://ada.example.com"
        language = "en"
        author = "Ada"
        email = "ada@example.com"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.base.title, "Ada's Notes");
    assert_eq!(config.base.description, "Ada's blog and CV");
    assert_eq!(config.base.url, Some("https://ada.example.com".to_string()));
    assert_eq!(config.base.language, "en");
    assert_eq!(config.base.author, "Ada");
}

#[test]
fn test_base_config_defaults() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.base.author, "<YOUR_NAME>");
    assert_eq!(config.base.email, "user@noreply.scriv");
    assert_eq!(config.base.language, "en");
    assert_eq!(config.base.url, None);
}

#[test]
fn test_content_config_defaults() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.content.dir, PathBuf::from("content"));
    assert_eq!(config.content.output, PathBuf::from("public"));
    assert_eq!(config.content.root, None);
}

#[test]
fn test_rss_config() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [rss]
        enable = false
        path = "custom-feed.xml"
        limit = 20
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert!(!config.rss.enable);
    assert_eq!(config.rss.path, PathBuf::from("custom-feed.xml"));
    assert_eq!(config.rss.limit, Some(20));
}

#[test]
fn test_rss_config_defaults() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert!(config.rss.enable);
    assert_eq!(config.rss.path, PathBuf::from("feed.xml"));
    assert_eq!(config.rss.limit, None);
}

#[test]
fn test_cv_config() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [cv]
        data = "data/resume.json"
        output = "public/resume"
        minify = false
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.cv.data, PathBuf::from("data/resume.json"));
    assert_eq!(config.cv.output, PathBuf::from("public/resume"));
    assert!(!config.cv.minify);
}

#[test]
fn test_pdf_config() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [pdf]
        browser = ["chromium", "--no-sandbox"]
        page_size = "Letter"
        keep_html = true
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(
        config.pdf.browser,
        vec!["chromium".to_string(), "--no-sandbox".to_string()]
    );
    assert_eq!(config.pdf.page_size, "Letter");
    assert!(config.pdf.keep_html);
}

#[test]
fn test_pdf_config_defaults() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert!(config.pdf.browser.is_empty());
    assert_eq!(config.pdf.page_size, "A4");
    assert!(!config.pdf.keep_html);
}

#[test]
fn test_crosspost_config() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [crosspost]
        endpoint = "https://dev.to/api/articles"
        api_key_env = "MY_KEY"
        api_key_file = "~/.devto-key"
        tag_limit = 3
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.crosspost.endpoint, "https://dev.to/api/articles");
    assert_eq!(config.crosspost.api_key_env, "MY_KEY");
    assert_eq!(config.crosspost.api_key_file, Some(PathBuf::from("~/.devto-key")));
    assert_eq!(config.crosspost.tag_limit, 3);
}

#[test]
fn test_crosspost_config_defaults() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(config.crosspost.endpoint, "https://dev.to/api/articles");
    assert_eq!(config.crosspost.api_key_env, "DEVTO_API_KEY");
    assert_eq!(config.crosspost.api_key_file, None);
    assert_eq!(config.crosspost.tag_limit, 4);
}

#[test]
fn test_extra_fields() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [extra]
        custom_field = "custom_value"
        number_field = 42
    "#;
    let config: SiteConfig = toml::from_str(config).unwrap();

    assert_eq!(
        config.extra.get("custom_field").and_then(|v| v.as_str()),
        Some("custom_value")
    );
    assert_eq!(
        config.extra.get("number_field").and_then(|v| v.as_integer()),
        Some(42)
    );
}

#[test]
fn test_unknown_field_rejection_in_base() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"
        unknown_field = "should_fail"
    "#;
    let result: Result<SiteConfig, _> = toml::from_str(config);

    assert!(result.is_err());
    let err = result.unwrap_err().to_string();
    assert!(err.contains("unknown field"));
}

#[test]
fn test_unknown_field_rejection_in_crosspost() {
    let config = r#"
        [base]
        title = "Test"
        description = "Test blog"

        [crosspost]
        unknown_field = "should_fail"
    "#;
    let result: Result<SiteConfig, _> = toml::from_str(config);

    assert!(result.is_err());
}

#[test]
fn test_from_str_invalid_toml() {
    let invalid_config = r#"
        [base
        title = "My Blog"
    "#;
    let result = SiteConfig::from_str(invalid_config);

    assert!(result.is_err());
}

#[test]
fn test_get_root_default() {
    let config = SiteConfig::default();
    assert_eq!(config.get_root(), Path::new("./"));
}

#[test]
fn test_set_root() {
    let mut config = SiteConfig::default();
    config.set_root(Path::new("/custom/path"));
    assert_eq!(config.get_root(), Path::new("/custom/path"));
}

#[test]
fn test_config_error_display() {
    let io_err = ConfigError::Io(
        PathBuf::from("test.toml"),
        std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
    );
    let display = format!("{}", io_err);
    assert!(display.contains("IO error"));
    assert!(display.contains("test.toml"));

    let validation_err = ConfigError::Validation("Test validation error".to_string());
    let display = format!("{}", validation_err);
    assert!(display.contains("Test validation error"));
}
