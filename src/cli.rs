//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::cv::linkedin::Section;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scriv personal site publishing CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Content directory path (relative to project root)
    #[arg(short, long)]
    pub content: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: scriv.toml)
    #[arg(short = 'C', long, default_value = "scriv.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Init a template site with a sample post and cv.json
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Validate frontmatter of every post and the CV document
    Check,

    /// Generate the RSS feed from post frontmatter
    Rss,

    /// Export or render the CV document
    Cv {
        #[command(subcommand)]
        command: CvCommands,
    },

    /// Print a rendered HTML page or a Markdown file to PDF
    Pdf {
        /// Input file (.html/.htm used as-is, .md converted first)
        input: PathBuf,

        /// Output PDF path (default: input with .pdf extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross-post a blog post to the article platform
    Publish {
        /// Post slug, e.g. "posts/hello-world"
        slug: String,

        /// Print the payload without performing the network call
        #[arg(long)]
        dry_run: bool,
    },
}

/// `cv` subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CvCommands {
    /// Export the CV to a Markdown document
    Markdown {
        /// Include entries marked `hidden: true`
        #[arg(long)]
        include_hidden: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the CV to LinkedIn-ready plain text
    Linkedin {
        /// Section to export
        #[arg(short, long, value_enum, default_value = "all")]
        section: Section,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the CV to a standalone HTML page
    Render {
        /// Output file (default: `[cv].output`/index.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[allow(unused)]
impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
    pub const fn is_check(&self) -> bool {
        matches!(self.command, Commands::Check)
    }
    pub const fn is_rss(&self) -> bool {
        matches!(self.command, Commands::Rss)
    }
    pub const fn is_cv(&self) -> bool {
        matches!(self.command, Commands::Cv { .. })
    }
    pub const fn is_pdf(&self) -> bool {
        matches!(self.command, Commands::Pdf { .. })
    }
    pub const fn is_publish(&self) -> bool {
        matches!(self.command, Commands::Publish { .. })
    }
}
