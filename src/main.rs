mod check;
mod cli;
mod config;
mod crosspost;
mod cv;
mod frontmatter;
mod init;
mod logger;
mod pdf;
mod posts;
mod rss;
mod utils;

use crate::{
    cli::{Cli, Commands, CvCommands},
    config::SiteConfig,
    cv::schema::CvDocument,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{fs, path::PathBuf};

fn main() {
    if let Err(e) = run() {
        log!("error"; "{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Init { name } => init::scaffold(config, name.is_some()),
        Commands::Check => check::run_checks(config),
        Commands::Rss => rss::build_rss(config),
        Commands::Cv { command } => run_cv(config, command),
        Commands::Pdf { input, output } => {
            pdf::export_pdf(config, input, output.as_deref()).map(|_| ())
        }
        Commands::Publish { slug, dry_run } => crosspost::publish(config, slug, *dry_run),
    }
}

/// Load scriv.toml, falling back to defaults for `init` (which creates it).
fn load_config(cli: &'static Cli) -> Result<SiteConfig> {
    let path = match &cli.root {
        Some(root) => root.join(&cli.config),
        None => cli.config.clone(),
    };

    let mut config = if path.is_file() {
        SiteConfig::from_path(&path)?
    } else if cli.is_init() {
        SiteConfig::default()
    } else {
        bail!(
            "Config file `{}` not found; run `scriv init` to create a project",
            path.display()
        );
    };

    config.update_with_cli(cli);
    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

fn run_cv(config: &'static SiteConfig, command: &CvCommands) -> Result<()> {
    let doc = CvDocument::from_path(&config.cv.data)?;
    doc.validate()
        .with_context(|| format!("Invalid CV document `{}`", config.cv.data.display()))?;

    match command {
        CvCommands::Markdown { include_hidden, output } => {
            write_or_print(cv::markdown::export(&doc, *include_hidden), output.as_ref())
        }
        CvCommands::Linkedin { section, output } => {
            write_or_print(cv::linkedin::export(&doc, *section), output.as_ref())
        }
        CvCommands::Render { output } => {
            let page = cv::html::export(&doc, config);
            let path = output
                .clone()
                .unwrap_or_else(|| config.cv.output.join("index.html"));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, page)
                .with_context(|| format!("Failed to write `{}`", path.display()))?;
            log!("cv"; "rendered cv page at `{}`", path.display());
            Ok(())
        }
    }
}

fn write_or_print(text: String, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)
                .with_context(|| format!("Failed to write `{}`", path.display()))?;
            log!("cv"; "wrote `{}`", path.display());
            Ok(())
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
