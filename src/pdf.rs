//! PDF export via an external headless browser.
//!
//! Markdown input is converted to a print-ready page first; HTML input is
//! used as-is. Either way a fixed list of cosmetic edits cleans the page
//! up for print before Chromium renders it.

use crate::{
    config::SiteConfig,
    frontmatter::split_frontmatter,
    log, run_command,
};
use anyhow::{Context, Result, bail};
use pulldown_cmark::{Options, Parser};
use regex::Regex;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Browsers probed with `which` when `[pdf] browser` is not configured.
const BROWSER_CANDIDATES: [&str; 7] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "brave",
    "msedge",
];

/// Export `input` (a `.md` or `.html` file) to PDF.
///
/// Returns the path of the written PDF.
pub fn export_pdf(config: &SiteConfig, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let html = match input.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => fs::read_to_string(input)
            .with_context(|| format!("Failed to read `{}`", input.display()))?,
        Some("md") => {
            let raw = fs::read_to_string(input)
                .with_context(|| format!("Failed to read `{}`", input.display()))?;
            markdown_page(&raw, input, config)?
        }
        _ => bail!(
            "Unsupported input `{}`: expected a .md or .html file",
            input.display()
        ),
    };

    let html = prepare_html(&html, config);

    let output = match output {
        Some(path) => path.to_owned(),
        None => input.with_extension("pdf"),
    };

    // _guard keeps the tempfile alive until the browser has read it
    let (html_path, _guard) = if config.pdf.keep_html {
        // `output.with_extension("html")` would equal an `.html` input
        let path = output.with_extension("print.html");
        fs::write(&path, &html)
            .with_context(|| format!("Failed to write `{}`", path.display()))?;
        log!("pdf"; "kept intermediate html at `{}`", path.display());
        (path, None)
    } else {
        let mut file = tempfile::Builder::new()
            .prefix("scriv-print-")
            .suffix(".html")
            .tempfile()
            .context("Failed to create temp html file")?;
        file.write_all(html.as_bytes())
            .context("Failed to write temp html file")?;
        let path = file.path().to_owned();
        (path, Some(file))
    };

    print_with_browser(config, &html_path, &output)?;

    log!("pdf"; "wrote `{}`", output.display());
    Ok(output)
}

/// Convert a Markdown post into a standalone printable page.
fn markdown_page(raw: &str, input: &Path, config: &SiteConfig) -> Result<String> {
    let (title, body) = match split_frontmatter(raw) {
        Some((fm, body)) => {
            let frontmatter = crate::frontmatter::Frontmatter::parse(fm)
                .with_context(|| format!("Invalid frontmatter in `{}`", input.display()))?;
            (frontmatter.title, body.to_owned())
        }
        None => (
            input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_owned(),
            raw.to_owned(),
        ),
    };

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(&body, options);
    let mut content = String::with_capacity(body.len() * 2);
    pulldown_cmark::html::push_html(&mut content, parser);

    let title = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    Ok(format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>\n\
         @page {{ size: {page_size}; margin: 18mm; }}\n\
         body {{ font-family: Georgia, serif; line-height: 1.5; color: #1a1a1a; }}\n\
         pre {{ background: #f4f4f4; padding: 0.6rem; overflow-x: hidden; white-space: pre-wrap; }}\n\
         code {{ font-family: monospace; font-size: 0.9em; }}\n\
         table {{ border-collapse: collapse; }}\n\
         th, td {{ border: 1px solid #999; padding: 0.3rem 0.6rem; }}\n\
         img {{ max-width: 100%; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{content}</body>\n</html>\n",
        lang = config.base.language,
        page_size = config.pdf.page_size,
    ))
}

// The cosmetic passes below run in a fixed order; later passes assume the
// earlier ones already ran (e.g. absolutize never sees lazy data-src urls).

static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").unwrap());
static RE_PRINT_SKIP_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<([a-z][a-z0-9]*)\b[^>]*data-print="skip"[^>]*>"#).unwrap());
static RE_NAV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<nav\b[^>]*>.*?</nav>").unwrap());
static RE_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<footer\b[^>]*>.*?</footer>").unwrap());
static RE_CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<(html|body)\b[^>]*class="([^"]*)""#).unwrap());
static RE_DETAILS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<details\b[^>]*>").unwrap());
static RE_ROOT_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(href|src)="(/[^/"][^"]*)""#).unwrap());

/// Apply the cosmetic print edits, in order.
pub fn prepare_html(html: &str, config: &SiteConfig) -> String {
    // 1. scripts have no business in a static print
    let html = RE_SCRIPT.replace_all(html, "");

    // 2. elements opted out of print, plus site chrome
    let html = std::borrow::Cow::Owned(strip_print_skip(&html));
    let html = RE_NAV.replace_all(&html, "");
    let html = RE_FOOTER.replace_all(&html, "");

    // 3. force light scheme
    let html = RE_CLASS_ATTR.replace_all(&html, |caps: &regex::Captures| {
        let full = &caps[0];
        let classes = &caps[2];
        let kept: Vec<&str> = classes
            .split_whitespace()
            .filter(|c| !c.eq_ignore_ascii_case("dark"))
            .collect();
        full.replace(&format!("class=\"{classes}\""), &format!("class=\"{}\"", kept.join(" ")))
    });
    let html = inject_light_scheme(&html);

    // 4. lazy images never load in a headless print
    let html = html
        .replace("loading=\"lazy\"", "loading=\"eager\"")
        .replace("data-src=\"", "src=\"");

    // 5. collapsed details would print empty
    let html = RE_DETAILS.replace_all(&html, |caps: &regex::Captures| {
        let tag = &caps[0];
        if tag.to_ascii_lowercase().contains(" open") {
            tag.to_owned()
        } else {
            tag.replacen("<details", "<details open", 1)
        }
    });

    // 6. root-relative urls break under file://
    match &config.base.url {
        Some(base) => {
            let base = base.trim_end_matches('/');
            RE_ROOT_RELATIVE
                .replace_all(&html, |caps: &regex::Captures| {
                    format!("{}=\"{base}{}\"", &caps[1], &caps[2])
                })
                .into_owned()
        }
        None => html.into_owned(),
    }
}

/// Remove elements carrying `data-print="skip"`, including their content.
///
/// Tracks nesting of the same tag name so a skipped `<div>` containing
/// other `<div>`s is removed whole. An unclosed element is dropped to the
/// end of the document.
fn strip_print_skip(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(caps) = RE_PRINT_SKIP_OPEN.captures(rest) {
        let open = caps.get(0).unwrap();
        let tag = caps[1].to_ascii_lowercase();
        out.push_str(&rest[..open.start()]);

        let open_marker = format!("<{tag}");
        let close_marker = format!("</{tag}>");
        let body = &rest[open.end()..];
        let lower = body.to_ascii_lowercase();

        let mut depth = 1usize;
        let mut pos = 0usize;
        let mut end = None;
        while depth > 0 {
            let next_open = next_tag_open(&lower, &open_marker, pos);
            let next_close = lower[pos..].find(&close_marker).map(|i| pos + i);
            match (next_open, next_close) {
                (Some(o), Some(c)) if o < c => {
                    depth += 1;
                    pos = o + open_marker.len();
                }
                (_, Some(c)) => {
                    depth -= 1;
                    pos = c + close_marker.len();
                    if depth == 0 {
                        end = Some(pos);
                    }
                }
                _ => break,
            }
        }

        rest = match end {
            Some(end) => &body[end..],
            None => "",
        };
    }

    out.push_str(rest);
    out
}

/// Find `marker` (`<tag`) starting a real tag, i.e. followed by
/// whitespace, `>`, `/`, or end of input. Keeps `<b` from matching
/// `<br>` or `<body>`.
fn next_tag_open(haystack: &str, marker: &str, mut from: usize) -> Option<usize> {
    while let Some(i) = haystack[from..].find(marker).map(|i| from + i) {
        match haystack.as_bytes().get(i + marker.len()) {
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n') => return Some(i),
            _ => from = i + marker.len(),
        }
    }
    None
}

fn inject_light_scheme(html: &str) -> String {
    const STYLE: &str = "<style>:root { color-scheme: light; }</style>";
    match html.find("</head>") {
        Some(pos) => format!("{}{STYLE}{}", &html[..pos], &html[pos..]),
        None => format!("{STYLE}{html}"),
    }
}

fn print_with_browser(config: &SiteConfig, html_path: &Path, output: &Path) -> Result<()> {
    let browser = resolve_browser(config)?;
    log!("pdf"; "printing with `{}`", browser[0]);

    run_command!(
        &browser;
        "--headless=new",
        "--disable-gpu",
        "--no-pdf-header-footer",
        format!("--print-to-pdf={}", output.display()),
        format!("file://{}", html_path.display()),
    )?;

    Ok(())
}

/// The configured browser command, or the first probed candidate on PATH.
fn resolve_browser(config: &SiteConfig) -> Result<Vec<String>> {
    if !config.pdf.browser.is_empty() {
        return Ok(config.pdf.browser.clone());
    }

    for candidate in BROWSER_CANDIDATES {
        if which::which(candidate).is_ok() {
            return Ok(vec![candidate.to_owned()]);
        }
    }

    bail!(
        "No Chromium-based browser found (tried {}).\n\
         Install one or set `[pdf] browser` in the config",
        BROWSER_CANDIDATES.join(", ")
    )
}
