//! HTML minification.
//!
//! Config-gated wrapper around `minify_html` used by the CV page renderer.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Minify HTML based on config.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify_page<'a>(html: &'a [u8], config: &SiteConfig) -> Cow<'a, [u8]> {
    if !config.cv.minify {
        Cow::Borrowed(html)
    } else {
        Cow::Owned(minify_html_inner(html))
    }
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}
