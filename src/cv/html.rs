//! CV → standalone HTML exporter.
//!
//! Produces a single self-contained page with embedded screen and print
//! styles, suitable both for hosting and for feeding into `pdf`.

use crate::{
    config::SiteConfig,
    cv::schema::CvDocument,
    utils::{date::format_range, minify::minify_page},
};
use std::fmt::Write;

const STYLE: &str = r#"
  :root { color-scheme: light; }
  body {
    font-family: Georgia, 'Times New Roman', serif;
    max-width: 48rem;
    margin: 0 auto;
    padding: 2rem 1.5rem;
    color: #1a1a1a;
    line-height: 1.5;
  }
  header h1 { margin: 0; font-size: 1.8rem; }
  header p.label { margin: 0.2rem 0 0.6rem; font-size: 1.1rem; color: #444; }
  header p.contact { margin: 0; font-size: 0.9rem; }
  h2 {
    font-size: 1.1rem;
    text-transform: uppercase;
    letter-spacing: 0.06em;
    border-bottom: 1px solid #999;
    padding-bottom: 0.2rem;
    margin-top: 1.6rem;
  }
  .entry { margin-bottom: 1rem; }
  .entry h3 { margin: 0; font-size: 1rem; }
  .entry p.meta { margin: 0.1rem 0 0.3rem; font-size: 0.85rem; color: #555; }
  .entry ul { margin: 0.2rem 0; padding-left: 1.2rem; }
  .tech { font-size: 0.85rem; color: #555; }
  a { color: #1a1a1a; }
  @media print {
    body { padding: 0; font-size: 11pt; }
    a { text-decoration: none; }
    .entry { break-inside: avoid; }
  }
"#;

/// Render the CV as a complete HTML document, minified per config.
pub fn export(doc: &CvDocument, config: &SiteConfig) -> Vec<u8> {
    let html = render(doc);
    minify_page(html.as_bytes(), config).into_owned()
}

fn render(doc: &CvDocument) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let name = escape(&doc.personal.name);

    write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{name} — CV</title>\n\
         <style>{STYLE}</style>\n\
         </head>\n<body>\n"
    )
    .ok();

    write!(out, "<header>\n<h1>{name}</h1>\n").ok();
    writeln!(out, "<p class=\"label\">{}</p>", escape(&doc.personal.label)).ok();

    let mut contact = vec![escape(&doc.personal.email)];
    contact.extend(doc.personal.phone.iter().map(|p| escape(p)));
    contact.extend(doc.personal.location.iter().map(|l| escape(l)));
    if let Some(website) = &doc.personal.website {
        contact.push(format!("<a href=\"{0}\">{0}</a>", escape(website)));
    }
    for profile in &doc.personal.profiles {
        contact.push(format!(
            "<a href=\"{}\">{}</a>",
            escape(&profile.url),
            escape(&profile.network)
        ));
    }
    writeln!(out, "<p class=\"contact\">{}</p>\n</header>", contact.join(" · ")).ok();

    writeln!(out, "<h2>Summary</h2>\n<p>{}</p>", escape(doc.summary.trim())).ok();

    writeln!(out, "<h2>Experience</h2>").ok();
    for exp in doc.visible_experience() {
        writeln!(out, "<div class=\"entry\">").ok();
        writeln!(out, "<h3>{} — {}</h3>", escape(&exp.title), escape(&exp.company)).ok();
        entry_meta(&mut out, &exp.start_date, exp.end_date.as_deref(), exp.location.as_deref());
        writeln!(out, "<ul>").ok();
        for achievement in &exp.achievements {
            writeln!(out, "<li>{}</li>", escape(achievement)).ok();
        }
        writeln!(out, "</ul>").ok();
        if !exp.technologies.is_empty() {
            writeln!(out, "<p class=\"tech\">{}</p>", escape(&exp.technologies.join(", "))).ok();
        }
        writeln!(out, "</div>").ok();
    }

    writeln!(out, "<h2>Skills</h2>\n<ul>").ok();
    for category in &doc.skills.technical {
        writeln!(
            out,
            "<li><strong>{}:</strong> {}</li>",
            escape(&category.category),
            escape(&category.items.join(", "))
        )
        .ok();
    }
    if !doc.skills.soft.is_empty() {
        writeln!(out, "<li><strong>Soft skills:</strong> {}</li>", escape(&doc.skills.soft.join(", "))).ok();
    }
    writeln!(out, "</ul>").ok();

    writeln!(out, "<h2>Education</h2>").ok();
    for edu in &doc.education {
        writeln!(out, "<div class=\"entry\">").ok();
        writeln!(out, "<h3>{} — {}</h3>", escape(&edu.degree), escape(&edu.institution)).ok();
        entry_meta(&mut out, &edu.start_date, edu.end_date.as_deref(), edu.location.as_deref());
        if !edu.details.is_empty() {
            writeln!(out, "<ul>").ok();
            for detail in &edu.details {
                writeln!(out, "<li>{}</li>", escape(detail)).ok();
            }
            writeln!(out, "</ul>").ok();
        }
        writeln!(out, "</div>").ok();
    }

    let projects: Vec<_> = doc.visible_projects().collect();
    if !projects.is_empty() {
        writeln!(out, "<h2>Projects</h2>").ok();
        for project in projects {
            writeln!(out, "<div class=\"entry\">").ok();
            match &project.url {
                Some(url) => writeln!(
                    out,
                    "<h3><a href=\"{}\">{}</a></h3>",
                    escape(url),
                    escape(&project.name)
                )
                .ok(),
                None => writeln!(out, "<h3>{}</h3>", escape(&project.name)).ok(),
            };
            writeln!(out, "<p>{}</p>", escape(&project.description)).ok();
            if !project.technologies.is_empty() {
                writeln!(out, "<p class=\"tech\">{}</p>", escape(&project.technologies.join(", "))).ok();
            }
            writeln!(out, "</div>").ok();
        }
    }

    if !doc.certifications.is_empty() {
        writeln!(out, "<h2>Certifications</h2>\n<ul>").ok();
        for cert in &doc.certifications {
            write!(out, "<li>{} — {}", escape(&cert.name), escape(&cert.issuer)).ok();
            if let Some(date) = &cert.date {
                let shown = crate::utils::date::YearMonth::parse(date)
                    .map_or_else(|| date.clone(), |ym| ym.display());
                write!(out, " ({})", escape(&shown)).ok();
            }
            writeln!(out, "</li>").ok();
        }
        writeln!(out, "</ul>").ok();
    }

    if !doc.languages.is_empty() {
        writeln!(out, "<h2>Languages</h2>\n<ul>").ok();
        for lang in &doc.languages {
            writeln!(out, "<li>{}: {}</li>", escape(&lang.language), escape(&lang.level)).ok();
        }
        writeln!(out, "</ul>").ok();
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn entry_meta(out: &mut String, start: &str, end: Option<&str>, location: Option<&str>) {
    let mut meta = format_range(start, end);
    if let Some(location) = location {
        write!(meta, " · {location}").ok();
    }
    writeln!(out, "<p class=\"meta\">{}</p>", escape(&meta)).ok();
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
