//! CV → Markdown exporter.
//!
//! Pure data-to-text formatting; entries marked hidden are excluded
//! unless the caller opts in.

use crate::{cv::schema::CvDocument, utils::date::format_range};
use std::fmt::Write;

/// Render the whole CV as a Markdown document.
pub fn export(doc: &CvDocument, include_hidden: bool) -> String {
    let mut out = String::new();

    writeln!(out, "# {}", doc.personal.name).ok();
    writeln!(out, "\n**{}**", doc.personal.label).ok();

    let mut contact = vec![doc.personal.email.clone()];
    contact.extend(doc.personal.phone.iter().cloned());
    contact.extend(doc.personal.location.iter().cloned());
    contact.extend(doc.personal.website.iter().cloned());
    writeln!(out, "\n{}", contact.join(" · ")).ok();

    if !doc.personal.profiles.is_empty() {
        let profiles: Vec<String> = doc
            .personal
            .profiles
            .iter()
            .map(|p| format!("[{}]({})", p.network, p.url))
            .collect();
        writeln!(out, "\n{}", profiles.join(" · ")).ok();
    }

    writeln!(out, "\n## Summary\n\n{}", doc.summary.trim()).ok();

    writeln!(out, "\n## Experience").ok();
    for exp in doc.experience.iter().filter(|e| include_hidden || !e.hidden) {
        writeln!(out, "\n### {} — {}", exp.title, exp.company).ok();

        let mut meta = format_range(&exp.start_date, exp.end_date.as_deref());
        if let Some(location) = &exp.location {
            write!(meta, " · {location}").ok();
        }
        writeln!(out, "\n*{meta}*\n").ok();

        for achievement in &exp.achievements {
            writeln!(out, "- {achievement}").ok();
        }
        if !exp.technologies.is_empty() {
            writeln!(out, "\n_Technologies: {}_", exp.technologies.join(", ")).ok();
        }
    }

    writeln!(out, "\n## Skills").ok();
    for category in &doc.skills.technical {
        writeln!(out, "\n**{}:** {}", category.category, category.items.join(", ")).ok();
    }
    if !doc.skills.soft.is_empty() {
        writeln!(out, "\n**Soft skills:** {}", doc.skills.soft.join(", ")).ok();
    }

    writeln!(out, "\n## Education").ok();
    for edu in &doc.education {
        writeln!(out, "\n### {} — {}", edu.degree, edu.institution).ok();

        let mut meta = format_range(&edu.start_date, edu.end_date.as_deref());
        if let Some(location) = &edu.location {
            write!(meta, " · {location}").ok();
        }
        writeln!(out, "\n*{meta}*").ok();

        if !edu.details.is_empty() {
            writeln!(out).ok();
            for detail in &edu.details {
                writeln!(out, "- {detail}").ok();
            }
        }
    }

    let projects: Vec<_> = doc
        .projects
        .iter()
        .filter(|p| include_hidden || !p.hidden)
        .collect();
    if !projects.is_empty() {
        writeln!(out, "\n## Projects").ok();
        for project in projects {
            match &project.url {
                Some(url) => writeln!(out, "\n### [{}]({url})", project.name).ok(),
                None => writeln!(out, "\n### {}", project.name).ok(),
            };
            writeln!(out, "\n{}", project.description).ok();
            if !project.technologies.is_empty() {
                writeln!(out, "\n_Technologies: {}_", project.technologies.join(", ")).ok();
            }
        }
    }

    if !doc.certifications.is_empty() {
        writeln!(out, "\n## Certifications\n").ok();
        for cert in &doc.certifications {
            let mut line = format!("- {} — {}", cert.name, cert.issuer);
            if let Some(date) = &cert.date {
                write!(line, " ({})", crate::utils::date::YearMonth::parse(date)
                    .map_or_else(|| date.clone(), |ym| ym.display())).ok();
            }
            writeln!(out, "{line}").ok();
        }
    }

    if !doc.languages.is_empty() {
        writeln!(out, "\n## Languages\n").ok();
        for lang in &doc.languages {
            writeln!(out, "- {}: {}", lang.language, lang.level).ok();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::schema::{Experience, sample_document};

    #[test]
    fn test_export_preserves_visible_entries_verbatim() {
        let doc = sample_document();
        let md = export(&doc, false);

        for exp in doc.visible_experience() {
            assert!(md.contains(&exp.title), "missing title: {}", exp.title);
            assert!(md.contains(&exp.company), "missing company: {}", exp.company);
            for achievement in &exp.achievements {
                assert!(md.contains(achievement), "missing achievement: {achievement}");
            }
        }
    }

    #[test]
    fn test_export_has_all_required_sections() {
        let md = export(&sample_document(), false);
        for heading in ["## Summary", "## Experience", "## Skills", "## Education"] {
            assert!(md.contains(heading), "missing section: {heading}");
        }
    }

    #[test]
    fn test_export_excludes_hidden_by_default() {
        let mut doc = sample_document();
        doc.experience.push(Experience {
            title: "Shadow Role".into(),
            company: "Stealth Co".into(),
            start_date: "2018-01".into(),
            end_date: Some("2018-12".into()),
            achievements: vec!["did secret things".into()],
            hidden: true,
            ..Default::default()
        });

        let md = export(&doc, false);
        assert!(!md.contains("Shadow Role"));

        let md = export(&doc, true);
        assert!(md.contains("Shadow Role"));
        assert!(md.contains("did secret things"));
    }

    #[test]
    fn test_export_formats_date_ranges() {
        let doc = sample_document();
        let md = export(&doc, false);
        // the sample has a current position
        assert!(md.contains("– Present"));
    }

    #[test]
    fn test_export_omits_empty_optional_sections() {
        let mut doc = sample_document();
        doc.projects.clear();
        doc.certifications.clear();
        doc.languages.clear();

        let md = export(&doc, false);
        assert!(!md.contains("## Projects"));
        assert!(!md.contains("## Certifications"));
        assert!(!md.contains("## Languages"));
    }
}
