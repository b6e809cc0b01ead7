//! CV → LinkedIn plain-text exporter.
//!
//! LinkedIn profile fields accept no markup, so this renders copy-paste
//! sections with unicode bullets and uppercase banners.

use crate::{cv::schema::CvDocument, log, utils::date::format_range};
use std::fmt::Write;

/// LinkedIn caps the About field at 2600 characters.
const ABOUT_CHAR_LIMIT: usize = 2600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    All,
}

/// Render the requested section(s) as plain text.
pub fn export(doc: &CvDocument, section: Section) -> String {
    let mut out = String::new();

    let wants = |s: Section| section == s || section == Section::All;

    if wants(Section::Summary) {
        section_banner(&mut out, "ABOUT");
        let about = doc.summary.trim();
        writeln!(out, "{about}").ok();
        if about.chars().count() > ABOUT_CHAR_LIMIT {
            log!(
                "linkedin";
                "about section is {} chars, over the {ABOUT_CHAR_LIMIT} limit",
                about.chars().count()
            );
        }
    }

    if wants(Section::Experience) {
        section_banner(&mut out, "EXPERIENCE");
        for exp in doc.visible_experience() {
            writeln!(out, "{} at {}", exp.title, exp.company).ok();
            writeln!(out, "{}", format_range(&exp.start_date, exp.end_date.as_deref())).ok();
            if let Some(location) = &exp.location {
                writeln!(out, "{location}").ok();
            }
            writeln!(out).ok();
            for achievement in &exp.achievements {
                writeln!(out, "• {achievement}").ok();
            }
            if !exp.technologies.is_empty() {
                writeln!(out, "\nSkills: {}", exp.technologies.join(" · ")).ok();
            }
            writeln!(out).ok();
        }
    }

    if wants(Section::Education) {
        section_banner(&mut out, "EDUCATION");
        for edu in &doc.education {
            writeln!(out, "{}", edu.institution).ok();
            writeln!(out, "{}", edu.degree).ok();
            writeln!(out, "{}", format_range(&edu.start_date, edu.end_date.as_deref())).ok();
            for detail in &edu.details {
                writeln!(out, "• {detail}").ok();
            }
            writeln!(out).ok();
        }
    }

    if wants(Section::Skills) {
        section_banner(&mut out, "SKILLS");
        let mut skills: Vec<&str> = doc
            .skills
            .technical
            .iter()
            .flat_map(|c| c.items.iter().map(String::as_str))
            .collect();
        skills.dedup();
        writeln!(out, "{}", skills.join(" · ")).ok();
    }

    if wants(Section::Projects) {
        let projects: Vec<_> = doc.visible_projects().collect();
        if !projects.is_empty() || section == Section::Projects {
            section_banner(&mut out, "PROJECTS");
            for project in projects {
                writeln!(out, "{}", project.name).ok();
                writeln!(out, "{}", project.description).ok();
                if let Some(url) = &project.url {
                    writeln!(out, "{url}").ok();
                }
                writeln!(out).ok();
            }
        }
    }

    if wants(Section::Certifications) {
        if !doc.certifications.is_empty() || section == Section::Certifications {
            section_banner(&mut out, "CERTIFICATIONS");
            for cert in &doc.certifications {
                write!(out, "• {} — {}", cert.name, cert.issuer).ok();
                if let Some(date) = &cert.date {
                    let shown = crate::utils::date::YearMonth::parse(date)
                        .map_or_else(|| date.clone(), |ym| ym.display());
                    write!(out, " ({shown})").ok();
                }
                writeln!(out).ok();
            }
        }
    }

    out
}

fn section_banner(out: &mut String, title: &str) {
    if !out.is_empty() {
        writeln!(out).ok();
    }
    writeln!(out, "=== {title} ===\n").ok();
}
