//! CV document schema.
//!
//! The CV lives in a hand-edited `cv.json`; camelCase on the wire.
//! Validation reports field paths so errors point at the JSON to fix.

use crate::utils::date::YearMonth;
use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::LazyLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CvDocument {
    pub personal: Personal,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub skills: Skills,
    pub education: Vec<Education>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<Certification>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Personal {
    pub name: String,

    /// Professional headline, e.g.: "Systems Engineer"
    pub label: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Profile {
    /// e.g.: "GitHub", "LinkedIn"
    pub network: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Experience {
    pub title: String,
    pub company: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// "YYYY-MM"
    pub start_date: String,

    /// "YYYY-MM"; absent means current position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    pub achievements: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Skills {
    pub technical: Vec<SkillCategory>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkillCategory {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Education {
    pub degree: String,
    pub institution: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub start_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Project {
    pub name: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Certification {
    pub name: String,
    pub issuer: String,

    /// "YYYY-MM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Language {
    pub language: String,

    /// e.g.: "Native", "C1"
    pub level: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl CvDocument {
    /// Load and parse the CV data file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CV data: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse CV data: {}", path.display()))
    }

    /// Experience entries that show up in exports by default.
    pub fn visible_experience(&self) -> impl Iterator<Item = &Experience> {
        self.experience.iter().filter(|e| !e.hidden)
    }

    /// Project entries that show up in exports by default.
    pub fn visible_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.hidden)
    }

    /// Field-level validation beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
        });

        require("personal.name", &self.personal.name)?;
        require("personal.label", &self.personal.label)?;
        require("summary", &self.summary)?;

        if !RE_EMAIL.is_match(&self.personal.email) {
            bail!("personal.email is not a valid address: {}", self.personal.email);
        }
        if let Some(website) = &self.personal.website {
            require_http("personal.website", website)?;
        }
        for (i, profile) in self.personal.profiles.iter().enumerate() {
            require(&format!("personal.profiles[{i}].network"), &profile.network)?;
            require_http(&format!("personal.profiles[{i}].url"), &profile.url)?;
        }

        if self.experience.is_empty() {
            bail!("experience must have at least one entry");
        }
        for (i, exp) in self.experience.iter().enumerate() {
            let at = format!("experience[{i}]");
            require(&format!("{at}.title"), &exp.title)?;
            require(&format!("{at}.company"), &exp.company)?;
            if exp.achievements.is_empty() {
                bail!("{at}.achievements must not be empty");
            }
            check_range(&at, &exp.start_date, exp.end_date.as_deref())?;
        }

        if self.skills.technical.is_empty() {
            bail!("skills.technical must have at least one category");
        }
        for (i, cat) in self.skills.technical.iter().enumerate() {
            let at = format!("skills.technical[{i}]");
            require(&format!("{at}.category"), &cat.category)?;
            if cat.items.is_empty() {
                bail!("{at}.items must not be empty");
            }
        }

        for (i, edu) in self.education.iter().enumerate() {
            let at = format!("education[{i}]");
            require(&format!("{at}.degree"), &edu.degree)?;
            require(&format!("{at}.institution"), &edu.institution)?;
            check_range(&at, &edu.start_date, edu.end_date.as_deref())?;
        }

        for (i, project) in self.projects.iter().enumerate() {
            let at = format!("projects[{i}]");
            require(&format!("{at}.name"), &project.name)?;
            require(&format!("{at}.description"), &project.description)?;
            if let Some(url) = &project.url {
                require_http(&format!("{at}.url"), url)?;
            }
        }

        for (i, cert) in self.certifications.iter().enumerate() {
            let at = format!("certifications[{i}]");
            require(&format!("{at}.name"), &cert.name)?;
            require(&format!("{at}.issuer"), &cert.issuer)?;
            if let Some(date) = &cert.date
                && YearMonth::parse(date).is_none()
            {
                bail!("{at}.date must be YYYY-MM, got: {date}");
            }
            if let Some(url) = &cert.url {
                require_http(&format!("{at}.url"), url)?;
            }
        }

        for (i, lang) in self.languages.iter().enumerate() {
            let at = format!("languages[{i}]");
            require(&format!("{at}.language"), &lang.language)?;
            require(&format!("{at}.level"), &lang.level)?;
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(())
}

fn require_http(field: &str, url: &str) -> Result<()> {
    if !url.starts_with("http") {
        bail!("{field} must start with http:// or https://, got: {url}");
    }
    Ok(())
}

/// Validate a "YYYY-MM" range; an open end means a current position.
fn check_range(at: &str, start: &str, end: Option<&str>) -> Result<()> {
    let Some(start_ym) = YearMonth::parse(start) else {
        bail!("{at}.startDate must be YYYY-MM, got: {start}");
    };

    if let Some(end) = end {
        let Some(end_ym) = YearMonth::parse(end) else {
            bail!("{at}.endDate must be YYYY-MM, got: {end}");
        };
        if end_ym < start_ym {
            bail!("{at}.endDate {end} is before startDate {start}");
        }
    }

    Ok(())
}

/// A minimal valid document, shared by exporter tests and `init`.
#[cfg(test)]
pub fn sample_document() -> CvDocument {
    serde_json::from_str(crate::init::SAMPLE_CV_JSON).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_is_valid() {
        sample_document().validate().unwrap();
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let json = r#"{"name": "A", "label": "B", "email": "a@b.co", "nickname": "x"}"#;
        let err = serde_json::from_str::<Personal>(json).unwrap_err().to_string();
        assert!(err.contains("nickname"));
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut doc = sample_document();
        doc.personal.email = "not-an-email".into();
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_dates() {
        let mut doc = sample_document();
        doc.experience[0].start_date = "2020-1".into();
        let err = doc.validate().unwrap_err().to_string();
        assert!(err.contains("startDate"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut doc = sample_document();
        doc.experience[0].start_date = "2022-06".into();
        doc.experience[0].end_date = Some("2021-01".into());
        let err = doc.validate().unwrap_err().to_string();
        assert!(err.contains("before startDate"));
    }

    #[test]
    fn test_validate_requires_experience() {
        let mut doc = sample_document();
        doc.experience.clear();
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_requires_achievements() {
        let mut doc = sample_document();
        doc.experience[0].achievements.clear();
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_plain_website() {
        let mut doc = sample_document();
        doc.personal.website = Some("example.com".into());
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_visible_experience_filters_hidden() {
        let mut doc = sample_document();
        doc.experience.push(Experience {
            title: "Secret".into(),
            company: "Stealth".into(),
            start_date: "2019-01".into(),
            end_date: Some("2019-06".into()),
            achievements: vec!["sshhh".into()],
            hidden: true,
            ..Default::default()
        });
        assert!(doc.visible_experience().all(|e| e.title != "Secret"));
        assert!(doc.experience.iter().any(|e| e.title == "Secret"));
    }
}
