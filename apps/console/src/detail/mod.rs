//! Single-record display.

use crate::models::cv::{format_number, Cv};
use crate::render::format_timestamp;

pub mod handlers;

#[derive(Debug, Clone, PartialEq)]
pub struct EducationItem {
    pub degree: String,
    pub school: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceItem {
    pub title: String,
    pub company: String,
    pub years: String,
    pub technologies: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageItem {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub name: String,
    pub link: String,
}

/// Everything the detail page shows; absent sections are empty lists.
#[derive(Debug, Clone, PartialEq)]
pub struct CvDetail {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub created: String,
    pub updated: String,
    pub skills: Vec<String>,
    pub education: Vec<EducationItem>,
    pub experience: Vec<ExperienceItem>,
    pub languages: Vec<LanguageItem>,
    pub projects: Vec<ProjectItem>,
    pub certifications: Vec<String>,
}

impl From<&Cv> for CvDetail {
    fn from(cv: &Cv) -> Self {
        Self {
            id: cv.id.clone(),
            full_name: cv.full_name.clone(),
            email: cv.email.clone(),
            phone: cv.phone.clone().unwrap_or_default(),
            location: cv.location.clone().unwrap_or_default(),
            created: cv.created_at.as_deref().map(format_timestamp).unwrap_or_default(),
            updated: cv.updated_at.as_deref().map(format_timestamp).unwrap_or_default(),
            skills: cv.skills.clone(),
            education: cv
                .education
                .iter()
                .map(|e| EducationItem {
                    degree: e.degree.clone(),
                    school: e.school.clone(),
                    year: e.year.clone().unwrap_or_else(|| "N/A".to_string()),
                })
                .collect(),
            experience: cv
                .experience
                .iter()
                .map(|x| ExperienceItem {
                    title: x.title.clone(),
                    company: x.company.clone(),
                    years: x
                        .years
                        .map(format_number)
                        .or_else(|| x.duration.clone())
                        .unwrap_or_else(|| "N/A".to_string()),
                    technologies: x.technologies.join(", "),
                })
                .collect(),
            languages: cv
                .languages
                .iter()
                .map(|l| LanguageItem {
                    name: l.name().to_string(),
                    level: l.level().unwrap_or_default().to_string(),
                })
                .collect(),
            projects: cv
                .projects
                .iter()
                .map(|p| ProjectItem {
                    name: p.name.clone(),
                    link: web_link(p.link.as_deref()),
                })
                .collect(),
            certifications: cv.certifications.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

/// Only `http(s)` links become anchors; anything else (e.g. `javascript:`)
/// is dropped and the name renders as text.
fn web_link(raw: Option<&str>) -> String {
    let Some(link) = raw.map(str::trim) else {
        return String::new();
    };
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        link.to_string()
    } else {
        String::new()
    }
}
