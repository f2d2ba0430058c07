//! The create/edit CV form: parsing the submitted fields, validating them and
//! normalizing the result into an API payload.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::models::cv::{format_number, Cv, CvPayload, EducationPayload, ExperiencePayload};

pub mod handlers;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill all required fields";

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d[\d\s\-x()]{7,20}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Raw form fields as posted by the browser.
///
/// List sections are free text: skills and languages take one entry per line
/// or comma-separated; education lines are `degree | school | year`;
/// experience lines are `title | company | years | tech, tech`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CvForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub skills: String,
    pub languages: String,
    pub education: String,
    pub experience: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All problems found in one submission.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{summary}")]
pub struct FormErrors {
    pub summary: String,
    pub fields: Vec<FieldError>,
}

impl FormErrors {
    pub fn messages(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.message.clone()).collect()
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

/// Python-style capitalize: first character upper, the rest lower.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

/// Splits on newlines and commas, trims, capitalizes and drops blanks and
/// duplicates while keeping first-seen order.
pub fn normalize_list(raw: &str) -> Vec<String> {
    normalize_items(raw.split(['\n', ',']))
}

fn normalize_items<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(|item| capitalize(item.trim()))
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn non_blank_lines(raw: &str) -> impl Iterator<Item = (usize, &str)> {
    raw.lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(i, line)| (i + 1, line))
}

fn split_columns(line: &str, n: usize) -> Vec<String> {
    let mut cols: Vec<String> = line.splitn(n, '|').map(|c| c.trim().to_string()).collect();
    cols.resize(n, String::new());
    cols
}

fn valid_year(year: &str) -> bool {
    year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && year.parse::<u32>().is_ok_and(|y| (1900..=2100).contains(&y))
}

impl CvForm {
    /// Pre-fills the form from an existing record.
    pub fn from_cv(cv: &Cv) -> Self {
        Self {
            full_name: cv.full_name.clone(),
            email: cv.email.clone(),
            phone: cv.phone.clone().unwrap_or_default(),
            location: cv.location.clone().unwrap_or_default(),
            skills: cv.skills.join("\n"),
            languages: cv
                .languages
                .iter()
                .map(|l| l.name().to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            education: cv
                .education
                .iter()
                .map(|e| {
                    format!(
                        "{} | {} | {}",
                        e.degree,
                        e.school,
                        e.year.as_deref().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
            experience: cv
                .experience
                .iter()
                .map(|x| {
                    format!(
                        "{} | {} | {} | {}",
                        x.title,
                        x.company,
                        x.years.map(format_number).unwrap_or_default(),
                        x.technologies.join(", ")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Validates every field and returns the normalized payload, or all the
    /// errors found.
    pub fn validate(&self) -> Result<CvPayload, FormErrors> {
        let mut errors: Vec<FieldError> = Vec::new();
        let mut fail = |field: &'static str, message: String| {
            errors.push(FieldError { field, message });
        };

        let full_name = self.full_name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();
        let location = self.location.trim();

        if full_name.is_empty() {
            fail("full_name", "Full name is required".to_string());
        }
        if email.is_empty() {
            fail("email", "Email is required".to_string());
        } else if !EMAIL_RE.is_match(email) {
            fail("email", "Email must be a valid address".to_string());
        }
        if phone.is_empty() {
            fail("phone", "Phone is required".to_string());
        } else if !PHONE_RE.is_match(phone) {
            fail("phone", "Invalid phone number format".to_string());
        }
        if location.is_empty() {
            fail("location", "Location is required".to_string());
        }

        let skills = normalize_list(&self.skills);
        if skills.is_empty() {
            fail("skills", "At least one skill is required".to_string());
        }
        let languages = normalize_list(&self.languages);
        if languages.is_empty() {
            fail("languages", "At least one language is required".to_string());
        }

        let mut education = Vec::new();
        for (n, line) in non_blank_lines(&self.education) {
            let cols = split_columns(line, 3);
            if cols[0].is_empty() || cols[1].is_empty() {
                fail(
                    "education",
                    format!("Education line {n}: degree and school are required"),
                );
            }
            if !cols[2].is_empty() && !valid_year(&cols[2]) {
                fail(
                    "education",
                    format!("Education line {n}: year must be a valid 4-digit number"),
                );
            }
            education.push(EducationPayload {
                degree: cols[0].clone(),
                school: cols[1].clone(),
                year: Some(cols[2].clone()).filter(|y| !y.is_empty()),
            });
        }

        let mut experience = Vec::new();
        for (n, line) in non_blank_lines(&self.experience) {
            let cols = split_columns(line, 4);
            if cols[0].is_empty() || cols[1].is_empty() {
                fail(
                    "experience",
                    format!("Experience line {n}: title and company are required"),
                );
            }
            let years = if cols[2].is_empty() {
                None
            } else {
                match cols[2].parse::<f64>() {
                    Ok(y) if y >= 0.0 && y.is_finite() => Some(y),
                    _ => {
                        fail(
                            "experience",
                            format!("Experience line {n}: years must be a non-negative number"),
                        );
                        None
                    }
                }
            };
            experience.push(ExperiencePayload {
                title: cols[0].clone(),
                company: cols[1].clone(),
                years,
                technologies: normalize_items(cols[3].split(',')),
            });
        }

        if !errors.is_empty() {
            return Err(FormErrors {
                summary: REQUIRED_FIELDS_MESSAGE.to_string(),
                fields: errors,
            });
        }

        Ok(CvPayload {
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            location: Some(location.to_string()),
            education,
            experience,
            skills,
            languages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{Education, Experience, Language};

    fn valid_form() -> CvForm {
        CvForm {
            full_name: "  Jane Doe ".to_string(),
            email: "jane@doe.dev".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            location: "New York, USA".to_string(),
            skills: "rust, PYTHON\nrust\n\n go ".to_string(),
            languages: "english\nFrench".to_string(),
            education: "Bachelor | MIT | 2015\n\nMaster | Stanford |".to_string(),
            experience: "Engineer | Acme | 3 | docker, k8s, Docker".to_string(),
        }
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let payload = valid_form().validate().unwrap();
        assert_eq!(payload.full_name, "Jane Doe");
        assert_eq!(payload.skills, vec!["Rust", "Python", "Go"]);
        assert_eq!(payload.languages, vec!["English", "French"]);
        assert_eq!(payload.education.len(), 2);
        assert_eq!(payload.education[0].year.as_deref(), Some("2015"));
        assert_eq!(payload.education[1].year, None);
        assert_eq!(payload.experience[0].years, Some(3.0));
        assert_eq!(payload.experience[0].technologies, vec!["Docker", "K8s"]);
    }

    #[test]
    fn test_empty_form_reports_every_required_field() {
        let errors = CvForm::default().validate().unwrap_err();
        assert_eq!(errors.to_string(), REQUIRED_FIELDS_MESSAGE);
        for field in ["full_name", "email", "phone", "location", "skills", "languages"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_bad_email_and_phone() {
        let form = CvForm {
            email: "not-an-email".to_string(),
            phone: "12ab".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors
            .messages()
            .contains(&"Email must be a valid address".to_string()));
        assert!(errors
            .messages()
            .contains(&"Invalid phone number format".to_string()));
    }

    #[test]
    fn test_education_year_range() {
        let form = CvForm {
            education: "PhD | Oxford | 1850".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.messages(),
            vec!["Education line 1: year must be a valid 4-digit number"]
        );
    }

    #[test]
    fn test_experience_years_must_be_numeric() {
        let form = CvForm {
            experience: "Dev | Co | lots".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("experience"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_RE.is_match("+33 6 12 34 56 78"));
        assert!(PHONE_RE.is_match("555-123-4567 x89"));
        assert!(!PHONE_RE.is_match("+1 23"));
        assert!(!PHONE_RE.is_match("call me"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("javaScript"), "Javascript");
        assert_eq!(capitalize("élan"), "Élan");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_from_cv_round_trips_through_validate() {
        let cv = Cv {
            full_name: "Jane Doe".to_string(),
            email: "jane@doe.dev".to_string(),
            phone: Some("+1 555 123 4567".to_string()),
            location: Some("Berlin, Germany".to_string()),
            skills: vec!["Rust".to_string()],
            languages: vec![Language::Detailed {
                name: "German".to_string(),
                level: Some("Native".to_string()),
            }],
            education: vec![Education {
                degree: "Master".to_string(),
                school: "TU Berlin".to_string(),
                year: Some("2019".to_string()),
            }],
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Zalando".to_string(),
                years: Some(2.5),
                technologies: vec!["Kafka".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let form = CvForm::from_cv(&cv);
        assert_eq!(form.education, "Master | TU Berlin | 2019");
        assert_eq!(form.experience, "Engineer | Zalando | 2.5 | Kafka");

        let payload = form.validate().unwrap();
        assert_eq!(payload.languages, vec!["German"]);
        assert_eq!(payload.experience[0].years, Some(2.5));
    }
}
