//! CSV and JSON downloads for CV records.

use anyhow::{Context, Result};

use crate::models::cv::{format_number, Cv};
use crate::models::user::User;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const SUMMARY_HEADERS: [&str; 4] = ["Full Name", "Email", "Location", "Skills"];
const USER_HEADERS: [&str; 3] = ["Full Name", "Email", "Role"];
const DETAIL_HEADERS: [&str; 8] = [
    "Full Name",
    "Email",
    "Location",
    "Phone",
    "Skills",
    "Education",
    "Experience",
    "Languages",
];

fn write_csv<const N: usize>(headers: [&str; N], rows: Vec<[String; N]>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn summary_row(cv: &Cv) -> [String; 4] {
    [
        cv.full_name.clone(),
        cv.email.clone(),
        cv.location.clone().unwrap_or_default(),
        cv.skills.join(", "),
    ]
}

/// Name, email, location and skills, one row per CV in the given order.
pub fn summary_csv<'a>(cvs: impl IntoIterator<Item = &'a Cv>) -> Result<String> {
    write_csv(SUMMARY_HEADERS, cvs.into_iter().map(summary_row).collect())
}

/// Every section of a single CV flattened into one row.
pub fn detail_csv(cv: &Cv) -> Result<String> {
    let education = cv
        .education
        .iter()
        .map(|e| {
            format!(
                "{} at {} ({})",
                e.degree,
                e.school,
                e.year.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");
    let experience = cv
        .experience
        .iter()
        .map(|x| {
            let years = x.years.map(format_number).unwrap_or_else(|| "N/A".to_string());
            format!("{} at {} ({} years)", x.title, x.company, years)
        })
        .collect::<Vec<_>>()
        .join("; ");
    let languages = cv
        .languages
        .iter()
        .map(|l| format!("{} ({})", l.name(), l.level().unwrap_or("N/A")))
        .collect::<Vec<_>>()
        .join(", ");

    let row = [
        cv.full_name.clone(),
        cv.email.clone(),
        cv.location.clone().unwrap_or_default(),
        cv.phone.clone().unwrap_or_default(),
        cv.skills.join(", "),
        education,
        experience,
        languages,
    ];
    write_csv(DETAIL_HEADERS, vec![row])
}

/// One user as name, email and role.
pub fn user_csv(user: &User) -> Result<String> {
    let row = [
        user.full_name.clone(),
        user.email.clone(),
        user.role.to_string(),
    ];
    write_csv(USER_HEADERS, vec![row])
}

pub fn cv_json(cv: &Cv) -> Result<String> {
    serde_json::to_string_pretty(cv).context("Failed to encode CV as JSON")
}

/// `{full_name}.csv`, or `cv.csv` for a nameless record.
pub fn csv_filename(full_name: &str) -> String {
    download_name(full_name, "cv")
}

/// `{full_name}.csv`, or `user.csv` for a nameless user.
pub fn user_csv_filename(full_name: &str) -> String {
    download_name(full_name, "user")
}

/// Characters that are unsafe in a filename or a quoted header value become
/// `_`.
fn download_name(name: &str, fallback: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() {
        format!("{fallback}.csv")
    } else {
        format!("{stem}.csv")
    }
}
