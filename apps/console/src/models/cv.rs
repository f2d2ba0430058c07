use serde::{Deserialize, Deserializer, Serialize};

/// A candidate CV as returned by the remote API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Cv {
    #[serde(alias = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub languages: Vec<Language>,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "null_as_default")]
    pub certifications: Vec<Certification>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(deserialize_with = "null_as_default")]
    pub school: String,
    /// The API stores years as strings but older records carry numbers.
    #[serde(deserialize_with = "string_or_number")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "number_or_string")]
    pub years: Option<f64>,
    pub duration: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
}

/// Either a bare language name or a name with a proficiency level
/// (Beginner, Intermediate, Advanced, Native).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Language {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        level: Option<String>,
    },
}

impl Language {
    pub fn name(&self) -> &str {
        match self {
            Language::Name(name) => name,
            Language::Detailed { name, .. } => name,
        }
    }

    pub fn level(&self) -> Option<&str> {
        match self {
            Language::Name(_) => None,
            Language::Detailed { level, .. } => level.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Certification {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub icon: Option<String>,
}

/// Body of a create or update request.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CvPayload {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub education: Vec<EducationPayload>,
    pub experience: Vec<ExperiencePayload>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EducationPayload {
    pub degree: String,
    pub school: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExperiencePayload {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<f64>,
    pub technologies: Vec<String>,
}

/// Job profile submitted to the candidate matcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDescription {
    pub skills: Vec<String>,
    #[serde(default)]
    pub min_experience: u32,
    #[serde(default = "default_top_n")]
    pub top_n: u32,
}

fn default_top_n() -> u32 {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Analytics
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocationCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EducationCount {
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    pub count: u64,
}

/// Aggregated experience years. The API answers `{}` for an empty collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperienceStats {
    #[serde(deserialize_with = "null_as_default")]
    pub min_years: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_years: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_years: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardData {
    pub total_cvs: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub recent: Vec<Cv>,
    #[serde(deserialize_with = "null_as_default")]
    pub top_skills: Vec<SkillCount>,
    #[serde(deserialize_with = "null_as_default")]
    pub top_locations: Vec<LocationCount>,
    #[serde(deserialize_with = "null_as_default")]
    pub education_distribution: Vec<EducationCount>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills_distribution: Vec<SkillCount>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience_levels: ExperienceStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient decoding helpers
// ────────────────────────────────────────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.and_then(|v| match v {
            StringOrNumber::String(s) if s.trim().is_empty() => None,
            StringOrNumber::String(s) => Some(s),
            StringOrNumber::Int(i) => Some(i.to_string()),
            StringOrNumber::Float(f) => Some(format_number(f)),
        }),
    )
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.and_then(|v| match v {
            StringOrNumber::String(s) => s.trim().parse().ok(),
            StringOrNumber::Int(i) => Some(i as f64),
            StringOrNumber::Float(f) => Some(f),
        }),
    )
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
