//! Dashboard and analytics view-models. Aggregates arrive pre-computed from
//! the backend; this only lays them out for charts.

use crate::models::cv::{
    format_number, EducationCount, ExperienceStats, LocationCount, SkillCount,
};
use crate::render::{bar_width, max_count};

pub mod handlers;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub count: u64,
    pub width: String,
}

/// Scales each `(label, count)` against the largest count in the set.
pub fn bars(items: impl IntoIterator<Item = (String, u64)>) -> Vec<Bar> {
    let items: Vec<(String, u64)> = items.into_iter().collect();
    let max = max_count(items.iter().map(|(_, c)| *c));
    items
        .into_iter()
        .map(|(label, count)| Bar {
            width: bar_width(count, max),
            label,
            count,
        })
        .collect()
}

pub fn skill_bars(items: &[SkillCount]) -> Vec<Bar> {
    bars(items.iter().map(|s| (s.skill.clone(), s.count)))
}

pub fn location_bars(items: &[LocationCount]) -> Vec<Bar> {
    bars(items.iter().map(|l| (l.location.clone(), l.count)))
}

pub fn education_bars(items: &[EducationCount]) -> Vec<Bar> {
    bars(items.iter().map(|e| (e.degree.clone(), e.count)))
}

/// Experience figures rounded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceSummary {
    pub min_years: String,
    pub max_years: String,
    pub avg_years: String,
}

impl From<&ExperienceStats> for ExperienceSummary {
    fn from(stats: &ExperienceStats) -> Self {
        Self {
            min_years: format_number(stats.min_years),
            max_years: format_number(stats.max_years),
            avg_years: format!("{:.1}", stats.avg_years),
        }
    }
}
