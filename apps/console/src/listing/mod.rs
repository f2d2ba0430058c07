//! In-memory list view over a fetched collection: filter, sort, paginate and
//! the facet values that feed the filter dropdowns.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::cv::Cv;
use crate::models::user::User;

pub mod export;
pub mod handlers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn is_asc(&self) -> bool {
        *self == SortDirection::Asc
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    FullName,
    Email,
    Location,
    Phone,
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::FullName,
        SortField::Email,
        SortField::Location,
        SortField::Phone,
        SortField::CreatedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::FullName => "full_name",
            SortField::Email => "email",
            SortField::Location => "location",
            SortField::Phone => "phone",
            SortField::CreatedAt => "created_at",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::FullName => "Name",
            SortField::Email => "Email",
            SortField::Location => "Location",
            SortField::Phone => "Phone",
            SortField::CreatedAt => "Created",
        }
    }

    /// Lowercased value the list is ordered by; missing values compare as "".
    fn key(self, cv: &Cv) -> String {
        let value = match self {
            SortField::FullName => Some(cv.full_name.as_str()),
            SortField::Email => Some(cv.email.as_str()),
            SortField::Location => cv.location.as_deref(),
            SortField::Phone => cv.phone.as_deref(),
            SortField::CreatedAt => cv.created_at.as_deref(),
        };
        value.unwrap_or_default().to_lowercase()
    }
}

/// List view state, round-tripped through the page's query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub skill: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortField>,
    #[serde(skip_serializing_if = "SortDirection::is_asc")]
    pub dir: SortDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl ListQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Clicking a column header: the same column flips direction, a new
    /// column starts ascending. Returns to the first page.
    pub fn toggle_sort(&self, field: SortField) -> ListQuery {
        let dir = if self.sort == Some(field) {
            self.dir.flipped()
        } else {
            SortDirection::Asc
        };
        ListQuery {
            sort: Some(field),
            dir,
            page: None,
            ..self.clone()
        }
    }

    pub fn with_page(&self, page: usize) -> ListQuery {
        ListQuery {
            page: Some(page),
            ..self.clone()
        }
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

/// Case-insensitive substring check; an empty needle always matches.
fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

pub fn matches(cv: &Cv, query: &ListQuery) -> bool {
    let search = query.search.trim().to_lowercase();
    let matches_search = search.is_empty()
        || contains_ci(&cv.full_name, &search)
        || contains_ci(&cv.email, &search)
        || cv.skills.iter().any(|s| contains_ci(s, &search));

    let matches_skill = query.skill.is_empty() || cv.skills.iter().any(|s| *s == query.skill);
    let matches_location =
        query.location.is_empty() || cv.location.as_deref() == Some(query.location.as_str());

    matches_search && matches_skill && matches_location
}

pub fn filter<'a>(cvs: &'a [Cv], query: &ListQuery) -> Vec<&'a Cv> {
    cvs.iter().filter(|cv| matches(cv, query)).collect()
}

/// Stable sort by the lowercase string form of `field`.
pub fn sort(cvs: &mut [&Cv], field: SortField, dir: SortDirection) {
    cvs.sort_by(|a, b| {
        let ord = field.key(a).cmp(&field.key(b));
        match dir {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Filtered and sorted view, across all pages.
pub fn apply<'a>(cvs: &'a [Cv], query: &ListQuery) -> Vec<&'a Cv> {
    let mut result = filter(cvs, query);
    if let Some(field) = query.sort {
        sort(&mut result, field, query.dir);
    }
    result
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// One page of `items`, with the requested page clamped into range.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());
    Page {
        items: items.get(start..end).unwrap_or_default().to_vec(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

/// Distinct values offered by the filter dropdowns, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    pub skills: Vec<String>,
    pub locations: Vec<String>,
}

pub fn facets(cvs: &[Cv]) -> Facets {
    let mut facets = Facets::default();
    let mut seen_skills = HashSet::new();
    let mut seen_locations = HashSet::new();
    for cv in cvs {
        for skill in &cv.skills {
            if seen_skills.insert(skill.as_str()) {
                facets.skills.push(skill.clone());
            }
        }
        if let Some(location) = cv.location.as_deref().filter(|l| !l.is_empty()) {
            if seen_locations.insert(location) {
                facets.locations.push(location.to_string());
            }
        }
    }
    facets
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserQuery {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl UserQuery {
    pub fn with_page(&self, page: usize) -> UserQuery {
        UserQuery {
            page: Some(page),
            ..self.clone()
        }
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

pub fn filter_users<'a>(users: &'a [User], query: &UserQuery) -> Vec<&'a User> {
    let search = query.search.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            search.is_empty()
                || contains_ci(&u.full_name, &search)
                || contains_ci(&u.email, &search)
        })
        .filter(|u| query.role.is_empty() || u.role.as_str() == query.role)
        .collect()
}

/// Roles present in `users`, in first-seen order.
pub fn user_roles(users: &[User]) -> Vec<String> {
    let mut roles: Vec<String> = Vec::new();
    for user in users {
        let role = user.role.as_str();
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_string());
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn cv(id: &str, name: &str, email: &str, location: Option<&str>, skills: &[&str]) -> Cv {
        Cv {
            id: id.to_string(),
            full_name: name.to_string(),
            email: email.to_string(),
            location: location.map(str::to_string),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sample() -> Vec<Cv> {
        vec![
            cv("1", "Zoe Martin", "zoe@acme.io", Some("Paris, France"), &["Rust", "Go"]),
            cv("2", "adam smith", "adam@corp.com", Some("London, UK"), &["Python"]),
            cv("3", "Mia Chen", "mia@acme.io", None, &["Rust", "TypeScript"]),
        ]
    }

    fn ids(cvs: &[&Cv]) -> Vec<String> {
        cvs.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_search_matches_name_email_or_skill() {
        let cvs = sample();
        let by_name = ListQuery {
            search: "ZOE".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&cvs, &by_name)), vec!["1"]);

        let by_email = ListQuery {
            search: "acme".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&cvs, &by_email)), vec!["1", "3"]);

        let by_skill = ListQuery {
            search: "script".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&cvs, &by_skill)), vec!["3"]);
    }

    #[test]
    fn test_skill_and_location_are_exact() {
        let cvs = sample();
        let query = ListQuery {
            skill: "rust".to_string(),
            ..Default::default()
        };
        assert!(filter(&cvs, &query).is_empty());

        let query = ListQuery {
            skill: "Rust".to_string(),
            location: "Paris, France".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&cvs, &query)), vec!["1"]);
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let cvs = sample();
        assert_eq!(filter(&cvs, &ListQuery::default()).len(), 3);
    }

    #[test]
    fn test_sort_case_insensitive_with_missing_values_first() {
        let cvs = sample();
        let mut view = filter(&cvs, &ListQuery::default());
        sort(&mut view, SortField::FullName, SortDirection::Asc);
        assert_eq!(ids(&view), vec!["2", "3", "1"]);

        sort(&mut view, SortField::Location, SortDirection::Asc);
        assert_eq!(ids(&view), vec!["3", "2", "1"]);

        sort(&mut view, SortField::Location, SortDirection::Desc);
        assert_eq!(ids(&view), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_toggle_sort() {
        let query = ListQuery {
            page: Some(3),
            ..Default::default()
        };
        let first = query.toggle_sort(SortField::Email);
        assert_eq!(first.sort, Some(SortField::Email));
        assert_eq!(first.dir, SortDirection::Asc);
        assert_eq!(first.page, None);

        let second = first.toggle_sort(SortField::Email);
        assert_eq!(second.dir, SortDirection::Desc);

        let other = second.toggle_sort(SortField::FullName);
        assert_eq!(other.dir, SortDirection::Asc);
    }

    #[test]
    fn test_total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, 5), 1);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(total_pages(11, 5), 3);
    }

    #[test]
    fn test_paginate_clamps_page() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate(&items, 3, 5);
        assert_eq!(page.items, vec![11, 12]);
        assert!(page.has_prev());
        assert!(!page.has_next());

        let past_end = paginate(&items, 9, 5);
        assert_eq!(past_end.page, 3);

        let before_start = paginate(&items, 0, 5);
        assert_eq!(before_start.page, 1);
        assert_eq!(before_start.items, vec![1, 2, 3, 4, 5]);
        assert!(!before_start.has_prev());
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate::<u32>(&[], 1, 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }

    #[test]
    fn test_facets_unique_in_first_seen_order() {
        let f = facets(&sample());
        assert_eq!(f.skills, vec!["Rust", "Go", "Python", "TypeScript"]);
        assert_eq!(f.locations, vec!["Paris, France", "London, UK"]);
    }

    #[test]
    fn test_query_string_round_trip() {
        let query = ListQuery {
            search: "rust dev".to_string(),
            sort: Some(SortField::CreatedAt),
            dir: SortDirection::Desc,
            page: Some(2),
            ..Default::default()
        };
        let qs = query.to_query_string();
        assert_eq!(qs, "search=rust+dev&sort=created_at&dir=desc&page=2");
        let parsed: ListQuery = serde_urlencoded::from_str(&qs).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_filter_users_by_search_and_role() {
        let users = vec![
            User {
                id: "u1".to_string(),
                full_name: "Ana Silva".to_string(),
                email: "ana@cv.io".to_string(),
                role: Role::Admin,
                created_at: None,
            },
            User {
                id: "u2".to_string(),
                full_name: "Ben Ode".to_string(),
                email: "ben@cv.io".to_string(),
                role: Role::Recruiter,
                created_at: None,
            },
        ];
        let query = UserQuery {
            search: "CV.IO".to_string(),
            role: "recruiter".to_string(),
            page: None,
        };
        let found = filter_users(&users, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "u2");
        assert_eq!(user_roles(&users), vec!["admin", "recruiter"]);
    }
}
