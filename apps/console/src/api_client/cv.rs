//! CV collection endpoints: CRUD, analytics, matching and the dashboard.

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use tracing::info;

use super::{ApiClient, ApiError};
use crate::listing::SortDirection;
use crate::models::cv::{
    Cv, CvPayload, DashboardData, DeleteResponse, EducationCount, ExperienceStats,
    JobDescription, LocationCount, SkillCount,
};

/// Largest page the backend hands out for a single list call.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Bytes escaped in a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn match_mode(all: bool) -> String {
    let mode = if all { "and" } else { "or" };
    mode.to_string()
}

/// `cv/{id}` with the id kept to one path segment.
fn cv_path(id: &str) -> String {
    format!("cv/{}", utf8_percent_encode(id, SEGMENT))
}

/// Server-side filters accepted by `GET /cv/`. Unset fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct CvQuery {
    pub search: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    /// Require every listed skill instead of any.
    pub all_skills: bool,
    pub languages: Vec<String>,
    pub all_languages: bool,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub min_experience_years: Option<u32>,
    pub max_experience_years: Option<u32>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub order: Option<SortDirection>,
}

impl CvQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let mut push_text = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        };
        push_text("search", &self.search);
        push_text("full_name", &self.full_name);
        push_text("email", &self.email);
        push_text("location", &self.location);
        push_text("education", &self.education);
        push_text("experience", &self.experience);
        push_text("sort_by", &self.sort_by);

        if !self.skills.is_empty() {
            params.push(("skills", self.skills.join(",")));
            params.push(("skills_mode", match_mode(self.all_skills)));
        }
        if !self.languages.is_empty() {
            params.push(("languages", self.languages.join(",")));
            params.push(("languages_mode", match_mode(self.all_languages)));
        }
        if let Some(v) = self.min_experience_years {
            params.push(("min_experience_years", v.to_string()));
        }
        if let Some(v) = self.max_experience_years {
            params.push(("max_experience_years", v.to_string()));
        }
        if let Some(d) = self.created_from {
            params.push(("created_from", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.created_to {
            params.push(("created_to", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(v) = self.skip {
            params.push(("skip", v.to_string()));
        }
        if let Some(v) = self.limit {
            params.push(("limit", v.min(MAX_PAGE_LIMIT).to_string()));
        }
        if let Some(order) = self.order {
            params.push(("order", order.as_str().to_string()));
        }
        params
    }
}

impl ApiClient {
    /// GET /cv/
    pub async fn list_cvs(&self, query: &CvQuery) -> Result<Vec<Cv>, ApiError> {
        self.get_json("cv/", &query.to_params()).await
    }

    /// Pages through `GET /cv/` until the backend runs dry.
    pub async fn fetch_all_cvs(&self) -> Result<Vec<Cv>, ApiError> {
        let mut all = Vec::new();
        let mut skip = 0u32;
        loop {
            let query = CvQuery {
                skip: Some(skip),
                limit: Some(MAX_PAGE_LIMIT),
                ..Default::default()
            };
            let batch = self.list_cvs(&query).await?;
            let fetched = batch.len() as u32;
            all.extend(batch);
            if fetched < MAX_PAGE_LIMIT {
                break;
            }
            skip += fetched;
        }
        Ok(all)
    }

    /// GET /cv/{id}
    pub async fn get_cv(&self, id: &str) -> Result<Cv, ApiError> {
        self.get_json(&cv_path(id), &[]).await
    }

    /// POST /cv/
    pub async fn create_cv(&self, payload: &CvPayload) -> Result<Cv, ApiError> {
        let cv: Cv = self.send_json(Method::POST, "cv/", Some(payload)).await?;
        info!("Created CV {} ({})", cv.id, cv.email);
        Ok(cv)
    }

    /// PUT /cv/{id}
    pub async fn update_cv(&self, id: &str, payload: &CvPayload) -> Result<Cv, ApiError> {
        let mut cv: Cv = self
            .send_json(Method::PUT, &cv_path(id), Some(payload))
            .await?;
        if cv.id.is_empty() {
            cv.id = id.to_string();
        }
        info!("Updated CV {id}");
        Ok(cv)
    }

    /// DELETE /cv/{id}
    pub async fn delete_cv(&self, id: &str) -> Result<DeleteResponse, ApiError> {
        let mut response: DeleteResponse = self
            .send_json(Method::DELETE, &cv_path(id), None::<&()>)
            .await?;
        if response.id.as_deref().map_or(true, str::is_empty) {
            response.id = Some(id.to_string());
        }
        info!("Deleted CV {id}");
        Ok(response)
    }

    /// GET /cv/analytics/skills
    pub async fn top_skills(&self, limit: u32) -> Result<Vec<SkillCount>, ApiError> {
        self.get_json("cv/analytics/skills", &[("limit", limit.to_string())])
            .await
    }

    /// GET /cv/analytics/locations
    pub async fn top_locations(&self, limit: u32) -> Result<Vec<LocationCount>, ApiError> {
        self.get_json("cv/analytics/locations", &[("limit", limit.to_string())])
            .await
    }

    /// GET /cv/analytics/education
    pub async fn education_distribution(&self) -> Result<Vec<EducationCount>, ApiError> {
        self.get_json("cv/analytics/education", &[]).await
    }

    /// GET /cv/analytics/experience
    pub async fn experience_stats(&self) -> Result<ExperienceStats, ApiError> {
        self.get_json("cv/analytics/experience", &[]).await
    }

    /// POST /cv/match
    pub async fn match_candidates(&self, job: &JobDescription) -> Result<Vec<Cv>, ApiError> {
        self.send_json(Method::POST, "cv/match", Some(job)).await
    }

    /// GET /cv/dashboard
    pub async fn dashboard(&self) -> Result<DashboardData, ApiError> {
        self.get_json("cv/dashboard", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api/v1", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_query_params_skip_unset_and_blank() {
        let query = CvQuery {
            search: Some("  ".to_string()),
            location: Some("Paris".to_string()),
            skills: vec!["Rust".to_string(), "Go".to_string()],
            all_skills: true,
            created_from: NaiveDate::from_ymd_opt(2024, 1, 31),
            limit: Some(500),
            order: Some(SortDirection::Desc),
            ..Default::default()
        };
        let params = query.to_params();
        assert!(!params.iter().any(|(k, _)| *k == "search"));
        assert!(params.contains(&("location", "Paris".to_string())));
        assert!(params.contains(&("skills", "Rust,Go".to_string())));
        assert!(params.contains(&("skills_mode", "and".to_string())));
        assert!(params.contains(&("created_from", "2024-01-31".to_string())));
        assert!(params.contains(&("limit", "100".to_string())));
        assert!(params.contains(&("order", "desc".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "languages_mode"));
    }

    #[tokio::test]
    async fn test_list_cvs_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/"))
            .and(query_param("location", "Berlin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "a1", "full_name": "Jo", "email": "jo@x.io", "location": "Berlin"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let query = CvQuery {
            location: Some("Berlin".to_string()),
            ..Default::default()
        };
        let cvs = client.list_cvs(&query).await.unwrap();
        assert_eq!(cvs.len(), 1);
        assert_eq!(cvs[0].id, "a1");
    }

    #[tokio::test]
    async fn test_fetch_all_cvs_pages_until_short_batch() {
        let server = MockServer::start().await;
        let full: Vec<_> = (0..100)
            .map(|i| json!({"id": format!("cv{i}"), "full_name": "X", "email": "x@y.z"}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(full)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/"))
            .and(query_param("skip", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "last", "full_name": "Y", "email": "y@y.z"}])),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let all = client.fetch_all_cvs().await.unwrap();
        assert_eq!(all.len(), 101);
        assert_eq!(all[100].id, "last");
    }

    #[tokio::test]
    async fn test_get_cv_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "CV not found"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_cv("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "CV not found"));
    }

    #[tokio::test]
    async fn test_cv_id_stays_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/a%2Fb%3Fx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "a/b?x", "full_name": "Ana", "email": "a@b.io"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let cv = client.get_cv("a/b?x").await.unwrap();
        assert_eq!(cv.id, "a/b?x");
        assert_eq!(cv_path("64f1c2"), "cv/64f1c2");
    }

    #[tokio::test]
    async fn test_get_retries_after_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/analytics/experience"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cv/analytics/experience"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "min_years": 0, "max_years": 10, "avg_years": 3.2
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let stats = client.experience_stats().await.unwrap();
        assert_eq!(stats.max_years, 10.0);
    }

    #[tokio::test]
    async fn test_create_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cv/"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "error", "message": "Internal server error"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let payload = CvPayload {
            full_name: "Max".to_string(),
            email: "max@x.io".to_string(),
            ..Default::default()
        };
        let err = client.create_cv(&payload).await.unwrap_err();
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_delete_fills_in_missing_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/cv/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "CV deleted successfully"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client.delete_cv("abc").await.unwrap();
        assert_eq!(response.id.as_deref(), Some("abc"));
        assert_eq!(response.message, "CV deleted successfully");
    }

    #[tokio::test]
    async fn test_match_candidates_posts_job_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cv/match"))
            .and(header("authorization", "Bearer t0k"))
            .and(body_json(json!({"skills": ["Rust"], "min_experience": 2, "top_n": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "m1", "full_name": "Best Fit", "email": "b@f.io", "skills": ["Rust"]}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server).await.with_token(Some("t0k"));
        let job = JobDescription {
            skills: vec!["Rust".to_string()],
            min_experience: 2,
            top_n: 3,
        };
        let matches = client.match_candidates(&job).await.unwrap();
        assert_eq!(matches[0].full_name, "Best Fit");
    }
}
