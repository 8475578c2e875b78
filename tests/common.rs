use church_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::repositories::{
        sqlite_event_repo::SqliteEventRepo,
        sqlite_job_repo::SqliteJobRepo,
        sqlite_member_repo::SqliteMemberRepo,
        sqlite_rsvp_repo::SqliteRsvpRepo,
    },
    domain::services::rsvp_service::RsvpService,
    domain::models::job::Notification,
    domain::ports::NotificationDispatcher,
    background::start_background_worker,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use tower::ServiceExt;
use serde_json::Value;

pub struct MockNotifier;

#[async_trait]
impl NotificationDispatcher for MockNotifier {
    async fn dispatch(&self, _notification: &Notification) -> Result<(), AppError> {
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            notify_webhook_url: None,
            notify_webhook_token: "".to_string(),
        };

        let event_repo = Arc::new(SqliteEventRepo::new(pool.clone()));
        let rsvp_repo = Arc::new(SqliteRsvpRepo::new(pool.clone()));
        let rsvp_service = Arc::new(RsvpService::new(event_repo.clone(), rsvp_repo.clone()));

        let state = Arc::new(AppState {
            config,
            member_repo: Arc::new(SqliteMemberRepo::new(pool.clone())),
            event_repo,
            rsvp_repo,
            job_repo: Arc::new(SqliteJobRepo::new(pool.clone())),
            rsvp_service,
            notifier: Arc::new(MockNotifier),
        });

        // Start Background Worker
        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// First member created against an empty database becomes the admin.
    pub async fn bootstrap_admin(&self) -> String {
        let payload = serde_json::json!({
            "name": "Admin",
            "email": format!("admin-{}@example.com", Uuid::new_v4())
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/members")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Bootstrap admin failed in test helper: status {}", response.status());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        body_json["id"].as_str().expect("No member id in body").to_string()
    }

    pub async fn create_member(&self, admin_id: &str, name: &str) -> String {
        let payload = serde_json::json!({
            "name": name,
            "email": format!("{}-{}@example.com", name.to_lowercase().replace(' ', "-"), Uuid::new_v4()),
            "role": "MEMBER"
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/members")
                .header("X-Member-Id", admin_id)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Create member failed in test helper: status {}", response.status());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        body_json["id"].as_str().expect("No member id in body").to_string()
    }

    pub async fn create_event(&self, admin_id: &str, title: &str, max_capacity: Option<i32>) -> String {
        let payload = serde_json::json!({
            "title": title,
            "description": "Test event",
            "location": "Main Hall",
            "start_time": (Utc::now() + Duration::days(7)).to_rfc3339(),
            "end_time": (Utc::now() + Duration::days(7) + Duration::hours(2)).to_rfc3339(),
            "max_capacity": max_capacity
        });

        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/events")
                .header("X-Member-Id", admin_id)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("Create event failed in test helper: status {}", response.status());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_json: Value = serde_json::from_slice(&body_bytes).unwrap();
        body_json["id"].as_str().expect("No event id in body").to_string()
    }

    /// RSVP through the API, returning the full response body.
    pub async fn rsvp(&self, member_id: &str, event_id: &str) -> Value {
        let response = self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/events/{}/rsvp", event_id))
                .header("X-Member-Id", member_id)
                .body(Body::empty())
                .unwrap()
        ).await.unwrap();

        if !response.status().is_success() {
            panic!("RSVP failed in test helper: status {}", response.status());
        }

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
