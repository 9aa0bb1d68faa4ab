use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::Html,
    routing::{get, post},
};
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::{MailConfig, ServerConfig};
use crate::error::{MailError, SurveyError};
use crate::mailer;
use crate::saving;
use crate::submission::{RequestRow, SurveySubmission};

pub struct AppState {
    mail: MailConfig,
    save_dir: PathBuf,
    // serialises appends from concurrent requests within this process
    append_lock: Mutex<()>,
}

impl AppState {
    pub fn new(mail: MailConfig, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            mail,
            save_dir: save_dir.into(),
            append_lock: Mutex::new(()),
        }
    }

    /// Validate a raw body and append it to the day's file
    ///
    /// Nothing is written unless every field is present.
    pub fn store(&self, body: &[u8], received: NaiveDateTime) -> Result<(PathBuf, RequestRow), SurveyError> {
        let row = SurveySubmission::from_slice(body)?.into_row(received);
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let path = saving::append_request(&self.save_dir, &row)?;
        Ok((path, row))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: String,
    pub message: String,
}

impl SubmitResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "Your request has been saved!".to_string(),
        }
    }

    fn error(e: &SurveyError) -> Self {
        Self {
            status: "error".to_string(),
            message: format!("Error while saving: {}", e),
        }
    }
}

pub fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(serve_survey))
        .route("/submit", post(submit_survey))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mail = MailConfig::load(&config.config)?;
    std::fs::create_dir_all(&config.save_dir)?;

    let state = Arc::new(AppState::new(mail, &config.save_dir));
    let app = router(state, &config.static_dir);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_survey() -> Html<&'static str> {
    Html(include_str!("./static/survey.html"))
}

async fn submit_survey(State(state): State<Arc<AppState>>, body: Bytes) -> Json<SubmitResponse> {
    let received = Local::now().naive_local();
    let saver = Arc::clone(&state);
    let stored = tokio::task::spawn_blocking(move || saver.store(&body, received))
        .await
        .unwrap_or_else(|e| Err(SurveyError::Task(e.to_string())));

    let (path, row) = match stored {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Rejected submission: {}", e);
            return Json(SubmitResponse::error(&e));
        }
    };
    info!("Request saved to {}", path.display());

    info!("Sending notification for {}", row.software_nm);
    match mailer::send_request_notice(&state.mail, &row).await {
        Ok(()) => info!("Notification sent"),
        Err(MailError::MissingConfig) => warn!("Mail settings are incomplete; notification skipped"),
        Err(e) => error!("Failed to send notification: {}", e),
    }

    Json(SubmitResponse::success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app(dir: &std::path::Path) -> Router {
        let state = Arc::new(AppState::new(MailConfig::default(), dir));
        router(state, "static")
    }

    async fn post_json(app: Router, body: impl Into<String>) -> SubmitResponse {
        let response = app
            .oneshot(
                Request::post("/submit")
                    .header("content-type", "application/json")
                    .body(Body::from(body.into()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn serves_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(dir.path())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains("/submit"));
    }

    #[tokio::test]
    async fn valid_submission_is_saved_even_without_mail_settings() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"department":"R&D","name":"Kim","employee_id":"7",
                       "software":"MATLAB","work_type":"install"}"#;

        let response = post_json(test_app(dir.path()), body).await;
        assert_eq!(response, SubmitResponse::success());

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let rows = saving::load_requests(files[0].as_ref().unwrap().path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].software_nm, "MATLAB");
        assert_eq!(rows[0].employee_id, "7");
    }

    #[tokio::test]
    async fn missing_field_returns_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"{"department":"R&D","name":"Kim","software":"MATLAB","work_type":"install"}"#;

        let response = post_json(test_app(dir.path()), body).await;
        assert_eq!(response.status, "error");
        assert!(response.message.contains("employee_id"), "{}", response.message);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn malformed_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = post_json(test_app(dir.path()), "not json").await;
        assert_eq!(response.status, "error");
        assert!(response.message.starts_with("Error while saving:"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_submissions_share_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let posts: Vec<_> = (0..8)
            .map(|i| {
                let body = format!(
                    r#"{{"department":"d","name":"n{}","employee_id":"{}","software":"s","work_type":"w"}}"#,
                    i, i
                );
                tokio::spawn(post_json(app.clone(), body))
            })
            .collect();
        for post in posts {
            assert_eq!(post.await.unwrap(), SubmitResponse::success());
        }

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        // a run across midnight would split the rows over two files
        let mut ids: Vec<String> = Vec::new();
        for file in &files {
            let text = std::fs::read_to_string(file).unwrap();
            assert_eq!(text.matches("req_date").count(), 1, "{}", file.display());
            ids.extend(saving::load_requests(file).unwrap().into_iter().map(|r| r.employee_id));
        }
        ids.sort_by_key(|id| id.parse::<u32>().unwrap());
        assert_eq!(ids, (0..8).map(|i| i.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn store_appends_to_same_day_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(MailConfig::default(), dir.path());
        let when = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let body = br#"{"department":"a","name":"b","employee_id":"c","software":"d","work_type":"e"}"#;

        let (first, _) = state.store(body, when).unwrap();
        let (second, row) = state.store(body, when).unwrap();
        assert_eq!(first, second);
        assert_eq!(row.req_date, "20240102");
        assert_eq!(saving::load_requests(&first).unwrap().len(), 2);
    }
}
