use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub receipt_template: HealthCheck,
    pub pdf_converter: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Ready only while receipts can be rendered; a missing converter still serves HTML quotations.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let generator = Arc::clone(&state.receipt);
    let checked = tokio::task::spawn_blocking(move || generator.check_template()).await;
    let receipt_template = match checked {
        Ok(Ok(())) => HealthCheck {
            status: "ready",
            detail: format!("{} is usable", state.receipt.template_path().display()),
        },
        Ok(Err(error)) => HealthCheck { status: "degraded", detail: error.to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("template check failed: {error}") }
        }
    };
    let pdf_converter = match state.quotation.converter_path() {
        Some(path) => HealthCheck { status: "ready", detail: path.display().to_string() },
        None => HealthCheck {
            status: "skipped",
            detail: "wkhtmltopdf not found, quotations are served as HTML".to_string(),
        },
    };
    let ready = receipt_template.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("orbit-server serving {} catalog items", state.catalog.len()),
        },
        receipt_template,
        pdf_converter,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use tempfile::TempDir;

    use crate::health::health;
    use crate::routes::tests::{state, write_receipt_template};

    #[tokio::test]
    async fn health_returns_ready_when_receipt_template_is_usable() {
        let dir = TempDir::new().expect("tempdir");
        let template = write_receipt_template(dir.path());

        let (status, Json(payload)) = health(State(state(template))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.receipt_template.status, "ready");
        assert_eq!(payload.pdf_converter.status, "skipped");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_without_receipt_template() {
        let dir = TempDir::new().expect("tempdir");

        let (status, Json(payload)) = health(State(state(dir.path().join("absent.docx")))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.receipt_template.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn health_check_completes_on_a_single_threaded_runtime() {
        let dir = TempDir::new().expect("tempdir");
        let template = write_receipt_template(dir.path());

        let ticker = tokio::spawn(async { tokio::task::yield_now().await });
        let (status, Json(payload)) = health(State(state(template))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(payload.receipt_template.detail.ends_with("is usable"));
        ticker.await.expect("other tasks keep running");
    }
}
