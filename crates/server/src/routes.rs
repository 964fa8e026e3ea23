//! JSON API behind the quotation and receipt forms.
//!
//! - `GET  /api/v1/catalog`            price list in display order
//! - `POST /api/v1/quotation/preview`  live bill for a partially filled form
//! - `POST /api/v1/quotation`          quotation PDF (HTML without a converter)
//! - `POST /api/v1/receipt`            proforma receipt DOCX

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use orbit_core::cpq::catalog::Catalog;
use orbit_core::cpq::subsidy::SubsidyCapTable;
use orbit_core::domain::product::CatalogItem;
use orbit_core::domain::quote::QuoteSummary;
use orbit_core::domain::receipt::ReceiptForm;
use orbit_core::errors::{ApplicationError, DomainError, InterfaceError};
use orbit_core::forms::QuoteForm;
use orbit_core::QuoteState;
use orbit_documents::{QuotationPdfGenerator, ReceiptDocxGenerator, DOCX_CONTENT_TYPE};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub quotation: Arc<QuotationPdfGenerator>,
    pub receipt: Arc<ReceiptDocxGenerator>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

type HandlerError = (StatusCode, Json<ApiError>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/catalog", get(catalog))
        .route("/api/v1/quotation/preview", post(preview_quotation))
        .route("/api/v1/quotation", post(download_quotation))
        .route("/api/v1/receipt", post(download_receipt))
        .with_state(state)
}

pub async fn catalog(State(state): State<AppState>) -> Json<Vec<CatalogItem>> {
    Json(state.catalog.items().to_vec())
}

pub async fn preview_quotation(
    State(state): State<AppState>,
    Json(form): Json<QuoteForm>,
) -> Result<Json<QuoteSummary>, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let quote = replay_form(&state, form).map_err(|error| reject(error.into(), &correlation_id))?;
    Ok(Json(quote.summary()))
}

pub async fn download_quotation(
    State(state): State<AppState>,
    Json(form): Json<QuoteForm>,
) -> Result<Response, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let quotation = replay_form(&state, form)
        .and_then(QuoteState::finalize)
        .map_err(|error| reject(error.into(), &correlation_id))?;

    let document = state
        .quotation
        .generate(&quotation)
        .await
        .map_err(|error| reject(error.into(), &correlation_id))?;

    info!(
        event_name = "api.quotation.generated",
        correlation_id = %correlation_id,
        customer = %quotation.customer_name,
        net_total = quotation.net_total,
        pdf = document.is_pdf(),
        "quotation generated"
    );
    let content_type = document.content_type();
    let file_name = document.file_name();
    Ok(attachment(content_type, file_name, document.into_bytes()))
}

pub async fn download_receipt(
    State(state): State<AppState>,
    Json(form): Json<ReceiptForm>,
) -> Result<Response, HandlerError> {
    let correlation_id = Uuid::new_v4().to_string();
    let receipt = form
        .parse(&state.catalog, Local::now().date_naive())
        .map_err(|error| reject(error.into(), &correlation_id))?;

    let generator = Arc::clone(&state.receipt);
    let rendered = tokio::task::spawn_blocking(move || {
        let bytes = generator.render(&receipt)?;
        Ok::<_, orbit_documents::DocumentError>((receipt, bytes))
    })
    .await
    .map_err(|error| ApplicationError::Document(format!("receipt task failed: {error}")))
    .and_then(|result| result.map_err(ApplicationError::from));
    let (receipt, bytes) = rendered.map_err(|error| reject(error, &correlation_id))?;

    info!(
        event_name = "api.receipt.generated",
        correlation_id = %correlation_id,
        receipt_no = %receipt.receipt_no,
        "proforma receipt generated"
    );
    Ok(attachment(DOCX_CONTENT_TYPE, &receipt.output_filename(), bytes))
}

fn replay_form(state: &AppState, form: QuoteForm) -> Result<QuoteState, DomainError> {
    form.into_state_with(state.catalog.as_ref().clone(), SubsidyCapTable::standard())
}

fn attachment(content_type: &str, file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_owned()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        bytes,
    )
        .into_response()
}

/// Input problems become a 400 naming the field; anything else is a generic 500.
fn reject(error: ApplicationError, correlation_id: &str) -> HandlerError {
    let interface = error.into_interface(correlation_id);
    let message = interface.user_message().to_owned();

    match interface {
        InterfaceError::BadRequest { field, .. } => {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                field = field.as_deref().unwrap_or("-"),
                error = %message,
                "form input rejected"
            );
            (StatusCode::BAD_REQUEST, Json(ApiError { error: message, field }))
        }
        InterfaceError::Internal { message: detail, .. } => {
            error!(
                event_name = "api.document.failed",
                correlation_id = %correlation_id,
                error = %detail,
                "document generation failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError { error: message, field: None }))
        }
    }
}
