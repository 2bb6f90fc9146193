//! HTTP surface. Every route is served both at the root and under `/api`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tcguard_ai::{
    AnalysisError, AnalysisService, ChatError, ChatRequest, ChatResponse, ChatService, EmailDraft,
    NegotiationError, NegotiationService,
};
use tcguard_core::{AnalyzeResponse, Jurisdiction, NegotiationPayload, NegotiationRecord};
use tcguard_ingest::{IngestResult, Ingestor};
use tracing::{error, info};

pub const BANNER: &str = "T&C Guardian API is running. Stay safe out there.";

#[derive(Clone)]
pub struct AppState {
    pub analysis: AnalysisService,
    pub chat: ChatService,
    pub negotiations: NegotiationService,
    pub ingestor: Arc<Ingestor>,
}

// ── Errors ──

/// Error body `{"detail": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::EmptyInput => {
                Self::new(StatusCode::BAD_REQUEST, format!("Analysis failed: {e}"))
            }
            other => {
                error!(error = %other, "analysis error reached the handler");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed")
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::NotConfigured => Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ChatError::Model(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Chat failed"),
        }
    }
}

impl From<NegotiationError> for ApiError {
    fn from(e: NegotiationError) -> Self {
        match e {
            NegotiationError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            NegotiationError::NotConfigured => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            NegotiationError::Model(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate email")
            }
            NegotiationError::Store(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Negotiation storage failed")
            }
        }
    }
}

// ── Requests ──

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    /// Structured identifier or legacy code; unknown values mean California.
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

// ── Router ──

pub fn app(state: AppState) -> Router {
    let routes = routes();
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(routes.clone())
        .nest("/api", routes)
        .with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/analyze/", post(analyze))
        .route("/chat", post(chat))
        .route("/chat/", post(chat))
        .route("/ingest/url", post(ingest_url))
        .route("/ingest/file", post(ingest_file))
        .route("/negotiations/create", post(create_negotiation))
        .route("/negotiations", get(list_negotiations))
        .route("/negotiations/", get(list_negotiations))
        .route("/negotiations/:id/generate-email", post(generate_email))
}

pub async fn serve(state: AppState, bind: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ── Handlers ──

async fn root() -> Json<Value> {
    Json(json!({ "message": BANNER }))
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body?;
    let jurisdiction = request
        .jurisdiction
        .as_deref()
        .map(Jurisdiction::resolve)
        .unwrap_or_default();
    let outcome = state.analysis.analyze(&request.text, jurisdiction).await?;
    info!(fingerprint = %outcome.fingerprint, source = ?outcome.source, "analyze served");
    Ok(Json(AnalyzeResponse::from(outcome.result)))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.chat.ask(request).await?))
}

async fn ingest_url(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<IngestResult>, ApiError> {
    let text = state
        .ingestor
        .extract_from_url(&query.url)
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Failed to scrape URL: {e}")))?;
    Ok(Json(IngestResult::success(text)))
}

async fn ingest_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResult>, ApiError> {
    let bad_request = |detail: String| {
        ApiError::new(StatusCode::BAD_REQUEST, format!("Failed to process file: {detail}"))
    };

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
            upload = Some((filename, bytes));
            break;
        }
    }
    let (filename, bytes) = upload
        .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Missing `file` field"))?;

    let ingestor = state.ingestor.clone();
    let text = tokio::task::spawn_blocking(move || {
        ingestor.extract_from_file(filename.as_deref(), &bytes)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "file extraction task failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process file")
    })?
    .map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(IngestResult::success(text)))
}

async fn create_negotiation(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<NegotiationRecord>, ApiError> {
    let Json(value) = body?;
    let payload = NegotiationPayload::from_value(value).map_err(|e| {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid negotiation data: {e}"))
    })?;
    Ok(Json(state.negotiations.create(payload).await))
}

async fn list_negotiations(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<NegotiationRecord>>, ApiError> {
    Ok(Json(state.negotiations.list(&query.user_id).await?))
}

async fn generate_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<EmailRequest>>,
) -> Result<Json<EmailDraft>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let draft = state
        .negotiations
        .generate_email(&id, request.tone.as_deref())
        .await?;
    Ok(Json(draft))
}
