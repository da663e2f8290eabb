// HTTP surface: health, key discovery, and brief filling.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tera::Tera;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::FillError;
use crate::llm_client::LlmClient;
use crate::prompt_builder;
use crate::reconcile::{authoritative_keys, reconcile};
use crate::template::{assemble_document, extract_fields};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    tera: Arc<Tera>,
    llm: Arc<LlmClient>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Load all prompt templates under templates/**
        let pattern = format!("{}/templates/**/*", env!("CARGO_MANIFEST_DIR"));
        let mut tera = Tera::new(&pattern)?;
        tera.autoescape_on(vec![]); // prompts are plain text, not HTML
        info!("Tera template environment loaded (pattern: {pattern})");

        let llm = LlmClient::new(&config);
        Ok(Self {
            config: Arc::new(config),
            tera: Arc::new(tera),
            llm: Arc::new(llm),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/brief/keys", get(brief_keys))
        .route("/brief/fill", post(fill_brief))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct FillRequest {
    #[serde(default)]
    pub user_data: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct FillResponse {
    pub markdown: String,
}

#[derive(Debug, Serialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn brief_keys(State(state): State<AppState>) -> Result<Json<KeysResponse>, FillError> {
    let text = read_template(&state.config.template_path).await?;
    let lines: Vec<&str> = text.lines().collect();
    let fields = extract_fields(&lines);
    // One entry per detected field, in template order; a duplicated label
    // really is two fields.
    let keys = fields.into_iter().map(|f| f.key).collect();
    Ok(Json(KeysResponse { keys }))
}

async fn fill_brief(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FillRequest>,
) -> Result<Json<FillResponse>, FillError> {
    authorize(&state.config, &headers)?;

    let text = read_template(&state.config.template_path).await?;
    let lines: Vec<&str> = text.lines().collect();
    let fields = extract_fields(&lines);
    if fields.is_empty() {
        error!("template has no 'Etiqueta:' lines ending in ':'");
        return Err(FillError::NoFieldsDetected);
    }
    info!("Filling brief: {} fields detected", fields.len());

    let keys = authoritative_keys(&fields);
    let reconciled = reconcile(&request.user_data, &keys);

    let completed = match enrich(&state, &keys, &reconciled).await {
        Ok(data) => data,
        Err(e) => {
            error!("model enrichment failed, keeping reconciled data: {e:#}");
            reconciled
        }
    };

    let markdown = assemble_document(&lines, &fields, &completed);
    Ok(Json(FillResponse { markdown }))
}

/// Render the prompts and call the model. Every failure in here is
/// recoverable: the caller falls back to the reconciled mapping.
async fn enrich(
    state: &AppState,
    keys: &[String],
    reconciled: &BTreeMap<String, String>,
) -> anyhow::Result<BTreeMap<String, String>> {
    let system_prompt = prompt_builder::render_system_prompt(&state.tera)?;
    let user_prompt = prompt_builder::render_user_prompt(&state.tera, keys, reconciled)?;
    state
        .llm
        .enrich(&system_prompt, &user_prompt, reconciled)
        .await
}

fn authorize(config: &Config, headers: &HeaderMap) -> Result<(), FillError> {
    let Some(token) = config.service_token.as_deref() else {
        return Ok(());
    };
    let expected = format!("Bearer {token}");
    match headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(value) if value == expected => Ok(()),
        _ => Err(FillError::Unauthorized),
    }
}

async fn read_template(path: &Path) -> Result<String, FillError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(FillError::TemplateUnavailable)
}
