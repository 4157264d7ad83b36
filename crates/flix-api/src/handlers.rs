//! API Handlers
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use flix_core::FlixError;
use flix_generator::GeneratorError;
use flix_schema::{parse_template, verify_id, InteractionTemplate, SchemaError, TemplateView};

use crate::AppState;

/// Error body: `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<FlixError> for ApiError {
    fn from(err: FlixError) -> Self {
        let status = match &err {
            FlixError::FetchFailure { .. } => StatusCode::BAD_GATEWAY,
            FlixError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err)
    }
}

impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::Build(e) => e.into(),
            GeneratorError::Schema(e) => e.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other),
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err)
    }
}

fn template_from(value: &Value) -> Result<InteractionTemplate, ApiError> {
    Ok(parse_template(&serde_json::to_vec(value)?)?)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub code: String,
    #[serde(default)]
    pub prefill: Option<Value>,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let prefill = req.prefill.as_ref().map(template_from).transpose()?;
    let ctx = state.builder.config().context();
    let format = state.builder.config().format.to_string();

    let timer = state.metrics.build_seconds.with_label_values(&[format.as_str()]).start_timer();
    let result = state.builder.build(&ctx, &req.code, prefill.as_ref()).await;
    timer.observe_duration();

    let outcome = if result.is_ok() { "ok" } else { "error" };
    state.metrics.builds.with_label_values(&[outcome]).inc();

    let template = result?;
    Ok(Json(serde_json::to_value(&template)?))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub template: Value,
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let template = template_from(&req.template)?;
    let id_valid = verify_id(&template)?;

    let calculator = state.builder.network_pins();
    let mut all_valid = id_valid;
    let mut pins = Vec::new();
    for pin in template.network_pins() {
        let valid = calculator.verify_network_pin(&template, &pin)?;
        all_valid &= valid;
        pins.push(json!({ "network": pin.network, "valid": valid }));
    }

    let result = if all_valid { "valid" } else { "invalid" };
    state.metrics.verifications.with_label_values(&[result]).inc();
    debug!(id = %template.id(), result, "template verified");

    Ok(Json(json!({
        "id": template.id(),
        "id_valid": id_valid,
        "network_pins": pins,
        "valid": all_valid,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SourceRequest {
    pub template: Value,
    pub network: String,
}

/// Executable source of a stored template on one network.
pub async fn source_for_network(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SourceRequest>,
) -> Result<Json<Value>, ApiError> {
    let template = template_from(&req.template)?;
    let calculator = state.builder.network_pins();
    let source = calculator.resolve_source_for_network(&template, &req.network)?;
    let pin = calculator.compute_network_pin(&template, &req.network)?;

    Ok(Json(json!({
        "network": req.network,
        "source": source,
        "pin_self": pin.pin_self,
    })))
}

pub async fn list_contracts(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "contracts": state.builder.registry().addresses() })))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}
