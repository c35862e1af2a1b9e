//! HTTP interface.
//!
//! | Method | Path                  | Description |
//! |--------|-----------------------|-------------|
//! | POST   | `/api/irrf/calculate` | Compute the withholding tax for a JSON body |
//! | GET    | `/api/irrf/brackets`  | Read-only export of the bracket table |
//! | GET    | `/health`             | Liveness probe |
//!
//! Request body for `/api/irrf/calculate`:
//!
//! ```json
//! {
//!   "taxable_income": 5000.00,
//!   "official_pension_contribution": 750.00,
//!   "dependent_count": 2,
//!   "alimony": 0,
//!   "include_trace": true
//! }
//! ```
//!
//! `alimony` is optional and is also read from the key `"alimony "` (with a
//! trailing space) when the regular key is absent. Errors are returned as
//! `{"error": "<message>"}`.

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use irrf_core::{
    BracketRow, InputField, IrrfResult, IrrfWorksheet, RawIrrfInput, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

const ALIMONY_FALLBACK_KEY: &str = "alimony ";

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("include_trace must be a boolean")]
    InvalidTraceFlag,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::MalformedBody(_)
            | Self::NotAnObject
            | Self::InvalidTraceFlag => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self, "rejected calculation request");
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// A parsed calculation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationRequest {
    pub input: RawIrrfInput,
    pub include_trace: bool,
}

impl CalculationRequest {
    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// * [`ApiError::MalformedBody`] if the body is not JSON.
    /// * [`ApiError::NotAnObject`] if the body is JSON but not an object.
    /// * [`ApiError::Validation`] if a required field is missing or a field is
    ///   not a number.
    /// * [`ApiError::InvalidTraceFlag`] if `include_trace` is not a boolean.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)?;
        let object = value.as_object().ok_or(ApiError::NotAnObject)?;
        Self::from_object(object)
    }

    fn from_object(object: &Map<String, Value>) -> Result<Self, ApiError> {
        let taxable_income = required_number(object, InputField::TaxableIncome)?;
        let official_pension_contribution =
            required_number(object, InputField::OfficialPensionContribution)?;
        let dependent_count = required_number(object, InputField::DependentCount)?;

        let alimony_value = match object.get(InputField::Alimony.as_str()) {
            None | Some(Value::Null) => object.get(ALIMONY_FALLBACK_KEY),
            Some(value) => Some(value),
        };
        let alimony = match alimony_value {
            None | Some(Value::Null) => None,
            Some(value) => Some(number(value, InputField::Alimony)?),
        };

        let include_trace = match object.get("include_trace") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(ApiError::InvalidTraceFlag),
        };

        Ok(Self {
            input: RawIrrfInput {
                taxable_income,
                official_pension_contribution,
                dependent_count,
                alimony,
            },
            include_trace,
        })
    }
}

fn required_number(
    object: &Map<String, Value>,
    field: InputField,
) -> Result<f64, ValidationError> {
    match object.get(field.as_str()) {
        None | Some(Value::Null) => Err(ValidationError::Missing(field)),
        Some(value) => number(value, field),
    }
}

fn number(
    value: &Value,
    field: InputField,
) -> Result<f64, ValidationError> {
    value.as_f64().ok_or(ValidationError::NotANumber(field))
}

/// Shared, read-only state of the HTTP handlers.
#[derive(Debug, Clone, Copy)]
pub struct AppState {
    pub worksheet: IrrfWorksheet<'static>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            worksheet: IrrfWorksheet::default(),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/irrf/calculate", post(calculate_handler))
        .route("/api/irrf/brackets", get(brackets_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;
    let local = listener
        .local_addr()
        .context("cannot read listener address")?;

    info!("IRRF server listening on {local}");
    info!("  Calculate: POST http://{local}/api/irrf/calculate");
    info!("  Brackets:  GET  http://{local}/api/irrf/brackets");
    info!("  Health:    GET  http://{local}/health");

    axum::serve(listener, router(AppState::default()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Runs one calculation for an already parsed request.
pub fn calculate(
    worksheet: &IrrfWorksheet<'_>,
    request: &CalculationRequest,
) -> Result<IrrfResult, ApiError> {
    let input = request.input.validate()?;
    let result = if request.include_trace {
        worksheet.calculate_with_trace(&input)
    } else {
        worksheet.calculate(&input)
    };
    Ok(result)
}

async fn calculate_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IrrfResult>, ApiError> {
    let request = CalculationRequest::from_body(&body)?;
    let result = calculate(&state.worksheet, &request)?;

    info!(
        tax_before_reduction = %result.tax_before_reduction,
        final_tax = ?result.reduction.final_tax(),
        trace = request.include_trace,
        "calculated withholding"
    );
    Ok(Json(result))
}

async fn brackets_handler(State(state): State<AppState>) -> Json<Vec<BracketRow>> {
    debug!("bracket table requested");
    Json(state.worksheet.table().rows())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "irrf-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(body: &str) -> Result<CalculationRequest, ApiError> {
        CalculationRequest::from_body(body.as_bytes())
    }

    #[test]
    fn parses_full_request() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 750.5,
                "dependent_count": 2, "alimony": 10, "include_trace": true}"#,
        )
        .unwrap();

        assert_eq!(
            request,
            CalculationRequest {
                input: RawIrrfInput {
                    taxable_income: 5000.0,
                    official_pension_contribution: 750.5,
                    dependent_count: 2.0,
                    alimony: Some(10.0),
                },
                include_trace: true,
            }
        );
    }

    #[test]
    fn alimony_defaults_to_none() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0, "dependent_count": 0}"#,
        )
        .unwrap();

        assert_eq!(request.input.alimony, None);
        assert!(!request.include_trace);
    }

    #[test]
    fn alimony_falls_back_to_key_with_trailing_space() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0,
                "dependent_count": 0, "alimony ": 300}"#,
        )
        .unwrap();

        assert_eq!(request.input.alimony, Some(300.0));
    }

    #[test]
    fn regular_alimony_key_wins_over_fallback() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0,
                "dependent_count": 0, "alimony": 100, "alimony ": 300}"#,
        )
        .unwrap();

        assert_eq!(request.input.alimony, Some(100.0));
    }

    #[test]
    fn null_alimony_key_defers_to_fallback() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0,
                "dependent_count": 0, "alimony": null, "alimony ": 300}"#,
        )
        .unwrap();

        assert_eq!(request.input.alimony, Some(300.0));
    }

    #[test]
    fn null_alimony_in_both_keys_is_absent() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0,
                "dependent_count": 0, "alimony": null, "alimony ": null}"#,
        )
        .unwrap();

        assert_eq!(request.input.alimony, None);
    }

    #[test]
    fn missing_income_is_reported() {
        let err = parse(r#"{"official_pension_contribution": 0, "dependent_count": 0}"#)
            .unwrap_err();

        assert_eq!(err.to_string(), "taxable_income is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn string_amount_is_not_a_number() {
        let err = parse(
            r#"{"taxable_income": "5000", "official_pension_contribution": 0, "dependent_count": 0}"#,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "taxable_income must be a number");
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse("{not json").unwrap_err();

        assert!(matches!(err, ApiError::MalformedBody(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn array_body_is_rejected() {
        let err = parse("[1, 2, 3]").unwrap_err();

        assert!(matches!(err, ApiError::NotAnObject));
    }

    #[test]
    fn non_boolean_trace_flag_is_rejected() {
        let err = parse(
            r#"{"taxable_income": 1, "official_pension_contribution": 0,
                "dependent_count": 0, "include_trace": "yes"}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ApiError::InvalidTraceFlag));
    }

    #[test]
    fn calculate_rejects_fractional_dependents() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 0, "dependent_count": 2.5}"#,
        )
        .unwrap();

        let err = calculate(&IrrfWorksheet::default(), &request).unwrap_err();

        assert_eq!(err.to_string(), "dependent_count must be a whole number");
    }

    #[test]
    fn calculate_attaches_trace_on_request() {
        let request = parse(
            r#"{"taxable_income": 5000, "official_pension_contribution": 750,
                "dependent_count": 2, "include_trace": true}"#,
        )
        .unwrap();

        let result = calculate(&IrrfWorksheet::default(), &request).unwrap();

        assert_eq!(result.trace.map(|t| t.len()), Some(9));
    }
}
