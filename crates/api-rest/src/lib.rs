//! # API REST
//!
//! REST facade over the HMS FHIR Condition mapper.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! The service is stateless: it builds, validates and classifies the Conditions it is sent and
//! never stores them.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod models;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hms_fhir::{group_by_category, Condition, HmsDiagnosis};

pub use config::{ConfigError, ServiceConfig};
use models::{
    ConditionKind, ConditionListReq, ConditionRes, CreateConditionReq, HealthRes,
    ReferenceConditionRes, SearchReq, SummaryRes, ValidationRes,
};

type ApiError = (StatusCode, String);

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(cfg: ServiceConfig) -> Self {
        Self { cfg: Arc::new(cfg) }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.cfg
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_condition,
        condition_from_diagnosis,
        validate,
        summary,
        groups,
        search,
        reference_condition,
    ),
    components(schemas(
        HealthRes,
        ConditionKind,
        CreateConditionReq,
        ConditionRes,
        ValidationRes,
        ConditionListReq,
        SummaryRes,
        SearchReq,
        ReferenceConditionRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with all routes, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/conditions", post(create_condition))
        .route("/conditions/from-diagnosis", post(condition_from_diagnosis))
        .route("/conditions/validate", post(validate))
        .route("/conditions/summary", post(summary))
        .route("/conditions/groups", post(groups))
        .route("/conditions/search", post(search))
        .route("/reference/conditions/:code", get(reference_condition))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint used by monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "HMS FHIR API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/conditions",
    request_body = CreateConditionReq,
    responses(
        (status = 200, description = "Condition built and validated", body = ConditionRes),
        (status = 400, description = "Unknown status, verification or severity code")
    )
)]
/// Build a Condition with the requested constructor and validate it.
///
/// The resource is returned even when validation fails so the caller can show every problem.
#[axum::debug_handler]
async fn create_condition(
    State(state): State<AppState>,
    Json(req): Json<CreateConditionReq>,
) -> Result<Json<ConditionRes>, ApiError> {
    let kind = req.kind;
    let condition = req.into_condition().map_err(|e| {
        tracing::warn!("Create condition rejected: {e}");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    tracing::debug!(?kind, "built condition");
    Ok(Json(finish(&state, condition)))
}

#[utoipa::path(
    post,
    path = "/conditions/from-diagnosis",
    request_body(content = String, description = "HMS diagnosis record", content_type = "application/json"),
    responses(
        (status = 200, description = "Condition mapped and validated", body = ConditionRes),
        (status = 400, description = "Body is not a diagnosis record")
    )
)]
/// Map an internal HMS diagnosis record into a Condition.
#[axum::debug_handler]
async fn condition_from_diagnosis(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ConditionRes>, ApiError> {
    let diagnosis = HmsDiagnosis::parse_json(&body).map_err(|e| {
        tracing::warn!("Invalid diagnosis record: {e}");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    Ok(Json(finish(&state, Condition::from_hms_diagnosis(&diagnosis))))
}

#[utoipa::path(
    post,
    path = "/conditions/validate",
    request_body(content = String, description = "FHIR Condition resource", content_type = "application/json"),
    responses(
        (status = 200, description = "Validation result, including failures", body = ValidationRes),
        (status = 400, description = "Body is not JSON of the Condition shape")
    )
)]
/// Validate a Condition resource.
#[axum::debug_handler]
async fn validate(
    State(_state): State<AppState>,
    body: String,
) -> Result<Json<ValidationRes>, ApiError> {
    let condition = Condition::parse_json(&body).map_err(|e| {
        tracing::warn!("Unparseable condition: {e}");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    Ok(Json(condition.validate().into()))
}

#[utoipa::path(
    post,
    path = "/conditions/summary",
    request_body = ConditionListReq,
    responses(
        (status = 200, description = "Display rows and bucket counts", body = SummaryRes)
    )
)]
/// Flatten conditions into display rows and count them per bucket.
#[axum::debug_handler]
async fn summary(
    State(_state): State<AppState>,
    Json(req): Json<ConditionListReq>,
) -> Json<SummaryRes> {
    let rows = req
        .conditions
        .iter()
        .map(Condition::format_for_display)
        .collect();
    let groups: BTreeMap<String, usize> = group_by_category(&req.conditions)
        .counts()
        .into_iter()
        .map(|(bucket, count)| (bucket.label().to_owned(), count))
        .collect();

    Json(SummaryRes { rows, groups })
}

#[utoipa::path(
    post,
    path = "/conditions/groups",
    request_body = ConditionListReq,
    responses(
        (status = 200, description = "Conditions keyed by display bucket"),
        (status = 500, description = "Internal server error")
    )
)]
/// Partition conditions into display buckets.
#[axum::debug_handler]
async fn groups(
    State(_state): State<AppState>,
    Json(req): Json<ConditionListReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    serde_json::to_value(group_by_category(&req.conditions))
        .map(Json)
        .map_err(|e| {
            tracing::error!("Group conditions error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_owned())
        })
}

#[utoipa::path(
    post,
    path = "/conditions/search",
    request_body = SearchReq,
    responses(
        (status = 200, description = "Matching conditions")
    )
)]
/// Filter conditions by text, severity, activity and chronicity.
#[axum::debug_handler]
async fn search(State(_state): State<AppState>, Json(req): Json<SearchReq>) -> Json<Vec<Condition>> {
    let filter = req.filter();
    Json(filter.apply(&req.conditions).into_iter().cloned().collect())
}

#[utoipa::path(
    get,
    path = "/reference/conditions/{code}",
    params(("code" = String, Path, description = "SNOMED CT code")),
    responses(
        (status = 200, description = "Reference table entry", body = ReferenceConditionRes),
        (status = 404, description = "Code not in the reference table")
    )
)]
/// Look up a SNOMED CT code in the reference table.
#[axum::debug_handler]
async fn reference_condition(
    State(_state): State<AppState>,
    AxumPath(code): AxumPath<String>,
) -> Result<Json<ReferenceConditionRes>, ApiError> {
    hms_fhir::reference::find_by_code(&code)
        .map(|entry| Json(entry.into()))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("code '{code}' is not in the reference table"),
            )
        })
}

/// Assign an id when configured, then validate.
fn finish(state: &AppState, condition: Condition) -> ConditionRes {
    let condition = if state.config().assign_resource_ids() {
        condition.with_id(uuid::Uuid::new_v4().to_string())
    } else {
        condition
    };

    let validation = condition.validate();
    if !validation.valid {
        tracing::info!(errors = ?validation.errors, "built condition fails validation");
    }

    ConditionRes {
        condition,
        validation: validation.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(assign_ids: bool) -> Router {
        let cfg = ServiceConfig::new("127.0.0.1:0".parse().unwrap(), assign_ids);
        router(AppState::new(cfg))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        });
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let (status, body) = send(app(true), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn creates_chronic_condition_with_id() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions",
            Some(json!({
                "kind": "chronic",
                "patientId": "123",
                "conditionDisplay": "Diabetes mellitus type 2",
                "notes": "stable"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let condition = &body["condition"];
        assert_eq!(condition["resourceType"], "Condition");
        assert!(condition["id"].is_string());
        assert_eq!(condition["category"][0]["coding"][0]["code"], "problem-list-item");
        assert_eq!(condition["verificationStatus"]["coding"][0]["code"], "confirmed");
        assert_eq!(condition["note"][0]["text"], "stable");
        assert_eq!(body["validation"]["valid"], true);
    }

    #[tokio::test]
    async fn created_conditions_have_no_id_when_disabled() {
        let (_, body) = send(
            app(false),
            "POST",
            "/conditions",
            Some(json!({"patientId": "1", "conditionDisplay": "Asthma"})),
        )
        .await;
        assert!(body["condition"].get("id").is_none());
    }

    #[tokio::test]
    async fn rejects_unknown_clinical_status() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions",
            Some(json!({"patientId": "1", "conditionDisplay": "Asthma", "clinicalStatus": "bogus"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("unknown clinical status"));
    }

    #[tokio::test]
    async fn unknown_verification_status_is_rejected_but_validate_reports_it() {
        let (status, _) = send(
            app(true),
            "POST",
            "/conditions",
            Some(json!({"patientId": "1", "conditionDisplay": "Asthma", "verificationStatus": "maybe"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/validate",
            Some(json!({
                "resourceType": "Condition",
                "subject": {"reference": "Patient/1"},
                "code": {"text": "Asthma"},
                "verificationStatus": {"coding": [{"code": "maybe"}]}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert!(body["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("Invalid verificationStatus"));
    }

    #[tokio::test]
    async fn missing_patient_is_reported_by_validation_not_rejected() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/from-diagnosis",
            Some(json!({"diagnosis": "Migraine", "status": "active"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["validation"]["valid"], false);
        assert_eq!(body["validation"]["errors"][0], "subject is required");
    }

    #[tokio::test]
    async fn validate_returns_every_error() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/validate",
            Some(json!({
                "resourceType": "Observation",
                "clinicalStatus": {"coding": [{"code": "bogus"}]}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn validate_rejects_malformed_body() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/validate",
            Some(json!({"resourceType": "Condition", "note": "not a list"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().contains("note"));
    }

    fn sample_conditions() -> Value {
        let active = hms_fhir::Condition::basic(hms_fhir::ConditionInput::new("1", "Pneumonia"));
        let chronic = hms_fhir::Condition::chronic(
            hms_fhir::ConditionInput::new("1", "Asthma"),
            None,
        );
        let resolved = hms_fhir::Condition::resolved(
            hms_fhir::ConditionInput::new("1", "Sprain"),
            Some("2024-01-11".into()),
            None,
        );
        json!([active, chronic, resolved])
    }

    #[tokio::test]
    async fn summary_counts_buckets() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/summary",
            Some(json!({"conditions": sample_conditions()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        assert_eq!(body["rows"][1]["isChronic"], true);
        assert_eq!(body["groups"]["Active Problems"], 1);
        assert_eq!(body["groups"]["Chronic Conditions"], 1);
        assert_eq!(body["groups"]["Resolved Conditions"], 1);
        assert_eq!(body["groups"]["Other"], 0);
    }

    #[tokio::test]
    async fn groups_are_keyed_by_label() {
        let (_, body) = send(
            app(true),
            "POST",
            "/conditions/groups",
            Some(json!({"conditions": sample_conditions()})),
        )
        .await;
        assert_eq!(
            body["Resolved Conditions"][0]["code"]["text"],
            "Sprain"
        );
    }

    #[tokio::test]
    async fn search_applies_filter() {
        let (status, body) = send(
            app(true),
            "POST",
            "/conditions/search",
            Some(json!({"conditions": sample_conditions(), "text": "A", "activeOnly": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["code"]["text"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["Pneumonia", "Asthma"]);
    }

    #[tokio::test]
    async fn reference_lookup() {
        let (status, body) = send(app(true), "GET", "/reference/conditions/22298006", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display"], "Myocardial infarction");
        assert_eq!(body["severity"], "severe");
        assert_eq!(body["emergency"], true);

        let (status, _) = send(app(true), "GET", "/reference/conditions/233604007", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app(true), "GET", "/reference/conditions/0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
