use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::corpus::FoundationCorpus;
use super::domain::{FoundationScore, ProjectDescription};
use super::evaluator::JudgmentService;
use super::service::{FoundationMatchingService, MatchingError};
use crate::config::MatchingConfig;

pub const SCORE_ROUTE: &str = "/api/v1/foundations/score";

/// Body of a scoring request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRequest {
    pub project: ProjectDescription,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Envelope returned by the scoring endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub count: usize,
    pub foundations: Vec<FoundationScore>,
    pub query_summary: String,
    pub generated_at: DateTime<Utc>,
}

impl ScoreResponse {
    pub fn new(project: &ProjectDescription, foundations: Vec<FoundationScore>) -> Self {
        Self {
            success: true,
            count: foundations.len(),
            query_summary: format!(
                "{} passende Stiftungen für \"{}\" ({})",
                foundations.len(),
                project.name,
                project.purpose_codes()
            ),
            foundations,
            generated_at: Utc::now(),
        }
    }
}

struct ScoreEndpoint<C: ?Sized, S: ?Sized> {
    service: FoundationMatchingService<C, S>,
    limits: MatchingConfig,
}

/// Router builder exposing the foundation scoring endpoint.
pub fn matching_router<C, S>(
    service: FoundationMatchingService<C, S>,
    limits: MatchingConfig,
) -> Router
where
    C: FoundationCorpus + ?Sized + 'static,
    S: JudgmentService + ?Sized + 'static,
{
    let endpoint = Arc::new(ScoreEndpoint { service, limits });
    Router::new()
        .route(SCORE_ROUTE, post(score_handler::<C, S>))
        .with_state(endpoint)
}

async fn score_handler<C, S>(
    State(endpoint): State<Arc<ScoreEndpoint<C, S>>>,
    payload: Result<axum::Json<ScoreRequest>, JsonRejection>,
) -> Response
where
    C: FoundationCorpus + ?Sized + 'static,
    S: JudgmentService + ?Sized + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    let limit = request.limit.unwrap_or(endpoint.limits.default_limit);
    if limit == 0 || limit > endpoint.limits.max_limit {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "limit must be between 1 and {}, got {limit}",
                endpoint.limits.max_limit
            ),
        );
    }

    match endpoint.service.score(&request.project, limit).await {
        Ok(foundations) => {
            let body = ScoreResponse::new(&request.project, foundations);
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(err) => error_response(status_for(&err), err.to_string()),
    }
}

pub(crate) fn status_for(err: &MatchingError) -> StatusCode {
    match err {
        MatchingError::EmptyCharitablePurpose => StatusCode::UNPROCESSABLE_ENTITY,
        MatchingError::Corpus { .. } => StatusCode::SERVICE_UNAVAILABLE,
        MatchingError::Evaluator(_) | MatchingError::MissingJudgment { .. } => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "success": false,
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
