use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use foundation_match::config::MatchingConfig;
use foundation_match::workflows::matching::{
    matching_router, FoundationCorpus, FoundationMatchingService, JudgmentService,
};
use serde_json::json;

pub(crate) fn with_matching_routes<C, S>(
    service: FoundationMatchingService<C, S>,
    limits: MatchingConfig,
) -> axum::Router
where
    C: FoundationCorpus + ?Sized + 'static,
    S: JudgmentService + ?Sized + 'static,
{
    matching_router(service, limits)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use foundation_match::workflows::matching::{
        EvaluatorError, InMemoryCorpus, ScoringPrompt, ScoringResponse, SCORE_ROUTE,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct OfflineEvaluator;

    #[async_trait]
    impl JudgmentService for OfflineEvaluator {
        async fn judge(&self, _prompt: &ScoringPrompt) -> Result<ScoringResponse, EvaluatorError> {
            Err(EvaluatorError::Unavailable("offline".to_string()))
        }
    }

    fn app(ready: bool) -> axum::Router {
        let corpus = InMemoryCorpus::from_json_str(
            r#"[{"_id":"f-1","name":"Stiftung Lesen","long_description":"Leseförderung für Kinder","gemeinnuetzige_zwecke":["EDUCATION_AND_VOCATIONAL_TRAINING"]}]"#,
        )
        .expect("corpus");
        let service = FoundationMatchingService::new(Arc::new(corpus), Arc::new(OfflineEvaluator));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_matching_routes(
            service,
            MatchingConfig {
                default_limit: 5,
                max_limit: 20,
            },
        )
        .layer(Extension(state))
    }

    async fn status_of(app: axum::Router, request: Request<Body>) -> StatusCode {
        app.oneshot(request).await.expect("response").status()
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let request = Request::get("/health").body(Body::empty()).expect("request");
        assert_eq!(status_of(app(false), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let request = || Request::get("/ready").body(Body::empty()).expect("request");
        assert_eq!(
            status_of(app(false), request()).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), request()).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let request = Request::get("/metrics").body(Body::empty()).expect("request");
        let response = app(true).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn scoring_route_is_mounted() {
        let body = json!({
            "project": {
                "name": "Lesepaten",
                "description": "Ehrenamtliche lesen mit Kindern",
                "target_group": "Kinder",
                "charitable_purpose": ["EDUCATION_AND_VOCATIONAL_TRAINING"],
            }
        });
        let request = Request::post(SCORE_ROUTE)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");

        assert_eq!(status_of(app(true), request).await, StatusCode::BAD_GATEWAY);
    }
}
