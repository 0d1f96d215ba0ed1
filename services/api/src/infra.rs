use foundation_match::config::AppConfig;
use foundation_match::error::AppError;
use foundation_match::workflows::matching::{
    ChatCompletionsClient, FoundationMatchingService, InMemoryCorpus, ProjectDescription,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type MatchingService = FoundationMatchingService<InMemoryCorpus, ChatCompletionsClient>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the corpus snapshot and construct the evaluator client from configuration.
pub(crate) fn build_matching_service(config: &AppConfig) -> Result<MatchingService, AppError> {
    let corpus = InMemoryCorpus::from_json_path(&config.corpus.path)?;
    let evaluator = ChatCompletionsClient::from_config(&config.evaluator)?;
    info!(
        model = evaluator.model(),
        foundations = corpus.len(),
        "matching service assembled"
    );
    Ok(FoundationMatchingService::new(
        Arc::new(corpus),
        Arc::new(evaluator),
    ))
}

pub(crate) fn read_project(path: &Path) -> Result<ProjectDescription, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(AppError::Input)
}
