use crate::infra::{build_matching_service, read_project};
use clap::Args;
use foundation_match::config::AppConfig;
use foundation_match::error::AppError;
use foundation_match::telemetry;
use foundation_match::workflows::matching::ScoreResponse;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file containing the project description
    #[arg(long)]
    pub(crate) project: PathBuf,
    /// Number of foundations to return (defaults to MATCH_DEFAULT_LIMIT)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Override the configured corpus snapshot
    #[arg(long)]
    pub(crate) corpus: Option<PathBuf>,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        project,
        limit,
        corpus,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(path) = corpus {
        config.corpus.path = path;
    }
    telemetry::init_stderr(&config.telemetry)?;

    let project = read_project(&project)?;
    let limit = limit.unwrap_or(config.matching.default_limit);
    let service = build_matching_service(&config)?;

    let foundations = service.score(&project, limit).await?;
    let response = ScoreResponse::new(&project, foundations);
    println!("{}", render(&response)?);
    Ok(())
}

fn render(response: &ScoreResponse) -> Result<String, AppError> {
    serde_json::to_string_pretty(response).map_err(AppError::Output)
}
