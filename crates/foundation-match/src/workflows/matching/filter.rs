use std::collections::BTreeSet;

use tracing::info;

use super::corpus::{CorpusError, FoundationCorpus};
use super::domain::{CharitablePurpose, FoundationId};

/// Identifiers of every foundation sharing at least one charitable purpose with the project.
///
/// Callers guarantee `purposes` is non-empty; an empty result is a normal outcome.
pub async fn filter_by_purpose<C>(
    corpus: &C,
    purposes: &BTreeSet<CharitablePurpose>,
) -> Result<Vec<FoundationId>, CorpusError>
where
    C: FoundationCorpus + ?Sized,
{
    let ids = corpus.ids_with_any_purpose(purposes).await?;
    info!(
        purposes = %purposes.iter().map(|p| p.code()).collect::<Vec<_>>().join(","),
        matches = ids.len(),
        "attribute filter finished"
    );
    Ok(ids)
}
