use std::collections::HashSet;

use tracing::{info, warn};

use super::corpus::{CorpusError, FoundationCorpus};
use super::domain::{Candidate, FoundationId, ProjectDescription};

/// Order the filtered foundations by textual relevance to the project and keep the top
/// `working_set` as candidates.
///
/// The search is scoped to `ids`; anything the store returns outside that scope is
/// dropped so relevance can never reintroduce a filtered-out foundation.
pub async fn rank_candidates<C>(
    corpus: &C,
    ids: &[FoundationId],
    project: &ProjectDescription,
    working_set: usize,
) -> Result<Vec<Candidate>, CorpusError>
where
    C: FoundationCorpus + ?Sized,
{
    if ids.is_empty() || working_set == 0 {
        return Ok(Vec::new());
    }

    let query = project.search_text();
    let matches = corpus.search_text(ids, &query, working_set).await?;

    let scope: HashSet<&FoundationId> = ids.iter().collect();
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(matches.len().min(working_set));
    for text_match in matches {
        if !scope.contains(&text_match.record.id) {
            warn!(
                foundation_id = %text_match.record.id,
                "search returned a foundation outside the filtered scope"
            );
            continue;
        }
        if !seen.insert(text_match.record.id.clone()) {
            continue;
        }
        if candidates.len() == working_set {
            break;
        }
        candidates.push(Candidate {
            rank: candidates.len() + 1,
            relevance: text_match.relevance,
            record: text_match.record,
        });
    }

    info!(
        scope = ids.len(),
        candidates = candidates.len(),
        working_set,
        "relevance ranking finished"
    );
    Ok(candidates)
}
