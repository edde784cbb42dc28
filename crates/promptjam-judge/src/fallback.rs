//! Fail-soft degradation for judge failures.
//!
//! A round that has submissions must end with a usable ranking even when
//! the judge does not cooperate. The wrappers here give every judge call
//! exactly one attempt and degrade locally on failure: a shuffled order
//! with placeholder rationales for `rank`, a canned string for `explain`.
//! No retries, no backoff; round latency stays bounded.

use rand::seq::SliceRandom;
use tracing::warn;

use crate::{Judge, RankedEntry, SubmissionEntry};

/// Rationale attached to every entry of a shuffled fallback ranking.
pub const FALLBACK_REASON: &str = "The judge was unavailable for this round.";

/// Orders `entries` pseudo-randomly with a placeholder rationale per row.
pub fn fallback_ranking(entries: &[SubmissionEntry]) -> Vec<RankedEntry> {
    let mut order: Vec<&SubmissionEntry> = entries.iter().collect();
    order.shuffle(&mut rand::rng());
    order
        .into_iter()
        .map(|entry| RankedEntry {
            id: entry.id,
            name: entry.name.clone(),
            reason: FALLBACK_REASON.to_owned(),
        })
        .collect()
}

/// Reference solution shown when `explain` fails.
pub fn fallback_solution(winning_text: &str) -> String {
    format!("The judge was unavailable. Winning submission: \"{winning_text}\"")
}

/// Calls [`Judge::rank`] once, degrading to [`fallback_ranking`] on any
/// error. A well-formed empty order counts as a failure: with submissions
/// in hand there is always something to rank.
pub async fn rank_or_fallback<J: Judge>(
    judge: &J,
    problem: &str,
    entries: &[SubmissionEntry],
) -> Vec<RankedEntry> {
    match judge.rank(problem, entries).await {
        Ok(ranking) if !ranking.is_empty() => ranking,
        Ok(_) => {
            warn!("judge returned an empty ranking, shuffling instead");
            fallback_ranking(entries)
        }
        Err(error) => {
            warn!(%error, "judge ranking failed, shuffling instead");
            fallback_ranking(entries)
        }
    }
}

/// Calls [`Judge::explain`] once, degrading to [`fallback_solution`].
pub async fn explain_or_fallback<J: Judge>(
    judge: &J,
    problem: &str,
    winning_text: &str,
) -> String {
    match judge.explain(problem, winning_text).await {
        Ok(solution) => solution,
        Err(error) => {
            warn!(%error, "judge explanation failed, using placeholder");
            fallback_solution(winning_text)
        }
    }
}
