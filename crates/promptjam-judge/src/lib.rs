//! Judging collaborator for PromptJam.
//!
//! Rooms don't rank submissions themselves; an external generative-AI
//! judge does. This crate defines the [`Judge`] trait (the seam the room
//! core consumes), the production [`GeminiJudge`] HTTP adapter, and the
//! fail-soft wrappers [`rank_or_fallback`] / [`explain_or_fallback`] that
//! guarantee gameplay never stalls on judge trouble.
//!
//! The failure contract matters more than the ranking quality: a judge
//! call gets exactly one attempt, and any error (network, bad status,
//! malformed output) degrades to a pseudo-random ranking with placeholder
//! rationales. Judge errors never reach clients.

mod error;
mod fallback;
mod gemini;

pub use error::JudgeError;
pub use fallback::{
    explain_or_fallback, fallback_ranking, fallback_solution,
    rank_or_fallback, FALLBACK_REASON,
};
pub use gemini::{GeminiConfig, GeminiJudge};

use promptjam_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// One submission as handed to the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub id: PlayerId,
    pub name: String,
    pub text: String,
}

/// One row of the judge's verdict, best first.
///
/// Carries the judge's own copy of the player name so a result stays
/// renderable even if the player has since left the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: PlayerId,
    pub name: String,
    pub reason: String,
}

/// Ranks submissions and explains winners.
///
/// Both methods are fallible by nature (external service, structured
/// output from a language model); callers are expected to go through the
/// `*_or_fallback` wrappers rather than handling errors themselves.
pub trait Judge: Send + Sync + 'static {
    /// Orders the given submissions best-to-worst for the problem.
    ///
    /// # Errors
    /// Any transport or parse failure. A well-formed but empty ranking
    /// is also an error: a round with submissions must produce a
    /// usable order.
    fn rank(
        &self,
        problem: &str,
        entries: &[SubmissionEntry],
    ) -> impl std::future::Future<Output = Result<Vec<RankedEntry>, JudgeError>> + Send;

    /// Produces a short reference solution given the winning submission.
    ///
    /// # Errors
    /// Any transport or parse failure.
    fn explain(
        &self,
        problem: &str,
        winning_text: &str,
    ) -> impl std::future::Future<Output = Result<String, JudgeError>> + Send;
}
