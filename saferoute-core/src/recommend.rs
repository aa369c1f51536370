//! Optional external re-ranking collaborator.

use async_trait::async_trait;

use crate::ScoredCandidate;

/// An external recommendation collaborator.
///
/// Given the ranked alternatives for a leg, it may return a preferred
/// candidate identifier. The optimizer records the suggestion on the leg
/// result without altering its own selection; when no collaborator is
/// configured the recorded id stays `None`.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Suggest a candidate id from `ranked` for the given leg, or `None`.
    async fn recommend(&self, leg_index: usize, ranked: &[ScoredCandidate]) -> Option<String>;
}
