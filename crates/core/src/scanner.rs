use crate::object::CandidateSet;
use async_trait::async_trait;

/// Source of candidate objects for a player-guesses game (camera sweep,
/// labelling and so on happen behind this).
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self) -> anyhow::Result<CandidateSet>;
}
