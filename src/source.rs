// 🔌 StatSource - Contract for search, per-season stats and news
// The engine only consumes this trait; transports live behind it

use crate::record::{Entity, NewsItem, Period, PlayerId, StatRecord};
use std::future::Future;

/// Queries shorter than this are never sent to the source
pub const MIN_SEARCH_LEN: usize = 3;

/// Upper bound on search candidates returned
pub const SEARCH_LIMIT: usize = 20;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure or source down
    Unavailable(String),
    /// Source has no such player
    NotFound(PlayerId),
    /// Response could not be read at all
    Malformed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "stat source unavailable: {}", msg),
            SourceError::NotFound(id) => write!(f, "player {} not found", id),
            SourceError::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

pub type SourceResult<T> = Result<T, SourceError>;

// ============================================================================
// STAT SOURCE
// ============================================================================

/// StatSource - where players, stats and news come from
///
/// When `period` is `Unspecified` the source picks its default season and
/// must report which one it picked in `StatRecord::period`, together with
/// `available_periods`.
pub trait StatSource: Send + Sync + 'static {
    fn search(&self, name_prefix: &str) -> impl Future<Output = SourceResult<Vec<Entity>>> + Send;

    fn get_stats(
        &self,
        id: PlayerId,
        period: &Period,
    ) -> impl Future<Output = SourceResult<StatRecord>> + Send;

    fn get_news(&self, entity_name: &str) -> impl Future<Output = SourceResult<Vec<NewsItem>>> + Send;
}

/// True when a query is long enough to send
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_SEARCH_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("Le"));
        assert!(!is_searchable("  Le  "));
        assert!(is_searchable("Leb"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SourceError::NotFound(PlayerId(7)).to_string(),
            "player 7 not found"
        );
        assert!(SourceError::Unavailable("timeout".into())
            .to_string()
            .contains("timeout"));
    }
}
