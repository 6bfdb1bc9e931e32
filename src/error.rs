use thiserror::Error;

/// Failures at the data boundary. Scoring itself never fails; missing data
/// degrades to neutral defaults instead.
#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid lexicon: {}", .0.join("; "))]
    Lexicon(Vec<String>),
}
