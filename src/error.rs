use miette::Diagnostic;
use thiserror::Error;

/// Error taxonomy for the cache.
///
/// All payloads are plain strings so the type stays `Clone`; coalesced
/// downloads deliver the same error value to every waiter.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum DdragonError {
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid locale: {0}")]
    InvalidLocale(String),

    #[error("unknown realm: {0}")]
    InvalidRealm(String),

    #[error("invalid dataset type: {0}")]
    InvalidDataset(String),

    #[error("CDN request failed: {0}")]
    CdnHttp(String),

    #[error("CDN returned status {status}: {message}")]
    CdnStatus { status: u16, message: String },

    #[error("failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    #[error("dataset not found locally: {0}")]
    NotFoundLocally(String),

    #[error("no downloaded version available for locale: {0}")]
    FallbackExhausted(String),

    #[error("no downloaded versions available")]
    NoLocalVersions,

    #[error("failed to read config file at {0}")]
    ConfigRead(String),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
