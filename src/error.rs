use std::path::PathBuf;

/// Errors raised while constructing a coordinator or loading its configuration.
///
/// Seek requests themselves never fail; see [`crate::coordinator`].
#[derive(Debug, thiserror::Error)]
pub enum SeekError {
    #[error("no media surface to attach the seek coordinator to")]
    MissingSurface,

    #[error("failed to read seek config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seek config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid seek config: {0}")]
    InvalidConfig(String),

    #[error("video pipeline has no message bus")]
    NoBus,
}
