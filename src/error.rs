pub type ReelplanResult<T> = Result<T, ReelplanError>;

/// Error taxonomy for the crate.
///
/// Errors are stored inside settled promises and re-raised on demand, so the
/// enum is `Clone` and carries only owned strings.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ReelplanError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("asset load error: {0}")]
    AssetLoad(String),

    #[error("result is not ready")]
    NotReady,

    #[error("promise is already settled")]
    DuplicateResolution,
}

impl ReelplanError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }
}
