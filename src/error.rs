//! Error types for the advisory engine and the forecast fetch layer.

use serde::Serialize;
use thiserror::Error;

/// Failures raised by the pure engine.
///
/// Missing forecast days are not errors; the normalizer substitutes
/// fallback values for them instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The provider payload has no usable `current` object.
    #[error("malformed forecast payload: {0}")]
    MalformedInput(String),

    /// The message bank has no variants for this pair, even under the default locale.
    #[error("no messages configured for {category}/{tier} (locale {locale})")]
    UnknownCategoryOrTier {
        locale: String,
        category: String,
        tier: String,
    },

    /// A configuration table failed startup validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures of a single fetch cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("forecast request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("forecast provider answered with HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Data(#[from] EngineError),
}

/// Coarse failure class surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider could not be reached or refused the request.
    Transport,
    /// A payload arrived but holds no usable current conditions.
    DataUnavailable,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(_) | FetchError::Status(_) => FailureKind::Transport,
            FetchError::Data(_) => FailureKind::DataUnavailable,
        }
    }
}
