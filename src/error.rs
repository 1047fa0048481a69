use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage that talks to the video platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStage {
    Search,
    VideoStats,
    ChannelStats,
}

impl fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpstreamStage::Search => "search",
            UpstreamStage::VideoStats => "video statistics",
            UpstreamStage::ChannelStats => "channel statistics",
        };
        f.write_str(name)
    }
}

/// Errores del motor de tendencias.
///
/// An empty result set is not represented here: zero matching videos is a
/// valid page with no items.
#[derive(Debug, Error)]
pub enum TrendError {
    /// Missing or invalid startup configuration. Fatal, never per-request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-2xx status, malformed payload or timeout from the platform API.
    #[error("upstream {stage} failed: {detail}")]
    Upstream {
        stage: UpstreamStage,
        detail: String,
        timed_out: bool,
    },

    /// Invalid query parameter. Raised before any upstream call.
    #[error("invalid parameter: {0}")]
    Validation(String),
}

impl TrendError {
    pub fn upstream(stage: UpstreamStage, detail: impl Into<String>) -> Self {
        Self::Upstream {
            stage,
            detail: detail.into(),
            timed_out: false,
        }
    }

    pub fn timeout(stage: UpstreamStage, detail: impl Into<String>) -> Self {
        Self::Upstream {
            stage,
            detail: detail.into(),
            timed_out: true,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            TrendError::Config(_) => "config_error",
            TrendError::Upstream { .. } => "upstream_error",
            TrendError::Validation(_) => "validation_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TrendError::Upstream { timed_out: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;

/// Structured error description handed to callers instead of a raw trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&TrendError> for ErrorResponse {
    fn from(err: &TrendError) -> Self {
        Self {
            error: err.category().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<TrendError> for ErrorResponse {
    fn from(err: TrendError) -> Self {
        Self::from(&err)
    }
}
