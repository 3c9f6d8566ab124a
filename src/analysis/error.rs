//! Analysis error taxonomy

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that abort an analysis.
///
/// Per-item problems inside a batch are not errors; they are collected as
/// [`PartialFailure`]s next to the partial result.
#[derive(Debug, Error, Diagnostic)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    #[diagnostic(
        code(tagscope::validation),
        help("check the ids and names passed on the command line or in the config")
    )]
    Validation(String),

    #[error("remote service request failed")]
    #[diagnostic(
        code(tagscope::upstream),
        help("re-run with --verbose to see the upstream status in the log")
    )]
    Upstream(#[source] ApiError),

    #[error("remote service is rate limiting requests; retry after {retry_after_secs}s")]
    #[diagnostic(
        code(tagscope::rate_limited),
        help("wait and re-run, or raise max_retries in the config")
    )]
    RateLimited { retry_after_secs: u64 },

    #[error("pagination did not terminate after {max_pages} pages")]
    #[diagnostic(
        code(tagscope::pagination),
        help("the service kept returning a next page; raise max_pages only if the property is genuinely that large")
    )]
    ExhaustedPagination { max_pages: u32 },

    #[error("analysis did not finish within {secs}s")]
    #[diagnostic(code(tagscope::timeout), help("raise timeout_secs in the config"))]
    Timeout { secs: u64 },
}

impl From<ApiError> for AnalysisError {
    fn from(err: ApiError) -> Self {
        if err.is_rate_limited() {
            let retry_after_secs = err.retry_after().unwrap_or_default().as_secs();
            return AnalysisError::RateLimited { retry_after_secs };
        }
        AnalysisError::Upstream(err)
    }
}

impl AnalysisError {
    /// Build a validation error for a required identifier that is blank.
    pub fn missing(what: &str) -> Self {
        AnalysisError::Validation(format!("{what} is required"))
    }
}

/// Batch stage a [`PartialFailure`] happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Promoting a rule component search hit to its owning rule
    ResolveOwner,
    /// Listing the components of one rule during a scan
    FetchComponents,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::ResolveOwner => write!(f, "resolve_owner"),
            FailureStage::FetchComponents => write!(f, "fetch_components"),
        }
    }
}

/// A per-item failure that was skipped over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialFailure {
    pub item_id: String,
    pub stage: FailureStage,
    pub message: String,
}

impl PartialFailure {
    pub fn new(item_id: impl Into<String>, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            stage,
            message: message.into(),
        }
    }
}

/// Reject blank identifiers before any request is made.
pub fn require(value: &str, what: &str) -> AnalysisResult<()> {
    if value.trim().is_empty() {
        Err(AnalysisError::missing(what))
    } else {
        Ok(())
    }
}
