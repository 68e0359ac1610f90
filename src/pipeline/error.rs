use crate::query::DateRangeError;
use crate::search::SearchError;
use crate::verify::{LookupError, VerifyError};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date window: {0}")]
    DateRange(#[from] DateRangeError),

    #[error("Search stage failed: {0}")]
    Search(#[from] SearchError),

    #[error("Verification of message {id} failed: {source}")]
    Verify { id: String, source: LookupError },
}

impl From<VerifyError> for PipelineError {
    fn from(err: VerifyError) -> Self {
        PipelineError::Verify {
            id: err.id,
            source: err.source,
        }
    }
}

/// Pipeline stage a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Search,
    Verify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Search => write!(f, "search"),
            Stage::Verify => write!(f, "verify"),
        }
    }
}

/// What the caller should do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix the command-line input
    FixInput,
    /// Rate limited; try again later
    RetryLater { retry_after: Option<u64> },
    /// Token lacks access or scopes
    CheckPermissions,
    /// Transport or backend failure
    Failed,
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidInput(_) | PipelineError::DateRange(_) => Stage::Input,
            PipelineError::Search(_) => Stage::Search,
            PipelineError::Verify { .. } => Stage::Verify,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::InvalidInput(_) | PipelineError::DateRange(_) => ErrorCategory::FixInput,
            PipelineError::Search(SearchError::RateLimited { retry_after })
            | PipelineError::Verify {
                source: LookupError::RateLimited { retry_after },
                ..
            } => ErrorCategory::RetryLater {
                retry_after: *retry_after,
            },
            PipelineError::Search(SearchError::Unauthorized(_))
            | PipelineError::Verify {
                source: LookupError::Unauthorized(_) | LookupError::ChannelNotAccessible(_),
                ..
            } => ErrorCategory::CheckPermissions,
            PipelineError::Search(SearchError::Failed(_)) | PipelineError::Verify { .. } => {
                ErrorCategory::Failed
            }
        }
    }

    /// One-line hint for the user matching [`Self::category`]
    pub fn hint(&self) -> String {
        match self.category() {
            ErrorCategory::FixInput => "check the command-line options and try again".to_string(),
            ErrorCategory::RetryLater {
                retry_after: Some(secs),
            } => format!("Slack is rate limiting requests; try again in {}s", secs),
            ErrorCategory::RetryLater { retry_after: None } => {
                "Slack is rate limiting requests; try again later".to_string()
            }
            ErrorCategory::CheckPermissions => {
                "check the token and its scopes (search:read, channels:history, users:read)"
                    .to_string()
            }
            ErrorCategory::Failed => "the Slack API request failed; try again".to_string(),
        }
    }
}
