use std::time::Duration;

/// Terminal outcomes of a wait other than convergence
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("error refreshing state: {source}")]
    Refresh {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("attribute {attribute:?} has unsupported type {kind}; expected bool, int or string")]
    UnsupportedAttributeType { attribute: String, kind: String },

    #[error(
        "timeout while waiting for {attribute} to become {target:?} (last state: {}, timeout: {timeout:?})",
        .last_status.as_deref().map(|s| format!("{s:?}")).unwrap_or_else(|| "none".to_string())
    )]
    Timeout {
        attribute: String,
        target: String,
        last_status: Option<String>,
        timeout: Duration,
    },

    #[error("cancelled while waiting for {attribute} to become {target:?}")]
    Cancelled { attribute: String, target: String },

    #[error("unexpected state {status:?} for {attribute}, wanted target {target:?} (pending: {pending:?})")]
    UnexpectedState {
        attribute: String,
        status: String,
        target: String,
        pending: Vec<String>,
    },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }
}
