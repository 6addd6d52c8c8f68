use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A required field was empty; no request was issued.
    #[error("{0}")]
    Validation(String),
    /// Credentials or registration details were rejected.
    #[error("{0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
    #[error("server returned status {status}{}", format_detail(.detail))]
    Http { status: u16, detail: Option<String> },
    #[error("not signed in")]
    Unauthenticated,
    #[error("already signed in")]
    AlreadyAuthenticated,
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("client storage failure: {0}")]
    Storage(String),
}

impl ClientError {
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    /// Failures where the server never produced a usable reply.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::InvalidResponse(_)
        )
    }

    /// Server-provided detail for HTTP failures, if any.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ClientError::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

fn format_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}
