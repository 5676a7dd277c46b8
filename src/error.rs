use thiserror::Error;

/// Failures surfaced by the API client and report loading.
///
/// Command handlers wrap these in `anyhow` like every other error; the
/// session inspects them directly to tell a cancelled request apart from a
/// failed one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response, optionally with a server-supplied `detail` message.
    #[error("{}", server_message(*status, detail.as_deref()))]
    Server { status: u16, detail: Option<String> },

    /// The request was abandoned through its cancellation token.
    #[error("request cancelled")]
    Cancelled,

    /// Malformed report JSON or missing required input.
    #[error("{0}")]
    Validation(String),

    /// A 2xx response whose body was not the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A local file could not be read.
    #[error("{0}")]
    Read(String),
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

fn server_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => detail.to_string(),
        None => format!("Server responded with status: {status}"),
    }
}
