use std::error::Error as StdError;

use thiserror::Error;

/// APNs push error types
///
/// Every variant keeps the underlying message untouched so callers see exactly
/// what the file system, validator or transport reported.
#[derive(Error, Debug)]
pub enum ApnsError {
    /// Certificate material or settings are unusable
    #[error("APNs configuration error: {0}")]
    Configuration(String),

    /// Unknown push type or target environment
    #[error("APNs validation error: {0}")]
    Validation(String),

    /// HTTP/TLS layer failure (identity rejected, handshake, connect, DNS, timeout)
    #[error("APNs transport error: {message}")]
    Transport { message: String, code: Option<i32> },
}

impl ApnsError {
    /// The underlying message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            ApnsError::Configuration(msg) | ApnsError::Validation(msg) => msg,
            ApnsError::Transport { message, .. } => message,
        }
    }

    /// Error code reported by the transport, if any
    pub fn code(&self) -> Option<i32> {
        match self {
            ApnsError::Transport { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApnsError {
    fn from(err: reqwest::Error) -> Self {
        // HTTP status wins, otherwise the first OS error number in the chain
        let code = err
            .status()
            .map(|status| i32::from(status.as_u16()))
            .or_else(|| os_error_code(&err));

        ApnsError::Transport {
            message: chain_message(&err),
            code,
        }
    }
}

/// Top-level message followed by every distinct cause, joined with ": "
fn chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

fn os_error_code(err: &(dyn StdError + 'static)) -> Option<i32> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<std::io::Error>() {
            if let Some(code) = io_err.raw_os_error() {
                return Some(code);
            }
        }
        source = inner.source();
    }
    None
}
