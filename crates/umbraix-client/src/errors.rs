use crate::model::ProviderId;

/// Top-level error type for every client call in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration (missing key, bad base URL, ...).
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input (empty query, no messages, ...).
    #[error("validation error: {0}")]
    Validation(String),
    /// Upstream answered with a non-success status before any body was consumed.
    #[error("{message}")]
    Http {
        provider: ProviderId,
        status: u16,
        message: String,
    },
    /// Transport or body I/O failed.
    #[error("transport error ({provider}): {message}")]
    Transport {
        provider: ProviderId,
        message: String,
    },
    /// Upstream response shape was not what the client expects.
    #[error("protocol error ({provider}): {message}")]
    Protocol {
        provider: ProviderId,
        message: String,
    },
    /// The shared default search key used up its daily allowance.
    #[error(
        "daily limit of {limit} searches with the shared key reached; configure your own API key to keep searching"
    )]
    QuotaExceeded { limit: u32 },
    /// The quota tracker could not read or persist its counter.
    #[error("quota store error: {0}")]
    Quota(String),
}

impl ClientError {
    /// Creates an HTTP status error.
    pub fn http(provider: impl Into<ProviderId>, status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a transport-level error.
    pub fn transport(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(provider: impl Into<ProviderId>, message: impl Into<String>) -> Self {
        Self::Protocol {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Returns the provider associated with this error, if any.
    pub fn provider_id(&self) -> Option<&ProviderId> {
        match self {
            Self::Http { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Protocol { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Returns the HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
