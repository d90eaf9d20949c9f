//! Error types shared by the caches and the plate provider.

use std::time::Duration;

/// Failure reported by the remote plate service.
///
/// Cloneable so a single failed refresh can be handed to every caller that
/// was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("remote returned HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("failed to decode response: {0}")]
  Decode(String),
  #[error("request timed out after {0:?}")]
  Timeout(Duration),
}

/// Errors surfaced to callers of the caches and the provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
  /// A required identifier was empty. Raised before any cache or remote work.
  #[error("invalid argument: {name} must not be empty")]
  InvalidArgument { name: &'static str },

  /// The remote lookup failed and nothing was cached to fall back on.
  #[error("plate service unavailable (requester {requester}, id {item}): {source}")]
  RemoteUnavailable {
    requester: String,
    item: String,
    #[source]
    source: RemoteError,
  },
}

impl ProviderError {
  pub fn is_invalid_argument(&self) -> bool {
    matches!(self, Self::InvalidArgument { .. })
  }
}

/// Reject empty or whitespace-only identifiers.
pub fn require_non_empty(name: &'static str, value: &str) -> Result<(), ProviderError> {
  if value.trim().is_empty() {
    return Err(ProviderError::InvalidArgument { name });
  }
  Ok(())
}
