//! Unified error type for the server crate.

use magnate_transport::TransportError;

/// Top-level error wrapping the layer-specific errors.
///
/// The `#[from]` conversions let `?` lift sub-crate errors without
/// ceremony at the call sites.
#[derive(Debug, thiserror::Error)]
pub enum MagnateError {
    /// A transport-level failure (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Outbound event serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::NotText;
        let wrapped: MagnateError = err.into();
        assert!(matches!(wrapped, MagnateError::Transport(_)));
        assert!(wrapped.to_string().contains("non-text"));
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let wrapped: MagnateError = err.into();
        assert!(matches!(wrapped, MagnateError::Encode(_)));
    }
}
