//! Error types for the Stream Deck plugin client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use streamdeck_plugin::{Result, StreamDeckConnection};
//!
//! async fn example(connection: &StreamDeckConnection) -> Result<()> {
//!     connection.set_title("ctx", "Hello", Default::default(), None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Startup | [`Error::Argument`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnknownEvent`], [`Error::Json`] |
//! | Usage | [`Error::Operation`], [`Error::InvalidArgument`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// Invalid or missing startup argument.
    ///
    /// Returned when the registration arguments supplied by the host are
    /// missing or unparsable. Fatal: no connection is attempted.
    #[error("Argument error: {message}")]
    Argument {
        /// Description of the argument error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the connection to the host cannot be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed while an operation was outstanding.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed or unexpected inbound frame.
    ///
    /// Recovered locally: the frame is dropped and the session continues.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Inbound frame carried an event tag outside the supported set.
    ///
    /// Recovered locally: the frame is dropped and the session continues.
    #[error("Unrecognised event: {event}")]
    UnknownEvent {
        /// The unrecognised event tag.
        event: String,
    },

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Invalid call sequencing, e.g. sending before connecting.
    ///
    /// Returned synchronously to the offending caller; other callers and
    /// the read loop are unaffected.
    #[error("Operation error: {message}")]
    Operation {
        /// Description of the sequencing error.
        message: String,
    },

    /// Invalid argument in a command call.
    ///
    /// Returned when a required command field fails validation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a startup argument error.
    #[inline]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unknown event error.
    #[inline]
    pub fn unknown_event(event: impl Into<String>) -> Self {
        Self::UnknownEvent {
            event: event.into(),
        }
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recovered without ending the session.
    ///
    /// Per-frame protocol errors are logged and the read loop continues.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Protocol { .. } | Self::UnknownEvent { .. } | Self::Json(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_argument_error() {
        let err = Error::argument("-port was not supplied");
        assert_eq!(err.to_string(), "Argument error: -port was not supplied");
    }

    #[test]
    fn test_unknown_event_display() {
        let err = Error::unknown_event("deviceDidExplode");
        assert_eq!(err.to_string(), "Unrecognised event: deviceDidExplode");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::operation("test").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::unknown_event("custom").is_recoverable());
        assert!(Error::protocol("truncated frame").is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
        assert!(!Error::argument("missing").is_recoverable());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_recoverable());
    }
}
