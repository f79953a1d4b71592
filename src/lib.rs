//! Stream Deck plugin SDK.
//!
//! This library connects a plugin to the Stream Deck host application
//! over the host's WebSocket endpoint: typed commands out, typed events
//! in, and awaitable settings requests synthesized on top of the host's
//! push-only protocol.
//!
//! # Architecture
//!
//! The host never answers commands directly; it unilaterally pushes
//! events, some of which happen to answer an earlier command. The crate
//! is layered accordingly:
//!
//! - **Transport** owns the one WebSocket: serialized writes, frame
//!   reassembly, a single background read loop.
//! - **Dispatch** classifies each frame by its event tag and fans it out
//!   to typed per-kind observers.
//! - **Correlation** binds an outbound command to the first matching
//!   later event, turning the exchange into an awaitable call.
//! - **[`StreamDeckConnection`]** composes the three behind the public
//!   lifecycle, command and subscription surface.
//!
//! # Quick Start
//!
//! ```no_run
//! use streamdeck_plugin::{RegistrationParameters, Result, StreamDeckConnection, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // The host supplies -port, -pluginUUID, -registerEvent and -info.
//!     let connection = StreamDeckConnection::new(RegistrationParameters::from_env()?);
//!
//!     let presses = connection.clone();
//!     connection
//!         .on_key_down(move |scope, _payload| {
//!             let presses = presses.clone();
//!             let context = scope.context.clone();
//!             tokio::spawn(async move {
//!                 let _ = presses.set_title(&context, "Pressed", Target::Both, None).await;
//!             });
//!         })
//!         .detach();
//!
//!     connection.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Session facade: lifecycle, commands, subscriptions |
//! | [`correlation`] | Awaitable calls over the push protocol (internal) |
//! | [`dispatch`] | Typed event fan-out (internal) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Wire message types |
//! | [`registration`] | Startup arguments and host info |
//! | [`transport`] | WebSocket ownership and read loop (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Session facade: lifecycle, commands and subscriptions.
pub mod connection;

/// Awaitable request/response calls over the push protocol.
///
/// Internal machinery behind the facade's settings getters.
pub mod correlation;

/// Typed event fan-out.
///
/// Internal module classifying frames and notifying observers.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Wire protocol message types.
///
/// Commands the plugin sends and events the host pushes.
pub mod protocol;

/// Startup registration parameters.
///
/// The four arguments the host passes on the plugin's command line.
pub mod registration;

/// WebSocket transport layer.
///
/// Internal module handling the socket, write serialization and the
/// read loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Facade types
pub use connection::StreamDeckConnection;

// Dispatch types
pub use dispatch::{EventDispatcher, Subscription};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{
    ActionContext, ActionPayload, AppearancePayload, ApplicationPayload, Coordinates, DeviceInfo,
    DeviceKind, DeviceSize, Event, EventKind, FontFamily, FontStyle, KeyPayload, Platform,
    SettingsPayload, Target, TitleAlignment, TitleParameters, TitlePayload,
};

// Registration types
pub use registration::{
    ApplicationInfo, IdentifiableDeviceInfo, PluginInfo, RegistrationInfo, RegistrationParameters,
};

// Transport types
pub use transport::{CloseStatus, SessionState};
