//! Connection facade.
//!
//! [`StreamDeckConnection`] orchestrates the session lifecycle
//! (connect → register → run → disconnect) and exposes the full outbound
//! command surface and inbound event subscriptions on top of the
//! transport, dispatch and correlation layers.
//!
//! # Example
//!
//! ```no_run
//! use streamdeck_plugin::{RegistrationParameters, Result, StreamDeckConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = StreamDeckConnection::new(RegistrationParameters::from_env()?);
//!
//!     connection
//!         .on_key_down(|scope, _payload| {
//!             println!("key pressed on {}", scope.context);
//!         })
//!         .detach();
//!
//!     connection.run().await?;
//!     Ok(())
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{trace, warn};
use url::Url;

use crate::correlation::await_event;
use crate::dispatch::{EventDispatcher, Subscription};
use crate::error::{Error, Result};
use crate::protocol::command::{
    CommandMessage, LogPayload, SetImagePayload, SetStatePayload, SetTitlePayload,
    SwitchToProfilePayload, Target, UrlPayload,
};
use crate::protocol::event::{
    ActionContext, ActionPayload, AppearancePayload, ApplicationPayload, Event, EventKind,
    KeyPayload, SettingsPayload, TitlePayload,
};
use crate::protocol::types::DeviceInfo;
use crate::registration::{RegistrationCommand, RegistrationInfo, RegistrationParameters};
use crate::transport::{CloseStatus, FrameHandler, SessionState, Socket};

// ============================================================================
// Types
// ============================================================================

/// Shared state behind the facade.
struct ConnectionInner {
    parameters: RegistrationParameters,
    socket: Arc<Socket>,
    dispatcher: EventDispatcher,
}

// ============================================================================
// StreamDeckConnection
// ============================================================================

/// A connection between this plugin and the Stream Deck host.
///
/// Cheap to clone; clones share the same session. A process normally
/// creates exactly one, but nothing requires it: independent instances
/// carry independent sessions.
#[derive(Clone)]
pub struct StreamDeckConnection {
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for StreamDeckConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamDeckConnection")
            .field("port", &self.inner.parameters.port)
            .field("state", &self.inner.socket.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// StreamDeckConnection - Lifecycle
// ============================================================================

impl StreamDeckConnection {
    /// Creates a disconnected facade from validated startup parameters.
    #[must_use]
    pub fn new(parameters: RegistrationParameters) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                parameters,
                socket: Arc::new(Socket::new()),
                dispatcher: EventDispatcher::new(),
            }),
        }
    }

    /// Returns the host and device information supplied at launch.
    #[inline]
    #[must_use]
    pub fn info(&self) -> &RegistrationInfo {
        &self.inner.parameters.info
    }

    /// Returns the identifier this plugin registers itself with.
    #[inline]
    #[must_use]
    pub fn plugin_uuid(&self) -> &str {
        &self.inner.parameters.plugin_uuid
    }

    /// Returns the current lifecycle state of the session.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.socket.state()
    }

    /// Connects to the host and performs the registration handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the host endpoint is unreachable
    /// - [`Error::Operation`] / [`Error::WebSocket`] if the registration
    ///   frame cannot be sent
    pub async fn connect(&self) -> Result<()> {
        trace!(port = self.inner.parameters.port, "connecting to host");
        let url = Url::parse(&format!("ws://localhost:{}/", self.inner.parameters.port))
            .map_err(|e| Error::connection(format!("invalid endpoint: {e}")))?;

        let dispatcher = self.inner.dispatcher.clone();
        let on_frame: FrameHandler = Box::new(move |frame| {
            if let Err(e) = dispatcher.dispatch(&frame) {
                warn!(error = %e, "dropping undeliverable frame");
            }
        });

        Arc::clone(&self.inner.socket).connect(url, on_frame).await?;
        trace!("connected; registering plugin");

        let registration = RegistrationCommand {
            event: &self.inner.parameters.register_event,
            uuid: &self.inner.parameters.plugin_uuid,
        };
        self.inner
            .socket
            .send(serde_json::to_string(&registration)?)
            .await?;

        trace!("plugin registered");
        Ok(())
    }

    /// Disconnects from the host.
    ///
    /// Idempotent once connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Operation`] if [`StreamDeckConnection::connect`]
    /// has never been called.
    pub async fn disconnect(&self) -> Result<()> {
        self.require_connected_once()?;
        self.inner.socket.disconnect().await;
        Ok(())
    }

    /// Waits until the session ends, returning its terminal status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Operation`] if [`StreamDeckConnection::connect`]
    /// has never been called.
    pub async fn wait_for_shutdown(&self) -> Result<CloseStatus> {
        self.require_connected_once()?;
        Ok(self.inner.socket.wait_for_close().await)
    }

    /// Connects, then waits until the session ends.
    ///
    /// # Errors
    ///
    /// Propagates every error of [`StreamDeckConnection::connect`] and
    /// [`StreamDeckConnection::wait_for_shutdown`].
    pub async fn run(&self) -> Result<CloseStatus> {
        self.connect().await?;
        self.wait_for_shutdown().await
    }

    fn require_connected_once(&self) -> Result<()> {
        if self.state() == SessionState::Disconnected {
            return Err(Error::operation("connect() has not been called"));
        }
        Ok(())
    }
}

// ============================================================================
// StreamDeckConnection - Commands
// ============================================================================

impl StreamDeckConnection {
    /// Requests the global settings; the host answers with a
    /// `didReceiveGlobalSettings` event.
    pub async fn request_global_settings(&self) -> Result<()> {
        self.send_command(
            CommandMessage::new("getGlobalSettings").context(self.plugin_uuid()),
        )
        .await
    }

    /// Requests the settings of one action instance; the host answers
    /// with a `didReceiveSettings` event for that context.
    pub async fn request_settings(&self, context: &str) -> Result<()> {
        Self::require_field(context, "context")?;
        self.send_command(CommandMessage::new("getSettings").context(context))
            .await
    }

    /// Fetches the global settings, awaiting the host's answer.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the session ends first
    /// - [`Error::Json`] if the settings do not deserialize into `T`
    pub async fn get_global_settings<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let command = CommandMessage::new("getGlobalSettings")
            .context(self.plugin_uuid())
            .to_json()?;

        let event = await_event(
            &self.inner.socket,
            &self.inner.dispatcher,
            EventKind::DidReceiveGlobalSettings,
            None,
            command,
        )
        .await?;

        match event {
            Event::DidReceiveGlobalSettings(payload) => Ok(serde_json::from_value(payload.settings)?),
            other => Err(Error::protocol(format!("unexpected event {}", other.kind()))),
        }
    }

    /// Fetches the settings of one action instance, awaiting the host's
    /// answer for that exact context.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `context` is empty
    /// - [`Error::ConnectionClosed`] if the session ends first
    /// - [`Error::Json`] if the settings do not deserialize into `T`
    pub async fn get_settings<T>(&self, context: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        Self::require_field(context, "context")?;
        let command = CommandMessage::new("getSettings")
            .context(context)
            .to_json()?;

        let event = await_event(
            &self.inner.socket,
            &self.inner.dispatcher,
            EventKind::DidReceiveSettings,
            Some(context.to_string()),
            command,
        )
        .await?;

        match event {
            Event::DidReceiveSettings(_, payload) => Ok(serde_json::from_value(payload.settings)?),
            other => Err(Error::protocol(format!("unexpected event {}", other.kind()))),
        }
    }

    /// Writes a message to the host's log file.
    pub async fn log_message(&self, message: impl Into<String>) -> Result<()> {
        let payload = LogPayload {
            message: message.into(),
        };
        self.send_command(CommandMessage::new("logMessage").payload(&payload)?)
            .await
    }

    /// Opens a URL in the default browser.
    pub async fn open_url(&self, url: impl Into<String>) -> Result<()> {
        let payload = UrlPayload { url: url.into() };
        self.send_command(CommandMessage::new("openUrl").payload(&payload)?)
            .await
    }

    /// Sends a payload to the property inspector of an action instance.
    pub async fn send_to_property_inspector<T: Serialize>(
        &self,
        context: &str,
        action: &str,
        payload: &T,
    ) -> Result<()> {
        Self::require_field(context, "context")?;
        Self::require_field(action, "action")?;
        self.send_command(
            CommandMessage::new("sendToPropertyInspector")
                .context(context)
                .action(action)
                .payload(payload)?,
        )
        .await
    }

    /// Persists the global settings.
    pub async fn set_global_settings<T: Serialize>(&self, settings: &T) -> Result<()> {
        self.send_command(
            CommandMessage::new("setGlobalSettings")
                .context(self.plugin_uuid())
                .payload(settings)?,
        )
        .await
    }

    /// Sets the image of a key; an empty string restores the default.
    pub async fn set_image(
        &self,
        context: &str,
        image: impl Into<String>,
        target: Target,
        state: Option<u32>,
    ) -> Result<()> {
        Self::require_field(context, "context")?;
        let payload = SetImagePayload {
            image: image.into(),
            target,
            state,
        };
        self.send_command(
            CommandMessage::new("setImage")
                .context(context)
                .payload(&payload)?,
        )
        .await
    }

    /// Persists the settings of one action instance.
    pub async fn set_settings<T: Serialize>(&self, context: &str, settings: &T) -> Result<()> {
        Self::require_field(context, "context")?;
        self.send_command(
            CommandMessage::new("setSettings")
                .context(context)
                .payload(settings)?,
        )
        .await
    }

    /// Activates a state of a multi-state action.
    pub async fn set_state(&self, context: &str, state: u32) -> Result<()> {
        Self::require_field(context, "context")?;
        let payload = SetStatePayload { state };
        self.send_command(
            CommandMessage::new("setState")
                .context(context)
                .payload(&payload)?,
        )
        .await
    }

    /// Sets the title of a key; an empty string restores the default.
    pub async fn set_title(
        &self,
        context: &str,
        title: impl Into<String>,
        target: Target,
        state: Option<u32>,
    ) -> Result<()> {
        Self::require_field(context, "context")?;
        let payload = SetTitlePayload {
            title: title.into(),
            target,
            state,
        };
        self.send_command(
            CommandMessage::new("setTitle")
                .context(context)
                .payload(&payload)?,
        )
        .await
    }

    /// Shows the alert icon on a key.
    pub async fn show_alert(&self, context: &str) -> Result<()> {
        Self::require_field(context, "context")?;
        self.send_command(CommandMessage::new("showAlert").context(context))
            .await
    }

    /// Shows the OK icon on a key.
    pub async fn show_ok(&self, context: &str) -> Result<()> {
        Self::require_field(context, "context")?;
        self.send_command(CommandMessage::new("showOk").context(context))
            .await
    }

    /// Switches a device to one of the plugin's profiles; an empty
    /// profile name switches back to the previous profile.
    pub async fn switch_to_profile(
        &self,
        context: &str,
        device: &str,
        profile: impl Into<String>,
    ) -> Result<()> {
        Self::require_field(context, "context")?;
        Self::require_field(device, "device")?;
        let payload = SwitchToProfilePayload {
            profile: profile.into(),
        };
        self.send_command(
            CommandMessage::new("switchToProfile")
                .context(context)
                .device(device)
                .payload(&payload)?,
        )
        .await
    }

    async fn send_command(&self, command: CommandMessage) -> Result<()> {
        self.inner.socket.send(command.to_json()?).await
    }

    fn require_field(value: &str, name: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::invalid_argument(format!("{name} must not be empty")));
        }
        Ok(())
    }
}

// ============================================================================
// StreamDeckConnection - Subscriptions
// ============================================================================

impl StreamDeckConnection {
    /// Notifies when a monitored application launches.
    pub fn on_application_did_launch<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ApplicationPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::ApplicationDidLaunch, move |event| {
                if let Event::ApplicationDidLaunch(payload) = event {
                    handler(payload);
                }
            })
    }

    /// Notifies when a monitored application terminates.
    pub fn on_application_did_terminate<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ApplicationPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::ApplicationDidTerminate, move |event| {
                if let Event::ApplicationDidTerminate(payload) = event {
                    handler(payload);
                }
            })
    }

    /// Notifies when a device is plugged in.
    pub fn on_device_did_connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str, Option<&DeviceInfo>) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::DeviceDidConnect, move |event| {
                if let Event::DeviceDidConnect {
                    device,
                    device_info,
                } = event
                {
                    handler(device, device_info.as_ref());
                }
            })
    }

    /// Notifies when a device is unplugged.
    pub fn on_device_did_disconnect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::DeviceDidDisconnect, move |event| {
                if let Event::DeviceDidDisconnect { device } = event {
                    handler(device);
                }
            })
    }

    /// Notifies when the host delivers the global settings.
    pub fn on_did_receive_global_settings<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&SettingsPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::DidReceiveGlobalSettings, move |event| {
                if let Event::DidReceiveGlobalSettings(payload) = event {
                    handler(payload);
                }
            })
    }

    /// Notifies when the host delivers the settings of an action instance.
    pub fn on_did_receive_settings<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &ActionPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::DidReceiveSettings, move |event| {
                if let Event::DidReceiveSettings(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when a key is pressed.
    pub fn on_key_down<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &KeyPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::KeyDown, move |event| {
                if let Event::KeyDown(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when a key is released.
    pub fn on_key_up<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &KeyPayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::KeyUp, move |event| {
                if let Event::KeyUp(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when the property inspector becomes visible.
    pub fn on_property_inspector_did_appear<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::PropertyInspectorDidAppear, move |event| {
                if let Event::PropertyInspectorDidAppear(scope) = event {
                    handler(scope);
                }
            })
    }

    /// Notifies when the property inspector is closed.
    pub fn on_property_inspector_did_disappear<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::PropertyInspectorDidDisappear, move |event| {
                if let Event::PropertyInspectorDidDisappear(scope) = event {
                    handler(scope);
                }
            })
    }

    /// Notifies when the property inspector sends a message to the plugin.
    pub fn on_send_to_plugin<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &Value) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::SendToPlugin, move |event| {
                if let Event::SendToPlugin(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when the system wakes from sleep.
    pub fn on_system_did_wake_up<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::SystemDidWakeUp, move |event| {
                if matches!(event, Event::SystemDidWakeUp) {
                    handler();
                }
            })
    }

    /// Notifies when title rendering parameters change.
    pub fn on_title_parameters_did_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &TitlePayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::TitleParametersDidChange, move |event| {
                if let Event::TitleParametersDidChange(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when an action instance becomes visible.
    pub fn on_will_appear<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &AppearancePayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::WillAppear, move |event| {
                if let Event::WillAppear(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }

    /// Notifies when an action instance is about to disappear.
    pub fn on_will_disappear<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ActionContext, &AppearancePayload) + Send + Sync + 'static,
    {
        self.inner
            .dispatcher
            .observe(EventKind::WillDisappear, move |event| {
                if let Event::WillDisappear(scope, payload) = event {
                    handler(scope, payload);
                }
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
