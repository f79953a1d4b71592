//! Inbound event wire types.
//!
//! The host pushes events as JSON text frames of the shape
//! `{event, action?, context?, device?, payload?}`. The `event` tag is a
//! member of a fixed, closed set; anything else is rejected with
//! [`Error::UnknownEvent`] and dropped without ending the session.
//!
//! # Event Kinds
//!
//! | Scope | Kinds |
//! |-------|-------|
//! | Global | `applicationDidLaunch`, `applicationDidTerminate`, `deviceDidConnect`, `deviceDidDisconnect`, `didReceiveGlobalSettings`, `systemDidWakeUp` |
//! | Action | `didReceiveSettings`, `keyDown`, `keyUp`, `propertyInspectorDidAppear`, `propertyInspectorDidDisappear`, `sendToPlugin`, `titleParametersDidChange`, `willAppear`, `willDisappear` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::{Coordinates, DeviceInfo, TitleParameters};

// ============================================================================
// EventKind
// ============================================================================

/// The closed set of event tags the host can push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A monitored application launched.
    ApplicationDidLaunch,
    /// A monitored application terminated.
    ApplicationDidTerminate,
    /// A device was plugged in.
    DeviceDidConnect,
    /// A device was unplugged.
    DeviceDidDisconnect,
    /// Global settings were delivered, answering `getGlobalSettings`.
    DidReceiveGlobalSettings,
    /// Action settings were delivered, answering `getSettings`.
    DidReceiveSettings,
    /// A key was pressed.
    KeyDown,
    /// A key was released.
    KeyUp,
    /// The property inspector became visible.
    PropertyInspectorDidAppear,
    /// The property inspector was closed.
    PropertyInspectorDidDisappear,
    /// The property inspector sent a message to the plugin.
    SendToPlugin,
    /// The system woke from sleep.
    SystemDidWakeUp,
    /// Title rendering parameters changed.
    TitleParametersDidChange,
    /// An action instance became visible.
    WillAppear,
    /// An action instance is about to disappear.
    WillDisappear,
}

impl EventKind {
    /// Returns the wire tag for this kind.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationDidLaunch => "applicationDidLaunch",
            Self::ApplicationDidTerminate => "applicationDidTerminate",
            Self::DeviceDidConnect => "deviceDidConnect",
            Self::DeviceDidDisconnect => "deviceDidDisconnect",
            Self::DidReceiveGlobalSettings => "didReceiveGlobalSettings",
            Self::DidReceiveSettings => "didReceiveSettings",
            Self::KeyDown => "keyDown",
            Self::KeyUp => "keyUp",
            Self::PropertyInspectorDidAppear => "propertyInspectorDidAppear",
            Self::PropertyInspectorDidDisappear => "propertyInspectorDidDisappear",
            Self::SendToPlugin => "sendToPlugin",
            Self::SystemDidWakeUp => "systemDidWakeUp",
            Self::TitleParametersDidChange => "titleParametersDidChange",
            Self::WillAppear => "willAppear",
            Self::WillDisappear => "willDisappear",
        }
    }

    /// Resolves a wire tag to its kind, or `None` for tags outside the set.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "applicationDidLaunch" => Some(Self::ApplicationDidLaunch),
            "applicationDidTerminate" => Some(Self::ApplicationDidTerminate),
            "deviceDidConnect" => Some(Self::DeviceDidConnect),
            "deviceDidDisconnect" => Some(Self::DeviceDidDisconnect),
            "didReceiveGlobalSettings" => Some(Self::DidReceiveGlobalSettings),
            "didReceiveSettings" => Some(Self::DidReceiveSettings),
            "keyDown" => Some(Self::KeyDown),
            "keyUp" => Some(Self::KeyUp),
            "propertyInspectorDidAppear" => Some(Self::PropertyInspectorDidAppear),
            "propertyInspectorDidDisappear" => Some(Self::PropertyInspectorDidDisappear),
            "sendToPlugin" => Some(Self::SendToPlugin),
            "systemDidWakeUp" => Some(Self::SystemDidWakeUp),
            "titleParametersDidChange" => Some(Self::TitleParametersDidChange),
            "willAppear" => Some(Self::WillAppear),
            "willDisappear" => Some(Self::WillDisappear),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Identifies the action instance an event is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    /// Action identifier from the plugin manifest.
    pub action: String,

    /// Opaque identifier of the action instance.
    pub context: String,

    /// Device the action instance lives on.
    pub device: Option<String>,
}

/// Payload of `applicationDidLaunch` / `applicationDidTerminate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplicationPayload {
    /// Identifier of the monitored application.
    pub application: String,
}

/// Payload of `didReceiveGlobalSettings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingsPayload {
    /// Persisted settings value.
    #[serde(default)]
    pub settings: Value,
}

/// Payload of `didReceiveSettings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    /// Persisted settings value.
    #[serde(default)]
    pub settings: Value,

    /// Position of the key on the device grid.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Current state of a multi-state action.
    #[serde(default)]
    pub state: Option<u32>,

    /// Whether the action is part of a multi-action.
    #[serde(default)]
    pub is_in_multi_action: bool,
}

/// Payload of `keyDown` / `keyUp`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPayload {
    /// Persisted settings value.
    #[serde(default)]
    pub settings: Value,

    /// Position of the key on the device grid.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Current state of a multi-state action.
    #[serde(default)]
    pub state: Option<u32>,

    /// State requested by a multi-action, which may differ from `state`.
    #[serde(default)]
    pub user_desired_state: Option<u32>,

    /// Whether the action is part of a multi-action.
    #[serde(default)]
    pub is_in_multi_action: bool,
}

/// Payload of `willAppear` / `willDisappear`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearancePayload {
    /// Persisted settings value.
    #[serde(default)]
    pub settings: Value,

    /// Position of the key on the device grid.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Current state of a multi-state action.
    #[serde(default)]
    pub state: Option<u32>,

    /// Whether the action is part of a multi-action.
    #[serde(default)]
    pub is_in_multi_action: bool,
}

/// Payload of `titleParametersDidChange`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePayload {
    /// Persisted settings value.
    #[serde(default)]
    pub settings: Value,

    /// Position of the key on the device grid.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    /// Current state of a multi-state action.
    #[serde(default)]
    pub state: Option<u32>,

    /// New title text.
    #[serde(default)]
    pub title: String,

    /// New title rendering parameters.
    #[serde(default)]
    pub title_parameters: Option<TitleParameters>,
}

// ============================================================================
// Event
// ============================================================================

/// A fully parsed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A monitored application launched.
    ApplicationDidLaunch(ApplicationPayload),
    /// A monitored application terminated.
    ApplicationDidTerminate(ApplicationPayload),
    /// A device was plugged in.
    DeviceDidConnect {
        /// Opaque device identifier.
        device: String,
        /// Description of the device.
        device_info: Option<DeviceInfo>,
    },
    /// A device was unplugged.
    DeviceDidDisconnect {
        /// Opaque device identifier.
        device: String,
    },
    /// Global settings were delivered.
    DidReceiveGlobalSettings(SettingsPayload),
    /// Action settings were delivered.
    DidReceiveSettings(ActionContext, ActionPayload),
    /// A key was pressed.
    KeyDown(ActionContext, KeyPayload),
    /// A key was released.
    KeyUp(ActionContext, KeyPayload),
    /// The property inspector became visible.
    PropertyInspectorDidAppear(ActionContext),
    /// The property inspector was closed.
    PropertyInspectorDidDisappear(ActionContext),
    /// The property inspector sent a message to the plugin.
    SendToPlugin(ActionContext, Value),
    /// The system woke from sleep.
    SystemDidWakeUp,
    /// Title rendering parameters changed.
    TitleParametersDidChange(ActionContext, TitlePayload),
    /// An action instance became visible.
    WillAppear(ActionContext, AppearancePayload),
    /// An action instance is about to disappear.
    WillDisappear(ActionContext, AppearancePayload),
}

/// Raw frame shape, parsed before the kind-specific payload.
#[derive(Debug, Deserialize)]
struct RawMessage {
    event: String,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    device: Option<String>,
    #[serde(default, rename = "deviceInfo")]
    device_info: Option<DeviceInfo>,
    #[serde(default)]
    payload: Value,
}

impl RawMessage {
    /// Builds the action scope for per-instance events.
    fn action_context(&mut self) -> ActionContext {
        ActionContext {
            action: self.action.take().unwrap_or_default(),
            context: self.context.take().unwrap_or_default(),
            device: self.device.take(),
        }
    }
}

impl Event {
    /// Parses one complete frame into a typed event.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not valid JSON or a payload does
    ///   not match its kind-specific shape
    /// - [`Error::UnknownEvent`] if the event tag is outside the set
    pub fn from_json(frame: &str) -> Result<Self> {
        let mut raw: RawMessage = serde_json::from_str(frame)?;
        let kind = EventKind::from_tag(&raw.event)
            .ok_or_else(|| Error::unknown_event(raw.event.clone()))?;

        let event = match kind {
            EventKind::ApplicationDidLaunch => {
                Self::ApplicationDidLaunch(serde_json::from_value(raw.payload)?)
            }
            EventKind::ApplicationDidTerminate => {
                Self::ApplicationDidTerminate(serde_json::from_value(raw.payload)?)
            }
            EventKind::DeviceDidConnect => Self::DeviceDidConnect {
                device: raw.device.take().unwrap_or_default(),
                device_info: raw.device_info.take(),
            },
            EventKind::DeviceDidDisconnect => Self::DeviceDidDisconnect {
                device: raw.device.take().unwrap_or_default(),
            },
            EventKind::DidReceiveGlobalSettings => {
                Self::DidReceiveGlobalSettings(serde_json::from_value(raw.payload)?)
            }
            EventKind::DidReceiveSettings => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::DidReceiveSettings(raw.action_context(), payload)
            }
            EventKind::KeyDown => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::KeyDown(raw.action_context(), payload)
            }
            EventKind::KeyUp => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::KeyUp(raw.action_context(), payload)
            }
            EventKind::PropertyInspectorDidAppear => {
                Self::PropertyInspectorDidAppear(raw.action_context())
            }
            EventKind::PropertyInspectorDidDisappear => {
                Self::PropertyInspectorDidDisappear(raw.action_context())
            }
            EventKind::SendToPlugin => {
                let payload = raw.payload.take();
                Self::SendToPlugin(raw.action_context(), payload)
            }
            EventKind::SystemDidWakeUp => Self::SystemDidWakeUp,
            EventKind::TitleParametersDidChange => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::TitleParametersDidChange(raw.action_context(), payload)
            }
            EventKind::WillAppear => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::WillAppear(raw.action_context(), payload)
            }
            EventKind::WillDisappear => {
                let payload = serde_json::from_value(raw.payload.take())?;
                Self::WillDisappear(raw.action_context(), payload)
            }
        };

        Ok(event)
    }

    /// Returns the kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ApplicationDidLaunch(_) => EventKind::ApplicationDidLaunch,
            Self::ApplicationDidTerminate(_) => EventKind::ApplicationDidTerminate,
            Self::DeviceDidConnect { .. } => EventKind::DeviceDidConnect,
            Self::DeviceDidDisconnect { .. } => EventKind::DeviceDidDisconnect,
            Self::DidReceiveGlobalSettings(_) => EventKind::DidReceiveGlobalSettings,
            Self::DidReceiveSettings(..) => EventKind::DidReceiveSettings,
            Self::KeyDown(..) => EventKind::KeyDown,
            Self::KeyUp(..) => EventKind::KeyUp,
            Self::PropertyInspectorDidAppear(_) => EventKind::PropertyInspectorDidAppear,
            Self::PropertyInspectorDidDisappear(_) => EventKind::PropertyInspectorDidDisappear,
            Self::SendToPlugin(..) => EventKind::SendToPlugin,
            Self::SystemDidWakeUp => EventKind::SystemDidWakeUp,
            Self::TitleParametersDidChange(..) => EventKind::TitleParametersDidChange,
            Self::WillAppear(..) => EventKind::WillAppear,
            Self::WillDisappear(..) => EventKind::WillDisappear,
        }
    }

    /// Returns the context this event is scoped to, if any.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::DidReceiveSettings(scope, _)
            | Self::KeyDown(scope, _)
            | Self::KeyUp(scope, _)
            | Self::SendToPlugin(scope, _)
            | Self::TitleParametersDidChange(scope, _)
            | Self::WillAppear(scope, _)
            | Self::WillDisappear(scope, _) => Some(scope.context.as_str()),
            Self::PropertyInspectorDidAppear(scope) | Self::PropertyInspectorDidDisappear(scope) => {
                Some(scope.context.as_str())
            }
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_mapping_round_trip() {
        let kinds = [
            EventKind::ApplicationDidLaunch,
            EventKind::DeviceDidConnect,
            EventKind::DidReceiveGlobalSettings,
            EventKind::KeyDown,
            EventKind::SendToPlugin,
            EventKind::SystemDidWakeUp,
            EventKind::WillDisappear,
        ];

        for kind in kinds {
            assert_eq!(EventKind::from_tag(kind.as_str()), Some(kind));
        }

        assert_eq!(EventKind::from_tag("deviceDidExplode"), None);
    }

    #[test]
    fn test_parse_key_down() {
        let frame = r#"{
            "event": "keyDown",
            "action": "com.example.counter.increment",
            "context": "A1",
            "device": "DEV1",
            "payload": {
                "settings": {"count": 4},
                "coordinates": {"column": 2, "row": 1},
                "state": 0,
                "isInMultiAction": false
            }
        }"#;

        let event = Event::from_json(frame).expect("parse");
        assert_eq!(event.kind(), EventKind::KeyDown);
        assert_eq!(event.context(), Some("A1"));

        match event {
            Event::KeyDown(scope, payload) => {
                assert_eq!(scope.action, "com.example.counter.increment");
                assert_eq!(scope.device.as_deref(), Some("DEV1"));
                assert_eq!(payload.settings["count"], 4);
                assert_eq!(payload.coordinates, Some(Coordinates { column: 2, row: 1 }));
                assert!(!payload.is_in_multi_action);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_device_did_connect() {
        let frame = r#"{
            "event": "deviceDidConnect",
            "device": "DEV1",
            "deviceInfo": {"name": "Desk Left", "size": {"columns": 5, "rows": 3}, "type": 0}
        }"#;

        let event = Event::from_json(frame).expect("parse");
        match event {
            Event::DeviceDidConnect {
                device,
                device_info,
            } => {
                assert_eq!(device, "DEV1");
                let info = device_info.expect("device info");
                assert_eq!(info.name.as_deref(), Some("Desk Left"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_settings() {
        let frame = r#"{"event": "didReceiveGlobalSettings", "payload": {"settings": {"x": 1}}}"#;

        let event = Event::from_json(frame).expect("parse");
        assert_eq!(event.kind(), EventKind::DidReceiveGlobalSettings);
        assert_eq!(event.context(), None);

        match event {
            Event::DidReceiveGlobalSettings(payload) => assert_eq!(payload.settings["x"], 1),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_system_did_wake_up() {
        let event = Event::from_json(r#"{"event": "systemDidWakeUp"}"#).expect("parse");
        assert_eq!(event, Event::SystemDidWakeUp);
    }

    #[test]
    fn test_parse_title_parameters_did_change() {
        let frame = r##"{
            "event": "titleParametersDidChange",
            "action": "com.example.counter.increment",
            "context": "A1",
            "device": "DEV1",
            "payload": {
                "settings": {},
                "coordinates": {"column": 0, "row": 0},
                "state": 0,
                "title": "4",
                "titleParameters": {
                    "fontFamily": "Arial",
                    "fontSize": 9,
                    "fontStyle": "Bold",
                    "fontUnderline": false,
                    "showTitle": true,
                    "titleAlignment": "middle",
                    "titleColor": "#ffffff"
                }
            }
        }"##;

        let event = Event::from_json(frame).expect("parse");
        match event {
            Event::TitleParametersDidChange(_, payload) => {
                assert_eq!(payload.title, "4");
                let parameters = payload.title_parameters.expect("parameters");
                assert_eq!(parameters.font_size, 9);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = Event::from_json(r#"{"event": "deviceDidExplode"}"#).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent { ref event } if event == "deviceDidExplode"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = Event::from_json(r#"{"event": "keyDown", "payload": "#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        // Recognised tag, payload of the wrong shape.
        let err = Event::from_json(
            r#"{"event": "applicationDidLaunch", "payload": {"application": 42}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
