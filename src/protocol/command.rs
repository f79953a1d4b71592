//! Outbound command wire types.
//!
//! Every command the plugin sends travels as a single JSON text frame of
//! the shape `{event, context?, device?, action?, payload?}`. Optional
//! fields are omitted entirely rather than serialized as `null`.
//!
//! # Commands
//!
//! | Command | Scope | Payload |
//! |---------|-------|---------|
//! | `getGlobalSettings`, `setGlobalSettings` | plugin | settings value |
//! | `getSettings`, `setSettings` | context | settings value |
//! | `logMessage` | global | [`LogPayload`] |
//! | `openUrl` | global | [`UrlPayload`] |
//! | `sendToPropertyInspector` | context + action | caller value |
//! | `setImage`, `setTitle` | context | [`SetImagePayload`], [`SetTitlePayload`] |
//! | `setState` | context | [`SetStatePayload`] |
//! | `showAlert`, `showOk` | context | none |
//! | `switchToProfile` | context + device | [`SwitchToProfilePayload`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// CommandMessage
// ============================================================================

/// A single outbound command frame.
///
/// # Format
///
/// ```json
/// {
///   "event": "setTitle",
///   "context": "A1",
///   "payload": { "title": "Hello", "target": 0 }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CommandMessage {
    /// Command name.
    pub event: &'static str,

    /// Context of the action instance the command is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Device the command is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Action identifier, carried only by `sendToPropertyInspector`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Command-specific data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CommandMessage {
    /// Creates a command with no scope and no payload.
    #[inline]
    #[must_use]
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            context: None,
            device: None,
            action: None,
            payload: None,
        }
    }

    /// Scopes the command to an action instance.
    #[inline]
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Scopes the command to a device.
    #[inline]
    #[must_use]
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Attaches the action identifier.
    #[inline]
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Attaches a serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the payload cannot be serialized.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Serializes the command into its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Target
// ============================================================================

/// Display to update when setting a title or image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum Target {
    /// Both hardware and software.
    #[default]
    Both,

    /// Only hardware.
    Hardware,

    /// Only software.
    Software,
}

impl From<Target> for u8 {
    fn from(value: Target) -> Self {
        match value {
            Target::Both => 0,
            Target::Hardware => 1,
            Target::Software => 2,
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Payload of `logMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct LogPayload {
    /// Message written to the host log file.
    pub message: String,
}

/// Payload of `openUrl`.
#[derive(Debug, Clone, Serialize)]
pub struct UrlPayload {
    /// URL opened in the default browser.
    pub url: String,
}

/// Payload of `setTitle`.
#[derive(Debug, Clone, Serialize)]
pub struct SetTitlePayload {
    /// Title shown on the key; an empty string restores the default.
    pub title: String,

    /// Display to update.
    pub target: Target,

    /// State of a multi-state action to update; all states if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u32>,
}

/// Payload of `setImage`.
#[derive(Debug, Clone, Serialize)]
pub struct SetImagePayload {
    /// Base64-encoded data URI; an empty string restores the default.
    pub image: String,

    /// Display to update.
    pub target: Target,

    /// State of a multi-state action to update; all states if omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<u32>,
}

/// Payload of `setState`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SetStatePayload {
    /// Zero-based state to activate.
    pub state: u32,
}

/// Payload of `switchToProfile`.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchToProfilePayload {
    /// Profile name; an empty string switches back to the previous profile.
    pub profile: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_command_omits_optional_fields() {
        let json = CommandMessage::new("getGlobalSettings")
            .to_json()
            .expect("serialize");

        assert_eq!(json, r#"{"event":"getGlobalSettings"}"#);
    }

    #[test]
    fn test_context_command() {
        let json = CommandMessage::new("showAlert")
            .context("A1")
            .to_json()
            .expect("serialize");

        assert_eq!(json, r#"{"event":"showAlert","context":"A1"}"#);
    }

    #[test]
    fn test_set_title_wire_shape() {
        let json = CommandMessage::new("setTitle")
            .context("A1")
            .payload(&SetTitlePayload {
                title: "Hello".to_string(),
                target: Target::Both,
                state: None,
            })
            .expect("payload")
            .to_json()
            .expect("serialize");

        let value: Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["event"], "setTitle");
        assert_eq!(value["context"], "A1");
        assert_eq!(value["payload"]["title"], "Hello");
        assert_eq!(value["payload"]["target"], 0);
        assert!(value["payload"].get("state").is_none());
        assert!(value.get("device").is_none());
    }

    #[test]
    fn test_set_image_targets_hardware_state() {
        let json = CommandMessage::new("setImage")
            .context("A1")
            .payload(&SetImagePayload {
                image: "data:image/png;base64,".to_string(),
                target: Target::Hardware,
                state: Some(1),
            })
            .expect("payload")
            .to_json()
            .expect("serialize");

        let value: Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["payload"]["target"], 1);
        assert_eq!(value["payload"]["state"], 1);
    }

    #[test]
    fn test_switch_to_profile_carries_device() {
        let json = CommandMessage::new("switchToProfile")
            .context("plugin-uuid")
            .device("DEV1")
            .payload(&SwitchToProfilePayload {
                profile: "Streaming".to_string(),
            })
            .expect("payload")
            .to_json()
            .expect("serialize");

        let value: Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["device"], "DEV1");
        assert_eq!(value["payload"]["profile"], "Streaming");
    }

    #[test]
    fn test_send_to_property_inspector_carries_action() {
        let json = CommandMessage::new("sendToPropertyInspector")
            .context("A1")
            .action("com.example.counter.increment")
            .payload(&serde_json::json!({ "count": 3 }))
            .expect("payload")
            .to_json()
            .expect("serialize");

        let value: Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["action"], "com.example.counter.increment");
        assert_eq!(value["payload"]["count"], 3);
    }

    #[test]
    fn test_target_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Target::Both).expect("serialize"), "0");
        assert_eq!(serde_json::to_string(&Target::Hardware).expect("serialize"), "1");
        assert_eq!(serde_json::to_string(&Target::Software).expect("serialize"), "2");
    }
}
