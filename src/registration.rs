//! Startup registration parameters.
//!
//! When the host launches a plugin it passes four arguments on the command
//! line:
//!
//! ```text
//! -port 28196 -pluginUUID 0123456789ABCDEF -registerEvent registerPlugin -info {...}
//! ```
//!
//! [`RegistrationParameters`] parses and validates them. A missing or
//! unparsable value is fatal: no connection is attempted.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::types::{DeviceInfo, Platform};

// ============================================================================
// RegistrationParameters
// ============================================================================

/// The startup arguments supplied by the host.
#[derive(Debug, Clone)]
pub struct RegistrationParameters {
    /// Port of the host's WebSocket endpoint.
    pub port: u16,

    /// Unique identifier the plugin registers itself with.
    pub plugin_uuid: String,

    /// Event name to use in the registration handshake.
    pub register_event: String,

    /// Information about the host application and connected devices.
    pub info: RegistrationInfo,
}

impl RegistrationParameters {
    /// Parses registration parameters from an argument list.
    ///
    /// Arguments are flag/value pairs and may appear in any order;
    /// unrecognised flags are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if any of the four required values is
    /// missing or unparsable.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut port = None;
        let mut plugin_uuid = None;
        let mut register_event = None;
        let mut info = None;

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "-port" => {
                    let value = Self::value_of(&mut args, "-port")?;
                    port = Some(value.parse::<u16>().map_err(|_| {
                        Error::argument(format!("-port value '{value}' is not a valid port"))
                    })?);
                }
                "-pluginUUID" => plugin_uuid = Some(Self::value_of(&mut args, "-pluginUUID")?),
                "-registerEvent" => {
                    register_event = Some(Self::value_of(&mut args, "-registerEvent")?);
                }
                "-info" => {
                    let value = Self::value_of(&mut args, "-info")?;
                    info = Some(serde_json::from_str::<RegistrationInfo>(&value).map_err(
                        |e| Error::argument(format!("-info value is not valid JSON: {e}")),
                    )?);
                }
                _ => {}
            }
        }

        Ok(Self {
            port: port.ok_or_else(|| Error::argument("-port was not supplied"))?,
            plugin_uuid: Self::required(plugin_uuid, "-pluginUUID")?,
            register_event: Self::required(register_event, "-registerEvent")?,
            info: info.ok_or_else(|| Error::argument("-info was not supplied"))?,
        })
    }

    /// Parses registration parameters from the process command line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Argument`] if any required value is missing or
    /// unparsable.
    pub fn from_env() -> Result<Self> {
        Self::from_args(std::env::args().skip(1))
    }

    fn value_of<I>(args: &mut I, flag: &str) -> Result<String>
    where
        I: Iterator<Item = String>,
    {
        args.next()
            .ok_or_else(|| Error::argument(format!("{flag} is missing its value")))
    }

    fn required(value: Option<String>, flag: &str) -> Result<String> {
        match value {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::argument(format!("{flag} was not supplied"))),
        }
    }
}

// ============================================================================
// RegistrationInfo
// ============================================================================

/// The `-info` blob describing the host application and devices.
///
/// Fields default individually, so additions by newer host versions never
/// fail startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInfo {
    /// Information about the host application.
    #[serde(default)]
    pub application: ApplicationInfo,

    /// Information about the plugin as registered with the host.
    #[serde(default)]
    pub plugin: Option<PluginInfo>,

    /// Pixel ratio of the display the host runs on.
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,

    /// Devices connected at launch.
    #[serde(default)]
    pub devices: Vec<IdentifiableDeviceInfo>,
}

/// Information about the host application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationInfo {
    /// Language the host is running in, e.g. `en`.
    #[serde(default)]
    pub language: String,

    /// Platform the host is running on.
    #[serde(default)]
    pub platform: Option<Platform>,

    /// Host application version.
    #[serde(default)]
    pub version: String,
}

/// Information about the plugin as registered with the host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginInfo {
    /// Plugin version from the manifest.
    #[serde(default)]
    pub version: String,
}

/// A device plus the opaque identifier the host assigned to it.
///
/// The identifier changes each time the host application is relaunched.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifiableDeviceInfo {
    /// Opaque device identifier.
    pub id: String,

    /// Description of the device.
    #[serde(flatten)]
    pub info: DeviceInfo,
}

// ============================================================================
// RegistrationCommand
// ============================================================================

/// The handshake frame sent immediately after the socket opens.
///
/// # Format
///
/// ```json
/// {"event": "registerPlugin", "uuid": "0123456789ABCDEF"}
/// ```
#[derive(Debug, Serialize)]
pub struct RegistrationCommand<'a> {
    /// Registration event name from the startup arguments.
    pub event: &'a str,

    /// Plugin identifier from the startup arguments.
    pub uuid: &'a str,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    const INFO: &str = r#"{
        "application": {"language": "en", "platform": "mac", "version": "5.0.0"},
        "plugin": {"version": "1.2.0"},
        "devicePixelRatio": 2,
        "devices": [
            {"id": "DEV1", "name": "Desk Left", "size": {"columns": 5, "rows": 3}, "type": 0}
        ]
    }"#;

    #[test]
    fn test_parse_full_arguments() {
        let parameters = RegistrationParameters::from_args(args(&[
            "-port",
            "28196",
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "registerPlugin",
            "-info",
            INFO,
        ]))
        .expect("parse");

        assert_eq!(parameters.port, 28196);
        assert_eq!(parameters.plugin_uuid, "ABC123");
        assert_eq!(parameters.register_event, "registerPlugin");
        assert_eq!(parameters.info.application.platform, Some(Platform::Mac));
        assert_eq!(parameters.info.devices.len(), 1);
        assert_eq!(parameters.info.devices[0].id, "DEV1");
        assert_eq!(parameters.info.devices[0].info.name.as_deref(), Some("Desk Left"));
    }

    #[test]
    fn test_argument_order_is_irrelevant() {
        let parameters = RegistrationParameters::from_args(args(&[
            "-info",
            r#"{"application": {"language": "en", "platform": "windows", "version": "5.0.0"}}"#,
            "-registerEvent",
            "registerPlugin",
            "-port",
            "9000",
            "-pluginUUID",
            "ABC123",
        ]))
        .expect("parse");

        assert_eq!(parameters.port, 9000);
    }

    #[test]
    fn test_missing_port_is_fatal() {
        let err = RegistrationParameters::from_args(args(&[
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "registerPlugin",
            "-info",
            "{}",
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Argument { ref message } if message.contains("-port")));
    }

    #[test]
    fn test_unparsable_port_is_fatal() {
        let err = RegistrationParameters::from_args(args(&[
            "-port",
            "not-a-port",
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "registerPlugin",
            "-info",
            "{}",
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Argument { ref message } if message.contains("not-a-port")));
    }

    #[test]
    fn test_invalid_info_json_is_fatal() {
        let err = RegistrationParameters::from_args(args(&[
            "-port",
            "9000",
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "registerPlugin",
            "-info",
            "{not json",
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Argument { ref message } if message.contains("-info")));
    }

    #[test]
    fn test_empty_register_event_is_fatal() {
        let err = RegistrationParameters::from_args(args(&[
            "-port",
            "9000",
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "",
            "-info",
            "{}",
        ]))
        .unwrap_err();

        assert!(matches!(err, Error::Argument { .. }));
    }

    #[test]
    fn test_trailing_flag_without_value() {
        let err = RegistrationParameters::from_args(args(&["-port"])).unwrap_err();
        assert!(matches!(err, Error::Argument { ref message } if message.contains("-port")));
    }

    #[test]
    fn test_minimal_info_blob() {
        // Hosts may omit everything except the envelope itself.
        let parameters = RegistrationParameters::from_args(args(&[
            "-port",
            "9000",
            "-pluginUUID",
            "ABC123",
            "-registerEvent",
            "registerPlugin",
            "-info",
            "{}",
        ]))
        .expect("parse");

        assert!(parameters.info.devices.is_empty());
        assert!(parameters.info.plugin.is_none());
    }

    #[test]
    fn test_registration_command_wire_shape() {
        let command = RegistrationCommand {
            event: "registerPlugin",
            uuid: "ABC123",
        };

        let json = serde_json::to_string(&command).expect("serialize");
        assert_eq!(json, r#"{"event":"registerPlugin","uuid":"ABC123"}"#);
    }
}
