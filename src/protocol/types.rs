//! Shared display and device types.
//!
//! These types appear both in inbound event payloads and in the
//! registration info blob supplied at startup.
//!
//! The host speaks in display strings ("Arial Black", "Bold Italic") and
//! small integers (device models), so every enumeration here carries an
//! explicit bidirectional mapping.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Platform
// ============================================================================

/// Platform the host application is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// macOS.
    #[serde(rename = "mac")]
    Mac,

    /// Windows.
    #[serde(rename = "windows")]
    Windows,
}

// ============================================================================
// FontFamily
// ============================================================================

/// Fonts available for key titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontFamily {
    /// Arial font.
    Arial,
    /// Arial Black font.
    #[serde(rename = "Arial Black")]
    ArialBlack,
    /// Comic Sans MS font.
    #[serde(rename = "Comic Sans MS")]
    ComicSansMS,
    /// Courier font.
    Courier,
    /// Courier New font.
    #[serde(rename = "Courier New")]
    CourierNew,
    /// Georgia font.
    Georgia,
    /// Impact font.
    Impact,
    /// Microsoft Sans Serif font.
    #[serde(rename = "Microsoft Sans Serif")]
    MicrosoftSansSerif,
    /// Symbol font.
    Symbol,
    /// Tahoma font.
    Tahoma,
    /// Times New Roman font.
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    /// Trebuchet MS font.
    #[serde(rename = "Trebuchet MS")]
    TrebuchetMS,
    /// Verdana font.
    Verdana,
    /// Webdings font.
    Webdings,
    /// Wingdings font.
    Wingdings,
}

// ============================================================================
// FontStyle
// ============================================================================

/// Font styles available for key titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    /// Regular font.
    Regular,
    /// Bold font.
    Bold,
    /// Italic font.
    Italic,
    /// Bold and italic font.
    #[serde(rename = "Bold Italic")]
    BoldItalic,
}

// ============================================================================
// TitleAlignment
// ============================================================================

/// Vertical alignment of a key title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleAlignment {
    /// Top alignment.
    Top,
    /// Middle alignment.
    Middle,
    /// Bottom alignment.
    Bottom,
}

// ============================================================================
// TitleParameters
// ============================================================================

/// Parameters describing how a key title is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleParameters {
    /// Font family for the title.
    #[serde(default)]
    pub font_family: Option<FontFamily>,

    /// Font size for the title.
    #[serde(default)]
    pub font_size: u32,

    /// Font style for the title.
    #[serde(default)]
    pub font_style: Option<FontStyle>,

    /// Whether the title is underlined.
    #[serde(default)]
    pub font_underline: bool,

    /// Whether the title is visible.
    #[serde(default)]
    pub show_title: bool,

    /// Vertical alignment of the title.
    #[serde(default)]
    pub title_alignment: Option<TitleAlignment>,

    /// Title color, as a hexadecimal string, e.g. `#ffffff`.
    #[serde(default)]
    pub title_color: Option<String>,
}

// ============================================================================
// Coordinates
// ============================================================================

/// Position of a key on the device grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Zero-based column.
    pub column: u32,

    /// Zero-based row.
    pub row: u32,
}

// ============================================================================
// Devices
// ============================================================================

/// Device model, as reported by the host.
///
/// The host encodes models as small integers; values outside the known
/// set are preserved in [`DeviceKind::Other`] so newer hardware never
/// fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum DeviceKind {
    /// The original 15-key Stream Deck.
    StreamDeck,
    /// The 6-key Stream Deck Mini.
    StreamDeckMini,
    /// The 32-key Stream Deck XL.
    StreamDeckXl,
    /// The Stream Deck Mobile application.
    StreamDeckMobile,
    /// A Corsair keyboard with G-keys.
    CorsairGKeys,
    /// A model this crate does not know about.
    Other(u8),
}

impl From<u8> for DeviceKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::StreamDeck,
            1 => Self::StreamDeckMini,
            2 => Self::StreamDeckXl,
            3 => Self::StreamDeckMobile,
            4 => Self::CorsairGKeys,
            other => Self::Other(other),
        }
    }
}

impl From<DeviceKind> for u8 {
    fn from(value: DeviceKind) -> Self {
        match value {
            DeviceKind::StreamDeck => 0,
            DeviceKind::StreamDeckMini => 1,
            DeviceKind::StreamDeckXl => 2,
            DeviceKind::StreamDeckMobile => 3,
            DeviceKind::CorsairGKeys => 4,
            DeviceKind::Other(other) => other,
        }
    }
}

/// Key layout of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSize {
    /// Number of key columns.
    pub columns: u32,

    /// Number of key rows.
    pub rows: u32,
}

/// Information about a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Device name.
    #[serde(default)]
    pub name: Option<String>,

    /// Key layout of the device.
    #[serde(default)]
    pub size: Option<DeviceSize>,

    /// Device model.
    #[serde(rename = "type", default = "default_device_kind")]
    pub kind: DeviceKind,
}

fn default_device_kind() -> DeviceKind {
    DeviceKind::StreamDeck
}

// ============================================================================
// Tests
// ============================================================================
