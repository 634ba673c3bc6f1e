use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// Maximum byte length of a whole APNS message
pub const APNS_MAX_LENGTH: usize = 4096;

/// Maximum byte length of a whole APNS VoIP message
pub const APNS_VOIP_MAX_LENGTH: usize = 5120;

/// Maximum byte length of the FCM data/notification fragment
pub const FCM_MAX_LENGTH: usize = 4096;

/// Maximum byte length of the GCM data fragment
pub const GCM_MAX_LENGTH: usize = 4096;

/// Maximum byte length of the ADM data fragment
pub const ADM_MAX_LENGTH: usize = 6144;

/// Collapse key value meaning "never coalesce this message"
pub const NO_COLLAPSE: &str = "do_not_collapse";

/// Target platform tags a message can be rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Amazon Device Messaging
    Adm,
    /// Apple Push Notification service
    Apns,
    /// Apple Push Notification service, VoIP channel
    ApnsVoip,
    /// Firebase Cloud Messaging
    Fcm,
    /// Legacy Google Cloud Messaging, superseded by `Fcm` when both are requested
    Gcm,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Adm,
        Platform::Apns,
        Platform::ApnsVoip,
        Platform::Fcm,
        Platform::Gcm,
    ];

    /// Platforms rendered when the caller never chose any
    pub const DEFAULT: [Platform; 4] = [
        Platform::Adm,
        Platform::Apns,
        Platform::ApnsVoip,
        Platform::Gcm,
    ];

    /// Configuration tag of this platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Adm => "adm",
            Platform::Apns => "apns",
            Platform::ApnsVoip => "apns_voip",
            Platform::Fcm => "fcm",
            Platform::Gcm => "gcm",
        }
    }

    /// Parse a configuration tag (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str().eq_ignore_ascii_case(tag))
    }

    /// Byte budget enforced for this platform
    pub fn max_length(&self) -> usize {
        match self {
            Platform::Adm => ADM_MAX_LENGTH,
            Platform::Apns => APNS_MAX_LENGTH,
            Platform::ApnsVoip => APNS_VOIP_MAX_LENGTH,
            Platform::Fcm => FCM_MAX_LENGTH,
            Platform::Gcm => GCM_MAX_LENGTH,
        }
    }

    /// Envelope channel keys that receive this platform's payload
    pub fn channels(&self) -> &'static [&'static str] {
        match self {
            Platform::Adm => &["ADM"],
            Platform::Apns => &["APNS", "APNS_SANDBOX"],
            Platform::ApnsVoip => &["APNS_VOIP", "APNS_VOIP_SANDBOX"],
            Platform::Fcm | Platform::Gcm => &["GCM"],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Adm => "ADM",
            Platform::Apns => "APNS",
            Platform::ApnsVoip => "APNS_VOIP",
            Platform::Fcm => "FCM",
            Platform::Gcm => "GCM",
        };
        f.write_str(name)
    }
}

/// Delivery priority, consumed by FCM and GCM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Deliver immediately, waking the device (default)
    #[default]
    High,
    /// Deliver when convenient for the device
    Normal,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
        }
    }
}

/// APNS push type, passed to the relay as a delivery attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    #[default]
    Alert,
    Background,
    Voip,
    Complication,
    Fileprovider,
    Mdm,
}

impl PushType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Alert => "alert",
            PushType::Background => "background",
            PushType::Voip => "voip",
            PushType::Complication => "complication",
            PushType::Fileprovider => "fileprovider",
            PushType::Mdm => "mdm",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sound played by APNS, either a bundled file name or a critical alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApnsSound {
    /// Name of a sound file in the app bundle
    Named(String),
    /// Critical alert sound, played even when the device is muted
    Critical {
        name: String,
        /// Volume between 0.0 and 1.0
        #[serde(default = "default_critical_volume")]
        volume: f64,
    },
}

fn default_critical_volume() -> f64 {
    1.0
}

impl ApnsSound {
    /// Render as the `aps.sound` value
    pub fn to_value(&self) -> Value {
        match self {
            ApnsSound::Named(name) => Value::String(name.clone()),
            ApnsSound::Critical { name, volume } => json!({
                "critical": 1,
                "name": name,
                "volume": volume,
            }),
        }
    }
}

/// Coalescing key; unset is the `do_not_collapse` sentinel, never null
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollapseKey {
    #[default]
    NoCollapse,
    Key(String),
}

impl CollapseKey {
    /// Build from an optional caller value; empty and sentinel strings collapse to `NoCollapse`
    pub fn new(key: Option<impl Into<String>>) -> Self {
        match key.map(Into::into) {
            Some(key) if !key.is_empty() && key != NO_COLLAPSE => CollapseKey::Key(key),
            _ => CollapseKey::NoCollapse,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CollapseKey::NoCollapse => NO_COLLAPSE,
            CollapseKey::Key(key) => key,
        }
    }

    pub fn is_collapsible(&self) -> bool {
        matches!(self, CollapseKey::Key(_))
    }
}

impl fmt::Display for CollapseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CollapseKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CollapseKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = Option::<String>::deserialize(deserializer)?;
        Ok(CollapseKey::new(key))
    }
}
