use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// Opaque random session identifier, distinct from the token hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a session identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Device class derived from the user-agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Phone-class device.
    Mobile,
    /// Tablet-class device.
    Tablet,
    /// Desktop or laptop browser.
    Desktop,
    /// No user-agent or no recognizable marker.
    Unknown,
}

/// Device metadata captured at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Derived device class.
    pub device_type: DeviceType,
    /// Classified browser family.
    pub browser: String,
    /// Classified operating system.
    pub os: String,
    /// Raw user-agent string as received.
    pub user_agent: String,
}

impl DeviceInfo {
    /// Classifies a raw user-agent string by substring matching against
    /// known markers. Unrecognized agents yield `Unknown`/`"Unknown"`.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        let lowered = user_agent.to_lowercase();

        let device_type = if lowered.is_empty() {
            DeviceType::Unknown
        } else if lowered.contains("ipad") || lowered.contains("tablet") {
            DeviceType::Tablet
        } else if lowered.contains("mobi")
            || lowered.contains("iphone")
            || lowered.contains("android")
        {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        };

        // Order matters: Edge and Opera embed "chrome", Chrome embeds "safari".
        let browser = if lowered.contains("edg") {
            "Edge"
        } else if lowered.contains("opr") || lowered.contains("opera") {
            "Opera"
        } else if lowered.contains("firefox") {
            "Firefox"
        } else if lowered.contains("chrome") {
            "Chrome"
        } else if lowered.contains("safari") {
            "Safari"
        } else {
            "Unknown"
        };

        let os = if lowered.contains("windows") {
            "Windows"
        } else if lowered.contains("android") {
            "Android"
        } else if lowered.contains("iphone") || lowered.contains("ipad") || lowered.contains("ios")
        {
            "iOS"
        } else if lowered.contains("mac os") || lowered.contains("macos") {
            "macOS"
        } else if lowered.contains("linux") {
            "Linux"
        } else {
            "Unknown"
        };

        Self {
            device_type,
            browser: browser.to_owned(),
            os: os.to_owned(),
            user_agent: user_agent.to_owned(),
        }
    }
}

/// A tracked login session bound to a hashed bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Owning user.
    pub user_id: UserId,
    /// SHA-256 hex hash of the bearer token; uniquely identifies the session.
    pub token_hash: String,
    /// Opaque unique session identifier exposed to clients.
    pub session_id: SessionId,
    /// Device metadata captured at login.
    pub device_info: DeviceInfo,
    /// Remote address captured at login.
    pub ip_address: String,
    /// Optional coarse location label.
    pub location: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Bumped whenever the session is used.
    pub last_active: DateTime<Utc>,
    /// Session is logically expired once this instant passes.
    pub expires_at: DateTime<Utc>,
    /// Revoked sessions are deleted; this flag covers administrative
    /// deactivation short of deletion.
    pub is_active: bool,
}

impl UserSession {
    /// Returns whether the session is live at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceInfo, DeviceType};

    #[test]
    fn classifies_desktop_chrome_on_windows() {
        let info = DeviceInfo::from_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        );
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
    }

    #[test]
    fn classifies_iphone_safari() {
        let info = DeviceInfo::from_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
             AppleWebKit/605.1.15 Version/17.0 Mobile/15E148 Safari/604.1",
        );
        assert_eq!(info.device_type, DeviceType::Mobile);
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn classifies_ipad_as_tablet() {
        let info = DeviceInfo::from_user_agent("Mozilla/5.0 (iPad; CPU OS 16_0) Safari/604.1");
        assert_eq!(info.device_type, DeviceType::Tablet);
        assert_eq!(info.os, "iOS");
    }

    #[test]
    fn edge_wins_over_embedded_chrome_marker() {
        let info =
            DeviceInfo::from_user_agent("Mozilla/5.0 (Windows) Chrome/120.0 Edg/120.0 Safari/537");
        assert_eq!(info.browser, "Edge");
    }

    #[test]
    fn empty_user_agent_is_unknown() {
        let info = DeviceInfo::from_user_agent("");
        assert_eq!(info.device_type, DeviceType::Unknown);
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
    }
}
