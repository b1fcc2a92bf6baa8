use serde::{Deserialize, Serialize};

/// Per-user notification preference flags. A user with no stored row gets
/// these defaults — the registry never answers "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub email_connections: bool,
    pub email_messages: bool,
    pub email_rfq: bool,
    pub push_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_connections: true,
            email_messages: true,
            email_rfq: true,
            push_enabled: true,
        }
    }
}

/// Partial preference update. Absent fields keep their stored value
/// (or the default `true` if the user has no row yet).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferencesPatch {
    pub email_connections: Option<bool>,
    pub email_messages: Option<bool>,
    pub email_rfq: Option<bool>,
    pub push_enabled: Option<bool>,
}
