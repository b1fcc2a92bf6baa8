use serde::{Deserialize, Serialize};

/// Closed set of notification categories. Stored in SQLite as the
/// snake_case string form (`profile_view`, `rfq`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Connection,
    Message,
    Rfq,
    ProfileView,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Message => "message",
            Self::Rfq => "rfq",
            Self::ProfileView => "profile_view",
            Self::System => "system",
        }
    }

    /// Parse the stored string form. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "connection" => Some(Self::Connection),
            "message" => Some(Self::Message),
            "rfq" => Some(Self::Rfq),
            "profile_view" => Some(Self::ProfileView),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in [
            NotificationKind::Connection,
            NotificationKind::Message,
            NotificationKind::Rfq,
            NotificationKind::ProfileView,
            NotificationKind::System,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(NotificationKind::parse("push"), None);
        assert_eq!(NotificationKind::parse(""), None);
    }
}
