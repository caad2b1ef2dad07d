use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === Account models ===

/// A registered account. `password_hash` never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Account view returned by `/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub created_at: i64,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

/// Contact list entry returned by `/get-all-user/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub avatar: String,
}

// === Message models ===

/// The two users a message is exchanged between, in send orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub from: String,
    pub to: String,
}

impl Participants {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.from == user_id || self.to == user_id
    }
}

/// A persisted message. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub uuid: String,
    pub sender: String,
    pub participants: Participants,
    pub body: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Render this message from `viewer`'s side of the conversation.
    pub fn history_entry(&self, viewer: &str) -> HistoryEntry {
        HistoryEntry {
            from_self: self.sender == viewer,
            message: self.body.clone(),
            created_at: self.created_at,
            image: self.image.clone(),
        }
    }
}

/// One row of `/get-message` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub from_self: bool,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
}

/// Convert a stored unix-millis column back into a timestamp.
pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> StoredMessage {
        let at = millis_to_datetime(1_700_000_000_000);
        StoredMessage {
            id: 1,
            uuid: "m-1".into(),
            sender: "u1".into(),
            participants: Participants::new("u1", "u2"),
            body: Some("hi".into()),
            image: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn participants_contains_both_sides() {
        let a = Participants::new("u1", "u2");
        assert!(a.contains("u1"));
        assert!(a.contains("u2"));
        assert!(!a.contains("u3"));
    }

    #[test]
    fn history_entry_from_self_depends_on_viewer() {
        let msg = sample_message();
        assert!(msg.history_entry("u1").from_self);
        assert!(!msg.history_entry("u2").from_self);
    }

    #[test]
    fn history_entry_serializes_camel_case() {
        let json = serde_json::to_value(sample_message().history_entry("u2")).unwrap();
        assert_eq!(json["fromSelf"], false);
        assert_eq!(json["message"], "hi");
        assert!(json["image"].is_null());
        assert!(json["createdAt"].as_str().unwrap().starts_with("2023-11-14"));
    }

    #[test]
    fn public_user_hides_password() {
        let user = User {
            id: "u1".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            avatar: "a.png".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: 1,
            updated_at: 1,
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["_id"], "u1");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
