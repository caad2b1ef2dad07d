//! WebSocket Protocol Types
//!
//! Every frame is a JSON text message of the form `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

/// One announced user and the connection it is reachable on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub user_id: String,
    pub session_id: String,
}

/// A chat message as relayed between clients.
///
/// The same shape is used inbound (`sent-message`) and outbound (`receive-message`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub from_self: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Messages sent FROM the client TO the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce which user this connection belongs to
    AddUser(String),
    /// Relay a message to another user's live session
    SentMessage(DirectMessage),
    /// Leave the online set
    Logout(String),
}

/// Messages sent FROM the server TO the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Full presence snapshot, pushed to every connection after each change
    OnlineUsers(Vec<OnlineUser>),
    /// A message relayed from another user
    ReceiveMessage(DirectMessage),
    /// The last client event was rejected
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_user_parses() {
        let json = r#"{"event":"add-user","data":"u1"}"#;
        match serde_json::from_str::<ClientEvent>(json).unwrap() {
            ClientEvent::AddUser(id) => assert_eq!(id, "u1"),
            other => panic!("Expected AddUser, got {other:?}"),
        }
    }

    #[test]
    fn test_logout_parses() {
        let json = r#"{"event":"logout","data":"u1"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(json).unwrap(),
            ClientEvent::Logout(id) if id == "u1"
        ));
    }

    #[test]
    fn test_sent_message_with_all_fields() {
        let json = r#"{"event":"sent-message","data":{
            "to":"u2","from":"u1","message":"hi","image":"","fromSelf":true,
            "createdAt":"2024-01-01T00:00:00Z"}}"#;
        match serde_json::from_str::<ClientEvent>(json).unwrap() {
            ClientEvent::SentMessage(msg) => {
                assert_eq!(msg.to, "u2");
                assert_eq!(msg.from, "u1");
                assert_eq!(msg.message.as_deref(), Some("hi"));
                assert_eq!(msg.image.as_deref(), Some(""));
                assert!(msg.from_self);
                assert_eq!(msg.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
            }
            other => panic!("Expected SentMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_sent_message_minimal() {
        let json = r#"{"event":"sent-message","data":{"to":"u2","image":"cat.png"}}"#;
        match serde_json::from_str::<ClientEvent>(json).unwrap() {
            ClientEvent::SentMessage(msg) => {
                assert_eq!(msg.to, "u2");
                assert!(msg.from.is_empty());
                assert!(msg.message.is_none());
                assert!(!msg.from_self);
                assert!(msg.created_at.is_none());
            }
            other => panic!("Expected SentMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_rejected() {
        let json = r#"{"event":"join-room","data":"lobby"}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn test_online_users_serialization() {
        let event = ServerEvent::OnlineUsers(vec![
            OnlineUser {
                user_id: "u1".into(),
                session_id: "sA".into(),
            },
            OnlineUser {
                user_id: "u2".into(),
                session_id: "sB".into(),
            },
        ]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "online-users");
        assert_eq!(json["data"][0]["userId"], "u1");
        assert_eq!(json["data"][1]["sessionId"], "sB");
    }

    #[test]
    fn test_receive_message_serialization() {
        let event = ServerEvent::ReceiveMessage(DirectMessage {
            to: "u2".into(),
            from: "u1".into(),
            message: Some("hi".into()),
            image: None,
            from_self: false,
            created_at: Some("2024-01-01T00:00:00Z".into()),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "receive-message");
        assert_eq!(json["data"]["fromSelf"], false);
        assert_eq!(json["data"]["message"], "hi");
        assert_eq!(json["data"]["to"], "u2");
    }

    #[test]
    fn test_error_serialization() {
        let event = ServerEvent::Error {
            message: "announce a user id first".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["data"]["message"], "announce a user id first");
    }
}
