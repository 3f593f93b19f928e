use huddle_wire::{ConversationId, Message, MessageId};
use serde::{Deserialize, Serialize};

/// Frames the client writes to the socket.
#[derive(Debug, Serialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub(crate) enum ClientFrame {
    JoinRoom {
        conversation_id: ConversationId,
    },
    SendMessage {
        conversation_id: ConversationId,
        message: Message,
    },
    DeleteMessage {
        conversation_id: ConversationId,
        message_id: MessageId,
    },
}

/// Frames the server fans out to room members.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub(crate) enum ServerFrame {
    MessageCreated { message: Message },
    MessageUpdated { message: Message },
    MessageDeleted { message_id: MessageId },
    // Newer servers may fan out event types we don't know about.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use huddle_wire::{UserId, UserRef};

    use super::*;

    fn message(id: &str) -> Message {
        Message {
            id: MessageId::from(id),
            author: UserRef {
                id: UserId::from("u1"),
                display_name: "Dana".to_owned(),
                contact: "dana@example.com".to_owned(),
            },
            body: Some("hello".to_owned()),
            attachment: None,
            voice: None,
            reply_to: None,
            created_at: "2024-05-01T10:00:00Z".to_owned(),
        }
    }

    #[test]
    fn test_join_room_frame_shape() {
        let frame = ClientFrame::JoinRoom {
            conversation_id: ConversationId::from("c1"),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "join-room",
                "conversationId": "c1",
            })
        );
    }

    #[test]
    fn test_created_frame_roundtrip() {
        let json = serde_json::json!({
            "type": "message-created",
            "message": {
                "id": "m1",
                "author": {
                    "id": "u1",
                    "displayName": "Dana",
                    "contact": "dana@example.com",
                },
                "body": "hello",
                "createdAt": "2024-05-01T10:00:00Z",
            },
        });
        let frame: ServerFrame = serde_json::from_value(json).unwrap();
        match frame {
            ServerFrame::MessageCreated { message: got } => {
                assert_eq!(got, message("m1"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_frame_tolerated() {
        let json = serde_json::json!({ "type": "user-typing" });
        let frame: ServerFrame = serde_json::from_value(json).unwrap();
        assert!(matches!(frame, ServerFrame::Unknown));
    }
}
