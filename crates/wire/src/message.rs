use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, UserId};

/// The author identity attached to every message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Identity of the user.
    pub id: UserId,
    /// Name shown next to the message.
    pub display_name: String,
    /// Contact address of the user, usually an email.
    pub contact: String,
}

/// A file attached to a message, referenced by its durable URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Durable URL of the stored file.
    pub url: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// Size of the file in bytes.
    pub byte_len: u64,
}

/// A voice clip attached to a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceNote {
    /// Durable URL of the stored clip.
    pub url: String,
    /// Length of the clip in whole seconds.
    pub duration_secs: u32,
    /// File name the clip was stored under.
    pub file_name: String,
}

/// A denormalized pointer to the message being replied to.
///
/// Carries enough data to render the quoted header without a follow-up
/// fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    /// Identity of the quoted message.
    pub id: MessageId,
    /// Display name of the quoted message's author.
    pub author_name: String,
    /// A short excerpt of the quoted message.
    pub excerpt: String,
}

/// A delivered message as observed by the client.
///
/// A meaningful message carries exactly one of body, attachment, or
/// voice note; a body may additionally carry a reply pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned identity.
    pub id: MessageId,
    /// Author of the message.
    pub author: UserRef,
    /// Text body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// File attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Voice note, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceNote>,
    /// Pointer to the message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
    /// Server-issued creation timestamp, opaque to the client.
    pub created_at: String,
}

/// The outbound payload for creating a message.
///
/// The server assigns the id, the author (from the caller's session),
/// and the timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Text body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// File attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Voice note, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceNote>,
    /// Pointer to the message this one replies to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_names_are_camel_case() {
        let json = serde_json::json!({
            "id": "m1",
            "author": {
                "id": "u1",
                "displayName": "Dana",
                "contact": "dana@example.com",
            },
            "voice": {
                "url": "https://blobs/v1",
                "durationSecs": 4,
                "fileName": "voice-note.webm",
            },
            "replyTo": {
                "id": "m0",
                "authorName": "Remy",
                "excerpt": "before",
            },
            "createdAt": "2024-05-01T10:00:00Z",
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert_eq!(message.id, MessageId::from("m1"));
        assert_eq!(message.author.id, UserId::from("u1"));
        assert_eq!(message.body, None);
        assert_eq!(message.voice.as_ref().unwrap().duration_secs, 4);
        assert_eq!(
            message.reply_to.as_ref().unwrap().author_name,
            "Remy"
        );
    }

    #[test]
    fn test_new_message_omits_empty_fields() {
        let message = NewMessage {
            body: Some("hi".to_owned()),
            ..Default::default()
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({ "body": "hi" }));
    }
}
