//! Turns user input into outbound create payloads.
//!
//! A single message carries at most one of body (with an optional reply
//! pointer), attachment, or voice note; the three build paths here keep
//! that invariant by construction.

use huddle_wire::{
    Attachment, BlobRef, NewMessage, ReplyPreview, VoiceNote,
};

/// The engine-owned draft of the next text message.
///
/// The draft survives failed sends so the user can retry, and is only
/// cleared once the service accepts the message.
#[derive(Default)]
pub(crate) struct Composer {
    draft: String,
}

impl Composer {
    #[inline]
    pub(crate) fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.draft.clear();
    }

    /// Builds a text message, or `None` when there is nothing to send.
    ///
    /// A send needs a non-blank body or a reply pointer; a bare reply
    /// without text is allowed.
    pub(crate) fn build_text(
        &self,
        reply_to: Option<ReplyPreview>,
    ) -> Option<NewMessage> {
        let body = self.draft.trim();
        if body.is_empty() && reply_to.is_none() {
            return None;
        }
        Some(NewMessage {
            body: (!body.is_empty()).then(|| body.to_owned()),
            reply_to,
            ..Default::default()
        })
    }
}

pub(crate) fn attachment_message(
    blob: BlobRef,
    file_name: String,
    mime_type: String,
    byte_len: u64,
) -> NewMessage {
    NewMessage {
        attachment: Some(Attachment {
            url: blob.url,
            file_name,
            mime_type,
            byte_len,
        }),
        ..Default::default()
    }
}

pub(crate) fn voice_message(
    blob: BlobRef,
    file_name: String,
    duration_secs: u32,
) -> NewMessage {
    NewMessage {
        voice: Some(VoiceNote {
            url: blob.url,
            duration_secs,
            file_name,
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use huddle_wire::MessageId;

    use super::*;

    fn reply() -> ReplyPreview {
        ReplyPreview {
            id: MessageId::from("m1"),
            author_name: "ana".to_owned(),
            excerpt: "original".to_owned(),
        }
    }

    #[test]
    fn test_blank_draft_without_reply_is_rejected() {
        let mut composer = Composer::default();
        assert!(composer.build_text(None).is_none());
        composer.set_draft("   \n\t ");
        assert!(composer.build_text(None).is_none());
    }

    #[test]
    fn test_bare_reply_is_allowed() {
        let composer = Composer::default();
        let message = composer.build_text(Some(reply())).unwrap();
        assert_eq!(message.body, None);
        assert_eq!(message.reply_to.unwrap().id, MessageId::from("m1"));
    }

    #[test]
    fn test_body_is_trimmed() {
        let mut composer = Composer::default();
        composer.set_draft("  ack  ");
        let message = composer.build_text(Some(reply())).unwrap();
        assert_eq!(message.body.as_deref(), Some("ack"));
        assert!(message.attachment.is_none());
        assert!(message.voice.is_none());
    }
}
