//! End-to-end engine behavior against scripted collaborators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use huddle_engine::{
    Channel, ChatClient, ClientBuilder, MAX_UPLOAD_BYTES, Notice,
    PolicyViolation, RecorderUpdate, SessionSnapshot, Viewport,
};
use huddle_test_kit::{
    MemoryApi, MemoryBlobStore, ScriptedChannel, ScriptedMic,
};
use huddle_wire::{
    ChatApi, ClientHint, ConversationId, MediaKind, Message, MessageId,
    RoomEvent, UserId, UserRef, WorkItemId,
};
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn remote_author() -> UserRef {
    UserRef {
        id: UserId::from("u-remote"),
        display_name: "Remy".to_owned(),
        contact: "remy@example.com".to_owned(),
    }
}

fn remote_message(id: &str, body: &str) -> Message {
    Message {
        id: MessageId::from(id),
        author: remote_author(),
        body: Some(body.to_owned()),
        attachment: None,
        voice: None,
        reply_to: None,
        created_at: "2024-05-01T10:00:00Z".to_owned(),
    }
}

fn near_bottom() -> Viewport {
    Viewport {
        scroll_top: 900.0,
        scroll_height: 1000.0,
        client_height: 80.0,
    }
}

fn scrolled_up() -> Viewport {
    Viewport {
        scroll_top: 100.0,
        scroll_height: 1000.0,
        client_height: 80.0,
    }
}

struct Harness {
    client: ChatClient,
    api: MemoryApi,
    blobs: MemoryBlobStore,
    channel: ScriptedChannel,
    mic: ScriptedMic,
    session_rx: watch::Receiver<(u64, Option<SessionSnapshot>)>,
    recorder_rx: watch::Receiver<RecorderUpdate>,
    notices: Arc<Mutex<Vec<Notice>>>,
    notice_rx: watch::Receiver<u64>,
    notice_cursor: u64,
    scrolls: Arc<AtomicU32>,
}

async fn start(mic: ScriptedMic) -> Harness {
    let api = MemoryApi::new();
    let blobs = MemoryBlobStore::new();
    let script = ScriptedChannel::new();
    let (channel, events) =
        Channel::open(&script).await.expect("scripted connect");

    let (session_tx, session_rx) = watch::channel((0u64, None));
    let (recorder_tx, recorder_rx) = watch::channel(RecorderUpdate::Idle);
    let notices = Arc::new(Mutex::new(Vec::<Notice>::new()));
    let (notice_tx, notice_rx) = watch::channel(0u64);
    let scrolls = Arc::new(AtomicU32::new(0));

    let client =
        ClientBuilder::new(api.clone(), blobs.clone(), channel, events)
            .with_mic(mic.clone())
            .on_session(move |snapshot| {
                session_tx.send_modify(|(count, slot)| {
                    *count += 1;
                    *slot = Some(snapshot);
                });
            })
            .on_recorder(move |update| {
                recorder_tx.send(update).ok();
            })
            .on_notice({
                let notices = Arc::clone(&notices);
                move |notice| {
                    notices.lock().unwrap().push(notice);
                    notice_tx.send_modify(|count| *count += 1);
                }
            })
            .on_scroll_to_bottom({
                let scrolls = Arc::clone(&scrolls);
                move || {
                    scrolls.fetch_add(1, Ordering::Relaxed);
                }
            })
            .build();

    Harness {
        client,
        api,
        blobs,
        channel: script,
        mic,
        session_rx,
        recorder_rx,
        notices,
        notice_rx,
        notice_cursor: 0,
        scrolls,
    }
}

impl Harness {
    async fn open(&mut self, work_item: &str) -> ConversationId {
        let work_item = WorkItemId::from(work_item);
        self.client.open_conversation(work_item.clone());
        let snapshot = self
            .wait_session(|s| {
                s.conversation
                    .as_ref()
                    .is_some_and(|c| c.work_item == work_item)
            })
            .await;
        snapshot.conversation.unwrap().id
    }

    async fn wait_session(
        &mut self,
        pred: impl Fn(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let guard = timeout(
            WAIT,
            self.session_rx.wait_for(|(_, snapshot)| {
                snapshot.as_ref().is_some_and(&pred)
            }),
        )
        .await
        .expect("timed out waiting for a session update")
        .unwrap();
        guard.1.clone().unwrap()
    }

    async fn wait_recorder(
        &mut self,
        pred: impl Fn(&RecorderUpdate) -> bool,
    ) -> RecorderUpdate {
        *timeout(WAIT, self.recorder_rx.wait_for(pred))
            .await
            .expect("timed out waiting for a recorder update")
            .unwrap()
    }

    async fn next_notice(&mut self) -> Notice {
        let target = self.notice_cursor + 1;
        timeout(
            WAIT,
            self.notice_rx.wait_for(|count| *count >= target),
        )
        .await
        .expect("timed out waiting for a notice")
        .unwrap();
        self.notice_cursor = target;
        self.notices.lock().unwrap()[(target - 1) as usize].clone()
    }

    /// Round-trips through the actor so every command posted before
    /// this call has been handled when it returns.
    async fn flush(&mut self) {
        let seen = self.session_rx.borrow().0;
        self.client.set_reply_target(None);
        timeout(
            WAIT,
            self.session_rx.wait_for(|(count, _)| *count > seen),
        )
        .await
        .expect("timed out flushing the actor")
        .unwrap();
    }

    async fn wait_device_released(&self) {
        timeout(WAIT, async {
            while !self.mic.device_released() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("the device was not released");
    }
}

#[tokio::test(start_paused = true)]
async fn test_switching_conversations_reuses_the_connection() {
    let mut h = start(ScriptedMic::default()).await;
    let first = h.open("w1").await;
    let second = h.open("w2").await;

    assert_ne!(first, second);
    h.channel.wait_for_join(&second).await;
    assert_eq!(h.channel.joined_rooms(), vec![first, second]);
    assert_eq!(h.channel.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hydrate_replaces_the_cache() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h
        .api
        .get_or_create_conversation(&WorkItemId::from("w1"))
        .await
        .unwrap();
    h.api.seed_messages(
        &conversation.id,
        vec![
            remote_message("m1", "already here"),
            remote_message("m2", "also here"),
        ],
    );

    let opened = h.open("w1").await;
    assert_eq!(opened, conversation.id);
    let snapshot = h.wait_session(|s| s.messages.len() == 2).await;
    assert_eq!(
        snapshot.messages[0].body.as_deref(),
        Some("already here")
    );
}

#[tokio::test(start_paused = true)]
async fn test_events_apply_in_arrival_order() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    h.channel.push(RoomEvent::Created(remote_message("m1", "one")));
    h.channel.push(RoomEvent::Created(remote_message("m2", "two")));
    h.channel
        .push(RoomEvent::Updated(remote_message("m1", "one, edited")));
    h.channel.push(RoomEvent::Deleted(MessageId::from("m2")));

    let snapshot = h
        .wait_session(|s| {
            s.messages.len() == 1
                && s.messages[0].body.as_deref() == Some("one, edited")
        })
        .await;
    assert_eq!(snapshot.messages[0].id, MessageId::from("m1"));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_delivery_is_deduplicated() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    h.channel.push(RoomEvent::Created(remote_message("m1", "hi")));
    h.channel.push(RoomEvent::Created(remote_message("m1", "hi")));
    h.channel.push(RoomEvent::Created(remote_message("m2", "yo")));

    let snapshot = h.wait_session(|s| s.messages.len() == 2).await;
    assert_eq!(snapshot.messages[0].id, MessageId::from("m1"));
    assert_eq!(snapshot.messages[1].id, MessageId::from("m2"));
}

#[tokio::test(start_paused = true)]
async fn test_reply_send_carries_pointer_and_clears_it() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;
    h.channel
        .push(RoomEvent::Created(remote_message("m9", "original")));
    h.wait_session(|s| s.messages.len() == 1).await;

    h.client.set_reply_target(Some(MessageId::from("m9")));
    h.wait_session(|s| s.reply_target.is_some()).await;
    h.client.set_draft("ack");
    h.client.send_draft();

    let hints = h.channel.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    assert_eq!(message.body.as_deref(), Some("ack"));
    let reply_to = message.reply_to.as_ref().unwrap();
    assert_eq!(reply_to.id, MessageId::from("m9"));
    assert_eq!(reply_to.author_name, "Remy");
    assert_eq!(reply_to.excerpt, "original");

    // The pointer is cleared only after the send succeeded.
    h.wait_session(|s| s.reply_target.is_none()).await;
}

#[tokio::test(start_paused = true)]
async fn test_empty_send_is_rejected_without_network() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.client.set_draft("   ");
    h.client.send_draft();
    assert!(matches!(h.next_notice().await, Notice::EmptyMessage));
    assert!(h.api.messages_in(&conversation).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_send_preserves_the_draft() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.api.fail_next_create();
    h.client.set_draft("important words");
    h.client.send_draft();
    assert!(matches!(
        h.next_notice().await,
        Notice::SendFailed { .. }
    ));
    assert!(h.api.messages_in(&conversation).is_empty());

    // Retrying sends the same preserved draft.
    h.client.send_draft();
    let hints = h.channel.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    assert_eq!(message.body.as_deref(), Some("important words"));
}

#[tokio::test(start_paused = true)]
async fn test_attachment_upload_then_create() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.client.send_attachment(
        "diagram.png",
        "image/png",
        Bytes::from_static(b"pretend this is a png"),
    );

    let hints = h.channel.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    let attachment = message.attachment.as_ref().unwrap();
    assert_eq!(attachment.file_name, "diagram.png");
    assert!(attachment.url.starts_with("https://blobs.test/chat-files/"));
    assert_eq!(h.blobs.upload_count(), 1);
    assert_eq!(h.api.messages_in(&conversation).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_attachment_type_is_validated_before_upload() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    h.client.send_attachment(
        "payload.zip",
        "application/zip",
        Bytes::from_static(b"zip zip"),
    );
    assert!(matches!(
        h.next_notice().await,
        Notice::UploadRejected(PolicyViolation::UnsupportedType { .. })
    ));
    assert_eq!(h.blobs.upload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_attachment_size_is_validated_before_upload() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    let oversized = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
    h.client
        .send_attachment("huge.png", "image/png", Bytes::from(oversized));
    assert!(matches!(
        h.next_notice().await,
        Notice::UploadRejected(PolicyViolation::TooLarge { .. })
    ));
    assert_eq!(h.blobs.upload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_is_surfaced_and_not_retried() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.blobs.fail_next();
    h.client.send_attachment(
        "photo.png",
        "image/png",
        Bytes::from_static(b"bits"),
    );
    assert!(matches!(
        h.next_notice().await,
        Notice::UploadFailed { .. }
    ));

    // Give a would-be retry every chance to show up.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.blobs.upload_count(), 0);
    assert!(h.api.messages_in(&conversation).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pending_upload_does_not_leak_into_next_conversation() {
    let mut h = start(ScriptedMic::default()).await;
    let first = h.open("w1").await;

    h.blobs.set_delay(Duration::from_secs(3));
    h.client.send_attachment(
        "slow.png",
        "image/png",
        Bytes::from_static(b"slow bits"),
    );

    // Switch away while the upload is still in flight.
    let second = h.open("w2").await;
    let hints = h.channel.wait_for_emits(1).await;

    // The finished send lands in the conversation it was started in.
    let ClientHint::Send { conversation, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    assert_eq!(*conversation, first);
    assert_eq!(h.api.messages_in(&first).len(), 1);
    assert!(h.api.messages_in(&second).is_empty());

    // And the active view's cache never saw it.
    let snapshot = h.wait_session(|s| s.conversation.is_some()).await;
    assert_eq!(snapshot.conversation.unwrap().id, second);
    assert!(snapshot.messages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_goes_through_the_durable_path() {
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.client.set_draft("delete me");
    h.client.send_draft();
    let hints = h.channel.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    let message = message.clone();
    h.channel.push(RoomEvent::Created(message.clone()));
    h.wait_session(|s| s.messages.len() == 1).await;

    h.client.delete_message(message.id.clone());
    let hints = h.channel.wait_for_emits(2).await;
    assert!(matches!(&hints[1], ClientHint::Delete { message: id, .. }
        if *id == message.id));
    assert!(h.api.messages_in(&conversation).is_empty());

    // The cache entry goes away with the echo, like on every client.
    h.channel.push(RoomEvent::Deleted(message.id));
    h.wait_session(|s| s.messages.is_empty()).await;
}

#[tokio::test(start_paused = true)]
async fn test_delete_failure_is_surfaced() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    h.api.fail_next_delete();
    h.client.delete_message(MessageId::from("m1"));
    assert!(matches!(
        h.next_notice().await,
        Notice::DeleteFailed { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_new_message_only_scrolls_when_following() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;
    // Opening a conversation always lands at the bottom.
    assert_eq!(h.scrolls.load(Ordering::Relaxed), 1);

    h.client.set_viewport(scrolled_up());
    h.flush().await;
    h.channel.push(RoomEvent::Created(remote_message("m1", "one")));
    h.wait_session(|s| s.messages.len() == 1).await;
    assert_eq!(h.scrolls.load(Ordering::Relaxed), 1);

    h.client.set_viewport(near_bottom());
    h.flush().await;
    h.channel.push(RoomEvent::Created(remote_message("m2", "two")));
    h.wait_session(|s| s.messages.len() == 2).await;
    assert_eq!(h.scrolls.load(Ordering::Relaxed), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_recording_releases_everything() {
    let mic = ScriptedMic::with_chunks([
        Bytes::from_static(b"chunk-a"),
        Bytes::from_static(b"chunk-b"),
    ]);
    let mut h = start(mic).await;
    let conversation = h.open("w1").await;

    h.client.begin_recording();
    h.wait_recorder(|update| {
        matches!(update, RecorderUpdate::Recording { elapsed_secs } if *elapsed_secs >= 3)
    })
    .await;

    h.client.cancel_recording();
    h.wait_recorder(|update| matches!(update, RecorderUpdate::Idle))
        .await;
    h.wait_device_released().await;

    // No upload, no create, no hint: the take simply never happened.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.blobs.upload_count(), 0);
    assert!(h.api.messages_in(&conversation).is_empty());
    assert!(h.channel.emitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_silent_recording_is_an_implicit_cancel() {
    // A device that never produces a chunk.
    let mut h = start(ScriptedMic::default()).await;
    let conversation = h.open("w1").await;

    h.client.begin_recording();
    h.wait_recorder(|update| {
        matches!(update, RecorderUpdate::Recording { elapsed_secs } if *elapsed_secs >= 2)
    })
    .await;
    h.client.finish_recording();

    assert!(matches!(
        h.next_notice().await,
        Notice::RecordingTooShort
    ));
    h.wait_recorder(|update| matches!(update, RecorderUpdate::Idle))
        .await;
    h.wait_device_released().await;
    assert_eq!(h.blobs.upload_count(), 0);
    assert!(h.api.messages_in(&conversation).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_denied_microphone_surfaces_and_returns_to_idle() {
    let mic = ScriptedMic::default();
    mic.deny_access();
    let mut h = start(mic).await;
    h.open("w1").await;

    h.client.begin_recording();
    assert!(matches!(
        h.next_notice().await,
        Notice::MicrophoneUnavailable { .. }
    ));
    h.wait_recorder(|update| matches!(update, RecorderUpdate::Idle))
        .await;
    assert_eq!(h.mic.open_count(), 0);
    assert_eq!(h.blobs.upload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_finished_recording_becomes_a_voice_note() {
    let mic = ScriptedMic::with_chunks([
        Bytes::from_static(b"voice-"),
        Bytes::from_static(b"data"),
    ]);
    let mut h = start(mic).await;
    let conversation = h.open("w1").await;

    h.client.begin_recording();
    h.wait_recorder(|update| {
        matches!(update, RecorderUpdate::Recording { elapsed_secs } if *elapsed_secs >= 2)
    })
    .await;
    h.client.finish_recording();

    let hints = h.channel.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    let voice = message.voice.as_ref().unwrap();
    assert!(voice.url.starts_with("https://blobs.test/voice-notes/"));
    assert!(voice.duration_secs >= 2);

    let uploads = h.blobs.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, MediaKind::VoiceNote);
    assert_eq!(uploads[0].2, b"voice-data".len());

    assert_eq!(h.api.messages_in(&conversation).len(), 1);
    h.wait_recorder(|update| matches!(update, RecorderUpdate::Idle))
        .await;
    h.wait_device_released().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_voice_upload_loses_the_clip() {
    let mic = ScriptedMic::with_chunks([Bytes::from_static(b"voice")]);
    let mut h = start(mic).await;
    let conversation = h.open("w1").await;

    h.blobs.fail_next();
    h.client.begin_recording();
    h.wait_recorder(|update| {
        matches!(update, RecorderUpdate::Recording { elapsed_secs } if *elapsed_secs >= 2)
    })
    .await;
    h.client.finish_recording();

    assert!(matches!(
        h.next_notice().await,
        Notice::UploadFailed { .. }
    ));
    h.wait_recorder(|update| matches!(update, RecorderUpdate::Idle))
        .await;

    // Nothing was sent and nothing is retried; the user records again.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.blobs.upload_count(), 0);
    assert!(h.api.messages_in(&conversation).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_degrades_with_a_notice() {
    let mut h = start(ScriptedMic::default()).await;
    h.open("w1").await;

    h.channel.close();
    assert!(matches!(
        h.next_notice().await,
        Notice::ChannelDown { .. }
    ));
}
