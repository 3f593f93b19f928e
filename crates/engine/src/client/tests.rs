use std::time::Duration;

use huddle_test_kit::{MemoryApi, MemoryBlobStore, ScriptedChannel};
use huddle_wire::{ClientHint, RoomEvent, WorkItemId};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::client::ClientBuilder;
use crate::connection::Channel;
use crate::session::SessionSnapshot;

#[tokio::test]
async fn test_open_send_and_echo() {
    let api = MemoryApi::new();
    let script = ScriptedChannel::new();
    let (channel, events) = Channel::open(&script).await.unwrap();

    let (session_tx, mut session_rx) =
        watch::channel::<Option<SessionSnapshot>>(None);
    let client = ClientBuilder::new(
        api.clone(),
        MemoryBlobStore::new(),
        channel,
        events,
    )
    .on_session(move |snapshot| {
        session_tx.send(Some(snapshot)).ok();
    })
    .build();

    client.open_conversation(WorkItemId::from("w1"));
    let conversation = timeout(
        Duration::from_secs(5),
        session_rx.wait_for(|snapshot| {
            snapshot
                .as_ref()
                .is_some_and(|s| s.conversation.is_some())
        }),
    )
    .await
    .unwrap()
    .unwrap()
    .clone()
    .unwrap()
    .conversation
    .unwrap();

    client.set_draft("hello room");
    client.send_draft();

    // The durable write is echoed back to the room; only then does it
    // show in the cache.
    let hints = script.wait_for_emits(1).await;
    let ClientHint::Send { message, .. } = &hints[0] else {
        panic!("expected a send hint");
    };
    assert_eq!(message.body.as_deref(), Some("hello room"));
    assert_eq!(api.messages_in(&conversation.id).len(), 1);

    script.push(RoomEvent::Created(message.clone()));
    timeout(
        Duration::from_secs(5),
        session_rx.wait_for(|snapshot| {
            snapshot.as_ref().is_some_and(|s| s.messages.len() == 1)
        }),
    )
    .await
    .unwrap()
    .unwrap();

    client.close();
}
