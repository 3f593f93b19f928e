use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use huddle_wire::{
    ChannelErrorKind, ClientHint, ConversationId, RoomEvent, RoomEvents,
    RoomSender,
};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::Error;
use crate::frames::{ClientFrame, ServerFrame};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) fn split(socket: Socket) -> (SocketSender, SocketEvents) {
    let (sink, stream) = socket.split();
    (SocketSender { sink }, SocketEvents { stream })
}

/// The outbound half of a WebSocket event channel.
pub struct SocketSender {
    sink: SplitSink<Socket, WsMessage>,
}

impl SocketSender {
    async fn send_frame(&mut self, frame: &ClientFrame) -> Result<(), Error> {
        let text = serde_json::to_string(frame).map_err(|err| {
            Error::new(format!("{err}"), ChannelErrorKind::Protocol)
        })?;
        trace!("sending frame: {text}");
        self.sink
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|err| {
                Error::new(format!("{err}"), ChannelErrorKind::Transport)
            })
    }
}

impl RoomSender for SocketSender {
    type Error = Error;

    async fn join(&mut self, room: &ConversationId) -> Result<(), Error> {
        self.send_frame(&ClientFrame::JoinRoom {
            conversation_id: room.clone(),
        })
        .await
    }

    async fn emit(&mut self, hint: ClientHint) -> Result<(), Error> {
        let frame = match hint {
            ClientHint::Send {
                conversation,
                message,
            } => ClientFrame::SendMessage {
                conversation_id: conversation,
                message,
            },
            ClientHint::Delete {
                conversation,
                message,
            } => ClientFrame::DeleteMessage {
                conversation_id: conversation,
                message_id: message,
            },
        };
        self.send_frame(&frame).await
    }
}

/// The inbound half of a WebSocket event channel.
pub struct SocketEvents {
    stream: SplitStream<Socket>,
}

impl RoomEvents for SocketEvents {
    type Error = Error;

    async fn next_event(&mut self) -> Result<Option<RoomEvent>, Error> {
        loop {
            let Some(frame) = self.stream.next().await else {
                return Ok(None);
            };
            let frame = frame.map_err(|err| {
                Error::new(format!("{err}"), ChannelErrorKind::Transport)
            })?;

            let text = match frame {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => return Ok(None),
                // Pings are answered by the protocol layer; nothing
                // else carries events.
                _ => continue,
            };
            trace!("got frame: {text}");

            let frame = serde_json::from_str::<ServerFrame>(text.as_str())
                .map_err(|err| {
                    Error::new(format!("{err}"), ChannelErrorKind::Protocol)
                })?;
            let event = match frame {
                ServerFrame::MessageCreated { message } => {
                    RoomEvent::Created(message)
                }
                ServerFrame::MessageUpdated { message } => {
                    RoomEvent::Updated(message)
                }
                ServerFrame::MessageDeleted { message_id } => {
                    RoomEvent::Deleted(message_id)
                }
                ServerFrame::Unknown => {
                    debug!("skipping unrecognized frame");
                    continue;
                }
            };
            return Ok(Some(event));
        }
    }
}
