use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the events of one room after checking that the room exists.
///
/// Returns the receiver and the handshake to send first.
pub async fn subscribe_room(
    state: &SharedState,
    room_id: Uuid,
) -> Result<(broadcast::Receiver<ServerEvent>, ServerEvent), ServiceError> {
    let store = state.require_room_store().await?;
    if store.find_room(room_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("room `{room_id}`")));
    }

    // Subscribe before building the handshake so no event slips between the two.
    let receiver = state.events().subscribe();
    let handshake = ServerEvent::json(
        room_id,
        Some(EVENT_HANDSHAKE.to_string()),
        &Handshake {
            room_id,
            message: "room stream connected".into(),
            degraded: state.is_degraded(),
        },
    )
    .map_err(|err| ServiceError::Internal(format!("failed to serialize handshake: {err}")))?;

    Ok((receiver, handshake))
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a broadcast receiver into an SSE response that only forwards events of `room_id`,
/// preceded by `handshake`.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    room_id: Uuid,
    handshake: ServerEvent,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) if payload.room_id == room_id => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(%room_id, skipped, "room SSE subscriber lagged; events dropped");
                            continue;
                        }
                    }
                }
            }
        }

        info!(%room_id, "room SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
