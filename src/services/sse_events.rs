use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{ParticipantEntity, RoomStatus, ScoreEntity},
    dto::sse::{
        ParticipantJoinedEvent, ParticipantReadyEvent, RoomStatusChangedEvent, ScoreRecordedEvent,
        ServerEvent,
    },
    state::SharedState,
};

const EVENT_PARTICIPANT_JOINED: &str = "participant.joined";
const EVENT_PARTICIPANT_READY: &str = "participant.ready";
const EVENT_ROOM_STATUS_CHANGED: &str = "room.status_changed";
const EVENT_SCORE_RECORDED: &str = "score.recorded";

/// Broadcast that a new player joined the room.
pub fn broadcast_participant_joined(
    state: &SharedState,
    participant: ParticipantEntity,
    participant_count: usize,
) {
    let room_id = participant.room_id;
    let payload = ParticipantJoinedEvent {
        participant: participant.into(),
        participant_count,
    };
    send_room_event(state, room_id, EVENT_PARTICIPANT_JOINED, &payload);
}

/// Broadcast that a participant marked themselves ready.
pub fn broadcast_participant_ready(
    state: &SharedState,
    participant: ParticipantEntity,
    ready_count: usize,
    participant_count: usize,
) {
    let room_id = participant.room_id;
    let payload = ParticipantReadyEvent {
        participant: participant.into(),
        ready_count,
        participant_count,
    };
    send_room_event(state, room_id, EVENT_PARTICIPANT_READY, &payload);
}

/// Broadcast a lifecycle transition of the room.
pub fn broadcast_status_changed(
    state: &SharedState,
    room_id: Uuid,
    status: RoomStatus,
    game_id: Option<Uuid>,
) {
    let payload = RoomStatusChangedEvent { status, game_id };
    send_room_event(state, room_id, EVENT_ROOM_STATUS_CHANGED, &payload);
}

/// Broadcast a freshly written score row to the room that owns the game.
pub fn broadcast_score_recorded(state: &SharedState, room_id: Uuid, score: ScoreEntity) {
    let payload = ScoreRecordedEvent(score.into());
    send_room_event(state, room_id, EVENT_SCORE_RECORDED, &payload);
}

fn send_room_event(state: &SharedState, room_id: Uuid, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(room_id, Some(event.to_string()), payload) {
        Ok(event) => state.events().broadcast(event),
        Err(err) => warn!(event, %room_id, error = %err, "failed to serialize room SSE payload"),
    }
}
