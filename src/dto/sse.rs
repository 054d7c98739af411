use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::RoomStatus,
    dto::{game::ScoreSummary, room::ParticipantSummary},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the room SSE channel.
pub struct ServerEvent {
    /// Room the event belongs to; subscribers only forward their own room.
    pub room_id: Uuid,
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(room_id: Uuid, event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            room_id,
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Room the stream is bound to.
    pub room_id: Uuid,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new player joins the room.
pub struct ParticipantJoinedEvent {
    pub participant: ParticipantSummary,
    pub participant_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a participant marks themselves ready.
pub struct ParticipantReadyEvent {
    pub participant: ParticipantSummary,
    pub ready_count: usize,
    pub participant_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the room lifecycle status changes.
pub struct RoomStatusChangedEvent {
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a score row is written.
pub struct ScoreRecordedEvent(pub ScoreSummary);
