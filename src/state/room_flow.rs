use thiserror::Error;

use crate::dao::models::{ParticipantEntity, RoomStatus};

/// Events that move a room through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    /// A new player asks to join.
    Join,
    /// A participant marks themselves ready.
    MarkReady,
    /// The ready check found every participant ready.
    AllReady,
    /// The room is closed; accepted from any status.
    Complete,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while the room is {from}")]
pub struct InvalidTransition {
    /// The status the room was in when the event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this status.
    pub event: RoomEvent,
}

/// Compute the status that follows `event`, or explain why it cannot happen.
pub fn next_status(from: RoomStatus, event: RoomEvent) -> Result<RoomStatus, InvalidTransition> {
    let next = match (from, event) {
        (RoomStatus::Waiting, RoomEvent::Join | RoomEvent::MarkReady) => RoomStatus::Waiting,
        (RoomStatus::Waiting, RoomEvent::AllReady) => RoomStatus::InProgress,
        (_, RoomEvent::Complete) => RoomStatus::Completed,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

/// Ready check backing the promotion: every current participant is ready.
pub fn all_ready(participants: &[ParticipantEntity]) -> bool {
    !participants.is_empty() && participants.iter().all(|participant| participant.ready)
}
