//! DTO definitions for the room endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ParticipantEntity, PlayerEntity, RoomEntity, RoomStatus},
    dto::{
        format_system_time,
        validation::{validate_course_id, validate_guest_name},
    },
};

/// Payload used to open a new room on a course.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateRoomRequest {
    /// Course the room plays on.
    #[validate(custom(function = validate_course_id))]
    pub course_id: String,
    /// Maximum number of participants (bounded by the server configuration).
    #[validate(range(min = 1))]
    pub capacity: u8,
    /// Optional join password, stored hashed.
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
    /// Lifetime of the room; the server default applies when omitted.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub ttl_minutes: Option<u32>,
    /// Optional display label.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
}

/// Payload sent when joining a room.
///
/// Registered users are identified by the `x-user-id` header; `guest_name` is only read when
/// the header is absent.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_guest_name))]
    pub guest_name: Option<String>,
}

/// Payload sent when marking oneself ready.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct ReadyRequest {
    #[serde(default)]
    #[validate(custom(function = validate_guest_name))]
    pub guest_name: Option<String>,
}

/// Query string accepted by the room listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRoomsQuery {
    /// Only list rooms bound to this course.
    pub course_id: Option<String>,
}

/// Kind of player taking part in a room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    User,
    Guest,
}

/// Player reference as exchanged with clients: `{"kind": "guest", "id": "Sam"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PlayerDto {
    pub kind: PlayerKind,
    /// User id for registered users, display name for guests.
    pub id: String,
}

impl From<PlayerEntity> for PlayerDto {
    fn from(player: PlayerEntity) -> Self {
        match player {
            PlayerEntity::User(id) => Self {
                kind: PlayerKind::User,
                id,
            },
            PlayerEntity::Guest(name) => Self {
                kind: PlayerKind::Guest,
                id: name,
            },
        }
    }
}

impl From<PlayerDto> for PlayerEntity {
    fn from(player: PlayerDto) -> Self {
        match player.kind {
            PlayerKind::User => PlayerEntity::User(player.id),
            PlayerKind::Guest => PlayerEntity::Guest(player.id),
        }
    }
}

/// Public projection of a room. The password hash is never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomSummary {
    pub id: Uuid,
    pub code: String,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub host_user_id: String,
    pub capacity: u8,
    pub has_password: bool,
    pub active: bool,
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub expires_at: String,
}

impl From<RoomEntity> for RoomSummary {
    fn from(room: RoomEntity) -> Self {
        Self {
            id: room.id,
            code: room.code,
            course_id: room.course_id,
            name: room.name,
            host_user_id: room.host_user_id,
            capacity: room.capacity,
            has_password: room.password_hash.is_some(),
            active: room.active,
            status: room.status,
            game_id: room.game_id,
            created_at: format_system_time(room.created_at),
            updated_at: format_system_time(room.updated_at),
            expires_at: format_system_time(room.expires_at),
        }
    }
}

/// Membership row as shown to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub player: PlayerDto,
    pub ready: bool,
    pub joined_at: String,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(participant: ParticipantEntity) -> Self {
        Self {
            id: participant.id,
            player: participant.player.into(),
            ready: participant.ready,
            joined_at: format_system_time(participant.joined_at),
        }
    }
}

/// Room together with its participants, returned by every room mutation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: RoomSummary,
    pub participants: Vec<ParticipantSummary>,
    pub ready_count: usize,
}

impl From<(RoomEntity, Vec<ParticipantEntity>)> for RoomDetail {
    fn from((room, participants): (RoomEntity, Vec<ParticipantEntity>)) -> Self {
        let ready_count = participants.iter().filter(|p| p.ready).count();
        Self {
            room: room.into(),
            participants: participants.into_iter().map(Into::into).collect(),
            ready_count,
        }
    }
}
