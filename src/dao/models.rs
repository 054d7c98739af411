use std::{fmt, str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a room: `waiting → in_progress → completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Accepting joins and ready checks.
    Waiting,
    /// Every participant was ready; the backing game is being played.
    InProgress,
    /// Closed for good.
    Completed,
}

impl RoomStatus {
    /// Stable lowercase label, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::InProgress => "in_progress",
            RoomStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "waiting" => Ok(RoomStatus::Waiting),
            "in_progress" => Ok(RoomStatus::InProgress),
            "completed" => Ok(RoomStatus::Completed),
            other => Err(format!("unknown room status `{other}`")),
        }
    }
}

/// Identity of a player inside a room: a registered user or a named guest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlayerEntity {
    /// Registered account, identified by the session provider's user id.
    User(String),
    /// Guest identified by the display name chosen when joining.
    Guest(String),
}

impl PlayerEntity {
    const USER_PREFIX: &'static str = "user:";
    const GUEST_PREFIX: &'static str = "guest:";

    /// Key used to enforce per-room and per-hole uniqueness in every backend.
    pub fn storage_key(&self) -> String {
        match self {
            PlayerEntity::User(id) => format!("{}{id}", Self::USER_PREFIX),
            PlayerEntity::Guest(name) => format!("{}{name}", Self::GUEST_PREFIX),
        }
    }

    /// Human readable label (user id or guest name).
    pub fn display_name(&self) -> &str {
        match self {
            PlayerEntity::User(id) | PlayerEntity::Guest(id) => id,
        }
    }
}

impl FromStr for PlayerEntity {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        if let Some(id) = key.strip_prefix(Self::USER_PREFIX) {
            return Ok(PlayerEntity::User(id.to_owned()));
        }
        if let Some(name) = key.strip_prefix(Self::GUEST_PREFIX) {
            return Ok(PlayerEntity::Guest(name.to_owned()));
        }
        Err(format!("invalid player key `{key}`"))
    }
}

/// Joinable multiplayer session container bound to one course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Primary key of the room.
    pub id: Uuid,
    /// Short human friendly code used to find the room.
    pub code: String,
    /// Opaque reference to the course the room plays on.
    pub course_id: String,
    /// Optional display label.
    pub name: Option<String>,
    /// Registered user that created the room.
    pub host_user_id: String,
    /// Maximum number of participants.
    pub capacity: u8,
    /// Argon2 PHC string when the room is password protected.
    pub password_hash: Option<String>,
    /// Cleared once the room is completed.
    pub active: bool,
    /// Current lifecycle status.
    pub status: RoomStatus,
    /// Backing game, set when the room is promoted to in-progress.
    pub game_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
    /// Joins are refused from this instant on.
    pub expires_at: SystemTime,
}

impl RoomEntity {
    /// Whether the expiry timestamp has passed at `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Whether the room still accepts new participants at `now`.
    pub fn is_open_at(&self, now: SystemTime) -> bool {
        self.active && self.status == RoomStatus::Waiting && !self.is_expired_at(now)
    }
}

/// Membership of a player within a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Primary key of the participation.
    pub id: Uuid,
    /// Room the player joined.
    pub room_id: Uuid,
    /// Who joined.
    pub player: PlayerEntity,
    /// Whether the player marked themselves ready.
    pub ready: bool,
    /// When the player joined.
    pub joined_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
}

/// Scoring session created once a room starts play.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Room that spawned the game.
    pub room_id: Uuid,
    /// Course copied from the room.
    pub course_id: String,
    /// Cleared once the room is completed.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Set by the first completion.
    pub completed_at: Option<SystemTime>,
}

/// Per-hole score row, unique per `(game_id, hole, player)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Game the score belongs to.
    pub game_id: Uuid,
    /// Hole number, starting at 1.
    pub hole: u8,
    /// Player the score was recorded for.
    pub player: PlayerEntity,
    /// Throws taken on the hole.
    pub strokes: u8,
    /// Penalty throws added on the hole.
    pub penalties: u8,
    /// Last time the row was written.
    pub updated_at: SystemTime,
}

impl ScoreEntity {
    /// Deterministic key identifying the `(game, hole, player)` slot.
    pub fn slot_key(&self) -> String {
        score_slot_key(self.game_id, self.hole, &self.player)
    }
}

/// Build the deterministic key of a score slot.
pub fn score_slot_key(game_id: Uuid, hole: u8, player: &PlayerEntity) -> String {
    format!("{game_id}:{hole:03}:{}", player.storage_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_key_round_trips_through_from_str() {
        let user = PlayerEntity::User("u-42".into());
        let guest = PlayerEntity::Guest("Ada: the ace".into());

        assert_eq!(user.storage_key(), "user:u-42");
        assert_eq!(guest.storage_key().parse::<PlayerEntity>().unwrap(), guest);
        assert!("nobody".parse::<PlayerEntity>().is_err());
    }

    #[test]
    fn player_serializes_with_kind_and_id() {
        let json = serde_json::to_value(PlayerEntity::Guest("Bob".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "guest", "id": "Bob"}));
    }

    #[test]
    fn score_slot_key_distinguishes_holes_and_players() {
        let game = Uuid::new_v4();
        let a = score_slot_key(game, 1, &PlayerEntity::Guest("a".into()));
        let b = score_slot_key(game, 10, &PlayerEntity::Guest("a".into()));
        let c = score_slot_key(game, 1, &PlayerEntity::User("a".into()));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn expired_room_is_not_open() {
        let now = SystemTime::now();
        let room = RoomEntity {
            id: Uuid::new_v4(),
            code: "ABCDEF".into(),
            course_id: "maple-hill".into(),
            name: None,
            host_user_id: "host".into(),
            capacity: 4,
            password_hash: None,
            active: true,
            status: RoomStatus::Waiting,
            game_id: None,
            created_at: now,
            updated_at: now,
            expires_at: now,
        };
        assert!(room.is_expired_at(now));
        assert!(!room.is_open_at(now));
    }
}
