use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, ParticipantEntity, PlayerEntity, RoomEntity, RoomStatus, ScoreEntity,
};

use super::error::MongoDaoError;

pub const ROOM_COLLECTION_NAME: &str = "rooms";
pub const PARTICIPANT_COLLECTION_NAME: &str = "participants";
pub const GAME_COLLECTION_NAME: &str = "games";
pub const SCORE_COLLECTION_NAME: &str = "scores";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    id: String,
    code: String,
    course_id: String,
    name: Option<String>,
    host_user_id: String,
    capacity: i32,
    password_hash: Option<String>,
    active: bool,
    status: String,
    game_id: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
    expires_at: DateTime,
}

impl From<RoomEntity> for MongoRoomDocument {
    fn from(value: RoomEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            course_id: value.course_id,
            name: value.name,
            host_user_id: value.host_user_id,
            capacity: i32::from(value.capacity),
            password_hash: value.password_hash,
            active: value.active,
            status: value.status.as_str().to_owned(),
            game_id: value.game_id.map(|id| id.to_string()),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            expires_at: DateTime::from_system_time(value.expires_at),
        }
    }
}

impl TryFrom<MongoRoomDocument> for RoomEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoRoomDocument) -> Result<Self, Self::Error> {
        let corrupted = |reason: String| MongoDaoError::Corrupted {
            collection: ROOM_COLLECTION_NAME,
            id: value.id.clone(),
            reason,
        };

        let id = parse_uuid(&value.id).map_err(corrupted)?;
        let capacity = u8::try_from(value.capacity)
            .map_err(|_| corrupted(format!("capacity {} out of range", value.capacity)))?;
        let status = value.status.parse::<RoomStatus>().map_err(corrupted)?;
        let game_id = value
            .game_id
            .as_deref()
            .map(parse_uuid)
            .transpose()
            .map_err(corrupted)?;

        Ok(Self {
            id,
            code: value.code,
            course_id: value.course_id,
            name: value.name,
            host_user_id: value.host_user_id,
            capacity,
            password_hash: value.password_hash,
            active: value.active,
            status,
            game_id,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            expires_at: value.expires_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: String,
    room_id: String,
    player: PlayerEntity,
    /// Flattened copy of the player identity backing the unique index.
    player_key: String,
    ready: bool,
    joined_at: DateTime,
    updated_at: DateTime,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id.to_string(),
            room_id: value.room_id.to_string(),
            player_key: value.player.storage_key(),
            player: value.player,
            ready: value.ready,
            joined_at: DateTime::from_system_time(value.joined_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoParticipantDocument) -> Result<Self, Self::Error> {
        let corrupted = |reason: String| MongoDaoError::Corrupted {
            collection: PARTICIPANT_COLLECTION_NAME,
            id: value.id.clone(),
            reason,
        };

        Ok(Self {
            id: parse_uuid(&value.id).map_err(corrupted)?,
            room_id: parse_uuid(&value.room_id).map_err(corrupted)?,
            player: value.player,
            ready: value.ready,
            joined_at: value.joined_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    room_id: String,
    course_id: String,
    active: bool,
    created_at: DateTime,
    completed_at: Option<DateTime>,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            room_id: value.room_id.to_string(),
            course_id: value.course_id,
            active: value.active,
            created_at: DateTime::from_system_time(value.created_at),
            completed_at: value.completed_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        let corrupted = |reason: String| MongoDaoError::Corrupted {
            collection: GAME_COLLECTION_NAME,
            id: value.id.clone(),
            reason,
        };

        Ok(Self {
            id: parse_uuid(&value.id).map_err(corrupted)?,
            room_id: parse_uuid(&value.room_id).map_err(corrupted)?,
            course_id: value.course_id,
            active: value.active,
            created_at: value.created_at.to_system_time(),
            completed_at: value.completed_at.map(|at| at.to_system_time()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    /// Deterministic `(game, hole, player)` key, so upserts never duplicate.
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    hole: i32,
    player: PlayerEntity,
    strokes: i32,
    penalties: i32,
    updated_at: DateTime,
}

impl MongoScoreDocument {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.slot_key(),
            game_id: value.game_id.to_string(),
            hole: i32::from(value.hole),
            player: value.player,
            strokes: i32::from(value.strokes),
            penalties: i32::from(value.penalties),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoScoreDocument> for ScoreEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoScoreDocument) -> Result<Self, Self::Error> {
        let corrupted = |reason: String| MongoDaoError::Corrupted {
            collection: SCORE_COLLECTION_NAME,
            id: value.id.clone(),
            reason,
        };
        let small = |field: &str, raw: i32| {
            u8::try_from(raw).map_err(|_| corrupted(format!("{field} {raw} out of range")))
        };

        Ok(Self {
            game_id: parse_uuid(&value.game_id).map_err(corrupted)?,
            hole: small("hole", value.hole)?,
            strokes: small("strokes", value.strokes)?,
            penalties: small("penalties", value.penalties)?,
            player: value.player,
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|err| format!("invalid uuid `{raw}`: {err}"))
}

pub fn doc_id(id: impl ToString) -> Document {
    doc! {"_id": id.to_string()}
}
