//! DTO definitions for games, score rows, and the leaderboard.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, ScoreEntity},
    dto::{format_system_time, room::PlayerDto},
};

/// Per-hole score submission. A second submission for the same hole and player replaces the first.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitScoreRequest {
    #[validate(range(min = 1, max = 99))]
    pub hole: u8,
    pub player: PlayerDto,
    #[validate(range(min = 1, max = 99))]
    pub strokes: u8,
    #[serde(default)]
    #[validate(range(max = 99))]
    pub penalties: u8,
}

/// Recorded score row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScoreSummary {
    pub game_id: Uuid,
    pub hole: u8,
    pub player: PlayerDto,
    pub strokes: u8,
    pub penalties: u8,
    /// `strokes + penalties`.
    pub total: u16,
    pub updated_at: String,
}

impl From<ScoreEntity> for ScoreSummary {
    fn from(score: ScoreEntity) -> Self {
        Self {
            game_id: score.game_id,
            hole: score.hole,
            total: u16::from(score.strokes) + u16::from(score.penalties),
            player: score.player.into(),
            strokes: score.strokes,
            penalties: score.penalties,
            updated_at: format_system_time(score.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub room_id: Uuid,
    pub course_id: String,
    pub active: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<GameEntity> for GameSummary {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            room_id: game.room_id,
            course_id: game.course_id,
            active: game.active,
            created_at: format_system_time(game.created_at),
            completed_at: game.completed_at.map(format_system_time),
        }
    }
}

/// Aggregated standing of one player.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub player: PlayerDto,
    pub holes_played: u16,
    pub strokes: u32,
    pub penalties: u32,
    pub total: u32,
}

/// Game together with its full score ledger.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: GameSummary,
    pub scores: Vec<ScoreSummary>,
    /// Lowest total first.
    pub leaderboard: Vec<LeaderboardEntry>,
}
