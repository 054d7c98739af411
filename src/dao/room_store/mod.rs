#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameEntity, ParticipantEntity, RoomEntity, ScoreEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for rooms, participations, games, and scores.
pub trait RoomStore: Send + Sync {
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    fn find_room_by_code(&self, code: String)
    -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Rooms whose `active` flag is still set; expiry is left to the caller.
    fn list_active_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomEntity>>>;
    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Participants of a room ordered by join time.
    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Insert or replace the row keyed by `(game_id, hole, player)`.
    fn upsert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Scores of a game ordered by hole, then by player key.
    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Shared ordering applied by backends that cannot sort server-side.
pub(crate) fn sort_participants(participants: &mut [ParticipantEntity]) {
    participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));
}

/// Shared ordering applied by backends that cannot sort server-side.
pub(crate) fn sort_scores(scores: &mut [ScoreEntity]) {
    scores.sort_by(|a, b| {
        a.hole
            .cmp(&b.hole)
            .then_with(|| a.player.storage_key().cmp(&b.player.storage_key()))
    });
}
