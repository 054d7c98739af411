//! Process-local store backed by concurrent maps, used for local runs and tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{GameEntity, ParticipantEntity, RoomEntity, ScoreEntity},
    room_store::{RoomStore, sort_participants, sort_scores},
    storage::StorageResult,
};

#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rooms: DashMap<Uuid, RoomEntity>,
    participants: DashMap<Uuid, ParticipantEntity>,
    games: DashMap<Uuid, GameEntity>,
    scores: DashMap<String, ScoreEntity>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryRoomStore {
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.rooms.insert(room.id, room);
            Ok(())
        })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.rooms.get(&id).map(|room| room.value().clone())) })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .rooms
                .iter()
                .find(|entry| entry.code == code)
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_active_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut rooms = store
                .inner
                .rooms
                .iter()
                .filter(|entry| entry.active)
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(rooms)
        })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .participants
                .insert(participant.id, participant);
            Ok(())
        })
    }

    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut participants = store
                .inner
                .participants
                .iter()
                .filter(|entry| entry.room_id == room_id)
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            sort_participants(&mut participants);
            Ok(participants)
        })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.games.insert(game.id, game);
            Ok(())
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.games.get(&id).map(|game| game.value().clone())) })
    }

    fn upsert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.scores.insert(score.slot_key(), score);
            Ok(())
        })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores = store
                .inner
                .scores
                .iter()
                .filter(|entry| entry.game_id == game_id)
                .map(|entry| entry.value().clone())
                .collect::<Vec<_>>();
            sort_scores(&mut scores);
            Ok(scores)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
