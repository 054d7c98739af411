use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        GAME_COLLECTION_NAME, MongoGameDocument, MongoParticipantDocument, MongoRoomDocument,
        MongoScoreDocument, PARTICIPANT_COLLECTION_NAME, ROOM_COLLECTION_NAME,
        SCORE_COLLECTION_NAME, doc_id,
    },
};
use crate::dao::{
    models::{GameEntity, ParticipantEntity, RoomEntity, ScoreEntity},
    room_store::{RoomStore, sort_participants, sort_scores},
    storage::StorageResult,
};

#[derive(Clone)]
pub struct MongoRoomStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Held so the connection pool lives as long as the database handle.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoomStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let indexes: [(&'static str, &'static str, Document, bool); 4] = [
            (ROOM_COLLECTION_NAME, "code", doc! {"code": 1}, true),
            (ROOM_COLLECTION_NAME, "active", doc! {"active": 1}, false),
            (
                PARTICIPANT_COLLECTION_NAME,
                "room_id,player_key",
                doc! {"room_id": 1, "player_key": 1},
                true,
            ),
            (SCORE_COLLECTION_NAME, "game_id,hole", doc! {"game_id": 1, "hole": 1}, false),
        ];

        for (collection, index, keys, unique) in indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{}_idx", index.replace(',', "_"))))
                        .unique(Some(unique))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn save_room(&self, room: RoomEntity) -> MongoResult<()> {
        let id = room.id;
        let document: MongoRoomDocument = room.into();
        self.collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: ROOM_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn find_room_where(
        &self,
        filter: Document,
        id: String,
    ) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: ROOM_COLLECTION_NAME,
                id,
                source,
            })?;

        document.map(RoomEntity::try_from).transpose()
    }

    async fn list_active_rooms(&self) -> MongoResult<Vec<RoomEntity>> {
        let documents: Vec<MongoRoomDocument> = self
            .collection::<MongoRoomDocument>(ROOM_COLLECTION_NAME)
            .await
            .find(doc! {"active": true})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: ROOM_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: ROOM_COLLECTION_NAME,
                source,
            })?;

        let mut rooms = documents
            .into_iter()
            .map(RoomEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        rooms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rooms)
    }

    async fn save_participant(&self, participant: ParticipantEntity) -> MongoResult<()> {
        let id = participant.id;
        let document: MongoParticipantDocument = participant.into();
        self.collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: PARTICIPANT_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn list_participants(&self, room_id: Uuid) -> MongoResult<Vec<ParticipantEntity>> {
        let documents: Vec<MongoParticipantDocument> = self
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME)
            .await
            .find(doc! {"room_id": room_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PARTICIPANT_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: PARTICIPANT_COLLECTION_NAME,
                source,
            })?;

        let mut participants = documents
            .into_iter()
            .map(ParticipantEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        sort_participants(&mut participants);
        Ok(participants)
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: GAME_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: GAME_COLLECTION_NAME,
                id: id.to_string(),
                source,
            })?;

        document.map(GameEntity::try_from).transpose()
    }

    async fn upsert_score(&self, score: ScoreEntity) -> MongoResult<()> {
        let document: MongoScoreDocument = score.into();
        let id = document.id().to_owned();
        self.collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
            .await
            .replace_one(doc_id(&id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: SCORE_COLLECTION_NAME,
                id,
                source,
            })?;
        Ok(())
    }

    async fn list_scores(&self, game_id: Uuid) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
            .await
            .find(doc! {"game_id": game_id.to_string()})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: SCORE_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: SCORE_COLLECTION_NAME,
                source,
            })?;

        let mut scores = documents
            .into_iter()
            .map(ScoreEntity::try_from)
            .collect::<MongoResult<Vec<_>>>()?;
        sort_scores(&mut scores);
        Ok(scores)
    }
}

impl RoomStore for MongoRoomStore {
    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_room(room).await.map_err(Into::into) })
    }

    fn find_room(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_room_where(doc_id(id), id.to_string())
                .await
                .map_err(Into::into)
        })
    }

    fn find_room_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_room_where(doc! {"code": code.as_str()}, code)
                .await
                .map_err(Into::into)
        })
    }

    fn list_active_rooms(&self) -> BoxFuture<'static, StorageResult<Vec<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_active_rooms().await.map_err(Into::into) })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_participant(participant).await.map_err(Into::into) })
    }

    fn list_participants(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants(room_id).await.map_err(Into::into) })
    }

    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn upsert_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_score(score).await.map_err(Into::into) })
    }

    fn list_scores(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores(game_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
