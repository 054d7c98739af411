use std::time::SystemTime;

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, ParticipantEntity, RoomEntity, RoomStatus},
        room_store::RoomStore,
    },
    dto::{
        identity::Identity,
        room::{CreateRoomRequest, JoinRoomRequest, ReadyRequest, RoomDetail, RoomSummary},
    },
    error::ServiceError,
    services::{password, sse_events},
    state::{
        SharedState,
        room_flow::{self, RoomEvent},
    },
};

/// Characters used in room codes; look-alikes (`0/O`, `1/I`) are left out.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 6;
const MAX_CODE_ATTEMPTS: usize = 8;

/// Open a new room hosted by the calling user.
pub async fn create_room(
    state: &SharedState,
    identity: &Identity,
    request: CreateRoomRequest,
) -> Result<RoomSummary, ServiceError> {
    let host_user_id = identity.require_user()?.to_owned();
    let limits = &state.config().room;
    if request.capacity > limits.max_capacity {
        return Err(ServiceError::InvalidInput(format!(
            "capacity must be between 1 and {}",
            limits.max_capacity
        )));
    }

    let store = state.require_room_store().await?;
    let password_hash = request
        .password
        .as_deref()
        .map(password::hash_password)
        .transpose()?;
    let code = unique_room_code(store.as_ref()).await?;

    let now = SystemTime::now();
    let room = RoomEntity {
        id: Uuid::new_v4(),
        code,
        course_id: request.course_id,
        name: request.name,
        host_user_id,
        capacity: request.capacity,
        password_hash,
        active: true,
        status: RoomStatus::Waiting,
        game_id: None,
        created_at: now,
        updated_at: now,
        expires_at: now + limits.ttl(request.ttl_minutes),
    };

    store.save_room(room.clone()).await?;
    info!(room_id = %room.id, code = %room.code, course_id = %room.course_id, "room created");
    Ok(room.into())
}

/// Fetch a room with its participants.
pub async fn get_room(state: &SharedState, room_id: Uuid) -> Result<RoomDetail, ServiceError> {
    let store = state.require_room_store().await?;
    let room = load_room(store.as_ref(), room_id).await?;
    room_detail(store.as_ref(), room).await
}

/// Fetch a room by its join code (case insensitive).
pub async fn find_room_by_code(
    state: &SharedState,
    code: &str,
) -> Result<RoomDetail, ServiceError> {
    let store = state.require_room_store().await?;
    let code = code.trim().to_ascii_uppercase();
    let room = store
        .find_room_by_code(code.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room with code `{code}`")))?;
    room_detail(store.as_ref(), room).await
}

/// Rooms that still accept joins, optionally restricted to one course.
pub async fn list_open_rooms(
    state: &SharedState,
    course_id: Option<&str>,
) -> Result<Vec<RoomSummary>, ServiceError> {
    let store = state.require_room_store().await?;
    let now = SystemTime::now();
    Ok(store
        .list_active_rooms()
        .await?
        .into_iter()
        .filter(|room| room.is_open_at(now))
        .filter(|room| course_id.is_none_or(|course| room.course_id == course))
        .map(Into::into)
        .collect())
}

/// Add the caller to a room.
///
/// Re-joining with an identity already in the room returns the existing participation.
pub async fn join_room(
    state: &SharedState,
    room_id: Uuid,
    identity: &Identity,
    request: JoinRoomRequest,
) -> Result<RoomDetail, ServiceError> {
    let player = identity.player(request.guest_name)?;
    let store = state.require_room_store().await?;

    let _lock = state.lock_room(room_id).await;

    let room = load_room(store.as_ref(), room_id).await?;
    room_flow::next_status(room.status, RoomEvent::Join)?;
    let now = SystemTime::now();
    if !room.is_open_at(now) {
        return Err(ServiceError::InvalidState(format!(
            "room `{room_id}` is closed or expired"
        )));
    }

    let mut participants = store.list_participants(room_id).await?;
    if participants.iter().any(|p| p.player == player) {
        return Ok(RoomDetail::from((room, participants)));
    }

    if let Some(hash) = room.password_hash.as_deref() {
        let supplied = request
            .password
            .as_deref()
            .ok_or_else(|| ServiceError::Unauthorized("room password required".into()))?;
        if !password::verify_password(supplied, hash)? {
            warn!(%room_id, player = %player.storage_key(), "room join rejected: wrong password");
            return Err(ServiceError::Unauthorized("wrong room password".into()));
        }
    }

    if participants.len() >= usize::from(room.capacity) {
        return Err(ServiceError::Full(format!(
            "room `{room_id}` holds {} of {} players",
            participants.len(),
            room.capacity
        )));
    }

    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        room_id,
        player,
        ready: false,
        joined_at: now,
        updated_at: now,
    };
    store.save_participant(participant.clone()).await?;
    info!(%room_id, player = %participant.player.storage_key(), "player joined room");

    participants.push(participant.clone());
    sse_events::broadcast_participant_joined(state, participant, participants.len());
    Ok(RoomDetail::from((room, participants)))
}

/// Mark the caller ready and start the room once every participant is ready.
pub async fn mark_ready(
    state: &SharedState,
    room_id: Uuid,
    identity: &Identity,
    request: ReadyRequest,
) -> Result<RoomDetail, ServiceError> {
    let player = identity.player(request.guest_name)?;
    let store = state.require_room_store().await?;

    let _lock = state.lock_room(room_id).await;

    let mut room = load_room(store.as_ref(), room_id).await?;
    let mut participants = store.list_participants(room_id).await?;
    let index = participants
        .iter()
        .position(|p| p.player == player)
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "player `{}` in room `{room_id}`",
                player.display_name()
            ))
        })?;
    room_flow::next_status(room.status, RoomEvent::MarkReady)?;

    let now = SystemTime::now();
    if !participants[index].ready {
        participants[index].ready = true;
        participants[index].updated_at = now;
        store.save_participant(participants[index].clone()).await?;

        let ready_count = participants.iter().filter(|p| p.ready).count();
        sse_events::broadcast_participant_ready(
            state,
            participants[index].clone(),
            ready_count,
            participants.len(),
        );
    }

    if room_flow::all_ready(&participants) {
        let status = room_flow::next_status(room.status, RoomEvent::AllReady)?;
        let game = GameEntity {
            id: Uuid::new_v4(),
            room_id,
            course_id: room.course_id.clone(),
            active: true,
            created_at: now,
            completed_at: None,
        };
        store.save_game(game.clone()).await?;

        room.status = status;
        room.game_id = Some(game.id);
        room.updated_at = now;
        if let Err(err) = store.save_room(room.clone()).await {
            warn!(%room_id, game_id = %game.id, error = %err, "room promotion failed");
            let orphan = GameEntity {
                active: false,
                completed_at: Some(now),
                ..game
            };
            if let Err(cleanup) = store.save_game(orphan).await {
                warn!(%room_id, error = %cleanup, "failed to close orphaned game");
            }
            return Err(err.into());
        }

        info!(%room_id, game_id = %game.id, players = participants.len(), "room started");
        sse_events::broadcast_status_changed(state, room_id, room.status, room.game_id);
    }

    Ok(RoomDetail::from((room, participants)))
}

/// Close a room and its game. Only the host or an admin may do so; repeated calls are no-ops.
pub async fn complete_room(
    state: &SharedState,
    room_id: Uuid,
    identity: &Identity,
) -> Result<RoomDetail, ServiceError> {
    let user_id = identity.require_user()?;
    let store = state.require_room_store().await?;

    let lock = state.lock_room(room_id).await;

    let mut room = load_room(store.as_ref(), room_id).await?;
    if room.host_user_id != user_id && !identity.admin {
        return Err(ServiceError::Forbidden(format!(
            "only the host may complete room `{room_id}`"
        )));
    }

    if room.status == RoomStatus::Completed {
        drop(lock);
        return room_detail(store.as_ref(), room).await;
    }

    let status = room_flow::next_status(room.status, RoomEvent::Complete)?;
    let now = SystemTime::now();
    if let Some(game_id) = room.game_id {
        match store.find_game(game_id).await? {
            Some(mut game) if game.completed_at.is_none() => {
                game.active = false;
                game.completed_at = Some(now);
                store.save_game(game).await?;
            }
            Some(_) => {}
            None => warn!(%room_id, %game_id, "completed room references a missing game"),
        }
    }

    room.active = false;
    room.status = status;
    room.updated_at = now;
    store.save_room(room.clone()).await?;
    info!(%room_id, "room completed");
    sse_events::broadcast_status_changed(state, room_id, room.status, room.game_id);

    drop(lock);
    room_detail(store.as_ref(), room).await
}

async fn load_room(store: &dyn RoomStore, room_id: Uuid) -> Result<RoomEntity, ServiceError> {
    store
        .find_room(room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}`")))
}

async fn room_detail(store: &dyn RoomStore, room: RoomEntity) -> Result<RoomDetail, ServiceError> {
    let participants = store.list_participants(room.id).await?;
    Ok(RoomDetail::from((room, participants)))
}

async fn unique_room_code(store: &dyn RoomStore) -> Result<String, ServiceError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_room_code();
        if store.find_room_by_code(code.clone()).await?.is_none() {
            return Ok(code);
        }
    }
    Err(ServiceError::Internal(
        "could not allocate a unique room code".into(),
    ))
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let index = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            char::from(ROOM_CODE_ALPHABET[index])
        })
        .collect()
}
