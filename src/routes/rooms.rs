use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        identity::Identity,
        room::{
            CreateRoomRequest, JoinRoomRequest, ListRoomsQuery, ReadyRequest, RoomDetail,
            RoomSummary,
        },
    },
    error::AppError,
    routes::extract::ValidJson,
    services::room_service,
    state::SharedState,
};

/// Room registry, participation, and completion endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/code/{code}", get(get_room_by_code))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/join", post(join_room))
        .route("/rooms/{id}/ready", post(mark_ready))
        .route("/rooms/{id}/complete", post(complete_room))
}

/// Open a new room hosted by the calling user.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    params(("x-user-id" = String, Header, description = "Id of the signed-in host")),
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomSummary),
        (status = 400, description = "Invalid room settings"),
        (status = 401, description = "Caller is not signed in")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    identity: Identity,
    ValidJson(payload): ValidJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomSummary>), AppError> {
    let room = room_service::create_room(&state, &identity, payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// List rooms that still accept joins.
#[utoipa::path(
    get,
    path = "/rooms",
    tag = "rooms",
    params(ListRoomsQuery),
    responses((status = 200, description = "Open rooms", body = [RoomSummary]))
)]
pub async fn list_rooms(
    State(state): State<SharedState>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<RoomSummary>>, AppError> {
    let rooms = room_service::list_open_rooms(&state, query.course_id.as_deref()).await?;
    Ok(Json(rooms))
}

/// Retrieve a room and its participants.
#[utoipa::path(
    get,
    path = "/rooms/{id}",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room", body = RoomDetail),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(room_service::get_room(&state, id).await?))
}

/// Retrieve a room by its join code.
#[utoipa::path(
    get,
    path = "/rooms/code/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Six character join code")),
    responses(
        (status = 200, description = "Room", body = RoomDetail),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn get_room_by_code(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(room_service::find_room_by_code(&state, &code).await?))
}

/// Join a room as the signed-in user or as a named guest.
#[utoipa::path(
    post,
    path = "/rooms/{id}/join",
    tag = "rooms",
    params(
        ("id" = Uuid, Path, description = "Identifier of the room"),
        ("x-user-id" = Option<String>, Header, description = "Id of the signed-in user; guests send `guest_name` instead")
    ),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined (or already a participant)", body = RoomDetail),
        (status = 401, description = "Missing or wrong room password"),
        (status = 404, description = "Unknown room"),
        (status = 409, description = "Room is full, started, or expired")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    identity: Identity,
    ValidJson(payload): ValidJson<JoinRoomRequest>,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(
        room_service::join_room(&state, id, &identity, payload).await?,
    ))
}

/// Mark the caller ready; the room starts once everybody is ready.
#[utoipa::path(
    post,
    path = "/rooms/{id}/ready",
    tag = "rooms",
    params(
        ("id" = Uuid, Path, description = "Identifier of the room"),
        ("x-user-id" = Option<String>, Header, description = "Id of the signed-in user; guests send `guest_name` instead")
    ),
    request_body = ReadyRequest,
    responses(
        (status = 200, description = "Ready state recorded", body = RoomDetail),
        (status = 404, description = "Unknown room or player not in room"),
        (status = 409, description = "Room already started or completed")
    )
)]
pub async fn mark_ready(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    identity: Identity,
    ValidJson(payload): ValidJson<ReadyRequest>,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(
        room_service::mark_ready(&state, id, &identity, payload).await?,
    ))
}

/// Close the room and its game.
#[utoipa::path(
    post,
    path = "/rooms/{id}/complete",
    tag = "rooms",
    params(
        ("id" = Uuid, Path, description = "Identifier of the room"),
        ("x-user-id" = String, Header, description = "Id of the signed-in user"),
        ("x-user-role" = Option<String>, Header, description = "`admin` lets non-hosts complete rooms")
    ),
    responses(
        (status = 200, description = "Room completed", body = RoomDetail),
        (status = 401, description = "Caller is not signed in"),
        (status = 403, description = "Caller is neither host nor admin"),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn complete_room(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    identity: Identity,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(room_service::complete_room(&state, id, &identity).await?))
}
