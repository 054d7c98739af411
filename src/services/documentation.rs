use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the room and scoring API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::list_rooms,
        crate::routes::rooms::get_room,
        crate::routes::rooms::get_room_by_code,
        crate::routes::rooms::join_room,
        crate::routes::rooms::mark_ready,
        crate::routes::rooms::complete_room,
        crate::routes::games::get_game,
        crate::routes::games::list_scores,
        crate::routes::games::submit_score,
        crate::routes::sse::room_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::ReadyRequest,
            crate::dto::room::PlayerKind,
            crate::dto::room::PlayerDto,
            crate::dto::room::RoomSummary,
            crate::dto::room::ParticipantSummary,
            crate::dto::room::RoomDetail,
            crate::dto::game::SubmitScoreRequest,
            crate::dto::game::ScoreSummary,
            crate::dto::game::GameSummary,
            crate::dto::game::LeaderboardEntry,
            crate::dto::game::GameDetail,
            crate::dto::sse::Handshake,
            crate::dto::sse::ParticipantJoinedEvent,
            crate::dto::sse::ParticipantReadyEvent,
            crate::dto::sse::RoomStatusChangedEvent,
            crate::dto::sse::ScoreRecordedEvent,
            crate::dao::models::RoomStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room registry, participation, and completion"),
        (name = "games", description = "Score ledger of started rooms"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
