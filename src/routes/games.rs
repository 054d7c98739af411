use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::game::{GameDetail, ScoreSummary, SubmitScoreRequest},
    error::AppError,
    routes::extract::ValidJson,
    services::score_service,
    state::SharedState,
};

/// Score ledger endpoints of started rooms.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/scores", get(list_scores).post(submit_score))
}

/// Retrieve a game with every score row and the leaderboard.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game", body = GameDetail),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(score_service::get_game(&state, id).await?))
}

/// List the score rows of a game, ordered by hole then player.
#[utoipa::path(
    get,
    path = "/games/{id}/scores",
    tag = "games",
    params(("id" = Uuid, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Score rows", body = [ScoreSummary]),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn list_scores(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ScoreSummary>>, AppError> {
    Ok(Json(score_service::list_scores(&state, id).await?))
}

/// Record (or overwrite) the score of a player on a hole.
#[utoipa::path(
    post,
    path = "/games/{id}/scores",
    tag = "games",
    params(("id" = Uuid, Path, description = "Identifier of the game")),
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score recorded", body = ScoreSummary),
        (status = 400, description = "Out of range values or player not in the game"),
        (status = 404, description = "Unknown game"),
        (status = 409, description = "Game already completed")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<SubmitScoreRequest>,
) -> Result<Json<ScoreSummary>, AppError> {
    Ok(Json(score_service::submit_score(&state, id, payload).await?))
}
