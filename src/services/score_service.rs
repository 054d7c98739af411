use std::{cmp::Reverse, collections::BTreeMap, time::SystemTime};

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        models::{GameEntity, PlayerEntity, ScoreEntity},
        room_store::RoomStore,
    },
    dto::game::{GameDetail, LeaderboardEntry, ScoreSummary, SubmitScoreRequest},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Record the score of one player on one hole, replacing any earlier submission for that slot.
pub async fn submit_score(
    state: &SharedState,
    game_id: Uuid,
    request: SubmitScoreRequest,
) -> Result<ScoreSummary, ServiceError> {
    let store = state.require_room_store().await?;
    let game = load_game(store.as_ref(), game_id).await?;
    if !game.active {
        return Err(ServiceError::InvalidState(format!(
            "game `{game_id}` is no longer active"
        )));
    }

    let player = PlayerEntity::from(request.player);
    let participants = store.list_participants(game.room_id).await?;
    if !participants.iter().any(|p| p.player == player) {
        return Err(ServiceError::InvalidInput(format!(
            "player `{}` is not part of game `{game_id}`",
            player.display_name()
        )));
    }

    let score = ScoreEntity {
        game_id,
        hole: request.hole,
        player,
        strokes: request.strokes,
        penalties: request.penalties,
        updated_at: SystemTime::now(),
    };
    store.upsert_score(score.clone()).await?;
    debug!(%game_id, slot = %score.slot_key(), strokes = score.strokes, "score recorded");

    sse_events::broadcast_score_recorded(state, game.room_id, score.clone());
    Ok(score.into())
}

/// Score rows of a game ordered by hole, then player.
pub async fn list_scores(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<ScoreSummary>, ServiceError> {
    let store = state.require_room_store().await?;
    load_game(store.as_ref(), game_id).await?;
    let scores = store.list_scores(game_id).await?;
    Ok(scores.into_iter().map(Into::into).collect())
}

/// Game with its full score ledger and the derived leaderboard.
pub async fn get_game(state: &SharedState, game_id: Uuid) -> Result<GameDetail, ServiceError> {
    let store = state.require_room_store().await?;
    let game = load_game(store.as_ref(), game_id).await?;
    let scores = store.list_scores(game_id).await?;

    Ok(GameDetail {
        game: game.into(),
        leaderboard: leaderboard(&scores),
        scores: scores.into_iter().map(Into::into).collect(),
    })
}

async fn load_game(store: &dyn RoomStore, game_id: Uuid) -> Result<GameEntity, ServiceError> {
    store
        .find_game(game_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}`")))
}

#[derive(Default)]
struct Totals {
    holes_played: u16,
    strokes: u32,
    penalties: u32,
}

/// Aggregate score rows per player: lowest total first, more holes played breaks ties.
pub fn leaderboard(scores: &[ScoreEntity]) -> Vec<LeaderboardEntry> {
    let mut totals: BTreeMap<&PlayerEntity, Totals> = BTreeMap::new();
    for score in scores {
        let entry = totals.entry(&score.player).or_default();
        entry.holes_played += 1;
        entry.strokes += u32::from(score.strokes);
        entry.penalties += u32::from(score.penalties);
    }

    let mut rows = totals
        .into_iter()
        .map(|(player, totals)| (player.storage_key(), player.clone(), totals))
        .collect::<Vec<_>>();
    rows.sort_by_key(|(key, _, totals)| {
        (
            totals.strokes + totals.penalties,
            Reverse(totals.holes_played),
            key.clone(),
        )
    });

    rows.into_iter()
        .map(|(_, player, totals)| LeaderboardEntry {
            player: player.into(),
            holes_played: totals.holes_played,
            strokes: totals.strokes,
            penalties: totals.penalties,
            total: totals.strokes + totals.penalties,
        })
        .collect()
}
