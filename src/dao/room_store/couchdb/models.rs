use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::PlayerEntity;

pub const ROOM_PREFIX: &str = "room::";
pub const GAME_PREFIX: &str = "game::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Envelope adding the CouchDB bookkeeping fields around an entity body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, body: T) -> Self {
        Self {
            id,
            rev: None,
            body,
        }
    }
}

pub fn room_doc_id(id: Uuid) -> String {
    format!("{ROOM_PREFIX}{id}")
}

pub fn game_doc_id(id: Uuid) -> String {
    format!("{GAME_PREFIX}{id}")
}

/// Prefix shared by every participant document of a room.
pub fn participant_prefix(room_id: Uuid) -> String {
    format!("participant::{room_id}::")
}

pub fn participant_doc_id(room_id: Uuid, participant_id: Uuid) -> String {
    format!("{}{participant_id}", participant_prefix(room_id))
}

/// Prefix shared by every score document of a game.
pub fn score_prefix(game_id: Uuid) -> String {
    format!("score::{game_id}::")
}

/// Score documents are addressed by their slot, so a rewrite lands on the same id.
/// The player key is hex encoded because guest names may contain URL-reserved characters.
pub fn score_doc_id(game_id: Uuid, hole: u8, player: &PlayerEntity) -> String {
    let key = player
        .storage_key()
        .bytes()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    format!("{}{hole:03}::{key}", score_prefix(game_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_doc_id_is_url_safe() {
        let game_id = Uuid::nil();
        let id = score_doc_id(game_id, 7, &PlayerEntity::Guest("a/b?c".into()));
        assert!(id.starts_with(&score_prefix(game_id)));
        assert!(id.ends_with("::007::67756573743a612f623f63"));
        assert!(!id.contains('/'));
        assert!(!id.contains('?'));
    }

    #[test]
    fn participant_ids_share_room_prefix() {
        let room_id = Uuid::new_v4();
        let id = participant_doc_id(room_id, Uuid::new_v4());
        assert!(id.starts_with(&participant_prefix(room_id)));
    }
}
