/// Persisted entity definitions shared by every backend.
pub mod models;
/// Room, participation, game, and score persistence backends.
pub mod room_store;
/// Backend-agnostic storage errors.
pub mod storage;
