/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Argon2 hashing of room passwords.
pub mod password;
/// Room registry, participation, promotion, and completion.
pub mod room_service;
/// Per-hole score ledger and leaderboard.
pub mod score_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events subscription and streaming.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
