use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct HealthResponse {
    /// "ok" while a room store is installed, "degraded" otherwise.
    pub status: String,
}

impl HealthResponse {
    /// Build the response matching the current degraded flag.
    pub fn from_degraded(degraded: bool) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
        }
    }
}
