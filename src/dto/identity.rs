//! Caller identity forwarded by the session provider in front of the service.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{dao::models::PlayerEntity, error::ServiceError};

/// Header carrying the id of the signed-in user.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the role of the signed-in user.
pub const USER_ROLE_HEADER: &str = "x-user-role";
const ADMIN_ROLE: &str = "admin";

/// Already-resolved caller identity. Anonymous callers have no `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub admin: bool,
}

impl Identity {
    /// Identity of a signed-in user without elevated role.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            admin: false,
        }
    }

    /// Signed-in user id, or [`ServiceError::Unauthorized`] for anonymous callers.
    pub fn require_user(&self) -> Result<&str, ServiceError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ServiceError::Unauthorized(format!("missing `{USER_ID_HEADER}` header")))
    }

    /// Player acting in a room: the signed-in user, otherwise the guest named in the body.
    pub fn player(&self, guest_name: Option<String>) -> Result<PlayerEntity, ServiceError> {
        match (&self.user_id, guest_name) {
            (Some(user_id), _) => Ok(PlayerEntity::User(user_id.clone())),
            (None, Some(name)) => Ok(PlayerEntity::Guest(name)),
            (None, None) => Err(ServiceError::InvalidInput(format!(
                "either the `{USER_ID_HEADER}` header or `guest_name` is required"
            ))),
        }
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER);
        let admin = user_id.is_some()
            && header(parts, USER_ROLE_HEADER).is_some_and(|role| role == ADMIN_ROLE);
        Ok(Self { user_id, admin })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(request: Request<()>) -> Identity {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn reads_user_and_role_headers() {
        let identity = extract(
            Request::builder()
                .header(USER_ID_HEADER, "u-1")
                .header(USER_ROLE_HEADER, "admin")
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(identity.user_id.as_deref(), Some("u-1"));
        assert!(identity.admin);
    }

    #[tokio::test]
    async fn role_without_user_is_not_admin() {
        let identity = extract(
            Request::builder()
                .header(USER_ROLE_HEADER, "admin")
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(identity, Identity::default());
    }

    #[test]
    fn player_prefers_signed_in_user() {
        let identity = Identity::user("u-1");
        assert_eq!(
            identity.player(Some("Sam".into())).unwrap(),
            PlayerEntity::User("u-1".into())
        );
        assert_eq!(
            Identity::default().player(Some("Sam".into())).unwrap(),
            PlayerEntity::Guest("Sam".into())
        );
        assert!(matches!(
            Identity::default().player(None),
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
