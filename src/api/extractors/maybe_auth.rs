use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::member::Member;
use std::sync::Arc;

/// Like AuthMember but an absent or unknown identity is None instead of a
/// rejection: endpoints that are open during bootstrap (first member
/// creation) inspect the option themselves. Storage failures still reject.
pub struct MaybeAuthMember(pub Option<Member>);

impl<S> FromRequestParts<S> for MaybeAuthMember
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let member_id = match parts.headers.get("X-Member-Id").and_then(|v| v.to_str().ok()) {
            Some(id) => id.to_string(),
            None => return Ok(MaybeAuthMember(None)),
        };

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let member = app_state.member_repo.find_by_id(&member_id).await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok(MaybeAuthMember(member))
    }
}
