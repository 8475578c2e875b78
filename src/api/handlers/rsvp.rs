use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthMember;
use crate::api::dtos::requests::RsvpListQuery;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_rsvp(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    info!("RSVP request: member {} for event {}", member.id, event_id);

    let rsvp = state.rsvp_service.create(&event_id, &member.id).await?;
    Ok((StatusCode::CREATED, Json(rsvp)))
}

pub async fn cancel_rsvp(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    info!("RSVP cancel: member {} for event {}", member.id, event_id);

    let outcome = state.rsvp_service.cancel(&event_id, &member.id).await?;
    Ok(Json(outcome))
}

pub async fn list_event_rsvps(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(event_id): Path<String>,
    Query(params): Query<RsvpListQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let rsvps = state.rsvp_service.list_for_event(&event_id, params.status.as_deref()).await?;
    Ok(Json(rsvps))
}

pub async fn my_rsvps(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    let rsvps = state.rsvp_service.list_for_member(&member.id).await?;
    Ok(Json(rsvps))
}
