use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthMember;
use crate::api::dtos::{
    requests::{CreateEventRequest, EventListQuery, UpdateEventRequest},
    responses::EventDetailResponse,
};
use crate::domain::models::event::{Event, NewEventParams};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if payload.end_time <= payload.start_time {
        return Err(AppError::Validation("End time must be after start time".into()));
    }
    if let Some(cap) = payload.max_capacity {
        if cap <= 0 {
            return Err(AppError::Validation("Capacity must be a positive number".into()));
        }
    }

    let event = Event::new(NewEventParams {
        title: payload.title,
        description: payload.description.unwrap_or_default(),
        location: payload.location.unwrap_or_default(),
        start_time: payload.start_time,
        end_time: payload.end_time,
        max_capacity: payload.max_capacity,
        created_by: member.id.clone(),
    });

    let created = state.event_repo.create(&event).await?;
    info!("Event created: {} by {}", created.id, member.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list(params.include_cancelled.unwrap_or(false)).await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_by_id(&event_id).await?
        .ok_or(AppError::EventNotFound)?;

    let confirmed_count = state.rsvp_repo.count_confirmed(&event_id).await?;

    Ok(Json(EventDetailResponse { event, confirmed_count }))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let mut event = state.event_repo.find_by_id(&event_id).await?
        .ok_or(AppError::EventNotFound)?;

    if event.is_cancelled() {
        return Err(AppError::EventCancelled);
    }

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        event.title = title;
    }
    if let Some(description) = payload.description { event.description = description; }
    if let Some(location) = payload.location { event.location = location; }
    if let Some(start) = payload.start_time { event.start_time = start; }
    if let Some(end) = payload.end_time { event.end_time = end; }

    if event.end_time <= event.start_time {
        return Err(AppError::Validation("End time must be after start time".into()));
    }

    if let Some(cap) = payload.max_capacity {
        if cap < 0 {
            return Err(AppError::Validation("Capacity must be a positive number".into()));
        }
        // 0 clears the limit; the repository rejects a shrink below the
        // confirmed count atomically with the write
        event.max_capacity = if cap == 0 { None } else { Some(cap) };
    }

    let updated = state.event_repo.update(&event).await?;
    info!("Event updated: {}", updated.id);
    Ok(Json(updated))
}

pub async fn cancel_event(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let cancelled = state.event_repo.cancel(&event_id).await?;
    info!("Event cancelled: {} by {}", cancelled.id, member.id);
    Ok(Json(cancelled))
}
