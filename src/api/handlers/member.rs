use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthMember, maybe_auth::MaybeAuthMember};
use crate::api::dtos::requests::CreateMemberRequest;
use crate::domain::models::member::Member;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_member(
    State(state): State<Arc<AppState>>,
    MaybeAuthMember(actor): MaybeAuthMember,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(AppError::Validation("Name and email are required".into()));
    }

    // an empty directory bootstraps itself: the first member becomes admin
    let bootstrap = state.member_repo.count().await? == 0;

    match &actor {
        _ if bootstrap => {}
        Some(m) if m.is_admin() => {}
        Some(_) => return Err(AppError::Forbidden("Admin role required".into())),
        None => return Err(AppError::Unauthorized),
    }

    let role = if bootstrap {
        "ADMIN".to_string()
    } else {
        let role = payload.role.unwrap_or_else(|| "MEMBER".to_string());
        match role.as_str() {
            "MEMBER" | "ADMIN" => {}
            _ => return Err(AppError::Validation("Invalid role".into())),
        }
        role
    };

    let member = Member::new(payload.name, payload.email, role);
    let created = state.member_repo.create(&member).await?;

    info!("Member created: {} ({})", created.id, created.role);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let members = state.member_repo.list().await?;
    Ok(Json(members))
}

pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    AuthMember(member): AuthMember,
    Path(member_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !member.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    state.member_repo.delete(&member_id).await?;
    info!("Member deleted: {}", member_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn get_me(
    AuthMember(member): AuthMember,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(member))
}
