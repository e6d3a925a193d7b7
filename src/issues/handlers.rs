use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CommentRequest, CreateIssueRequest, ListQuery, UpdateIssueRequest},
    repo_types::{Comment, Issue, IssueFilter, IssueStatus, NewIssue, StatusCount},
};
use crate::{
    auth::AuthUser,
    dto::MessageResponse,
    error::{require, AppError, ValidJson},
    state::AppState,
    users::repo_types::GOV_EMPLOYEE,
};

pub fn issue_routes() -> Router<AppState> {
    Router::new()
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/:id", get(get_issue).put(update_issue))
        .route("/issues/:id/upvote", post(upvote_issue))
        .route("/issues/:id/comments", post(add_comment))
        .route("/analytics", get(analytics))
}

fn parse_issue_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid issue ID".into()))
}

fn parse_status(raw: &str) -> Result<IssueStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid status".into()))
}

fn issue_not_found() -> AppError {
    AppError::NotFound("Issue not found".into())
}

async fn require_gov_employee(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    match state.users.find_by_id(user_id).await? {
        Some(user) if user.user_type == GOV_EMPLOYEE => Ok(()),
        _ => {
            warn!(%user_id, "gov-only endpoint denied");
            Err(AppError::forbidden(
                "Access denied. Government employees only.",
            ))
        }
    }
}

#[instrument(skip(state, query))]
pub async fn list_issues(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Issue>>, AppError> {
    let Query(q) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let status = q.status.as_deref().map(parse_status).transpose()?;
    if q.limit.is_some_and(|l| l < 1) || q.offset.is_some_and(|o| o < 0) {
        return Err(AppError::Validation("Invalid pagination".into()));
    }

    let issues = state
        .issues
        .list(&IssueFilter {
            status,
            limit: q.limit,
            offset: q.offset.unwrap_or(0),
        })
        .await?;
    Ok(Json(issues))
}

#[instrument(skip(state, payload))]
pub async fn create_issue(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidJson(payload): ValidJson<CreateIssueRequest>,
) -> Result<(StatusCode, Json<Issue>), AppError> {
    require("category", &payload.category)?;
    require("location", &payload.location)?;
    require("details", &payload.details)?;
    require("department", &payload.department)?;

    let issue = state
        .issues
        .create(NewIssue {
            category: payload.category,
            location: payload.location,
            details: payload.details,
            department: payload.department,
            reported_by: user_id,
        })
        .await?;

    info!(issue_id = %issue.id, %user_id, "issue created");
    Ok((StatusCode::CREATED, Json(issue)))
}

#[instrument(skip(state))]
pub async fn get_issue(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Issue>, AppError> {
    let id = parse_issue_id(&id)?;
    let issue = state
        .issues
        .find_by_id(id)
        .await?
        .ok_or_else(issue_not_found)?;
    Ok(Json(issue))
}

#[instrument(skip(state))]
pub async fn upvote_issue(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_issue_id(&id)?;
    if !state.issues.upvote(id).await? {
        return Err(issue_not_found());
    }
    info!(issue_id = %id, %user_id, "issue upvoted");
    Ok(Json(MessageResponse {
        message: "Upvoted successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<CommentRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_issue_id(&id)?;
    require("text", &payload.text)?;

    let comment = Comment {
        text: payload.text,
        user_id,
        created_at: OffsetDateTime::now_utc(),
    };
    if !state.issues.add_comment(id, comment).await? {
        return Err(issue_not_found());
    }
    info!(issue_id = %id, %user_id, "comment added");
    Ok(Json(MessageResponse {
        message: "Comment added successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_issue(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateIssueRequest>,
) -> Result<Json<Issue>, AppError> {
    require_gov_employee(&state, user_id).await?;
    let id = parse_issue_id(&id)?;
    let status = parse_status(&payload.status)?;

    // Resolution notes only accompany a resolved issue
    let resolution_details = match status {
        IssueStatus::Resolved => payload.resolution_details.filter(|d| !d.trim().is_empty()),
        _ => None,
    };

    let issue = state
        .issues
        .update_status(id, status, resolution_details)
        .await?
        .ok_or_else(issue_not_found)?;

    info!(issue_id = %id, %user_id, %status, "issue status updated");
    Ok(Json(issue))
}

#[instrument(skip(state))]
pub async fn analytics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<StatusCount>>, AppError> {
    require_gov_employee(&state, user_id).await?;
    Ok(Json(state.issues.count_by_status().await?))
}
