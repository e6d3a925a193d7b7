use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo::{IssueRepo, PgIssueRepo};

pub fn router() -> Router<AppState> {
    handlers::issue_routes()
}
