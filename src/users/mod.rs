use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod mailer;
pub mod repo;
pub mod repo_types;

pub use mailer::{LogMailer, Mailer};
pub use repo::{PgUserRepo, UserRepo};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
