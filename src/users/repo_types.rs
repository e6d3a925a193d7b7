use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// `user_type` of accounts allowed to manage issue status and read analytics.
pub const GOV_EMPLOYEE: &str = "gov_employee";

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never exposed
    pub user_type: String,
    pub department: String,
    pub is_verified: bool,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<OffsetDateTime>,
    pub otp_attempts: i32,
    pub created_at: OffsetDateTime,
}

/// Fields supplied at signup; the store fills in the rest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub department: String,
}
