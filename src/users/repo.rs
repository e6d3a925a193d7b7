use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Inserts a new unverified user. Email uniqueness is enforced by the store.
    async fn create(&self, new: NewUser) -> Result<User, CreateUserError>;
    /// Replaces any outstanding verification code.
    async fn set_otp(&self, id: Uuid, code: &str, expires_at: OffsetDateTime)
        -> anyhow::Result<()>;
    /// Counts a wrong code; the code is discarded once `max_attempts` is reached.
    async fn record_otp_failure(&self, id: Uuid, max_attempts: i32) -> anyhow::Result<()>;
    /// Marks the user verified and clears the verification code.
    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, user_type, department, \
                            is_verified, otp_code, otp_expires_at, otp_attempts, created_at";

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, CreateUserError> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, user_type, department)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.user_type)
        .bind(&new.department)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CreateUserError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn set_otp(
        &self,
        id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET otp_code = $2, otp_expires_at = $3, otp_attempts = 0
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .context("store otp")?;
        Ok(())
    }

    async fn record_otp_failure(&self, id: Uuid, max_attempts: i32) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET otp_attempts = otp_attempts + 1,
                   otp_code = CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE otp_code END,
                   otp_expires_at =
                       CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE otp_expires_at END
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .execute(&self.db)
        .await
        .context("record otp failure")?;
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL, otp_attempts = 0
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("mark user verified")?;
        Ok(user)
    }
}
