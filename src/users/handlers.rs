use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use subtle::ConstantTimeEq;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        LoginRequest, LoginResponse, OtpRequest, PublicUser, SignupRequest, UserResponse,
        VerifyOtpRequest,
    },
    mailer::generate_otp,
    repo::CreateUserError,
    repo_types::{NewUser, User, GOV_EMPLOYEE},
};
use crate::{
    auth::{
        password::{hash_password, verify_password},
        AuthUser,
    },
    dto::MessageResponse,
    error::{require, AppError, ValidJson},
    state::AppState,
};

/// Wrong guesses allowed before an outstanding code is discarded.
const MAX_OTP_ATTEMPTS: i32 = 5;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_user(state: &AppState, email: &str) -> Result<User, AppError> {
    state
        .users
        .find_by_email(email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Stores a fresh code on the user and hands it to the mailer.
async fn issue_otp(state: &AppState, user: &User) -> Result<(), AppError> {
    let code = generate_otp();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(state.config.otp_ttl_minutes);
    state.users.set_otp(user.id, &code, expires_at).await?;
    if let Err(e) = state.mailer.send_otp(&user.email, &code).await {
        warn!(error = %e, user_id = %user.id, "sending otp failed");
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    require("name", &payload.name)?;
    require("email", &payload.email)?;
    require("password", &payload.password)?;
    require("userType", &payload.user_type)?;
    if payload.user_type.trim() == GOV_EMPLOYEE {
        require("department", payload.department.as_deref().unwrap_or_default())
            .map_err(|_| {
                AppError::Validation("Department is required for government employees".into())
            })?;
    }

    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            name: payload.name.trim().to_string(),
            email,
            password_hash,
            user_type: payload.user_type.trim().to_string(),
            department: payload.department.unwrap_or_default(),
        })
        .await
        .map_err(|e| match e {
            CreateUserError::DuplicateEmail => AppError::Conflict("User already exists".into()),
            CreateUserError::Other(e) => AppError::Internal(e),
        })?;

    // The account exists either way; a lost code can be reissued via /request-otp
    if let Err(e) = issue_otp(&state, &user).await {
        error!(error = %e, user_id = %user.id, "issuing otp at signup failed");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    require("email", &payload.email)?;
    require("password", &payload.password)?;
    let email = normalize_email(&payload.email);

    let user = find_user(&state, &email).await.inspect_err(|_| {
        warn!(%email, "login unknown email");
    })?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if !user.is_verified {
        warn!(user_id = %user.id, "login unverified account");
        return Err(AppError::Forbidden {
            message: "Email not verified".into(),
            email: Some(user.email),
        });
    }

    let token = state.jwt.sign(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn request_otp(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<OtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    require("email", &payload.email)?;
    let user = find_user(&state, &normalize_email(&payload.email)).await?;
    issue_otp(&state, &user).await?;
    Ok(Json(MessageResponse {
        message: "OTP sent successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<VerifyOtpRequest>,
) -> Result<Json<UserResponse>, AppError> {
    require("email", &payload.email)?;
    require("otp", &payload.otp)?;
    let user = find_user(&state, &normalize_email(&payload.email)).await?;

    let (Some(code), Some(expires_at)) = (&user.otp_code, user.otp_expires_at) else {
        return Err(AppError::Validation("Invalid OTP".into()));
    };
    if !bool::from(code.as_bytes().ct_eq(payload.otp.trim().as_bytes())) {
        warn!(user_id = %user.id, "otp mismatch");
        state
            .users
            .record_otp_failure(user.id, MAX_OTP_ATTEMPTS)
            .await?;
        return Err(AppError::Validation("Invalid OTP".into()));
    }
    if expires_at < OffsetDateTime::now_utc() {
        return Err(AppError::Validation("OTP has expired".into()));
    }

    let user = state
        .users
        .mark_verified(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "email verified");
    Ok(Json(UserResponse {
        message: "OTP verified successfully",
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}
