use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::verify_password,
        repo_types::Role,
        services::{create_account, normalize_email},
    },
    error::{ApiError, ApiJson},
    logs::service::{record_login, record_logout, ClientInfo},
    response::Envelope,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Envelope<RegisterResponse>), ApiError> {
    let user = create_account(&state, payload, Role::User).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Envelope::data(RegisterResponse {
            token,
            user: user.into(),
        })
        .with_message("User registered successfully"),
    ))
}

#[instrument(skip(state, payload, client))]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Envelope<LoginResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".into(),
        ));
    }

    let invalid = || ApiError::BadRequest("Invalid email or password".into());

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(invalid());
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;

    record_login(&state, &user, &token, &client).await;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Envelope::data(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
        full_name: user.full_name,
    })
    .with_message("Login successful"))
}

#[instrument(skip(state, user, client), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    client: ClientInfo,
) -> Envelope<()> {
    record_logout(&state, user.id, &user.token, &client).await;
    info!("user logged out");
    Envelope::message("Logged out successfully")
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Envelope<PublicUser>, ApiError> {
    let found = state.users.find_by_id(user.id).await?.ok_or_else(|| {
        warn!(user_id = %user.id, "token for missing user");
        ApiError::Unauthorized("User not found".into())
    })?;
    Ok(Envelope::data(found.into()))
}
