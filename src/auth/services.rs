use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::RegisterRequest,
    password::hash_password,
    repo_types::{NewUser, Role, User},
};
use crate::{error::ApiError, state::AppState};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a sign-up payload and persists the account with `role`.
///
/// Shared by self-registration (always `Role::User`) and admin creation.
pub(crate) async fn create_account(
    state: &AppState,
    payload: RegisterRequest,
    role: Role,
) -> Result<User, ApiError> {
    let email = normalize_email(&payload.email);
    let full_name = payload.full_name.trim().to_string();

    let mut errors = Vec::new();
    if full_name.is_empty() {
        errors.push("Full name is required".to_string());
    }
    if !is_valid_email(&email) {
        errors.push("Invalid email".to_string());
    }
    if payload.password.len() < 8 {
        errors.push("Password must be at least 8 characters".to_string());
    }
    if !errors.is_empty() {
        warn!(email = %email, ?errors, "registration rejected");
        return Err(ApiError::validation(errors));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = state
        .users
        .create(NewUser {
            email: email.clone(),
            password_hash,
            full_name,
            role,
        })
        .await?
        .ok_or_else(|| {
            warn!(email = %email, "email registered concurrently");
            ApiError::BadRequest("User already exists".into())
        })?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "account created");
    Ok(user)
}
