use std::{convert::Infallible, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo_types::{LogAction, NewUserLog, UserLog};
use crate::{auth::repo_types::User, state::AppState};

const UNKNOWN: &str = "Unknown";

/// Request metadata stored on audit rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip = header("x-real-ip")
            .map(str::to_string)
            .or_else(|| {
                header("x-forwarded-for")
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .or_else(|| peer.map(|p| p.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Self {
            ip_address: ip.strip_prefix("::ffff:").unwrap_or(&ip).to_string(),
            user_agent,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientInfo::from_parts(&parts.headers, peer))
    }
}

/// Last 8 characters of a token; correlates a logout with its login.
pub fn token_id(token: &str) -> String {
    let start = token
        .char_indices()
        .rev()
        .nth(7)
        .map(|(i, _)| i)
        .unwrap_or(0);
    token[start..].to_string()
}

/// Whole minutes between `login` and `logout`, rounded to nearest.
pub fn session_minutes(login: OffsetDateTime, logout: OffsetDateTime) -> i64 {
    let ms = (logout - login).whole_milliseconds() as f64;
    (ms / 60_000.0).round() as i64
}

/// Appends a login row. Failures are logged and swallowed.
pub async fn record_login(
    state: &AppState,
    user: &User,
    token: &str,
    client: &ClientInfo,
) -> Option<UserLog> {
    let entry = NewUserLog {
        user_id: user.id,
        user_name: user.full_name.clone(),
        user_email: user.email.clone(),
        role: user.role,
        action: LogAction::Login,
        login_time: Some(OffsetDateTime::now_utc()),
        logout_time: None,
        token_id: token_id(token),
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
        session_duration: None,
    };

    match state.logs.insert(entry).await {
        Ok(row) => {
            debug!(user_id = %user.id, token_id = %row.token_id, "login recorded");
            Some(row)
        }
        Err(e) => {
            warn!(error = ?e, user_id = %user.id, "failed to record login");
            None
        }
    }
}

/// Appends a logout row paired with the newest login row for the same token id.
/// Failures are logged and swallowed.
pub async fn record_logout(
    state: &AppState,
    user_id: Uuid,
    token: &str,
    client: &ClientInfo,
) -> Option<UserLog> {
    match try_record_logout(state, user_id, token, client).await {
        Ok(row) => row,
        Err(e) => {
            warn!(error = ?e, %user_id, "failed to record logout");
            None
        }
    }
}

async fn try_record_logout(
    state: &AppState,
    user_id: Uuid,
    token: &str,
    client: &ClientInfo,
) -> anyhow::Result<Option<UserLog>> {
    let Some(user) = state.users.find_by_id(user_id).await? else {
        debug!(%user_id, "logout for unknown user; nothing recorded");
        return Ok(None);
    };

    let token_id = token_id(token);
    let now = OffsetDateTime::now_utc();
    let session_duration = state
        .logs
        .latest_login(user_id, &token_id)
        .await?
        .and_then(|login| login.login_time)
        .map(|login_time| session_minutes(login_time, now));

    let row = state
        .logs
        .insert(NewUserLog {
            user_id: user.id,
            user_name: user.full_name,
            user_email: user.email,
            role: user.role,
            action: LogAction::Logout,
            login_time: None,
            logout_time: Some(now),
            token_id,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            session_duration,
        })
        .await?;
    debug!(%user_id, session_duration = ?row.session_duration, "logout recorded");
    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use time::macros::datetime;

    #[test]
    fn token_id_is_last_eight_chars() {
        assert_eq!(token_id("aaaa.bbbb.ccccDEFGHIJK"), "DEFGHIJK");
        assert_eq!(token_id("short"), "short");
        assert_eq!(token_id(""), "");
    }

    #[test]
    fn session_minutes_rounds_to_nearest() {
        let login = datetime!(2025-01-01 10:00:00 UTC);
        assert_eq!(session_minutes(login, datetime!(2025-01-01 10:00:20 UTC)), 0);
        assert_eq!(session_minutes(login, datetime!(2025-01-01 10:00:30 UTC)), 1);
        assert_eq!(session_minutes(login, datetime!(2025-01-01 10:45:10 UTC)), 45);
        assert_eq!(session_minutes(login, datetime!(2025-01-01 12:00:00 UTC)), 120);
    }

    #[test]
    fn client_prefers_real_ip_then_forwarded_for() {
        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        assert_eq!(ClientInfo::from_parts(&h, Some(peer)).ip_address, "203.0.113.7");

        h.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(ClientInfo::from_parts(&h, Some(peer)).ip_address, "198.51.100.2");
    }

    #[test]
    fn client_falls_back_to_peer_and_unknown() {
        let h = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.1:5000".parse().unwrap();
        let info = ClientInfo::from_parts(&h, Some(peer));
        assert_eq!(info.ip_address, "192.0.2.1");
        assert_eq!(info.user_agent, "Unknown");

        assert_eq!(ClientInfo::from_parts(&h, None).ip_address, "Unknown");
    }

    #[test]
    fn client_strips_ipv4_mapped_prefix() {
        let mut h = HeaderMap::new();
        h.insert("x-real-ip", HeaderValue::from_static("::ffff:192.0.2.9"));
        h.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let info = ClientInfo::from_parts(&h, None);
        assert_eq!(info.ip_address, "192.0.2.9");
        assert_eq!(info.user_agent, "curl/8.5");
    }
}
