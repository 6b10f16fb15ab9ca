//! Credential exchange against `POST {base}users/login`.

use serde::Deserialize;
use thiserror::Error;

use super::{Session, SessionProvider};
use crate::transport::{endpoint, HttpRequest, HttpTransport};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Login failed. Please try again later.")]
    Unavailable(String),

    #[error("Could not save the session: {0}")]
    Store(String),
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    name: Option<String>,
    token: Option<String>,
}

/// Exchange credentials for a session and store it.
///
/// Any response without both `name` and `token` counts as rejected
/// credentials, whatever the status code.
pub async fn login(
    transport: &dyn HttpTransport,
    sessions: &dyn SessionProvider,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<Session, LoginError> {
    let request = HttpRequest::post(endpoint(base_url, "users/login")).json(serde_json::json!({
        "username": username,
        "password": password,
    }));

    let response = transport.request(request).await.map_err(|e| {
        tracing::warn!("Login request failed: {}", e);
        LoginError::Unavailable(e.to_string())
    })?;

    let parsed: Option<LoginResponse> = serde_json::from_value(response.json).ok();
    let session = match parsed {
        Some(LoginResponse {
            name: Some(name),
            token: Some(token),
        }) if response.status < 300 && !token.is_empty() => Session::new(token, name),
        _ => {
            tracing::info!("Login rejected for {} (status {})", username, response.status);
            return Err(LoginError::InvalidCredentials);
        }
    };

    sessions
        .store_session(session.clone())
        .map_err(|e| LoginError::Store(e.to_string()))?;
    Ok(session)
}

/// Forget the stored session.
pub fn logout(sessions: &dyn SessionProvider) -> crate::error::Result<()> {
    sessions.clear_session()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use crate::transport::mock::{MockTransport, Scripted};
    use crate::transport::{HttpMethod, TransportError};

    const BASE: &str = "http://dash.test/";

    #[tokio::test]
    async fn test_login_stores_session() {
        let transport = MockTransport::new();
        transport.once(
            HttpMethod::Post,
            "http://dash.test/users/login",
            Scripted::ok(200, serde_json::json!({ "name": "Ada", "token": "tok-1" })),
        );
        let store = MemorySessionStore::new();

        let session = login(&transport, &store, BASE, "ada", "pw").await.unwrap();

        assert_eq!(session, Session::new("tok-1", "Ada"));
        assert_eq!(store.get_session(), Some(session));
        let call = &transport.calls()[0];
        assert_eq!(
            call.body,
            Some(serde_json::json!({ "username": "ada", "password": "pw" }))
        );
        assert!(call.header("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let transport = MockTransport::new();
        transport.once(
            HttpMethod::Post,
            "http://dash.test/users/login",
            Scripted::ok(401, serde_json::json!({ "error": "bad credentials" })),
        );
        let store = MemorySessionStore::new();

        let err = login(&transport, &store, BASE, "ada", "nope")
            .await
            .unwrap_err();

        assert_eq!(err, LoginError::InvalidCredentials);
        assert_eq!(err.to_string(), "Invalid username or password.");
        assert!(store.get_session().is_none());
    }

    #[tokio::test]
    async fn test_login_unreachable() {
        let transport = MockTransport::new();
        transport.once(
            HttpMethod::Post,
            "http://dash.test/users/login",
            Scripted::err(TransportError::Network("connection refused".to_string())),
        );
        let store = MemorySessionStore::new();

        let err = login(&transport, &store, BASE, "ada", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed. Please try again later.");
    }

    #[test]
    fn test_logout_clears_store() {
        let store = MemorySessionStore::with_session(Session::new("t", "Ada"));
        logout(&store).unwrap();
        assert!(store.get_session().is_none());
    }
}
