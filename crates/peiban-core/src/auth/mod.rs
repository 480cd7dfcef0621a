//! Authentication module for the client-side session lifecycle.
//!
//! This module provides:
//! - `SessionStore`: the single owner of the current token and user
//! - `guard` / `Router`: route protection over session snapshots
//! - `TokenStorage`: durable storage for the token (file, keychain, memory)
//!
//! The session is restored from the stored token at startup and confirmed
//! against `/auth/me` before any protected screen renders.

pub mod guard;
pub mod session;
pub mod storage;

pub use guard::{guard, GuardDecision, Resolved, Route, Router};
pub use session::{AuthBackend, AuthError, Session, SessionState, SessionStore};
pub use storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, TokenStorage};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClient;
    use crate::models::User;

    async fn store_against(server: &MockServer, stored: Option<&str>) -> SessionStore {
        let api = ApiClient::new(format!("{}/api", server.uri()), std::time::Duration::from_secs(5))
            .expect("build client");
        let storage = match stored {
            Some(token) => MemoryTokenStorage::with_token(token),
            None => MemoryTokenStorage::default(),
        };
        SessionStore::new(Arc::new(api), Box::new(storage))
    }

    #[tokio::test]
    async fn restored_session_renders_protected_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(bearer_token("abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1, "nickname": "A"
            })))
            .mount(&server)
            .await;

        let store = store_against(&server, Some("abc123")).await;
        assert_eq!(guard(&Route::Home, &store.snapshot()), GuardDecision::Wait);

        store.restore().await;

        let session = store.snapshot();
        assert_eq!(session.user().and_then(|u| u.nickname.as_deref()), Some("A"));
        assert_eq!(guard(&Route::Home, &session), GuardDecision::Render);
    }

    #[tokio::test]
    async fn no_stored_token_redirects_once_settled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_against(&server, None).await;
        store.restore().await;

        assert_eq!(
            guard(&Route::Home, &store.snapshot()),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[tokio::test]
    async fn logout_after_login_redirects() {
        let server = MockServer::start().await;
        let store = store_against(&server, None).await;
        store.restore().await;

        store.login("tok1".to_string(), User::new(2));
        assert_eq!(guard(&Route::Profile, &store.snapshot()), GuardDecision::Render);

        store.logout();
        assert_eq!(
            guard(&Route::Profile, &store.snapshot()),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[tokio::test]
    async fn expired_token_is_cleared_on_restore() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "msg": "Token has expired"
            })))
            .mount(&server)
            .await;

        let store = store_against(&server, Some("old")).await;
        assert_eq!(store.restore().await, SessionState::Unauthenticated);
        assert_eq!(store.token(), None);
    }
}
