use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::storage::TokenStorage;

/// Source of truth for "who owns this token".
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<User, ApiError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.with_token(token.to_string()).me().await
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not logged in")]
    NotAuthenticated,

    /// A login or logout happened while the request was in flight, so its
    /// response no longer describes the current session.
    #[error("Session changed before the response arrived")]
    Superseded,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// The client's belief about the current identity and its credential.
///
/// `user` is present iff `token` is present and was accepted by the backend.
/// `loading` is set during the startup restore and during `refresh_user`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
}

impl Session {
    /// State at process start, before `restore` has settled.
    pub fn initializing() -> Self {
        Self {
            token: None,
            user: None,
            loading: true,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.user, self.loading) {
            (Some(_), _) => SessionState::Authenticated,
            (None, true) => SessionState::Initializing,
            (None, false) => SessionState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Owns the session and is its only writer.
///
/// Readers take snapshots or subscribe to changes; every command replaces the
/// published value in one step. Each `login`/`logout` bumps a generation
/// counter, and responses to `restore`/`refresh_user` issued under an older
/// generation are dropped. Callers that run their own requests can tag them
/// with `generation()` and apply the same check.
pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    storage: Box<dyn TokenStorage>,
    state: watch::Sender<Session>,
    writer: Mutex<WriterState>,
}

#[derive(Debug, Default)]
struct WriterState {
    generation: u64,
    /// `refresh_user` calls in flight under the current generation
    refreshes: usize,
}

impl WriterState {
    /// Start a new session identity. In-flight refreshes belong to the old one.
    fn advance(&mut self) {
        self.generation += 1;
        self.refreshes = 0;
    }
}

impl SessionStore {
    pub fn new(backend: Arc<dyn AuthBackend>, storage: Box<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(Session::initializing());
        Self {
            backend,
            storage,
            state,
            writer: Mutex::new(WriterState::default()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Identity of the current session; changes on every login and logout.
    pub fn generation(&self) -> u64 {
        self.writer().generation
    }

    /// Holding this guard serializes writers.
    fn writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persisted_token(&self) -> Option<String> {
        match self.storage.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn forget_persisted_token(&self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }

    /// Restore the session from the persisted token. Called once at startup.
    ///
    /// Any failure to confirm the token (rejected, unknown user, network)
    /// leaves the session logged out and removes the stored token.
    pub async fn restore(&self) -> SessionState {
        let issued = {
            let writer = self.writer();
            self.state.send_modify(|s| s.loading = true);
            writer.generation
        };

        let Some(token) = self.persisted_token() else {
            let writer = self.writer();
            if writer.generation == issued {
                self.state.send_replace(Session::default());
            }
            debug!("No stored token, starting logged out");
            return self.snapshot().state();
        };

        let result = self.backend.current_user(&token).await;

        let writer = self.writer();
        if writer.generation != issued {
            debug!("Session changed during restore, discarding response");
            return self.snapshot().state();
        }

        match result {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                self.state.send_replace(Session {
                    token: Some(token),
                    user: Some(user),
                    loading: false,
                });
            }
            Err(e) => {
                info!(error = %e, "Stored session not accepted, logging out");
                self.forget_persisted_token();
                self.state.send_replace(Session::default());
            }
        }
        self.snapshot().state()
    }

    /// Establish a session from a successful login exchange.
    pub fn login(&self, token: String, user: User) {
        let mut writer = self.writer();
        writer.advance();

        if let Err(e) = self.storage.save(&token) {
            warn!(error = %e, "Failed to persist token, session will not survive restart");
        }

        info!(user_id = user.id, "Logged in");
        self.state.send_replace(Session {
            token: Some(token),
            user: Some(user),
            loading: false,
        });
    }

    /// Drop the session. Calling this while logged out changes nothing.
    pub fn logout(&self) {
        let mut writer = self.writer();
        writer.advance();

        self.forget_persisted_token();
        if self.state.borrow().user.is_some() {
            info!("Logged out");
        }
        self.state.send_replace(Session::default());
    }

    /// Re-fetch the current user after a profile change.
    ///
    /// On failure the previous user stays in place; a stale profile is not
    /// treated as an invalid session. `loading` stays set until the last of
    /// several overlapping refreshes has answered.
    pub async fn refresh_user(&self) -> Result<User, AuthError> {
        let (token, issued) = {
            let mut writer = self.writer();
            let token = self
                .state
                .borrow()
                .token
                .clone()
                .ok_or(AuthError::NotAuthenticated)?;
            writer.refreshes += 1;
            self.state.send_modify(|s| s.loading = true);
            (token, writer.generation)
        };

        let result = self.backend.current_user(&token).await;

        let mut writer = self.writer();
        if writer.generation != issued {
            debug!("Session changed during refresh, discarding response");
            return Err(AuthError::Superseded);
        }
        writer.refreshes = writer.refreshes.saturating_sub(1);
        let still_loading = writer.refreshes > 0;

        match result {
            Ok(user) => {
                debug!(user_id = user.id, "User refreshed");
                let fresh = user.clone();
                self.state.send_modify(|s| {
                    s.user = Some(fresh);
                    s.loading = still_loading;
                });
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh user");
                self.state.send_modify(|s| s.loading = still_loading);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use crate::auth::storage::{MemoryTokenStorage, StorageError};

    /// Backend that knows a fixed set of tokens.
    #[derive(Default)]
    struct FakeBackend {
        users: Mutex<HashMap<String, User>>,
        calls: AtomicUsize,
        down: std::sync::atomic::AtomicBool,
        gate: Option<Arc<Notify>>,
    }

    impl FakeBackend {
        fn with_user(token: &str, user: User) -> Self {
            let backend = Self::default();
            backend.set_user(token, user);
            backend
        }

        fn set_user(&self, token: &str, user: User) {
            self.users.lock().unwrap().insert(token.to_string(), user);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn current_user(&self, token: &str) -> Result<User, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            if self.down.load(Ordering::SeqCst) {
                return Err(ApiError::ServerError("backend down".to_string()));
            }
            self.users
                .lock()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(ApiError::Unauthorized)
        }
    }

    /// Storage shared between the store and the test for inspection.
    #[derive(Clone, Default)]
    struct SharedStorage(Arc<MemoryTokenStorage>);

    impl TokenStorage for SharedStorage {
        fn load(&self) -> Result<Option<String>, StorageError> {
            self.0.load()
        }
        fn save(&self, token: &str) -> Result<(), StorageError> {
            self.0.save(token)
        }
        fn clear(&self) -> Result<(), StorageError> {
            self.0.clear()
        }
    }

    fn store_with(backend: Arc<FakeBackend>, stored: Option<&str>) -> (SessionStore, SharedStorage) {
        let storage = SharedStorage(Arc::new(match stored {
            Some(t) => MemoryTokenStorage::with_token(t),
            None => MemoryTokenStorage::default(),
        }));
        let store = SessionStore::new(backend, Box::new(storage.clone()));
        (store, storage)
    }

    #[test]
    fn test_new_store_is_initializing() {
        let (store, _) = store_with(Arc::new(FakeBackend::default()), None);
        let session = store.snapshot();
        assert!(session.loading);
        assert_eq!(session.state(), SessionState::Initializing);
    }

    #[tokio::test]
    async fn restore_without_token_makes_no_call() {
        let backend = Arc::new(FakeBackend::default());
        let (store, _) = store_with(backend.clone(), None);

        let state = store.restore().await;

        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(backend.calls(), 0);
        let session = store.snapshot();
        assert!(!session.loading);
        assert!(session.user.is_none());
    }

    #[tokio::test]
    async fn restore_with_valid_token_populates_user() {
        let backend = Arc::new(FakeBackend::with_user("abc123", User::new(1).with_nickname("A")));
        let (store, _) = store_with(backend.clone(), Some("abc123"));

        let state = store.restore().await;

        assert_eq!(state, SessionState::Authenticated);
        let session = store.snapshot();
        assert!(!session.loading);
        assert_eq!(session.token(), Some("abc123"));
        assert_eq!(session.user().map(|u| u.id), Some(1));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn restore_with_rejected_token_clears_everything() {
        let backend = Arc::new(FakeBackend::default());
        let (store, storage) = store_with(backend, Some("expired"));

        let state = store.restore().await;

        assert_eq!(state, SessionState::Unauthenticated);
        let session = store.snapshot();
        assert!(session.token.is_none());
        assert!(session.user.is_none());
        assert!(!session.loading);
        assert_eq!(storage.load().unwrap(), None);
    }

    #[tokio::test]
    async fn restore_with_backend_down_logs_out() {
        let backend = Arc::new(FakeBackend::with_user("abc123", User::new(1)));
        backend.down.store(true, Ordering::SeqCst);
        let (store, storage) = store_with(backend, Some("abc123"));

        assert_eq!(store.restore().await, SessionState::Unauthenticated);
        assert_eq!(storage.load().unwrap(), None);
    }

    #[tokio::test]
    async fn login_then_logout_clears_session() {
        let (store, storage) = store_with(Arc::new(FakeBackend::default()), None);
        store.restore().await;

        store.login("tok1".to_string(), User::new(2));
        assert!(store.snapshot().is_authenticated());
        assert_eq!(storage.load().unwrap().as_deref(), Some("tok1"));

        store.logout();
        let session = store.snapshot();
        assert!(session.token.is_none());
        assert!(session.user.is_none());
        assert_eq!(storage.load().unwrap(), None);

        // Idempotent
        store.logout();
        assert_eq!(store.snapshot(), Session::default());
    }

    #[tokio::test]
    async fn subscribers_see_login_immediately() {
        let (store, _) = store_with(Arc::new(FakeBackend::default()), None);
        let mut rx = store.subscribe();

        store.login("tok1".to_string(), User::new(2));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().user.as_ref().map(|u| u.id), Some(2));
    }

    #[tokio::test]
    async fn refresh_replaces_user() {
        let backend = Arc::new(FakeBackend::with_user("tok", User::new(5).with_nickname("old")));
        let (store, _) = store_with(backend.clone(), None);
        store.login("tok".to_string(), User::new(5).with_nickname("old"));

        backend.set_user("tok", User::new(5).with_nickname("new"));
        let user = store.refresh_user().await.expect("refresh");

        assert_eq!(user.nickname.as_deref(), Some("new"));
        let session = store.snapshot();
        assert_eq!(session.user().and_then(|u| u.nickname.as_deref()), Some("new"));
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_previous_user() {
        let backend = Arc::new(FakeBackend::default());
        let (store, _) = store_with(backend.clone(), None);
        store.login("tok".to_string(), User::new(5).with_nickname("kept"));
        backend.down.store(true, Ordering::SeqCst);

        let err = store.refresh_user().await.expect_err("backend down");

        assert!(matches!(err, AuthError::Api(_)));
        let session = store.snapshot();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.user().and_then(|u| u.nickname.as_deref()), Some("kept"));
        assert_eq!(session.token(), Some("tok"));
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn refresh_requires_session() {
        let (store, _) = store_with(Arc::new(FakeBackend::default()), None);
        store.restore().await;
        assert!(matches!(store.refresh_user().await, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn overlapping_refreshes_stay_loading_until_last_answers() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend {
            gate: Some(gate.clone()),
            ..FakeBackend::with_user("tok", User::new(5))
        });
        let (store, _) = store_with(backend.clone(), None);
        let store = Arc::new(store);
        store.login("tok".to_string(), User::new(5));

        let spawn_refresh = || {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_user().await })
        };
        let first = spawn_refresh();
        let second = spawn_refresh();
        while backend.calls() < 2 {
            tokio::task::yield_now().await;
        }

        gate.notify_one();
        while !first.is_finished() && !second.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(store.snapshot().loading);

        gate.notify_one();
        first.await.unwrap().expect("first refresh");
        second.await.unwrap().expect("second refresh");
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn generation_changes_on_login_and_logout_only() {
        let backend = Arc::new(FakeBackend::with_user("tok", User::new(5)));
        let (store, _) = store_with(backend, Some("tok"));

        let start = store.generation();
        store.restore().await;
        store.refresh_user().await.expect("refresh");
        assert_eq!(store.generation(), start);

        store.logout();
        let after_logout = store.generation();
        assert_ne!(after_logout, start);

        store.login("tok".to_string(), User::new(5));
        assert_ne!(store.generation(), after_logout);
    }

    #[tokio::test]
    async fn stale_restore_does_not_resurrect_session() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(FakeBackend {
            gate: Some(gate.clone()),
            ..FakeBackend::with_user("abc123", User::new(1))
        });
        let (store, storage) = store_with(backend.clone(), Some("abc123"));
        let store = Arc::new(store);

        let restoring = tokio::spawn({
            let store = store.clone();
            async move { store.restore().await }
        });

        while backend.calls() == 0 {
            tokio::task::yield_now().await;
        }
        store.logout();
        gate.notify_one();
        restoring.await.unwrap();

        let session = store.snapshot();
        assert!(session.user.is_none());
        assert!(session.token.is_none());
        assert!(!session.loading);
        assert_eq!(storage.load().unwrap(), None);
    }
}
