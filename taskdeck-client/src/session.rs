/// Session store
///
/// This module tracks who is logged in. The store owns the [`User`] record
/// and the persisted credentials; everything else in the client reads the
/// session through a snapshot or reacts to it through a subscription.
///
/// # State Machine
///
/// ```text
/// Unauthenticated ──login──▶ Authenticated(User)
///        ▲                          │
///        └────────logout────────────┘
///
/// restore(): Unauthenticated ──▶ Authenticated(User)   (stored session)
///                             └─▶ Unauthenticated      (nothing stored)
/// ```
///
/// A `loading` flag marks the transient phase while startup restoration or
/// a login/register call is in flight; it is not a separate externally
/// observable state.
///
/// # Transitions and persistence
///
/// - `restore()` adopts a stored user without a server round-trip; the
///   token is trusted until a request proves otherwise.
/// - `login()` persists the token and user record on success.
/// - `register()` never authenticates; callers redirect to login.
/// - `logout()` clears both persisted keys and is idempotent.
///
/// Every transition is pushed to all current subscribers before the call
/// that caused it resolves, so dependent state (the task store, views)
/// reacts deterministically.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskdeck_client::config::Config;
/// use taskdeck_client::credentials::{CredentialStore, FileCredentialStore};
/// use taskdeck_client::session::SessionStore;
/// use taskdeck_client::transport::Transport;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let credentials: Arc<dyn CredentialStore> =
///     Arc::new(FileCredentialStore::new(FileCredentialStore::default_path()));
/// let transport = Arc::new(Transport::new(&config, credentials.clone())?);
///
/// let session = SessionStore::new(transport, credentials);
/// session.restore().await?;
///
/// if let Some(user) = session.current_user() {
///     println!("Signed in as {}", user.email);
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use taskdeck_shared::models::user::User;
use validator::Validate;

use crate::credentials::{keys, CredentialStore};
use crate::error::ClientResult;
use crate::transport::Transport;

/// Snapshot of the session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// The authenticated user, if any
    pub user: Option<User>,

    /// True while restoration or a login/register call is in flight
    pub loading: bool,
}

impl SessionState {
    /// True when a user is logged in
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        // Loading until restore() has looked at persistent storage.
        SessionState {
            user: None,
            loading: true,
        }
    }
}

/// Login request body
#[derive(Debug, Serialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response body
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent requests
    pub token: String,

    /// The authenticated user
    pub user: User,
}

/// Register request body
#[derive(Debug, Serialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (will be validated for length)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

type Observer = Box<dyn Fn(&SessionState) + Send + Sync>;

struct SessionInner {
    transport: Arc<Transport>,
    credentials: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
    observers: RwLock<Vec<Observer>>,
}

/// Reactive store for the authenticated session
///
/// Cheap to clone; clones share state and subscriptions.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Creates a store in the loading state
    ///
    /// Call [`restore`](Self::restore) once at startup to hydrate from
    /// persistent storage.
    pub fn new(transport: Arc<Transport>, credentials: Arc<dyn CredentialStore>) -> Self {
        SessionStore {
            inner: Arc::new(SessionInner {
                transport,
                credentials,
                state: RwLock::new(SessionState::default()),
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.inner.state.read().unwrap().clone()
    }

    /// The authenticated user, if any
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.read().unwrap().user.clone()
    }

    /// True while restoration or a login/register call is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.state.read().unwrap().loading
    }

    /// Registers an observer called on every state transition
    ///
    /// Observers run synchronously inside the transition, before the
    /// operation that caused it resolves. Subscriptions last for the
    /// lifetime of the store.
    pub fn subscribe(&self, observer: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.inner.observers.write().unwrap().push(Box::new(observer));
    }

    /// Restores the session persisted by a previous login
    ///
    /// Reads the stored user record and adopts it directly; no server
    /// round-trip happens here, an invalid token only surfaces once a
    /// request fails. Nothing stored (or an unreadable record) leaves the
    /// store unauthenticated. Always clears the loading flag.
    pub async fn restore(&self) -> ClientResult<Option<User>> {
        let stored = match self.inner.credentials.get(keys::USER).await {
            Ok(stored) => stored,
            Err(e) => {
                self.transition(None, false);
                return Err(e.into());
            }
        };

        match stored {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "Restored session from storage");
                    self.transition(Some(user.clone()), false);
                    Ok(Some(user))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user record is unreadable, starting unauthenticated");
                    self.transition(None, false);
                    Ok(None)
                }
            },
            None => {
                self.transition(None, false);
                Ok(None)
            }
        }
    }

    /// Logs in with email and password
    ///
    /// On success the token and user record are persisted and the store
    /// becomes authenticated. On failure the store stays unauthenticated
    /// and the error is returned for the caller to display; nothing is
    /// retried.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        self.transition(self.current_user(), true);

        match self.perform_login(&request).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Login succeeded");
                self.transition(Some(user.clone()), false);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                self.transition(None, false);
                Err(e)
            }
        }
    }

    async fn perform_login(&self, request: &LoginRequest) -> ClientResult<User> {
        let response: LoginResponse = self
            .inner
            .transport
            .post("/api/auth/login", request)
            .await?;

        self.inner
            .credentials
            .set(keys::TOKEN, &response.token)
            .await?;
        let raw = serde_json::to_string(&response.user)?;
        self.inner.credentials.set(keys::USER, &raw).await?;

        Ok(response.user)
    }

    /// Registers a new account
    ///
    /// Does not log in: the session state is unchanged either way, and the
    /// caller redirects to login on success. A failure carries the server's
    /// literal response body so it can be shown verbatim.
    pub async fn register(&self, email: &str, password: &str) -> ClientResult<()> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        request.validate()?;

        self.transition(self.current_user(), true);

        let result = self
            .inner
            .transport
            .post_discard("/api/users", &request)
            .await;

        if let Err(ref e) = result {
            tracing::warn!(error = %e, "Registration failed");
        }

        self.transition(self.current_user(), false);
        result
    }

    /// Logs out
    ///
    /// Unconditionally clears the persisted token and user record and sets
    /// the store unauthenticated, whatever the previous state was. The
    /// state transition happens even if storage cleanup fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self
            .inner
            .credentials
            .remove_all(&[keys::TOKEN, keys::USER])
            .await;

        tracing::info!("Logged out");
        self.transition(None, false);

        result.map_err(Into::into)
    }

    /// Applies a transition and notifies all subscribers before returning
    fn transition(&self, user: Option<User>, loading: bool) {
        let snapshot = {
            let mut state = self.inner.state.write().unwrap();
            state.user = user;
            state.loading = loading;
            state.clone()
        };

        for observer in self.inner.observers.read().unwrap().iter() {
            observer(&snapshot);
        }
    }
}
