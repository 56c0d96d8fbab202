//! Authenticated-session lifecycle backed by a [`SessionStore`].
//!
//! A session is either absent or a complete record stored as one JSON value
//! under [`SESSION_STORAGE_KEY`]. It is written whole on login and removed
//! whole on logout or when a downstream call answers 401/403.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{ApiError, CredentialAttempt, ErrorKind, LoginResponse},
    utils::storage::{self as storage_utils, SessionStore},
};

pub const SESSION_STORAGE_KEY: &str = "f1_session";

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[serde(other)]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn from_login(response: LoginResponse) -> Result<Self, ApiError> {
        if response.access_token.trim().is_empty() {
            return Err(ApiError::unknown("Login response did not include a token"));
        }
        let user = response.user;
        let role = user
            .role
            .or_else(|| demo_role_for(&user.username))
            .unwrap_or(Role::Viewer);
        let full_name = user
            .full_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.username.clone());
        Ok(Self {
            username: user.username,
            full_name,
            email: user.email,
            role,
            token: response.access_token,
            created_at: Utc::now(),
        })
    }

    fn from_demo(account: &DemoAccount) -> Self {
        Self {
            username: account.username.to_string(),
            full_name: account.full_name.to_string(),
            email: None,
            role: account.role,
            token: format!("demo-{}", Uuid::new_v4()),
            created_at: Utc::now(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.token.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub full_name: String,
}

struct DemoAccount {
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
}

// Accepted when the identity endpoint fails or rejects the attempt. This is a
// client-side credential bypass kept for offline demos; nothing else may rely
// on it.
const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "admin",
        password: "admin",
        full_name: "F1 Administrator",
        role: Role::Admin,
    },
    DemoAccount {
        username: "admin",
        password: "admin123",
        full_name: "F1 Administrator",
        role: Role::Admin,
    },
    DemoAccount {
        username: "user",
        password: "user123",
        full_name: "F1 User",
        role: Role::User,
    },
    DemoAccount {
        username: "test",
        password: "test",
        full_name: "Test User",
        role: Role::Viewer,
    },
];

fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

fn demo_account(attempt: &CredentialAttempt) -> Option<&'static DemoAccount> {
    let username = normalize_username(&attempt.username);
    DEMO_ACCOUNTS
        .iter()
        .find(|account| account.username == username && account.password == attempt.password)
}

fn demo_role_for(username: &str) -> Option<Role> {
    let username = normalize_username(username);
    DEMO_ACCOUNTS
        .iter()
        .find(|account| account.username == username)
        .map(|account| account.role)
}

/// Remote identity check used by [`SessionManager::login`].
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    async fn authenticate(&self, attempt: &CredentialAttempt) -> Result<LoginResponse, ApiError>;
}

type Listener = Rc<dyn Fn()>;

/// Handle for removing a callback registered with
/// [`SessionManager::on_invalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
pub struct SessionManager {
    store: Rc<dyn SessionStore>,
    listeners: Rc<RefCell<Vec<(ListenerId, Listener)>>>,
    next_listener: Rc<Cell<u64>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(storage_utils::default_store())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: Rc<dyn SessionStore>) -> Self {
        Self {
            store,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Rc::new(Cell::new(0)),
        }
    }

    pub async fn login<A: Authenticator>(
        &self,
        remote: &A,
        attempt: CredentialAttempt,
    ) -> Result<Session, ApiError> {
        if attempt.username.trim().is_empty() || attempt.password.is_empty() {
            return Err(ApiError::auth_rejected("Username and password are required"));
        }

        let remote_error = match remote.authenticate(&attempt).await {
            Ok(response) => match Session::from_login(response) {
                Ok(session) => {
                    self.persist(&session)?;
                    log::info!("Logged in as {} ({})", session.username, session.role);
                    return Ok(session);
                }
                Err(err) => err,
            },
            Err(err) => err,
        };

        if let Some(account) = demo_account(&attempt) {
            log::warn!(
                "Identity endpoint unavailable or rejected {} ({}); using demo account",
                account.username,
                remote_error
            );
            let session = Session::from_demo(account);
            self.persist(&session)?;
            return Ok(session);
        }

        log::info!("Login rejected for {}", attempt.username.trim());
        let message = if remote_error.is_remote() {
            remote_error.error
        } else {
            INVALID_CREDENTIALS.to_string()
        };
        let rejected = ApiError::auth_rejected(message);
        Err(match remote_error.status {
            Some(status) => rejected.with_status(status),
            None => rejected,
        })
    }

    pub fn logout(&self) {
        self.clear();
        log::info!("Logged out");
    }

    pub fn check_auth(&self) -> Result<(), ApiError> {
        match self.read() {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(ApiError::not_authenticated()),
            Err(err) => {
                log::warn!("Discarding stored session: {}", err);
                self.clear();
                Err(ApiError::not_authenticated())
            }
        }
    }

    /// Fails and ends the session when a downstream call answered 401 or 403.
    pub fn check_error(&self, status: u16) -> Result<(), ApiError> {
        if status != 401 && status != 403 {
            return Ok(());
        }
        log::warn!("Received {}; ending session", status);
        self.clear();
        self.notify_invalidated();
        Err(ApiError::auth_required().with_status(status))
    }

    pub fn get_permissions(&self) -> Result<Role, ApiError> {
        self.current()
            .map(|session| session.role)
            .ok_or_else(|| ApiError::new(ErrorKind::NoPermissions, "No permissions available"))
    }

    pub fn get_identity(&self) -> Result<Identity, ApiError> {
        self.current()
            .map(|session| Identity {
                id: session.username,
                full_name: session.full_name,
            })
            .ok_or_else(|| ApiError::new(ErrorKind::NoIdentity, "No identity available"))
    }

    pub fn current(&self) -> Option<Session> {
        self.read().ok().flatten()
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|session| session.token)
    }

    /// Registers a callback run whenever [`check_error`](Self::check_error)
    /// ends the session.
    pub fn on_invalidate(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(listener, _)| *listener != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// `Ok(None)` when logged out; `Err` when something is stored but is not a
    /// usable session.
    fn read(&self) -> Result<Option<Session>, ApiError> {
        let Some(raw) = self.store.get(SESSION_STORAGE_KEY)? else {
            return Ok(None);
        };
        let session: Session = serde_json::from_str(&raw)
            .map_err(|e| ApiError::unknown(format!("Malformed session: {}", e)))?;
        if !session.is_complete() {
            return Err(ApiError::unknown("Incomplete session"));
        }
        Ok(Some(session))
    }

    fn persist(&self, session: &Session) -> Result<(), ApiError> {
        let raw = serde_json::to_string(session)
            .map_err(|_| ApiError::unknown("Failed to serialize session"))?;
        self.store.set(SESSION_STORAGE_KEY, &raw)
    }

    fn clear(&self) {
        if let Err(err) = self.store.remove(SESSION_STORAGE_KEY) {
            log::warn!("Failed to clear session: {}", err);
        }
    }

    fn notify_invalidated(&self) {
        // Listeners may register further listeners, so iterate over a copy.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }
}
