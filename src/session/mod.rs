//! Authentication session
//!
//! Exactly one `AuthSession` should exist per running console. It owns the
//! bearer credential and hands it out as a `RequestContext`; stores never see
//! the token storage or each other.

mod token_store;

pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{auth, ApiClient, ApiError, RequestContext};
use crate::models::{User, UserRole};
use crate::routes::Route;

/// Who is using the console
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// A persisted credential is still being checked
    Resolving,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Resolving)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

pub struct AuthSession {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    credential: RwLock<RequestContext>,
    /// Bumped on every sign-in and sign-out; a `/me` check started under an
    /// older generation is ignored
    generation: AtomicU64,
    state: watch::Sender<SessionState>,
    navigation: watch::Sender<Option<Route>>,
}

impl AuthSession {
    /// Create a session in the `Resolving` state; call `initialize` next
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        let (navigation, _) = watch::channel(None);
        Self {
            api,
            tokens,
            credential: RwLock::new(RequestContext::anonymous()),
            generation: AtomicU64::new(0),
            state,
            navigation,
        }
    }

    /// Resolve any persisted token into a signed-in user
    pub async fn initialize(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored credential: {:#}", e);
                None
            }
        };

        let Some(token) = token else {
            info!("No stored credential, starting signed out");
            self.state.send_replace(SessionState::Anonymous);
            return;
        };

        let ctx = RequestContext::with_bearer(token);
        *self.credential.write() = ctx.clone();

        let result = auth::me(&self.api, &ctx).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Session changed while checking stored credential, ignoring result");
            return;
        }

        match result {
            Ok(user) => {
                info!("Resumed session for {}", user.username);
                self.state.send_replace(SessionState::Authenticated(user));
            }
            Err(e) => {
                warn!("Stored credential rejected: {}", e);
                if let Err(e) = self.tokens.clear() {
                    warn!("Failed to discard stored credential: {:#}", e);
                }
                *self.credential.write() = RequestContext::anonymous();
                self.state.send_replace(SessionState::Anonymous);
            }
        }
    }

    /// Exchange credentials for a token. Prior session state is untouched on
    /// failure.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let resp = auth::login(&self.api, username, password).await?;
        Ok(self.establish(resp))
    }

    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User, ApiError> {
        let resp = auth::register(&self.api, username, password, email, role).await?;
        Ok(self.establish(resp))
    }

    pub fn sign_out(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear stored credential: {:#}", e);
        }
        *self.credential.write() = RequestContext::anonymous();
        self.state.send_replace(SessionState::Anonymous);
        self.navigation.send_replace(Some(Route::Login));
        info!("Signed out");
    }

    fn establish(&self, resp: auth::AuthResponse) -> User {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.tokens.save(&resp.token) {
            warn!("Failed to persist credential: {:#}", e);
        }
        *self.credential.write() = RequestContext::with_bearer(resp.token);
        info!("Signed in as {}", resp.user.username);
        self.state
            .send_replace(SessionState::Authenticated(resp.user.clone()));
        self.navigation.send_replace(Some(Route::Dashboard));
        resp.user
    }

    /// Credential for the next outbound request
    pub fn request_context(&self) -> RequestContext {
        self.credential.read().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Latest view the session asked to show
    pub fn navigation(&self) -> watch::Receiver<Option<Route>> {
        self.navigation.subscribe()
    }
}
