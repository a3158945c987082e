//! Session management for the Wedahamine client.
//!
//! The session manager owns the authenticated/anonymous state machine,
//! persists credentials across restarts, and keeps the API client's default
//! Authorization header in sync with every session change. State changes are
//! published through a watch channel so frontends can react without polling.

pub mod otp;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, watch};

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::credentials::{CredentialStore, StoredCredentials};

/// Authentication status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// The restore attempt at process start has not finished yet.
    /// Frontends must not redirect based on this state.
    #[default]
    Unknown,
    /// A valid token is present.
    Authenticated,
    /// No session; the user must log in.
    Anonymous,
}

/// In-memory session state.
///
/// `status` is `Authenticated` iff `token` is present; both only change
/// together, through the session manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub status: AuthStatus,
    /// Bearer credential issued by the server.
    pub token: Option<String>,
    /// Server-returned user payload, stored verbatim.
    pub user: Option<Value>,
}

impl Session {
    fn authenticated(token: String, user: Value) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            token: Some(token),
            user: Some(user),
        }
    }

    fn anonymous() -> Self {
        Self {
            status: AuthStatus::Anonymous,
            token: None,
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}

/// Receiver half of the session state channel.
pub type SessionRx = watch::Receiver<Session>;

/// Payload for the registration endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Orchestrates authentication against the Wedahamine backend.
pub struct SessionManager {
    api: Arc<ApiClient>,
    store: CredentialStore,
    state: watch::Sender<Session>,
    login_gate: Mutex<()>,
}

impl SessionManager {
    /// Creates a session manager over the given API client and credential
    /// store. The session starts out as [`AuthStatus::Unknown`] until
    /// [`Self::restore_session`] runs.
    pub fn new(api: Arc<ApiClient>, store: CredentialStore) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            api,
            store,
            state,
            login_gate: Mutex::new(()),
        }
    }

    /// Returns a snapshot of the current session.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Subscribes to session state changes.
    pub fn subscribe(&self) -> SessionRx {
        self.state.subscribe()
    }

    /// Registers a new account.
    ///
    /// Success does not authenticate the session; the user must log in
    /// explicitly afterwards.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        self.api.post_json_discard("/auth/register", request).await
    }

    /// Logs in with email and password.
    ///
    /// On success the session becomes authenticated, the API client's
    /// default Authorization header is set, and the credentials are
    /// persisted. Persistence is best-effort: a storage failure is logged
    /// and does not undo the login.
    ///
    /// Only one login may be in flight at a time; a concurrent call fails
    /// with a busy error instead of racing on session state.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx response, a
    /// response missing the token field, or a concurrent login.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let Ok(_guard) = self.login_gate.try_lock() else {
            return Err(ApiError::busy("Another login is already in progress"));
        };

        let body = serde_json::json!({ "email": email, "password": password });
        let response: Value = self.api.post_json("/auth/login", &body).await?;

        let token = response
            .pointer("/tokenDto/token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::malformed(
                    "Login response is missing tokenDto.token",
                    Some(&response.to_string()),
                )
            })?
            .to_string();

        // Header and in-memory state change only after the network call has
        // succeeded, never speculatively.
        self.api.set_auth_header(&token);
        let session = Session::authenticated(token.clone(), response.clone());
        self.state.send_replace(session.clone());

        let creds = StoredCredentials {
            token,
            user: response,
        };
        if let Err(err) = self.store.save(&creds) {
            tracing::warn!("failed to persist session credentials: {err:#}");
        }

        tracing::debug!("login succeeded for {email}");
        Ok(session)
    }

    /// Logs out.
    ///
    /// Clears the default Authorization header, resets the session to
    /// anonymous, and removes persisted credentials. Never fails: storage
    /// errors are logged and swallowed (best-effort cleanup).
    pub fn logout(&self) {
        self.api.clear_auth_header();
        self.state.send_replace(Session::anonymous());

        match self.store.clear() {
            Ok(removed) => {
                if removed {
                    tracing::debug!("removed persisted credentials");
                }
            }
            Err(err) => tracing::warn!("failed to remove persisted credentials: {err:#}"),
        }
    }

    /// Restores the session from the credential store.
    ///
    /// Invoked once at process start. Any failure (missing file, unreadable
    /// file, malformed contents) resolves to an anonymous session; restore
    /// itself never errors.
    pub fn restore_session(&self) -> Session {
        let creds = match self.store.load() {
            Ok(creds) => creds,
            Err(err) => {
                tracing::warn!("failed to read stored credentials, treating as logged out: {err:#}");
                None
            }
        };

        let session = match creds {
            Some(creds) => {
                self.api.set_auth_header(&creds.token);
                Session::authenticated(creds.token, creds.user)
            }
            None => Session::anonymous(),
        };

        self.state.send_replace(session.clone());
        session
    }

    /// Requests an OTP dispatch for the given email.
    ///
    /// Does not mutate session state; no token is issued at this stage.
    /// Returns the server's confirmation message when one is provided.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<Option<String>> {
        let body = self
            .api
            .post_query("/auth/forgot-password", &[("email", email.to_string())])
            .await?;

        Ok(body
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string))
    }

    /// Submits the OTP for verification.
    ///
    /// Success confirms the code but does not authenticate; the caller
    /// carries `(email, otp)` forward to the password-reset step.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApiResult<()> {
        let body = serde_json::json!({ "email": email, "otp": otp });
        self.api.post_json_discard("/auth/verify-otp", &body).await
    }

    /// Sets a new password bound to a verified `(email, otp)` pair.
    ///
    /// Success does not authenticate; the user must log in with the new
    /// password afterwards.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let body = serde_json::json!({
            "email": email,
            "otp": otp,
            "newPassword": new_password,
        });
        self.api.post_json_discard("/auth/reset-password", &body).await
    }
}
