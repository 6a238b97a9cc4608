use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{AdminConfig, AdminCredentials};

/// Opaque bearer token identifying a signed-in staff session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

/// Sign-in failures, worded for display on the login screen.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Too many failed attempts. Please try again later.")]
    TooManyAttempts,
    #[error("Failed to login. Please try again.")]
    Unavailable,
}

/// Identity collaborator gating the review console. Only the signed-in signal is consumed
/// by the review workflow.
pub trait Authenticator: Send + Sync {
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken, AuthError>;
    fn sign_out(&self, token: &SessionToken);
    fn is_signed_in(&self, token: &SessionToken) -> bool;
}

#[derive(Debug, Default)]
struct SessionState {
    /// Issue time of each live token.
    sessions: HashMap<SessionToken, DateTime<Utc>>,
    consecutive_failures: u32,
    last_failure: Option<DateTime<Utc>>,
}

impl SessionState {
    fn prune_expired(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.sessions.retain(|_, issued_at| now < *issued_at + ttl);
    }
}

/// Single staff account read from configuration.
///
/// After `max_failed_attempts` consecutive failures every sign-in is refused until `lockout`
/// has passed since the last failure. Tokens expire `session_ttl` after issue.
#[derive(Debug)]
pub struct StaticCredentialAuthenticator {
    credentials: Option<AdminCredentials>,
    max_failed_attempts: u32,
    lockout: Duration,
    session_ttl: Duration,
    state: Mutex<SessionState>,
}

impl StaticCredentialAuthenticator {
    pub fn new(credentials: Option<AdminCredentials>, max_failed_attempts: u32) -> Self {
        let defaults = AdminConfig::default();
        Self {
            credentials,
            max_failed_attempts: max_failed_attempts.max(1),
            lockout: defaults.lockout,
            session_ttl: defaults.session_ttl,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        if config.credentials.is_none() {
            warn!("no admin credentials configured; review console sign-in is disabled");
        }
        Self::new(config.credentials.clone(), config.max_failed_attempts)
            .with_lockout(config.lockout)
            .with_session_ttl(config.session_ttl)
    }

    pub fn with_lockout(mut self, lockout: Duration) -> Self {
        self.lockout = lockout;
        self
    }

    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    pub fn sign_in_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, AuthError> {
        let mut state = self.state.lock().map_err(|_| AuthError::Unavailable)?;
        if state.consecutive_failures >= self.max_failed_attempts {
            let locked_until = state.last_failure.map(|at| at + self.lockout);
            if locked_until.is_some_and(|until| now < until) {
                warn!("staff sign-in refused: too many failed attempts");
                return Err(AuthError::TooManyAttempts);
            }
            info!("staff sign-in lockout expired");
            state.consecutive_failures = 0;
            state.last_failure = None;
        }

        if !self.matches(email, password) {
            state.consecutive_failures += 1;
            state.last_failure = Some(now);
            warn!(
                failures = state.consecutive_failures,
                "staff sign-in rejected"
            );
            return Err(AuthError::InvalidCredentials);
        }

        state.consecutive_failures = 0;
        state.last_failure = None;
        state.prune_expired(now, self.session_ttl);
        let token = SessionToken(uuid::Uuid::new_v4().simple().to_string());
        state.sessions.insert(token.clone(), now);
        info!("staff signed in");
        Ok(token)
    }

    pub fn is_signed_in_at(&self, token: &SessionToken, now: DateTime<Utc>) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        match state.sessions.get(token).copied() {
            Some(issued_at) if now < issued_at + self.session_ttl => true,
            Some(_) => {
                state.sessions.remove(token);
                info!("staff session expired");
                false
            }
            None => false,
        }
    }

    fn matches(&self, email: &str, password: &str) -> bool {
        self.credentials.as_ref().is_some_and(|credentials| {
            credentials.email.eq_ignore_ascii_case(email.trim()) && credentials.password == password
        })
    }
}

impl Authenticator for StaticCredentialAuthenticator {
    fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        self.sign_in_at(email, password, Utc::now())
    }

    fn sign_out(&self, token: &SessionToken) {
        if let Ok(mut state) = self.state.lock() {
            if state.sessions.remove(token).is_some() {
                info!("staff signed out");
            }
        }
    }

    fn is_signed_in(&self, token: &SessionToken) -> bool {
        self.is_signed_in_at(token, Utc::now())
    }
}
