//! Authentication backend seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// How the player proves who they are
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginMethod {
    /// Credential stored on this device by an earlier login
    Device { device_id: String },
    Apple,
    Google,
    Facebook,
    Email { email: String, password: String },
}

impl LoginMethod {
    /// Short label for logs; never includes credentials
    pub fn label(&self) -> &'static str {
        match self {
            LoginMethod::Device { .. } => "device",
            LoginMethod::Apple => "apple",
            LoginMethod::Google => "google",
            LoginMethod::Facebook => "facebook",
            LoginMethod::Email { .. } => "email",
        }
    }
}

/// A successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub account_id: String,
    /// Device credential to store for the next automatic login
    pub device_id: String,
}

/// Why a login did not succeed
///
/// This is an expected outcome, not a fault: the lifecycle routes it to a
/// state where the player can retry or skip.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFailure {
    #[error("No internet connection")]
    Unreachable,
    #[error("login rejected: {0}")]
    Rejected(String),
}

impl AuthFailure {
    /// Whether trying again later may succeed
    pub fn retryable(&self) -> bool {
        matches!(self, AuthFailure::Unreachable)
    }
}

/// Result of a backend call
pub type AuthResult<T> = std::result::Result<T, AuthFailure>;

/// Remote account service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, method: LoginMethod) -> AuthResult<AuthSession>;

    async fn register_with_email(&self, email: &str, password: &str) -> AuthResult<AuthSession>;

    async fn logout(&self) -> AuthResult<()>;
}

/// In-process stand-in for the account service
///
/// Accounts are created on first login. Reachability can be toggled while a
/// lifecycle is running, and individual device ids or emails can be made to
/// fail with [`AuthFailure::Rejected`].
#[derive(Debug, Default)]
pub struct MockAuthProvider {
    unreachable: AtomicBool,
    latency: Duration,
    rejected: Mutex<HashSet<String>>,
    accounts: Mutex<HashMap<String, String>>,
    next_account: AtomicU64,
    logins: AtomicUsize,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.unreachable.store(!reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        !self.unreachable.load(Ordering::SeqCst)
    }

    /// Refuse logins for this device id or email
    pub fn reject(&self, credential: impl Into<String>) {
        if let Ok(mut rejected) = self.rejected.lock() {
            rejected.insert(credential.into());
        }
    }

    /// Number of login attempts that reached the backend
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    async fn round_trip(&self) -> AuthResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.is_reachable() {
            Ok(())
        } else {
            Err(AuthFailure::Unreachable)
        }
    }

    fn is_rejected(&self, credential: &str) -> bool {
        self.rejected
            .lock()
            .map(|rejected| rejected.contains(credential))
            .unwrap_or(false)
    }

    fn account_for(&self, key: String) -> AuthSession {
        let mut accounts = match self.accounts.lock() {
            Ok(accounts) => accounts,
            Err(poisoned) => poisoned.into_inner(),
        };
        let account_id = accounts
            .entry(key)
            .or_insert_with(|| {
                format!("acct-{}", self.next_account.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .clone();
        AuthSession {
            device_id: format!("{account_id}-device"),
            account_id,
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn login(&self, method: LoginMethod) -> AuthResult<AuthSession> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let key = match &method {
            LoginMethod::Device { device_id } => device_id.clone(),
            LoginMethod::Email { email, .. } => email.clone(),
            other => other.label().to_string(),
        };
        if self.is_rejected(&key) {
            tracing::debug!(method = method.label(), "mock login rejected");
            return Err(AuthFailure::Rejected(format!("unknown credential {key}")));
        }

        let mut session = self.account_for(key);
        if let LoginMethod::Device { device_id } = method {
            if !device_id.trim().is_empty() {
                session.device_id = device_id;
            }
        }
        Ok(session)
    }

    async fn register_with_email(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.round_trip().await?;
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthFailure::Rejected(
                "email and password are required".to_string(),
            ));
        }
        if self.is_rejected(email) {
            return Err(AuthFailure::Rejected(format!("cannot register {email}")));
        }
        Ok(self.account_for(email.to_string()))
    }

    async fn logout(&self) -> AuthResult<()> {
        self.round_trip().await
    }
}
