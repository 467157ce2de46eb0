//! Credential resolution
//!
//! A small state machine over one authentication prompt lifecycle. Given a
//! pending signing/enable operation it decides which credential method is
//! used (unencrypted wallet, password, passkey, or a cached session key under
//! the credential lock) and produces the key material needed to decrypt an
//! account's stored key. The resolver never touches account key storage; it
//! only proves the user is authorized.

use crate::core::vault::PasswordVault;
use crate::shared::constants::DEFAULT_CREDENTIAL_LOCK_SECS;
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::CredentialMethod;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use zeroize::Zeroizing;

/// Settings consumed by the resolver.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn credential_lock_enabled(&self) -> WalletResult<bool>;

    /// Idle timeout of the credential lock. Stores without a user-facing
    /// setting keep the default.
    async fn credential_lock_timeout(&self) -> WalletResult<Duration> {
        Ok(Duration::from_secs(DEFAULT_CREDENTIAL_LOCK_SECS))
    }
}

/// Platform passkey API.
#[async_trait]
pub trait PasskeyProvider: Send + Sync {
    async fn has_passkey(&self) -> WalletResult<bool>;

    /// Obtain input key material from the platform authenticator.
    ///
    /// Failures surface to the caller unchanged, not remapped.
    async fn request_assertion(&self) -> WalletResult<Vec<u8>>;
}

/// Authentication prompt lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    AwaitingMethodSelection,
    VerifyingPassword,
    RequestingPasskey,
    UsingCachedSession,
    Resolved,
    Rejected,
}

/// Create a linked cancel handle/token pair for one prompt.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Dismisses an in-flight authentication prompt.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cooperative cancellation token observed by the resolver.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never fire, for callers without a prompt UI.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_canceled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the prompt is dismissed; pends forever otherwise.
    pub async fn canceled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling; nothing to wait for.
                std::future::pending::<()>().await;
            }
        }
    }
}

struct CachedSession {
    session_key: Zeroizing<Vec<u8>>,
    expires_at: Instant,
}

/// Resolves one authentication prompt to a [`CredentialMethod`].
pub struct CredentialResolver {
    vault: Arc<PasswordVault>,
    settings: Arc<dyn SettingsStore>,
    passkeys: Arc<dyn PasskeyProvider>,
    session: Mutex<Option<CachedSession>>,
    state: Mutex<ResolverState>,
}

impl CredentialResolver {
    pub fn new(
        vault: Arc<PasswordVault>,
        settings: Arc<dyn SettingsStore>,
        passkeys: Arc<dyn PasskeyProvider>,
    ) -> Self {
        Self {
            vault,
            settings,
            passkeys,
            session: Mutex::new(None),
            state: Mutex::new(ResolverState::Idle),
        }
    }

    pub fn state(&self) -> ResolverState {
        *lock(&self.state)
    }

    /// Drop the cached session key, forcing the next operation to prompt.
    pub fn clear_session(&self) {
        lock(&self.session).take();
    }

    /// Run one authentication prompt lifecycle.
    ///
    /// `password` is the candidate the prompt collected, if any; `cancel`
    /// dismisses the prompt at any point before resolution and always yields
    /// [`WalletError::Canceled`].
    pub async fn resolve(
        &self,
        password: Option<&str>,
        cancel: &CancelToken,
    ) -> WalletResult<CredentialMethod> {
        self.set_state(ResolverState::AwaitingMethodSelection);
        if cancel.is_canceled() {
            return Err(self.rejected(dismissed()));
        }

        // Wallets created before a password was set store keys unencrypted.
        if !self.vault.is_initialized()? {
            self.set_state(ResolverState::Resolved);
            return Ok(CredentialMethod::Unencrypted);
        }

        let lock_timeout = if self.settings.credential_lock_enabled().await? {
            Some(self.settings.credential_lock_timeout().await?)
        } else {
            None
        };

        // An active credential lock skips the prompt entirely; the cached
        // session key is reused for its configured idle window.
        if let Some(timeout) = lock_timeout {
            if let Some(method) = self.take_active_session(timeout) {
                self.set_state(ResolverState::UsingCachedSession);
                self.set_state(ResolverState::Resolved);
                return Ok(method);
            }
        }

        if self.passkeys.has_passkey().await? {
            self.set_state(ResolverState::RequestingPasskey);
            let input_key_material = tokio::select! {
                _ = cancel.canceled() => return Err(self.rejected(dismissed())),
                assertion = self.passkeys.request_assertion() => {
                    assertion.map_err(|e| self.rejected(e))?
                }
            };
            if let Some(timeout) = lock_timeout {
                self.refresh_session(hex::encode(&input_key_material).as_bytes(), timeout);
            }
            self.set_state(ResolverState::Resolved);
            return Ok(CredentialMethod::Passkey { input_key_material });
        }

        self.set_state(ResolverState::VerifyingPassword);
        let candidate = match password {
            Some(candidate) => candidate,
            None => return Err(self.rejected(dismissed())),
        };
        let verified = tokio::select! {
            _ = cancel.canceled() => return Err(self.rejected(dismissed())),
            verified = self.vault.verify_password(candidate) => verified,
        };
        if !verified {
            // No attempt counter; repeated failures are not locked out.
            return Err(self.rejected(WalletError::InvalidPassword));
        }

        if let Some(timeout) = lock_timeout {
            self.refresh_session(candidate.as_bytes(), timeout);
        }
        self.set_state(ResolverState::Resolved);
        Ok(CredentialMethod::Password {
            plaintext: candidate.to_string(),
        })
    }

    /// Take the cached session if it is still within its idle window,
    /// refreshing the window on use. Expired sessions are dropped.
    fn take_active_session(&self, timeout: Duration) -> Option<CredentialMethod> {
        let mut session = lock(&self.session);
        let now = Instant::now();
        match session.as_mut() {
            Some(cached) if cached.expires_at > now => {
                cached.expires_at = now + timeout;
                Some(CredentialMethod::CachedSession {
                    session_key: cached.session_key.to_vec(),
                    expires_at: cached.expires_at,
                })
            }
            Some(_) => {
                *session = None;
                None
            }
            None => None,
        }
    }

    fn refresh_session(&self, secret: &[u8], timeout: Duration) {
        *lock(&self.session) = Some(CachedSession {
            session_key: Zeroizing::new(secret.to_vec()),
            expires_at: Instant::now() + timeout,
        });
    }

    fn set_state(&self, state: ResolverState) {
        *lock(&self.state) = state;
    }

    fn rejected(&self, err: WalletError) -> WalletError {
        self.set_state(ResolverState::Rejected);
        err
    }
}

fn dismissed() -> WalletError {
    WalletError::canceled("authentication prompt dismissed")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
