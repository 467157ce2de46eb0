//! Password vault
//!
//! Manages the single verification tag used to validate the wallet password
//! without ever decrypting real key material. The tag plaintext is the
//! process-known constant [`PASSWORD_TAG_PLAINTEXT`]; it is the only known
//! plaintext in the system, so no other stored secret can be probed with a
//! known-plaintext check.
//!
//! There is deliberately no lockout or rate limit on failed verification
//! attempts; the memory-hard KDF is the only brake. Known hardening gap.

pub mod file_store;

pub use file_store::FileTagStore;

use crate::core::crypto::KeyCipher;
use crate::shared::constants::PASSWORD_TAG_PLAINTEXT;
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::{EncryptedBlob, PasswordTag};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence seam for the password tag.
pub trait TagStore: Send + Sync {
    /// Load the persisted tag, if any.
    fn load(&self) -> WalletResult<Option<PasswordTag>>;

    /// Persist the tag, replacing any previous one as a single atomic write.
    fn store(&self, tag: &PasswordTag) -> WalletResult<()>;

    /// Check whether a tag exists.
    fn exists(&self) -> WalletResult<bool>;

    /// Remove the tag.
    fn delete(&self) -> WalletResult<()>;
}

/// Password verification and rotation over a [`TagStore`].
pub struct PasswordVault {
    store: Arc<dyn TagStore>,
    // Rotation is not safe to run concurrently with itself; overlapping
    // save_new_password calls are serialized here.
    rotation: tokio::sync::Mutex<()>,
}

impl PasswordVault {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self {
            store,
            rotation: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether a password has been set for this wallet.
    pub fn is_initialized(&self) -> WalletResult<bool> {
        self.store.exists()
    }

    /// Create the verification tag at wallet setup.
    pub async fn initialize(&self, password: &str) -> WalletResult<PasswordTag> {
        let _guard = self.rotation.lock().await;
        if self.store.exists()? {
            return Err(WalletError::malformed_data("password tag already exists"));
        }
        let tag = Self::build_tag(password).await?;
        self.store.store(&tag)?;
        log::info!("password tag created: {}", tag.id);
        Ok(tag)
    }

    /// Verify a candidate password against the stored tag.
    ///
    /// Never errors: any load failure, decryption failure, or plaintext
    /// mismatch yields `false`.
    pub async fn verify_password(&self, candidate: &str) -> bool {
        let tag = match self.store.load() {
            Ok(Some(tag)) => tag,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("password tag load failed during verification: {}", e);
                return false;
            }
        };
        Self::tag_matches(&tag.encrypted_tag, candidate).await
    }

    /// Rotate the wallet password.
    ///
    /// Requires an existing tag and a correct `current` password. On success
    /// the constant is re-encrypted under `next` and persisted atomically;
    /// on any failure the old tag remains intact.
    pub async fn save_new_password(&self, current: &str, next: &str) -> WalletResult<PasswordTag> {
        let _guard = self.rotation.lock().await;
        let existing = self
            .store
            .load()?
            .ok_or_else(|| WalletError::malformed_data("no password tag to rotate"))?;

        if !Self::tag_matches(&existing.encrypted_tag, current).await {
            return Err(WalletError::InvalidPassword);
        }

        let tag = Self::build_tag(next).await?;
        self.store.store(&tag)?;
        log::info!("password rotated, new tag: {}", tag.id);
        Ok(tag)
    }

    async fn build_tag(password: &str) -> WalletResult<PasswordTag> {
        let encrypted_tag = KeyCipher::encrypt_blocking(
            PASSWORD_TAG_PLAINTEXT.as_bytes().to_vec(),
            password.to_string(),
        )
        .await?;
        Ok(PasswordTag {
            id: Uuid::new_v4(),
            encrypted_tag,
        })
    }

    async fn tag_matches(encrypted_tag: &EncryptedBlob, candidate: &str) -> bool {
        match KeyCipher::decrypt_blocking(encrypted_tag.clone(), candidate.to_string()).await {
            Ok(plaintext) => plaintext.as_slice() == PASSWORD_TAG_PLAINTEXT.as_bytes(),
            Err(_) => false,
        }
    }
}
