//! Authenticated encryption of secret payloads
//!
//! XChaCha20-Poly1305 under a password-derived key. The random nonce and KDF
//! salt are prepended, unencrypted, to the ciphertext so that decryption needs
//! only the password.

use crate::core::crypto::kdf;
use crate::shared::constants::NONCE_LEN;
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::EncryptedBlob;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305, XNonce};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

/// Symmetric authenticated encryption seeded by a password.
///
/// Stateless; safe to call concurrently for distinct payloads.
pub struct KeyCipher;

impl KeyCipher {
    /// Encrypt a byte payload under a password-derived key.
    pub fn encrypt(plaintext: &[u8], password: &str) -> WalletResult<EncryptedBlob> {
        let salt = kdf::generate_salt();
        let key = kdf::derive_key(password, &salt)?;
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&*key));

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| WalletError::internal("Encryption failed"))?;

        Ok(EncryptedBlob::new(nonce, salt, ciphertext))
    }

    /// Decrypt a blob with the password it was encrypted under.
    ///
    /// Fails closed: malformed blobs, wrong passwords, and tampered
    /// ciphertext all surface as the same [`WalletError::Decryption`] with no
    /// partial result.
    pub fn decrypt(blob: &EncryptedBlob, password: &str) -> WalletResult<Zeroizing<Vec<u8>>> {
        blob.validate()?;
        let key = kdf::derive_key(password, &blob.salt)?;
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&*key));

        let plaintext = cipher
            .decrypt(XNonce::from_slice(&blob.nonce), blob.ciphertext.as_slice())
            .map_err(|_| WalletError::Decryption)?;

        Ok(Zeroizing::new(plaintext))
    }

    /// Encrypt on the blocking pool.
    ///
    /// The KDF is CPU-bound for its full duration; offloading it keeps the
    /// caller's event loop responsive.
    pub async fn encrypt_blocking(
        plaintext: Vec<u8>,
        password: String,
    ) -> WalletResult<EncryptedBlob> {
        tokio::task::spawn_blocking(move || {
            let plaintext = Zeroizing::new(plaintext);
            let password = Zeroizing::new(password);
            Self::encrypt(&plaintext, &password)
        })
        .await?
    }

    /// Decrypt on the blocking pool.
    pub async fn decrypt_blocking(
        blob: EncryptedBlob,
        password: String,
    ) -> WalletResult<Zeroizing<Vec<u8>>> {
        tokio::task::spawn_blocking(move || {
            let password = Zeroizing::new(password);
            Self::decrypt(&blob, &password)
        })
        .await?
    }
}
