//! Memory-hard key derivation
//!
//! Derives the symmetric key used by [`KeyCipher`](super::KeyCipher) from a
//! password and a random salt. The password is pre-hashed with SHA-256 so the
//! KDF input has a fixed length regardless of password size.

use crate::shared::constants::{KDF_ITERATIONS, KDF_MEMORY_KIB, KDF_PARALLELISM, KEY_LEN, SALT_LEN};
use crate::shared::error::{WalletError, WalletResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Derive a 32-byte symmetric key from `(password, salt)` using Argon2id.
///
/// The returned key is ephemeral: it is zeroized on drop and must never be
/// persisted or cached.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> WalletResult<Zeroizing<[u8; KEY_LEN]>> {
    let mut prehash = Zeroizing::new([0u8; 32]);
    prehash.copy_from_slice(&Sha256::digest(password.as_bytes()));
    let argon2 = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(
            KDF_MEMORY_KIB,
            KDF_ITERATIONS,
            KDF_PARALLELISM,
            Some(KEY_LEN),
        )?,
    );

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(prehash.as_slice(), salt, &mut *key)
        .map_err(|e| WalletError::internal(format!("Key derivation failed: {}", e)))?;
    Ok(key)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
