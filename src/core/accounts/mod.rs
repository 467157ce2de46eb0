//! Account key decryption
//!
//! Bridges a resolved [`CredentialMethod`] to the stored, encrypted private
//! key of a specific account. Account bookkeeping itself lives outside this
//! crate, behind [`AccountRepository`].

use crate::core::crypto::KeyCipher;
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::{CredentialMethod, EncryptedBlob};
use zeroize::Zeroizing;

/// External account storage, keyed by public key.
pub trait AccountRepository: Send + Sync {
    fn fetch_encrypted_key_by_public_key(&self, public_key: &str) -> WalletResult<EncryptedBlob>;
}

/// Decrypt the stored private key of an account using the key material a
/// credential resolution produced.
///
/// Each variant maps to the secret string fed to the key derivation pipeline:
/// unencrypted wallets use the empty password, passkey assertions are
/// hex-encoded, and cached session keys replay the secret captured at unlock.
pub async fn decrypt_account_key(
    repo: &dyn AccountRepository,
    public_key: &str,
    method: &CredentialMethod,
) -> WalletResult<Zeroizing<Vec<u8>>> {
    let blob = repo.fetch_encrypted_key_by_public_key(public_key)?;
    let secret = pipeline_secret(method)?;
    KeyCipher::decrypt_blocking(blob, secret.to_string()).await
}

fn pipeline_secret(method: &CredentialMethod) -> WalletResult<Zeroizing<String>> {
    let secret = match method {
        CredentialMethod::Unencrypted => String::new(),
        CredentialMethod::Password { plaintext } => plaintext.clone(),
        CredentialMethod::Passkey { input_key_material } => hex::encode(input_key_material),
        CredentialMethod::CachedSession { session_key, .. } => {
            String::from_utf8(session_key.clone())
                .map_err(|_| WalletError::malformed_data("cached session key is not valid UTF-8"))?
        }
    };
    Ok(Zeroizing::new(secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Instant;

    struct MockAccounts {
        keys: HashMap<String, EncryptedBlob>,
    }

    impl MockAccounts {
        fn with_key(public_key: &str, blob: EncryptedBlob) -> Self {
            let mut keys = HashMap::new();
            keys.insert(public_key.to_string(), blob);
            Self { keys }
        }
    }

    impl AccountRepository for MockAccounts {
        fn fetch_encrypted_key_by_public_key(
            &self,
            public_key: &str,
        ) -> WalletResult<EncryptedBlob> {
            self.keys
                .get(public_key)
                .cloned()
                .ok_or_else(|| WalletError::storage(format!("no account for {}", public_key)))
        }
    }

    #[tokio::test]
    async fn test_decrypt_with_password_method() {
        let blob = KeyCipher::encrypt(b"private-key-bytes", "correct-horse").unwrap();
        let repo = MockAccounts::with_key("pk1", blob);
        let method = CredentialMethod::Password {
            plaintext: "correct-horse".to_string(),
        };

        let key = decrypt_account_key(&repo, "pk1", &method).await.unwrap();
        assert_eq!(key.as_slice(), b"private-key-bytes");
    }

    #[tokio::test]
    async fn test_decrypt_with_unencrypted_method() {
        let blob = KeyCipher::encrypt(b"legacy-key", "").unwrap();
        let repo = MockAccounts::with_key("pk1", blob);

        let key = decrypt_account_key(&repo, "pk1", &CredentialMethod::Unencrypted)
            .await
            .unwrap();
        assert_eq!(key.as_slice(), b"legacy-key");
    }

    #[tokio::test]
    async fn test_passkey_and_cached_session_share_the_pipeline() {
        let ikm = vec![0xAB, 0xCD, 0xEF];
        let blob = KeyCipher::encrypt(b"pk-protected", &hex::encode(&ikm)).unwrap();
        let repo = MockAccounts::with_key("pk1", blob);

        let passkey = CredentialMethod::Passkey {
            input_key_material: ikm.clone(),
        };
        let key = decrypt_account_key(&repo, "pk1", &passkey).await.unwrap();
        assert_eq!(key.as_slice(), b"pk-protected");

        // A session cached from the same unlock decrypts the same blob.
        let cached = CredentialMethod::CachedSession {
            session_key: hex::encode(&ikm).into_bytes(),
            expires_at: Instant::now(),
        };
        let key = decrypt_account_key(&repo, "pk1", &cached).await.unwrap();
        assert_eq!(key.as_slice(), b"pk-protected");
    }

    #[tokio::test]
    async fn test_wrong_method_fails_closed() {
        let blob = KeyCipher::encrypt(b"secret", "right").unwrap();
        let repo = MockAccounts::with_key("pk1", blob);
        let method = CredentialMethod::Password {
            plaintext: "wrong".to_string(),
        };

        let err = decrypt_account_key(&repo, "pk1", &method)
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Decryption);
    }

    #[tokio::test]
    async fn test_missing_account_propagates_storage_error() {
        let repo = MockAccounts {
            keys: HashMap::new(),
        };
        let err = decrypt_account_key(&repo, "absent", &CredentialMethod::Unencrypted)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Storage(_)));
    }
}
