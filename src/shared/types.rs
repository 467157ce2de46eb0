//! Shared types for the wallet core

use crate::shared::constants::{NONCE_LEN, SALT_LEN};
use crate::shared::error::{WalletError, WalletResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Instant;
use uuid::Uuid;
use zeroize::Zeroize;

/// An encrypted secret at rest.
///
/// Canonical byte layout is `nonce || salt || ciphertext`. The nonce and salt
/// lengths are fixed by the format; anything else is a malformed blob and is
/// rejected before any cipher operation is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub nonce: [u8; NONCE_LEN],
    pub salt: [u8; SALT_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    pub fn new(nonce: [u8; NONCE_LEN], salt: [u8; SALT_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            nonce,
            salt,
            ciphertext,
        }
    }

    /// Serialize to the canonical contiguous byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + SALT_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the canonical byte buffer, enforcing the length invariants.
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if bytes.len() < NONCE_LEN + SALT_LEN + 1 {
            return Err(WalletError::Decryption);
        }
        let (nonce_bytes, rest) = bytes.split_at(NONCE_LEN);
        let (salt_bytes, ciphertext) = rest.split_at(SALT_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        Ok(Self {
            nonce,
            salt,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Check the structural invariants without touching the cipher.
    pub fn validate(&self) -> WalletResult<()> {
        if self.ciphertext.is_empty() {
            return Err(WalletError::Decryption);
        }
        Ok(())
    }
}

impl Serialize for EncryptedBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = STANDARD
            .decode(&encoded)
            .map_err(|e| D::Error::custom(format!("Base64 decode failed: {}", e)))?;
        Self::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

/// The persisted password verification tag.
///
/// Its plaintext is the process-known constant `PASSWORD_TAG_PLAINTEXT`;
/// decrypting it proves the password without touching real key material.
/// Replaced atomically on password rotation, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordTag {
    pub id: Uuid,
    #[serde(rename = "encryptedTag")]
    pub encrypted_tag: EncryptedBlob,
}

/// How one authentication event produced usable key material.
///
/// Exactly one variant is selected per event; the variant determines the input
/// fed to the key derivation pipeline when decrypting an account's stored key.
#[derive(Clone)]
pub enum CredentialMethod {
    /// Wallet was created before a password existed; keys are stored under
    /// the empty password.
    Unencrypted,
    Password {
        plaintext: String,
    },
    Passkey {
        input_key_material: Vec<u8>,
    },
    CachedSession {
        session_key: Vec<u8>,
        expires_at: Instant,
    },
}

impl CredentialMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unencrypted => "unencrypted",
            Self::Password { .. } => "password",
            Self::Passkey { .. } => "passkey",
            Self::CachedSession { .. } => "cached-session",
        }
    }
}

impl Zeroize for CredentialMethod {
    fn zeroize(&mut self) {
        match self {
            Self::Unencrypted => {}
            Self::Password { plaintext } => plaintext.zeroize(),
            Self::Passkey { input_key_material } => input_key_material.zeroize(),
            Self::CachedSession { session_key, .. } => session_key.zeroize(),
        }
    }
}

impl Drop for CredentialMethod {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// Key material never appears in logs.
impl std::fmt::Debug for CredentialMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialMethod::{}", self.name())
    }
}

/// Caller-identifying metadata attached to every normalized inbound request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub app_name: String,
    pub description: Option<String>,
    pub host: String,
    pub icon_url: Option<String>,
}

/// Document metadata of the calling page, as observed by the content script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Full origin, e.g. `https://app.example.com`.
    pub origin: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon: Option<String>,
}

impl ClientInfo {
    /// Derive caller identity deterministically from page metadata.
    ///
    /// Computed once per request; never cached across origins.
    pub fn from_page(page: &PageMetadata) -> Self {
        let host = host_of(&page.origin);
        let app_name = match page.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => host.clone(),
        };
        let description = page
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let icon_url = page
            .favicon
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| {
                if f.starts_with('/') {
                    format!("{}{}", page.origin.trim_end_matches('/'), f)
                } else {
                    f.to_string()
                }
            });
        Self {
            app_name,
            description,
            host,
            icon_url,
        }
    }
}

fn host_of(origin: &str) -> String {
    let without_scheme = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}
