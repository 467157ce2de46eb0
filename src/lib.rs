//! Extension Wallet Core
//!
//! Secret-store and cross-context request broker for a browser-extension
//! wallet. Provides password-based key encryption, master-password
//! verification and rotation, credential resolution for signing flows, and
//! request/response correlation between extension execution contexts.
//!
//! # Features
//!
//! - **Key encryption**: XChaCha20-Poly1305 with Argon2id-derived keys
//! - **Password vault**: verification-tag based password checks, atomic rotation
//! - **Credential resolution**: password, passkey, and cached-session flows
//! - **Request brokering**: id-correlated, timeout-bounded cross-context calls
//! - **Protocol adaptation**: current and legacy wire shapes, per-context allow-lists
//!
//! # Security
//!
//! Key material and plaintext secrets are zeroized on drop. Decryption
//! failures are indistinguishable from wrong-password failures by design.

pub mod core;
pub mod shared;

// Re-export main types for convenience
pub use crate::core::{
    cancel_pair, decrypt_account_key, AccountRepository, CancelHandle, CancelToken,
    ContextCapabilities, CredentialResolver, FileTagStore, KeyCipher, Method, PasskeyProvider,
    PasswordVault, ProtocolAdapter, ProtocolVersion, RequestBroker, RequestCorrelator,
    RequestEnvelope, RequestHandler, ResolverState, ResponseEnvelope, TagStore, Transport,
};
pub use crate::shared::{
    ClientInfo, CredentialMethod, EncryptedBlob, PageMetadata, PasswordTag, WalletError,
    WalletResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging for the library. Safe to call more than once.
pub fn init() {
    let _ = env_logger::try_init();
    log::info!("{} v{} initialized", NAME, VERSION);
}
