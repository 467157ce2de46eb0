//! Core wallet functionality
//!
//! This module contains the core business logic of the extension wallet:
//! - Key encryption and key derivation
//! - Master-password verification and rotation
//! - Credential resolution for signing flows
//! - Cross-context request brokering

pub mod accounts;
pub mod broker;
pub mod credentials;
pub mod crypto;
pub mod vault;

// Re-export commonly used items
pub use accounts::{decrypt_account_key, AccountRepository};
pub use broker::{
    ContextCapabilities, Method, ProtocolAdapter, ProtocolVersion, RequestBroker,
    RequestCorrelator, RequestEnvelope, RequestHandler, ResponseEnvelope, Transport,
};
pub use credentials::{
    cancel_pair, CancelHandle, CancelToken, CredentialResolver, PasskeyProvider, ResolverState,
    SettingsStore,
};
pub use crypto::{derive_key, generate_salt, KeyCipher};
pub use vault::{FileTagStore, PasswordVault, TagStore};
