//! Cryptographic functionality for the wallet core
//!
//! This module provides the key derivation and authenticated encryption used
//! for all at-rest secrets.
//!
//! SECURITY: derived keys and recovered plaintext are zeroized as soon as they
//! leave scope; decryption fails closed with no partial result.

pub mod cipher;
pub mod kdf;

// Re-export all public items from submodules
pub use cipher::*;
pub use kdf::*;
