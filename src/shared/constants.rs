//! Constants for the wallet core
//!
//! This module contains all constants used throughout the wallet core.

// Encrypted blob layout: [nonce: 24][salt: 16][ciphertext: variable]
pub const NONCE_LEN: usize = 24;
pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

// Argon2id cost parameters. Changing any of these invalidates every
// previously encrypted blob, since the blob format carries no parameter
// version header. Treat them as frozen unless a migration path exists.
pub const KDF_MEMORY_KIB: u32 = 65536; // 64MB
pub const KDF_ITERATIONS: u32 = 3;
pub const KDF_PARALLELISM: u32 = 1;

// The only plaintext in the system that is a known constant. It exists so a
// password can be verified without touching real key material; every other
// stored secret is opaque ciphertext.
pub const PASSWORD_TAG_PLAINTEXT: &str = "extension-wallet-password-verification-tag-v1";

// Request broker constants
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30000; // milliseconds
pub const DEFAULT_CREDENTIAL_LOCK_SECS: u64 = 300; // seconds

// Storage constants
pub const TAG_STORE_DIR: &str = "extension-wallet";
pub const TAG_STORE_FILE: &str = "password_tag.json";

// Wire error codes
pub const ERR_CODE_CANCELED: u32 = 4001;
pub const ERR_CODE_INVALID_PASSWORD: u32 = 4100;
pub const ERR_CODE_DECRYPTION: u32 = 4101;
pub const ERR_CODE_MALFORMED_DATA: u32 = 4102;
pub const ERR_CODE_METHOD_NOT_SUPPORTED: u32 = 4200;
pub const ERR_CODE_UNKNOWN: u32 = 5000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_layout_constants() {
        assert_eq!(NONCE_LEN, 24);
        assert_eq!(SALT_LEN, 16);
        assert_eq!(KEY_LEN, 32);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            ERR_CODE_CANCELED,
            ERR_CODE_INVALID_PASSWORD,
            ERR_CODE_DECRYPTION,
            ERR_CODE_MALFORMED_DATA,
            ERR_CODE_METHOD_NOT_SUPPORTED,
            ERR_CODE_UNKNOWN,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
