//! Shared types, constants, and errors
//!
//! This module contains common types, constants, and error definitions used
//! throughout the wallet core.

pub mod constants;
pub mod error;
pub mod types;

// Re-export shared components
pub use constants::*;
pub use error::*;
pub use types::*;
