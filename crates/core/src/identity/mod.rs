//! Identity derivation for employee records.
//!
//! - [`hash`]: stable short hashes used in email addresses
//! - [`mapper`]: the record-to-user transformation (usernames, emails,
//!   attribute flattening)

pub mod hash;
pub mod mapper;

pub use hash::{generate_stable_hash, DEFAULT_HASH_LENGTH};
pub use mapper::{derive_username, IdentityMapper};
