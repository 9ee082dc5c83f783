//! realmgen core library.
//!
//! Turns employee directory records into an identity-provider realm import
//! document: configuration, record loaders, the identity mapper (usernames,
//! emails, attribute flattening), and the realm assembler.

pub mod config;
pub mod errors;
pub mod identity;
pub mod loader;
pub mod models;
pub mod realm;

// Re-exports for convenience.
pub use config::AppConfig;
pub use identity::IdentityMapper;
pub use loader::RecordLoader;
pub use models::{EmployeeRecord, IdentityUser, RealmDescriptor};
pub use realm::RealmAssembler;
