//! TOML-based configuration for realmgen.
//!
//! Every section has defaults that reproduce the reference realm, so an
//! absent or empty config file is valid. Secrets may be supplied through
//! `_env` fields naming an environment variable; those are resolved at
//! runtime via [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::identity::hash::DEFAULT_HASH_LENGTH;

/// Largest useful hash length: a `u32` has at most 10 decimal digits.
pub const MAX_HASH_LENGTH: usize = 10;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Realm metadata.
    #[serde(default)]
    pub realm: RealmConfig,

    /// The single OIDC client registered in the realm.
    #[serde(default)]
    pub client: ClientConfig,

    /// User derivation settings.
    #[serde(default)]
    pub users: UsersConfig,

    /// Where employee records are read from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Diagnostic output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Realm
// ---------------------------------------------------------------------------

/// Realm metadata written at the top of the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Realm name (default `technova`).
    #[serde(default = "default_realm_name")]
    pub name: String,

    /// Human-readable realm name (default `TechNova Global`).
    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_realm_name() -> String {
    "technova".into()
}
fn default_display_name() -> String {
    "TechNova Global".into()
}
fn default_true() -> bool {
    true
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            name: default_realm_name(),
            display_name: default_display_name(),
            enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// OIDC client descriptor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client identifier (default `conceptor-oidc`).
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Client protocol (default `openid-connect`).
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Public clients have no secret; the default is a confidential client.
    #[serde(default)]
    pub public_client: bool,

    /// Allowed redirect URIs (default wildcard).
    #[serde(default = "default_redirect_uris")]
    pub redirect_uris: Vec<String>,

    /// Static client secret.
    #[serde(default = "default_client_secret")]
    pub secret: String,

    /// Environment variable overriding `secret` when set.
    #[serde(default)]
    pub secret_env: Option<String>,

    #[serde(default = "default_true")]
    pub standard_flow_enabled: bool,
}

fn default_client_id() -> String {
    "conceptor-oidc".into()
}
fn default_protocol() -> String {
    "openid-connect".into()
}
fn default_redirect_uris() -> Vec<String> {
    vec!["*".into()]
}
fn default_client_secret() -> String {
    "oidc-client-secret".into()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            protocol: default_protocol(),
            public_client: false,
            redirect_uris: default_redirect_uris(),
            secret: default_client_secret(),
            secret_env: None,
            standard_flow_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// What to do with a record the mapper rejects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole run at the first rejected record.
    #[default]
    Abort,
    /// Log the rejected record and leave it out of the realm.
    Skip,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// User derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersConfig {
    /// Domain of generated email addresses (default `example.net`).
    #[serde(default = "default_email_domain")]
    pub email_domain: String,

    /// Password given to every generated user.
    #[serde(default = "default_password")]
    pub default_password: String,

    /// Environment variable overriding `default_password` when set.
    #[serde(default)]
    pub default_password_env: Option<String>,

    /// Number of hash digits in generated email addresses (default 4).
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    /// Failure policy for records missing required fields.
    #[serde(default)]
    pub on_invalid_record: FailurePolicy,

    /// Reject the realm if two users derive the same username.
    #[serde(default)]
    pub require_unique_usernames: bool,
}

fn default_email_domain() -> String {
    "example.net".into()
}
fn default_password() -> String {
    "password".into()
}
fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
            default_password: default_password(),
            default_password_env: None,
            hash_length: default_hash_length(),
            on_invalid_record: FailurePolicy::default(),
            require_unique_usernames: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Employee record source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the employee YAML files (default `employees`).
    #[serde(default = "default_source_dir")]
    pub directory: PathBuf,

    /// File-name glob selecting record files (default `*.yaml`).
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("employees")
}
fn default_pattern() -> String {
    "*.yaml".into()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: default_source_dir(),
            pattern: default_pattern(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Replace values that have an `_env` override with the environment
    /// variable's contents.
    ///
    /// A referenced variable that is unset or empty logs a warning and leaves
    /// the literal value in place.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        debug!("resolving environment variable references in config");

        if let Some(ref env_name) = self.client.secret_env {
            if let Some(secret) = resolve_optional_env(env_name, "client.secret_env") {
                self.client.secret = secret;
            }
        }

        if let Some(ref env_name) = self.users.default_password_env {
            if let Some(password) = resolve_optional_env(env_name, "users.default_password_env")
            {
                self.users.default_password = password;
            }
        }

        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.realm.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "realm.name".into(),
                detail: "realm name must not be empty".into(),
            });
        }
        if self.client.client_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client.client_id".into(),
                detail: "client id must not be empty".into(),
            });
        }
        if self.users.email_domain.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "users.email_domain".into(),
                detail: "email domain must not be empty".into(),
            });
        }
        if self.users.email_domain.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "users.email_domain".into(),
                detail: "email domain must not contain '@'".into(),
            });
        }
        if self.users.hash_length == 0 || self.users.hash_length > MAX_HASH_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "users.hash_length".into(),
                detail: format!("hash length must be between 1 and {}", MAX_HASH_LENGTH),
            });
        }
        if self.source.pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source.pattern".into(),
                detail: "file pattern must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[realm]
name = "acme"
display_name = "Acme Corp"
enabled = false

[client]
client_id = "portal"
redirect_uris = ["https://portal.acme.test/*"]
secret = "s3cret"
standard_flow_enabled = false

[users]
email_domain = "acme.test"
default_password = "changeme"
hash_length = 6
on_invalid_record = "skip"
require_unique_usernames = true

[source]
directory = "/srv/directory"
pattern = "*.yml"

[logging]
level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.realm.name, "acme");
        assert!(!config.realm.enabled);
        assert_eq!(config.client.client_id, "portal");
        assert_eq!(config.client.protocol, "openid-connect");
        assert_eq!(config.users.hash_length, 6);
        assert_eq!(config.users.on_invalid_record, FailurePolicy::Skip);
        assert!(config.users.require_unique_usernames);
        assert_eq!(config.source.directory, PathBuf::from("/srv/directory"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_config_matches_reference_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.realm.name, "technova");
        assert_eq!(config.realm.display_name, "TechNova Global");
        assert!(config.realm.enabled);
        assert_eq!(config.client.client_id, "conceptor-oidc");
        assert_eq!(config.client.redirect_uris, vec!["*"]);
        assert_eq!(config.client.secret, "oidc-client-secret");
        assert!(!config.client.public_client);
        assert!(config.client.standard_flow_enabled);
        assert_eq!(config.users.email_domain, "example.net");
        assert_eq!(config.users.default_password, "password");
        assert_eq!(config.users.hash_length, 4);
        assert_eq!(config.users.on_invalid_record, FailurePolicy::Abort);
        assert_eq!(config.source.pattern, "*.yaml");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("realmgen.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.users.email_domain, "acme.test");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/realmgen.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[users\nhash_length = ").unwrap();

        let result = AppConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_hash_length() {
        let mut config = AppConfig::default();
        config.users.hash_length = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "users.hash_length"
        ));

        config.users.hash_length = 11;
        assert!(config.validate().is_err());

        config.users.hash_length = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_realm_name() {
        let mut config = AppConfig::default();
        config.realm.name = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "realm.name"
        ));
    }

    #[test]
    fn test_validate_rejects_domain_with_at_sign() {
        let mut config = AppConfig::default();
        config.users.email_domain = "@example.net".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "users.email_domain"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("REALMGEN_TEST_CLIENT_SECRET", "from-env");

        let toml_str = r#"
[client]
secret = "literal"
secret_env = "REALMGEN_TEST_CLIENT_SECRET"

[users]
default_password_env = "REALMGEN_TEST_UNSET_PASSWORD"
"#;
        let mut config: AppConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.client.secret, "from-env");
        // Unset variable keeps the literal default.
        assert_eq!(config.users.default_password, "password");

        std::env::remove_var("REALMGEN_TEST_CLIENT_SECRET");
    }
}
