//! Realm assembly.
//!
//! [`RealmAssembler`] maps every employee record through the
//! [`IdentityMapper`], applies the configured [`FailurePolicy`], and wraps the
//! resulting users together with the realm metadata and its single OIDC
//! client into a [`RealmDescriptor`].

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::{AppConfig, ClientConfig, FailurePolicy, RealmConfig};
use crate::errors::{CoreError, MapError, RealmError};
use crate::identity::IdentityMapper;
use crate::loader::RecordLoader;
use crate::models::{ClientDescriptor, EmployeeRecord, IdentityUser, RealmDescriptor};

/// A record the assembler left out under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// 1-based position of the record in the input sequence.
    pub index: usize,
    pub error: MapError,
}

/// Result of one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub realm: RealmDescriptor,
    /// Number of records handed to the assembler.
    pub records_seen: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl AssemblyReport {
    pub fn users_emitted(&self) -> usize {
        self.realm.users.len()
    }
}

/// Builds realm descriptors from employee records.
#[derive(Debug, Clone)]
pub struct RealmAssembler {
    mapper: IdentityMapper,
    realm: RealmConfig,
    client: ClientConfig,
    policy: FailurePolicy,
    require_unique_usernames: bool,
}

impl Default for RealmAssembler {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl RealmAssembler {
    /// Create an assembler from the full application config.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mapper: IdentityMapper::new(&config.users),
            realm: config.realm.clone(),
            client: config.client.clone(),
            policy: config.users.on_invalid_record,
            require_unique_usernames: config.users.require_unique_usernames,
        }
    }

    /// Override the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Turn the username uniqueness post-check on or off.
    pub fn with_unique_usernames(mut self, required: bool) -> Self {
        self.require_unique_usernames = required;
        self
    }

    /// Load every record from `loader` and build the realm.
    pub fn run(&self, loader: &dyn RecordLoader) -> Result<AssemblyReport, CoreError> {
        let records = loader.load()?;
        Ok(self.assemble(&records)?)
    }

    /// Map every record and build the realm.
    ///
    /// Users appear in the same order as `records`. Under
    /// [`FailurePolicy::Abort`] the first rejected record fails the whole
    /// run; under [`FailurePolicy::Skip`] it is logged and left out. Record
    /// positions in errors and in [`SkippedRecord`] are 1-based.
    pub fn assemble(&self, records: &[EmployeeRecord]) -> Result<AssemblyReport, RealmError> {
        info!(count = records.len(), policy = %self.policy, "assembling realm");

        let mut users = Vec::with_capacity(records.len());
        let mut positions = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for (index, record) in (1usize..).zip(records) {
            match self.mapper.map_record(record) {
                Ok(user) => {
                    debug!(index, username = %user.username, "mapped employee");
                    users.push(user);
                    positions.push(index);
                }
                Err(error) => match self.policy {
                    FailurePolicy::Abort => {
                        return Err(RealmError::InvalidRecord {
                            index,
                            source: error,
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!(index, %error, "skipping employee record");
                        skipped.push(SkippedRecord { index, error });
                    }
                },
            }
        }

        if self.require_unique_usernames {
            find_username_conflict(positions.iter().copied().zip(&users))?;
        }

        let realm = self.wrap(users);
        info!(
            users = realm.users.len(),
            skipped = skipped.len(),
            realm = %realm.realm,
            "generated realm"
        );

        Ok(AssemblyReport {
            realm,
            records_seen: records.len(),
            skipped,
        })
    }

    /// Wrap already-mapped users with realm metadata and the client.
    pub fn wrap(&self, users: Vec<IdentityUser>) -> RealmDescriptor {
        RealmDescriptor {
            realm: self.realm.name.clone(),
            enabled: self.realm.enabled,
            display_name: self.realm.display_name.clone(),
            users,
            clients: vec![client_descriptor(&self.client)],
        }
    }
}

/// Build the realm's client descriptor.
pub fn client_descriptor(config: &ClientConfig) -> ClientDescriptor {
    ClientDescriptor {
        client_id: config.client_id.clone(),
        enabled: true,
        protocol: config.protocol.clone(),
        public_client: config.public_client,
        redirect_uris: config.redirect_uris.clone(),
        secret: config.secret.clone(),
        standard_flow_enabled: config.standard_flow_enabled,
    }
}

/// Reject user lists with empty or repeated usernames.
///
/// Usernames are derived per record without looking at other records, so
/// distinct ids such as `EMP-1` and `emp1` can collide. This check is never
/// run implicitly. Reported positions are 1-based.
pub fn check_unique_usernames(users: &[IdentityUser]) -> Result<(), RealmError> {
    find_username_conflict((1usize..).zip(users))
}

fn find_username_conflict<'a>(
    users: impl IntoIterator<Item = (usize, &'a IdentityUser)>,
) -> Result<(), RealmError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (index, user) in users {
        if user.username.is_empty() {
            return Err(RealmError::EmptyUsername { index });
        }
        if let Some(&first_index) = seen.get(user.username.as_str()) {
            return Err(RealmError::DuplicateUsername {
                username: user.username.clone(),
                first_index,
                second_index: index,
            });
        }
        seen.insert(&user.username, index);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemoryLoader;

    fn record(id: &str, first: &str) -> EmployeeRecord {
        EmployeeRecord::new(id, first, "Doe", "Engineering", "SWE")
    }

    #[test]
    fn test_default_realm_metadata() {
        let report = RealmAssembler::default()
            .assemble(&[record("EMP-007", "Jane")])
            .unwrap();
        let realm = &report.realm;

        assert_eq!(realm.realm, "technova");
        assert!(realm.enabled);
        assert_eq!(realm.display_name, "TechNova Global");
        assert_eq!(realm.clients.len(), 1);

        let client = &realm.clients[0];
        assert_eq!(client.client_id, "conceptor-oidc");
        assert!(client.enabled);
        assert_eq!(client.protocol, "openid-connect");
        assert!(!client.public_client);
        assert_eq!(client.redirect_uris, vec!["*"]);
        assert_eq!(client.secret, "oidc-client-secret");
        assert!(client.standard_flow_enabled);
    }

    #[test]
    fn test_preserves_input_order() {
        let records = vec![record("C-3", "Cara"), record("A-1", "Abe"), record("B-2", "Bea")];
        let report = RealmAssembler::default().assemble(&records).unwrap();
        let usernames: Vec<_> = report.realm.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(usernames, vec!["c3", "a1", "b2"]);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.users_emitted(), 3);
    }

    #[test]
    fn test_empty_input_produces_empty_user_list() {
        let report = RealmAssembler::default().assemble(&[]).unwrap();
        assert!(report.realm.users.is_empty());
        assert_eq!(report.realm.clients.len(), 1);
    }

    #[test]
    fn test_abort_policy_fails_whole_run() {
        let mut bad = record("EMP-2", "Bob");
        bad.title = None;
        let records = vec![record("EMP-1", "Ann"), bad, record("EMP-3", "Cy")];

        let err = RealmAssembler::default().assemble(&records).unwrap_err();
        match err {
            RealmError::InvalidRecord { index, source } => {
                assert_eq!(index, 2);
                assert_eq!(source.field(), "title");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_skip_policy_omits_and_counts() {
        let mut bad = record("EMP-2", "Bob");
        bad.department = None;
        let records = vec![record("EMP-1", "Ann"), bad, record("EMP-3", "Cy")];

        let report = RealmAssembler::default()
            .with_policy(FailurePolicy::Skip)
            .assemble(&records)
            .unwrap();

        assert_eq!(report.users_emitted(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 2);
        assert_eq!(report.skipped[0].error.field(), "department");
        assert_eq!(report.realm.users[1].username, "emp3");
    }

    #[test]
    fn test_duplicate_usernames_allowed_by_default() {
        let records = vec![record("EMP-1", "Ann"), record("emp1", "Ann")];
        let report = RealmAssembler::default().assemble(&records).unwrap();
        assert_eq!(report.realm.users[0].username, report.realm.users[1].username);
    }

    #[test]
    fn test_unique_usernames_opt_in() {
        let records = vec![record("EMP-1", "Ann"), record("X-9", "Xi"), record("emp1", "Ann")];
        let err = RealmAssembler::default()
            .with_unique_usernames(true)
            .assemble(&records)
            .unwrap_err();
        assert!(matches!(
            err,
            RealmError::DuplicateUsername { ref username, first_index: 1, second_index: 3 }
                if username == "emp1"
        ));
    }

    #[test]
    fn test_empty_username_rejected_by_check() {
        let users = RealmAssembler::default()
            .assemble(&[record("EMP-1", "Ann"), record("--", "Dash")])
            .unwrap()
            .realm
            .users;
        assert!(matches!(
            check_unique_usernames(&users),
            Err(RealmError::EmptyUsername { index: 2 })
        ));
    }

    #[test]
    fn test_error_positions_are_one_based() {
        let mut bad = record("EMP-2", "Bob");
        bad.title = None;
        let err = RealmAssembler::default()
            .assemble(&[record("EMP-1", "Ann"), bad])
            .unwrap_err();
        assert!(err.to_string().starts_with("employee record #2 rejected"));
        assert!(err.to_string().contains("'EMP-2'"));
    }

    #[test]
    fn test_duplicate_positions_count_skipped_records() {
        let mut bad = record("EMP-2", "Bob");
        bad.title = None;
        let records = vec![record("EMP-1", "Ann"), bad, record("emp1", "Ann")];

        let err = RealmAssembler::default()
            .with_policy(FailurePolicy::Skip)
            .with_unique_usernames(true)
            .assemble(&records)
            .unwrap_err();
        assert!(matches!(
            err,
            RealmError::DuplicateUsername { first_index: 1, second_index: 3, .. }
        ));
    }

    #[test]
    fn test_run_loads_then_assembles() {
        let loader = InMemoryLoader::new(vec![record("EMP-007", "Jane")]);
        let report = RealmAssembler::default().run(&loader).unwrap();
        assert_eq!(report.realm.users[0].email, "jane.doe.1658@example.net");

        let mut bad = record("EMP-8", "Ed");
        bad.name = None;
        let err = RealmAssembler::default()
            .run(&InMemoryLoader::new(vec![bad]))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Realm(RealmError::InvalidRecord { index: 1, .. })
        ));
    }

    #[test]
    fn test_custom_realm_and_client() {
        let mut config = AppConfig::default();
        config.realm.name = "acme".into();
        config.realm.display_name = "Acme".into();
        config.client.client_id = "portal".into();
        config.client.public_client = true;

        let realm = RealmAssembler::new(&config).wrap(Vec::new());
        assert_eq!(realm.realm, "acme");
        assert_eq!(realm.display_name, "Acme");
        assert_eq!(realm.clients[0].client_id, "portal");
        assert!(realm.clients[0].public_client);
    }
}
