//! Core employee-to-identity mapping logic.
//!
//! [`IdentityMapper`] turns one [`EmployeeRecord`] into one [`IdentityUser`].
//! Mapping is a pure function of the record and the mapper's immutable
//! settings: no I/O, no logging, no state shared between records.

use crate::config::UsersConfig;
use crate::errors::MapError;
use crate::identity::hash::generate_stable_hash;
use crate::models::{Attributes, Credential, EmployeeRecord, IdentityUser};

/// Attribute names written to every user.
pub mod attr {
    pub const EMPLOYEE_ID: &str = "employeeId";
    pub const DEPARTMENT: &str = "department";
    pub const TITLE: &str = "title";
    pub const LEVEL: &str = "level";
    pub const SUB_DEPARTMENT: &str = "subDepartment";
    pub const LOCATION: &str = "location";
    pub const REMOTE: &str = "remote";
    pub const HIRE_DATE: &str = "hireDate";
    pub const KEY_SKILLS: &str = "keySkills";
    pub const PRODUCTS: &str = "products";
    pub const MANAGER_ID: &str = "managerId";
    pub const DOTTED_LINE_MANAGERS: &str = "dottedLineManagers";
    pub const PREFERRED_NAME: &str = "preferredName";
}

/// Maps employee records to identity-provider users.
///
/// Holds only immutable settings, so one mapper can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct IdentityMapper {
    email_domain: String,
    hash_length: usize,
    default_password: String,
}

impl Default for IdentityMapper {
    fn default() -> Self {
        Self::new(&UsersConfig::default())
    }
}

impl IdentityMapper {
    /// Create a mapper from the `[users]` config section.
    pub fn new(config: &UsersConfig) -> Self {
        Self {
            email_domain: config.email_domain.clone(),
            hash_length: config.hash_length,
            default_password: config.default_password.clone(),
        }
    }

    /// Map one employee record to one identity user.
    ///
    /// Fails with [`MapError::MissingRequiredField`] when `id`, `name`,
    /// `name.first`, `name.last`, `department` or `title` is absent (checked
    /// in that order). No partial user is produced.
    pub fn map_record(&self, record: &EmployeeRecord) -> Result<IdentityUser, MapError> {
        let required = RequiredFields::extract(record)?;
        let preferred = preferred_name(record, required.first);

        let username = derive_username(required.id);
        let email = self.derive_email(preferred, required.last, required.id);
        let mut attributes = flatten_attributes(record, &required);

        if preferred != required.first {
            attributes.insert(attr::PREFERRED_NAME.to_string(), vec![preferred.to_string()]);
        }

        Ok(IdentityUser {
            username,
            enabled: true,
            first_name: required.first.to_string(),
            last_name: required.last.to_string(),
            email,
            email_verified: true,
            attributes,
            credentials: vec![Credential::password(self.default_password.clone())],
        })
    }

    /// Build `given.last.hash@domain`, lower-cased with spaces removed from
    /// both name parts.
    pub fn derive_email(&self, given_name: &str, last_name: &str, id: &str) -> String {
        format!(
            "{}.{}.{}@{}",
            email_name_part(given_name),
            email_name_part(last_name),
            generate_stable_hash(id, self.hash_length),
            self.email_domain
        )
    }
}

/// Lower-case `id` and drop every character that is not an ASCII letter or
/// digit.
///
/// The result is a best-effort slug: it can be empty, and two ids that differ
/// only in punctuation or case collide. Callers that need uniqueness must
/// check for it (see [`crate::realm::check_unique_usernames`]).
pub fn derive_username(id: &str) -> String {
    id.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn email_name_part(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// `name.preferred` when present and non-empty, otherwise `first`.
fn preferred_name<'a>(record: &'a EmployeeRecord, first: &'a str) -> &'a str {
    record
        .name
        .as_ref()
        .and_then(|n| n.preferred.as_deref())
        .filter(|p| !p.is_empty())
        .unwrap_or(first)
}

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Borrowed view of the fields every record must carry.
struct RequiredFields<'a> {
    id: &'a str,
    first: &'a str,
    last: &'a str,
    department: &'a str,
    title: &'a str,
}

impl<'a> RequiredFields<'a> {
    fn extract(record: &'a EmployeeRecord) -> Result<Self, MapError> {
        let missing = |field: &str| MapError::MissingRequiredField {
            record: record.id.clone(),
            field: field.to_string(),
        };

        let id = record.id.as_deref().ok_or_else(|| missing("id"))?;
        let name = record.name.as_ref().ok_or_else(|| missing("name"))?;
        let first = name.first.as_deref().ok_or_else(|| missing("name.first"))?;
        let last = name.last.as_deref().ok_or_else(|| missing("name.last"))?;
        let department = record
            .department
            .as_deref()
            .ok_or_else(|| missing("department"))?;
        let title = record.title.as_deref().ok_or_else(|| missing("title"))?;

        Ok(Self {
            id,
            first,
            last,
            department,
            title,
        })
    }
}

// ---------------------------------------------------------------------------
// Attribute flattening
// ---------------------------------------------------------------------------

fn flatten_attributes(record: &EmployeeRecord, required: &RequiredFields<'_>) -> Attributes {
    let mut attributes = Attributes::new();
    let mut single = |key: &str, value: &str| {
        attributes.insert(key.to_string(), vec![value.to_string()]);
    };

    single(attr::EMPLOYEE_ID, required.id);
    single(attr::DEPARTMENT, required.department);
    single(attr::TITLE, required.title);
    single(attr::LEVEL, record.level.as_deref().unwrap_or(""));

    if let Some(ref sub_department) = record.sub_department {
        single(attr::SUB_DEPARTMENT, sub_department);
    }

    if let Some(ref location) = record.location {
        let parts: Vec<&str> = [location.city.as_deref(), location.country.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !parts.is_empty() {
            single(attr::LOCATION, &parts.join(", "));
        }
        if let Some(ref remote) = location.remote {
            single(attr::REMOTE, &remote.to_lowercase());
        }
    }

    if let Some(hire_date) = record.tenure.as_ref().and_then(|t| t.hire_date.as_deref()) {
        single(attr::HIRE_DATE, hire_date);
    }

    if let Some(ref reporting) = record.reporting {
        if let Some(ref manager_id) = reporting.manager_id {
            single(attr::MANAGER_ID, manager_id);
        }
    }

    let mut multi = |key: &str, values: &[String]| {
        attributes.insert(key.to_string(), values.to_vec());
    };

    match record.key_skills {
        Some(ref skills) if !skills.is_empty() => multi(attr::KEY_SKILLS, skills),
        _ => {}
    }

    match record.product_association {
        Some(ref products) if !products.is_empty() => multi(attr::PRODUCTS, products),
        _ => {}
    }

    if let Some(dotted) = record
        .reporting
        .as_ref()
        .and_then(|r| r.dotted_line_ids.as_deref())
    {
        multi(attr::DOTTED_LINE_MANAGERS, dotted);
    }

    attributes
}
