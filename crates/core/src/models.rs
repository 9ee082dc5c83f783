//! Domain model types used throughout realmgen.
//!
//! Input types ([`EmployeeRecord`] and its nested parts) describe the
//! employee directory documents. Output types ([`IdentityUser`],
//! [`ClientDescriptor`], [`RealmDescriptor`]) serialize to the
//! identity-provider realm import format.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------

/// A scalar carried as text, whatever its source type.
///
/// Directory documents often leave numeric-looking values unquoted
/// (`level: 5`). Strings, integers, floats and booleans are all accepted and
/// kept in their canonical string form. Floats keep a fractional part
/// (`5.0` stays `"5.0"`).
struct Text(String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TextVisitor;

        impl<'de> Visitor<'de> for TextVisitor {
            type Value = Text;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Text, E> {
                Ok(Text(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Text, E> {
                Ok(Text(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Text, E> {
                Ok(Text(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Text, E> {
                Ok(Text(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Text, E> {
                Ok(Text(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Text, E> {
                Ok(Text(format!("{v:?}")))
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Text>::deserialize(deserializer)?.map(|t| t.0))
}

/// Like [`opt_text`], but folds the YAML 1.1 boolean spellings
/// (`yes`, `No`, `ON`, ...) to `true` / `false`.
fn opt_flag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.map(|text| match yaml11_bool(&text) {
        Some(flag) => flag.to_string(),
        None => text,
    }))
}

fn yaml11_bool(text: &str) -> Option<bool> {
    match text {
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => Some(true),
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn opt_text_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Text>>::deserialize(deserializer)?
        .map(|items| items.into_iter().map(|t| t.0).collect()))
}

// ---------------------------------------------------------------------------
// Employee record (input)
// ---------------------------------------------------------------------------

/// One employee as described by the directory documents.
///
/// Required fields are still `Option` here so that a document missing one
/// parses cleanly and the mapper can report exactly which field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub sub_department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure: Option<Tenure>,

    #[serde(default, deserialize_with = "opt_text_list", skip_serializing_if = "Option::is_none")]
    pub key_skills: Option<Vec<String>>,

    #[serde(default, deserialize_with = "opt_text_list", skip_serializing_if = "Option::is_none")]
    pub product_association: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting: Option<Reporting>,
}

/// Personal name block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,

    /// Name the employee goes by, if different from `first`.
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub preferred: Option<String>,
}

/// Work location block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Kept as text; `true` / `false` for any boolean spelling.
    #[serde(default, deserialize_with = "opt_flag", skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// Tenure block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenure {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
}

/// Reporting-line block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporting {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,

    #[serde(default, deserialize_with = "opt_text_list", skip_serializing_if = "Option::is_none")]
    pub dotted_line_ids: Option<Vec<String>>,
}

impl EmployeeRecord {
    /// Create a record with every required field set.
    pub fn new(
        id: impl Into<String>,
        first: impl Into<String>,
        last: impl Into<String>,
        department: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(PersonName {
                first: Some(first.into()),
                last: Some(last.into()),
                preferred: None,
            }),
            department: Some(department.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_preferred_name(mut self, preferred: impl Into<String>) -> Self {
        self.name.get_or_insert_with(PersonName::default).preferred = Some(preferred.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_sub_department(mut self, sub_department: impl Into<String>) -> Self {
        self.sub_department = Some(sub_department.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_hire_date(mut self, hire_date: impl Into<String>) -> Self {
        self.tenure = Some(Tenure {
            hire_date: Some(hire_date.into()),
        });
        self
    }

    pub fn with_key_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_skills = Some(skills.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_association = Some(products.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_reporting(mut self, reporting: Reporting) -> Self {
        self.reporting = Some(reporting);
        self
    }
}

// ---------------------------------------------------------------------------
// Identity user (output)
// ---------------------------------------------------------------------------

/// Multi-valued user attributes, keyed by attribute name.
///
/// Sorted keys keep the serialized output independent of insertion order.
pub type Attributes = BTreeMap<String, Vec<String>>;

/// A user in the identity-provider realm import format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub username: String,
    pub enabled: bool,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub email_verified: bool,
    pub attributes: Attributes,
    pub credentials: Vec<Credential>,
}

impl IdentityUser {
    /// Get all values of an attribute.
    pub fn attribute(&self, key: &str) -> Option<&Vec<String>> {
        self.attributes.get(key)
    }

    /// Get the first value of an attribute.
    pub fn single_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// A user credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl Credential {
    /// A permanent (non-temporary) password credential.
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.into(),
            temporary: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Realm descriptor (output)
// ---------------------------------------------------------------------------

/// An OpenID-Connect client registered in the realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDescriptor {
    pub client_id: String,
    pub enabled: bool,
    pub protocol: String,
    pub public_client: bool,
    pub redirect_uris: Vec<String>,
    pub secret: String,
    pub standard_flow_enabled: bool,
}

/// The top-level realm import document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmDescriptor {
    pub realm: String,
    pub enabled: bool,
    pub display_name: String,
    pub users: Vec<IdentityUser>,
    pub clients: Vec<ClientDescriptor>,
}

impl RealmDescriptor {
    /// Serialize as pretty-printed JSON (two-space indentation).
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
