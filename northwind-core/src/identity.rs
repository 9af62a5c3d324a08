//! Identity types for Northwind entities
//!
//! Every cache key and every store lookup goes through [`EntityKey`], which
//! can only be built from a normalized (uppercased) identifier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::ValidationError;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Entity kind discriminator, one per mirrored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    Employee,
}

impl EntityKind {
    /// Name of the identifier column for this kind.
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Customer => "CustomerID",
            EntityKind::Employee => "EmployeeID",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Customer => f.write_str("customer"),
            EntityKind::Employee => f.write_str("employee"),
        }
    }
}

/// Canonical form of an identifier: uppercase.
///
/// Idempotent: `normalize_id(&normalize_id(x)) == normalize_id(x)`.
pub fn normalize_id(raw: &str) -> String {
    raw.to_uppercase()
}

/// A normalized entity identifier.
///
/// The only constructor is [`EntityKey::new`], so holding an `EntityKey`
/// means the identifier is non-blank and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Normalize a caller-supplied identifier for the given entity kind.
    pub fn new(kind: EntityKind, raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: kind.id_field().to_string(),
            });
        }
        Ok(Self(normalize_id(raw)))
    }

    /// Borrow the normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key and return the normalized identifier.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A record that can be mirrored by the entity cache.
///
/// # Implementation Requirements
///
/// - `KIND` must be the same for every instance
/// - `raw_id()` returns the identifier exactly as it is currently stored on
///   the record, which may not be normalized yet
/// - `assign_key()` overwrites the embedded identifier with the normalized one
pub trait Entity:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The table this record belongs to.
    const KIND: EntityKind;

    /// The embedded identifier as supplied.
    fn raw_id(&self) -> &str;

    /// Replace the embedded identifier with its normalized form.
    fn assign_key(&mut self, key: &EntityKey);

    /// Country column, used for filtered listings.
    fn country(&self) -> Option<&str>;

    /// Normalized key derived from the embedded identifier.
    fn key(&self) -> Result<EntityKey, ValidationError> {
        EntityKey::new(Self::KIND, self.raw_id())
    }

    /// Normalize the embedded identifier in place and return the key.
    fn normalize(&mut self) -> Result<EntityKey, ValidationError> {
        let key = self.key()?;
        self.assign_key(&key);
        Ok(key)
    }
}
