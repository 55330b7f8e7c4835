//! Multi-valued attribute sets.
//!
//! An [`AttributeSet`] is the common currency between domain objects and the
//! wire layer: domain objects serialize into one, search results arrive as one,
//! and the modify diff compares two of them.
//!
//! A key can be present without a value. Such an "unset slot" keeps the key in
//! [`AttributeSet::keys`] so a search still requests the attribute, while
//! [`AttributeSet::has_value`] and [`AttributeSet::for_each`] treat it as
//! absent. Slots are stored as an empty value vector. Data coming back from a
//! server with a single empty string is treated the same way.
//!
//! ```rust
//! use ldap_provider::attributes::AttributeSet;
//!
//! let attributes = AttributeSet::new()
//!     .with("cn", ["alice"])
//!     .with_single("description", "")
//!     .with("member", ["cn=a,dc=x", "cn=b,dc=x"]);
//!
//! assert_eq!(attributes.get_first("cn"), "alice");
//! assert!(!attributes.has_value("description"));
//! assert!(attributes.keys().any(|key| key == "description"));
//! assert_eq!(attributes.get("member").len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Mapping from attribute name to an ordered sequence of values.
///
/// Keys are case-sensitive schema attribute names (`cn`, `objectClass`,
/// `member`). Iteration follows key order, but callers must not rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    entries: BTreeMap<String, Vec<String>>,
}

impl AttributeSet {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `values`, replacing any previous entry.
    ///
    /// An empty `values` leaves an unset slot.
    pub fn insert<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.entries
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Set a single-valued attribute. An empty string leaves an unset slot.
    pub fn insert_single(&mut self, key: impl Into<String>, value: &str) {
        if value.is_empty() {
            self.request(key);
        } else {
            self.insert(key, [value]);
        }
    }

    /// Set a single-valued attribute from an optional value.
    pub fn insert_optional(&mut self, key: impl Into<String>, value: Option<String>) {
        match value {
            Some(value) => self.insert_single(key, &value),
            None => self.request(key),
        }
    }

    /// Reserve `key` without a value.
    pub fn request(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), Vec::new());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(key, values);
        self
    }

    /// Builder form of [`insert_single`](Self::insert_single).
    pub fn with_single(mut self, key: impl Into<String>, value: &str) -> Self {
        self.insert_single(key, value);
        self
    }

    /// Raw values for `key`; empty when absent.
    pub fn get(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value for `key`, or `""` when absent or empty.
    pub fn get_first(&self, key: &str) -> &str {
        self.get(key).first().map(String::as_str).unwrap_or("")
    }

    /// Whether `key` is present at all, including as an unset slot.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True iff `key` is present, has at least one value, and the first value
    /// is not the empty string.
    pub fn has_value(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(values) if values.first().is_some_and(|v| !v.is_empty()))
    }

    /// Invoke `f` for every entry that [`has_value`](Self::has_value).
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &[String]),
    {
        for (key, values) in self.iter() {
            f(key, values);
        }
    }

    /// Entries that carry a value, skipping unset slots.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(key, _)| self.has_value(key))
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Every key, unset slots included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of keys, unset slots included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for AttributeSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut set = AttributeSet::new();
        for (key, values) in iter {
            set.insert(key, values);
        }
        set
    }
}

impl From<HashMap<String, Vec<String>>> for AttributeSet {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, values)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: [{}]", values.join(", "))?;
        }
        f.write_str("}")
    }
}
