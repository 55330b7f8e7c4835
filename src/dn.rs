//! Distinguished name helpers and search filter construction.
//!
//! Pure functions, no I/O. Attribute values are escaped with the `ldap3`
//! helpers: [`ldap3::dn_escape`] for values embedded in a DN (RFC 4514) and
//! [`ldap3::ldap_escape`] for values embedded in a filter (RFC 4515).
//!
//! ```rust
//! use ldap_provider::dn;
//!
//! assert_eq!(dn::base_dn("cn=x,ou=y,dc=example,dc=com"), "dc=example,dc=com");
//! assert_eq!(
//!     dn::filter("cn=alice", &["person", "user"]),
//!     "(&(cn=alice)(objectClass=person)(objectClass=user))"
//! );
//!
//! let (rdn, path) = dn::parse_dn("cn=alice,ou=people,dc=example,dc=com").unwrap();
//! assert_eq!(rdn, "cn=alice");
//! assert_eq!(path, "ou=people,dc=example,dc=com");
//! ```

use crate::error::{DirectoryError, DirectoryResult};

const DOMAIN_COMPONENT: &str = "dc";

/// Filter term used when no object class is known.
pub const ANY_OBJECT_CLASS: &str = "objectClass=*";

/// Trailing chain of `dc=` components of `path`.
///
/// Walks the components from the right and stops at the first one whose
/// attribute type is not `dc` (case-insensitive). Returns `""` when the
/// rightmost component is not a domain component.
pub fn base_dn(path: &str) -> String {
    let mut domain: Vec<&str> = split_components(path)
        .into_iter()
        .rev()
        .map(str::trim)
        .take_while(|component| attribute_type(component).eq_ignore_ascii_case(DOMAIN_COMPONENT))
        .collect();
    domain.reverse();
    domain.join(",")
}

/// `attribute=value` with the value escaped for use inside a DN.
pub fn relative_dn(attribute: &str, value: &str) -> String {
    format!("{attribute}={}", ldap3::dn_escape(value))
}

/// Join an RDN and its container path.
pub fn compose_dn(relative_dn: &str, path: &str) -> String {
    if path.is_empty() {
        relative_dn.to_string()
    } else {
        format!("{relative_dn},{path}")
    }
}

/// AND filter matching `relative_dn` and every object class.
///
/// The RDN value is unescaped from its DN form and re-escaped for the filter.
/// An empty class list produces the wildcard term `(objectClass=*)` so the
/// filter keeps the same shape.
pub fn filter<S: AsRef<str>>(relative_dn: &str, object_classes: &[S]) -> String {
    let mut filter = String::from("(&(");
    match split_rdn(relative_dn) {
        Some((attribute, value)) => {
            filter.push_str(attribute);
            filter.push('=');
            filter.push_str(&ldap3::ldap_escape(value.as_str()));
        }
        None => filter.push_str(relative_dn),
    }
    filter.push(')');

    if object_classes.is_empty() {
        filter.push('(');
        filter.push_str(ANY_OBJECT_CLASS);
        filter.push(')');
    }
    for class in object_classes {
        filter.push_str("(objectClass=");
        filter.push_str(&ldap3::ldap_escape(class.as_ref()));
        filter.push(')');
    }
    filter.push(')');
    filter
}

/// Split `dn` at its first unescaped comma into `(rdn, path)`.
///
/// # Errors
///
/// [`DirectoryError::MalformedName`] when there is no comma or either side
/// would be empty.
pub fn parse_dn(dn: &str) -> DirectoryResult<(String, String)> {
    match first_unescaped_comma(dn) {
        Some(index) if index > 0 && index < dn.len() - 1 => {
            Ok((dn[..index].to_string(), dn[index + 1..].to_string()))
        }
        Some(_) => Err(DirectoryError::malformed_name(
            dn,
            "relative name and path must both be non-empty",
        )),
        None => Err(DirectoryError::malformed_name(
            dn,
            "expected '<rdn>,<path>'",
        )),
    }
}

/// Split an RDN into its attribute type and unescaped value.
///
/// Returns `None` when there is no `=`.
pub fn split_rdn(relative_dn: &str) -> Option<(&str, String)> {
    let (attribute, value) = relative_dn.split_once('=')?;
    Some((attribute.trim(), unescape_value(value)))
}

/// Container path of `dn` when its leading component names `relative_dn`.
///
/// Components are compared in their [`normalize`]d form, so `CN=Smith\, John`
/// matches `cn=Smith\2c John`. When the leading component differs, `dn` is
/// returned unchanged.
pub fn strip_relative_dn(dn: &str, relative_dn: &str) -> String {
    let (head, tail) = match first_unescaped_comma(dn) {
        Some(index) => (&dn[..index], &dn[index + 1..]),
        None => (dn, ""),
    };
    if normalize_component(head) == normalize_component(relative_dn) {
        tail.trim_start().to_string()
    } else {
        dn.to_string()
    }
}

/// Canonical form of `dn` for comparison.
///
/// Each component is split into attribute type and unescaped value, both
/// lowercased and trimmed, and the value re-escaped one way. Two spellings
/// of the same name normalize to the same string.
pub fn normalize(dn: &str) -> String {
    split_components(dn)
        .into_iter()
        .map(normalize_component)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether two names address the same entry.
pub fn same_dn(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Components of `dn`, split on unescaped commas.
pub fn split_components(dn: &str) -> Vec<&str> {
    if dn.is_empty() {
        return Vec::new();
    }
    let mut components = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (index, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => {
                components.push(&dn[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    components.push(&dn[start..]);
    components
}

/// Reverse RFC 4514 escaping: `\,` style pairs and `\2C` style hex pairs.
pub fn unescape_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\' && index + 1 < bytes.len() {
            let hex = value
                .get(index + 1..index + 3)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok());
            match hex {
                Some(byte) => {
                    out.push(byte);
                    index += 3;
                }
                None => {
                    out.push(bytes[index + 1]);
                    index += 2;
                }
            }
        } else {
            out.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn first_unescaped_comma(dn: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, c) in dn.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ',' => return Some(index),
            _ => {}
        }
    }
    None
}

fn normalize_component(component: &str) -> String {
    let component = component.trim();
    match split_rdn(component) {
        Some((attribute, value)) => format!(
            "{}={}",
            attribute.to_ascii_lowercase(),
            ldap3::dn_escape(value.trim().to_lowercase())
        ),
        None => component.to_lowercase(),
    }
}

fn attribute_type(component: &str) -> &str {
    component
        .split_once('=')
        .map(|(attribute, _)| attribute.trim())
        .unwrap_or("")
}
