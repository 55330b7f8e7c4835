//! Change planning between an observed and a desired object.
//!
//! Both functions are pure: they decide which requests a modify needs without
//! touching the network.
//!
//! ```rust
//! use ldap_provider::attributes::AttributeSet;
//! use ldap_provider::client::diff::diff_attributes;
//! use ldap_provider::connection::Modification;
//!
//! let old = AttributeSet::new().with("description", ["a"]);
//! let new = AttributeSet::new()
//!     .with("description", ["b"])
//!     .with("mail", ["x"])
//!     .with_single("sn", "");
//!
//! let b = vec!["b".to_string()];
//! let x = vec!["x".to_string()];
//! assert_eq!(
//!     diff_attributes(&old, &new),
//!     vec![Modification::replace("description", &b), Modification::add("mail", &x)]
//! );
//! ```

use crate::attributes::AttributeSet;
use crate::connection::{Modification, ModifyDnRequest};
use crate::dn;
use crate::objects::DirectoryObject;

/// Modifications turning `old` into `new`.
///
/// - A key valued in `new` but not in `old` is added.
/// - A key valued in both whose sequences differ at any index, or in length,
///   is replaced with the whole new sequence.
/// - A key valued in `old` but not in `new` is deleted with old's values.
///
/// Equal sets produce no modifications.
pub fn diff_attributes(old: &AttributeSet, new: &AttributeSet) -> Vec<Modification> {
    let mut modifications = Vec::new();
    new.for_each(|key, values| {
        if !old.has_value(key) {
            modifications.push(Modification::add(key, values));
        } else if old.get(key) != values {
            modifications.push(Modification::replace(key, values));
        }
    });
    old.for_each(|key, values| {
        if !new.has_value(key) {
            modifications.push(Modification::delete(key, values));
        }
    });
    modifications
}

/// Modify-DN request moving `old` to `new`'s name, or `None` when both
/// address the same entry.
///
/// `new_superior` is set only when the container path changes, so a pure
/// rename leaves the entry in place. The old RDN value is removed.
pub fn plan_rename<O>(old: &O, new: &O) -> Option<ModifyDnRequest>
where
    O: DirectoryObject + ?Sized,
{
    let old_dn = old.distinguished_name();
    let new_dn = new.distinguished_name();
    if dn::same_dn(&old_dn, &new_dn) {
        return None;
    }

    let new_rdn = new.relative_dn();
    let old_path = dn::strip_relative_dn(&old_dn, &old.relative_dn());
    let new_path = dn::strip_relative_dn(&new_dn, &new_rdn);
    let new_superior = (!dn::same_dn(&old_path, &new_path)).then_some(new_path);

    Some(ModifyDnRequest {
        dn: old_dn,
        new_rdn,
        delete_old_rdn: true,
        new_superior,
    })
}
