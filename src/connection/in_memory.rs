//! In-memory directory for tests and local development.
//!
//! [`InMemoryDirectory`] implements [`Connector`] over a shared entry table.
//! It understands the subset of LDAP the reconciliation core speaks: simple
//! and unauthenticated binds, add, subtree search with AND/OR/NOT equality
//! and presence filters, delete, modify-DN (rename and move, subtrees
//! included) and modify with add/replace/delete semantics.
//!
//! Every request is recorded so tests can assert on what reached the wire, and
//! failures can be injected per request kind.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_provider::connection::{InMemoryDirectory, RequestKind, ProtocolError};
//!
//! # async fn example() {
//! let directory = InMemoryDirectory::new();
//! directory
//!     .register_credentials("cn=admin,dc=example,dc=com", "secret")
//!     .await;
//! directory
//!     .fail_next(RequestKind::Add, ProtocolError::with_code(50, "insufficient access"))
//!     .await;
//!
//! let stats = directory.stats().await;
//! assert_eq!(stats.entry_count, 0);
//! assert_eq!(stats.open_connections, 0);
//! # }
//! ```
//!
//! Distinguished names and attribute names are compared case-insensitively.
//! Search does not require the base entry to exist.

use crate::attributes::AttributeSet;
use crate::connection::{
    Connector, DirectoryConnection, Modification, ModifyDnRequest, ProtocolError, ProtocolResult,
    SearchEntry, SearchRequest, result_code,
};
use crate::dn;
use log::trace;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Kind of request, used for failure injection and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Dial,
    Bind,
    Add,
    Search,
    Delete,
    ModifyDn,
    Modify,
    Close,
}

/// A request as received by the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Dial { url: String },
    SimpleBind { dn: String },
    UnauthenticatedBind { dn: String },
    Add { dn: String, attributes: AttributeSet },
    Search(SearchRequest),
    Delete { dn: String },
    ModifyDn(ModifyDnRequest),
    Modify { dn: String, modifications: Vec<Modification> },
    Close,
}

impl RecordedRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            RecordedRequest::Dial { .. } => RequestKind::Dial,
            RecordedRequest::SimpleBind { .. } | RecordedRequest::UnauthenticatedBind { .. } => {
                RequestKind::Bind
            }
            RecordedRequest::Add { .. } => RequestKind::Add,
            RecordedRequest::Search(_) => RequestKind::Search,
            RecordedRequest::Delete { .. } => RequestKind::Delete,
            RecordedRequest::ModifyDn(_) => RequestKind::ModifyDn,
            RecordedRequest::Modify { .. } => RequestKind::Modify,
            RecordedRequest::Close => RequestKind::Close,
        }
    }
}

/// Counters for assertions and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InMemoryDirectoryStats {
    pub entry_count: usize,
    pub open_connections: usize,
    pub dials: usize,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    dn: String,
    // lowercased attribute name -> (attribute name as written, values)
    attributes: BTreeMap<String, (String, Vec<String>)>,
}

impl StoredEntry {
    fn new(dn: &str, attributes: &AttributeSet) -> Self {
        let mut entry = Self {
            dn: dn.to_string(),
            attributes: BTreeMap::new(),
        };
        for (name, values) in attributes.iter() {
            entry.set(name, values.to_vec());
        }
        entry
    }

    fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.attributes.get(&name.to_lowercase()).map(|(_, values)| values)
    }

    fn set(&mut self, name: &str, values: Vec<String>) {
        if values.is_empty() {
            self.attributes.remove(&name.to_lowercase());
        } else {
            self.attributes
                .insert(name.to_lowercase(), (name.to_string(), values));
        }
    }

    fn to_search_entry(&self, requested: &[String]) -> SearchEntry {
        let mut attributes = AttributeSet::new();
        for (key, (name, values)) in &self.attributes {
            if requested.is_empty() || requested.iter().any(|r| r.to_lowercase() == *key) {
                attributes.insert(name.clone(), values.clone());
            }
        }
        SearchEntry {
            dn: self.dn.clone(),
            attributes,
        }
    }

    fn apply(&mut self, modification: &Modification) -> ProtocolResult<()> {
        let name = modification.attribute();
        match modification {
            Modification::Add { values, .. } => {
                let mut current = self.values(name).cloned().unwrap_or_default();
                for value in values {
                    if current.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                        return Err(ProtocolError::with_code(
                            result_code::ATTRIBUTE_OR_VALUE_EXISTS,
                            format!("{name}: value '{value}' already exists"),
                        ));
                    }
                    current.push(value.clone());
                }
                self.set(name, current);
            }
            Modification::Replace { values, .. } => self.set(name, values.clone()),
            Modification::Delete { values, .. } => {
                let Some(current) = self.values(name).cloned() else {
                    return Err(ProtocolError::with_code(
                        result_code::NO_SUCH_ATTRIBUTE,
                        format!("{name}: no such attribute"),
                    ));
                };
                let mut remaining = current;
                for value in values {
                    let before = remaining.len();
                    remaining.retain(|v| !v.eq_ignore_ascii_case(value));
                    if remaining.len() == before {
                        return Err(ProtocolError::with_code(
                            result_code::NO_SUCH_ATTRIBUTE,
                            format!("{name}: no such value '{value}'"),
                        ));
                    }
                }
                if values.is_empty() {
                    remaining.clear();
                }
                self.set(name, remaining);
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct DirectoryState {
    // normalized dn -> entry
    entries: BTreeMap<String, StoredEntry>,
    credentials: HashMap<String, String>,
    deny_unauthenticated: bool,
    failures: HashMap<RequestKind, VecDeque<ProtocolError>>,
    requests: Vec<RecordedRequest>,
    open_connections: usize,
    dials: usize,
}

impl DirectoryState {
    fn record(&mut self, request: RecordedRequest) -> ProtocolResult<()> {
        trace!("in-memory directory received {:?}", request);
        let kind = request.kind();
        self.requests.push(request);
        match self.failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn has_children(&self, key: &str) -> bool {
        let suffix = format!(",{key}");
        self.entries.keys().any(|k| k.ends_with(&suffix))
    }
}

/// Thread-safe in-memory directory.
///
/// Clones share the same entries, so a test can keep one handle for
/// assertions while the client under test owns another.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryDirectory {
    /// Create an empty directory accepting any bind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `password` for simple binds as `bind_dn`. Once any credential
    /// is registered, simple binds with unknown DNs fail.
    pub async fn register_credentials(&self, bind_dn: &str, password: &str) {
        let mut state = self.state.lock().await;
        state
            .credentials
            .insert(dn::normalize(bind_dn), password.to_string());
    }

    /// Reject unauthenticated binds.
    pub async fn deny_unauthenticated(&self) {
        self.state.lock().await.deny_unauthenticated = true;
    }

    /// Make the next request of `kind` fail with `error`.
    pub async fn fail_next(&self, kind: RequestKind, error: ProtocolError) {
        let mut state = self.state.lock().await;
        state.failures.entry(kind).or_default().push_back(error);
    }

    /// Store an entry directly, bypassing request recording.
    pub async fn insert_entry(&self, dn: &str, attributes: &AttributeSet) {
        let mut state = self.state.lock().await;
        state
            .entries
            .insert(dn::normalize(dn), StoredEntry::new(dn, attributes));
    }

    /// Current state of an entry, all attributes included.
    pub async fn entry(&self, dn: &str) -> Option<SearchEntry> {
        let state = self.state.lock().await;
        state
            .entries
            .get(&dn::normalize(dn))
            .map(|entry| entry.to_search_entry(&[]))
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Requests of one kind, in order.
    pub async fn requests_of(&self, kind: RequestKind) -> Vec<RecordedRequest> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.kind() == kind)
            .collect()
    }

    /// Forget recorded requests.
    pub async fn clear_requests(&self) {
        self.state.lock().await.requests.clear();
    }

    /// Get directory statistics.
    pub async fn stats(&self) -> InMemoryDirectoryStats {
        let state = self.state.lock().await;
        InMemoryDirectoryStats {
            entry_count: state.entries.len(),
            open_connections: state.open_connections,
            dials: state.dials,
        }
    }
}

impl Connector for InMemoryDirectory {
    type Connection = InMemoryConnection;

    async fn dial(&self, url: &str) -> ProtocolResult<InMemoryConnection> {
        let mut state = self.state.lock().await;
        state.dials += 1;
        state.record(RecordedRequest::Dial {
            url: url.to_string(),
        })?;
        state.open_connections += 1;
        Ok(InMemoryConnection {
            state: Arc::clone(&self.state),
            open: true,
        })
    }
}

/// Connection handed out by [`InMemoryDirectory`].
pub struct InMemoryConnection {
    state: Arc<Mutex<DirectoryState>>,
    open: bool,
}

impl DirectoryConnection for InMemoryConnection {
    async fn simple_bind(&mut self, bind_dn: &str, password: &str) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::SimpleBind {
            dn: bind_dn.to_string(),
        })?;
        if state.credentials.is_empty() {
            return Ok(());
        }
        match state.credentials.get(&dn::normalize(bind_dn)) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(ProtocolError::with_code(
                result_code::INVALID_CREDENTIALS,
                "invalid credentials",
            )),
        }
    }

    async fn unauthenticated_bind(&mut self, bind_dn: &str) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::UnauthenticatedBind {
            dn: bind_dn.to_string(),
        })?;
        if state.deny_unauthenticated {
            return Err(ProtocolError::with_code(
                result_code::UNWILLING_TO_PERFORM,
                "unauthenticated bind not allowed",
            ));
        }
        Ok(())
    }

    async fn add(&mut self, dn: &str, attributes: &AttributeSet) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::Add {
            dn: dn.to_string(),
            attributes: attributes.clone(),
        })?;
        let key = dn::normalize(dn);
        if state.entries.contains_key(&key) {
            return Err(ProtocolError::with_code(
                result_code::ENTRY_ALREADY_EXISTS,
                format!("entry '{dn}' already exists"),
            ));
        }
        let mut entry = StoredEntry::new(dn, attributes);
        if let Some((attribute, value)) = dn::parse_dn(dn)
            .ok()
            .and_then(|(rdn, _)| dn::split_rdn(&rdn).map(|(a, v)| (a.to_string(), v)))
        {
            if entry.values(&attribute).is_none() {
                entry.set(&attribute, vec![value]);
            }
        }
        state.entries.insert(key, entry);
        Ok(())
    }

    async fn search(&mut self, request: &SearchRequest) -> ProtocolResult<Vec<SearchEntry>> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::Search(request.clone()))?;
        let filter = Filter::parse(&request.filter)?;
        let base = dn::normalize(&request.base);
        let suffix = format!(",{base}");
        Ok(state
            .entries
            .iter()
            .filter(|(key, _)| base.is_empty() || **key == base || key.ends_with(&suffix))
            .filter(|(_, entry)| filter.matches(entry))
            .map(|(_, entry)| entry.to_search_entry(&request.attributes))
            .collect())
    }

    async fn delete(&mut self, dn: &str) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::Delete { dn: dn.to_string() })?;
        let key = dn::normalize(dn);
        if !state.entries.contains_key(&key) {
            return Err(no_such_object(dn));
        }
        if state.has_children(&key) {
            return Err(ProtocolError::with_code(
                result_code::NOT_ALLOWED_ON_NON_LEAF,
                format!("entry '{dn}' has children"),
            ));
        }
        state.entries.remove(&key);
        Ok(())
    }

    async fn modify_dn(&mut self, request: &ModifyDnRequest) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::ModifyDn(request.clone()))?;
        let key = dn::normalize(&request.dn);
        let Some(mut entry) = state.entries.get(&key).cloned() else {
            return Err(no_such_object(&request.dn));
        };
        let (old_rdn, old_parent) = dn::parse_dn(&request.dn)
            .map_err(|e| ProtocolError::with_code(result_code::UNWILLING_TO_PERFORM, e.to_string()))?;
        let parent = request.new_superior.clone().unwrap_or(old_parent);
        let new_dn = dn::compose_dn(&request.new_rdn, &parent);
        let new_key = dn::normalize(&new_dn);
        if new_key != key && state.entries.contains_key(&new_key) {
            return Err(ProtocolError::with_code(
                result_code::ENTRY_ALREADY_EXISTS,
                format!("entry '{new_dn}' already exists"),
            ));
        }

        if request.delete_old_rdn {
            if let Some((attribute, value)) = dn::split_rdn(&old_rdn) {
                let remaining: Vec<String> = entry
                    .values(attribute)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|v| !v.eq_ignore_ascii_case(&value))
                    .collect();
                entry.set(attribute, remaining);
            }
        }
        if let Some((attribute, value)) = dn::split_rdn(&request.new_rdn) {
            let mut values = entry.values(attribute).cloned().unwrap_or_default();
            if !values.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
                values.push(value);
            }
            entry.set(attribute, values);
        }

        // Re-key the entry and its whole subtree.
        let old_suffix = format!(",{key}");
        let depth = dn::split_components(&request.dn).len();
        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|k| k.ends_with(&old_suffix))
            .cloned()
            .collect();
        for child_key in moved {
            if let Some(mut child) = state.entries.remove(&child_key) {
                let components = dn::split_components(&child.dn);
                let keep = components.len().saturating_sub(depth);
                child.dn = dn::compose_dn(&components[..keep].join(","), &new_dn);
                state.entries.insert(dn::normalize(&child.dn), child);
            }
        }
        state.entries.remove(&key);
        entry.dn = new_dn;
        state.entries.insert(new_key, entry);
        Ok(())
    }

    async fn modify(&mut self, dn: &str, modifications: &[Modification]) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        state.record(RecordedRequest::Modify {
            dn: dn.to_string(),
            modifications: modifications.to_vec(),
        })?;
        let key = dn::normalize(dn);
        let Some(mut entry) = state.entries.get(&key).cloned() else {
            return Err(no_such_object(dn));
        };
        // All or nothing: work on a copy.
        for modification in modifications {
            entry.apply(modification)?;
        }
        state.entries.insert(key, entry);
        Ok(())
    }

    async fn close(&mut self) -> ProtocolResult<()> {
        let mut state = self.state.lock().await;
        if self.open {
            self.open = false;
            state.open_connections = state.open_connections.saturating_sub(1);
        }
        state.record(RecordedRequest::Close)
    }
}

fn no_such_object(dn: &str) -> ProtocolError {
    ProtocolError::with_code(result_code::NO_SUCH_OBJECT, format!("no such object '{dn}'"))
}

/// The filter subset produced by the reconciliation core.
#[derive(Debug, Clone, PartialEq)]
enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equal(String, String),
    Present(String),
}

impl Filter {
    fn parse(input: &str) -> ProtocolResult<Self> {
        let (filter, rest) = Self::parse_one(input.trim())?;
        if !rest.trim().is_empty() {
            return Err(unsupported_filter(input));
        }
        Ok(filter)
    }

    fn parse_one(input: &str) -> ProtocolResult<(Self, &str)> {
        let body = input
            .strip_prefix('(')
            .ok_or_else(|| unsupported_filter(input))?;
        match body.chars().next() {
            Some(op @ ('&' | '|')) => {
                let mut rest = &body[1..];
                let mut children = Vec::new();
                while rest.starts_with('(') {
                    let (child, after) = Self::parse_one(rest)?;
                    children.push(child);
                    rest = after;
                }
                let rest = rest
                    .strip_prefix(')')
                    .ok_or_else(|| unsupported_filter(input))?;
                let filter = if op == '&' {
                    Filter::And(children)
                } else {
                    Filter::Or(children)
                };
                Ok((filter, rest))
            }
            Some('!') => {
                let (child, after) = Self::parse_one(&body[1..])?;
                let rest = after
                    .strip_prefix(')')
                    .ok_or_else(|| unsupported_filter(input))?;
                Ok((Filter::Not(Box::new(child)), rest))
            }
            Some(_) => {
                let end = body.find(')').ok_or_else(|| unsupported_filter(input))?;
                let (attribute, value) = body[..end]
                    .split_once('=')
                    .ok_or_else(|| unsupported_filter(input))?;
                let filter = if value == "*" {
                    Filter::Present(attribute.to_string())
                } else if value.contains('*') {
                    return Err(unsupported_filter(input));
                } else {
                    Filter::Equal(attribute.to_string(), dn::unescape_value(value))
                };
                Ok((filter, &body[end + 1..]))
            }
            None => Err(unsupported_filter(input)),
        }
    }

    fn matches(&self, entry: &StoredEntry) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|c| c.matches(entry)),
            Filter::Or(children) => children.iter().any(|c| c.matches(entry)),
            Filter::Not(child) => !child.matches(entry),
            Filter::Present(attribute) => entry.values(attribute).is_some(),
            Filter::Equal(attribute, value) => entry
                .values(attribute)
                .is_some_and(|values| values.iter().any(|v| v.to_lowercase() == value.to_lowercase())),
        }
    }
}

fn unsupported_filter(filter: &str) -> ProtocolError {
    ProtocolError::with_code(
        result_code::UNWILLING_TO_PERFORM,
        format!("unsupported filter '{filter}'"),
    )
}
