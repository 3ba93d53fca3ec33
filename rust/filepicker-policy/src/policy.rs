use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{PolicyError, Secret, SignedPolicy};

/// Operations a policy can permit.
///
/// See the `call` field of the Filepicker security documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    /// Read file contents.
    Read,
    /// Download file contents.
    Download,
    /// Read file metadata.
    Stat,
    /// Request conversions of a file.
    Convert,
    /// Overwrite a file with new content.
    Write,
    /// Overwrite a file from a remote URL.
    WriteUrl,
    /// Store new files.
    Store,
    /// Open the picker dialog.
    Pick,
    /// Delete a file.
    Remove,
}

impl Call {
    /// Get the wire name of the call.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Download => "download",
            Self::Stat => "stat",
            Self::Convert => "convert",
            Self::Write => "write",
            Self::WriteUrl => "writeUrl",
            Self::Store => "store",
            Self::Pick => "pick",
            Self::Remove => "remove",
        }
    }
}

impl std::fmt::Display for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authorization policy.
///
/// Entries are kept in lexicographic key order so that the JSON encoding,
/// and therefore the signature, only depends on the policy content.
///
/// ```
/// use filepicker_policy::{Call, Policy};
///
/// let policy = Policy::new()
///     .expiry(1508141504)
///     .call(Call::Convert)
///     .handle("KW9EJhYtS6y48Whm2S6D");
///
/// assert_eq!(policy.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy(BTreeMap<String, Value>);

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary entry.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the expiry as seconds since the unix epoch.
    pub fn expiry(self, epoch_seconds: u64) -> Self {
        self.insert("expiry", epoch_seconds)
    }

    /// Set the expiry relative to the current time.
    pub fn expires_in(self, duration: Duration) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        self.expiry(now.saturating_add(duration.as_secs()))
    }

    /// Permit a single call.
    pub fn call(self, call: Call) -> Self {
        self.insert("call", call.as_str())
    }

    /// Permit several calls.
    pub fn calls(self, calls: impl IntoIterator<Item = Call>) -> Self {
        let calls: Vec<Value> = calls.into_iter().map(|c| c.as_str().into()).collect();
        self.insert("call", calls)
    }

    /// Restrict the policy to a single file handle.
    pub fn handle(self, handle: impl Into<String>) -> Self {
        self.insert("handle", handle.into())
    }

    /// Restrict stores to paths matching the given pattern.
    pub fn path(self, path: impl Into<String>) -> Self {
        self.insert("path", path.into())
    }

    /// Restrict stores to the given container.
    pub fn container(self, container: impl Into<String>) -> Self {
        self.insert("container", container.into())
    }

    /// Minimum size in bytes of stored files.
    pub fn min_size(self, bytes: u64) -> Self {
        self.insert("minSize", bytes)
    }

    /// Maximum size in bytes of stored files.
    pub fn max_size(self, bytes: u64) -> Self {
        self.insert("maxSize", bytes)
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the policy is bound to a specific handle.
    pub fn bound_handle(&self) -> Option<&str> {
        self.0.get("handle").and_then(Value::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the policy has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Serialize the policy to its canonical JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, PolicyError> {
        serde_json::to_vec(&self.0).map_err(|e| PolicyError::Serialization(e.to_string()))
    }

    /// Sign the policy with the given secret.
    pub fn sign(&self, secret: &Secret) -> Result<SignedPolicy, PolicyError> {
        SignedPolicy::sign(self, secret)
    }
}

impl From<BTreeMap<String, Value>> for Policy {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self(entries)
    }
}

impl FromIterator<(String, Value)> for Policy {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
