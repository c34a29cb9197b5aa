//! Upload policies
//!
//! A [`Policy`] says which MIME types a field accepts, which extensions are
//! allowed for each of them, and where accepted files are stored. A
//! [`PolicySet`] holds one policy per configured field plus the `default`
//! policy applied to every other field.
//!
//! # Policy documents
//!
//! Policies are configured with a JSON object keyed by field name:
//!
//! ```json
//! {
//!   "default": { "accept": false },
//!   "photo": {
//!     "accept": { "image/jpeg": ["jpg", "jpeg"], "image/png": ["png"] },
//!     "path": "media",
//!     "prefix": "upload"
//!   }
//! }
//! ```
//!
//! Entries are merged over the built-in defaults key by key. `"accept": false`
//! (or an empty mapping) disables a policy.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use validator::Validate;

use crate::error::PolicyError;

/// Reserved key holding the policy for fields without their own entry
pub const DEFAULT_POLICY_KEY: &str = "default";

const DEFAULT_PATH: &str = "media";
const DEFAULT_PREFIX: &str = "upload";

/// Accepted MIME types, extensions and destination for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    accept: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "path")]
    destination_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

impl Policy {
    /// Create a policy storing into `destination_path` (relative to the web
    /// root) that accepts nothing until [`Policy::accept`] is called.
    pub fn new(destination_path: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            accept: BTreeMap::new(),
            destination_path: normalize_path("policy", destination_path)?,
            prefix: None,
        })
    }

    /// Allow `mime_type` with the given extensions.
    pub fn accept<I, S>(mut self, mime_type: &str, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        self.accept.insert(normalize_mime(mime_type), extensions);
        self
    }

    /// Set the filename prefix. An empty prefix clears it.
    pub fn with_prefix(mut self, prefix: &str) -> Result<Self, PolicyError> {
        self.prefix = normalize_prefix("policy", Some(prefix))?;
        Ok(self)
    }

    /// Allowed extensions for a declared MIME type, if the type is accepted.
    pub fn extensions_for(&self, mime_type: &str) -> Option<&BTreeSet<String>> {
        self.accept.get(&normalize_mime(mime_type))
    }

    /// A policy with no accepted MIME types is disabled
    pub fn is_enabled(&self) -> bool {
        !self.accept.is_empty()
    }

    pub fn destination_path(&self) -> &str {
        &self.destination_path
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn builtin_default() -> Self {
        Self {
            accept: BTreeMap::new(),
            destination_path: DEFAULT_PATH.to_string(),
            prefix: Some(DEFAULT_PREFIX.to_string()),
        }
        .accept("image/jpeg", ["jpg", "jpeg"])
        .accept("image/gif", ["gif"])
        .accept("image/png", ["png"])
    }

    fn from_entry(field: &str, entry: PolicyEntry) -> Result<Self, PolicyError> {
        entry
            .validate()
            .map_err(|e| PolicyError::InvalidEntry {
                field: field.to_string(),
                message: e.to_string(),
            })?;

        let mut policy = Self {
            accept: BTreeMap::new(),
            destination_path: normalize_path(field, &entry.path)?,
            prefix: normalize_prefix(field, entry.prefix.as_deref())?,
        };

        match entry.accept {
            AcceptSpec::Disabled(false) => {}
            AcceptSpec::Disabled(true) => {
                return Err(PolicyError::InvalidEntry {
                    field: field.to_string(),
                    message: "accept must be false or a MIME type mapping".to_string(),
                });
            }
            AcceptSpec::Mapping(mapping) => {
                for (mime_type, extensions) in mapping {
                    if normalize_mime(&mime_type).is_empty() {
                        return Err(PolicyError::InvalidEntry {
                            field: field.to_string(),
                            message: "empty MIME type in accept mapping".to_string(),
                        });
                    }
                    policy = policy.accept(&mime_type, extensions);
                }
            }
        }

        Ok(policy)
    }
}

/// Per-field policies plus the default policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySet {
    default: Policy,
    fields: BTreeMap<String, Policy>,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::default_set()
    }
}

impl PolicySet {
    /// Built-in policies: JPEG, GIF and PNG images into `media/` with the
    /// `upload` prefix, applied to every field.
    pub fn default_set() -> Self {
        Self::new(Policy::builtin_default())
    }

    pub fn new(default: Policy) -> Self {
        Self {
            default,
            fields: BTreeMap::new(),
        }
    }

    /// Configure a field-specific policy, overriding the default for it.
    pub fn with_field(mut self, field: impl Into<String>, policy: Policy) -> Self {
        let field = field.into();
        if field == DEFAULT_POLICY_KEY {
            self.default = policy;
        } else {
            self.fields.insert(field, policy);
        }
        self
    }

    /// Parse a JSON policy document and merge it over the built-in defaults.
    pub fn from_json(document: &str) -> Result<Self, PolicyError> {
        let entries: BTreeMap<String, PolicyEntry> = serde_json::from_str(document)?;

        let mut set = Self::default_set();
        for (field, entry) in entries {
            let policy = Policy::from_entry(&field, entry)?;
            set = set.with_field(field, policy);
        }

        tracing::debug!(
            fields = set.fields.len(),
            default_enabled = set.default.is_enabled(),
            "Loaded upload policies"
        );

        Ok(set)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&document)
    }

    pub fn default_policy(&self) -> &Policy {
        &self.default
    }

    pub fn field_policy(&self, field: &str) -> Option<&Policy> {
        self.fields.get(field)
    }

    /// The policy governing `field`: its own entry if configured, otherwise
    /// the default when the default is enabled.
    pub fn policy_for(&self, field: &str) -> Option<&Policy> {
        self.fields
            .get(field)
            .or_else(|| self.default.is_enabled().then_some(&self.default))
    }
}

impl Serialize for PolicySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = std::iter::once((DEFAULT_POLICY_KEY, &self.default))
            .chain(self.fields.iter().map(|(field, policy)| (field.as_str(), policy)));
        serializer.collect_map(entries)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
struct PolicyEntry {
    #[serde(default)]
    accept: AcceptSpec,
    #[serde(default = "default_path")]
    #[validate(length(min = 1, max = 255))]
    path: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AcceptSpec {
    Disabled(bool),
    Mapping(BTreeMap<String, Vec<String>>),
}

impl Default for AcceptSpec {
    fn default() -> Self {
        AcceptSpec::Disabled(false)
    }
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

/// Lowercase and drop media type parameters: `Image/PNG; q=1` -> `image/png`
pub fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Extensions that are empty or not plain ASCII alphanumerics are dropped
fn normalize_extension(extension: &str) -> Option<String> {
    let extension = extension.trim().trim_start_matches('.').to_lowercase();
    (!extension.is_empty() && extension.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(extension)
}

fn normalize_path(field: &str, path: &str) -> Result<String, PolicyError> {
    let invalid = || PolicyError::InvalidPath {
        field: field.to_string(),
        path: path.to_string(),
    };

    if path.contains('\\') {
        return Err(invalid());
    }

    let mut segments = Vec::new();
    for segment in path.trim().split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(invalid()),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(invalid());
    }
    Ok(segments.join("/"))
}

fn normalize_prefix(field: &str, prefix: Option<&str>) -> Result<Option<String>, PolicyError> {
    let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PolicyError::InvalidEntry {
            field: field.to_string(),
            message: format!("prefix '{}' may only contain letters, digits, '-' and '_'", prefix),
        });
    }
    Ok(Some(prefix.to_string()))
}
