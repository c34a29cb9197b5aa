//! Upload candidates, submitted form fields and validation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::LogLevel;

/// A single proposed upload under validation.
///
/// Exists only for the duration of one validation call; the validator never
/// persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    /// Temporary file written by the host's upload handling
    pub temp_path: PathBuf,
    /// MIME type claimed by the client
    pub declared_mime_type: String,
    /// Filename as sent by the client
    pub original_filename: String,
}

impl UploadCandidate {
    pub fn new(
        temp_path: impl Into<PathBuf>,
        declared_mime_type: impl Into<String>,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            temp_path: temp_path.into(),
            declared_mime_type: declared_mime_type.into(),
            original_filename: original_filename.into(),
        }
    }
}

/// Submitted value of one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Upload(UploadCandidate),
    Text(String),
    Empty,
}

impl FieldValue {
    /// The upload record, if this value carries one
    pub fn as_upload(&self) -> Option<&UploadCandidate> {
        match self {
            FieldValue::Upload(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// Insertion-ordered collection of submitted fields.
///
/// Re-inserting an existing field replaces its value in place, so the
/// original submission order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    entries: Vec<(String, FieldValue)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (field, value) in iter {
            fields.insert(field, value);
        }
        fields
    }
}

/// Why an upload was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The declared MIME type has no entry in the policy
    UnsupportedMimeType,
    /// The filename extension is not allowed for the declared MIME type
    InvalidExtension,
    /// The file's magic bytes identify a different type than declared
    ContentMismatch,
    /// The destination directory is missing or not writable
    DestinationNotWritable,
    /// Moving the temp file into place failed
    MoveFailed,
}

impl RejectionReason {
    /// Machine-readable code (e.g. "INVALID_EXTENSION")
    pub fn error_code(&self) -> &'static str {
        match self {
            RejectionReason::UnsupportedMimeType => "UNSUPPORTED_MIME_TYPE",
            RejectionReason::InvalidExtension => "INVALID_EXTENSION",
            RejectionReason::ContentMismatch => "CONTENT_MISMATCH",
            RejectionReason::DestinationNotWritable => "DESTINATION_NOT_WRITABLE",
            RejectionReason::MoveFailed => "MOVE_FAILED",
        }
    }

    /// Destination problems are operator concerns; everything else is the
    /// submitter's file.
    pub fn log_level(&self) -> LogLevel {
        match self {
            RejectionReason::UnsupportedMimeType
            | RejectionReason::InvalidExtension
            | RejectionReason::ContentMismatch => LogLevel::Debug,
            RejectionReason::DestinationNotWritable => LogLevel::Warn,
            RejectionReason::MoveFailed => LogLevel::Error,
        }
    }

    /// Generic client-facing message
    pub fn client_message(&self) -> &'static str {
        match self {
            RejectionReason::UnsupportedMimeType => "This file type is not accepted",
            RejectionReason::InvalidExtension => "An invalid extension was used",
            RejectionReason::ContentMismatch => "File content does not match its declared type",
            RejectionReason::DestinationNotWritable | RejectionReason::MoveFailed => {
                "File was not successfully uploaded"
            }
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The file now lives at `final_relative_path` (web-root relative, leading `/`)
    Accepted { final_relative_path: String },
    /// The file was left where it was; `detail` is safe to show the submitter
    Rejected {
        reason: RejectionReason,
        detail: String,
    },
}

impl ValidationResult {
    pub fn rejected(reason: RejectionReason, detail: impl Into<String>) -> Self {
        ValidationResult::Rejected {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted { .. })
    }

    pub fn final_relative_path(&self) -> Option<&str> {
        match self {
            ValidationResult::Accepted {
                final_relative_path,
            } => Some(final_relative_path),
            ValidationResult::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            ValidationResult::Accepted { .. } => None,
            ValidationResult::Rejected { reason, .. } => Some(*reason),
        }
    }
}
