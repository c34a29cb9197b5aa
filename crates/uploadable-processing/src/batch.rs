//! Per-field results of validating a whole form submission.

use uploadable_core::{FieldValue, FormFields, ValidationResult};

/// Result for one upload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub field: String,
    pub result: ValidationResult,
}

/// Results of [`UploadValidator::validate_all`](crate::UploadValidator::validate_all),
/// in submission order.
///
/// Only fields that were validated appear; skipped fields (no policy, not an
/// upload) do not. Files moved before a rejection are not rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    outcomes: Vec<FieldOutcome>,
    short_circuited: bool,
}

impl BatchOutcome {
    pub(crate) fn push(&mut self, field: &str, result: ValidationResult) {
        self.outcomes.push(FieldOutcome {
            field: field.to_string(),
            result,
        });
    }

    pub(crate) fn mark_short_circuited(&mut self) {
        self.short_circuited = true;
    }

    /// True when every validated field was accepted
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_accepted())
    }

    /// True when validation stopped at a rejection before reaching every field
    pub fn short_circuited(&self) -> bool {
        self.short_circuited
    }

    pub fn get(&self, field: &str) -> Option<&ValidationResult> {
        self.outcomes
            .iter()
            .find(|o| o.field == field)
            .map(|o| &o.result)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter()
    }

    pub fn rejections(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_accepted())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Replace each accepted field's upload record with its stored path.
    pub fn apply_to(&self, fields: &mut FormFields) {
        for outcome in &self.outcomes {
            if let Some(path) = outcome.result.final_relative_path() {
                fields.insert(outcome.field.as_str(), FieldValue::Text(path.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uploadable_core::{RejectionReason, UploadCandidate};

    fn accepted(path: &str) -> ValidationResult {
        ValidationResult::Accepted {
            final_relative_path: path.to_string(),
        }
    }

    #[test]
    fn test_empty_batch_is_success() {
        let outcome = BatchOutcome::default();
        assert!(outcome.is_success());
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_rejections_and_lookup() {
        let mut outcome = BatchOutcome::default();
        outcome.push("photo", accepted("/media/a.png"));
        outcome.push(
            "cv",
            ValidationResult::rejected(RejectionReason::InvalidExtension, "bad"),
        );

        assert!(!outcome.is_success());
        assert_eq!(outcome.len(), 2);
        let rejected: Vec<&str> = outcome.rejections().map(|o| o.field.as_str()).collect();
        assert_eq!(rejected, vec!["cv"]);
        assert_eq!(
            outcome.get("photo").and_then(|r| r.final_relative_path()),
            Some("/media/a.png")
        );
        assert!(outcome.get("missing").is_none());
    }

    #[test]
    fn test_apply_to_rewrites_only_accepted_fields() {
        let upload = FieldValue::Upload(UploadCandidate::new("/tmp/x", "image/png", "x.png"));
        let mut fields: FormFields = vec![
            ("title", FieldValue::Text("Hi".to_string())),
            ("photo", upload.clone()),
            ("cv", upload.clone()),
        ]
        .into_iter()
        .collect();

        let mut outcome = BatchOutcome::default();
        outcome.push("photo", accepted("/media/x_1.png"));
        outcome.push(
            "cv",
            ValidationResult::rejected(RejectionReason::UnsupportedMimeType, "no"),
        );
        outcome.apply_to(&mut fields);

        assert_eq!(
            fields.get("photo"),
            Some(&FieldValue::Text("/media/x_1.png".to_string()))
        );
        assert_eq!(fields.get("cv"), Some(&upload));
        assert_eq!(fields.get("title"), Some(&FieldValue::Text("Hi".to_string())));
    }
}
