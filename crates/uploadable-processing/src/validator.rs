//! Upload validation
//!
//! [`UploadValidator`] decides whether a candidate file is accepted by a
//! policy and, if so, moves it into the policy's destination under a unique
//! name. Checks run in a fixed order and the first failure wins:
//!
//! 1. declared MIME type is in the policy
//! 2. filename extension is allowed for that MIME type
//! 3. file content matches the declared type (only with a sniffer attached)
//! 4. destination directory is writable
//! 5. the move succeeds
//!
//! The extension cross-check makes MIME spoofing harder but does not prevent
//! it; attach a [`ContentSniffer`] for a content-based check.

use std::sync::Arc;

use uploadable_core::policy::normalize_mime;
use uploadable_core::{
    BatchMode, FieldValue, FormFields, LogLevel, Policy, PolicySet, RejectionReason,
    UploadCandidate, UploaderConfig, ValidationResult,
};
use uploadable_storage::{LocalStorage, Storage};

use crate::batch::BatchOutcome;
use crate::naming::{split_filename, stored_filename, TokenGenerator, UuidTokens};
use crate::upload::{ContentSniffer, UploadDirProvenance, UploadProvenance};

/// Validates uploads against policies and stores accepted files
#[derive(Clone)]
pub struct UploadValidator {
    policies: PolicySet,
    storage: Arc<dyn Storage>,
    provenance: Arc<dyn UploadProvenance>,
    tokens: Arc<dyn TokenGenerator>,
    sniffer: Option<Arc<dyn ContentSniffer>>,
    batch_mode: BatchMode,
}

impl UploadValidator {
    pub fn new(
        policies: PolicySet,
        storage: Arc<dyn Storage>,
        provenance: Arc<dyn UploadProvenance>,
    ) -> Self {
        Self {
            policies,
            storage,
            provenance,
            tokens: Arc::new(UuidTokens),
            sniffer: None,
            batch_mode: BatchMode::default(),
        }
    }

    /// Local storage under the configured web root, provenance from the
    /// upload temp directory.
    pub fn from_config(config: &UploaderConfig) -> Self {
        let validator = Self::new(
            config.policies.clone(),
            Arc::new(LocalStorage::new(&config.web_root)),
            Arc::new(UploadDirProvenance::new(&config.upload_tmp_dir)),
        )
        .with_batch_mode(config.batch_mode);

        if config.content_sniffing {
            attach_magic_byte_sniffer(validator)
        } else {
            validator
        }
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_sniffer(mut self, sniffer: Arc<dyn ContentSniffer>) -> Self {
        self.sniffer = Some(sniffer);
        self
    }

    pub fn with_batch_mode(mut self, batch_mode: BatchMode) -> Self {
        self.batch_mode = batch_mode;
        self
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Whether `value` is an upload record the host confirms it created.
    pub async fn looks_like_upload_candidate(&self, value: &FieldValue) -> bool {
        match value.as_upload() {
            Some(candidate) if !candidate.temp_path.as_os_str().is_empty() => {
                self.provenance
                    .is_genuine_upload(&candidate.temp_path)
                    .await
            }
            _ => false,
        }
    }

    /// Validate one candidate against `policy` and move it into place.
    ///
    /// Provenance is the caller's responsibility here; [`validate_all`]
    /// checks it before calling this.
    ///
    /// [`validate_all`]: UploadValidator::validate_all
    pub async fn validate(&self, candidate: &UploadCandidate, policy: &Policy) -> ValidationResult {
        let result = self.run_checks(candidate, policy).await;
        log_outcome(candidate, &result);
        result
    }

    /// Validate every upload field in submission order.
    ///
    /// Each field uses its own policy if configured, otherwise the default
    /// policy when that is enabled. Fields without a governing policy and
    /// values that are not genuine uploads are skipped. In
    /// [`BatchMode::FailFast`] the walk stops at the first rejection.
    pub async fn validate_all(&self, fields: &FormFields) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (field, value) in fields.iter() {
            let Some(policy) = self.policies.policy_for(field) else {
                continue;
            };
            let Some(candidate) = value.as_upload() else {
                continue;
            };
            if !self.looks_like_upload_candidate(value).await {
                tracing::debug!(field = %field, "Skipping field without a genuine upload");
                continue;
            }

            let result = self.validate(candidate, policy).await;
            let rejected = !result.is_accepted();
            outcome.push(field, result);

            if rejected && self.batch_mode == BatchMode::FailFast {
                tracing::info!(field = %field, "Upload rejected, skipping remaining fields");
                outcome.mark_short_circuited();
                break;
            }
        }

        outcome
    }

    async fn run_checks(&self, candidate: &UploadCandidate, policy: &Policy) -> ValidationResult {
        let mime_type = normalize_mime(&candidate.declared_mime_type);
        let allowed = if mime_type.is_empty() {
            None
        } else {
            policy.extensions_for(&mime_type)
        };
        let Some(allowed) = allowed else {
            return ValidationResult::rejected(
                RejectionReason::UnsupportedMimeType,
                format!(
                    "Files of type '{}' are not accepted",
                    candidate.declared_mime_type
                ),
            );
        };

        let split = split_filename(&candidate.original_filename)
            .filter(|(_, extension)| allowed.contains(extension));
        let Some((base_name, extension)) = split else {
            let allowed_list: Vec<&str> = allowed.iter().map(String::as_str).collect();
            return ValidationResult::rejected(
                RejectionReason::InvalidExtension,
                format!(
                    "An invalid extension was used, you may only upload: {}",
                    allowed_list.join(", ")
                ),
            );
        };

        if let Some(sniffer) = &self.sniffer {
            match sniffer.sniff(&candidate.temp_path).await {
                Ok(Some(detected)) if normalize_mime(&detected) != mime_type => {
                    return ValidationResult::rejected(
                        RejectionReason::ContentMismatch,
                        format!(
                            "File content looks like '{}', not '{}'",
                            detected, candidate.declared_mime_type
                        ),
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.temp_path.display(),
                        error = %e,
                        "Failed to read upload for content sniffing"
                    );
                    return ValidationResult::rejected(
                        RejectionReason::ContentMismatch,
                        "File content could not be inspected",
                    );
                }
            }
        }

        let destination = policy.destination_path();
        if !self.storage.is_writable(destination).await {
            tracing::warn!(
                destination = %destination,
                "Unable to upload: destination is not writable"
            );
            return ValidationResult::rejected(
                RejectionReason::DestinationNotWritable,
                RejectionReason::DestinationNotWritable.client_message(),
            );
        }

        let filename = stored_filename(
            policy.prefix(),
            &base_name,
            &self.tokens.next_token(),
            &extension,
        );
        let key = format!("{}/{}", destination, filename);

        match self.storage.move_into(&candidate.temp_path, &key).await {
            Ok(()) => ValidationResult::Accepted {
                final_relative_path: format!("/{}", key),
            },
            Err(e) => {
                tracing::error!(
                    source = %candidate.temp_path.display(),
                    key = %key,
                    error = %e,
                    "Failed to move upload into place"
                );
                ValidationResult::rejected(
                    RejectionReason::MoveFailed,
                    "File was not successfully uploaded, unknown error",
                )
            }
        }
    }
}

#[cfg(feature = "content-sniffing")]
fn attach_magic_byte_sniffer(validator: UploadValidator) -> UploadValidator {
    validator.with_sniffer(Arc::new(crate::upload::MagicByteSniffer))
}

#[cfg(not(feature = "content-sniffing"))]
fn attach_magic_byte_sniffer(validator: UploadValidator) -> UploadValidator {
    tracing::warn!("Content sniffing requested but the content-sniffing feature is not enabled");
    validator
}

fn log_outcome(candidate: &UploadCandidate, result: &ValidationResult) {
    match result {
        ValidationResult::Accepted {
            final_relative_path,
        } => tracing::info!(
            filename = %candidate.original_filename,
            mime = %candidate.declared_mime_type,
            path = %final_relative_path,
            "Upload accepted"
        ),
        ValidationResult::Rejected { reason, .. } => match reason.log_level() {
            LogLevel::Debug => tracing::debug!(
                filename = %candidate.original_filename,
                mime = %candidate.declared_mime_type,
                reason = %reason,
                "Upload rejected"
            ),
            LogLevel::Warn => tracing::warn!(
                filename = %candidate.original_filename,
                mime = %candidate.declared_mime_type,
                reason = %reason,
                "Upload rejected"
            ),
            LogLevel::Error => tracing::error!(
                filename = %candidate.original_filename,
                mime = %candidate.declared_mime_type,
                reason = %reason,
                "Upload rejected"
            ),
        },
    }
}
