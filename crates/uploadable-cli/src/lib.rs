use std::process::ExitCode;
use uploadable_core::{RejectionReason, ValidationResult};

/// Exit status for a validation result: success when accepted, otherwise a
/// code per rejection reason so scripts can tell them apart.
pub fn exit_code_for(result: &ValidationResult) -> u8 {
    match result.reason() {
        None => 0,
        Some(RejectionReason::UnsupportedMimeType) => 2,
        Some(RejectionReason::InvalidExtension) => 3,
        Some(RejectionReason::ContentMismatch) => 4,
        Some(RejectionReason::DestinationNotWritable) => 5,
        Some(RejectionReason::MoveFailed) => 6,
    }
}

pub fn exit_status(result: &ValidationResult) -> ExitCode {
    ExitCode::from(exit_code_for(result))
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn accepted_exits_zero() {
        let result = ValidationResult::Accepted {
            final_relative_path: "/media/a_tok.png".to_string(),
        };
        assert_eq!(exit_code_for(&result), 0);
    }

    #[test]
    fn each_rejection_has_its_own_code() {
        let reasons = [
            RejectionReason::UnsupportedMimeType,
            RejectionReason::InvalidExtension,
            RejectionReason::ContentMismatch,
            RejectionReason::DestinationNotWritable,
            RejectionReason::MoveFailed,
        ];
        let codes: HashSet<u8> = reasons
            .into_iter()
            .map(|reason| exit_code_for(&ValidationResult::rejected(reason, "x")))
            .collect();
        assert!(!codes.contains(&0));
        assert_eq!(codes.len(), reasons.len());
    }
}
