//! Uploadable Processing Library
//!
//! This crate decides whether uploaded files are accepted and moves accepted
//! files into place: [`UploadValidator`] checks a candidate against a policy,
//! names the stored file and asks the [`Storage`](uploadable_storage::Storage)
//! backend to move it.

pub mod batch;
pub mod naming;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use batch::{BatchOutcome, FieldOutcome};
pub use naming::{split_filename, stored_filename, TokenGenerator, UuidTokens};
#[cfg(feature = "content-sniffing")]
pub use upload::MagicByteSniffer;
pub use upload::{ContentSniffer, TrackedUploads, UploadDirProvenance, UploadProvenance};
pub use validator::UploadValidator;
