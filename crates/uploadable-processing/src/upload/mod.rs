//! Host-side collaborators: upload provenance and content sniffing.

pub mod provenance;
#[cfg(feature = "content-sniffing")]
pub mod sniff;
pub mod traits;

pub use provenance::{TrackedUploads, UploadDirProvenance};
#[cfg(feature = "content-sniffing")]
pub use sniff::MagicByteSniffer;
pub use traits::{ContentSniffer, UploadProvenance};
