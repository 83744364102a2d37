//! Business logic services, separated from HTTP concerns.

mod certificate;
mod reference;

pub use certificate::{CertificateService, CertificateStats, GenerateOutcome, RECENT_LIMIT};
pub use reference::ReferenceIdGenerator;
