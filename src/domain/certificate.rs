//! Certificate record entity.

use crate::domain::ReferenceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of certificate issued. Only attendance certificates exist today;
/// the enum leaves room for other kinds without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateType {
    Attended,
}

impl CertificateType {
    /// Get the canonical string form stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::Attended => "Attended",
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Attended" => Ok(CertificateType::Attended),
            other => Err(format!("unknown certificate type '{}'", other)),
        }
    }
}

/// A participation certificate record, the sole persisted entity.
///
/// Created only through generation; mutated only by the download path
/// (marking downloaded, incrementing the counter); never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Human-shareable unique code, immutable once assigned
    pub reference_id: ReferenceId,
    /// Recipient name, trimmed
    pub name: String,
    /// Recipient email, trimmed and lower-cased; soft-unique natural key
    pub email: String,
    pub certificate_type: CertificateType,
    /// Creation instant, set once at insertion
    pub issued_at: chrono::DateTime<chrono::Utc>,
    pub downloaded: bool,
    pub download_count: i64,
}

impl CertificateRecord {
    /// Construct a fresh record for insertion. Inputs are expected to be
    /// normalized already (trimmed name, trimmed lower-cased email).
    pub fn new(reference_id: ReferenceId, name: String, email: String) -> Self {
        Self {
            reference_id,
            name,
            email,
            certificate_type: CertificateType::Attended,
            issued_at: chrono::Utc::now(),
            downloaded: false,
            download_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let id = ReferenceId::parse("CSAC2026-A1B2C").unwrap();
        let record =
            CertificateRecord::new(id.clone(), "Ada Lovelace".to_string(), "ada@example.com".to_string());

        assert_eq!(record.reference_id, id);
        assert_eq!(record.certificate_type, CertificateType::Attended);
        assert!(!record.downloaded);
        assert_eq!(record.download_count, 0);
    }

    #[test]
    fn test_certificate_type_round_trip() {
        assert_eq!(CertificateType::Attended.as_str(), "Attended");
        assert_eq!("Attended".parse::<CertificateType>().unwrap(), CertificateType::Attended);
        assert!("Completed".parse::<CertificateType>().is_err());
    }

    #[test]
    fn test_certificate_type_serializes_as_string() {
        let json = serde_json::to_string(&CertificateType::Attended).unwrap();
        assert_eq!(json, "\"Attended\"");
    }
}
