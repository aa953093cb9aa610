//! Worker documents and certificates

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::optional_text;
use crate::error::{Error, Result};

/// Kind of worker document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Temporary Residence Card
    Trc,
    /// Passport
    Passport,
    /// Visa
    Visa,
    /// Work permit
    WorkPermit,
    /// Welder qualification certificate (e.g. ISO 9606)
    WeldingCertificate,
    /// Occupational medical examination
    Medical,
    /// Health and safety training
    SafetyTraining,
    /// Anything else
    Other,
}

impl DocumentType {
    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Trc => "TRC",
            Self::Passport => "Passport",
            Self::Visa => "Visa",
            Self::WorkPermit => "Work permit",
            Self::WeldingCertificate => "Welding certificate",
            Self::Medical => "Medical examination",
            Self::SafetyTraining => "Safety training",
            Self::Other => "Document",
        }
    }
}

/// A dated document held by a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: Uuid,

    /// Owning worker
    pub worker_id: Uuid,

    /// Document kind
    pub doc_type: DocumentType,

    /// Document or certificate number
    pub number: Option<String>,

    /// Issue date
    pub issued_on: Option<NaiveDate>,

    /// Expiry date; undated documents never alert
    pub expires_on: Option<NaiveDate>,

    /// Free-form notes
    pub notes: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Days from `today` until expiry; negative once expired
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expires_on.map(|d| (d - today).num_days())
    }

    fn check_dates(&self) -> Result<()> {
        if let (Some(issued), Some(expires)) = (self.issued_on, self.expires_on) {
            if expires < issued {
                return Err(Error::validation(
                    "expires_on must not be earlier than issued_on",
                ));
            }
        }
        Ok(())
    }
}

/// Input for adding a document to a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Kind of document
    pub doc_type: DocumentType,
    /// Document number
    pub number: Option<String>,
    /// Issue date
    pub issued_on: Option<NaiveDate>,
    /// Expiry date, if the document expires
    pub expires_on: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl DocumentInput {
    /// Validate the input and build a document for `worker_id`
    pub fn into_document(self, worker_id: Uuid) -> Result<Document> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            worker_id,
            doc_type: self.doc_type,
            number: optional_text(self.number),
            issued_on: self.issued_on,
            expires_on: self.expires_on,
            notes: optional_text(self.notes),
            created_at: now,
            updated_at: now,
        };
        document.check_dates()?;
        Ok(document)
    }
}

/// Partial update for a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// Kind of document
    pub doc_type: Option<DocumentType>,
    /// Document number
    pub number: Option<String>,
    /// Issue date
    pub issued_on: Option<NaiveDate>,
    /// Expiry date, if the document expires
    pub expires_on: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl DocumentUpdate {
    /// Merge the update into an existing document
    pub fn apply(self, document: &mut Document) -> Result<()> {
        if let Some(doc_type) = self.doc_type {
            document.doc_type = doc_type;
        }
        if self.number.is_some() {
            document.number = optional_text(self.number);
        }
        if self.issued_on.is_some() {
            document.issued_on = self.issued_on;
        }
        if self.expires_on.is_some() {
            document.expires_on = self.expires_on;
        }
        if self.notes.is_some() {
            document.notes = optional_text(self.notes);
        }
        document.check_dates()?;

        document.updated_at = Utc::now();
        Ok(())
    }
}

/// Filter for listing documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Only documents of this worker
    pub worker_id: Option<Uuid>,
    /// Only documents of this type
    pub doc_type: Option<DocumentType>,
    /// Only documents expiring within this many days (expired included)
    pub expiring_within_days: Option<i64>,
}

impl DocumentFilter {
    /// Latest expiry date matched by `expiring_within_days`
    pub fn expiry_cutoff(&self, today: NaiveDate) -> Result<Option<NaiveDate>> {
        let Some(days) = self.expiring_within_days else {
            return Ok(None);
        };
        if days < 0 {
            return Err(Error::validation(
                "expiring_within_days must be zero or greater",
            ));
        }
        Duration::try_days(days)
            .and_then(|window| today.checked_add_signed(window))
            .map(Some)
            .ok_or_else(|| Error::validation("expiring_within_days is out of range"))
    }

    /// Check whether a document passes the filter, given the resolved expiry cutoff
    pub fn matches(&self, document: &Document, cutoff: Option<NaiveDate>) -> bool {
        if self.worker_id.is_some_and(|id| id != document.worker_id) {
            return false;
        }
        if self.doc_type.is_some_and(|t| t != document.doc_type) {
            return false;
        }
        match cutoff {
            Some(cutoff) => document.expires_on.is_some_and(|d| d <= cutoff),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trc(expires_on: Option<NaiveDate>) -> Document {
        DocumentInput {
            doc_type: DocumentType::Trc,
            number: Some("RP1234567".to_string()),
            issued_on: Some(date(2024, 1, 10)),
            expires_on,
            notes: None,
        }
        .into_document(Uuid::new_v4())
        .unwrap()
    }

    #[test]
    fn test_rejects_expiry_before_issue() {
        let result = DocumentInput {
            doc_type: DocumentType::Visa,
            number: None,
            issued_on: Some(date(2025, 5, 1)),
            expires_on: Some(date(2025, 4, 1)),
            notes: None,
        }
        .into_document(Uuid::new_v4());
        assert!(result.is_err());
    }

    #[test]
    fn test_days_until_expiry() {
        let doc = trc(Some(date(2025, 3, 31)));
        assert_eq!(doc.days_until_expiry(date(2025, 3, 1)), Some(30));
        assert_eq!(doc.days_until_expiry(date(2025, 4, 2)), Some(-2));
        assert_eq!(trc(None).days_until_expiry(date(2025, 3, 1)), None);
    }

    #[test]
    fn test_expiring_filter_includes_expired_and_skips_undated() {
        let today = date(2025, 3, 1);
        let filter = DocumentFilter {
            expiring_within_days: Some(30),
            ..Default::default()
        };
        let cutoff = filter.expiry_cutoff(today).unwrap();
        assert_eq!(cutoff, Some(date(2025, 3, 31)));
        assert!(filter.matches(&trc(Some(date(2025, 2, 1))), cutoff));
        assert!(filter.matches(&trc(Some(date(2025, 3, 31))), cutoff));
        assert!(!filter.matches(&trc(Some(date(2025, 4, 1))), cutoff));
        assert!(!filter.matches(&trc(None), cutoff));
    }

    #[test]
    fn test_expiry_cutoff_rejects_negative_and_overflowing_windows() {
        let today = date(2025, 3, 1);
        for days in [-1, 1_000_000_000, i64::MAX] {
            let filter = DocumentFilter {
                expiring_within_days: Some(days),
                ..Default::default()
            };
            assert!(
                matches!(filter.expiry_cutoff(today), Err(Error::Validation(_))),
                "{days} should be rejected"
            );
        }
        assert_eq!(DocumentFilter::default().expiry_cutoff(today).unwrap(), None);
    }

    #[test]
    fn test_update_revalidates_dates() {
        let mut doc = trc(Some(date(2026, 1, 10)));
        let result = DocumentUpdate {
            expires_on: Some(date(2023, 1, 1)),
            ..Default::default()
        }
        .apply(&mut doc);
        assert!(result.is_err());
    }
}
