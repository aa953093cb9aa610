//! Recruitment pipeline candidates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_negative, optional_text, required_text};
use crate::error::Result;

/// Recruitment stage
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Application received
    #[default]
    Applied,
    /// CV and documents under review
    Screening,
    /// Interview scheduled or held
    Interview,
    /// Practical welding test
    TradeTest,
    /// Offer extended
    Offer,
    /// Converted into a worker record
    Hired,
    /// Turned down; terminal
    Rejected,
}

impl PipelineStage {
    /// All stages in pipeline order
    pub const ALL: [PipelineStage; 7] = [
        Self::Applied,
        Self::Screening,
        Self::Interview,
        Self::TradeTest,
        Self::Offer,
        Self::Hired,
        Self::Rejected,
    ];

    /// Whether the candidate has left the pipeline
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }

    /// Snake-case name, matching the wire format
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Screening => "screening",
            Self::Interview => "interview",
            Self::TradeTest => "trade_test",
            Self::Offer => "offer",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }
}

/// A prospective worker in the recruitment pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique identifier
    pub id: Uuid,

    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Nationality, e.g. "UA" or "PL"
    pub nationality: Option<String>,
    /// Welding process or trade, e.g. "TIG 141"
    pub specialization: Option<String>,

    /// Current stage
    pub stage: PipelineStage,

    /// Expected hourly rate
    pub expected_rate: Option<f64>,

    /// Where the candidate came from (agency, referral, job board)
    pub source: Option<String>,

    /// Recruiter notes
    pub notes: Option<String>,

    /// Worker record created on hire
    pub worker_id: Option<Uuid>,

    /// When the stage last changed
    pub stage_changed_at: DateTime<Utc>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Display name, "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for adding a candidate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateInput {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Nationality, e.g. "UA" or "PL"
    pub nationality: Option<String>,
    /// Welding process or trade, e.g. "TIG 141"
    pub specialization: Option<String>,
    /// Expected hourly rate
    pub expected_rate: Option<f64>,
    /// Where the candidate came from
    pub source: Option<String>,
    /// Recruiter notes
    pub notes: Option<String>,
}

impl CandidateInput {
    /// Validate the input and build a candidate in the `applied` stage
    pub fn into_candidate(self) -> Result<Candidate> {
        let now = Utc::now();
        Ok(Candidate {
            id: Uuid::new_v4(),
            first_name: required_text("first_name", &self.first_name)?,
            last_name: required_text("last_name", &self.last_name)?,
            email: optional_text(self.email),
            phone: optional_text(self.phone),
            nationality: optional_text(self.nationality),
            specialization: optional_text(self.specialization),
            stage: PipelineStage::Applied,
            expected_rate: self
                .expected_rate
                .map(|rate| non_negative("expected_rate", rate))
                .transpose()?,
            source: optional_text(self.source),
            notes: optional_text(self.notes),
            worker_id: None,
            stage_changed_at: now,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a candidate's details; the stage moves separately
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateUpdate {
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Nationality, e.g. "UA" or "PL"
    pub nationality: Option<String>,
    /// Welding process or trade, e.g. "TIG 141"
    pub specialization: Option<String>,
    /// Expected hourly rate
    pub expected_rate: Option<f64>,
    /// Where the candidate came from
    pub source: Option<String>,
    /// Recruiter notes
    pub notes: Option<String>,
}

impl CandidateUpdate {
    /// Merge the update into an existing candidate
    pub fn apply(self, candidate: &mut Candidate) -> Result<()> {
        if let Some(first_name) = self.first_name {
            candidate.first_name = required_text("first_name", &first_name)?;
        }
        if let Some(last_name) = self.last_name {
            candidate.last_name = required_text("last_name", &last_name)?;
        }
        if self.email.is_some() {
            candidate.email = optional_text(self.email);
        }
        if self.phone.is_some() {
            candidate.phone = optional_text(self.phone);
        }
        if self.nationality.is_some() {
            candidate.nationality = optional_text(self.nationality);
        }
        if self.specialization.is_some() {
            candidate.specialization = optional_text(self.specialization);
        }
        if let Some(rate) = self.expected_rate {
            candidate.expected_rate = Some(non_negative("expected_rate", rate)?);
        }
        if self.source.is_some() {
            candidate.source = optional_text(self.source);
        }
        if self.notes.is_some() {
            candidate.notes = optional_text(self.notes);
        }

        candidate.updated_at = Utc::now();
        Ok(())
    }
}

/// Request to move a candidate to another stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageChange {
    /// Target stage
    pub stage: PipelineStage,
    /// Recruiter notes
    pub notes: Option<String>,
}

/// Options applied when hiring a candidate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HireRequest {
    /// Assign the new worker to this project
    pub project_id: Option<Uuid>,
    /// Override the agreed hourly rate
    pub hourly_rate: Option<f64>,
}

/// Result of a hire: the updated candidate and the new worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HireOutcome {
    /// Candidate, now hired
    pub candidate: Candidate,
    /// Worker created from the candidate
    pub worker: super::Worker,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_candidate_starts_applied() {
        let candidate = CandidateInput {
            first_name: "Oleksandr".to_string(),
            last_name: "Shevchenko".to_string(),
            expected_rate: Some(28.0),
            ..Default::default()
        }
        .into_candidate()
        .unwrap();
        assert_eq!(candidate.stage, PipelineStage::Applied);
        assert_eq!(candidate.worker_id, None);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(PipelineStage::Hired.is_terminal());
        assert!(PipelineStage::Rejected.is_terminal());
        assert!(!PipelineStage::Offer.is_terminal());
    }

    #[test]
    fn test_stage_names_match_wire_format() {
        for stage in PipelineStage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, serde_json::Value::String(stage.as_str().to_string()));
        }
    }
}
