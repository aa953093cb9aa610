//! Worker records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_negative, optional_text, required_text};
use crate::error::Result;

/// Employment status of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Currently employed and deployable
    #[default]
    Active,
    /// No longer employed
    Inactive,
    /// Employed but temporarily unavailable
    OnLeave,
}

/// A worker employed by the subcontractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
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

    /// Nationality (relevant for residence documents)
    pub nationality: Option<String>,

    /// Welding specialization, e.g. "TIG 141"
    pub specialization: Option<String>,

    /// Employment status
    pub status: WorkerStatus,

    /// Hourly rate
    pub hourly_rate: Option<f64>,

    /// Project the worker is currently assigned to
    pub project_id: Option<Uuid>,

    /// Date of hire
    pub hired_on: Option<NaiveDate>,

    /// Free-form notes
    pub notes: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    /// Display name, "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a worker
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerInput {
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
    /// Employment status, active when omitted
    pub status: Option<WorkerStatus>,
    /// Hourly rate
    pub hourly_rate: Option<f64>,
    /// Assigned project
    pub project_id: Option<Uuid>,
    /// Date of hire
    pub hired_on: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl WorkerInput {
    /// Validate the input and build a new worker record
    pub fn into_worker(self) -> Result<Worker> {
        let now = Utc::now();
        let hourly_rate = self
            .hourly_rate
            .map(|rate| non_negative("hourly_rate", rate))
            .transpose()?;

        Ok(Worker {
            id: Uuid::new_v4(),
            first_name: required_text("first_name", &self.first_name)?,
            last_name: required_text("last_name", &self.last_name)?,
            email: optional_text(self.email),
            phone: optional_text(self.phone),
            nationality: optional_text(self.nationality),
            specialization: optional_text(self.specialization),
            status: self.status.unwrap_or_default(),
            hourly_rate,
            project_id: self.project_id,
            hired_on: self.hired_on,
            notes: optional_text(self.notes),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a worker; absent fields are left unchanged and blank
/// strings clear optional text fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerUpdate {
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
    /// Employment status, active when omitted
    pub status: Option<WorkerStatus>,
    /// Hourly rate
    pub hourly_rate: Option<f64>,
    /// Assigned project
    pub project_id: Option<Uuid>,
    /// Unassign the worker from its project
    #[serde(default)]
    pub clear_project: bool,
    /// Date of hire
    pub hired_on: Option<NaiveDate>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl WorkerUpdate {
    /// Merge the update into an existing worker
    pub fn apply(self, worker: &mut Worker) -> Result<()> {
        if let Some(first_name) = self.first_name {
            worker.first_name = required_text("first_name", &first_name)?;
        }
        if let Some(last_name) = self.last_name {
            worker.last_name = required_text("last_name", &last_name)?;
        }
        if self.email.is_some() {
            worker.email = optional_text(self.email);
        }
        if self.phone.is_some() {
            worker.phone = optional_text(self.phone);
        }
        if self.nationality.is_some() {
            worker.nationality = optional_text(self.nationality);
        }
        if self.specialization.is_some() {
            worker.specialization = optional_text(self.specialization);
        }
        if let Some(status) = self.status {
            worker.status = status;
        }
        if let Some(rate) = self.hourly_rate {
            worker.hourly_rate = Some(non_negative("hourly_rate", rate)?);
        }
        if self.clear_project {
            worker.project_id = None;
        } else if self.project_id.is_some() {
            worker.project_id = self.project_id;
        }
        if self.hired_on.is_some() {
            worker.hired_on = self.hired_on;
        }
        if self.notes.is_some() {
            worker.notes = optional_text(self.notes);
        }

        worker.updated_at = Utc::now();
        Ok(())
    }
}

/// Filter for listing workers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerFilter {
    /// Only workers with this status
    pub status: Option<WorkerStatus>,
    /// Only workers assigned to this project
    pub project_id: Option<Uuid>,
    /// Case-insensitive substring of first or last name
    pub search: Option<String>,
}

impl WorkerFilter {
    /// Check whether a worker passes the filter
    pub fn matches(&self, worker: &Worker) -> bool {
        if self.status.is_some_and(|s| s != worker.status) {
            return false;
        }
        if self.project_id.is_some() && self.project_id != worker.project_id {
            return false;
        }
        self.matches_search(worker)
    }

    /// Case-insensitive substring match of `search` against either name
    pub fn matches_search(&self, worker: &Worker) -> bool {
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                worker.first_name.to_lowercase().contains(&term)
                    || worker.last_name.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> WorkerInput {
        WorkerInput {
            first_name: "  Jan ".to_string(),
            last_name: "Kowalski".to_string(),
            email: Some(" ".to_string()),
            specialization: Some("MAG 135".to_string()),
            hourly_rate: Some(32.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_into_worker_trims_and_defaults() {
        let worker = input().into_worker().unwrap();
        assert_eq!(worker.first_name, "Jan");
        assert_eq!(worker.email, None);
        assert_eq!(worker.status, WorkerStatus::Active);
        assert_eq!(worker.full_name(), "Jan Kowalski");
    }

    #[test]
    fn test_into_worker_rejects_blank_name() {
        let mut bad = input();
        bad.last_name = "   ".to_string();
        assert!(bad.into_worker().is_err());
    }

    #[test]
    fn test_into_worker_rejects_negative_rate() {
        let mut bad = input();
        bad.hourly_rate = Some(-1.0);
        assert!(bad.into_worker().is_err());
    }

    #[test]
    fn test_update_clears_project_and_keeps_other_fields() {
        let mut worker = input().into_worker().unwrap();
        worker.project_id = Some(Uuid::new_v4());

        WorkerUpdate {
            status: Some(WorkerStatus::OnLeave),
            clear_project: true,
            ..Default::default()
        }
        .apply(&mut worker)
        .unwrap();

        assert_eq!(worker.status, WorkerStatus::OnLeave);
        assert_eq!(worker.project_id, None);
        assert_eq!(worker.specialization.as_deref(), Some("MAG 135"));
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let worker = input().into_worker().unwrap();
        let filter = WorkerFilter {
            search: Some("kowal".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&worker));

        let filter = WorkerFilter {
            status: Some(WorkerStatus::Inactive),
            ..Default::default()
        };
        assert!(!filter.matches(&worker));
    }
}
