//! Projects and budgets

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{non_negative, optional_text, required_text};
use crate::error::{Error, Result};

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Contracted but not started
    #[default]
    Planned,
    /// Work in progress
    Active,
    /// Paused
    OnHold,
    /// Finished
    Completed,
}

/// A contracted welding project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Client company
    pub client: Option<String>,

    /// Site location
    pub location: Option<String>,

    /// Lifecycle status
    pub status: ProjectStatus,

    /// Approved budget
    pub budget: f64,

    /// Planned start
    pub start_date: Option<NaiveDate>,

    /// Planned end
    pub end_date: Option<NaiveDate>,

    /// Scope description
    pub description: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    fn check_dates(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::validation(
                    "end_date must not be earlier than start_date",
                ));
            }
        }
        Ok(())
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInput {
    /// Project name
    pub name: String,
    /// Client the work is contracted for
    pub client: Option<String>,
    /// Site location
    pub location: Option<String>,
    /// Lifecycle status, planned when omitted
    pub status: Option<ProjectStatus>,
    /// Budget in the project currency
    #[serde(default)]
    pub budget: f64,
    /// Planned start
    pub start_date: Option<NaiveDate>,
    /// Planned end
    pub end_date: Option<NaiveDate>,
    /// Description
    pub description: Option<String>,
}

impl ProjectInput {
    /// Validate the input and build a new project record
    pub fn into_project(self) -> Result<Project> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: required_text("name", &self.name)?,
            client: optional_text(self.client),
            location: optional_text(self.location),
            status: self.status.unwrap_or_default(),
            budget: non_negative("budget", self.budget)?,
            start_date: self.start_date,
            end_date: self.end_date,
            description: optional_text(self.description),
            created_at: now,
            updated_at: now,
        };
        project.check_dates()?;
        Ok(project)
    }
}

/// Partial update for a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// Project name
    pub name: Option<String>,
    /// Client the work is contracted for
    pub client: Option<String>,
    /// Site location
    pub location: Option<String>,
    /// Lifecycle status, planned when omitted
    pub status: Option<ProjectStatus>,
    /// Budget in the project currency
    pub budget: Option<f64>,
    /// Planned start
    pub start_date: Option<NaiveDate>,
    /// Planned end
    pub end_date: Option<NaiveDate>,
    /// Description
    pub description: Option<String>,
}

impl ProjectUpdate {
    /// Merge the update into an existing project
    pub fn apply(self, project: &mut Project) -> Result<()> {
        if let Some(name) = self.name {
            project.name = required_text("name", &name)?;
        }
        if self.client.is_some() {
            project.client = optional_text(self.client);
        }
        if self.location.is_some() {
            project.location = optional_text(self.location);
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(budget) = self.budget {
            project.budget = non_negative("budget", budget)?;
        }
        if self.start_date.is_some() {
            project.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            project.end_date = self.end_date;
        }
        if self.description.is_some() {
            project.description = optional_text(self.description);
        }
        project.check_dates()?;

        project.updated_at = Utc::now();
        Ok(())
    }
}

/// Filter for listing projects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFilter {
    /// Only projects with this status
    pub status: Option<ProjectStatus>,
}

impl ProjectFilter {
    /// Check whether a project passes the filter
    pub fn matches(&self, project: &Project) -> bool {
        self.status.map_or(true, |s| s == project.status)
    }
}

/// Budget utilisation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    /// Within budget
    Ok,
    /// Past the warning ratio
    Warning,
    /// Past the critical ratio
    Critical,
}

/// Spend against budget for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// Project the summary is for
    pub project_id: Uuid,
    /// Budget in the project currency
    pub budget: f64,
    /// Sum of the project's expenses
    pub spent: f64,
    /// Budget minus spend, negative when over
    pub remaining: f64,
    /// `spent / budget`, zero when the budget is zero
    pub ratio: f64,
    /// Level derived from the ratio
    pub level: BudgetLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_project_validates() {
        let project = ProjectInput {
            name: "Refinery pipe rack".to_string(),
            budget: 120_000.0,
            ..Default::default()
        }
        .into_project()
        .unwrap();
        assert_eq!(project.status, ProjectStatus::Planned);

        let negative = ProjectInput {
            name: "Tank".to_string(),
            budget: -5.0,
            ..Default::default()
        };
        assert!(negative.into_project().is_err());

        let blank = ProjectInput::default();
        assert!(blank.into_project().is_err());
    }

    #[test]
    fn test_update_rejects_inverted_dates() {
        let mut project = ProjectInput {
            name: "Bridge".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..Default::default()
        }
        .into_project()
        .unwrap();

        let result = ProjectUpdate {
            end_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            ..Default::default()
        }
        .apply(&mut project);
        assert!(result.is_err());
    }
}
