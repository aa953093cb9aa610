//! Project expenses

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::optional_text;
use crate::error::{Error, Result};

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Steel, pipe and other materials
    Materials,
    /// Wages
    Labor,
    /// Equipment hire or purchase
    Equipment,
    /// Travel
    Travel,
    /// Worker accommodation
    Accommodation,
    /// Filler metal, gas, discs
    Consumables,
    /// Anything else
    Other,
}

/// A cost booked against a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier
    pub id: Uuid,

    /// Project the cost belongs to
    pub project_id: Uuid,

    /// Category
    pub category: ExpenseCategory,

    /// Amount, always positive
    pub amount: f64,

    /// What was bought
    pub description: Option<String>,

    /// Date the cost was incurred
    pub incurred_on: NaiveDate,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

fn positive_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::validation("amount must be greater than zero"));
    }
    Ok(amount)
}

/// Input for booking an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// Expense category
    pub category: ExpenseCategory,
    /// Amount, greater than zero
    pub amount: f64,
    /// Description
    pub description: Option<String>,
    /// Date the cost was incurred, today when omitted
    pub incurred_on: Option<NaiveDate>,
}

impl ExpenseInput {
    /// Validate the input and build an expense for `project_id`
    pub fn into_expense(self, project_id: Uuid) -> Result<Expense> {
        let now = Utc::now();
        Ok(Expense {
            id: Uuid::new_v4(),
            project_id,
            category: self.category,
            amount: positive_amount(self.amount)?,
            description: optional_text(self.description),
            incurred_on: self.incurred_on.unwrap_or_else(|| now.date_naive()),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for an expense
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    /// Expense category
    pub category: Option<ExpenseCategory>,
    /// Amount, greater than zero
    pub amount: Option<f64>,
    /// Description
    pub description: Option<String>,
    /// Date the cost was incurred, today when omitted
    pub incurred_on: Option<NaiveDate>,
}

impl ExpenseUpdate {
    /// Merge the update into an existing expense
    pub fn apply(self, expense: &mut Expense) -> Result<()> {
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(amount) = self.amount {
            expense.amount = positive_amount(amount)?;
        }
        if self.description.is_some() {
            expense.description = optional_text(self.description);
        }
        if let Some(incurred_on) = self.incurred_on {
            expense.incurred_on = incurred_on;
        }

        expense.updated_at = Utc::now();
        Ok(())
    }
}

/// Filter for listing expenses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseFilter {
    /// Only expenses of this project
    pub project_id: Option<Uuid>,
    /// Only expenses in this category
    pub category: Option<ExpenseCategory>,
}

impl ExpenseFilter {
    /// Check whether an expense passes the filter
    pub fn matches(&self, expense: &Expense) -> bool {
        self.project_id.map_or(true, |id| id == expense.project_id)
            && self.category.map_or(true, |c| c == expense.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_must_be_positive() {
        for amount in [0.0, -10.0, f64::NAN] {
            let input = ExpenseInput {
                category: ExpenseCategory::Materials,
                amount,
                description: None,
                incurred_on: None,
            };
            assert!(input.into_expense(Uuid::new_v4()).is_err());
        }
    }

    #[test]
    fn test_incurred_on_defaults_to_today() {
        let expense = ExpenseInput {
            category: ExpenseCategory::Consumables,
            amount: 420.0,
            description: Some("ER70S-6 wire".to_string()),
            incurred_on: None,
        }
        .into_expense(Uuid::new_v4())
        .unwrap();
        assert_eq!(expense.incurred_on, Utc::now().date_naive());
    }
}
