//! Database layer for LinkedWeld
//!
//! Every backend implements [`Store`]: an ephemeral in-memory table set, or a
//! SQLite database accessed through prepared statements.

mod memory;
mod seed;
mod sqlite;

pub use memory::MemoryStore;
pub use seed::seed_demo_data;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::error::{Error, Result};
use crate::models::{
    Candidate, Document, DocumentFilter, Expense, ExpenseFilter, Notification, PipelineStage,
    Project, ProjectFilter, Worker, WorkerFilter,
};

/// Row store holding every LinkedWeld table
#[async_trait]
pub trait Store: Send + Sync {
    /// Check the store is reachable
    async fn health_check(&self) -> Result<()>;

    // --- Workers ---

    /// List workers matching the filter, ordered by last then first name
    async fn list_workers(&self, filter: &WorkerFilter) -> Result<Vec<Worker>>;

    /// Get a worker by ID
    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>>;

    /// Insert a new worker
    async fn insert_worker(&self, worker: &Worker) -> Result<()>;

    /// Replace a stored worker; false when it does not exist
    async fn update_worker(&self, worker: &Worker) -> Result<bool>;

    /// Delete a worker together with their documents
    async fn delete_worker(&self, id: Uuid) -> Result<bool>;

    // --- Documents ---

    /// List documents matching the filter, soonest expiry first
    async fn list_documents(&self, filter: &DocumentFilter, today: NaiveDate)
        -> Result<Vec<Document>>;

    /// Get a document by ID
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    /// Insert a new document
    async fn insert_document(&self, document: &Document) -> Result<()>;

    /// Replace a stored document
    async fn update_document(&self, document: &Document) -> Result<bool>;

    /// Delete a document
    async fn delete_document(&self, id: Uuid) -> Result<bool>;

    // --- Projects ---

    /// List projects matching the filter, newest first
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>>;

    /// Get a project by ID
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// Insert a new project
    async fn insert_project(&self, project: &Project) -> Result<()>;

    /// Replace a stored project
    async fn update_project(&self, project: &Project) -> Result<bool>;

    /// Delete a project and its expenses, unassigning its workers
    async fn delete_project(&self, id: Uuid) -> Result<bool>;

    // --- Expenses ---

    /// List expenses matching the filter, most recent first
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>>;

    /// Get an expense by ID
    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>>;

    /// Insert a new expense
    async fn insert_expense(&self, expense: &Expense) -> Result<()>;

    /// Replace a stored expense
    async fn update_expense(&self, expense: &Expense) -> Result<bool>;

    /// Delete an expense
    async fn delete_expense(&self, id: Uuid) -> Result<bool>;

    /// Total spent on a project
    async fn project_spend(&self, project_id: Uuid) -> Result<f64>;

    // --- Recruitment pipeline ---

    /// List candidates, optionally in one stage, newest first
    async fn list_candidates(&self, stage: Option<PipelineStage>) -> Result<Vec<Candidate>>;

    /// Get a candidate by ID
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;

    /// Insert a new candidate
    async fn insert_candidate(&self, candidate: &Candidate) -> Result<()>;

    /// Replace a stored candidate
    async fn update_candidate(&self, candidate: &Candidate) -> Result<bool>;

    /// Insert the hired `worker` and store `candidate`, as one write, but only
    /// while the stored candidate is still at `expected`. Returns whether it was applied.
    async fn record_hire(
        &self,
        candidate: &Candidate,
        worker: &Worker,
        expected: PipelineStage,
    ) -> Result<bool>;

    /// Delete a candidate
    async fn delete_candidate(&self, id: Uuid) -> Result<bool>;

    // --- Notifications ---

    /// List notifications, newest first
    async fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>>;

    /// Insert a new notification
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Insert a notification unless one with the same dedup key exists.
    /// Check and insert are a single atomic write; returns whether it was stored.
    async fn insert_notification_if_absent(&self, notification: &Notification) -> Result<bool>;

    /// Whether a notification with this dedup key exists
    async fn has_notification(&self, dedup_key: &str) -> Result<bool>;

    /// Mark one notification read
    async fn mark_notification_read(&self, id: Uuid) -> Result<bool>;

    /// Mark every unread notification read, returning how many changed
    async fn mark_all_notifications_read(&self) -> Result<u64>;

    /// Delete a notification
    async fn delete_notification(&self, id: Uuid) -> Result<bool>;

    // --- Lookups that must succeed ---

    /// Get a worker or fail with `NotFound`
    async fn require_worker(&self, id: Uuid) -> Result<Worker> {
        self.get_worker(id)
            .await?
            .ok_or_else(|| Error::not_found("Worker", id))
    }

    /// Get a document or fail with `NotFound`
    async fn require_document(&self, id: Uuid) -> Result<Document> {
        self.get_document(id)
            .await?
            .ok_or_else(|| Error::not_found("Document", id))
    }

    /// Get a project or fail with `NotFound`
    async fn require_project(&self, id: Uuid) -> Result<Project> {
        self.get_project(id)
            .await?
            .ok_or_else(|| Error::not_found("Project", id))
    }

    /// Get an expense or fail with `NotFound`
    async fn require_expense(&self, id: Uuid) -> Result<Expense> {
        self.get_expense(id)
            .await?
            .ok_or_else(|| Error::not_found("Expense", id))
    }

    /// Get a candidate or fail with `NotFound`
    async fn require_candidate(&self, id: Uuid) -> Result<Candidate> {
        self.get_candidate(id)
            .await?
            .ok_or_else(|| Error::not_found("Candidate", id))
    }
}

/// Open the configured store, run migrations and seed demo data if asked
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Sqlite => {
            let sqlite = SqliteStore::connect(config).await?;
            sqlite.migrate().await?;
            info!(url = %config.url, "Using SQLite store");
            Arc::new(sqlite)
        }
    };

    if config.seed_demo_data {
        seed_demo_data(store.as_ref()).await?;
    }

    Ok(store)
}

/// Delete every row through the store's own cascades, returning rows removed
pub async fn clear_store(store: &dyn Store) -> Result<usize> {
    let mut removed = 0;

    for candidate in store.list_candidates(None).await? {
        removed += usize::from(store.delete_candidate(candidate.id).await?);
    }
    for worker in store.list_workers(&WorkerFilter::default()).await? {
        removed += usize::from(store.delete_worker(worker.id).await?);
    }
    for project in store.list_projects(&ProjectFilter::default()).await? {
        removed += usize::from(store.delete_project(project.id).await?);
    }
    for notification in store.list_notifications(false).await? {
        removed += usize::from(store.delete_notification(notification.id).await?);
    }

    info!(removed, "Store cleared");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clear_store_removes_everything() {
        let store = MemoryStore::new();
        seed_demo_data(&store).await.unwrap();

        let removed = clear_store(&store).await.unwrap();
        assert!(removed >= 15);
        assert!(store.list_workers(&WorkerFilter::default()).await.unwrap().is_empty());
        assert!(store
            .list_expenses(&ExpenseFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .list_documents(&DocumentFilter::default(), chrono::Utc::now().date_naive())
            .await
            .unwrap()
            .is_empty());

        // A cleared store accepts the seed again
        assert!(seed_demo_data(&store).await.unwrap());
    }
}
