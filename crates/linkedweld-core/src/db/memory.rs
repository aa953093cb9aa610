//! In-memory table emulation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::Store;
use crate::error::Result;
use crate::models::{
    Candidate, Document, DocumentFilter, Expense, ExpenseFilter, Notification, PipelineStage,
    Project, ProjectFilter, Worker, WorkerFilter,
};

#[derive(Default)]
struct Tables {
    workers: HashMap<Uuid, Worker>,
    documents: HashMap<Uuid, Document>,
    projects: HashMap<Uuid, Project>,
    expenses: HashMap<Uuid, Expense>,
    candidates: HashMap<Uuid, Candidate>,
    notifications: HashMap<Uuid, Notification>,
}

/// Ephemeral store; contents are lost when the process exits
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }
}

fn replace<T: Clone>(table: &mut HashMap<Uuid, T>, id: Uuid, record: &T) -> bool {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = record.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn list_workers(&self, filter: &WorkerFilter) -> Result<Vec<Worker>> {
        let tables = self.tables.read();
        let mut workers: Vec<Worker> = tables
            .workers
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        workers.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(workers)
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>> {
        Ok(self.tables.read().workers.get(&id).cloned())
    }

    async fn insert_worker(&self, worker: &Worker) -> Result<()> {
        self.tables.write().workers.insert(worker.id, worker.clone());
        debug!(worker_id = %worker.id, "Inserted worker");
        Ok(())
    }

    async fn update_worker(&self, worker: &Worker) -> Result<bool> {
        Ok(replace(&mut self.tables.write().workers, worker.id, worker))
    }

    async fn delete_worker(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.workers.remove(&id).is_none() {
            return Ok(false);
        }
        tables.documents.retain(|_, d| d.worker_id != id);
        for candidate in tables.candidates.values_mut() {
            if candidate.worker_id == Some(id) {
                candidate.worker_id = None;
            }
        }
        Ok(true)
    }

    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        today: NaiveDate,
    ) -> Result<Vec<Document>> {
        let cutoff = filter.expiry_cutoff(today)?;
        let tables = self.tables.read();
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| filter.matches(d, cutoff))
            .cloned()
            .collect();
        documents.sort_by_key(|d| (d.expires_on.is_none(), d.expires_on, d.created_at));
        Ok(documents)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.tables.read().documents.get(&id).cloned())
    }

    async fn insert_document(&self, document: &Document) -> Result<()> {
        self.tables
            .write()
            .documents
            .insert(document.id, document.clone());
        Ok(())
    }

    async fn update_document(&self, document: &Document) -> Result<bool> {
        Ok(replace(&mut self.tables.write().documents, document.id, document))
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().documents.remove(&id).is_some())
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let tables = self.tables.read();
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        Ok(self.tables.read().projects.get(&id).cloned())
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        self.tables
            .write()
            .projects
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<bool> {
        Ok(replace(&mut self.tables.write().projects, project.id, project))
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.projects.remove(&id).is_none() {
            return Ok(false);
        }
        tables.expenses.retain(|_, e| e.project_id != id);
        for worker in tables.workers.values_mut() {
            if worker.project_id == Some(id) {
                worker.project_id = None;
            }
        }
        Ok(true)
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let tables = self.tables.read();
        let mut expenses: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| {
            (b.incurred_on, b.created_at).cmp(&(a.incurred_on, a.created_at))
        });
        Ok(expenses)
    }

    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>> {
        Ok(self.tables.read().expenses.get(&id).cloned())
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        self.tables
            .write()
            .expenses
            .insert(expense.id, expense.clone());
        Ok(())
    }

    async fn update_expense(&self, expense: &Expense) -> Result<bool> {
        Ok(replace(&mut self.tables.write().expenses, expense.id, expense))
    }

    async fn delete_expense(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().expenses.remove(&id).is_some())
    }

    async fn project_spend(&self, project_id: Uuid) -> Result<f64> {
        Ok(self
            .tables
            .read()
            .expenses
            .values()
            .filter(|e| e.project_id == project_id)
            .map(|e| e.amount)
            .sum())
    }

    async fn list_candidates(&self, stage: Option<PipelineStage>) -> Result<Vec<Candidate>> {
        let tables = self.tables.read();
        let mut candidates: Vec<Candidate> = tables
            .candidates
            .values()
            .filter(|c| stage.map_or(true, |s| s == c.stage))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(candidates)
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(self.tables.read().candidates.get(&id).cloned())
    }

    async fn insert_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.tables
            .write()
            .candidates
            .insert(candidate.id, candidate.clone());
        Ok(())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<bool> {
        Ok(replace(
            &mut self.tables.write().candidates,
            candidate.id,
            candidate,
        ))
    }

    async fn record_hire(
        &self,
        candidate: &Candidate,
        worker: &Worker,
        expected: PipelineStage,
    ) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.candidates.get(&candidate.id) {
            Some(stored) if stored.stage == expected => {}
            _ => return Ok(false),
        }
        tables.workers.insert(worker.id, worker.clone());
        tables.candidates.insert(candidate.id, candidate.clone());
        Ok(true)
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().candidates.remove(&id).is_some())
    }

    async fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>> {
        let tables = self.tables.read();
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| !unread_only || !n.read)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.tables
            .write()
            .notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn insert_notification_if_absent(&self, notification: &Notification) -> Result<bool> {
        let mut tables = self.tables.write();
        if let Some(key) = notification.dedup_key.as_deref() {
            if tables
                .notifications
                .values()
                .any(|n| n.dedup_key.as_deref() == Some(key))
            {
                return Ok(false);
            }
        }
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(true)
    }

    async fn has_notification(&self, dedup_key: &str) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .notifications
            .values()
            .any(|n| n.dedup_key.as_deref() == Some(dedup_key)))
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.notifications.get_mut(&id) {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self) -> Result<u64> {
        let mut tables = self.tables.write();
        let mut changed = 0;
        for notification in tables.notifications.values_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().notifications.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DocumentInput, DocumentType, ExpenseCategory, ExpenseInput, NotificationKind,
        ProjectInput, Severity, WorkerInput,
    };

    fn worker(first: &str, last: &str) -> Worker {
        WorkerInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        }
        .into_worker()
        .unwrap()
    }

    fn project(budget: f64) -> Project {
        ProjectInput {
            name: "Boiler house".to_string(),
            budget,
            ..Default::default()
        }
        .into_project()
        .unwrap()
    }

    #[tokio::test]
    async fn test_workers_sorted_by_name() {
        let store = MemoryStore::new();
        store.insert_worker(&worker("Piotr", "Nowak")).await.unwrap();
        store.insert_worker(&worker("Anna", "Nowak")).await.unwrap();
        store.insert_worker(&worker("Ivan", "Bondar")).await.unwrap();

        let names: Vec<String> = store
            .list_workers(&WorkerFilter::default())
            .await
            .unwrap()
            .iter()
            .map(Worker::full_name)
            .collect();
        assert_eq!(names, ["Ivan Bondar", "Anna Nowak", "Piotr Nowak"]);
    }

    #[tokio::test]
    async fn test_delete_worker_removes_documents() {
        let store = MemoryStore::new();
        let w = worker("Jan", "Kowalski");
        store.insert_worker(&w).await.unwrap();

        let doc = DocumentInput {
            doc_type: DocumentType::Trc,
            number: None,
            issued_on: None,
            expires_on: None,
            notes: None,
        }
        .into_document(w.id)
        .unwrap();
        store.insert_document(&doc).await.unwrap();

        assert!(store.delete_worker(w.id).await.unwrap());
        assert!(store.get_document(doc.id).await.unwrap().is_none());
        assert!(!store.delete_worker(w.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let store = MemoryStore::new();
        let p = project(10_000.0);
        store.insert_project(&p).await.unwrap();

        let mut w = worker("Jan", "Kowalski");
        w.project_id = Some(p.id);
        store.insert_worker(&w).await.unwrap();

        for amount in [1_000.0, 2_500.0] {
            let expense = ExpenseInput {
                category: ExpenseCategory::Materials,
                amount,
                description: None,
                incurred_on: None,
            }
            .into_expense(p.id)
            .unwrap();
            store.insert_expense(&expense).await.unwrap();
        }
        assert_eq!(store.project_spend(p.id).await.unwrap(), 3_500.0);

        assert!(store.delete_project(p.id).await.unwrap());
        assert_eq!(store.project_spend(p.id).await.unwrap(), 0.0);
        assert_eq!(store.get_worker(w.id).await.unwrap().unwrap().project_id, None);
    }

    #[tokio::test]
    async fn test_notifications_read_state() {
        let store = MemoryStore::new();
        let first = Notification::new(NotificationKind::System, Severity::Info, "a", "a")
            .with_dedup_key("system:a");
        let second = Notification::new(NotificationKind::System, Severity::Info, "b", "b");
        store.insert_notification(&first).await.unwrap();
        store.insert_notification(&second).await.unwrap();

        assert!(store.has_notification("system:a").await.unwrap());
        assert!(!store.has_notification("system:b").await.unwrap());

        assert!(store.mark_notification_read(first.id).await.unwrap());
        assert_eq!(store.list_notifications(true).await.unwrap().len(), 1);
        assert_eq!(store.mark_all_notifications_read().await.unwrap(), 1);
        assert!(store.list_notifications(true).await.unwrap().is_empty());
        assert_eq!(store.list_notifications(false).await.unwrap().len(), 2);
    }
}
