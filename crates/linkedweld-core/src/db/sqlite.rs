//! SQLite connection and queries

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use super::Store;
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::{
    Candidate, Document, DocumentFilter, Expense, ExpenseFilter, Notification, PipelineStage,
    Project, ProjectFilter, Worker, WorkerFilter,
};

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a connection pool, creating the database file if missing
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` gets its own database
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Enums are stored as their serde names so the columns read like the API.

fn enum_to_text<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(text) => Ok(text),
        other => Err(Error::internal(format!("expected a unit variant, got {other}"))),
    }
}

fn enum_from_text<T: DeserializeOwned>(text: String) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::String(text))?)
}

fn parse_id(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::internal(format!("invalid id '{text}': {e}")))
}

fn parse_opt_id(text: Option<String>) -> Result<Option<Uuid>> {
    text.as_deref().map(parse_id).transpose()
}

fn insert_worker_query(worker: &Worker) -> Result<Query<'_, Sqlite, SqliteArguments<'_>>> {
    Ok(sqlx::query(
        r#"
        INSERT INTO workers (
            id, first_name, last_name, email, phone, nationality, specialization,
            status, hourly_rate, project_id, hired_on, notes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(worker.id.to_string())
    .bind(&worker.first_name)
    .bind(&worker.last_name)
    .bind(&worker.email)
    .bind(&worker.phone)
    .bind(&worker.nationality)
    .bind(&worker.specialization)
    .bind(enum_to_text(&worker.status)?)
    .bind(worker.hourly_rate)
    .bind(worker.project_id.map(|id| id.to_string()))
    .bind(worker.hired_on)
    .bind(&worker.notes)
    .bind(worker.created_at)
    .bind(worker.updated_at))
}

#[async_trait]
impl Store for SqliteStore {
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // --- Workers ---

    async fn list_workers(&self, filter: &WorkerFilter) -> Result<Vec<Worker>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM workers WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(enum_to_text(&status)?);
        }
        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id.to_string());
        }
        query.push(" ORDER BY last_name, first_name");

        let rows = query
            .build_query_as::<WorkerRow>()
            .fetch_all(&self.pool)
            .await?;

        // LIKE only folds ASCII, so name search runs on the decoded rows
        let mut workers = Vec::with_capacity(rows.len());
        for row in rows {
            let worker = Worker::try_from(row)?;
            if filter.matches_search(&worker) {
                workers.push(worker);
            }
        }
        Ok(workers)
    }

    async fn get_worker(&self, id: Uuid) -> Result<Option<Worker>> {
        let row = sqlx::query_as::<_, WorkerRow>("SELECT * FROM workers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Worker::try_from).transpose()
    }

    async fn insert_worker(&self, worker: &Worker) -> Result<()> {
        insert_worker_query(worker)?.execute(&self.pool).await?;

        debug!(worker_id = %worker.id, "Inserted worker");
        Ok(())
    }

    async fn update_worker(&self, worker: &Worker) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE workers SET
                first_name = ?, last_name = ?, email = ?, phone = ?, nationality = ?,
                specialization = ?, status = ?, hourly_rate = ?, project_id = ?,
                hired_on = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&worker.first_name)
        .bind(&worker.last_name)
        .bind(&worker.email)
        .bind(&worker.phone)
        .bind(&worker.nationality)
        .bind(&worker.specialization)
        .bind(enum_to_text(&worker.status)?)
        .bind(worker.hourly_rate)
        .bind(worker.project_id.map(|id| id.to_string()))
        .bind(worker.hired_on)
        .bind(&worker.notes)
        .bind(worker.updated_at)
        .bind(worker.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_worker(&self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM documents WHERE worker_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE candidates SET worker_id = NULL WHERE worker_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Documents ---

    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        today: NaiveDate,
    ) -> Result<Vec<Document>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM documents WHERE 1 = 1");

        if let Some(worker_id) = filter.worker_id {
            query.push(" AND worker_id = ").push_bind(worker_id.to_string());
        }
        if let Some(doc_type) = filter.doc_type {
            query.push(" AND doc_type = ").push_bind(enum_to_text(&doc_type)?);
        }
        if let Some(cutoff) = filter.expiry_cutoff(today)? {
            query
                .push(" AND expires_on IS NOT NULL AND expires_on <= ")
                .push_bind(cutoff);
        }
        query.push(" ORDER BY expires_on IS NULL, expires_on, created_at");

        let rows = query
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    async fn insert_document(&self, document: &Document) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, worker_id, doc_type, number, issued_on, expires_on, notes,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document.id.to_string())
        .bind(document.worker_id.to_string())
        .bind(enum_to_text(&document.doc_type)?)
        .bind(&document.number)
        .bind(document.issued_on)
        .bind(document.expires_on)
        .bind(&document.notes)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_document(&self, document: &Document) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET
                doc_type = ?, number = ?, issued_on = ?, expires_on = ?, notes = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(enum_to_text(&document.doc_type)?)
        .bind(&document.number)
        .bind(document.issued_on)
        .bind(document.expires_on)
        .bind(&document.notes)
        .bind(document.updated_at)
        .bind(document.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // --- Projects ---

    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM projects WHERE 1 = 1");

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(enum_to_text(&status)?);
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<ProjectRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Project::try_from).transpose()
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, name, client, location, status, budget, start_date, end_date,
                description, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.client)
        .bind(&project.location)
        .bind(enum_to_text(&project.status)?)
        .bind(project.budget)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.description)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                name = ?, client = ?, location = ?, status = ?, budget = ?,
                start_date = ?, end_date = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.client)
        .bind(&project.location)
        .bind(enum_to_text(&project.status)?)
        .bind(project.budget)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.description)
        .bind(project.updated_at)
        .bind(project.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM expenses WHERE project_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE workers SET project_id = NULL WHERE project_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Expenses ---

    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM expenses WHERE 1 = 1");

        if let Some(project_id) = filter.project_id {
            query.push(" AND project_id = ").push_bind(project_id.to_string());
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(enum_to_text(&category)?);
        }
        query.push(" ORDER BY incurred_on DESC, created_at DESC");

        let rows = query
            .build_query_as::<ExpenseRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Expense::try_from).collect()
    }

    async fn get_expense(&self, id: Uuid) -> Result<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>("SELECT * FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Expense::try_from).transpose()
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, project_id, category, amount, description, incurred_on,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.project_id.to_string())
        .bind(enum_to_text(&expense.category)?)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.incurred_on)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_expense(&self, expense: &Expense) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category = ?, amount = ?, description = ?, incurred_on = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(enum_to_text(&expense.category)?)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.incurred_on)
        .bind(expense.updated_at)
        .bind(expense.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expense(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn project_spend(&self, project_id: Uuid) -> Result<f64> {
        let spent: f64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) FROM expenses WHERE project_id = ?",
        )
        .bind(project_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(spent)
    }

    // --- Recruitment pipeline ---

    async fn list_candidates(&self, stage: Option<PipelineStage>) -> Result<Vec<Candidate>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM candidates WHERE 1 = 1");

        if let Some(stage) = stage {
            query.push(" AND stage = ").push_bind(stage.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<CandidateRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let row = sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Candidate::try_from).transpose()
    }

    async fn insert_candidate(&self, candidate: &Candidate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO candidates (
                id, first_name, last_name, email, phone, nationality, specialization,
                stage, expected_rate, source, notes, worker_id, stage_changed_at,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(candidate.id.to_string())
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.nationality)
        .bind(&candidate.specialization)
        .bind(candidate.stage.as_str())
        .bind(candidate.expected_rate)
        .bind(&candidate.source)
        .bind(&candidate.notes)
        .bind(candidate.worker_id.map(|id| id.to_string()))
        .bind(candidate.stage_changed_at)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE candidates SET
                first_name = ?, last_name = ?, email = ?, phone = ?, nationality = ?,
                specialization = ?, stage = ?, expected_rate = ?, source = ?, notes = ?,
                worker_id = ?, stage_changed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.nationality)
        .bind(&candidate.specialization)
        .bind(candidate.stage.as_str())
        .bind(candidate.expected_rate)
        .bind(&candidate.source)
        .bind(&candidate.notes)
        .bind(candidate.worker_id.map(|id| id.to_string()))
        .bind(candidate.stage_changed_at)
        .bind(candidate.updated_at)
        .bind(candidate.id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_hire(
        &self,
        candidate: &Candidate,
        worker: &Worker,
        expected: PipelineStage,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        insert_worker_query(worker)?.execute(&mut *tx).await?;
        let claimed = sqlx::query(
            r#"
            UPDATE candidates SET
                stage = ?, worker_id = ?, stage_changed_at = ?, updated_at = ?
            WHERE id = ? AND stage = ?
            "#,
        )
        .bind(candidate.stage.as_str())
        .bind(candidate.worker_id.map(|id| id.to_string()))
        .bind(candidate.stage_changed_at)
        .bind(candidate.updated_at)
        .bind(candidate.id.to_string())
        .bind(expected.as_str())
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // --- Notifications ---

    async fn list_notifications(&self, unread_only: bool) -> Result<Vec<Notification>> {
        let sql = if unread_only {
            "SELECT * FROM notifications WHERE is_read = 0 ORDER BY created_at DESC"
        } else {
            "SELECT * FROM notifications ORDER BY created_at DESC"
        };

        let rows = sqlx::query_as::<_, NotificationRow>(sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, kind, severity, title, message, entity_id, dedup_key, is_read, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(notification.id.to_string())
        .bind(enum_to_text(&notification.kind)?)
        .bind(notification.severity.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.entity_id.map(|id| id.to_string()))
        .bind(&notification.dedup_key)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_notification_if_absent(&self, notification: &Notification) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (
                id, kind, severity, title, message, entity_id, dedup_key, is_read, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (dedup_key) DO NOTHING
            "#,
        )
        .bind(notification.id.to_string())
        .bind(enum_to_text(&notification.kind)?)
        .bind(notification.severity.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.entity_id.map(|id| id.to_string()))
        .bind(&notification.dedup_key)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_notification(&self, dedup_key: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE dedup_key = ?")
                .bind(dedup_key)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_notifications_read(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// Database row types for mapping

#[derive(sqlx::FromRow)]
struct WorkerRow {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    nationality: Option<String>,
    specialization: Option<String>,
    status: String,
    hourly_rate: Option<f64>,
    project_id: Option<String>,
    hired_on: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkerRow> for Worker {
    type Error = Error;

    fn try_from(row: WorkerRow) -> Result<Self> {
        Ok(Worker {
            id: parse_id(&row.id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            nationality: row.nationality,
            specialization: row.specialization,
            status: enum_from_text(row.status)?,
            hourly_rate: row.hourly_rate,
            project_id: parse_opt_id(row.project_id)?,
            hired_on: row.hired_on,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    worker_id: String,
    doc_type: String,
    number: Option<String>,
    issued_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = Error;

    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Document {
            id: parse_id(&row.id)?,
            worker_id: parse_id(&row.worker_id)?,
            doc_type: enum_from_text(row.doc_type)?,
            number: row.number,
            issued_on: row.issued_on,
            expires_on: row.expires_on,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: String,
    name: String,
    client: Option<String>,
    location: Option<String>,
    status: String,
    budget: f64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = Error;

    fn try_from(row: ProjectRow) -> Result<Self> {
        Ok(Project {
            id: parse_id(&row.id)?,
            name: row.name,
            client: row.client,
            location: row.location,
            status: enum_from_text(row.status)?,
            budget: row.budget,
            start_date: row.start_date,
            end_date: row.end_date,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExpenseRow {
    id: String,
    project_id: String,
    category: String,
    amount: f64,
    description: Option<String>,
    incurred_on: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = Error;

    fn try_from(row: ExpenseRow) -> Result<Self> {
        Ok(Expense {
            id: parse_id(&row.id)?,
            project_id: parse_id(&row.project_id)?,
            category: enum_from_text(row.category)?,
            amount: row.amount,
            description: row.description,
            incurred_on: row.incurred_on,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    nationality: Option<String>,
    specialization: Option<String>,
    stage: String,
    expected_rate: Option<f64>,
    source: Option<String>,
    notes: Option<String>,
    worker_id: Option<String>,
    stage_changed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = Error;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Candidate {
            id: parse_id(&row.id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            nationality: row.nationality,
            specialization: row.specialization,
            stage: enum_from_text(row.stage)?,
            expected_rate: row.expected_rate,
            source: row.source,
            notes: row.notes,
            worker_id: parse_opt_id(row.worker_id)?,
            stage_changed_at: row.stage_changed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: String,
    kind: String,
    severity: String,
    title: String,
    message: String,
    entity_id: Option<String>,
    dedup_key: Option<String>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: parse_id(&row.id)?,
            kind: enum_from_text(row.kind)?,
            severity: enum_from_text(row.severity)?,
            title: row.title,
            message: row.message,
            entity_id: parse_opt_id(row.entity_id)?,
            dedup_key: row.dedup_key,
            read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use crate::db::MemoryStore;
    use crate::models::{
        CandidateInput, DocumentInput, DocumentType, ExpenseCategory, ExpenseInput,
        NotificationKind, ProjectInput, Severity, WorkerInput, WorkerStatus,
    };
    use chrono::Duration;
    use tempfile::TempDir;

    async fn store() -> (SqliteStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            backend: StorageBackend::Sqlite,
            url: format!("sqlite://{}", dir.path().join("test.db").display()),
            max_connections: 2,
            seed_demo_data: false,
        };
        let store = SqliteStore::connect(&config).await.unwrap();
        store.migrate().await.unwrap();
        (store, dir)
    }

    fn worker(first: &str, last: &str) -> Worker {
        WorkerInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            nationality: Some("UA".to_string()),
            ..Default::default()
        }
        .into_worker()
        .unwrap()
    }

    fn document(worker_id: Uuid, expires_on: Option<NaiveDate>) -> Document {
        DocumentInput {
            doc_type: DocumentType::Trc,
            number: Some("RP0012345".to_string()),
            issued_on: None,
            expires_on,
            notes: None,
        }
        .into_document(worker_id)
        .unwrap()
    }

    #[tokio::test]
    async fn test_worker_round_trip_and_search() {
        let (store, _dir) = store().await;
        let mut w = worker("Mykola", "Hrytsenko");
        w.status = WorkerStatus::OnLeave;
        store.insert_worker(&w).await.unwrap();
        store.insert_worker(&worker("Adam", "Zielinski")).await.unwrap();

        let loaded = store.get_worker(w.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, WorkerStatus::OnLeave);
        assert_eq!(loaded.nationality.as_deref(), Some("UA"));

        let found = store
            .list_workers(&WorkerFilter {
                search: Some("hryts".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, w.id);

        let on_leave = store
            .list_workers(&WorkerFilter {
                status: Some(WorkerStatus::OnLeave),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(on_leave.len(), 1);
    }

    #[tokio::test]
    async fn test_documents_ordered_by_expiry_with_cutoff() {
        let (store, _dir) = store().await;
        let w = worker("Jan", "Kowalski");
        store.insert_worker(&w).await.unwrap();

        let today = Utc::now().date_naive();
        let late = document(w.id, Some(today + Duration::days(200)));
        let soon = document(w.id, Some(today + Duration::days(10)));
        let undated = document(w.id, None);
        for doc in [&late, &undated, &soon] {
            store.insert_document(doc).await.unwrap();
        }

        let all = store
            .list_documents(&DocumentFilter::default(), today)
            .await
            .unwrap();
        let ids: Vec<Uuid> = all.iter().map(|d| d.id).collect();
        assert_eq!(ids, [soon.id, late.id, undated.id]);

        let expiring = store
            .list_documents(
                &DocumentFilter {
                    expiring_within_days: Some(30),
                    ..Default::default()
                },
                today,
            )
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].id, soon.id);
    }

    #[tokio::test]
    async fn test_project_spend_and_cascade() {
        let (store, _dir) = store().await;
        let project = ProjectInput {
            name: "Tank farm".to_string(),
            budget: 50_000.0,
            ..Default::default()
        }
        .into_project()
        .unwrap();
        store.insert_project(&project).await.unwrap();
        assert_eq!(store.project_spend(project.id).await.unwrap(), 0.0);

        let mut w = worker("Jan", "Kowalski");
        w.project_id = Some(project.id);
        store.insert_worker(&w).await.unwrap();

        for amount in [1_200.0, 800.5] {
            let expense = ExpenseInput {
                category: ExpenseCategory::Consumables,
                amount,
                description: None,
                incurred_on: None,
            }
            .into_expense(project.id)
            .unwrap();
            store.insert_expense(&expense).await.unwrap();
        }
        assert_eq!(store.project_spend(project.id).await.unwrap(), 2_000.5);

        assert!(store.delete_project(project.id).await.unwrap());
        assert!(store
            .list_expenses(&ExpenseFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.get_worker(w.id).await.unwrap().unwrap().project_id, None);
    }

    #[tokio::test]
    async fn test_notification_read_flags() {
        let (store, _dir) = store().await;
        let n = Notification::new(NotificationKind::Budget, Severity::Critical, "Over", "Over")
            .with_dedup_key("budget:x:critical");
        store.insert_notification(&n).await.unwrap();

        assert!(store.has_notification("budget:x:critical").await.unwrap());
        let unread = store.list_notifications(true).await.unwrap();
        assert_eq!(unread[0].severity, Severity::Critical);
        assert!(!unread[0].read);

        assert!(store.mark_notification_read(n.id).await.unwrap());
        assert!(store.list_notifications(true).await.unwrap().is_empty());
        assert_eq!(store.mark_all_notifications_read().await.unwrap(), 0);
        assert!(store.delete_notification(n.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_notification_dedup_key_is_stored_once() {
        let (store, _dir) = store().await;
        let first = Notification::new(NotificationKind::DocumentExpiry, Severity::Warning, "TRC", "TRC")
            .with_dedup_key("document:a:warning");
        let second = Notification::new(NotificationKind::DocumentExpiry, Severity::Warning, "TRC", "TRC")
            .with_dedup_key("document:a:warning");

        let (a, b) = tokio::join!(
            store.insert_notification_if_absent(&first),
            store.insert_notification_if_absent(&second)
        );
        assert!(a.unwrap() ^ b.unwrap());
        assert_eq!(store.list_notifications(false).await.unwrap().len(), 1);

        // Notifications without a key never collide
        for _ in 0..2 {
            let plain = Notification::new(NotificationKind::System, Severity::Info, "Note", "Note");
            assert!(store.insert_notification_if_absent(&plain).await.unwrap());
        }
        assert_eq!(store.list_notifications(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_worker_cascades_in_sqlite() {
        let (store, _dir) = store().await;
        let w = worker("Taras", "Bondarenko");
        let other = worker("Piotr", "Nowak");
        store.insert_worker(&w).await.unwrap();
        store.insert_worker(&other).await.unwrap();
        let today = Utc::now().date_naive();
        store.insert_document(&document(w.id, Some(today))).await.unwrap();
        store.insert_document(&document(w.id, None)).await.unwrap();
        let kept = document(other.id, None);
        store.insert_document(&kept).await.unwrap();

        let mut candidate = CandidateInput {
            first_name: "Taras".to_string(),
            last_name: "Bondarenko".to_string(),
            ..Default::default()
        }
        .into_candidate()
        .unwrap();
        candidate.stage = PipelineStage::Hired;
        candidate.worker_id = Some(w.id);
        store.insert_candidate(&candidate).await.unwrap();

        assert!(store.delete_worker(w.id).await.unwrap());
        assert!(!store.delete_worker(w.id).await.unwrap());

        let remaining = store
            .list_documents(&DocumentFilter::default(), today)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);

        let candidate = store.get_candidate(candidate.id).await.unwrap().unwrap();
        assert_eq!(candidate.stage, PipelineStage::Hired);
        assert_eq!(candidate.worker_id, None);
    }

    #[tokio::test]
    async fn test_search_matches_memory_store() {
        let (sqlite, _dir) = store().await;
        let memory = MemoryStore::new();
        for w in [worker("Łukasz", "Żak"), worker("Olena", "Kovalchuk")] {
            sqlite.insert_worker(&w).await.unwrap();
            memory.insert_worker(&w).await.unwrap();
        }

        for (term, expected) in [("łuk", 1), ("ŻAK", 1), ("KOVAL", 1), ("_", 0), ("%", 0), ("a", 2)] {
            let filter = WorkerFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            let from_sqlite = sqlite.list_workers(&filter).await.unwrap().len();
            let from_memory = memory.list_workers(&filter).await.unwrap().len();
            assert_eq!((from_sqlite, from_memory), (expected, expected), "term {term:?}");
        }
    }

    #[tokio::test]
    async fn test_record_hire_only_applies_from_expected_stage() {
        let (store, _dir) = store().await;
        let mut candidate = CandidateInput {
            first_name: "Ihor".to_string(),
            last_name: "Tkachenko".to_string(),
            ..Default::default()
        }
        .into_candidate()
        .unwrap();
        store.insert_candidate(&candidate).await.unwrap();

        let hired = worker("Ihor", "Tkachenko");
        candidate.stage = PipelineStage::Hired;
        candidate.worker_id = Some(hired.id);

        // Still at applied, so nothing is written
        assert!(!store
            .record_hire(&candidate, &hired, PipelineStage::Offer)
            .await
            .unwrap());
        assert!(store.get_worker(hired.id).await.unwrap().is_none());

        assert!(store
            .record_hire(&candidate, &hired, PipelineStage::Applied)
            .await
            .unwrap());
        let stored = store.get_candidate(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.stage, PipelineStage::Hired);
        assert_eq!(stored.worker_id, Some(hired.id));
        assert!(store.get_worker(hired.id).await.unwrap().is_some());
    }
}
