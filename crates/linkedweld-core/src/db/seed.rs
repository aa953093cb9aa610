//! Demo data for local runs and the dashboard

use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::Store;
use crate::error::Result;
use crate::models::{
    CandidateInput, DocumentInput, DocumentType, ExpenseCategory, ExpenseInput, PipelineStage,
    ProjectInput, ProjectStatus, WorkerFilter, WorkerInput, WorkerStatus,
};

/// Populate an empty store with demo workers, projects and candidates.
///
/// Does nothing when any worker already exists. Returns whether data was written.
pub async fn seed_demo_data(store: &dyn Store) -> Result<bool> {
    if !store.list_workers(&WorkerFilter::default()).await?.is_empty() {
        debug!("Store already has data, skipping demo seed");
        return Ok(false);
    }

    let today = Utc::now().date_naive();

    // Projects: one near its limit, one in the warning band, one comfortable
    let projects = [
        ("Refinery pipe rack", "Orlen", "Płock", 120_000.0, 0.95),
        ("Boiler house revamp", "PGE", "Bełchatów", 80_000.0, 0.75),
        ("LNG tank supports", "Gaz-System", "Świnoujście", 200_000.0, 0.30),
    ];

    let mut project_ids = Vec::new();
    for (name, client, location, budget, used) in projects {
        let project = ProjectInput {
            name: name.to_string(),
            client: Some(client.to_string()),
            location: Some(location.to_string()),
            status: Some(ProjectStatus::Active),
            budget,
            start_date: Some(today - Duration::days(60)),
            ..Default::default()
        }
        .into_project()?;
        store.insert_project(&project).await?;

        let spend = budget * used;
        let split = [
            (ExpenseCategory::Labor, 0.6),
            (ExpenseCategory::Materials, 0.25),
            (ExpenseCategory::Consumables, 0.15),
        ];
        for (offset, (category, share)) in split.into_iter().enumerate() {
            let expense = ExpenseInput {
                category,
                amount: (spend * share * 100.0).round() / 100.0,
                description: Some(format!("{name} {category:?}").to_lowercase()),
                incurred_on: Some(today - Duration::days(7 * (offset as i64 + 1))),
            }
            .into_expense(project.id)?;
            store.insert_expense(&expense).await?;
        }

        project_ids.push(project.id);
    }

    // Workers: TRC expiry days drive the document alerts
    let workers = [
        ("Oleh", "Kovalenko", "UA", "TIG 141", 34.0, Some(20), WorkerStatus::Active),
        ("Andrii", "Melnyk", "UA", "MAG 135", 31.5, Some(60), WorkerStatus::Active),
        ("Rahul", "Sharma", "IN", "MMA 111", 29.0, Some(400), WorkerStatus::Active),
        ("Piotr", "Nowak", "PL", "TIG 141", 38.0, None, WorkerStatus::Active),
        ("Dmytro", "Bondarenko", "UA", "MAG 136", 30.0, Some(-5), WorkerStatus::OnLeave),
        ("Siarhei", "Ivanou", "BY", "MMA 111", 28.0, Some(15), WorkerStatus::Inactive),
    ];

    for (index, (first, last, nationality, trade, rate, trc_days, status)) in
        workers.into_iter().enumerate()
    {
        let worker = WorkerInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            nationality: Some(nationality.to_string()),
            specialization: Some(trade.to_string()),
            status: Some(status),
            hourly_rate: Some(rate),
            project_id: (status == WorkerStatus::Active)
                .then(|| project_ids[index % project_ids.len()]),
            hired_on: Some(today - Duration::days(365)),
            ..Default::default()
        }
        .into_worker()?;
        store.insert_worker(&worker).await?;

        if let Some(days) = trc_days {
            let trc = DocumentInput {
                doc_type: DocumentType::Trc,
                number: Some(format!("RP{:07}", 1_000 + index)),
                issued_on: Some(today - Duration::days(700)),
                expires_on: Some(today + Duration::days(days)),
                notes: None,
            }
            .into_document(worker.id)?;
            store.insert_document(&trc).await?;
        }

        let passport = DocumentInput {
            doc_type: DocumentType::Passport,
            number: Some(format!("{nationality}{:06}", 500_000 + index)),
            issued_on: Some(today - Duration::days(1_000)),
            expires_on: Some(today + Duration::days(2_000)),
            notes: None,
        }
        .into_document(worker.id)?;
        store.insert_document(&passport).await?;
    }

    // Candidates spread over the pipeline
    let candidates = [
        ("Vasyl", "Tkachenko", "MAG 135", PipelineStage::Applied),
        ("Mohammed", "Alam", "TIG 141", PipelineStage::Screening),
        ("Yurii", "Savchuk", "MMA 111", PipelineStage::Interview),
        ("Arjun", "Patel", "TIG 141", PipelineStage::TradeTest),
        ("Bogdan", "Lysenko", "MAG 136", PipelineStage::Offer),
        ("Ramesh", "Kumar", "MMA 111", PipelineStage::Rejected),
    ];

    for (first, last, trade, stage) in candidates {
        let mut candidate = CandidateInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            specialization: Some(trade.to_string()),
            expected_rate: Some(30.0),
            source: Some("agency".to_string()),
            ..Default::default()
        }
        .into_candidate()?;
        candidate.stage = stage;
        store.insert_candidate(&candidate).await?;
    }

    info!(
        projects = projects.len(),
        workers = workers.len(),
        candidates = candidates.len(),
        "Seeded demo data"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::ProjectFilter;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        assert!(seed_demo_data(&store).await.unwrap());
        assert!(!seed_demo_data(&store).await.unwrap());

        let workers = store.list_workers(&WorkerFilter::default()).await.unwrap();
        assert_eq!(workers.len(), 6);
        let projects = store.list_projects(&ProjectFilter::default()).await.unwrap();
        assert_eq!(projects.len(), 3);
    }

    #[tokio::test]
    async fn test_seed_budgets_hit_alert_bands() {
        let store = MemoryStore::new();
        seed_demo_data(&store).await.unwrap();

        let mut ratios = Vec::new();
        for project in store.list_projects(&ProjectFilter::default()).await.unwrap() {
            let spent = store.project_spend(project.id).await.unwrap();
            ratios.push(spent / project.budget);
        }
        assert!(ratios.iter().any(|r| *r > 0.9));
        assert!(ratios.iter().any(|r| *r > 0.7 && *r <= 0.9));
    }
}
