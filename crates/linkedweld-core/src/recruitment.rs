//! Recruitment pipeline transitions and hiring

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Error, Result};
use crate::models::{
    Candidate, HireOutcome, HireRequest, Notification, NotificationKind, PipelineStage, Severity,
    StageChange, WorkerInput, WorkerStatus,
};

/// Check that a candidate may move from `from` to `to` through a stage change
pub fn check_transition(from: PipelineStage, to: PipelineStage) -> Result<()> {
    if from.is_terminal() {
        return Err(Error::conflict(format!(
            "candidate is already {} and cannot change stage",
            from.as_str()
        )));
    }
    if to == PipelineStage::Hired {
        return Err(Error::conflict(
            "candidates are moved to hired through the hire operation",
        ));
    }
    Ok(())
}

/// Move a candidate to another pipeline stage
pub async fn move_stage(store: &dyn Store, id: Uuid, change: StageChange) -> Result<Candidate> {
    let mut candidate = store.require_candidate(id).await?;
    check_transition(candidate.stage, change.stage)?;

    let now = Utc::now();
    let from = candidate.stage;
    if from != change.stage {
        candidate.stage = change.stage;
        candidate.stage_changed_at = now;
    }
    if let Some(notes) = change.notes.map(|n| n.trim().to_string()) {
        if !notes.is_empty() {
            candidate.notes = Some(notes);
        }
    }
    candidate.updated_at = now;

    store.update_candidate(&candidate).await?;

    info!(
        candidate_id = %candidate.id,
        from = from.as_str(),
        to = candidate.stage.as_str(),
        "Candidate stage changed"
    );
    Ok(candidate)
}

/// Hire a candidate holding an offer, creating an active worker record
pub async fn hire(store: &dyn Store, id: Uuid, request: HireRequest) -> Result<HireOutcome> {
    let mut candidate = store.require_candidate(id).await?;
    if candidate.stage != PipelineStage::Offer {
        return Err(Error::conflict(format!(
            "only candidates at the offer stage can be hired, this one is {}",
            candidate.stage.as_str()
        )));
    }

    if let Some(project_id) = request.project_id {
        store.require_project(project_id).await?;
    }

    let today = Utc::now().date_naive();
    let worker = WorkerInput {
        first_name: candidate.first_name.clone(),
        last_name: candidate.last_name.clone(),
        email: candidate.email.clone(),
        phone: candidate.phone.clone(),
        nationality: candidate.nationality.clone(),
        specialization: candidate.specialization.clone(),
        status: Some(WorkerStatus::Active),
        hourly_rate: request.hourly_rate.or(candidate.expected_rate),
        project_id: request.project_id,
        hired_on: Some(today),
        notes: None,
    }
    .into_worker()?;

    let now = Utc::now();
    candidate.stage = PipelineStage::Hired;
    candidate.worker_id = Some(worker.id);
    candidate.stage_changed_at = now;
    candidate.updated_at = now;
    if !store
        .record_hire(&candidate, &worker, PipelineStage::Offer)
        .await?
    {
        return Err(Error::conflict("candidate left the offer stage while being hired"));
    }

    let notification = Notification::new(
        NotificationKind::Recruitment,
        Severity::Info,
        format!("Hired: {}", worker.full_name()),
        format!(
            "{} joined as a worker{}",
            worker.full_name(),
            worker
                .specialization
                .as_deref()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default()
        ),
    )
    .with_entity(worker.id);
    store.insert_notification(&notification).await?;

    info!(
        candidate_id = %candidate.id,
        worker_id = %worker.id,
        "Candidate hired"
    );

    Ok(HireOutcome { candidate, worker })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CandidateInput, ProjectInput};
    use rstest::rstest;

    async fn candidate_at(store: &MemoryStore, stage: PipelineStage) -> Candidate {
        let mut candidate = CandidateInput {
            first_name: "Bogdan".to_string(),
            last_name: "Lysenko".to_string(),
            specialization: Some("MAG 136".to_string()),
            expected_rate: Some(31.0),
            ..Default::default()
        }
        .into_candidate()
        .unwrap();
        candidate.stage = stage;
        store.insert_candidate(&candidate).await.unwrap();
        candidate
    }

    #[rstest]
    #[case(PipelineStage::Applied, PipelineStage::Interview, true)]
    #[case(PipelineStage::Offer, PipelineStage::Screening, true)]
    #[case(PipelineStage::TradeTest, PipelineStage::Rejected, true)]
    #[case(PipelineStage::Offer, PipelineStage::Hired, false)]
    #[case(PipelineStage::Rejected, PipelineStage::Applied, false)]
    #[case(PipelineStage::Hired, PipelineStage::Rejected, false)]
    fn test_check_transition(
        #[case] from: PipelineStage,
        #[case] to: PipelineStage,
        #[case] allowed: bool,
    ) {
        assert_eq!(check_transition(from, to).is_ok(), allowed);
    }

    #[tokio::test]
    async fn test_move_stage_updates_candidate() {
        let store = MemoryStore::new();
        let candidate = candidate_at(&store, PipelineStage::Screening).await;

        let moved = move_stage(
            &store,
            candidate.id,
            StageChange {
                stage: PipelineStage::TradeTest,
                notes: Some("Passed interview".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(moved.stage, PipelineStage::TradeTest);
        assert_eq!(moved.notes.as_deref(), Some("Passed interview"));
        assert!(moved.stage_changed_at >= candidate.stage_changed_at);

        let stored = store.get_candidate(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.stage, PipelineStage::TradeTest);
    }

    #[tokio::test]
    async fn test_move_stage_to_hired_is_conflict() {
        let store = MemoryStore::new();
        let candidate = candidate_at(&store, PipelineStage::Offer).await;

        let err = move_stage(
            &store,
            candidate.id,
            StageChange {
                stage: PipelineStage::Hired,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_hire_creates_worker_and_notification() {
        let store = MemoryStore::new();
        let project = ProjectInput {
            name: "LNG tank supports".to_string(),
            budget: 10_000.0,
            ..Default::default()
        }
        .into_project()
        .unwrap();
        store.insert_project(&project).await.unwrap();
        let candidate = candidate_at(&store, PipelineStage::Offer).await;

        let outcome = hire(
            &store,
            candidate.id,
            HireRequest {
                project_id: Some(project.id),
                hourly_rate: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.candidate.stage, PipelineStage::Hired);
        assert_eq!(outcome.candidate.worker_id, Some(outcome.worker.id));
        assert_eq!(outcome.worker.status, WorkerStatus::Active);
        assert_eq!(outcome.worker.hourly_rate, Some(31.0));
        assert_eq!(outcome.worker.project_id, Some(project.id));

        let notifications = store.list_notifications(true).await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Recruitment);
        assert_eq!(notifications[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_hire_requires_offer_and_known_project() {
        let store = MemoryStore::new();
        let interviewing = candidate_at(&store, PipelineStage::Interview).await;
        let err = hire(&store, interviewing.id, HireRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let offered = candidate_at(&store, PipelineStage::Offer).await;
        let err = hire(
            &store,
            offered.id,
            HireRequest {
                project_id: Some(Uuid::new_v4()),
                hourly_rate: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(store
            .list_workers(&Default::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_hires_create_one_worker() {
        let store = MemoryStore::new();
        let candidate = candidate_at(&store, PipelineStage::Offer).await;

        let (a, b) = tokio::join!(
            hire(&store, candidate.id, HireRequest::default()),
            hire(&store, candidate.id, HireRequest::default())
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(Error::Conflict(_)))));

        let workers = store
            .list_workers(&crate::models::WorkerFilter::default())
            .await
            .unwrap();
        assert_eq!(workers.len(), 1);
        let stored = store.get_candidate(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.worker_id, Some(workers[0].id));
    }
}
