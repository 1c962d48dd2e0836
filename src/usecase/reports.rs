use uuid::Uuid;

use crate::domain::report::Report;
use crate::domain::review::{is_valid_body, BODY_MAX_CHARS, BODY_MIN_CHARS};
use crate::repository::errors::RepositoryError;
use crate::usecase::contracts::{LocationRepository, ReportRepository};
use crate::usecase::error::UsecaseError;

pub struct ReportsUseCase<Rp, L>
where
    Rp: ReportRepository,
    L: LocationRepository,
{
    report_repository: Rp,
    location_repository: L,
}

impl<Rp, L> ReportsUseCase<Rp, L>
where
    Rp: ReportRepository,
    L: LocationRepository,
{
    pub fn new(report_repository: Rp, location_repository: L) -> Self {
        Self {
            report_repository,
            location_repository,
        }
    }

    #[tracing::instrument(skip(self, body), fields(location_id = %location_id, user_id = %user_id))]
    pub async fn create_report(&self, location_id: Uuid, user_id: Uuid, body: String) -> Result<Report, UsecaseError> {
        tracing::debug!("creating report");

        validate_body(&body)?;

        self.location_repository
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Location".to_string()))?;

        let report = Report::new(location_id, user_id, body);
        self.report_repository.create(&report).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => UsecaseError::Conflict("Report already exists".to_string()),
            other => other.into(),
        })?;

        tracing::info!(report_id = %report.id, location_id = %location_id, "report created");
        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_reports(&self, user_id: Uuid) -> Result<Vec<Report>, UsecaseError> {
        let reports = self.report_repository.find_by_user_id(user_id).await?;
        tracing::debug!(count = reports.len(), "retrieved reports");
        Ok(reports)
    }

    #[tracing::instrument(skip(self, body), fields(report_id = %report_id, user_id = %user_id))]
    pub async fn update_report(&self, report_id: Uuid, user_id: Uuid, body: String) -> Result<Report, UsecaseError> {
        validate_body(&body)?;

        let mut report = self.owned_report(report_id, user_id).await?;
        self.report_repository.update_body(report_id, &body).await?;
        report.body = body;

        tracing::info!(report_id = %report_id, "report updated");
        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(report_id = %report_id, user_id = %user_id))]
    pub async fn delete_report(&self, report_id: Uuid, user_id: Uuid) -> Result<(), UsecaseError> {
        self.owned_report(report_id, user_id).await?;
        self.report_repository.delete(report_id).await?;

        tracing::info!(report_id = %report_id, "report deleted");
        Ok(())
    }

    async fn owned_report(&self, report_id: Uuid, user_id: Uuid) -> Result<Report, UsecaseError> {
        let report = self
            .report_repository
            .find_by_id(report_id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Report".to_string()))?;

        if report.user_id != user_id {
            tracing::warn!(report_id = %report_id, user_id = %user_id, "unauthorized report access attempt");
            return Err(UsecaseError::Forbidden("Not authorized to modify this report".to_string()));
        }
        Ok(report)
    }
}

fn validate_body(body: &str) -> Result<(), UsecaseError> {
    if is_valid_body(body) {
        Ok(())
    } else {
        Err(UsecaseError::Validation(format!(
            "Report must be between {BODY_MIN_CHARS} and {BODY_MAX_CHARS} characters"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::Location;
    use crate::usecase::contracts::{MockLocationRepository, MockReportRepository};

    const BODY: &str = "This place closed last spring.";

    fn location_repo_with(id: Uuid) -> MockLocationRepository {
        let mut mock_location_repo = MockLocationRepository::new();
        mock_location_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(id))
            .times(1)
            .returning(move |id| {
                Ok(Some(Location {
                    id,
                    name: "Navy Pier".to_string(),
                    latitude: 41.8917,
                    longitude: -87.6086,
                    category_id: None,
                    category_name: None,
                    rating: None,
                    opening_hours: None,
                    image_urls: vec![],
                }))
            });
        mock_location_repo
    }

    #[tokio::test]
    async fn test_create_report_success() {
        let mut mock_report_repo = MockReportRepository::new();
        let location_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        mock_report_repo
            .expect_create()
            .withf(move |r| r.location_id == location_id && r.user_id == user_id && r.body == BODY)
            .times(1)
            .returning(|_| Ok(()));

        let usecase = ReportsUseCase::new(mock_report_repo, location_repo_with(location_id));
        let report = usecase.create_report(location_id, user_id, BODY.to_string()).await.unwrap();

        assert_eq!(report.location_id, location_id);
    }

    #[tokio::test]
    async fn test_duplicate_report_conflicts() {
        let mut mock_report_repo = MockReportRepository::new();
        let location_id = Uuid::new_v4();

        mock_report_repo
            .expect_create()
            .times(1)
            .returning(|_| Err(RepositoryError::Conflict("reports_location_id_user_id_key".to_string())));

        let usecase = ReportsUseCase::new(mock_report_repo, location_repo_with(location_id));
        let result = usecase.create_report(location_id, Uuid::new_v4(), BODY.to_string()).await;

        match result {
            Err(UsecaseError::Conflict(msg)) => assert_eq!(msg, "Report already exists"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_report_unknown_location() {
        let mut mock_location_repo = MockLocationRepository::new();
        mock_location_repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let usecase = ReportsUseCase::new(MockReportRepository::new(), mock_location_repo);
        let result = usecase.create_report(Uuid::new_v4(), Uuid::new_v4(), BODY.to_string()).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_report_body_too_short() {
        let usecase = ReportsUseCase::new(MockReportRepository::new(), MockLocationRepository::new());
        let result = usecase.create_report(Uuid::new_v4(), Uuid::new_v4(), "closed".to_string()).await;

        assert!(matches!(result, Err(UsecaseError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_report_by_owner() {
        let mut mock_report_repo = MockReportRepository::new();
        let user_id = Uuid::new_v4();
        let report = Report::new(Uuid::new_v4(), user_id, BODY.to_string());
        let report_id = report.id;

        mock_report_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(report.clone())));
        mock_report_repo
            .expect_update_body()
            .withf(move |id, body| *id == report_id && body == "Reopened under new owners.")
            .times(1)
            .returning(|_, _| Ok(()));

        let usecase = ReportsUseCase::new(mock_report_repo, MockLocationRepository::new());
        let updated = usecase
            .update_report(report_id, user_id, "Reopened under new owners.".to_string())
            .await
            .unwrap();

        assert_eq!(updated.body, "Reopened under new owners.");
    }

    #[tokio::test]
    async fn test_delete_report_forbidden_for_others() {
        let mut mock_report_repo = MockReportRepository::new();
        let report = Report::new(Uuid::new_v4(), Uuid::new_v4(), BODY.to_string());
        let report_id = report.id;

        mock_report_repo
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(report.clone())));
        mock_report_repo.expect_delete().never();

        let usecase = ReportsUseCase::new(mock_report_repo, MockLocationRepository::new());
        let result = usecase.delete_report(report_id, Uuid::new_v4()).await;

        assert!(matches!(result, Err(UsecaseError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_report_not_found() {
        let mut mock_report_repo = MockReportRepository::new();
        mock_report_repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let usecase = ReportsUseCase::new(mock_report_repo, MockLocationRepository::new());
        let result = usecase.delete_report(Uuid::new_v4(), Uuid::new_v4()).await;

        assert!(matches!(result, Err(UsecaseError::NotFound(_))));
    }
}
