//! The bulk contribution pipeline.
//!
//! [`BatchPipeline`] is the in-process [`BulkContributionRunner`]: for each
//! distinct employee it gathers the year's records, computes the result,
//! stores it, and bumps the task's processed counter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::calculation::{employee_result, group_by_employee};
use crate::error::EngineResult;
use crate::models::{BatchOutcome, CalculationJob};
use crate::store::{
    BulkContributionRunner, RateTableProvider, ResultStore, SalaryRepository, TaskStore,
};

/// Computes and persists every employee's contributions for a job.
///
/// A missing rate table or an empty salary set is reported as an
/// unsuccessful outcome. A result that fails to persist counts towards
/// `error_count` and the run carries on with the next employee.
#[derive(Clone)]
pub struct BatchPipeline {
    rate_tables: Arc<dyn RateTableProvider>,
    salaries: Arc<dyn SalaryRepository>,
    results: Arc<dyn ResultStore>,
    tasks: Arc<dyn TaskStore>,
}

impl BatchPipeline {
    /// Creates a pipeline over the given collaborators.
    pub fn new(
        rate_tables: Arc<dyn RateTableProvider>,
        salaries: Arc<dyn SalaryRepository>,
        results: Arc<dyn ResultStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            rate_tables,
            salaries,
            results,
            tasks,
        }
    }
}

#[async_trait]
impl BulkContributionRunner for BatchPipeline {
    async fn run_batch(&self, job: &CalculationJob) -> EngineResult<Option<BatchOutcome>> {
        let Some(rate_table) = self.rate_tables.rate_table(job.year, &job.city).await? else {
            return Ok(Some(BatchOutcome {
                success: false,
                message: format!("No rate table for {} {}", job.city, job.year),
                processed_count: 0,
                error_count: 0,
            }));
        };

        let records = self.salaries.salaries_for_year(&job.owner, job.year).await?;
        if records.is_empty() {
            return Ok(Some(BatchOutcome {
                success: false,
                message: format!("No salary records for {}", job.year),
                processed_count: 0,
                error_count: 0,
            }));
        }

        let mut processed_count = 0u32;
        let mut error_count = 0u32;

        for (employee_id, employee_records) in group_by_employee(records) {
            let result = match employee_result(
                &employee_id,
                &employee_records,
                &rate_table,
                job.year,
                &job.owner,
            ) {
                Ok(result) => result,
                Err(err) => {
                    warn!(
                        task_id = %job.task_id,
                        employee_id = %employee_id,
                        error = %err,
                        "Failed to calculate contributions"
                    );
                    error_count += 1;
                    continue;
                }
            };

            if let Err(err) = self.results.save_result(result).await {
                warn!(
                    task_id = %job.task_id,
                    employee_id = %employee_id,
                    error = %err,
                    "Failed to store contribution result"
                );
                error_count += 1;
                continue;
            }

            processed_count += 1;
            match self.tasks.increment_processed(job.task_id, &job.owner).await {
                Ok(processed) => debug!(task_id = %job.task_id, processed, "Employee processed"),
                Err(err) => warn!(
                    task_id = %job.task_id,
                    error = %err,
                    "Failed to record progress"
                ),
            }
        }

        info!(
            task_id = %job.task_id,
            processed_count,
            error_count,
            "Batch contribution run finished"
        );

        Ok(Some(BatchOutcome {
            success: true,
            message: format!(
                "Processed {} employees, {} failed",
                processed_count, error_count
            ),
            processed_count,
            error_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::error::EngineError;
    use crate::models::{
        CalculationTask, CategoryRate, ContributionResult, RateTable, SalaryRecord,
    };
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_table() -> RateTable {
        RateTable {
            city: "Foshan".to_string(),
            year: 2025,
            base_min: dec("2000"),
            base_max: dec("30000"),
            pension: CategoryRate::new(dec("0.14"), dec("0.08")),
            medical: CategoryRate::new(dec("0.055"), dec("0.02")),
            unemployment: CategoryRate::new(dec("0.008"), dec("0.002")),
            injury: CategoryRate::company_only(dec("0.002")),
            maternity: CategoryRate::company_only(dec("0.016")),
            housing_fund: CategoryRate::new(dec("0.12"), dec("0.12")),
        }
    }

    /// Result store that refuses one employee.
    struct RejectingResults {
        inner: InMemoryStore,
        reject: String,
    }

    #[async_trait]
    impl ResultStore for RejectingResults {
        async fn save_result(&self, result: ContributionResult) -> EngineResult<()> {
            if result.employee_id == self.reject {
                return Err(EngineError::internal("disk full"));
            }
            self.inner.save_result(result).await
        }

        async fn results_for_year(
            &self,
            owner: &str,
            year: i32,
        ) -> EngineResult<Vec<ContributionResult>> {
            self.inner.results_for_year(owner, year).await
        }
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_salaries(
                "user_1",
                vec![
                    SalaryRecord::new("E1", "Li Lei", "2025-01", dec("5000")),
                    SalaryRecord::new("E1", "Li Lei", "2025-02", dec("6000")),
                    SalaryRecord::new("E1", "Li Lei", "2025-03", dec("7000")),
                    SalaryRecord::new("E2", "Han Mei", "2025-01", dec("1000")),
                ],
            )
            .await;
        store
    }

    async fn pending_task(store: &InMemoryStore, total: u32) -> CalculationJob {
        let task = store
            .create_task(CalculationTask::new_pending("user_1", "Foshan", 2025, None, total))
            .await
            .unwrap();
        CalculationJob::for_task(&task)
    }

    fn rate_tables() -> Arc<dyn RateTableProvider> {
        Arc::new(ConfigLoader::from_rate_tables(vec![create_test_table()]).unwrap())
    }

    #[tokio::test]
    async fn test_pipeline_stores_every_employee() {
        let store = seeded_store().await;
        let job = pending_task(&store, 2).await;
        let pipeline = BatchPipeline::new(rate_tables(), store.clone(), store.clone(), store.clone());

        let outcome = pipeline.run_batch(&job).await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.processed_count, 2);
        assert_eq!(outcome.error_count, 0);

        let results = store.results_for_year("user_1", 2025).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].employee_id, "E1");
        assert_eq!(results[0].amounts.pension_company, dec("840"));
        assert_eq!(results[1].contribution_base, dec("2000"));

        let task = store.get_task(job.task_id, "user_1").await.unwrap().unwrap();
        assert_eq!(task.processed_employees, 2);
    }

    #[tokio::test]
    async fn test_pipeline_counts_storage_failures() {
        let store = seeded_store().await;
        let job = pending_task(&store, 2).await;
        let results = Arc::new(RejectingResults {
            inner: InMemoryStore::new(),
            reject: "E2".to_string(),
        });
        let pipeline = BatchPipeline::new(rate_tables(), store.clone(), results.clone(), store.clone());

        let outcome = pipeline.run_batch(&job).await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.processed_count, 1);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(results.results_for_year("user_1", 2025).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_counts_calculation_failures() {
        let store = seeded_store().await;
        store
            .insert_salaries(
                "user_1",
                vec![
                    SalaryRecord::new("E3", "Wei Hua", "2025-01", Decimal::MAX),
                    SalaryRecord::new("E3", "Wei Hua", "2025-02", Decimal::MAX),
                ],
            )
            .await;
        let job = pending_task(&store, 3).await;
        let pipeline = BatchPipeline::new(rate_tables(), store.clone(), store.clone(), store.clone());

        let outcome = pipeline.run_batch(&job).await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.processed_count, 2);
        assert_eq!(outcome.error_count, 1);

        let results = store.results_for_year("user_1", 2025).await.unwrap();
        assert!(results.iter().all(|r| r.employee_id != "E3"));
    }

    #[tokio::test]
    async fn test_pipeline_without_rate_table_is_unsuccessful() {
        let store = seeded_store().await;
        let mut job = pending_task(&store, 2).await;
        job.city = "Atlantis".to_string();
        let pipeline = BatchPipeline::new(rate_tables(), store.clone(), store.clone(), store.clone());

        let outcome = pipeline.run_batch(&job).await.unwrap().unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_pipeline_without_salaries_is_unsuccessful() {
        let store = Arc::new(InMemoryStore::new());
        let job = pending_task(&store, 0).await;
        let pipeline = BatchPipeline::new(rate_tables(), store.clone(), store.clone(), store.clone());

        let outcome = pipeline.run_batch(&job).await.unwrap().unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.processed_count, 0);
    }
}
