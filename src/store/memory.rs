//! In-memory storage backend.
//!
//! [`InMemoryStore`] keeps salary records, task records and contribution
//! results in `tokio` `RwLock`-guarded maps. It backs the server binary and
//! the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::calculation::round_to_cents;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationTask, ContributionResult, SalaryRecord, TaskPatch, TaskStatus, TaskSummary,
};

use super::traits::{ResultStore, SalaryRepository, SummaryReader, TaskStore};

type ResultKey = (String, i32, String);

/// A process-local store implementing every storage collaborator.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    salaries: RwLock<HashMap<String, Vec<SalaryRecord>>>,
    tasks: RwLock<HashMap<Uuid, CalculationTask>>,
    results: RwLock<HashMap<ResultKey, ContributionResult>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends salary records for `owner`.
    pub async fn insert_salaries(&self, owner: &str, records: Vec<SalaryRecord>) {
        self.salaries
            .write()
            .await
            .entry(owner.to_string())
            .or_default()
            .extend(records);
    }

    /// Returns the number of stored tasks across all owners.
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

#[async_trait]
impl SalaryRepository for InMemoryStore {
    async fn salaries_for_year(&self, owner: &str, year: i32) -> EngineResult<Vec<SalaryRecord>> {
        let salaries = self.salaries.read().await;
        Ok(salaries
            .get(owner)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.year() == Some(year))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn create_task(&self, task: CalculationTask) -> EngineResult<CalculationTask> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(EngineError::conflict(format!("Task {} already exists", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner: &str,
        patch: TaskPatch,
    ) -> EngineResult<CalculationTask> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .filter(|t| t.owner == owner)
            .ok_or_else(|| EngineError::not_found("Task"))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn get_task(&self, id: Uuid, owner: &str) -> EngineResult<Option<CalculationTask>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).filter(|t| t.owner == owner).cloned())
    }

    async fn list_tasks(
        &self,
        owner: &str,
        status: Option<TaskStatus>,
    ) -> EngineResult<Vec<CalculationTask>> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<CalculationTask> = tasks
            .values()
            .filter(|t| t.owner == owner)
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(owned)
    }

    async fn delete_task(&self, id: Uuid, owner: &str) -> EngineResult<bool> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).is_some_and(|t| t.owner == owner);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }

    async fn increment_processed(&self, id: Uuid, owner: &str) -> EngineResult<u32> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .filter(|t| t.owner == owner)
            .ok_or_else(|| EngineError::not_found("Task"))?;
        task.processed_employees = (task.processed_employees + 1).min(task.total_employees);
        Ok(task.processed_employees)
    }
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn save_result(&self, result: ContributionResult) -> EngineResult<()> {
        let key = (result.owner.clone(), result.year, result.employee_id.clone());
        self.results.write().await.insert(key, result);
        Ok(())
    }

    async fn results_for_year(
        &self,
        owner: &str,
        year: i32,
    ) -> EngineResult<Vec<ContributionResult>> {
        let results = self.results.read().await;
        let mut matching: Vec<ContributionResult> = results
            .values()
            .filter(|r| r.owner == owner && r.year == year)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));
        Ok(matching)
    }
}

#[async_trait]
impl SummaryReader for InMemoryStore {
    async fn aggregate_summary(&self, owner: &str, year: i32) -> EngineResult<Option<TaskSummary>> {
        let results = self.results_for_year(owner, year).await?;
        if results.is_empty() {
            return Ok(None);
        }

        let employee_count = results.len();
        let total_company_cost: Decimal = results.iter().map(|r| r.total_company).sum();
        let total_employee_cost: Decimal = results.iter().map(|r| r.total_employee).sum();
        let avg_cost_per_employee =
            round_to_cents((total_company_cost + total_employee_cost) / Decimal::from(employee_count));

        Ok(Some(TaskSummary {
            employee_count: employee_count as u32,
            total_company_cost,
            total_employee_cost,
            avg_cost_per_employee,
        }))
    }
}
