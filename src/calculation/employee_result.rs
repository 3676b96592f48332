//! Full per-employee contribution calculation.
//!
//! This module bundles the average salary, contribution base and category
//! amounts into one [`ContributionResult`], and provides the grouping
//! helpers the batch pipeline uses to split a year's salary records by
//! employee.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use crate::error::{EngineError, EngineResult};
use crate::models::{ContributionResult, RateTable, SalaryRecord};

use super::average_salary::average_monthly_salary;
use super::contribution_base::contribution_base;
use super::contributions::{company_total, contributions, employee_total, round_to_cents};

/// Calculates one employee's contribution breakdown for a year.
///
/// `avg_salary` and `contribution_base` are reported in cents, while the
/// category amounts are computed from the unrounded base. The employee name
/// comes from the first record as stored, falling back to
/// `"Employee {id}"` when it is missing or empty.
///
/// # Errors
///
/// Returns [`EngineError::Calculation`] when an amount or total overflows.
///
/// # Arguments
///
/// * `employee_id` - The employee the records belong to
/// * `records` - That employee's salary records for `year`
/// * `rate_table` - The city's rate table for `year`
/// * `year` - The calculation year
/// * `owner` - The owner the calculation runs for
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::employee_result;
/// use contribution_engine::models::{CategoryRate, RateTable, SalaryRecord};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let table = RateTable {
///     city: "Foshan".to_string(),
///     year: 2025,
///     base_min: dec("2000"),
///     base_max: dec("30000"),
///     pension: CategoryRate::new(dec("0.14"), dec("0.08")),
///     medical: CategoryRate::default(),
///     unemployment: CategoryRate::default(),
///     injury: CategoryRate::default(),
///     maternity: CategoryRate::default(),
///     housing_fund: CategoryRate::default(),
/// };
/// let records = vec![
///     SalaryRecord::new("E1", "Li Lei", "2025-01", dec("5000")),
///     SalaryRecord::new("E1", "Li Lei", "2025-02", dec("6000")),
///     SalaryRecord::new("E1", "Li Lei", "2025-03", dec("7000")),
/// ];
///
/// let result = employee_result("E1", &records, &table, 2025, "user_1").unwrap();
/// assert_eq!(result.avg_salary, dec("6000"));
/// assert_eq!(result.amounts.pension_company, dec("840"));
/// assert_eq!(result.amounts.pension_employee, dec("480"));
/// ```
pub fn employee_result(
    employee_id: &str,
    records: &[SalaryRecord],
    rate_table: &RateTable,
    year: i32,
    owner: &str,
) -> EngineResult<ContributionResult> {
    let avg_salary = average_monthly_salary(records)?;
    let base = contribution_base(avg_salary, rate_table);
    let amounts = contributions(base, rate_table)?;
    let total_company = company_total(&amounts)?;
    let total_employee = employee_total(&amounts)?;
    let total_all = total_company
        .checked_add(total_employee)
        .ok_or_else(|| EngineError::calculation("grand total overflowed"))?;

    let employee_name = records
        .first()
        .and_then(|r| r.employee_name.as_deref())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Employee {}", employee_id));

    Ok(ContributionResult {
        employee_id: employee_id.to_string(),
        employee_name,
        owner: owner.to_string(),
        city: rate_table.city.clone(),
        year,
        avg_salary: round_to_cents(avg_salary),
        contribution_base: round_to_cents(base),
        amounts,
        total_company: round_to_cents(total_company),
        total_employee: round_to_cents(total_employee),
        total_all: round_to_cents(total_all),
        calculated_at: Utc::now(),
    })
}

/// Groups salary records by employee id, ordered by id.
pub fn group_by_employee(records: Vec<SalaryRecord>) -> BTreeMap<String, Vec<SalaryRecord>> {
    let mut groups: BTreeMap<String, Vec<SalaryRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.employee_id.clone())
            .or_default()
            .push(record);
    }
    groups
}

/// Counts the distinct employee ids across `records`.
pub fn distinct_employee_count(records: &[SalaryRecord]) -> usize {
    records
        .iter()
        .map(|r| r.employee_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
