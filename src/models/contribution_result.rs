//! Contribution result models.
//!
//! This module contains the [`ContributionResult`] type, one employee's
//! contribution breakdown for a year, and [`ContributionAmounts`], the twelve
//! per-category amounts it is built from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The twelve per-category contribution amounts for one employee.
///
/// Every amount is already rounded to cents. Injury and maternity insurance
/// are employer-only, so their employee fields are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContributionAmounts {
    /// Pension insurance, employer share.
    pub pension_company: Decimal,
    /// Pension insurance, employee share.
    pub pension_employee: Decimal,
    /// Medical insurance, employer share.
    pub medical_company: Decimal,
    /// Medical insurance, employee share.
    pub medical_employee: Decimal,
    /// Unemployment insurance, employer share.
    pub unemployment_company: Decimal,
    /// Unemployment insurance, employee share.
    pub unemployment_employee: Decimal,
    /// Work injury insurance, employer share.
    pub injury_company: Decimal,
    /// Work injury insurance, employee share. Always zero.
    pub injury_employee: Decimal,
    /// Maternity insurance, employer share.
    pub maternity_company: Decimal,
    /// Maternity insurance, employee share. Always zero.
    pub maternity_employee: Decimal,
    /// Housing provident fund, employer share.
    pub housing_fund_company: Decimal,
    /// Housing provident fund, employee share.
    pub housing_fund_employee: Decimal,
}

impl ContributionAmounts {
    /// Returns the six employer-side amounts.
    pub fn company_side(&self) -> [Decimal; 6] {
        [
            self.pension_company,
            self.medical_company,
            self.unemployment_company,
            self.injury_company,
            self.maternity_company,
            self.housing_fund_company,
        ]
    }

    /// Returns the six employee-side amounts.
    pub fn employee_side(&self) -> [Decimal; 6] {
        [
            self.pension_employee,
            self.medical_employee,
            self.unemployment_employee,
            self.injury_employee,
            self.maternity_employee,
            self.housing_fund_employee,
        ]
    }
}

/// One employee's contribution breakdown for one (owner, year).
///
/// # Example
///
/// ```
/// use contribution_engine::models::{ContributionAmounts, ContributionResult};
/// use chrono::Utc;
/// use rust_decimal::Decimal;
///
/// let result = ContributionResult {
///     employee_id: "E1".to_string(),
///     employee_name: "Li Lei".to_string(),
///     owner: "user_1".to_string(),
///     city: "Foshan".to_string(),
///     year: 2025,
///     avg_salary: Decimal::new(6000, 0),
///     contribution_base: Decimal::new(6000, 0),
///     amounts: ContributionAmounts::default(),
///     total_company: Decimal::ZERO,
///     total_employee: Decimal::ZERO,
///     total_all: Decimal::ZERO,
///     calculated_at: Utc::now(),
/// };
/// assert!(result.totals_consistent());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionResult {
    /// The employee's identifier.
    pub employee_id: String,
    /// The employee's display name.
    pub employee_name: String,
    /// The owner the calculation was run for.
    pub owner: String,
    /// The city whose rate table was applied.
    pub city: String,
    /// The calculation year.
    pub year: i32,
    /// Mean monthly salary over the year's records, rounded to cents.
    pub avg_salary: Decimal,
    /// The average salary clamped to the table's bounds, rounded to cents.
    pub contribution_base: Decimal,
    /// The per-category amounts.
    #[serde(flatten)]
    pub amounts: ContributionAmounts,
    /// Sum of the employer-side amounts.
    pub total_company: Decimal,
    /// Sum of the employee-side amounts.
    pub total_employee: Decimal,
    /// `total_company + total_employee`.
    pub total_all: Decimal,
    /// When the result was computed.
    pub calculated_at: DateTime<Utc>,
}

impl ContributionResult {
    /// Returns true when `total_all` equals the sum of both sides.
    pub fn totals_consistent(&self) -> bool {
        self.total_company + self.total_employee == self.total_all
    }
}
