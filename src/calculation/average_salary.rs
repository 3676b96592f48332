//! Average monthly salary calculation.
//!
//! This module provides the function that turns one employee's salary
//! records for a year into the mean monthly salary the contribution base is
//! derived from.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::SalaryRecord;

/// Returns the arithmetic mean of the records' amounts.
///
/// Amounts are coerced with [`SalaryAmount::to_decimal`], so unparsable raw
/// values count as zero but still count towards the number of months. An
/// empty slice yields zero.
///
/// The mean is not rounded; callers round when they report it.
///
/// # Errors
///
/// Returns [`EngineError::Calculation`] when the salary total exceeds what a
/// `Decimal` can hold.
///
/// [`SalaryAmount::to_decimal`]: crate::models::SalaryAmount::to_decimal
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::average_monthly_salary;
/// use contribution_engine::models::SalaryRecord;
/// use rust_decimal::Decimal;
///
/// let records = vec![
///     SalaryRecord::new("E1", "Li Lei", "2025-01", Decimal::new(5000, 0)),
///     SalaryRecord::new("E1", "Li Lei", "2025-02", Decimal::new(6000, 0)),
///     SalaryRecord::new("E1", "Li Lei", "2025-03", Decimal::new(7000, 0)),
/// ];
/// assert_eq!(average_monthly_salary(&records).unwrap(), Decimal::new(6000, 0));
/// assert_eq!(average_monthly_salary(&[]).unwrap(), Decimal::ZERO);
/// ```
pub fn average_monthly_salary(records: &[SalaryRecord]) -> EngineResult<Decimal> {
    if records.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let overflow = || EngineError::calculation("salary total overflowed");

    let total = records.iter().try_fold(Decimal::ZERO, |total, r| {
        total.checked_add(r.amount.to_decimal()).ok_or_else(overflow)
    })?;
    total
        .checked_div(Decimal::from(records.len()))
        .ok_or_else(overflow)
}
