//! Per-category contribution amounts.
//!
//! This module applies a rate table to a contribution base. Each category is
//! rounded to cents on its own, and the totals are sums of those rounded
//! amounts. Summing first and rounding once can land a cent away from these
//! totals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};
use crate::models::{ContributionAmounts, RateTable};

/// Rounds an amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::round_to_cents;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_to_cents(Decimal::from_str("10.005").unwrap()), Decimal::from_str("10.01").unwrap());
/// assert_eq!(round_to_cents(Decimal::from_str("10.004").unwrap()), Decimal::from_str("10.00").unwrap());
/// ```
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the twelve contribution amounts for `base`.
///
/// Every company-side amount and the pension, medical, unemployment and
/// housing fund employee-side amounts are `round_to_cents(base * rate)`.
/// Injury and maternity employee-side amounts are zero whatever the table
/// says.
///
/// # Errors
///
/// Returns [`EngineError::Calculation`] when `base * rate` overflows.
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::contributions;
/// use contribution_engine::models::{CategoryRate, RateTable};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let table = RateTable {
///     city: "Foshan".to_string(),
///     year: 2025,
///     base_min: Decimal::ZERO,
///     base_max: Decimal::new(30000, 0),
///     pension: CategoryRate::company_only(Decimal::from_str("0.14").unwrap()),
///     medical: CategoryRate::default(),
///     unemployment: CategoryRate::default(),
///     injury: CategoryRate::default(),
///     maternity: CategoryRate::default(),
///     housing_fund: CategoryRate::default(),
/// };
/// let amounts = contributions(Decimal::new(10001, 0), &table).unwrap();
/// assert_eq!(amounts.pension_company, Decimal::from_str("1400.14").unwrap());
/// ```
pub fn contributions(base: Decimal, rate_table: &RateTable) -> EngineResult<ContributionAmounts> {
    let apply = |rate: Decimal| {
        base.checked_mul(rate)
            .map(round_to_cents)
            .ok_or_else(|| EngineError::calculation(format!("{} x {} overflowed", base, rate)))
    };

    Ok(ContributionAmounts {
        pension_company: apply(rate_table.pension.company)?,
        pension_employee: apply(rate_table.pension.employee)?,
        medical_company: apply(rate_table.medical.company)?,
        medical_employee: apply(rate_table.medical.employee)?,
        unemployment_company: apply(rate_table.unemployment.company)?,
        unemployment_employee: apply(rate_table.unemployment.employee)?,
        injury_company: apply(rate_table.injury.company)?,
        // Employer-only categories
        injury_employee: Decimal::ZERO,
        maternity_company: apply(rate_table.maternity.company)?,
        maternity_employee: Decimal::ZERO,
        housing_fund_company: apply(rate_table.housing_fund.company)?,
        housing_fund_employee: apply(rate_table.housing_fund.employee)?,
    })
}

/// Sums the six employer-side amounts.
pub fn company_total(amounts: &ContributionAmounts) -> EngineResult<Decimal> {
    checked_sum(&amounts.company_side(), "company total")
}

/// Sums the six employee-side amounts.
pub fn employee_total(amounts: &ContributionAmounts) -> EngineResult<Decimal> {
    checked_sum(&amounts.employee_side(), "employee total")
}

fn checked_sum(amounts: &[Decimal], what: &str) -> EngineResult<Decimal> {
    amounts.iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(*amount)
            .ok_or_else(|| EngineError::calculation(format!("{} overflowed", what)))
    })
}
