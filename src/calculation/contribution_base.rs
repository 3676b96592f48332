//! Contribution base determination.

use rust_decimal::Decimal;

use crate::models::RateTable;

/// Clamps the average monthly salary to the table's `[base_min, base_max]`.
///
/// Computed as `max(base_min, min(avg, base_max))`, so values at either
/// bound pass through unchanged.
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::contribution_base;
/// use contribution_engine::models::{CategoryRate, RateTable};
/// use rust_decimal::Decimal;
///
/// let table = RateTable {
///     city: "Foshan".to_string(),
///     year: 2025,
///     base_min: Decimal::new(2000, 0),
///     base_max: Decimal::new(30000, 0),
///     pension: CategoryRate::default(),
///     medical: CategoryRate::default(),
///     unemployment: CategoryRate::default(),
///     injury: CategoryRate::default(),
///     maternity: CategoryRate::default(),
///     housing_fund: CategoryRate::default(),
/// };
/// assert_eq!(contribution_base(Decimal::new(1500, 0), &table), Decimal::new(2000, 0));
/// assert_eq!(contribution_base(Decimal::new(6000, 0), &table), Decimal::new(6000, 0));
/// assert_eq!(contribution_base(Decimal::new(50000, 0), &table), Decimal::new(30000, 0));
/// ```
pub fn contribution_base(avg_salary: Decimal, rate_table: &RateTable) -> Decimal {
    rate_table.base_min.max(avg_salary.min(rate_table.base_max))
}
