//! Rate table model.
//!
//! A rate table holds the contribution-base bounds and the company and
//! employee rates a city publishes for one year.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The company-side and employee-side rate for one contribution category.
///
/// Rates are fractions, so `0.08` means 8%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryRate {
    /// The rate the employer contributes.
    pub company: Decimal,
    /// The rate the employee contributes.
    #[serde(default)]
    pub employee: Decimal,
}

impl CategoryRate {
    /// Creates a category rate from its two sides.
    pub fn new(company: Decimal, employee: Decimal) -> Self {
        Self { company, employee }
    }

    /// Creates a category rate that only the employer pays.
    pub fn company_only(company: Decimal) -> Self {
        Self {
            company,
            employee: Decimal::ZERO,
        }
    }
}

/// The per-(city, year) set of contribution bounds and rates.
///
/// Injury and maternity insurance carry an `employee` rate field because
/// stored tables sometimes fill it in, but the calculator never applies it.
///
/// # Example
///
/// ```
/// use contribution_engine::models::{CategoryRate, RateTable};
/// use rust_decimal::Decimal;
///
/// let table = RateTable {
///     city: "Foshan".to_string(),
///     year: 2025,
///     base_min: Decimal::new(1900, 0),
///     base_max: Decimal::new(26421, 0),
///     pension: CategoryRate::new(Decimal::new(14, 2), Decimal::new(8, 2)),
///     medical: CategoryRate::new(Decimal::new(55, 3), Decimal::new(2, 2)),
///     unemployment: CategoryRate::new(Decimal::new(8, 3), Decimal::new(2, 3)),
///     injury: CategoryRate::company_only(Decimal::new(2, 3)),
///     maternity: CategoryRate::company_only(Decimal::new(16, 3)),
///     housing_fund: CategoryRate::new(Decimal::new(12, 2), Decimal::new(12, 2)),
/// };
/// assert!(table.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    /// The city the table applies to.
    pub city: String,
    /// The calendar year the table applies to.
    pub year: i32,
    /// Lower clamp bound for the contribution base.
    pub base_min: Decimal,
    /// Upper clamp bound for the contribution base.
    pub base_max: Decimal,
    /// Pension insurance.
    pub pension: CategoryRate,
    /// Medical insurance.
    pub medical: CategoryRate,
    /// Unemployment insurance.
    pub unemployment: CategoryRate,
    /// Work injury insurance.
    pub injury: CategoryRate,
    /// Maternity insurance.
    pub maternity: CategoryRate,
    /// Housing provident fund.
    pub housing_fund: CategoryRate,
}

impl RateTable {
    /// Checks that the bounds are ordered and every rate lies in `[0, 1]`.
    pub fn validate(&self) -> EngineResult<()> {
        if self.base_min < Decimal::ZERO {
            return Err(self.invalid("base_min must not be negative".to_string()));
        }
        if self.base_min > self.base_max {
            return Err(self.invalid(format!(
                "base_min {} exceeds base_max {}",
                self.base_min, self.base_max
            )));
        }

        for (name, rate) in self.categories() {
            for (side, value) in [("company", rate.company), ("employee", rate.employee)] {
                if value < Decimal::ZERO || value > Decimal::ONE {
                    return Err(self.invalid(format!(
                        "{}.{} rate {} is outside [0, 1]",
                        name, side, value
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns the six categories paired with their names.
    pub fn categories(&self) -> [(&'static str, &CategoryRate); 6] {
        [
            ("pension", &self.pension),
            ("medical", &self.medical),
            ("unemployment", &self.unemployment),
            ("injury", &self.injury),
            ("maternity", &self.maternity),
            ("housing_fund", &self.housing_fund),
        ]
    }

    fn invalid(&self, message: String) -> EngineError {
        EngineError::InvalidRateTable {
            city: self.city.clone(),
            year: self.year,
            message,
        }
    }
}
