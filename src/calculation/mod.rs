//! Calculation logic for the Contribution Engine.
//!
//! This module contains the pure contribution rules: the average monthly
//! salary, the clamped contribution base, the per-category amounts and
//! their totals, the full per-employee result, and the progress figures
//! reported for calculation tasks. Nothing here performs I/O.

mod average_salary;
mod contribution_base;
mod contributions;
mod employee_result;
mod progress;

pub use average_salary::average_monthly_salary;
pub use contribution_base::contribution_base;
pub use contributions::{company_total, contributions, employee_total, round_to_cents};
pub use employee_result::{distinct_employee_count, employee_result, group_by_employee};
pub use progress::{progress, status_message};
