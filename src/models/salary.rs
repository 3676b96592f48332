//! Salary record model.
//!
//! Salary records arrive from spreadsheet imports, so the amount may be a
//! proper number or whatever text the cell held. [`SalaryAmount`] keeps the
//! raw form and coerces it on demand.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A salary amount in its raw imported form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SalaryAmount {
    /// A numeric amount.
    Numeric(Decimal),
    /// Raw text that could not be read as a number on import.
    Text(String),
}

impl SalaryAmount {
    /// Coerces the amount to a decimal.
    ///
    /// Text is read by its leading numeric prefix, so `"5000 CNY"` yields
    /// `5000`. Text with no numeric prefix yields zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use contribution_engine::models::SalaryAmount;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(SalaryAmount::Text("6000.5".into()).to_decimal(), Decimal::new(60005, 1));
    /// assert_eq!(SalaryAmount::Text("n/a".into()).to_decimal(), Decimal::ZERO);
    /// ```
    pub fn to_decimal(&self) -> Decimal {
        match self {
            SalaryAmount::Numeric(value) => *value,
            SalaryAmount::Text(text) => parse_leading_decimal(text).unwrap_or(Decimal::ZERO),
        }
    }
}

impl From<Decimal> for SalaryAmount {
    fn from(value: Decimal) -> Self {
        SalaryAmount::Numeric(value)
    }
}

/// Parses the longest `[+-]digits[.digits]` prefix of `text`.
fn parse_leading_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let integer_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let integer = &trimmed[integer_start..pos];

    let mut fraction = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let fraction_start = pos + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        fraction = &trimmed[fraction_start..fraction_end];
    }

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut candidate = String::with_capacity(integer.len() + fraction.len() + 3);
    if negative {
        candidate.push('-');
    }
    candidate.push_str(if integer.is_empty() { "0" } else { integer });
    if !fraction.is_empty() {
        candidate.push('.');
        candidate.push_str(fraction);
    }

    Decimal::from_str(&candidate).ok()
}

/// One month of salary for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// The employee's identifier (staff number).
    pub employee_id: String,
    /// The employee's display name. May be empty in imported data.
    #[serde(default)]
    pub employee_name: Option<String>,
    /// The salary month in `YYYY-MM` form.
    pub month: String,
    /// The salary amount for the month.
    pub amount: SalaryAmount,
    /// Optional department.
    #[serde(default)]
    pub department: Option<String>,
    /// Optional job position.
    #[serde(default)]
    pub position: Option<String>,
}

impl SalaryRecord {
    /// Creates a record with a numeric amount and no department or position.
    pub fn new(
        employee_id: impl Into<String>,
        employee_name: impl Into<String>,
        month: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            employee_name: Some(employee_name.into()),
            month: month.into(),
            amount: SalaryAmount::Numeric(amount),
            department: None,
            position: None,
        }
    }

    /// Returns the year part of `month`, if it parses.
    pub fn year(&self) -> Option<i32> {
        self.month.split('-').next()?.trim().parse().ok()
    }
}
