//! Request types for the Contribution Engine API.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::orchestrator::CreateTaskParams;

/// Request body for `POST /calculate/batch`.
///
/// Every field is optional: the city falls back to the configured default
/// and the year to the current calendar year.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchCalculateRequest {
    /// The city whose rate table applies.
    pub city: Option<String>,
    /// The calculation year, as a number or a numeric string.
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    /// The upload the salary data came from.
    pub upload_ref: Option<String>,
}

impl From<BatchCalculateRequest> for CreateTaskParams {
    fn from(req: BatchCalculateRequest) -> Self {
        CreateTaskParams {
            city: req.city,
            year: req.year,
            upload_ref: req.upload_ref,
        }
    }
}

/// Accepts `2025` and `"2025"`; any other string is a data error.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i32),
        Text(String),
    }

    match Option::<RawYear>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawYear::Number(year)) => Ok(Some(year)),
        Some(RawYear::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("year must be a number, got {:?}", text))),
    }
}

/// Query string for `GET /calculate/tasks`.
///
/// Values are kept as raw strings so out-of-range and unparsable input
/// get the same dedicated error codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Optional status filter.
    pub status: Option<String>,
    /// Page size, 1 to 100.
    pub limit: Option<String>,
    /// Number of tasks to skip.
    pub offset: Option<String>,
}
