//! Wire shapes wrapping the resources returned by the REST and Tooling APIs.

use super::resource::{FieldDescribe, SObjectSummary};
use serde::Deserialize;

/// One page of a SOQL query result.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryPage<T> {
    #[serde(default)]
    pub total_size: usize,
    pub done: bool,
    pub records: Vec<T>,
    pub next_records_url: Option<String>,
}

/// Element of the error array the API returns on failure.
///
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorItem {
    pub message: String,
    #[serde(default)]
    pub error_code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescribeGlobal {
    pub sobjects: Vec<SObjectSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SObjectDescribe {
    pub fields: Vec<FieldDescribe>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateResponse {
    pub id: Option<String>,
    pub success: bool,
}

/// Render an API error body as one line, falling back to the raw text.
///
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<Vec<ApiErrorItem>>(body) {
        Ok(items) if !items.is_empty() => items
            .iter()
            .map(|i| format!("{}: {}", i.error_code, i.message))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_string(),
    }
}
