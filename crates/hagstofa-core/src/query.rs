//! PX-Web bulk query construction.
//!
//! A table URL answers `GET` with its metadata and `POST` with data. To
//! fetch a whole table, the POST body selects every value of every
//! variable listed in the metadata:
//!
//! ```json
//! {
//!   "query": [
//!     {"code": "Ár", "selection": {"filter": "all", "values": ["*"]}}
//!   ],
//!   "response": {"format": "json-stat2"}
//! }
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::error::DecodeError;

/// Response format requested from the API.
pub const RESPONSE_FORMAT: &str = "json-stat2";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueryPayload {
    pub query: Vec<VariableQuery>,
    pub response: ResponseFormat,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VariableQuery {
    pub code: String,
    pub selection: Selection,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Selection {
    pub filter: String,
    pub values: Vec<String>,
}

impl Selection {
    /// Wildcard selection: every value of the variable.
    pub fn all() -> Self {
        Self {
            filter: "all".to_string(),
            values: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResponseFormat {
    pub format: String,
}

/// Variable codes listed in a table's metadata (`variables[].code`).
///
/// # Errors
///
/// [`DecodeError::MalformedResponse`] if `variables` is missing or an
/// entry has no string `code`.
pub fn variable_codes(metadata: &Value) -> Result<Vec<String>, DecodeError> {
    let variables = metadata
        .get("variables")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DecodeError::MalformedResponse("table metadata has no 'variables' list".to_string())
        })?;
    variables
        .iter()
        .map(|var| {
            var.get("code")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    DecodeError::MalformedResponse("table variable has no 'code'".to_string())
                })
        })
        .collect()
}

/// Build the select-everything query for a table's metadata.
pub fn full_table_query(metadata: &Value) -> Result<QueryPayload, DecodeError> {
    let query = variable_codes(metadata)?
        .into_iter()
        .map(|code| VariableQuery {
            code,
            selection: Selection::all(),
        })
        .collect();
    Ok(QueryPayload {
        query,
        response: ResponseFormat {
            format: RESPONSE_FORMAT.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_table_query_selects_every_variable() {
        let metadata = json!({
            "title": "Mannfjöldi",
            "variables": [
                {"code": "Ár", "text": "Ár", "values": ["2020"], "valueTexts": ["2020"]},
                {"code": "Kyn", "text": "Kyn", "values": ["0", "1"], "valueTexts": ["Alls", "Karlar"]}
            ]
        });
        let payload = full_table_query(&metadata).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "query": [
                    {"code": "Ár", "selection": {"filter": "all", "values": ["*"]}},
                    {"code": "Kyn", "selection": {"filter": "all", "values": ["*"]}}
                ],
                "response": {"format": "json-stat2"}
            })
        );
    }

    #[test]
    fn test_metadata_without_variables_is_malformed() {
        assert!(full_table_query(&json!({"title": "x"})).is_err());
        assert!(full_table_query(&json!({"variables": [{"text": "no code"}]})).is_err());
    }
}
