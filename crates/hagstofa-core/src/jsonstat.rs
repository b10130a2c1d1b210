//! JSON-stat 2.0 dataset decoding.
//!
//! Converts the body of a PX-Web bulk query (`"response": {"format": "json-stat2"}`)
//! into a [`ValueMatrix`] ready for [`flatten`](crate::flatten::flatten).
//!
//! Only the parts of the format needed to place values are read:
//!
//! | Field | Use |
//! |-------|-----|
//! | `id` | ordered dimension names |
//! | `size` | optional; cross-checked against category counts |
//! | `dimension.<name>.category.index` | category order (object `code → ordinal` or array of codes) |
//! | `dimension.<name>.category.label` | category labels (`code → text`) |
//! | `value` | dense array or sparse object `"position" → value` |
//!
//! Category order always comes from `index` ordinals, never from the
//! iteration order of the JSON object, so decoding does not depend on how
//! the parser orders object keys.

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::flatten::{dimension_product, validate};
use crate::models::{DimensionSpec, ValueMatrix};

/// Decode a JSON-stat 2.0 dataset into a validated [`ValueMatrix`].
///
/// # Errors
///
/// - [`DecodeError::MalformedResponse`] for shape problems (missing `id`,
///   bad `index`, non-numeric values, `size` disagreeing with categories,
///   sparse `value` keys outside the dataset).
/// - [`DecodeError::MissingDimension`] when `id` names an undescribed dimension.
/// - [`DecodeError::DimensionMismatch`] when the value count is wrong.
pub fn decode_dataset(body: &Value) -> Result<ValueMatrix, DecodeError> {
    let ids = body
        .get("id")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("dataset has no 'id' array"))?;
    let dimension_meta = body
        .get("dimension")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("dataset has no 'dimension' object"))?;

    let mut dimensions = Vec::with_capacity(ids.len());
    for id in ids {
        let name = id
            .as_str()
            .ok_or_else(|| malformed("dimension id is not a string"))?;
        let meta = dimension_meta
            .get(name)
            .ok_or_else(|| DecodeError::MissingDimension(name.to_string()))?;
        dimensions.push(decode_dimension(name, meta)?);
    }

    if let Some(size) = body.get("size").and_then(Value::as_array) {
        let declared: Vec<usize> = size
            .iter()
            .map(|s| s.as_u64().map(|n| n as usize))
            .collect::<Option<_>>()
            .ok_or_else(|| malformed("'size' contains a non-integer"))?;
        let actual: Vec<usize> = dimensions.iter().map(|d| d.categories.len()).collect();
        if declared != actual {
            return Err(malformed(&format!(
                "'size' {declared:?} disagrees with category counts {actual:?}"
            )));
        }
    }

    let shape: Vec<usize> = dimensions.iter().map(|d| d.categories.len()).collect();
    let total =
        dimension_product(&shape).ok_or_else(|| malformed("dimension sizes overflow usize"))?;

    let values = match body.get("value") {
        Some(Value::Array(items)) => items
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::Object(sparse)) => decode_sparse_values(sparse, total)?,
        _ => return Err(malformed("dataset has no 'value' array")),
    };

    let matrix = ValueMatrix { dimensions, values };
    validate(&matrix)?;
    Ok(matrix)
}

fn decode_dimension(name: &str, meta: &Value) -> Result<DimensionSpec, DecodeError> {
    let category = meta
        .get("category")
        .ok_or_else(|| malformed(&format!("dimension '{name}' has no category")))?;
    let labels = category.get("label").and_then(Value::as_object);

    let codes: Vec<String> = match category.get("index") {
        Some(Value::Array(codes)) => codes
            .iter()
            .map(|c| c.as_str().map(str::to_string))
            .collect::<Option<_>>()
            .ok_or_else(|| malformed(&format!("dimension '{name}' index has a non-string code")))?,
        Some(Value::Object(ordinals)) => order_by_ordinal(name, ordinals)?,
        // A single-category dimension may omit `index`.
        None => match labels {
            Some(l) if l.len() == 1 => l.keys().cloned().collect(),
            _ => {
                return Err(malformed(&format!(
                    "dimension '{name}' has no category index"
                )))
            }
        },
        Some(_) => return Err(malformed(&format!("dimension '{name}' index is not a list or map"))),
    };

    let categories = codes
        .into_iter()
        .map(|code| {
            let label = labels
                .and_then(|l| l.get(&code))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| code.clone());
            (code, label)
        })
        .collect();

    Ok(DimensionSpec::new(name, categories))
}

/// Sort `code → ordinal` pairs by ordinal, requiring ordinals `0..n`.
fn order_by_ordinal(name: &str, ordinals: &Map<String, Value>) -> Result<Vec<String>, DecodeError> {
    let mut slots: Vec<Option<String>> = vec![None; ordinals.len()];
    for (code, ordinal) in ordinals {
        let position = ordinal
            .as_u64()
            .map(|n| n as usize)
            .filter(|&n| n < slots.len())
            .ok_or_else(|| {
                malformed(&format!("dimension '{name}' has bad ordinal for '{code}'"))
            })?;
        if slots[position].replace(code.clone()).is_some() {
            return Err(malformed(&format!(
                "dimension '{name}' repeats ordinal {position}"
            )));
        }
    }
    // With n distinct ordinals all below n, every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

fn decode_value(value: &Value) -> Result<Option<f64>, DecodeError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        // PX status symbols such as ".." mark suppressed cells.
        Value::String(s) => Ok(s.trim().parse::<f64>().ok()),
        other => Err(malformed(&format!("unsupported value {other}"))),
    }
}

fn decode_sparse_values(
    sparse: &Map<String, Value>,
    total: usize,
) -> Result<Vec<Option<f64>>, DecodeError> {
    let mut values = vec![None; total];
    for (key, value) in sparse {
        let position: usize = key
            .parse()
            .map_err(|_| malformed(&format!("sparse value key '{key}' is not an index")))?;
        let slot = values.get_mut(position).ok_or_else(|| {
            malformed(&format!(
                "sparse value key {position} is outside the {total} cells of the dataset"
            ))
        })?;
        *slot = decode_value(value)?;
    }
    Ok(values)
}

fn malformed(message: &str) -> DecodeError {
    DecodeError::MalformedResponse(message.to_string())
}
