//! Core data models shared by the crawler, the flattener, and the CLI.
//!
//! These types represent catalog entries, the change records produced by a
//! crawl, and the dimensional value matrices decoded from JSON-stat
//! responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One entry of a catalog listing, as returned by the PX-Web API.
///
/// A listing is a JSON array of these objects. Only `id` and `text` are
/// always present; the remaining fields vary by catalog level.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    #[serde(default)]
    pub dbid: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// Structural role of a catalog entry, derived from its `type` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `type = "l"`: a sub-list, descended into by `id`.
    Branch,
    /// A `type` marker other than `"l"` (e.g. `"t"` for a table): not descended.
    Leaf,
    /// No `type` marker at all: a database root, descended into by `dbid`.
    Unspecified,
}

/// A catalog node whose `updated` timestamp is newer than the crawl cutoff.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChangeRecord {
    pub dbid: String,
    pub id: String,
    pub text: String,
    pub updated: NaiveDateTime,
    /// URL of the listing this entry was found in.
    pub source_url: String,
}

impl ChangeRecord {
    /// Full URL of the entry itself (`<listing>/<id>`).
    pub fn entry_url(&self) -> String {
        format!("{}/{}", self.source_url.trim_end_matches('/'), self.id)
    }
}

/// A named dimension and its ordered `(code, label)` categories.
///
/// Category order is significant: it defines the stride of this dimension
/// inside the flat value array.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSpec {
    pub name: String,
    pub categories: Vec<Category>,
}

/// A single category of a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub code: String,
    pub label: String,
}

impl DimensionSpec {
    pub fn new(name: impl Into<String>, categories: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            categories: categories
                .into_iter()
                .map(|(code, label)| Category { code, label })
                .collect(),
        }
    }

    /// Column name for this dimension's category codes.
    pub fn id_column(&self) -> String {
        format!("{}_id", self.name.to_lowercase())
    }

    /// Column name for this dimension's category labels.
    pub fn label_column(&self) -> String {
        format!("{}_label", self.name.to_lowercase())
    }
}

/// Ordered dimensions plus a flat, row-major array of values.
///
/// `values[i]` belongs to the i-th tuple of the cartesian product of all
/// dimensions' categories, with the last dimension varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMatrix {
    pub dimensions: Vec<DimensionSpec>,
    pub values: Vec<Option<f64>>,
}

impl ValueMatrix {
    /// Number of categories per dimension, in dimension order.
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.categories.len()).collect()
    }

    /// Output column names: `<dim>_id`, `<dim>_label` per dimension, then `value`.
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.dimensions.len() * 2 + 1);
        for dim in &self.dimensions {
            columns.push(dim.id_column());
            columns.push(dim.label_column());
        }
        columns.push("value".to_string());
        columns
    }
}

/// One output record of the flattener.
///
/// `categories[k]` is the category selected in dimension `k`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    pub categories: Vec<Category>,
    pub value: Option<f64>,
}

/// One table listed in the local table index.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TableInfo {
    pub text: String,
    pub url: String,
}

/// A table index search hit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableMatch {
    pub dbid: String,
    pub id: String,
    pub text: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names_are_lowercased() {
        let matrix = ValueMatrix {
            dimensions: vec![
                DimensionSpec::new("Ár", vec![("2020".into(), "2020".into())]),
                DimensionSpec::new("Kyn", vec![("0".into(), "Alls".into())]),
            ],
            values: vec![Some(1.0)],
        };
        assert_eq!(
            matrix.column_names(),
            vec!["ár_id", "ár_label", "kyn_id", "kyn_label", "value"]
        );
    }

    #[test]
    fn test_entry_url_joins_listing_and_id() {
        let record = ChangeRecord {
            dbid: "Efnahagur".into(),
            id: "THJ01000.px".into(),
            text: "Landsframleiðsla".into(),
            updated: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            source_url: "https://px.example/api/v1/is/Efnahagur/thjodhagsreikningar/".into(),
        };
        assert_eq!(
            record.entry_url(),
            "https://px.example/api/v1/is/Efnahagur/thjodhagsreikningar/THJ01000.px"
        );
    }

    #[test]
    fn test_catalog_entry_decodes_type_marker() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id":"A","text":"Alpha","type":"l"}"#).unwrap();
        assert_eq!(entry.kind.as_deref(), Some("l"));
        assert!(entry.dbid.is_none());
        assert!(entry.updated.is_none());
    }
}
