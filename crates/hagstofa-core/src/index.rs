//! Local table index: lookup and accent-insensitive search.
//!
//! The index maps database ids to the tables they contain:
//!
//! ```json
//! {
//!   "Ibuar": {
//!     "MAN00000.px": {"text": "Mannfjöldi eftir kyni og aldri", "url": "https://…/MAN00000.px"}
//!   }
//! }
//! ```
//!
//! It is produced by crawling the catalog (see [`TableIndex::from_records`])
//! and used to turn a bare table id into its URL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{ChangeRecord, TableInfo, TableMatch};

/// File extension carried by every PX table id.
pub const TABLE_EXTENSION: &str = ".px";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TableIndex {
    databases: BTreeMap<String, BTreeMap<String, TableInfo>>,
}

impl TableIndex {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Build an index from crawl records, keeping only table entries.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ChangeRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            if !record.id.ends_with(TABLE_EXTENSION) {
                continue;
            }
            index.insert(
                &record.dbid,
                &record.id,
                TableInfo {
                    text: record.text.clone(),
                    url: record.entry_url(),
                },
            );
        }
        index
    }

    pub fn insert(&mut self, dbid: &str, table_id: &str, info: TableInfo) {
        self.databases
            .entry(dbid.to_string())
            .or_default()
            .insert(table_id.to_string(), info);
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Number of tables across all databases.
    pub fn len(&self) -> usize {
        self.databases.values().map(BTreeMap::len).sum()
    }

    pub fn databases(&self) -> Vec<&str> {
        self.databases.keys().map(String::as_str).collect()
    }

    pub fn contains_database(&self, dbid: &str) -> bool {
        self.databases.contains_key(dbid)
    }

    pub fn table_ids(&self) -> Vec<&str> {
        self.databases
            .values()
            .flat_map(|tables| tables.keys().map(String::as_str))
            .collect()
    }

    /// Look up a table by id, optionally within one database.
    ///
    /// The id may be given with or without its `.px` extension. Without a
    /// database, the first database (in id order) containing it wins.
    pub fn find(&self, table: &str, database: Option<&str>) -> Option<TableMatch> {
        let table_id = normalize_table_id(table);
        self.databases
            .iter()
            .filter(|(dbid, _)| database.map_or(true, |wanted| wanted == dbid.as_str()))
            .find_map(|(dbid, tables)| {
                tables.get(&table_id).map(|info| TableMatch {
                    dbid: dbid.clone(),
                    id: table_id.clone(),
                    text: info.text.clone(),
                    url: info.url.clone(),
                })
            })
    }

    /// Tables whose description contains `query`, ignoring case and accents.
    pub fn search(&self, query: &str) -> Vec<TableMatch> {
        let needle = normalize_text(query);
        let mut matches = Vec::new();
        for (dbid, tables) in &self.databases {
            for (id, info) in tables {
                if normalize_text(&info.text).contains(&needle) {
                    matches.push(TableMatch {
                        dbid: dbid.clone(),
                        id: id.clone(),
                        text: info.text.clone(),
                        url: info.url.clone(),
                    });
                }
            }
        }
        matches
    }
}

/// Append `.px` to a table id when missing.
pub fn normalize_table_id(table: &str) -> String {
    if table.ends_with(TABLE_EXTENSION) {
        table.to_string()
    } else {
        format!("{table}{TABLE_EXTENSION}")
    }
}

/// Lower-case, strip diacritics, and fold `ð` to `d`.
///
/// ```rust
/// use hagstofa_core::index::normalize_text;
///
/// assert_eq!(normalize_text("Mannfjöldi á Íslandi"), "mannfjoldi a islandi");
/// assert_eq!(normalize_text("Verðbólga"), "verdbolga");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'ð' => 'd',
            'Ð' => 'D',
            other => other,
        })
        .collect()
}
