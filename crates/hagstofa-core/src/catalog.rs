//! Catalog listing decoding and traversal rules.
//!
//! The PX-Web catalog is a tree addressed by URL composition: every listing
//! is a JSON array of [`CatalogEntry`] objects, and children of an entry
//! live at `<listing-url>/<segment>`. This module holds the pure rules the
//! crawler applies to each listing:
//!
//! - [`decode_listing`]: turn a response body into entries.
//! - [`node_kind`] / [`child_url`]: decide whether and where to descend.
//! - [`resolve_dbid`]: pick the database id stamped on emitted records.
//! - [`parse_timestamp`] / [`change_record`]: apply the cutoff filter.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::DecodeError;
use crate::models::{CatalogEntry, ChangeRecord, NodeKind};

/// `type` marker of a sub-list entry.
pub const BRANCH_MARKER: &str = "l";

/// Index of the path segment holding the database id, counting the empty
/// segment before the leading `/` (`/pxis/api/v1/is/<dbid>/...`).
pub const DBID_PATH_SEGMENT: usize = 5;

/// A decoded catalog listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<CatalogEntry>,
    /// Array items that were not decodable entries and were dropped.
    pub rejected: usize,
}

/// Decode a listing body.
///
/// An empty array is a valid, empty listing.
///
/// # Errors
///
/// [`DecodeError::MalformedResponse`] if the body is not a JSON array.
pub fn decode_listing(body: &Value) -> Result<Listing, DecodeError> {
    let items = body.as_array().ok_or_else(|| {
        DecodeError::MalformedResponse(format!("expected a list, got {}", json_kind(body)))
    })?;

    let mut listing = Listing::default();
    for item in items {
        match serde_json::from_value::<CatalogEntry>(item.clone()) {
            Ok(entry) => listing.entries.push(entry),
            Err(_) => listing.rejected += 1,
        }
    }
    Ok(listing)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Classify an entry by its `type` marker.
pub fn node_kind(entry: &CatalogEntry) -> NodeKind {
    match entry.kind.as_deref() {
        None => NodeKind::Unspecified,
        Some(BRANCH_MARKER) => NodeKind::Branch,
        Some(_) => NodeKind::Leaf,
    }
}

/// URL to descend into for `entry`, if any.
///
/// Branches descend by `id`, unmarked entries by `dbid`. Leaves, and
/// unmarked entries without a `dbid`, are not descended.
pub fn child_url(listing_url: &str, entry: &CatalogEntry) -> Option<String> {
    let segment = match node_kind(entry) {
        NodeKind::Branch => entry.id.as_str(),
        NodeKind::Unspecified => entry.dbid.as_deref()?,
        NodeKind::Leaf => return None,
    };
    Some(join_url(listing_url, segment))
}

/// Join a listing URL and a child segment with exactly one `/`.
pub fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

/// How the `dbid` of a listing's records was determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbidResolution {
    /// Taken from the first entry's `dbid` field.
    Explicit(String),
    /// Recovered from the listing URL's path.
    UrlSegment(String),
    /// Neither source had a value.
    Unresolved,
}

impl DbidResolution {
    /// The resolved id, or `""` when unresolved.
    pub fn as_str(&self) -> &str {
        match self {
            DbidResolution::Explicit(s) | DbidResolution::UrlSegment(s) => s,
            DbidResolution::Unresolved => "",
        }
    }
}

/// Resolve the `dbid` for all records of one listing.
///
/// The first entry's explicit `dbid` wins; otherwise the id is recovered
/// positionally from the URL via [`dbid_from_url`].
pub fn resolve_dbid(listing_url: &str, entries: &[CatalogEntry]) -> DbidResolution {
    if let Some(dbid) = entries.first().and_then(|e| e.dbid.clone()) {
        return DbidResolution::Explicit(dbid);
    }
    match dbid_from_url(listing_url) {
        Some(dbid) => DbidResolution::UrlSegment(dbid),
        None => DbidResolution::Unresolved,
    }
}

/// Path segment [`DBID_PATH_SEGMENT`] of `url`, with scheme and host removed.
///
/// ```rust
/// use hagstofa_core::catalog::dbid_from_url;
///
/// let url = "https://px.hagstofa.is/pxis/api/v1/is/Efnahagur/visitolur";
/// assert_eq!(dbid_from_url(url).as_deref(), Some("Efnahagur"));
/// ```
pub fn dbid_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("", |slash| &without_scheme[slash..]);
    path.split('/')
        .nth(DBID_PATH_SEGMENT)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a catalog `updated` value.
///
/// Accepts RFC 3339 (converted to UTC), ISO date-times with `T` or a space
/// and optional fractional seconds, and plain dates (midnight). Anything
/// else, including the empty string, yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Build a [`ChangeRecord`] for `entry` if it was updated strictly after `cutoff`.
///
/// Entries with no parseable `updated` value never pass.
pub fn change_record(
    entry: &CatalogEntry,
    dbid: &str,
    listing_url: &str,
    cutoff: NaiveDateTime,
) -> Option<ChangeRecord> {
    let updated = entry.updated.as_deref().and_then(parse_timestamp)?;
    if updated <= cutoff {
        return None;
    }
    Some(ChangeRecord {
        dbid: dbid.to_string(),
        id: entry.id.clone(),
        text: entry.text.clone(),
        updated,
        source_url: listing_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, kind: Option<&str>, dbid: Option<&str>, updated: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            dbid: dbid.map(str::to_string),
            id: id.to_string(),
            text: format!("text {id}"),
            kind: kind.map(str::to_string),
            updated: updated.map(str::to_string),
        }
    }

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn test_decode_listing_rejects_non_list() {
        assert!(matches!(
            decode_listing(&json!({"error": "nope"})),
            Err(DecodeError::MalformedResponse(_))
        ));
        assert!(decode_listing(&Value::Null).is_err());
    }

    #[test]
    fn test_decode_listing_empty_is_ok() {
        let listing = decode_listing(&json!([])).unwrap();
        assert!(listing.entries.is_empty());
        assert_eq!(listing.rejected, 0);
    }

    #[test]
    fn test_decode_listing_drops_bad_items() {
        let listing = decode_listing(&json!([
            {"id": "a", "text": "A", "type": "l"},
            42,
            {"id": "b", "text": "B", "type": "t", "updated": "2024-01-01T00:00:00"}
        ]))
        .unwrap();
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.rejected, 1);
    }

    #[test]
    fn test_child_url_by_kind() {
        let base = "https://px.example/api/v1/is/DB";
        assert_eq!(
            child_url(base, &entry("sub", Some("l"), None, None)).as_deref(),
            Some("https://px.example/api/v1/is/DB/sub")
        );
        assert_eq!(
            child_url(base, &entry("x", None, Some("DB2"), None)).as_deref(),
            Some("https://px.example/api/v1/is/DB/DB2")
        );
        assert_eq!(child_url(base, &entry("T1.px", Some("t"), None, None)), None);
        assert_eq!(child_url(base, &entry("x", None, None, None)), None);
    }

    #[test]
    fn test_join_url_trailing_slash() {
        assert_eq!(join_url("https://a/b/", "c"), "https://a/b/c");
        assert_eq!(join_url("https://a/b", "c"), "https://a/b/c");
    }

    #[test]
    fn test_resolve_dbid_prefers_explicit_field() {
        let entries = vec![entry("a", None, Some("Ibuar"), None)];
        assert_eq!(
            resolve_dbid("https://px.example/pxis/api/v1/is/Efnahagur", &entries),
            DbidResolution::Explicit("Ibuar".to_string())
        );
    }

    #[test]
    fn test_resolve_dbid_falls_back_to_url_segment() {
        let entries = vec![entry("a", Some("l"), None, None)];
        let resolution =
            resolve_dbid("https://px.example/pxis/api/v1/is/Efnahagur/visitolur", &entries);
        assert_eq!(resolution, DbidResolution::UrlSegment("Efnahagur".to_string()));
        assert_eq!(resolution.as_str(), "Efnahagur");
    }

    #[test]
    fn test_resolve_dbid_unresolved_for_short_paths() {
        let resolution = resolve_dbid("http://localhost:8080/is/DB", &[]);
        assert_eq!(resolution, DbidResolution::Unresolved);
        assert_eq!(resolution.as_str(), "");
    }

    #[test]
    fn test_dbid_from_url_ignores_host_port() {
        assert_eq!(
            dbid_from_url("http://127.0.0.1:9999/pxis/api/v1/is/Samfelag/x/y").as_deref(),
            Some("Samfelag")
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 10, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2023-10-05T09:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-10-05 09:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-10-05T09:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-10-05T09:00"), Some(expected));
        assert!(parse_timestamp("2023-10-05T09:00:00.123").is_some());
        assert_eq!(
            parse_timestamp("2023-10-05"),
            NaiveDate::from_ymd_opt(2023, 10, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_change_record_is_strictly_after_cutoff() {
        let cutoff = ts("2024-01-01T00:00:00");
        let at = entry("T1.px", Some("t"), None, Some("2024-01-01T00:00:00"));
        let after = entry("T2.px", Some("t"), None, Some("2024-01-01T00:00:01"));
        let none = entry("T3.px", Some("t"), None, None);
        let junk = entry("T4.px", Some("t"), None, Some("n/a"));

        assert!(change_record(&at, "DB", "u", cutoff).is_none());
        assert!(change_record(&none, "DB", "u", cutoff).is_none());
        assert!(change_record(&junk, "DB", "u", cutoff).is_none());

        let record = change_record(&after, "DB", "u", cutoff).unwrap();
        assert_eq!(record.id, "T2.px");
        assert_eq!(record.dbid, "DB");
        assert_eq!(record.source_url, "u");
        assert!(record.updated > cutoff);
    }
}
