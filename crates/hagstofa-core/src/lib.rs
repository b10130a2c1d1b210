//! # Hagstofa Core
//!
//! Pure logic for the Hagstofa PX catalog client: catalog listing
//! decoding and traversal rules, JSON-stat decoding, dimensional
//! flattening, bulk query construction, and the local table index.
//!
//! This crate performs no I/O and depends on no async runtime. The HTTP
//! crawler and the CLI live in the `hagstofa` crate.

pub mod catalog;
pub mod error;
pub mod flatten;
pub mod index;
pub mod jsonstat;
pub mod models;
pub mod query;
