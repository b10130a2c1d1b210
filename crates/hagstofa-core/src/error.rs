//! Decoding errors for catalog listings and JSON-stat datasets.

use thiserror::Error;

/// Errors raised while decoding a response into core models.
///
/// [`DecodeError::DimensionMismatch`] is never recoverable: a value array
/// whose length disagrees with the dimensional product cannot be aligned
/// to coordinates, and no rows are produced for it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The response did not have the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The dataset names a dimension in `id` with no entry under `dimension`.
    #[error("dimension '{0}' listed in id but missing from dimension metadata")]
    MissingDimension(String),

    /// `values.len()` differs from the product of category counts.
    #[error("value count {actual} does not match dimensional product {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
