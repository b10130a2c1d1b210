//! Dimensional expansion of a [`ValueMatrix`] into flat rows.
//!
//! A JSON-stat dataset stores its observations as one flat array laid out
//! in row-major order over the dataset's dimensions: the last dimension
//! varies fastest. Expanding it means walking the cartesian product of all
//! category lists in exactly that order and pairing each tuple with the
//! value at the same position.
//!
//! All ordering knowledge lives in [`flat_index`] and [`coords_of`]. The
//! expansion itself and any caller that validates or addresses individual
//! cells go through them.
//!
//! # Example
//!
//! ```rust
//! use hagstofa_core::flatten::flatten;
//! use hagstofa_core::models::{DimensionSpec, ValueMatrix};
//!
//! let matrix = ValueMatrix {
//!     dimensions: vec![
//!         DimensionSpec::new("year", vec![("2020".into(), "2020".into()), ("2021".into(), "2021".into())]),
//!         DimensionSpec::new("region", vec![("A".into(), "Alpha".into()), ("B".into(), "Beta".into())]),
//!     ],
//!     values: vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
//! };
//! let rows = flatten(&matrix).unwrap();
//! assert_eq!(rows[1].categories[0].code, "2020");
//! assert_eq!(rows[1].categories[1].code, "B");
//! assert_eq!(rows[1].value, Some(2.0));
//! ```

use crate::error::DecodeError;
use crate::models::{FlatRow, ValueMatrix};

/// Product of all dimension sizes, or `None` on overflow.
///
/// An empty shape has product 1 (a single scalar cell).
pub fn dimension_product(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &size| acc.checked_mul(size))
}

/// Row-major flat position of `coords` within `shape`.
///
/// Returns `None` if the lengths differ or any coordinate is out of range.
pub fn flat_index(shape: &[usize], coords: &[usize]) -> Option<usize> {
    if shape.len() != coords.len() {
        return None;
    }
    let mut index = 0usize;
    for (&size, &coord) in shape.iter().zip(coords) {
        if coord >= size {
            return None;
        }
        index = index.checked_mul(size)?.checked_add(coord)?;
    }
    Some(index)
}

/// Inverse of [`flat_index`]: the coordinates of flat position `index`.
///
/// Returns `None` if `index` lies outside the shape.
pub fn coords_of(shape: &[usize], index: usize) -> Option<Vec<usize>> {
    let total = dimension_product(shape)?;
    if index >= total {
        return None;
    }
    let mut remaining = index;
    let mut coords = vec![0; shape.len()];
    for (slot, &size) in coords.iter_mut().zip(shape).rev() {
        *slot = remaining % size;
        remaining /= size;
    }
    Some(coords)
}

/// Number of cells in `shape`: one past the row-major position of its last cell.
fn cell_count(shape: &[usize]) -> Result<usize, DecodeError> {
    if shape.contains(&0) {
        return Ok(0);
    }
    let last: Vec<usize> = shape.iter().map(|&size| size - 1).collect();
    flat_index(shape, &last)
        .and_then(|index| index.checked_add(1))
        .ok_or_else(|| DecodeError::MalformedResponse("dimension sizes overflow usize".to_string()))
}

/// Check that `matrix.values` covers the dimensional product exactly.
pub fn validate(matrix: &ValueMatrix) -> Result<usize, DecodeError> {
    let expected = cell_count(&matrix.shape())?;
    if matrix.values.len() != expected {
        return Err(DecodeError::DimensionMismatch {
            expected,
            actual: matrix.values.len(),
        });
    }
    Ok(expected)
}

/// Expand a value matrix into one [`FlatRow`] per coordinate tuple.
///
/// Rows come out in the same order as `matrix.values`. Missing values stay
/// missing. Category order inside each dimension is taken as given.
///
/// # Errors
///
/// [`DecodeError::DimensionMismatch`] if the value count differs from the
/// product of category counts. No rows are returned in that case.
pub fn flatten(matrix: &ValueMatrix) -> Result<Vec<FlatRow>, DecodeError> {
    let total = validate(matrix)?;
    let shape = matrix.shape();

    let mut rows = Vec::with_capacity(total);
    for (index, value) in matrix.values.iter().enumerate() {
        let coords = coords_of(&shape, index).ok_or_else(|| {
            DecodeError::MalformedResponse(format!("index {index} outside dataset shape"))
        })?;
        let categories = matrix
            .dimensions
            .iter()
            .zip(&coords)
            .map(|(dim, &c)| dim.categories[c].clone())
            .collect();
        rows.push(FlatRow {
            categories,
            value: *value,
        });
    }
    Ok(rows)
}
