//! Reshaping of variable-length per-experiment sequences.
//!
//! Experiments on the same mouse rarely have the same number of trials. These
//! functions turn a collection of such sequences into either one flat vector
//! or one rectangular matrix padded with NaN.

use ndarray::Array2;

use crate::error::{Result, StroopmouseError};

/// Stack sequences as rows of a matrix as wide as the longest sequence.
///
/// Each row is left-aligned; cells past the end of a shorter sequence hold
/// `f64::NAN`. Fails with `EmptyInput` when there are no sequences, since the
/// width is undefined.
///
/// # Example
///
/// ```
/// use stroopmouse::reshape::to_ragged_matrix;
///
/// let m = to_ragged_matrix(&[vec![1.0, 2.0], vec![3.0]]).unwrap();
/// assert_eq!(m.dim(), (2, 2));
/// assert!(m[[1, 1]].is_nan());
/// ```
pub fn to_ragged_matrix<S: AsRef<[f64]>>(sequences: &[S]) -> Result<Array2<f64>> {
    let width = sequences
        .iter()
        .map(|s| s.as_ref().len())
        .max()
        .ok_or_else(|| StroopmouseError::EmptyInput("no sequences to stack".to_string()))?;

    let mut matrix = Array2::from_elem((sequences.len(), width), f64::NAN);
    for (mut row, sequence) in matrix.rows_mut().into_iter().zip(sequences) {
        for (cell, value) in row.iter_mut().zip(sequence.as_ref()) {
            *cell = *value;
        }
    }

    Ok(matrix)
}

/// Concatenate sequences in input order. No sequences yield an empty vector.
pub fn to_concatenated_vector<T: Clone, S: AsRef<[T]>>(sequences: &[S]) -> Vec<T> {
    let total = sequences.iter().map(|s| s.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for sequence in sequences {
        out.extend_from_slice(sequence.as_ref());
    }
    out
}
