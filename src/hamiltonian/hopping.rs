//! Single-spin hopping matrices.
//!
//! For one spin species the kinetic term `Σ_{i≠j} h_ij c†_i c_j` only connects
//! states with the same particle number, so it is stored as a sparse
//! `dσ x dσ` matrix over the sorted single-spin basis.

use faer::sparse::{SparseColMat, Triplet};
use rayon::prelude::*;

use crate::{
    error::{EdError, EdErrorKind},
    fock::{FockState, binsearch},
    operators::{annihilate, create, is_empty, is_occupied},
};

/// Builds the hopping matrix of `h` (diagonal ignored) over the sorted basis `states`.
///
/// Entry `(row, col)` is `h_ij * sign` for `states[row] = c†_i c_j states[col]`.
pub fn build_hopping(
    h: &faer::Mat<f64>,
    states: &[FockState],
) -> Result<SparseColMat<usize, f64>, EdError> {
    let n = h.nrows();
    let columns = states
        .par_iter()
        .enumerate()
        .map(|(col, &s)| {
            let mut entries = Vec::new();
            for j in (0..n).filter(|&j| is_occupied(s, j)) {
                for i in (0..n).filter(|&i| i != j && is_empty(s, i)) {
                    let t = h[(i, j)];
                    if t == 0.0 {
                        continue;
                    }
                    let (s1, tmp) = annihilate(s, j);
                    let (s2, target) = create(tmp, i);
                    let row = binsearch(states, target)?;
                    entries.push(Triplet::new(row, col, t * s1 * s2));
                }
            }
            Ok(entries)
        })
        .collect::<Result<Vec<Vec<_>>, EdError>>()?;

    let triplets: Vec<_> = columns.into_iter().flatten().collect();
    let d = states.len();
    SparseColMat::try_new_from_triplets(d, d, &triplets).map_err(|e| {
        EdErrorKind::InputError(format!("failed to assemble hopping matrix: {e:?}")).into()
    })
}
