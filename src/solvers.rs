//! High-level entry point for diagonalizing a single sector.
//!
//! Small sectors are materialized and handed to faer's dense self-adjoint
//! eigensolver. Larger sectors are kept implicit and the lowest eigenpairs are
//! obtained with [`crate::algorithms::lanczos::lanczos_eigsh`].

use crate::{
    algorithms::lanczos::lanczos_eigsh,
    config::EdConfig,
    error::EdError,
    fock::FockState,
    hamiltonian::{SectorHamiltonian, build_mb_ham},
    model::ImpurityModel,
    operator::ManyBodyOperator,
};
use faer::{
    Mat, Par, Side,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use log::debug;

/// Full eigendecomposition of a sector Hamiltonian through its dense matrix.
pub fn solve_dense(ham: &SectorHamiltonian) -> Result<(Vec<f64>, Mat<f64>), EdError> {
    let evd = ham.to_dense().self_adjoint_eigen(Side::Lower)?;
    let eigvals = (0..ham.dim()).map(|i| evd.S()[i]).collect();
    Ok((eigvals, evd.U().to_owned()))
}

/// Diagonalizes the sector spanned by `states_up x states_dw`.
///
/// # Arguments
/// * `model`: The impurity model.
/// * `states_up`, `states_dw`: Sorted single-spin bases of the sector.
/// * `k`: Number of requested eigenpairs. `None` requests the full spectrum.
/// * `config`: Local-Hamiltonian and eigensolver parameters.
///
/// # Returns
/// Ascending eigenvalues and the eigenvectors as columns. When `k` is `None` or
/// the sector dimension does not exceed `config.solver.dense_threshold`, the
/// dense path is taken and the full spectrum is returned. Otherwise the lowest
/// `min(k, d)` pairs are computed iteratively.
pub fn solve_sector(
    model: &ImpurityModel,
    states_up: &[FockState],
    states_dw: &[FockState],
    k: Option<usize>,
    config: &EdConfig,
) -> Result<(Vec<f64>, Mat<f64>), EdError> {
    let ham = build_mb_ham(model, states_up, states_dw, &config.local)?;
    let d = ham.dim();

    match k {
        Some(k) if d > config.solver.dense_threshold => {
            debug!("iterative diagonalization: d = {d}, k = {k}");
            let mut mem = MemBuffer::new(ham.apply_scratch(1, Par::Seq));
            lanczos_eigsh(&ham, k, &config.solver, MemStack::new(&mut mem))
        }
        _ => {
            debug!("dense diagonalization: d = {d}");
            solve_dense(&ham)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SolverParams, fock::generate_states};

    #[test]
    fn test_dense_and_iterative_paths_agree() {
        let model = ImpurityModel::hubbard_chain(5, 1.0, -1.0, 2.5).unwrap();
        let up = generate_states(5, 2);
        let dw = generate_states(5, 3);
        let dense = EdConfig::default();
        let iterative = EdConfig {
            solver: SolverParams {
                dense_threshold: 0,
                ..SolverParams::default()
            },
            ..EdConfig::default()
        };

        let (full, _) = solve_sector(&model, &up, &dw, None, &dense).unwrap();
        assert_eq!(full.len(), 100);
        assert!(full.windows(2).all(|w| w[0] <= w[1]));

        let (lowest, vecs) = solve_sector(&model, &up, &dw, Some(100), &iterative).unwrap();
        assert_eq!(vecs.ncols(), 100);
        for (a, b) in full.iter().zip(&lowest) {
            assert!((a - b).abs() < 1e-8, "{a} vs {b}");
        }
    }

    /// Two identical, disconnected three-site chains: the sector ground states
    /// are degenerate between the two halves.
    fn twin_chains() -> ImpurityModel {
        let eps = [-0.3, 0.1, 0.7, -0.3, 0.1, 0.7];
        let h = Mat::from_fn(6, 6, |i, j| {
            if i == j {
                eps[i]
            } else if i / 3 == j / 3 && i.abs_diff(j) == 1 {
                -1.0
            } else {
                0.0
            }
        });
        let v = Mat::from_fn(6, 6, |i, j| if i == j { 1.3 } else { 0.0 });
        ImpurityModel::spin_symmetric(h, v).unwrap()
    }

    #[test]
    fn test_iterative_path_resolves_degenerate_ground_states() {
        let model = twin_chains();
        let iterative = EdConfig {
            solver: SolverParams {
                dense_threshold: 0,
                ..SolverParams::default()
            },
            ..EdConfig::default()
        };
        for (nup, ndw, k) in [(1, 1, 2), (1, 1, 3), (2, 1, 2), (2, 1, 4)] {
            let up = generate_states(6, nup);
            let dw = generate_states(6, ndw);
            let (full, _) = solve_sector(&model, &up, &dw, None, &EdConfig::default()).unwrap();
            let (lowest, vecs) = solve_sector(&model, &up, &dw, Some(k), &iterative).unwrap();
            assert_eq!(lowest.len(), k);
            assert_eq!(vecs.ncols(), k);
            for (a, b) in full.iter().zip(&lowest) {
                assert!((a - b).abs() < 1e-8, "sector ({nup}, {ndw}), k = {k}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_small_sectors_are_always_dense() {
        let model = ImpurityModel::hubbard_chain(3, 1.0, 0.0, 1.0).unwrap();
        let up = generate_states(3, 1);
        let dw = generate_states(3, 1);
        // d = 9 <= 10: the full spectrum is returned even though one pair is requested.
        let (vals, vecs) = solve_sector(&model, &up, &dw, Some(1), &EdConfig::default()).unwrap();
        assert_eq!(vals.len(), 9);
        assert_eq!((vecs.nrows(), vecs.ncols()), (9, 9));
    }

    #[test]
    fn test_eigenvectors_diagonalize_the_sector() {
        let model = ImpurityModel::anderson_star(-1.0, 3.0, &[-0.5, 0.5], &[0.6, 0.6]).unwrap();
        let up = generate_states(3, 1);
        let dw = generate_states(3, 2);
        let config = EdConfig::default();
        let ham = build_mb_ham(&model, &up, &dw, &config.local).unwrap();
        let (vals, vecs) = solve_sector(&model, &up, &dw, None, &config).unwrap();
        let h = ham.to_dense();
        for (i, &e) in vals.iter().enumerate() {
            let v = vecs.as_ref().get(.., i..i + 1);
            assert!((h.as_ref() * v - v * faer::Scale(e)).norm_l2() < 1e-10);
        }
    }
}
