//! Core Lanczos machinery shared by the eigensolver and the Green's-function
//! tridiagonalizer.
//!
//! The three-term recurrence
//!
//! ```text
//! β_{j+1} v_{j+1} = A v_j - α_j v_j - β_j v_{j-1}
//! ```
//!
//! is implemented once, by [`LanczosIteration`]. The routines in [`lanczos`]
//! drive it either without keeping the basis (continued-fraction coefficients)
//! or while storing and reorthogonalizing it (extremal eigenpairs).

pub mod lanczos;

use faer::{
    Mat, MatRef, Par, Side,
    dyn_stack::MemStack,
    matrix_free::LinOp,
    prelude::*,
};

use crate::error::{EdError, EdErrorKind};

/// Norm below which a Krylov vector is treated as zero and the recurrence stops.
#[inline]
pub fn breakdown_tolerance() -> f64 {
    f64::EPSILON.sqrt() * 1e-2
}

/// One step of the recurrence: the diagonal entry `α_j` and the norm
/// `β_{j+1}` of the unnormalized next vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LanczosStep {
    pub alpha: f64,
    pub beta: f64,
}

/// Stateful three-term Lanczos recurrence over a matrix-free operator.
///
/// Holds only `v_prev`, `v_curr` and a work vector, so memory stays `O(n)`.
pub struct LanczosIteration<'a, O: LinOp<f64>> {
    operator: &'a O,
    v_prev: Mat<f64>,
    v_curr: Mat<f64>,
    work: Mat<f64>,
    beta_prev: f64,
    steps_taken: usize,
    max_steps: usize,
}

impl<'a, O: LinOp<f64>> LanczosIteration<'a, O> {
    /// Starts the recurrence from `b / b_norm`.
    pub fn new(operator: &'a O, b: MatRef<'_, f64>, max_steps: usize, b_norm: f64) -> Result<Self, EdError> {
        let n = operator.nrows();
        if b.nrows() != n || b.ncols() != 1 {
            return Err(EdErrorKind::DimensionMismatch {
                expected: n,
                actual: b.nrows(),
            }
            .into());
        }
        if b_norm <= breakdown_tolerance() {
            return Err(EdErrorKind::InputError("the Lanczos start vector is zero".to_string()).into());
        }
        Ok(Self {
            operator,
            v_prev: Mat::zeros(n, 1),
            v_curr: b * Scale(1.0 / b_norm),
            work: Mat::zeros(n, 1),
            beta_prev: 0.0,
            steps_taken: 0,
            max_steps,
        })
    }

    /// Advances one step. After the call `v_curr` holds `v_{j+1}` unless the
    /// returned `beta` is below [`breakdown_tolerance`].
    ///
    /// Returns `None` once `max_steps` steps have been taken.
    pub fn next_step(&mut self, stack: &mut MemStack) -> Option<LanczosStep> {
        if self.steps_taken >= self.max_steps {
            return None;
        }
        self.operator
            .apply(self.work.as_mut(), self.v_curr.as_ref(), Par::Seq, stack);

        let alpha = (self.v_curr.adjoint() * self.work.as_ref())[(0, 0)];
        self.work -= &self.v_curr * Scale(alpha);
        if self.steps_taken > 0 {
            self.work -= &self.v_prev * Scale(self.beta_prev);
        }
        let beta = self.work.norm_l2();

        self.steps_taken += 1;
        if beta > breakdown_tolerance() {
            core::mem::swap(&mut self.v_prev, &mut self.v_curr);
            self.v_curr = &self.work * Scale(1.0 / beta);
            self.beta_prev = beta;
        }
        Some(LanczosStep { alpha, beta })
    }
}

/// Assembles the symmetric tridiagonal matrix with diagonal `alphas` and
/// off-diagonal `betas`.
pub fn assemble_tridiagonal(alphas: &[f64], betas: &[f64]) -> Mat<f64> {
    let k = alphas.len();
    let mut t_k = Mat::<f64>::zeros(k, k);
    for i in 0..k {
        t_k.as_mut()[(i, i)] = alphas[i];
    }
    for (i, &beta) in betas.iter().enumerate().take(k.saturating_sub(1)) {
        t_k.as_mut()[(i, i + 1)] = beta;
        t_k.as_mut()[(i + 1, i)] = beta;
    }
    t_k
}

/// Eigendecomposition of a symmetric tridiagonal matrix: ascending
/// eigenvalues and the matching eigenvectors as columns.
pub fn eigh_tridiagonal(alphas: &[f64], betas: &[f64]) -> Result<(Vec<f64>, Mat<f64>), EdError> {
    let t_k = assemble_tridiagonal(alphas, betas);
    let evd = t_k.self_adjoint_eigen(Side::Lower)?;
    let eigvals = (0..alphas.len()).map(|i| evd.S()[i]).collect();
    Ok((eigvals, evd.U().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::dyn_stack::MemBuffer;

    #[test]
    fn test_assemble_tridiagonal() {
        let t = assemble_tridiagonal(&[1.0, 2.0, 3.0], &[0.5, 0.25]);
        assert_eq!(t, faer::mat![[1.0, 0.5, 0.0], [0.5, 2.0, 0.25], [0.0, 0.25, 3.0]]);
        assert_eq!(assemble_tridiagonal(&[4.0], &[]), faer::mat![[4.0]]);
    }

    #[test]
    fn test_eigh_tridiagonal_two_by_two() {
        // [[0, 1], [1, 0]] has eigenvalues -1 and 1.
        let (vals, vecs) = eigh_tridiagonal(&[0.0, 0.0], &[1.0]).unwrap();
        assert!((vals[0] + 1.0).abs() < 1e-14);
        assert!((vals[1] - 1.0).abs() < 1e-14);
        assert!((vecs[(0, 0)].abs() - 0.5f64.sqrt()).abs() < 1e-14);
    }

    #[test]
    fn test_iteration_on_diagonal_operator_breaks_down() {
        // The start vector lives in a two-dimensional invariant subspace.
        let a = faer::mat![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]];
        let b = faer::mat![[1.0], [1.0], [0.0]];
        let mut mem = MemBuffer::new(a.apply_scratch(1, Par::Seq));
        let stack = MemStack::new(&mut mem);
        let mut iter = LanczosIteration::new(&a, b.as_ref(), 3, b.norm_l2()).unwrap();
        let first = iter.next_step(stack).unwrap();
        assert!((first.alpha - 1.5).abs() < 1e-14);
        assert!((first.beta - 0.5).abs() < 1e-14);
        let second = iter.next_step(stack).unwrap();
        assert!((second.alpha - 1.5).abs() < 1e-14);
        assert!(second.beta < breakdown_tolerance());
    }

    #[test]
    fn test_zero_start_vector_is_rejected() {
        let a = faer::mat![[1.0, 0.0], [0.0, 2.0]];
        let b = Mat::<f64>::zeros(2, 1);
        assert!(LanczosIteration::new(&a, b.as_ref(), 2, 0.0).is_err());
    }
}
