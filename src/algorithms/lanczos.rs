//! Lanczos drivers: coefficient-only tridiagonalization for continued
//! fractions, and a basis-storing eigensolver for the lowest eigenpairs.
//!
//! [`tridiagonalize`] keeps only three vectors alive and returns the scalars of
//! `T_k`; this is all a continued-fraction Green's function needs.
//!
//! [`lanczos_eigsh`] stores the full basis `V_m`, reorthogonalizes every new
//! vector against it (twice, "twice is enough") and recovers Ritz vectors as
//! `V_m s_i`. When the Krylov space becomes invariant before the whole space is
//! spanned, the iteration continues from a fresh random vector orthogonal to
//! `V_m`. Converged pairs are then locked and the search is repeated in their
//! orthogonal complement, which recovers every copy of a degenerate level.

use core::cmp::Ordering;

use super::{LanczosIteration, breakdown_tolerance, eigh_tridiagonal};
use crate::{
    config::SolverParams,
    error::{EdError, EdErrorKind},
};
use faer::{
    Mat, MatRef, Par,
    dyn_stack::MemStack,
    matrix_free::LinOp,
    prelude::*,
};
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Coefficients of a Lanczos tridiagonalization started from `v0`.
///
/// `a[j]` are the diagonal entries of `T_k`. `b[0] = ‖v0‖` and `b[1..]` are the
/// off-diagonal entries, so both vectors have length `k`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TridiagonalCoefficients {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl TridiagonalCoefficients {
    /// Number of Lanczos steps.
    pub fn depth(&self) -> usize {
        self.a.len()
    }
}

/// Runs at most `min(max_depth, dim)` Lanczos steps from `v0`, stopping early
/// when the Krylov space becomes invariant.
///
/// # Errors
/// Returns an input error if `v0` is (numerically) zero or has the wrong length,
/// or if `max_depth` is 0.
pub fn tridiagonalize(
    operator: &impl LinOp<f64>,
    v0: MatRef<'_, f64>,
    max_depth: usize,
    stack: &mut MemStack,
) -> Result<TridiagonalCoefficients, EdError> {
    if max_depth == 0 {
        return Err(EdErrorKind::InputError("the Lanczos depth must be at least 1".to_string()).into());
    }
    let b_norm = v0.norm_l2();
    let depth = max_depth.min(operator.nrows());
    let mut iter = LanczosIteration::new(operator, v0, depth, b_norm)?;

    let mut a = Vec::with_capacity(depth);
    let mut b = Vec::with_capacity(depth);
    b.push(b_norm);

    while let Some(step) = iter.next_step(stack) {
        a.push(step.alpha);
        if step.beta <= breakdown_tolerance() || a.len() == depth {
            break;
        }
        b.push(step.beta);
    }
    Ok(TridiagonalCoefficients { a, b })
}

/// Dot product of two column vectors.
#[inline]
fn dot(x: MatRef<'_, f64>, y: MatRef<'_, f64>) -> f64 {
    (x.adjoint() * y)[(0, 0)]
}

/// Removes from `w` its components along the columns of every block in `qs`, twice.
fn orthogonalize(w: &mut Mat<f64>, qs: &[MatRef<'_, f64>]) {
    for _ in 0..2 {
        for q in qs {
            let coeffs = q.adjoint() * w.as_ref();
            *w -= *q * coeffs.as_ref();
        }
    }
}

/// Draws a random unit vector orthogonal to the columns of every block in `qs`.
fn random_orthogonal(rng: &mut StdRng, n: usize, qs: &[MatRef<'_, f64>]) -> Option<Mat<f64>> {
    for _ in 0..4 {
        let mut v = Mat::from_fn(n, 1, |_, _| rng.random::<f64>() - 0.5);
        orthogonalize(&mut v, qs);
        let norm = v.norm_l2();
        if norm > breakdown_tolerance() {
            return Some(&v * Scale(1.0 / norm));
        }
    }
    None
}

/// Computes the `k` lowest eigenpairs of a real symmetric operator.
///
/// Returns ascending eigenvalues and the eigenvectors as columns of an
/// `n x k` matrix. `k` is clipped to the operator dimension.
///
/// A single Krylov sequence sees only one vector of each degenerate
/// eigenspace. Once `k` pairs have converged they are locked, and further
/// runs restricted to their orthogonal complement look for the lowest
/// remaining eigenvalue. A value below the current `k`-th one is a missed
/// copy: it is inserted and the search repeats. The result is final once the
/// complement holds nothing below the `k`-th locked eigenvalue.
///
/// # Errors
/// [`EdErrorKind::NoConvergence`] if any run exhausts `params.max_iter`.
pub fn lanczos_eigsh(
    operator: &impl LinOp<f64>,
    k: usize,
    params: &SolverParams,
    stack: &mut MemStack,
) -> Result<(Vec<f64>, Mat<f64>), EdError> {
    let n = operator.nrows();
    let k = k.min(n);
    if k == 0 {
        return Ok((Vec::new(), Mat::zeros(n, 0)));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let no_locked = Mat::<f64>::zeros(n, 0);
    let (mut eigvals, mut eigvecs) =
        lanczos_run(operator, no_locked.as_ref(), k, params, &mut rng, stack)?;

    // Locked pairs stay locked, so every pass shrinks the complement.
    while eigvals.len() < n {
        let threshold = eigvals[k - 1];
        let (theta, q) = lanczos_run(operator, eigvecs.as_ref(), 1, params, &mut rng, stack)?;
        if theta[0] >= threshold - params.tol * threshold.abs().max(1.0) {
            break;
        }
        debug!("Lanczos: deflation found eigenvalue {} below {threshold}", theta[0]);
        let p = eigvals.partition_point(|&e| e <= theta[0]);
        eigvals.insert(p, theta[0]);
        let old = eigvecs;
        eigvecs = Mat::from_fn(n, old.ncols() + 1, |i, j| match j.cmp(&p) {
            Ordering::Less => old[(i, j)],
            Ordering::Equal => q[(i, 0)],
            Ordering::Greater => old[(i, j - 1)],
        });
    }
    eigvals.truncate(k);
    Ok((eigvals, eigvecs.as_ref().get(.., 0..k).to_owned()))
}

/// One Lanczos run with full reorthogonalization, confined to the orthogonal
/// complement of the columns of `locked`.
///
/// A Ritz pair `(θ_i, V_m s_i)` is accepted once its residual norm
/// `β_m |s_{m-1,i}|` drops below `params.tol * max(1, |θ_i|)`. The run ends at
/// the latest when the complement is spanned, so exhausting `params.max_iter`
/// earlier is reported as [`EdErrorKind::NoConvergence`].
fn lanczos_run(
    operator: &impl LinOp<f64>,
    locked: MatRef<'_, f64>,
    k: usize,
    params: &SolverParams,
    rng: &mut StdRng,
    stack: &mut MemStack,
) -> Result<(Vec<f64>, Mat<f64>), EdError> {
    let n = operator.nrows();
    let dim = n - locked.ncols();
    let k = k.min(dim);
    let cap = params.max_iter.min(dim);
    let mut basis = Mat::<f64>::zeros(n, cap);
    let mut alphas = Vec::with_capacity(cap);
    let mut betas = Vec::with_capacity(cap);
    let mut w = Mat::<f64>::zeros(n, 1);
    let mut converged = 0;

    let Some(v0) = random_orthogonal(rng, n, &[locked]) else {
        return Err(EdErrorKind::InputError("failed to draw a Lanczos start vector".to_string()).into());
    };
    basis.col_mut(0).copy_from(v0.col(0));

    for j in 0..cap {
        let q_j = basis.as_ref().get(.., j..j + 1);
        operator.apply(w.as_mut(), q_j, Par::Seq, stack);
        let alpha = dot(q_j, w.as_ref());
        w -= q_j * Scale(alpha);
        if j > 0 {
            let q_prev = basis.as_ref().get(.., j - 1..j);
            w -= q_prev * Scale(betas[j - 1]);
        }
        orthogonalize(&mut w, &[locked, basis.as_ref().get(.., 0..j + 1)]);
        let beta = w.norm_l2();
        alphas.push(alpha);

        let m = j + 1;
        let invariant = beta <= breakdown_tolerance();
        if m >= k && (m == dim || !invariant) {
            let (theta, s) = eigh_tridiagonal(&alphas, &betas)?;
            converged = (0..k)
                .take_while(|&i| beta * s[(m - 1, i)].abs() < params.tol * theta[i].abs().max(1.0))
                .count();
            if converged == k || m == dim {
                debug!("Lanczos converged after {m} iterations (n = {n}, locked = {}, k = {k})", locked.ncols());
                let eigvecs = basis.as_ref().get(.., 0..m) * s.as_ref().get(.., 0..k);
                return Ok((theta[..k].to_vec(), eigvecs));
            }
        }
        if m == cap {
            break;
        }

        if invariant {
            debug!("Lanczos: invariant subspace of dimension {m} found, restarting");
            let Some(v) = random_orthogonal(rng, n, &[locked, basis.as_ref().get(.., 0..m)]) else {
                break;
            };
            basis.col_mut(m).copy_from(v.col(0));
            betas.push(0.0);
        } else {
            basis.col_mut(m).copy_from((&w * Scale(1.0 / beta)).col(0));
            betas.push(beta);
        }
    }

    Err(EdErrorKind::NoConvergence {
        dim: n,
        requested: k,
        converged,
        iterations: alphas.len(),
    }
    .into())
}
