//! Diagonal (density-density) part of the many-body Hamiltonian.
//!
//! For a basis state with occupations `n_i↑`, `n_i↓` the local energy is
//!
//! ```text
//!   Σ_i (ε_i↑ + μ) n_i↑ + (ε_i↓ + μ) n_i↓
//! + Σ_i U_i n_i↑ n_i↓                                 (bare)
//! | Σ_i U_i (n_i↑ - ½)(n_i↓ - ½)                      (mean-field mode)
//! + ½ Σ_{i≠j} V_ij (n_i - z_i)(n_j - z_j),   n_i = n_i↑ + n_i↓
//! ```
//!
//! Every basis state is independent, so the builders split the work across
//! threads with rayon.

use faer::{
    Mat, MatMut, MatRef, Par,
    dyn_stack::{MemStack, StackReq},
    matrix_free::LinOp,
};
use rayon::prelude::*;

use crate::{
    config::LocalParams,
    error::{EdError, EdErrorKind},
    fock::{FockState, MAX_ORBITALS, unpack},
    model::ImpurityModel,
    operator::ManyBodyOperator,
    sector::Spin,
};

/// Diagonal many-body operator, one entry per composite basis index.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalHamiltonian {
    diag: Vec<f64>,
}

impl LocalHamiltonian {
    /// Wraps a precomputed diagonal.
    pub fn from_diag(diag: Vec<f64>) -> Self {
        Self { diag }
    }

    /// Diagonal entries in composite-index order.
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// Dimension of the operator.
    pub fn dim(&self) -> usize {
        self.diag.len()
    }
}

impl LinOp<f64> for LocalHamiltonian {
    fn apply_scratch(&self, _rhs_ncols: usize, _par: Par) -> StackReq {
        StackReq::EMPTY
    }

    fn nrows(&self) -> usize {
        self.diag.len()
    }

    fn ncols(&self) -> usize {
        self.diag.len()
    }

    fn apply(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, _par: Par, _stack: &mut MemStack) {
        for j in 0..rhs.ncols() {
            for (i, &e) in self.diag.iter().enumerate() {
                out[(i, j)] = e * rhs[(i, j)];
            }
        }
    }

    fn conj_apply(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, par: Par, stack: &mut MemStack) {
        self.apply(out, rhs, par, stack);
    }
}

impl ManyBodyOperator for LocalHamiltonian {
    fn to_dense(&self) -> Mat<f64> {
        let d = self.diag.len();
        Mat::from_fn(d, d, |i, j| if i == j { self.diag[i] } else { 0.0 })
    }
}

/// Per-orbital coefficients of the local energy, resolved once per sector.
struct LocalCoefficients {
    n: usize,
    e_up: Vec<f64>,
    e_dw: Vec<f64>,
    u: Vec<f64>,
    v: Mat<f64>,
    z: Vec<f64>,
    hf_mode: bool,
}

impl LocalCoefficients {
    fn new(model: &ImpurityModel, params: &LocalParams) -> Result<Self, EdError> {
        let n = model.n();
        let z = params.reference_occupation(n);
        if z.len() != n {
            return Err(EdErrorKind::DimensionMismatch {
                expected: n,
                actual: z.len(),
            }
            .into());
        }
        let (h_up, h_dw, v) = (model.h(Spin::Up), model.h(Spin::Down), model.v());
        Ok(Self {
            n,
            e_up: (0..n).map(|i| h_up[(i, i)] + params.mu).collect(),
            e_dw: (0..n).map(|i| h_dw[(i, i)] + params.mu).collect(),
            u: (0..n).map(|i| v[(i, i)]).collect(),
            v: Mat::from_fn(n, n, |i, j| if i == j { 0.0 } else { v[(i, j)] }),
            z,
            hf_mode: params.hf_mode,
        })
    }

    fn energy(&self, sup: FockState, sdw: FockState) -> f64 {
        let n = self.n;
        let mut nup = [0.0; MAX_ORBITALS];
        let mut ndw = [0.0; MAX_ORBITALS];
        let mut res = 0.0;
        for i in 0..n {
            nup[i] = ((sup >> i) & 1) as f64;
            ndw[i] = ((sdw >> i) & 1) as f64;
            res += self.e_up[i] * nup[i] + self.e_dw[i] * ndw[i];
        }
        for i in 0..n {
            res += if self.hf_mode {
                self.u[i] * (nup[i] - 0.5) * (ndw[i] - 0.5)
            } else {
                self.u[i] * nup[i] * ndw[i]
            };
            let mut tmp = 0.0;
            for j in 0..n {
                tmp += self.v[(i, j)] * (nup[j] + ndw[j] - self.z[j]);
            }
            res += 0.5 * (nup[i] + ndw[i] - self.z[i]) * tmp;
        }
        res
    }
}

/// Builds the local Hamiltonian of a sector with spin-separated basis.
///
/// Entry `iup + idw * dup` corresponds to the state (`states_up[iup]`, `states_dw[idw]`).
pub fn build_local(
    model: &ImpurityModel,
    states_up: &[FockState],
    states_dw: &[FockState],
    params: &LocalParams,
) -> Result<LocalHamiltonian, EdError> {
    let coeffs = LocalCoefficients::new(model, params)?;
    let dup = states_up.len();
    let mut diag = vec![0.0; dup * states_dw.len()];
    if dup > 0 {
        diag.par_chunks_mut(dup)
            .zip(states_dw.par_iter())
            .for_each(|(row, &sdw)| {
                for (out, &sup) in row.iter_mut().zip(states_up) {
                    *out = coeffs.energy(sup, sdw);
                }
            });
    }
    Ok(LocalHamiltonian { diag })
}

/// Builds the local Hamiltonian for packed states of width `2 * n`
/// (bits `0..n` up, bits `n..2n` down).
pub fn build_local_packed(
    model: &ImpurityModel,
    states: &[FockState],
    params: &LocalParams,
) -> Result<LocalHamiltonian, EdError> {
    let coeffs = LocalCoefficients::new(model, params)?;
    let n = model.n();
    let mut diag = vec![0.0; states.len()];
    diag.par_iter_mut()
        .zip(states.par_iter())
        .for_each(|(out, &s)| {
            let (sup, sdw) = unpack(n, s);
            *out = coeffs.energy(sup, sdw);
        });
    Ok(LocalHamiltonian { diag })
}
