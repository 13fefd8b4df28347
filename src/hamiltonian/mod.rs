//! The many-body Hamiltonian of one (N↑, N↓) sector.
//!
//! The sector Hamiltonian splits into a diagonal local part and two hopping
//! blocks, one per spin:
//!
//! ```text
//! H = H_loc + H↑ ⊗ 1↓ + 1↑ ⊗ H↓
//! ```
//!
//! Viewing a sector vector `x` as the column-major `dup x dwn` matrix `X`
//! (composite index `iup + idw * dup`), the action becomes
//! `H_loc ∘ X + H↑ X + (H↓ Xᵀ)ᵀ`. [`SectorHamiltonian`] evaluates exactly that
//! without ever forming the `d x d` matrix, and materializes it on demand for
//! the dense eigensolver.

pub mod hopping;
pub mod local;

use faer::{
    Mat, MatMut, MatRef, Par,
    dyn_stack::{MemStack, StackReq},
    matrix_free::LinOp,
    sparse::SparseColMat,
};

pub use hopping::build_hopping;
pub use local::{LocalHamiltonian, build_local, build_local_packed};

use crate::{
    config::LocalParams,
    error::EdError,
    fock::FockState,
    model::ImpurityModel,
    operator::ManyBodyOperator,
    sector::{Sector, Spin},
};

/// Implicit many-body Hamiltonian of a sector.
#[derive(Clone, Debug)]
pub struct SectorHamiltonian {
    local: LocalHamiltonian,
    hop_up: SparseColMat<usize, f64>,
    hop_dw: SparseColMat<usize, f64>,
    dup: usize,
    dwn: usize,
}

/// Builds the implicit many-body Hamiltonian over the basis `states_up x states_dw`.
pub fn build_mb_ham(
    model: &ImpurityModel,
    states_up: &[FockState],
    states_dw: &[FockState],
    params: &LocalParams,
) -> Result<SectorHamiltonian, EdError> {
    Ok(SectorHamiltonian {
        local: build_local(model, states_up, states_dw, params)?,
        hop_up: build_hopping(model.h(Spin::Up), states_up)?,
        hop_dw: build_hopping(model.h(Spin::Down), states_dw)?,
        dup: states_up.len(),
        dwn: states_dw.len(),
    })
}

impl SectorHamiltonian {
    /// Builds the Hamiltonian of `sector`.
    pub fn for_sector(
        model: &ImpurityModel,
        sector: &Sector,
        params: &LocalParams,
    ) -> Result<Self, EdError> {
        build_mb_ham(model, sector.states_up(), sector.states_dw(), params)
    }

    /// Sector dimension.
    pub fn dim(&self) -> usize {
        self.dup * self.dwn
    }
}

impl LinOp<f64> for SectorHamiltonian {
    fn apply_scratch(&self, _rhs_ncols: usize, par: Par) -> StackReq {
        self.hop_up
            .apply_scratch(self.dwn, par)
            .or(self.hop_dw.apply_scratch(self.dup, par))
    }

    fn nrows(&self) -> usize {
        self.dim()
    }

    fn ncols(&self) -> usize {
        self.dim()
    }

    fn apply(&self, mut out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, par: Par, stack: &mut MemStack) {
        let (dup, dwn) = (self.dup, self.dwn);
        if dup * dwn == 0 {
            return;
        }
        let diag = self.local.diag();
        let mut y_up = Mat::<f64>::zeros(dup, dwn);
        let mut y_dw = Mat::<f64>::zeros(dwn, dup);

        for j in 0..rhs.ncols() {
            let x = rhs.col(j);
            let x_mat = Mat::from_fn(dup, dwn, |iup, idw| x[iup + idw * dup]);
            self.hop_up.apply(y_up.as_mut(), x_mat.as_ref(), par, stack);
            self.hop_dw
                .apply(y_dw.as_mut(), x_mat.as_ref().transpose(), par, stack);

            for idw in 0..dwn {
                for iup in 0..dup {
                    let i = iup + idw * dup;
                    out[(i, j)] = diag[i] * x[i] + y_up[(iup, idw)] + y_dw[(idw, iup)];
                }
            }
        }
    }

    fn conj_apply(&self, out: MatMut<'_, f64>, rhs: MatRef<'_, f64>, par: Par, stack: &mut MemStack) {
        // Real symmetric.
        self.apply(out, rhs, par, stack);
    }
}

impl ManyBodyOperator for SectorHamiltonian {
    fn to_dense(&self) -> Mat<f64> {
        let (dup, dwn) = (self.dup, self.dwn);
        let mut h = self.local.to_dense();
        for e in self.hop_up.triplet_iter() {
            for idw in 0..dwn {
                h[(e.row + idw * dup, e.col + idw * dup)] += *e.val;
            }
        }
        for e in self.hop_dw.triplet_iter() {
            for iup in 0..dup {
                h[(iup + e.row * dup, iup + e.col * dup)] += *e.val;
            }
        }
        h
    }
}
