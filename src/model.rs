//! Single-particle and interaction matrices defining an impurity model.

use faer::Mat;

use crate::{
    error::{EdError, EdErrorKind},
    fock::MAX_ORBITALS,
    sector::Spin,
};

/// Hamiltonian of `n` interacting orbitals.
///
/// `h[s]` is the single-particle matrix of spin `s` (on-site levels on the
/// diagonal, hoppings off the diagonal). `v` holds the on-site Hubbard `U_i` on
/// its diagonal and the inter-site density-density couplings `V_ij` elsewhere.
#[derive(Clone, Debug)]
pub struct ImpurityModel {
    h: [Mat<f64>; 2],
    v: Mat<f64>,
}

impl ImpurityModel {
    /// Builds a model with spin-dependent single-particle matrices.
    pub fn new(h_up: Mat<f64>, h_dw: Mat<f64>, v: Mat<f64>) -> Result<Self, EdError> {
        let n = v.nrows();
        if n == 0 || n > MAX_ORBITALS {
            return Err(EdErrorKind::InputError(format!(
                "the number of orbitals must be in [1, {MAX_ORBITALS}], got {n}"
            ))
            .into());
        }
        for m in [&h_up, &h_dw, &v] {
            if m.nrows() != n || m.ncols() != n {
                return Err(EdErrorKind::DimensionMismatch {
                    expected: n,
                    actual: if m.nrows() != n { m.nrows() } else { m.ncols() },
                }
                .into());
            }
        }
        Ok(Self {
            h: [h_up, h_dw],
            v,
        })
    }

    /// Builds a model whose two spin species share the same single-particle matrix.
    pub fn spin_symmetric(h: Mat<f64>, v: Mat<f64>) -> Result<Self, EdError> {
        Self::new(h.clone(), h, v)
    }

    /// Number of orbitals.
    pub fn n(&self) -> usize {
        self.v.nrows()
    }

    /// Single-particle matrix of the given spin.
    pub fn h(&self, spin: Spin) -> &Mat<f64> {
        &self.h[spin.index()]
    }

    /// Interaction matrix.
    pub fn v(&self) -> &Mat<f64> {
        &self.v
    }

    /// Single-impurity Anderson model in star geometry: orbital 0 is the
    /// impurity with level `e_imp` and Hubbard `u`, orbital `i + 1` is a bath
    /// level `bath[i]` coupled to the impurity with amplitude `-hopping[i]`.
    pub fn anderson_star(
        e_imp: f64,
        u: f64,
        bath: &[f64],
        hopping: &[f64],
    ) -> Result<Self, EdError> {
        if bath.len() != hopping.len() {
            return Err(EdErrorKind::DimensionMismatch {
                expected: bath.len(),
                actual: hopping.len(),
            }
            .into());
        }
        let n = bath.len() + 1;
        let h = Mat::from_fn(n, n, |i, j| match (i, j) {
            (0, 0) => e_imp,
            (0, j) => -hopping[j - 1],
            (i, 0) => -hopping[i - 1],
            (i, j) if i == j => bath[i - 1],
            _ => 0.0,
        });
        let v = Mat::from_fn(n, n, |i, j| if i == 0 && j == 0 { u } else { 0.0 });
        Self::spin_symmetric(h, v)
    }

    /// Hubbard chain with open boundaries: hopping `-t` between neighbours,
    /// on-site level `eps` and interaction `u` on every site.
    pub fn hubbard_chain(n: usize, t: f64, eps: f64, u: f64) -> Result<Self, EdError> {
        let h = Mat::from_fn(n, n, |i, j| {
            if i == j {
                eps
            } else if i.abs_diff(j) == 1 {
                -t
            } else {
                0.0
            }
        });
        let v = Mat::from_fn(n, n, |i, j| if i == j { u } else { 0.0 });
        Self::spin_symmetric(h, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anderson_star_layout() {
        let model = ImpurityModel::anderson_star(-2.0, 1.0, &[-1.0, -0.5], &[0.7, 0.7]).unwrap();
        let h = model.h(Spin::Up);
        assert_eq!(model.n(), 3);
        assert_eq!(h[(0, 0)], -2.0);
        assert_eq!(h[(0, 2)], -0.7);
        assert_eq!(h[(2, 0)], -0.7);
        assert_eq!(h[(2, 2)], -0.5);
        assert_eq!(h[(1, 2)], 0.0);
        assert_eq!(model.v()[(0, 0)], 1.0);
        assert_eq!(model.v()[(1, 1)], 0.0);
    }

    #[test]
    fn test_rejects_mismatched_matrices() {
        let err = ImpurityModel::new(Mat::zeros(2, 2), Mat::zeros(3, 3), Mat::zeros(2, 2)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected 2, found 3."
        );
        assert!(ImpurityModel::spin_symmetric(Mat::zeros(0, 0), Mat::zeros(0, 0)).is_err());
    }
}
