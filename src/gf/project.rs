//! Projection of sector eigenstates through a single-orbital operator.
//!
//! For an operator `op` acting on orbital `pos` of one spin channel, the row
//! `l` of [`project`] holds `op |I_l⟩` expanded in the basis of the arrival
//! sector `J`. Only the states of the acted-on spin change; the spectator
//! spin index is carried over unchanged.

use faer::Mat;

use crate::{
    error::{EdError, EdErrorKind},
    fock::{MAX_ORBITALS, binsearch},
    operators::FermionOp,
    sector::{Sector, Spin},
};

fn solved_eigvecs<'a>(sct: &'a Sector) -> Result<&'a Mat<f64>, EdError> {
    sct.eigvecs().ok_or_else(|| {
        EdErrorKind::InputError(format!(
            "sector ({}, {}) has not been diagonalized",
            sct.key().nup,
            sct.key().ndw
        ))
        .into()
    })
}

/// Projects the eigenvectors of `sct_i` onto the basis of `sct_j`.
///
/// Returns an `m_I x d_J` matrix, `m_I` being the number of stored eigenpairs of
/// `sct_i`.
///
/// # Errors
/// Fails if `pos` is not a valid orbital index, if `sct_i` is unsolved, if the
/// spectator dimensions differ, or if a produced state is missing from the
/// basis of `sct_j`.
pub fn project(
    spin: Spin,
    op: FermionOp,
    pos: usize,
    sct_i: &Sector,
    sct_j: &Sector,
) -> Result<Mat<f64>, EdError> {
    if pos >= MAX_ORBITALS {
        return Err(EdErrorKind::InputError(format!(
            "orbital {pos} exceeds the supported {MAX_ORBITALS} orbitals"
        ))
        .into());
    }
    let eigvecs = solved_eigvecs(sct_i)?;
    let m = eigvecs.ncols();
    let mut v0 = Mat::<f64>::zeros(m, sct_j.d());

    match spin {
        Spin::Up => {
            if sct_i.dwn() != sct_j.dwn() {
                return Err(EdErrorKind::DimensionMismatch {
                    expected: sct_i.dwn(),
                    actual: sct_j.dwn(),
                }
                .into());
            }
            for (iup_i, &s) in sct_i.states_up().iter().enumerate() {
                let Some((sgn, s_j)) = op.apply(s, pos) else {
                    continue;
                };
                let iup_j = binsearch(sct_j.states_up(), s_j)?;
                for idw in 0..sct_i.dwn() {
                    let il = sct_i.composite_index(iup_i, idw);
                    let im = sct_j.composite_index(iup_j, idw);
                    for l in 0..m {
                        v0[(l, im)] = sgn * eigvecs[(il, l)];
                    }
                }
            }
        }
        Spin::Down => {
            if sct_i.dup() != sct_j.dup() {
                return Err(EdErrorKind::DimensionMismatch {
                    expected: sct_i.dup(),
                    actual: sct_j.dup(),
                }
                .into());
            }
            for (idw_i, &s) in sct_i.states_dw().iter().enumerate() {
                let Some((sgn, s_j)) = op.apply(s, pos) else {
                    continue;
                };
                let idw_j = binsearch(sct_j.states_dw(), s_j)?;
                for iup in 0..sct_i.dup() {
                    let il = sct_i.composite_index(iup, idw_i);
                    let im = sct_j.composite_index(iup, idw_j);
                    for l in 0..m {
                        v0[(l, im)] = sgn * eigvecs[(il, l)];
                    }
                }
            }
        }
    }
    Ok(v0)
}

/// Transition amplitudes `⟨J_l'| op |I_l⟩` as an `m_J x m_I` matrix.
///
/// Both sectors must be solved.
pub fn project_exact(
    spin: Spin,
    op: FermionOp,
    pos: usize,
    sct_i: &Sector,
    sct_j: &Sector,
) -> Result<Mat<f64>, EdError> {
    let eigvecs_j = solved_eigvecs(sct_j)?;
    let v0 = project(spin, op, pos, sct_i, sct_j)?;
    Ok(eigvecs_j.transpose() * v0.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::EdConfig,
        model::ImpurityModel,
        sector::{SectorKey, Spectrum},
        solvers::solve_sector,
    };

    fn solved(model: &ImpurityModel, key: SectorKey) -> Sector {
        let sct = Sector::empty(model.n(), key);
        let (eigvals, eigvecs) =
            solve_sector(model, sct.states_up(), sct.states_dw(), None, &EdConfig::default()).unwrap();
        sct.with_spectrum(Spectrum::Solved { eigvals, eigvecs })
    }

    #[test]
    fn test_create_on_vacuum() {
        let model = ImpurityModel::hubbard_chain(2, 1.0, 0.0, 0.0).unwrap();
        let vacuum = solved(&model, SectorKey::new(0, 0));
        let target = Sector::empty(2, SectorKey::new(1, 0));
        let v0 = project(Spin::Up, FermionOp::Create, 1, &vacuum, &target).unwrap();
        // c†_1 |0> = |10>, which is the second up-state.
        assert_eq!(v0.nrows(), 1);
        assert_eq!(v0.ncols(), 2);
        assert_eq!(v0[(0, 0)], 0.0);
        assert_eq!(v0[(0, 1)].abs(), 1.0);
    }

    #[test]
    fn test_down_channel_keeps_up_index() {
        let model = ImpurityModel::hubbard_chain(2, 1.0, 0.0, 2.0).unwrap();
        let sct_i = solved(&model, SectorKey::new(1, 1));
        let sct_j = Sector::empty(2, SectorKey::new(1, 0));
        let v0 = project(Spin::Down, FermionOp::Annihilate, 0, &sct_i, &sct_j).unwrap();
        assert_eq!((v0.nrows(), v0.ncols()), (4, 2));
        // Removing the down particle from orbital 0 only touches basis states with
        // the down particle on orbital 0 (idw = 0).
        let eigvecs = sct_i.eigvecs().unwrap();
        for l in 0..4 {
            for iup in 0..2 {
                assert_eq!(v0[(l, iup)], eigvecs[(sct_i.composite_index(iup, 0), l)]);
            }
        }
    }

    #[test]
    fn test_amplitudes_obey_sum_rule() {
        // Σ_J |<J|c†|I>|² + |<J'|c|I>|² = 1 for every eigenstate I (full spectra).
        let model = ImpurityModel::anderson_star(-0.5, 1.0, &[-0.2, 0.4], &[0.3, 0.6]).unwrap();
        let sct_i = solved(&model, SectorKey::new(1, 2));
        let plus = solved(&model, SectorKey::new(2, 2));
        let minus = solved(&model, SectorKey::new(0, 2));
        let add = project_exact(Spin::Up, FermionOp::Create, 0, &sct_i, &plus).unwrap();
        let rem = project_exact(Spin::Up, FermionOp::Annihilate, 0, &sct_i, &minus).unwrap();
        for l in 0..sct_i.eigvals().len() {
            let total = add.col(l).squared_norm_l2() + rem.col(l).squared_norm_l2();
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_requires_solved_sector() {
        let sct_i = Sector::empty(2, SectorKey::new(1, 1));
        let sct_j = Sector::empty(2, SectorKey::new(2, 1));
        assert!(project(Spin::Up, FermionOp::Create, 0, &sct_i, &sct_j).is_err());
    }
}
