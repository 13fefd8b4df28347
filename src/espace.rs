//! The eigen-space: the collection of diagonalized sectors of a model.
//!
//! [`Espace::build`] walks every `(N↑, N↓)` sector, diagonalizes it and records
//! the global ground-state energy. [`Espace::screen`] then drops eigenpairs
//! whose Boltzmann weight is negligible at the target temperature, which is
//! what keeps the Green's-function assembly cheap at low temperature.

use std::collections::HashMap;

use log::{debug, info};

use crate::{
    config::EdConfig,
    error::{EdError, EdErrorKind},
    model::ImpurityModel,
    sector::{EigenCounts, Sector, SectorKey, Spectrum},
    solvers::solve_sector,
};

/// Diagonalized sectors of a model with `n` orbitals.
#[derive(Clone, Debug)]
pub struct Espace {
    n: usize,
    sectors: HashMap<SectorKey, Sector>,
    egs: f64,
}

impl Espace {
    /// Diagonalizes all sectors of `model`.
    ///
    /// With `counts`, sector `key` is solved for its `counts.get(key)` lowest
    /// eigenpairs and skipped when that count is 0. Without `counts`, the full
    /// spectrum of every sector is computed densely.
    ///
    /// # Errors
    /// Propagates the first sector failure, tagged with the sector key.
    pub fn build(
        model: &ImpurityModel,
        counts: Option<&EigenCounts>,
        config: &EdConfig,
    ) -> Result<Self, EdError> {
        let n = model.n();
        if let Some(counts) = counts {
            if counts.n() != n {
                return Err(EdErrorKind::DimensionMismatch {
                    expected: n,
                    actual: counts.n(),
                }
                .into());
            }
        }

        let mut sectors = HashMap::new();
        let mut egs = f64::INFINITY;
        for key in SectorKey::all(n) {
            let k = counts.map(|c| c.get(key));
            if k == Some(0) {
                continue;
            }
            let sct = Sector::empty(n, key);
            let (eigvals, eigvecs) =
                solve_sector(model, sct.states_up(), sct.states_dw(), k, config)
                    .map_err(|e| e.in_sector(key))?;
            debug!(
                "sector ({}, {}): d = {}, {} eigenpairs, E_min = {:.8}",
                key.nup,
                key.ndw,
                sct.d(),
                eigvals.len(),
                eigvals[0]
            );
            egs = egs.min(eigvals[0]);
            sectors.insert(key, sct.with_spectrum(Spectrum::Solved { eigvals, eigvecs }));
        }
        if sectors.is_empty() {
            return Err(EdErrorKind::InputError("no sector was requested".to_string()).into());
        }

        let espace = Self { n, sectors, egs };
        info!(
            "built eigen-space: {} sectors, {} states, E_gs = {:.8}",
            espace.sectors.len(),
            espace.n_states(),
            egs
        );
        Ok(espace)
    }

    /// Keeps only eigenpairs with `exp(-beta (E - E_gs)) > cutoff` and drops
    /// sectors left without any. Unsolved sectors are left untouched.
    pub fn screen(&mut self, beta: f64, cutoff: f64) {
        let before = self.n_states();
        let egs = self.egs;
        let sectors = std::mem::take(&mut self.sectors);
        self.sectors = sectors
            .into_iter()
            .filter_map(|(key, sct)| {
                let Some(eigvecs) = sct.eigvecs() else {
                    return Some((key, sct));
                };
                // Eigenvalues are ascending, so the survivors form a prefix.
                let keep = sct
                    .eigvals()
                    .iter()
                    .take_while(|&&e| (-beta * (e - egs)).exp() > cutoff)
                    .count();
                if keep == 0 {
                    return None;
                }
                if keep == sct.eigvals().len() {
                    return Some((key, sct));
                }
                let spectrum = Spectrum::Solved {
                    eigvals: sct.eigvals()[..keep].to_vec(),
                    eigvecs: eigvecs.as_ref().get(.., 0..keep).to_owned(),
                };
                Some((key, sct.with_spectrum(spectrum)))
            })
            .collect();
        info!(
            "screening (beta = {beta}, cutoff = {cutoff:e}): kept {} of {} states in {} sectors",
            self.n_states(),
            before,
            self.sectors.len()
        );
    }

    /// `Σ exp(-beta (E - E_gs))` over all stored eigenvalues.
    pub fn partition_function(&self, beta: f64) -> f64 {
        self.sectors()
            .into_iter()
            .flat_map(|sct| sct.eigvals())
            .map(|&e| (-beta * (e - self.egs)).exp())
            .sum()
    }

    /// Total number of stored eigenpairs.
    pub fn n_states(&self) -> usize {
        self.sectors.values().map(|sct| sct.eigvals().len()).sum()
    }

    /// Returns a copy of sector `key`, or a freshly enumerated unsolved sector
    /// if it is not stored.
    pub fn get_or_build(&self, key: SectorKey) -> Sector {
        self.sectors
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Sector::empty(self.n, key))
    }

    pub fn get(&self, key: SectorKey) -> Option<&Sector> {
        self.sectors.get(&key)
    }

    /// Stored sectors in ascending key order.
    pub fn sectors(&self) -> Vec<&Sector> {
        let mut sectors: Vec<&Sector> = self.sectors.values().collect();
        sectors.sort_by_key(|sct| sct.key());
        sectors
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Number of orbitals.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Global ground-state energy.
    pub fn egs(&self) -> f64 {
        self.egs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverParams;

    fn single_site(eps: f64, u: f64) -> ImpurityModel {
        ImpurityModel::hubbard_chain(1, 0.0, eps, u).unwrap()
    }

    #[test]
    fn test_single_site_levels() {
        let espace = Espace::build(&single_site(-1.0, 0.5), None, &EdConfig::default()).unwrap();
        assert_eq!(espace.len(), 4);
        assert_eq!(espace.n_states(), 4);
        assert!((espace.egs() + 1.5).abs() < 1e-14);
        let vacuum = espace.get(SectorKey::new(0, 0)).unwrap();
        assert_eq!(vacuum.eigvals().len(), 1);
        assert!(vacuum.eigvals()[0].abs() < 1e-14);
        assert!((espace.get(SectorKey::new(1, 0)).unwrap().eigvals()[0] + 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_partition_function() {
        let espace = Espace::build(&single_site(-1.0, 0.5), None, &EdConfig::default()).unwrap();
        assert!((espace.partition_function(0.0) - 4.0).abs() < 1e-14);
        let beta: f64 = 2.0;
        let expected = 1.0 + (-beta * 1.5).exp() + 2.0 * (-beta * 0.5).exp();
        assert!((espace.partition_function(beta) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_full_hilbert_space_is_covered() {
        let model = ImpurityModel::hubbard_chain(3, 1.0, 0.2, 2.0).unwrap();
        let espace = Espace::build(&model, None, &EdConfig::default()).unwrap();
        assert_eq!(espace.len(), 16);
        assert_eq!(espace.n_states(), 64);
        assert!((espace.partition_function(0.0) - 64.0).abs() < 1e-10);
    }

    #[test]
    fn test_unique_ground_state_survives_screening() {
        let mut espace = Espace::build(&single_site(-1.0, 0.5), None, &EdConfig::default()).unwrap();
        espace.screen(1e6, 1e-9);
        assert_eq!(espace.n_states(), 1);
        assert_eq!(espace.len(), 1);
        assert_eq!(espace.get(SectorKey::new(1, 1)).unwrap().eigvals().len(), 1);
        assert!((espace.partition_function(1e6) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_screening_is_idempotent_and_bounded() {
        let model = ImpurityModel::hubbard_chain(3, 1.0, -0.3, 1.5).unwrap();
        let mut espace = Espace::build(&model, None, &EdConfig::default()).unwrap();
        let (beta, cutoff) = (4.0, 1e-3);
        let z_before = espace.partition_function(beta);
        let n_before = espace.n_states();

        espace.screen(beta, cutoff);
        let z_after = espace.partition_function(beta);
        let n_after = espace.n_states();
        assert!(n_after < n_before);
        assert!(z_before - z_after <= (n_before - n_after) as f64 * cutoff + 1e-12);

        espace.screen(beta, cutoff);
        assert_eq!(espace.n_states(), n_after);
        assert_eq!(espace.partition_function(beta), z_after);
    }

    #[test]
    fn test_eigen_counts_skip_and_iterate() {
        let model = ImpurityModel::hubbard_chain(4, 1.0, 0.0, 2.0).unwrap();
        let counts = EigenCounts::uniform(4, 3).with(SectorKey::new(0, 0), 0);
        let config = EdConfig {
            solver: SolverParams {
                dense_threshold: 0,
                ..SolverParams::default()
            },
            ..EdConfig::default()
        };
        let espace = Espace::build(&model, Some(&counts), &config).unwrap();
        assert!(espace.get(SectorKey::new(0, 0)).is_none());
        assert_eq!(espace.len(), 24);
        // C(4, 1) * C(4, 0) = 4 >= 3, the iterative solver returns exactly 3 pairs.
        assert_eq!(espace.get(SectorKey::new(1, 0)).unwrap().eigvals().len(), 3);
        // A single-state sector can only return one pair.
        assert_eq!(espace.get(SectorKey::new(4, 4)).unwrap().eigvals().len(), 1);
    }

    #[test]
    fn test_dense_and_iterative_espace_agree_with_full_counts() {
        let model = ImpurityModel::anderson_star(-1.0, 2.0, &[-0.5, 0.5, 1.0], &[0.4, 0.5, 0.3]).unwrap();
        let dense = Espace::build(&model, None, &EdConfig::default()).unwrap();
        let config = EdConfig {
            solver: SolverParams {
                dense_threshold: 0,
                ..SolverParams::default()
            },
            ..EdConfig::default()
        };
        let iterative = Espace::build(&model, Some(&EigenCounts::full(4)), &config).unwrap();
        assert!((dense.egs() - iterative.egs()).abs() < 1e-10);
        for key in SectorKey::all(4) {
            let a = dense.get(key).unwrap().eigvals();
            let b = iterative.get(key).unwrap().eigvals();
            assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                assert!((x - y).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_get_or_build() {
        let mut espace = Espace::build(&single_site(-1.0, 0.5), None, &EdConfig::default()).unwrap();
        espace.screen(1e6, 1e-9);
        let stored = espace.get_or_build(SectorKey::new(1, 1));
        assert!(stored.eigvecs().is_some());
        let fresh = espace.get_or_build(SectorKey::new(1, 0));
        assert!(fresh.eigvecs().is_none());
        assert_eq!(fresh.d(), 1);
    }

    #[test]
    fn test_rejects_mismatched_counts() {
        let counts = EigenCounts::uniform(2, 1);
        let err = Espace::build(&single_site(0.0, 1.0), Some(&counts), &EdConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Dimension mismatch: expected 1, found 2.");
    }
}
