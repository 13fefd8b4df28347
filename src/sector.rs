//! Fixed particle-number sectors of the many-body Hilbert space.
//!
//! A sector collects all basis states with `nup` up-spin and `ndw` down-spin
//! particles. Its basis is the product of the sorted up-states and the sorted
//! down-states, flattened with the composite index `iup + idw * dup`.

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{EdError, EdErrorKind},
    fock::{FockState, generate_states},
};

/// Spin channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spin {
    Up,
    Down,
}

impl Spin {
    /// Index of the spin channel (0 for up, 1 for down).
    pub fn index(self) -> usize {
        match self {
            Spin::Up => 0,
            Spin::Down => 1,
        }
    }
}

/// Identifies a sector by its particle numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorKey {
    pub nup: usize,
    pub ndw: usize,
}

impl SectorKey {
    pub fn new(nup: usize, ndw: usize) -> Self {
        Self { nup, ndw }
    }

    /// Sequential index of the sector among the `(n + 1)^2` sectors of `n` orbitals.
    pub fn index(self, n: usize) -> usize {
        self.nup * (n + 1) + self.ndw
    }

    /// All sectors of `n` orbitals, in sequential-index order.
    pub fn all(n: usize) -> impl Iterator<Item = SectorKey> {
        (0..=n).flat_map(move |nup| (0..=n).map(move |ndw| SectorKey::new(nup, ndw)))
    }

    /// Sector reached by adding one particle of the given spin.
    pub fn create_target(self, n: usize, spin: Spin) -> Result<SectorKey, EdError> {
        let (nup, ndw) = match spin {
            Spin::Up => (self.nup + 1, self.ndw),
            Spin::Down => (self.nup, self.ndw + 1),
        };
        if nup > n || ndw > n {
            return Err(EdErrorKind::NoSuchSector {
                nup: nup as isize,
                ndw: ndw as isize,
                n,
            }
            .into());
        }
        Ok(SectorKey::new(nup, ndw))
    }

    /// Sector reached by removing one particle of the given spin.
    pub fn annihilate_target(self, n: usize, spin: Spin) -> Result<SectorKey, EdError> {
        let (nup, ndw) = match spin {
            Spin::Up => (self.nup as isize - 1, self.ndw as isize),
            Spin::Down => (self.nup as isize, self.ndw as isize - 1),
        };
        if nup < 0 || ndw < 0 {
            return Err(EdErrorKind::NoSuchSector { nup, ndw, n }.into());
        }
        Ok(SectorKey::new(nup as usize, ndw as usize))
    }
}

/// Spectrum of a sector: absent until the sector has been diagonalized.
#[derive(Clone, Debug, Default)]
pub enum Spectrum {
    #[default]
    Unsolved,
    Solved {
        /// Eigenvalues in ascending order.
        eigvals: Vec<f64>,
        /// Eigenvectors as columns (`d x eigvals.len()`), aligned with `eigvals`.
        eigvecs: Mat<f64>,
    },
}

/// A fixed-(nup, ndw) sector with its basis and (possibly absent) spectrum.
#[derive(Clone, Debug)]
pub struct Sector {
    key: SectorKey,
    states_up: Vec<FockState>,
    states_dw: Vec<FockState>,
    spectrum: Spectrum,
}

impl Sector {
    /// Enumerates the basis of sector `key` on `n` orbitals, without spectrum.
    pub fn empty(n: usize, key: SectorKey) -> Self {
        Self {
            key,
            states_up: generate_states(n, key.nup),
            states_dw: generate_states(n, key.ndw),
            spectrum: Spectrum::Unsolved,
        }
    }

    /// Returns the same sector with its spectrum replaced.
    pub fn with_spectrum(self, spectrum: Spectrum) -> Self {
        Self { spectrum, ..self }
    }

    pub fn key(&self) -> SectorKey {
        self.key
    }

    pub fn states_up(&self) -> &[FockState] {
        &self.states_up
    }

    pub fn states_dw(&self) -> &[FockState] {
        &self.states_dw
    }

    /// Number of up-states.
    pub fn dup(&self) -> usize {
        self.states_up.len()
    }

    /// Number of down-states.
    pub fn dwn(&self) -> usize {
        self.states_dw.len()
    }

    /// Sector dimension `dup * dwn`.
    pub fn d(&self) -> usize {
        self.dup() * self.dwn()
    }

    /// Eigenvalues, or an empty slice if the sector is unsolved.
    pub fn eigvals(&self) -> &[f64] {
        match &self.spectrum {
            Spectrum::Solved { eigvals, .. } => eigvals,
            Spectrum::Unsolved => &[],
        }
    }

    /// Eigenvectors, if the sector is solved.
    pub fn eigvecs(&self) -> Option<&Mat<f64>> {
        match &self.spectrum {
            Spectrum::Solved { eigvecs, .. } => Some(eigvecs),
            Spectrum::Unsolved => None,
        }
    }

    /// Composite index of the basis state (iup, idw).
    #[inline]
    pub fn composite_index(&self, iup: usize, idw: usize) -> usize {
        iup + idw * self.dup()
    }
}

/// Number of eigenpairs requested for every sector of `n` orbitals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EigenCounts {
    n: usize,
    counts: Vec<usize>,
}

impl EigenCounts {
    /// Requests `k` eigenpairs in every sector.
    pub fn uniform(n: usize, k: usize) -> Self {
        Self {
            n,
            counts: vec![k; (n + 1) * (n + 1)],
        }
    }

    /// Requests the full spectrum of every sector.
    pub fn full(n: usize) -> Self {
        let counts = SectorKey::all(n)
            .map(|key| crate::fock::sector_dim(n, key.nup, key.ndw))
            .collect();
        Self { n, counts }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, key: SectorKey) -> usize {
        self.counts[key.index(self.n)]
    }

    pub fn set(&mut self, key: SectorKey, k: usize) {
        let idx = key.index(self.n);
        self.counts[idx] = k;
    }

    /// Returns the counts with sector `key` set to `k`.
    pub fn with(mut self, key: SectorKey, k: usize) -> Self {
        self.set(key, k);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fock::sector_dim;

    #[test]
    fn test_sector_index_is_sequential() {
        let n = 3;
        let indices: Vec<usize> = SectorKey::all(n).map(|k| k.index(n)).collect();
        assert_eq!(indices, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_targets() {
        let n = 2;
        let key = SectorKey::new(2, 0);
        assert!(key.create_target(n, Spin::Up).unwrap_err().is_no_such_sector());
        assert_eq!(key.create_target(n, Spin::Down).unwrap(), SectorKey::new(2, 1));
        assert_eq!(key.annihilate_target(n, Spin::Up).unwrap(), SectorKey::new(1, 0));
        assert!(key.annihilate_target(n, Spin::Down).unwrap_err().is_no_such_sector());
    }

    #[test]
    fn test_composite_index_is_bijection() {
        let n = 4;
        for key in SectorKey::all(n) {
            let sct = Sector::empty(n, key);
            assert_eq!(sct.d(), sector_dim(n, key.nup, key.ndw));
            let mut seen = vec![false; sct.d()];
            for idw in 0..sct.dwn() {
                for iup in 0..sct.dup() {
                    let i = sct.composite_index(iup, idw);
                    assert!(!seen[i]);
                    seen[i] = true;
                }
            }
            assert!(seen.into_iter().all(|s| s));
        }
    }

    #[test]
    fn test_with_spectrum_transitions_once() {
        let sct = Sector::empty(2, SectorKey::new(1, 1));
        assert!(sct.eigvecs().is_none());
        let d = sct.d();
        let solved = sct.with_spectrum(Spectrum::Solved {
            eigvals: vec![0.0; d],
            eigvecs: Mat::identity(d, d),
        });
        assert!(solved.eigvecs().is_some());
        assert_eq!(solved.eigvals().len(), 4);
    }

    #[test]
    fn test_eigen_counts() {
        let n = 2;
        let counts = EigenCounts::uniform(n, 3).with(SectorKey::new(0, 0), 0);
        assert_eq!(counts.get(SectorKey::new(0, 0)), 0);
        assert_eq!(counts.get(SectorKey::new(1, 1)), 3);
        let full = EigenCounts::full(n);
        assert_eq!(full.get(SectorKey::new(1, 1)), 4);
        assert_eq!(full.get(SectorKey::new(2, 0)), 1);
    }
}
