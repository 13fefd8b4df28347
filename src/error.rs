//! This module defines the error type of the library.
//!
//! All failure modes of the diagonalization engine and of the Green's-function
//! builder are collected in a single enum, [`EdErrorKind`], wrapped by the public
//! [`EdError`] struct so that new kinds can be added without breaking callers.
//!
//! [`faer::linalg::evd::EvdError`] does not implement [`std::error::Error`], so it
//! is wrapped manually instead of through `#[from]`.
use thiserror::Error;

use crate::sector::SectorKey;

/// Represents all possible errors raised while building sectors, spectra and
/// Green's functions.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct EdError(#[from] EdErrorKind);

impl EdError {
    /// Returns `true` if the error signals a transition into a sector that does
    /// not exist (adding a particle to a full channel or removing one from an
    /// empty channel). Callers treat this as "no such channel" and move on.
    pub fn is_no_such_sector(&self) -> bool {
        matches!(self.0, EdErrorKind::NoSuchSector { .. })
    }

    /// Returns `true` if an iterative eigensolver ran out of iterations.
    pub fn is_no_convergence(&self) -> bool {
        match &self.0 {
            EdErrorKind::NoConvergence { .. } => true,
            EdErrorKind::Sector { inner, .. } => {
                matches!(**inner, EdErrorKind::NoConvergence { .. })
            }
            _ => false,
        }
    }

    /// Attaches the key of the sector being processed to the error.
    pub(crate) fn in_sector(self, key: SectorKey) -> Self {
        match self.0 {
            // Keep the innermost sector: it is the one that actually failed.
            EdErrorKind::Sector { .. } => self,
            kind => EdError(EdErrorKind::Sector {
                nup: key.nup,
                ndw: key.ndw,
                inner: Box::new(kind),
            }),
        }
    }
}

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum EdErrorKind {
    /// A creation or annihilation would leave the allowed particle range [0, n].
    #[error("No such sector: (N_up={nup}, N_dw={ndw}) is outside [0, {n}].")]
    NoSuchSector { nup: isize, ndw: isize, n: usize },

    /// A state that must be part of a sector basis was not found in it.
    #[error("State {state:#b} is not part of the sector basis.")]
    StateNotFound { state: u64 },

    /// The iterative eigensolver did not converge the requested eigenpairs.
    #[error(
        "Lanczos eigensolver did not converge: {converged} of {requested} eigenpairs after {iterations} iterations (dim={dim})."
    )]
    NoConvergence {
        dim: usize,
        requested: usize,
        converged: usize,
        iterations: usize,
    },

    /// The dimensions of an operator and a vector (or two matrices) are incompatible.
    #[error("Dimension mismatch: expected {expected}, found {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("A numerical error occurred during a dense eigendecomposition: {0:?}")]
    EvdError(faer::linalg::evd::EvdError),

    /// Adds the sector that was being processed to an inner error.
    #[error("Sector (N_up={nup}, N_dw={ndw}): {inner}")]
    Sector {
        nup: usize,
        ndw: usize,
        #[source]
        inner: Box<EdErrorKind>,
    },
}

impl From<faer::linalg::evd::EvdError> for EdError {
    fn from(err: faer::linalg::evd::EvdError) -> Self {
        EdError(EdErrorKind::EvdError(err))
    }
}

impl PartialEq for EdError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
