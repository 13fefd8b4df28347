//! Parameters consumed by the diagonalization engine and the Green's-function
//! builder.
//!
//! Every parameter group implements [`Default`] with the values used throughout
//! the crate, and can be (de)serialized with serde so that drivers may store the
//! exact configuration next to their results.

use serde::{Deserialize, Serialize};

use crate::sector::Spin;

/// Parameters of the local (density-density) part of the Hamiltonian.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalParams {
    /// Chemical potential, added to every on-site level.
    pub mu: f64,
    /// Mean-field (Hartree-Fock) decoupling of the on-site interaction.
    pub hf_mode: bool,
    /// Reference occupation `z_i` subtracted in the inter-site interaction.
    /// `None` means all zeros, or all ones in mean-field mode.
    pub z: Option<Vec<f64>>,
}

impl Default for LocalParams {
    fn default() -> Self {
        Self {
            mu: 0.0,
            hf_mode: false,
            z: None,
        }
    }
}

impl LocalParams {
    /// Resolves the reference occupation for `n` orbitals.
    pub fn reference_occupation(&self, n: usize) -> Vec<f64> {
        match &self.z {
            Some(z) => z.clone(),
            None if self.hf_mode => vec![1.0; n],
            None => vec![0.0; n],
        }
    }
}

/// Eigensolver policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Sectors with dimension up to this value are always diagonalized densely.
    pub dense_threshold: usize,
    /// Maximum number of Lanczos iterations of the iterative eigensolver.
    pub max_iter: usize,
    /// Residual norm below which a Ritz pair counts as converged.
    pub tol: f64,
    /// Seed of the random start vector of the iterative eigensolver.
    pub seed: u64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            dense_threshold: 10,
            max_iter: 1000,
            tol: 1e-10,
            seed: 42,
        }
    }
}

/// Thermal screening of the eigen-space, at the temperature of [`GfParams::beta`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenParams {
    /// Eigenstates with `exp(-beta (E - E_gs)) <= cutoff` are discarded.
    pub cutoff: f64,
}

impl Default for ScreenParams {
    fn default() -> Self {
        Self { cutoff: 1e-9 }
    }
}

/// Form in which Lanczos contributions to the Green's function are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Representation {
    /// Continued fraction built from the Lanczos coefficients.
    ContinuedFraction,
    /// Poles and weights of the diagonalized tridiagonal matrix.
    Spectral,
}

/// Parameters of the Green's-function builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GfParams {
    /// Inverse temperature of the Boltzmann weights, shared with screening.
    pub beta: f64,
    /// Orbital on which the Green's function is computed.
    pub pos: usize,
    /// Spin channel.
    pub spin: Spin,
    /// Representation of the Lanczos terms.
    pub repr: Representation,
    /// Maximum depth of the continued fractions.
    pub max_depth: usize,
}

impl Default for GfParams {
    fn default() -> Self {
        Self {
            beta: 1e3,
            pos: 0,
            spin: Spin::Up,
            repr: Representation::ContinuedFraction,
            max_depth: 500,
        }
    }
}

/// All parameters of an exact-diagonalization run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdConfig {
    pub local: LocalParams,
    pub solver: SolverParams,
    pub screen: ScreenParams,
    pub gf: GfParams,
}
