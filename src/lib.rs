//! Sector-resolved exact diagonalization of quantum impurity models.
//!
//! This crate computes the many-body spectrum and the single-particle Green's
//! function of a finite set of interacting orbitals (an impurity coupled to a
//! small bath, or a short lattice) by exact diagonalization. The Hilbert space
//! is split into sectors of fixed particle number per spin, whose basis states
//! are bitmasks ([`fock`]).
//!
//! ## Pipeline
//!
//! 1. [`Espace::build`] diagonalizes every `(N↑, N↓)` sector. Small sectors go
//!    through faer's dense self-adjoint eigensolver, large ones through a
//!    Lanczos eigensolver running on the implicit [`SectorHamiltonian`].
//! 2. [`Espace::screen`] discards eigenstates with negligible Boltzmann weight.
//! 3. [`build_gf_lanczos`] assembles the Green's function from transitions into
//!    the `N ± 1` sectors: exact poles for small arrival sectors, Lanczos
//!    continued fractions (or their pole expansion) for large ones.
//!
//! Sector Hamiltonians implement [`faer::matrix_free::LinOp`], so the Lanczos
//! routines in [`algorithms`] never need the matrix elements explicitly.
//!
//! ## Example
//!
//! A single Anderson impurity with two bath levels:
//!
//! ```rust
//! use impurity_ed::{EdConfig, Espace, ImpurityModel, build_gf_lanczos};
//!
//! # fn main() -> Result<(), impurity_ed::EdError> {
//! let model = ImpurityModel::anderson_star(-1.0, 2.0, &[-0.5, 0.5], &[0.4, 0.4])?;
//! let config = EdConfig::default();
//!
//! let mut espace = Espace::build(&model, None, &config)?;
//! espace.screen(config.gf.beta, config.screen.cutoff);
//!
//! let gf = build_gf_lanczos(&model, &espace, &config)?;
//! let dos = gf.spectral_function(&[-2.0, -1.0, 0.0, 1.0, 2.0], 0.1);
//! assert!(dos.iter().all(|&a| a >= 0.0));
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod espace;
pub mod fock;
pub mod gf;
pub mod hamiltonian;
pub mod model;
pub mod operator;
pub mod operators;
pub mod sector;
pub mod solvers;

pub use config::{EdConfig, GfParams, LocalParams, Representation, ScreenParams, SolverParams};
pub use error::EdError;
pub use espace::Espace;
pub use fock::FockState;
pub use gf::{GfTerm, GreensFunction, build_gf_exact, build_gf_lanczos};
pub use hamiltonian::SectorHamiltonian;
pub use model::ImpurityModel;
pub use operator::ManyBodyOperator;
pub use sector::{EigenCounts, Sector, SectorKey, Spectrum, Spin};
pub use solvers::solve_sector;
