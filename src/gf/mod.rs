//! Single-particle Green's function from the eigen-space.
//!
//! At inverse temperature `β` the retarded Green's function of orbital `i`
//! and spin `σ` is the Lehmann sum
//!
//! ```text
//!            1                       ⎡ |⟨J|c†|I⟩|²          |⟨J|c|I⟩|²      ⎤
//! G(z) =   ─── Σ   e^{-β(E_I-E_gs)}  ⎢ ─────────────── + ─────────────── ⎥
//!           Z  I,J                   ⎣ z - (E_J - E_I)   z - (E_I - E_J) ⎦
//! ```
//!
//! For every stored eigenstate `I`, small arrival sectors are diagonalized
//! densely and contribute their poles directly. Large arrival sectors are never
//! diagonalized: the resolvent `⟨v|(z - H_J + E_I)^{-1}|v⟩` with
//! `v = c†|I⟩` (or `c|I⟩`) is expanded by Lanczos tridiagonalization, either as
//! a continued fraction or through the eigendecomposition of `T_k`.

pub mod project;

use faer::{
    Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};
use log::{debug, info, warn};
use num_complex::Complex64;
use rayon::prelude::*;

pub use project::{project, project_exact};

use crate::{
    algorithms::{
        breakdown_tolerance, eigh_tridiagonal,
        lanczos::{TridiagonalCoefficients, tridiagonalize},
    },
    config::{EdConfig, Representation},
    error::{EdError, EdErrorKind},
    espace::Espace,
    hamiltonian::SectorHamiltonian,
    model::ImpurityModel,
    operators::FermionOp,
    sector::{Sector, SectorKey, Spectrum, Spin},
    solvers::solve_dense,
};

/// One additive contribution to the Green's function (not yet divided by `Z`).
#[derive(Clone, Debug, PartialEq)]
pub enum GfTerm {
    /// `b[0] / (z - a[0] - b[1] / (z - a[1] - ...))`, with `b` already squared
    /// and `b[0]` already carrying the Boltzmann weight.
    ContinuedFraction { a: Vec<f64>, b: Vec<f64> },
    /// `Σ_r weights[r] / (z - poles[r])`.
    Spectral { poles: Vec<f64>, weights: Vec<f64> },
}

impl GfTerm {
    /// Evaluates the term at complex frequency `z`.
    pub fn eval(&self, z: Complex64) -> Complex64 {
        match self {
            GfTerm::ContinuedFraction { a, b } => a
                .iter()
                .zip(b)
                .rev()
                .fold(Complex64::new(0.0, 0.0), |g, (&a_k, &b_k)| b_k / (z - a_k - g)),
            GfTerm::Spectral { poles, weights } => poles
                .iter()
                .zip(weights)
                .map(|(&p, &w)| w / (z - p))
                .sum(),
        }
    }

    /// Continued-fraction term of an eigenstate with energy `e_i` and Boltzmann
    /// weight `weight`. `sign` is `+1` for particle addition and `-1` for removal.
    pub fn continued_fraction(coeffs: &TridiagonalCoefficients, e_i: f64, weight: f64, sign: f64) -> Self {
        let a = coeffs.a.iter().map(|&a| sign * (a - e_i)).collect();
        let mut b: Vec<f64> = coeffs.b.iter().map(|&b| b * b).collect();
        b[0] *= weight;
        GfTerm::ContinuedFraction { a, b }
    }

    /// Pole representation of the same contribution, from the eigendecomposition
    /// of the tridiagonal matrix.
    pub fn spectral(coeffs: &TridiagonalCoefficients, e_i: f64, weight: f64, sign: f64) -> Result<Self, EdError> {
        let (eps, u) = eigh_tridiagonal(&coeffs.a, &coeffs.b[1..])?;
        let b0 = coeffs.b[0];
        let poles = eps.iter().map(|&e| sign * (e - e_i)).collect();
        let weights = (0..eps.len()).map(|r| (u[(0, r)] * b0).powi(2) * weight).collect();
        Ok(GfTerm::Spectral { poles, weights })
    }
}

/// Green's function as a sum of terms normalized by the partition function.
#[derive(Clone, Debug, PartialEq)]
pub struct GreensFunction {
    terms: Vec<GfTerm>,
    z: f64,
}

impl GreensFunction {
    pub fn new(terms: Vec<GfTerm>, z: f64) -> Self {
        Self { terms, z }
    }

    pub fn terms(&self) -> &[GfTerm] {
        &self.terms
    }

    /// Partition function used for normalization.
    pub fn partition_function(&self) -> f64 {
        self.z
    }

    /// `G(e + iη)`.
    pub fn eval(&self, e: f64, eta: f64) -> Complex64 {
        let z = Complex64::new(e, eta);
        self.terms.iter().map(|t| t.eval(z)).sum::<Complex64>() / self.z
    }

    /// Evaluates `G` on a grid of real energies, in parallel.
    pub fn eval_many(&self, energies: &[f64], eta: f64) -> Vec<Complex64> {
        energies.par_iter().map(|&e| self.eval(e, eta)).collect()
    }

    /// Spectral function `A(e) = -Im G(e + iη) / π`.
    pub fn spectral_function(&self, energies: &[f64], eta: f64) -> Vec<f64> {
        self.eval_many(energies, eta)
            .into_iter()
            .map(|g| -g.im / std::f64::consts::PI)
            .collect()
    }
}

/// A particle-addition or particle-removal channel.
#[derive(Clone, Copy, Debug)]
struct Channel {
    op: FermionOp,
    sign: f64,
}

const CHANNELS: [Channel; 2] = [
    Channel {
        op: FermionOp::Create,
        sign: 1.0,
    },
    Channel {
        op: FermionOp::Annihilate,
        sign: -1.0,
    },
];

impl Channel {
    fn target(self, key: SectorKey, n: usize, spin: Spin) -> Result<SectorKey, EdError> {
        match self.op {
            FermionOp::Create => key.create_target(n, spin),
            FermionOp::Annihilate => key.annihilate_target(n, spin),
        }
    }
}

/// Builds the Green's function of orbital `config.gf.pos` and spin
/// `config.gf.spin` from a (typically screened) eigen-space.
///
/// Arrival sectors with `d ≤ config.solver.dense_threshold` are solved densely
/// and contribute exact poles; larger ones are handled by Lanczos
/// tridiagonalization in the representation `config.gf.repr`.
pub fn build_gf_lanczos(
    model: &ImpurityModel,
    espace: &Espace,
    config: &EdConfig,
) -> Result<GreensFunction, EdError> {
    let params = &config.gf;
    let n = espace.n();
    if params.pos >= n {
        return Err(EdErrorKind::InputError(format!(
            "orbital {} does not exist in a model with {n} orbitals",
            params.pos
        ))
        .into());
    }
    let egs = espace.egs();
    let mut terms = Vec::new();

    for sct_i in espace.sectors() {
        let key_i = sct_i.key();
        let exponents: Vec<f64> = sct_i
            .eigvals()
            .iter()
            .map(|&e| (-params.beta * (e - egs)).exp())
            .collect();

        for channel in CHANNELS {
            let key_j = match channel.target(key_i, n, params.spin) {
                Ok(key) => key,
                Err(e) if e.is_no_such_sector() => continue,
                Err(e) => return Err(e),
            };
            let sct_j = espace.get_or_build(key_j);
            let before = terms.len();
            let added = if sct_j.d() <= config.solver.dense_threshold {
                add_exact_terms(model, sct_i, sct_j, channel, &exponents, config, &mut terms)
            } else {
                add_lanczos_terms(model, sct_i, &sct_j, channel, &exponents, config, &mut terms)
            };
            added.map_err(|e| e.in_sector(key_j))?;
            debug!(
                "transition ({}, {}) -> ({}, {}): {} terms",
                key_i.nup,
                key_i.ndw,
                key_j.nup,
                key_j.ndw,
                terms.len() - before
            );
        }
    }

    let z = espace.partition_function(params.beta);
    info!("assembled Green's function: {} terms, Z = {z:.6e}", terms.len());
    Ok(GreensFunction::new(terms, z))
}

/// Reference Green's function with every arrival sector diagonalized densely.
pub fn build_gf_exact(
    model: &ImpurityModel,
    espace: &Espace,
    config: &EdConfig,
) -> Result<GreensFunction, EdError> {
    let mut config = config.clone();
    config.solver.dense_threshold = usize::MAX;
    build_gf_lanczos(model, espace, &config)
}

fn add_exact_terms(
    model: &ImpurityModel,
    sct_i: &Sector,
    sct_j: Sector,
    channel: Channel,
    exponents: &[f64],
    config: &EdConfig,
    terms: &mut Vec<GfTerm>,
) -> Result<(), EdError> {
    let sct_j = if sct_j.eigvals().len() == sct_j.d() {
        sct_j
    } else {
        let ham = SectorHamiltonian::for_sector(model, &sct_j, &config.local)?;
        let (eigvals, eigvecs) = solve_dense(&ham)?;
        sct_j.with_spectrum(Spectrum::Solved { eigvals, eigvecs })
    };
    let amp = project_exact(config.gf.spin, channel.op, config.gf.pos, sct_i, &sct_j)?;

    let (e_i, e_j) = (sct_i.eigvals(), sct_j.eigvals());
    let mut poles = Vec::with_capacity(e_i.len() * e_j.len());
    let mut weights = Vec::with_capacity(e_i.len() * e_j.len());
    for (l, (&ei, &exponent)) in e_i.iter().zip(exponents).enumerate() {
        for (lp, &ej) in e_j.iter().enumerate() {
            poles.push(channel.sign * (ej - ei));
            weights.push(amp[(lp, l)].powi(2) * exponent);
        }
    }
    terms.push(GfTerm::Spectral { poles, weights });
    Ok(())
}

fn add_lanczos_terms(
    model: &ImpurityModel,
    sct_i: &Sector,
    sct_j: &Sector,
    channel: Channel,
    exponents: &[f64],
    config: &EdConfig,
    terms: &mut Vec<GfTerm>,
) -> Result<(), EdError> {
    let v0 = project(config.gf.spin, channel.op, config.gf.pos, sct_i, sct_j)?;
    let ham = SectorHamiltonian::for_sector(model, sct_j, &config.local)?;
    let mut mem = MemBuffer::new(ham.apply_scratch(1, Par::Seq));
    let stack = MemStack::new(&mut mem);

    for (l, (&e_i, &exponent)) in sct_i.eigvals().iter().zip(exponents).enumerate() {
        let v = v0.as_ref().get(l..l + 1, ..).transpose();
        if v.norm_l2() <= breakdown_tolerance() {
            warn!(
                "eigenstate {l} of sector ({}, {}) has no weight in sector ({}, {}), skipped",
                sct_i.key().nup,
                sct_i.key().ndw,
                sct_j.key().nup,
                sct_j.key().ndw
            );
            continue;
        }
        let coeffs = tridiagonalize(&ham, v, config.gf.max_depth, stack)?;
        terms.push(match config.gf.repr {
            Representation::ContinuedFraction => {
                GfTerm::continued_fraction(&coeffs, e_i, exponent, channel.sign)
            }
            Representation::Spectral => GfTerm::spectral(&coeffs, e_i, exponent, channel.sign)?,
        });
    }
    Ok(())
}
