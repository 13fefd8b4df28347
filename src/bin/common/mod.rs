//! Command-line arguments shared by the driver executables.

use anyhow::{Result, ensure};
use clap::{Parser, ValueEnum};
use impurity_ed::{ImpurityModel, LocalParams, SolverParams};
use std::path::PathBuf;

/// Model geometries that can be built from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    /// Impurity (orbital 0) coupled to bath levels in star geometry.
    Anderson,
    /// Open Hubbard chain.
    HubbardChain,
}

/// Defines the model and the output file, common to all drivers.
#[derive(Parser, Debug)]
pub struct ModelArgs {
    #[clap(long, value_enum, default_value_t = Geometry::Anderson)]
    pub geometry: Geometry,

    /// Impurity level (anderson) or on-site level of every site (hubbard-chain).
    #[clap(long, default_value_t = -1.0, allow_hyphen_values = true)]
    pub eps: f64,

    /// On-site Hubbard interaction (impurity only for anderson).
    #[clap(long, default_value_t = 2.0)]
    pub u: f64,

    /// Bath levels, comma separated (anderson).
    #[clap(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "-1.0,1.0")]
    pub bath: Vec<f64>,

    /// Impurity-bath hoppings, comma separated (anderson).
    #[clap(long, value_delimiter = ',', default_value = "0.5,0.5")]
    pub hopping: Vec<f64>,

    /// Number of sites (hubbard-chain).
    #[clap(long, default_value_t = 4)]
    pub sites: usize,

    /// Nearest-neighbour hopping (hubbard-chain).
    #[clap(long, default_value_t = 1.0)]
    pub t: f64,

    /// Chemical potential, added to every on-site level.
    #[clap(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub mu: f64,

    /// Mean-field form of the on-site interaction.
    #[clap(long)]
    pub hf: bool,

    /// Sectors up to this dimension are diagonalized densely.
    #[clap(long, default_value_t = 10)]
    pub dense_threshold: usize,

    /// Eigenpairs per sector for the iterative solver (full spectrum if absent).
    #[clap(long)]
    pub n_eig: Option<usize>,

    /// Path to the output CSV file.
    #[clap(long, value_name = "PATH")]
    pub output: PathBuf,
}

impl ModelArgs {
    pub fn model(&self) -> Result<ImpurityModel> {
        let model = match self.geometry {
            Geometry::Anderson => {
                ensure!(
                    self.bath.len() == self.hopping.len(),
                    "got {} bath levels but {} hoppings",
                    self.bath.len(),
                    self.hopping.len()
                );
                ImpurityModel::anderson_star(self.eps, self.u, &self.bath, &self.hopping)?
            }
            Geometry::HubbardChain => ImpurityModel::hubbard_chain(self.sites, self.t, self.eps, self.u)?,
        };
        Ok(model)
    }

    pub fn local(&self) -> LocalParams {
        LocalParams {
            mu: self.mu,
            hf_mode: self.hf,
            z: None,
        }
    }

    pub fn solver(&self) -> SolverParams {
        SolverParams {
            dense_threshold: self.dense_threshold,
            ..SolverParams::default()
        }
    }
}
