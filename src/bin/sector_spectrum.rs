//! Diagonalizes every sector of a model and writes the eigenvalues as CSV rows
//! `nup, ndw, dim, index, energy, weight`, where `weight` is the Boltzmann
//! weight relative to the ground state.
use anyhow::Result;
use clap::Parser;
use impurity_ed::{EdConfig, EigenCounts, Espace};
use serde::Serialize;

mod common;
use common::ModelArgs;

#[derive(Parser, Debug)]
#[clap(
    name = "sector-spectrum",
    about = "Writes the low-energy spectrum of every particle-number sector."
)]
struct SpectrumArgs {
    #[clap(flatten)]
    model: ModelArgs,

    /// Inverse temperature used for the reported Boltzmann weights.
    #[clap(long, default_value_t = 1e3)]
    beta: f64,
}

#[derive(Debug, Serialize)]
struct SpectrumRow {
    nup: usize,
    ndw: usize,
    dim: usize,
    index: usize,
    energy: f64,
    weight: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = SpectrumArgs::parse();

    let model = args.model.model()?;
    let config = EdConfig {
        local: args.model.local(),
        solver: args.model.solver(),
        ..EdConfig::default()
    };
    let counts = args.model.n_eig.map(|k| EigenCounts::uniform(model.n(), k));
    let espace = Espace::build(&model, counts.as_ref(), &config)?;
    log::info!(
        "E_gs = {:.10}, Z(beta = {}) = {:.6e}",
        espace.egs(),
        args.beta,
        espace.partition_function(args.beta)
    );

    let mut writer = csv::Writer::from_path(&args.model.output)?;
    for sct in espace.sectors() {
        for (index, &energy) in sct.eigvals().iter().enumerate() {
            writer.serialize(SpectrumRow {
                nup: sct.key().nup,
                ndw: sct.key().ndw,
                dim: sct.d(),
                index,
                energy,
                weight: (-args.beta * (energy - espace.egs())).exp(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
