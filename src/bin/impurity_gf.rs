//! Computes the impurity Green's function of a model on a real-frequency grid.
//!
//! The eigen-space is built, screened at the requested temperature, and the
//! Green's function is written as CSV rows `energy, re, im, dos`.
use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use impurity_ed::{
    EdConfig, EigenCounts, Espace, GfParams, Representation, ScreenParams, Spin, build_gf_lanczos,
};
use serde::Serialize;

mod common;
use common::ModelArgs;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReprArg {
    /// Continued fractions.
    Cf,
    /// Poles and weights.
    Sp,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SpinArg {
    Up,
    Down,
}

#[derive(Parser, Debug)]
#[clap(
    name = "impurity-gf",
    about = "Computes the Green's function of a quantum impurity model by exact diagonalization."
)]
struct GfArgs {
    #[clap(flatten)]
    model: ModelArgs,

    /// Inverse temperature.
    #[clap(long, default_value_t = 1e3)]
    beta: f64,

    /// Boltzmann weight below which eigenstates are discarded.
    #[clap(long, default_value_t = 1e-9)]
    cutoff: f64,

    /// Orbital of the Green's function.
    #[clap(long, default_value_t = 0)]
    pos: usize,

    #[clap(long, value_enum, default_value_t = SpinArg::Up)]
    spin: SpinArg,

    #[clap(long, value_enum, default_value_t = ReprArg::Cf)]
    repr: ReprArg,

    /// Maximum depth of the continued fractions.
    #[clap(long, default_value_t = 500)]
    max_depth: usize,

    /// Broadening.
    #[clap(long, default_value_t = 0.05)]
    eta: f64,

    #[clap(long, default_value_t = -5.0, allow_hyphen_values = true)]
    emin: f64,

    #[clap(long, default_value_t = 5.0, allow_hyphen_values = true)]
    emax: f64,

    /// Number of grid points.
    #[clap(long, default_value_t = 1001)]
    ne: usize,
}

#[derive(Debug, Serialize)]
struct GfRow {
    energy: f64,
    re: f64,
    im: f64,
    dos: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = GfArgs::parse();
    ensure!(args.ne >= 2, "the energy grid needs at least 2 points");

    let model = args.model.model()?;
    ensure!(
        args.pos < model.n(),
        "orbital {} does not exist in a model with {} orbitals",
        args.pos,
        model.n()
    );
    let config = EdConfig {
        local: args.model.local(),
        solver: args.model.solver(),
        screen: ScreenParams {
            cutoff: args.cutoff,
        },
        gf: GfParams {
            beta: args.beta,
            pos: args.pos,
            spin: match args.spin {
                SpinArg::Up => Spin::Up,
                SpinArg::Down => Spin::Down,
            },
            repr: match args.repr {
                ReprArg::Cf => Representation::ContinuedFraction,
                ReprArg::Sp => Representation::Spectral,
            },
            max_depth: args.max_depth,
        },
    };
    log::info!("Running with {config:?}");

    let counts = args.model.n_eig.map(|k| EigenCounts::uniform(model.n(), k));
    let mut espace = Espace::build(&model, counts.as_ref(), &config)?;
    espace.screen(config.gf.beta, config.screen.cutoff);
    let gf = build_gf_lanczos(&model, &espace, &config)?;

    let step = (args.emax - args.emin) / (args.ne - 1) as f64;
    let energies: Vec<f64> = (0..args.ne).map(|i| args.emin + i as f64 * step).collect();
    let values = gf.eval_many(&energies, args.eta);

    let mut writer = csv::Writer::from_path(&args.model.output)
        .with_context(|| format!("cannot create {:?}", args.model.output))?;
    for (&energy, g) in energies.iter().zip(&values) {
        writer.serialize(GfRow {
            energy,
            re: g.re,
            im: g.im,
            dos: -g.im / std::f64::consts::PI,
        })?;
    }
    writer.flush()?;
    log::info!("Green's function written to {:?}", args.model.output);
    Ok(())
}
