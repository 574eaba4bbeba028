// SPDX-License-Identifier: Apache-2.0

//! Thin CLI wrapper around the `progspace` library: it only does file I/O,
//! argument parsing, and log setup, then defers everything else to the
//! library.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use progspace::{
    discretize, extract_distributions, Biaser, DistributionModel, Generator, Mutator, Random,
    Statement, TypeRegistry, DEFAULT_CUSTOM_DISTRIBUTIONS,
};

#[derive(Parser)]
#[command(name = "progspace", about = "Program-space exploration engine")]
struct Cli {
    /// Increase log verbosity; repeatable (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a DistributionModel from a normalized type registry JSON file.
    Extract {
        #[arg(long)]
        registry: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Print the smallest valid value for an FQN.
    Synth {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        fqn: String,
        #[arg(short = 'S', long, default_value_t = 0)]
        seed: u64,
    },
    /// Build a minimal value, then sample mutated neighbors of it.
    Explore {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        fqn: String,
        #[arg(short = 'S', long, default_value_t = 0)]
        seed: u64,
        /// How many mutated variants to sample.
        #[arg(short = 'V', long, default_value_t = 5)]
        variants: usize,
        /// Directory to write each variant's discretized program into. If
        /// omitted, variants are printed to stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Extract { registry, out } => run_extract(registry, out),
        Command::Synth { model, fqn, seed } => run_synth(model, fqn, seed),
        Command::Explore {
            model,
            fqn,
            seed,
            variants,
            out,
        } => run_explore(model, fqn, seed, variants, out),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_extract(registry_path: PathBuf, out_path: PathBuf) -> Result<()> {
    let raw = fs::read_to_string(&registry_path)
        .with_context(|| format!("reading type registry from {}", registry_path.display()))?;
    let registry: TypeRegistry = serde_json::from_str(&raw).context("parsing type registry JSON")?;
    let biaser = Biaser::with_defaults();
    let model = extract_distributions(&registry, &biaser).context("extracting distributions")?;
    let json = serde_json::to_string_pretty(&model).context("serializing distribution model")?;
    fs::write(&out_path, json)
        .with_context(|| format!("writing distribution model to {}", out_path.display()))?;
    println!(
        "wrote {} fqn sources across {} fqns to {}",
        model.distributions.len(),
        model.fqn_sources.len(),
        out_path.display()
    );
    Ok(())
}

fn load_model(path: &PathBuf) -> Result<DistributionModel> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading distribution model from {}", path.display()))?;
    serde_json::from_str(&raw).context("parsing distribution model JSON")
}

fn run_synth(model_path: PathBuf, fqn: String, seed: u64) -> Result<()> {
    let mut model = load_model(&model_path)?;
    let mut random = Random::new(seed);
    let mut generator = Generator::new(&mut model, &DEFAULT_CUSTOM_DISTRIBUTIONS);
    let value = generator
        .minimal(&fqn, &mut random)
        .with_context(|| format!("generating minimal value for `{fqn}`"))?;
    for statement in discretize(value) {
        println!("{}", render_statement(&statement));
    }
    Ok(())
}

fn run_explore(
    model_path: PathBuf,
    fqn: String,
    seed: u64,
    variants: usize,
    out_dir: Option<PathBuf>,
) -> Result<()> {
    let mut model = load_model(&model_path)?;
    let mut random = Random::new(seed);
    let root = {
        let mut generator = Generator::new(&mut model, &DEFAULT_CUSTOM_DISTRIBUTIONS);
        generator
            .minimal(&fqn, &mut random)
            .with_context(|| format!("generating minimal value for `{fqn}`"))?
    };

    let mutated = {
        let mut mutator = Mutator::new(&mut model, &DEFAULT_CUSTOM_DISTRIBUTIONS);
        mutator
            .mutate(&root, variants, &mut random)
            .context("sampling mutations")?
    };

    if let Some(dir) = &out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating output dir {}", dir.display()))?;
    }

    for (i, variant) in mutated.into_iter().enumerate() {
        let rendered = discretize(variant)
            .iter()
            .map(render_statement)
            .collect::<Vec<_>>()
            .join("\n");
        match &out_dir {
            Some(dir) => {
                let path = dir.join(format!("variant-{i}.txt"));
                fs::write(&path, &rendered)
                    .with_context(|| format!("writing variant to {}", path.display()))?;
            }
            None => {
                println!("--- variant {i} ---\n{rendered}");
            }
        }
    }
    Ok(())
}

fn render_statement(statement: &Statement) -> String {
    match statement {
        Statement::Assignment { name, value } => format!("let {name} = {value};"),
        Statement::Expression(value) => format!("{value};"),
    }
}
