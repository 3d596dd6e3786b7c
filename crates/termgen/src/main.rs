mod config;
mod species;

use clap::{Args as ClapArgs, Parser, Subcommand};
use config::{Config, OutputFormat};
use longtail::{ExhaustionPolicy, Seed, Term, TermGenerator, WordGenerator};
use serde::Serialize;
use species::BatchRunner;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Long-tail term and key streams for load and benchmark tests.
#[derive(Parser)]
#[command(name = "termgen")]
struct Args {
    /// TOML config file (defaults to ./termgen.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a stream of terms seeded from a word-frequency table
    Terms(TermsArgs),
    /// Write per-batch species-accumulation summaries for integer species
    Species(SpeciesArgs),
}

#[derive(ClapArgs)]
struct TermsArgs {
    /// Number of terms to write
    #[arg(long)]
    count: Option<u64>,

    /// Number of independent sampler lanes
    #[arg(long)]
    lanes: Option<usize>,

    /// Discount d in [0, 1); larger means a heavier tail
    #[arg(long)]
    discount: Option<f64>,

    /// Strength θ > -d; larger means more novelty early on
    #[arg(long, allow_hyphen_values = true)]
    strength: Option<f64>,

    /// Random seed (integer or string); omit for a fresh stream every run
    #[arg(long)]
    seed: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Frequency table resource (built-in name or file path)
    #[arg(long)]
    seed_table: Option<String>,

    /// Novel-word reservoir resource (built-in name or file path)
    #[arg(long)]
    reservoir: Option<String>,

    /// Stop with an error once the reservoir runs dry instead of repeating
    /// known terms
    #[arg(long)]
    fail_on_exhaustion: bool,
}

#[derive(ClapArgs)]
struct SpeciesArgs {
    /// Number of batches
    #[arg(long, default_value_t = 2000)]
    batches: usize,

    /// Mean batch length
    #[arg(long, default_value_t = 50.0)]
    mean_len: f64,

    /// Standard deviation of batch length
    #[arg(long, default_value_t = 10.0)]
    sd_len: f64,

    /// Discount d in [0, 1)
    #[arg(long, default_value_t = 0.5)]
    discount: f64,

    /// Strength θ > -d
    #[arg(long, default_value_t = 0.3, allow_hyphen_values = true)]
    strength: f64,

    /// Random seed (integer or string)
    #[arg(long)]
    seed: Option<String>,
}

#[derive(Serialize)]
struct TermRecord<'a> {
    seq: u64,
    term: &'a str,
}

/// Integers become numeric seeds, anything else a text seed.
fn parse_seed(raw: &str) -> Seed {
    raw.parse::<u64>()
        .map(Seed::from)
        .unwrap_or_else(|_| Seed::from(raw))
}

fn load_config(path: Option<&Path>) -> Config {
    let path = match path {
        Some(p) => p,
        None if Path::new("termgen.toml").exists() => Path::new("termgen.toml"),
        None => {
            tracing::debug!("no config file, using defaults");
            return Config::default_config();
        }
    };
    match Config::load(path) {
        Ok(c) => {
            tracing::info!(path = %path.display(), "loaded config");
            c
        }
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to load config, using defaults"
            );
            Config::default_config()
        }
    }
}

fn apply_overrides(config: &mut Config, args: &TermsArgs) {
    if let Some(count) = args.count {
        config.output.count = count;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(lanes) = args.lanes {
        config.generator.lanes = lanes;
    }
    if let Some(discount) = args.discount {
        config.generator.discount = discount;
    }
    if let Some(strength) = args.strength {
        config.generator.strength = strength;
    }
    if let Some(seed) = &args.seed {
        config.generator.seed = Some(parse_seed(seed));
    }
    if let Some(table) = &args.seed_table {
        config.resources.seed_table = table.clone();
    }
    if let Some(reservoir) = &args.reservoir {
        config.resources.reservoir = reservoir.clone();
    }
    if args.fail_on_exhaustion {
        config.generator.policy = ExhaustionPolicy::Fail;
    }
}

fn run_terms(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let words_seed = config.generator.seed.clone().unwrap_or_default();
    let words = WordGenerator::with_seed(
        &config.resources.seed_table,
        &config.resources.reservoir,
        words_seed,
    )?;
    let mut generator = TermGenerator::with_options(&words, &config.generator)?;

    tracing::info!(
        seed_table = %config.resources.seed_table,
        reservoir = %config.resources.reservoir,
        lanes = config.generator.lanes,
        discount = config.generator.discount,
        strength = config.generator.strength,
        count = config.output.count,
        "term stream starting"
    );

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emitted: HashMap<Term, u64> = HashMap::new();

    for seq in 0..config.output.count {
        let term = generator.sample()?;
        match config.output.format {
            OutputFormat::Text => writeln!(out, "{term}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, &TermRecord { seq, term: &term })?;
                out.write_all(b"\n")?;
            }
        }
        *emitted.entry(term).or_default() += 1;
    }
    out.flush()?;

    let mut top: Vec<(&Term, &u64)> = emitted.iter().collect();
    top.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let top: Vec<String> = top
        .iter()
        .take(10)
        .map(|(term, count)| format!("{term}:{count}"))
        .collect();
    let stats = generator.stats();
    tracing::info!(
        draws = stats.draws,
        distinct = emitted.len(),
        minted = stats.minted,
        fallbacks = stats.fallbacks,
        reservoir_left = words.remaining(),
        top = %top.join(" "),
        "term stream complete"
    );
    Ok(())
}

fn run_species(args: &SpeciesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let seed = args.seed.as_deref().map(parse_seed).unwrap_or_default();
    let mut runner =
        BatchRunner::new(args.discount, args.strength, args.mean_len, args.sd_len, seed)?;

    tracing::info!(
        batches = args.batches,
        mean_len = args.mean_len,
        sd_len = args.sd_len,
        discount = args.discount,
        strength = args.strength,
        "species run starting"
    );

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..args.batches {
        let summary = runner.next_batch()?;
        serde_json::to_writer(&mut out, &summary)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let stats = runner.sampler().stats();
    tracing::info!(draws = stats.draws, species = stats.distinct, "species run complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let result = match &args.command {
        Command::Terms(terms) => {
            let mut config = load_config(args.config.as_deref());
            apply_overrides(&mut config, terms);
            run_terms(&config)
        }
        Command::Species(species) => run_species(species),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "termgen failed");
        std::process::exit(1);
    }
}
