//! myrisk-cli — Command-line front end for the MyRisk engine.
//!
//! Reads JSON snapshots (feature rows, claims, events), runs the scoring
//! engine and prints JSON results to stdout. Logs go to stderr.

mod config;
mod ingest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use myrisk_core::types::{CombinedIndex, FamilyScores, FamilyWeights};
use myrisk_engine::{AssessmentInput, RiskEngine};
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;

/// MyRisk command-line interface.
#[derive(Parser, Debug)]
#[command(name = "myrisk-cli", version, about = "Risk family scoring and provider outlier detection")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Overrides MYRISK_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// Isolation forest seed. Overrides MYRISK_SEED.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute family scores and the combined index.
    Score(FeaturesArgs),
    /// Rank the features driving risk.
    Explain(ExplainArgs),
    /// Score providers from claims.
    Providers(ProvidersArgs),
    /// Full report: families, providers, recency, drivers.
    Assess(AssessArgs),
    /// Print the effective engine configuration.
    Config,
}

#[derive(Args, Debug)]
struct FeaturesArgs {
    /// JSON array of feature rows.
    #[arg(short, long)]
    features: PathBuf,
}

#[derive(Args, Debug)]
struct ExplainArgs {
    /// JSON array of feature rows.
    #[arg(short, long)]
    features: PathBuf,

    /// Drivers to keep. Overrides MYRISK_DRIVER_TOP_N.
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Args, Debug)]
struct ProvidersArgs {
    /// JSON array of claim records.
    #[arg(short, long)]
    claims: PathBuf,

    /// Providers to keep. Overrides MYRISK_PROVIDER_TOP_N.
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// JSON array of feature rows.
    #[arg(short, long)]
    features: PathBuf,

    /// JSON array of claim records.
    #[arg(short, long)]
    claims: Option<PathBuf>,

    /// JSON array of events with `age_days`.
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Financial family multiplier.
    #[arg(long, default_value_t = 1.0)]
    financial_weight: f64,

    /// Compliance family multiplier.
    #[arg(long, default_value_t = 1.0)]
    compliance_weight: f64,

    /// Operational family multiplier.
    #[arg(long, default_value_t = 1.0)]
    operational_weight: f64,

    /// Provider family multiplier.
    #[arg(long, default_value_t = 1.0)]
    provider_weight: f64,
}

#[derive(Serialize)]
struct ScoreOutput {
    families: FamilyScores,
    combined: CombinedIndex,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::from_env()?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    init_logging(&config.log_level, &cli.log_format);

    match cli.command {
        Commands::Score(args) => score(&config, &args),
        Commands::Explain(args) => explain(config, &args),
        Commands::Providers(args) => providers(config, &args),
        Commands::Assess(args) => assess(&config, &args),
        Commands::Config => print_json(&config.engine_config()),
    }
}

fn build_engine(config: &CliConfig) -> Result<RiskEngine> {
    RiskEngine::new(config.engine_config()).context("Invalid engine configuration")
}

fn load_features(path: &Path) -> Result<myrisk_core::types::FeatureMatrix> {
    ingest::features_from_json(&ingest::read_json(path)?)
        .with_context(|| format!("Failed to load features from {}", path.display()))
}

fn load_claims(path: &Path) -> Result<Vec<myrisk_core::types::ClaimRecord>> {
    ingest::claims_from_json(&ingest::read_json(path)?)
        .with_context(|| format!("Failed to load claims from {}", path.display()))
}

fn score(config: &CliConfig, args: &FeaturesArgs) -> Result<()> {
    let engine = build_engine(config)?;
    let matrix = load_features(&args.features)?;
    let families = engine.compute_family_scores(&matrix);
    let combined = engine.combine_scores(&families);
    info!(combined = combined.score, confidence = combined.confidence, "scored");
    print_json(&ScoreOutput { families, combined })
}

fn explain(mut config: CliConfig, args: &ExplainArgs) -> Result<()> {
    if let Some(top) = args.top {
        config.driver_top_n = top;
    }
    let engine = build_engine(&config)?;
    let matrix = load_features(&args.features)?;
    print_json(&engine.explain_scores(&matrix))
}

fn providers(mut config: CliConfig, args: &ProvidersArgs) -> Result<()> {
    if let Some(top) = args.top {
        config.provider_top_n = top;
    }
    let engine = build_engine(&config)?;
    let claims = load_claims(&args.claims)?;
    let ranked = engine
        .top_provider_outliers(&claims)
        .context("Provider outlier detection failed")?;
    info!(claims = claims.len(), reported = ranked.len(), "providers scored");
    print_json(&ranked)
}

fn assess(config: &CliConfig, args: &AssessArgs) -> Result<()> {
    let engine = build_engine(config)?;
    let features = load_features(&args.features)?;
    let claims = match &args.claims {
        Some(path) => load_claims(path)?,
        None => Vec::new(),
    };
    let event_ages_days = match &args.events {
        Some(path) => Some(
            ingest::event_ages_from_json(&ingest::read_json(path)?)
                .with_context(|| format!("Failed to load events from {}", path.display()))?,
        ),
        None => None,
    };
    let input = AssessmentInput {
        features,
        claims,
        event_ages_days,
        weights: FamilyWeights {
            financial: args.financial_weight,
            compliance: args.compliance_weight,
            operational: args.operational_weight,
            provider: args.provider_weight,
        },
    };
    let report = engine.assess(&input).context("Assessment failed")?;
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
