use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use engagement_miner::config::{resolve_params, CliOverrides, FileConfig, MiningParams};
use engagement_miner::engine::{Engine, MiningOutcome};
use engagement_miner::features::Platform;
use engagement_miner::records::load_records;
use engagement_miner::report::write_report;
use engagement_miner::rules::AssociationRule;
use engagement_miner::recommend_params;

mod cli_style;
use cli_style::get_styles;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles(), version, about)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mines association rules from a JSON array or JSON-lines file of records.
    Mine(MineArgs),

    /// Prints the recommended mining parameters for a record count, as TOML.
    Recommend { record_count: usize },
}

#[derive(Args, Debug)]
struct MineArgs {
    /// Shape of the input records.
    #[clap(long, value_enum)]
    pub platform: Platform,

    /// Path to the records file.
    #[clap(value_parser = parse_path)]
    pub input: PathBuf,

    /// Path to a TOML file with a [mining] table. Its values win over flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[clap(long)]
    pub min_support: Option<f64>,

    #[clap(long)]
    pub min_confidence: Option<f64>,

    #[clap(long)]
    pub min_lift: Option<f64>,

    /// Longest itemset to search for, at most 3.
    #[clap(long)]
    pub max_itemset_length: Option<usize>,

    #[clap(long)]
    pub max_features_per_category: Option<usize>,

    #[clap(long)]
    pub min_category_frequency: Option<usize>,

    /// Force sampling on or off.
    #[clap(long)]
    pub use_sampling: Option<bool>,

    #[clap(long)]
    pub sample_ratio: Option<f64>,

    #[clap(long)]
    pub sample_seed: Option<u64>,

    /// Target labels to query, comma separated. Defaults to each known label
    /// on its own.
    #[clap(long, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Number of rules to print per query.
    #[clap(long, default_value_t = 5)]
    pub top_n: usize,

    /// Where to write the JSON report.
    #[clap(long, value_parser = parse_path)]
    pub output: Option<PathBuf>,
}

impl MineArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            min_support: self.min_support,
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            max_itemset_length: self.max_itemset_length,
            max_features_per_category: self.max_features_per_category,
            min_category_frequency: self.min_category_frequency,
            use_sampling: self.use_sampling,
            sample_ratio: self.sample_ratio,
            sample_seed: self.sample_seed,
        }
    }
}

#[derive(Serialize)]
struct RecommendedConfig<'a> {
    mining: &'a MiningParams,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    match cli_args.command {
        Command::Mine(args) => run_mine(args),
        Command::Recommend { record_count } => {
            let params = recommend_params(record_count);
            let rendered = toml::to_string_pretty(&RecommendedConfig { mining: &params })
                .context("Failed to serialize parameters")?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn run_mine(args: MineArgs) -> Result<()> {
    info!("Loading records from {:?}...", args.input);
    let records = load_records(&args.input)
        .with_context(|| format!("Failed to load records from {:?}", args.input))?;

    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let params = resolve_params(records.len(), &args.overrides(), file_config)?;

    let outcome = Engine::new(args.platform).mine(&records, &params)?;
    print_summary(&outcome);

    let result = outcome.result();
    if args.targets.is_empty() {
        for target in &result.target_labels {
            let rules = outcome.get_rules_for_targets(std::slice::from_ref(target), args.top_n);
            if !rules.is_empty() {
                print_rules(target, &rules);
            }
        }
    } else {
        let unknown: Vec<&String> = args
            .targets
            .iter()
            .filter(|t| !result.target_labels.contains(*t))
            .collect();
        if !unknown.is_empty() {
            warn!("Unknown target labels for {}: {:?}", args.platform, unknown);
        }
        let rules = outcome.get_rules_for_targets(&args.targets, args.top_n);
        print_rules(&args.targets.join(" + "), &rules);
    }

    if let Some(output) = &args.output {
        write_report(&outcome, output)
            .with_context(|| format!("Failed to write report to {:?}", output))?;
    }

    Ok(())
}

fn print_summary(outcome: &MiningOutcome) {
    let summary = &outcome.result().summary;
    let status = match outcome {
        MiningOutcome::Success(_) => "success".to_string(),
        MiningOutcome::Empty(_) => "no rules met the thresholds".to_string(),
        MiningOutcome::Degraded { reason, .. } => format!("degraded ({})", reason),
    };

    println!("Status: {}", status);
    println!(
        "Records: {} ({} mined), avg {:.1} tokens per transaction",
        summary.record_count, summary.sampled_count, summary.avg_transaction_len
    );
    println!(
        "Items: {} observed, {} after pre-filter, {} mined",
        summary.itemsets.items.observed_items,
        summary.itemsets.items.after_prefilter,
        summary.itemsets.items.mined_items
    );
    println!(
        "Itemsets: {} kept of {}; rules: {} kept of {}",
        summary.itemsets.itemsets_kept,
        summary.itemsets.itemsets_found,
        summary.rule_count,
        summary.rules_found
    );
    for (target, prevalence) in &summary.target_prevalence {
        println!(
            "  {:<24} {:>5.1}% of records, {} rules",
            target,
            prevalence * 100.0,
            summary.rules_per_target.get(target).copied().unwrap_or(0)
        );
    }
}

fn print_rules(title: &str, rules: &[&AssociationRule]) {
    println!();
    println!("Rules for {}:", title);
    if rules.is_empty() {
        println!("  (none)");
    }
    for rule in rules {
        println!(
            "  {}  support={:.3} confidence={:.3} lift={:.3}",
            rule.rule, rule.support, rule.confidence, rule.lift
        );
    }
}
