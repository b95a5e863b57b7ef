use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use mirror_vibes::evaluate::{evaluate_examples, read_examples, write_report};
use mirror_vibes::source::JsonDumpSource;
use mirror_vibes::storage::JsonWorkbookStore;
use mirror_vibes::{ScoringConfig, ScoringPipeline, StrategyKind};

/// Mirror Vibes - sentiment, opinion strength and plausibility scoring
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a YAML config file (overrides MIRROR_VIBES_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Plausibility strategy (overrides config and MIRROR_VIBES_STRATEGY)
    #[arg(long, global = true, value_enum)]
    strategy: Option<StrategyKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a JSON dump of posts and comments into a workbook
    Score {
        /// Dump written by the retrieval step
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the workbook, backups and summary
        #[arg(short, long, default_value = "data")]
        output_dir: PathBuf,

        /// Workbook name prefix
        #[arg(short, long, default_value = "blackmirror")]
        name: String,

        /// Score items with a parallel iterator
        #[arg(long)]
        parallel: bool,
    },

    /// Print the full score breakdown for one text as JSON
    Explain {
        text: String,
    },

    /// Compare predicted labels against hand-labeled examples
    Evaluate {
        /// JSON array of {body, expected_sentiment, expected_opinion, expected_plausibility}
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "rate_predictions_outputs")]
        output_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting mirror_vibes");

    let args = Args::parse();

    let mut config = ScoringConfig::load(args.config.as_deref()).context("Loading configuration")?;
    if let Some(strategy) = args.strategy {
        debug!("Using strategy from --strategy argument: {}", strategy.as_str());
        config.plausibility.strategy = strategy;
    }

    match args.command {
        Command::Score {
            input,
            output_dir,
            name,
            parallel,
        } => {
            config.pipeline.parallel |= parallel;
            let pipeline = ScoringPipeline::from_config(&config)?;
            let mut source = JsonDumpSource::open(&input, config.pipeline.max_posts, config.pipeline.max_comments)
                .with_context(|| format!("Opening dump {}", input.display()))?;
            let mut store = JsonWorkbookStore::new(&output_dir, name.as_str());
            let report = pipeline.run(&name, &mut source, &mut store)?;
            info!(
                "Workbook written - path={}, scored={}",
                store.primary_path().display(),
                report.scored
            );
        }
        Command::Explain { text } => {
            let pipeline = ScoringPipeline::from_config(&config)?;
            let explanation = pipeline.explain(&text);
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
        Command::Evaluate { input, output_dir } => {
            let pipeline = ScoringPipeline::from_config(&config)?;
            let examples = read_examples(&input)?;
            let report = evaluate_examples(&pipeline, &examples, &config.labels, &input.display().to_string());
            let run_dir = write_report(&report, &output_dir, &input)?;
            for c in &report.columns {
                info!(
                    "Column result - column={}, accuracy={:.2}, macro_f1={:.2}, total={}",
                    c.column, c.accuracy, c.macro_f1, c.total
                );
            }
            info!("Evaluation complete - directory={}", run_dir.display());
        }
    }

    Ok(())
}
