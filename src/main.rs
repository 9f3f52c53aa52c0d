use anyhow::Context;
use clap::{Parser, Subcommand};
use fieldscore_batch::{BatchConfig, BatchScorer, RunSummary, Sink, Stage};
use fieldscore_similarity::{EngineConfig, ScoringMode};
use fieldscore_storage::{load_assets, AssetPaths};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Hierarchical field-of-study scoring for research text
#[derive(Parser, Debug)]
#[command(name = "fields")]
#[command(version, about = "Score research text against a field-of-study taxonomy", long_about = None)]
struct Cli {
    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a JSONL stream of {"merged_id", "text"} records
    Score(ScoreArgs),
    /// Embed a JSONL stream of records once, for `score --embedded`
    Embed(RunArgs),
}

/// Input, output, pool and asset options shared by every command
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Input JSONL file (.gz allowed) or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSONL file (.gz compresses); stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Records per chunk
    #[arg(short, long, default_value_t = 10_000)]
    batch_size: usize,

    /// Stop after this many records
    #[arg(long)]
    limit: Option<usize>,

    /// Worker threads [default: available parallelism]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Chunks buffered between stages [default: 2 x workers]
    #[arg(short, long)]
    queue: Option<usize>,

    /// Assets directory
    #[arg(short, long, default_value = "./assets")]
    assets: PathBuf,

    /// Asset language prefix
    #[arg(short, long, default_value = "en")]
    lang: String,

    /// Show a progress bar on stderr
    #[arg(long)]
    progress: bool,
}

#[derive(clap::Args, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Decimal places in output scores
    #[arg(short, long, default_value_t = 4)]
    precision: u32,

    /// Include per-signal scores for every field
    #[arg(long)]
    all: bool,

    /// Score every L2/L3 field instead of the best coarse subtrees
    #[arg(long)]
    exhaustive: bool,

    /// Input holds embeddings written by `fields embed`, not text
    #[arg(long)]
    embedded: bool,
}

impl ScoreArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            precision: self.precision,
            mode: if self.exhaustive {
                ScoringMode::Exhaustive
            } else {
                ScoringMode::Constrained
            },
            explain: self.all,
            ..EngineConfig::default()
        }
    }

    fn stage(&self) -> Stage {
        if self.embedded {
            Stage::ScoreEmbedded
        } else {
            Stage::Score
        }
    }
}

impl RunArgs {
    fn batch_config(&self) -> BatchConfig {
        let mut config = match self.workers {
            Some(workers) => BatchConfig::default().with_workers(workers),
            None => BatchConfig::default(),
        };
        config.batch_size = self.batch_size;
        config.limit = self.limit;
        config.progress = self.progress;
        if let Some(queue) = self.queue {
            config.queue_depth = queue;
        }
        config
    }
}

fn execute(
    args: &RunArgs,
    engine_config: EngineConfig,
    stage: Stage,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<RunSummary> {
    let paths = AssetPaths::new(&args.assets, &args.lang);
    let assets = load_assets(&paths).context("failed to load assets")?;

    let scorer = BatchScorer::new(&assets, engine_config, args.batch_config())?
        .with_stop_flag(stop);
    let sink = Sink::create(args.output.as_deref())?;
    let (summary, sink) = match stage {
        Stage::Score => scorer.run(&args.input, sink),
        Stage::ScoreEmbedded => scorer.run_embedded(&args.input, sink),
        Stage::Embed => scorer.embed(&args.input, sink),
    }
    .with_context(|| format!("processing {} failed", args.input.display()))?;
    sink.finish()?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting fields v{}", env!("CARGO_PKG_VERSION"));

    let stop = Arc::new(AtomicBool::new(false));
    let mut run = tokio::task::spawn_blocking({
        let stop = stop.clone();
        move || match cli.command {
            Command::Score(args) => execute(&args.run, args.engine_config(), args.stage(), stop),
            Command::Embed(args) => execute(&args, EngineConfig::default(), Stage::Embed, stop),
        }
    });

    let summary = tokio::select! {
        result = &mut run => result??,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Shutdown signal received, finishing queued chunks");
            stop.store(true, Ordering::Release);
            run.await??
        }
    };
    eprintln!("{summary}");

    Ok(())
}
