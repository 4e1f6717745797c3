//! Blockplan CLI: floorplan a `.block` file under a wall-clock budget.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use blockplan_core::{
    io, solve, BlockCatalog, Improvement, ImprovementSink, SaHyperparams, SolveResult,
    SolverConfig, Strategy,
};

#[derive(Parser)]
#[command(name = "blockplan")]
#[command(about = "Simulated-annealing floorplanner for hard-macro placement")]
#[command(version)]
struct Cli {
    /// Input .block file
    #[arg(short, long)]
    input: PathBuf,

    /// Output .block file
    #[arg(short, long)]
    output: PathBuf,

    /// Parallelisation strategy tag (MultiStart_Coarse,
    /// ParallelTempering_Medium or ParallelMoves_Fine)
    #[arg(short, long, default_value = "MultiStart_Coarse")]
    strategy: String,

    /// Wall-clock budget in seconds
    #[arg(short, long, default_value = "595")]
    time_limit: u64,

    /// Convergence log CSV (best-cost improvements over time)
    #[arg(long, default_value = "convergence_log.csv")]
    log: PathBuf,

    /// Worker threads (defaults to BLOCKPLAN_THREADS or all hardware threads)
    #[arg(long)]
    threads: Option<usize>,

    /// Initial temperature override
    #[arg(long)]
    t_start: Option<f64>,

    /// Final temperature override
    #[arg(long)]
    t_min: Option<f64>,

    /// Cooling rate override
    #[arg(long)]
    cooling_rate: Option<f64>,

    /// Steps-per-temperature factor override
    #[arg(long)]
    steps_factor: Option<f64>,

    /// Also write a JSON run summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

/// CSV sink for ledger improvements, flushed row by row so the file tracks
/// the run live.
struct ConvergenceLog {
    writer: Mutex<BufWriter<File>>,
}

impl ConvergenceLog {
    fn create(path: &PathBuf) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Timestamp(s),BestCost")?;
        writer.flush()?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    fn record(&self, improvement: &Improvement) {
        let mut writer = self.writer.lock().unwrap();
        let row = writeln!(
            writer,
            "{:.4},{:.6}",
            improvement.seconds, improvement.cost
        )
        .and_then(|_| writer.flush());
        if let Err(e) = row {
            log::warn!("failed to write convergence log row: {e}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let catalog = io::read_block_file(&cli.input)
        .with_context(|| format!("cannot load block file {}", cli.input.display()))?;

    let strategy = Strategy::from_tag(&cli.strategy);
    let mut params = strategy.default_params();
    apply_overrides(&mut params, &cli);

    let threads = cli.threads.or_else(threads_from_env).unwrap_or(0);
    let config = SolverConfig::new()
        .with_strategy(strategy)
        .with_time_limit_secs(cli.time_limit)
        .with_threads(threads)
        .with_params(params);

    print_banner(&cli, &catalog, &config);

    let sink: Option<ImprovementSink> = match ConvergenceLog::create(&cli.log) {
        Ok(log) => Some(Box::new(move |imp: &Improvement| log.record(imp))),
        Err(e) => {
            log::warn!(
                "cannot open convergence log {}: {e}; proceeding without logging",
                cli.log.display()
            );
            None
        }
    };

    let result = solve(&catalog, &config, sink)?;
    print_report(&result);

    match &result.best {
        Some(best) => {
            io::write_placement_file(&cli.output, &catalog, best)
                .with_context(|| format!("cannot write output file {}", cli.output.display()))?;
            println!("Final floorplan written to {}", cli.output.display());
        }
        None => log::warn!("no finite-cost floorplan found within the time limit"),
    }

    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&result.summary())?;
        std::fs::write(path, json)
            .with_context(|| format!("cannot write summary {}", path.display()))?;
        println!("Run summary written to {}", path.display());
    }

    Ok(())
}

fn apply_overrides(params: &mut SaHyperparams, cli: &Cli) {
    if let Some(t) = cli.t_start {
        params.t_start = t;
    }
    if let Some(t) = cli.t_min {
        params.t_min = t;
    }
    if let Some(rate) = cli.cooling_rate {
        params.cooling_rate = rate;
    }
    if let Some(factor) = cli.steps_factor {
        params.steps_factor = factor;
    }
}

fn threads_from_env() -> Option<usize> {
    std::env::var("BLOCKPLAN_THREADS")
        .ok()
        .and_then(|v| v.parse().ok())
}

fn print_banner(cli: &Cli, catalog: &BlockCatalog, config: &SolverConfig) {
    println!("{:=<58}", "");
    println!("{:^58}", "Blockplan Parallel Floorplanner");
    println!("{:=<58}", "");
    println!("Input file:   {}", cli.input.display());
    println!("Blocks:       {}", catalog.len());
    println!("Workers:      {}", config.worker_count());
    println!("Time limit:   {}s", config.time_limit_secs);
    println!("Strategy:     {}", config.strategy.tag());
    println!(
        "Schedule:     T_start={:.3e} T_min={:.3e} cooling={} steps_factor={}",
        config.params.t_start,
        config.params.t_min,
        config.params.cooling_rate,
        config.params.steps_factor
    );
    println!("Convergence:  {}", cli.log.display());
    println!("{:-<58}", "");
}

fn print_report(result: &SolveResult) {
    println!("{:-<58}", "");
    println!("Best cost:    {:.4}", result.cost);
    println!("Chip area:    {:.4}", result.chip_area);
    println!(
        "Chip W x H:   {:.2} x {:.2}",
        result.chip_width, result.chip_height
    );
    println!("INL:          {:.2}", result.inl);
    println!(
        "Search:       {} runs, {} moves, {} accepted",
        result.sa_runs, result.moves_total, result.moves_accepted
    );
    if let Some(found_at) = result.found_at {
        println!("Found after:  {:.4}s", found_at.as_secs_f64());
    }
    println!("{:=<58}", "");
}
