//! NegoLab CLI — run negotiation tournaments against the built-in engine.
//!
//! Commands:
//! - `run` — execute a tournament from a TOML config file
//! - `agents` — list built-in agent names and their types
//! - `scenarios` — list built-in scenarios

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use negolab_core::demo::scenarios::{builtin, BUILTIN_NAMES};
use negolab_core::demo::{DemoEngine, BUILTIN_PREFIX};
use negolab_core::TournamentConfig;
use negolab_runner::{
    spawn_stream, MarkdownReportGenerator, SessionStatus, StreamEvent, TournamentScheduler,
    TournamentSession,
};

#[derive(Parser)]
#[command(
    name = "negolab",
    about = "NegoLab CLI — round-robin negotiation tournaments"
)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a tournament from a TOML config file.
    Run {
        /// Path to a TOML tournament config.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's njobs: negative streams serially, 0 or more runs a parallel batch.
        #[arg(long, allow_negative_numbers = true)]
        njobs: Option<i32>,

        /// Print the final session as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write a markdown report to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List built-in agent names and their types.
    Agents,
    /// List built-in scenarios.
    Scenarios,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            njobs,
            json,
            report,
        } => run_tournament_cmd(config, njobs, json, report),
        Commands::Agents => {
            run_agents();
            Ok(())
        }
        Commands::Scenarios => {
            run_scenarios();
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run_tournament_cmd(
    config_path: PathBuf,
    njobs: Option<i32>,
    json: bool,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = TournamentConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(n) = njobs {
        config.njobs = n;
    }

    let engine = Arc::new(DemoEngine::new());
    let scheduler = TournamentScheduler::new(engine);
    let streaming = config.is_streaming();
    let id = scheduler.create_session(config);
    info!(session = %id, streaming, "running tournament");

    let session = if streaming {
        let (tx, rx) = mpsc::channel();
        let worker = spawn_stream(&scheduler, &id, tx)?;
        for event in rx {
            if let StreamEvent::Progress(p) = event {
                if !json {
                    println!(
                        "[{:>5.1}%] {}/{}  {}  {} vs {}",
                        p.percent,
                        p.completed,
                        p.total,
                        p.current_scenario,
                        p.current_partners[0],
                        p.current_partners[1]
                    );
                }
            }
        }
        if worker.join().is_err() {
            bail!("tournament thread panicked");
        }
        scheduler
            .get_session(&id)
            .with_context(|| format!("session {id} disappeared"))?
    } else {
        scheduler.run_batch(&id)?
    };

    if let Some(path) = &report_path {
        std::fs::write(path, MarkdownReportGenerator.generate(&session))
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_leaderboard(&session);
    }

    match session.status {
        SessionStatus::Completed => Ok(()),
        status => bail!(
            "tournament ended {:?}: {}",
            status,
            session.error.as_deref().unwrap_or("no details")
        ),
    }
}

fn print_leaderboard(session: &TournamentSession) {
    let Some(results) = &session.results else {
        return;
    };

    println!();
    println!("=== Tournament {} ===", session.id);
    println!(
        "Negotiations:   {} ({} agreements, {} errors)",
        results.total_negotiations, results.n_agreements, results.n_errors
    );
    println!("Elapsed:        {:.2}s", results.execution_time_secs);
    println!(
        "Score:          {} of {}",
        session.config.final_score_stat, session.config.final_score_metric
    );
    println!();
    println!(
        "{:<5} {:<16} {:<24} {:>9} {:>9} {:>9} {:>8}",
        "Rank", "Competitor", "Type", "Score", "Utility", "Advantage", "Agreed"
    );
    println!("{}", "-".repeat(86));
    for s in &results.final_scores {
        println!(
            "{:<5} {:<16} {:<24} {:>9.4} {:>9.4} {:>9.4} {:>8}",
            s.rank,
            s.name,
            s.type_name,
            s.score,
            s.mean_utility,
            s.mean_advantage,
            format!("{}/{}", s.n_agreements, s.n_negotiations)
        );
    }
}

fn run_agents() {
    let engine = DemoEngine::new();
    println!("{:<12} {}", "Name", "Type");
    println!("{}", "-".repeat(36));
    for (name, type_name) in engine.registry().names() {
        println!("{name:<12} {type_name}");
    }
}

fn run_scenarios() {
    println!("{:<18} {:>8} {:>8}", "Path", "Issues", "Outcomes");
    println!("{}", "-".repeat(36));
    for name in BUILTIN_NAMES {
        if let Some(s) = builtin(name) {
            println!(
                "{:<18} {:>8} {:>8}",
                format!("{BUILTIN_PREFIX}{name}"),
                s.outcome_space.issues.len(),
                s.outcome_space.cardinality()
            );
        }
    }
}
