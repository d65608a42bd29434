//! Live session simulator CLI.
//!
//! Usage:
//!   live-sim run --seconds 60            # Step a session, one line per second
//!   live-sim run --realtime --json       # Pace steps by the wall clock
//!   live-sim dump --at 25                # Full state at one instant
//!   live-sim check -c config.json        # Report config degradations
//!   live-sim init                        # Write a sample config

use clap::{Parser, Subcommand};
use live_sim::config::{default_path, LiveConfig};
use live_sim::dump::{format_line, format_snapshot};
use live_sim::provider::HeadlessHost;
use live_sim::LiveSession;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "live-sim")]
#[command(about = "Simulated live-broadcast engagement engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session and print one status line per step
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// Virtual seconds to simulate
        #[arg(short, long, default_value_t = 60)]
        seconds: u64,

        /// Milliseconds between printed steps
        #[arg(long, default_value_t = 1000)]
        step_ms: u64,

        /// Print snapshots as JSON lines
        #[arg(long)]
        json: bool,

        /// Pace steps by the wall clock instead of running flat out
        #[arg(long)]
        realtime: bool,
    },

    /// Print the full session state at one instant
    Dump {
        #[command(flatten)]
        session: SessionArgs,

        /// Virtual time in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a config and list every degradation the engine will apply
    Check {
        /// Config file (defaults to the per-user config)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a sample config file
    Init {
        /// Output path (defaults to the per-user config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Config file (defaults to the per-user config, then built-in sample)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the video source
    #[arg(long)]
    source: Option<String>,

    /// Simulate a blocked provider (library and media never load)
    #[arg(long)]
    blocked: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { session, seconds, step_ms, json, realtime } => {
            run(&session, seconds, step_ms, json, realtime)
        }
        Commands::Dump { session, at, json } => dump(&session, at, json),
        Commands::Check { config } => check(config.as_deref()),
        Commands::Init { output, force } => init(output, force),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Explicit path, else the per-user file if present, else the sample.
/// A per-user file that fails to parse is an error.
fn load_config(path: Option<&Path>, user_default: &Path) -> live_sim::Result<LiveConfig> {
    match path {
        Some(path) => LiveConfig::load(path),
        None if user_default.exists() => LiveConfig::load(user_default),
        None => Ok(LiveConfig::sample()),
    }
}

fn build_session(args: &SessionArgs) -> live_sim::Result<LiveSession<HeadlessHost>> {
    let mut config = load_config(args.config.as_deref(), &default_path())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(source) = &args.source {
        config.video.source = source.clone();
    }
    config.log_warnings();

    let host = if args.blocked {
        HeadlessHost::default().blocked()
    } else {
        HeadlessHost::default()
    };
    let mut session = LiveSession::new(config, host);
    session.mount();
    Ok(session)
}

fn print_step(session: &LiveSession<HeadlessHost>, json: bool) -> live_sim::Result<()> {
    let snapshot = session.snapshot();
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!("{}", format_line(&snapshot));
    }
    Ok(())
}

fn run(args: &SessionArgs, seconds: u64, step_ms: u64, json: bool, realtime: bool) -> live_sim::Result<()> {
    let mut session = build_session(args)?;
    let step_ms = step_ms.max(1);
    let end = seconds.saturating_mul(1000);

    if !realtime {
        print_step(&session, json)?;
        while session.now() < end {
            session.advance_to((session.now() + step_ms).min(end));
            print_step(&session, json)?;
        }
        session.unmount();
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(step_ms));
        // First tick completes immediately.
        ticker.tick().await;
        print_step(&session, json)?;
        while session.now() < end {
            ticker.tick().await;
            session.advance_to((session.now() + step_ms).min(end));
            print_step(&session, json)?;
        }
        Ok::<(), live_sim::Error>(())
    })?;
    session.unmount();
    Ok(())
}

fn dump(args: &SessionArgs, at: f64, json: bool) -> live_sim::Result<()> {
    let mut session = build_session(args)?;
    session.advance_to(live_sim::config::seconds_to_ms(at));
    let snapshot = session.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_snapshot(&snapshot));
        println!("\n=== Mount tree ===\n");
        print!("{}", session.surface().dump());
    }
    Ok(())
}

fn check(path: Option<&Path>) -> live_sim::Result<()> {
    let config = load_config(path, &default_path())?;
    let warnings = config.validate();
    if warnings.is_empty() {
        println!("OK: no problems found");
        return Ok(());
    }
    println!("{} warning(s):", warnings.len());
    for w in &warnings {
        println!("  - {}", w);
    }
    Ok(())
}

fn init(output: Option<PathBuf>, force: bool) -> live_sim::Result<()> {
    let path = output.unwrap_or_else(default_path);
    if path.exists() && !force {
        return Err(live_sim::Error::Other(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    LiveConfig::sample().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_malformed_user_config_is_reported() {
        let dir = tempdir().unwrap();
        let user = dir.path().join("config.json");
        std::fs::write(&user, "{ \"chat\": ").unwrap();
        assert!(matches!(load_config(None, &user), Err(live_sim::Error::Json(_))));
    }

    #[test]
    fn test_user_config_then_sample() {
        let dir = tempdir().unwrap();
        let user = dir.path().join("config.json");
        let sample = load_config(None, &user).unwrap();
        assert_eq!(sample.comments.len(), LiveConfig::sample().comments.len());

        std::fs::write(&user, r#"{ "seed": 9 }"#).unwrap();
        let loaded = load_config(None, &user).unwrap();
        assert_eq!(loaded.seed, Some(9));
        assert!(loaded.comments.is_empty());
    }
}
