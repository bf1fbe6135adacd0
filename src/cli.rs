//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_adapter::MemoryAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::adapters::web::{AppState, build_router};
use crate::domain::error::JournalError;
use crate::domain::stats::{DashboardStats, StatsBreakdown};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

#[derive(Parser, Debug)]
#[command(name = "tradelog", about = "Personal trading journal service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the journal API server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print journal statistics to the console
    Stats {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Export the trade log to CSV
    Export {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Stats { config } => run_stats(&config),
        Command::Export { config, output } => run_export(&config, output.as_ref()),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = JournalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Pick the store the `[database]` section asks for. SQLite is the default;
/// `backend = memory` keeps everything in process for throwaway runs.
pub fn open_store(
    config: &dyn ConfigPort,
) -> Result<Arc<dyn JournalPort + Send + Sync>, JournalError> {
    let backend = config
        .get_string("database", "backend")
        .unwrap_or_else(|| "sqlite".to_string());

    match backend.as_str() {
        "memory" => Ok(Arc::new(MemoryAdapter::new())),
        "sqlite" => {
            let adapter = SqliteAdapter::from_config(config)?;
            adapter.initialize_schema()?;
            Ok(Arc::new(adapter))
        }
        other => Err(JournalError::ConfigInvalid {
            section: "database".into(),
            key: "backend".into(),
            reason: format!("unknown backend {other:?} (expected sqlite or memory)"),
        }),
    }
}

/// The capital baseline the dashboard adds realized P&L to.
pub fn resolve_starting_capital(config: &dyn ConfigPort) -> Result<Decimal, JournalError> {
    let raw = config
        .get_string("journal", "starting_capital")
        .unwrap_or_else(|| "50000".to_string());

    raw.parse().map_err(|e: rust_decimal::Error| {
        JournalError::ConfigInvalid {
            section: "journal".into(),
            key: "starting_capital".into(),
            reason: e.to_string(),
        }
    })
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let starting_capital = match resolve_starting_capital(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let listen = config
        .get_string("web", "listen")
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let addr: std::net::SocketAddr = match listen.parse() {
        Ok(a) => a,
        Err(_) => {
            eprintln!("error: invalid [web] listen address: {listen}");
            return ExitCode::from(2);
        }
    };

    let state = AppState {
        store,
        starting_capital,
    };

    let router = match build_router(state, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Starting journal server on {addr}");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(async {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error: failed to bind {addr}: {e}");
                return ExitCode::from(1);
            }
        };
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("error: server failed: {e}");
            return ExitCode::from(1);
        }
        ExitCode::SUCCESS
    })
}

fn run_stats(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let starting_capital = match resolve_starting_capital(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let trades = match store.list_trades() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let stats = DashboardStats::compute(&trades, starting_capital);
    let breakdown = StatsBreakdown::compute(&trades);

    eprintln!("=== Journal Statistics ===");
    eprintln!("Total Trades:     {}", stats.total_trades);
    eprintln!("Open Trades:      {}", breakdown.open_trades);
    eprintln!("Win Rate:         {}%", stats.win_rate);
    eprintln!("Total P&L:        ${}", stats.total_pnl);
    eprintln!("Current Capital:  ${}", stats.current_capital);
    eprintln!("Avg Win:          ${}", breakdown.avg_win);
    eprintln!("Avg Loss:         ${}", breakdown.avg_loss);
    match breakdown.profit_factor {
        Some(pf) => eprintln!("Profit Factor:    {pf}"),
        None => eprintln!("Profit Factor:    n/a"),
    }

    if !breakdown.instruments.is_empty() {
        eprintln!("\n=== Per-Instrument ===");
        for stat in &breakdown.instruments {
            let sign = if stat.total_pnl >= Decimal::ZERO { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {}${}",
                stat.instrument, stat.trades, sign, stat.total_pnl,
            );
        }
    }

    ExitCode::SUCCESS
}

fn run_export(config_path: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let trades = match store.list_trades() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let output = output
        .cloned()
        .unwrap_or_else(|| PathBuf::from("trades.csv"));

    let file = match fs::File::create(&output) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: failed to create {}: {}", output.display(), e);
            return ExitCode::from(1);
        }
    };

    if let Err(e) = csv_adapter::export_trades(&trades, file) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Exported {} trades to {}", trades.len(), output.display());
    ExitCode::SUCCESS
}

fn run_hash_password() -> ExitCode {
    use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
    use rand::rngs::OsRng;
    use std::io::{self, BufRead};

    eprintln!("Enter password to hash:");
    let stdin = io::stdin();
    let password = match stdin.lock().lines().next() {
        Some(Ok(line)) => line,
        _ => {
            eprintln!("error: failed to read password from stdin");
            return ExitCode::from(1);
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
    let hash = match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: failed to hash password: {e}");
            return ExitCode::from(1);
        }
    };

    println!("{hash}");
    ExitCode::SUCCESS
}
