use cipherscore::{
    ApiClient, ClientConfig, Dashboard, Phase, RoundsRange, Session, CUSTOM_CIPHER_ID,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(author, version, about = "Cipher security audit client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// TOML settings file (defaults to ./cipherscore.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Audit backend address, e.g. http://localhost:8000
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
    /// Write logs to this file (the dashboard never logs to the terminal)
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Tui {
        /// Cipher id to preselect
        #[arg(long)]
        cipher: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(100..=5000))]
        rounds: Option<u32>,
        /// Load the custom cipher editor from this file
        #[arg(long, value_name = "FILE")]
        custom_file: Option<PathBuf>,
    },
    /// List the ciphers offered by the backend
    Ciphers,
    /// Run one audit without the dashboard and print the report
    Audit {
        #[arg(long)]
        cipher: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(100..=5000))]
        rounds: Option<u32>,
        /// Source file sent as custom code when --cipher is "custom"
        #[arg(long, value_name = "FILE")]
        custom_file: Option<PathBuf>,
        /// Print the backend response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the backend is reachable
    Ping,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui { .. }));
    init_tracing(cli.verbose, cli.log_file.as_deref(), interactive)?;

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let runtime = Runtime::new()?;
    let client = ApiClient::new(&config)?;
    info!(base_url = %client.base_url(), "client ready");

    match cli.command {
        None => run_tui(&runtime, client, config)?,
        Some(Commands::Tui {
            cipher,
            rounds,
            custom_file,
        }) => {
            if let Some(cipher) = cipher {
                config.cipher = Some(cipher);
            }
            if let Some(rounds) = rounds {
                config.rounds = rounds;
            }
            if let Some(path) = custom_file {
                config.custom_source = Some(path);
            }
            run_tui(&runtime, client, config)?
        }
        Some(Commands::Ciphers) => run_ciphers(&runtime, &client)?,
        Some(Commands::Audit {
            cipher,
            rounds,
            custom_file,
            json,
        }) => {
            if let Some(rounds) = rounds {
                config.rounds = rounds;
            }
            if let Some(path) = custom_file {
                config.custom_source = Some(path);
            }
            run_audit(&runtime, &client, &config, &cipher, json)?
        }
        Some(Commands::Ping) => run_ping(&runtime, &client)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8, log_file: Option<&Path>, interactive: bool) -> CliResult<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cipherscore={level}")));
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        // Anything written to the terminal would tear the dashboard.
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run_tui(runtime: &Runtime, client: ApiClient, config: ClientConfig) -> CliResult<()> {
    let custom_code = config.read_custom_source()?;
    let mut session = Session::from_config(&config, custom_code);
    let mut dashboard = Dashboard::open()?;
    dashboard.run(runtime.handle(), client, &mut session)?;
    Ok(())
}

fn run_ciphers(runtime: &Runtime, client: &ApiClient) -> CliResult<()> {
    let ciphers = runtime.block_on(client.list_ciphers())?;
    if ciphers.is_empty() {
        println!("Backend at {} offers no ciphers", client.base_url());
        return Ok(());
    }
    println!("Ciphers offered by {}:", client.base_url());
    let width = ciphers.iter().map(|c| c.id.len()).max().unwrap_or(0);
    for cipher in &ciphers {
        let marker = if cipher.is_custom() {
            "  (send source with --custom-file)"
        } else {
            ""
        };
        println!("  {:<width$}  {}{marker}", cipher.id, cipher.name);
    }
    Ok(())
}

fn run_audit(
    runtime: &Runtime,
    client: &ApiClient,
    config: &ClientConfig,
    cipher: &str,
    json: bool,
) -> CliResult<()> {
    let custom_code = config.read_custom_source()?;
    let rounds = RoundsRange::AUDIT.snap(config.rounds);
    let mut session = Session::new(rounds, Some(cipher.to_string()), custom_code);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
    spinner.set_message(format!("Auditing {cipher} with {rounds} rounds"));
    spinner.enable_steady_tick(Duration::from_millis(120));
    runtime.block_on(session.submit(client));
    spinner.finish_and_clear();

    match session.phase() {
        Phase::Success => {}
        _ => {
            let message = session
                .error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "audit produced no report".to_string());
            return Err(message.into());
        }
    }
    let Some(report) = session.report() else {
        return Err("audit produced no report".into());
    };

    if json {
        let body = serde_json::json!({
            "cipher_name": session.report_title(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let summary = report.summary();
    let title = session.report_title().unwrap_or(cipher);
    println!("Audit report for {title} ({rounds} rounds)");
    if cipher == CUSTOM_CIPHER_ID {
        println!("  custom source: {} lines", session.custom_code().lines().count());
    }
    println!(
        "  Avalanche Effect  → {:>12} ({}) | Target: 50% (Ideal Randomness)",
        summary.avalanche,
        summary.grade.label()
    );
    println!(
        "  Encryption Speed  → {:>12} | Lower is Better",
        summary.speed
    );
    println!(
        "  Peak Memory       → {:>12} | IoT Target: < 10 KB",
        summary.memory
    );
    println!(
        "  Attack Resistance → {:>12} | Simulation Result",
        summary.attack_status
    );
    println!();
    println!("Raw data:");
    println!("{}", report.raw_dump());
    Ok(())
}

fn run_ping(runtime: &Runtime, client: &ApiClient) -> CliResult<()> {
    let message = runtime.block_on(client.health())?;
    println!("{} → {}", client.base_url(), message);
    Ok(())
}
