mod api;
mod backend;
mod config;
mod dashboard;
mod types;

#[cfg(test)]
mod testing;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::{DashboardApi, HttpDashboardApi};
use backend::BackendState;
use config::Settings;
use dashboard::DashboardController;
use types::{StartTradingRequest, Strategy, TimeFrame};

#[derive(Parser)]
#[command(name = "trading-dashboard")]
#[command(version = "0.1.0")]
#[command(about = "Terminal dashboard for a trading bot backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive dashboard
    Run,
    /// Show trading status and performance
    Status,
    /// Start trading
    Start {
        /// Strategy (ma, rsi)
        #[arg(short, long, default_value = "ma")]
        strategy: String,
        /// Symbol to trade
        #[arg(long, default_value = "BTC/USDT:USDT")]
        symbol: String,
        /// Candle timeframe (1m, 5m, 15m, 1h, 4h, 1d)
        #[arg(short, long, default_value = "1h")]
        timeframe: String,
    },
    /// Stop trading
    Stop,
    /// List recommended volatile coins
    Volatile,
    /// Serve the in-memory demo backend
    Serve {
        /// Port (defaults to backend.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    // RUST_LOG overrides the --verbose level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    if cli.json_logs {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let settings = Settings::load(Some(&cli.config))?;

    match cli.command {
        Commands::Run => run_dashboard(&settings).await?,
        Commands::Status => show_status(&settings).await?,
        Commands::Start { strategy, symbol, timeframe } => {
            let request = parse_start_request(&strategy, &symbol, &timeframe)?;
            let message = HttpDashboardApi::new(&settings.api)?.start_trading(request).await?;
            println!("{}", message);
        }
        Commands::Stop => {
            let message = HttpDashboardApi::new(&settings.api)?.stop_trading().await?;
            println!("{}", message);
        }
        Commands::Volatile => {
            let coins = HttpDashboardApi::new(&settings.api)?.volatile_coins().await?;
            for coin in coins {
                println!("{}", coin.symbol);
            }
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(settings.backend.port);
            backend::serve(BackendState::new(&settings.backend), port).await?;
        }
        Commands::Config => {
            print!("{}", settings.to_toml()?);
        }
    }

    Ok(())
}

fn parse_start_request(strategy: &str, symbol: &str, timeframe: &str) -> Result<StartTradingRequest> {
    let strategy: Strategy = strategy.parse().map_err(|e: String| anyhow!(e))?;
    let timeframe: TimeFrame = timeframe.parse().map_err(|e: String| anyhow!(e))?;
    if symbol.trim().is_empty() {
        return Err(anyhow!("symbol must not be empty"));
    }
    Ok(StartTradingRequest::new(strategy.as_str(), symbol, timeframe.as_str()))
}

fn strategy_help() -> String {
    Strategy::all()
        .iter()
        .map(|s| format!("{} ({})", s.as_str(), s.display_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn show_status(settings: &Settings) -> Result<()> {
    let api = HttpDashboardApi::new(&settings.api)?;
    let (status, performance) = tokio::join!(api.trading_status(), api.performance());

    println!("\n=== Trading Status ===");
    println!("Backend:      {}", api.base_url());
    println!("Trading:      {}", if status?.is_trading { "active" } else { "idle" });

    let view = dashboard::render::render_performance(&performance?);
    println!("Total Return: {}", view.total_return);
    println!("Win Rate:     {}", view.win_rate);
    println!("Total Trades: {}", view.total_trades);
    println!("Balance:      {}", view.current_balance);
    Ok(())
}

async fn run_dashboard(settings: &Settings) -> Result<()> {
    let api = HttpDashboardApi::new(&settings.api)?;
    info!("Connecting to backend at {}", api.base_url());

    let controller = DashboardController::new(Arc::new(api), settings);
    let mut events = controller.subscribe();
    controller.initialize().await;
    println!("{}", controller.view());

    let printer = {
        let controller = controller.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_) => println!("{}", controller.view()),
                    Err(RecvError::Lagged(skipped)) => warn!("View printer skipped {} events", skipped),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    println!("Commands: start <strategy> <symbol> <timeframe> | stop | strategy <name> | volatile | dismiss | view | quit");
    println!("Strategies: {}", strategy_help());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&controller, line.trim()) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    controller.shutdown();
    printer.abort();
    Ok(())
}

/// Returns false when the session should end.
fn handle_command(controller: &DashboardController, line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => {}
        ["quit"] | ["exit"] => return false,
        ["start", strategy, symbol, timeframe] => match parse_start_request(strategy, symbol, timeframe) {
            Ok(request) => {
                let controller = controller.clone();
                tokio::spawn(async move {
                    controller.start_trading(request).await;
                });
            }
            Err(e) => warn!("{}", e),
        },
        ["stop"] => {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.stop_trading().await;
            });
        }
        ["strategy", name] => match name.parse::<Strategy>() {
            Ok(strategy) => {
                let controller = controller.clone();
                tokio::spawn(async move {
                    controller.select_strategy(strategy).await;
                });
            }
            Err(e) => warn!("{}", e),
        },
        ["volatile"] => {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.load_volatile_coins().await;
            });
        }
        ["dismiss"] => controller.dismiss_notification(),
        ["view"] => println!("{}", controller.view()),
        _ => warn!("Unknown command: {}", line),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_request() {
        let request = parse_start_request("RSI", "ETH/USDT:USDT", "15m").unwrap();
        assert_eq!(request, StartTradingRequest::new("rsi", "ETH/USDT:USDT", "15m"));

        assert!(parse_start_request("macd", "ETH/USDT:USDT", "15m").is_err());
        assert!(parse_start_request("ma", "ETH/USDT:USDT", "2h").is_err());
        assert!(parse_start_request("ma", " ", "1h").is_err());
    }

    #[test]
    fn test_strategy_help_lists_every_strategy() {
        assert_eq!(strategy_help(), "ma (Moving Average), rsi (RSI Scalping)");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["trading-dashboard", "--json-logs", "serve", "--port", "8080"]);
        assert!(cli.json_logs);
        assert_eq!(cli.config, "dashboard.toml");
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));

        let cli = Cli::parse_from(["trading-dashboard", "start", "-s", "rsi", "-t", "5m"]);
        match cli.command {
            Commands::Start { strategy, symbol, timeframe } => {
                assert_eq!(strategy, "rsi");
                assert_eq!(symbol, "BTC/USDT:USDT");
                assert_eq!(timeframe, "5m");
            }
            _ => panic!("expected start"),
        }
    }
}
