//! CLI definition and dispatch.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::terminal::terminal_timeframe;
use crate::adapters::yahoo::yahoo_interval;
use crate::adapters::{build_exchange, Provider};
use crate::domain::error::ExchangeError;
use crate::domain::price::PriceSeriesBatch;
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;
use crate::ports::exchange_port::Exchange;

#[derive(Parser, Debug)]
#[command(
    name = "pricefeed",
    about = "Historical price bars from a trading terminal or Yahoo Finance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch bars for one or more symbols and write them as CSV
    Prices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_enum)]
        provider: Option<Provider>,
        /// Comma-separated list, e.g. "AAPL,MSFT"
        #[arg(long)]
        symbols: String,
        #[arg(short, long, default_value = "D1")]
        timeframe: String,
        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        from: String,
        /// YYYY-MM-DD or RFC 3339
        #[arg(long)]
        to: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the timeframe catalog and each provider's native token
    Timeframes,
    /// Connect to a provider and report whether it is reachable
    Check {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, value_enum)]
        provider: Option<Provider>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Prices {
            config,
            provider,
            symbols,
            timeframe,
            from,
            to,
            output,
        } => run_prices(
            &config,
            provider,
            &symbols,
            &timeframe,
            &from,
            &to,
            output.as_deref(),
        ),
        Command::Timeframes => run_timeframes(),
        Command::Check { config, provider } => run_check(&config, provider),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (tests run several commands).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })?;
    let level = adapter
        .get_string("logging", "level")
        .unwrap_or_else(|| "info".to_string());
    init_logging(&level);
    Ok(adapter)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolListError {
    #[error("no symbols given")]
    Empty,

    #[error("empty token in symbol list")]
    EmptyToken,
}

/// Splits a comma-separated symbol list. Order is kept; duplicates are dropped.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    if input.trim().is_empty() {
        return Err(SymbolListError::Empty);
    }
    let mut symbols: Vec<String> = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        if !symbols.iter().any(|s| s == trimmed) {
            symbols.push(trimmed.to_string());
        }
    }
    Ok(symbols)
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| format!("invalid date '{input}' (expected YYYY-MM-DD or RFC 3339)"))
}

#[derive(Debug, Clone)]
pub struct PriceRequest {
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// connect, batch fetch, disconnect. Disconnects even when the fetch fails.
pub fn fetch_batch(
    exchange: &mut dyn Exchange,
    request: &PriceRequest,
) -> Result<PriceSeriesBatch, ExchangeError> {
    if !exchange.connect() {
        warn!(provider = exchange.name(), "connect failed, results may be empty");
    }
    let result = exchange.get_several_asset_prices(
        &request.symbols,
        &request.timeframe,
        request.from,
        request.to,
    );
    exchange.disconnect();
    result
}

/// Writes every series as `symbol,timestamp,open,high,low,close,adj_close,volume,spread`.
pub fn write_csv<W: Write>(batch: &PriceSeriesBatch, writer: W) -> Result<(), ExchangeError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "symbol", "timestamp", "open", "high", "low", "close", "adj_close", "volume", "spread",
    ])
    .map_err(io::Error::from)?;

    for (symbol, series) in batch {
        for bar in &series.bars {
            wtr.write_record([
                symbol.clone(),
                bar.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.adj_close.map(|v| v.to_string()).unwrap_or_default(),
                bar.volume.to_string(),
                bar.spread.map(|v| v.to_string()).unwrap_or_default(),
            ])
            .map_err(io::Error::from)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn run_prices(
    config_path: &Path,
    provider: Option<Provider>,
    symbols: &str,
    timeframe: &str,
    from: &str,
    to: &str,
    output_path: Option<&Path>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match parse_symbols(symbols) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let (from, to) = match (parse_datetime(from), parse_datetime(to)) {
        (Ok(f), Ok(t)) if f <= t => (f, t),
        (Ok(_), Ok(_)) => {
            eprintln!("error: --from must not be after --to");
            return ExitCode::from(2);
        }
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut exchange = match Provider::resolve(provider, &config)
        .and_then(|p| build_exchange(p, &config))
    {
        Ok(ex) => ex,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    info!(
        provider = exchange.name(),
        symbols = symbols.len(),
        timeframe,
        %from,
        %to,
        "fetching prices"
    );

    let request = PriceRequest {
        symbols,
        timeframe: timeframe.to_string(),
        from,
        to,
    };
    let batch = match fetch_batch(exchange.as_mut(), &request) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            if matches!(e, ExchangeError::InvalidTimeframe { .. }) {
                let supported: Vec<&str> = exchange
                    .supported_timeframes()
                    .iter()
                    .map(|tf| tf.as_str())
                    .collect();
                eprintln!("{} supports: {}", exchange.name(), supported.join(", "));
            }
            return (&e).into();
        }
    };

    for (symbol, series) in &batch {
        if series.is_empty() {
            warn!(symbol, "no bars returned");
        } else {
            info!(symbol, bars = series.len(), "bars received");
        }
    }

    let written = match output_path {
        Some(path) => File::create(path)
            .map_err(ExchangeError::from)
            .and_then(|file| write_csv(&batch, file)),
        None => write_csv(&batch, io::stdout().lock()),
    };
    if let Err(e) = written {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Some(path) = output_path {
        eprintln!("Wrote {}", path.display());
    }

    ExitCode::SUCCESS
}

/// One row per catalog entry: token, bar length, terminal constant, yahoo interval.
pub fn timeframe_table() -> Vec<[String; 4]> {
    Timeframe::ALL
        .iter()
        .map(|&tf| {
            let secs = tf.duration().as_secs();
            let length = if secs % 86_400 == 0 {
                format!("{}d", secs / 86_400)
            } else if secs % 3_600 == 0 {
                format!("{}h", secs / 3_600)
            } else {
                format!("{}m", secs / 60)
            };
            [
                tf.as_str().to_string(),
                length,
                terminal_timeframe(tf)
                    .map(|n| n.0.to_string())
                    .unwrap_or_else(|| "-".into()),
                yahoo_interval(tf).unwrap_or("-").to_string(),
            ]
        })
        .collect()
}

fn run_timeframes() -> ExitCode {
    init_logging("warn");
    println!("{:<6} {:>6} {:>10} {:>8}", "TF", "LENGTH", "terminal", "yahoo");
    for [tf, length, terminal, yahoo] in timeframe_table() {
        println!("{tf:<6} {length:>6} {terminal:>10} {yahoo:>8}");
    }
    ExitCode::SUCCESS
}

fn run_check(config_path: &Path, provider: Option<Provider>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let mut exchange = match Provider::resolve(provider, &config)
        .and_then(|p| build_exchange(p, &config))
    {
        Ok(ex) => ex,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let connected = exchange.connect();
    exchange.disconnect();
    if connected {
        println!("{}: connected", exchange.name());
        ExitCode::SUCCESS
    } else {
        println!("{}: unavailable", exchange.name());
        ExitCode::from(4)
    }
}
