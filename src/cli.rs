//! CLI definition and dispatch.
//!
//! The service functions below take port trait objects so the same flows
//! run against SQLite in production and in-memory mocks in tests.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::{read_code_file, read_price_file, CsvPriceAdapter};
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReportAdapter;
use crate::domain::closeout::{close_position, ClosedPosition};
use crate::domain::config_validation::{
    build_capital_config, build_price_source, validate_config, PriceSource,
};
use crate::domain::dashboard::{evaluate_portfolio, DashboardRow};
use crate::domain::error::RectrackError;
use crate::domain::position::{AdditionalBuy, Country, ListedCode, NewPosition};
use crate::domain::returns::CapitalConfig;
use crate::ports::price_port::PriceSeriesPort;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::{
    AdditionalBuyStore, CloseOutStore, ClosedPositionArchive, CodeDirectory, PositionStore,
};

#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;

/// Rows returned by `search-code` unless `--limit` says otherwise.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Config keys that `RECTRACK_<SECTION>_<KEY>` variables may override.
pub const ENV_OVERRIDABLE: &[(&str, &str)] = &[
    ("capital", "krw"),
    ("capital", "usd"),
    ("sqlite", "path"),
    ("sqlite", "pool_size"),
    ("prices", "source"),
    ("prices", "dir"),
];

#[derive(Parser, Debug)]
#[command(name = "rectrack", about = "Recommended-stock return tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database schema
    Init {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show lump-sum, DCA and composite returns for every position
    Dashboard {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Register a recommended position
    AddPosition {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value = "")]
        recommender: String,
        #[arg(long)]
        rec_date: String,
        #[arg(long, default_value = "KR")]
        country: String,
    },
    /// Record an additional purchase as a percentage of the fixed capital
    AddBuy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        ratio_pct: f64,
    },
    /// Close a position at a date and archive its returns
    Sell {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        date: String,
    },
    /// List closed positions, latest first
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List additional purchases, latest first
    Buys {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load a date,close_price CSV into the price table of a code
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Load a name,code CSV into the KR listed-code directory
    ImportCodes {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        file: PathBuf,
    },
    /// Look up KR listed codes by part of the company name
    SearchCode {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command, &mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RectrackError> {
    let mut adapter =
        FileConfigAdapter::from_file(path).map_err(|e| RectrackError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    adapter.apply_env_overrides(ENV_OVERRIDABLE, std::env::vars());
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RectrackError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        RectrackError::invalid_input(field, format!("'{value}' is not a YYYY-MM-DD date"))
    })
}

pub fn report_for(format: OutputFormat) -> Box<dyn ReportPort> {
    match format {
        OutputFormat::Table => Box::new(TextReportAdapter),
        OutputFormat::Csv => Box::new(CsvReportAdapter),
    }
}

pub fn dashboard_rows(
    positions: &dyn PositionStore,
    buys: &dyn AdditionalBuyStore,
    prices: &dyn PriceSeriesPort,
    capital: &CapitalConfig,
) -> Result<Vec<DashboardRow>, RectrackError> {
    let all_positions = positions.list_positions()?;
    let all_buys = buys.list_additional_buys()?;
    Ok(evaluate_portfolio(prices, &all_positions, &all_buys, capital))
}

pub fn add_position(
    positions: &dyn PositionStore,
    position: &NewPosition,
) -> Result<i64, RectrackError> {
    position.validate()?;
    positions.insert_position(position)
}

/// Record an additional purchase for a code that is currently tracked.
pub fn add_buy(
    positions: &dyn PositionStore,
    buys: &dyn AdditionalBuyStore,
    buy: &AdditionalBuy,
) -> Result<(), RectrackError> {
    let tracked = positions
        .list_positions()?
        .iter()
        .any(|p| buy.matches_code(&p.code));
    if !tracked {
        return Err(RectrackError::invalid_input(
            "code",
            format!("{} is not a tracked position", buy.code),
        ));
    }
    buys.insert_additional_buy(buy)
}

/// Close position `id` at `sell_date`: evaluate, then archive and remove it
/// in one store operation.
pub fn sell_position(
    positions: &dyn CloseOutStore,
    buys: &dyn AdditionalBuyStore,
    prices: &dyn PriceSeriesPort,
    capital: &CapitalConfig,
    id: i64,
    sell_date: NaiveDate,
) -> Result<ClosedPosition, RectrackError> {
    let position = positions
        .find_position(id)?
        .ok_or(RectrackError::PositionNotFound { id })?;

    let series = prices
        .fetch_series_until(&position.code, sell_date)?
        .ok_or_else(|| RectrackError::NoData {
            code: position.code.clone(),
        })?;

    let all_buys = buys.list_additional_buys()?;
    let record = close_position(capital, &position, &all_buys, &series, sell_date)?;

    positions.close_out(id, &record)?;
    info!(id, code = %position.code, %sell_date, "position closed");
    Ok(record)
}

/// Newest purchase first, for display.
pub fn buys_latest_first(
    buys: &dyn AdditionalBuyStore,
) -> Result<Vec<AdditionalBuy>, RectrackError> {
    let mut all = buys.list_additional_buys()?;
    all.reverse();
    Ok(all)
}

pub fn search_codes(
    directory: &dyn CodeDirectory,
    name: &str,
    limit: usize,
) -> Result<Vec<ListedCode>, RectrackError> {
    if name.trim().is_empty() {
        return Err(RectrackError::invalid_input("name", "must not be empty"));
    }
    if limit == 0 {
        return Err(RectrackError::invalid_input("limit", "must be at least 1"));
    }
    directory.search_codes(name, limit)
}

#[cfg(feature = "sqlite")]
fn open_store(config: &FileConfigAdapter) -> Result<SqliteAdapter, RectrackError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

#[cfg(feature = "sqlite")]
fn with_prices<T>(
    config: &FileConfigAdapter,
    store: &SqliteAdapter,
    f: impl FnOnce(&dyn PriceSeriesPort) -> Result<T, RectrackError>,
) -> Result<T, RectrackError> {
    match build_price_source(config)? {
        PriceSource::Sqlite => f(store),
        PriceSource::Csv { dir } => f(&CsvPriceAdapter::new(dir)),
    }
}

#[cfg(feature = "sqlite")]
pub fn execute(command: Command, out: &mut dyn Write) -> Result<(), RectrackError> {
    match command {
        Command::Init { config } => {
            let config = load_config(&config)?;
            open_store(&config)?;
            writeln!(out, "Schema initialized")?;
        }
        Command::Dashboard { config, format } => {
            let config = load_config(&config)?;
            let capital = build_capital_config(&config)?;
            let store = open_store(&config)?;
            let rows = with_prices(&config, &store, |prices| {
                dashboard_rows(&store, &store, prices, &capital)
            })?;
            report_for(format).write_dashboard(&rows, out)?;
        }
        Command::AddPosition {
            config,
            name,
            code,
            recommender,
            rec_date,
            country,
        } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let position = NewPosition {
                name: name.trim().to_string(),
                code: code.trim().to_string(),
                recommender: recommender.trim().to_string(),
                country: country.parse::<Country>()?,
                rec_date: parse_date("rec_date", &rec_date)?,
            };
            let id = add_position(&store, &position)?;
            writeln!(out, "Added position {} ({})", id, position.code)?;
        }
        Command::AddBuy {
            config,
            code,
            date,
            ratio_pct,
        } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let buy = AdditionalBuy::from_percent(&code, parse_date("date", &date)?, ratio_pct)?;
            add_buy(&store, &store, &buy)?;
            writeln!(
                out,
                "Added buy {} {} {:.1}%",
                buy.code,
                buy.date,
                buy.ratio * 100.0
            )?;
        }
        Command::Sell { config, id, date } => {
            let config = load_config(&config)?;
            let capital = build_capital_config(&config)?;
            let store = open_store(&config)?;
            let sell_date = parse_date("date", &date)?;
            let record = with_prices(&config, &store, |prices| {
                sell_position(&store, &store, prices, &capital, id, sell_date)
            })?;
            writeln!(
                out,
                "Closed {} ({}) on {}: comp {:.2}%, lump {:.2}%, dca {:.2}%",
                record.name,
                record.code,
                record.sell_date,
                record.return_comp,
                record.return_lump,
                record.return_dca
            )?;
        }
        Command::History { config, format } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let records = store.list_closed()?;
            report_for(format).write_history(&records, out)?;
        }
        Command::Buys { config } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let buys = buys_latest_first(&store)?;
            TextReportAdapter.write_additional_buys(&buys, out)?;
        }
        Command::ImportPrices { config, code, file } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let points = read_price_file(&file)?;
            store.insert_prices(&code, &points)?;
            writeln!(out, "Imported {} prices for {}", points.len(), code.trim())?;
        }
        Command::ImportCodes { config, file } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let codes = read_code_file(&file)?;
            store.insert_codes(&codes)?;
            writeln!(out, "Imported {} listed codes", codes.len())?;
        }
        Command::SearchCode {
            config,
            name,
            limit,
        } => {
            let config = load_config(&config)?;
            let store = open_store(&config)?;
            let found = search_codes(&store, &name, limit)?;
            if found.is_empty() {
                writeln!(out, "No matching codes.")?;
            }
            for listed in &found {
                writeln!(out, "{} {}", listed.code, listed.name)?;
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
pub fn execute(command: Command, _out: &mut dyn Write) -> Result<(), RectrackError> {
    let _ = command;
    Err(RectrackError::Database {
        reason: "sqlite feature is required".into(),
    })
}
