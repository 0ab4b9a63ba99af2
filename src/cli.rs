//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::{
    self, SOURCE_CSV, STRATEGY_GEM, parse_strategy_kind, validate_backtest_config,
    validate_strategy_section,
};
use crate::domain::daily_record::{DateRange, InstrumentId};
use crate::domain::error::GemtraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::series::load_universe_series;
use crate::domain::strategy::{Strategy, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "gemtrader", about = "Dual-momentum and buy-and-hold portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Valuation CSV path, overriding `[report] output`
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// `gem` or `single_allocation`, overriding `[backtest] strategy`
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Import a CSV price file into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List instruments available in the configured store
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for instrument(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

/// Where price records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sqlite,
    Csv(PathBuf),
}

/// Run-level settings outside the strategy itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktestConfig {
    pub range: DateRange,
    pub data_source: DataSource,
    pub output: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            output,
            strategy,
        } => run_backtest(&config, output.as_deref(), strategy.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Import { config, code, file } => run_import(&config, &code, &file),
        Command::ListInstruments { config } => run_list_instruments(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, GemtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| GemtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_backtest(
    config_path: &Path,
    output_override: Option<&Path>,
    strategy_override: Option<&str>,
) -> Result<(), GemtraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;

    let kind = resolve_strategy_kind(&adapter, strategy_override)?;
    validate_strategy_section(&adapter, &kind)?;
    let strategy = build_strategy_config(&adapter, &kind)?;
    eprintln!("Loading strategy: {}", strategy.name);

    let mut bt_config = build_backtest_config(&adapter)?;
    if let Some(output) = output_override {
        bt_config.output = Some(output.to_path_buf());
    }

    let data_port = open_data_port(&adapter, &bt_config.data_source)?;
    let (_, summary) = run_backtest_pipeline(data_port.as_ref(), &strategy, &bt_config)?;
    print_summary(&summary);

    if let Some(output) = &bt_config.output {
        eprintln!("\nValuations written to: {}", output.display());
    }
    Ok(())
}

fn resolve_strategy_kind(
    config: &dyn ConfigPort,
    strategy_override: Option<&str>,
) -> Result<String, GemtraderError> {
    match strategy_override {
        Some(kind) => parse_strategy_kind(kind),
        None => config_validation::strategy_kind(config),
    }
}

/// Turns the validated strategy sections into a [`StrategyConfig`].
pub fn build_strategy_config(
    config: &dyn ConfigPort,
    kind: &str,
) -> Result<StrategyConfig, GemtraderError> {
    let initial_amount = config_validation::initial_amount(config)?;
    let reinvest_dividends = config_validation::reinvest_dividends(config)?;

    let strategy = if parse_strategy_kind(kind)? == STRATEGY_GEM {
        Strategy::Momentum {
            universe: config_validation::rotation_universe(config)?,
            lookback_months: config_validation::lookback_months(config)?,
        }
    } else {
        Strategy::BuyAndHold {
            instrument: InstrumentId::new(&config.require_string("single_allocation", "instrument")?),
        }
    };

    let name = config.get_string("backtest", "name").unwrap_or_else(|| match &strategy {
        Strategy::BuyAndHold { instrument } => instrument.to_string(),
        Strategy::Momentum { .. } => "GEM".to_string(),
    });

    Ok(StrategyConfig {
        name,
        initial_amount,
        reinvest_dividends,
        strategy,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, GemtraderError> {
    let unbounded = DateRange::unbounded();
    let start = config_validation::parse_date(config, "start_date")?.unwrap_or(unbounded.start);
    let end = config_validation::parse_date(config, "end_date")?.unwrap_or(unbounded.end);

    let data_source = if config_validation::data_source(config)? == SOURCE_CSV {
        DataSource::Csv(PathBuf::from(config.require_string("csv", "dir")?))
    } else {
        DataSource::Sqlite
    };

    Ok(BacktestConfig {
        range: DateRange::new(start, end),
        data_source,
        output: config.get_string("report", "output").map(PathBuf::from),
    })
}

pub fn open_data_port(
    config: &dyn ConfigPort,
    source: &DataSource,
) -> Result<Box<dyn DataPort>, GemtraderError> {
    match source {
        DataSource::Csv(dir) => Ok(Box::new(CsvAdapter::new(dir.clone()))),
        DataSource::Sqlite => open_sqlite(config),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, GemtraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, GemtraderError> {
    Err(GemtraderError::ConfigInvalid {
        section: "backtest".into(),
        key: "data_source".into(),
        reason: "sqlite feature is required for the sqlite data source".into(),
    })
}

/// Loads the universe, simulates, computes metrics and writes the report
/// when an output path is configured.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &StrategyConfig,
    bt_config: &BacktestConfig,
) -> Result<(BacktestResult, PerformanceSummary), GemtraderError> {
    let members = strategy.members();
    let series = load_universe_series(data_port, &members, bt_config.range)?;

    eprintln!(
        "Running backtest: {} instruments, {} dates",
        members.len(),
        series.len()
    );

    let result = backtest_engine::run_backtest(&series, strategy)?;
    let summary = PerformanceSummary::compute(&result);

    if let Some(output) = &bt_config.output {
        CsvReportAdapter::new().write(&result, &summary, &output.to_string_lossy())?;
    }

    Ok((result, summary))
}

fn print_summary(summary: &PerformanceSummary) {
    eprintln!("\n=== Results ===");
    eprintln!("Initial Amount:   {}", summary.initial_amount);
    eprintln!("Ending Value:     {}", summary.ending_value);
    eprintln!("Simulation Years: {}", summary.simulation_years);
    match &summary.total_return {
        Ok(r) => eprintln!("Total Return:     {:.2}%", r),
        Err(e) => eprintln!("Total Return:     undefined ({e})"),
    }
    match &summary.cagr {
        Ok(c) => eprintln!("CAGR:             {:.2}%", c),
        Err(e) => eprintln!("CAGR:             undefined ({e})"),
    }
    match &summary.annualized_std_dev {
        Ok(s) => eprintln!("Std Deviation:    {:.2}%", s),
        Err(e) => eprintln!("Std Deviation:    undefined ({e})"),
    }
    match &summary.max_drawdown {
        Ok(dd) => eprintln!("Max Drawdown:     -{:.1}%", dd * 100.0),
        Err(e) => eprintln!("Max Drawdown:     undefined ({e})"),
    }
    eprintln!("Drawdown Days:    {}", summary.max_drawdown_duration);
}

fn run_validate(config_path: &Path) -> Result<(), GemtraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;

    let kind = config_validation::strategy_kind(&adapter)?;
    validate_strategy_section(&adapter, &kind)?;
    let strategy = build_strategy_config(&adapter, &kind)?;
    let bt_config = build_backtest_config(&adapter)?;

    eprintln!("\nStrategy: {} ({})", strategy.name, strategy.strategy.kind());
    match &strategy.strategy {
        Strategy::BuyAndHold { instrument } => eprintln!("  instrument: {instrument}"),
        Strategy::Momentum {
            universe,
            lookback_months,
        } => {
            eprintln!("  risk_on:    {}", join_ids(&universe.risk_on));
            eprintln!("  risk_off:   {}", join_ids(&universe.risk_off));
            eprintln!("  risk_free:  {}", universe.risk_free);
            eprintln!("  lookback:   {lookback_months} months");
        }
    }
    eprintln!("  initial amount: {}", strategy.initial_amount);
    eprintln!("  reinvest dividends: {}", strategy.reinvest_dividends);
    eprintln!("  range: {} to {}", bt_config.range.start, bt_config.range.end);

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn join_ids(ids: &[InstrumentId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, code: &str, file: &Path) -> Result<(), GemtraderError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = load_config(config_path)?;
    let instrument = InstrumentId::new(code);
    let records = CsvAdapter::read_file(file, &instrument)?;

    for record in &records {
        record
            .price()
            .validate()
            .map_err(|reason| GemtraderError::InvalidRecord {
                instrument: instrument.to_string(),
                date: record.date,
                reason,
            })?;
    }

    let store = SqliteAdapter::from_config(&adapter)?;
    store.initialize_schema()?;
    let inserted = store.insert_records(&records)?;
    eprintln!("Imported {inserted} records for {instrument} from {}", file.display());
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _code: &str, _file: &Path) -> Result<(), GemtraderError> {
    Err(GemtraderError::ConfigInvalid {
        section: "sqlite".into(),
        key: "path".into(),
        reason: "sqlite feature is required for import".into(),
    })
}

fn run_list_instruments(config_path: &Path) -> Result<(), GemtraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let data_port = open_data_port(&adapter, &bt_config.data_source)?;

    let instruments = data_port.list_instruments()?;
    if instruments.is_empty() {
        eprintln!("No instruments found");
    } else {
        for instrument in &instruments {
            println!("{instrument}");
        }
        eprintln!("{} instruments found", instruments.len());
    }
    Ok(())
}

fn run_info(config_path: &Path, code: Option<&str>) -> Result<(), GemtraderError> {
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let data_port = open_data_port(&adapter, &bt_config.data_source)?;

    let instruments = match code {
        Some(c) => vec![InstrumentId::new(c)],
        None => data_port.list_instruments()?,
    };

    for instrument in &instruments {
        match data_port.get_data_range(instrument)? {
            Some((min_date, max_date, count)) => {
                println!("{instrument}: {count} records, {min_date} to {max_date}");
            }
            None => eprintln!("{instrument}: no data found"),
        }
    }
    Ok(())
}
