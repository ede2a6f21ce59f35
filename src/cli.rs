//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    holding_days, num_windows, optional_date, parameter_grid, required_string, share_quantity,
    validate_config,
};
use crate::domain::error::MacrossError;
use crate::domain::optimizer::{
    OptimizationResult, OptimizerSettings, grid_search, grid_search_sell_side,
};
use crate::domain::params::{ParameterGrid, ParameterPair};
use crate::domain::position_filter::HoldingPeriodFilter;
use crate::domain::price::TimeSeries;
use crate::domain::signal::live_signal_dates;
use crate::domain::walkforward::{WalkForwardConfig, WalkForwardReport, walk_forward};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "macross",
    about = "Moving-average crossover optimizer with walk-forward validation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grid-search the short/long window pair with the best overall performance
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run walk-forward validation over the configured grid
    WalkForward {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List dates on which a pair's crossover signal is on
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        short: usize,
        #[arg(long)]
        long: usize,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Optimize { config, output } => run_optimize(&config, output.as_deref()),
        Command::WalkForward { config, output } => run_walk_forward(&config, output.as_deref()),
        Command::Signals {
            config,
            short,
            long,
            start,
            end,
        } => run_signals(&config, short, long, start, end),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(e: &MacrossError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MacrossError> {
    FileConfigAdapter::from_file(path).map_err(|e| MacrossError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load and validate in one step, as every subcommand starts the same way.
fn load_validated(path: &Path) -> Result<FileConfigAdapter, MacrossError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

/// Settings with the holding filter switched by `[section] holding_filter`.
fn settings_for(
    config: &dyn ConfigPort,
    section: &str,
    filter_by_default: bool,
) -> Result<OptimizerSettings, MacrossError> {
    let filter = if config.get_bool(section, "holding_filter", filter_by_default) {
        Some(HoldingPeriodFilter::new(holding_days(config)?)?)
    } else {
        None
    };
    Ok(OptimizerSettings {
        shares: share_quantity(config)?,
        filter,
    })
}

/// Settings for `optimize`; exits are filtered unless switched off.
pub fn build_settings(config: &dyn ConfigPort) -> Result<OptimizerSettings, MacrossError> {
    settings_for(config, "strategy", true)
}

pub fn build_grid(config: &dyn ConfigPort) -> Result<ParameterGrid, MacrossError> {
    parameter_grid(config, "strategy")
}

pub fn build_sell_grid(config: &dyn ConfigPort) -> Result<Option<ParameterGrid>, MacrossError> {
    if config.has_section("sell") {
        parameter_grid(config, "sell").map(Some)
    } else {
        Ok(None)
    }
}

pub fn build_walk_forward_config(
    config: &dyn ConfigPort,
) -> Result<WalkForwardConfig, MacrossError> {
    Ok(WalkForwardConfig {
        num_windows: num_windows(config)?,
        grid: build_grid(config)?,
        settings: settings_for(config, "walkforward", false)?,
    })
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<CsvAdapter, MacrossError> {
    Ok(CsvAdapter::new(PathBuf::from(required_string(
        config, "data", "path",
    )?)))
}

pub fn date_range(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), MacrossError> {
    Ok((
        optional_date(config, section, "start_date")?,
        optional_date(config, section, "end_date")?,
    ))
}

/// `-o` wins over `[output] results_path`; neither means no file is written.
pub fn resolve_output(config: &dyn ConfigPort, cli_output: Option<&Path>) -> Option<PathBuf> {
    cli_output.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("output", "results_path")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn load_series(config: &dyn ConfigPort) -> Result<TimeSeries, MacrossError> {
    let data = build_data_port(config)?;
    let (start, end) = date_range(config, "data")?;
    let series = data.fetch_series(start, end)?;
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        eprintln!(
            "Loaded {} prices ({} to {})",
            series.len(),
            first.date,
            last.date
        );
    }
    Ok(series)
}

fn print_best(label: &str, result: &Option<OptimizationResult>) {
    match result {
        Some(r) => println!(
            "{label}: {} overall performance {:.4} ({} pairs evaluated)",
            r.best,
            r.best_performance,
            r.results.len()
        ),
        None => println!("{label}: no pair produced a defined performance"),
    }
}

fn optimize(config_path: &Path, output: Option<&Path>) -> Result<(), MacrossError> {
    let adapter = load_validated(config_path)?;
    let series = load_series(&adapter)?;
    let grid = build_grid(&adapter)?;
    let settings = build_settings(&adapter)?;

    let result = grid_search(&series, &grid, &settings)?;
    print_best("Best buy pair", &result);

    let output = resolve_output(&adapter, output);
    if let (Some(path), Some(r)) = (&output, &result) {
        CsvReportAdapter.write_grid(r, path)?;
        eprintln!("Results written to {}", path.display());
    }

    if let (Some(sell_grid), Some(buy)) = (build_sell_grid(&adapter)?, &result) {
        let sell = grid_search_sell_side(&series, buy.best, &sell_grid, &settings)?;
        print_best("Best sell pair", &sell);
        if let (Some(path), Some(r)) = (&output, &sell) {
            let sell_path = sell_output_path(path);
            CsvReportAdapter.write_grid(r, &sell_path)?;
            eprintln!("Sell-side results written to {}", sell_path.display());
        }
    }
    Ok(())
}

/// `results.csv` becomes `results_sell.csv`.
fn sell_output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_sell.{}", ext.to_string_lossy()),
        None => format!("{stem}_sell"),
    };
    path.with_file_name(name)
}

fn run_optimize(config_path: &Path, output: Option<&Path>) -> ExitCode {
    match optimize(config_path, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn print_walk_forward(report: &WalkForwardReport) {
    println!(
        "{:>4}  {:<23}  {:<23}  {:>10}  {:>10}  {:>10}",
        "step", "in-sample", "out-of-sample", "pair", "in-sample", "oos"
    );
    for step in &report.segments {
        let oos = step
            .metrics
            .overall_performance
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>4}  {} {}  {} {}  {:>10}  {:>10.4}  {:>10}",
            step.index,
            step.in_sample.start,
            step.in_sample.end,
            step.out_of_sample.start,
            step.out_of_sample.end,
            step.pair.to_string(),
            step.in_sample_performance,
            oos
        );
    }
    match report.average_performance {
        Some(avg) => println!("Average out-of-sample performance: {avg:.4}"),
        None => println!("Average out-of-sample performance: n/a"),
    }
    println!("Most recent best pair: {}", report.latest_pair);
}

fn walk_forward_command(config_path: &Path, output: Option<&Path>) -> Result<(), MacrossError> {
    let adapter = load_validated(config_path)?;
    let series = load_series(&adapter)?;
    let wf_config = build_walk_forward_config(&adapter)?;

    let report = walk_forward(&series, &wf_config)?;
    print_walk_forward(&report);

    if let Some(path) = resolve_output(&adapter, output) {
        CsvReportAdapter.write_walk_forward(&report, &path)?;
        eprintln!("Report written to {}", path.display());
    }

    if adapter.has_section("prediction") {
        let (start, end) = date_range(&adapter, "prediction")?;
        let prediction = build_data_port(&adapter)?.fetch_series(start, end)?;
        info!(points = prediction.len(), pair = %report.latest_pair, "scanning prediction window");
        print_signal_dates(&report.live_signals(&prediction)?);
    }
    Ok(())
}

fn run_walk_forward(config_path: &Path, output: Option<&Path>) -> ExitCode {
    match walk_forward_command(config_path, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn print_signal_dates(dates: &[NaiveDate]) {
    if dates.is_empty() {
        println!("No buy signals");
        return;
    }
    println!("Buy signal on {} dates:", dates.len());
    for date in dates {
        println!("  {date}");
    }
}

fn signals(
    config_path: &Path,
    short: usize,
    long: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), MacrossError> {
    let pair = ParameterPair::new(short, long)?;
    let adapter = load_config(config_path)?;
    let data = build_data_port(&adapter)?;
    let (cfg_start, cfg_end) = date_range(&adapter, "data")?;
    let series = data.fetch_series(start.or(cfg_start), end.or(cfg_end))?;
    print_signal_dates(&live_signal_dates(&series, pair)?);
    Ok(())
}

fn run_signals(
    config_path: &Path,
    short: usize,
    long: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ExitCode {
    match signals(config_path, short, long, start, end) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_config(&adapter) {
        return fail(&e);
    }

    let summary = build_grid(&adapter).and_then(|grid| {
        let settings = build_settings(&adapter)?;
        let wf = build_walk_forward_config(&adapter)?;
        Ok((grid.pairs().len(), settings, wf))
    });
    match summary {
        Ok((pairs, settings, wf)) => {
            println!("Configuration is valid");
            println!("  Grid pairs: {pairs}");
            println!("  Shares: {}", settings.shares);
            println!("  Optimize holding filter: {}", describe_filter(&settings.filter));
            println!("  Walk-forward windows: {}", wf.num_windows);
            println!(
                "  Walk-forward holding filter: {}",
                describe_filter(&wf.settings.filter)
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn describe_filter(filter: &Option<HoldingPeriodFilter>) -> String {
    match filter {
        Some(f) => format!("{:?} days", f.allowed_days()),
        None => "off".to_string(),
    }
}
