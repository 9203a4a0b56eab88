//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::builtin_indicators::BuiltinIndicators;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{build_strategy, validate_rule};
use crate::domain::error::SignalError;
use crate::domain::evaluator;
use crate::domain::market_data::MarketData;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::replay::{self, HoldPolicy, ReplayRow};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "allocsignal",
    about = "Stateless trading signal evaluators producing 0/1 allocations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a strategy once over the available history
    Evaluate {
        #[arg(short, long, required_unless_present = "preset", conflicts_with = "preset")]
        strategy: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<String>,
        /// Directory holding <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Ignore bars dated after this day (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Replay a strategy bar by bar, as a backtesting host would
    Replay {
        #[arg(short, long, required_unless_present = "preset", conflicts_with = "preset")]
        strategy: Option<PathBuf>,
        #[arg(short, long)]
        preset: Option<String>,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Hold the previous allocation while no signal fires
        #[arg(long)]
        carry: bool,
        /// Write replay rows to this CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List built-in presets
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Evaluate {
            strategy,
            preset,
            data,
            as_of,
        } => run_evaluate(strategy.as_deref(), preset.as_deref(), &data, as_of),
        Command::Replay {
            strategy,
            preset,
            data,
            start,
            end,
            carry,
            output,
        } => {
            let policy = if carry {
                HoldPolicy::Carry
            } else {
                HoldPolicy::Flat
            };
            run_replay(
                strategy.as_deref(),
                preset.as_deref(),
                &data,
                start,
                end,
                policy,
                output.as_deref(),
            )
        }
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Presets => {
            run_presets();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Strategy from an INI file, or from a named preset when no file is given.
pub fn resolve_strategy(
    strategy_path: Option<&Path>,
    preset: Option<&str>,
) -> Result<Strategy, SignalError> {
    match (strategy_path, preset) {
        (Some(path), _) => {
            eprintln!("Loading strategy from {}", path.display());
            let adapter = FileConfigAdapter::from_file(path)?;
            build_strategy(&adapter)
        }
        (None, Some(name)) => {
            let strategy = Strategy::preset(name).ok_or_else(|| {
                SignalError::invalid(
                    "strategy",
                    "preset",
                    format!(
                        "unknown preset '{}', expected one of {}",
                        name,
                        Strategy::PRESETS.join(", ")
                    ),
                )
            })?;
            validate_rule(&strategy.rule)?;
            Ok(strategy)
        }
        (None, None) => Err(SignalError::ConfigMissing {
            section: "strategy".to_string(),
            key: "preset".to_string(),
        }),
    }
}

/// Fetch the history of every tracked asset. Assets without data are skipped
/// with a warning; the evaluator treats them as flat.
pub fn load_histories(
    data_port: &dyn DataPort,
    strategy: &Strategy,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<String, Vec<OhlcvBar>>, SignalError> {
    let mut histories = HashMap::new();
    for symbol in &strategy.assets {
        match data_port.fetch_ohlcv(symbol, start, end) {
            Ok(bars) if bars.is_empty() => {
                eprintln!("warning: no bars for {} between {} and {}", symbol, start, end);
            }
            Ok(bars) => {
                histories.insert(symbol.clone(), bars);
            }
            Err(e) => eprintln!("warning: skipping {} ({})", symbol, e),
        }
    }

    if histories.is_empty() {
        return Err(SignalError::NoData {
            symbol: strategy.assets.join(","),
        });
    }
    Ok(histories)
}

pub fn write_replay_csv<W: Write>(rows: &[ReplayRow], writer: W) -> Result<(), SignalError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_evaluate(
    strategy_path: Option<&Path>,
    preset: Option<&str>,
    data_dir: &Path,
    as_of: Option<NaiveDate>,
) -> Result<(), SignalError> {
    let strategy = resolve_strategy(strategy_path, preset)?;
    eprintln!("Strategy: {} ({})", strategy.name, strategy.rule);

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let end = as_of.unwrap_or(NaiveDate::MAX);
    let histories = load_histories(&data_port, &strategy, NaiveDate::MIN, end)?;
    let market = MarketData::from_histories(&histories);
    match market.last_timestamp() {
        Some(last) => eprintln!(
            "  Frames: {} across {} symbols, last bar {}",
            market.len(),
            market.symbols().len(),
            last
        ),
        None => eprintln!("  Frames: 0"),
    }

    let decision = evaluator::target_allocation(&strategy, &market, &BuiltinIndicators);
    for (symbol, weight) in decision.iter() {
        println!("{}={}", symbol, weight);
    }
    Ok(())
}

fn run_replay(
    strategy_path: Option<&Path>,
    preset: Option<&str>,
    data_dir: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    policy: HoldPolicy,
    output: Option<&Path>,
) -> Result<(), SignalError> {
    let strategy = resolve_strategy(strategy_path, preset)?;
    let start = start.unwrap_or(NaiveDate::MIN);
    let end = end.unwrap_or(NaiveDate::MAX);
    if start > end {
        return Err(SignalError::invalid(
            "replay",
            "start",
            "start must not be after end",
        ));
    }

    let data_port = CsvAdapter::new(data_dir.to_path_buf());
    let histories = load_histories(&data_port, &strategy, start, end)?;

    eprintln!(
        "Replaying {} over {} assets ({:?} policy)",
        strategy.name,
        strategy.assets.len(),
        policy
    );
    let report = replay::replay(&strategy, &histories, &BuiltinIndicators, policy);

    match output {
        Some(path) => {
            write_replay_csv(&report.rows, File::create(path)?)?;
            eprintln!("Replay written to: {}", path.display());
        }
        None => write_replay_csv(&report.rows, io::stdout().lock())?,
    }

    eprintln!("\n=== Replay Summary ===");
    eprintln!("Rows:           {}", report.rows.len());
    eprintln!("Entries:        {}", report.entries);
    eprintln!("Exits:          {}", report.exits);
    eprintln!("Invested bars:  {}", report.invested_bars);
    eprintln!("Final decision: {}", report.final_decision);
    Ok(())
}

fn run_validate(strategy_path: &Path) -> Result<(), SignalError> {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = FileConfigAdapter::from_file(strategy_path)?;
    let strategy = build_strategy(&adapter)?;

    eprintln!("\nStrategy: {}", strategy.name);
    if !strategy.description.is_empty() {
        eprintln!("  {}", strategy.description);
    }
    eprintln!("  Assets:      {}", strategy.assets.join(", "));
    eprintln!("  Interval:    {}", strategy.interval);
    eprintln!("  Rule:        {}", strategy.rule);
    eprintln!("  Min history: {} bars", strategy.rule.min_history());
    let mut indicators: Vec<String> =
        strategy.rule.indicators().iter().map(|i| i.to_string()).collect();
    indicators.sort();
    indicators.dedup();
    eprintln!("  Indicators:  {}", indicators.join(", "));
    if !strategy.data_requirements.is_empty() {
        eprintln!("  Data:        {}", strategy.data_requirements.join(", "));
    }

    eprintln!("\nStrategy is valid");
    Ok(())
}

fn run_presets() {
    for name in Strategy::PRESETS {
        if let Some(preset) = Strategy::preset(name) {
            println!(
                "{:<12} {} [{}] {}",
                name,
                preset.assets.join(","),
                preset.interval,
                preset.rule
            );
        }
    }
}
