//! Configuration validation.
//!
//! Validates all config fields before any optimization runs. The typed
//! readers here are shared with the CLI builders so a value that passes
//! validation is parsed the same way when it is used.

use crate::domain::error::MacrossError;
use crate::domain::params::{ParameterGrid, parse_windows};
use crate::domain::position_filter::DEFAULT_HOLDING_DAYS;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    validate_data(config)?;
    validate_strategy(config)?;
    validate_sell(config)?;
    validate_walk_forward(config)?;
    validate_prediction(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MacrossError {
    MacrossError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> MacrossError {
    MacrossError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Non-empty string value or `ConfigMissing`.
pub fn required_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, MacrossError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(missing(section, key)),
    }
}

/// Optional `YYYY-MM-DD` date.
pub fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, MacrossError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid(section, key, format!("invalid {key} format, expected YYYY-MM-DD"))),
        _ => Ok(None),
    }
}

/// Required window list (`3-20` or `3,5,8`).
pub fn window_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<usize>, MacrossError> {
    let raw = required_string(config, section, key)?;
    parse_windows(&raw).map_err(|reason| invalid(section, key, reason))
}

/// Short/long grid from `section`, rejecting grids without a valid pair.
pub fn parameter_grid(config: &dyn ConfigPort, section: &str) -> Result<ParameterGrid, MacrossError> {
    let grid = ParameterGrid::new(
        window_list(config, section, "short_windows")?,
        window_list(config, section, "long_windows")?,
    );
    if grid.pairs().is_empty() {
        return Err(invalid(
            section,
            "long_windows",
            "no long window exceeds any short window",
        ));
    }
    Ok(grid)
}

/// Integer value, `default` when absent. A present but non-numeric value is
/// rejected rather than replaced by the default.
fn integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, MacrossError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<i64>().is_err() => Err(invalid(
            section,
            key,
            format!("'{}' is not an integer", raw.trim()),
        )),
        _ => Ok(config.get_int(section, key, default)),
    }
}

pub fn share_quantity(config: &dyn ConfigPort) -> Result<u32, MacrossError> {
    let value = integer(
        config,
        "strategy",
        "shares",
        i64::from(crate::domain::optimizer::DEFAULT_SHARES),
    )?;
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(invalid("strategy", "shares", "shares must be a positive integer")),
    }
}

pub fn holding_days(config: &dyn ConfigPort) -> Result<Vec<i64>, MacrossError> {
    let Some(raw) = config
        .get_string("strategy", "holding_days")
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(DEFAULT_HOLDING_DAYS.to_vec());
    };
    raw.split(',')
        .map(|token| match token.trim().parse::<i64>() {
            Ok(d) if d > 0 => Ok(d),
            _ => Err(invalid(
                "strategy",
                "holding_days",
                format!("'{}' is not a positive day count", token.trim()),
            )),
        })
        .collect()
}

pub fn num_windows(config: &dyn ConfigPort) -> Result<usize, MacrossError> {
    let value = integer(
        config,
        "walkforward",
        "num_windows",
        crate::domain::walkforward::DEFAULT_NUM_WINDOWS as i64,
    )?;
    if value < 2 {
        return Err(invalid(
            "walkforward",
            "num_windows",
            "num_windows must be at least 2",
        ));
    }
    Ok(value as usize)
}

fn validate_date_range(config: &dyn ConfigPort, section: &str) -> Result<(), MacrossError> {
    let start = optional_date(config, section, "start_date")?;
    let end = optional_date(config, section, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                section,
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    required_string(config, "data", "path")?;
    validate_date_range(config, "data")
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    share_quantity(config)?;
    parameter_grid(config, "strategy")?;
    holding_days(config)?;
    Ok(())
}

fn validate_sell(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if config.has_section("sell") {
        parameter_grid(config, "sell")?;
    }
    Ok(())
}

fn validate_walk_forward(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    num_windows(config)?;
    Ok(())
}

fn validate_prediction(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if config.has_section("prediction") {
        required_string(config, "prediction", "start_date")?;
        validate_date_range(config, "prediction")?;
    }
    Ok(())
}
