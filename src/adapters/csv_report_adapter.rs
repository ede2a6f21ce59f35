//! CSV export of grid-search tables and walk-forward reports.

use crate::domain::error::MacrossError;
use crate::domain::optimizer::OptimizationResult;
use crate::domain::walkforward::WalkForwardReport;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct CsvReportAdapter;

#[derive(Debug, Serialize)]
struct WalkForwardRow {
    segment: String,
    in_sample_start: Option<NaiveDate>,
    in_sample_end: Option<NaiveDate>,
    out_of_sample_start: Option<NaiveDate>,
    out_of_sample_end: Option<NaiveDate>,
    short_window: Option<usize>,
    long_window: Option<usize>,
    in_sample_performance: Option<f64>,
    overall_performance: Option<f64>,
    trade_count: Option<usize>,
    positive_trades: Option<usize>,
    negative_trades: Option<usize>,
    average_positive_return: Option<f64>,
    average_negative_return: Option<f64>,
    total_profit: Option<f64>,
    total_loss: Option<f64>,
}

fn csv_error(output: &Path, e: csv::Error) -> MacrossError {
    MacrossError::Data {
        reason: format!("failed to write {}: {}", output.display(), e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_grid(&self, result: &OptimizationResult, output: &Path) -> Result<(), MacrossError> {
        let mut wtr = csv::Writer::from_path(output).map_err(|e| csv_error(output, e))?;
        for row in &result.results {
            wtr.serialize(row).map_err(|e| csv_error(output, e))?;
        }
        wtr.flush()?;
        info!(rows = result.results.len(), path = %output.display(), "wrote grid results");
        Ok(())
    }

    fn write_walk_forward(
        &self,
        report: &WalkForwardReport,
        output: &Path,
    ) -> Result<(), MacrossError> {
        let mut wtr = csv::Writer::from_path(output).map_err(|e| csv_error(output, e))?;

        for step in &report.segments {
            let m = &step.metrics;
            wtr.serialize(WalkForwardRow {
                segment: step.index.to_string(),
                in_sample_start: Some(step.in_sample.start),
                in_sample_end: Some(step.in_sample.end),
                out_of_sample_start: Some(step.out_of_sample.start),
                out_of_sample_end: Some(step.out_of_sample.end),
                short_window: Some(step.pair.short_window),
                long_window: Some(step.pair.long_window),
                in_sample_performance: Some(step.in_sample_performance),
                overall_performance: m.overall_performance,
                trade_count: Some(m.trade_count),
                positive_trades: Some(m.positive_trades),
                negative_trades: Some(m.negative_trades),
                average_positive_return: m.average_positive_return,
                average_negative_return: m.average_negative_return,
                total_profit: Some(m.total_profit),
                total_loss: Some(m.total_loss),
            })
            .map_err(|e| csv_error(output, e))?;
        }

        wtr.serialize(WalkForwardRow {
            segment: "mean".to_string(),
            in_sample_start: None,
            in_sample_end: None,
            out_of_sample_start: None,
            out_of_sample_end: None,
            short_window: None,
            long_window: None,
            in_sample_performance: None,
            overall_performance: report.average_performance,
            trade_count: None,
            positive_trades: None,
            negative_trades: None,
            average_positive_return: None,
            average_negative_return: None,
            total_profit: None,
            total_loss: None,
        })
        .map_err(|e| csv_error(output, e))?;

        wtr.flush()?;
        info!(steps = report.segments.len(), path = %output.display(), "wrote walk-forward report");
        Ok(())
    }
}
