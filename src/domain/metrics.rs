//! Performance statistics over a simulated equity history.

use serde::Serialize;

use super::error::MacrossError;
use super::portfolio::PortfolioState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub long_window: usize,
    /// `final total / initial total - 1`; `None` if the initial total is zero.
    pub overall_performance: Option<f64>,
    /// Dates with a defined period return.
    pub trade_count: usize,
    pub positive_trades: usize,
    pub negative_trades: usize,
    pub average_positive_return: Option<f64>,
    pub average_negative_return: Option<f64>,
    pub total_profit: f64,
    pub total_loss: f64,
}

impl PerformanceMetrics {
    pub fn compute(states: &[PortfolioState], long_window: usize) -> Result<Self, MacrossError> {
        let (first, last) = match (states.first(), states.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MacrossError::EmptySeries),
        };

        let returns: Vec<f64> = states.iter().filter_map(|s| s.period_return).collect();

        let mut positive_trades = 0usize;
        let mut negative_trades = 0usize;
        let mut total_profit = 0.0_f64;
        let mut total_loss = 0.0_f64;

        for &r in &returns {
            if r > 0.0 {
                positive_trades += 1;
                total_profit += r;
            } else if r < 0.0 {
                negative_trades += 1;
                total_loss += r;
            }
        }

        let overall_performance = if first.total != 0.0 {
            Some(last.total / first.total - 1.0)
        } else {
            None
        };

        Ok(PerformanceMetrics {
            long_window,
            overall_performance,
            trade_count: returns.len(),
            positive_trades,
            negative_trades,
            average_positive_return: mean(total_profit, positive_trades),
            average_negative_return: mean(total_loss, negative_trades),
            total_profit,
            total_loss,
        })
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}
