//! Trailing simple moving average with an expanding warmup.
//!
//! SMA(n)[i] = sum(C[i-j] for j in 0..n) / n once n observations exist.
//! Warmup: for i < n-1 the mean is taken over the i+1 observations available,
//! so every index carries a defined value.

/// Trailing mean of `closes` over `period` observations.
///
/// Returns one value per input. `period` must be positive.
pub fn expanding_sma(closes: &[f64], period: usize) -> Vec<f64> {
    debug_assert!(period > 0);
    let mut values = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let count = (i + 1).min(period);
        let window = &closes[i + 1 - count..=i];
        values.push(window.iter().sum::<f64>() / count as f64);
    }

    values
}
