//! Moving-average window pairs and the grids they are drawn from.

use std::fmt;

use serde::Serialize;

use super::error::MacrossError;

/// A (short, long) moving-average window pair with `long_window > short_window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParameterPair {
    pub short_window: usize,
    pub long_window: usize,
}

impl ParameterPair {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, MacrossError> {
        let pair = ParameterPair {
            short_window,
            long_window,
        };
        pair.validate()?;
        Ok(pair)
    }

    pub fn is_valid(&self) -> bool {
        self.short_window > 0 && self.long_window > self.short_window
    }

    pub fn validate(&self) -> Result<(), MacrossError> {
        if self.short_window == 0 {
            return Err(MacrossError::InvalidParameter {
                reason: "short window must be positive".into(),
            });
        }
        if self.long_window <= self.short_window {
            return Err(MacrossError::InvalidParameter {
                reason: format!(
                    "long window {} must exceed short window {}",
                    self.long_window, self.short_window
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ParameterPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.short_window, self.long_window)
    }
}

/// Candidate short and long windows for a grid search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

impl ParameterGrid {
    pub fn new(short_windows: Vec<usize>, long_windows: Vec<usize>) -> Self {
        ParameterGrid {
            short_windows,
            long_windows,
        }
    }

    /// Valid pairs in canonical order: ascending short, then ascending long.
    ///
    /// Invalid combinations (long <= short) are skipped, never reported.
    pub fn pairs(&self) -> Vec<ParameterPair> {
        let mut shorts = self.short_windows.clone();
        shorts.sort_unstable();
        shorts.dedup();
        let mut longs = self.long_windows.clone();
        longs.sort_unstable();
        longs.dedup();

        let mut pairs = Vec::new();
        for &short_window in &shorts {
            for &long_window in &longs {
                let pair = ParameterPair {
                    short_window,
                    long_window,
                };
                if pair.is_valid() {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }
}

/// Parse a window list: an inclusive range `3-20`, a comma list `3,5,8`,
/// or a mix of both (`3-5,10`).
pub fn parse_windows(input: &str) -> Result<Vec<usize>, String> {
    let mut windows = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err("empty token in window list".into());
        }
        match token.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_window(lo)?;
                let hi = parse_window(hi)?;
                if hi < lo {
                    return Err(format!("range {token} is descending"));
                }
                windows.extend(lo..=hi);
            }
            None => windows.push(parse_window(token)?),
        }
    }
    windows.sort_unstable();
    windows.dedup();
    Ok(windows)
}

fn parse_window(token: &str) -> Result<usize, String> {
    let value: usize = token
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a window length", token.trim()))?;
    if value == 0 {
        return Err("window length must be positive".into());
    }
    Ok(value)
}
