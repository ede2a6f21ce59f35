//! Result export port trait.

use crate::domain::error::MacrossError;
use crate::domain::optimizer::OptimizationResult;
use crate::domain::walkforward::WalkForwardReport;
use std::path::Path;

/// Port for persisting optimizer and walk-forward output.
pub trait ReportPort {
    fn write_grid(&self, result: &OptimizationResult, output: &Path) -> Result<(), MacrossError>;

    fn write_walk_forward(
        &self,
        report: &WalkForwardReport,
        output: &Path,
    ) -> Result<(), MacrossError>;
}
