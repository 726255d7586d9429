//! Batch result export port trait.

use std::path::Path;

use crate::domain::batch::BatchOutcome;
use crate::domain::error::MtfError;

pub trait ReportPort {
    fn write(&self, outcome: &BatchOutcome, output_path: &Path) -> Result<(), MtfError>;
}
