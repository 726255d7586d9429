//! CSV export of batch records implementing ReportPort.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::batch::BatchOutcome;
use crate::domain::error::MtfError;
use crate::ports::report_port::ReportPort;

fn csv_err(e: csv::Error) -> MtfError {
    MtfError::Io(e.into())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    /// Write one header row and one row per ranked symbol.
    pub fn write_records<W: Write>(&self, outcome: &BatchOutcome, writer: W) -> Result<(), MtfError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for record in outcome.records() {
            wtr.serialize(record).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, outcome: &BatchOutcome, output_path: &Path) -> Result<(), MtfError> {
        let file = File::create(output_path)?;
        self.write_records(outcome, file)
    }
}
