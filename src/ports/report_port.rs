//! Report output port trait.

use crate::domain::closeout::ClosedPosition;
use crate::domain::dashboard::DashboardRow;
use crate::domain::error::RectrackError;
use crate::domain::position::AdditionalBuy;
use std::io::Write;

/// Port for rendering dashboard and history listings.
pub trait ReportPort {
    fn write_dashboard(&self, rows: &[DashboardRow], out: &mut dyn Write)
    -> Result<(), RectrackError>;

    fn write_history(
        &self,
        records: &[ClosedPosition],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError>;

    /// Default implementation: one `date code ratio%` line per purchase.
    fn write_additional_buys(
        &self,
        buys: &[AdditionalBuy],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError> {
        for buy in buys {
            writeln!(out, "{} {} {:.1}%", buy.date, buy.code, buy.ratio * 100.0)?;
        }
        Ok(())
    }
}
