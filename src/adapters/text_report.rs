//! Plain-text table report adapter.

use crate::domain::closeout::ClosedPosition;
use crate::domain::dashboard::DashboardRow;
use crate::domain::error::RectrackError;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub struct TextReportAdapter;

fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}

impl ReportPort for TextReportAdapter {
    fn write_dashboard(
        &self,
        rows: &[DashboardRow],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError> {
        if rows.is_empty() {
            writeln!(out, "No positions.")?;
            return Ok(());
        }

        writeln!(
            out,
            "{:>4}  {:<20} {:<8} {:>2} {:>14} {:>10} {:>10} {:>10}  {:<10} {:<12}",
            "ID", "NAME", "CODE", "", "PRICE", "COMP", "LUMP", "DCA", "REC_DATE", "RECOMMENDER"
        )?;
        for row in rows {
            let p = &row.position;
            let r = &row.result;
            let comp = if r.has_additional {
                format!("{}+", format_pct(r.roi_comp))
            } else {
                format_pct(r.roi_comp)
            };
            let price = if row.pending {
                "collecting".to_string()
            } else {
                format!("{:.2}", r.current_price)
            };
            writeln!(
                out,
                "{:>4}  {:<20} {:<8} {:>2} {:>14} {:>10} {:>10} {:>10}  {:<10} {:<12}",
                p.id,
                p.name,
                p.code,
                p.country.to_string(),
                price,
                comp,
                format_pct(r.roi_lump),
                format_pct(r.roi_dca),
                p.rec_date.to_string(),
                p.recommender
            )?;
        }
        Ok(())
    }

    fn write_history(
        &self,
        records: &[ClosedPosition],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError> {
        if records.is_empty() {
            writeln!(out, "No closed positions.")?;
            return Ok(());
        }

        writeln!(
            out,
            "{:<20} {:<8} {:<10} {:<10} {:>10} {:>10} {:>10} {:>16} {:>16}  {}",
            "NAME", "CODE", "REC_DATE", "SELL_DATE", "COMP", "LUMP", "DCA", "INVESTED", "EVAL", "NOTE"
        )?;
        for h in records {
            writeln!(
                out,
                "{:<20} {:<8} {:<10} {:<10} {:>10} {:>10} {:>10} {:>16.0} {:>16.0}  {}",
                h.name,
                h.code,
                h.rec_date.to_string(),
                h.sell_date.to_string(),
                format_pct(h.return_comp),
                format_pct(h.return_lump),
                format_pct(h.return_dca),
                h.total_invested,
                h.final_eval,
                h.note
            )?;
        }
        Ok(())
    }
}
