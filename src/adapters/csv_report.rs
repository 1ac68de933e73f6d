//! CSV report adapter for spreadsheet export.

use crate::domain::closeout::ClosedPosition;
use crate::domain::dashboard::DashboardRow;
use crate::domain::error::RectrackError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::io::Write;

pub struct CsvReportAdapter;

#[derive(Serialize)]
struct DashboardRecord<'a> {
    id: i64,
    name: &'a str,
    code: &'a str,
    country: String,
    recommender: &'a str,
    rec_date: String,
    current_price: f64,
    roi_lump: f64,
    roi_dca: f64,
    roi_comp: f64,
    has_additional: bool,
    pending: bool,
    total_invested: f64,
    final_eval: f64,
    total_qty: i64,
}

#[derive(Serialize)]
struct HistoryRecord<'a> {
    name: &'a str,
    code: &'a str,
    country: String,
    recommender: &'a str,
    rec_date: String,
    sell_date: String,
    return_lump: f64,
    return_dca: f64,
    return_comp: f64,
    total_invested: f64,
    final_eval: f64,
    note: &'a str,
}

fn csv_err(e: csv::Error) -> RectrackError {
    RectrackError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn write_dashboard(
        &self,
        rows: &[DashboardRow],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError> {
        let mut wtr = csv::Writer::from_writer(out);
        for row in rows {
            let p = &row.position;
            let r = &row.result;
            wtr.serialize(DashboardRecord {
                id: p.id,
                name: &p.name,
                code: &p.code,
                country: p.country.to_string(),
                recommender: &p.recommender,
                rec_date: p.rec_date.to_string(),
                current_price: r.current_price,
                roi_lump: r.roi_lump,
                roi_dca: r.roi_dca,
                roi_comp: r.roi_comp,
                has_additional: r.has_additional,
                pending: row.pending,
                total_invested: r.meta.total_invested,
                final_eval: r.meta.final_eval,
                total_qty: r.meta.total_qty,
            })
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_history(
        &self,
        records: &[ClosedPosition],
        out: &mut dyn Write,
    ) -> Result<(), RectrackError> {
        let mut wtr = csv::Writer::from_writer(out);
        for h in records {
            wtr.serialize(HistoryRecord {
                name: &h.name,
                code: &h.code,
                country: h.country.to_string(),
                recommender: &h.recommender,
                rec_date: h.rec_date.to_string(),
                sell_date: h.sell_date.to_string(),
                return_lump: h.return_lump,
                return_dca: h.return_dca,
                return_comp: h.return_comp,
                total_invested: h.total_invested,
                final_eval: h.final_eval,
                note: &h.note,
            })
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
