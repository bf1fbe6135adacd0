//! CSV export of the trade log.

use std::io::Write;

use crate::domain::error::JournalError;
use crate::domain::trade::Trade;

const HEADER: [&str; 11] = [
    "id",
    "instrument",
    "type",
    "entry_price",
    "exit_price",
    "size",
    "pnl",
    "status",
    "entry_time",
    "exit_time",
    "notes",
];

/// Write the trade log as CSV, one row per trade in the order given.
pub fn export_trades<W: Write>(trades: &[Trade], writer: W) -> Result<(), JournalError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER).map_err(csv_err)?;

    for trade in trades {
        wtr.write_record([
            trade.id.to_string(),
            trade.instrument.clone(),
            trade.kind.as_str().to_string(),
            trade.entry_price.to_string(),
            trade
                .exit_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            trade.size.to_string(),
            trade.pnl.map(|p| p.to_string()).unwrap_or_default(),
            trade.status.as_str().to_string(),
            trade.entry_time.to_rfc3339(),
            trade
                .exit_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            trade.notes.clone().unwrap_or_default(),
        ])
        .map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}

fn csv_err(e: csv::Error) -> JournalError {
    JournalError::Database {
        reason: format!("CSV write error: {e}"),
    }
}
