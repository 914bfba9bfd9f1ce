use anyhow::Result;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use crate::api::types::{Direction, TradeSignal};

const HEADER: &str = "timestamp,market_id,strategy,direction,confidence,proof_link";

/// Append-only CSV record of every signal the dashboard stores
pub struct SignalLog {
    log_path: String,
}

impl SignalLog {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self { log_path })
    }

    pub fn path(&self) -> &str {
        &self.log_path
    }

    /// Log a recorded signal
    pub fn log_signal(&self, signal: &TradeSignal) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        let direction = match signal.direction {
            Direction::Yes => "YES",
            Direction::No => "NO",
        };

        writeln!(
            file,
            "{},{},{},{},{:.3},{}",
            signal.timestamp.unwrap_or_else(Utc::now).to_rfc3339(),
            csv_field(&signal.market_id),
            csv_field(&signal.strategy),
            direction,
            signal.confidence,
            csv_field(&signal.proof_link),
        )?;

        Ok(())
    }
}

/// Quote fields that would break the row
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
