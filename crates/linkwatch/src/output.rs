//! Output formatting: table or JSON.

use std::io::{self, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render rows as a table, or the serde data as JSON.
pub fn render<T, R>(format: OutputFormat, data: &T, rows: impl FnOnce() -> Vec<R>) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => Table::new(rows()).with(Style::rounded()).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
    })
}

/// Serialize for line-oriented streams (`poll`): compact unless `json`.
pub fn render_stream<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Table | OutputFormat::JsonCompact => serde_json::to_string(data)?,
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Value formatting ─────────────────────────────────────────────────

/// Human-readable bit rate: `950.0 Mbps`.
pub fn fmt_bps(bps: f64) -> String {
    const UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];
    let mut value = bps;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0} {}", UNITS[unit])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Utilization as a percentage, `-` when unknown.
pub fn fmt_pct(utilization: Option<f64>) -> String {
    utilization.map_or_else(|| "-".into(), |u| format!("{:.1}%", u * 100.0))
}
