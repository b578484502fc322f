// src/export.rs
// Plain-text trajectory log: one line per recorded step, the four Cartesian coordinates rounded
// to two decimals and each terminated by ';' (e.g. "125;0;250;0;").
// The destination is always an explicit writer chosen by the caller.

use crate::error::ExportResult;
use crate::logic::{Snapshot, Trajectory};
use std::io::Write;

/// Rounds to two decimals, ties to even.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Formats one snapshot as `x1;y1;x2;y2;`.
pub fn format_line(snapshot: &Snapshot) -> String {
    format!(
        "{};{};{};{};",
        round2(snapshot.x1),
        round2(snapshot.y1),
        round2(snapshot.x2),
        round2(snapshot.y2)
    )
}

/// Writes every snapshot of `trajectory` as one log line. Returns the number of lines written.
pub fn write_log<W: Write>(mut writer: W, trajectory: &Trajectory) -> ExportResult<usize> {
    for snapshot in &trajectory.snapshots {
        writeln!(writer, "{}", format_line(snapshot))?;
    }
    writer.flush()?;
    Ok(trajectory.len())
}
