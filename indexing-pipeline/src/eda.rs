use std::fmt::Write as _;
use std::path::Path;

use common::error::AppError;
use tracing::info;

use crate::loader::Record;

/// Writes a one-shot exploratory report over the loaded dataset: size,
/// text-length distribution and null counts. Informational only; nothing
/// downstream reads it.
pub fn write_eda_report(records: &[Record], path: &str) -> Result<(), AppError> {
    let report = render_report(records);
    std::fs::write(Path::new(path), report)?;
    info!(path, records = records.len(), "EDA report written");
    Ok(())
}

fn render_report(records: &[Record]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Exploratory Data Analysis (EDA)\n");

    let _ = writeln!(out, "## Dataset Info\n");
    let _ = writeln!(out, "| metric | value |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| records | {} |", records.len());

    let _ = writeln!(out, "\n## Text Length Statistics\n");
    let _ = writeln!(out, "| statistic | value |");
    let _ = writeln!(out, "| --- | --- |");
    let mut lengths: Vec<f64> = records.iter().map(|r| r.text_length as f64).collect();
    lengths.sort_by(|a, b| a.total_cmp(b));
    for (name, value) in describe(&lengths) {
        let _ = writeln!(out, "| {name} | {value:.2} |");
    }

    let _ = writeln!(out, "\n## Null Values\n");
    let missing_ids = records.iter().filter(|r| r.id.is_none()).count();
    let _ = writeln!(out, "| field | nulls |");
    let _ = writeln!(out, "| --- | --- |");
    let _ = writeln!(out, "| id | {missing_ids} |");
    let _ = writeln!(out, "| text | 0 |");

    out
}

/// Summary statistics in the shape of a `describe()` table. `lengths`
/// must be sorted ascending.
fn describe(lengths: &[f64]) -> Vec<(&'static str, f64)> {
    let count = lengths.len() as f64;
    if lengths.is_empty() {
        return vec![("count", 0.0)];
    }

    let mean = lengths.iter().sum::<f64>() / count;
    let variance = lengths.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / if lengths.len() > 1 { count - 1.0 } else { 1.0 };

    vec![
        ("count", count),
        ("mean", mean),
        ("std", variance.sqrt()),
        ("min", lengths[0]),
        ("25%", percentile(lengths, 0.25)),
        ("50%", percentile(lengths, 0.50)),
        ("75%", percentile(lengths, 0.75)),
        ("max", lengths[lengths.len() - 1]),
    ]
}

/// Linear-interpolated percentile over sorted values.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = q * (sorted.len() - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        return sorted[low];
    }

    let weight = rank - low as f64;
    sorted[low] * (1.0 - weight) + sorted[high] * weight
}
