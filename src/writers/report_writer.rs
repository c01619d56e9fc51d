use crate::error::Result;
use crate::models::{GlobalResult, StationSummary};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{station=min/mean/max, ...}`
    #[default]
    Text,
    /// JSON document with one object per station
    Json,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    stations: &'a [StationSummary],
    records: u64,
    skipped: u64,
}

/// Renders a [`GlobalResult`] sorted by station name.
pub struct ReportWriter {
    format: OutputFormat,
}

/// Append tenths as a decimal with exactly one fractional digit.
///
/// Zero has no sign in tenths, so an input of `-0.0` renders as `0.0`.
fn push_tenths(out: &mut String, tenths: i64) {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    let _ = write!(out, "{}{}.{}", sign, abs / 10, abs % 10);
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            format: OutputFormat::Text,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// The `{station=min/mean/max, ...}` line, without a trailing newline.
    pub fn render(&self, result: &GlobalResult) -> String {
        let entries = result.sorted();
        let mut out = String::with_capacity(2 + entries.len() * 32);

        out.push('{');
        for (i, (name, agg)) in entries.into_iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&String::from_utf8_lossy(name));
            out.push('=');
            push_tenths(&mut out, agg.min as i64);
            out.push('/');
            push_tenths(&mut out, agg.mean_tenths());
            out.push('/');
            push_tenths(&mut out, agg.max as i64);
        }
        out.push('}');

        out
    }

    pub fn render_json(&self, result: &GlobalResult) -> Result<String> {
        let stations = result.summaries();
        let report = JsonReport {
            stations: &stations,
            records: result.records,
            skipped: result.skipped,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Write the report followed by a newline.
    pub fn write_to<W: Write>(&self, result: &GlobalResult, mut sink: W) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Text => self.render(result),
            OutputFormat::Json => self.render_json(result)?,
        };
        sink.write_all(rendered.as_bytes())?;
        sink.write_all(b"\n")?;
        sink.flush()?;
        Ok(())
    }

    pub fn write_file(&self, result: &GlobalResult, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(result, BufWriter::new(file))
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
