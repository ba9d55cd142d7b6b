//! CSV history store — one file per asset.
//!
//! Layout: `{dir}/{name}.csv`
//!
//! ```text
//! Date,Open,High,Low,Close,Volume
//! 2024-01-02,44187.14000000,45899.70000000,44176.95000000,45516.30000000,39595960000.00000000
//! ```
//!
//! - Full rewrites only, made atomic by writing `{name}.csv.tmp` and renaming
//!   it into place.
//! - Numbers carry exactly 8 decimals; a missing value is an empty field.
//! - Dates are written `YYYY-MM-DD`. On read, a `YYYY-MM-DD HH:MM:SS` stamp is
//!   also accepted and reduced to its date.

use super::provider::DataError;
use crate::domain::{is_strictly_ordered, Bar};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Header row of every history file.
pub const HEADER: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Directory of per-asset CSV histories.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the store directory (and parents) if it does not exist.
    pub fn ensure_dir(&self) -> Result<(), DataError> {
        fs::create_dir_all(&self.dir).map_err(|e| DataError::io(&self.dir, e))
    }

    /// Path to the history file for an asset: `{dir}/{name}.csv`
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Load the stored history for an asset, in file order.
    ///
    /// Returns `Ok(None)` when no file exists yet.
    pub fn load(&self, name: &str) -> Result<Option<Vec<Bar>>, DataError> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        let file = fs::File::open(&path).map_err(|e| DataError::io(&path, e))?;
        let bars = read_bars(file, &path)?;

        if !is_strictly_ordered(&bars) {
            warn!(
                path = %path.display(),
                "stored history is not strictly ordered by date; next write will normalize it"
            );
        }
        debug!(path = %path.display(), rows = bars.len(), "loaded history");
        Ok(Some(bars))
    }

    /// Replace the history file for an asset with `bars`.
    pub fn write(&self, name: &str, bars: &[Bar]) -> Result<(), DataError> {
        let path = self.path(name);
        let tmp_path = path.with_extension("csv.tmp");

        let file = fs::File::create(&tmp_path).map_err(|e| DataError::io(&tmp_path, e))?;
        let result = write_bars(BufWriter::new(file), bars)
            .and_then(|out| {
                let file = out
                    .into_inner()
                    .map_err(|e| DataError::io(&tmp_path, e.into_error()))?;
                file.sync_all().map_err(|e| DataError::io(&tmp_path, e))
            })
            .and_then(|()| fs::rename(&tmp_path, &path).map_err(|e| DataError::io(&path, e)));

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        debug!(path = %path.display(), rows = bars.len(), "wrote history");
        Ok(())
    }
}

// ── CSV encoding ────────────────────────────────────────────────────

/// Encode `bars` into `out` and hand the flushed writer back.
fn write_bars<W: Write>(out: W, bars: &[Bar]) -> Result<W, DataError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;

    for b in bars {
        wtr.write_record([
            b.date.format("%Y-%m-%d").to_string(),
            format_value(b.open),
            format_value(b.high),
            format_value(b.low),
            format_value(b.close),
            format_value(b.volume),
        ])?;
    }

    let mut inner = wtr
        .into_inner()
        .map_err(|e| DataError::Csv(csv::Error::from(e.into_error())))?;
    inner.flush().map_err(|e| DataError::Csv(e.into()))?;
    Ok(inner)
}

fn read_bars<R: std::io::Read>(input: R, path: &Path) -> Result<Vec<Bar>, DataError> {
    let malformed = |reason: String| DataError::MalformedHistory {
        path: path.to_path_buf(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = rdr.headers()?;
    if headers.iter().map(str::trim).ne(HEADER) {
        return Err(malformed(format!(
            "unexpected header {:?}, expected {:?}",
            headers.iter().collect::<Vec<_>>(),
            HEADER
        )));
    }

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let value = |i: usize| {
            parse_value(field(i))
                .ok_or_else(|| malformed(format!("line {line}: bad {} value {:?}", HEADER[i], field(i))))
        };

        let date = parse_date(field(0))
            .ok_or_else(|| malformed(format!("line {line}: bad date {:?}", field(0))))?;

        bars.push(Bar {
            date,
            open: value(1)?,
            high: value(2)?,
            low: value(3)?,
            close: value(4)?,
            volume: value(5)?,
        });
    }

    Ok(bars)
}

/// Fixed 8-decimal rendering; NaN becomes an empty field.
fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        format!("{v:.8}")
    }
}

fn parse_value(s: &str) -> Option<f64> {
    if s.is_empty() {
        Some(f64::NAN)
    } else {
        s.parse().ok()
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|dt| dt.date())
    })
}
