//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API using a `range` window
//! (`2d`, `max`) rather than explicit dates. One request per call, no retries:
//! a failure surfaces to the caller as a `DataError`.
//!
//! Yahoo timestamps are UTC instants at the exchange's session start. A bar's
//! date is that instant read on the exchange's wall clock, in the exchange's
//! IANA zone when the response names one. The zone's offset is taken per bar,
//! so a summer bar fetched in winter keeps its summer date.

use super::provider::{DataError, DataProvider, FetchResult, Lookback};
use crate::domain::Bar;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Wait suggested to the caller when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ── Response shape ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// IANA zone of the listing exchange, e.g. `America/New_York`.
    #[serde(default)]
    exchange_timezone_name: Option<String>,
    /// Offset from UTC in seconds at the time of the response.
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartError {
    fn into_data_error(self, symbol: &str) -> DataError {
        if self.code == "Not Found" {
            DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }
        } else {
            DataError::ResponseFormatChanged(format!("{}: {}", self.code, self.description))
        }
    }
}

impl QuoteData {
    /// Open, high, low, close and volume of row `i`; `None` when all are null.
    fn row(&self, i: usize) -> Option<[f64; 5]> {
        let values = [&self.open, &self.high, &self.low, &self.close, &self.volume]
            .map(|column| column.get(i).copied().flatten());

        if values.iter().all(Option::is_none) {
            return None;
        }
        Some(values.map(|v| v.unwrap_or(f64::NAN)))
    }
}

// ── Exchange calendar ───────────────────────────────────────────────

/// Turns a bar's UTC instant into the date the exchange traded it on.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ExchangeClock {
    /// Named zone; the offset in force on each bar's own date applies.
    Zone(Tz),
    /// Single offset for every bar, used when no zone is known.
    Fixed(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(symbol: &str, meta: &ChartMeta) -> Result<Self, DataError> {
        if let Some(name) = meta.exchange_timezone_name.as_deref() {
            match name.parse::<Tz>() {
                Ok(tz) => return Ok(Self::Zone(tz)),
                Err(e) => warn!(
                    symbol,
                    timezone = name,
                    error = %e,
                    "unknown exchange timezone; falling back to gmtoffset"
                ),
            }
        }

        FixedOffset::east_opt(meta.gmtoffset)
            .map(Self::Fixed)
            .ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid gmtoffset: {}", meta.gmtoffset))
            })
    }

    fn date(&self, ts: i64) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp(ts, 0)?;
        Some(match self {
            Self::Zone(tz) => utc.with_timezone(tz).date_naive(),
            Self::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }
}

/// Bars of a decoded chart response.
///
/// A result without a `timestamp` array means the window held no sessions and
/// yields an empty vector; whether that is an error is the caller's call.
fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
    let ChartResult { result, error } = resp.chart;
    let data = match (result, error) {
        (Some(results), _) => results
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?,
        (None, Some(err)) => return Err(err.into_data_error(symbol)),
        (None, None) => {
            return Err(DataError::ResponseFormatChanged(
                "empty result with no error".into(),
            ))
        }
    };

    let Some(timestamps) = data.timestamp else {
        return Ok(Vec::new());
    };
    let clock = ExchangeClock::from_meta(symbol, &data.meta)?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut partial = 0usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        // Holidays and sessions not yet traded come back fully null
        let Some([open, high, low, close, volume]) = quote.row(i) else {
            continue;
        };
        let date = clock
            .date(ts)
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let bar = Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        if bar.has_gaps() {
            partial += 1;
        }
        bars.push(bar);
    }

    if partial > 0 {
        warn!(symbol, partial, "provider returned rows with missing values");
    }
    Ok(bars)
}

// ── HTTP ────────────────────────────────────────────────────────────

/// Error for a non-success status; `None` for 2xx.
fn status_error(symbol: &str, status: StatusCode, headers: &HeaderMap) -> Option<DataError> {
    if status.is_success() {
        return None;
    }

    Some(match status {
        StatusCode::NOT_FOUND => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => DataError::RateLimited {
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        other => DataError::HttpStatus {
            status: other.as_u16(),
            symbol: symbol.to_string(),
        },
    })
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;
        let base_url = Url::parse(CHART_BASE_URL)
            .map_err(|e| DataError::NetworkUnreachable(format!("invalid chart URL: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Chart URL for `symbol`. The symbol is pushed as a single path segment so
    /// characters such as `/` are percent-encoded.
    fn chart_url(&self, symbol: &str, lookback: Lookback) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(symbol);
        }
        url.query_pairs_mut()
            .append_pair("range", &lookback.as_range())
            .append_pair("interval", "1d");
        url
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<FetchResult, DataError> {
        let url = self.chart_url(symbol, lookback);
        debug!(%url, "requesting chart");

        let resp = self.client.get(url).send().map_err(|e| {
            DataError::NetworkUnreachable(format!("request for {symbol} failed: {e}"))
        })?;

        if let Some(err) = status_error(symbol, resp.status(), resp.headers()) {
            return Err(err);
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let bars = parse_chart(symbol, chart)?;
        debug!(symbol, bars = bars.len(), "chart parsed");
        Ok(FetchResult { bars })
    }
}
