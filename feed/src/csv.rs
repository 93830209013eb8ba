use crate::{Candle, Feed, FeedError, ReplayFeed};

use std::io;
use std::path::Path;
use std::time::Duration;

/// Column positions used when the header row does not name a price column.
/// Matches the `datetime,open,high,low,close` export layout.
const DEFAULT_COLUMNS: [usize; 4] = [1, 2, 3, 4];

/// Reads a whole CSV export up front and replays its rows as candles.
///
/// Rows with a missing, unparsable or non-finite price are skipped with a
/// warning; kept rows are numbered consecutively from zero.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    inner: ReplayFeed,
    rows: usize,
}

impl CsvFeed {
    pub fn open(path: impl AsRef<Path>, pacing: Duration) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;

        let feed = Self::from_reader(io::BufReader::new(file), pacing)?;
        log::info!("Loaded {} candles from {}", feed.rows, path.display());

        Ok(feed)
    }

    pub fn from_reader<R: io::Read>(reader: R, pacing: Duration) -> Result<Self, FeedError> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_lowercase)
            .collect();

        let column = |name: &str, fallback: usize| {
            headers.iter().position(|h| h == name).unwrap_or(fallback)
        };
        let [open_col, high_col, low_col, close_col] = [
            column("open", DEFAULT_COLUMNS[0]),
            column("high", DEFAULT_COLUMNS[1]),
            column("low", DEFAULT_COLUMNS[2]),
            column("close", DEFAULT_COLUMNS[3]),
        ];

        let mut candles = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = index + 2;

            let price = |col: usize| {
                record
                    .get(col)
                    .and_then(|field| field.parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            };

            match (price(open_col), price(high_col), price(low_col), price(close_col)) {
                (Some(open), Some(high), Some(low), Some(close)) => {
                    let sequence = candles.len() as u64;
                    candles.push(Candle::new(sequence, open, high, low, close));
                }
                _ => {
                    log::warn!("Skipping CSV line {line}: missing or invalid price");
                }
            }
        }

        if candles.is_empty() {
            return Err(FeedError::Empty("no row carried a full set of prices".to_string()));
        }

        let rows = candles.len();

        Ok(Self {
            inner: ReplayFeed::new(candles, pacing),
            rows,
        })
    }

    /// Number of candles loaded from the file
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl Feed for CsvFeed {
    fn pacing(&self) -> Duration {
        self.inner.pacing()
    }

    async fn next(&mut self) -> Result<Option<Candle>, FeedError> {
        self.inner.next().await
    }
}
