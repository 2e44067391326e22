use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instrument::Instrument;
use super::{CollectorError, MarketDataSource};

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub exchange: String,
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Bars for several instruments, ordered by symbol then time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarTable {
    bars: Vec<Bar>,
}

impl BarTable {
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.datetime.cmp(&b.datetime)));
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Renders the table as CSV with a header row, the format handed to the analyst.
    pub fn to_csv(&self) -> String {
        let mut out =
            String::from("symbol,exchange,datetime,open,high,low,close,volume,timestamp_utc\n");
        for bar in &self.bars {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                csv_field(&bar.symbol),
                csv_field(&bar.exchange),
                bar.datetime.format("%Y-%m-%d %H:%M:%S"),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
                bar.datetime.format("%Y-%m-%dT%H:%M:%SZ"),
            ));
        }
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Fetches `count` bars for each instrument in turn.
///
/// An instrument that fails or returns nothing is logged and skipped; the
/// collection only fails when no instrument produced any data.
pub async fn collect_bars<S: MarketDataSource + ?Sized>(
    source: &S,
    instruments: &[Instrument],
    count: u32,
) -> Result<BarTable, CollectorError> {
    let mut bars = Vec::new();

    for instrument in instruments {
        match source.fetch_bars(instrument, count).await {
            Ok(fetched) if fetched.is_empty() => {
                log::warn!(target: "rdx_dash::collector", "msg=\"no data\" instrument=\"{instrument}\"");
            }
            Ok(fetched) => bars.extend(fetched),
            Err(e) => {
                log::warn!(target: "rdx_dash::collector", "msg=\"fetch failed\" instrument=\"{instrument}\" error=\"{e}\"");
            }
        }
    }

    if bars.is_empty() {
        return Err(CollectorError::NoData);
    }

    Ok(BarTable::from_bars(bars))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bar(symbol: &str, minute: u32, close: f64) -> Bar {
        Bar {
            symbol: symbol.to_owned(),
            exchange: "BMFBOVESPA".to_owned(),
            datetime: Utc.with_ymd_and_hms(2025, 1, 6, 9, minute, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn test_sorted_by_symbol_then_time() {
        let table = BarTable::from_bars(vec![
            bar("WIN1!", 2, 3.0),
            bar("DI11!", 1, 1.0),
            bar("WIN1!", 1, 2.0),
        ]);
        let order: Vec<(&str, f64)> = table
            .bars()
            .iter()
            .map(|b| (b.symbol.as_str(), b.close))
            .collect();
        assert_eq!(order, vec![("DI11!", 1.0), ("WIN1!", 2.0), ("WIN1!", 3.0)]);
    }

    #[test]
    fn test_to_csv() {
        let table = BarTable::from_bars(vec![bar("WIN1!", 5, 125000.5)]);
        let csv = table.to_csv();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("symbol,exchange,datetime,open,high,low,close,volume,timestamp_utc")
        );
        assert_eq!(
            lines.next(),
            Some(
                "WIN1!,BMFBOVESPA,2025-01-06 09:05:00,125000.5,125000.5,125000.5,125000.5,10,2025-01-06T09:05:00Z"
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
