use std::fmt;

use serde::{Deserialize, Serialize};

/// Exchange assumed when the input names none.
pub const DEFAULT_EXCHANGE: &str = "BMFBOVESPA";

/// Continuous-contract aliases accepted in place of the feed's own symbols.
const ALIASES: &[(&str, &str, &str)] = &[
    ("WIN$N", "WIN1!", "BMFBOVESPA"),
    ("WDO$N", "WDO1!", "BMFBOVESPA"),
    ("DI1$N", "DI1!", "BMFBOVESPA"),
];

/// A symbol on a specific exchange, e.g. `WIN1!:BMFBOVESPA`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub exchange: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
        }
    }

    /// Accepts `SYMBOL:EXCHANGE`, a known alias such as `WIN$N`,
    /// `EXCHANGE.SYMBOL`, or a bare symbol on [`DEFAULT_EXCHANGE`].
    ///
    /// Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }

        if let Some((symbol, exchange)) = s.split_once(':') {
            return Some(Self::new(symbol.trim(), exchange.trim()));
        }

        if let Some((_, symbol, exchange)) = ALIASES.iter().find(|(alias, ..)| *alias == s) {
            return Some(Self::new(*symbol, *exchange));
        }

        if let Some((exchange, symbol)) = s.split_once('.') {
            return Some(Self::new(symbol.trim(), exchange.trim()));
        }

        Some(Self::new(s, DEFAULT_EXCHANGE))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.exchange)
    }
}

/// Splits a comma-separated list, skipping blank items.
pub fn parse_instrument_list(input: &str) -> Vec<Instrument> {
    input.split(',').filter_map(Instrument::parse).collect()
}
