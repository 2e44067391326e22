//! Market-data collection and the analyst call.
//!
//! Both collaborators are external: [`MarketDataSource`] returns bars for one
//! instrument, [`Analyst`] turns a prompt plus a [`BarTable`] into text that
//! [`AnalysisReport::parse`] reads. Neither is retried automatically; a failure
//! abandons the run and the user may trigger it again.

mod bars;
mod instrument;
mod preset;
mod prompt;
mod report;

#[cfg(any(test, feature = "mocks"))]
mod mock;
#[cfg(feature = "openai")]
mod openai;

use std::fmt;

use async_trait::async_trait;

pub use bars::{Bar, BarTable, collect_bars};
pub use instrument::{DEFAULT_EXCHANGE, Instrument, parse_instrument_list};
pub use preset::{CollectorPreset, MAX_BARS, MIN_BARS, SUPPORTED_MODELS};
pub use prompt::{build_system_prompt, build_user_message};
pub use report::{AnalysisReport, Direction, TradeIdea};

#[cfg(any(test, feature = "mocks"))]
pub use mock::{MockAnalyst, MockMarketDataSource};
#[cfg(feature = "openai")]
pub use openai::{OpenAiAnalyst, OpenAiConfig};

#[derive(Debug, Clone, PartialEq)]
pub enum CollectorError {
    NoInstruments,
    InvalidTarget,
    BarsOutOfRange(u32),
    UnsupportedModel(String),
    /// No instrument returned any bars.
    NoData,
    Source(String),
    Analyst(String),
    MalformedResponse(String),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInstruments => write!(f, "No instruments to collect"),
            Self::InvalidTarget => write!(f, "Target instrument is missing"),
            Self::BarsOutOfRange(bars) => write!(
                f,
                "Bar count {bars} is out of range ({MIN_BARS}-{MAX_BARS})"
            ),
            Self::UnsupportedModel(model) => write!(f, "Unsupported model \"{model}\""),
            Self::NoData => write!(f, "No data collected, check the instrument list"),
            Self::Source(msg) => write!(f, "Market data error: {msg}"),
            Self::Analyst(msg) => write!(f, "Analyst error: {msg}"),
            Self::MalformedResponse(msg) => write!(f, "Could not read the analyst response: {msg}"),
        }
    }
}

impl std::error::Error for CollectorError {}

impl CollectorError {
    /// True for failures of an external collaborator, as opposed to bad input.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::NoData | Self::Source(_) | Self::Analyst(_) | Self::MalformedResponse(_)
        )
    }
}

/// Source of historical bars.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// The most recent `count` one-minute bars for `instrument`.
    async fn fetch_bars(&self, instrument: &Instrument, count: u32)
    -> Result<Vec<Bar>, CollectorError>;
}

/// Language-model endpoint that reads the bar table.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Returns the raw reply text.
    async fn analyze(
        &self,
        model: &str,
        system_prompt: &str,
        table: &BarTable,
    ) -> Result<String, CollectorError>;
}
