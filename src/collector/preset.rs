use serde::{Deserialize, Serialize};

use super::CollectorError;
use super::instrument::{Instrument, parse_instrument_list};

/// Models the analyst may be asked to use.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gpt-5.1",
    "gpt-5.1-chat-latest",
    "gpt-5-pro",
    "gpt-5-nano",
    "o3-pro",
    "gpt-4.1",
];

pub const MIN_BARS: u32 = 1;
pub const MAX_BARS: u32 = 500;

/// What to collect and which model to ask. Saved per user as a named preset.
///
/// Missing fields fall back to the defaults, and the legacy Portuguese keys
/// are accepted when reading older presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorPreset {
    /// Comma-separated B3 instruments.
    #[serde(alias = "ativos_b3")]
    pub local_instruments: String,
    /// Comma-separated global/FX instruments used as correlated context.
    #[serde(alias = "ativos_fx")]
    pub global_instruments: String,
    /// Instrument the trade ideas are for.
    #[serde(alias = "ativo_alvo")]
    pub target: String,
    /// Bars per instrument.
    pub bars: u32,
    pub model: String,
}

impl Default for CollectorPreset {
    fn default() -> Self {
        Self {
            local_instruments: "WIN1!:BMFBOVESPA,WDO1!:BMFBOVESPA,DI11!:BMFBOVESPA".to_owned(),
            global_instruments: "YM1!:CBOT,ES1!:CME,NQ1!:CME,DX1!:ICEUS,10Y1!:CBOT,2YY1!:CBOT,\
                FDAX1!:EUREX,FESX1!:EUREX,CN1!:SGX,HSI1!:HKEX,FEF1!:SGX,BRN1!:ICEEUR,\
                WBS1!:ICEEUR,VX1!:CBOE,NK2251!:OSE,AP1!:ASX24"
                .to_owned(),
            target: "WIN1!:BMFBOVESPA".to_owned(),
            bars: 8,
            model: "gpt-5.1".to_owned(),
        }
    }
}

impl CollectorPreset {
    /// Local instruments first, then global ones, in input order.
    pub fn instruments(&self) -> Vec<Instrument> {
        let mut all = parse_instrument_list(&self.local_instruments);
        all.extend(parse_instrument_list(&self.global_instruments));
        all
    }

    pub fn target_instrument(&self) -> Option<Instrument> {
        Instrument::parse(&self.target)
    }

    /// Checks the preset before any external call is made.
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.instruments().is_empty() {
            return Err(CollectorError::NoInstruments);
        }
        if self.target_instrument().is_none() {
            return Err(CollectorError::InvalidTarget);
        }
        if !(MIN_BARS..=MAX_BARS).contains(&self.bars) {
            return Err(CollectorError::BarsOutOfRange(self.bars));
        }
        if !SUPPORTED_MODELS.contains(&self.model.as_str()) {
            return Err(CollectorError::UnsupportedModel(self.model.clone()));
        }
        Ok(())
    }
}
