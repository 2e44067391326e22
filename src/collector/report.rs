use serde::{Deserialize, Serialize};

use super::CollectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIdea {
    #[serde(default)]
    pub id: u32,
    pub direction: Direction,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_price: f64,
    #[serde(default)]
    pub position_size_pct: f64,
    #[serde(default)]
    pub confidence_pct: f64,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub invalidating_signals: Vec<String>,
}

impl TradeIdea {
    /// Distance from entry to target in price points.
    pub fn target_points(&self) -> f64 {
        (self.entry_price - self.target_price).abs()
    }

    /// Distance from entry to stop in price points.
    pub fn stop_points(&self) -> f64 {
        (self.entry_price - self.stop_price).abs()
    }
}

/// The analyst's structured answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    /// As written by the model; not guaranteed to carry a timezone.
    pub timestamp_utc: String,
    pub trend_summary: String,
    pub trade_ideas: Vec<TradeIdea>,
    pub key_indicators_used: Vec<String>,
    pub assumptions: Vec<String>,
}

impl AnalysisReport {
    /// Parses the model's reply.
    ///
    /// Tolerates a surrounding markdown code fence or chatter before and after
    /// the JSON object.
    pub fn parse(text: &str) -> Result<Self, CollectorError> {
        let start = text.find('{');
        let end = text.rfind('}');
        let json = match (start, end) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => {
                return Err(CollectorError::MalformedResponse(
                    "no JSON object in response".to_owned(),
                ));
            }
        };

        serde_json::from_str(json).map_err(|e| CollectorError::MalformedResponse(e.to_string()))
    }
}
