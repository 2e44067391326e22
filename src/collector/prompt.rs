use super::bars::BarTable;

const OUTPUT_FORMAT: &str = r#"Output format (mandatory, reply with exactly this JSON and nothing else):
{
  "timestamp_utc": "YYYY-MM-DDTHH:MM:SS",
  "trend_summary": "short sentence",
  "trade_ideas": [
    {
      "id": 1,
      "direction": "LONG" | "SHORT",
      "entry_price": number,
      "target_price": number,
      "stop_price": number,
      "position_size_pct": number,
      "confidence_pct": number,
      "rationale": "2-4 lines covering micro and macro context",
      "invalidating_signals": ["event 1", "technical level X"]
    }
  ],
  "key_indicators_used": ["short list of indicators"],
  "assumptions": ["assumption 1", "assumption 2"]
}"#;

/// Instructions for the analyst, ending with the mandatory JSON schema.
pub fn build_system_prompt(target: &str, language: &str) -> String {
    format!(
        "You are a quantitative technical analyst focused on day trading {target}.\n\
         Input: the user sends a CSV with a header row (symbol, exchange, datetime, open, high, low, close, volume, timestamp_utc). \
         Also weigh correlated quotes such as rates, commodities and indices when they are present.\n\
         Language: {language}.\n\n\
         {OUTPUT_FORMAT}"
    )
}

/// The user turn: the bar table inlined as a fenced CSV block.
pub fn build_user_message(table: &BarTable) -> String {
    format!("Here is the dataset as CSV:\n\n```csv\n{}```", table.to_csv())
}
