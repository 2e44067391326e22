#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{Analyst, Bar, BarTable, CollectorError, Instrument, MarketDataSource};

/// Serves canned bars keyed by the instrument's `SYM:EX` form.
#[derive(Clone, Default)]
pub struct MockMarketDataSource {
    pub bars: Arc<Mutex<HashMap<String, Vec<Bar>>>>,
    pub failing: Arc<Mutex<HashSet<String>>>,
    /// Every instrument requested, in call order.
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockMarketDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(self, instrument: &str, bars: Vec<Bar>) -> Self {
        self.bars.lock().unwrap().insert(instrument.to_owned(), bars);
        self
    }

    pub fn failing_for(self, instrument: &str) -> Self {
        self.failing.lock().unwrap().insert(instrument.to_owned());
        self
    }
}

#[async_trait]
impl MarketDataSource for MockMarketDataSource {
    async fn fetch_bars(
        &self,
        instrument: &Instrument,
        count: u32,
    ) -> Result<Vec<Bar>, CollectorError> {
        let key = instrument.to_string();
        self.calls.lock().unwrap().push(key.clone());

        if self.failing.lock().unwrap().contains(&key) {
            return Err(CollectorError::Source(format!("symbol {key} not found")));
        }

        let bars = self.bars.lock().unwrap();
        let Some(series) = bars.get(&key) else {
            return Ok(vec![]);
        };
        let skip = series.len().saturating_sub(count as usize);
        Ok(series[skip..].to_vec())
    }
}

/// Records prompts and answers with a fixed reply.
#[derive(Clone)]
pub struct MockAnalyst {
    response: Arc<Mutex<Result<String, CollectorError>>>,
    /// `(model, system_prompt, rows)` per call.
    pub prompts: Arc<Mutex<Vec<(String, String, usize)>>>,
}

impl MockAnalyst {
    pub fn new(response: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(response.to_owned()))),
            prompts: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn failing(error: CollectorError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Err(error))),
            prompts: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Analyst for MockAnalyst {
    async fn analyze(
        &self,
        model: &str,
        system_prompt: &str,
        table: &BarTable,
    ) -> Result<String, CollectorError> {
        self.prompts.lock().unwrap().push((
            model.to_owned(),
            system_prompt.to_owned(),
            table.len(),
        ));
        self.response.lock().unwrap().clone()
    }
}
