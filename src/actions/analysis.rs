use chrono::Utc;
use serde::Serialize;

use crate::collector::{
    AnalysisReport, Analyst, BarTable, CollectorError, CollectorPreset, MarketDataSource,
    build_system_prompt, collect_bars,
};
use crate::events::{AuthEvent, dispatch};
use crate::Session;

/// Language the analyst is asked to answer in when none is configured.
pub const DEFAULT_REPORT_LANGUAGE: &str = "Brazilian Portuguese";

/// Result of one collector run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub table: BarTable,
    pub report: AnalysisReport,
}

/// Collects bars for a preset, asks the analyst and parses the answer.
///
/// Runs to completion or fails; nothing is retried.
pub struct RunAnalysisAction<S: MarketDataSource, A: Analyst> {
    source: S,
    analyst: A,
    language: String,
}

impl<S: MarketDataSource, A: Analyst> RunAnalysisAction<S, A> {
    pub fn new(source: S, analyst: A) -> Self {
        RunAnalysisAction {
            source,
            analyst,
            language: DEFAULT_REPORT_LANGUAGE.to_owned(),
        }
    }

    #[must_use]
    pub fn language(mut self, language: &str) -> Self {
        language.clone_into(&mut self.language);
        self
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "run_analysis", skip_all, err)
    )]
    pub async fn execute(
        &self,
        session: &Session,
        preset: &CollectorPreset,
    ) -> Result<AnalysisRun, CollectorError> {
        preset.validate()?;
        let target = preset
            .target_instrument()
            .ok_or(CollectorError::InvalidTarget)?;

        let table = collect_bars(&self.source, &preset.instruments(), preset.bars).await?;
        log::info!(
            target: "rdx_dash::collector",
            "msg=\"bars collected\" user_id={} rows={} target=\"{target}\"",
            session.user_id,
            table.len()
        );

        let prompt = build_system_prompt(&target.to_string(), &self.language);
        let reply = self.analyst.analyze(&preset.model, &prompt, &table).await?;
        let report = AnalysisReport::parse(&reply)?;

        log::info!(
            target: "rdx_dash::collector",
            "msg=\"analysis completed\" user_id={} model=\"{}\" trade_ideas={}",
            session.user_id,
            preset.model,
            report.trade_ideas.len()
        );
        dispatch(AuthEvent::AnalysisCompleted {
            user_id: session.user_id,
            target: target.to_string(),
            rows: table.len(),
            trade_ideas: report.trade_ideas.len(),
            at: Utc::now(),
        })
        .await;

        Ok(AnalysisRun { table, report })
    }
}
