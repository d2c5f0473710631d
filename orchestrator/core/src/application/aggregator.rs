// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Result Aggregator
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Merges terminal invocations (and direct agent answers)
//!   into one response. Order is the plan order, never completion order.

use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::application::coordinator::ExecutionReport;
use crate::domain::errors::InvocationError;
use crate::domain::plan::Question;
use crate::domain::planner::AnswerSynthesizer;
use crate::domain::result::{AggregatedResult, InvocationReport, OverallStatus};

const RESULT_PREVIEW_CHARS: usize = 160;

/// Degradation carried in from the workflow steps before execution.
#[derive(Debug, Clone, Default)]
pub struct AggregationContext {
    pub degraded: bool,
    pub notes: Vec<String>,
}

#[derive(Default)]
pub struct ResultAggregator {
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_synthesizer(synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        Self {
            synthesizer: Some(synthesizer),
        }
    }

    pub async fn aggregate(
        &self,
        question: &Question,
        execution: ExecutionReport,
        context: AggregationContext,
    ) -> AggregatedResult {
        let mut reports: Vec<InvocationReport> =
            execution.invocations.iter().map(InvocationReport::from).collect();
        reports.sort_by_key(|r| r.position);

        let degraded = context.degraded || execution.is_degraded();
        let mut notes = context.notes;
        notes.extend(execution.notes);

        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        let overall_status =
            OverallStatus::from_outcomes(succeeded, reports.len() - succeeded, degraded);
        let risk_score = composite_risk_score(&reports);

        let answer = match (&self.synthesizer, succeeded) {
            (Some(synthesizer), n) if n > 0 => match synthesizer.synthesize(question, &reports).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => summarize(question, &reports, risk_score),
                Err(e) => {
                    warn!(error = %e, "Answer synthesis failed; using summary");
                    notes.push(format!("answer synthesis unavailable: {}", e));
                    summarize(question, &reports, risk_score)
                }
            },
            _ => summarize(question, &reports, risk_score),
        };

        AggregatedResult {
            answer,
            per_agent_results: reports,
            overall_status,
            risk_score,
            degraded,
            notes,
        }
    }

    /// Response for a request where nothing was invoked.
    pub fn direct_answer(
        &self,
        question: &Question,
        reason: &str,
        available: &[String],
        context: AggregationContext,
    ) -> AggregatedResult {
        let mut answer = format!("No capability was invoked for \"{}\": {}.", question.text, reason);
        if !available.is_empty() {
            answer.push_str(&format!(
                " Available capabilities: {}. Ask about one of them, or request a full analysis.",
                available.join(", ")
            ));
        }
        AggregatedResult {
            answer,
            per_agent_results: Vec::new(),
            overall_status: OverallStatus::from_outcomes(0, 0, context.degraded),
            risk_score: None,
            degraded: context.degraded,
            notes: context.notes,
        }
    }
}

/// Mean of the `risk_score` values of successful results.
pub fn composite_risk_score(reports: &[InvocationReport]) -> Option<f64> {
    let scores: Vec<f64> = reports.iter().filter_map(InvocationReport::risk_score).collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

fn summarize(question: &Question, reports: &[InvocationReport], risk_score: Option<f64>) -> String {
    let mut out = format!("Results for \"{}\":", question.text);
    for report in reports {
        out.push_str(&format!("\n- {}: {}", report.source(), describe(report)));
    }
    if let Some(score) = risk_score {
        out.push_str(&format!("\nComposite risk score: {:.1}", score));
    }
    out
}

fn describe(report: &InvocationReport) -> String {
    if let Some(error) = &report.error {
        return format!("{} ({})", report.status, describe_error(error));
    }
    match &report.result {
        Some(result) => format!("{}, {}", report.status, describe_value(result)),
        None => report.status.to_string(),
    }
}

fn describe_error(error: &InvocationError) -> String {
    format!("{}: {}", error.kind, error.message)
}

fn describe_value(value: &Value) -> String {
    if let Some(answer) = value.get("answer").and_then(Value::as_str) {
        return preview(answer);
    }
    if let Some(score) = value.get("risk_score").and_then(Value::as_f64) {
        return format!("risk score {}", score);
    }
    preview(&value.to_string())
}

fn preview(text: &str) -> String {
    if text.chars().count() <= RESULT_PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(RESULT_PREVIEW_CHARS).collect();
        format!("{}…", head)
    }
}
