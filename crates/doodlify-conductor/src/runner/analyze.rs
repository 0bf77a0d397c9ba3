use std::path::Path;

use anyhow::{Context, Result};
use doodlify_core::{active_events, AnalysisResult, EventStatus, ProgressPatch, ReportedSuggestion};
use doodlify_ledger::LedgerStore;
use jiff::Timestamp;

use crate::capability::{Analyzer, CodeHost};
use crate::runner::process::analyze_repository;
use crate::state::machine::transition;

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// File every suggestion, ignoring `defaults.reportSuggestions`.
    pub report_all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzeReport {
    /// False when a cached analysis was reused.
    pub fresh: bool,
    pub analysis: AnalysisResult,
    pub filed: Vec<ReportedSuggestion>,
    pub already_reported: usize,
    pub disabled: usize,
}

/// Analyze the checkout once and file its improvement suggestions as issues.
pub fn run_analyze(
    store: &LedgerStore,
    repo_root: &Path,
    analyzer: &dyn Analyzer,
    host: &dyn CodeHost,
    opts: AnalyzeOptions,
    now: Timestamp,
) -> Result<AnalyzeReport> {
    let lock = store.load()?;
    let mut report = AnalyzeReport::default();

    report.analysis = match lock.global_analysis.clone() {
        Some(cached) => {
            println!("✓ Using cached analysis");
            cached
        }
        None => {
            let waiting: Vec<String> = active_events(&lock, now)
                .into_iter()
                .filter(|e| e.progress.status == EventStatus::Pending)
                .map(|e| e.id().to_string())
                .collect();
            for id in &waiting {
                transition(store, id, EventStatus::Analyzing, ProgressPatch::default())?;
            }
            println!("▶ Analyzing repository...");
            match analyze_repository(store, repo_root, analyzer) {
                Ok(analysis) => {
                    store.update_global_analysis(analysis.clone())?;
                    for id in &waiting {
                        transition(
                            store,
                            id,
                            EventStatus::Pending,
                            ProgressPatch {
                                analyzed: Some(true),
                                ..Default::default()
                            },
                        )?;
                    }
                    report.fresh = true;
                    analysis
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    for id in &waiting {
                        transition(
                            store,
                            id,
                            EventStatus::Failed,
                            ProgressPatch::default().with_error(message.clone()),
                        )?;
                    }
                    println!("✗ Analysis failed: {message}");
                    return Err(e);
                }
            }
        }
    };
    let a = &report.analysis;
    println!("  ✓ {} image file(s)", a.image_files.len());
    println!("  ✓ {} text/i18n file(s)", a.text_files.len());
    println!("  ✓ {} file(s) of interest", a.files_of_interest.len());

    // ── Suggestions ──

    let mut lock = store.load()?;
    let suggestions = report.analysis.improvement_suggestions.clone();
    for suggestion in &suggestions {
        if !opts.report_all && !lock.defaults.reports(&suggestion.key) {
            report.disabled += 1;
            continue;
        }
        let fingerprint = suggestion.fingerprint();
        if lock.is_reported(&fingerprint) {
            report.already_reported += 1;
            continue;
        }
        let issue = host
            .create_or_find_issue(&suggestion.title, &suggestion.body, &suggestion.labels)
            .with_context(|| format!("filing suggestion \"{}\"", suggestion.title))?;
        println!("  ✓ Issue #{}: {}", issue.number, suggestion.title);
        let reported = ReportedSuggestion {
            key: Some(suggestion.key.clone()),
            title: suggestion.title.clone(),
            fingerprint,
            issue_number: issue.number,
            issue_url: issue.url,
        };
        lock = store.record_reported_suggestion(reported.clone())?;
        report.filed.push(reported);
    }
    Ok(report)
}
