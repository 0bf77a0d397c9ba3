use std::path::Path;

use anyhow::{Context, Result};
use doodlify_core::{
    now_rfc3339, unprocessed_active_events, AnalysisResult, Error, EventConfig, EventStatus,
    FileState, FileStatusEntry, ProgressPatch,
};
use doodlify_files::{
    backup_path, create_backup, has_backup, is_backup, reset_from_backup, resolve, restore,
    to_repo_relative,
};
use doodlify_ledger::LedgerStore;
use jiff::Timestamp;

use crate::capability::{
    AnalysisRequest, Analyzer, ImageTransformer, TextAdapter, ThemeRequest, VersionControl,
};
use crate::runner::message::{commit_message, short_sha};
use crate::state::machine::transition;

/// Raster formats the image transformer accepts.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Structured text formats the text adapter accepts.
pub const SUPPORTED_TEXT_EXTENSIONS: &[&str] = &["json"];

/// Extensions routed to the image pass when partitioning an allow-list.
const IMAGE_LIKE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "svg", "ico", "bmp", "avif", "tif", "tiff",
];

/// Recorded as the event's explanation when a pass changed nothing.
pub const NO_FILES_MODIFIED: &str = "No files were modified";

pub struct ProcessCapabilities<'a> {
    pub analyzer: &'a dyn Analyzer,
    pub images: &'a dyn ImageTransformer,
    pub text: &'a dyn TextAdapter,
    pub vcs: &'a dyn VersionControl,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Run this event regardless of its dates or processed flag.
    pub event_id: Option<String>,
    /// Explicit allow-list of repo-relative paths or bare file names.
    pub only: Vec<String>,
    /// Re-theme files even when a backup exists.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Committed { commit_sha: String, files: usize },
    /// Earlier work is already committed and nothing new was themed.
    Unchanged,
    NothingModified,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReport {
    pub event_id: String,
    pub outcome: EventOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    pub events: Vec<EventReport>,
}

impl ProcessReport {
    pub fn any_failed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e.outcome, EventOutcome::Failed(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Image,
    Text,
}

impl Kind {
    fn supports(self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        match self {
            Kind::Image => SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str()),
            Kind::Text => SUPPORTED_TEXT_EXTENSIONS.contains(&ext.as_str()),
        }
    }
}

/// Process every unprocessed active event, or the one named in `opts`.
///
/// A failing event is recorded as failed and the run moves on. Only run-level
/// errors (configuration, ledger) abort.
pub fn run_process(
    store: &LedgerStore,
    repo_root: &Path,
    caps: &ProcessCapabilities<'_>,
    opts: &ProcessOptions,
    now: Timestamp,
) -> Result<ProcessReport> {
    let lock = store.load()?;
    let targets: Vec<EventConfig> = match &opts.event_id {
        Some(id) => {
            let event = lock
                .event(id)
                .ok_or_else(|| Error::Config(format!("unknown event id \"{id}\"")))?;
            vec![event.event.clone()]
        }
        None => unprocessed_active_events(&lock, now)
            .into_iter()
            .map(|e| e.event.clone())
            .collect(),
    };

    let mut report = ProcessReport::default();
    if targets.is_empty() {
        println!("No active events to process.");
        return Ok(report);
    }
    println!("Processing {} event(s)", targets.len());

    for event in &targets {
        let outcome = match process_event(store, repo_root, caps, opts, event) {
            Ok(outcome) => outcome,
            Err(e) if is_run_level(&e) => return Err(e),
            Err(e) => {
                let message = format!("{e:#}");
                println!("  ✗ Event \"{}\" failed: {message}", event.id);
                transition(
                    store,
                    &event.id,
                    EventStatus::Failed,
                    ProgressPatch {
                        last_executed: Some(Some(now_rfc3339())),
                        ..ProgressPatch::default().with_error(message.clone())
                    },
                )?;
                EventOutcome::Failed(message)
            }
        };
        report.events.push(EventReport {
            event_id: event.id.clone(),
            outcome,
        });
    }
    Ok(report)
}

fn is_run_level(e: &anyhow::Error) -> bool {
    e.downcast_ref::<Error>().is_some_and(Error::is_run_level)
}

struct EventCtx<'a> {
    store: &'a LedgerStore,
    repo_root: &'a Path,
    event: &'a EventConfig,
    force: bool,
    use_palette: bool,
}

fn process_event(
    store: &LedgerStore,
    repo_root: &Path,
    caps: &ProcessCapabilities<'_>,
    opts: &ProcessOptions,
    event: &EventConfig,
) -> Result<EventOutcome> {
    let config = store.config();
    let branch = config.branch_name(event);
    println!("\n▶ Event \"{}\" ({}) on {branch}", event.name, event.id);

    transition(
        store,
        &event.id,
        EventStatus::Processing,
        ProgressPatch {
            started_at: Some(Some(now_rfc3339())),
            completed_at: Some(None),
            error: Some(None),
            ..Default::default()
        },
    )?;

    // ── Branch ──

    let exclude: Vec<String> = store
        .location()
        .repo_relative()
        .map(String::from)
        .into_iter()
        .collect();
    let stashed = match caps
        .vcs
        .stash_push(&format!("doodlify: before {branch}"), &exclude)
    {
        Ok(stashed) => stashed,
        Err(e) => {
            add_note(store, &event.id, format!("could not stash local changes: {e:#}"))?;
            false
        }
    };
    let switched = caps
        .vcs
        .create_branch(&branch, config.base_branch())
        .with_context(|| format!("creating branch {branch}"));
    if stashed {
        if let Err(e) = caps.vcs.stash_apply() {
            add_note(
                store,
                &event.id,
                format!("stashed local changes could not be reapplied on {branch} (still in the stash): {e:#}"),
            )?;
        }
    }
    switched?;
    store.update_progress(
        &event.id,
        ProgressPatch {
            branch_created: Some(true),
            ..Default::default()
        },
    )?;

    // ── Files ──

    let (images, texts) = candidates(store, repo_root, caps.analyzer, event, &opts.only)?;
    let ctx = EventCtx {
        store,
        repo_root,
        event,
        force: opts.force,
        use_palette: event
            .use_event_color_palette
            .unwrap_or(config.defaults.use_event_color_palette),
    };
    let mut modified = 0;
    if !images.is_empty() {
        println!("  Images ({})", images.len());
    }
    for raw in &images {
        if theme_file(&ctx, caps, Kind::Image, raw)? {
            modified += 1;
        }
    }
    if !texts.is_empty() {
        println!("  Text ({})", texts.len());
    }
    for raw in &texts {
        if theme_file(&ctx, caps, Kind::Text, raw)? {
            modified += 1;
        }
    }

    // ── Commit ──

    let lock = store.load()?;
    let progress = &lock
        .event(&event.id)
        .ok_or_else(|| Error::UnknownEvent(event.id.clone()))?
        .progress;
    let finished_at = now_rfc3339();
    let done = ProgressPatch {
        processed: Some(true),
        completed_at: Some(Some(finished_at.clone())),
        last_executed: Some(Some(finished_at)),
        ..Default::default()
    };

    let needs_commit =
        modified > 0 || (progress.commit_sha.is_none() && !progress.modified_files.is_empty());
    if !needs_commit {
        if progress.modified_files.is_empty() {
            println!("  ⊘ {NO_FILES_MODIFIED}");
            transition(
                store,
                &event.id,
                EventStatus::Completed,
                done.with_error(NO_FILES_MODIFIED),
            )?;
            return Ok(EventOutcome::NothingModified);
        }
        println!("  ✓ Nothing new since {}", progress.commit_sha.as_deref().map(short_sha).unwrap_or("last run"));
        transition(store, &event.id, EventStatus::Completed, done)?;
        return Ok(EventOutcome::Unchanged);
    }

    let mut paths = progress.modified_files.clone();
    if let Some(ledger) = store.location().repo_relative() {
        paths.push(ledger.to_string());
    }
    let message = commit_message(event, &progress.modified_files);
    let sha = caps
        .vcs
        .commit(&message, &paths)
        .map_err(Error::from)
        .context("committing themed files")?;
    println!("  ✓ Committed {} ({modified} file(s) themed)", short_sha(&sha));

    transition(
        store,
        &event.id,
        EventStatus::Completed,
        ProgressPatch {
            commit_sha: Some(Some(sha.clone())),
            pushed: Some(false),
            error: Some(None),
            ..done
        },
    )?;
    println!("✓ Event \"{}\" completed", event.name);
    Ok(EventOutcome::Committed {
        commit_sha: sha,
        files: modified,
    })
}

fn add_note(store: &LedgerStore, event_id: &str, note: String) -> Result<()> {
    tracing::warn!(event = event_id, "{note}");
    println!("  ⚠ {note}");
    store.update_progress(
        event_id,
        ProgressPatch {
            add_notes: vec![note],
            ..Default::default()
        },
    )?;
    Ok(())
}

/// Image and text candidates for one event.
///
/// An allow-list is used as-is. Otherwise the event's cached analysis, then the
/// global one, then a fresh analysis cached both globally and on the event.
fn candidates(
    store: &LedgerStore,
    repo_root: &Path,
    analyzer: &dyn Analyzer,
    event: &EventConfig,
    only: &[String],
) -> Result<(Vec<String>, Vec<String>)> {
    if !only.is_empty() {
        return Ok(partition(only));
    }
    let lock = store.load()?;
    let cached = lock
        .event(&event.id)
        .and_then(|e| e.analysis.clone())
        .or_else(|| lock.global_analysis.clone());
    let analysis = match cached {
        Some(analysis) => analysis,
        None => {
            println!("  Analyzing repository...");
            let analysis = analyze_repository(store, repo_root, analyzer)?;
            store.update_global_analysis(analysis.clone())?;
            store.update_event_analysis(&event.id, analysis.clone())?;
            analysis
        }
    };
    Ok((analysis.image_files, analysis.text_files))
}

/// Run the analyzer with the project's hints. The result is deduplicated and stamped.
pub(crate) fn analyze_repository(
    store: &LedgerStore,
    repo_root: &Path,
    analyzer: &dyn Analyzer,
) -> Result<AnalysisResult> {
    let config = store.config();
    let analysis = analyzer
        .analyze(&AnalysisRequest {
            repo_root,
            sources: &config.project.sources,
            selector: config.defaults.selector.as_deref(),
            project_description: &config.project.description,
        })
        .context("analyzing repository")?;
    Ok(AnalysisResult {
        analyzed_at: Some(now_rfc3339()),
        ..analysis.dedup()
    })
}

fn partition(only: &[String]) -> (Vec<String>, Vec<String>) {
    only.iter().cloned().partition(|p| {
        Path::new(p)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_LIKE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    })
}

/// Theme one file. Returns true when the file was transformed in this run.
///
/// Per-file problems are recorded in `file_status` and never fail the event.
fn theme_file(ctx: &EventCtx<'_>, caps: &ProcessCapabilities<'_>, kind: Kind, raw: &str) -> Result<bool> {
    let id = &ctx.event.id;
    let sources = &ctx.store.config().project.sources;
    let path = resolve(ctx.repo_root, sources, raw)?;
    let rel = to_repo_relative(ctx.repo_root, &path);

    if is_backup(&path) {
        println!("  ⊘ {rel}: backup of another file");
        record_file(ctx.store, id, &rel, FileState::Skipped, Some("backup of another file".into()))?;
        return Ok(false);
    }
    if !path.is_file() {
        println!("  ⊘ {rel}: missing");
        record_file(ctx.store, id, &rel, FileState::Missing, Some(format!("not found: {raw}")))?;
        return Ok(false);
    }
    if !kind.supports(&path) {
        println!("  ⊘ {rel}: unsupported format");
        record_file(ctx.store, id, &rel, FileState::Unsupported, Some("unsupported format".into()))?;
        return Ok(false);
    }

    let backup_rel = to_repo_relative(ctx.repo_root, &backup_path(&path));
    let already = has_backup(&path);
    if already && !ctx.force {
        println!("  ✓ {rel} (already processed)");
        reconcile_processed(ctx.store, id, &rel, &backup_rel)?;
        return Ok(false);
    }

    let prepared = if already {
        reset_from_backup(&path)
    } else {
        create_backup(ctx.repo_root, &path).map(|_| ())
    };
    if let Err(e) = prepared {
        println!("  ✗ {rel}: {e}");
        record_file(ctx.store, id, &rel, FileState::Skipped, Some(e.to_string()))?;
        return Ok(false);
    }

    let req = ThemeRequest {
        path: &path,
        event_name: &ctx.event.name,
        event_description: &ctx.event.description,
        use_color_palette: ctx.use_palette,
    };
    let result = match kind {
        Kind::Image => caps.images.transform(&req),
        Kind::Text => caps.text.adapt(&req),
    };
    if let Err(e) = result {
        let message = Error::Transform {
            path: rel.clone(),
            message: format!("{e:#}"),
        }
        .to_string();
        println!("  ✗ {message}");
        // The original goes back and the backup goes away, so the file is retried next run.
        if let Err(re) = restore(&path) {
            tracing::warn!(file = %rel, error = %re, "could not roll back failed transform");
        }
        ctx.store.update_progress(
            id,
            ProgressPatch {
                remove_modified: vec![backup_rel],
                ..ProgressPatch::file(rel, FileStatusEntry::new(FileState::Skipped, Some(message)))
            },
        )?;
        return Ok(false);
    }

    ctx.store.update_progress(
        id,
        ProgressPatch::file(rel.clone(), FileStatusEntry::new(FileState::Processed, None))
            .with_modified([rel.clone(), backup_rel]),
    )?;
    println!("  ✓ {rel}");
    Ok(true)
}

/// Upsert a file entry unless the ledger already says the same thing.
fn record_file(
    store: &LedgerStore,
    event_id: &str,
    rel: &str,
    state: FileState,
    details: Option<String>,
) -> Result<()> {
    let lock = store.load()?;
    let unchanged = lock
        .event(event_id)
        .and_then(|e| e.progress.file_status.get(rel))
        .is_some_and(|entry| entry.status == state && entry.details == details);
    if !unchanged {
        store.update_progress(event_id, ProgressPatch::file(rel, FileStatusEntry::new(state, details)))?;
    }
    Ok(())
}

/// A backup on disk is authoritative: make the ledger agree with it.
fn reconcile_processed(store: &LedgerStore, event_id: &str, rel: &str, backup_rel: &str) -> Result<()> {
    let lock = store.load()?;
    let Some(event) = lock.event(event_id) else {
        return Ok(());
    };
    let p = &event.progress;
    let in_sync = p.file_state(rel) == Some(FileState::Processed)
        && p.modified_files.iter().any(|f| f == rel)
        && p.modified_files.iter().any(|f| f == backup_rel);
    if !in_sync {
        let entry = p
            .file_status
            .get(rel)
            .filter(|e| e.status == FileState::Processed)
            .cloned()
            .unwrap_or_else(|| FileStatusEntry::new(FileState::Processed, Some("backup present".into())));
        store.update_progress(
            event_id,
            ProgressPatch::file(rel, entry).with_modified([rel.to_string(), backup_rel.to_string()]),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{december, ts, FakeAnalyzer, FakeTheme, FakeVcs, Fixture};
    use doodlify_ledger::LedgerMode;

    struct Harness {
        analyzer: FakeAnalyzer,
        images: FakeTheme,
        text: FakeTheme,
        vcs: FakeVcs,
    }

    impl Harness {
        fn new(analyzer: FakeAnalyzer) -> Self {
            Self {
                analyzer,
                images: FakeTheme::default(),
                text: FakeTheme::default(),
                vcs: FakeVcs::default(),
            }
        }

        fn caps(&self) -> ProcessCapabilities<'_> {
            ProcessCapabilities {
                analyzer: &self.analyzer,
                images: &self.images,
                text: &self.text,
                vcs: &self.vcs,
            }
        }

        fn run(&self, fx: &Fixture, opts: &ProcessOptions) -> ProcessReport {
            run_process(&fx.store, &fx.repo, &self.caps(), opts, december()).unwrap()
        }
    }

    fn christmas() -> ProcessOptions {
        ProcessOptions {
            event_id: Some("christmas".into()),
            ..Default::default()
        }
    }

    fn event(fx: &Fixture) -> doodlify_core::EventLock {
        fx.store.load().unwrap().event("christmas").unwrap().clone()
    }

    #[test]
    fn happy_path_themes_backs_up_and_commits() {
        let fx = Fixture::new();
        fx.write("frontend/public/hero.png", "png");
        fx.write("frontend/src/i18n/en.json", "{}");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/hero.png"], &["src/i18n/en.json"]));

        let report = h.run(&fx, &ProcessOptions::default());
        assert_eq!(report.events.len(), 1);
        assert!(matches!(
            report.events[0].outcome,
            EventOutcome::Committed { files: 2, .. }
        ));

        assert_eq!(fx.read("frontend/public/hero.png"), "Christmas:png");
        assert_eq!(fx.read("frontend/public/hero.original.png"), "png");
        let e = event(&fx);
        assert_eq!(e.progress.status, EventStatus::Completed);
        assert!(e.progress.processed && e.progress.branch_created && e.progress.analyzed);
        assert_eq!(
            e.progress.modified_files,
            vec![
                "frontend/public/hero.png",
                "frontend/public/hero.original.png",
                "frontend/src/i18n/en.json",
                "frontend/src/i18n/en.original.json",
            ]
        );
        assert!(e.progress.commit_sha.is_some());
        assert!(e.last_executed.is_some());

        let log = h.vcs.log();
        assert_eq!(log[0], "stash push");
        assert_eq!(log[1], "branch feature/event/christmas-2024 from main");
        assert_eq!(h.vcs.commits.borrow()[0].1, e.progress.modified_files);
        assert_eq!(h.analyzer.calls.get(), 1);
        assert!(fx.store.load().unwrap().global_analysis.is_some());
        assert_eq!(e.analysis.as_ref().map(|a| a.image_files.len()), Some(1));
    }

    #[test]
    fn only_active_unprocessed_events_run() {
        let fx = Fixture::new();
        let h = Harness::new(FakeAnalyzer::default());
        let report =
            run_process(&fx.store, &fx.repo, &h.caps(), &ProcessOptions::default(), ts("2025-01-01T12:00:00Z"))
                .unwrap();
        assert!(report.events.is_empty());
        assert!(h.vcs.log().is_empty());
    }

    #[test]
    fn unknown_event_id_is_a_config_error() {
        let fx = Fixture::new();
        let h = Harness::new(FakeAnalyzer::default());
        let opts = ProcessOptions {
            event_id: Some("easter".into()),
            ..Default::default()
        };
        let err = run_process(&fx.store, &fx.repo, &h.caps(), &opts, december()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))));
    }

    #[test]
    fn second_run_is_idempotent() {
        let fx = Fixture::new();
        fx.write("frontend/public/hero.png", "png");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/hero.png", "public/gone.png"], &[]));

        h.run(&fx, &christmas());
        let first = event(&fx);
        let report = h.run(&fx, &christmas());
        let second = event(&fx);

        assert_eq!(report.events[0].outcome, EventOutcome::Unchanged);
        assert_eq!(h.images.call_count(), 1);
        assert_eq!(h.vcs.commit_count(), 1);
        assert_eq!(first.progress.modified_files, second.progress.modified_files);
        assert_eq!(first.progress.file_status, second.progress.file_status);
        assert_eq!(fx.read("frontend/public/hero.png"), "Christmas:png");
    }

    #[test]
    fn nothing_modified_completes_without_commit() {
        let fx = Fixture::new();
        fx.write("frontend/public/anim.gif", "gif");
        let h = Harness::new(FakeAnalyzer::with_files(
            &["public/anim.gif", "public/missing.png"],
            &["src/readme.txt"],
        ));

        let report = h.run(&fx, &ProcessOptions::default());
        assert_eq!(report.events[0].outcome, EventOutcome::NothingModified);
        assert!(!h.vcs.log().contains(&"commit".to_string()));

        let e = event(&fx);
        assert_eq!(e.progress.status, EventStatus::Completed);
        assert!(e.progress.processed);
        assert_eq!(e.progress.error.as_deref(), Some(NO_FILES_MODIFIED));
        assert_eq!(
            e.progress.file_state("frontend/public/anim.gif"),
            Some(FileState::Unsupported)
        );
        assert_eq!(e.progress.file_state("public/missing.png"), Some(FileState::Missing));
    }

    #[test]
    fn transform_failure_skips_file_and_restores_original() {
        let fx = Fixture::new();
        fx.write("frontend/public/a.png", "a");
        fx.write("frontend/public/b.png", "b");
        let mut h = Harness::new(FakeAnalyzer::with_files(&["public/a.png", "public/b.png"], &[]));
        h.images = FakeTheme::failing(&["a.png"]);

        let report = h.run(&fx, &ProcessOptions::default());
        assert!(matches!(report.events[0].outcome, EventOutcome::Committed { files: 1, .. }));

        assert_eq!(fx.read("frontend/public/a.png"), "a");
        assert!(!has_backup(&fx.repo.join("frontend/public/a.png")));
        let e = event(&fx);
        assert_eq!(e.progress.file_state("frontend/public/a.png"), Some(FileState::Skipped));
        assert!(e.progress.file_status["frontend/public/a.png"]
            .details
            .as_deref()
            .is_some_and(|d| d.starts_with("transform failed for frontend/public/a.png: model rejected")));
        assert_eq!(e.progress.file_state("frontend/public/b.png"), Some(FileState::Processed));
        assert!(!e.progress.modified_files.iter().any(|f| f.contains("a.")));
    }

    #[test]
    fn resume_after_crash_only_themes_remaining_files() {
        let fx = Fixture::new();
        fx.write("frontend/public/a.png", "a");
        fx.write("frontend/public/b.png", "b");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/a.png", "public/b.png"], &[]));

        // First run dies after theming A: backup, status and ledger are on disk.
        let a = fx.repo.join("frontend/public/a.png");
        create_backup(&fx.repo, &a).unwrap();
        std::fs::write(&a, "Christmas:a").unwrap();
        transition(&fx.store, "christmas", EventStatus::Processing, ProgressPatch::default()).unwrap();
        fx.store
            .update_progress(
                "christmas",
                ProgressPatch::file(
                    "frontend/public/a.png",
                    FileStatusEntry::new(FileState::Processed, None),
                )
                .with_modified([
                    "frontend/public/a.png".to_string(),
                    "frontend/public/a.original.png".to_string(),
                ]),
            )
            .unwrap();
        let a_entry = event(&fx).progress.file_status["frontend/public/a.png"].clone();

        h.run(&fx, &ProcessOptions::default());

        assert_eq!(*h.images.calls.borrow(), vec![fx.repo.join("frontend/public/b.png")]);
        assert_eq!(fx.read("frontend/public/a.png"), "Christmas:a");
        assert_eq!(fx.read("frontend/public/a.original.png"), "a");
        let e = event(&fx);
        assert_eq!(e.progress.file_status["frontend/public/a.png"], a_entry);
        assert_eq!(e.progress.file_state("frontend/public/b.png"), Some(FileState::Processed));
        assert_eq!(e.progress.status, EventStatus::Completed);
    }

    #[test]
    fn backups_listed_as_candidates_are_never_themed() {
        let fx = Fixture::new();
        let hero = fx.write("frontend/public/hero.png", "png");
        create_backup(&fx.repo, &hero).unwrap();
        std::fs::write(&hero, "Christmas:png").unwrap();
        let h = Harness::new(FakeAnalyzer::with_files(
            &["public/hero.png", "public/hero.original.png"],
            &[],
        ));

        h.run(&fx, &christmas());

        assert!(h.images.calls.borrow().is_empty());
        assert_eq!(fx.read("frontend/public/hero.original.png"), "png");
        assert!(!fx.repo.join("frontend/public/hero.original.original.png").exists());
        let e = event(&fx);
        assert_eq!(
            e.progress.file_state("frontend/public/hero.original.png"),
            Some(FileState::Skipped)
        );
        assert_eq!(e.progress.file_state("frontend/public/hero.png"), Some(FileState::Processed));

        // Restoring the live file still yields the untouched original.
        restore(&hero).unwrap();
        assert_eq!(fx.read("frontend/public/hero.png"), "png");
    }

    #[test]
    fn allow_listed_backup_is_skipped() {
        let fx = Fixture::new();
        fx.write("frontend/src/i18n/en.json", "{}");
        fx.write("frontend/src/i18n/en.original.json", "{}");
        let h = Harness::new(FakeAnalyzer::default());
        let opts = ProcessOptions {
            only: vec!["src/i18n/en.original.json".into()],
            ..christmas()
        };

        let report = h.run(&fx, &opts);
        assert_eq!(report.events[0].outcome, EventOutcome::NothingModified);
        assert_eq!(h.text.call_count(), 0);
        assert_eq!(fx.read("frontend/src/i18n/en.original.json"), "{}");
    }

    #[test]
    fn backup_on_disk_is_reconciled_into_ledger() {
        let fx = Fixture::new();
        let a = fx.write("frontend/public/a.png", "a");
        create_backup(&fx.repo, &a).unwrap();
        let h = Harness::new(FakeAnalyzer::with_files(&["public/a.png"], &[]));

        let report = h.run(&fx, &christmas());
        assert_eq!(h.images.call_count(), 0);
        // Uncommitted earlier work still gets committed.
        assert!(matches!(report.events[0].outcome, EventOutcome::Committed { files: 0, .. }));
        let e = event(&fx);
        assert_eq!(e.progress.file_state("frontend/public/a.png"), Some(FileState::Processed));
        assert_eq!(
            e.progress.modified_files,
            vec!["frontend/public/a.png", "frontend/public/a.original.png"]
        );
    }

    #[test]
    fn force_rederives_from_original() {
        let fx = Fixture::new();
        fx.write("frontend/public/a.png", "a");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/a.png"], &[]));
        h.run(&fx, &christmas());

        let opts = ProcessOptions {
            force: true,
            ..christmas()
        };
        let report = h.run(&fx, &opts);
        assert!(matches!(report.events[0].outcome, EventOutcome::Committed { files: 1, .. }));
        assert_eq!(h.images.call_count(), 2);
        assert_eq!(fx.read("frontend/public/a.png"), "Christmas:a");
        assert_eq!(fx.read("frontend/public/a.original.png"), "a");
    }

    #[test]
    fn allow_list_bypasses_analysis() {
        let fx = Fixture::new();
        fx.write("frontend/public/a.png", "a");
        fx.write("frontend/src/locales/fr.json", "{}");
        fx.write("frontend/public/b.png", "b");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/b.png"], &[]));

        let opts = ProcessOptions {
            only: vec!["public/a.png".into(), "fr.json".into()],
            ..christmas()
        };
        h.run(&fx, &opts);

        assert_eq!(h.analyzer.calls.get(), 0);
        assert_eq!(h.images.call_count(), 1);
        assert_eq!(h.text.call_count(), 1);
        assert_eq!(fx.read("frontend/public/b.png"), "b");
        assert_eq!(fx.read("frontend/src/locales/fr.json"), "Christmas:{}");
    }

    #[test]
    fn cached_analysis_is_reused() {
        let fx = Fixture::new();
        fx.store
            .update_global_analysis(AnalysisResult {
                image_files: vec!["public/a.png".into()],
                ..Default::default()
            })
            .unwrap();
        fx.write("frontend/public/a.png", "a");
        let h = Harness::new(FakeAnalyzer::default());
        h.run(&fx, &christmas());
        assert_eq!(h.analyzer.calls.get(), 0);
        assert_eq!(h.images.call_count(), 1);
    }

    #[test]
    fn branch_failure_fails_event_and_run_continues() {
        let fx = Fixture::new();
        let mut h = Harness::new(FakeAnalyzer::default());
        h.vcs.fail_branch = true;
        let report = run_process(
            &fx.store,
            &fx.repo,
            &h.caps(),
            &ProcessOptions::default(),
            ts("2024-10-25T12:00:00Z"),
        )
        .unwrap();
        assert!(report.any_failed());
        let lock = fx.store.load().unwrap();
        let e = lock.event("halloween").unwrap();
        assert_eq!(e.progress.status, EventStatus::Failed);
        assert!(e.progress.error.as_deref().is_some_and(|m| m.contains("creating branch")));
        assert!(!e.progress.processed);
    }

    #[test]
    fn unexpected_nothing_to_commit_fails_event() {
        let fx = Fixture::new();
        fx.write("frontend/public/a.png", "a");
        let mut h = Harness::new(FakeAnalyzer::with_files(&["public/a.png"], &[]));
        h.vcs.nothing_to_commit = true;

        let report = h.run(&fx, &christmas());
        assert!(report.any_failed());
        let e = event(&fx);
        assert_eq!(e.progress.status, EventStatus::Failed);
        assert!(e.progress.error.as_deref().is_some_and(|m| m.contains("nothing to commit")));
        // Partial progress survives.
        assert_eq!(e.progress.file_state("frontend/public/a.png"), Some(FileState::Processed));

        // A failed event can be retried.
        h.vcs.nothing_to_commit = false;
        let report = h.run(&fx, &christmas());
        assert!(matches!(report.events[0].outcome, EventOutcome::Committed { files: 0, .. }));
    }

    #[test]
    fn failed_stash_reapply_is_noted_not_fatal() {
        let fx = Fixture::new();
        let mut h = Harness::new(FakeAnalyzer::default());
        h.vcs.stash_has_changes = true;
        h.vcs.fail_stash_apply = true;

        let report = h.run(&fx, &christmas());
        assert_eq!(report.events[0].outcome, EventOutcome::NothingModified);
        let e = event(&fx);
        assert_eq!(e.progress.notes.len(), 1);
        assert!(e.progress.notes[0].contains("could not be reapplied"));
    }

    #[test]
    fn in_repo_ledger_survives_several_events_on_real_git() {
        use crate::git::tests::{git_in, init_repo};
        use crate::git::GitCli;
        use doodlify_core::Config;
        use doodlify_ledger::LedgerLocation;

        let tmp = tempfile::tempdir().unwrap();
        let ws = tmp.path().join("ws");
        let repo = ws.join("acme");
        init_repo(&repo);
        let hero = repo.join("frontend/public/hero.png");
        std::fs::create_dir_all(hero.parent().unwrap()).unwrap();
        std::fs::write(&hero, "png").unwrap();
        git_in(&repo, &["add", "."]);
        git_in(&repo, &["commit", "-m", "site"]);

        let config = Config::from_json_str(
            r#"{
                "project": { "name": "Acme", "sources": ["frontend"] },
                "defaults": { "branchPrefix": "ev/" },
                "events": [
                    { "id": "a", "name": "Advent", "startDate": "2024-12-01",
                      "endDate": "2024-12-24", "branch": "a" },
                    { "id": "b", "name": "Bells", "startDate": "2024-12-10",
                      "endDate": "2024-12-31", "branch": "b" }
                ]
            }"#,
        )
        .unwrap();
        let store = LedgerStore::new(config, LedgerLocation::resolve(LedgerMode::InRepo, &ws, &repo));
        let git = GitCli::new("https://github.com/acme/acme.git", &ws)
            .with_carried_paths(store.location().repo_relative().map(String::from));
        let analyzer = FakeAnalyzer::with_files(&["public/hero.png"], &[]);
        let (images, text) = (FakeTheme::default(), FakeTheme::default());
        let caps = ProcessCapabilities {
            analyzer: &analyzer,
            images: &images,
            text: &text,
            vcs: &git,
        };

        let report = run_process(&store, &repo, &caps, &ProcessOptions::default(), december()).unwrap();
        assert_eq!(report.events.len(), 2);
        for e in &report.events {
            assert!(
                matches!(e.outcome, EventOutcome::Committed { files: 1, .. }),
                "{}: {:?}",
                e.event_id,
                e.outcome
            );
        }

        let lock = store.load().unwrap();
        for id in ["a", "b"] {
            let p = &lock.event(id).unwrap().progress;
            assert_eq!(p.status, EventStatus::Completed, "{id}");
            assert!(p.commit_sha.is_some(), "{id}");
        }
        // Each branch themed the untouched original from main.
        git_in(&repo, &["cat-file", "-e", "ev/a:frontend/public/hero.original.png"]);
        git_in(&repo, &["cat-file", "-e", "ev/b:frontend/public/hero.original.png"]);
        git_in(&repo, &["cat-file", "-e", "ev/b:doodlify.lock.json"]);
        assert_eq!(std::fs::read_to_string(&hero).unwrap(), "Bells:png");
    }

    #[test]
    fn in_repo_ledger_is_committed_and_never_stashed() {
        let fx = Fixture::with_mode(LedgerMode::InRepo);
        fx.write("frontend/public/a.png", "a");
        let h = Harness::new(FakeAnalyzer::with_files(&["public/a.png"], &[]));
        h.run(&fx, &christmas());

        assert_eq!(h.vcs.stash_excludes.borrow()[0], vec!["doodlify.lock.json"]);
        let commits = h.vcs.commits.borrow();
        assert_eq!(commits[0].1.last().map(String::as_str), Some("doodlify.lock.json"));
        assert!(commits[0].0.starts_with("feat: Apply Christmas theme customizations"));
    }
}
