use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use doodlify_core::{active_events, ConfigLock};
use jiff::Timestamp;

use crate::env::Settings;
use crate::session::Session;

/// Execute `doodlify status`
pub fn execute(config_path: &Path, json: bool) -> Result<()> {
    let session = Session::offline(config_path, &Settings::from_env())?;
    let lock = session.store.load()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&lock)?);
    } else {
        print!("{}", render(&lock, Timestamp::now()));
    }
    Ok(())
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "✓"
    } else {
        "✗"
    }
}

pub(crate) fn render(lock: &ConfigLock, now: Timestamp) -> String {
    let active: Vec<&str> = active_events(lock, now).into_iter().map(|e| e.id()).collect();
    let mut out = String::new();
    let _ = writeln!(out, "Project: {}", lock.project.name);
    let _ = writeln!(out, "Active events: {}", active.len());
    for event in &lock.events {
        let p = &event.progress;
        let dot = if active.contains(&event.id()) { "●" } else { "○" };
        let _ = writeln!(out, "\n{dot} {} ({})", event.event.name, event.id());
        let _ = writeln!(out, "  Period:    {} to {}", event.event.start_date, event.event.end_date);
        let _ = writeln!(out, "  Status:    {}", p.status);
        let _ = writeln!(
            out,
            "  Analyzed {}  Processed {}  Pushed {}",
            mark(p.analyzed),
            mark(p.processed),
            mark(p.pushed)
        );
        let live = p.live_modified_files().count();
        if live > 0 {
            let _ = writeln!(out, "  Files:     {live} modified");
        }
        if let Some(url) = &p.pr_url {
            let _ = writeln!(out, "  PR:        {url}");
        }
        if let Some(err) = &p.error {
            let _ = writeln!(out, "  Error:     {err}");
        }
        for note in &p.notes {
            let _ = writeln!(out, "  Note:      {note}");
        }
    }
    if !lock.reported_suggestions.is_empty() {
        let _ = writeln!(out, "\nReported suggestions: {}", lock.reported_suggestions.len());
    }
    out
}
