use anyhow::Result;
use doodlify_core::{Error, ProgressPatch};
use doodlify_ledger::LedgerStore;

use crate::capability::{CodeHost, PullRequestRequest, VersionControl};
use crate::runner::message::{pr_body, pr_title};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedEvent {
    pub event_id: String,
    pub branch: String,
    pub pr_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct PushReport {
    pub pushed: Vec<PushedEvent>,
    /// Processed events with no commit to publish.
    pub skipped: Vec<String>,
}

/// Publish every processed-but-unpushed event: push its branch, open its PR.
///
/// Fail-fast: the first failure is recorded on that event and aborts the phase.
pub fn run_push(store: &LedgerStore, vcs: &dyn VersionControl, host: &dyn CodeHost) -> Result<PushReport> {
    let lock = store.load()?;
    let config = store.config();
    let pending: Vec<_> = lock.unpushed_events().cloned().collect();

    let mut report = PushReport::default();
    if pending.is_empty() {
        println!("No events to push.");
        return Ok(report);
    }
    println!("Pushing {} event(s)", pending.len());

    for event in pending {
        let id = event.id().to_string();
        if event.progress.commit_sha.is_none() {
            println!("  ⊘ \"{id}\": nothing committed, skipping");
            report.skipped.push(id);
            continue;
        }
        let branch = config.branch_name(&event.event);
        println!("\n▶ Pushing \"{}\" on {branch}", event.event.name);

        let title = pr_title(&event.event);
        let body = pr_body(&event);
        let published = vcs.push_branch(&branch).and_then(|()| {
            host.create_pull_request(&PullRequestRequest {
                title: &title,
                body: &body,
                head: &branch,
                base: config.base_branch(),
            })
        });
        match published {
            Ok(pr) => {
                store.update_progress(
                    &id,
                    ProgressPatch {
                        pushed: Some(true),
                        pr_created: Some(true),
                        pr_url: Some(Some(pr.url.clone())),
                        error: Some(None),
                        ..Default::default()
                    },
                )?;
                println!("  ✓ Pull request #{}: {}", pr.number, pr.url);
                report.pushed.push(PushedEvent {
                    event_id: id,
                    branch,
                    pr_url: pr.url,
                });
            }
            Err(e) => {
                let message = format!("{e:#}");
                println!("  ✗ {message}");
                store.update_progress(&id, ProgressPatch::default().with_error(format!("push failed: {message}")))?;
                return Err(Error::Push {
                    event_id: id,
                    message,
                }
                .into());
            }
        }
    }
    Ok(report)
}
