use doodlify_core::{ConfigLock, Error, EventStatus, ProgressPatch, Result};
use doodlify_ledger::LedgerStore;

// ── Valid transitions ──

const VALID_TRANSITIONS: &[(EventStatus, &[EventStatus])] = &[
    (
        EventStatus::Pending,
        &[EventStatus::Analyzing, EventStatus::Processing],
    ),
    (
        EventStatus::Analyzing,
        &[
            EventStatus::Pending,
            EventStatus::Processing,
            EventStatus::Failed,
        ],
    ),
    (
        EventStatus::Processing,
        &[
            EventStatus::Processing, // resume after a crash
            EventStatus::Completed,
            EventStatus::Failed,
        ],
    ),
    (
        EventStatus::Completed,
        &[EventStatus::Processing, EventStatus::Pending], // explicit reprocess
    ),
    (
        EventStatus::Failed,
        &[
            EventStatus::Processing,
            EventStatus::Analyzing,
            EventStatus::Pending,
        ],
    ),
];

pub fn is_valid_transition(from: EventStatus, to: EventStatus) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

// ── Persisted transition ──

/// Move an event to `to`, applying `patch` in the same ledger write.
pub fn transition(
    store: &LedgerStore,
    event_id: &str,
    to: EventStatus,
    patch: ProgressPatch,
) -> Result<ConfigLock> {
    store.update_event(event_id, |event| {
        let from = event.progress.status;
        if !is_valid_transition(from, to) {
            return Err(Error::InvalidTransition {
                event_id: event_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        ProgressPatch {
            status: Some(to),
            ..patch
        }
        .apply(event);
        Ok(())
    })
}
