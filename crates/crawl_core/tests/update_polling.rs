use std::sync::Once;

use crawl_core::{
    update, AppState, Effect, JobId, JobState, JobStatus, Msg, Phase, JOB_FAILED_MESSAGE,
    POLL_TIMEOUT_MESSAGE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn job() -> JobId {
    JobId::new("abc123")
}

/// Drives a fresh state through submission until it is polling `abc123`.
fn polling_state() -> AppState {
    let (state, _) = update(AppState::new(), Msg::UrlChanged("http://example.com".into()));
    let (state, _) = update(state, Msg::DepthChanged("2".into()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::SubmitAccepted {
            ticket: 1,
            job_id: job(),
        },
    );
    state
}

fn tick(state: AppState) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::PollTick { job_id: job() });
    match &effects[..] {
        [Effect::FetchStatus { job_id, seq }] => {
            assert_eq!(job_id, &job());
            (state, *seq)
        }
        other => panic!("unexpected effects: {other:?}"),
    }
}

fn in_progress(progress: i64, downloaded: u64, total: u64) -> JobStatus {
    JobStatus {
        status: JobState::InProgress,
        progress,
        pages_downloaded: downloaded,
        total_pages: Some(total),
        ..JobStatus::default()
    }
}

fn completed() -> JobStatus {
    JobStatus {
        status: JobState::Completed,
        progress: 100,
        pages_downloaded: 10,
        total_pages: Some(10),
        ..JobStatus::default()
    }
}

fn receive(state: AppState, seq: u64, status: JobStatus) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            job_id: job(),
            seq,
            status,
        },
    )
}

#[test]
fn ticks_issue_increasing_sequence_numbers() {
    init_logging();
    let state = polling_state();
    let (state, first) = tick(state);
    let (state, second) = tick(state);
    let (_state, third) = tick(state);

    assert_eq!((first, second, third), (1, 2, 3));
}

#[test]
fn progress_then_completion_scenario() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let (state, effects) = receive(state, seq, in_progress(10, 1, 10));
    assert!(effects.is_empty());

    let view = state.view();
    let progress = view.progress.expect("progress rendered");
    assert_eq!(view.phase, Phase::Polling);
    assert_eq!(progress.progress_percent, 10);
    assert_eq!(progress.activity_line.as_deref(), Some("Downloading... (1/10)"));
    assert!(!view.can_export);

    let (state, seq) = tick(state);
    let (state, effects) = receive(state, seq, completed());
    assert_eq!(effects, vec![Effect::StopPolling]);

    let view = state.view();
    assert_eq!(view.phase, Phase::Completed);
    assert!(view.can_export);
    assert!(view.can_export_document);
    assert!(!state.is_polling());
}

#[test]
fn failed_scenario_shows_single_error_and_keeps_exports_locked() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let failed = JobStatus {
        status: JobState::Failed,
        errors: vec!["timeout fetching http://x".to_string()],
        ..JobStatus::default()
    };
    let (state, effects) = receive(state, seq, failed);

    assert_eq!(effects, vec![Effect::StopPolling]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.failure_message.as_deref(), Some(JOB_FAILED_MESSAGE));
    assert_eq!(view.cancel_label, "Back");
    assert_eq!(
        view.progress.unwrap().errors,
        vec!["timeout fetching http://x".to_string()]
    );
    assert!(!view.can_export);

    let (_state, effects) = update(state, Msg::ArchiveExportClicked);
    assert!(effects.is_empty());
}

#[test]
fn terminal_snapshot_stops_polling_exactly_once() {
    init_logging();
    let (state, first) = tick(polling_state());
    let (state, second) = tick(state);

    let (state, effects) = receive(state, second, completed());
    assert_eq!(effects, vec![Effect::StopPolling]);

    // Same terminal payload delivered again, and an older one arriving late.
    let (state, effects) = receive(state, second, completed());
    assert!(effects.is_empty());
    let (state, effects) = receive(state, first, completed());
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Completed);

    // A timer tick racing with the stop does not issue new fetches.
    let (_state, effects) = update(state, Msg::PollTick { job_id: job() });
    assert!(effects.is_empty());
}

#[test]
fn out_of_order_replies_keep_highest_sequence() {
    init_logging();
    let (state, first) = tick(polling_state());
    let (state, second) = tick(state);

    let (state, _) = receive(state, second, in_progress(40, 4, 10));
    let (state, _) = receive(state, first, in_progress(10, 1, 10));

    assert_eq!(state.applied_seq(), second);
    assert_eq!(state.view().progress.unwrap().progress_percent, 40);
}

#[test]
fn regressed_but_newer_snapshot_is_accepted() {
    init_logging();
    let (state, first) = tick(polling_state());
    let (state, second) = tick(state);

    let (state, _) = receive(state, first, in_progress(60, 6, 10));
    let (state, _) = receive(state, second, in_progress(30, 3, 10));

    assert_eq!(state.view().progress.unwrap().progress_percent, 30);
}

#[test]
fn errors_are_replaced_not_accumulated() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let mut with_errors = in_progress(10, 1, 10);
    with_errors.errors = vec!["a".into(), "b".into()];
    let (state, _) = receive(state, seq, with_errors);

    let (state, seq) = tick(state);
    let mut fewer = in_progress(20, 2, 10);
    fewer.errors = vec!["c".into()];
    let (state, _) = receive(state, seq, fewer);
    assert_eq!(state.view().progress.unwrap().errors, vec!["c".to_string()]);

    let (state, seq) = tick(state);
    let (state, _) = receive(state, seq, in_progress(30, 3, 10));
    assert!(state.view().progress.unwrap().errors.is_empty());
}

#[test]
fn per_page_errors_do_not_fail_the_job() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let mut status = in_progress(50, 5, 10);
    status.errors = vec!["404 http://x/missing".into()];
    let (state, effects) = receive(state, seq, status);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Polling);
    assert!(state.is_polling());
}

#[test]
fn replies_for_other_jobs_are_ignored() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let (state, effects) = update(
        state,
        Msg::StatusReceived {
            job_id: JobId::new("someone-else"),
            seq,
            status: completed(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Polling);
    assert!(state.snapshot().is_none());
}

#[test]
fn deadline_fails_the_job_and_stops_polling() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let (state, effects) = update(state, Msg::PollDeadlineExceeded { job_id: job() });

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(
        state.view().failure_message.as_deref(),
        Some(POLL_TIMEOUT_MESSAGE)
    );

    // The reply that was in flight lands after the deadline and is dropped.
    let (state, effects) = receive(state, seq, completed());
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Failed);
}

#[test]
fn cancel_while_polling_stops_and_clears_job() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let (state, effects) = update(state, Msg::CancelClicked);

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.job_id(), None);
    assert_eq!(state.form().url, "");

    let (state, effects) = receive(state, seq, in_progress(10, 1, 10));
    assert!(effects.is_empty());
    assert!(state.snapshot().is_none());
}

#[test]
fn back_from_failed_does_not_stop_twice() {
    init_logging();
    let (state, seq) = tick(polling_state());
    let failed = JobStatus {
        status: JobState::Failed,
        ..JobStatus::default()
    };
    let (state, _) = receive(state, seq, failed);
    let (state, effects) = update(state, Msg::CancelClicked);

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn reset_is_idempotent_from_idle() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ResetClicked);
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::ResetClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}
