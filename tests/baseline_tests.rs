mod test_harness;

use exam_marker::config::Variant;
use exam_marker::store::{FsRubricStore, RubricStore};
use test_harness::{run_bounded, Fixture, RUBRIC_A_TO_E, SENTINEL};

/// Without locks, hurried TAs trip over each other but still reach the
/// termination exam.
#[tokio::test(start_paused = true)]
async fn test_unsynchronized_run_exhibits_races() {
    let fixture = Fixture::new(RUBRIC_A_TO_E);
    fixture.write_sequence(&[1, 2, 3, 4, 5]);

    let mut anomalies = 0;
    for seed in 0..5 {
        let summary = run_bounded(fixture.unsync_config(8, 5).with_seed(seed)).await;

        assert_eq!(summary.variant, Variant::Unsynchronized);
        assert!(summary.state.stopped, "seed {seed}");
        assert_eq!(summary.state.student, SENTINEL, "seed {seed}");
        assert!(summary.events.is_empty());
        assert!(summary.summary_line().starts_with("All TAs finished (unsynchronized)"));

        anomalies += summary.metrics.double_claims
            + summary.metrics.lost_updates
            + summary.metrics.lost_transitions;
    }
    assert!(anomalies > 0, "no race observed in any run");
}

#[tokio::test(start_paused = true)]
async fn test_unsynchronized_run_tolerates_missing_exams() {
    let fixture = Fixture::new(RUBRIC_A_TO_E);
    // Exams 2 and 3 are missing; the index keeps moving until the sentinel.
    fixture.write_exam(1, 7);
    fixture.write_exam(9999, SENTINEL);

    let summary = run_bounded(fixture.unsync_config(3, 3).with_seed(4)).await;

    assert!(summary.state.stopped);
    assert_eq!(summary.state.student, SENTINEL);
    assert!(summary.state.exam_index >= 3);
    assert!(summary.metrics.transitions >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_unsynchronized_run_marks_unreadable_exam_as_student_zero() {
    let fixture = Fixture::new(RUBRIC_A_TO_E);
    fixture.write_sequence(&[42, 0, 44]);
    fixture.write_exam_body(2, "abc\n");

    let summary = run_bounded(fixture.unsync_config(3, 3).with_seed(1)).await;

    assert!(summary.state.stopped);
    assert_eq!(summary.state.student, SENTINEL);
    assert!(summary.state.exam_index >= 3);
}

#[tokio::test(start_paused = true)]
async fn test_unsynchronized_rubric_is_still_persisted() {
    let fixture = Fixture::new(RUBRIC_A_TO_E);
    fixture.write_sequence(&[1, 2]);

    let summary = run_bounded(fixture.unsync_config(2, 2).with_seed(8)).await;

    if summary.metrics.corrections > 0 {
        let reloaded = FsRubricStore::new(fixture.rubric_path(), 5).load().unwrap();
        assert_eq!(reloaded.len(), 5);
        assert!(reloaded
            .as_bytes()
            .iter()
            .all(|a| (b' '..=b'~').contains(a)));
    }
}
