use stitch_core::model::{Entry, Group, Pattern, PatternId, Stitch, StitchId, TrackingStatus};
use stitch_core::time::fixed_now;
use stitch_core::GroupStatus;
use services::{Clock, TrackingLoopService};
use storage::repository::Storage;

fn granny_square() -> Pattern {
    let ch = StitchId::new(1);
    let dc = StitchId::new(2);
    Pattern::new(
        PatternId::new(1),
        "Granny square",
        vec![
            Group::new("Foundation", 1, vec![Entry::new(ch, 4, 1).unwrap()]).unwrap(),
            Group::new("Join with sl st", 1, Vec::new()).unwrap(),
            Group::new(
                "Rnd 1",
                4,
                vec![Entry::new(dc, 3, 1).unwrap(), Entry::new(ch, 2, 1).unwrap()],
            )
            .unwrap(),
        ],
    )
    .with_stitches([
        Stitch::new(ch, "ch", "chain").unwrap(),
        Stitch::new(dc, "dc", "double crochet").unwrap(),
    ])
}

#[tokio::test]
async fn tracking_loop_walks_pattern_to_completion_and_back() {
    let storage = Storage::in_memory();
    let pattern = granny_square();
    let total = pattern.total_units();
    assert_eq!(total, 4 + 4 * 5);
    storage.patterns.upsert_pattern(&pattern).await.unwrap();

    let service = TrackingLoopService::new(
        Clock::fixed(fixed_now()),
        storage.patterns.clone(),
        storage.trackings.clone(),
    );
    let session = service.start_tracking(pattern.id()).await.unwrap();

    let mut steps: u64 = 0;
    loop {
        let outcome = service.step_forward(session.id()).await.unwrap();
        steps += 1;
        let progress = outcome.progress.unwrap();
        assert_eq!(progress.completed_units, steps);
        if outcome.is_complete {
            assert_eq!(outcome.status, TrackingStatus::Completed);
            assert!((progress.percentage - 100.0).abs() < f64::EPSILON);
            break;
        }
    }
    assert_eq!(steps, total);

    let stored = service.get_tracking(session.id()).await.unwrap();
    assert_eq!(stored.completed_at(), Some(fixed_now()));

    let back = service.step_backward(session.id()).await.unwrap();
    assert_eq!(back.status, TrackingStatus::Active);
    let progress = back.progress.unwrap();
    let current = progress.current.unwrap();
    assert_eq!(current.label.as_deref(), Some("ch"));
    assert_eq!(current.group_repeat, 4);
    assert_eq!(progress.groups[2].status, GroupStatus::Current);
    assert_eq!(progress.groups[2].current_repeat, Some(4));
}

#[tokio::test]
async fn step_outcome_serializes_for_ui() {
    let storage = Storage::in_memory();
    storage.patterns.upsert_pattern(&granny_square()).await.unwrap();
    let service = TrackingLoopService::new(
        Clock::fixed(fixed_now()),
        storage.patterns.clone(),
        storage.trackings.clone(),
    );
    let session = service.start_tracking(PatternId::new(1)).await.unwrap();

    let outcome = service.step_forward(session.id()).await.unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "active");
    assert_eq!(json["progress"]["completed_units"], 1);
    assert_eq!(json["progress"]["current"]["label"], "ch");
    assert_eq!(json["progress"]["groups"][0]["status"], "current");
}

#[tokio::test]
async fn pause_resume_keeps_cursor() {
    let storage = Storage::in_memory();
    storage.patterns.upsert_pattern(&granny_square()).await.unwrap();
    let service = TrackingLoopService::new(
        Clock::fixed(fixed_now()),
        storage.patterns.clone(),
        storage.trackings.clone(),
    )
    .with_progress_on_step(false);
    let session = service.start_tracking(PatternId::new(1)).await.unwrap();

    let outcome = service.step_forward(session.id()).await.unwrap();
    assert!(outcome.progress.is_none());

    let paused = service.pause(session.id()).await.unwrap();
    assert_eq!(paused.status(), TrackingStatus::Paused);
    let resumed = service.resume(session.id()).await.unwrap();
    assert_eq!(resumed.status(), TrackingStatus::Active);
    assert_eq!(resumed.position().unit_count, 1);
}
