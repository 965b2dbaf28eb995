use baloto::{
    DrawPeriod, FixedClock, GuardState, HistoryStore, PickController, SaveOutcome, SqliteStore,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

#[tokio::test]
async fn test_first_pick_of_period_a() {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap(),
    ));
    let store = SqliteStore::open_in_memory().unwrap().with_clock(clock.clone());
    let mut controller = PickController::new(store, clock.clone());

    assert_eq!(
        controller.mount().await.unwrap(),
        GuardState::CheckedUnsaved(DrawPeriod::PeriodA)
    );

    let numbers = controller.generate();
    assert!(matches!(controller.save().await.unwrap(), SaveOutcome::Saved(_)));
    assert_eq!(controller.state(), GuardState::Saved(DrawPeriod::PeriodA));

    let history = controller.store().list().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].period, DrawPeriod::PeriodA);
    assert_eq!(history[0].numbers, numbers);
}

#[tokio::test]
async fn test_saved_pick_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("baloto.db");
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 12, 7, 30, 0).unwrap(),
    ));

    {
        let store = SqliteStore::open(&path).unwrap().with_clock(clock.clone());
        let mut controller = PickController::new(store, clock.clone());
        controller.mount().await.unwrap();
        controller.generate();
        controller.save().await.unwrap();
    }

    // Later the same period, a fresh instance finds the pick already saved.
    clock.advance(Duration::hours(30));
    let store = SqliteStore::open(&path).unwrap().with_clock(clock.clone());
    let mut controller = PickController::new(store, clock.clone());
    assert_eq!(
        controller.mount().await.unwrap(),
        GuardState::Saved(DrawPeriod::PeriodB)
    );
    assert_eq!(controller.history().len(), 1);

    controller.generate();
    assert_eq!(controller.save().await.unwrap(), SaveOutcome::AlreadySaved);
    assert!(!controller.snapshot().can_save);
}
