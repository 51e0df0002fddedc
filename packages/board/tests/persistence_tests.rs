#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;

use board::{
    BAY_COLUMNS, BlockDuration, BoardStore, Clock, JobSpec, ManualClock, ViewQuery, Workshop,
    project, to_csv,
};
use board_core::{Booking, JobStatus, ResourceKind, ResourceStatus};
use chrono::Duration;
use storage::{Storage, StorageConfig};

use common::{assert_consistent, rid, shared};

fn fs_store(dir: &tempfile::TempDir) -> Result<BoardStore, Box<dyn Error>> {
    let storage = Storage::new(StorageConfig::filesystem(dir.path()).with_prefix("shop-a"))?;
    Ok(BoardStore::new(storage))
}

#[tokio::test]
async fn seeded_board_survives_a_restart() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let clock = ManualClock::default();

    // First run: nothing stored, defaults are generated and written.
    let store = fs_store(&dir)?;
    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    assert!(dir.path().join("shop-a").join("bays.json").exists());
    assert!(dir.path().join("shop-a").join("jobs.json").exists());

    let mut board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    let job = board.jobs().pending().next().map(|j| j.id).ok_or("no sample job")?;
    board.assign(job, &rid("BAY-01"))?;
    board.update_progress(job, 60)?;
    board.block(&rid("BAY-02"), "lift inspection", BlockDuration::hours(4)?, None)?;
    let start = clock.now() + Duration::days(1);
    board.add_booking(Booking::new(rid("BAY-03"), "Lisa Davis", start, start + Duration::hours(2)))?;
    store.save(&board.snapshot()).await?;

    // Second run: a fresh store over the same directory sees the same board.
    let store = fs_store(&dir)?;
    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let mut restored = Workshop::from_snapshot(snapshot, shared(&clock))?;
    assert_consistent(&restored);
    assert_eq!(restored.snapshot(), board.snapshot());

    let running = restored.job(job).ok_or("job lost")?;
    assert!(matches!(running.status, JobStatus::InProgress { progress: 60, .. }));
    assert_eq!(restored.bookings().len(), 1);

    // The block's timer came back with the data.
    clock.advance(Duration::hours(4));
    assert_eq!(restored.tick(), vec![rid("BAY-02")]);
    Ok(())
}

#[tokio::test]
async fn deleting_a_bay_prunes_its_stored_bookings() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let clock = ManualClock::default();
    let store = fs_store(&dir)?;

    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let mut board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    let start = clock.now();
    board.add_booking(Booking::new(rid("BAY-05"), "Mike Brown", start, start + Duration::hours(1)))?;
    board.delete_resource(&rid("BAY-05"))?;
    store.save(&board.snapshot()).await?;

    let reloaded = store.load(ResourceKind::Bay, true, clock.now()).await?;
    assert!(reloaded.bookings.is_empty());
    assert!(reloaded.resources.iter().all(|r| r.id != rid("BAY-05")));
    Ok(())
}

#[tokio::test]
async fn corrupt_job_list_frees_occupied_bays() -> Result<(), Box<dyn Error>> {
    let clock = ManualClock::default();
    let store = BoardStore::new(Storage::new(StorageConfig::memory())?);
    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let mut board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    let job = board.jobs().pending().next().map(|j| j.id).ok_or("no sample job")?;
    board.assign(job, &rid("BAY-01"))?;
    store.save(&board.snapshot()).await?;

    store.storage().put_json("jobs.json", "garbage").await?;

    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    assert_consistent(&board);
    assert_eq!(board.resource(&rid("BAY-01")).map(|r| r.status()), Some(ResourceStatus::Available));
    assert!(board.jobs().live().is_empty());

    // The repair was written back, so the next run loads cleanly too.
    let again = store.load(ResourceKind::Bay, true, clock.now()).await?;
    assert_eq!(again, board.snapshot());
    Ok(())
}

#[tokio::test]
async fn regenerated_layout_sends_running_jobs_back_to_pending() -> Result<(), Box<dyn Error>> {
    let clock = ManualClock::default();
    let store = BoardStore::new(Storage::new(StorageConfig::memory())?);
    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let mut board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    let job = board.jobs().pending().next().map(|j| j.id).ok_or("no sample job")?;
    board.assign(job, &rid("BAY-07"))?;
    store.save(&board.snapshot()).await?;

    store.storage().put_json("bays.json", &42).await?;

    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    assert_consistent(&board);
    assert!(matches!(board.job(job).map(|j| &j.status), Some(JobStatus::Pending)));
    assert_eq!(board.stats().occupied, 0);
    Ok(())
}

#[tokio::test]
async fn empty_board_when_seeding_is_off() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let clock = ManualClock::default();
    let store = fs_store(&dir)?;

    let snapshot = store.load(ResourceKind::Bin, false, clock.now()).await?;
    let board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    assert!(board.resources().is_empty());
    assert_eq!(board.stats().utilization(), None);
    assert!(!dir.path().join("shop-a").join("bins.json").exists());
    Ok(())
}

#[tokio::test]
async fn export_of_a_filtered_page() -> Result<(), Box<dyn Error>> {
    let clock = ManualClock::default();
    let store = BoardStore::new(Storage::new(StorageConfig::memory())?);
    let snapshot = store.load(ResourceKind::Bay, true, clock.now()).await?;
    let mut board = Workshop::from_snapshot(snapshot, shared(&clock))?;
    let job = board.create_job(JobSpec::new("Wheel Alignment", "Sarah Johnson", 1.0).with_subject("BMW X5"))?;
    board.assign(job.id, &rid("BAY-11"))?;

    let resources = board.resources();
    let view = project(
        &resources,
        &ViewQuery::new()
            .filter("zone", board::Filter::exact("alignment"))
            .filter("status", board::Filter::exact(ResourceStatus::Occupied.as_str())),
    );
    assert_eq!(view.total_count, 1);

    let csv = to_csv(view.items.iter().copied(), BAY_COLUMNS);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Bay,Name,Zone,Type,Status,Capacity (t),Equipment,Current Job,Block Reason,Blocked Until")
    );
    assert_eq!(
        lines.next(),
        Some("BAY-11,Alignment 1,alignment,alignment,occupied,8,Alignment Rack,BMW X5 - Wheel Alignment,,")
    );
    assert_eq!(lines.next(), None);
    Ok(())
}
