//! Job lifecycle: pending → in-progress → on-hold / completed / cancelled.
//!
//! Every operation that touches a resource takes the registry by `&mut` and
//! runs all of its checks before writing anything, so a failed call leaves
//! both the job and the resource exactly as they were.

use board_core::{BoardEvent, BoardStats, Job, JobId, JobStatus, Occupant, Priority, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::error::{BoardError, Result};
use crate::registry::ResourceRegistry;

const MIN_TEXT_LEN: usize = 2;
const MIN_HOURS: f64 = 0.5;
const MAX_HOURS: f64 = 24.0;

/// Input for [`JobLifecycle::create`].
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    pub title: String,
    pub customer: String,
    pub subject: String,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub tags: Vec<String>,
}

impl JobSpec {
    pub fn new(title: impl Into<String>, customer: impl Into<String>, estimated_hours: f64) -> Self {
        Self {
            title: title.into(),
            customer: customer.into(),
            estimated_hours,
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().chars().count() < MIN_TEXT_LEN {
            return Err(BoardError::validation("title must be at least 2 characters"));
        }
        if self.customer.trim().chars().count() < MIN_TEXT_LEN {
            return Err(BoardError::validation(
                "customer must be at least 2 characters",
            ));
        }
        if !(MIN_HOURS..=MAX_HOURS).contains(&self.estimated_hours) {
            return Err(BoardError::validation(format!(
                "estimated hours must be between {MIN_HOURS} and {MAX_HOURS}"
            )));
        }
        Ok(())
    }
}

/// The four job collections as they are persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBook {
    /// Pending and in-progress jobs.
    pub jobs: Vec<Job>,
    pub held: Vec<Job>,
    pub completed: Vec<Job>,
    pub cancelled: Vec<Job>,
}

/// Fields of an in-progress job, copied out before it is moved.
struct Running {
    index: usize,
    resource_id: ResourceId,
    started_at: DateTime<Utc>,
    progress: u8,
}

/// Fields of a held job.
struct Parked {
    index: usize,
    started_at: DateTime<Utc>,
    held_at: DateTime<Utc>,
    progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shelf {
    Live,
    Held,
    Completed,
    Cancelled,
}

/// Owns every job of a board, split into live, held and history collections.
pub struct JobLifecycle {
    book: JobBook,
    clock: SharedClock,
    events: Vec<BoardEvent>,
}

impl std::fmt::Debug for JobLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobLifecycle")
            .field("jobs", &self.book.jobs.len())
            .field("held", &self.book.held.len())
            .field("completed", &self.book.completed.len())
            .field("cancelled", &self.book.cancelled.len())
            .finish()
    }
}

impl JobLifecycle {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            book: JobBook::default(),
            clock,
            events: Vec::new(),
        }
    }

    /// Rebuild from persisted collections, checking each job sits in the
    /// collection its status belongs to.
    pub fn restore(book: JobBook, clock: SharedClock) -> Result<Self> {
        let misplaced = |jobs: &[Job], ok: fn(&JobStatus) -> bool, name: &str| {
            match jobs.iter().find(|job| !ok(&job.status)) {
                Some(job) => Err(BoardError::validation(format!(
                    "job {} is {} but stored with {name} jobs",
                    job.id,
                    job.status.as_str()
                ))),
                None => Ok(()),
            }
        };
        misplaced(
            &book.jobs,
            |s| matches!(s, JobStatus::Pending | JobStatus::InProgress { .. }),
            "live",
        )?;
        misplaced(&book.held, |s| matches!(s, JobStatus::OnHold { .. }), "held")?;
        misplaced(
            &book.completed,
            |s| matches!(s, JobStatus::Completed { .. }),
            "completed",
        )?;
        misplaced(
            &book.cancelled,
            |s| matches!(s, JobStatus::Cancelled { .. }),
            "cancelled",
        )?;

        Ok(Self {
            book,
            clock,
            events: Vec::new(),
        })
    }

    pub fn book(&self) -> &JobBook {
        &self.book
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Queue a new pending job.
    pub fn create(&mut self, spec: JobSpec) -> Result<Job> {
        spec.validate()?;
        let now = self.now();
        let job = Job {
            id: JobId::new(),
            title: spec.title.trim().to_string(),
            customer: spec.customer.trim().to_string(),
            subject: spec.subject.trim().to_string(),
            priority: spec.priority,
            estimated_hours: spec.estimated_hours,
            tags: spec.tags,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.book.jobs.push(job.clone());
        self.record(BoardEvent::JobCreated {
            job_id: job.id,
            title: job.title.clone(),
            timestamp: now,
        });
        Ok(job)
    }

    /// Look a job up in any collection.
    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.locate(id).map(|(shelf, index)| &self.shelf(shelf)[index])
    }

    pub fn pending(&self) -> impl Iterator<Item = &Job> {
        self.book
            .jobs
            .iter()
            .filter(|job| matches!(job.status, JobStatus::Pending))
    }

    pub fn in_progress(&self) -> impl Iterator<Item = &Job> {
        self.book
            .jobs
            .iter()
            .filter(|job| matches!(job.status, JobStatus::InProgress { .. }))
    }

    pub fn live(&self) -> &[Job] {
        &self.book.jobs
    }

    pub fn held(&self) -> &[Job] {
        &self.book.held
    }

    pub fn completed(&self) -> &[Job] {
        &self.book.completed
    }

    pub fn cancelled(&self) -> &[Job] {
        &self.book.cancelled
    }

    /// The in-progress job occupying `resource_id`, if any.
    pub fn job_at(&self, resource_id: &ResourceId) -> Option<&Job> {
        self.in_progress()
            .find(|job| job.assigned_resource_id() == Some(resource_id))
    }

    /// Start a pending job on an available resource.
    pub fn assign(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        resource_id: &ResourceId,
    ) -> Result<()> {
        let index = self.pending_index(job_id)?;
        registry.ensure_available(resource_id)?;

        let now = self.now();
        let job = &mut self.book.jobs[index];
        job.status = JobStatus::InProgress {
            resource_id: resource_id.clone(),
            started_at: now,
            resumed_at: None,
            progress: 0,
        };
        job.updated_at = now;
        let occupant = occupant_for(job, now);
        registry.occupy(resource_id, occupant);

        self.record(BoardEvent::JobAssigned {
            job_id,
            resource_id: resource_id.clone(),
            timestamp: now,
        });
        Ok(())
    }

    /// Report progress for a running job. Progress never goes backwards.
    pub fn update_progress(&mut self, job_id: JobId, percent: u8) -> Result<()> {
        let running = self.running(job_id)?;
        if percent > 100 {
            return Err(BoardError::validation("progress must be between 0 and 100"));
        }
        if percent < running.progress {
            return Err(BoardError::validation(format!(
                "progress cannot drop from {}% to {percent}%",
                running.progress
            )));
        }

        let now = self.now();
        let job = &mut self.book.jobs[running.index];
        if let JobStatus::InProgress { progress, .. } = &mut job.status {
            *progress = percent;
        }
        job.updated_at = now;

        self.record(BoardEvent::JobProgressed {
            job_id,
            progress: percent,
            timestamp: now,
        });
        Ok(())
    }

    /// Park a running job and free its resource.
    pub fn hold(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        reason: impl Into<String>,
    ) -> Result<()> {
        self.hold_with_notes(registry, job_id, reason, None)
    }

    pub fn hold_with_notes(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<()> {
        let Running {
            index,
            resource_id,
            started_at,
            progress,
        } = self.running(job_id)?;
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(BoardError::validation("hold reason must not be empty"));
        }

        let now = self.now();
        let mut job = self.book.jobs.remove(index);
        registry.vacate(&resource_id);
        job.status = JobStatus::OnHold {
            started_at,
            held_at: now,
            reason: reason.clone(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            original_resource_id: resource_id.clone(),
            progress,
        };
        job.updated_at = now;
        self.book.held.push(job);

        self.record(BoardEvent::JobHeld {
            job_id,
            resource_id,
            reason,
            timestamp: now,
        });
        Ok(())
    }

    /// Put a held job back onto an available resource.
    ///
    /// The original start time is kept so elapsed-time displays stay honest.
    pub fn resume(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        resource_id: &ResourceId,
    ) -> Result<()> {
        let Parked {
            index,
            started_at,
            progress,
            ..
        } = self.parked(job_id)?;
        registry.ensure_available(resource_id)?;

        let now = self.now();
        let mut job = self.book.held.remove(index);
        job.status = JobStatus::InProgress {
            resource_id: resource_id.clone(),
            started_at,
            resumed_at: Some(now),
            progress,
        };
        job.updated_at = now;
        registry.occupy(resource_id, occupant_for(&job, started_at));
        self.book.jobs.push(job);

        self.record(BoardEvent::JobResumed {
            job_id,
            resource_id: resource_id.clone(),
            timestamp: now,
        });
        Ok(())
    }

    /// Finish a running job, free its resource and file it under completed.
    pub fn complete(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        notes: Option<String>,
    ) -> Result<Job> {
        let Running {
            index,
            resource_id,
            started_at,
            ..
        } = self.running(job_id)?;

        let now = self.now();
        let mut job = self.book.jobs.remove(index);
        registry.vacate(&resource_id);
        let duration_ms = (now - started_at).num_milliseconds().max(0) as u64;
        job.status = JobStatus::Completed {
            started_at,
            completed_at: now,
            resource_id: resource_id.clone(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        };
        job.updated_at = now;
        self.book.completed.push(job.clone());

        self.record(BoardEvent::JobCompleted {
            job_id,
            resource_id,
            duration_ms,
            timestamp: now,
        });
        Ok(job)
    }

    /// Move a running job to another available resource.
    pub fn reassign(
        &mut self,
        registry: &mut ResourceRegistry,
        job_id: JobId,
        new_resource_id: &ResourceId,
    ) -> Result<()> {
        let Running {
            index,
            resource_id: from,
            started_at,
            ..
        } = self.running(job_id)?;
        registry.ensure_available(new_resource_id)?;

        let now = self.now();
        let job = &mut self.book.jobs[index];
        if let JobStatus::InProgress { resource_id, .. } = &mut job.status {
            *resource_id = new_resource_id.clone();
        }
        job.updated_at = now;
        let occupant = occupant_for(job, started_at);

        registry.vacate(&from);
        registry.occupy(new_resource_id, occupant);

        self.record(BoardEvent::JobReassigned {
            job_id,
            from,
            to: new_resource_id.clone(),
            timestamp: now,
        });
        Ok(())
    }

    /// Drop a held job for good.
    pub fn cancel(&mut self, job_id: JobId) -> Result<Job> {
        let Parked {
            index,
            started_at,
            held_at,
            ..
        } = self.parked(job_id)?;

        let now = self.now();
        let mut job = self.book.held.remove(index);
        job.status = JobStatus::Cancelled {
            started_at,
            held_at,
            cancelled_at: now,
        };
        job.updated_at = now;
        self.book.cancelled.push(job.clone());

        self.record(BoardEvent::JobCancelled {
            job_id,
            timestamp: now,
        });
        Ok(job)
    }

    /// Delete a job that never started.
    pub fn remove_pending(&mut self, job_id: JobId) -> Result<Job> {
        let index = self.pending_index(job_id)?;
        let job = self.book.jobs.remove(index);
        self.record(BoardEvent::JobRemoved {
            job_id,
            timestamp: self.now(),
        });
        Ok(job)
    }

    /// Job half of the dashboard counters.
    pub fn stats(&self) -> BoardStats {
        BoardStats {
            pending_jobs: self.pending().count() as u64,
            in_progress_jobs: self.in_progress().count() as u64,
            held_jobs: self.book.held.len() as u64,
            completed_jobs: self.book.completed.len() as u64,
            cancelled_jobs: self.book.cancelled.len() as u64,
            ..Default::default()
        }
    }

    /// Hand over and clear the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: BoardEvent) {
        tracing::info!("{}", event.description());
        self.events.push(event);
    }

    fn shelf(&self, shelf: Shelf) -> &[Job] {
        match shelf {
            Shelf::Live => &self.book.jobs,
            Shelf::Held => &self.book.held,
            Shelf::Completed => &self.book.completed,
            Shelf::Cancelled => &self.book.cancelled,
        }
    }

    fn locate(&self, id: JobId) -> Option<(Shelf, usize)> {
        [Shelf::Live, Shelf::Held, Shelf::Completed, Shelf::Cancelled]
            .into_iter()
            .find_map(|shelf| {
                self.shelf(shelf)
                    .iter()
                    .position(|job| job.id == id)
                    .map(|index| (shelf, index))
            })
    }

    fn not_active(&self, id: JobId) -> BoardError {
        match self.locate(id) {
            Some((shelf, index)) => BoardError::JobNotActive {
                id,
                status: self.shelf(shelf)[index].status.as_str(),
            },
            None => BoardError::JobNotFound(id),
        }
    }

    fn pending_index(&self, id: JobId) -> Result<usize> {
        match self.locate(id) {
            Some((Shelf::Live, index)) if matches!(self.book.jobs[index].status, JobStatus::Pending) => {
                Ok(index)
            }
            _ => Err(self.not_active(id)),
        }
    }

    fn running(&self, id: JobId) -> Result<Running> {
        if let Some((Shelf::Live, index)) = self.locate(id)
            && let JobStatus::InProgress {
                resource_id,
                started_at,
                progress,
                ..
            } = &self.book.jobs[index].status
        {
            return Ok(Running {
                index,
                resource_id: resource_id.clone(),
                started_at: *started_at,
                progress: *progress,
            });
        }
        Err(self.not_active(id))
    }

    fn parked(&self, id: JobId) -> Result<Parked> {
        if let Some((Shelf::Held, index)) = self.locate(id)
            && let JobStatus::OnHold {
                started_at,
                held_at,
                progress,
                ..
            } = &self.book.held[index].status
        {
            return Ok(Parked {
                index,
                started_at: *started_at,
                held_at: *held_at,
                progress: *progress,
            });
        }
        Err(self.not_active(id))
    }
}

fn occupant_for(job: &Job, started_at: DateTime<Utc>) -> Occupant {
    Occupant {
        job_id: job.id,
        label: job.display_label(),
        started_at,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use board_core::{ResourceKind, ResourceStatus};
    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::registry::ResourceSpec;

    struct Fixture {
        clock: ManualClock,
        registry: ResourceRegistry,
        jobs: JobLifecycle,
    }

    fn fixture() -> Result<Fixture> {
        let clock = ManualClock::default();
        let shared: SharedClock = Arc::new(clock.clone());
        let mut registry = ResourceRegistry::new(shared.clone());
        registry.create(ResourceSpec::new("R1", ResourceKind::Bay, 10.0))?;
        registry.create(ResourceSpec::new("R2", ResourceKind::Bay, 12.0))?;
        Ok(Fixture {
            clock,
            registry,
            jobs: JobLifecycle::new(shared),
        })
    }

    fn spec() -> JobSpec {
        JobSpec::new("Brake Repair", "Sarah Johnson", 3.0).with_subject("BMW X5")
    }

    fn r(id: &str) -> ResourceId {
        ResourceId::from(id)
    }

    #[test]
    fn create_validates_spec() -> Result<()> {
        let mut f = fixture()?;
        assert!(matches!(
            f.jobs.create(JobSpec::new("X", "Sarah", 1.0)),
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            f.jobs.create(JobSpec::new("Oil Change", "Sarah", 0.25)),
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            f.jobs.create(JobSpec::new("Oil Change", "Sarah", f64::NAN)),
            Err(BoardError::Validation(_))
        ));
        let job = f.jobs.create(spec())?;
        assert!(matches!(job.status, JobStatus::Pending));
        assert!(job.assigned_resource_id().is_none());
        Ok(())
    }

    #[test]
    fn assign_to_occupied_resource_changes_nothing() -> Result<()> {
        let mut f = fixture()?;
        let first = f.jobs.create(spec())?;
        let second = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, first.id, &r("R1"))?;
        let before = f.registry.get(&r("R1"));

        let err = f.jobs.assign(&mut f.registry, second.id, &r("R1"));
        assert!(matches!(err, Err(BoardError::ResourceUnavailable { .. })));
        assert_eq!(f.registry.get(&r("R1")), before);
        assert!(matches!(
            f.jobs.get(second.id).map(|j| &j.status),
            Some(JobStatus::Pending)
        ));
        Ok(())
    }

    #[test]
    fn assign_requires_pending_job() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        let again = f.jobs.assign(&mut f.registry, job.id, &r("R2"));
        assert!(matches!(again, Err(BoardError::JobNotActive { .. })));
        assert_eq!(f.registry.status(&r("R2")), Some(ResourceStatus::Available));

        let missing = f.jobs.assign(&mut f.registry, JobId::new(), &r("R2"));
        assert!(matches!(missing, Err(BoardError::JobNotFound(_))));
        Ok(())
    }

    #[test]
    fn progress_is_monotonic() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        assert!(matches!(
            f.jobs.update_progress(job.id, 10),
            Err(BoardError::JobNotActive { .. })
        ));

        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        f.jobs.update_progress(job.id, 40)?;
        f.jobs.update_progress(job.id, 40)?;
        assert!(matches!(
            f.jobs.update_progress(job.id, 20),
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            f.jobs.update_progress(job.id, 101),
            Err(BoardError::Validation(_))
        ));
        assert_eq!(f.jobs.get(job.id).and_then(|j| j.status.progress()), Some(40));
        Ok(())
    }

    #[test]
    fn reassign_keeps_start_time() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        let started = f.jobs.get(job.id).and_then(|j| j.status.started_at());

        f.clock.advance(Duration::minutes(20));
        f.jobs.reassign(&mut f.registry, job.id, &r("R2"))?;

        assert_eq!(f.registry.status(&r("R1")), Some(ResourceStatus::Available));
        assert!(f.registry.get(&r("R1")).is_some_and(|r| r.current_occupant().is_none()));
        let moved = f.registry.get(&r("R2"));
        assert_eq!(moved.as_ref().map(|r| r.status()), Some(ResourceStatus::Occupied));
        assert_eq!(
            moved.and_then(|r| r.current_occupant().map(|o| o.started_at)),
            started
        );
        let job = f.jobs.get(job.id);
        assert_eq!(job.and_then(|j| j.assigned_resource_id()), Some(&r("R2")));
        assert_eq!(job.and_then(|j| j.status.started_at()), started);
        Ok(())
    }

    #[test]
    fn reassign_onto_itself_is_unavailable() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        let err = f.jobs.reassign(&mut f.registry, job.id, &r("R1"));
        assert!(matches!(err, Err(BoardError::ResourceUnavailable { .. })));
        assert_eq!(f.registry.status(&r("R1")), Some(ResourceStatus::Occupied));
        Ok(())
    }

    #[test]
    fn cancel_only_from_hold() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        assert!(matches!(
            f.jobs.cancel(job.id),
            Err(BoardError::JobNotActive { .. })
        ));

        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        f.jobs.hold(&mut f.registry, job.id, "customer-approval")?;
        let cancelled = f.jobs.cancel(job.id)?;
        assert!(cancelled.status.is_terminal());
        assert_eq!(f.jobs.cancelled().len(), 1);
        assert!(f.jobs.held().is_empty());

        // Terminal: nothing moves it again.
        assert!(matches!(
            f.jobs.resume(&mut f.registry, job.id, &r("R1")),
            Err(BoardError::JobNotActive { .. })
        ));
        assert!(matches!(
            f.jobs.cancel(job.id),
            Err(BoardError::JobNotActive { .. })
        ));
        Ok(())
    }

    #[test]
    fn hold_requires_reason() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, job.id, &r("R1"))?;
        assert!(matches!(
            f.jobs.hold(&mut f.registry, job.id, "  "),
            Err(BoardError::Validation(_))
        ));
        assert_eq!(f.registry.status(&r("R1")), Some(ResourceStatus::Occupied));
        Ok(())
    }

    #[test]
    fn remove_pending_only() -> Result<()> {
        let mut f = fixture()?;
        let job = f.jobs.create(spec())?;
        let other = f.jobs.create(spec())?;
        f.jobs.assign(&mut f.registry, other.id, &r("R1"))?;

        f.jobs.remove_pending(job.id)?;
        assert!(f.jobs.get(job.id).is_none());
        assert!(matches!(
            f.jobs.remove_pending(other.id),
            Err(BoardError::JobNotActive { .. })
        ));
        Ok(())
    }

    #[test]
    fn restore_rejects_misfiled_jobs() {
        let mut book = JobBook::default();
        book.held.push(Job::new("Oil Change", "John Smith", 1.0));
        let clock: SharedClock = Arc::new(ManualClock::default());
        assert!(matches!(
            JobLifecycle::restore(book, clock),
            Err(BoardError::Validation(_))
        ));
    }
}
