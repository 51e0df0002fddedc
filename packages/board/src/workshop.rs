//! The per-application board: resources, jobs, bookings and the event journal.

use board_core::{
    BoardEvent, BoardStats, Booking, BookingId, Job, JobId, Occupant, Resource, ResourceId,
    ResourceKind, ResourceState, ResourceStatus,
};

use crate::clock::SharedClock;
use crate::error::{BoardError, Result};
use crate::lifecycle::{JobLifecycle, JobSpec};
use crate::persistence::Snapshot;
use crate::registry::{BlockDuration, ResourceDetails, ResourceRegistry, ResourceSpec};

/// One board instance. All mutation goes through here so that bookings
/// follow their resources and every change lands in the journal.
#[derive(Debug)]
pub struct Workshop {
    kind: ResourceKind,
    registry: ResourceRegistry,
    jobs: JobLifecycle,
    bookings: Vec<Booking>,
    journal: Vec<BoardEvent>,
}

impl Workshop {
    pub fn new(kind: ResourceKind, clock: SharedClock) -> Self {
        Self {
            kind,
            registry: ResourceRegistry::new(clock.clone()),
            jobs: JobLifecycle::new(clock),
            bookings: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// Rebuild from persisted state.
    ///
    /// Fails when the pieces disagree: a resource of the wrong kind, or an
    /// in-progress job and its resource not pointing at each other.
    pub fn from_snapshot(snapshot: Snapshot, clock: SharedClock) -> Result<Self> {
        if let Some(stray) = snapshot.resources.iter().find(|r| r.kind != snapshot.kind) {
            return Err(BoardError::validation(format!(
                "{} is a {} but this board holds {}s",
                stray.id,
                stray.kind.as_str(),
                snapshot.kind.as_str()
            )));
        }

        let registry = ResourceRegistry::restore(snapshot.resources, clock.clone())?;
        let jobs = JobLifecycle::restore(snapshot.jobs, clock)?;

        for job in jobs.in_progress() {
            let Some(resource_id) = job.assigned_resource_id() else {
                continue;
            };
            let hosted = registry
                .get(resource_id)
                .and_then(|r| r.current_occupant().map(|o| o.job_id));
            if hosted != Some(job.id) {
                return Err(BoardError::validation(format!(
                    "job {} claims {resource_id} but the resource does not host it",
                    job.id
                )));
            }
        }
        for resource in registry.list() {
            if let ResourceState::Occupied { occupant } = &resource.state
                && jobs.job_at(&resource.id).map(|j| j.id) != Some(occupant.job_id)
            {
                return Err(BoardError::validation(format!(
                    "{} is occupied by unknown job {}",
                    resource.id, occupant.job_id
                )));
            }
        }

        let mut workshop = Self {
            kind: snapshot.kind,
            registry,
            jobs,
            bookings: snapshot.bookings,
            journal: Vec::new(),
        };
        workshop.registry.reap();
        workshop.collect();
        Ok(workshop)
    }

    /// Current state in persisted form. Expired blocks are already lifted.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            kind: self.kind,
            resources: self.registry.list(),
            jobs: self.jobs.book().clone(),
            bookings: self.bookings.clone(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn jobs(&self) -> &JobLifecycle {
        &self.jobs
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.registry.list()
    }

    pub fn resource(&self, id: &ResourceId) -> Option<Resource> {
        self.registry.get(id)
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Dashboard counters for resources and jobs together.
    pub fn stats(&self) -> BoardStats {
        let jobs = self.jobs.stats();
        BoardStats {
            pending_jobs: jobs.pending_jobs,
            in_progress_jobs: jobs.in_progress_jobs,
            held_jobs: jobs.held_jobs,
            completed_jobs: jobs.completed_jobs,
            cancelled_jobs: jobs.cancelled_jobs,
            ..self.registry.stats()
        }
    }

    /// Commit due auto-unblocks. Returns the resources that came free.
    pub fn tick(&mut self) -> Vec<ResourceId> {
        let lifted = self.registry.reap();
        self.collect();
        lifted
    }

    /// Hand over the events recorded since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        self.collect();
        std::mem::take(&mut self.journal)
    }

    pub fn create_resource(&mut self, spec: ResourceSpec) -> Result<Resource> {
        if spec.kind != self.kind {
            return Err(BoardError::validation(format!(
                "this board holds {}s, not {}s",
                self.kind.as_str(),
                spec.kind.as_str()
            )));
        }
        let out = self.registry.create(spec);
        self.collect();
        out
    }

    pub fn set_status(&mut self, id: &ResourceId, to: ResourceStatus) -> Result<()> {
        let out = self.registry.set_status(id, to);
        self.collect();
        out
    }

    pub fn block(
        &mut self,
        id: &ResourceId,
        reason: impl Into<String>,
        duration: BlockDuration,
        notes: Option<String>,
    ) -> Result<()> {
        let out = self.registry.block_with_notes(id, reason, duration, notes);
        self.collect();
        out
    }

    pub fn unblock(&mut self, id: &ResourceId) -> Result<()> {
        let out = self.registry.unblock(id);
        self.collect();
        out
    }

    pub fn reserve(&mut self, id: &ResourceId, occupant: Occupant) -> Result<()> {
        let out = self.registry.reserve(id, occupant);
        self.collect();
        out
    }

    pub fn release(&mut self, id: &ResourceId) -> Result<Occupant> {
        let out = self.registry.release(id);
        self.collect();
        out
    }

    pub fn update_details(&mut self, id: &ResourceId, details: ResourceDetails) -> Result<Resource> {
        let out = self.registry.update_details(id, details);
        self.collect();
        out
    }

    /// Delete an available resource and every booking that points at it.
    pub fn delete_resource(&mut self, id: &ResourceId) -> Result<Resource> {
        let removed = self.registry.delete(id);
        self.collect();
        let removed = removed?;

        let before = self.bookings.len();
        self.bookings.retain(|b| &b.resource_id != id);
        let count = before - self.bookings.len();
        if count > 0 {
            let event = BoardEvent::BookingsPruned {
                resource_id: id.clone(),
                count,
                timestamp: self.registry.now(),
            };
            tracing::info!("{}", event.description());
            self.journal.push(event);
        }
        Ok(removed)
    }

    pub fn create_job(&mut self, spec: JobSpec) -> Result<Job> {
        let out = self.jobs.create(spec);
        self.collect();
        out
    }

    pub fn assign(&mut self, job_id: JobId, resource_id: &ResourceId) -> Result<()> {
        let out = self.jobs.assign(&mut self.registry, job_id, resource_id);
        self.collect();
        out
    }

    pub fn update_progress(&mut self, job_id: JobId, percent: u8) -> Result<()> {
        let out = self.jobs.update_progress(job_id, percent);
        self.collect();
        out
    }

    pub fn hold(
        &mut self,
        job_id: JobId,
        reason: impl Into<String>,
        notes: Option<String>,
    ) -> Result<()> {
        let out = self
            .jobs
            .hold_with_notes(&mut self.registry, job_id, reason, notes);
        self.collect();
        out
    }

    pub fn resume(&mut self, job_id: JobId, resource_id: &ResourceId) -> Result<()> {
        let out = self.jobs.resume(&mut self.registry, job_id, resource_id);
        self.collect();
        out
    }

    pub fn complete(&mut self, job_id: JobId, notes: Option<String>) -> Result<Job> {
        let out = self.jobs.complete(&mut self.registry, job_id, notes);
        self.collect();
        out
    }

    pub fn reassign(&mut self, job_id: JobId, resource_id: &ResourceId) -> Result<()> {
        let out = self.jobs.reassign(&mut self.registry, job_id, resource_id);
        self.collect();
        out
    }

    pub fn cancel(&mut self, job_id: JobId) -> Result<Job> {
        let out = self.jobs.cancel(job_id);
        self.collect();
        out
    }

    pub fn remove_pending(&mut self, job_id: JobId) -> Result<Job> {
        let out = self.jobs.remove_pending(job_id);
        self.collect();
        out
    }

    /// Put a booking on the calendar of an existing resource.
    pub fn add_booking(&mut self, booking: Booking) -> Result<Booking> {
        if !self.registry.contains(&booking.resource_id) {
            return Err(BoardError::ResourceNotFound(booking.resource_id));
        }
        if booking.ends_at <= booking.starts_at {
            return Err(BoardError::validation("booking must end after it starts"));
        }
        if booking.customer.trim().is_empty() {
            return Err(BoardError::validation("booking needs a customer"));
        }
        if let Some(job_id) = booking.job_id
            && self.jobs.get(job_id).is_none()
        {
            return Err(BoardError::JobNotFound(job_id));
        }
        if let Some(clash) = self.bookings.iter().find(|b| {
            b.resource_id == booking.resource_id && b.overlaps(booking.starts_at, booking.ends_at)
        }) {
            return Err(BoardError::validation(format!(
                "{} is already booked from {} to {}",
                clash.resource_id, clash.starts_at, clash.ends_at
            )));
        }

        tracing::debug!(resource = %booking.resource_id, booking = %booking.id, "booking added");
        self.bookings.push(booking.clone());
        Ok(booking)
    }

    pub fn cancel_booking(&mut self, id: BookingId) -> Result<Booking> {
        let index = self
            .bookings
            .iter()
            .position(|b| b.id == id)
            .ok_or(BoardError::BookingNotFound(id))?;
        Ok(self.bookings.remove(index))
    }

    pub fn bookings_for(&self, resource_id: &ResourceId) -> impl Iterator<Item = &Booking> {
        self.bookings
            .iter()
            .filter(move |b| &b.resource_id == resource_id)
    }

    /// Move registry events, then lifecycle events, into the journal.
    fn collect(&mut self) {
        self.journal.extend(self.registry.take_events());
        self.journal.extend(self.jobs.take_events());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn workshop() -> Result<(Workshop, ManualClock)> {
        let clock = ManualClock::default();
        let mut workshop = Workshop::new(ResourceKind::Bay, Arc::new(clock.clone()));
        workshop.create_resource(ResourceSpec::new("BAY-01", ResourceKind::Bay, 10.0))?;
        workshop.create_resource(ResourceSpec::new("BAY-02", ResourceKind::Bay, 12.0))?;
        Ok((workshop, clock))
    }

    fn r(id: &str) -> ResourceId {
        ResourceId::from(id)
    }

    #[test]
    fn rejects_resources_of_the_other_kind() -> Result<()> {
        let (mut workshop, _) = workshop()?;
        let err = workshop.create_resource(ResourceSpec::new("A01-R01-L01", ResourceKind::Bin, 50.0));
        assert!(matches!(err, Err(BoardError::Validation(_))));
        Ok(())
    }

    #[test]
    fn delete_prunes_bookings() -> Result<()> {
        let (mut workshop, clock) = workshop()?;
        let start = clock.now();
        workshop.add_booking(Booking::new(r("BAY-01"), "John Smith", start, start + Duration::hours(1)))?;
        workshop.add_booking(Booking::new(r("BAY-02"), "Lisa Davis", start, start + Duration::hours(1)))?;
        workshop.drain_events();

        workshop.delete_resource(&r("BAY-01"))?;
        assert_eq!(workshop.bookings().len(), 1);
        assert_eq!(workshop.bookings_for(&r("BAY-01")).count(), 0);

        let events = workshop.drain_events();
        assert!(matches!(events[0], BoardEvent::ResourceDeleted { .. }));
        assert!(matches!(events[1], BoardEvent::BookingsPruned { count: 1, .. }));
        Ok(())
    }

    #[test]
    fn bookings_are_validated() -> Result<()> {
        let (mut workshop, clock) = workshop()?;
        let start = clock.now();
        let hour = Duration::hours(1);

        assert!(matches!(
            workshop.add_booking(Booking::new(r("BAY-09"), "John", start, start + hour)),
            Err(BoardError::ResourceNotFound(_))
        ));
        assert!(matches!(
            workshop.add_booking(Booking::new(r("BAY-01"), "John", start, start)),
            Err(BoardError::Validation(_))
        ));

        let first = workshop.add_booking(Booking::new(r("BAY-01"), "John", start, start + hour))?;
        assert!(matches!(
            workshop.add_booking(Booking::new(
                r("BAY-01"),
                "Sarah",
                start + Duration::minutes(30),
                start + hour * 2
            )),
            Err(BoardError::Validation(_))
        ));
        workshop.add_booking(Booking::new(r("BAY-01"), "Sarah", start + hour, start + hour * 2))?;

        workshop.cancel_booking(first.id)?;
        assert!(matches!(
            workshop.cancel_booking(first.id),
            Err(BoardError::BookingNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn journal_keeps_operation_order() -> Result<()> {
        let (mut workshop, clock) = workshop()?;
        workshop.drain_events();

        workshop.block(&r("BAY-02"), "maintenance", BlockDuration::For(Duration::seconds(1)), None)?;
        let job = workshop.create_job(JobSpec::new("Oil Change", "John Smith", 1.0))?;
        clock.advance(Duration::seconds(1));
        workshop.assign(job.id, &r("BAY-01"))?;

        let kinds: Vec<&str> = workshop
            .drain_events()
            .iter()
            .map(|e| match e {
                BoardEvent::ResourceBlocked { .. } => "blocked",
                BoardEvent::JobCreated { .. } => "created",
                BoardEvent::ResourceUnblocked { automatic: true, .. } => "auto-unblocked",
                BoardEvent::JobAssigned { .. } => "assigned",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["blocked", "created", "auto-unblocked", "assigned"]);
        assert!(workshop.drain_events().is_empty());
        Ok(())
    }

    #[test]
    fn snapshot_round_trip_restores_running_jobs() -> Result<()> {
        let (mut workshop, clock) = workshop()?;
        let job = workshop.create_job(JobSpec::new("Brake Repair", "Sarah Johnson", 3.0))?;
        workshop.assign(job.id, &r("BAY-01"))?;
        workshop.block(&r("BAY-02"), "lift inspection", BlockDuration::hours(2)?, None)?;

        let snapshot = workshop.snapshot();
        let mut restored = Workshop::from_snapshot(snapshot.clone(), Arc::new(clock.clone()))?;
        assert_eq!(restored.snapshot(), snapshot);

        clock.advance(Duration::hours(2));
        assert_eq!(restored.tick(), vec![r("BAY-02")]);
        restored.complete(job.id, None)?;
        assert_eq!(restored.stats().completed_jobs, 1);
        assert_eq!(restored.stats().available, 2);
        Ok(())
    }

    #[test]
    fn snapshot_with_dangling_job_is_rejected() -> Result<()> {
        let (mut workshop, clock) = workshop()?;
        let job = workshop.create_job(JobSpec::new("Brake Repair", "Sarah Johnson", 3.0))?;
        workshop.assign(job.id, &r("BAY-01"))?;

        let mut snapshot = workshop.snapshot();
        snapshot.resources.retain(|r| r.id.as_str() != "BAY-01");
        let err = Workshop::from_snapshot(snapshot, Arc::new(clock));
        assert!(matches!(err, Err(BoardError::Validation(_))));
        Ok(())
    }
}
