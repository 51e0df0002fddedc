//! Durable board state: one JSON array per key in a [`Storage`] backend.
//!
//! The store is the only thing that reads or writes persisted board data.

use board_core::{Booking, Job, JobId, JobStatus, Resource, ResourceId, ResourceKind, ResourceState};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use storage::{Storage, StorageError};

use crate::error::Result;
use crate::lifecycle::JobBook;
use crate::seed;

/// Key names for one board. Each is stored at `<key>.json`.
///
/// Bay boards keep the historical names; bin boards put a `bin` prefix on
/// their job and booking keys so both boards can share one storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keys {
    pub resources: &'static str,
    pub jobs: &'static str,
    pub held: &'static str,
    pub completed: &'static str,
    pub cancelled: &'static str,
    pub bookings: &'static str,
}

impl Keys {
    pub const BAYS: Keys = Keys {
        resources: "bays",
        jobs: "jobs",
        held: "heldJobs",
        completed: "completedJobs",
        cancelled: "cancelledJobs",
        bookings: "bookings",
    };

    pub const BINS: Keys = Keys {
        resources: "bins",
        jobs: "binJobs",
        held: "binHeldJobs",
        completed: "binCompletedJobs",
        cancelled: "binCancelledJobs",
        bookings: "binBookings",
    };

    pub fn for_kind(kind: ResourceKind) -> Keys {
        match kind {
            ResourceKind::Bay => Keys::BAYS,
            ResourceKind::Bin => Keys::BINS,
        }
    }

    fn all(&self) -> [&'static str; 6] {
        [
            self.resources,
            self.jobs,
            self.held,
            self.completed,
            self.cancelled,
            self.bookings,
        ]
    }
}

fn object_key(key: &str) -> String {
    format!("{key}.json")
}

/// Everything a board persists, in one value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub kind: ResourceKind,
    pub resources: Vec<Resource>,
    pub jobs: JobBook,
    pub bookings: Vec<Booking>,
}

impl Snapshot {
    pub fn empty(kind: ResourceKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

/// Reads and writes [`Snapshot`]s.
#[derive(Debug, Clone)]
pub struct BoardStore {
    storage: Storage,
}

impl BoardStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Load the board for `kind`.
    ///
    /// Missing keys come back empty. When the resource key is missing and
    /// `seed` is set, the default layout (plus sample jobs for bays) is
    /// generated and written straight away. If a key was unreadable or the
    /// layout was regenerated, occupancy links that no longer line up are
    /// repaired and the result is saved.
    pub async fn load(&self, kind: ResourceKind, seed: bool, now: DateTime<Utc>) -> Result<Snapshot> {
        let keys = Keys::for_kind(kind);
        let resources = self.read::<Resource>(keys.resources).await?;
        let live = self.read::<Job>(keys.jobs).await?;
        let held = self.read::<Job>(keys.held).await?;
        let completed = self.read::<Job>(keys.completed).await?;
        let cancelled = self.read::<Job>(keys.cancelled).await?;
        let bookings = self.read::<Booking>(keys.bookings).await?;

        let damaged = [
            resources.is_unreadable(),
            live.is_unreadable(),
            held.is_unreadable(),
            completed.is_unreadable(),
            cancelled.is_unreadable(),
            bookings.is_unreadable(),
        ]
        .contains(&true);
        let seeding = seed && !resources.is_found();
        let seed_jobs = seeding && kind == ResourceKind::Bay && !live.is_found();

        let mut snapshot = Snapshot {
            kind,
            resources: resources.into_vec(),
            jobs: JobBook {
                jobs: live.into_vec(),
                held: held.into_vec(),
                completed: completed.into_vec(),
                cancelled: cancelled.into_vec(),
            },
            bookings: bookings.into_vec(),
        };

        if seeding {
            snapshot.resources = seed::default_resources(kind, now);
            if seed_jobs {
                snapshot.jobs.jobs = seed::sample_jobs(now);
            }
            tracing::info!(
                kind = kind.as_str(),
                resources = snapshot.resources.len(),
                jobs = snapshot.jobs.jobs.len(),
                "seeded default board"
            );
        }

        let repaired = if damaged || seeding {
            reconcile(&mut snapshot, now)
        } else {
            0
        };
        if seeding || repaired > 0 {
            self.save(&snapshot).await?;
        }

        Ok(snapshot)
    }

    /// Write every key of `snapshot`.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let keys = Keys::for_kind(snapshot.kind);
        self.write(keys.resources, &snapshot.resources).await?;
        self.write(keys.jobs, &snapshot.jobs.jobs).await?;
        self.write(keys.held, &snapshot.jobs.held).await?;
        self.write(keys.completed, &snapshot.jobs.completed).await?;
        self.write(keys.cancelled, &snapshot.jobs.cancelled).await?;
        self.write(keys.bookings, &snapshot.bookings).await?;
        tracing::debug!(kind = snapshot.kind.as_str(), "saved board");
        Ok(())
    }

    /// Remove every key for `kind`, so the next load starts fresh.
    pub async fn clear(&self, kind: ResourceKind) -> Result<()> {
        for key in Keys::for_kind(kind).all() {
            self.storage.delete(&object_key(key)).await?;
        }
        tracing::info!(kind = kind.as_str(), "cleared board");
        Ok(())
    }

    async fn write<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.storage.put_json(&object_key(key), items).await?;
        Ok(())
    }

    /// A blob that no longer decodes is reported and treated as absent.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Blob<T>> {
        match self.storage.get_json(&object_key(key)).await {
            Ok(Some(items)) => Ok(Blob::Found(items)),
            Ok(None) => Ok(Blob::Missing),
            Err(StorageError::Json(e)) => {
                tracing::warn!(key, error = %e, "discarding unreadable board data");
                Ok(Blob::Unreadable)
            }
            Err(e) => Err(e.into()),
        }
    }
}

enum Blob<T> {
    Found(Vec<T>),
    Missing,
    Unreadable,
}

impl<T> Blob<T> {
    fn is_found(&self) -> bool {
        matches!(self, Blob::Found(_))
    }

    fn is_unreadable(&self) -> bool {
        matches!(self, Blob::Unreadable)
    }

    fn into_vec(self) -> Vec<T> {
        match self {
            Blob::Found(items) => items,
            Blob::Missing | Blob::Unreadable => Vec::new(),
        }
    }
}

/// Make running jobs and occupied resources point at each other again.
///
/// A running job whose resource does not host it goes back to pending. An
/// occupied resource whose job is not running there becomes available.
/// Returns how many records changed.
fn reconcile(snapshot: &mut Snapshot, now: DateTime<Utc>) -> usize {
    let hosted: Vec<(ResourceId, JobId)> = snapshot
        .resources
        .iter()
        .filter_map(|r| match &r.state {
            ResourceState::Occupied { occupant } => Some((r.id.clone(), occupant.job_id)),
            _ => None,
        })
        .collect();
    let mut repaired = 0;

    for job in &mut snapshot.jobs.jobs {
        let Some(resource_id) = job.assigned_resource_id().cloned() else {
            continue;
        };
        if hosted.iter().any(|(r, j)| *r == resource_id && *j == job.id) {
            continue;
        }
        tracing::warn!(job = %job.id, resource = %resource_id, "running job lost its resource, back to pending");
        job.status = JobStatus::Pending;
        job.updated_at = now;
        repaired += 1;
    }

    for resource in &mut snapshot.resources {
        let ResourceState::Occupied { occupant } = &resource.state else {
            continue;
        };
        let job_id = occupant.job_id;
        let running_here = snapshot
            .jobs
            .jobs
            .iter()
            .any(|j| j.id == job_id && j.assigned_resource_id() == Some(&resource.id));
        if running_here {
            continue;
        }
        tracing::warn!(resource = %resource.id, job = %job_id, "freeing resource held by a missing job");
        resource.state = ResourceState::Available;
        resource.updated_at = now;
        repaired += 1;
    }

    repaired
}
