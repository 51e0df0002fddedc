//! Event types for board notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, ResourceId, ResourceStatus};

/// Events emitted by the board whenever a resource or job changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    // Resource events
    /// A resource was added to the board.
    ResourceCreated {
        resource_id: ResourceId,
        timestamp: DateTime<Utc>,
    },
    /// A resource moved between statuses.
    ResourceStatusChanged {
        resource_id: ResourceId,
        old_status: ResourceStatus,
        new_status: ResourceStatus,
        timestamp: DateTime<Utc>,
    },
    /// A resource was blocked.
    ResourceBlocked {
        resource_id: ResourceId,
        reason: String,
        expires_at: Option<DateTime<Utc>>,
        timestamp: DateTime<Utc>,
    },
    /// A resource came out of a block, by hand or on expiry.
    ResourceUnblocked {
        resource_id: ResourceId,
        automatic: bool,
        timestamp: DateTime<Utc>,
    },
    /// A resource was removed from the board.
    ResourceDeleted {
        resource_id: ResourceId,
        timestamp: DateTime<Utc>,
    },

    // Job events
    /// A job entered the queue.
    JobCreated {
        job_id: JobId,
        title: String,
        timestamp: DateTime<Utc>,
    },
    /// A pending job started on a resource.
    JobAssigned {
        job_id: JobId,
        resource_id: ResourceId,
        timestamp: DateTime<Utc>,
    },
    /// Progress was reported for a running job.
    JobProgressed {
        job_id: JobId,
        progress: u8,
        timestamp: DateTime<Utc>,
    },
    /// A running job was parked and its resource freed.
    JobHeld {
        job_id: JobId,
        resource_id: ResourceId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A held job went back onto a resource.
    JobResumed {
        job_id: JobId,
        resource_id: ResourceId,
        timestamp: DateTime<Utc>,
    },
    /// A running job moved to another resource.
    JobReassigned {
        job_id: JobId,
        from: ResourceId,
        to: ResourceId,
        timestamp: DateTime<Utc>,
    },
    /// A job finished.
    JobCompleted {
        job_id: JobId,
        resource_id: ResourceId,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// A held job was dropped.
    JobCancelled {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    /// A pending job was removed from the queue.
    JobRemoved {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },

    /// Bookings were dropped because their resource went away.
    BookingsPruned {
        resource_id: ResourceId,
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

impl BoardEvent {
    /// When the event happened.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            BoardEvent::ResourceCreated { timestamp, .. }
            | BoardEvent::ResourceStatusChanged { timestamp, .. }
            | BoardEvent::ResourceBlocked { timestamp, .. }
            | BoardEvent::ResourceUnblocked { timestamp, .. }
            | BoardEvent::ResourceDeleted { timestamp, .. }
            | BoardEvent::JobCreated { timestamp, .. }
            | BoardEvent::JobAssigned { timestamp, .. }
            | BoardEvent::JobProgressed { timestamp, .. }
            | BoardEvent::JobHeld { timestamp, .. }
            | BoardEvent::JobResumed { timestamp, .. }
            | BoardEvent::JobReassigned { timestamp, .. }
            | BoardEvent::JobCompleted { timestamp, .. }
            | BoardEvent::JobCancelled { timestamp, .. }
            | BoardEvent::JobRemoved { timestamp, .. }
            | BoardEvent::BookingsPruned { timestamp, .. } => *timestamp,
        }
    }

    /// Get the resource this event concerns, if any.
    ///
    /// For reassignment this is the destination.
    pub fn resource_id(&self) -> Option<&ResourceId> {
        match self {
            BoardEvent::ResourceCreated { resource_id, .. }
            | BoardEvent::ResourceStatusChanged { resource_id, .. }
            | BoardEvent::ResourceBlocked { resource_id, .. }
            | BoardEvent::ResourceUnblocked { resource_id, .. }
            | BoardEvent::ResourceDeleted { resource_id, .. }
            | BoardEvent::JobAssigned { resource_id, .. }
            | BoardEvent::JobHeld { resource_id, .. }
            | BoardEvent::JobResumed { resource_id, .. }
            | BoardEvent::JobCompleted { resource_id, .. }
            | BoardEvent::BookingsPruned { resource_id, .. } => Some(resource_id),
            BoardEvent::JobReassigned { to, .. } => Some(to),
            _ => None,
        }
    }

    /// The job this event concerns, for job events.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            BoardEvent::JobCreated { job_id, .. }
            | BoardEvent::JobAssigned { job_id, .. }
            | BoardEvent::JobProgressed { job_id, .. }
            | BoardEvent::JobHeld { job_id, .. }
            | BoardEvent::JobResumed { job_id, .. }
            | BoardEvent::JobReassigned { job_id, .. }
            | BoardEvent::JobCompleted { job_id, .. }
            | BoardEvent::JobCancelled { job_id, .. }
            | BoardEvent::JobRemoved { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }

    /// One human-readable line, used for the info log.
    pub fn description(&self) -> String {
        match self {
            BoardEvent::ResourceCreated { resource_id, .. } => format!("{resource_id} created"),
            BoardEvent::ResourceStatusChanged {
                resource_id,
                old_status,
                new_status,
                ..
            } => format!("{resource_id} {old_status} -> {new_status}"),
            BoardEvent::ResourceBlocked {
                resource_id,
                reason,
                expires_at,
                ..
            } => match expires_at {
                Some(at) => format!("{resource_id} blocked for {reason} until {at}"),
                None => format!("{resource_id} blocked for {reason}"),
            },
            BoardEvent::ResourceUnblocked {
                resource_id,
                automatic,
                ..
            } => {
                if *automatic {
                    format!("{resource_id} automatically unblocked")
                } else {
                    format!("{resource_id} unblocked")
                }
            }
            BoardEvent::ResourceDeleted { resource_id, .. } => format!("{resource_id} deleted"),
            BoardEvent::JobCreated { job_id, title, .. } => {
                format!("Job {job_id} created: {title}")
            }
            BoardEvent::JobAssigned {
                job_id,
                resource_id,
                ..
            } => format!("Job {job_id} assigned to {resource_id}"),
            BoardEvent::JobProgressed {
                job_id, progress, ..
            } => format!("Job {job_id} at {progress}%"),
            BoardEvent::JobHeld { job_id, reason, .. } => {
                format!("Job {job_id} put on hold - {reason}")
            }
            BoardEvent::JobResumed {
                job_id,
                resource_id,
                ..
            } => format!("Job {job_id} resumed in {resource_id}"),
            BoardEvent::JobReassigned {
                job_id, from, to, ..
            } => format!("Job {job_id} reassigned from {from} to {to}"),
            BoardEvent::JobCompleted {
                job_id,
                resource_id,
                duration_ms,
                ..
            } => format!("Job {job_id} completed in {resource_id} after {duration_ms}ms"),
            BoardEvent::JobCancelled { job_id, .. } => format!("Job {job_id} cancelled"),
            BoardEvent::JobRemoved { job_id, .. } => format!("Job {job_id} removed"),
            BoardEvent::BookingsPruned {
                resource_id, count, ..
            } => format!("{count} booking(s) for {resource_id} removed"),
        }
    }
}
