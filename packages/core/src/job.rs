//! Job domain types for service work moving through a resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::resource::ResourceId;

/// Job identifier. ULIDs sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Ulid);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Accepts the 26-character Crockford form.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string did not name any variant of a board enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value:?}")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// How urgently a job should be picked up.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Ordinal used when sorting numerically.
    pub fn rank(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(ParseEnumError::new("priority", s)),
        }
    }
}

/// Current status of a job in its lifecycle.
///
/// Timestamps ride along with the variant that introduced them, so a later
/// lifecycle field can never exist without the earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum JobStatus {
    /// Waiting in the queue, not bound to any resource.
    #[default]
    Pending,
    /// Being worked on at a resource.
    InProgress {
        resource_id: ResourceId,
        /// First assignment time; kept across hold/resume and reassignment.
        started_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resumed_at: Option<DateTime<Utc>>,
        #[serde(default)]
        progress: u8,
    },
    /// Parked off-resource, waiting to be resumed or cancelled.
    OnHold {
        started_at: DateTime<Utc>,
        held_at: DateTime<Utc>,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        original_resource_id: ResourceId,
        /// Progress reached before the hold, restored on resume.
        #[serde(default)]
        progress: u8,
    },
    /// Finished at a resource.
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        resource_id: ResourceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    /// Dropped while on hold.
    Cancelled {
        started_at: DateTime<Utc>,
        held_at: DateTime<Utc>,
        cancelled_at: DateTime<Utc>,
    },
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Cancelled { .. })
    }

    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress { .. } => "in-progress",
            JobStatus::OnHold { .. } => "on-hold",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Cancelled { .. } => "cancelled",
        }
    }

    /// The resource this job occupies; only set while in progress.
    pub fn assigned_resource_id(&self) -> Option<&ResourceId> {
        match self {
            JobStatus::InProgress { resource_id, .. } => Some(resource_id),
            _ => None,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobStatus::Pending => None,
            JobStatus::InProgress { started_at, .. }
            | JobStatus::OnHold { started_at, .. }
            | JobStatus::Completed { started_at, .. }
            | JobStatus::Cancelled { started_at, .. } => Some(*started_at),
        }
    }

    pub fn held_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobStatus::OnHold { held_at, .. } | JobStatus::Cancelled { held_at, .. } => {
                Some(*held_at)
            }
            _ => None,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            JobStatus::Completed { completed_at, .. } => Some(*completed_at),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            JobStatus::InProgress { progress, .. } | JobStatus::OnHold { progress, .. } => {
                Some(*progress)
            }
            JobStatus::Completed { .. } => Some(100),
            _ => None,
        }
    }
}

/// A unit of service work that consumes a resource while active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Service requested, e.g. "Brake Repair".
    pub title: String,
    pub customer: String,
    /// What is being worked on: a vehicle, an item code.
    #[serde(default)]
    pub subject: String,
    pub priority: Priority,
    pub estimated_hours: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job.
    pub fn new(title: impl Into<String>, customer: impl Into<String>, estimated_hours: f64) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            customer: customer.into(),
            subject: String::new(),
            priority: Priority::default(),
            estimated_hours,
            tags: Vec::new(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
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

    /// Label shown on the resource that hosts this job.
    pub fn display_label(&self) -> String {
        if self.subject.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.subject, self.title)
        }
    }

    pub fn assigned_resource_id(&self) -> Option<&ResourceId> {
        self.status.assigned_resource_id()
    }
}
