//! Resource domain types for bays and bins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{JobId, ParseEnumError};

/// User-facing identifier for a resource, such as `BAY-01` or `A01-R01-L03`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What sort of physical unit a resource models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Workshop service bay; capacity is a weight in tons.
    #[default]
    Bay,
    /// Warehouse storage bin; capacity is a unit count.
    Bin,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Bay => "bay",
            ResourceKind::Bin => "bin",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bay" | "bays" => Ok(ResourceKind::Bay),
            "bin" | "bins" => Ok(ResourceKind::Bin),
            _ => Err(ParseEnumError::new("resource kind", s)),
        }
    }
}

/// Data-free status of a resource, used for transition checks and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Available,
    Occupied,
    Reserved,
    Blocked,
    Maintenance,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 5] = [
        ResourceStatus::Available,
        ResourceStatus::Occupied,
        ResourceStatus::Reserved,
        ResourceStatus::Blocked,
        ResourceStatus::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Available => "available",
            ResourceStatus::Occupied => "occupied",
            ResourceStatus::Reserved => "reserved",
            ResourceStatus::Blocked => "blocked",
            ResourceStatus::Maintenance => "maintenance",
        }
    }

    /// Statuses reachable from `self` in a single step.
    ///
    /// An occupied resource has no outgoing edge except back to available,
    /// which only the job lifecycle may take.
    pub fn allowed_transitions(self) -> &'static [ResourceStatus] {
        use ResourceStatus::*;
        match self {
            Available => &[Occupied, Reserved, Blocked, Maintenance],
            Occupied => &[Available],
            Reserved => &[Available],
            Blocked => &[Available],
            Maintenance => &[Available],
        }
    }

    pub fn can_transition_to(self, to: ResourceStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// True when the status carries an occupant.
    pub fn is_held_by_job(self) -> bool {
        matches!(self, ResourceStatus::Occupied | ResourceStatus::Reserved)
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResourceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("resource status", s))
    }
}

/// Snapshot of the job bound to an occupied or reserved resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub job_id: JobId,
    /// Short display label, e.g. "BMW X5 - Brake Repair".
    pub label: String,
    pub started_at: DateTime<Utc>,
}

/// Why and until when a resource is blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` means blocked until someone unblocks it.
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlockInfo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Current state of a resource.
///
/// Occupant and block data live inside the variant that needs them, so an
/// available resource can never carry either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResourceState {
    #[default]
    Available,
    Occupied {
        occupant: Occupant,
    },
    Reserved {
        occupant: Occupant,
    },
    Blocked {
        info: BlockInfo,
    },
    Maintenance,
}

impl ResourceState {
    pub fn status(&self) -> ResourceStatus {
        match self {
            ResourceState::Available => ResourceStatus::Available,
            ResourceState::Occupied { .. } => ResourceStatus::Occupied,
            ResourceState::Reserved { .. } => ResourceStatus::Reserved,
            ResourceState::Blocked { .. } => ResourceStatus::Blocked,
            ResourceState::Maintenance => ResourceStatus::Maintenance,
        }
    }

    pub fn occupant(&self) -> Option<&Occupant> {
        match self {
            ResourceState::Occupied { occupant } | ResourceState::Reserved { occupant } => {
                Some(occupant)
            }
            _ => None,
        }
    }

    pub fn block_info(&self) -> Option<&BlockInfo> {
        match self {
            ResourceState::Blocked { info } => Some(info),
            _ => None,
        }
    }
}

/// A schedulable physical unit: a service bay or a storage bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub label: String,
    /// Zone the unit sits in ("heavy-duty", "A", ...).
    #[serde(default)]
    pub zone: String,
    /// Finer grouping within a zone, e.g. bay type or bin type.
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
    /// Tons for bays, units for bins. Always positive.
    pub capacity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub state: ResourceState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Create an available resource. Validation is the registry's job.
    pub fn new(id: impl Into<ResourceId>, kind: ResourceKind, capacity: f64) -> Self {
        let id = id.into();
        let now = Utc::now();
        Self {
            label: id.0.clone(),
            id,
            kind,
            zone: String::new(),
            resource_type: String::new(),
            equipment: Vec::new(),
            capacity,
            tags: Vec::new(),
            state: ResourceState::Available,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn with_equipment(mut self, equipment: Vec<String>) -> Self {
        self.equipment = equipment;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn status(&self) -> ResourceStatus {
        self.state.status()
    }

    pub fn current_occupant(&self) -> Option<&Occupant> {
        self.state.occupant()
    }

    pub fn block_info(&self) -> Option<&BlockInfo> {
        self.state.block_info()
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, ResourceState::Available)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_lifecycle() {
        use ResourceStatus::*;
        assert!(Available.can_transition_to(Occupied));
        assert!(Available.can_transition_to(Blocked));
        assert!(Blocked.can_transition_to(Available));
        assert!(Maintenance.can_transition_to(Available));
        assert!(!Occupied.can_transition_to(Maintenance));
        assert!(!Occupied.can_transition_to(Blocked));
        assert!(!Blocked.can_transition_to(Maintenance));
        assert!(!Available.can_transition_to(Available));
    }

    #[test]
    fn state_serializes_with_status_tag() -> Result<(), serde_json::Error> {
        let resource = Resource::new("BAY-01", ResourceKind::Bay, 10.0);
        let json = serde_json::to_value(&resource)?;
        assert_eq!(json["status"], "available");
        assert!(json.get("occupant").is_none());

        let back: Resource = serde_json::from_value(json)?;
        assert_eq!(back, resource);
        Ok(())
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Blocked".parse::<ResourceStatus>().ok(), Some(ResourceStatus::Blocked));
        assert!("broken".parse::<ResourceStatus>().is_err());
        assert_eq!("bins".parse::<ResourceKind>().ok(), Some(ResourceKind::Bin));
    }
}
