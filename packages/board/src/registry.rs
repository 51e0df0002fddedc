//! Resource registry: the single owner of every bay or bin on a board.

use board_core::{
    BlockInfo, BoardEvent, BoardStats, Occupant, Resource, ResourceId, ResourceKind,
    ResourceState, ResourceStatus,
};
use chrono::{DateTime, Duration, Utc};

use crate::clock::SharedClock;
use crate::error::{BoardError, Result};
use crate::schedule::UnblockSchedule;

/// Input for [`ResourceRegistry::create`].
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub capacity: f64,
    pub label: Option<String>,
    pub zone: String,
    pub resource_type: String,
    pub equipment: Vec<String>,
    pub tags: Vec<String>,
}

impl ResourceSpec {
    pub fn new(id: impl Into<ResourceId>, kind: ResourceKind, capacity: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            capacity,
            label: None,
            zone: String::new(),
            resource_type: String::new(),
            equipment: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = zone.into();
        self
    }

    pub fn with_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
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
}

/// Partial edit of a resource's descriptive fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ResourceDetails {
    pub label: Option<String>,
    pub zone: Option<String>,
    pub resource_type: Option<String>,
    pub equipment: Option<Vec<String>>,
    pub capacity: Option<f64>,
    pub tags: Option<Vec<String>>,
}

/// How long a block lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDuration {
    /// Until someone calls `unblock`.
    Indefinite,
    /// Lifted automatically once the duration has elapsed.
    For(Duration),
}

impl BlockDuration {
    /// Fails when `hours` does not fit in a [`Duration`].
    pub fn hours(hours: i64) -> Result<Self> {
        Duration::try_hours(hours)
            .map(BlockDuration::For)
            .ok_or_else(|| BoardError::validation("block duration is too long"))
    }
}

/// Holds the resources of one board and enforces their transition table.
///
/// Resources keep insertion order. Reads return copies with any due
/// auto-unblock already applied; mutating calls commit due unblocks first.
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    unblocks: UnblockSchedule,
    clock: SharedClock,
    events: Vec<BoardEvent>,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.resources.len())
            .field("unblocks", &self.unblocks.len())
            .finish()
    }
}

impl ResourceRegistry {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            resources: Vec::new(),
            unblocks: UnblockSchedule::new(),
            clock,
            events: Vec::new(),
        }
    }

    /// Rebuild a registry from persisted records.
    ///
    /// Finite blocks are put back on the unblock schedule; ones whose
    /// deadline already passed are lifted on the next reap.
    pub fn restore(resources: Vec<Resource>, clock: SharedClock) -> Result<Self> {
        let mut registry = Self::new(clock);
        for resource in resources {
            validate_capacity(resource.capacity)?;
            if registry.position(&resource.id).is_some() {
                return Err(BoardError::validation(format!(
                    "duplicate resource id {}",
                    resource.id
                )));
            }
            if let Some(at) = resource.block_info().and_then(|info| info.expires_at) {
                registry.unblocks.schedule(resource.id.clone(), at);
            }
            registry.resources.push(resource);
        }
        Ok(registry)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Add a new, available resource.
    pub fn create(&mut self, spec: ResourceSpec) -> Result<Resource> {
        self.reap();

        let id = ResourceId::new(spec.id.as_str().trim());
        if id.as_str().is_empty() {
            return Err(BoardError::validation("resource id must not be empty"));
        }
        validate_capacity(spec.capacity)?;
        if self.position(&id).is_some() {
            return Err(BoardError::validation(format!("resource {id} already exists")));
        }

        let now = self.now();
        let resource = Resource {
            label: spec.label.unwrap_or_else(|| id.to_string()),
            id: id.clone(),
            kind: spec.kind,
            zone: spec.zone,
            resource_type: spec.resource_type,
            equipment: spec.equipment,
            capacity: spec.capacity,
            tags: spec.tags,
            state: ResourceState::Available,
            created_at: now,
            updated_at: now,
        };
        self.resources.push(resource.clone());
        self.record(BoardEvent::ResourceCreated {
            resource_id: id,
            timestamp: now,
        });
        Ok(resource)
    }

    pub fn get(&self, id: &ResourceId) -> Option<Resource> {
        self.resources
            .iter()
            .find(|r| &r.id == id)
            .map(|r| self.resolved(r))
    }

    pub fn status(&self, id: &ResourceId) -> Option<ResourceStatus> {
        self.get(id).map(|r| r.status())
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.position(id).is_some()
    }

    /// Every resource in insertion order.
    pub fn list(&self) -> Vec<Resource> {
        self.resources.iter().map(|r| self.resolved(r)).collect()
    }

    /// Resources that can take a job right now.
    pub fn available(&self) -> Vec<Resource> {
        self.list().into_iter().filter(Resource::is_available).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Move a resource between `available` and `maintenance`, or lift a block.
    ///
    /// Statuses that carry data (`occupied`, `reserved`, `blocked`) have
    /// their own entry points and are rejected here. A resource holding a job
    /// fails with [`BoardError::ResourceBusy`] rather than `InvalidTransition`:
    /// only the job lifecycle may free it.
    pub fn set_status(&mut self, id: &ResourceId, to: ResourceStatus) -> Result<()> {
        self.reap();
        let from = self.require(id)?.status();

        if from.is_held_by_job() {
            return Err(BoardError::ResourceBusy {
                id: id.clone(),
                status: from,
            });
        }
        if !from.can_transition_to(to) {
            return Err(BoardError::InvalidTransition {
                id: id.clone(),
                from,
                to,
            });
        }

        match to {
            ResourceStatus::Occupied | ResourceStatus::Reserved => Err(BoardError::validation(
                format!("{id} can only become {to} through a job"),
            )),
            ResourceStatus::Blocked => Err(BoardError::validation(format!(
                "{id} needs a reason to be blocked; use block()"
            ))),
            ResourceStatus::Available if from == ResourceStatus::Blocked => self.unblock(id),
            ResourceStatus::Available | ResourceStatus::Maintenance => {
                let state = if to == ResourceStatus::Maintenance {
                    ResourceState::Maintenance
                } else {
                    ResourceState::Available
                };
                let now = self.now();
                self.write_state(id, state, now);
                self.record(BoardEvent::ResourceStatusChanged {
                    resource_id: id.clone(),
                    old_status: from,
                    new_status: to,
                    timestamp: now,
                });
                Ok(())
            }
        }
    }

    /// Take an available resource out of service for `reason`.
    pub fn block(
        &mut self,
        id: &ResourceId,
        reason: impl Into<String>,
        duration: BlockDuration,
    ) -> Result<()> {
        self.block_with_notes(id, reason, duration, None)
    }

    pub fn block_with_notes(
        &mut self,
        id: &ResourceId,
        reason: impl Into<String>,
        duration: BlockDuration,
        notes: Option<String>,
    ) -> Result<()> {
        self.reap();

        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(BoardError::validation("block reason must not be empty"));
        }
        if let BlockDuration::For(d) = duration
            && d <= Duration::zero()
        {
            return Err(BoardError::validation("block duration must be positive"));
        }

        let from = self.require(id)?.status();
        if from != ResourceStatus::Available {
            return Err(BoardError::InvalidTransition {
                id: id.clone(),
                from,
                to: ResourceStatus::Blocked,
            });
        }

        let now = self.now();
        let expires_at = match duration {
            BlockDuration::Indefinite => None,
            BlockDuration::For(d) => Some(
                now.checked_add_signed(d)
                    .ok_or_else(|| BoardError::validation("block duration is too long"))?,
            ),
        };
        let info = BlockInfo {
            reason: reason.clone(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            expires_at,
        };
        self.write_state(id, ResourceState::Blocked { info }, now);
        if let Some(at) = expires_at {
            self.unblocks.schedule(id.clone(), at);
        }

        self.record(BoardEvent::ResourceBlocked {
            resource_id: id.clone(),
            reason,
            expires_at,
            timestamp: now,
        });
        Ok(())
    }

    /// Lift a block by hand, cancelling any pending auto-unblock.
    pub fn unblock(&mut self, id: &ResourceId) -> Result<()> {
        self.reap();
        let from = self.require(id)?.status();
        if from != ResourceStatus::Blocked {
            return Err(BoardError::InvalidTransition {
                id: id.clone(),
                from,
                to: ResourceStatus::Available,
            });
        }

        self.unblocks.cancel(id);
        let now = self.now();
        self.write_state(id, ResourceState::Available, now);
        self.record(BoardEvent::ResourceUnblocked {
            resource_id: id.clone(),
            automatic: false,
            timestamp: now,
        });
        Ok(())
    }

    /// Hold an available resource for a job that has not started yet.
    pub fn reserve(&mut self, id: &ResourceId, occupant: Occupant) -> Result<()> {
        self.reap();
        let from = self.require(id)?.status();
        if from != ResourceStatus::Available {
            return Err(BoardError::ResourceUnavailable {
                id: id.clone(),
                status: from,
            });
        }

        let now = self.now();
        self.write_state(id, ResourceState::Reserved { occupant }, now);
        self.record(BoardEvent::ResourceStatusChanged {
            resource_id: id.clone(),
            old_status: from,
            new_status: ResourceStatus::Reserved,
            timestamp: now,
        });
        Ok(())
    }

    /// Drop a reservation.
    pub fn release(&mut self, id: &ResourceId) -> Result<Occupant> {
        self.reap();
        let resource = self.require(id)?;
        let from = resource.status();
        let ResourceState::Reserved { occupant } = resource.state.clone() else {
            return Err(BoardError::InvalidTransition {
                id: id.clone(),
                from,
                to: ResourceStatus::Available,
            });
        };

        let now = self.now();
        self.write_state(id, ResourceState::Available, now);
        self.record(BoardEvent::ResourceStatusChanged {
            resource_id: id.clone(),
            old_status: from,
            new_status: ResourceStatus::Available,
            timestamp: now,
        });
        Ok(occupant)
    }

    /// Edit descriptive fields. Allowed in any status.
    pub fn update_details(&mut self, id: &ResourceId, details: ResourceDetails) -> Result<Resource> {
        self.reap();
        if let Some(capacity) = details.capacity {
            validate_capacity(capacity)?;
        }
        let now = self.now();
        let resource = self.require_mut(id)?;

        if let Some(label) = details.label {
            resource.label = label;
        }
        if let Some(zone) = details.zone {
            resource.zone = zone;
        }
        if let Some(resource_type) = details.resource_type {
            resource.resource_type = resource_type;
        }
        if let Some(equipment) = details.equipment {
            resource.equipment = equipment;
        }
        if let Some(capacity) = details.capacity {
            resource.capacity = capacity;
        }
        if let Some(tags) = details.tags {
            resource.tags = tags;
        }
        resource.updated_at = now;
        Ok(resource.clone())
    }

    /// Remove an available resource.
    pub fn delete(&mut self, id: &ResourceId) -> Result<Resource> {
        self.reap();
        let status = self.require(id)?.status();
        if status != ResourceStatus::Available {
            return Err(BoardError::ResourceBusy {
                id: id.clone(),
                status,
            });
        }

        let Some(index) = self.position(id) else {
            return Err(BoardError::ResourceNotFound(id.clone()));
        };
        let removed = self.resources.remove(index);
        self.unblocks.cancel(id);
        self.record(BoardEvent::ResourceDeleted {
            resource_id: id.clone(),
            timestamp: self.now(),
        });
        Ok(removed)
    }

    /// Lift every block whose deadline has passed. Returns the lifted ids.
    ///
    /// An entry whose resource is gone or no longer blocked is dropped
    /// without touching anything.
    pub fn reap(&mut self) -> Vec<ResourceId> {
        let now = self.now();
        let mut lifted = Vec::new();

        for id in self.unblocks.take_due(now) {
            let still_blocked = self
                .resources
                .iter()
                .any(|r| r.id == id && r.status() == ResourceStatus::Blocked);
            if !still_blocked {
                tracing::debug!(resource = %id, "stale auto-unblock ignored");
                continue;
            }

            self.write_state(&id, ResourceState::Available, now);
            self.record(BoardEvent::ResourceUnblocked {
                resource_id: id.clone(),
                automatic: true,
                timestamp: now,
            });
            lifted.push(id);
        }

        lifted
    }

    /// When the next auto-unblock is due, if any.
    pub fn next_unblock_at(&self) -> Option<DateTime<Utc>> {
        self.unblocks.next_deadline()
    }

    /// Resource half of the dashboard counters.
    pub fn stats(&self) -> BoardStats {
        let mut stats = BoardStats::default();
        for resource in self.list() {
            match resource.status() {
                ResourceStatus::Available => stats.available += 1,
                ResourceStatus::Occupied => stats.occupied += 1,
                ResourceStatus::Reserved => stats.reserved += 1,
                ResourceStatus::Blocked => stats.blocked += 1,
                ResourceStatus::Maintenance => stats.maintenance += 1,
            }
        }
        stats
    }

    /// Hand over and clear the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fail unless `id` exists and is available. Reaps first.
    pub(crate) fn ensure_available(&mut self, id: &ResourceId) -> Result<()> {
        self.reap();
        let status = self.require(id)?.status();
        if status == ResourceStatus::Available {
            Ok(())
        } else {
            Err(BoardError::ResourceUnavailable {
                id: id.clone(),
                status,
            })
        }
    }

    /// Bind a job to a resource already checked with `ensure_available`.
    pub(crate) fn occupy(&mut self, id: &ResourceId, occupant: Occupant) {
        let now = self.now();
        debug_assert!(
            self.resources.iter().any(|r| &r.id == id && r.is_available()),
            "occupy called on a resource that was not validated"
        );
        self.write_state(id, ResourceState::Occupied { occupant }, now);
    }

    /// Free a resource that hosts a job. No-op when it hosts nothing.
    pub(crate) fn vacate(&mut self, id: &ResourceId) -> Option<Occupant> {
        let now = self.now();
        let resource = self.resources.iter_mut().find(|r| &r.id == id)?;
        if !matches!(resource.state, ResourceState::Occupied { .. }) {
            return None;
        }
        let ResourceState::Occupied { occupant } = std::mem::take(&mut resource.state) else {
            return None;
        };
        resource.updated_at = now;
        Some(occupant)
    }

    fn record(&mut self, event: BoardEvent) {
        tracing::info!("{}", event.description());
        self.events.push(event);
    }

    fn resolved(&self, resource: &Resource) -> Resource {
        let now = self.now();
        if resource.block_info().is_some_and(|info| info.is_expired(now)) {
            let mut view = resource.clone();
            view.state = ResourceState::Available;
            view.updated_at = now;
            view
        } else {
            resource.clone()
        }
    }

    fn position(&self, id: &ResourceId) -> Option<usize> {
        self.resources.iter().position(|r| &r.id == id)
    }

    fn require(&self, id: &ResourceId) -> Result<&Resource> {
        self.resources
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| BoardError::ResourceNotFound(id.clone()))
    }

    fn require_mut(&mut self, id: &ResourceId) -> Result<&mut Resource> {
        self.resources
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| BoardError::ResourceNotFound(id.clone()))
    }

    fn write_state(&mut self, id: &ResourceId, state: ResourceState, now: DateTime<Utc>) {
        if let Some(resource) = self.resources.iter_mut().find(|r| &r.id == id) {
            resource.state = state;
            resource.updated_at = now;
        }
    }
}

fn validate_capacity(capacity: f64) -> Result<()> {
    if capacity.is_finite() && capacity > 0.0 {
        Ok(())
    } else {
        Err(BoardError::validation(format!(
            "capacity must be a positive number, got {capacity}"
        )))
    }
}
