#![allow(dead_code)]

use std::sync::Arc;

use board::{ManualClock, ResourceSpec, SharedClock, Workshop};
use board_core::{ResourceId, ResourceKind};

/// A bay board with `R1` (10 t) and `R2` (12 t) on a clock that only moves
/// when the test says so.
pub fn bay_board() -> Result<(Workshop, ManualClock), board::BoardError> {
    let clock = ManualClock::default();
    let mut workshop = Workshop::new(ResourceKind::Bay, shared(&clock));
    workshop.create_resource(ResourceSpec::new("R1", ResourceKind::Bay, 10.0))?;
    workshop.create_resource(ResourceSpec::new("R2", ResourceKind::Bay, 12.0))?;
    workshop.drain_events();
    Ok((workshop, clock))
}

pub fn shared(clock: &ManualClock) -> SharedClock {
    Arc::new(clock.clone())
}

pub fn rid(id: &str) -> ResourceId {
    ResourceId::from(id)
}

/// Occupancy invariant: an occupant is present exactly when the resource is
/// occupied or reserved, and every in-progress job sits on a resource that
/// names it.
pub fn assert_consistent(workshop: &Workshop) {
    for resource in workshop.resources() {
        assert_eq!(
            resource.current_occupant().is_some(),
            resource.status().is_held_by_job(),
            "{} breaks the occupant invariant",
            resource.id
        );
        if resource.status() != board_core::ResourceStatus::Blocked {
            assert!(resource.block_info().is_none());
        }
    }
    for job in workshop.jobs().live() {
        let assigned = job.assigned_resource_id();
        assert_eq!(
            assigned.is_some(),
            matches!(job.status, board_core::JobStatus::InProgress { .. })
        );
        if let Some(id) = assigned {
            let hosted = workshop
                .resource(id)
                .and_then(|r| r.current_occupant().map(|o| o.job_id));
            assert_eq!(hosted, Some(job.id));
        }
    }
    for job in workshop
        .jobs()
        .held()
        .iter()
        .chain(workshop.jobs().completed())
        .chain(workshop.jobs().cancelled())
    {
        assert!(job.assigned_resource_id().is_none());
    }
}
