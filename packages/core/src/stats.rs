//! Dashboard counters for a board.

use serde::{Deserialize, Serialize};

/// Counts per resource status and per job collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardStats {
    pub available: u64,
    pub occupied: u64,
    pub reserved: u64,
    pub blocked: u64,
    pub maintenance: u64,
    pub pending_jobs: u64,
    pub in_progress_jobs: u64,
    pub held_jobs: u64,
    pub completed_jobs: u64,
    pub cancelled_jobs: u64,
}

impl BoardStats {
    /// Total resources on the board.
    pub fn resources(&self) -> u64 {
        self.available + self.occupied + self.reserved + self.blocked + self.maintenance
    }

    /// Jobs still waiting or being worked.
    pub fn active_jobs(&self) -> u64 {
        self.pending_jobs + self.in_progress_jobs
    }

    /// Share of in-service resources that hold a job, as a percentage.
    ///
    /// Resources under maintenance are out of service and excluded.
    pub fn utilization(&self) -> Option<f64> {
        let in_service = self.resources() - self.maintenance;
        if in_service == 0 {
            None
        } else {
            Some(((self.occupied + self.reserved) as f64 / in_service as f64) * 100.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_ignores_maintenance() {
        let stats = BoardStats {
            available: 2,
            occupied: 1,
            reserved: 1,
            maintenance: 4,
            ..Default::default()
        };
        assert_eq!(stats.resources(), 8);
        assert_eq!(stats.utilization(), Some(50.0));
        assert_eq!(BoardStats::default().utilization(), None);
    }
}
