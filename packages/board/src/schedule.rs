//! Pending auto-unblocks, keyed by resource.

use std::collections::HashMap;

use board_core::ResourceId;
use chrono::{DateTime, Utc};

/// Cancellable set of "unblock this resource at T" entries.
///
/// At most one entry exists per resource; scheduling again replaces it.
#[derive(Debug, Default, Clone)]
pub struct UnblockSchedule {
    entries: HashMap<ResourceId, DateTime<Utc>>,
}

impl UnblockSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: ResourceId, at: DateTime<Utc>) {
        self.entries.insert(id, at);
    }

    /// Drop the entry for `id`. Returns whether one existed.
    pub fn cancel(&mut self, id: &ResourceId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn deadline(&self, id: &ResourceId) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    /// Remove and return every entry due at `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ResourceId> {
        let mut due: Vec<(DateTime<Utc>, ResourceId)> = self
            .entries
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, id.clone()))
            .collect();
        due.sort();

        for (_, id) in &due {
            self.entries.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.entries.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn take_due_returns_expired_in_deadline_order() {
        let now = Utc::now();
        let mut schedule = UnblockSchedule::new();
        schedule.schedule(ResourceId::from("BAY-02"), now + Duration::seconds(5));
        schedule.schedule(ResourceId::from("BAY-01"), now + Duration::seconds(1));
        schedule.schedule(ResourceId::from("BAY-03"), now + Duration::hours(1));

        let due = schedule.take_due(now + Duration::seconds(10));
        assert_eq!(due, vec![ResourceId::from("BAY-01"), ResourceId::from("BAY-02")]);
        assert_eq!(schedule.len(), 1);
        assert!(schedule.take_due(now + Duration::seconds(10)).is_empty());
    }

    #[test]
    fn cancel_and_reschedule() {
        let now = Utc::now();
        let id = ResourceId::from("BAY-01");
        let mut schedule = UnblockSchedule::new();
        schedule.schedule(id.clone(), now);
        schedule.schedule(id.clone(), now + Duration::minutes(5));
        assert_eq!(schedule.deadline(&id), Some(now + Duration::minutes(5)));

        assert!(schedule.cancel(&id));
        assert!(!schedule.cancel(&id));
        assert!(schedule.is_empty());
        assert_eq!(schedule.next_deadline(), None);
    }
}
