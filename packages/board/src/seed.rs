//! First-run data for an empty board.

use board_core::{
    BlockInfo, Job, JobId, JobStatus, Priority, Resource, ResourceKind, ResourceState,
};
use chrono::{DateTime, Utc};

struct BayZone {
    zone: &'static str,
    label: &'static str,
    bays: &'static [(&'static str, f64)],
}

const BAY_ZONES: &[BayZone] = &[
    BayZone {
        zone: "heavy-duty",
        label: "Heavy Duty",
        bays: &[
            ("Heavy Duty Lift", 25.0),
            ("40-Ton Lift", 30.0),
            ("Hydraulic Press", 35.0),
            ("Heavy Duty Lift", 40.0),
            ("50-Ton Lift", 45.0),
            ("Industrial Lift", 50.0),
        ],
    },
    BayZone {
        zone: "painting",
        label: "Paint Shop",
        bays: &[
            ("Paint Booth", 10.0),
            ("Prep Station", 12.0),
            ("Color Match", 15.0),
            ("Detail Bay", 8.0),
        ],
    },
    BayZone {
        zone: "alignment",
        label: "Alignment",
        bays: &[
            ("Alignment Rack", 8.0),
            ("4-Wheel Alignment", 10.0),
            ("Hunter Alignment", 12.0),
            ("Precision Alignment", 8.0),
            ("Wheel Alignment", 10.0),
            ("Advanced Alignment", 12.0),
        ],
    },
    BayZone {
        zone: "inspection",
        label: "Inspection",
        bays: &[
            ("Inspection Pit", 6.0),
            ("Safety Check", 8.0),
            ("MOT Bay", 10.0),
            ("Annual Inspection", 6.0),
        ],
    },
    BayZone {
        zone: "general",
        label: "General Service",
        bays: &[
            ("2-Post Lift", 5.0),
            ("Hydraulic Lift", 8.0),
            ("4-Post Lift", 10.0),
            ("Scissor Lift", 6.0),
            ("2-Post Lift", 5.0),
            ("Service Bay", 8.0),
            ("Quick Service", 5.0),
            ("Maintenance Bay", 8.0),
            ("Service Lift", 10.0),
            ("General Service", 6.0),
            ("Multi-Service", 8.0),
            ("Service Bay", 10.0),
        ],
    },
];

/// (code, bin type, capacity, description)
const BINS: &[(&str, &str, f64, &str)] = &[
    ("A01-R01-L01", "standard", 50.0, "Standard storage bin"),
    ("A01-R01-L02", "standard", 50.0, "Standard storage bin"),
    ("A01-R02-L01", "picking", 30.0, "Picking bin for fast-moving items"),
    ("A01-R03-L01", "bulk", 200.0, "Large capacity bulk storage"),
    ("B02-R01-L01", "bulk", 200.0, "Bulk storage for large quantities"),
    ("B02-R01-L02", "standard", 50.0, "Maintenance required"),
    ("B03-R02-L03", "standard", 50.0, "Standard storage bin"),
    ("C02-R03-L01", "picking", 30.0, "Fast-access picking bin"),
    ("C03-R01-L01", "picking", 30.0, "High-priority picking bin"),
    ("C03-R02-L01", "standard", 50.0, "Available for allocation"),
    ("D04-R01-L01", "quarantine", 20.0, "Quarantine area for quality check"),
    ("D04-R01-L02", "standard", 50.0, "Reserved for outbound shipment"),
];

const BLOCKED_BIN: &str = "B02-R01-L02";

/// (subject, customer, title, hours, priority)
const SAMPLE_JOBS: &[(&str, &str, &str, f64, Priority)] = &[
    ("Toyota Camry", "John Smith", "Oil Change", 1.0, Priority::Low),
    ("BMW X5", "Sarah Johnson", "Brake Repair", 3.0, Priority::High),
    ("Honda Civic", "Mike Brown", "Tire Rotation", 0.5, Priority::Medium),
    ("Ford F-150", "David Wilson", "Engine Diagnostic", 2.0, Priority::High),
    ("Nissan Altima", "Lisa Davis", "AC Service", 1.5, Priority::Medium),
];

/// Default layout for `kind`.
pub fn default_resources(kind: ResourceKind, now: DateTime<Utc>) -> Vec<Resource> {
    match kind {
        ResourceKind::Bay => default_bays(now),
        ResourceKind::Bin => default_bins(now),
    }
}

/// Bays numbered `BAY-01..` across the five workshop zones.
pub fn default_bays(now: DateTime<Utc>) -> Vec<Resource> {
    BAY_ZONES
        .iter()
        .flat_map(|zone| {
            zone.bays
                .iter()
                .enumerate()
                .map(move |(index, (equipment, capacity))| (zone, index, *equipment, *capacity))
        })
        .enumerate()
        .map(|(n, (zone, index, equipment, capacity))| {
            let mut bay = Resource::new(format!("BAY-{:02}", n + 1), ResourceKind::Bay, capacity)
                .with_label(format!("{} {}", zone.label, index + 1))
                .with_zone(zone.zone)
                .with_type(zone.zone)
                .with_equipment(vec![equipment.to_string()])
                .with_tags(vec![zone.zone.replace('-', " "), format!("zone-{}", zone.zone)]);
            bay.created_at = now;
            bay.updated_at = now;
            bay
        })
        .collect()
}

/// Bins across zones A to D. One ships blocked for maintenance.
pub fn default_bins(now: DateTime<Utc>) -> Vec<Resource> {
    BINS.iter()
        .map(|(code, bin_type, capacity, description)| {
            let zone = &code[..1];
            let mut bin = Resource::new(*code, ResourceKind::Bin, *capacity)
                .with_label(*description)
                .with_zone(zone)
                .with_type(*bin_type)
                .with_tags(vec![format!("zone-{}", zone.to_ascii_lowercase())]);
            if *code == BLOCKED_BIN {
                bin.state = ResourceState::Blocked {
                    info: BlockInfo {
                        reason: "maintenance".to_string(),
                        notes: Some((*description).to_string()),
                        created_at: now,
                        expires_at: None,
                    },
                };
            }
            bin.created_at = now;
            bin.updated_at = now;
            bin
        })
        .collect()
}

/// A handful of pending service jobs for a fresh bay board.
pub fn sample_jobs(now: DateTime<Utc>) -> Vec<Job> {
    SAMPLE_JOBS
        .iter()
        .map(|(subject, customer, title, hours, priority)| Job {
            id: JobId::new(),
            title: (*title).to_string(),
            customer: (*customer).to_string(),
            subject: (*subject).to_string(),
            priority: *priority,
            estimated_hours: *hours,
            tags: Vec::new(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use board_core::ResourceStatus;

    use super::*;

    #[test]
    fn bays_are_numbered_across_zones() {
        let bays = default_bays(Utc::now());
        assert_eq!(bays.len(), 32);
        assert_eq!(bays[0].id.as_str(), "BAY-01");
        assert_eq!(bays[0].zone, "heavy-duty");
        assert_eq!(bays[6].id.as_str(), "BAY-07");
        assert_eq!(bays[6].zone, "painting");
        assert_eq!(bays[31].id.as_str(), "BAY-32");

        let ids: HashSet<_> = bays.iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids.len(), bays.len());
        assert!(bays.iter().all(|b| b.capacity > 0.0 && b.is_available()));
    }

    #[test]
    fn one_bin_starts_blocked() {
        let bins = default_bins(Utc::now());
        let blocked: Vec<_> = bins
            .iter()
            .filter(|b| b.status() == ResourceStatus::Blocked)
            .collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].id.as_str(), BLOCKED_BIN);
        assert!(blocked[0].block_info().is_some_and(|b| b.expires_at.is_none()));
        assert!(bins.iter().all(|b| ["A", "B", "C", "D"].contains(&b.zone.as_str())));
    }

    #[test]
    fn sample_jobs_are_pending() {
        let jobs = sample_jobs(Utc::now());
        assert_eq!(jobs.len(), 5);
        assert!(jobs.iter().all(|j| matches!(j.status, JobStatus::Pending)));
        assert_eq!(jobs[1].display_label(), "BMW X5 - Brake Repair");
    }
}
