//! Core domain types for the bay and bin scheduling board.
//!
//! This crate contains shared types used across all packages:
//! - Resource, ResourceState and BlockInfo for bays and bins
//! - Job and JobStatus for service work moving through a resource
//! - Booking for calendar reservations against a resource
//! - BoardStats and BoardEvent for dashboards and notifications

mod booking;
mod events;
mod job;
mod resource;
mod stats;

pub use booking::{Booking, BookingId};
pub use events::BoardEvent;
pub use job::{Job, JobId, JobStatus, ParseEnumError, Priority};
pub use resource::{
    BlockInfo, Occupant, Resource, ResourceId, ResourceKind, ResourceState, ResourceStatus,
};
pub use stats::BoardStats;
