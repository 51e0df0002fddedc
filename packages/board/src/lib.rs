//! Bay and bin board: resource registry, job lifecycle, list projections,
//! CSV export and persistence.
//!
//! A [`Workshop`] owns one board. Load it through a [`BoardStore`], mutate it
//! through its methods, then save its [`Snapshot`] back.

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod persistence;
pub mod projection;
pub mod registry;
pub mod schedule;
pub mod seed;
pub mod workshop;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock, system_clock};
pub use config::BoardConfig;
pub use error::{BoardError, Result};
pub use export::{BAY_COLUMNS, BIN_COLUMNS, Column, JOB_COLUMNS, to_csv};
pub use lifecycle::{JobBook, JobLifecycle, JobSpec};
pub use persistence::{BoardStore, Keys, Snapshot};
pub use projection::{
    FieldValue, Filter, Projection, Record, SortDirection, SortSpec, ViewQuery, project,
};
pub use registry::{BlockDuration, ResourceDetails, ResourceRegistry, ResourceSpec};
pub use schedule::UnblockSchedule;
pub use workshop::Workshop;
