use std::path::PathBuf;

use board_core::{JobId, Priority, ResourceKind, ResourceStatus};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "bayboard", version, about = "Workshop bay and storage bin board")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub board: BoardArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command. Unset flags fall back to the
/// `BOARD_*` / `STORAGE_*` environment.
#[derive(Debug, Args)]
pub struct BoardArgs {
    /// Board to open: bay or bin
    #[arg(long, global = true)]
    pub kind: Option<ResourceKind>,

    /// Directory holding the board data
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Start empty instead of generating the default layout
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Rows per page for list views
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Output::Table)]
    pub output: Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the default layout (and sample jobs for bays)
    Seed {
        /// Drop whatever is stored first
        #[arg(long)]
        reset: bool,
    },

    /// List resources
    List(ListArgs),

    /// List jobs
    Jobs(JobListArgs),

    /// Dashboard counters
    Stats,

    /// Write the filtered resources or jobs as CSV
    Export {
        #[arg(value_enum, default_value_t = ExportTarget::Resources)]
        target: ExportTarget,

        /// Free-text search over the listed fields
        #[arg(long)]
        search: Option<String>,

        /// Output file (default: stdout)
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Add a resource
    AddResource {
        id: String,
        #[arg(long)]
        capacity: f64,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "")]
        zone: String,
        #[arg(long = "type", default_value = "")]
        resource_type: String,
        #[arg(long, value_delimiter = ',')]
        equipment: Vec<String>,
    },

    /// Remove an available resource and its bookings
    Delete { resource: String },

    /// Set a resource to available or maintenance
    Status {
        resource: String,
        status: ResourceStatus,
    },

    /// Take an available resource out of service
    Block {
        resource: String,
        #[arg(long)]
        reason: String,
        /// Lift automatically after this many hours
        #[arg(long)]
        hours: Option<i64>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Put a blocked resource back in service
    Unblock { resource: String },

    /// Queue a new job
    AddJob {
        #[arg(long)]
        title: String,
        #[arg(long)]
        customer: String,
        /// Vehicle or item the job is for
        #[arg(long, default_value = "")]
        subject: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        hours: f64,
    },

    /// Start a pending job on a resource
    Assign {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        resource: String,
    },

    /// Report progress on a running job
    Progress {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        percent: u8,
    },

    /// Park a running job and free its resource
    Hold {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Put a held job back on a resource
    Resume {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        resource: String,
    },

    /// Move a running job to another resource
    Reassign {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        resource: String,
    },

    /// Finish a running job
    Complete {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Drop a held job
    Cancel {
        #[arg(value_parser = parse_job_id)]
        job: JobId,
    },

    /// Book a time slot on a resource
    Book {
        resource: String,
        #[arg(long)]
        customer: String,
        /// RFC 3339 start time, e.g. 2026-10-20T09:00:00Z
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        hours: f64,
        #[arg(long, value_parser = parse_job_id)]
        job: Option<JobId>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Keep only these statuses (repeatable)
    #[arg(long)]
    pub status: Vec<ResourceStatus>,

    #[arg(long)]
    pub zone: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    /// Field to sort by, e.g. id, zone, capacity, status
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub desc: bool,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct JobListArgs {
    #[arg(long, value_enum, default_value_t = Collection::Live)]
    pub collection: Collection,

    /// Keep only these priorities (repeatable)
    #[arg(long)]
    pub priority: Vec<Priority>,

    #[arg(long)]
    pub search: Option<String>,

    /// Field to sort by, e.g. title, customer, priority_rank, started_at
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub desc: bool,

    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Live,
    Held,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportTarget {
    Resources,
    Jobs,
}

fn parse_job_id(s: &str) -> Result<JobId, String> {
    JobId::parse(s.trim()).map_err(|e| format!("invalid job id {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_the_subcommand() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "bayboard", "list", "--status", "blocked", "--status", "maintenance", "--kind", "bin",
        ])?;
        assert_eq!(cli.board.kind, Some(ResourceKind::Bin));
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(
            args.status,
            vec![ResourceStatus::Blocked, ResourceStatus::Maintenance]
        );
        Ok(())
    }

    #[test]
    fn rejects_malformed_job_ids() {
        assert!(Cli::try_parse_from(["bayboard", "cancel", "not-a-ulid"]).is_err());
    }
}
