mod cli;
mod render;

use std::error::Error;

use board::{
    BlockDuration, BoardConfig, BoardStore, Clock, Filter, JOB_COLUMNS, JobSpec, ResourceSpec,
    SortDirection, ViewQuery, Workshop, export, project, system_clock, to_csv,
};
use board_core::{Booking, ResourceId};
use chrono::Duration;
use clap::Parser;
use serde::Serialize;
use storage::{Storage, StorageConfig};
use tracing_subscriber::EnvFilter;

use cli::{BoardArgs, Cli, Collection, Command, ExportTarget, Output};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli.board)?;
    let store = BoardStore::new(Storage::new(config.storage.clone())?);
    let clock = system_clock();

    if let Command::Seed { reset } = cli.command {
        if reset {
            store.clear(config.kind).await?;
        }
        let snapshot = store.load(config.kind, true, clock.now()).await?;
        println!(
            "{} {}s, {} live jobs",
            snapshot.resources.len(),
            config.kind.as_str(),
            snapshot.jobs.jobs.len()
        );
        return Ok(());
    }

    let snapshot = store.load(config.kind, config.seed, clock.now()).await?;
    let mut board = Workshop::from_snapshot(snapshot, clock)?;
    let output = cli.board.output;

    let changed = match cli.command {
        Command::Seed { .. } => false,
        Command::List(args) => {
            let resources = board.resources();
            let mut query = ViewQuery::new()
                .filter(
                    "status",
                    Filter::any_of(args.status.iter().map(|s| s.as_str())),
                )
                .filter("zone", Filter::exact(args.zone.unwrap_or_default()))
                .page(args.page, config.page_size);
            query.search = args.search;
            if let Some(field) = args.sort {
                query = query.sort_by(field, direction(args.desc));
            }
            let page = project(&resources, &query);
            match output {
                Output::Table => render::resources(&page),
                Output::Json => print_json(&page.items)?,
            }
            false
        }
        Command::Jobs(args) => {
            let jobs = board.jobs();
            let collection = match args.collection {
                Collection::Live => jobs.live(),
                Collection::Held => jobs.held(),
                Collection::Completed => jobs.completed(),
                Collection::Cancelled => jobs.cancelled(),
            };
            let mut query = ViewQuery::new()
                .filter(
                    "priority",
                    Filter::any_of(args.priority.iter().map(|p| p.as_str())),
                )
                .page(args.page, config.page_size);
            query.search = args.search;
            if let Some(field) = args.sort {
                query = query.sort_by(field, direction(args.desc));
            }
            let page = project(collection, &query);
            match output {
                Output::Table => render::jobs(&page),
                Output::Json => print_json(&page.items)?,
            }
            false
        }
        Command::Stats => {
            let stats = board.stats();
            match output {
                Output::Table => render::stats(&stats),
                Output::Json => print_json(&stats)?,
            }
            false
        }
        Command::Export {
            target,
            search,
            out,
        } => {
            let mut query = ViewQuery::new();
            query.search = search;
            let csv = match target {
                ExportTarget::Resources => {
                    let resources = board.resources();
                    let view = project(&resources, &query);
                    to_csv(view.items, export::resource_columns(board.kind()))
                }
                ExportTarget::Jobs => {
                    let view = project(board.jobs().live(), &query);
                    to_csv(view.items, JOB_COLUMNS)
                }
            };
            match out {
                Some(path) => {
                    tokio::fs::write(&path, csv).await?;
                    tracing::info!(path = %path.display(), "export written");
                }
                None => print!("{csv}"),
            }
            false
        }
        Command::AddResource {
            id,
            capacity,
            label,
            zone,
            resource_type,
            equipment,
        } => {
            let mut spec = ResourceSpec::new(id, board.kind(), capacity)
                .with_zone(zone)
                .with_type(resource_type)
                .with_equipment(equipment);
            if let Some(label) = label {
                spec = spec.with_label(label);
            }
            board.create_resource(spec)?;
            true
        }
        Command::Delete { resource } => {
            board.delete_resource(&ResourceId::from(resource))?;
            true
        }
        Command::Status { resource, status } => {
            board.set_status(&ResourceId::from(resource), status)?;
            true
        }
        Command::Block {
            resource,
            reason,
            hours,
            notes,
        } => {
            let duration = match hours {
                Some(h) => BlockDuration::hours(h)?,
                None => BlockDuration::Indefinite,
            };
            board.block(&ResourceId::from(resource), reason, duration, notes)?;
            true
        }
        Command::Unblock { resource } => {
            board.unblock(&ResourceId::from(resource))?;
            true
        }
        Command::AddJob {
            title,
            customer,
            subject,
            priority,
            hours,
        } => {
            let job = board.create_job(
                JobSpec::new(title, customer, hours)
                    .with_subject(subject)
                    .with_priority(priority),
            )?;
            println!("{}", job.id);
            true
        }
        Command::Assign { job, resource } => {
            board.assign(job, &ResourceId::from(resource))?;
            true
        }
        Command::Progress { job, percent } => {
            board.update_progress(job, percent)?;
            true
        }
        Command::Hold { job, reason, notes } => {
            board.hold(job, reason, notes)?;
            true
        }
        Command::Resume { job, resource } => {
            board.resume(job, &ResourceId::from(resource))?;
            true
        }
        Command::Reassign { job, resource } => {
            board.reassign(job, &ResourceId::from(resource))?;
            true
        }
        Command::Complete { job, notes } => {
            board.complete(job, notes)?;
            true
        }
        Command::Cancel { job } => {
            board.cancel(job)?;
            true
        }
        Command::Book {
            resource,
            customer,
            start,
            hours,
            job,
            notes,
        } => {
            let minutes = (hours * 60.0).round();
            let ends_at = (minutes.is_finite() && minutes.abs() < i64::MAX as f64)
                .then(|| Duration::try_minutes(minutes as i64))
                .flatten()
                .and_then(|length| start.checked_add_signed(length))
                .ok_or("booking length is out of range")?;
            let mut booking = Booking::new(ResourceId::from(resource), customer, start, ends_at);
            if let Some(job) = job {
                booking = booking.with_job(job);
            }
            if let Some(notes) = notes {
                booking = booking.with_notes(notes);
            }
            let booking = board.add_booking(booking)?;
            println!("{}", booking.id);
            true
        }
    };

    // Expired blocks are committed on every run, so persist those too.
    let expired = !board.tick().is_empty();
    let events = board.drain_events();
    if changed || expired {
        store.save(&board.snapshot()).await?;
    }
    if output == Output::Table {
        for event in &events {
            eprintln!("{}", event.description());
        }
    }
    Ok(())
}

/// Environment first, then command-line flags on top.
fn resolve_config(args: &BoardArgs) -> Result<BoardConfig, Box<dyn Error>> {
    let mut config = BoardConfig::from_env()?;
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    if let Some(dir) = &args.data_dir {
        config.storage = StorageConfig {
            prefix: config.storage.prefix.take(),
            ..StorageConfig::filesystem(dir)
        };
    }
    if args.no_seed {
        config.seed = false;
    }
    if let Some(size) = args.page_size {
        config.page_size = size.max(1);
    }
    Ok(config)
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
