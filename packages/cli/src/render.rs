//! Plain-text tables for terminal output.

use board::{Projection, Record};
use board_core::{BoardStats, Job, Resource};

fn print_table<R: Record>(page: &Projection<'_, R>, columns: &[(&str, &str)]) {
    let rows: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|(_, field)| r.field(field).render().into_owned())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, (header, _))| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain([header.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let headers: Vec<&str> = columns.iter().map(|(header, _)| *header).collect();
    print_row(&headers, &widths);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        print_row(&cells, &widths);
    }
    println!(
        "page {}/{} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total_count
    );
}

fn print_row(cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    println!("{}", padded.join("  ").trim_end());
}

pub fn resources(page: &Projection<'_, Resource>) {
    print_table(
        page,
        &[
            ("ID", "id"),
            ("ZONE", "zone"),
            ("STATUS", "status"),
            ("CAP", "capacity"),
            ("OCCUPANT", "occupant"),
            ("BLOCK", "block_reason"),
            ("UNTIL", "blocked_until"),
        ],
    );
}

pub fn jobs(page: &Projection<'_, Job>) {
    print_table(
        page,
        &[
            ("ID", "id"),
            ("SERVICE", "title"),
            ("SUBJECT", "subject"),
            ("CUSTOMER", "customer"),
            ("PRIORITY", "priority"),
            ("STATUS", "status"),
            ("RESOURCE", "resource"),
            ("%", "progress"),
        ],
    );
}

pub fn stats(stats: &BoardStats) {
    println!("resources   {}", stats.resources());
    println!("  available   {}", stats.available);
    println!("  occupied    {}", stats.occupied);
    println!("  reserved    {}", stats.reserved);
    println!("  blocked     {}", stats.blocked);
    println!("  maintenance {}", stats.maintenance);
    match stats.utilization() {
        Some(pct) => println!("utilization {pct:.1}%"),
        None => println!("utilization -"),
    }
    println!("jobs        {} active", stats.active_jobs());
    println!("  pending     {}", stats.pending_jobs);
    println!("  in progress {}", stats.in_progress_jobs);
    println!("  on hold     {}", stats.held_jobs);
    println!("  completed   {}", stats.completed_jobs);
    println!("  cancelled   {}", stats.cancelled_jobs);
}
