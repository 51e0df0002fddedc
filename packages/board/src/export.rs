//! CSV export of a record view.

use board_core::ResourceKind;

use crate::projection::Record;

/// A CSV column: header text and the record field it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub field: &'static str,
}

const fn col(header: &'static str, field: &'static str) -> Column {
    Column { header, field }
}

pub const BAY_COLUMNS: &[Column] = &[
    col("Bay", "id"),
    col("Name", "label"),
    col("Zone", "zone"),
    col("Type", "type"),
    col("Status", "status"),
    col("Capacity (t)", "capacity"),
    col("Equipment", "equipment"),
    col("Current Job", "occupant"),
    col("Block Reason", "block_reason"),
    col("Blocked Until", "blocked_until"),
];

pub const BIN_COLUMNS: &[Column] = &[
    col("Bin Code", "id"),
    col("Zone", "zone"),
    col("Type", "type"),
    col("Status", "status"),
    col("Item", "occupant"),
    col("Capacity", "capacity"),
    col("Description", "label"),
    col("Tags", "tags"),
];

pub const JOB_COLUMNS: &[Column] = &[
    col("ID", "id"),
    col("Service", "title"),
    col("Vehicle", "subject"),
    col("Customer", "customer"),
    col("Priority", "priority"),
    col("Status", "status"),
    col("Resource", "resource"),
    col("Progress", "progress"),
    col("Estimated Hours", "estimated_hours"),
    col("Started", "started_at"),
    col("Completed", "completed_at"),
];

pub fn resource_columns(kind: ResourceKind) -> &'static [Column] {
    match kind {
        ResourceKind::Bay => BAY_COLUMNS,
        ResourceKind::Bin => BIN_COLUMNS,
    }
}

/// Header row plus one CRLF-terminated line per record.
pub fn to_csv<'a, R, I>(rows: I, columns: &[Column]) -> String
where
    R: Record + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut out = String::new();
    write_line(&mut out, columns.iter().map(|c| c.header));
    for row in rows {
        let values: Vec<_> = columns.iter().map(|c| row.field(c.field)).collect();
        write_line(&mut out, values.iter().map(|v| v.render()));
    }
    out
}

fn write_line<S: AsRef<str>>(out: &mut String, cells: impl Iterator<Item = S>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell.as_ref());
    }
    out.push_str("\r\n");
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

#[cfg(test)]
mod tests {
    use board_core::{Job, Resource};

    use super::*;
    use crate::projection::{ViewQuery, project};

    #[test]
    fn quotes_only_when_needed() {
        let mut out = String::new();
        write_line(&mut out, ["plain", "a,b", "say \"hi\"", "two\nlines"].into_iter());
        assert_eq!(out, "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n");
    }

    #[test]
    fn bins_export_with_bin_code_header() {
        let bins = vec![
            Resource::new("A01-R01-L01", ResourceKind::Bin, 50.0).with_zone("A"),
            Resource::new("B02-R01-L02", ResourceKind::Bin, 25.0).with_zone("B"),
        ];
        let csv = to_csv(&bins, resource_columns(ResourceKind::Bin));
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], "Bin Code,Zone,Type,Status,Item,Capacity,Description,Tags");
        assert_eq!(lines[1], "A01-R01-L01,A,,available,,50,A01-R01-L01,");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "");
    }

    #[test]
    fn exports_the_projected_page() {
        let jobs = vec![
            Job::new("Oil Change", "John Smith", 1.0).with_subject("Toyota Camry"),
            Job::new("Brake Repair", "Sarah Johnson, Jr.", 3.0).with_subject("BMW X5"),
        ];
        let view = project(&jobs, &ViewQuery::new().search("brake"));
        let csv = to_csv(view.items.iter().copied(), JOB_COLUMNS);

        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("Brake Repair,BMW X5,\"Sarah Johnson, Jr.\",medium,pending,"));
        assert!(!csv.contains("Oil Change"));
    }
}
