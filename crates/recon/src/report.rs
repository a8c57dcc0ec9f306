//! CSV report writers. Column names and order are consumed downstream and
//! must not change.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ReconError;
use crate::model::{
    AggregateRow, CollectionRecord, Diagnostics, DuplicateGroup, ReconResult, RowIssue,
    StaffRecord, UnattributedShift,
};
use crate::normalize::{day_name, format_cents};

pub const UNATTRIBUTED_SHIFTS_FILE: &str = "Unattributed_Shifts.csv";
pub const UNATTRIBUTED_REVENUE_FILE: &str = "Unattributed_Revenue.csv";
pub const DUPLICATED_SHIFTS_FILE: &str = "Duplicated_Shifts.csv";
pub const AGGREGATE_FILE: &str = "Sum_By_Shift_By_Facility.csv";
pub const DIAGNOSTICS_FILE: &str = "Diagnostics.csv";
pub const REJECTED_ROWS_FILE: &str = "Rejected_Rows.csv";

pub const UNATTRIBUTED_SHIFTS_HEADER: [&str; 7] = [
    "User", "Date", "Shift", "Last Name", "First Name", "Staff_Day", "Facility",
];

pub const UNATTRIBUTED_REVENUE_HEADER: [&str; 10] = [
    "Rendering Provider",
    "Date of Service - Case",
    "CPT",
    "Expected",
    "Payments - All",
    "Balance",
    "Facility",
    "Last Name",
    "First Name",
    "Case_Day",
];

pub const DUPLICATED_SHIFTS_HEADER: [&str; 7] = [
    "User",
    "Date",
    "Shift",
    "Last Name",
    "First Name",
    "Staff_Day",
    "Provider has Cases on Date",
];

pub const AGGREGATE_HEADER: [&str; 8] = [
    "year", "month", "Facility", "Shift", "LookUp", "Expected", "Payments - All", "Balance",
];

fn csv_err(e: csv::Error) -> ReconError {
    ReconError::Io(e.to_string())
}

fn staff_fields(s: &StaffRecord) -> [String; 6] {
    [
        s.provider_raw_name.clone(),
        s.date.format("%Y-%m-%d").to_string(),
        s.shift.clone(),
        s.last_name.clone(),
        s.first_name.clone(),
        day_name(s.day_of_week).to_string(),
    ]
}

pub fn write_unattributed_shifts<W: Write>(
    out: W,
    shifts: &[UnattributedShift],
) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(UNATTRIBUTED_SHIFTS_HEADER).map_err(csv_err)?;
    for u in shifts {
        let [user, date, shift, last, first, day] = staff_fields(&u.staff);
        let facility = u.facility.clone().unwrap_or_default();
        w.write_record([user, date, shift, last, first, day, facility])
            .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_unattributed_revenue<W: Write>(
    out: W,
    revenue: &[CollectionRecord],
) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(UNATTRIBUTED_REVENUE_HEADER).map_err(csv_err)?;
    for r in revenue {
        w.write_record([
            r.provider_raw_name.clone(),
            r.date_of_service.format("%Y-%m-%d").to_string(),
            r.cpt.clone(),
            format_cents(r.expected_cents),
            format_cents(r.payments_cents),
            format_cents(r.balance_cents),
            r.facility.clone().unwrap_or_default(),
            r.last_name.clone(),
            r.first_name.clone(),
            day_name(r.day_of_week).to_string(),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

/// One row per duplicated shift; rows of a group are contiguous.
pub fn write_duplicate_groups<W: Write>(
    out: W,
    groups: &[DuplicateGroup],
) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(DUPLICATED_SHIFTS_HEADER).map_err(csv_err)?;
    for g in groups {
        let flag = if g.has_revenue { "True" } else { "False" };
        for s in &g.records {
            let [user, date, shift, last, first, day] = staff_fields(s);
            w.write_record([user, date, shift, last, first, day, flag.to_string()])
                .map_err(csv_err)?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn write_aggregate_report<W: Write>(out: W, rows: &[AggregateRow]) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(AGGREGATE_HEADER).map_err(csv_err)?;
    for r in rows {
        w.write_record([
            r.year.to_string(),
            r.month.to_string(),
            r.facility.clone().unwrap_or_default(),
            r.shift_label().to_string(),
            r.shift_count.to_string(),
            format_cents(r.expected_cents),
            format_cents(r.payments_cents),
            format_cents(r.balance_cents),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_diagnostics<W: Write>(out: W, diagnostics: &Diagnostics) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["Category", "Count"]).map_err(csv_err)?;
    for (category, count) in diagnostics.categories() {
        w.write_record([category.to_string(), count.to_string()])
            .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_rejected_rows<W: Write>(out: W, issues: &[RowIssue]) -> Result<(), ReconError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["Source", "Line", "Issue", "Detail"]).map_err(csv_err)?;
    for i in issues {
        w.write_record([
            i.source.to_string(),
            i.line.to_string(),
            i.kind.to_string(),
            i.detail.clone(),
        ])
        .map_err(csv_err)?;
    }
    w.flush()?;
    Ok(())
}

/// Write every report into `dir` (created if missing). Returns the paths
/// in the order written.
pub fn write_all(dir: &Path, result: &ReconResult) -> Result<Vec<PathBuf>, ReconError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", dir.display())))?;

    let create = |name: &str| -> Result<(PathBuf, std::io::BufWriter<std::fs::File>), ReconError> {
        let path = dir.join(name);
        let file = std::fs::File::create(&path)
            .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;
        Ok((path, std::io::BufWriter::new(file)))
    };

    let mut written = Vec::with_capacity(6);

    let (path, f) = create(UNATTRIBUTED_SHIFTS_FILE)?;
    write_unattributed_shifts(f, &result.unattributed_shifts)?;
    written.push(path);

    let (path, f) = create(UNATTRIBUTED_REVENUE_FILE)?;
    write_unattributed_revenue(f, &result.unattributed_revenue)?;
    written.push(path);

    let (path, f) = create(DUPLICATED_SHIFTS_FILE)?;
    write_duplicate_groups(f, &result.duplicate_groups)?;
    written.push(path);

    let (path, f) = create(AGGREGATE_FILE)?;
    write_aggregate_report(f, &result.report)?;
    written.push(path);

    let (path, f) = create(DIAGNOSTICS_FILE)?;
    write_diagnostics(f, &result.diagnostics)?;
    written.push(path);

    let (path, f) = create(REJECTED_ROWS_FILE)?;
    write_rejected_rows(f, &result.issues)?;
    written.push(path);

    Ok(written)
}
