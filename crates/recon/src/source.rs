//! CSV loaders for the two source tables. A missing mapped column aborts
//! the run; everything row-level is left to the normalizer.

use crate::config::{CollectionColumns, StaffingColumns};
use crate::error::ReconError;
use crate::model::{RawCollectionRow, RawStaffRow, Source};

struct Table<'a> {
    headers: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
}

fn open(source: Source, csv_data: &str) -> Result<Table<'_>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv { source, message: e.to_string() })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    Ok(Table { headers, reader })
}

impl Table<'_> {
    fn index(&self, source: Source, column: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h == column.trim())
            .ok_or_else(|| ReconError::MissingColumn {
                source,
                column: column.into(),
            })
    }
}

/// Line number of a record; falls back to its ordinal (header = line 1).
fn line_of(record: &csv::StringRecord, ordinal: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(ordinal + 2)
}

pub fn load_staffing_csv(
    csv_data: &str,
    columns: &StaffingColumns,
) -> Result<Vec<RawStaffRow>, ReconError> {
    let source = Source::Staffing;
    let mut table = open(source, csv_data)?;

    let user_idx = table.index(source, &columns.user)?;
    let date_idx = table.index(source, &columns.date)?;
    let shift_idx = table.index(source, &columns.shift)?;

    let mut rows = Vec::new();
    for (i, record) in table.reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Csv { source, message: e.to_string() })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        rows.push(RawStaffRow {
            line: line_of(&record, i),
            user: field(user_idx),
            date: field(date_idx),
            shift: field(shift_idx),
        });
    }

    Ok(rows)
}

pub fn load_collections_csv(
    csv_data: &str,
    columns: &CollectionColumns,
) -> Result<Vec<RawCollectionRow>, ReconError> {
    let source = Source::Collections;
    let mut table = open(source, csv_data)?;

    let provider_idx = table.index(source, &columns.provider)?;
    let date_idx = table.index(source, &columns.date_of_service)?;
    let cpt_idx = table.index(source, &columns.cpt)?;
    let expected_idx = table.index(source, &columns.expected)?;
    let payments_idx = table.index(source, &columns.payments)?;
    let balance_idx = table.index(source, &columns.balance)?;
    let facility_idx = table.index(source, &columns.facility)?;

    let mut rows = Vec::new();
    for (i, record) in table.reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Csv { source, message: e.to_string() })?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        rows.push(RawCollectionRow {
            line: line_of(&record, i),
            provider: field(provider_idx),
            date_of_service: field(date_idx),
            cpt: field(cpt_idx),
            expected: field(expected_idx),
            payments: field(payments_idx),
            balance: field(balance_idx),
            facility: field(facility_idx),
        });
    }

    Ok(rows)
}
