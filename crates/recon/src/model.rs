use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::config::DuplicatePolicy;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Staffing,
    Collections,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staffing => write!(f, "staffing"),
            Self::Collections => write!(f, "collections"),
        }
    }
}

/// One staffing row as read from the source table, untouched.
#[derive(Debug, Clone, Default)]
pub struct RawStaffRow {
    /// 1-based line in the source file (header is line 1).
    pub line: usize,
    pub user: String,
    pub date: String,
    pub shift: String,
}

/// One collections row as read from the source table, untouched.
#[derive(Debug, Clone, Default)]
pub struct RawCollectionRow {
    pub line: usize,
    pub provider: String,
    pub date_of_service: String,
    pub cpt: String,
    pub expected: String,
    pub payments: String,
    pub balance: String,
    pub facility: String,
}

/// Both tables, fully loaded.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub staffing: Vec<RawStaffRow>,
    pub collections: Vec<RawCollectionRow>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Join key: surname key + canonical date. Equality is the only operation
/// that matters; ordering exists for deterministic maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(surname_key: &str, date: NaiveDate) -> Self {
        Self(format!("{surname_key}_{}", date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftClass {
    #[default]
    Regular,
    OnCallWeekday,
    OnCallWeekend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffRecord {
    pub line: usize,
    pub provider_raw_name: String,
    pub last_name: String,
    pub first_name: String,
    pub date: NaiveDate,
    pub shift: String,
    pub day_of_week: Weekday,
    pub class: ShiftClass,
}

impl StaffRecord {
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.last_name, self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRecord {
    pub line: usize,
    pub provider_raw_name: String,
    pub last_name: String,
    pub first_name: String,
    pub date_of_service: NaiveDate,
    pub day_of_week: Weekday,
    pub cpt: String,
    pub expected_cents: i64,
    pub payments_cents: i64,
    pub balance_cents: i64,
    pub facility: Option<String>,
}

impl CollectionRecord {
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.last_name, self.date_of_service)
    }
}

// ---------------------------------------------------------------------------
// Row issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Provider name lacks the "Last, First" separator.
    MalformedName,
    MalformedDate,
    MalformedAmount,
    /// A required field is empty on an otherwise populated row.
    MissingField,
    /// Surname shared by distinct providers with no override separating them.
    AmbiguousIdentity,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedName => write!(f, "malformed_name"),
            Self::MalformedDate => write!(f, "malformed_date"),
            Self::MalformedAmount => write!(f, "malformed_amount"),
            Self::MissingField => write!(f, "missing_field"),
            Self::AmbiguousIdentity => write!(f, "ambiguous_identity"),
        }
    }
}

/// A rejected row. Excluded from both join passes, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub source: Source,
    pub line: usize,
    pub kind: IssueKind,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilitySource {
    Collections,
    ShiftLabel,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair {
    pub key: IdentityKey,
    pub staff: StaffRecord,
    pub revenue: CollectionRecord,
    pub pass: MatchPass,
    pub facility: Option<String>,
    pub facility_source: FacilitySource,
    pub report_date: NaiveDate,
}

impl MatchedPair {
    pub fn year(&self) -> i32 {
        self.report_date.year()
    }

    pub fn month(&self) -> u32 {
        self.report_date.month()
    }
}

/// A shift that ended both passes without revenue.
#[derive(Debug, Clone, Serialize)]
pub struct UnattributedShift {
    pub staff: StaffRecord,
    pub facility: Option<String>,
}

/// Staffing rows sharing one identity key in the primary working set.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub key: IdentityKey,
    pub records: Vec<StaffRecord>,
    pub has_revenue: bool,
}

/// One row of the monthly report. `shift` is `None` on the facility rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub year: i32,
    pub month: u32,
    pub facility: Option<String>,
    pub shift: Option<String>,
    pub shift_count: usize,
    pub expected_cents: i64,
    pub payments_cents: i64,
    pub balance_cents: i64,
}

impl AggregateRow {
    pub const TOTAL_LABEL: &'static str = "Total";

    pub fn is_total(&self) -> bool {
        self.shift.is_none()
    }

    pub fn shift_label(&self) -> &str {
        self.shift.as_deref().unwrap_or(Self::TOTAL_LABEL)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics + Result
// ---------------------------------------------------------------------------

/// Counts an operator checks before trusting the financial totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub staffing_rows: usize,
    pub collection_rows: usize,
    pub blank_rows: usize,
    pub malformed_staffing: usize,
    pub malformed_collections: usize,
    pub ambiguous_identities: usize,
    pub duplicate_groups: usize,
    pub duplicate_rows: usize,
    pub matched_primary: usize,
    pub matched_fallback: usize,
    pub unattributed_shifts: usize,
    pub unattributed_revenue: usize,
    pub unknown_facility: usize,
}

impl Diagnostics {
    /// Category/count pairs in report order.
    pub fn categories(&self) -> [(&'static str, usize); 13] {
        [
            ("staffing_rows", self.staffing_rows),
            ("collection_rows", self.collection_rows),
            ("blank_rows", self.blank_rows),
            ("malformed_staffing", self.malformed_staffing),
            ("malformed_collections", self.malformed_collections),
            ("ambiguous_identities", self.ambiguous_identities),
            ("duplicate_groups", self.duplicate_groups),
            ("duplicate_rows", self.duplicate_rows),
            ("matched_primary", self.matched_primary),
            ("matched_fallback", self.matched_fallback),
            ("unattributed_shifts", self.unattributed_shifts),
            ("unattributed_revenue", self.unattributed_revenue),
            ("unknown_facility", self.unknown_facility),
        ]
    }

    /// Any rejected row or unresolved facility.
    pub fn has_data_quality_issues(&self) -> bool {
        self.malformed_staffing > 0
            || self.malformed_collections > 0
            || self.ambiguous_identities > 0
            || self.unknown_facility > 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub diagnostics: Diagnostics,
    pub issues: Vec<RowIssue>,
    pub matched: Vec<MatchedPair>,
    pub unattributed_shifts: Vec<UnattributedShift>,
    pub unattributed_revenue: Vec<CollectionRecord>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub report: Vec<AggregateRow>,
}
