use crate::model::{
    CollectionRecord, Diagnostics, DuplicateGroup, FacilitySource, IssueKind, MatchPass,
    MatchedPair, RowIssue, Source, UnattributedShift,
};

/// Input-side counts gathered while normalizing.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntakeCounts {
    pub staffing_rows: usize,
    pub collection_rows: usize,
    pub blank_rows: usize,
}

/// Compute the diagnostic counts from the outputs of one run.
pub fn compute_diagnostics(
    intake: IntakeCounts,
    issues: &[RowIssue],
    duplicate_groups: &[DuplicateGroup],
    matched: &[MatchedPair],
    unattributed_shifts: &[UnattributedShift],
    unattributed_revenue: &[CollectionRecord],
) -> Diagnostics {
    let mut d = Diagnostics {
        staffing_rows: intake.staffing_rows,
        collection_rows: intake.collection_rows,
        blank_rows: intake.blank_rows,
        ..Default::default()
    };

    for issue in issues {
        match (issue.kind, issue.source) {
            (IssueKind::AmbiguousIdentity, _) => d.ambiguous_identities += 1,
            (_, Source::Staffing) => d.malformed_staffing += 1,
            (_, Source::Collections) => d.malformed_collections += 1,
        }
    }

    d.duplicate_groups = duplicate_groups.len();
    d.duplicate_rows = duplicate_groups.iter().map(|g| g.records.len()).sum();

    for m in matched {
        match m.pass {
            MatchPass::Primary => d.matched_primary += 1,
            MatchPass::Fallback => d.matched_fallback += 1,
        }
        if m.facility_source == FacilitySource::Unknown {
            d.unknown_facility += 1;
        }
    }

    d.unattributed_shifts = unattributed_shifts.len();
    d.unattributed_revenue = unattributed_revenue.len();
    d
}
