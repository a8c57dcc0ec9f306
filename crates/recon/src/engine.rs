use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::aggregate::build_report;
use crate::classify::ShiftClassifier;
use crate::config::ReconConfig;
use crate::diagnostics::{compute_diagnostics, IntakeCounts};
use crate::error::ReconError;
use crate::facility::FacilityInference;
use crate::identity::NameDisambiguator;
use crate::matcher::{find_duplicate_groups, join_on_identity, PassOutput};
use crate::model::{
    CollectionRecord, IdentityKey, IssueKind, MatchPass, MatchedPair, ReconInput, ReconMeta,
    ReconResult, RowIssue, ShiftClass, Source, StaffRecord, UnattributedShift,
};
use crate::normalize::{normalize_collection_row, normalize_staff_row};

/// Run the full reconciliation: normalize, disambiguate, classify, two join
/// passes, facility resolution, aggregation.
///
/// Row-level defects are reported on the result; only an invalid config
/// fails the run.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let identity = NameDisambiguator::from_config(&config.identity);
    let classifier = ShiftClassifier::from_config(&config.shifts);
    let facilities = FacilityInference::new(config.facilities.clone());
    let policy = config.identity.duplicates;

    let mut issues: Vec<RowIssue> = Vec::new();
    let mut intake = IntakeCounts {
        staffing_rows: input.staffing.len(),
        collection_rows: input.collections.len(),
        blank_rows: 0,
    };

    // -- Normalize + disambiguate -------------------------------------------

    let mut staff: Vec<StaffRecord> = Vec::with_capacity(input.staffing.len());
    for row in &input.staffing {
        match normalize_staff_row(row, &config.date_formats) {
            Ok(Some(rec)) => staff.push(StaffRecord {
                last_name: identity.resolve(&rec.provider_raw_name).unwrap_or(rec.last_name),
                ..rec
            }),
            Ok(None) => intake.blank_rows += 1,
            Err(issue) => issues.push(issue),
        }
    }

    let mut revenue: Vec<CollectionRecord> = Vec::with_capacity(input.collections.len());
    for row in &input.collections {
        match normalize_collection_row(row, &config.date_formats) {
            Ok(Some(rec)) => revenue.push(CollectionRecord {
                last_name: identity.resolve(&rec.provider_raw_name).unwrap_or(rec.last_name),
                ..rec
            }),
            Ok(None) => intake.blank_rows += 1,
            Err(issue) => issues.push(issue),
        }
    }

    if config.identity.flag_ambiguous_surnames {
        staff = reject_ambiguous(&identity, staff, Source::Staffing, &mut issues, |r| {
            (r.provider_raw_name.as_str(), r.last_name.as_str(), r.first_name.as_str(), r.line)
        });
        revenue = reject_ambiguous(&identity, revenue, Source::Collections, &mut issues, |r| {
            (r.provider_raw_name.as_str(), r.last_name.as_str(), r.first_name.as_str(), r.line)
        });
    }

    log_issues(&issues);
    debug!(
        staff = staff.len(),
        revenue = revenue.len(),
        rejected = issues.len(),
        blank = intake.blank_rows,
        "normalized sources"
    );

    // -- Classify shifts (before any filtering) -----------------------------

    let staff: Vec<StaffRecord> = staff.into_iter().map(|r| classifier.classify(r)).collect();
    let (working, held_back): (Vec<StaffRecord>, Vec<StaffRecord>) = staff
        .into_iter()
        .partition(|r| r.class != ShiftClass::OnCallWeekday);

    // -- Duplicates (reported only) -----------------------------------------

    let revenue_keys: HashSet<IdentityKey> = revenue.iter().map(|r| r.key()).collect();
    let duplicate_groups = find_duplicate_groups(&working, &revenue_keys);

    // -- Pass 1: regular + weekend on-call against all revenue --------------

    let primary = join_on_identity(working, revenue, policy);
    debug!(
        matched = primary.matched.len(),
        shift_only = primary.shift_only.len(),
        revenue_only = primary.revenue_only.len(),
        held_back = held_back.len(),
        "primary pass"
    );

    // -- Pass 2: leftovers + weekday on-call against leftover revenue -------

    let PassOutput {
        matched: primary_matched,
        shift_only: mut retry,
        revenue_only,
    } = primary;
    retry.extend(held_back);
    let fallback = join_on_identity(retry, revenue_only, policy);
    debug!(
        matched = fallback.matched.len(),
        shift_only = fallback.shift_only.len(),
        revenue_only = fallback.revenue_only.len(),
        "fallback pass"
    );

    // -- Facilities ----------------------------------------------------------

    let mut matched: Vec<MatchedPair> =
        Vec::with_capacity(primary_matched.len() + fallback.matched.len());
    let passes = [
        (MatchPass::Primary, primary_matched),
        (MatchPass::Fallback, fallback.matched),
    ];
    for (pass, pairs) in passes {
        for (staff, revenue) in pairs {
            let (facility, facility_source) = facilities.resolve(pass, &staff, &revenue);
            matched.push(MatchedPair {
                key: staff.key(),
                report_date: staff.date,
                staff,
                revenue,
                pass,
                facility,
                facility_source,
            });
        }
    }

    let unattributed_shifts: Vec<UnattributedShift> = fallback
        .shift_only
        .into_iter()
        .map(|staff| UnattributedShift {
            facility: facilities.infer(&staff.shift).map(String::from),
            staff,
        })
        .collect();
    let unattributed_revenue = fallback.revenue_only;

    // -- Aggregate -------------------------------------------------------------

    let report = build_report(&matched);

    let diagnostics = compute_diagnostics(
        intake,
        &issues,
        &duplicate_groups,
        &matched,
        &unattributed_shifts,
        &unattributed_revenue,
    );
    if diagnostics.unknown_facility > 0 {
        warn!(count = diagnostics.unknown_facility, "matched revenue with unknown facility");
    }
    if diagnostics.duplicate_groups > 0 {
        warn!(
            groups = diagnostics.duplicate_groups,
            rows = diagnostics.duplicate_rows,
            "duplicate shifts for the same provider and date"
        );
    }

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            duplicate_policy: policy,
        },
        diagnostics,
        issues,
        matched,
        unattributed_shifts,
        unattributed_revenue,
        duplicate_groups,
        report,
    })
}

/// Drop records whose surname key is ambiguous within their source,
/// recording each as an `AmbiguousIdentity` issue.
fn reject_ambiguous<T, F>(
    identity: &NameDisambiguator,
    records: Vec<T>,
    source: Source,
    issues: &mut Vec<RowIssue>,
    fields: F,
) -> Vec<T>
where
    F: Fn(&T) -> (&str, &str, &str, usize),
{
    let ambiguous: BTreeSet<String> = identity.ambiguous_surnames(records.iter().map(|r| {
        let (raw, surname, first, _) = fields(r);
        (raw, surname, first)
    }));
    if ambiguous.is_empty() {
        return records;
    }

    let mut kept = Vec::with_capacity(records.len());
    for r in records {
        let (raw, surname, _, line) = fields(&r);
        if ambiguous.contains(surname) && !identity.is_overridden(raw) {
            issues.push(RowIssue {
                source,
                line,
                kind: IssueKind::AmbiguousIdentity,
                detail: format!("surname {surname} shared by several providers: {raw}"),
            });
        } else {
            kept.push(r);
        }
    }
    kept
}

fn log_issues(issues: &[RowIssue]) {
    for kind in [
        IssueKind::MalformedName,
        IssueKind::MalformedDate,
        IssueKind::MalformedAmount,
        IssueKind::MissingField,
        IssueKind::AmbiguousIdentity,
    ] {
        let count = issues.iter().filter(|i| i.kind == kind).count();
        if count > 0 {
            warn!(kind = %kind, count, "rejected rows");
        }
    }
}
