use std::path::PathBuf;

use shiftrev_recon::config::{DuplicatePolicy, ReconConfig};
use shiftrev_recon::model::{
    FacilitySource, IssueKind, MatchPass, RawStaffRow, ReconInput, ReconResult, ShiftClass,
    Source,
};
use shiftrev_recon::report::{self, AGGREGATE_FILE};
use shiftrev_recon::run;
use shiftrev_recon::source::{load_collections_csv, load_staffing_csv};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config() -> ReconConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("shc.recon.toml")).unwrap();
    ReconConfig::from_toml(&toml).unwrap()
}

fn load_input(config: &ReconConfig) -> ReconInput {
    let dir = fixtures_dir();
    let read = |name: &Option<String>| {
        let path = dir.join(name.as_deref().unwrap());
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    };
    ReconInput {
        staffing: load_staffing_csv(&read(&config.staffing.file), &config.staffing.columns).unwrap(),
        collections: load_collections_csv(&read(&config.collections.file), &config.collections.columns)
            .unwrap(),
    }
}

fn load_and_run(config: &ReconConfig) -> ReconResult {
    let input = load_input(config);
    run(config, &input).unwrap()
}

fn total_expected(result: &ReconResult) -> i64 {
    result.matched.iter().map(|m| m.revenue.expected_cents).sum()
}

// -------------------------------------------------------------------------
// Fixture run
// -------------------------------------------------------------------------

#[test]
fn fixture_config_matches_builtin_tables() {
    let config = load_config();
    let builtin = ReconConfig::default();
    assert_eq!(config.identity.overrides, builtin.identity.overrides);
    assert_eq!(config.facilities, builtin.facilities);
    assert_eq!(config.shifts.weekend_rewrites, builtin.shifts.weekend_rewrites);
}

#[test]
fn diagnostics_cover_every_category() {
    let result = load_and_run(&load_config());
    let d = &result.diagnostics;

    assert_eq!(d.staffing_rows, 12);
    assert_eq!(d.collection_rows, 11);
    assert_eq!(d.blank_rows, 1);
    assert_eq!(d.malformed_staffing, 1);
    assert_eq!(d.malformed_collections, 1);
    assert_eq!(d.ambiguous_identities, 0);
    assert_eq!(d.duplicate_groups, 1);
    assert_eq!(d.duplicate_rows, 2);
    assert_eq!(d.matched_primary, 6);
    assert_eq!(d.matched_fallback, 3);
    assert_eq!(d.unattributed_shifts, 2);
    assert_eq!(d.unattributed_revenue, 1);
    assert_eq!(d.unknown_facility, 1);
    assert!(d.has_data_quality_issues());
}

#[test]
fn rejected_rows_carry_source_lines() {
    let result = load_and_run(&load_config());
    assert_eq!(result.issues.len(), 2);

    let staff_issue = result.issues.iter().find(|i| i.source == Source::Staffing).unwrap();
    assert_eq!(staff_issue.kind, IssueKind::MalformedName);
    assert_eq!(staff_issue.line, 11);
    assert_eq!(staff_issue.detail, "Nobody Here");

    let case_issue = result.issues.iter().find(|i| i.source == Source::Collections).unwrap();
    assert_eq!(case_issue.kind, IssueKind::MalformedDate);
    assert_eq!(case_issue.line, 12);
}

#[test]
fn duplicate_group_flagged_with_revenue() {
    let result = load_and_run(&load_config());
    assert_eq!(result.duplicate_groups.len(), 1);
    let group = &result.duplicate_groups[0];
    assert_eq!(group.key.as_str(), "SMITH_2020-01-02");
    assert_eq!(group.records.len(), 2);
    assert!(group.has_revenue);

    // First row claims the revenue; the second ends up unattributed
    let smith: Vec<_> = result.matched.iter().filter(|m| m.staff.last_name == "SMITH").collect();
    assert_eq!(smith.len(), 2);
    assert!(smith.iter().all(|m| m.staff.shift == "MV Day"));
    assert!(result
        .unattributed_shifts
        .iter()
        .any(|u| u.staff.shift == "MV Night" && u.facility.as_deref() == Some("MOUNTAIN VISTA-MAIN")));
}

#[test]
fn weekend_call_renamed_and_matched_in_primary_pass() {
    let result = load_and_run(&load_config());
    let jones_sat = result
        .matched
        .iter()
        .find(|m| m.key.as_str() == "JONES_2020-01-04")
        .unwrap();
    assert_eq!(jones_sat.staff.shift, "MV WE Call 1");
    assert_eq!(jones_sat.staff.class, ShiftClass::OnCallWeekend);
    assert_eq!(jones_sat.pass, MatchPass::Primary);
}

#[test]
fn weekday_call_matches_only_in_fallback() {
    let result = load_and_run(&load_config());
    let jones_wed = result
        .matched
        .iter()
        .find(|m| m.key.as_str() == "JONES_2020-01-08")
        .unwrap();
    assert_eq!(jones_wed.staff.shift, "MV Call 1");
    assert_eq!(jones_wed.staff.class, ShiftClass::OnCallWeekday);
    assert_eq!(jones_wed.pass, MatchPass::Fallback);
}

#[test]
fn physician_call_fallback_infers_mountain_vista() {
    let result = load_and_run(&load_config());
    let patel = result
        .matched
        .iter()
        .find(|m| m.staff.last_name == "PATEL")
        .unwrap();
    assert_eq!(patel.pass, MatchPass::Fallback);
    assert_eq!(patel.facility.as_deref(), Some("MOUNTAIN VISTA-MAIN"));
    assert_eq!(patel.facility_source, FacilitySource::ShiftLabel);
}

#[test]
fn ryans_stay_separate() {
    let result = load_and_run(&load_config());
    let g = result.matched.iter().find(|m| m.key.as_str() == "RYANG_2020-01-10").unwrap();
    let c = result.matched.iter().find(|m| m.key.as_str() == "RYANC_2020-01-10").unwrap();
    assert_eq!(g.staff.provider_raw_name, "Ryan, G.");
    assert_eq!(g.revenue.provider_raw_name, "RYAN, WILLIAM G");
    assert_eq!(g.revenue.expected_cents, 70000);
    assert_eq!(c.staff.provider_raw_name, "Ryan, C.");
    assert_eq!(c.revenue.provider_raw_name, "RYAN, CRAIG");
    assert_ne!(g.key, c.key);
}

#[test]
fn primary_match_without_collection_facility_uses_label() {
    let result = load_and_run(&load_config());
    let lee = result.matched.iter().find(|m| m.staff.last_name == "LEE").unwrap();
    assert_eq!(lee.pass, MatchPass::Primary);
    assert_eq!(lee.facility.as_deref(), Some("TEMPE ST LUKES  MEDICAL CENTER"));
    assert_eq!(lee.facility_source, FacilitySource::ShiftLabel);
}

#[test]
fn unknown_facility_flagged_not_defaulted() {
    let result = load_and_run(&load_config());
    let kim = result.matched.iter().find(|m| m.staff.last_name == "KIM").unwrap();
    assert!(kim.facility.is_none());
    assert_eq!(kim.facility_source, FacilitySource::Unknown);
}

#[test]
fn unattributed_revenue_is_brown() {
    let result = load_and_run(&load_config());
    assert_eq!(result.unattributed_revenue.len(), 1);
    assert_eq!(result.unattributed_revenue[0].provider_raw_name, "BROWN, TOM");
    assert!(result.unattributed_shifts.iter().any(|u| u.staff.last_name == "GARCIA"));
}

// -------------------------------------------------------------------------
// Aggregate report
// -------------------------------------------------------------------------

#[test]
fn aggregate_report_golden() {
    let result = load_and_run(&load_config());
    let mut buf = Vec::new();
    report::write_aggregate_report(&mut buf, &result.report).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let expected = "\
year,month,Facility,Shift,LookUp,Expected,Payments - All,Balance
2020,1,,Total,1,60.00,60.00,0.00
2020,1,,Admin Call,1,60.00,60.00,0.00
2020,1,MOUNTAIN VISTA-MAIN,Total,4,2200.00,1250.00,950.00
2020,1,MOUNTAIN VISTA-MAIN,MV Call 1,1,150.00,150.00,0.00
2020,1,MOUNTAIN VISTA-MAIN,MV Day,1,750.00,550.00,200.00
2020,1,MOUNTAIN VISTA-MAIN,MV WE Call 1,1,400.00,100.00,300.00
2020,1,MOUNTAIN VISTA-MAIN,Physician Call,1,900.00,450.00,450.00
2020,1,ST LUKES MEDICAL CENTER LP,Total,1,600.00,600.00,0.00
2020,1,ST LUKES MEDICAL CENTER LP,PSL Day,1,600.00,600.00,0.00
2020,1,TEMPE ST LUKES  MEDICAL CENTER,Total,1,700.00,500.00,200.00
2020,1,TEMPE ST LUKES  MEDICAL CENTER,TSL Day,1,700.00,500.00,200.00
2020,2,TEMPE ST LUKES  MEDICAL CENTER,Total,1,120.00,20.00,100.00
2020,2,TEMPE ST LUKES  MEDICAL CENTER,St. Luke's Swing,1,120.00,20.00,100.00
";
    assert_eq!(text, expected);
}

#[test]
fn totals_conserve_matched_revenue() {
    let result = load_and_run(&load_config());
    let totals = result.report.iter().filter(|r| r.is_total());
    let (expected, payments, balance) = totals.fold((0, 0, 0), |acc, r| {
        (acc.0 + r.expected_cents, acc.1 + r.payments_cents, acc.2 + r.balance_cents)
    });
    assert_eq!(expected, total_expected(&result));
    assert_eq!(expected, 368000);
    assert_eq!(payments, result.matched.iter().map(|m| m.revenue.payments_cents).sum::<i64>());
    assert_eq!(balance, result.matched.iter().map(|m| m.revenue.balance_cents).sum::<i64>());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let config = load_config();
    let render = || {
        let result = load_and_run(&config);
        let mut buf = Vec::new();
        report::write_aggregate_report(&mut buf, &result.report).unwrap();
        buf
    };
    assert_eq!(render(), render());
}

#[test]
fn write_all_creates_every_report() {
    let result = load_and_run(&load_config());
    let dir = tempfile::tempdir().unwrap();
    let written = report::write_all(dir.path(), &result).unwrap();
    assert_eq!(written.len(), 6);
    for path in &written {
        assert!(path.exists(), "missing {}", path.display());
    }

    let dupes = std::fs::read_to_string(dir.path().join(report::DUPLICATED_SHIFTS_FILE)).unwrap();
    let lines: Vec<&str> = dupes.lines().collect();
    assert_eq!(
        lines[0],
        "User,Date,Shift,Last Name,First Name,Staff_Day,Provider has Cases on Date"
    );
    assert_eq!(lines[1], "\"Smith, John\",2020-01-02,MV Day,SMITH,John,Thursday,True");
    assert_eq!(lines[2], "\"Smith, John\",2020-01-02,MV Night,SMITH,John,Thursday,True");

    let aggregate = std::fs::read_to_string(dir.path().join(AGGREGATE_FILE)).unwrap();
    assert_eq!(aggregate.lines().count(), 14);

    let revenue = std::fs::read_to_string(dir.path().join(report::UNATTRIBUTED_REVENUE_FILE)).unwrap();
    assert_eq!(
        revenue.lines().nth(1),
        Some("\"BROWN, TOM\",2020-01-11,99283,80.00,80.00,0.00,FLORENCE,BROWN,TOM,Saturday")
    );
}

// -------------------------------------------------------------------------
// Policies
// -------------------------------------------------------------------------

#[test]
fn keep_all_double_counts_duplicate_shifts() {
    let mut config = load_config();
    config.identity.duplicates = DuplicatePolicy::KeepAll;
    let result = load_and_run(&config);

    // Both Smith rows join both Smith cases
    let smith = result.matched.iter().filter(|m| m.staff.last_name == "SMITH").count();
    assert_eq!(smith, 4);
    assert_eq!(total_expected(&result), 368000 + 75000);
    assert_eq!(result.diagnostics.unattributed_shifts, 1);
    assert_eq!(result.meta.duplicate_policy, DuplicatePolicy::KeepAll);
}

#[test]
fn override_table_is_injected_not_global() {
    let mut config = load_config();
    config.identity.overrides.clear();
    let result = load_and_run(&config);

    // Without overrides the Ryans collide on RYAN_2020-01-10 and are flagged
    assert_eq!(result.diagnostics.ambiguous_identities, 4);
    assert!(result.matched.iter().all(|m| !m.key.as_str().starts_with("RYAN")));
}

#[test]
fn staffing_only_input_leaves_every_shift_unattributed() {
    let config = ReconConfig::default();
    let input = ReconInput {
        staffing: vec![RawStaffRow {
            line: 2,
            user: "Smith, John".into(),
            date: "01/02/20".into(),
            shift: "MV Day".into(),
        }],
        collections: vec![],
    };
    let result = run(&config, &input).unwrap();
    assert!(result.report.is_empty());
    assert_eq!(result.diagnostics.unattributed_shifts, 1);
}
