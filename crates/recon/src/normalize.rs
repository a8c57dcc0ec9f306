//! Record normalizer: raw table rows into typed staff/collection records.
//!
//! Pure transforms. A row either becomes a record, is recognised as blank
//! (`Ok(None)`), or is rejected with a [`RowIssue`].

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::{
    CollectionRecord, IssueKind, RawCollectionRow, RawStaffRow, RowIssue, ShiftClass, Source,
    StaffRecord,
};

/// Surname/first-name split of a "Last, First[ qualifiers]" field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderName {
    pub last_name: String,
    pub first_name: String,
}

/// Split on the first comma. Surname is upper-cased; both halves trimmed.
/// `None` when there is no comma or the surname is empty.
pub fn split_provider_name(raw: &str) -> Option<ProviderName> {
    let (last, first) = raw.split_once(',')?;
    let last = last.trim();
    if last.is_empty() {
        return None;
    }
    Some(ProviderName {
        last_name: last.to_uppercase(),
        first_name: first.trim().to_string(),
    })
}

/// Try each chrono format in order.
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
}

/// Parse a money field into cents. Accepts `$`, thousands separators,
/// a leading sign or parentheses for negatives, and at most two
/// significant fractional digits.
pub fn parse_amount_cents(raw: &str) -> Option<i64> {
    let mut s = raw.trim();
    let mut negations = 0;

    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        s = s[1..s.len() - 1].trim();
        negations += 1;
    }
    if let Some(rest) = s.strip_prefix('-') {
        s = rest;
        negations += 1;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if let Some(rest) = s.strip_prefix('$') {
        s = rest.trim_start();
        if let Some(rest) = s.strip_prefix('-') {
            s = rest;
            negations += 1;
        }
    }
    if negations > 1 {
        return None;
    }

    let digits: String = s.chars().filter(|c| *c != ',').collect();
    let (whole, frac) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let frac = if frac.len() > 2 {
        if !frac[2..].bytes().all(|b| b == b'0') {
            return None;
        }
        &frac[..2]
    } else {
        frac
    };

    let whole_cents = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().ok()?.checked_mul(100)?
    };
    let frac_cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse::<i64>().ok()?,
    };
    let cents = whole_cents.checked_add(frac_cents)?;

    Some(if negations == 1 { -cents } else { cents })
}

/// Render cents as `-1234.50`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn issue(source: Source, line: usize, kind: IssueKind, detail: String) -> RowIssue {
    RowIssue {
        source,
        line,
        kind,
        detail,
    }
}

/// Staffing row → record. Shift class starts as `Regular`; the shift
/// classifier assigns the real one.
pub fn normalize_staff_row(
    row: &RawStaffRow,
    date_formats: &[String],
) -> Result<Option<StaffRecord>, RowIssue> {
    let user = row.user.trim();
    let date_raw = row.date.trim();
    let shift = row.shift.trim();
    let src = Source::Staffing;

    if user.is_empty() && date_raw.is_empty() && shift.is_empty() {
        return Ok(None);
    }
    for (field, value) in [("user", user), ("date", date_raw), ("shift", shift)] {
        if value.is_empty() {
            return Err(issue(src, row.line, IssueKind::MissingField, format!("empty {field}")));
        }
    }

    let name = split_provider_name(user).ok_or_else(|| {
        issue(src, row.line, IssueKind::MalformedName, user.to_string())
    })?;
    let date = parse_date(date_raw, date_formats).ok_or_else(|| {
        issue(src, row.line, IssueKind::MalformedDate, date_raw.to_string())
    })?;

    Ok(Some(StaffRecord {
        line: row.line,
        provider_raw_name: user.to_string(),
        last_name: name.last_name,
        first_name: name.first_name,
        date,
        shift: shift.to_string(),
        day_of_week: date.weekday(),
        class: ShiftClass::Regular,
    }))
}

/// Collections row → record. An empty facility is kept as `None`.
pub fn normalize_collection_row(
    row: &RawCollectionRow,
    date_formats: &[String],
) -> Result<Option<CollectionRecord>, RowIssue> {
    let src = Source::Collections;
    let provider = row.provider.trim();
    let date_raw = row.date_of_service.trim();
    let facility = row.facility.trim();

    let fields = [
        ("provider", provider),
        ("date of service", date_raw),
        ("cpt", row.cpt.trim()),
        ("expected", row.expected.trim()),
        ("payments", row.payments.trim()),
        ("balance", row.balance.trim()),
    ];
    if facility.is_empty() && fields.iter().all(|(_, v)| v.is_empty()) {
        return Ok(None);
    }
    if let Some((field, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
        return Err(issue(src, row.line, IssueKind::MissingField, format!("empty {field}")));
    }

    let name = split_provider_name(provider).ok_or_else(|| {
        issue(src, row.line, IssueKind::MalformedName, provider.to_string())
    })?;
    let date = parse_date(date_raw, date_formats).ok_or_else(|| {
        issue(src, row.line, IssueKind::MalformedDate, date_raw.to_string())
    })?;

    let amount = |field: &str, raw: &str| {
        parse_amount_cents(raw).ok_or_else(|| {
            issue(src, row.line, IssueKind::MalformedAmount, format!("{field}: {}", raw.trim()))
        })
    };
    let expected_cents = amount("expected", &row.expected)?;
    let payments_cents = amount("payments", &row.payments)?;
    let balance_cents = amount("balance", &row.balance)?;

    Ok(Some(CollectionRecord {
        line: row.line,
        provider_raw_name: provider.to_string(),
        last_name: name.last_name,
        first_name: name.first_name,
        date_of_service: date,
        day_of_week: date.weekday(),
        cpt: row.cpt.trim().to_string(),
        expected_cents,
        payments_cents,
        balance_cents,
        facility: (!facility.is_empty()).then(|| facility.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        vec!["%m/%d/%y".into(), "%m/%d/%Y".into(), "%Y-%m-%d".into()]
    }

    fn staff_row(user: &str, date: &str, shift: &str) -> RawStaffRow {
        RawStaffRow {
            line: 2,
            user: user.into(),
            date: date.into(),
            shift: shift.into(),
        }
    }

    fn collection_row(provider: &str, date: &str, expected: &str) -> RawCollectionRow {
        RawCollectionRow {
            line: 7,
            provider: provider.into(),
            date_of_service: date.into(),
            cpt: "99223".into(),
            expected: expected.into(),
            payments: "100.00".into(),
            balance: "0".into(),
            facility: "FLORENCE".into(),
        }
    }

    #[test]
    fn split_name_on_first_comma() {
        let name = split_provider_name("  smith , John Q, MD ").unwrap();
        assert_eq!(name.last_name, "SMITH");
        assert_eq!(name.first_name, "John Q, MD");
    }

    #[test]
    fn split_name_without_comma_fails() {
        assert!(split_provider_name("John Smith").is_none());
        assert!(split_provider_name(", John").is_none());
    }

    #[test]
    fn date_formats_tried_in_order() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
        assert_eq!(parse_date("01/15/20", &formats()), Some(d));
        assert_eq!(parse_date("1/15/2020", &formats()), Some(d));
        assert_eq!(parse_date("2020-01-15", &formats()), Some(d));
        assert_eq!(parse_date("15.01.2020", &formats()), None);
        assert_eq!(parse_date("13/40/20", &formats()), None);
    }

    #[test]
    fn amounts_parse_to_cents() {
        assert_eq!(parse_amount_cents("1234.5"), Some(123450));
        assert_eq!(parse_amount_cents("$1,234.56"), Some(123456));
        assert_eq!(parse_amount_cents("-12"), Some(-1200));
        assert_eq!(parse_amount_cents("(45.10)"), Some(-4510));
        assert_eq!(parse_amount_cents("-$3.05"), Some(-305));
        assert_eq!(parse_amount_cents("$-3.05"), Some(-305));
        assert_eq!(parse_amount_cents(".5"), Some(50));
        assert_eq!(parse_amount_cents("7.000"), Some(700));
        assert_eq!(parse_amount_cents("0"), Some(0));
    }

    #[test]
    fn amounts_reject_garbage() {
        assert_eq!(parse_amount_cents(""), None);
        assert_eq!(parse_amount_cents("-"), None);
        assert_eq!(parse_amount_cents("12.345"), None);
        assert_eq!(parse_amount_cents("abc"), None);
        assert_eq!(parse_amount_cents("1.2.3"), None);
        assert_eq!(parse_amount_cents("(-5)"), None);
    }

    #[test]
    fn cents_format_round_trip_sign() {
        assert_eq!(format_cents(123450), "1234.50");
        assert_eq!(format_cents(-5), "-0.05");
        assert_eq!(format_cents(0), "0.00");
    }

    #[test]
    fn staff_row_normalized() {
        let rec = normalize_staff_row(&staff_row("Smith, John", "1/4/20", "MV Day"), &formats())
            .unwrap()
            .unwrap();
        assert_eq!(rec.last_name, "SMITH");
        assert_eq!(rec.first_name, "John");
        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2020, 1, 4).unwrap());
        assert_eq!(rec.day_of_week, Weekday::Sat);
        assert_eq!(rec.key().as_str(), "SMITH_2020-01-04");
    }

    #[test]
    fn blank_staff_row_is_skipped_not_rejected() {
        assert_eq!(normalize_staff_row(&staff_row(" ", "", ""), &formats()), Ok(None));
    }

    #[test]
    fn staff_row_failures_are_classified() {
        let err = normalize_staff_row(&staff_row("John Smith", "1/4/20", "MV"), &formats())
            .unwrap_err();
        assert_eq!(err.kind, IssueKind::MalformedName);
        assert_eq!(err.source, Source::Staffing);
        assert_eq!(err.line, 2);

        let err = normalize_staff_row(&staff_row("Smith, J", "Jan 4", "MV"), &formats())
            .unwrap_err();
        assert_eq!(err.kind, IssueKind::MalformedDate);

        let err = normalize_staff_row(&staff_row("Smith, J", "1/4/20", ""), &formats())
            .unwrap_err();
        assert_eq!(err.kind, IssueKind::MissingField);
    }

    #[test]
    fn collection_row_normalized() {
        let rec = normalize_collection_row(&collection_row("SMITH, JOHN", "01/04/2020", "$250.00"), &formats())
            .unwrap()
            .unwrap();
        assert_eq!(rec.key().as_str(), "SMITH_2020-01-04");
        assert_eq!(rec.expected_cents, 25000);
        assert_eq!(rec.payments_cents, 10000);
        assert_eq!(rec.balance_cents, 0);
        assert_eq!(rec.facility.as_deref(), Some("FLORENCE"));
    }

    #[test]
    fn collection_row_empty_facility_is_none() {
        let mut row = collection_row("SMITH, JOHN", "01/04/2020", "1");
        row.facility = "  ".into();
        let rec = normalize_collection_row(&row, &formats()).unwrap().unwrap();
        assert!(rec.facility.is_none());
    }

    #[test]
    fn collection_row_bad_amount_rejected() {
        let err = normalize_collection_row(&collection_row("SMITH, JOHN", "01/04/2020", "n/a"), &formats())
            .unwrap_err();
        assert_eq!(err.kind, IssueKind::MalformedAmount);
        assert!(err.detail.starts_with("expected"));
    }

    #[test]
    fn blank_collection_row_is_skipped() {
        let row = RawCollectionRow { line: 9, ..Default::default() };
        assert_eq!(normalize_collection_row(&row, &formats()), Ok(None));
    }
}
