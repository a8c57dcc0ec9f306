use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AggregateRow, IdentityKey, MatchedPair};

#[derive(Debug, Default)]
struct Accumulator {
    keys: BTreeSet<IdentityKey>,
    expected_cents: i64,
    payments_cents: i64,
    balance_cents: i64,
}

impl Accumulator {
    fn add(&mut self, pair: &MatchedPair) {
        self.keys.insert(pair.key.clone());
        self.expected_cents += pair.revenue.expected_cents;
        self.payments_cents += pair.revenue.payments_cents;
        self.balance_cents += pair.revenue.balance_cents;
    }

    fn into_row(self, year: i32, month: u32, facility: &Option<String>, shift: Option<String>) -> AggregateRow {
        AggregateRow {
            year,
            month,
            facility: facility.clone(),
            shift,
            shift_count: self.keys.len(),
            expected_cents: self.expected_cents,
            payments_cents: self.payments_cents,
            balance_cents: self.balance_cents,
        }
    }
}

type GroupKey = (i32, u32, Option<String>);

/// Group matched pairs by (year, month, facility, shift) and sum the money.
///
/// Within each (year, month, facility) the `Total` rollup row comes first,
/// then shifts in label order. `shift_count` counts distinct identity keys,
/// so several cases on one shift count once. Unknown facilities sort first.
pub fn build_report(matched: &[MatchedPair]) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<GroupKey, (Accumulator, BTreeMap<String, Accumulator>)> =
        BTreeMap::new();

    for pair in matched {
        let key = (pair.year(), pair.month(), pair.facility.clone());
        let (total, shifts) = groups.entry(key).or_default();
        total.add(pair);
        shifts.entry(pair.staff.shift.clone()).or_default().add(pair);
    }

    let mut rows = Vec::new();
    for ((year, month, facility), (total, shifts)) in groups {
        rows.push(total.into_row(year, month, &facility, None));
        for (shift, acc) in shifts {
            rows.push(acc.into_row(year, month, &facility, Some(shift)));
        }
    }
    rows
}
