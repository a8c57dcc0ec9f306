use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::DuplicatePolicy;
use crate::model::{CollectionRecord, DuplicateGroup, IdentityKey, StaffRecord};

/// Outcome of one outer join on identity key.
#[derive(Debug, Default)]
pub struct PassOutput {
    pub matched: Vec<(StaffRecord, CollectionRecord)>,
    pub shift_only: Vec<StaffRecord>,
    pub revenue_only: Vec<CollectionRecord>,
}

/// Outer-join staffing against revenue on identity key.
///
/// Matched pairs follow staffing order, then revenue order within a key.
/// Under `FirstWins` only the first staffing record per key claims revenue;
/// later ones land in `shift_only`. Under `KeepAll` every staffing record
/// joins every revenue record with its key.
pub fn join_on_identity(
    staff: Vec<StaffRecord>,
    revenue: Vec<CollectionRecord>,
    policy: DuplicatePolicy,
) -> PassOutput {
    let mut revenue_by_key: HashMap<IdentityKey, Vec<usize>> = HashMap::new();
    for (i, r) in revenue.iter().enumerate() {
        revenue_by_key.entry(r.key()).or_default().push(i);
    }

    let mut claimed = vec![false; revenue.len()];
    let mut seen: HashSet<IdentityKey> = HashSet::new();
    let mut matched = Vec::new();
    let mut shift_only = Vec::new();

    for s in staff {
        let key = s.key();
        let first = seen.insert(key.clone());
        let eligible = first || policy == DuplicatePolicy::KeepAll;

        match revenue_by_key.get(&key) {
            Some(indices) if eligible => {
                for &i in indices {
                    claimed[i] = true;
                    matched.push((s.clone(), revenue[i].clone()));
                }
            }
            _ => shift_only.push(s),
        }
    }

    let revenue_only = revenue
        .into_iter()
        .zip(claimed)
        .filter(|(_, c)| !c)
        .map(|(r, _)| r)
        .collect();

    PassOutput {
        matched,
        shift_only,
        revenue_only,
    }
}

/// Staffing records sharing an identity key (two or more), in order of first
/// appearance. `has_revenue` tests the key against all revenue keys.
pub fn find_duplicate_groups(
    staff: &[StaffRecord],
    revenue_keys: &HashSet<IdentityKey>,
) -> Vec<DuplicateGroup> {
    let mut order: Vec<IdentityKey> = Vec::new();
    let mut by_key: BTreeMap<IdentityKey, Vec<StaffRecord>> = BTreeMap::new();

    for s in staff {
        let key = s.key();
        let entry = by_key.entry(key.clone()).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(s.clone());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let records = by_key.remove(&key)?;
            (records.len() >= 2).then(|| DuplicateGroup {
                has_revenue: revenue_keys.contains(&key),
                key,
                records,
            })
        })
        .collect()
}
