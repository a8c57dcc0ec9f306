//! Name disambiguation: the override table that separates providers who
//! share a surname, and detection of collisions the table does not cover.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{IdentityConfig, NameOverride};
use crate::normalize::split_provider_name;

/// Applies the override table. The same instance must resolve both sources,
/// otherwise identity keys diverge and real matches are lost.
#[derive(Debug, Clone, Default)]
pub struct NameDisambiguator {
    overrides: Vec<NameOverride>,
}

impl NameDisambiguator {
    pub fn new(overrides: Vec<NameOverride>) -> Self {
        Self { overrides }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.overrides.clone())
    }

    fn lookup(&self, raw_name: &str) -> Option<&NameOverride> {
        let raw_name = raw_name.trim();
        self.overrides.iter().find(|o| o.raw_name.trim() == raw_name)
    }

    pub fn is_overridden(&self, raw_name: &str) -> bool {
        self.lookup(raw_name).is_some()
    }

    /// Surname key for a raw "Last, First" name: the listed override, else the
    /// upper-cased surname. `None` for names the normalizer cannot split.
    pub fn resolve(&self, raw_name: &str) -> Option<String> {
        if let Some(o) = self.lookup(raw_name) {
            return Some(o.surname_key.clone());
        }
        split_provider_name(raw_name).map(|n| n.last_name)
    }

    /// Surname keys used by more than one first initial among names the
    /// override table does not cover. Input: `(raw_name, surname_key, first_name)`.
    pub fn ambiguous_surnames<'a, I>(&self, names: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut initials: BTreeMap<&str, BTreeSet<char>> = BTreeMap::new();
        for (raw, surname, first) in names {
            if self.is_overridden(raw) {
                continue;
            }
            let Some(initial) = first.chars().find(|c| c.is_alphabetic()) else {
                continue;
            };
            initials
                .entry(surname)
                .or_default()
                .extend(initial.to_uppercase());
        }

        initials
            .into_iter()
            .filter(|(_, set)| set.len() > 1)
            .map(|(surname, _)| surname.to_string())
            .collect()
    }
}
