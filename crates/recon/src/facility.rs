use crate::config::FacilityPattern;
use crate::model::{CollectionRecord, FacilitySource, MatchPass, StaffRecord};

/// Shift-label substring → facility, first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct FacilityInference {
    patterns: Vec<FacilityPattern>,
}

impl FacilityInference {
    pub fn new(patterns: Vec<FacilityPattern>) -> Self {
        Self { patterns }
    }

    pub fn infer(&self, shift: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| shift.contains(p.contains.as_str()))
            .map(|p| p.facility.as_str())
    }

    /// Facility for a matched pair.
    ///
    /// Primary matches trust the collections facility and fall back to the
    /// shift label. Fallback matches attribute revenue to the fallback
    /// shift, so the label goes first.
    pub fn resolve(
        &self,
        pass: MatchPass,
        staff: &StaffRecord,
        revenue: &CollectionRecord,
    ) -> (Option<String>, FacilitySource) {
        let from_collections = revenue
            .facility
            .clone()
            .map(|f| (Some(f), FacilitySource::Collections));
        let from_label = self
            .infer(&staff.shift)
            .map(|f| (Some(f.to_string()), FacilitySource::ShiftLabel));

        let resolved = match pass {
            MatchPass::Primary => from_collections.or(from_label),
            MatchPass::Fallback => from_label.or(from_collections),
        };
        resolved.unwrap_or((None, FacilitySource::Unknown))
    }
}
