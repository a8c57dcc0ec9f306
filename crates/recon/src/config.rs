use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a reconciliation run needs besides the two input tables.
///
/// Every table defaults to the rules of the original staffing/collections
/// export, so an empty TOML document is a valid config. Supplying a table
/// (even an empty one) replaces the default entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub name: String,
    /// chrono format strings, tried in order.
    pub date_formats: Vec<String>,
    pub staffing: StaffingSource,
    pub collections: CollectionsSource,
    pub identity: IdentityConfig,
    pub shifts: ShiftConfig,
    /// Ordered shift-label patterns; first match wins.
    pub facilities: Vec<FacilityPattern>,
    pub output: OutputConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: "Revenue per shift".into(),
            date_formats: vec!["%m/%d/%y".into(), "%m/%d/%Y".into(), "%Y-%m-%d".into()],
            staffing: StaffingSource::default(),
            collections: CollectionsSource::default(),
            identity: IdentityConfig::default(),
            shifts: ShiftConfig::default(),
            facilities: default_facilities(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffingSource {
    /// CSV path, relative to the config file.
    pub file: Option<String>,
    pub columns: StaffingColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaffingColumns {
    pub user: String,
    pub date: String,
    pub shift: String,
}

impl Default for StaffingColumns {
    fn default() -> Self {
        Self {
            user: "User".into(),
            date: "Date".into(),
            shift: "Shift".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CollectionsSource {
    pub file: Option<String>,
    pub columns: CollectionColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionColumns {
    pub provider: String,
    pub date_of_service: String,
    pub cpt: String,
    pub expected: String,
    pub payments: String,
    pub balance: String,
    pub facility: String,
}

impl Default for CollectionColumns {
    fn default() -> Self {
        Self {
            provider: "Rendering Provider".into(),
            date_of_service: "Date of Service - Case".into(),
            cpt: "CPT".into(),
            expected: "Expected".into(),
            payments: "Payments - All".into(),
            balance: "Balance".into(),
            facility: "Facility".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Exact raw provider names remapped to a surname key. Looked up in order.
    pub overrides: Vec<NameOverride>,
    /// Reject records whose surname is shared by providers with different
    /// first initials and no override separates them.
    pub flag_ambiguous_surnames: bool,
    pub duplicates: DuplicatePolicy,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            overrides: default_overrides(),
            flag_ambiguous_surnames: true,
            duplicates: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NameOverride {
    pub raw_name: String,
    pub surname_key: String,
}

impl NameOverride {
    pub fn new(raw_name: impl Into<String>, surname_key: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            surname_key: surname_key.into(),
        }
    }
}

/// How staffing rows sharing an identity key take part in a join pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Only the first row (input order) per key may claim revenue; later rows
    /// are treated as shifts without revenue for that pass.
    #[default]
    FirstWins,
    /// Every row joins every revenue row with its key. Double-counts revenue
    /// when a provider has two shift rows on one date.
    KeepAll,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstWins => write!(f, "first_wins"),
            Self::KeepAll => write!(f, "keep_all"),
        }
    }
}

fn default_overrides() -> Vec<NameOverride> {
    vec![
        NameOverride::new("Ryan, G.", "RYANG"),
        NameOverride::new("RYAN, WILLIAM G", "RYANG"),
        NameOverride::new("Ryan, C.", "RYANC"),
        NameOverride::new("RYAN, CRAIG", "RYANC"),
    ]
}

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// Substring marking any on-call shift.
    pub on_call_marker: String,
    /// Substrings marking a weekend on-call shift.
    pub weekend_call_markers: Vec<String>,
    /// Weekday-named on-call labels renamed when worked on Saturday/Sunday.
    pub weekend_rewrites: Vec<WeekendRewrite>,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            on_call_marker: "Call".into(),
            weekend_call_markers: vec!["Call WE".into(), "WE Call".into()],
            weekend_rewrites: vec![WeekendRewrite {
                shift: "MV Call 1".into(),
                weekend_label: "MV WE Call 1".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeekendRewrite {
    pub shift: String,
    pub weekend_label: String,
}

// ---------------------------------------------------------------------------
// Facilities + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FacilityPattern {
    pub contains: String,
    pub facility: String,
}

impl FacilityPattern {
    pub fn new(contains: impl Into<String>, facility: impl Into<String>) -> Self {
        Self {
            contains: contains.into(),
            facility: facility.into(),
        }
    }
}

fn default_facilities() -> Vec<FacilityPattern> {
    vec![
        // Facility-code prefixes
        FacilityPattern::new("MV", "MOUNTAIN VISTA-MAIN"),
        FacilityPattern::new("TSL", "TEMPE ST LUKES  MEDICAL CENTER"),
        FacilityPattern::new("PSL", "ST LUKES MEDICAL CENTER LP"),
        // Named hospitals
        FacilityPattern::new("Florence", "FLORENCE"),
        FacilityPattern::new("Luke's", "TEMPE ST LUKES  MEDICAL CENTER"),
        // Generic on-call
        FacilityPattern::new("Physician Call", "MOUNTAIN VISTA-MAIN"),
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the CSV reports, relative to the config file.
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.date_formats.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one date format is required".into(),
            ));
        }

        if self.shifts.on_call_marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "shifts.on_call_marker must not be empty".into(),
            ));
        }
        if self.shifts.weekend_call_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(
                "shifts.weekend_call_markers must not contain empty markers".into(),
            ));
        }
        for rewrite in &self.shifts.weekend_rewrites {
            if rewrite.shift.trim().is_empty() || rewrite.weekend_label.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "weekend rewrite '{}' -> '{}': labels must not be empty",
                    rewrite.shift, rewrite.weekend_label
                )));
            }
        }

        let mut seen = HashSet::new();
        for o in &self.identity.overrides {
            if o.raw_name.trim().is_empty() || o.surname_key.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "identity override '{}' -> '{}': name and key must not be empty",
                    o.raw_name, o.surname_key
                )));
            }
            if !seen.insert(o.raw_name.trim()) {
                return Err(ReconError::ConfigValidation(format!(
                    "identity override for '{}' is listed twice",
                    o.raw_name
                )));
            }
        }

        for p in &self.facilities {
            if p.contains.is_empty() || p.facility.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "facility pattern '{}' -> '{}': pattern and facility must not be empty",
                    p.contains, p.facility
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
