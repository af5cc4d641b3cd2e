//! Match hints: how each free-text location term was resolved.

use serde::{Deserialize, Serialize};

/// The three levels of the location taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationLevel {
    Region,
    District,
    Suburb,
}

impl LocationLevel {
    /// Human-readable label used in confirmation prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::District => "District",
            Self::Suburb => "Suburb",
        }
    }
}

/// How one location level resolved against the taxonomy.
///
/// Hints are produced fresh on every build and never mutated; a correction
/// round yields a whole new set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHint {
    /// Which level this hint describes.
    pub level: LocationLevel,

    /// The user's free-text input for this level, if any.
    pub input: Option<String>,

    /// The taxonomy name the input resolved to, if any.
    pub candidate: Option<String>,

    /// The taxonomy id of the resolved candidate, if any.
    pub resolved_id: Option<u32>,
}

impl MatchHint {
    /// An unresolved hint carrying only the user's input.
    pub fn unresolved(level: LocationLevel, input: Option<&str>) -> Self {
        Self {
            level,
            input: input.map(str::to_string),
            candidate: None,
            resolved_id: None,
        }
    }

    /// True when a candidate was resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved_id.is_some()
    }
}

/// One hint per location level, as produced by a single build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHints {
    pub region: MatchHint,
    pub district: MatchHint,
    pub suburb: MatchHint,
}

impl MatchHints {
    /// Hints with no resolutions, carrying the profile's raw inputs.
    pub fn unresolved(
        region: Option<&str>,
        district: Option<&str>,
        suburb: Option<&str>,
    ) -> Self {
        Self {
            region: MatchHint::unresolved(LocationLevel::Region, region),
            district: MatchHint::unresolved(LocationLevel::District, district),
            suburb: MatchHint::unresolved(LocationLevel::Suburb, suburb),
        }
    }

    /// Iterate the hints in region → district → suburb order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchHint> {
        [&self.region, &self.district, &self.suburb].into_iter()
    }

    /// Render the mapping for a confirmation prompt, one line per level.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|hint| {
                format!(
                    "{}: user input {:?}, matched candidate {:?}",
                    hint.level.label(),
                    hint.input.as_deref(),
                    hint.candidate.as_deref(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_all_levels() {
        let hints = MatchHints::unresolved(None, Some("Welington"), None);
        let text = hints.describe();

        assert!(text.contains("Region: user input None"));
        assert!(text.contains("District: user input Some(\"Welington\")"));
        assert!(text.contains("Suburb:"));
    }

    #[test]
    fn test_resolution_state() {
        let mut hint = MatchHint::unresolved(LocationLevel::Suburb, Some("Ponsonby"));
        assert!(!hint.is_resolved());

        hint.candidate = Some("Ponsonby".into());
        hint.resolved_id = Some(4123);
        assert!(hint.is_resolved());
    }
}
