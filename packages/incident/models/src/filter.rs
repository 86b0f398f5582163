//! User-controlled incident filters.
//!
//! The same [`FilterState`] drives region aggregation and both point
//! presenters, so the map and the markers can never disagree about which
//! incidents are in play.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{EffectiveType, GUN_KEY, Incident};

/// Drug subtypes toggled on by default, alongside `gun`.
pub const DEFAULT_DRUG_SUBTYPES: &[&str] = &["meth", "heroin", "cannabis", "cocaine", "ketamine"];

/// Coarse category switch shown above the subtype toggles.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MainCategory {
    /// Firearms and narcotics.
    #[default]
    All,
    /// Narcotics only.
    Drugs,
    /// Firearms only.
    Guns,
}

impl MainCategory {
    /// Whether `effective_type` is allowed through this switch.
    #[must_use]
    pub const fn permits(self, effective_type: &EffectiveType) -> bool {
        match self {
            Self::All => true,
            Self::Drugs => !effective_type.is_gun(),
            Self::Guns => effective_type.is_gun(),
        }
    }
}

/// Active filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Coarse category switch.
    #[serde(default)]
    pub active_main_category: MainCategory,
    /// Per effective-type toggles. A type without an entry is inactive.
    #[serde(default)]
    pub subtype_toggles: BTreeMap<String, bool>,
}

impl Default for FilterState {
    fn default() -> Self {
        let subtype_toggles = std::iter::once(GUN_KEY)
            .chain(DEFAULT_DRUG_SUBTYPES.iter().copied())
            .map(|key| (key.to_string(), true))
            .collect();
        Self {
            active_main_category: MainCategory::All,
            subtype_toggles,
        }
    }
}

impl FilterState {
    /// A filter with every toggle off.
    #[must_use]
    pub fn none() -> Self {
        Self {
            active_main_category: MainCategory::All,
            subtype_toggles: BTreeMap::new(),
        }
    }

    /// Builds a filter from explicit `(key, enabled)` toggles.
    #[must_use]
    pub fn from_toggles<'a>(toggles: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        Self {
            active_main_category: MainCategory::All,
            subtype_toggles: toggles
                .into_iter()
                .map(|(key, on)| (key.to_string(), on))
                .collect(),
        }
    }

    /// Sets one toggle.
    pub fn set(&mut self, key: &str, enabled: bool) {
        self.subtype_toggles.insert(key.to_string(), enabled);
    }

    /// Flips one toggle (an absent toggle counts as off).
    pub fn toggle(&mut self, key: &str) {
        let entry = self.subtype_toggles.entry(key.to_string()).or_insert(false);
        *entry = !*entry;
    }

    /// Whether `effective_type` is currently shown.
    #[must_use]
    pub fn is_active(&self, effective_type: &EffectiveType) -> bool {
        self.active_main_category.permits(effective_type)
            && self
                .subtype_toggles
                .get(effective_type.key())
                .copied()
                .unwrap_or(false)
    }

    /// The incident's effective type, if it passes the type filters.
    ///
    /// Used by the point presenters, which show incidents regardless of
    /// whether an amount was recorded.
    #[must_use]
    pub fn admitted_type(&self, incident: &Incident) -> Option<EffectiveType> {
        incident
            .effective_type()
            .filter(|effective_type| self.is_active(effective_type))
    }

    /// Aggregation inclusion predicate: the type is active and the amount
    /// is a finite number. Returns the amount to add.
    #[must_use]
    pub fn included_amount(&self, incident: &Incident) -> Option<f64> {
        self.admitted_type(incident)?;
        incident.finite_amount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IncidentCategory;
    use crate::test_support::incident;

    #[test]
    fn default_enables_gun_and_known_drugs() {
        let filters = FilterState::default();
        assert!(filters.is_active(&EffectiveType::Gun));
        assert!(filters.is_active(&EffectiveType::Drug("meth".into())));
        assert!(!filters.is_active(&EffectiveType::Drug("kratom".into())));
    }

    #[test]
    fn main_category_narrows_toggles() {
        let mut filters = FilterState::default();
        filters.active_main_category = MainCategory::Guns;
        assert!(filters.is_active(&EffectiveType::Gun));
        assert!(!filters.is_active(&EffectiveType::Drug("meth".into())));

        filters.active_main_category = MainCategory::Drugs;
        assert!(!filters.is_active(&EffectiveType::Gun));
        assert!(filters.is_active(&EffectiveType::Drug("meth".into())));
    }

    #[test]
    fn toggle_flips_and_creates() {
        let mut filters = FilterState::none();
        filters.toggle("heroin");
        assert!(filters.is_active(&EffectiveType::Drug("heroin".into())));
        filters.toggle("heroin");
        assert!(!filters.is_active(&EffectiveType::Drug("heroin".into())));
    }

    #[test]
    fn inclusion_requires_active_type_and_finite_amount() {
        let filters = FilterState::from_toggles([("gun", true), ("meth", false)]);

        let gun = incident(1, IncidentCategory::Firearm, None);
        assert_eq!(filters.included_amount(&gun), Some(1.0));

        let meth = incident(2, IncidentCategory::Drug, Some("meth"));
        assert_eq!(filters.included_amount(&meth), None);

        let mut unmeasured = incident(3, IncidentCategory::Firearm, None);
        unmeasured.amount = None;
        assert_eq!(filters.included_amount(&unmeasured), None);
        assert_eq!(filters.admitted_type(&unmeasured), Some(EffectiveType::Gun));
    }

    #[test]
    fn filter_state_deserializes_from_camel_case() {
        let filters: FilterState = serde_json::from_str(
            r#"{"activeMainCategory": "drugs", "subtypeToggles": {"meth": true}}"#,
        )
        .unwrap();
        assert_eq!(filters.active_main_category, MainCategory::Drugs);
        assert!(filters.is_active(&EffectiveType::Drug("meth".into())));
    }
}
