#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Evidence incident records and the effective-type taxonomy.
//!
//! Incidents are firearm or narcotic evidence finds, already joined with
//! the names of the province, district, and subdistrict they were found
//! in. Each incident is normalized to an [`EffectiveType`] (`"gun"` for
//! any firearm, the drug subtype for narcotics) which is what filters
//! toggle on.

pub mod filter;

pub use filter::{FilterState, MainCategory};

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Latitudes accepted as inside the national territory.
pub const NATIONAL_LAT_RANGE: RangeInclusive<f64> = 5.6..=20.5;

/// Longitudes accepted as inside the national territory.
pub const NATIONAL_LNG_RANGE: RangeInclusive<f64> = 97.3..=105.6;

/// Effective-type key shared by every firearm.
pub const GUN_KEY: &str = "gun";

/// Top-level evidence category.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum IncidentCategory {
    /// Firearms (อาวุธปืน).
    #[serde(alias = "อาวุธปืน")]
    Firearm,
    /// Narcotics (ยาเสพติด).
    #[serde(alias = "ยาเสพติด")]
    Drug,
    /// Anything the feed labels differently. Never counted.
    #[serde(other)]
    Other,
}

/// Normalized category used for filtering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EffectiveType {
    /// Any firearm.
    Gun,
    /// A narcotic, keyed by its subtype (e.g. `"meth"`).
    Drug(String),
}

impl EffectiveType {
    /// The filter key for this type.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Gun => GUN_KEY,
            Self::Drug(subtype) => subtype,
        }
    }

    /// Whether this is the firearm type.
    #[must_use]
    pub const fn is_gun(&self) -> bool {
        matches!(self, Self::Gun)
    }
}

impl fmt::Display for EffectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<EffectiveType> for String {
    fn from(value: EffectiveType) -> Self {
        value.key().to_string()
    }
}

impl From<String> for EffectiveType {
    fn from(value: String) -> Self {
        if value == GUN_KEY {
            Self::Gun
        } else {
            Self::Drug(value)
        }
    }
}

/// One evidence find.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Record id.
    pub id: i64,
    /// Top-level category.
    pub category: IncidentCategory,
    /// Drug subtype (`meth`, `heroin`, ...). Ignored for firearms.
    #[serde(default, alias = "drug_type")]
    pub subtype: Option<String>,
    /// Seized quantity. Absent or non-finite amounts are never summed.
    #[serde(default)]
    pub amount: Option<f64>,
    /// Latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude.
    #[serde(default)]
    pub lng: Option<f64>,
    /// Province name.
    #[serde(default, alias = "province")]
    pub province_name: String,
    /// District name.
    #[serde(default, alias = "amphoe")]
    pub district_name: String,
    /// Subdistrict name.
    #[serde(default, alias = "tambon")]
    pub subdistrict_name: String,
    /// Date of the find, when the feed supplies a parseable one.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Parses `YYYY-MM-DD`, tolerating a trailing time component.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl Incident {
    /// Derives the effective type.
    ///
    /// Firearms are always `gun`. Drugs use their subtype; a drug without
    /// a subtype, or any other category, has no effective type and is
    /// excluded from every computation.
    #[must_use]
    pub fn effective_type(&self) -> Option<EffectiveType> {
        match self.category {
            IncidentCategory::Firearm => Some(EffectiveType::Gun),
            IncidentCategory::Drug => self
                .subtype
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| EffectiveType::Drug(s.to_string())),
            IncidentCategory::Other => None,
        }
    }

    /// The amount, if present and finite.
    #[must_use]
    pub fn finite_amount(&self) -> Option<f64> {
        self.amount.filter(|a| a.is_finite())
    }

    /// `(lat, lng)` if both are present and inside the national bounds.
    #[must_use]
    pub fn location(&self) -> Option<(f64, f64)> {
        let (lat, lng) = (self.lat?, self.lng?);
        (NATIONAL_LAT_RANGE.contains(&lat) && NATIONAL_LNG_RANGE.contains(&lng))
            .then_some((lat, lng))
    }
}

/// Why an incident was excluded from all downstream computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IncidentDiagnostic {
    /// Latitude or longitude was missing.
    MissingLocation {
        /// Incident id.
        id: i64,
    },
    /// Coordinates fall outside the national bounds (or are not finite).
    OutOfBounds {
        /// Incident id.
        id: i64,
        /// Reported latitude.
        lat: f64,
        /// Reported longitude.
        lng: f64,
    },
}

/// The incident feed after location validation.
///
/// Only geolocated incidents are kept; the rest are reported once as
/// diagnostics. Every consumer (aggregation, clustering, heatmap) reads
/// from [`IncidentSet::incidents`] so the exclusion is applied uniformly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentSet {
    incidents: Vec<Incident>,
    diagnostics: Vec<IncidentDiagnostic>,
}

impl IncidentSet {
    /// Validates a raw feed.
    #[must_use]
    pub fn new(feed: Vec<Incident>) -> Self {
        let mut incidents = Vec::with_capacity(feed.len());
        let mut diagnostics = Vec::new();

        for incident in feed {
            if incident.location().is_some() {
                incidents.push(incident);
                continue;
            }
            let diagnostic = match (incident.lat, incident.lng) {
                (Some(lat), Some(lng)) => IncidentDiagnostic::OutOfBounds {
                    id: incident.id,
                    lat,
                    lng,
                },
                _ => IncidentDiagnostic::MissingLocation { id: incident.id },
            };
            log::warn!("Excluding incident {}: {diagnostic:?}", incident.id);
            diagnostics.push(diagnostic);
        }

        log::debug!(
            "Incident feed: {} usable, {} excluded",
            incidents.len(),
            diagnostics.len()
        );

        Self {
            incidents,
            diagnostics,
        }
    }

    /// Geolocated incidents, in feed order.
    #[must_use]
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    /// Incidents that were excluded, in feed order.
    #[must_use]
    pub fn diagnostics(&self) -> &[IncidentDiagnostic] {
        &self.diagnostics
    }

    /// Number of usable incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether no usable incident remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}
