#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative region types.
//!
//! Regions form a three-tier containment tree (province → district →
//! subdistrict). Each region carries its boundary as raw `[lng, lat]`
//! rings exactly as delivered by the geometry provider; validation of
//! individual points happens at projection time so a single bad vertex
//! never discards a whole boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A raw coordinate as delivered by the provider. Usually `[lng, lat]`,
/// but arity and finiteness are not guaranteed.
pub type Position = geojson::Position;

/// A closed ring of positions.
pub type Ring = Vec<Position>;

/// One polygon: exterior ring followed by any hole rings.
pub type PolygonRings = Vec<Ring>;

/// Region identifier, unique within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub i64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RegionId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One tier of the region hierarchy.
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
pub enum RegionLevel {
    /// Top tier (จังหวัด).
    Province,
    /// Middle tier (อำเภอ).
    District,
    /// Bottom tier (ตำบล).
    Subdistrict,
}

impl RegionLevel {
    /// The tier one level up, `None` for provinces.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Province => None,
            Self::District => Some(Self::Province),
            Self::Subdistrict => Some(Self::District),
        }
    }

    /// The tier one level down, `None` for subdistricts.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Province => Some(Self::District),
            Self::District => Some(Self::Subdistrict),
            Self::Subdistrict => None,
        }
    }

    /// Returns all tiers, coarsest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Province, Self::District, Self::Subdistrict]
    }

    /// Provider field names that may carry the region's display name.
    #[must_use]
    pub const fn name_keys(self) -> &'static [&'static str] {
        match self {
            Self::Province => &["name", "province_name"],
            Self::District => &["name", "district_name", "amphoe_t"],
            Self::Subdistrict => &["name", "subdistrict_name", "tambon_t"],
        }
    }

    /// Provider field names that may carry the parent region's id.
    #[must_use]
    pub const fn parent_keys(self) -> &'static [&'static str] {
        match self {
            Self::Province => &[],
            Self::District => &["parent_id", "province_id", "prov_id"],
            Self::Subdistrict => &["parent_id", "district_id"],
        }
    }

    fn fallback_name(self, id: RegionId) -> String {
        match self {
            Self::Province => format!("Province {id}"),
            Self::District => format!("District {id}"),
            Self::Subdistrict => format!("Subdistrict {id}"),
        }
    }
}

/// Whether the provider described the boundary as a single polygon or a
/// collection of them. Kept so the boundary can be handed back to a
/// GeoJSON consumer in its original shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    /// GeoJSON `Polygon`.
    Polygon,
    /// GeoJSON `MultiPolygon`.
    MultiPolygon,
}

/// A region boundary, normalized to a list of polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGeometry {
    /// Original geometry type.
    pub kind: GeometryKind,
    /// Polygons, each a list of rings.
    pub polygons: Vec<PolygonRings>,
}

impl RegionGeometry {
    /// Parses a GeoJSON `{type, coordinates}` object.
    ///
    /// Well-formed input goes through [`geojson::Geometry`]. When that
    /// fails only because some coordinate component is not a number, the
    /// nesting is walked by hand and those components become `NaN`, so
    /// the projector drops the offending point instead of the whole
    /// boundary. Only `Polygon` and `MultiPolygon` are accepted; returns
    /// `None` when the type is unsupported or the nesting is malformed.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value::<geojson::Geometry>(value.clone()) {
            Ok(geometry) => Self::from_geojson(&geometry),
            Err(_) => Self::from_json_lenient(value),
        }
    }

    fn from_json_lenient(value: &serde_json::Value) -> Option<Self> {
        let kind = value.get("type")?.as_str()?;
        let coordinates = value.get("coordinates")?.as_array()?;

        match kind {
            "Polygon" => Some(Self {
                kind: GeometryKind::Polygon,
                polygons: vec![parse_polygon(coordinates)?],
            }),
            "MultiPolygon" => {
                let polygons = coordinates
                    .iter()
                    .map(|polygon| polygon.as_array().and_then(|rings| parse_polygon(rings)))
                    .collect::<Option<Vec<_>>>()?;
                Some(Self {
                    kind: GeometryKind::MultiPolygon,
                    polygons,
                })
            }
            _ => None,
        }
    }

    /// Converts from a parsed `geojson` geometry.
    #[must_use]
    pub fn from_geojson(geometry: &geojson::Geometry) -> Option<Self> {
        match &geometry.value {
            geojson::Value::Polygon(rings) => Some(Self {
                kind: GeometryKind::Polygon,
                polygons: vec![rings.clone()],
            }),
            geojson::Value::MultiPolygon(polygons) => Some(Self {
                kind: GeometryKind::MultiPolygon,
                polygons: polygons.clone(),
            }),
            _ => None,
        }
    }

    /// Converts back into a `geojson` geometry for tiled renderers.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match (self.kind, self.polygons.as_slice()) {
            (GeometryKind::Polygon, [single]) => geojson::Value::Polygon(single.clone()),
            _ => geojson::Value::MultiPolygon(self.polygons.clone()),
        };
        geojson::Geometry::new(value)
    }

    /// Iterates every ring of every polygon.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flatten()
    }
}

fn parse_polygon(rings: &[serde_json::Value]) -> Option<PolygonRings> {
    rings
        .iter()
        .map(|ring| {
            ring.as_array()
                .map(|points| points.iter().map(parse_position).collect())
        })
        .collect()
}

fn parse_position(value: &serde_json::Value) -> Position {
    value.as_array().map_or_else(Vec::new, |components| {
        components
            .iter()
            .map(|c| c.as_f64().unwrap_or(f64::NAN))
            .collect()
    })
}

/// A region as delivered by the geometry provider, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Region id.
    pub id: RegionId,
    /// Display name.
    pub name: String,
    /// Parent region id (province for districts, district for subdistricts).
    pub parent_id: Option<RegionId>,
    /// Raw `{type, coordinates}` geometry, if any was supplied.
    pub geometry: Option<serde_json::Value>,
}

impl RegionRecord {
    /// Extracts a record from a loosely-shaped provider row.
    ///
    /// The provider is not consistent about field names across tiers
    /// (`province_name` vs. `amphoe_t`, `province_id` vs. `prov_id`), so
    /// each tier's known aliases are tried in order. Rows without a
    /// numeric `id` are rejected. A missing name falls back to a
    /// synthetic `"District 12"` style label.
    #[must_use]
    pub fn from_json(level: RegionLevel, row: &serde_json::Value) -> Option<Self> {
        let id = RegionId(row.get("id")?.as_i64()?);

        let name = level
            .name_keys()
            .iter()
            .filter_map(|key| row.get(*key).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map_or_else(|| level.fallback_name(id), ToString::to_string);

        let parent_id = level
            .parent_keys()
            .iter()
            .find_map(|key| row.get(*key).and_then(serde_json::Value::as_i64))
            .map(RegionId);

        let geometry = ["geometry", "geom"]
            .iter()
            .filter_map(|key| row.get(*key))
            .find(|g| !g.is_null())
            .cloned();

        Some(Self {
            id,
            name,
            parent_id,
            geometry,
        })
    }
}

/// A validated region with its parsed boundary. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Region id.
    pub id: RegionId,
    /// Tier this region belongs to.
    pub level: RegionLevel,
    /// Display name.
    pub name: String,
    /// Parent region id, `None` for provinces.
    pub parent_id: Option<RegionId>,
    /// Boundary.
    pub geometry: RegionGeometry,
}
