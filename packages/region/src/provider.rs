//! Geometry provider interface.
//!
//! The map core never fetches boundaries itself; it asks a
//! [`GeometryProvider`] for the rows of one tier at a time. Provinces are
//! requested unfiltered, lower tiers filtered by their parent ids.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use evidence_map_region_models::{RegionId, RegionLevel, RegionRecord};

use crate::RegionError;

/// Source of region boundaries.
#[async_trait]
pub trait GeometryProvider: Send + Sync {
    /// Returns every province.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the provinces cannot be fetched.
    async fn provinces(&self) -> Result<Vec<RegionRecord>, RegionError>;

    /// Returns the districts belonging to any of `province_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the districts cannot be fetched.
    async fn districts(&self, province_ids: &[RegionId]) -> Result<Vec<RegionRecord>, RegionError>;

    /// Returns the subdistricts belonging to any of `district_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if the subdistricts cannot be fetched.
    async fn subdistricts(
        &self,
        district_ids: &[RegionId],
    ) -> Result<Vec<RegionRecord>, RegionError>;
}

/// Parses a provider response body (a JSON array of region rows).
///
/// Rows without a numeric id are dropped with a warning.
///
/// # Errors
///
/// Returns [`RegionError`] if the body is not JSON or not an array.
pub fn parse_records(level: RegionLevel, body: &str) -> Result<Vec<RegionRecord>, RegionError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let rows = value.as_array().ok_or_else(|| RegionError::Provider {
        message: format!("expected a JSON array of {level} rows"),
    })?;

    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let record = RegionRecord::from_json(level, row);
            if record.is_none() {
                log::warn!("Dropping {level} row {index}: missing numeric id");
            }
            record
        })
        .collect())
}

fn filter_by_parent(records: Vec<RegionRecord>, parents: &[RegionId]) -> Vec<RegionRecord> {
    let parents: BTreeSet<RegionId> = parents.iter().copied().collect();
    records
        .into_iter()
        .filter(|record| record.parent_id.is_some_and(|p| parents.contains(&p)))
        .collect()
}

/// Serves boundaries from JSON files on disk.
///
/// Each file holds the full, unfiltered list for its tier; parent
/// filtering happens after reading. Tiers without a file yield no rows.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    provinces: PathBuf,
    districts: Option<PathBuf>,
    subdistricts: Option<PathBuf>,
}

impl JsonFileProvider {
    /// Creates a provider with only a provinces file.
    #[must_use]
    pub fn new(provinces: impl Into<PathBuf>) -> Self {
        Self {
            provinces: provinces.into(),
            districts: None,
            subdistricts: None,
        }
    }

    /// Sets the districts file.
    #[must_use]
    pub fn with_districts(mut self, path: impl Into<PathBuf>) -> Self {
        self.districts = Some(path.into());
        self
    }

    /// Sets the subdistricts file.
    #[must_use]
    pub fn with_subdistricts(mut self, path: impl Into<PathBuf>) -> Self {
        self.subdistricts = Some(path.into());
        self
    }

    async fn read(
        path: Option<&PathBuf>,
        level: RegionLevel,
    ) -> Result<Vec<RegionRecord>, RegionError> {
        let Some(path) = path else {
            log::debug!("No {level} file configured");
            return Ok(Vec::new());
        };
        log::debug!("Reading {level} boundaries from {}", path.display());
        let body = tokio::fs::read_to_string(path).await?;
        parse_records(level, &body)
    }
}

#[async_trait]
impl GeometryProvider for JsonFileProvider {
    async fn provinces(&self) -> Result<Vec<RegionRecord>, RegionError> {
        Self::read(Some(&self.provinces), RegionLevel::Province).await
    }

    async fn districts(&self, province_ids: &[RegionId]) -> Result<Vec<RegionRecord>, RegionError> {
        let records = Self::read(self.districts.as_ref(), RegionLevel::District).await?;
        Ok(filter_by_parent(records, province_ids))
    }

    async fn subdistricts(
        &self,
        district_ids: &[RegionId],
    ) -> Result<Vec<RegionRecord>, RegionError> {
        let records = Self::read(self.subdistricts.as_ref(), RegionLevel::Subdistrict).await?;
        Ok(filter_by_parent(records, district_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_records_drops_rows_without_id() {
        let records = parse_records(
            RegionLevel::District,
            r#"[{"id": 1, "district_name": "A", "province_id": 5}, {"district_name": "B"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parent_id, Some(RegionId(5)));
    }

    #[test]
    fn parse_records_rejects_non_array() {
        assert!(matches!(
            parse_records(RegionLevel::Province, r#"{"id": 1}"#),
            Err(RegionError::Provider { .. })
        ));
        assert!(matches!(
            parse_records(RegionLevel::Province, "not json"),
            Err(RegionError::Json(_))
        ));
    }

    #[tokio::test]
    async fn file_provider_filters_by_parent() {
        let dir = std::env::temp_dir().join(format!("evidence_map_provider_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let provinces = dir.join("provinces.json");
        let districts = dir.join("districts.json");
        std::fs::write(&provinces, r#"[{"id": 1, "province_name": "A"}]"#).unwrap();
        std::fs::write(
            &districts,
            r#"[{"id": 10, "name": "X", "province_id": 1}, {"id": 11, "name": "Y", "province_id": 2}]"#,
        )
        .unwrap();

        let provider = JsonFileProvider::new(&provinces).with_districts(&districts);
        assert_eq!(provider.provinces().await.unwrap().len(), 1);

        let filtered = provider.districts(&[RegionId(1)]).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, RegionId(10));

        assert!(provider.subdistricts(&[RegionId(10)]).await.unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
