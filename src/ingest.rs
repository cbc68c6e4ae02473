// 📥 Ingestion - register rows → RawParcelRecord
//
// Rows arrive pre-filtered from the external dataset loader. This layer only
// enforces structure: a row that cannot become a well-formed record fails the
// whole run with a SchemaError. Missing names or missing geometry are legal.

use crate::entities::{ParcelKind, RawParcelRecord, RecordId, ShopDetails};
use crate::error::SchemaError;
use crate::geo::{CoordinateSystem, GeoPoint};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// ROW SHAPE (register column names)
// ============================================================================

/// One row of the register export; every cell is read as text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelRow {
    #[serde(rename = "uid")]
    pub id: Option<String>,

    #[serde(rename = "ten_name", default)]
    pub tenant_name: Option<String>,

    #[serde(rename = "parish_std", default)]
    pub parish: Option<String>,

    #[serde(default)]
    pub sestiere: Option<String>,

    #[serde(rename = "PP_Function_TOP", default)]
    pub function: Option<String>,

    #[serde(rename = "PP_Bottega_STD", default)]
    pub shop_type: Option<String>,

    #[serde(rename = "PP_Bottega_TRAD", default)]
    pub shop_type_translated: Option<String>,

    #[serde(rename = "PP_Bottega_METACATEGORY", default)]
    pub shop_category: Option<String>,

    #[serde(default)]
    pub lat: Option<String>,

    #[serde(default)]
    pub lng: Option<String>,
}

// ============================================================================
// INGESTION
// ============================================================================

/// Convert rows into records, failing on the first structural violation.
pub fn ingest_rows(
    rows: &[ParcelRow],
    coordinate_system: CoordinateSystem,
) -> Result<Vec<RawParcelRecord>, SchemaError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let id = non_blank(row.id.as_deref())
            .ok_or(SchemaError::MissingIdentifier { row: row_number })?;
        if !seen.insert(id) {
            return Err(SchemaError::DuplicateIdentifier { id: id.to_string() });
        }

        let location = parse_location(row, row_number, coordinate_system)?;

        let shop = ShopDetails {
            standard_type: owned(row.shop_type.as_deref()),
            translated_type: owned(row.shop_type_translated.as_deref()),
            category: owned(row.shop_category.as_deref()),
        };
        let kind = ParcelKind::from_label(row.function.as_deref(), shop);

        records.push(RawParcelRecord::new(
            RecordId::new(id),
            row.tenant_name.clone(),
            location,
            owned(row.parish.as_deref()),
            owned(row.sestiere.as_deref()),
            kind,
        ));
    }

    Ok(records)
}

/// Load a register CSV export and ingest it
pub fn load_csv(csv_path: &Path, coordinate_system: CoordinateSystem) -> Result<Vec<RawParcelRecord>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open register CSV: {:?}", csv_path))?;

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let row: ParcelRow = result.map_err(|e| SchemaError::MalformedRow {
            row: index + 1,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    let records = ingest_rows(&rows, coordinate_system)?;
    Ok(records)
}

fn parse_location(
    row: &ParcelRow,
    row_number: usize,
    coordinate_system: CoordinateSystem,
) -> Result<Option<GeoPoint>, SchemaError> {
    let lat = non_blank(row.lat.as_deref());
    let lng = non_blank(row.lng.as_deref());

    let (lat, lng) = match (lat, lng) {
        (None, None) => return Ok(None),
        (Some(lat), Some(lng)) => (
            parse_coordinate(lat, "lat", row_number)?,
            parse_coordinate(lng, "lng", row_number)?,
        ),
        _ => return Err(SchemaError::PartialGeometry { row: row_number }),
    };

    if coordinate_system == CoordinateSystem::Geographic
        && (!(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng))
    {
        return Err(SchemaError::CoordinateOutOfRange { row: row_number, lat, lng });
    }

    Ok(Some(GeoPoint::new(lat, lng)))
}

fn parse_coordinate(value: &str, field: &'static str, row: usize) -> Result<f64, SchemaError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SchemaError::InvalidCoordinate {
            row,
            field,
            value: value.to_string(),
        })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

// ============================================================================
// TESTS
// ============================================================================
