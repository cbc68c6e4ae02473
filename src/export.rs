// 📤 Export - merchant profiles as a CSV table and a columnar binary table
//
// Both forms carry the same columns, in this order:
//   person, shop_count, shop_type, shop_type_translated, shop_category,
//   shop_lat, shop_lng, house_lat, house_lng
//
// CSV list cells hold JSON arrays (missing values → null). The binary form is
// one Vec per column inside a versioned envelope, encoded with bincode.

use crate::entities::MerchantProfile;
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const CSV_FILE_NAME: &str = "merchants_dataset.csv";
pub const COLUMNAR_FILE_NAME: &str = "merchants_dataset.bin";

pub const CSV_COLUMNS: [&str; 9] = [
    "person",
    "shop_count",
    "shop_type",
    "shop_type_translated",
    "shop_category",
    "shop_lat",
    "shop_lng",
    "house_lat",
    "house_lng",
];

const COLUMNAR_FORMAT: &str = "catastici-merchants/columnar";
const COLUMNAR_VERSION: u32 = 1;

// ============================================================================
// ROW-ORIENTED (CSV)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRow {
    pub person: String,
    pub shop_count: usize,
    pub shop_type: String,
    pub shop_type_translated: String,
    pub shop_category: String,
    pub shop_lat: String,
    pub shop_lng: String,
    pub house_lat: Option<f64>,
    pub house_lng: Option<f64>,
}

impl MerchantRow {
    pub fn from_profile(profile: &MerchantProfile) -> Result<Self> {
        Ok(MerchantRow {
            person: profile.person.clone(),
            shop_count: profile.shop_count(),
            shop_type: serde_json::to_string(&profile.shop_types())?,
            shop_type_translated: serde_json::to_string(&profile.shop_types_translated())?,
            shop_category: serde_json::to_string(&profile.shop_categories())?,
            shop_lat: serde_json::to_string(&profile.shop_lats())?,
            shop_lng: serde_json::to_string(&profile.shop_lngs())?,
            house_lat: profile.house_lat,
            house_lng: profile.house_lng,
        })
    }
}

pub fn write_csv(profiles: &[MerchantProfile], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    // serialize() only emits the header with the first row
    if profiles.is_empty() {
        wtr.write_record(CSV_COLUMNS).context("Failed to write CSV header")?;
    }

    for profile in profiles {
        let row = MerchantRow::from_profile(profile)
            .with_context(|| format!("Failed to encode profile '{}'", profile.person))?;
        wtr.serialize(row).context("Failed to write CSV row")?;
    }

    wtr.flush().context("Failed to flush CSV file")?;
    Ok(())
}

// ============================================================================
// COLUMNAR (bincode)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantColumns {
    pub person: Vec<String>,
    pub shop_count: Vec<u32>,
    pub shop_type: Vec<Vec<String>>,
    pub shop_type_translated: Vec<Vec<Option<String>>>,
    pub shop_category: Vec<Vec<Option<String>>>,
    pub shop_lat: Vec<Vec<Option<f64>>>,
    pub shop_lng: Vec<Vec<Option<f64>>>,
    pub house_lat: Vec<Option<f64>>,
    pub house_lng: Vec<Option<f64>>,
}

impl MerchantColumns {
    pub fn from_profiles(profiles: &[MerchantProfile]) -> Result<Self> {
        let mut columns = MerchantColumns::default();
        for p in profiles {
            let shop_count = u32::try_from(p.shop_count())
                .with_context(|| format!("shop_count of '{}' does not fit the column", p.person))?;
            columns.person.push(p.person.clone());
            columns.shop_count.push(shop_count);
            columns.shop_type.push(p.shop_types());
            columns.shop_type_translated.push(p.shop_types_translated());
            columns.shop_category.push(p.shop_categories());
            columns.shop_lat.push(p.shop_lats());
            columns.shop_lng.push(p.shop_lngs());
            columns.house_lat.push(p.house_lat);
            columns.house_lng.push(p.house_lng);
        }
        Ok(columns)
    }

    /// Number of rows (profiles)
    pub fn len(&self) -> usize {
        self.person.len()
    }

    pub fn is_empty(&self) -> bool {
        self.person.is_empty()
    }

    /// Every column has the same number of rows
    fn check_consistent(&self) -> Result<()> {
        let n = self.len();
        let lengths = [
            ("shop_count", self.shop_count.len()),
            ("shop_type", self.shop_type.len()),
            ("shop_type_translated", self.shop_type_translated.len()),
            ("shop_category", self.shop_category.len()),
            ("shop_lat", self.shop_lat.len()),
            ("shop_lng", self.shop_lng.len()),
            ("house_lat", self.house_lat.len()),
            ("house_lng", self.house_lng.len()),
        ];
        if let Some((column, len)) = lengths.iter().find(|(_, len)| *len != n) {
            bail!("column '{}' has {} rows, expected {}", column, len, n);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnarEnvelope {
    format: String,
    version: u32,
    columns: MerchantColumns,
}

pub fn write_columnar(profiles: &[MerchantProfile], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create columnar file: {:?}", path))?;

    let envelope = ColumnarEnvelope {
        format: COLUMNAR_FORMAT.to_string(),
        version: COLUMNAR_VERSION,
        columns: MerchantColumns::from_profiles(profiles)?,
    };

    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, &envelope)
        .map_err(|e| anyhow!("Failed to encode columnar table: {}", e))?;
    writer.flush().context("Failed to flush columnar file")?;
    Ok(())
}

pub fn read_columnar(path: &Path) -> Result<MerchantColumns> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open columnar file: {:?}", path))?;

    let envelope: ColumnarEnvelope = bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| anyhow!("Failed to decode columnar table {:?}: {}", path, e))?;

    if envelope.format != COLUMNAR_FORMAT {
        bail!("unexpected columnar format '{}'", envelope.format);
    }
    if envelope.version != COLUMNAR_VERSION {
        bail!(
            "unsupported columnar version {} (expected {})",
            envelope.version,
            COLUMNAR_VERSION
        );
    }

    envelope.columns.check_consistent()?;
    Ok(envelope.columns)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HomeSource, RecordId, ShopEntry};

    fn profile(person: &str, shops: Vec<ShopEntry>, house: Option<(f64, f64)>) -> MerchantProfile {
        MerchantProfile {
            person: person.to_string(),
            normalized_name: person.to_lowercase(),
            shops,
            house_lat: house.map(|h| h.0),
            house_lng: house.map(|h| h.1),
            home_source: HomeSource::House,
            member_ids: vec![RecordId::new("1")],
        }
    }

    fn entry(std: &str, category: Option<&str>, at: Option<(f64, f64)>) -> ShopEntry {
        ShopEntry {
            standard_type: std.to_string(),
            translated_type: None,
            category: category.map(str::to_string),
            lat: at.map(|a| a.0),
            lng: at.map(|a| a.1),
        }
    }

    fn sample() -> Vec<MerchantProfile> {
        vec![
            profile(
                "Zuane Rossi",
                vec![
                    entry("FORNER", Some("food"), Some((45.43, 12.33))),
                    entry("CASARO", None, None),
                ],
                Some((45.44, 12.34)),
            ),
            profile("Piero Bon", vec![entry("CALEGHER", Some("clothing"), None)], None),
        ]
    }

    #[test]
    fn test_csv_columns_and_list_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CSV_FILE_NAME);
        write_csv(&sample(), &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, CSV_COLUMNS);

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "Zuane Rossi");
        assert_eq!(&rows[0][1], "2");
        assert_eq!(&rows[0][2], r#"["FORNER","CASARO"]"#);
        assert_eq!(&rows[0][3], "[null,null]");
        assert_eq!(&rows[0][4], r#"["food",null]"#);
        assert_eq!(&rows[0][5], "[45.43,null]");
        assert_eq!(&rows[0][7], "45.44");
        assert_eq!(&rows[1][7], "");
        assert_eq!(&rows[1][8], "");
    }

    #[test]
    fn test_columnar_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COLUMNAR_FILE_NAME);
        let profiles = sample();
        write_columnar(&profiles, &path).unwrap();

        let columns = read_columnar(&path).unwrap();
        assert_eq!(columns, MerchantColumns::from_profiles(&profiles).unwrap());
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.shop_count, vec![2, 1]);
        assert_eq!(columns.shop_lat[0], vec![Some(45.43), None]);
        assert_eq!(columns.house_lat, vec![Some(45.44), None]);
    }

    #[test]
    fn test_columns_follow_profile_order() {
        let columns = MerchantColumns::from_profiles(&sample()).unwrap();
        assert_eq!(columns.person, vec!["Zuane Rossi", "Piero Bon"]);
        assert_eq!(columns.shop_count, vec![2u32, 1]);
        assert_eq!(columns.shop_type[1], vec!["CALEGHER"]);
        assert!(columns.check_consistent().is_ok());
    }

    #[test]
    fn test_columnar_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.bin");
        let envelope = ColumnarEnvelope {
            format: "something-else".to_string(),
            version: COLUMNAR_VERSION,
            columns: MerchantColumns::default(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = read_columnar(&path).unwrap_err();
        assert!(err.to_string().contains("unexpected columnar format"));
    }

    #[test]
    fn test_columnar_rejects_ragged_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.bin");
        let mut columns = MerchantColumns::from_profiles(&sample()).unwrap();
        columns.house_lng.pop();
        let envelope = ColumnarEnvelope {
            format: COLUMNAR_FORMAT.to_string(),
            version: COLUMNAR_VERSION,
            columns,
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let err = read_columnar(&path).unwrap_err();
        assert!(err.to_string().contains("house_lng"));
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join(COLUMNAR_FILE_NAME);
        write_columnar(&[], &bin).unwrap();
        assert!(read_columnar(&bin).unwrap().is_empty());

        let csv_path = dir.path().join(CSV_FILE_NAME);
        write_csv(&[], &csv_path).unwrap();
        let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(rdr.headers().unwrap().len(), CSV_COLUMNS.len());
        assert_eq!(rdr.records().count(), 0);
    }
}
