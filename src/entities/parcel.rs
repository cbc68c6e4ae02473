// 🏠 Parcel Record - one cadastral unit of the 1740 register
//
// Immutable once ingested. The tenant name is normalized exactly once, at
// construction, so every stage groups on the same key.

use crate::geo::GeoPoint;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// RECORD ID
// ============================================================================

/// Register identifier of a parcel (`uid` column)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PARCEL KIND
// ============================================================================

/// Shop (bottega) attributes carried by SHOP parcels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopDetails {
    /// Standardized shop type code (PP_Bottega_STD)
    pub standard_type: Option<String>,

    /// English translation of the type (PP_Bottega_TRAD)
    pub translated_type: Option<String>,

    /// Metacategory, e.g. "food" (PP_Bottega_METACATEGORY)
    pub category: Option<String>,
}

impl ShopDetails {
    /// Standardized type, if present and not blank
    pub fn standard_type(&self) -> Option<&str> {
        self.standard_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelKind {
    House,
    Shop(ShopDetails),
    /// Anything else, including unrecognized classification labels
    Other,
}

impl ParcelKind {
    /// Map a register classification label (PP_Function_TOP) to a kind.
    ///
    /// A row carrying a standardized shop type is a shop whatever its label;
    /// mixed-use parcels (e.g. CASA with a bottega) are labelled that way.
    pub fn from_label(label: Option<&str>, shop: ShopDetails) -> Self {
        if shop.standard_type().is_some() {
            return ParcelKind::Shop(shop);
        }
        let label = label.map(|l| l.trim().to_uppercase()).unwrap_or_default();
        match label.as_str() {
            "CASA" | "HOUSE" => ParcelKind::House,
            "BOTTEGA" | "SHOP" => ParcelKind::Shop(shop),
            _ => ParcelKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParcelKind::House => "HOUSE",
            ParcelKind::Shop(_) => "SHOP",
            ParcelKind::Other => "OTHER",
        }
    }

    pub fn is_house(&self) -> bool {
        matches!(self, ParcelKind::House)
    }

    pub fn shop_details(&self) -> Option<&ShopDetails> {
        match self {
            ParcelKind::Shop(details) => Some(details),
            _ => None,
        }
    }
}

// ============================================================================
// RAW PARCEL RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawParcelRecord {
    id: RecordId,
    tenant_name: Option<String>,
    normalized_name: Option<String>,
    location: Option<GeoPoint>,
    parish: Option<String>,
    sestiere: Option<String>,
    kind: ParcelKind,
}

impl RawParcelRecord {
    pub fn new(
        id: RecordId,
        tenant_name: Option<String>,
        location: Option<GeoPoint>,
        parish: Option<String>,
        sestiere: Option<String>,
        kind: ParcelKind,
    ) -> Self {
        let normalized_name = tenant_name.as_deref().and_then(normalize_tenant_name);

        RawParcelRecord {
            id,
            tenant_name,
            normalized_name,
            location,
            parish: parish.filter(|p| !p.trim().is_empty()),
            sestiere: sestiere.filter(|s| !s.trim().is_empty()),
            kind,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Tenant name as written in the register
    pub fn tenant_name(&self) -> Option<&str> {
        self.tenant_name.as_deref()
    }

    /// Grouping key: trimmed, lower-cased, None when blank
    pub fn normalized_name(&self) -> Option<&str> {
        self.normalized_name.as_deref()
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    pub fn parish(&self) -> Option<&str> {
        self.parish.as_deref()
    }

    pub fn sestiere(&self) -> Option<&str> {
        self.sestiere.as_deref()
    }

    pub fn kind(&self) -> &ParcelKind {
        &self.kind
    }

    /// SHOP-classified with a non-blank standardized type
    pub fn is_recognized_shop(&self) -> bool {
        self.kind
            .shop_details()
            .and_then(ShopDetails::standard_type)
            .is_some()
    }
}

/// Deserialization shape; any stored `normalized_name` is ignored and
/// recomputed by `RawParcelRecord::new`.
#[derive(Deserialize)]
struct ParcelRecordFields {
    id: RecordId,
    #[serde(default)]
    tenant_name: Option<String>,
    #[serde(default)]
    location: Option<GeoPoint>,
    #[serde(default)]
    parish: Option<String>,
    #[serde(default)]
    sestiere: Option<String>,
    kind: ParcelKind,
}

impl<'de> Deserialize<'de> for RawParcelRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = ParcelRecordFields::deserialize(deserializer)?;
        Ok(RawParcelRecord::new(
            fields.id,
            fields.tenant_name,
            fields.location,
            fields.parish,
            fields.sestiere,
            fields.kind,
        ))
    }
}

/// Trim + lower-case; blank names normalize to None
pub fn normalize_tenant_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(std: Option<&str>) -> ShopDetails {
        ShopDetails {
            standard_type: std.map(str::to_string),
            translated_type: None,
            category: None,
        }
    }

    #[test]
    fn test_normalize_tenant_name() {
        assert_eq!(normalize_tenant_name("  Zuane ROSSI "), Some("zuane rossi".to_string()));
        assert_eq!(normalize_tenant_name("   "), None);
        assert_eq!(normalize_tenant_name(""), None);
    }

    #[test]
    fn test_record_normalizes_name_once() {
        let record = RawParcelRecord::new(
            RecordId::new("1"),
            Some(" Rossi ".to_string()),
            None,
            None,
            None,
            ParcelKind::House,
        );
        assert_eq!(record.tenant_name(), Some(" Rossi "));
        assert_eq!(record.normalized_name(), Some("rossi"));
    }

    #[test]
    fn test_blank_locality_becomes_none() {
        let record = RawParcelRecord::new(
            RecordId::new("1"),
            None,
            None,
            Some("  ".to_string()),
            Some("SM".to_string()),
            ParcelKind::Other,
        );
        assert_eq!(record.parish(), None);
        assert_eq!(record.sestiere(), Some("SM"));
        assert_eq!(record.normalized_name(), None);
    }

    #[test]
    fn test_kind_from_label() {
        assert_eq!(ParcelKind::from_label(Some("CASA"), shop(None)), ParcelKind::House);
        assert_eq!(ParcelKind::from_label(Some(" casa "), shop(None)), ParcelKind::House);
        assert_eq!(
            ParcelKind::from_label(Some("BOTTEGA"), shop(Some("CALEGHER"))),
            ParcelKind::Shop(shop(Some("CALEGHER")))
        );
        assert_eq!(ParcelKind::from_label(Some("INVIAMENTO"), shop(None)), ParcelKind::Other);
        assert_eq!(ParcelKind::from_label(None, shop(None)), ParcelKind::Other);
    }

    #[test]
    fn test_standard_type_makes_any_label_a_shop() {
        assert_eq!(
            ParcelKind::from_label(Some("CASA"), shop(Some("FORNER"))),
            ParcelKind::Shop(shop(Some("FORNER")))
        );
        assert_eq!(
            ParcelKind::from_label(Some("INVIAMENTO"), shop(Some("X"))),
            ParcelKind::Shop(shop(Some("X")))
        );
        assert_eq!(ParcelKind::from_label(Some("CASA"), shop(Some("  "))), ParcelKind::House);
    }

    #[test]
    fn test_deserialized_record_is_renormalized() {
        let json = r#"{
            "id": "1",
            "tenant_name": " Rossi ",
            "normalized_name": "bon",
            "location": null,
            "parish": "  ",
            "sestiere": "SP",
            "kind": "House"
        }"#;
        let record: RawParcelRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.normalized_name(), Some("rossi"));
        assert_eq!(record.parish(), None);
        assert_eq!(record.sestiere(), Some("SP"));

        let again: RawParcelRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn test_recognized_shop_requires_standard_type() {
        let make = |kind| RawParcelRecord::new(RecordId::new("1"), None, None, None, None, kind);

        assert!(make(ParcelKind::Shop(shop(Some("FORNER")))).is_recognized_shop());
        assert!(!make(ParcelKind::Shop(shop(Some("  ")))).is_recognized_shop());
        assert!(!make(ParcelKind::Shop(shop(None))).is_recognized_shop());
        assert!(!make(ParcelKind::House).is_recognized_shop());
    }
}
