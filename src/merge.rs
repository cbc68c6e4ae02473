// 🧬 Profile Merger - connected component → MerchantProfile
//
// Home: first HOUSE member in register order, else the first member
// (Surrogate, may be a shop). Shops: every SHOP member with a standardized
// type, in register order. A component left without shops is dropped here,
// independently of the group-level check in the grouper.

use crate::entities::{HomeSource, MerchantProfile, RawParcelRecord, ShopEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub components_without_shop: usize,
    pub surrogate_homes: usize,
    pub profiles: usize,
}

/// Merge one component (record indices in register order).
///
/// Returns None when the component holds no recognized shop.
pub fn merge_component(records: &[RawParcelRecord], component: &[usize]) -> Option<MerchantProfile> {
    let members: Vec<&RawParcelRecord> = component.iter().map(|&i| &records[i]).collect();

    let shops: Vec<ShopEntry> = members
        .iter()
        .filter_map(|record| {
            let details = record.kind().shop_details()?;
            let standard_type = details.standard_type()?.to_string();
            let location = record.location();
            Some(ShopEntry {
                standard_type,
                translated_type: details.translated_type.clone(),
                category: details.category.clone(),
                lat: location.map(|p| p.lat),
                lng: location.map(|p| p.lng),
            })
        })
        .collect();

    if shops.is_empty() {
        return None;
    }

    let (home, home_source) = match members.iter().find(|r| r.kind().is_house()) {
        Some(house) => (*house, HomeSource::House),
        None => (*members.first()?, HomeSource::Surrogate),
    };
    let home_location = home.location();

    Some(MerchantProfile {
        person: home.tenant_name().unwrap_or_default().to_string(),
        normalized_name: home.normalized_name().unwrap_or_default().to_string(),
        shops,
        house_lat: home_location.map(|p| p.lat),
        house_lng: home_location.map(|p| p.lng),
        home_source,
        member_ids: members.iter().map(|r| r.id().clone()).collect(),
    })
}

/// Merge every component, dropping the shop-less ones
pub fn merge_components(
    records: &[RawParcelRecord],
    components: &[Vec<usize>],
) -> (Vec<MerchantProfile>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut profiles = Vec::new();

    for component in components {
        match merge_component(records, component) {
            Some(profile) => {
                if profile.has_surrogate_home() {
                    stats.surrogate_homes += 1;
                }
                profiles.push(profile);
            }
            None => {
                debug!(
                    first = %records[component[0]].id(),
                    size = component.len(),
                    "dropping component without a shop"
                );
                stats.components_without_shop += 1;
            }
        }
    }

    stats.profiles = profiles.len();
    (profiles, stats)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ParcelKind, RecordId, ShopDetails};
    use crate::geo::GeoPoint;

    fn record(id: &str, name: &str, at: Option<(f64, f64)>, kind: ParcelKind) -> RawParcelRecord {
        RawParcelRecord::new(
            RecordId::new(id),
            Some(name.to_string()),
            at.map(|(lat, lng)| GeoPoint::new(lat, lng)),
            None,
            None,
            kind,
        )
    }

    fn shop(std: Option<&str>, category: &str) -> ParcelKind {
        ParcelKind::Shop(ShopDetails {
            standard_type: std.map(str::to_string),
            translated_type: std.map(|s| format!("{}-en", s.to_lowercase())),
            category: Some(category.to_string()),
        })
    }

    #[test]
    fn test_home_is_first_house() {
        let records = vec![
            record("1", "Zuane Rossi", Some((1.0, 1.0)), shop(Some("FORNER"), "food")),
            record("2", "ZUANE ROSSI", Some((2.0, 2.0)), ParcelKind::House),
            record("3", "zuane rossi", Some((3.0, 3.0)), ParcelKind::House),
        ];

        let profile = merge_component(&records, &[0, 1, 2]).unwrap();
        assert_eq!(profile.person, "ZUANE ROSSI");
        assert_eq!(profile.normalized_name, "zuane rossi");
        assert_eq!((profile.house_lat, profile.house_lng), (Some(2.0), Some(2.0)));
        assert_eq!(profile.home_source, HomeSource::House);
        assert_eq!(profile.shop_count(), 1);
        assert_eq!(profile.shop_types_translated(), vec![Some("forner-en".to_string())]);
        assert_eq!(profile.member_ids.len(), 3);
    }

    #[test]
    fn test_surrogate_home_when_no_house() {
        let records = vec![
            record("1", "Bon", Some((5.0, 6.0)), shop(Some("CASARO"), "food")),
            record("2", "Bon", Some((7.0, 8.0)), ParcelKind::Other),
        ];

        let profile = merge_component(&records, &[0, 1]).unwrap();
        assert_eq!(profile.home_source, HomeSource::Surrogate);
        assert_eq!((profile.house_lat, profile.house_lng), (Some(5.0), Some(6.0)));
        assert_eq!(profile.shop_lats(), vec![Some(5.0)]);
    }

    #[test]
    fn test_shops_in_register_order_with_missing_geometry() {
        let records = vec![
            record("1", "Bon", None, shop(Some("B"), "wood")),
            record("2", "Bon", Some((1.0, 2.0)), ParcelKind::House),
            record("3", "Bon", Some((3.0, 4.0)), shop(Some("A"), "food")),
            record("4", "Bon", Some((3.0, 4.0)), shop(None, "food")),
        ];

        let profile = merge_component(&records, &[0, 1, 2, 3]).unwrap();
        assert_eq!(profile.shop_types(), vec!["B", "A"]);
        assert_eq!(profile.shop_lats(), vec![None, Some(3.0)]);
        assert_eq!(
            profile.shop_categories(),
            vec![Some("wood".to_string()), Some("food".to_string())]
        );
    }

    #[test]
    fn test_component_without_shop_is_dropped() {
        let records = vec![
            record("1", "Bon", Some((1.0, 1.0)), ParcelKind::House),
            record("2", "Bon", Some((1.0, 1.0)), shop(None, "food")),
            record("3", "Bon", Some((1.0, 1.0)), shop(Some("A"), "food")),
        ];

        assert!(merge_component(&records, &[0, 1]).is_none());

        let (profiles, stats) = merge_components(&records, &[vec![0, 1], vec![2]]);
        assert_eq!(profiles.len(), 1);
        assert_eq!(stats.components_without_shop, 1);
        assert_eq!(stats.surrogate_homes, 1);
        assert_eq!(stats.profiles, 1);
    }

    #[test]
    fn test_no_profile_has_zero_shops() {
        let records: Vec<RawParcelRecord> = (0..12)
            .map(|i| {
                let kind = match i % 4 {
                    0 => ParcelKind::House,
                    1 => shop(Some("X"), "food"),
                    2 => shop(None, "food"),
                    _ => ParcelKind::Other,
                };
                record(&i.to_string(), "Bon", Some((0.0, i as f64)), kind)
            })
            .collect();
        let components: Vec<Vec<usize>> = (0..12).map(|i| vec![i]).collect();

        let (profiles, stats) = merge_components(&records, &components);
        assert_eq!(profiles.len(), 3);
        assert_eq!(stats.components_without_shop, 9);
        assert!(profiles.iter().all(|p| p.shop_count() >= 1));
    }
}
