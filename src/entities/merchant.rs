// 🏪 Merchant Profile - canonical identity resolved from parcel records
//
// "Many register entries, one shopkeeper"
//
// A profile is created once by the merger, never mutated afterwards, then
// exported and handed to downstream consumers (persona generation).

use crate::entities::parcel::RecordId;
use serde::{Deserialize, Serialize};

// ============================================================================
// HOME SOURCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeSource {
    /// Home coordinates come from a HOUSE parcel
    House,

    /// No HOUSE in the component: the first member stands in as home,
    /// so the home coordinates may actually be a shop location
    Surrogate,
}

// ============================================================================
// SHOP ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopEntry {
    pub standard_type: String,
    pub translated_type: Option<String>,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

// ============================================================================
// MERCHANT PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantProfile {
    /// Raw tenant name of the home record
    pub person: String,

    /// Grouping key shared by all members
    pub normalized_name: String,

    /// Shops in stable register order (never empty)
    pub shops: Vec<ShopEntry>,

    pub house_lat: Option<f64>,
    pub house_lng: Option<f64>,
    pub home_source: HomeSource,

    /// Every record of the component, in register order
    pub member_ids: Vec<RecordId>,
}

impl MerchantProfile {
    pub fn shop_count(&self) -> usize {
        self.shops.len()
    }

    pub fn shop_types(&self) -> Vec<String> {
        self.shops.iter().map(|s| s.standard_type.clone()).collect()
    }

    pub fn shop_types_translated(&self) -> Vec<Option<String>> {
        self.shops.iter().map(|s| s.translated_type.clone()).collect()
    }

    pub fn shop_categories(&self) -> Vec<Option<String>> {
        self.shops.iter().map(|s| s.category.clone()).collect()
    }

    pub fn shop_lats(&self) -> Vec<Option<f64>> {
        self.shops.iter().map(|s| s.lat).collect()
    }

    pub fn shop_lngs(&self) -> Vec<Option<f64>> {
        self.shops.iter().map(|s| s.lng).collect()
    }

    pub fn has_surrogate_home(&self) -> bool {
        self.home_source == HomeSource::Surrogate
    }
}
