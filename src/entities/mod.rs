// Entity Models
//
// - parcel:   raw register records (input, immutable)
// - merchant: resolved merchant profiles (output, immutable)

pub mod parcel;
pub mod merchant;

pub use parcel::{normalize_tenant_name, ParcelKind, RawParcelRecord, RecordId, ShopDetails};
pub use merchant::{HomeSource, MerchantProfile, ShopEntry};
