use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of an asset, as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetVersion {
    /// Globally unique asset version id.
    pub id: i64,
    pub asset_id: i64,
    /// Position of this version within the asset's history.
    pub version_number: i64,
    /// Logical predecessor; not necessarily the previous entry of the listing.
    pub parent_asset_version_id: i64,
    pub creator_type: i64,
    pub creator_target_id: i64,
    /// `None` when the listing omits the field or sends `null`.
    #[serde(default)]
    pub creating_universe_id: Option<i64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Sorts versions into replay order. The sort is stable, so duplicate version numbers keep
/// their listing order.
pub fn sort_for_replay(versions: &mut [AssetVersion]) {
    versions.sort_by_key(|v| v.version_number);
}
