//! Request and response bodies for the dashboard API.

use campaign_core::types::{CampaignFields, CampaignPatch};
use campaign_core::FieldError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaignRequest {
    #[serde(flatten)]
    pub fields: CampaignFields,
    #[serde(default)]
    pub ads_group_ids: Vec<Uuid>,
}

/// Editable campaign fields plus the full list of ad groups to link.
/// A missing list unlinks every ad group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCampaignRequest {
    #[serde(flatten)]
    pub patch: CampaignPatch,
    #[serde(default)]
    pub ads_group_ids: Vec<Uuid>,
}

// ─── Ads ───────────────────────────────────────────────────────────────────

/// `?group=<id>`; `all` or absent lists every ad.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdsListQuery {
    #[serde(default)]
    pub group: Option<String>,
}

impl AdsListQuery {
    pub fn ads_group_id(&self) -> Result<Option<Uuid>, uuid::Error> {
        match self.group.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => Uuid::parse_str(raw).map(Some),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub ads_group_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedAdsGroup {
    pub id: Uuid,
    pub removed_ads: u64,
}

// ─── Analytics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

// ─── Common ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}
