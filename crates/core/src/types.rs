//! Canonical dashboard records: campaigns, ad groups, ads and analytics rows.
//!
//! Every record that enters from the store is resolved into one of these
//! types; loose or legacy shapes fail at that boundary.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Form value meaning "not linked to any campaign".
pub const NO_CAMPAIGN: &str = "none";

/// Suffix appended to the name of duplicated groups and ads.
pub const COPY_SUFFIX: &str = " (Copy)";

// ─── Campaign ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Goal {
    Cpa,
    Roas,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    Stopped,
    Learning,
    #[serde(rename = "learning limited")]
    LearningLimited,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BidStrategy {
    #[serde(rename = "Highest Volume")]
    HighestVolume,
    #[serde(rename = "Highest Value")]
    HighestValue,
    #[serde(rename = "CPA Goal")]
    CpaGoal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextualTargeting {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserSegmentation {
    #[serde(default)]
    pub demographics: Vec<String>,
    #[serde(default)]
    pub behaviors: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Campaign row as persisted. The linked ad groups are not stored here;
/// see [`CampaignView`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub goal: Goal,
    pub status: CampaignStatus,
    pub budget: f64,
    #[serde(default)]
    pub spend: f64,
    #[serde(default)]
    pub conversions: f64,
    #[serde(default)]
    pub ctr: f64,
    pub bid_strategy: BidStrategy,
    #[serde(default)]
    pub contextual_targeting: ContextualTargeting,
    #[serde(default)]
    pub user_segmentation: UserSegmentation,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A campaign together with the ids of the ad groups pointing at it,
/// recomputed on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub ads_group_ids: Vec<Uuid>,
}

/// User-editable campaign fields submitted on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignFields {
    pub name: String,
    pub goal: Goal,
    #[serde(default)]
    pub budget: f64,
    pub bid_strategy: BidStrategy,
    #[serde(default)]
    pub contextual_targeting: ContextualTargeting,
    #[serde(default)]
    pub user_segmentation: UserSegmentation,
}

/// Partial campaign update; only present fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CampaignPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<BidStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contextual_targeting: Option<ContextualTargeting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_segmentation: Option<UserSegmentation>,
}

// ─── Ad Group ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AdType {
    Banner,
    Rewarded,
    Playable,
    Interstitial,
}

impl AdType {
    /// Creative templates a group of this type may use.
    pub fn templates(self) -> &'static [&'static str] {
        match self {
            AdType::Banner => &["Image", "Button", "Two-Buttons", "Gallery"],
            AdType::Rewarded => &["Video"],
            AdType::Playable => &["Interactive HTML"],
            AdType::Interstitial => &["Static", "Video", "HTML", "Interactive HTML"],
        }
    }

    pub fn supports_template(self, template: &str) -> bool {
        self.templates().contains(&template)
    }

    /// Rewarded and Playable formats only run on phones and tablets.
    pub fn requires_mobile(self) -> bool {
        matches!(self, AdType::Rewarded | AdType::Playable)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdsGroup {
    pub id: Uuid,
    pub name: String,
    pub ad_type: AdType,
    pub device_type: DeviceType,
    pub template: String,
    pub target_url: String,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ad_ids: Vec<Uuid>,
}

/// Hosted rows may carry `null` for an array column that was never written.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Uuid>, D::Error> {
    Ok(Option::<Vec<Uuid>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAdsGroup {
    pub name: String,
    pub ad_type: AdType,
    pub device_type: DeviceType,
    pub template: String,
    pub target_url: String,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
}

/// Target of an ad group's campaign link in a partial update.
///
/// Deserializes from a campaign id string or from the `"none"` form value,
/// which normalizes to a detached group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignLink {
    Detached,
    Campaign(Uuid),
}

impl CampaignLink {
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        match raw.trim() {
            "" | NO_CAMPAIGN => Ok(CampaignLink::Detached),
            id => Uuid::parse_str(id).map(CampaignLink::Campaign),
        }
    }

    pub fn campaign_id(self) -> Option<Uuid> {
        match self {
            CampaignLink::Detached => None,
            CampaignLink::Campaign(id) => Some(id),
        }
    }
}

impl Serialize for CampaignLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.campaign_id().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CampaignLink {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(CampaignLink::Detached),
            Some(raw) => CampaignLink::parse(&raw).map_err(D::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdsGroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_type: Option<AdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    /// Absent leaves the link untouched; `"none"` detaches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<CampaignLink>,
}

impl AdsGroupPatch {
    /// Apply onto a copy of `group`, for cross-field checks before writing.
    pub fn merged_onto(&self, group: &AdsGroup) -> AdsGroup {
        let mut merged = group.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(ad_type) = self.ad_type {
            merged.ad_type = ad_type;
        }
        if let Some(device_type) = self.device_type {
            merged.device_type = device_type;
        }
        if let Some(template) = &self.template {
            merged.template = template.clone();
        }
        if let Some(url) = &self.target_url {
            merged.target_url = url.clone();
        }
        if let Some(link) = self.campaign_id {
            merged.campaign_id = link.campaign_id();
        }
        merged
    }
}

// ─── Ad ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    #[default]
    Active,
    Paused,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ad {
    pub id: Uuid,
    pub name: String,
    pub ads_group_id: Uuid,
    pub status: AdStatus,
    /// Mirrors the parent group's `ad_type`.
    #[serde(rename = "type")]
    pub ad_type: AdType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAd {
    pub name: String,
    pub ads_group_id: Uuid,
    #[serde(default)]
    pub status: AdStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ads_group_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AdStatus>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ad_type: Option<AdType>,
}

// ─── Analytics ─────────────────────────────────────────────────────────────

/// One denormalized analytics line. Read-only for this system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRow {
    pub id: String,
    pub campaign: String,
    pub ad_group: String,
    pub ad: String,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub cost: f64,
    pub conversions: f64,
    pub revenue: f64,
}
