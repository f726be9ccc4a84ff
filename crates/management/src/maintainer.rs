//! Campaign ↔ ad group ↔ ad relationship maintenance.
//!
//! Every mutation path goes through here so the links stay consistent:
//! ad groups point at at most one campaign, a campaign's ad-group list is
//! always derived from those pointers, and an ad's type follows its group.
//!
//! Multi-step operations run their store calls in sequence and stop at the
//! first error. Nothing is rolled back, so a failure part-way through can
//! leave earlier steps applied.

use crate::records::{decode, decode_all, decode_first, encode};
use campaign_core::config::ValidationConfig;
use campaign_core::types::{
    Ad, AdPatch, AdStatus, AdType, AdsGroup, AdsGroupPatch, Campaign, CampaignFields, CampaignPatch,
    CampaignStatus, CampaignView, NewAd, NewAdsGroup, COPY_SUFFIX,
};
use campaign_core::validation;
use campaign_core::{DashboardError, DashboardResult, ValidationErrors};
use campaign_store::{Collection, Filter, RecordStore};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A duplicated ad group together with the copies of its ads.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicatedGroup {
    pub ads_group: AdsGroup,
    pub ads: Vec<Ad>,
}

/// Outcome of one reconciliation pass over a list of ads.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub fixed: usize,
    pub failed: usize,
}

pub struct Maintainer {
    store: Arc<dyn RecordStore>,
    rules: ValidationConfig,
}

impl Maintainer {
    pub fn new(store: Arc<dyn RecordStore>, rules: ValidationConfig) -> Self {
        info!(backend = store.backend(), "Relationship maintainer ready");
        Self { store, rules }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    fn touched() -> DashboardResult<Value> {
        Ok(serde_json::to_value(Utc::now())?)
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub async fn list_campaigns(&self) -> DashboardResult<Vec<CampaignView>> {
        let campaigns: Vec<Campaign> = decode_all(
            Collection::Campaigns,
            self.store.select(Collection::Campaigns, &Filter::All).await?,
        )?;
        let groups = self.list_ads_groups().await?;

        let mut linked: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for group in &groups {
            if let Some(campaign_id) = group.campaign_id {
                linked.entry(campaign_id).or_default().push(group.id);
            }
        }

        Ok(campaigns
            .into_iter()
            .map(|campaign| {
                let ads_group_ids = linked.remove(&campaign.id).unwrap_or_default();
                CampaignView {
                    campaign,
                    ads_group_ids,
                }
            })
            .collect())
    }

    pub async fn get_campaign(&self, id: Uuid) -> DashboardResult<CampaignView> {
        let rows = self.store.select(Collection::Campaigns, &Filter::id(id)).await?;
        let campaign: Campaign = decode_first(Collection::Campaigns, "campaign", id, rows)?;
        let ads_group_ids = self.linked_group_ids(id).await?;
        Ok(CampaignView {
            campaign,
            ads_group_ids,
        })
    }

    async fn linked_group_ids(&self, campaign_id: Uuid) -> DashboardResult<Vec<Uuid>> {
        let rows = self
            .store
            .select(Collection::AdsGroups, &Filter::eq_id("campaign_id", campaign_id))
            .await?;
        let groups: Vec<AdsGroup> = decode_all(Collection::AdsGroups, rows)?;
        Ok(groups.into_iter().map(|g| g.id).collect())
    }

    /// Point every listed ad group at `campaign_id`; returns the ids that matched.
    async fn link_groups(&self, campaign_id: Uuid, ads_group_ids: &[Uuid]) -> DashboardResult<Vec<Uuid>> {
        if ads_group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .update(
                Collection::AdsGroups,
                &Filter::in_ids("id", ads_group_ids),
                json!({ "campaign_id": campaign_id }),
            )
            .await?;
        let groups: Vec<AdsGroup> = decode_all(Collection::AdsGroups, rows)?;
        Ok(groups.into_iter().map(|g| g.id).collect())
    }

    /// Insert a campaign, then link the given ad groups to it. A campaign
    /// starts `active` when it has ad groups and `paused` otherwise.
    pub async fn create_campaign(
        &self,
        fields: CampaignFields,
        ads_group_ids: &[Uuid],
    ) -> DashboardResult<CampaignView> {
        validation::validate_campaign(&fields)?;

        let now = Utc::now();
        let status = if ads_group_ids.is_empty() {
            CampaignStatus::Paused
        } else {
            CampaignStatus::Active
        };
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: fields.name,
            goal: fields.goal,
            status,
            budget: fields.budget,
            spend: 0.0,
            conversions: 0.0,
            ctr: 0.0,
            bid_strategy: fields.bid_strategy,
            contextual_targeting: fields.contextual_targeting,
            user_segmentation: fields.user_segmentation,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let row = self.store.insert(Collection::Campaigns, encode(&campaign)?).await?;
        let campaign: Campaign = decode(Collection::Campaigns, row)?;
        let ads_group_ids = self.link_groups(campaign.id, ads_group_ids).await?;

        info!(
            campaign_id = %campaign.id,
            status = ?campaign.status,
            ads_groups = ads_group_ids.len(),
            "Campaign created"
        );
        Ok(CampaignView {
            campaign,
            ads_group_ids,
        })
    }

    /// Update the campaign row, detach every ad group currently pointing at
    /// it, then attach exactly `ads_group_ids`.
    pub async fn update_campaign(
        &self,
        id: Uuid,
        patch: CampaignPatch,
        ads_group_ids: &[Uuid],
    ) -> DashboardResult<CampaignView> {
        validation::validate_campaign_patch(&patch)?;

        let mut body = encode(&patch)?;
        body["updated_at"] = Self::touched()?;
        let rows = self.store.update(Collection::Campaigns, &Filter::id(id), body).await?;
        let campaign: Campaign = decode_first(Collection::Campaigns, "campaign", id, rows)?;

        let cleared = self
            .store
            .update(
                Collection::AdsGroups,
                &Filter::eq_id("campaign_id", id),
                json!({ "campaign_id": null }),
            )
            .await?;
        debug!(campaign_id = %id, cleared = cleared.len(), "Detached ad groups");

        let ads_group_ids = self.link_groups(id, ads_group_ids).await?;

        info!(campaign_id = %id, ads_groups = ads_group_ids.len(), "Campaign updated");
        Ok(CampaignView {
            campaign,
            ads_group_ids,
        })
    }

    /// Detach the campaign's ad groups, then delete the campaign row. The
    /// ad groups themselves are kept.
    pub async fn delete_campaign(&self, id: Uuid) -> DashboardResult<()> {
        let detached = self
            .store
            .update(
                Collection::AdsGroups,
                &Filter::eq_id("campaign_id", id),
                json!({ "campaign_id": null }),
            )
            .await?;

        let deleted = self.store.delete(Collection::Campaigns, &Filter::id(id)).await?;
        if deleted == 0 {
            return Err(DashboardError::not_found("campaign", id));
        }

        info!(campaign_id = %id, detached = detached.len(), "Campaign deleted");
        Ok(())
    }

    pub async fn set_campaign_status(&self, id: Uuid, status: CampaignStatus) -> DashboardResult<Campaign> {
        let updated_at = Self::touched()?;
        let body = json!({ "status": status, "updated_at": updated_at });
        let rows = self.store.update(Collection::Campaigns, &Filter::id(id), body).await?;
        let campaign = decode_first(Collection::Campaigns, "campaign", id, rows)?;
        info!(campaign_id = %id, status = ?status, "Campaign status changed");
        Ok(campaign)
    }

    pub async fn pause_campaign(&self, id: Uuid) -> DashboardResult<Campaign> {
        self.set_campaign_status(id, CampaignStatus::Paused).await
    }

    pub async fn stop_campaign(&self, id: Uuid) -> DashboardResult<Campaign> {
        self.set_campaign_status(id, CampaignStatus::Stopped).await
    }

    // ─── Ad Groups ─────────────────────────────────────────────────────────

    pub async fn list_ads_groups(&self) -> DashboardResult<Vec<AdsGroup>> {
        let rows = self.store.select(Collection::AdsGroups, &Filter::All).await?;
        decode_all(Collection::AdsGroups, rows)
    }

    pub async fn get_ads_group(&self, id: Uuid) -> DashboardResult<AdsGroup> {
        let rows = self.store.select(Collection::AdsGroups, &Filter::id(id)).await?;
        decode_first(Collection::AdsGroups, "ads group", id, rows)
    }

    pub async fn create_ads_group(&self, new: NewAdsGroup) -> DashboardResult<AdsGroup> {
        validation::validate_ads_group(&new, &self.rules)?;

        let group = AdsGroup {
            id: Uuid::new_v4(),
            name: new.name,
            ad_type: new.ad_type,
            device_type: new.device_type,
            template: new.template,
            target_url: new.target_url,
            campaign_id: new.campaign_id,
            ad_ids: Vec::new(),
        };
        let row = self.store.insert(Collection::AdsGroups, encode(&group)?).await?;
        let group: AdsGroup = decode(Collection::AdsGroups, row)?;

        info!(ads_group_id = %group.id, campaign_id = ?group.campaign_id, "Ads group created");
        Ok(group)
    }

    /// Partial update. A `"none"` campaign link is written as null.
    pub async fn update_ads_group(&self, id: Uuid, patch: AdsGroupPatch) -> DashboardResult<AdsGroup> {
        let current = self.get_ads_group(id).await?;
        if patch == AdsGroupPatch::default() {
            return Ok(current);
        }
        validation::validate_merged_ads_group(&patch.merged_onto(&current), &self.rules)?;

        let rows = self
            .store
            .update(Collection::AdsGroups, &Filter::id(id), encode(&patch)?)
            .await?;
        let group: AdsGroup = decode_first(Collection::AdsGroups, "ads group", id, rows)?;

        info!(ads_group_id = %id, campaign_id = ?group.campaign_id, "Ads group updated");
        Ok(group)
    }

    /// Delete the group's ads first, then the group. Returns how many ads went
    /// with it.
    pub async fn delete_ads_group(&self, id: Uuid) -> DashboardResult<u64> {
        let removed_ads = self
            .store
            .delete(Collection::Ads, &Filter::eq_id("ads_group_id", id))
            .await?;
        let deleted = self.store.delete(Collection::AdsGroups, &Filter::id(id)).await?;
        if deleted == 0 {
            return Err(DashboardError::not_found("ads group", id));
        }

        info!(ads_group_id = %id, removed_ads, "Ads group deleted");
        Ok(removed_ads)
    }

    /// Copy a group and all of its ads. The copy is not linked to any campaign
    /// and its ads start paused.
    pub async fn duplicate_ads_group(&self, id: Uuid) -> DashboardResult<DuplicatedGroup> {
        let source = self.get_ads_group(id).await?;
        let copy = AdsGroup {
            id: Uuid::new_v4(),
            name: format!("{}{COPY_SUFFIX}", source.name),
            campaign_id: None,
            ad_ids: Vec::new(),
            ..source
        };
        let row = self.store.insert(Collection::AdsGroups, encode(&copy)?).await?;
        let mut copy: AdsGroup = decode(Collection::AdsGroups, row)?;

        let source_ads: Vec<Ad> = decode_all(
            Collection::Ads,
            self.store
                .select(Collection::Ads, &Filter::eq_id("ads_group_id", id))
                .await?,
        )?;

        let mut ads = Vec::with_capacity(source_ads.len());
        for ad in source_ads {
            let ad_copy = Ad {
                id: Uuid::new_v4(),
                name: format!("{}{COPY_SUFFIX}", ad.name),
                ads_group_id: copy.id,
                status: AdStatus::Paused,
                ad_type: copy.ad_type,
            };
            let row = self.store.insert(Collection::Ads, encode(&ad_copy)?).await?;
            ads.push(decode::<Ad>(Collection::Ads, row)?);
        }

        if !ads.is_empty() {
            copy.ad_ids = ads.iter().map(|a| a.id).collect();
            self.store
                .update(
                    Collection::AdsGroups,
                    &Filter::id(copy.id),
                    json!({ "ad_ids": copy.ad_ids }),
                )
                .await?;
        }

        info!(source = %id, ads_group_id = %copy.id, ads = ads.len(), "Ads group duplicated");
        Ok(DuplicatedGroup {
            ads_group: copy,
            ads,
        })
    }

    async fn set_group_ad_ids(&self, group_id: Uuid, ad_ids: &[Uuid]) -> DashboardResult<()> {
        self.store
            .update(
                Collection::AdsGroups,
                &Filter::id(group_id),
                json!({ "ad_ids": ad_ids }),
            )
            .await?;
        Ok(())
    }

    async fn append_ad_id(&self, group: &AdsGroup, ad_id: Uuid) -> DashboardResult<()> {
        if group.ad_ids.contains(&ad_id) {
            return Ok(());
        }
        let mut ad_ids = group.ad_ids.clone();
        ad_ids.push(ad_id);
        self.set_group_ad_ids(group.id, &ad_ids).await
    }

    async fn remove_ad_id(&self, group_id: Uuid, ad_id: Uuid) -> DashboardResult<()> {
        let group = match self.get_ads_group(group_id).await {
            Ok(group) => group,
            Err(DashboardError::NotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        if !group.ad_ids.contains(&ad_id) {
            return Ok(());
        }
        let ad_ids: Vec<Uuid> = group.ad_ids.into_iter().filter(|id| *id != ad_id).collect();
        self.set_group_ad_ids(group_id, &ad_ids).await
    }

    // ─── Ads ───────────────────────────────────────────────────────────────

    /// Ads, optionally limited to one group, ordered by group name, then
    /// status (active, paused, archived), then ad name.
    pub async fn list_ads(&self, ads_group_id: Option<Uuid>) -> DashboardResult<Vec<Ad>> {
        let filter = match ads_group_id {
            Some(id) => Filter::eq_id("ads_group_id", id),
            None => Filter::All,
        };
        let mut ads: Vec<Ad> = decode_all(Collection::Ads, self.store.select(Collection::Ads, &filter).await?)?;

        let names: HashMap<Uuid, String> = self
            .list_ads_groups()
            .await?
            .into_iter()
            .map(|g| (g.id, g.name))
            .collect();
        let group_name = |ad: &Ad| names.get(&ad.ads_group_id).map(String::as_str).unwrap_or("");

        ads.sort_by(|a, b| {
            group_name(a)
                .cmp(group_name(b))
                .then(a.status.cmp(&b.status))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(ads)
    }

    pub async fn get_ad(&self, id: Uuid) -> DashboardResult<Ad> {
        let rows = self.store.select(Collection::Ads, &Filter::id(id)).await?;
        decode_first(Collection::Ads, "ad", id, rows)
    }

    /// Insert an ad under an existing group. Its type is taken from the group.
    pub async fn create_ad(&self, new: NewAd) -> DashboardResult<Ad> {
        validation::validate_ad(&new)?;
        let group = self.get_ads_group(new.ads_group_id).await?;

        let ad = Ad {
            id: Uuid::new_v4(),
            name: new.name,
            ads_group_id: group.id,
            status: new.status,
            ad_type: group.ad_type,
        };
        let row = self.store.insert(Collection::Ads, encode(&ad)?).await?;
        let ad: Ad = decode(Collection::Ads, row)?;
        self.append_ad_id(&group, ad.id).await?;

        info!(ad_id = %ad.id, ads_group_id = %group.id, "Ad created");
        Ok(ad)
    }

    /// Partial update. Moving an ad to another group re-derives its type;
    /// a type supplied by the caller is ignored.
    pub async fn update_ad(&self, id: Uuid, patch: AdPatch) -> DashboardResult<Ad> {
        validation::validate_ad_patch(&patch)?;
        let current = self.get_ad(id).await?;

        let mut patch = AdPatch { ad_type: None, ..patch };
        let target = match patch.ads_group_id {
            Some(group_id) if group_id != current.ads_group_id => {
                let group = self.get_ads_group(group_id).await?;
                patch.ad_type = Some(group.ad_type);
                Some(group)
            }
            _ => None,
        };
        if patch == AdPatch::default() {
            return Ok(current);
        }

        let rows = self.store.update(Collection::Ads, &Filter::id(id), encode(&patch)?).await?;
        let ad: Ad = decode_first(Collection::Ads, "ad", id, rows)?;

        if let Some(group) = target {
            self.remove_ad_id(current.ads_group_id, id).await?;
            self.append_ad_id(&group, id).await?;
        }

        info!(ad_id = %id, ads_group_id = %ad.ads_group_id, "Ad updated");
        Ok(ad)
    }

    pub async fn delete_ad(&self, id: Uuid) -> DashboardResult<()> {
        let ad = self.get_ad(id).await?;
        self.store.delete(Collection::Ads, &Filter::id(id)).await?;
        self.remove_ad_id(ad.ads_group_id, id).await?;
        info!(ad_id = %id, "Ad deleted");
        Ok(())
    }

    /// Copy an ad within its group. The copy starts paused.
    pub async fn duplicate_ad(&self, id: Uuid) -> DashboardResult<Ad> {
        let source = self.get_ad(id).await?;
        let group = self.get_ads_group(source.ads_group_id).await?;

        let copy = Ad {
            id: Uuid::new_v4(),
            name: format!("{}{COPY_SUFFIX}", source.name),
            ads_group_id: group.id,
            status: AdStatus::Paused,
            ad_type: group.ad_type,
        };
        let row = self.store.insert(Collection::Ads, encode(&copy)?).await?;
        let copy: Ad = decode(Collection::Ads, row)?;
        self.append_ad_id(&group, copy.id).await?;

        info!(source = %id, ad_id = %copy.id, "Ad duplicated");
        Ok(copy)
    }

    /// Make the ad's type equal to its group's `ad_type`, writing only when
    /// they differ. `ads_group_id` must be the group the ad belongs to.
    pub async fn reconcile_ad_type(&self, ad_id: Uuid, ads_group_id: Uuid) -> DashboardResult<Ad> {
        let ad = self.get_ad(ad_id).await?;
        if ad.ads_group_id != ads_group_id {
            let mut errors = ValidationErrors::new();
            errors.add("ads_group_id", "Ad does not belong to this ads group.");
            return Err(DashboardError::Validation(errors));
        }
        let group = self.get_ads_group(ads_group_id).await?;
        if ad.ad_type == group.ad_type {
            return Ok(ad);
        }

        let rows = self
            .store
            .update(Collection::Ads, &Filter::id(ad_id), json!({ "type": group.ad_type }))
            .await?;
        let fixed: Ad = decode_first(Collection::Ads, "ad", ad_id, rows)?;
        info!(ad_id = %ad_id, from = ?ad.ad_type, to = ?fixed.ad_type, "Reconciled ad type");
        Ok(fixed)
    }

    /// Self-healing pass over ads about to be shown. Drifted ads are fixed in
    /// place; individual failures are logged and counted, not returned.
    pub async fn reconcile_ad_types(&self, ads: &mut [Ad]) -> DashboardResult<ReconcileReport> {
        let types: HashMap<Uuid, AdType> = self
            .list_ads_groups()
            .await?
            .into_iter()
            .map(|g| (g.id, g.ad_type))
            .collect();

        let mut report = ReconcileReport::default();
        for ad in ads.iter_mut() {
            report.checked += 1;
            let drifted = types
                .get(&ad.ads_group_id)
                .is_some_and(|expected| *expected != ad.ad_type);
            if !drifted {
                continue;
            }
            match self.reconcile_ad_type(ad.id, ad.ads_group_id).await {
                Ok(fixed) => {
                    *ad = fixed;
                    report.fixed += 1;
                }
                Err(e) => {
                    warn!(ad_id = %ad.id, error = %e, "Failed to reconcile ad type");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
