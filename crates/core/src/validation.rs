//! Form schema checks run before any store call. All failing fields are
//! collected so the caller can show each one next to its input.

use crate::config::ValidationConfig;
use crate::error::{DashboardResult, ValidationErrors};
use crate::types::{AdPatch, AdType, AdsGroup, CampaignFields, CampaignPatch, DeviceType, NewAd, NewAdsGroup};

const MIN_NAME_LEN: usize = 2;

fn check_name(errors: &mut ValidationErrors, entity: &str, name: &str) {
    if name.trim().chars().count() < MIN_NAME_LEN {
        errors.add(
            "name",
            format!("{entity} name must be at least {MIN_NAME_LEN} characters."),
        );
    }
}

fn check_budget(errors: &mut ValidationErrors, budget: f64) {
    if !budget.is_finite() || budget < 0.0 {
        errors.add("budget", "Budget must be a non-negative number.");
    }
}

fn check_url(errors: &mut ValidationErrors, raw: &str) {
    if url::Url::parse(raw).is_err() {
        errors.add("target_url", "Please enter a valid URL.");
    }
}

fn check_group_format(
    errors: &mut ValidationErrors,
    rules: &ValidationConfig,
    ad_type: AdType,
    device_type: DeviceType,
    template: &str,
) {
    if !ad_type.supports_template(template) {
        errors.add(
            "template",
            format!(
                "Template '{template}' is not available for {ad_type:?} ads; expected one of: {}.",
                ad_type.templates().join(", ")
            ),
        );
    }
    if rules.enforce_device_compatibility
        && ad_type.requires_mobile()
        && device_type != DeviceType::Mobile
    {
        errors.add(
            "device_type",
            format!("{ad_type:?} ads are only available on Mobile devices."),
        );
    }
}

pub fn validate_campaign(fields: &CampaignFields) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, "Campaign", &fields.name);
    check_budget(&mut errors, fields.budget);
    errors.into_result()
}

pub fn validate_campaign_patch(patch: &CampaignPatch) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &patch.name {
        check_name(&mut errors, "Campaign", name);
    }
    if let Some(budget) = patch.budget {
        check_budget(&mut errors, budget);
    }
    errors.into_result()
}

pub fn validate_ads_group(group: &NewAdsGroup, rules: &ValidationConfig) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, "Ads Group", &group.name);
    check_url(&mut errors, &group.target_url);
    check_group_format(&mut errors, rules, group.ad_type, group.device_type, &group.template);
    errors.into_result()
}

/// Checks an ad group after a partial update has been merged onto it.
pub fn validate_merged_ads_group(group: &AdsGroup, rules: &ValidationConfig) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, "Ads Group", &group.name);
    check_url(&mut errors, &group.target_url);
    check_group_format(&mut errors, rules, group.ad_type, group.device_type, &group.template);
    errors.into_result()
}

pub fn validate_ad(ad: &NewAd) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, "Ad", &ad.name);
    errors.into_result()
}

pub fn validate_ad_patch(patch: &AdPatch) -> DashboardResult<()> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &patch.name {
        check_name(&mut errors, "Ad", name);
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::types::{BidStrategy, ContextualTargeting, Goal, UserSegmentation};

    fn fields(name: &str, budget: f64) -> CampaignFields {
        CampaignFields {
            name: name.into(),
            goal: Goal::Cpa,
            budget,
            bid_strategy: BidStrategy::HighestValue,
            contextual_targeting: ContextualTargeting::default(),
            user_segmentation: UserSegmentation::default(),
        }
    }

    fn group(ad_type: AdType, device_type: DeviceType, template: &str, url: &str) -> NewAdsGroup {
        NewAdsGroup {
            name: "Launch group".into(),
            ad_type,
            device_type,
            template: template.into(),
            target_url: url.into(),
            campaign_id: None,
        }
    }

    fn invalid_fields(result: DashboardResult<()>) -> ValidationErrors {
        match result {
            Err(DashboardError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_campaign_collects_every_field() {
        let errors = invalid_fields(validate_campaign(&fields("A", -1.0)));
        assert!(errors.has_field("name"));
        assert!(errors.has_field("budget"));
        assert!(validate_campaign(&fields("Spring sale", 0.0)).is_ok());
    }

    #[test]
    fn test_campaign_patch_checks_present_fields_only() {
        assert!(validate_campaign_patch(&CampaignPatch::default()).is_ok());
        let patch = CampaignPatch {
            budget: Some(f64::NAN),
            ..Default::default()
        };
        assert!(invalid_fields(validate_campaign_patch(&patch)).has_field("budget"));
    }

    #[test]
    fn test_group_template_must_match_type() {
        let rules = ValidationConfig::default();
        let bad = group(AdType::Banner, DeviceType::Desktop, "Video", "https://example.com");
        assert!(invalid_fields(validate_ads_group(&bad, &rules)).has_field("template"));
        let ok = group(AdType::Banner, DeviceType::Desktop, "Gallery", "https://example.com");
        assert!(validate_ads_group(&ok, &rules).is_ok());
    }

    #[test]
    fn test_group_url_must_parse() {
        let rules = ValidationConfig::default();
        let bad = group(AdType::Banner, DeviceType::Mobile, "Image", "not a url");
        assert!(invalid_fields(validate_ads_group(&bad, &rules)).has_field("target_url"));
    }

    #[test]
    fn test_device_rule_follows_config() {
        let desktop_rewarded = group(AdType::Rewarded, DeviceType::Desktop, "Video", "https://example.com");
        let strict = ValidationConfig::default();
        assert!(invalid_fields(validate_ads_group(&desktop_rewarded, &strict)).has_field("device_type"));

        let lenient = ValidationConfig {
            enforce_device_compatibility: false,
        };
        assert!(validate_ads_group(&desktop_rewarded, &lenient).is_ok());
    }

    #[test]
    fn test_ad_name() {
        let ad = NewAd {
            name: " x ".into(),
            ads_group_id: uuid::Uuid::new_v4(),
            status: Default::default(),
        };
        assert!(invalid_fields(validate_ad(&ad)).has_field("name"));
        assert!(validate_ad_patch(&AdPatch::default()).is_ok());
    }
}
