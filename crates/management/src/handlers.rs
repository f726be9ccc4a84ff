//! Axum REST handlers for the dashboard API.

use crate::maintainer::{DuplicatedGroup, Maintainer, ReconcileReport};
use crate::models::*;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use campaign_analytics::columns::Dimension;
use campaign_analytics::{build_table, facet_values, load_rows, TableQuery, TableView};
use campaign_core::config::AnalyticsConfig;
use campaign_core::types::{
    Ad, AdPatch, AdsGroup, AdsGroupPatch, AnalyticsRow, Campaign, CampaignView, NewAd, NewAdsGroup,
};
use campaign_core::DashboardError;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Shared dashboard state.
#[derive(Clone)]
pub struct ManagementState {
    pub maintainer: Arc<Maintainer>,
    pub analytics: AnalyticsConfig,
}

// ─── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Dashboard(DashboardError),
    BadRequest(String),
}

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError::Dashboard(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", None),
            ApiError::Dashboard(e) => match e {
                DashboardError::Validation(errors) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_failed",
                    Some(errors.fields().to_vec()),
                ),
                DashboardError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", None),
                DashboardError::Storage(_) | DashboardError::MissingCollection(_) => {
                    (StatusCode::BAD_GATEWAY, "storage_failed", None)
                }
                DashboardError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "invalid_record", None),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
            },
        };

        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Dashboard(DashboardError::Validation(errors)) => errors.to_string(),
            ApiError::Dashboard(e) => e.to_string(),
        };

        if status.is_server_error() {
            metrics::counter!("api.errors").increment(1);
            error!(status = status.as_u16(), error, %message, "Request failed");
        } else {
            warn!(status = status.as_u16(), error, %message, "Request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
                fields,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ─── Health ────────────────────────────────────────────────────────────────

/// GET /health
pub async fn health_check(State(state): State<ManagementState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        store: state.maintainer.store().backend().to_string(),
    })
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<ManagementState>) -> ApiResult<Json<Vec<CampaignView>>> {
    Ok(Json(state.maintainer.list_campaigns().await?))
}

pub async fn get_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CampaignView>> {
    Ok(Json(state.maintainer.get_campaign(id).await?))
}

pub async fn create_campaign(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<CampaignView>)> {
    let view = state
        .maintainer
        .create_campaign(req.fields, &req.ads_group_ids)
        .await?;
    metrics::counter!("management.campaigns.created").increment(1);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<CampaignView>> {
    let view = state
        .maintainer
        .update_campaign(id, req.patch, &req.ads_group_ids)
        .await?;
    metrics::counter!("management.campaigns.updated").increment(1);
    Ok(Json(view))
}

pub async fn delete_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.maintainer.delete_campaign(id).await?;
    metrics::counter!("management.campaigns.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pause_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.maintainer.pause_campaign(id).await?))
}

pub async fn stop_campaign(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.maintainer.stop_campaign(id).await?))
}

// ─── Ad Groups ─────────────────────────────────────────────────────────────

pub async fn list_ads_groups(State(state): State<ManagementState>) -> ApiResult<Json<Vec<AdsGroup>>> {
    Ok(Json(state.maintainer.list_ads_groups().await?))
}

pub async fn get_ads_group(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdsGroup>> {
    Ok(Json(state.maintainer.get_ads_group(id).await?))
}

pub async fn create_ads_group(
    State(state): State<ManagementState>,
    Json(req): Json<NewAdsGroup>,
) -> ApiResult<(StatusCode, Json<AdsGroup>)> {
    let group = state.maintainer.create_ads_group(req).await?;
    metrics::counter!("management.ads_groups.created").increment(1);
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_ads_group(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AdsGroupPatch>,
) -> ApiResult<Json<AdsGroup>> {
    let group = state.maintainer.update_ads_group(id, patch).await?;
    metrics::counter!("management.ads_groups.updated").increment(1);
    Ok(Json(group))
}

pub async fn delete_ads_group(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeletedAdsGroup>> {
    let removed_ads = state.maintainer.delete_ads_group(id).await?;
    metrics::counter!("management.ads_groups.deleted").increment(1);
    Ok(Json(DeletedAdsGroup { id, removed_ads }))
}

pub async fn duplicate_ads_group(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<DuplicatedGroup>)> {
    let copy = state.maintainer.duplicate_ads_group(id).await?;
    metrics::counter!("management.ads_groups.duplicated").increment(1);
    Ok((StatusCode::CREATED, Json(copy)))
}

// ─── Ads ───────────────────────────────────────────────────────────────────

/// Lists ads and repairs any whose type drifted from their group's.
pub async fn list_ads(
    State(state): State<ManagementState>,
    Query(query): Query<AdsListQuery>,
) -> ApiResult<Json<Vec<Ad>>> {
    let group = query
        .ads_group_id()
        .map_err(|e| ApiError::BadRequest(format!("invalid group filter: {e}")))?;
    let mut ads = state.maintainer.list_ads(group).await?;

    let report = state.maintainer.reconcile_ad_types(&mut ads).await?;
    if report.fixed > 0 {
        metrics::counter!("management.ads.reconciled").increment(report.fixed as u64);
    }
    Ok(Json(ads))
}

pub async fn get_ad(State(state): State<ManagementState>, Path(id): Path<Uuid>) -> ApiResult<Json<Ad>> {
    Ok(Json(state.maintainer.get_ad(id).await?))
}

pub async fn create_ad(
    State(state): State<ManagementState>,
    Json(req): Json<NewAd>,
) -> ApiResult<(StatusCode, Json<Ad>)> {
    let ad = state.maintainer.create_ad(req).await?;
    metrics::counter!("management.ads.created").increment(1);
    Ok((StatusCode::CREATED, Json(ad)))
}

pub async fn update_ad(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AdPatch>,
) -> ApiResult<Json<Ad>> {
    let ad = state.maintainer.update_ad(id, patch).await?;
    metrics::counter!("management.ads.updated").increment(1);
    Ok(Json(ad))
}

pub async fn delete_ad(State(state): State<ManagementState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    state.maintainer.delete_ad(id).await?;
    metrics::counter!("management.ads.deleted").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn duplicate_ad(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Ad>)> {
    let ad = state.maintainer.duplicate_ad(id).await?;
    metrics::counter!("management.ads.duplicated").increment(1);
    Ok((StatusCode::CREATED, Json(ad)))
}

pub async fn reconcile_ad(
    State(state): State<ManagementState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReconcileRequest>,
) -> ApiResult<Json<Ad>> {
    Ok(Json(state.maintainer.reconcile_ad_type(id, req.ads_group_id).await?))
}

/// Runs the reconciliation pass over every ad.
pub async fn reconcile_ads(State(state): State<ManagementState>) -> ApiResult<Json<ReconcileReport>> {
    let mut ads = state.maintainer.list_ads(None).await?;
    let report = state.maintainer.reconcile_ad_types(&mut ads).await?;
    metrics::counter!("management.ads.reconciled").increment(report.fixed as u64);
    Ok(Json(report))
}

// ─── Analytics ─────────────────────────────────────────────────────────────

pub async fn analytics_rows(
    State(state): State<ManagementState>,
    Query(query): Query<RowsQuery>,
) -> ApiResult<Json<Vec<AnalyticsRow>>> {
    let limit = query
        .limit
        .unwrap_or(state.analytics.row_limit)
        .min(state.analytics.row_limit);
    let rows = load_rows(state.maintainer.store().as_ref(), limit).await?;
    Ok(Json(rows))
}

pub async fn analytics_table(
    State(state): State<ManagementState>,
    Json(query): Json<TableQuery>,
) -> ApiResult<Json<TableView>> {
    let rows = load_rows(state.maintainer.store().as_ref(), state.analytics.row_limit).await?;
    metrics::counter!("analytics.tables.built").increment(1);
    Ok(Json(build_table(&rows, &query, state.analytics.page_size)))
}

/// Distinct values of one dimension, for the multi-select filter.
pub async fn analytics_facets(
    State(state): State<ManagementState>,
    Path(dimension): Path<Dimension>,
) -> ApiResult<Json<Vec<String>>> {
    let rows = load_rows(state.maintainer.store().as_ref(), state.analytics.row_limit).await?;
    Ok(Json(facet_values(&rows, dimension)))
}
