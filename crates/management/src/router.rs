//! Dashboard API router: management endpoints under /api/v1 plus analytics.

use crate::handlers::{self, ManagementState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the dashboard router with all endpoints.
pub fn management_router(state: ManagementState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Campaigns
        .route("/api/v1/campaigns", get(handlers::list_campaigns).post(handlers::create_campaign))
        .route("/api/v1/campaigns/:id", get(handlers::get_campaign).put(handlers::update_campaign).delete(handlers::delete_campaign))
        .route("/api/v1/campaigns/:id/pause", post(handlers::pause_campaign))
        .route("/api/v1/campaigns/:id/stop", post(handlers::stop_campaign))
        // Ad groups
        .route("/api/v1/ads-groups", get(handlers::list_ads_groups).post(handlers::create_ads_group))
        .route("/api/v1/ads-groups/:id", get(handlers::get_ads_group).patch(handlers::update_ads_group).delete(handlers::delete_ads_group))
        .route("/api/v1/ads-groups/:id/duplicate", post(handlers::duplicate_ads_group))
        // Ads
        .route("/api/v1/ads", get(handlers::list_ads).post(handlers::create_ad))
        .route("/api/v1/ads/reconcile", post(handlers::reconcile_ads))
        .route("/api/v1/ads/:id", get(handlers::get_ad).patch(handlers::update_ad).delete(handlers::delete_ad))
        .route("/api/v1/ads/:id/duplicate", post(handlers::duplicate_ad))
        .route("/api/v1/ads/:id/reconcile", post(handlers::reconcile_ad))
        // Analytics
        .route("/api/v1/analytics/rows", get(handlers::analytics_rows))
        .route("/api/v1/analytics/table", post(handlers::analytics_table))
        .route("/api/v1/analytics/facets/:column", get(handlers::analytics_facets))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
