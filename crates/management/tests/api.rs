use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use campaign_core::config::{AnalyticsConfig, ValidationConfig};
use campaign_management::{management_router, Maintainer, ManagementState};
use campaign_store::{Collection, MemoryStore, RecordStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(store: Arc<MemoryStore>) -> Router {
    let state = ManagementState {
        maintainer: Arc::new(Maintainer::new(store, ValidationConfig::default())),
        analytics: AnalyticsConfig::default(),
    };
    management_router(state)
}

fn app() -> Router {
    app_with(Arc::new(MemoryStore::new()))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn group_body(name: &str) -> Value {
    json!({
        "name": name,
        "ad_type": "Banner",
        "device_type": "Desktop",
        "template": "Gallery",
        "target_url": "https://example.com/sale"
    })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_campaign_lifecycle() {
    let app = app();
    let (status, group) = call(&app, "POST", "/api/v1/ads-groups", Some(group_body("Gallery"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, campaign) = call(
        &app,
        "POST",
        "/api/v1/campaigns",
        Some(json!({
            "name": "Autumn sale",
            "goal": "CPA",
            "budget": 1200,
            "bid_strategy": "CPA Goal",
            "ads_group_ids": [group_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(campaign["status"], "active");
    assert_eq!(campaign["ads_group_ids"], json!([group_id]));
    let id = campaign["id"].as_str().unwrap().to_string();

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/v1/campaigns/{id}"),
        Some(json!({ "name": "Autumn sale II" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Autumn sale II");
    assert_eq!(updated["ads_group_ids"], json!([]));

    let (status, paused) = call(&app, "POST", &format!("/api/v1/campaigns/{id}/pause"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["status"], "paused");

    let (status, _) = call(&app, "DELETE", &format!("/api/v1/campaigns/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, "GET", &format!("/api/v1/campaigns/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let (status, body) = call(
        &app(),
        "POST",
        "/api/v1/ads-groups",
        Some(json!({
            "name": "V",
            "ad_type": "Playable",
            "device_type": "Desktop",
            "template": "Image",
            "target_url": "not a url"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "target_url", "template", "device_type"]);
}

#[tokio::test]
async fn test_ads_group_patch_none_detaches() {
    let app = app();
    let (_, campaign) = call(
        &app,
        "POST",
        "/api/v1/campaigns",
        Some(json!({"name": "Holder", "goal": "ROAS", "budget": 10, "bid_strategy": "Highest Volume"})),
    )
    .await;
    let mut body = group_body("Linked");
    body["campaign_id"] = campaign["id"].clone();
    let (_, group) = call(&app, "POST", "/api/v1/ads-groups", Some(body)).await;
    assert_eq!(group["campaign_id"], campaign["id"]);

    let uri = format!("/api/v1/ads-groups/{}", group["id"].as_str().unwrap());
    let (status, patched) = call(&app, "PATCH", &uri, Some(json!({ "campaign_id": "none" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["campaign_id"], Value::Null);
}

#[tokio::test]
async fn test_ads_listing_filters_and_reconciles() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());
    let (_, group) = call(&app, "POST", "/api/v1/ads-groups", Some(group_body("Banners"))).await;
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, ad) = call(
        &app,
        "POST",
        "/api/v1/ads",
        Some(json!({ "name": "Hero", "ads_group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ad["type"], "Banner");
    assert_eq!(ad["status"], "active");

    store
        .update(
            Collection::Ads,
            &campaign_store::Filter::All,
            json!({ "type": "Interstitial" }),
        )
        .await
        .unwrap();

    let (status, ads) = call(&app, "GET", &format!("/api/v1/ads?group={group_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ads[0]["type"], "Banner");

    let (_, all) = call(&app, "GET", "/api/v1/ads?group=all", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "GET", "/api/v1/ads?group=banners", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_table() {
    let store = Arc::new(MemoryStore::new());
    for (id, campaign, clicks) in [("r1", "Alpha", 4), ("r2", "Beta", 7), ("r3", "Alpha", 6)] {
        store
            .insert(
                Collection::Analytics,
                json!({"id": id, "campaign": campaign, "adGroup": "G", "ad": "A", "clicks": clicks, "cost": 1.5}),
            )
            .await
            .unwrap();
    }
    let app = app_with(store);

    let (status, rows) = call(&app, "GET", "/api/v1/analytics/rows", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 3);

    let (status, table) = call(
        &app,
        "POST",
        "/api/v1/analytics/table",
        Some(json!({ "pivot": ["campaign"], "sort": [{"column": "campaign"}] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["total_rows"], 2);
    assert_eq!(table["rows"][0]["campaign"], "Alpha");
    assert_eq!(table["rows"][0]["clicks"], 10.0);
    assert_eq!(table["rows"][0]["cost"], 3.0);

    let (status, facets) = call(&app, "GET", "/api/v1/analytics/facets/campaign", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(facets, json!(["Alpha", "Beta"]));
}

#[tokio::test]
async fn test_reconcile_against_other_group_rejected() {
    let app = app();
    let (_, banners) = call(&app, "POST", "/api/v1/ads-groups", Some(group_body("Banners"))).await;
    let (_, videos) = call(
        &app,
        "POST",
        "/api/v1/ads-groups",
        Some(json!({
            "name": "Videos",
            "ad_type": "Rewarded",
            "device_type": "Mobile",
            "template": "Video",
            "target_url": "https://example.com/watch"
        })),
    )
    .await;
    let (_, ad) = call(
        &app,
        "POST",
        "/api/v1/ads",
        Some(json!({ "name": "Hero", "ads_group_id": banners["id"] })),
    )
    .await;
    let ad_id = ad["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/v1/ads/{ad_id}/reconcile"),
        Some(json!({ "ads_group_id": videos["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "ads_group_id");

    let (_, stored) = call(&app, "GET", &format!("/api/v1/ads/{ad_id}"), None).await;
    assert_eq!(stored["type"], "Banner");
}
