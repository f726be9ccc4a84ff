//! Hosted database service accessed through its PostgREST-style REST API.
//!
//! Each collection is a resource under the base URL; filters become query
//! operators (`id=eq.X`, `id=in.(a,b)`, `campaign_id=is.null`).

use crate::{Collection, Filter, RecordStore};
use async_trait::async_trait;
use campaign_core::config::StoreConfig;
use campaign_core::{DashboardError, DashboardResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Postgres "undefined table" and PostgREST's "table not in schema cache".
const MISSING_RELATION_CODES: [&str; 2] = ["42P01", "PGRST205"];

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> DashboardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| DashboardError::Storage(format!("Failed to create HTTP client: {e}")))?;

        info!(url = %config.url, "Record store initialized (hosted REST service)");

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, collection: Collection) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    fn request(&self, builder: RequestBuilder, filter: &Filter) -> RequestBuilder {
        let builder = builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key));
        match query_param(filter) {
            Some(param) => builder.query(&[param]),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, collection: Collection) -> DashboardResult<Vec<Value>> {
        let response = builder
            .send()
            .await
            .map_err(|e| DashboardError::Storage(format!("{collection}: request failed: {e}")))?;
        read_rows(response, collection).await
    }
}

/// Render a filter as a single `(field, operator)` query pair.
fn query_param(filter: &Filter) -> Option<(String, String)> {
    match filter {
        Filter::All => None,
        Filter::Eq(field, Value::Null) => Some((field.clone(), "is.null".to_string())),
        Filter::Eq(field, value) => Some((field.clone(), format!("eq.{}", literal(value)))),
        Filter::In(field, values) => {
            let list: Vec<String> = values.iter().map(|v| quoted(&literal(v))).collect();
            Some((field.clone(), format!("in.({})", list.join(","))))
        }
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// List members containing reserved characters must be double-quoted.
fn quoted(raw: &str) -> String {
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw.to_string()
    }
}

async fn read_rows(response: Response, collection: Collection) -> DashboardResult<Vec<Value>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| DashboardError::Storage(format!("{collection}: failed to read response: {e}")))?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<ServiceError>(&body) {
            let code = err.code.unwrap_or_else(|| status.as_u16().to_string());
            if MISSING_RELATION_CODES.contains(&code.as_str()) {
                return Err(DashboardError::MissingCollection(collection.to_string()));
            }
            return Err(DashboardError::Storage(format!(
                "{collection}: {} ({code})",
                err.message
            )));
        }
        return Err(DashboardError::Storage(format!(
            "{collection}: service returned status {status}: {body}"
        )));
    }

    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value = serde_json::from_str::<Value>(&body)
        .map_err(|e| DashboardError::Storage(format!("{collection}: invalid response body: {e}")))?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

#[async_trait]
impl RecordStore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn insert(&self, collection: Collection, row: Value) -> DashboardResult<Value> {
        debug!(collection = %collection, "REST insert");
        let builder = self
            .request(self.client.post(self.url(collection)), &Filter::All)
            .header("Prefer", "return=representation")
            .json(&row);
        let rows = self.send(builder, collection).await?;
        // Some deployments answer 201 with no body; fall back to what was sent.
        Ok(rows.into_iter().next().unwrap_or(row))
    }

    async fn select(&self, collection: Collection, filter: &Filter) -> DashboardResult<Vec<Value>> {
        debug!(collection = %collection, ?filter, "REST select");
        let builder = self
            .request(self.client.get(self.url(collection)), filter)
            .query(&[("select", "*")]);
        self.send(builder, collection).await
    }

    async fn select_limited(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> DashboardResult<Vec<Value>> {
        debug!(collection = %collection, ?filter, limit, "REST select");
        let builder = self
            .request(self.client.get(self.url(collection)), filter)
            .query(&[("select", "*".to_string()), ("limit", limit.to_string())]);
        self.send(builder, collection).await
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> DashboardResult<Vec<Value>> {
        debug!(collection = %collection, ?filter, "REST update");
        let builder = self
            .request(self.client.patch(self.url(collection)), filter)
            .header("Prefer", "return=representation")
            .json(&patch);
        self.send(builder, collection).await
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> DashboardResult<u64> {
        debug!(collection = %collection, ?filter, "REST delete");
        let builder = self
            .request(self.client.delete(self.url(collection)), filter)
            .header("Prefer", "return=representation");
        let rows = self.send(builder, collection).await?;
        Ok(rows.len() as u64)
    }
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(&StoreConfig {
            url: format!("{}/rest/v1/", server.uri()),
            api_key: "anon-key".to_string(),
            ..StoreConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_select_by_id() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/campaigns"))
            .and(query_param("id", format!("eq.{id}").as_str()))
            .and(query_param("select", "*"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": id.to_string(), "name": "Spring"}])),
            )
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .select(Collection::Campaigns, &Filter::id(id))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Spring"));
    }

    #[tokio::test]
    async fn test_update_sends_patch_and_filter() {
        let server = MockServer::start().await;
        let campaign = Uuid::new_v4();

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/ads_groups"))
            .and(query_param("campaign_id", format!("eq.{campaign}").as_str()))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!({"campaign_id": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "g1"}, {"id": "g2"}])))
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .update(
                Collection::AdsGroups,
                &Filter::eq_id("campaign_id", campaign),
                json!({"campaign_id": null}),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_without_body_returns_sent_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/ads"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let row = json!({"id": "a1", "name": "Hero"});
        let stored = store_for(&server).insert(Collection::Ads, row.clone()).await.unwrap();
        assert_eq!(stored, row);
    }

    #[tokio::test]
    async fn test_delete_counts_returned_rows() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/rest/v1/ads"))
            .and(query_param("ads_group_id", "eq.g1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a1"}, {"id": "a2"}, {"id": "a3"}])))
            .mount(&server)
            .await;

        let removed = store_for(&server)
            .delete(Collection::Ads, &Filter::Eq("ads_group_id".into(), json!("g1")))
            .await
            .unwrap();
        assert_eq!(removed, 3);
    }

    #[tokio::test]
    async fn test_service_error_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/campaigns"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .select(Collection::Campaigns, &Filter::All)
            .await
            .unwrap_err();
        match err {
            DashboardError::Storage(msg) => {
                assert!(msg.contains("PGRST301"));
                assert!(msg.starts_with("campaigns:"));
            }
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undefined_table_is_missing_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/analytics"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "42P01",
                "message": "relation \"public.analytics\" does not exist"
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .select(Collection::Analytics, &Filter::All)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::MissingCollection(ref name) if name == "analytics"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_storage_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/ads"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .select(Collection::Ads, &Filter::All)
            .await
            .unwrap_err();
        match err {
            DashboardError::Storage(msg) => assert!(msg.starts_with("ads: invalid response body")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_select_limited_sends_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/analytics"))
            .and(query_param("select", "*"))
            .and(query_param("limit", "3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "r1"}, {"id": "r2"}, {"id": "r3"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .select_limited(Collection::Analytics, &Filter::All, 3)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}
