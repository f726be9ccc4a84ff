//! In-process record store backed by DashMap.
//!
//! Same surface as the hosted service, for development and tests. Rows keep
//! their insertion order so listings are stable.

use crate::{Collection, Filter, RecordStore};
use async_trait::async_trait;
use campaign_core::{DashboardError, DashboardResult};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Initial rows per collection, as read from a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub campaigns: Vec<Value>,
    #[serde(default)]
    pub ads_groups: Vec<Value>,
    #[serde(default)]
    pub ads: Vec<Value>,
    #[serde(default)]
    pub analytics: Vec<Value>,
}

pub struct MemoryStore {
    tables: DashMap<Collection, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = DashMap::new();
        for collection in Collection::ALL {
            tables.insert(collection, Vec::new());
        }
        info!("Record store initialized (in-memory)");
        Self { tables }
    }

    pub fn from_seed(seed: Seed) -> DashboardResult<Self> {
        let store = Self::new();
        let batches = [
            (Collection::Campaigns, seed.campaigns),
            (Collection::AdsGroups, seed.ads_groups),
            (Collection::Ads, seed.ads),
            (Collection::Analytics, seed.analytics),
        ];
        for (collection, rows) in batches {
            let count = rows.len();
            for row in rows {
                store.insert_row(collection, row)?;
            }
            debug!(collection = %collection, count, "Seeded collection");
        }
        Ok(store)
    }

    pub fn from_seed_file(path: &str) -> DashboardResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("cannot read seed file {path}: {e}")))?;
        let seed: Seed = serde_json::from_str(&raw)?;
        info!(path, "Loading seed data into memory store");
        Self::from_seed(seed)
    }

    /// Number of rows currently held in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.tables.get(&collection).map_or(0, |t| t.len())
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn insert_row(&self, collection: Collection, mut row: Value) -> DashboardResult<Value> {
        let object = row.as_object_mut().ok_or_else(|| {
            DashboardError::Storage(format!("{collection}: row must be a JSON object"))
        })?;
        let id = match object.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Null) | None => {
                let id = Uuid::new_v4().to_string();
                object.insert("id".to_string(), Value::String(id.clone()));
                id
            }
            Some(other) => other.to_string(),
        };

        let mut table = self.tables.entry(collection).or_default();
        if table.iter().any(|r| id_of(r).as_deref() == Some(id.as_str())) {
            return Err(DashboardError::Storage(format!(
                "duplicate key value violates unique constraint \"{collection}_pkey\" (id={id})"
            )));
        }
        table.push(row.clone());
        Ok(row)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn id_of(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: Collection, row: Value) -> DashboardResult<Value> {
        self.insert_row(collection, row)
    }

    async fn select(&self, collection: Collection, filter: &Filter) -> DashboardResult<Vec<Value>> {
        let table = self.tables.get(&collection);
        Ok(table
            .map(|t| t.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn select_limited(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> DashboardResult<Vec<Value>> {
        let table = self.tables.get(&collection);
        Ok(table
            .map(|t| t.iter().filter(|r| filter.matches(r)).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Value,
    ) -> DashboardResult<Vec<Value>> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(DashboardError::Storage(format!(
                    "{collection}: update patch must be a JSON object"
                )))
            }
        };

        let mut table = self.tables.entry(collection).or_default();
        let mut updated = Vec::new();
        for row in table.iter_mut().filter(|r| filter.matches(r)) {
            if let Some(object) = row.as_object_mut() {
                for (key, value) in &patch {
                    object.insert(key.clone(), value.clone());
                }
            }
            updated.push(row.clone());
        }
        debug!(collection = %collection, count = updated.len(), "Updated rows");
        Ok(updated)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> DashboardResult<u64> {
        let mut table = self.tables.entry(collection).or_default();
        let before = table.len();
        table.retain(|r| !filter.matches(r));
        let removed = (before - table.len()) as u64;
        debug!(collection = %collection, removed, "Deleted rows");
        Ok(removed)
    }
}
