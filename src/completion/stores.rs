use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::prompt::CallRequest;

/// A call as the external call store knows it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub agent_id: Option<String>,
    pub driver_name: Option<String>,
    pub load_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub status: String,
    pub transcript: Option<String>,
    pub duration_seconds: Option<u64>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Fields written to a call once its session completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallUpdate {
    pub status: String,
    pub transcript: Option<String>,
    /// Whole seconds
    pub duration_seconds: Option<u64>,
    pub ended_at: DateTime<Utc>,
}

/// Structured outcome of a call, one row per call id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CallResults {
    pub call_id: String,
    pub call_outcome: String,
    pub is_emergency: bool,
    pub driver_status: Option<String>,
    pub current_location: Option<String>,
    pub eta: Option<String>,
    pub delay_reason: Option<String>,
    pub emergency_type: Option<String>,
    pub confidence_score: Option<f64>,
    pub pod_reminder_acknowledged: bool,
    /// Everything the extractor produced, plus `cost_breakdown`
    pub raw_extraction: serde_json::Map<String, serde_json::Value>,
}

#[async_trait]
pub trait CallStore: Send + Sync {
    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>>;

    async fn update(&self, call_id: &str, update: CallUpdate) -> Result<()>;

    /// Record a call as in progress when its session starts. Stores whose
    /// calls are created elsewhere keep the default.
    async fn open(&self, _request: &CallRequest) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait ResultsStore: Send + Sync {
    /// Insert or replace the results for `results.call_id`
    async fn upsert(&self, results: CallResults) -> Result<()>;
}

/// Call store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCallStore {
    calls: Arc<RwLock<HashMap<String, CallRecord>>>,
}

impl MemoryCallStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: CallRecord) {
        self.calls.write().await.insert(record.id.clone(), record);
    }
}

#[async_trait]
impl CallStore for MemoryCallStore {
    async fn get(&self, call_id: &str) -> Result<Option<CallRecord>> {
        Ok(self.calls.read().await.get(call_id).cloned())
    }

    async fn update(&self, call_id: &str, update: CallUpdate) -> Result<()> {
        let mut calls = self.calls.write().await;
        let Some(call) = calls.get_mut(call_id) else {
            bail!("Call '{}' not found", call_id);
        };

        call.status = update.status;
        call.ended_at = Some(update.ended_at);
        if update.duration_seconds.is_some() {
            call.duration_seconds = update.duration_seconds;
        }
        if update.transcript.is_some() {
            call.transcript = update.transcript;
        }
        debug!("Updated call {} to status {}", call_id, call.status);
        Ok(())
    }

    async fn open(&self, request: &CallRequest) -> Result<()> {
        let mut calls = self.calls.write().await;
        let call = calls
            .entry(request.call_id.clone())
            .or_insert_with(|| CallRecord {
                id: request.call_id.clone(),
                agent_id: request.agent_id.clone(),
                driver_name: request.driver_name.clone(),
                load_number: request.load_number.clone(),
                origin: request.origin.clone(),
                destination: request.destination.clone(),
                ..Default::default()
            });
        call.status = "in_progress".to_string();
        debug!("Opened call {}", request.call_id);
        Ok(())
    }
}

/// Results store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryResultsStore {
    results: Arc<RwLock<HashMap<String, CallResults>>>,
}

impl MemoryResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, call_id: &str) -> Option<CallResults> {
        self.results.read().await.get(call_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.results.read().await.is_empty()
    }
}

#[async_trait]
impl ResultsStore for MemoryResultsStore {
    async fn upsert(&self, results: CallResults) -> Result<()> {
        debug!("Upserting results for call {}", results.call_id);
        self.results
            .write()
            .await
            .insert(results.call_id.clone(), results);
        Ok(())
    }
}
