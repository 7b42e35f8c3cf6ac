//! Where the words to match against come from.
//!
//! The canonical source is the local phrase store. The peer source asks
//! another instance for its phrase counts over `GET /analyze` and uses the
//! keys of that object as the candidate words.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::store::{PhraseStore, StorageError};

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("peer at {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("peer at {url} returned an unexpected body: {reason}")]
    Decode { url: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Peer(#[from] PeerError),
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> Result<Vec<String>, CandidateError>;

    /// Short label for logs.
    fn describe(&self) -> String;
}

/// Every stored phrase is a candidate.
pub struct StoreCandidates {
    store: Arc<dyn PhraseStore>,
}

impl StoreCandidates {
    pub fn new(store: Arc<dyn PhraseStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CandidateSource for StoreCandidates {
    async fn candidates(&self) -> Result<Vec<String>, CandidateError> {
        Ok(self.store.list_phrases().await?)
    }

    fn describe(&self) -> String {
        "phrase store".to_string()
    }
}

/// Candidates are the field names of a peer's `GET /analyze` object.
pub struct PeerCandidates {
    endpoint: String,
    client: Client,
}

impl PeerCandidates {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            anyhow::bail!("peer url is empty");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            endpoint: format!("{}/analyze", base),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CandidateSource for PeerCandidates {
    async fn candidates(&self) -> Result<Vec<String>, CandidateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|source| PeerError::Request {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body: Value = response.json().await.map_err(|e| PeerError::Decode {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(words_from_counts(body).map_err(|reason| PeerError::Decode {
            url: self.endpoint.clone(),
            reason,
        })?)
    }

    fn describe(&self) -> String {
        format!("peer {}", self.endpoint())
    }
}

/// Field names of a JSON object; values are ignored.
pub fn words_from_counts(body: Value) -> Result<Vec<String>, String> {
    match body {
        Value::Object(map) => Ok(keys(map)),
        other => Err(format!("expected a JSON object, got {}", json_kind(&other))),
    }
}

fn keys(map: Map<String, Value>) -> Vec<String> {
    map.into_iter().map(|(key, _)| key).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
