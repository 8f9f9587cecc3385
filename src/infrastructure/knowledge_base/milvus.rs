//! Milvus knowledge base backend over the RESTful API v2

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::BackendState;
use crate::domain::embedding::EmbeddingFunction;
use crate::domain::knowledge_base::{
    euclidean_similarity, score_threshold_process, Document, KnowledgeBaseName,
    KnowledgeBaseService, KnowledgeFile, ScoredDocument, VectorStoreType, SOURCE_KEY,
};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

/// Default number of hits returned by [`MilvusKnowledgeBaseService::search_collection`]
pub const DEFAULT_SEARCH_LIMIT: usize = 3;

const NPROBE: u32 = 10;
const NLIST: u32 = 128;
const TEXT_MAX_LENGTH: u32 = 65_535;
const SOURCE_MAX_LENGTH: u32 = 1_024;

/// Largest page of primary keys fetched per delete round
const QUERY_PAGE_SIZE: usize = 16_384;

const OUTPUT_FIELDS: [&str; 3] = ["text", "source", "metadata"];
/// Reads see every write acknowledged before them
const CONSISTENCY_LEVEL: &str = "Strong";

/// Connection settings for a Milvus server
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MilvusConfig {
    pub uri: String,
    pub token: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub db_name: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self {
            uri: "http://127.0.0.1:19530".to_string(),
            token: None,
            user: None,
            password: None,
            db_name: None,
            timeout_secs: 30,
        }
    }
}

impl MilvusConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// Bearer credential: the token, else `user:password`
    fn credential(&self) -> Option<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Some(token.clone());
        }

        match (&self.user, &self.password) {
            (Some(user), Some(password)) if !user.is_empty() => {
                Some(format!("{}:{}", user, password))
            }
            _ => None,
        }
    }
}

impl Debug for MilvusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilvusConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("db_name", &self.db_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// A raw search hit as Milvus returns it
#[derive(Debug, Clone, PartialEq)]
pub struct MilvusHit {
    pub pk: Value,
    /// Squared L2 distance
    pub distance: f64,
    pub text: String,
    pub source: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl MilvusHit {
    fn from_value(value: &Value) -> Self {
        let metadata = value
            .get("metadata")
            .and_then(|m| serde_json::from_value(m.clone()).ok())
            .unwrap_or_default();

        Self {
            pk: value.get("pk").cloned().unwrap_or(Value::Null),
            distance: value.get("distance").and_then(Value::as_f64).unwrap_or_default(),
            text: value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            source: value.get("source").and_then(Value::as_str).map(str::to_string),
            metadata,
        }
    }

    /// Euclidean distance of the hit
    pub fn euclidean_distance(&self) -> f64 {
        self.distance.max(0.0).sqrt()
    }

    fn into_scored(self) -> ScoredDocument {
        let score = euclidean_similarity(self.euclidean_distance());
        let mut document = Document {
            page_content: self.text,
            metadata: self.metadata,
        };

        if let Some(source) = self.source {
            document = document.with_source(source);
        }

        ScoredDocument::new(document, score)
    }
}

/// Thin client for the `/v2/vectordb` endpoints
#[derive(Debug)]
pub struct MilvusClient<C: HttpClientTrait> {
    http: Arc<C>,
    config: MilvusConfig,
}

impl<C: HttpClientTrait> Clone for MilvusClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            config: self.config.clone(),
        }
    }
}

impl<C: HttpClientTrait> MilvusClient<C> {
    pub fn new(http: Arc<C>, config: MilvusConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/v2/vectordb/{}",
            self.config.uri.trim_end_matches('/'),
            endpoint
        )
    }

    async fn call(&self, endpoint: &str, mut body: Value) -> Result<Value, DomainError> {
        if let (Some(db_name), Some(object)) = (&self.config.db_name, body.as_object_mut()) {
            object.insert("dbName".to_string(), json!(db_name));
        }

        let authorization = self.config.credential().map(|c| format!("Bearer {}", c));
        let mut headers = Vec::new();
        if let Some(value) = authorization.as_deref() {
            headers.push(("Authorization", value));
        }

        let response = self
            .http
            .post_json(&self.url(endpoint), headers, &body)
            .await
            .map_err(|e| DomainError::knowledge_base(format!("Milvus {} failed: {}", endpoint, e)))?;

        let code = response.get("code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(DomainError::knowledge_base(format!(
                "Milvus {} returned code {}: {}",
                endpoint, code, message
            )));
        }

        Ok(response)
    }

    pub async fn has_collection(&self, collection: &str) -> Result<bool, DomainError> {
        let response = self
            .call("collections/has", json!({ "collectionName": collection }))
            .await?;

        Ok(response["data"]["has"].as_bool().unwrap_or(false))
    }

    pub async fn create_collection(&self, collection: &str, dimensions: usize) -> Result<(), DomainError> {
        let body = json!({
            "collectionName": collection,
            "schema": {
                "autoId": true,
                "enableDynamicField": false,
                "fields": [
                    { "fieldName": "pk", "dataType": "Int64", "isPrimary": true },
                    {
                        "fieldName": "text",
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": TEXT_MAX_LENGTH }
                    },
                    {
                        "fieldName": "source",
                        "dataType": "VarChar",
                        "elementTypeParams": { "max_length": SOURCE_MAX_LENGTH }
                    },
                    { "fieldName": "metadata", "dataType": "JSON" },
                    {
                        "fieldName": "vector",
                        "dataType": "FloatVector",
                        "elementTypeParams": { "dim": dimensions }
                    }
                ]
            },
            "indexParams": [{
                "fieldName": "vector",
                "indexName": "vector",
                "metricType": "L2",
                "indexType": "IVF_FLAT",
                "params": { "nlist": NLIST }
            }],
            "params": { "consistencyLevel": CONSISTENCY_LEVEL }
        });

        self.call("collections/create", body).await?;
        Ok(())
    }

    pub async fn load_collection(&self, collection: &str) -> Result<(), DomainError> {
        self.call("collections/load", json!({ "collectionName": collection }))
            .await?;
        Ok(())
    }

    pub async fn drop_collection(&self, collection: &str) -> Result<(), DomainError> {
        self.call("collections/drop", json!({ "collectionName": collection }))
            .await?;
        Ok(())
    }

    /// Insert rows, returning the generated primary keys
    pub async fn insert(&self, collection: &str, rows: Vec<Value>) -> Result<Vec<String>, DomainError> {
        let response = self
            .call(
                "entities/insert",
                json!({ "collectionName": collection, "data": rows }),
            )
            .await?;

        let ids = response["data"]["insertIds"]
            .as_array()
            .map(|ids| ids.iter().map(pk_to_string).collect())
            .unwrap_or_default();

        Ok(ids)
    }

    pub async fn search(
        &self,
        collection: &str,
        vectors: &[Vec<f32>],
        limit: usize,
    ) -> Result<Vec<Vec<MilvusHit>>, DomainError> {
        let body = json!({
            "collectionName": collection,
            "data": vectors,
            "annsField": "vector",
            "limit": limit,
            "outputFields": OUTPUT_FIELDS,
            "consistencyLevel": CONSISTENCY_LEVEL,
            "searchParams": {
                "metricType": "L2",
                "params": { "nprobe": NPROBE }
            }
        });

        let response = self.call("entities/search", body).await?;
        let data = response["data"].as_array().cloned().unwrap_or_default();

        // One query vector comes back flat, several come back nested
        let groups = if data.first().is_some_and(Value::is_array) {
            data.iter()
                .map(|group| {
                    group
                        .as_array()
                        .map(|hits| hits.iter().map(MilvusHit::from_value).collect())
                        .unwrap_or_default()
                })
                .collect()
        } else {
            vec![data.iter().map(MilvusHit::from_value).collect()]
        };

        Ok(groups)
    }

    /// Primary keys of rows matching `filter`
    pub async fn query_pks(&self, collection: &str, filter: &str) -> Result<Vec<Value>, DomainError> {
        let response = self
            .call(
                "entities/query",
                json!({
                    "collectionName": collection,
                    "filter": filter,
                    "outputFields": ["pk"],
                    "limit": QUERY_PAGE_SIZE,
                    "consistencyLevel": CONSISTENCY_LEVEL
                }),
            )
            .await?;

        let pks = response["data"]
            .as_array()
            .map(|rows| rows.iter().filter_map(|row| row.get("pk").cloned()).collect())
            .unwrap_or_default();

        Ok(pks)
    }

    pub async fn delete(&self, collection: &str, filter: &str) -> Result<(), DomainError> {
        self.call(
            "entities/delete",
            json!({ "collectionName": collection, "filter": filter }),
        )
        .await?;
        Ok(())
    }
}

/// Double-quoted Milvus string literal with `\` and `"` escaped
pub fn escape_string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn pk_to_string(pk: &Value) -> String {
    match pk {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pk_in_filter(pks: &[Value]) -> String {
    let list: Vec<String> = pks
        .iter()
        .map(|pk| match pk {
            Value::String(s) => escape_string_literal(s),
            other => other.to_string(),
        })
        .collect();

    format!("pk in [{}]", list.join(","))
}

/// Knowledge base stored as one Milvus collection named after the kb
#[derive(Debug)]
pub struct MilvusKnowledgeBaseService<C: HttpClientTrait> {
    name: KnowledgeBaseName,
    http: Arc<C>,
    config: MilvusConfig,
    dimensions: usize,
    state: BackendState<MilvusClient<C>>,
}

impl<C: HttpClientTrait> MilvusKnowledgeBaseService<C> {
    pub fn new(name: KnowledgeBaseName, http: Arc<C>, config: MilvusConfig, dimensions: usize) -> Self {
        Self {
            name,
            http,
            config,
            dimensions,
            state: BackendState::new(),
        }
    }

    fn collection(&self) -> &str {
        self.name.as_str()
    }

    /// Raw L2 search of `collection`, `limit` hits per query vector
    /// (default [`DEFAULT_SEARCH_LIMIT`])
    pub async fn search_collection(
        client: &MilvusClient<C>,
        collection: &str,
        vectors: &[Vec<f32>],
        limit: Option<usize>,
    ) -> Result<Vec<Vec<MilvusHit>>, DomainError> {
        client
            .search(collection, vectors, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
    }

    async fn ensure_collection(&self, client: &MilvusClient<C>, dimensions: usize) -> Result<(), DomainError> {
        if client.has_collection(self.collection()).await? {
            return Ok(());
        }

        tracing::debug!(kb_name = %self.name, dimensions, "Creating Milvus collection");
        client.create_collection(self.collection(), dimensions).await?;
        client.load_collection(self.collection()).await
    }
}

#[async_trait]
impl<C: HttpClientTrait + 'static> KnowledgeBaseService for MilvusKnowledgeBaseService<C> {
    fn kb_name(&self) -> &KnowledgeBaseName {
        &self.name
    }

    fn vs_type(&self) -> VectorStoreType {
        VectorStoreType::Milvus
    }

    async fn do_init(&self) -> Result<(), DomainError> {
        let client = MilvusClient::new(Arc::clone(&self.http), self.config.clone());

        if client.has_collection(self.collection()).await? {
            client.load_collection(self.collection()).await?;
        }

        self.state.set_ready(client).await;
        tracing::debug!(kb_name = %self.name, uri = %self.config.uri, "Milvus backend initialized");

        Ok(())
    }

    async fn do_create_kb(&self) -> Result<(), DomainError> {
        if !self.state.is_ready().await {
            self.do_init().await?;
        }

        let client = self.state.client(&self.name).await?;
        self.ensure_collection(&client, self.dimensions).await
    }

    async fn do_drop_kb(&self) -> Result<(), DomainError> {
        let client = self.state.client(&self.name).await?;

        if client.has_collection(self.collection()).await? {
            client.drop_collection(self.collection()).await?;
        }

        self.state.set_dropped().await;
        tracing::debug!(kb_name = %self.name, "Dropped Milvus collection");

        Ok(())
    }

    async fn do_search(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
        embeddings: &dyn EmbeddingFunction,
    ) -> Result<Vec<ScoredDocument>, DomainError> {
        let client = self.state.client(&self.name).await?;

        tracing::debug!(kb_name = %self.name, top_k, score_threshold, "Starting KB search");

        if !client.has_collection(self.collection()).await? {
            return Ok(Vec::new());
        }

        let vector = embeddings.embed_query(query).await?;
        let hits = Self::search_collection(&client, self.collection(), &[vector], Some(top_k))
            .await
            .map_err(|e| {
                tracing::error!(kb_name = %self.name, error = %e, "KB search failed");
                e
            })?
            .into_iter()
            .next()
            .unwrap_or_default();

        let scored = hits.into_iter().map(MilvusHit::into_scored).collect();
        let results = score_threshold_process(score_threshold, top_k, scored);

        tracing::debug!(kb_name = %self.name, results = results.len(), "Search completed");

        Ok(results)
    }

    async fn do_add_doc(
        &self,
        docs: Vec<Document>,
        embeddings: &dyn EmbeddingFunction,
    ) -> Result<Vec<String>, DomainError> {
        let client = self.state.client(&self.name).await?;

        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = docs.iter().map(|d| d.page_content.clone()).collect();
        let vectors = embeddings.embed_documents(texts).await?;

        if vectors.len() != docs.len() {
            return Err(DomainError::knowledge_base("Embedding count mismatch"));
        }

        self.ensure_collection(&client, embeddings.dimensions()).await?;

        let rows = docs
            .into_iter()
            .zip(vectors)
            .map(|(mut doc, vector)| {
                let source = doc
                    .metadata
                    .remove(SOURCE_KEY)
                    .and_then(|s| s.as_str().map(str::to_string))
                    .unwrap_or_default();

                json!({
                    "text": doc.page_content,
                    "source": source,
                    "metadata": doc.metadata,
                    "vector": vector,
                })
            })
            .collect();

        let ids = client.insert(self.collection(), rows).await.map_err(|e| {
            tracing::error!(kb_name = %self.name, error = %e, "Failed to insert entities");
            e
        })?;

        tracing::debug!(kb_name = %self.name, added = ids.len(), "Added documents");

        Ok(ids)
    }

    async fn do_delete_doc(&self, kb_file: &KnowledgeFile) -> Result<usize, DomainError> {
        let client = self.state.client(&self.name).await?;

        if !client.has_collection(self.collection()).await? {
            return Ok(0);
        }

        let filter = format!("source == {}", escape_string_literal(&kb_file.source()));
        let mut removed = 0;

        loop {
            let pks = client.query_pks(self.collection(), &filter).await?;

            if pks.is_empty() {
                break;
            }

            client.delete(self.collection(), &pk_in_filter(&pks)).await?;
            removed += pks.len();
        }

        tracing::debug!(kb_name = %self.name, source = %kb_file.source(), removed, "Deleted document vectors");

        Ok(removed)
    }

    async fn do_clear_vs(&self) -> Result<(), DomainError> {
        let client = self.state.client(&self.name).await?;

        if client.has_collection(self.collection()).await? {
            client.drop_collection(self.collection()).await?;
        }

        tracing::debug!(kb_name = %self.name, "Cleared Milvus collection");

        Ok(())
    }
}
