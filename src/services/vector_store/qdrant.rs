//! Qdrant vector store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};

use super::{ChunkRecord, ScoredChunk, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{ChunkMetadata, VectorStoreConfig};

pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    embedding_dim: u64,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig, embedding_dim: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedding_dim,
        })
    }

    async fn points_count(&self) -> Result<Option<u64>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(
                info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            )),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::Collection(msg))
                }
            }
        }
    }
}

fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or("")
        .to_string()
}

fn payload_u32(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> u32 {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => Some(*n as u32),
            _ => None,
        })
        .unwrap_or(0)
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        if self.points_count().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

        Ok(())
    }

    async fn add_records(&self, records: Vec<ChunkRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let point_id = record.metadata.point_id();

                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("chunk_id".to_string(), record.metadata.chunk_id.clone().into());
                payload.insert("content".to_string(), record.content.into());
                payload.insert("filename".to_string(), record.metadata.filename.into());
                payload.insert(
                    "source_path".to_string(),
                    record.metadata.source_path.into(),
                );
                payload.insert("page".to_string(), i64::from(record.metadata.page).into());
                payload.insert(
                    "ingested_at".to_string(),
                    chrono::Utc::now().to_rfc3339().into(),
                );

                PointStruct::new(point_id, record.vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::Append(e.to_string()))?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        Ok(self.points_count().await?.unwrap_or(0))
    }

    async fn similarity_search(
        &self,
        query_vector: Vec<f32>,
        k: u64,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        let search =
            SearchPointsBuilder::new(&self.collection, query_vector, k).with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::Search(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                ScoredChunk {
                    content: payload_str(&payload, "content"),
                    metadata: ChunkMetadata {
                        chunk_id: payload_str(&payload, "chunk_id"),
                        filename: payload_str(&payload, "filename"),
                        source_path: payload_str(&payload, "source_path"),
                        page: payload_u32(&payload, "page"),
                    },
                    score: point.score,
                }
            })
            .collect();

        Ok(hits)
    }

    async fn clear_collection(&self) -> Result<(), VectorStoreError> {
        if self.points_count().await?.is_none() {
            return Ok(());
        }

        self.client
            .delete_collection(&self.collection)
            .await
            .map_err(|e| VectorStoreError::Delete(e.to_string()))?;

        self.create_collection().await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::Connection(e.to_string()))
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
