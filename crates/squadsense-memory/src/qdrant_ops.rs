//! Qdrant-backed [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct, ScoredPoint,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};

use crate::vector_store::{
    BoxFuture, FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint,
    VectorStore, VectorStoreError,
};

/// Chunk collections stored on a Qdrant server over gRPC.
#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps").finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// Build a client for `url`. No request is made until first use.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::Connection`] if the URL is rejected.
    pub fn new(url: &str) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(into_error(VectorStoreError::Connection))?;
        Ok(Self { client })
    }

    /// Convert a JSON payload map to a Qdrant payload map.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the payload cannot be represented in Qdrant.
    pub fn json_to_payload(
        payload: HashMap<String, serde_json::Value>,
    ) -> Result<HashMap<String, Value>, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(payload.into_iter().collect()))
    }
}

fn into_error(
    variant: fn(String) -> VectorStoreError,
) -> impl Fn(QdrantError) -> VectorStoreError {
    move |e| variant(e.to_string())
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&collection)
                .await
                .map_err(into_error(VectorStoreError::Connection))?;
            if exists {
                return Ok(());
            }
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(into_error(VectorStoreError::Collection))?;
            tracing::info!(collection = %collection, vector_size, "created qdrant collection");
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .collection_exists(&collection)
                .await
                .map_err(into_error(VectorStoreError::Connection))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .delete_collection(&collection)
                .await
                .map_err(into_error(VectorStoreError::Collection))?;
            Ok(())
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>> {
        Box::pin(async move {
            let response = self
                .client
                .list_collections()
                .await
                .map_err(into_error(VectorStoreError::Connection))?;
            let mut names: Vec<String> = response.collections.into_iter().map(|c| c.name).collect();
            names.sort();
            Ok(names)
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut structs = Vec::with_capacity(points.len());
            for point in points {
                let payload = Self::json_to_payload(point.payload)
                    .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
                structs.push(PointStruct::new(point.id, point.vector, payload));
            }
            self.client
                .upsert_points(UpsertPointsBuilder::new(&collection, structs).wait(true))
                .await
                .map_err(into_error(VectorStoreError::Upsert))?;
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut request =
                SearchPointsBuilder::new(&collection, vector, limit).with_payload(true);
            if let Some(filter) = filter {
                request = request.filter(to_qdrant_filter(filter));
            }
            let response = self
                .client
                .search_points(request)
                .await
                .map_err(into_error(VectorStoreError::Search))?;
            Ok(response.result.into_iter().map(from_scored_point).collect())
        })
    }
}

fn to_qdrant_filter(filter: VectorFilter) -> Filter {
    fn condition(cond: FieldCondition) -> Condition {
        match cond.value {
            FieldValue::Integer(v) => Condition::matches(cond.field, v),
            FieldValue::Text(v) => Condition::matches(cond.field, v),
        }
    }

    Filter {
        must: filter.must.into_iter().map(condition).collect(),
        must_not: filter.must_not.into_iter().map(condition).collect(),
        ..Filter::default()
    }
}

/// Qdrant payload value back to JSON. Unset values become `null`.
fn to_json(value: Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::IntegerValue(i)) => i.into(),
        Some(Kind::DoubleValue(d)) => {
            serde_json::Number::from_f64(d).map_or(serde_json::Value::Null, Into::into)
        }
        Some(Kind::BoolValue(b)) => b.into(),
        Some(Kind::ListValue(list)) => list.values.into_iter().map(to_json).collect(),
        Some(Kind::StructValue(s)) => s
            .fields
            .into_iter()
            .map(|(k, v)| (k, to_json(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

fn point_id_string(id: Option<PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn from_scored_point(point: ScoredPoint) -> ScoredVectorPoint {
    ScoredVectorPoint {
        id: point_id_string(point.id),
        score: point.score,
        payload: point
            .payload
            .into_iter()
            .map(|(k, v)| (k, to_json(v)))
            .collect(),
    }
}
