use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

struct Entry {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

/// Points of one collection, iterated in id order.
struct Collection {
    dimensions: u64,
    entries: BTreeMap<String, Entry>,
}

/// Process-local [`VectorStore`] with exact cosine search.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
        err: fn(String) -> VectorStoreError,
    ) -> Result<RwLockReadGuard<'_, BTreeMap<String, Collection>>, VectorStoreError> {
        self.collections.read().map_err(|e| err(e.to_string()))
    }

    fn write(
        &self,
        err: fn(String) -> VectorStoreError,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Collection>>, VectorStoreError> {
        self.collections.write().map_err(|e| err(e.to_string()))
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.collections.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("InMemoryVectorStore")
            .field("collections", &count)
            .finish()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (dot, na, nb) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

fn check_len(len: usize, dimensions: u64, err: fn(String) -> VectorStoreError) -> Result<(), VectorStoreError> {
    if u64::try_from(len).ok() == Some(dimensions) {
        Ok(())
    } else {
        Err(err(format!("vector has {len} dimensions, collection expects {dimensions}")))
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.write(VectorStoreError::Collection)?;
            let col = cols.entry(name.clone()).or_insert_with(|| Collection {
                dimensions: vector_size,
                entries: BTreeMap::new(),
            });
            if col.dimensions == vector_size {
                Ok(())
            } else {
                Err(VectorStoreError::Collection(format!(
                    "collection {name} has vector size {}, requested {vector_size}",
                    col.dimensions
                )))
            }
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move { Ok(self.read(VectorStoreError::Collection)?.contains_key(&name)) })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            self.write(VectorStoreError::Collection)?.remove(&name);
            Ok(())
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>> {
        Box::pin(async move { Ok(self.read(VectorStoreError::Collection)?.keys().cloned().collect()) })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let name = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.write(VectorStoreError::Upsert)?;
            let col = cols
                .get_mut(&name)
                .ok_or_else(|| VectorStoreError::Upsert(format!("collection {name} not found")))?;
            for point in &points {
                check_len(point.vector.len(), col.dimensions, VectorStoreError::Upsert)?;
            }
            col.entries.extend(points.into_iter().map(|p| {
                (
                    p.id,
                    Entry {
                        vector: p.vector,
                        payload: p.payload,
                    },
                )
            }));
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
        let name = collection.to_owned();
        Box::pin(async move {
            let cols = self.read(VectorStoreError::Search)?;
            let col = cols
                .get(&name)
                .ok_or_else(|| VectorStoreError::Search(format!("collection {name} not found")))?;
            check_len(vector.len(), col.dimensions, VectorStoreError::Search)?;

            let filter = filter.unwrap_or_default();
            let mut hits: Vec<ScoredVectorPoint> = col
                .entries
                .iter()
                .filter(|(_, e)| filter.matches(&e.payload))
                .map(|(id, e)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine(&vector, &e.vector),
                    payload: e.payload.clone(),
                })
                .collect();

            // Stable sort over id-ordered entries: equal scores stay in id order.
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
            hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(hits)
        })
    }
}
