use std::sync::Arc;

use squadsense_memory::{
    Chunk, ChunkKind, ChunkMetadata, ChunkStore, EmbeddingChunkStore, HashingEmbedder, QdrantOps,
    VectorStore,
};
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;

const QDRANT_GRPC_PORT: ContainerPort = ContainerPort::Tcp(6334);

fn qdrant_image() -> GenericImage {
    GenericImage::new("qdrant/qdrant", "v1.16.0")
        .with_wait_for(WaitFor::message_on_stdout("gRPC listening"))
        .with_exposed_port(QDRANT_GRPC_PORT)
}

async fn setup_with_qdrant() -> (QdrantOps, ContainerAsync<GenericImage>) {
    let container = qdrant_image().start().await.unwrap();
    let grpc_port = container.get_host_port_ipv4(6334).await.unwrap();
    let url = format!("http://127.0.0.1:{grpc_port}");
    (QdrantOps::new(&url).unwrap(), container)
}

fn chunk(file: &str, kind: ChunkKind, start: usize, content: &str) -> Chunk {
    Chunk::new(
        content.to_owned(),
        ChunkMetadata::new(file, kind, start, start + 1),
    )
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn ensure_collection_is_idempotent() {
    let (ops, _container) = setup_with_qdrant().await;

    ops.ensure_collection("chunks", 8).await.unwrap();
    ops.ensure_collection("chunks", 8).await.unwrap();
    assert!(ops.collection_exists("chunks").await.unwrap());
    assert_eq!(ops.list_collections().await.unwrap(), vec!["chunks"]);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn chunk_store_roundtrip_over_qdrant() {
    let (ops, _container) = setup_with_qdrant().await;
    let store = EmbeddingChunkStore::new(
        Arc::new(ops),
        Arc::new(HashingEmbedder::new(32)),
        "squadsense_",
    );

    let code = chunk(
        "src/Staking.java",
        ChunkKind::Code,
        10,
        "public long computeRewards(Stake stake) { return stake.amount() * rate; }",
    );
    let doc = chunk(
        "docs/staking.md",
        ChunkKind::Document,
        1,
        "# Rewards\nRewards are computed per epoch.",
    );
    store
        .upsert("staking", &[code.clone(), doc.clone()])
        .await
        .unwrap();

    let hits = store
        .query("staking", "compute rewards", 5, Some(ChunkKind::Code))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk, code);

    let other = store.query("auth", "compute rewards", 5, None).await.unwrap();
    assert!(other.is_empty());

    let scopes = store.list_scopes().await.unwrap();
    assert!(scopes.contains("staking"));
}
