//! Deterministic chunk identity.
//!
//! Ids are UUID v5 values so they can be used directly as Qdrant point ids
//! and are reproducible across runs and processes.

use crate::types::ChunkKind;

const CHUNK_NAMESPACE: uuid::Uuid = uuid::Uuid::from_bytes([
    0x5a, 0x71, 0x0e, 0x3c, 0x9b, 0x42, 0x4f, 0x1d, 0x8e, 0x27, 0xc4, 0x6b, 0x13, 0xf0, 0xa8, 0x95,
]);

/// Compute the id of a chunk from its kind, origin and span.
///
/// Offsets distinguish overlapping windows cut from a single long line; code
/// chunks pass zero for both.
#[must_use]
pub fn chunk_id(
    kind: ChunkKind,
    file_path: &str,
    start_line: usize,
    end_line: usize,
    start_offset: usize,
    end_offset: usize,
) -> String {
    let key = format!(
        "{}\0{file_path}\0{start_line}-{end_line}\0{start_offset}-{end_offset}",
        kind.as_str()
    );
    uuid::Uuid::new_v5(&CHUNK_NAMESPACE, key.as_bytes()).to_string()
}

/// Storage key of a chunk under `scope`.
///
/// Scopes that share a collection still get distinct points for one chunk.
#[must_use]
pub fn point_id(scope: &str, chunk_id: &str) -> String {
    let key = format!("scope\0{scope}\0{chunk_id}");
    uuid::Uuid::new_v5(&CHUNK_NAMESPACE, key.as_bytes()).to_string()
}

/// blake3 hex digest of chunk content.
#[must_use]
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}
