use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use surfstore_core::Hash;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("block not found")]
    NotFound,
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: Hash, computed: Hash },
}

pub type BlockResult<T> = Result<T, BlockError>;

/// A content-addressed key/value store over opaque block bytes. No
/// internal state beyond the hash-to-bytes map; operations are
/// individually atomic.
#[async_trait]
pub trait BlockStore: std::fmt::Debug + Send + Sync + 'static {
    /// Inserts or overwrites `hash -> block`. The caller is trusted to have
    /// verified `SHA-256(block) == hash`; an implementation MAY verify this
    /// defensively (see `MemoryBlockStore::with_verification`).
    async fn store_block(&self, hash: Hash, block: Bytes) -> BlockResult<()>;

    /// Returns the bytes for `hash`, verbatim. Fails with `NotFound` when
    /// absent.
    async fn get_block(&self, hash: Hash) -> BlockResult<Bytes>;

    /// Returns whether `hash` is present. Never fails for a well-formed
    /// hash.
    async fn has_block(&self, hash: Hash) -> bool;
}

/// In-memory BlockStore backed by a lock-free concurrent map, one instance
/// per shard. No eviction, no deletion: blocks are immutable and
/// orphan-safe once stored.
#[derive(Debug)]
pub struct MemoryBlockStore {
    blocks: DashMap<Hash, Bytes>,
    verify_on_store: bool,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self {
            blocks: DashMap::new(),
            verify_on_store: false,
        }
    }

    /// A `MemoryBlockStore` that defensively recomputes `SHA-256(block)`
    /// on every `store_block` and rejects a mismatch: the secure-deployment
    /// variant, left optional since the caller is normally trusted.
    pub fn with_verification() -> Self {
        Self {
            blocks: DashMap::new(),
            verify_on_store: true,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for MemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn store_block(&self, hash: Hash, block: Bytes) -> BlockResult<()> {
        if self.verify_on_store {
            let computed = Hash::of(&block);
            if computed != hash {
                return Err(BlockError::HashMismatch {
                    expected: hash,
                    computed,
                });
            }
        }
        self.blocks.insert(hash, block);
        Ok(())
    }

    async fn get_block(&self, hash: Hash) -> BlockResult<Bytes> {
        self.blocks
            .get(&hash)
            .map(|entry| entry.value().clone())
            .ok_or(BlockError::NotFound)
    }

    async fn has_block(&self, hash: Hash) -> bool {
        self.blocks.contains_key(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_retrieves_a_block() {
        let store = MemoryBlockStore::new();
        let block = Bytes::from_static(b"hello world");
        let hash = Hash::of(&block);

        assert!(!store.has_block(hash).await);
        store.store_block(hash, block.clone()).await.unwrap();
        assert!(store.has_block(hash).await);
        assert_eq!(store.get_block(hash).await.unwrap(), block);
    }

    #[tokio::test]
    async fn get_of_absent_hash_is_not_found() {
        let store = MemoryBlockStore::new();
        let hash = Hash::of(b"never stored");
        assert_eq!(store.get_block(hash).await, Err(BlockError::NotFound));
    }

    #[tokio::test]
    async fn store_is_idempotent_for_the_same_hash() {
        let store = MemoryBlockStore::new();
        let block = Bytes::from_static(b"dedup me");
        let hash = Hash::of(&block);

        store.store_block(hash, block.clone()).await.unwrap();
        store.store_block(hash, block.clone()).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn verifying_store_rejects_hash_mismatch() {
        let store = MemoryBlockStore::with_verification();
        let real_hash = Hash::of(b"real contents");
        let wrong_hash = Hash::of(b"different contents");

        let err = store
            .store_block(wrong_hash, Bytes::from_static(b"real contents"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlockError::HashMismatch { .. }));
        assert!(!store.has_block(real_hash).await);
    }
}
