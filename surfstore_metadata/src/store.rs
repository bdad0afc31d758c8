use std::collections::HashMap;

use surfstore_block::Client as BlockClient;
use surfstore_core::{Hash, basename, shard};
use tokio::sync::Mutex;

/// A SurfStore mutation result, modeled as a tagged outcome rather than an
/// exception: callers match on the variant to decide whether to retry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// `modify_file` named one or more blocks absent from their owning
    /// BlockStore; the client should upload them and retry.
    #[error("missing blocks: {0:?}")]
    MissingBlocks(Vec<String>),
    /// `version` was not `current + 1`; the client should re-read and
    /// retry.
    #[error("wrong version: current is {0}")]
    WrongVersion(u64),
    /// A hash in the submitted hashlist was not well-formed hex.
    #[error("invalid hash: {0}")]
    InvalidHash(String),
    /// The presence check against a BlockStore shard could not complete
    /// (connection failure, etc), unavoidable once the BlockStore check
    /// crosses a real network boundary.
    #[error("block store shard unreachable: {0}")]
    ShardUnavailable(String),
}

#[derive(Debug, Clone)]
struct FileEntry {
    version: u64,
    /// `None` marks a tombstone; `Some(_)` (including the empty vec) marks
    /// a live file.
    hashlist: Option<Vec<String>>,
}

struct State {
    files: HashMap<String, FileEntry>,
}

/// The MetadataStore: a versioned directory mapping filenames to ordered
/// hashlists, plus the cross-service block-presence check that gates every
/// `modify_file`.
///
/// A single `tokio::sync::Mutex` serializes every handler body, held across
/// the outbound `has_block` calls to the BlockStore shards, so the presence
/// check and the commit are indivisible.
pub struct MetadataStore {
    state: Mutex<State>,
    /// One client per configured BlockStore, indexed by shard number.
    block_stores: Vec<BlockClient>,
}

impl MetadataStore {
    pub fn new(block_stores: Vec<BlockClient>) -> Self {
        Self {
            state: Mutex::new(State {
                files: HashMap::new(),
            }),
            block_stores,
        }
    }

    /// Reads the current version and hashlist for `filename`. Never fails
    /// on a well-formed filename.
    pub async fn read_file(&self, filename: &str) -> (u64, Option<Vec<String>>) {
        let filename = basename(filename);
        let state = self.state.lock().await;
        match state.files.get(filename) {
            None => (0, Some(Vec::new())),
            Some(entry) => (entry.version, entry.hashlist.clone()),
        }
    }

    /// Commits `hashlist` as the new contents of `filename` at `version`.
    /// Preconditions (block presence, then version) are checked in order
    /// under the single mutual-exclusion region.
    pub async fn modify_file(
        &self,
        filename: &str,
        version: u64,
        hashlist: Vec<String>,
    ) -> Result<(), MetadataError> {
        let filename = basename(filename).to_string();
        let mut state = self.state.lock().await;

        let missing = self.find_missing_blocks(&hashlist).await?;
        if !missing.is_empty() {
            return Err(MetadataError::MissingBlocks(missing));
        }

        let current_version = state.files.get(&filename).map_or(0, |e| e.version);
        let expected = current_version + 1;
        if version != expected {
            return Err(MetadataError::WrongVersion(current_version));
        }

        state.files.insert(
            filename,
            FileEntry {
                version,
                hashlist: Some(hashlist),
            },
        );
        Ok(())
    }

    /// Marks `filename` as deleted at `version`. Deleting a never-seen
    /// filename at version 1 succeeds and creates a tombstone at version 1,
    /// a deliberate choice (preserved from the reference implementation)
    /// that keeps `delete` idempotent with respect to version accounting.
    pub async fn delete_file(&self, filename: &str, version: u64) -> Result<(), MetadataError> {
        let filename = basename(filename).to_string();
        let mut state = self.state.lock().await;

        let current_version = state.files.get(&filename).map_or(0, |e| e.version);
        let expected = current_version + 1;
        if version != expected {
            return Err(MetadataError::WrongVersion(current_version));
        }

        state.files.insert(
            filename,
            FileEntry {
                version,
                hashlist: None,
            },
        );
        Ok(())
    }

    /// Queries every shard owning a hash in `hashlist` for presence,
    /// against the *current* BlockStore state (never a cached view), so a
    /// block uploaded by a concurrent retry is observable.
    async fn find_missing_blocks(&self, hashlist: &[String]) -> Result<Vec<String>, MetadataError> {
        let mut missing = Vec::new();
        for hex in hashlist {
            let hash = Hash::parse_hex(hex).map_err(|_| MetadataError::InvalidHash(hex.clone()))?;
            let shard_index = shard(&hash, self.block_stores.len());
            let present = self.block_stores[shard_index]
                .has_block(hash)
                .await
                .map_err(|err| MetadataError::ShardUnavailable(err.to_string()))?;
            if !present {
                missing.push(hex.clone());
            }
        }
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use surfstore_block::{BlockServer, MemoryBlockStore};
    use tokio::net::TcpListener;

    async fn spawn_block_store() -> BlockClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let server = BlockServer::new(MemoryBlockStore::new());
        let bind_addr = addr.clone();
        tokio::spawn(async move {
            server.serve(&bind_addr).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        BlockClient::new(addr)
    }

    #[tokio::test]
    async fn read_of_never_seen_file_is_version_zero_empty() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);
        let (v, hashlist) = meta.read_file("nope.txt").await;
        assert_eq!(v, 0);
        assert_eq!(hashlist, Some(Vec::new()));
    }

    #[tokio::test]
    async fn modify_rejects_missing_blocks_without_mutating_state() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        let hash = Hash::of(b"never uploaded").to_hex();
        let err = meta
            .modify_file("f.txt", 1, vec![hash.clone()])
            .await
            .unwrap_err();
        assert_eq!(err, MetadataError::MissingBlocks(vec![hash]));

        let (v, _) = meta.read_file("f.txt").await;
        assert_eq!(v, 0);
    }

    #[tokio::test]
    async fn modify_succeeds_once_blocks_are_present() {
        let block_store = spawn_block_store().await;
        let block = Bytes::from_static(b"block contents");
        let hash = Hash::of(&block);
        block_store.store_block(hash, block).await.unwrap();

        let meta = MetadataStore::new(vec![block_store]);
        meta.modify_file("f.txt", 1, vec![hash.to_hex()])
            .await
            .unwrap();

        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 1);
        assert_eq!(hashlist, Some(vec![hash.to_hex()]));
    }

    #[tokio::test]
    async fn second_modify_with_same_hashlist_needs_no_reupload() {
        let block_store = spawn_block_store().await;
        let block = Bytes::from_static(b"shared block");
        let hash = Hash::of(&block);
        block_store.store_block(hash, block).await.unwrap();

        let meta = MetadataStore::new(vec![block_store]);
        meta.modify_file("f.txt", 1, vec![hash.to_hex()])
            .await
            .unwrap();
        // The block is already present from the first commit; a second
        // modify naming the same hash must not raise `MissingBlocks`.
        meta.modify_file("f.txt", 2, vec![hash.to_hex()])
            .await
            .unwrap();

        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 2);
        assert_eq!(hashlist, Some(vec![hash.to_hex()]));
    }

    #[tokio::test]
    async fn modify_rejects_wrong_version() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        let err = meta.modify_file("f.txt", 2, vec![]).await.unwrap_err();
        assert_eq!(err, MetadataError::WrongVersion(0));
    }

    #[tokio::test]
    async fn versions_are_strictly_monotonic() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        meta.modify_file("f.txt", 1, vec![]).await.unwrap();
        meta.modify_file("f.txt", 2, vec![]).await.unwrap();
        meta.modify_file("f.txt", 3, vec![]).await.unwrap();

        let (v, _) = meta.read_file("f.txt").await;
        assert_eq!(v, 3);
    }

    #[tokio::test]
    async fn delete_of_never_seen_file_succeeds_and_creates_tombstone() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        meta.delete_file("f.txt", 1).await.unwrap();
        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 1);
        assert_eq!(hashlist, None);
    }

    #[tokio::test]
    async fn delete_is_idempotent_with_respect_to_version() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        meta.delete_file("f.txt", 1).await.unwrap();
        meta.delete_file("f.txt", 2).await.unwrap();

        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 2);
        assert_eq!(hashlist, None);
    }

    #[tokio::test]
    async fn resurrection_after_delete() {
        let block_store = spawn_block_store().await;
        let block = Bytes::from_static(b"resurrected");
        let hash = Hash::of(&block);
        block_store.store_block(hash, block).await.unwrap();

        let meta = MetadataStore::new(vec![block_store]);
        meta.modify_file("f.txt", 1, vec![hash.to_hex()])
            .await
            .unwrap();
        meta.delete_file("f.txt", 2).await.unwrap();
        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 2);
        assert_eq!(hashlist, None);

        meta.modify_file("f.txt", 3, vec![hash.to_hex()])
            .await
            .unwrap();
        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 3);
        assert_eq!(hashlist, Some(vec![hash.to_hex()]));
    }

    #[tokio::test]
    async fn basename_is_stripped_before_lookup() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        meta.modify_file("some/dir/f.txt", 1, vec![]).await.unwrap();
        let (v, _) = meta.read_file("f.txt").await;
        assert_eq!(v, 1);
    }

    #[tokio::test]
    async fn empty_hashlist_is_live_not_deleted() {
        let block_store = spawn_block_store().await;
        let meta = MetadataStore::new(vec![block_store]);

        meta.modify_file("f.txt", 1, vec![]).await.unwrap();
        let (v, hashlist) = meta.read_file("f.txt").await;
        assert_eq!(v, 1);
        assert_eq!(hashlist, Some(Vec::new()));
    }
}
