//! The client's upload/download/delete state machine.
//!
//! Kept independent of `main.rs`'s argument parsing so it can be exercised
//! directly by integration tests without spawning the `surfstore-client`
//! binary.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use surfstore_block::{Client as BlockClient, ClientError as BlockClientError};
use surfstore_core::{BLOCK_SIZE, Config, Hash};
use surfstore_metadata::{MetadataClient, MetadataClientError, MetadataError};

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MetadataStore RPC failed: {0}")]
    Metadata(#[from] MetadataClientError),
    #[error("BlockStore RPC failed: {0}")]
    Block(#[from] BlockClientError),
    #[error("MetadataStore rejected the request: {0}")]
    MetadataRejected(#[from] MetadataError),
}

pub enum UploadOutcome {
    Ok,
    LocalFileNotFound,
}

pub enum DownloadOutcome {
    Ok,
    RemoteNotFound,
}

/// A live connection to one SurfStore deployment: the MetadataStore plus
/// every configured BlockStore shard.
pub struct Session {
    metadata: MetadataClient,
    block_stores: Vec<BlockClient>,
}

impl Session {
    pub fn from_config(config: &Config) -> Self {
        Self {
            metadata: MetadataClient::new(config.metadata.addr()),
            block_stores: config
                .block_stores
                .iter()
                .map(|ep| BlockClient::new(ep.addr()))
                .collect(),
        }
    }

    /// Returns the current version known to the MetadataStore for
    /// `remote_name` (`0` if never touched), without fetching any blocks.
    pub async fn current_version(&self, remote_name: &str) -> Result<u64, SessionError> {
        let (version, _) = self.metadata.read_file(remote_name).await?;
        Ok(version)
    }

    fn block_store_for(&self, hash: &Hash) -> &BlockClient {
        let shard_index = surfstore_core::shard(hash, self.block_stores.len());
        &self.block_stores[shard_index]
    }

    /// Chunks and hashes the local file, then loops read-modify-retry
    /// until the MetadataStore accepts the commit.
    pub async fn upload(&self, local_path: &Path) -> Result<UploadOutcome, SessionError> {
        let filename = match local_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => return Ok(UploadOutcome::LocalFileNotFound),
        };

        let bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UploadOutcome::LocalFileNotFound);
            }
            Err(err) => return Err(err.into()),
        };

        let mut cache: HashMap<Hash, Bytes> = HashMap::new();
        let mut hashlist = Vec::new();
        for chunk in bytes.chunks(BLOCK_SIZE) {
            let block = Bytes::copy_from_slice(chunk);
            let hash = Hash::of(&block);
            hashlist.push(hash.to_hex());
            cache.insert(hash, block);
        }

        loop {
            let (current_version, _) = self.metadata.read_file(&filename).await?;
            let next_version = current_version + 1;

            match self
                .metadata
                .modify_file(&filename, next_version, hashlist.clone())
                .await?
            {
                Ok(()) => {
                    debug!("Version: {next_version}");
                    return Ok(UploadOutcome::Ok);
                }
                Err(MetadataError::MissingBlocks(missing)) => {
                    for hex in missing {
                        let hash = Hash::parse_hex(&hex)
                            .expect("MetadataStore echoed a hash it validated");
                        let block = cache
                            .get(&hash)
                            .expect("missing hash must be one we just hashed")
                            .clone();
                        self.block_store_for(&hash).store_block(hash, block).await?;
                    }
                }
                Err(MetadataError::WrongVersion(current)) => {
                    debug!("wrong version, server at {current}, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Fetches the file's hashlist and reconstructs it block by block,
    /// reusing a local cache file named by hash when one is already
    /// present in `dest_dir`.
    pub async fn download(
        &self,
        remote_name: &str,
        dest_dir: &Path,
    ) -> Result<DownloadOutcome, SessionError> {
        let (version, hashlist) = self.metadata.read_file(remote_name).await?;
        let hashlist = match (version, hashlist) {
            (0, _) | (_, None) => return Ok(DownloadOutcome::RemoteNotFound),
            (_, Some(hashlist)) => hashlist,
        };

        tokio::fs::create_dir_all(dest_dir).await?;
        let mut out = Vec::new();
        for hex in &hashlist {
            let hash = Hash::parse_hex(hex).expect("server-held hashlist is well-formed hex");
            let cache_path = dest_dir.join(hex);
            let block = match tokio::fs::read(&cache_path).await {
                Ok(bytes) => Bytes::from(bytes),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    let block = self.block_store_for(&hash).get_block(hash).await?;
                    tokio::fs::write(&cache_path, &block).await?;
                    block
                }
                Err(err) => return Err(err.into()),
            };
            out.extend_from_slice(&block);
        }

        let out_path = dest_dir.join(remote_name);
        tokio::fs::write(&out_path, out).await?;
        Ok(DownloadOutcome::Ok)
    }

    /// Same read-then-retry shape as `upload`, minus the missing-blocks
    /// branch.
    pub async fn delete(&self, remote_name: &str) -> Result<(), SessionError> {
        loop {
            let (current_version, _) = self.metadata.read_file(remote_name).await?;
            let next_version = current_version + 1;
            match self.metadata.delete_file(remote_name, next_version).await? {
                Ok(()) => {
                    debug!("Version: {next_version}");
                    return Ok(());
                }
                Err(MetadataError::WrongVersion(current)) => {
                    debug!("wrong version, server at {current}, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}
