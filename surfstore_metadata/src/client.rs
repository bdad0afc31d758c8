use tokio::net::TcpStream;

use surfstore_core::rpc::{RpcError, read_message, write_message};

use crate::protocol::{MetadataRequest, MetadataResponse};
use crate::store::MetadataError;

#[derive(thiserror::Error, Debug)]
pub enum MetadataClientError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("unexpected response from MetadataStore")]
    UnexpectedResponse,
}

/// RPC client for the MetadataStore, opening a fresh TCP connection per
/// call the same way [`surfstore_block::Client`] does.
#[derive(Clone, Debug)]
pub struct MetadataClient {
    addr: String,
}

impl MetadataClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn call(&self, request: MetadataRequest) -> Result<MetadataResponse, MetadataClientError> {
        let mut socket = TcpStream::connect(&self.addr).await.map_err(RpcError::from)?;
        write_message(&mut socket, &request).await?;
        let response = read_message(&mut socket).await?;
        Ok(response)
    }

    pub async fn read_file(
        &self,
        filename: &str,
    ) -> Result<(u64, Option<Vec<String>>), MetadataClientError> {
        match self
            .call(MetadataRequest::ReadFile {
                filename: filename.to_string(),
            })
            .await?
        {
            MetadataResponse::FileInfo { version, hashlist } => Ok((version, hashlist)),
            _ => Err(MetadataClientError::UnexpectedResponse),
        }
    }

    /// Returns `Ok(Err(MetadataError))` for a rejected mutation (missing
    /// blocks / wrong version), reserving `Err(MetadataClientError)` for
    /// transport-level failures. The caller's upload and delete retry loops
    /// need this distinction to tell "retry this" from "the connection is
    /// broken".
    pub async fn modify_file(
        &self,
        filename: &str,
        version: u64,
        hashlist: Vec<String>,
    ) -> Result<Result<(), MetadataError>, MetadataClientError> {
        match self
            .call(MetadataRequest::ModifyFile {
                filename: filename.to_string(),
                version,
                hashlist,
            })
            .await?
        {
            MetadataResponse::Ok => Ok(Ok(())),
            MetadataResponse::MissingBlocks(hashes) => Ok(Err(MetadataError::MissingBlocks(hashes))),
            MetadataResponse::WrongVersion(current) => Ok(Err(MetadataError::WrongVersion(current))),
            MetadataResponse::Error(err) => Ok(Err(MetadataError::ShardUnavailable(err))),
            _ => Err(MetadataClientError::UnexpectedResponse),
        }
    }

    pub async fn delete_file(
        &self,
        filename: &str,
        version: u64,
    ) -> Result<Result<(), MetadataError>, MetadataClientError> {
        match self
            .call(MetadataRequest::DeleteFile {
                filename: filename.to_string(),
                version,
            })
            .await?
        {
            MetadataResponse::Ok => Ok(Ok(())),
            MetadataResponse::WrongVersion(current) => Ok(Err(MetadataError::WrongVersion(current))),
            MetadataResponse::Error(err) => Ok(Err(MetadataError::ShardUnavailable(err))),
            _ => Err(MetadataClientError::UnexpectedResponse),
        }
    }
}
