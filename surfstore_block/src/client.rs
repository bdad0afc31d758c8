use bytes::Bytes;
use tokio::net::TcpStream;

use surfstore_core::Hash;
use surfstore_core::rpc::{RpcError, read_message, write_message};

use crate::protocol::{BlockRequest, BlockResponse};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("BlockStore error: {0}")]
    Remote(String),
    #[error("unexpected response from BlockStore")]
    UnexpectedResponse,
}

/// RPC client for a single BlockStore instance.
///
/// Opens a fresh TCP connection per call. SurfStore's low-concurrency
/// workload means this keeps the transport layer simple without changing
/// observable behavior.
#[derive(Clone, Debug)]
pub struct Client {
    addr: String,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn call(&self, request: BlockRequest) -> Result<BlockResponse, ClientError> {
        let mut socket = TcpStream::connect(&self.addr).await.map_err(RpcError::from)?;
        write_message(&mut socket, &request).await?;
        let response = read_message(&mut socket).await?;
        Ok(response)
    }

    pub async fn store_block(&self, hash: Hash, block: Bytes) -> Result<(), ClientError> {
        match self
            .call(BlockRequest::StoreBlock {
                hash: hash.to_hex(),
                block,
            })
            .await?
        {
            BlockResponse::Stored => Ok(()),
            BlockResponse::Error(err) => Err(ClientError::Remote(err)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn get_block(&self, hash: Hash) -> Result<Bytes, ClientError> {
        match self
            .call(BlockRequest::GetBlock {
                hash: hash.to_hex(),
            })
            .await?
        {
            BlockResponse::Block(bytes) => Ok(bytes),
            BlockResponse::Error(err) => Err(ClientError::Remote(err)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn has_block(&self, hash: Hash) -> Result<bool, ClientError> {
        match self
            .call(BlockRequest::HasBlock {
                hash: hash.to_hex(),
            })
            .await?
        {
            BlockResponse::Has(present) => Ok(present),
            BlockResponse::Error(err) => Err(ClientError::Remote(err)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}
