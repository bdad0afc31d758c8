use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use surfstore_core::rpc::{RpcError, read_message, write_message};
use surfstore_core::Hash;

use crate::protocol::{BlockRequest, BlockResponse};
use crate::store::BlockStore;

/// Serves a [`BlockStore`] implementation over TCP.
///
/// Each accepted connection is handled in its own spawned task, and each
/// request on that connection is handled in turn.
#[derive(Clone)]
pub struct BlockServer<S> {
    store: Arc<S>,
}

impl<S> std::fmt::Debug for BlockServer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockServer").finish()
    }
}

impl<S: BlockStore> BlockServer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Binds `addr` and serves connections until the process is killed.
    pub async fn serve(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("BlockStore listening on {addr}");
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!("accepted connection from {peer}");
            let server = self.clone();
            tokio::spawn(async move {
                if let Err(err) = server.handle_connection(socket).await {
                    warn!("connection from {peer} ended with error: {err}");
                }
            });
        }
    }

    async fn handle_connection(&self, mut socket: TcpStream) -> Result<(), RpcError> {
        loop {
            let request: BlockRequest = match read_message(&mut socket).await {
                Ok(req) => req,
                Err(RpcError::Io(err)) if is_connection_closed(&err) => return Ok(()),
                Err(err) => return Err(err),
            };
            let response = self.handle_request(request).await;
            write_message(&mut socket, &response).await?;
        }
    }

    async fn handle_request(&self, request: BlockRequest) -> BlockResponse {
        match request {
            BlockRequest::StoreBlock { hash, block } => match Hash::parse_hex(&hash) {
                Ok(hash) => match self.store.store_block(hash, block).await {
                    Ok(()) => BlockResponse::Stored,
                    Err(err) => BlockResponse::Error(err.to_string()),
                },
                Err(err) => BlockResponse::Error(err.to_string()),
            },
            BlockRequest::GetBlock { hash } => match Hash::parse_hex(&hash) {
                Ok(hash) => match self.store.get_block(hash).await {
                    Ok(block) => BlockResponse::Block(block),
                    Err(err) => BlockResponse::Error(err.to_string()),
                },
                Err(err) => BlockResponse::Error(err.to_string()),
            },
            BlockRequest::HasBlock { hash } => match Hash::parse_hex(&hash) {
                Ok(hash) => BlockResponse::Has(self.store.has_block(hash).await),
                Err(err) => BlockResponse::Error(err.to_string()),
            },
        }
    }
}

fn is_connection_closed(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::UnexpectedEof
        || err.kind() == std::io::ErrorKind::ConnectionReset
}
