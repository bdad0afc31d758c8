use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use surfstore_core::rpc::{RpcError, read_message, write_message};

use crate::protocol::{MetadataRequest, MetadataResponse};
use crate::store::MetadataStore;

/// Serves a [`MetadataStore`] over TCP, mirroring
/// [`surfstore_block::BlockServer`]'s accept-loop shape. Concurrent
/// connections are still serialized against each other through the single
/// `tokio::sync::Mutex` inside [`MetadataStore`].
#[derive(Clone)]
pub struct MetadataServer {
    store: Arc<MetadataStore>,
}

impl MetadataServer {
    pub fn new(store: MetadataStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub async fn serve(self, addr: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("MetadataStore listening on {addr}");
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
            let request: MetadataRequest = match read_message(&mut socket).await {
                Ok(req) => req,
                Err(RpcError::Io(err)) if is_connection_closed(&err) => return Ok(()),
                Err(err) => return Err(err),
            };
            let response = self.handle_request(request).await;
            write_message(&mut socket, &response).await?;
        }
    }

    async fn handle_request(&self, request: MetadataRequest) -> MetadataResponse {
        match request {
            MetadataRequest::ReadFile { filename } => {
                let (version, hashlist) = self.store.read_file(&filename).await;
                MetadataResponse::FileInfo { version, hashlist }
            }
            MetadataRequest::ModifyFile {
                filename,
                version,
                hashlist,
            } => {
                let result = self.store.modify_file(&filename, version, hashlist).await;
                MetadataResponse::from_result(result)
            }
            MetadataRequest::DeleteFile { filename, version } => {
                let result = self.store.delete_file(&filename, version).await;
                MetadataResponse::from_result(result)
            }
        }
    }
}

fn is_connection_closed(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::UnexpectedEof
        || err.kind() == std::io::ErrorKind::ConnectionReset
}
