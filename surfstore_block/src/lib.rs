//! BlockStore: the content-addressed key/value store half of SurfStore.
//!
//! - [`store::BlockStore`]: the `put`/`get`/`has` trait.
//! - [`store::MemoryBlockStore`]: the in-memory implementation backing each
//!   BlockStore process.
//! - [`protocol`]: the wire types for `store_block`/`get_block`/`has_block`.
//! - [`server::BlockServer`] / [`client::Client`]: the TCP RPC pair serving
//!   and consuming that protocol.

pub mod client;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::{Client, ClientError};
pub use protocol::{BlockRequest, BlockResponse};
pub use server::BlockServer;
pub use store::{BlockError, BlockResult, BlockStore, MemoryBlockStore};
