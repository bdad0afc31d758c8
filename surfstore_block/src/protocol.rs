//! Wire protocol for the BlockStore RPC surface: `store_block`, `get_block`,
//! `has_block`, each keyed by a hex-encoded SHA-256 hash.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub enum BlockRequest {
    StoreBlock { hash: String, block: Bytes },
    GetBlock { hash: String },
    HasBlock { hash: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum BlockResponse {
    Stored,
    Block(Bytes),
    Has(bool),
    /// `get_block` on an absent hash, or a malformed hash on any request.
    Error(String),
}
