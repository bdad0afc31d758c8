//! Shared types for SurfStore.
//!
//! This crate defines the pieces every other SurfStore crate needs to
//! agree on:
//!
//! - The content hash type (`hash::Hash`, SHA-256, hex-encoded) that
//!   identifies a block.
//! - The hash-sharding relation (`shard::shard`) binding the client, the
//!   MetadataStore, and the set of BlockStores to the same
//!   `shard(H, N) = int(H, 16) mod N` rule.
//! - The line-oriented configuration file format (`config::Config`) shared
//!   by every binary.
//! - A small length-prefixed RPC framing helper (`rpc::read_message`/
//!   `rpc::write_message`) shared by the BlockStore and MetadataStore wire
//!   protocols.

pub mod config;
pub mod hash;
pub mod rpc;
pub mod shard;

pub use config::{Config, ConfigError, Endpoint};
pub use hash::{Hash, HashParseError};
pub use rpc::RpcError;
pub use shard::shard;

/// Maximum size of a block, in bytes. The final block of a file may be
/// shorter; every other block is exactly this size.
pub const BLOCK_SIZE: usize = 4096;

/// Strips any leading path components from `name`, returning its basename.
///
/// SurfStore has no directory hierarchy, just a flat filename namespace, so
/// the MetadataStore never interprets a path component as a directory; it
/// just discards everything before the final `/` the way the reference
/// implementation's `filename.split('/')[-1]` does. Clients SHOULD already
/// send basenames but the server tolerates a full path.
pub fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::basename;

    #[test]
    fn basename_strips_leading_path() {
        assert_eq!(basename("a/b/c.txt"), "c.txt");
        assert_eq!(basename("c.txt"), "c.txt");
        assert_eq!(basename("/abs/path/file"), "file");
        assert_eq!(basename("trailing/"), "");
    }
}
