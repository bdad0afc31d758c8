//! MetadataStore: the versioned filename-to-hashlist directory half of
//! SurfStore.
//!
//! - [`store::MetadataStore`]: the core service, holding the single
//!   mutual-exclusion region over the file table.
//! - [`protocol`]: the wire types for `read_file`/`modify_file`/`delete_file`.
//! - [`server::MetadataServer`] / [`client::MetadataClient`]: the TCP RPC
//!   pair serving and consuming that protocol.

pub mod client;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::{MetadataClient, MetadataClientError};
pub use protocol::{MetadataRequest, MetadataResponse};
pub use server::MetadataServer;
pub use store::{MetadataError, MetadataStore};
