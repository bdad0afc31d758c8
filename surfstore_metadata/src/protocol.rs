use serde::{Deserialize, Serialize};

use crate::store::MetadataError;

/// Wire request for the MetadataStore RPC surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetadataRequest {
    ReadFile { filename: String },
    ModifyFile {
        filename: String,
        version: u64,
        hashlist: Vec<String>,
    },
    DeleteFile { filename: String, version: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetadataResponse {
    FileInfo {
        version: u64,
        hashlist: Option<Vec<String>>,
    },
    Ok,
    MissingBlocks(Vec<String>),
    WrongVersion(u64),
    Error(String),
}

impl MetadataResponse {
    pub fn from_result(result: Result<(), MetadataError>) -> Self {
        match result {
            Ok(()) => MetadataResponse::Ok,
            Err(MetadataError::MissingBlocks(hashes)) => MetadataResponse::MissingBlocks(hashes),
            Err(MetadataError::WrongVersion(version)) => MetadataResponse::WrongVersion(version),
            Err(err @ MetadataError::InvalidHash(_)) => MetadataResponse::Error(err.to_string()),
            Err(err @ MetadataError::ShardUnavailable(_)) => {
                MetadataResponse::Error(err.to_string())
            }
        }
    }
}
