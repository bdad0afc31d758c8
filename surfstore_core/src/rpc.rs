//! A small length-prefixed, postcard-framed RPC transport shared by the
//! BlockStore and MetadataStore protocols.
//!
//! Factored out so both `surfstore_block` and `surfstore_metadata` share the
//! same read/write primitives instead of duplicating them.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Frames larger than this are rejected rather than trusted blindly off
/// the wire; generous enough for a `4096`-byte block plus its envelope.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(u32),
    #[error("failed to encode message: {0}")]
    Encode(#[source] postcard::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[source] postcard::Error),
}

pub async fn write_message<W, T>(writer: &mut W, msg: &T) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = postcard::to_allocvec(msg).map_err(RpcError::Encode)?;
    let len = u32::try_from(body.len()).map_err(|_| RpcError::FrameTooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_message<R, T>(reader: &mut R) -> Result<T, RpcError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(RpcError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    postcard::from_bytes(&body).map_err(RpcError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Ping {
        n: u32,
        label: String,
    }

    #[tokio::test]
    async fn round_trips_a_message_through_a_duplex_pipe() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        let msg = Ping {
            n: 42,
            label: "hello".to_string(),
        };
        write_message(&mut client, &msg).await.unwrap();
        let received: Ping = read_message(&mut server).await.unwrap();
        assert_eq!(received, msg);
    }

    #[tokio::test]
    async fn rejects_oversized_frame_header() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client
            .write_all(&(MAX_FRAME_LEN + 1).to_be_bytes())
            .await
            .unwrap();
        let result: Result<Ping, _> = read_message(&mut server).await;
        assert!(matches!(result, Err(RpcError::FrameTooLarge(_))));
    }
}
