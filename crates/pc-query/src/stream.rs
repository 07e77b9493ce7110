//! Raw response body streams.

use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;

use pcq_client::Response;

use crate::error::{Error, Result};

/// Body of a streaming query, read chunk by chunk.
///
/// Nothing is buffered beyond the current chunk unless [`ByteStream::collect`]
/// is used.
#[derive(Debug)]
pub struct ByteStream {
    response: Response,
    content_type: Option<String>,
    content_length: Option<u64>,
}

impl ByteStream {
    pub(crate) fn new(response: Response) -> Self {
        let content_type = response.content_type().map(str::to_owned);
        let content_length = response.content_length();
        Self {
            response,
            content_type,
            content_length,
        }
    }

    /// Content type reported by the server.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content length reported by the server, if known up front.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Next chunk of the body, or `None` at the end.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.response.chunk().await.map_err(|e| Error::from_client(e, 1))
    }

    /// Read the remaining body into memory.
    pub async fn collect(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Write the remaining body to `path`, replacing any existing file.
    ///
    /// Returns the number of bytes written. On failure the partially written
    /// file is removed.
    pub async fn write_to(mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::create(path).await?;
        let copied = self.copy_into(&mut file).await;
        drop(file);
        match copied {
            Ok(written) => {
                tracing::debug!(path = %path.display(), bytes = written, "stream persisted");
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(path).await;
                Err(e)
            }
        }
    }

    async fn copy_into(&mut self, file: &mut tokio::fs::File) -> Result<u64> {
        let mut written = 0u64;
        while let Some(chunk) = self.next_chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}
