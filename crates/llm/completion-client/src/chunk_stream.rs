//! Newline-delimited reader over an HTTP body (or any byte stream).
//!
//! [`ChunkStream::next_line`] is cancel safe: bytes are moved into the internal buffer only after
//! the underlying `next()` resolves, so dropping a pending call (e.g. losing a `tokio::select!`
//! race against a timer) never loses data.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::error::CompletionError;

pub struct ChunkStream {
    inner: BoxStream<'static, std::io::Result<Bytes>>,
    pending: Vec<u8>,
    eof: bool,
}

impl ChunkStream {
    /// Wraps a byte stream; transport errors are surfaced as [`CompletionError::Read`].
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: stream.map(|item| item.map_err(std::io::Error::other)).boxed(),
            pending: Vec::new(),
            eof: false,
        }
    }

    /// Body of a successful streaming response.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }

    /// Next line without its `\n` (and without a trailing `\r`).
    ///
    /// At end of stream a non-empty unterminated remainder is returned as a last line; after that
    /// `Ok(None)` is returned.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, CompletionError> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }
            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.pending)));
            }
            match self.inner.next().await {
                Some(Ok(bytes)) => self.pending.extend_from_slice(&bytes),
                Some(Err(e)) => return Err(CompletionError::Read(e)),
                None => self.eof = true,
            }
        }
    }
}
