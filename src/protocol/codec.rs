//! Length-prefixed frame codec for socket broker streams.
//!
//! Wraps [`tokio_util::codec::LengthDelimitedCodec`] with a configurable
//! maximum frame length so a misbehaving broker cannot make the client
//! allocate an unbounded buffer for a single message.
//!
//! # Wire layout
//!
//! ```text
//! +----------------------+---------------------+
//! | length: u32 (BE)     | payload: length B   |
//! +----------------------+---------------------+
//! ```
//!
//! One frame is one logical unit: a command on the way out, a message body
//! on the way in. Frame identity never depends on how the OS splits or
//! coalesces reads.
//!
//! # Usage
//!
//! Use [`FrameCodec`] as the codec parameter for
//! [`tokio_util::codec::Framed`].
//!
//! ```rust,ignore
//! use tokio_util::codec::Framed;
//! use topic_relay::protocol::codec::FrameCodec;
//!
//! let framed = Framed::new(tcp_stream, FrameCodec::new());
//! ```

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::{AppError, Result};

/// Default maximum payload length: 1 MiB.
pub const MAX_FRAME_BYTES: usize = 1_048_576;

/// Length of the big-endian frame header.
pub const HEADER_BYTES: usize = 4;

/// Length-prefixed codec for the socket transport.
///
/// # Decoder
///
/// Yields one [`BytesMut`] payload per complete frame and buffers partial
/// frames. A frame whose declared length exceeds the limit returns
/// [`AppError::Transport`]`("frame too long: …")`. EOF inside a frame is
/// reported by [`Decoder::decode_eof`] as [`AppError::Transport`].
///
/// # Encoder
///
/// Prefixes each outbound payload with its length. Payloads above the limit
/// are rejected before anything is written.
#[derive(Debug)]
pub struct FrameCodec {
    inner: LengthDelimitedCodec,
    max_frame_bytes: usize,
}

impl FrameCodec {
    /// Create a `FrameCodec` with the default [`MAX_FRAME_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_frame_bytes(MAX_FRAME_BYTES)
    }

    /// Create a `FrameCodec` that rejects payloads above `max_frame_bytes`.
    #[must_use]
    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        let inner = LengthDelimitedCodec::builder()
            .length_field_length(HEADER_BYTES)
            .max_frame_length(max_frame_bytes)
            .big_endian()
            .new_codec();
        Self {
            inner,
            max_frame_bytes,
        }
    }

    /// Configured payload limit.
    #[must_use]
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let max = self.max_frame_bytes;
        self.inner.decode(src).map_err(|e| map_codec_error(&e, max))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.inner.decode(src) {
            Ok(Some(frame)) => Ok(Some(frame)),
            Ok(None) if src.is_empty() => Ok(None),
            Ok(None) => Err(AppError::Transport(format!(
                "connection closed mid-frame with {} bytes buffered",
                src.len()
            ))),
            Err(e) => Err(map_codec_error(&e, self.max_frame_bytes)),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = AppError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_frame_bytes {
            return Err(AppError::Transport(format!(
                "frame too long: {} bytes exceeds {} byte limit",
                item.len(),
                self.max_frame_bytes
            )));
        }
        let max = self.max_frame_bytes;
        self.inner.encode(item, dst).map_err(|e| map_codec_error(&e, max))
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Map a [`LengthDelimitedCodec`] I/O error to an [`AppError`].
///
/// The inner codec reports an oversize length header as `InvalidData`.
fn map_codec_error(e: &std::io::Error, max_frame_bytes: usize) -> AppError {
    if e.kind() == std::io::ErrorKind::InvalidData {
        AppError::Transport(format!("frame too long: exceeded {max_frame_bytes} bytes"))
    } else {
        AppError::Transport(e.to_string())
    }
}
