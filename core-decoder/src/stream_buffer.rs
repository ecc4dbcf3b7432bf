//! # Encoded Input Buffer
//!
//! Shared byte buffer bridging `append()` calls to symphonia's blocking `Read`
//! interface.
//!
//! ## Design
//!
//! - **Writer**: the engine pushes every appended chunk, in order.
//! - **Reader**: a [`StreamReader`] handed to symphonia pulls bytes from a cursor.
//! - **Probing**: consumed bytes stay retained until [`StreamBuffer::compact`], so a
//!   failed container probe can [`rewind`](StreamBuffer::rewind) and start over.
//! - **Exhaustion**: an empty buffer reads as end-of-file (`Ok(0)`). The engine
//!   decides whether that means "wait for more" or "end of stream".
//! - **Growth**: `push` never rejects input. How much stays retained is governed
//!   by how eagerly the engine reads and compacts.
//!
//! ## Usage
//!
//! ```rust
//! use core_decoder::stream_buffer::StreamBuffer;
//! use std::io::Read;
//!
//! let buffer = StreamBuffer::new();
//! buffer.push(b"RIFF");
//!
//! let mut reader = buffer.reader();
//! let mut out = [0u8; 8];
//! assert_eq!(reader.read(&mut out).unwrap(), 4);
//! assert_eq!(reader.read(&mut out).unwrap(), 0);
//! ```

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

#[derive(Default)]
struct StreamBufferState {
    data: BytesMut,
    cursor: usize,
}

impl StreamBufferState {
    fn unread(&self) -> usize {
        self.data.len() - self.cursor
    }
}

/// Growable FIFO of encoded bytes with a rewindable read cursor.
#[derive(Clone, Default)]
pub struct StreamBuffer {
    inner: Arc<Mutex<StreamBufferState>>,
}

impl StreamBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of encoded bytes.
    ///
    /// Returns the number of bytes now retained.
    pub fn push(&self, chunk: &[u8]) -> usize {
        let mut state = self.inner.lock();
        state.data.extend_from_slice(chunk);
        state.data.len()
    }

    /// Create a reader sharing this buffer's cursor.
    pub fn reader(&self) -> StreamReader {
        StreamReader {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of bytes not yet read.
    pub fn unread(&self) -> usize {
        self.inner.lock().unread()
    }

    /// Number of bytes held in memory, read or not.
    pub fn retained(&self) -> usize {
        self.inner.lock().data.len()
    }

    /// Move the read cursor back to the oldest retained byte.
    pub fn rewind(&self) {
        self.inner.lock().cursor = 0;
    }

    /// Release every byte before the read cursor.
    ///
    /// Returns the number of bytes released.
    pub fn compact(&self) -> usize {
        let mut state = self.inner.lock();
        let consumed = state.cursor;
        state.data.advance(consumed);
        state.cursor = 0;
        consumed
    }

    /// Drop all buffered bytes.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.data = BytesMut::new();
        state.cursor = 0;
    }

    /// Returns `true` if no unread bytes remain.
    pub fn is_empty(&self) -> bool {
        self.unread() == 0
    }
}

impl fmt::Debug for StreamBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("StreamBuffer")
            .field("retained", &state.data.len())
            .field("cursor", &state.cursor)
            .finish()
    }
}

/// Blocking-free `Read` view of a [`StreamBuffer`].
pub struct StreamReader {
    inner: Arc<Mutex<StreamBufferState>>,
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.inner.lock();
        let size = state.unread().min(buf.len());
        let start = state.cursor;

        buf[..size].copy_from_slice(&state.data[start..start + size]);
        state.cursor += size;

        Ok(size)
    }
}

impl fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader")
            .field("unread", &self.inner.lock().unread())
            .finish_non_exhaustive()
    }
}
