//! Shared in-memory byte buffer.
//!
//! A [`Buffer`] is a cloneable handle: every clone appends to and reads from
//! the same bytes. It offers two views of what was written:
//!
//! - [`Buffer::contents`] returns everything ever written, every time;
//! - the [`Read`] impl is forward-only and consumes what it returns.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};

#[derive(Debug, Default)]
struct Inner {
    bytes: BytesMut,
    read_pos: usize,
}

/// Cloneable handle to a shared append-only byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    inner: Arc<Mutex<Inner>>,
}

impl Buffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every byte written so far.
    ///
    /// Independent of the read cursor; repeated calls see the same prefix.
    #[must_use]
    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock().bytes)
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().bytes.len()
    }

    /// Returns whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().bytes.is_empty()
    }

    /// Number of bytes not yet consumed through [`Read`].
    #[must_use]
    pub fn unread(&self) -> usize {
        let inner = self.lock();
        inner.bytes.len() - inner.read_pos
    }

    // A panic while holding the lock cannot leave the bytes half-appended,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for Buffer {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        let start = inner.read_pos;
        let n = out.len().min(inner.bytes.len() - start);
        out[..n].copy_from_slice(&inner.bytes[start..start + n]);
        inner.read_pos += n;
        drop(inner);
        Ok(n)
    }
}
