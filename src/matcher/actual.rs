//! Inputs the sequence matcher can read records from.
//!
//! Three kinds of source are accepted:
//!
//! - a [`ContentsProvider`], which hands out everything buffered so far and
//!   is therefore re-read from the start on every match attempt (this covers
//!   raw byte buffers such as `Vec<u8>`, `String` and [`Bytes`]);
//! - a [`BufferProvider`], which exposes a shared [`Buffer`] and is read the
//!   same way;
//! - a [`Stream`], a forward-only reader: whatever one match attempt consumed
//!   is gone for the next one.

use std::any::{Any, type_name};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Stdin};
use std::net::TcpStream;
use std::process::ChildStdout;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::MatchError;
use crate::logger::{Buffer, TestSink};

/// Something the matcher can obtain a record stream from.
pub trait Actual {
    /// Returns a reader over the records this source currently offers.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be opened for reading.
    fn open(&mut self) -> Result<Box<dyn Read + '_>, MatchError>;
}

/// Source exposing all of its currently buffered bytes.
pub trait ContentsProvider {
    /// Every byte buffered so far.
    fn contents(&self) -> Bytes;
}

/// Source exposing a shared [`Buffer`].
pub trait BufferProvider {
    /// The buffer records are written to.
    fn buffer(&self) -> &Buffer;
}

/// Forward-only byte stream.
#[derive(Debug)]
pub struct Stream<R>(pub R);

impl<R: Read> Stream<R> {
    /// Wraps a reader.
    pub const fn new(reader: R) -> Self {
        Self(reader)
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.0
    }
}

impl<T: ContentsProvider + ?Sized> Actual for T {
    fn open(&mut self) -> Result<Box<dyn Read + '_>, MatchError> {
        Ok(Box::new(Cursor::new(self.contents())))
    }
}

impl<R: Read> Actual for Stream<R> {
    fn open(&mut self) -> Result<Box<dyn Read + '_>, MatchError> {
        Ok(Box::new(&mut self.0))
    }
}

impl<T: BufferProvider + ?Sized> ContentsProvider for T {
    fn contents(&self) -> Bytes {
        self.buffer().contents()
    }
}

impl ContentsProvider for Buffer {
    fn contents(&self) -> Bytes {
        Self::contents(self)
    }
}

impl BufferProvider for TestSink {
    fn buffer(&self) -> &Buffer {
        Self::buffer(self)
    }
}

impl<T: BufferProvider + ?Sized> BufferProvider for Arc<T> {
    fn buffer(&self) -> &Buffer {
        (**self).buffer()
    }
}

impl ContentsProvider for [u8] {
    fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ContentsProvider for Vec<u8> {
    fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ContentsProvider for str {
    fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ContentsProvider for String {
    fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ContentsProvider for Bytes {
    fn contents(&self) -> Bytes {
        self.clone()
    }
}

/// Runs `f` with `value` viewed as an [`Actual`], for callers that only hold
/// a value of a type decided at run time.
///
/// Recognizes the crate's buffer and sink types (also behind `Arc`), raw byte
/// containers, [`Stream`]s over common readers, and bare readers (`File`,
/// `Stdin`, `TcpStream`, `ChildStdout`, `Cursor<Vec<u8>>`, `BufReader<..>`,
/// `Box<dyn Read + Send>`), which are read as forward-only streams. Any other
/// reader can be passed boxed as `Box<dyn Read + Send>`, or wrapped in
/// [`Stream`] and given to [`ContainSequence::matches`] directly.
///
/// [`ContainSequence::matches`]: super::ContainSequence::matches
///
/// # Errors
///
/// Returns [`MatchError::UnsupportedSource`] naming `T` if it is none of
/// these.
pub fn with_actual<T: Any, R>(
    value: &mut T,
    f: impl FnOnce(&mut dyn Actual) -> R,
) -> Result<R, MatchError> {
    let any: &mut dyn Any = value;

    if let Some(a) = any.downcast_mut::<Buffer>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<TestSink>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Arc<TestSink>>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Vec<u8>>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<String>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Bytes>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Stream<Buffer>>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Stream<File>>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Stream<Cursor<Vec<u8>>>>() {
        return Ok(f(a));
    }
    if let Some(a) = any.downcast_mut::<Stream<Box<dyn Read + Send>>>() {
        return Ok(f(a));
    }
    if let Some(r) = any.downcast_mut::<Cursor<Vec<u8>>>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<TcpStream>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<ChildStdout>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<BufReader<Buffer>>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<BufReader<File>>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<File>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<Stdin>() {
        return Ok(f(&mut Stream(r)));
    }
    if let Some(r) = any.downcast_mut::<Box<dyn Read + Send>>() {
        return Ok(f(&mut Stream(r)));
    }

    Err(MatchError::UnsupportedSource {
        type_name: type_name::<T>(),
    })
}
