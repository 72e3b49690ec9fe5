//! File content streams.
//!
//! A [`FileStream`] works on a private copy of the file's bytes taken when it
//! was opened. Nothing it does is visible to anyone else until it is closed
//! (or dropped): then a write-capable stream hands its final bytes back to
//! the filesystem, which replaces the file's content wholesale.

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

use stowage_types::FileAccessMode;

/// The filesystem side of an open stream.
///
/// Released exactly once, when the stream closes. `contents` carries the
/// stream's final bytes for write-capable streams and is `None` otherwise,
/// or when the stream was discarded.
pub trait ContentLease: Send + Sync {
    fn release(self: Box<Self>, contents: Option<Vec<u8>>);
}

/// An open file.
///
/// Implements both `std::io` and tokio's async I/O traits over an in-memory
/// buffer. Reading without read capability, or writing without write
/// capability, fails with `PermissionDenied`.
pub struct FileStream {
    path: String,
    mode: FileAccessMode,
    cursor: Cursor<Vec<u8>>,
    lease: Option<Box<dyn ContentLease>>,
}

impl FileStream {
    /// Wrap a snapshot of a file's content.
    pub fn new(
        path: impl Into<String>,
        mode: FileAccessMode,
        contents: Vec<u8>,
        lease: Box<dyn ContentLease>,
    ) -> Self {
        Self {
            path: path.into(),
            mode,
            cursor: Cursor::new(contents),
            lease: Some(lease),
        }
    }

    /// Path the stream was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Access mode the stream was admitted with.
    pub fn mode(&self) -> FileAccessMode {
        self.mode
    }

    /// Current length of the stream's buffer.
    pub fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    /// True if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Current read/write position.
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Truncate or zero-extend the buffer. The position is clamped to the new
    /// length.
    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        self.require_write()?;
        let len = usize::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length too large"))?;
        self.cursor.get_mut().resize(len, 0);
        if self.cursor.position() > len as u64 {
            self.cursor.set_position(len as u64);
        }
        Ok(())
    }

    /// Close the stream, committing its bytes if it can write.
    pub fn close(mut self) {
        self.release();
    }

    /// Close the stream without committing anything. The file keeps the
    /// content it had before the stream was opened.
    pub fn discard(mut self) {
        if let Some(lease) = self.lease.take() {
            lease.release(None);
        }
    }

    fn release(&mut self) {
        if let Some(lease) = self.lease.take() {
            let contents = self
                .mode
                .can_write()
                .then(|| std::mem::take(self.cursor.get_mut()));
            lease.release(contents);
        }
    }

    fn require_read(&self) -> io::Result<()> {
        if self.mode.can_read() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} was opened without read access", self.path),
            ))
        }
    }

    fn require_write(&self) -> io::Result<()> {
        if self.mode.can_write() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} was opened without write access", self.path),
            ))
        }
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len())
            .field("position", &self.position())
            .finish()
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.require_read()?;
        self.cursor.read(buf)
    }
}

impl Write for FileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.require_write()?;
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FileStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl AsyncRead for FileStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Err(e) = this.require_read() {
            return Poll::Ready(Err(e));
        }
        Pin::new(&mut this.cursor).poll_read(cx, buf)
    }
}

impl AsyncWrite for FileStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Err(e) = this.require_write() {
            return Poll::Ready(Err(e));
        }
        Pin::new(&mut this.cursor).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for FileStream {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.get_mut().cursor).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().cursor).poll_complete(cx)
    }
}
