//! Per-file content cells.
//!
//! A cell owns a file's bytes and the reader/writer counters that decide
//! whether a new stream may be admitted. Admission never blocks: it either
//! succeeds immediately or reports the conflict.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use stowage_types::FileAccessMode;

use crate::stream::ContentLease;

#[derive(Debug, Default)]
struct CellState {
    bytes: Vec<u8>,
    readers: usize,
    writers: usize,
    modified: Option<SystemTime>,
}

/// Byte buffer plus admission counters for one file.
#[derive(Debug, Default)]
pub(crate) struct ContentCell {
    state: Mutex<CellState>,
}

impl ContentCell {
    /// An empty, never-modified cell.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Try to admit a stream with `mode`.
    ///
    /// Read needs no writer; Write needs no reader and no writer; ReadWrite
    /// needs both and takes both counters. On success returns a snapshot of
    /// the current bytes and the lease that releases the admission.
    pub(crate) fn try_admit(
        self: &Arc<Self>,
        mode: FileAccessMode,
    ) -> Option<(Vec<u8>, CellLease)> {
        let mut state = self.state.lock();
        let admitted = match mode {
            FileAccessMode::Read => state.writers == 0,
            FileAccessMode::Write | FileAccessMode::ReadWrite => {
                state.readers == 0 && state.writers == 0
            }
        };
        if !admitted {
            return None;
        }
        if mode.can_read() {
            state.readers += 1;
        }
        if mode.can_write() {
            state.writers += 1;
        }
        let lease = CellLease {
            cell: Arc::clone(self),
            mode,
        };
        Some((state.bytes.clone(), lease))
    }

    /// Current size in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.state.lock().bytes.len() as u64
    }

    /// Last time a write-capable stream committed, if ever.
    pub(crate) fn modified(&self) -> Option<SystemTime> {
        self.state.lock().modified
    }

    /// True while any stream holds this cell.
    pub(crate) fn is_in_use(&self) -> bool {
        let state = self.state.lock();
        state.readers > 0 || state.writers > 0
    }

    /// A deep copy of the bytes and timestamp with no streams attached.
    pub(crate) fn duplicate(&self) -> Self {
        let state = self.state.lock();
        Self {
            state: Mutex::new(CellState {
                bytes: state.bytes.clone(),
                modified: state.modified,
                ..CellState::default()
            }),
        }
    }
}

/// Admission held by an open stream.
#[derive(Debug)]
pub(crate) struct CellLease {
    cell: Arc<ContentCell>,
    mode: FileAccessMode,
}

impl ContentLease for CellLease {
    fn release(self: Box<Self>, contents: Option<Vec<u8>>) {
        let mut state = self.cell.state.lock();
        if self.mode.can_read() {
            state.readers = state.readers.saturating_sub(1);
        }
        if self.mode.can_write() {
            state.writers = state.writers.saturating_sub(1);
            if let Some(bytes) = contents {
                state.bytes = bytes;
                state.modified = Some(SystemTime::now());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Arc<ContentCell> {
        Arc::new(ContentCell::new())
    }

    #[test]
    fn test_readers_share() {
        let c = cell();
        let (_, r1) = c.try_admit(FileAccessMode::Read).unwrap();
        let (_, r2) = c.try_admit(FileAccessMode::Read).unwrap();
        assert!(c.try_admit(FileAccessMode::Write).is_none());
        assert!(c.try_admit(FileAccessMode::ReadWrite).is_none());
        Box::new(r1).release(None);
        assert!(c.try_admit(FileAccessMode::Write).is_none());
        Box::new(r2).release(None);
        assert!(!c.is_in_use());
        assert!(c.try_admit(FileAccessMode::Write).is_some());
    }

    #[test]
    fn test_writer_is_exclusive() {
        let c = cell();
        let (_, w) = c.try_admit(FileAccessMode::Write).unwrap();
        assert!(c.try_admit(FileAccessMode::Read).is_none());
        assert!(c.try_admit(FileAccessMode::Write).is_none());
        Box::new(w).release(Some(b"data".to_vec()));
        assert_eq!(c.len(), 4);
        assert!(c.modified().is_some());
    }

    #[test]
    fn test_read_write_takes_both_counters() {
        let c = cell();
        let (_, rw) = c.try_admit(FileAccessMode::ReadWrite).unwrap();
        assert!(c.try_admit(FileAccessMode::Read).is_none());
        Box::new(rw).release(None);
        assert!(!c.is_in_use());
        assert!(c.modified().is_none());
    }

    #[test]
    fn test_duplicate_is_deep() {
        let c = cell();
        let (_, w) = c.try_admit(FileAccessMode::Write).unwrap();
        Box::new(w).release(Some(vec![1, 2, 3]));
        let (_, r) = c.try_admit(FileAccessMode::Read).unwrap();

        let copy = Arc::new(c.duplicate());
        assert!(!copy.is_in_use());
        let (_, w) = copy.try_admit(FileAccessMode::Write).unwrap();
        Box::new(w).release(Some(vec![9]));

        assert_eq!(c.len(), 3);
        assert_eq!(copy.len(), 1);
        Box::new(r).release(None);
    }
}
