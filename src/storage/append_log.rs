//! Append-only log persistence.
//!
//! Each flushed batch becomes one frame: a big-endian `u32` payload length
//! followed by the bincode encoding of the batch. Frames are written with a
//! single `write_all` and synced before the batch is reported as stored. If
//! the write fails the file is truncated back to its previous length, and a
//! frame cut short by a crash is skipped on replay.

use super::{PersistentStore, StorageStats};
use crate::error::{FogmapError, Result};
use crate::point::GeoPoint;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const FRAME_HEADER_LEN: usize = 4;
const SCRATCH_INITIAL_CAPACITY: usize = 8 * 1024;
const SCRATCH_SHRINK_THRESHOLD: usize = 1 << 20;

/// Store that appends every batch to a log file.
pub struct AppendLogStore {
    path: PathBuf,
    inner: Mutex<LogFile>,
}

struct LogFile {
    file: File,
    size: u64,
    point_count: usize,
    batches_written: u64,
    loads: u64,
    scratch: BytesMut,
}

impl AppendLogStore {
    /// Opens the log at `path`, creating it and its parent directories if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            inner: Mutex::new(LogFile {
                file,
                size,
                point_count: 0,
                batches_written: 0,
                loads: 0,
                scratch: BytesMut::with_capacity(SCRATCH_INITIAL_CAPACITY),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current log size in bytes.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    fn replay(state: &mut LogFile) -> Result<Vec<GeoPoint>> {
        state.file.seek(SeekFrom::Start(0))?;
        let mut data = Vec::with_capacity(state.size as usize);
        state.file.read_to_end(&mut data)?;

        let mut buf = Bytes::from(data);
        let mut points = Vec::new();
        while buf.remaining() >= FRAME_HEADER_LEN {
            let len = buf.get_u32() as usize;
            if buf.remaining() < len {
                log::warn!(
                    "Ignoring torn frame at end of log ({} of {} bytes present)",
                    buf.remaining(),
                    len
                );
                return Ok(points);
            }
            let payload = buf.split_to(len);
            let batch: Vec<GeoPoint> = bincode::deserialize(&payload)
                .map_err(|e| FogmapError::Serialization(e.to_string()))?;
            points.extend(batch);
        }
        if buf.has_remaining() {
            log::warn!(
                "Ignoring {} trailing bytes at end of log",
                buf.remaining()
            );
        }

        Ok(points)
    }

    fn encode_frame(scratch: &mut BytesMut, points: &[GeoPoint]) -> Result<()> {
        let payload =
            bincode::serialize(points).map_err(|e| FogmapError::Serialization(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| FogmapError::InvalidInput("batch too large for one frame".into()))?;

        scratch.clear();
        scratch.reserve(FRAME_HEADER_LEN + payload.len());
        scratch.put_u32(len);
        scratch.put_slice(&payload);
        Ok(())
    }
}

fn append_frame(file: &mut File, frame: &[u8]) -> std::io::Result<()> {
    file.write_all(frame)?;
    file.sync_data()
}

impl PersistentStore for AppendLogStore {
    fn load_all(&self) -> Result<Vec<GeoPoint>> {
        let mut state = self.inner.lock();
        let points = Self::replay(&mut state).map_err(FogmapError::unavailable)?;
        state.point_count = points.len();
        state.loads += 1;
        Ok(points)
    }

    fn insert_batch(&self, points: &[GeoPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let mut guard = self.inner.lock();
        let state = &mut *guard;
        Self::encode_frame(&mut state.scratch, points).map_err(FogmapError::write_failed)?;

        let previous = state.size;
        if let Err(err) = append_frame(&mut state.file, &state.scratch) {
            if let Err(truncate_err) = state.file.set_len(previous) {
                log::error!(
                    "Failed to roll back partial frame in {}: {}",
                    self.path.display(),
                    truncate_err
                );
            }
            return Err(FogmapError::write_failed(err));
        }

        state.size += state.scratch.len() as u64;
        state.point_count += points.len();
        state.batches_written += 1;

        if state.scratch.capacity() > SCRATCH_SHRINK_THRESHOLD {
            state.scratch = BytesMut::with_capacity(SCRATCH_INITIAL_CAPACITY);
        }

        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut state = self.inner.lock();
        state.file.set_len(0).map_err(FogmapError::write_failed)?;
        state.file.sync_all().map_err(FogmapError::write_failed)?;
        state.size = 0;
        state.point_count = 0;
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        let state = self.inner.lock();
        StorageStats {
            point_count: state.point_count,
            batches_written: state.batches_written,
            loads: state.loads,
            size_bytes: state.size,
        }
    }
}
