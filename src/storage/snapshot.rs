//! Snapshot-based persistence.
//!
//! The whole visited set lives in one file. Every batch rewrites the file to a
//! temporary sibling, syncs it and renames it over the previous snapshot, so a
//! crash leaves either the old or the new set on disk, never a mix.

use super::{PersistentStore, StorageStats};
use crate::error::{FogmapError, Result};
use crate::point::GeoPoint;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const SNAPSHOT_MAGIC: &[u8] = b"FOGMAP_SNAPSHOT";
const SNAPSHOT_VERSION: u8 = 1;

const FLAG_HAS_ACCURACY: u8 = 0b0000_0001;

/// Store that keeps every visited point in a single snapshot file.
pub struct SnapshotStore {
    path: PathBuf,
    state: Mutex<SnapshotState>,
}

#[derive(Default)]
struct SnapshotState {
    // Last contents known to be on disk; `None` until first read.
    points: Option<Vec<GeoPoint>>,
    batches_written: u64,
    loads: u64,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(SnapshotState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<Vec<GeoPoint>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Vec::new());
        }

        let mut reader = BufReader::new(file);

        let mut magic = vec![0u8; SNAPSHOT_MAGIC.len()];
        read_exact(&mut reader, &mut magic)?;
        if magic != SNAPSHOT_MAGIC {
            return Err(FogmapError::InvalidFormat);
        }

        if read_u8(&mut reader)? != SNAPSHOT_VERSION {
            return Err(FogmapError::InvalidFormat);
        }

        let mut timestamp_bytes = [0u8; 16];
        read_exact(&mut reader, &mut timestamp_bytes)?;

        let count = read_u64(&mut reader)? as usize;
        let mut points = Vec::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            let latitude = read_f64(&mut reader)?;
            let longitude = read_f64(&mut reader)?;
            let flags = read_u8(&mut reader)?;
            let accuracy = if flags & FLAG_HAS_ACCURACY != 0 {
                Some(read_f64(&mut reader)?)
            } else {
                None
            };
            points.push(GeoPoint {
                latitude,
                longitude,
                accuracy,
            });
        }

        Ok(points)
    }

    fn write(&self, points: &[GeoPoint]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        let mut writer = BufWriter::new(file);
        writer.write_all(SNAPSHOT_MAGIC)?;
        writer.write_all(&[SNAPSHOT_VERSION])?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| FogmapError::Serialization(e.to_string()))?;
        let mut timestamp_buf = [0u8; 16];
        timestamp_buf[0..8].copy_from_slice(&timestamp.as_secs().to_le_bytes());
        timestamp_buf[8..12].copy_from_slice(&timestamp.subsec_nanos().to_le_bytes());
        writer.write_all(&timestamp_buf)?;

        writer.write_all(&(points.len() as u64).to_le_bytes())?;
        for point in points {
            writer.write_all(&point.latitude.to_le_bytes())?;
            writer.write_all(&point.longitude.to_le_bytes())?;
            match point.accuracy {
                Some(accuracy) => {
                    writer.write_all(&[FLAG_HAS_ACCURACY])?;
                    writer.write_all(&accuracy.to_le_bytes())?;
                }
                None => writer.write_all(&[0])?,
            }
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        self.sync_parent_dir()
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }

    fn sync_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
        Ok(())
    }
}

impl PersistentStore for SnapshotStore {
    fn load_all(&self) -> Result<Vec<GeoPoint>> {
        let mut state = self.state.lock();
        let points = self.read().map_err(FogmapError::unavailable)?;
        state.points = Some(points.clone());
        state.loads += 1;
        Ok(points)
    }

    fn insert_batch(&self, batch: &[GeoPoint]) -> Result<()> {
        let mut state = self.state.lock();
        if state.points.is_none() {
            state.points = Some(self.read().map_err(FogmapError::write_failed)?);
        }
        let mut next = state.points.clone().unwrap_or_default();
        next.extend_from_slice(batch);

        self.write(&next).map_err(FogmapError::write_failed)?;
        state.points = Some(next);
        state.batches_written += 1;
        log::debug!(
            "Snapshot {} now holds {} points",
            self.path.display(),
            state.points.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.write(&[]).map_err(FogmapError::write_failed)?;
        state.points = Some(Vec::new());
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        let state = self.state.lock();
        StorageStats {
            point_count: state.points.as_ref().map_or(0, Vec::len),
            batches_written: state.batches_written,
            loads: state.loads,
            size_bytes: std::fs::metadata(&self.path).map_or(0, |m| m.len()),
        }
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        std::io::ErrorKind::UnexpectedEof => FogmapError::UnexpectedEof,
        _ => FogmapError::from(err),
    })
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    read_exact(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(f64::from_le_bytes(buf))
}
