//! The run-state registry: the shared, append-and-replace record of active
//! sessions used for `MaxClients`/`MaxClientsPerHost` admission counting.
//!
//! One record per worker is written on state change. Cross-worker admission
//! counts are read under the registry file's advisory lock, held from
//! read-start to decision emission, so no two workers can race an admission
//! decision against the same count.

pub mod lock;
pub mod record;

pub use lock::RunStateLock;
pub use record::SessionRecord;

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;

use crate::error::{SessionError, SessionResult};

/// In-process mirror of the on-disk registry, keyed by worker pid, plus the
/// backing file used for cross-process coordination.
///
/// The `DashMap` mirror avoids re-parsing the file for every admission
/// check within a single worker's lifetime; cross-worker visibility still
/// goes through the file, which is the authoritative store.
pub struct RunStateRegistry {
    path: Utf8PathBuf,
    mirror: DashMap<u32, SessionRecord>,
}

impl RunStateRegistry {
    /// Opens (creating if absent) the registry file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            mirror: DashMap::new(),
        })
    }

    /// Writes or replaces the record for `record.pid`, then releases the
    /// advisory lock. Updates the in-process mirror under the same lock.
    pub fn upsert(&self, record: SessionRecord) -> SessionResult<()> {
        let _lock = RunStateLock::acquire(&self.path)?;
        let mut records = read_all(&self.path)?;
        records.retain(|existing| existing.pid != record.pid);
        records.push(record.clone());
        write_all(&self.path, &records)?;
        self.mirror.insert(record.pid, record);
        Ok(())
    }

    /// Removes the record for `pid`, if present.
    pub fn remove(&self, pid: u32) -> SessionResult<()> {
        let _lock = RunStateLock::acquire(&self.path)?;
        let mut records = read_all(&self.path)?;
        records.retain(|existing| existing.pid != pid);
        write_all(&self.path, &records)?;
        self.mirror.remove(&pid);
        Ok(())
    }

    /// Counts sessions on `vhost` for admission purposes, holding the
    /// advisory lock for the duration of the read.
    pub fn count_on_vhost(&self, vhost_ip: &str, vhost_port: u16) -> SessionResult<usize> {
        let _lock = RunStateLock::acquire(&self.path)?;
        let records = read_all(&self.path)?;
        Ok(records
            .iter()
            .filter(|record| record.server_ip == vhost_ip && record.server_port == vhost_port)
            .count())
    }

    /// Counts sessions from `peer_addr` on `vhost`, holding the advisory
    /// lock for the duration of the read.
    pub fn count_from_peer(&self, peer_addr: &str, vhost_ip: &str, vhost_port: u16) -> SessionResult<usize> {
        let _lock = RunStateLock::acquire(&self.path)?;
        let records = read_all(&self.path)?;
        Ok(records
            .iter()
            .filter(|record| {
                record.peer_addr == peer_addr && record.server_ip == vhost_ip && record.server_port == vhost_port
            })
            .count())
    }
}

fn read_all(path: &Utf8Path) -> SessionResult<Vec<SessionRecord>> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path.as_std_path())
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err).wrap_err("open run-state registry")))?;

    let mut contents = String::new();
    file.seek(SeekFrom::Start(0))
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err)))?;
    file.read_to_string(&mut contents)
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err)))?;

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&contents)
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err).wrap_err("parse run-state registry")))
}

fn write_all(path: &Utf8Path, records: &[SessionRecord]) -> SessionResult<()> {
    let serialized = serde_json::to_string_pretty(records)
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err)))?;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path.as_std_path())
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err).wrap_err("rewrite run-state registry")))?;

    file.write_all(serialized.as_bytes())
        .map_err(|err| SessionError::from(color_eyre::eyre::eyre!(err)))
}

/// Convenience alias for the in-process admission mirror, exposed for tests
/// that want to assert on mirror contents without going through the file.
pub type Mirror = HashMap<u32, SessionRecord>;
