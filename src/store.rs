//! On-disk store for player aggregates.
//!
//! A single JSON file maps player id to aggregate. Every write goes to a
//! sibling temp file first and is renamed over the real one, so a reader
//! never sees a half-written store.

use crate::cache::PlayerAggregate;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, warn};

const STORE_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct StoreFile {
    version: u32,
    players: BTreeMap<String, PlayerAggregate>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    players: &'a BTreeMap<String, PlayerAggregate>,
}

pub struct AggregateStore {
    path: PathBuf,
    // Last committed state of every player. Writes are serialized on it.
    committed: Mutex<BTreeMap<String, PlayerAggregate>>,
}

impl AggregateStore {
    /// Opens the store at `path`. A missing, unreadable or incompatible
    /// file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let players = match load(&path) {
            Ok(players) => {
                info!("Loaded {} cached players from {:?}", players.len(), path);
                players
            }
            Err(e) => {
                warn!("Starting with an empty cache: {}", e);
                BTreeMap::new()
            }
        };

        AggregateStore {
            path,
            committed: Mutex::new(players),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, PlayerAggregate> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records `aggregate` and rewrites the file. On error the in-memory
    /// commit is kept, so the next successful write still includes it.
    pub fn commit(&self, aggregate: &PlayerAggregate) -> Result<(), AppError> {
        let mut committed = self
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        committed.insert(aggregate.player_id.clone(), aggregate.clone());
        write_atomic(&self.path, &committed)
    }

    pub fn flush(&self) -> Result<(), AppError> {
        let committed = self
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        write_atomic(&self.path, &committed)
    }
}

fn load(path: &Path) -> Result<BTreeMap<String, PlayerAggregate>, AppError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No cache file at {:?}", path);
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(e.into()),
    };

    let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
        AppError::PersistenceFailure(format!("Failed to parse cache {:?}: {}", path, e))
    })?;

    if file.version != STORE_VERSION {
        return Err(AppError::PersistenceFailure(format!(
            "Cache {:?} has version {}, expected {}",
            path, file.version, STORE_VERSION
        )));
    }

    Ok(file.players)
}

fn write_atomic(path: &Path, players: &BTreeMap<String, PlayerAggregate>) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let file = StoreFileRef {
        version: STORE_VERSION,
        players,
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| AppError::PersistenceFailure(format!("Failed to serialize cache: {}", e)))?;

    let tmp = path.with_extension("json.tmp");
    if let Err(e) = write_and_swap(&tmp, path, json.as_bytes()) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove {:?}: {}", tmp, cleanup);
            }
        }
        return Err(e);
    }

    debug!("Wrote {} players to {:?}", players.len(), path);
    Ok(())
}

fn write_and_swap(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    {
        let mut out = File::create(tmp)?;
        out.write_all(bytes)?;
        out.sync_all()?;
    }
    fs::rename(tmp, path).map_err(|e| {
        AppError::PersistenceFailure(format!("Failed to swap cache into {:?}: {}", path, e))
    })
}
