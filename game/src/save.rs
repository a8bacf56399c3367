//! Save slots for a running game.
//!
//! A save is four independent JSON values stored under fixed keys in a [`KeyValueStore`]: the
//! board grid, the active piece, the held piece (or `null`) and the hold permission.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::tetris_core::{
    ActivePiece, Board, HeldPiece, MovementPolicy, PieceKind, Shape, TetrisCore, TetrisSnapshot,
};

pub const KEY_BOARD: &str = "tetris_board";
pub const KEY_PIECE: &str = "tetris_piece";
pub const KEY_HOLD_PIECE: &str = "tetris_holdPiece";
pub const KEY_CAN_HOLD: &str = "tetris_canHold";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save store i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError>;

    /// Writes every entry or none of them.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), SaveError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), SaveError> {
        self.set_many(vec![(key, value)])
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), SaveError> {
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// A key-value store persisted as a single JSON object file.
///
/// A missing file reads as an empty store. Every write replaces the whole file at once, so a
/// failed write leaves the previous contents in place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$BLOCKFALL_SAVE_PATH`, else `save.json` next to the settings file.
    pub fn from_env(settings_dir: Option<&Path>) -> Self {
        if let Some(explicit) = std::env::var_os("BLOCKFALL_SAVE_PATH") {
            return Self::new(PathBuf::from(explicit));
        }
        let dir = settings_dir.map(Path::to_path_buf).unwrap_or_default();
        Self::new(dir.join("save.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SaveError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&mut self, updates: Vec<(&str, String)>) -> Result<(), SaveError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(SaveError::Json(err)) => {
                warn!("overwriting unreadable save file {}: {err}", self.path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        for (key, value) in updates {
            entries.insert(key.to_string(), value);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&entries)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            if let Err(err) = fs::remove_file(&tmp) {
                warn!("could not remove {}: {err}", tmp.display());
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Board or piece key is absent.
    NoSaveData,
    /// Keys exist but hold values that do not describe a playable state.
    Corrupt,
}

pub fn save_game<S: KeyValueStore>(store: &mut S, core: &TetrisCore) -> Result<(), SaveError> {
    let snapshot = core.snapshot();
    store.set_many(vec![
        (KEY_BOARD, serde_json::to_string(&snapshot.board)?),
        (KEY_PIECE, serde_json::to_string(&snapshot.piece)?),
        (KEY_HOLD_PIECE, serde_json::to_string(&snapshot.held)?),
        (KEY_CAN_HOLD, serde_json::to_string(&snapshot.can_hold)?),
    ])?;
    info!("game saved");
    Ok(())
}

/// Restores `core` from `store`. Anything short of a fully valid save leaves `core` untouched.
///
/// Only I/O failures are errors; a store whose contents cannot be parsed counts as corrupt.
pub fn load_game<S: KeyValueStore>(store: &S, core: &mut TetrisCore) -> Result<LoadOutcome, SaveError> {
    let slot = match read_slot(store) {
        Ok(slot) => slot,
        Err(SaveError::Json(err)) => {
            warn!("save store is unreadable ({err}); keeping current game");
            return Ok(LoadOutcome::Corrupt);
        }
        Err(err) => return Err(err),
    };
    let [Some(board), Some(piece), held, can_hold] = slot else {
        info!("no save data");
        return Ok(LoadOutcome::NoSaveData);
    };

    let decoded = decode_snapshot(&board, &piece, held.as_deref(), can_hold.as_deref())
        .filter(|snapshot| is_playable(snapshot, core.movement()));
    match decoded {
        Some(snapshot) => {
            core.restore(snapshot);
            info!("game loaded");
            Ok(LoadOutcome::Loaded)
        }
        None => {
            warn!("save data is corrupt; keeping current game");
            Ok(LoadOutcome::Corrupt)
        }
    }
}

fn read_slot<S: KeyValueStore>(store: &S) -> Result<[Option<String>; 4], SaveError> {
    Ok([
        store.get(KEY_BOARD)?,
        store.get(KEY_PIECE)?,
        store.get(KEY_HOLD_PIECE)?,
        store.get(KEY_CAN_HOLD)?,
    ])
}

/// The piece must sit fully on the board; validated movement also forbids overlapping settled
/// cells.
fn is_playable(snapshot: &TetrisSnapshot, movement: MovementPolicy) -> bool {
    if !snapshot.board.contains_piece(&snapshot.piece) {
        return false;
    }
    movement == MovementPolicy::Unchecked || !snapshot.board.collides(&snapshot.piece)
}

fn decode_snapshot(
    board: &str,
    piece: &str,
    held: Option<&str>,
    can_hold: Option<&str>,
) -> Option<TetrisSnapshot> {
    let board = Board::from_rows(parse(board)?)?;

    let piece: ActivePiece = parse(piece)?;
    if !is_catalog_shape(piece.kind, &piece.shape) {
        return None;
    }

    let held: Option<HeldPiece> = match held {
        Some(raw) => parse(raw)?,
        None => None,
    };
    if let Some(h) = &held {
        if !is_catalog_shape(h.kind, &h.shape) {
            return None;
        }
    }

    let can_hold = match can_hold {
        Some(raw) => parse(raw)?,
        None => true,
    };

    Some(TetrisSnapshot {
        board,
        piece,
        held,
        can_hold,
    })
}

fn parse<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}

/// Some rotation of the kind's catalog shape.
fn is_catalog_shape(kind: PieceKind, shape: &Shape) -> bool {
    let mut candidate = kind.shape();
    for _ in 0..4 {
        if &candidate == shape {
            return true;
        }
        candidate = candidate.rotated();
    }
    false
}
