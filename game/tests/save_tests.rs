use std::fs;
use std::io;

use blockfall::save::{
    FileStore, KEY_BOARD, KEY_CAN_HOLD, KEY_HOLD_PIECE, KEY_PIECE, KeyValueStore, LoadOutcome,
    MemoryStore, SaveError, load_game, save_game,
};
use blockfall::tetris_core::{ActivePiece, MovementPolicy, PieceKind, TetrisCore, Vec2i};

fn played_core(seed: u64) -> TetrisCore {
    let mut core = TetrisCore::new(seed);
    core.initialize_game();
    core.set_cell(0, 19, PieceKind::J.cell());
    core.set_cell(5, 18, PieceKind::S.cell());
    core.set_piece(ActivePiece {
        kind: PieceKind::T,
        shape: PieceKind::T.shape().rotated(),
        pos: Vec2i::new(4, 7),
    });
    assert!(core.hold_piece());
    core
}

fn fresh_core(seed: u64) -> TetrisCore {
    let mut core = TetrisCore::new(seed);
    core.initialize_game();
    core
}

#[test]
fn save_then_load_restores_identical_state() {
    let original = played_core(1);
    let mut store = MemoryStore::new();
    save_game(&mut store, &original).unwrap();
    assert_eq!(store.len(), 4);

    let mut restored = fresh_core(2);
    assert_eq!(load_game(&store, &mut restored).unwrap(), LoadOutcome::Loaded);
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn file_store_survives_a_new_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("save.json");
    let original = played_core(3);

    let mut store = FileStore::new(&path);
    save_game(&mut store, &original).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reopened = FileStore::new(&path);
    let mut restored = fresh_core(4);
    assert_eq!(load_game(&reopened, &mut restored).unwrap(), LoadOutcome::Loaded);
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn saved_values_use_the_documented_shapes() {
    let mut core = fresh_core(5);
    core.set_piece(ActivePiece {
        kind: PieceKind::O,
        shape: PieceKind::O.shape(),
        pos: Vec2i::new(2, 6),
    });
    let mut store = MemoryStore::new();
    save_game(&mut store, &core).unwrap();

    let board: serde_json::Value = serde_json::from_str(&store.get(KEY_BOARD).unwrap().unwrap()).unwrap();
    assert_eq!(board.as_array().map(Vec::len), Some(20));
    assert_eq!(board[0].as_array().map(Vec::len), Some(10));

    let piece: serde_json::Value = serde_json::from_str(&store.get(KEY_PIECE).unwrap().unwrap()).unwrap();
    assert_eq!(piece["x"], 2);
    assert_eq!(piece["y"], 6);
    assert_eq!(piece["shape"], serde_json::json!([[true, true], [true, true]]));

    assert_eq!(store.get(KEY_HOLD_PIECE).unwrap().as_deref(), Some("null"));
    assert_eq!(store.get(KEY_CAN_HOLD).unwrap().as_deref(), Some("true"));
}

#[test]
fn empty_store_reports_no_save_data() {
    let store = MemoryStore::new();
    let mut core = fresh_core(6);
    let before = core.snapshot();

    assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::NoSaveData);
    assert_eq!(core.snapshot(), before);
}

#[test]
fn missing_piece_key_reports_no_save_data() {
    let mut store = MemoryStore::new();
    save_game(&mut store, &played_core(7)).unwrap();
    let mut partial = MemoryStore::new();
    partial.set(KEY_BOARD, store.get(KEY_BOARD).unwrap().unwrap()).unwrap();

    let mut core = fresh_core(8);
    assert_eq!(load_game(&partial, &mut core).unwrap(), LoadOutcome::NoSaveData);
}

#[test]
fn missing_hold_keys_default_to_empty_hold_and_permission() {
    let mut full = MemoryStore::new();
    let original = played_core(9);
    save_game(&mut full, &original).unwrap();

    let mut store = MemoryStore::new();
    store.set(KEY_BOARD, full.get(KEY_BOARD).unwrap().unwrap()).unwrap();
    store.set(KEY_PIECE, full.get(KEY_PIECE).unwrap().unwrap()).unwrap();

    let mut core = fresh_core(10);
    assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::Loaded);
    assert!(core.held_piece().is_none());
    assert!(core.can_hold());
    assert_eq!(core.board(), original.board());
    assert_eq!(core.piece(), original.piece());
}

#[test]
fn corrupt_values_leave_the_game_untouched() {
    let mut valid = MemoryStore::new();
    save_game(&mut valid, &played_core(11)).unwrap();

    let short_board = serde_json::to_string(&vec![vec![0u8; 10]; 19]).unwrap();
    let bent_piece = r#"{"kind":"I","shape":[[true,true],[true,false]],"x":3,"y":0}"#;
    let cases = [
        (KEY_BOARD, short_board.as_str()),
        (KEY_BOARD, "not json"),
        (KEY_PIECE, bent_piece),
        (KEY_HOLD_PIECE, r#"{"kind":"O","shape":[[true]]}"#),
        (KEY_CAN_HOLD, "\"yes\""),
    ];

    for (key, raw) in cases {
        let mut store = valid.clone();
        store.set(key, raw.to_string()).unwrap();

        let mut core = fresh_core(12);
        let before = core.snapshot();
        assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::Corrupt, "{key}: {raw}");
        assert_eq!(core.snapshot(), before, "{key}: {raw}");
    }
}

#[test]
fn garbage_save_file_counts_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, "{ not json").unwrap();

    let store = FileStore::new(&path);
    let mut core = fresh_core(13);
    let before = core.snapshot();
    assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::Corrupt);
    assert_eq!(core.snapshot(), before);
}

#[test]
fn saving_replaces_a_garbage_save_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, "{ not json").unwrap();
    let original = played_core(14);

    let mut store = FileStore::new(&path);
    save_game(&mut store, &original).unwrap();

    let mut restored = fresh_core(15);
    assert_eq!(load_game(&store, &mut restored).unwrap(), LoadOutcome::Loaded);
    assert_eq!(restored.snapshot(), original.snapshot());
}

#[test]
fn unreadable_store_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut core = fresh_core(16);

    let err = load_game(&store, &mut core).unwrap_err();
    assert!(matches!(err, SaveError::Io(_)), "{err}");
}

fn store_with_piece(core: &TetrisCore, piece_json: &str) -> MemoryStore {
    let mut store = MemoryStore::new();
    save_game(&mut store, core).unwrap();
    store.set(KEY_PIECE, piece_json.to_string()).unwrap();
    store
}

#[test]
fn piece_positions_off_the_board_are_corrupt() {
    let o = r#""kind":"O","shape":[[true,true],[true,true]]"#;
    let positions = [
        (50, -40),
        (-1, 5),
        (9, 5),
        (4, 19),
        (i32::MAX, 0),
        (0, i32::MAX),
        (i32::MIN, i32::MIN),
    ];

    for (x, y) in positions {
        let raw = format!(r#"{{{o},"x":{x},"y":{y}}}"#);
        let store = store_with_piece(&fresh_core(17), &raw);

        let mut core = fresh_core(18);
        let before = core.snapshot();
        assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::Corrupt, "{raw}");
        assert_eq!(core.snapshot(), before, "{raw}");
        // The untouched game keeps running.
        core.tick();
    }
}

#[test]
fn piece_on_the_edge_of_the_board_loads() {
    let raw = r#"{"kind":"O","shape":[[true,true],[true,true]],"x":8,"y":18}"#;
    let store = store_with_piece(&fresh_core(19), raw);

    let mut core = fresh_core(20);
    assert_eq!(load_game(&store, &mut core).unwrap(), LoadOutcome::Loaded);
    assert_eq!(core.piece().pos, Vec2i::new(8, 18));
}

#[test]
fn overlapping_piece_is_corrupt_only_under_validated_movement() {
    let mut saved = fresh_core(21);
    saved.set_cell(3, 1, PieceKind::Z.cell());
    let raw = r#"{"kind":"O","shape":[[true,true],[true,true]],"x":3,"y":0}"#;
    let store = store_with_piece(&saved, raw);

    let mut validated = fresh_core(22);
    assert_eq!(load_game(&store, &mut validated).unwrap(), LoadOutcome::Corrupt);

    let mut unchecked = TetrisCore::new(22).with_movement(MovementPolicy::Unchecked);
    unchecked.initialize_game();
    assert_eq!(load_game(&store, &mut unchecked).unwrap(), LoadOutcome::Loaded);
    assert_eq!(unchecked.board().cell(3, 1), Some(PieceKind::Z.cell()));
}

/// Memory store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, SaveError> {
        self.inner.get(key)
    }

    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), SaveError> {
        if self.fail_writes {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.set_many(entries)
    }
}

#[test]
fn failed_save_keeps_the_previous_slot_whole() {
    let first = played_core(23);
    let mut store = FlakyStore::default();
    save_game(&mut store, &first).unwrap();

    let mut second = fresh_core(24);
    second.set_piece(ActivePiece::spawn(PieceKind::O));
    store.fail_writes = true;
    assert!(matches!(save_game(&mut store, &second), Err(SaveError::Io(_))));

    let mut restored = fresh_core(25);
    assert_eq!(load_game(&store, &mut restored).unwrap(), LoadOutcome::Loaded);
    assert_eq!(restored.snapshot(), first.snapshot());
}

#[test]
fn failed_file_write_keeps_the_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("save.json");
    let first = played_core(26);
    let mut store = FileStore::new(&path);
    save_game(&mut store, &first).unwrap();

    // Block the temporary file so the next write fails before touching the save.
    fs::create_dir(path.with_extension("tmp")).unwrap();
    let mut second = fresh_core(27);
    second.set_piece(ActivePiece::spawn(PieceKind::O));
    assert!(matches!(save_game(&mut store, &second), Err(SaveError::Io(_))));

    let mut restored = fresh_core(28);
    assert_eq!(load_game(&store, &mut restored).unwrap(), LoadOutcome::Loaded);
    assert_eq!(restored.snapshot(), first.snapshot());
}

#[test]
fn missing_save_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.json"));
    assert_eq!(store.get(KEY_BOARD).unwrap(), None);
}
