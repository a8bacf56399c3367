use engine::HeadlessRunner;
use log::warn;

use crate::input::InputAction;
use crate::playtest::TetrisLogic;
use crate::save::{KeyValueStore, LoadOutcome, load_game, save_game};
use crate::tetris_core::TetrisCore;

/// User-facing result of a save-slot action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    Loaded,
    NoSaveData,
    SaveFailed(String),
    LoadFailed(String),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Saved => "game saved".to_string(),
            Notice::Loaded => "game loaded".to_string(),
            Notice::NoSaveData => "no save data".to_string(),
            Notice::SaveFailed(err) => format!("save failed: {err}"),
            Notice::LoadFailed(err) => format!("load failed: {err}"),
        }
    }
}

/// A running game plus its save slot.
pub struct GameSession<S: KeyValueStore> {
    runner: HeadlessRunner<TetrisLogic>,
    store: S,
    notice: Option<Notice>,
}

impl<S: KeyValueStore> GameSession<S> {
    pub fn new(logic: TetrisLogic, store: S) -> Self {
        Self {
            runner: HeadlessRunner::new(logic),
            store,
            notice: None,
        }
    }

    /// Optionally restores the save slot on top of the freshly spawned game.
    pub fn start(&mut self, autoload: bool) {
        if autoload {
            self.load();
        }
    }

    pub fn core(&self) -> &TetrisCore {
        self.runner.state()
    }

    pub fn core_mut(&mut self) -> &mut TetrisCore {
        self.runner.state_mut()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ticks(&self) -> usize {
        self.runner.ticks()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn handle(&mut self, action: InputAction) {
        match action {
            InputAction::Save => self.save(),
            InputAction::Load => self.load(),
            gameplay => self.runner.input(gameplay),
        }
    }

    pub fn tick(&mut self) {
        self.runner.tick();
    }

    pub fn save(&mut self) {
        let notice = match save_game(&mut self.store, self.runner.state()) {
            Ok(()) => Notice::Saved,
            Err(err) => {
                warn!("{err}");
                Notice::SaveFailed(err.to_string())
            }
        };
        self.notice = Some(notice);
    }

    /// Corrupt saves are dropped without a notice; the current game simply continues.
    pub fn load(&mut self) {
        self.notice = match load_game(&self.store, self.runner.state_mut()) {
            Ok(LoadOutcome::Loaded) => Some(Notice::Loaded),
            Ok(LoadOutcome::NoSaveData) => Some(Notice::NoSaveData),
            Ok(LoadOutcome::Corrupt) => None,
            Err(err) => {
                warn!("{err}");
                Some(Notice::LoadFailed(err.to_string()))
            }
        };
    }
}
