use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use engine::app::{AppConfig, AppContext, GameApp, run_game};
use engine::graphics::Renderer2d;
use log::{debug, info, warn};
use winit::event::VirtualKeyCode;

use blockfall::input::{InputAction, map_key_to_action};
use blockfall::playtest::TetrisLogic;
use blockfall::render::{BoardLayout, render_game};
use blockfall::save::FileStore;
use blockfall::session::{GameSession, Notice};
use blockfall::settings::{GameSettings, SettingsStore};
use blockfall::tetris_core::MovementPolicy;

const WINDOW_TITLE: &str = "blockfall";

#[derive(Debug, Parser)]
#[command(name = "blockfall")]
#[command(about = "Falling-block puzzle game with a hold slot and save slots")]
struct Cli {
    /// Seed for the piece randomizer; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    save_file: Option<PathBuf>,
    /// Apply horizontal moves and rotations without checking walls or settled cells.
    #[arg(long, default_value_t = false)]
    unchecked_moves: bool,
    #[arg(long, default_value_t = false)]
    no_autoload: bool,
    /// Run this many ticks without a window and print the board.
    #[arg(long)]
    headless_ticks: Option<usize>,
}

struct BlockfallApp {
    logic: TetrisLogic,
    save_path: PathBuf,
    autoload: bool,
    layout: BoardLayout,
}

impl GameApp for BlockfallApp {
    type State = GameSession<FileStore>;
    type Action = InputAction;

    fn init_state(&mut self, ctx: &mut AppContext) -> Self::State {
        let mut session = GameSession::new(self.logic.clone(), FileStore::new(&self.save_path));
        session.start(self.autoload);
        show_notice(&mut session, ctx);
        session
    }

    fn map_key(&self, key: VirtualKeyCode) -> Option<Self::Action> {
        map_key_to_action(key)
    }

    fn handle_action(&mut self, state: &mut Self::State, action: Self::Action, ctx: &mut AppContext) {
        state.handle(action);
        show_notice(state, ctx);
    }

    fn tick(&mut self, state: &mut Self::State, _ctx: &mut AppContext) {
        state.tick();
    }

    fn render(&self, state: &Self::State, gfx: &mut dyn Renderer2d) {
        render_game(gfx, self.layout, state.core());
    }

    fn on_exit(&mut self, state: &Self::State) {
        debug!(
            "exiting after {} ticks, {} pieces, {} lines",
            state.ticks(),
            state.core().pieces_spawned(),
            state.core().lines_cleared()
        );
    }
}

fn show_notice(session: &mut GameSession<FileStore>, ctx: &mut AppContext) {
    if let Some(notice) = session.take_notice() {
        log_notice(&notice);
        ctx.window
            .set_title(&format!("{WINDOW_TITLE} - {}", notice.message()));
    }
}

fn log_notice(notice: &Notice) {
    match notice {
        Notice::SaveFailed(_) | Notice::LoadFailed(_) => warn!("{}", notice.message()),
        _ => info!("{}", notice.message()),
    }
}

fn resolve_save_path(cli: &Cli, settings: &GameSettings, settings_store: &SettingsStore) -> PathBuf {
    match cli.save_file.clone().or_else(|| settings.save_path.clone()) {
        Some(path) => path,
        None => FileStore::from_env(settings_store.dir()).path().to_path_buf(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings_store = cli
        .settings
        .clone()
        .map(SettingsStore::new)
        .unwrap_or_else(SettingsStore::from_env);
    let settings = settings_store.load();
    debug!("settings from {}", settings_store.path().display());

    let movement = if cli.unchecked_moves {
        MovementPolicy::Unchecked
    } else {
        settings.gameplay.movement
    };
    if movement == MovementPolicy::Unchecked {
        warn!("unchecked movement: pieces can be pushed through walls and settled cells");
    }

    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);
    info!("seed {seed}");
    let logic = TetrisLogic::new(seed).with_movement(movement);
    let save_path = resolve_save_path(&cli, &settings, &settings_store);
    let autoload = settings.gameplay.autoload && !cli.no_autoload;

    if let Some(ticks) = cli.headless_ticks {
        let mut session = GameSession::new(logic, FileStore::new(&save_path));
        session.start(autoload);
        if let Some(notice) = session.take_notice() {
            log_notice(&notice);
        }
        for _ in 0..ticks {
            session.tick();
        }
        print!("{}", session.core().to_ascii());
        return Ok(());
    }

    let layout = BoardLayout::new(settings.video.cell_size);
    let config = AppConfig {
        title: WINDOW_TITLE.to_string(),
        surface_size: layout.surface_size(),
        window_scale: settings.video.window_scale,
        tick_interval: settings.gameplay.tick_interval(),
        vsync: settings.video.vsync,
    };
    let app = BlockfallApp {
        logic,
        save_path,
        autoload,
        layout,
    };

    run_game(config, app)
        .map_err(|err| anyhow!("{err}"))
        .context("game window failed")
}
