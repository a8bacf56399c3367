use engine::GameLogic;

use crate::input::InputAction;
use crate::tetris_core::{MovementPolicy, TetrisCore};

/// The game rules as seen by `engine`: a seeded core, player inputs and timer ticks.
#[derive(Debug, Clone)]
pub struct TetrisLogic {
    seed: u64,
    movement: MovementPolicy,
}

impl TetrisLogic {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            movement: MovementPolicy::default(),
        }
    }

    pub fn with_movement(mut self, movement: MovementPolicy) -> Self {
        self.movement = movement;
        self
    }
}

impl GameLogic for TetrisLogic {
    type State = TetrisCore;
    type Input = InputAction;

    fn initial_state(&self) -> Self::State {
        let mut core = TetrisCore::new(self.seed).with_movement(self.movement);
        core.initialize_game();
        core
    }

    fn apply_input(&self, state: &mut Self::State, input: Self::Input) {
        match input {
            InputAction::MoveLeft => {
                state.move_piece(-1);
            }
            InputAction::MoveRight => {
                state.move_piece(1);
            }
            InputAction::Down => {
                state.tick();
            }
            InputAction::Rotate => {
                state.rotate_piece();
            }
            InputAction::Hold => {
                state.hold_piece();
            }
            // Save slots live outside the core; see `session::GameSession`.
            InputAction::Save | InputAction::Load => {}
        }
    }

    fn tick(&self, state: &mut Self::State) {
        state.tick();
    }
}
