use std::ops::Add;

use log::debug;
use serde::{Deserialize, Serialize};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;
pub const SPAWN_POS: Vec2i = Vec2i { x: 3, y: 0 };

pub const CELL_EMPTY: u8 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    L,
    J,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::L,
        PieceKind::J,
    ];

    /// Board cell value written when a piece of this kind is merged.
    pub const fn cell(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::S => 4,
            PieceKind::Z => 5,
            PieceKind::L => 6,
            PieceKind::J => 7,
        }
    }

    pub fn from_cell(cell: u8) -> Option<PieceKind> {
        Self::ALL.into_iter().find(|kind| kind.cell() == cell)
    }

    /// A fresh copy of the catalog shape. Callers own the result, so rotating it never touches
    /// the catalog.
    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            PieceKind::S => &[&[1, 1, 0], &[0, 1, 1]],
            PieceKind::Z => &[&[0, 1, 1], &[1, 1, 0]],
            PieceKind::L => &[&[1, 1, 1], &[1, 0, 0]],
            PieceKind::J => &[&[1, 1, 1], &[0, 0, 1]],
        };
        Shape::from_rows(rows.iter().map(|row| row.iter().map(|&c| c != 0).collect()).collect())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Self::Output {
        Vec2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// A small boolean matrix, row-major with the top row first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Non-empty and rectangular.
    pub fn is_well_formed(&self) -> bool {
        let width = self.width();
        width > 0 && self.rows.iter().all(|row| row.len() == width)
    }

    pub fn filled_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&c| c).count()
    }

    /// Offsets `(dx, dy)` of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(dx, _)| (dx as i32, dy as i32))
        })
    }

    /// Transpose, then reverse the row order (a quarter turn counter-clockwise).
    pub fn rotated(&self) -> Shape {
        let width = self.width();
        let mut rows: Vec<Vec<bool>> = (0..width)
            .map(|x| self.rows.iter().map(|row| row[x]).collect())
            .collect();
        rows.reverse();
        Shape { rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub shape: Shape,
    #[serde(flatten)]
    pub pos: Vec2i,
}

impl ActivePiece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            pos: SPAWN_POS,
        }
    }

    /// Board coordinates of every occupied cell.
    pub fn board_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .cells()
            .map(move |(dx, dy)| (self.pos.x + dx, self.pos.y + dy))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldPiece {
    pub kind: PieceKind,
    pub shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementPolicy {
    /// Horizontal moves and rotations are refused when they would leave the board or overlap.
    #[default]
    Validated,
    /// Input is applied blindly; only the next gravity step notices an invalid position.
    Unchecked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<u8>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![CELL_EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Accepts only a `BOARD_HEIGHT` x `BOARD_WIDTH` grid of known cell values.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Option<Self> {
        let valid = rows.len() == BOARD_HEIGHT
            && rows.iter().all(|row| {
                row.len() == BOARD_WIDTH
                    && row
                        .iter()
                        .all(|&c| c == CELL_EMPTY || PieceKind::from_cell(c).is_some())
            });
        valid.then_some(Self { rows })
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows.get(y as usize)?.get(x as usize).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if y < self.rows.len() && x < BOARD_WIDTH {
            self.rows[y][x] = value;
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|&c| c != CELL_EMPTY))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(|&c| c == CELL_EMPTY)
    }

    /// True when any occupied cell of `piece` is outside the board or over a settled cell.
    pub fn collides(&self, piece: &ActivePiece) -> bool {
        piece
            .board_cells()
            .any(|(x, y)| self.cell(x, y) != Some(CELL_EMPTY))
    }

    /// True when the piece's whole shape box lies on the board. Safe for any position.
    pub fn contains_piece(&self, piece: &ActivePiece) -> bool {
        let Vec2i { x, y } = piece.pos;
        x >= 0
            && y >= 0
            && (x as usize).saturating_add(piece.shape.width()) <= BOARD_WIDTH
            && (y as usize).saturating_add(piece.shape.height()) <= self.rows.len()
    }

    /// Writes the piece's color into every occupied cell it covers. Cells outside the board are
    /// dropped; returns how many were.
    pub fn merge(&mut self, piece: &ActivePiece) -> usize {
        let value = piece.kind.cell();
        let mut dropped = 0;
        for (x, y) in piece.board_cells() {
            if x < 0 || y < 0 || x as usize >= BOARD_WIDTH || y as usize >= self.rows.len() {
                dropped += 1;
                continue;
            }
            self.rows[y as usize][x as usize] = value;
        }
        dropped
    }

    /// Removes full rows and pads the top with empty rows. Returns the number removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().any(|&c| c == CELL_EMPTY));
        let cleared = before - self.rows.len();
        for _ in 0..cleared {
            self.rows.insert(0, vec![CELL_EMPTY; BOARD_WIDTH]);
        }
        cleared
    }
}

/// The four values a save slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TetrisSnapshot {
    pub board: Board,
    pub piece: ActivePiece,
    pub held: Option<HeldPiece>,
    pub can_hold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityStep {
    Moved,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub step: GravityStep,
    pub lines_cleared: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TetrisCore {
    board: Board,
    piece: ActivePiece,
    held: Option<HeldPiece>,
    can_hold: bool,
    movement: MovementPolicy,
    rng: Rng,
    pieces_spawned: u64,
    lines_cleared: u64,
}

impl TetrisCore {
    pub fn new(seed: u64) -> Self {
        Self {
            board: Board::new(),
            piece: ActivePiece::spawn(PieceKind::I),
            held: None,
            can_hold: true,
            movement: MovementPolicy::default(),
            rng: Rng::new(seed),
            pieces_spawned: 0,
            lines_cleared: 0,
        }
    }

    pub fn with_movement(mut self, movement: MovementPolicy) -> Self {
        self.movement = movement;
        self
    }

    /// Empty board, empty hold, fresh random piece.
    pub fn initialize_game(&mut self) {
        self.board = Board::new();
        self.held = None;
        self.pieces_spawned = 0;
        self.lines_cleared = 0;
        self.spawn_new_piece();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn held_piece(&self) -> Option<&HeldPiece> {
        self.held.as_ref()
    }

    pub fn can_hold(&self) -> bool {
        self.can_hold
    }

    pub fn movement(&self) -> MovementPolicy {
        self.movement
    }

    pub fn pieces_spawned(&self) -> u64 {
        self.pieces_spawned
    }

    pub fn lines_cleared(&self) -> u64 {
        self.lines_cleared
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: u8) {
        self.board.set(x, y, value);
    }

    pub fn set_piece(&mut self, piece: ActivePiece) {
        self.piece = piece;
    }

    pub fn draw_kind(&mut self) -> PieceKind {
        let idx = self.rng.next_u32() as usize % PieceKind::ALL.len();
        PieceKind::ALL[idx]
    }

    pub fn spawn_new_piece(&mut self) {
        let kind = self.draw_kind();
        self.piece = ActivePiece::spawn(kind);
        self.can_hold = true;
        self.pieces_spawned = self.pieces_spawned.saturating_add(1);
        debug!("spawned {kind:?} (#{})", self.pieces_spawned);
    }

    pub fn is_valid_position(&self, piece: &ActivePiece) -> bool {
        !self.board.collides(piece)
    }

    /// One row of gravity. A blocked piece is merged where it stands and replaced.
    pub fn step_gravity(&mut self) -> GravityStep {
        self.piece.pos.y += 1;
        if !self.board.collides(&self.piece) {
            return GravityStep::Moved;
        }

        self.piece.pos.y -= 1;
        let dropped = self.board.merge(&self.piece);
        if dropped > 0 {
            debug!(
                "{dropped} cell(s) of {:?} were outside the board when it locked",
                self.piece.kind
            );
        }
        debug!("locked {:?} at {:?}", self.piece.kind, self.piece.pos);
        self.spawn_new_piece();
        GravityStep::Locked
    }

    pub fn clear_lines(&mut self) -> usize {
        let cleared = self.board.clear_full_rows();
        if cleared > 0 {
            self.lines_cleared = self.lines_cleared.saturating_add(cleared as u64);
            debug!("cleared {cleared} row(s)");
        }
        cleared
    }

    pub fn tick(&mut self) -> TickOutcome {
        let step = self.step_gravity();
        let lines_cleared = self.clear_lines();
        TickOutcome {
            step,
            lines_cleared,
        }
    }

    /// Horizontal move by `dx` columns. Returns whether the piece moved.
    pub fn move_piece(&mut self, dx: i32) -> bool {
        let mut moved = self.piece.clone();
        moved.pos = moved.pos + Vec2i::new(dx, 0);
        self.try_replace_piece(moved)
    }

    pub fn rotate_piece(&mut self) -> bool {
        let mut rotated = self.piece.clone();
        rotated.shape = rotated.shape.rotated();
        self.try_replace_piece(rotated)
    }

    fn try_replace_piece(&mut self, candidate: ActivePiece) -> bool {
        if self.movement == MovementPolicy::Validated && self.board.collides(&candidate) {
            return false;
        }
        self.piece = candidate;
        true
    }

    pub fn hold_piece(&mut self) -> bool {
        if !self.can_hold {
            return false;
        }

        let current = HeldPiece {
            kind: self.piece.kind,
            shape: self.piece.shape.clone(),
        };
        match self.held.replace(current) {
            Some(held) => {
                self.piece = ActivePiece {
                    kind: held.kind,
                    shape: held.shape,
                    pos: SPAWN_POS,
                };
            }
            None => self.spawn_new_piece(),
        }

        self.can_hold = false;
        true
    }

    /// Board with the active piece painted over it, clipped to the grid.
    pub fn board_with_active_piece(&self) -> Board {
        let mut board = self.board.clone();
        board.merge(&self.piece);
        board
    }

    pub fn snapshot(&self) -> TetrisSnapshot {
        TetrisSnapshot {
            board: self.board.clone(),
            piece: self.piece.clone(),
            held: self.held.clone(),
            can_hold: self.can_hold,
        }
    }

    pub fn restore(&mut self, snapshot: TetrisSnapshot) {
        self.board = snapshot.board;
        self.piece = snapshot.piece;
        self.held = snapshot.held;
        self.can_hold = snapshot.can_hold;
    }

    /// Text rendering of the board, `#` for settled cells and `@` for the active piece.
    pub fn to_ascii(&self) -> String {
        let with_piece = self.board_with_active_piece();
        let mut out = String::with_capacity((BOARD_WIDTH + 1) * BOARD_HEIGHT);
        for (y, row) in with_piece.rows().iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                let ch = if cell == CELL_EMPTY {
                    '.'
                } else if self.board.cell(x as i32, y as i32) == Some(CELL_EMPTY) {
                    '@'
                } else {
                    '#'
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }
}
