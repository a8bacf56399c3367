use engine::graphics::{BLACK, Color, Rect, Renderer2d};
use engine::surface::SurfaceSize;

use crate::tetris_core::{ActivePiece, BOARD_HEIGHT, BOARD_WIDTH, Board, CELL_EMPTY, HeldPiece, PieceKind, Shape, TetrisCore};

pub const COLOR_BACKGROUND: Color = [0, 0, 0, 255];
pub const COLOR_OUTLINE: Color = BLACK;
pub const COLOR_HOLD_FRAME: Color = [90, 90, 90, 255];

const COLOR_CYAN: Color = [0, 255, 255, 255];
const COLOR_YELLOW: Color = [255, 255, 0, 255];
const COLOR_PURPLE: Color = [128, 0, 128, 255];
const COLOR_GREEN: Color = [0, 128, 0, 255];
const COLOR_RED: Color = [255, 0, 0, 255];
const COLOR_ORANGE: Color = [255, 165, 0, 255];
const COLOR_BLUE: Color = [0, 0, 255, 255];

pub fn color_for_kind(kind: PieceKind) -> Color {
    match kind {
        PieceKind::I => COLOR_CYAN,
        PieceKind::O => COLOR_YELLOW,
        PieceKind::T => COLOR_PURPLE,
        PieceKind::S => COLOR_GREEN,
        PieceKind::Z => COLOR_RED,
        PieceKind::L => COLOR_ORANGE,
        PieceKind::J => COLOR_BLUE,
    }
}

pub fn color_for_cell(cell: u8) -> Color {
    PieceKind::from_cell(cell).map_or(COLOR_BACKGROUND, color_for_kind)
}

/// Pixel geometry of the playfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub cell_size: u32,
}

impl BoardLayout {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(2),
        }
    }

    pub fn surface_size(&self) -> SurfaceSize {
        SurfaceSize::for_grid(BOARD_WIDTH as u32, BOARD_HEIGHT as u32, self.cell_size)
    }

    pub fn cell_rect(&self, x: i32, y: i32) -> Option<Rect> {
        if x < 0 || y < 0 || x as usize >= BOARD_WIDTH || y as usize >= BOARD_HEIGHT {
            return None;
        }
        let cs = self.cell_size;
        Some(Rect::new(x as u32 * cs, y as u32 * cs, cs, cs))
    }

    pub fn hold_cell_size(&self) -> u32 {
        (self.cell_size / 2).max(1)
    }
}

fn draw_cell(gfx: &mut dyn Renderer2d, rect: Rect, color: Color) {
    gfx.fill_rect(rect, color);
    gfx.stroke_rect(rect, COLOR_OUTLINE);
}

pub fn draw_board(gfx: &mut dyn Renderer2d, layout: BoardLayout, board: &Board) {
    for (y, row) in board.rows().iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell == CELL_EMPTY {
                continue;
            }
            if let Some(rect) = layout.cell_rect(x as i32, y as i32) {
                draw_cell(gfx, rect, color_for_cell(cell));
            }
        }
    }
}

pub fn draw_piece(gfx: &mut dyn Renderer2d, layout: BoardLayout, piece: &ActivePiece) {
    let color = color_for_kind(piece.kind);
    for (x, y) in piece.board_cells() {
        // Unchecked movement can push cells off the board until the next gravity step.
        if let Some(rect) = layout.cell_rect(x, y) {
            draw_cell(gfx, rect, color);
        }
    }
}

/// Paints the held piece at half cell size in the top-left corner.
pub fn draw_hold_preview(gfx: &mut dyn Renderer2d, layout: BoardLayout, held: &HeldPiece) {
    let cs = layout.hold_cell_size();
    let frame = hold_preview_rect(cs, &held.shape);
    gfx.stroke_rect(frame, COLOR_HOLD_FRAME);

    let color = color_for_kind(held.kind);
    for (dx, dy) in held.shape.cells() {
        let rect = Rect::new(
            frame.x + 1 + dx as u32 * cs,
            frame.y + 1 + dy as u32 * cs,
            cs,
            cs,
        );
        draw_cell(gfx, rect, color);
    }
}

fn hold_preview_rect(cs: u32, shape: &Shape) -> Rect {
    Rect::new(
        0,
        0,
        shape.width() as u32 * cs + 2,
        shape.height() as u32 * cs + 2,
    )
}

/// Full frame: clear, settled cells, falling piece, hold preview.
pub fn render_game(gfx: &mut dyn Renderer2d, layout: BoardLayout, core: &TetrisCore) {
    gfx.clear(COLOR_BACKGROUND);
    draw_board(gfx, layout, core.board());
    draw_piece(gfx, layout, core.piece());
    if let Some(held) = core.held_piece() {
        draw_hold_preview(gfx, layout, held);
    }
}
