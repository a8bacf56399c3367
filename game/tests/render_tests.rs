use engine::graphics::CpuRenderer;
use engine::surface::{RgbaBufferSurface, Surface};

use blockfall::render::{
    BoardLayout, COLOR_BACKGROUND, COLOR_HOLD_FRAME, COLOR_OUTLINE, color_for_cell, color_for_kind,
    render_game,
};
use blockfall::tetris_core::{ActivePiece, CELL_EMPTY, MovementPolicy, PieceKind, TetrisCore, Vec2i};

const CELL: u32 = 20;

fn render(core: &TetrisCore) -> RgbaBufferSurface {
    let layout = BoardLayout::new(CELL);
    let mut surface = RgbaBufferSurface::new(layout.surface_size());
    let size = surface.size();
    {
        let mut gfx = CpuRenderer::new(surface.frame_mut(), size);
        render_game(&mut gfx, layout, core);
    }
    surface
}

fn core_with_piece(kind: PieceKind, x: i32, y: i32) -> TetrisCore {
    let mut core = TetrisCore::new(1);
    core.initialize_game();
    core.set_piece(ActivePiece {
        kind,
        shape: kind.shape(),
        pos: Vec2i::new(x, y),
    });
    core
}

#[test]
fn surface_matches_the_grid() {
    let size = BoardLayout::new(CELL).surface_size();
    assert_eq!((size.width, size.height), (10 * CELL, 20 * CELL));
}

#[test]
fn every_kind_has_a_distinct_color() {
    let colors: Vec<_> = PieceKind::ALL.iter().map(|&k| color_for_kind(k)).collect();
    for (i, a) in colors.iter().enumerate() {
        assert_ne!(*a, COLOR_BACKGROUND);
        for b in &colors[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(color_for_cell(CELL_EMPTY), COLOR_BACKGROUND);
    assert_eq!(color_for_cell(PieceKind::L.cell()), color_for_kind(PieceKind::L));
}

#[test]
fn settled_cells_are_filled_and_outlined() {
    let mut core = core_with_piece(PieceKind::O, 4, 0);
    core.set_cell(0, 19, PieceKind::J.cell());
    let surface = render(&core);

    let top = 19 * CELL;
    assert_eq!(surface.pixel(CELL / 2, top + CELL / 2), Some(color_for_kind(PieceKind::J)));
    assert_eq!(surface.pixel(0, top), Some(COLOR_OUTLINE));
    assert_eq!(surface.pixel(CELL - 1, top + CELL - 1), Some(COLOR_OUTLINE));
    assert_eq!(surface.pixel(CELL + CELL / 2, top + CELL / 2), Some(COLOR_BACKGROUND));
}

#[test]
fn active_piece_is_drawn_in_its_color() {
    let core = core_with_piece(PieceKind::O, 4, 0);
    let surface = render(&core);

    let yellow = color_for_kind(PieceKind::O);
    assert_eq!(surface.pixel(4 * CELL + CELL / 2, CELL / 2), Some(yellow));
    assert_eq!(surface.pixel(5 * CELL + CELL / 2, CELL + CELL / 2), Some(yellow));
    assert_eq!(surface.pixel(6 * CELL + CELL / 2, CELL / 2), Some(COLOR_BACKGROUND));
}

#[test]
fn hold_preview_sits_in_the_top_left_corner() {
    let mut core = core_with_piece(PieceKind::I, 3, 10);
    assert!(core.hold_piece());
    core.set_piece(ActivePiece::spawn(PieceKind::O));
    let surface = render(&core);

    let half = CELL / 2;
    assert_eq!(surface.pixel(0, 0), Some(COLOR_HOLD_FRAME));
    assert_eq!(surface.pixel(4 * half + 1, 0), Some(COLOR_HOLD_FRAME));
    assert_eq!(surface.pixel(1 + half / 2, 1 + half / 2), Some(color_for_kind(PieceKind::I)));
    // Below the preview the board shows through.
    assert_eq!(surface.pixel(half, 3 * half), Some(COLOR_BACKGROUND));
}

#[test]
fn cells_outside_the_board_are_skipped() {
    let mut core = TetrisCore::new(1).with_movement(MovementPolicy::Unchecked);
    core.initialize_game();
    core.set_piece(ActivePiece {
        kind: PieceKind::I,
        shape: PieceKind::I.shape(),
        pos: Vec2i::new(-2, 5),
    });
    let surface = render(&core);

    let cyan = color_for_kind(PieceKind::I);
    let y = 5 * CELL + CELL / 2;
    assert_eq!(surface.pixel(CELL / 2, y), Some(cyan));
    assert_eq!(surface.pixel(CELL + CELL / 2, y), Some(cyan));
    assert_eq!(surface.pixel(2 * CELL + CELL / 2, y), Some(COLOR_BACKGROUND));
}
