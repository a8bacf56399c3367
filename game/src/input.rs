use winit::event::VirtualKeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    MoveLeft,
    MoveRight,
    /// Forces one gravity step.
    Down,
    Rotate,
    Hold,
    Save,
    Load,
}

pub fn map_key_to_action(key: VirtualKeyCode) -> Option<InputAction> {
    match key {
        VirtualKeyCode::Left => Some(InputAction::MoveLeft),
        VirtualKeyCode::Right => Some(InputAction::MoveRight),
        VirtualKeyCode::Down => Some(InputAction::Down),
        VirtualKeyCode::Up => Some(InputAction::Rotate),
        VirtualKeyCode::Space | VirtualKeyCode::C => Some(InputAction::Hold),
        VirtualKeyCode::F5 => Some(InputAction::Save),
        VirtualKeyCode::F9 => Some(InputAction::Load),
        _ => None,
    }
}
