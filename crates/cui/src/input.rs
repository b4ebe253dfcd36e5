use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    None,
    Quit,
    ToggleHelp,
    Close,
    MoveUp,
    MoveDown,
    Draw,
    DrawAgain,
    PickCursor,
    PickSlot(usize),
}

pub fn map_key(key: KeyEvent) -> InputAction {
    match key.code {
        KeyCode::Esc => InputAction::Close,
        KeyCode::Up | KeyCode::Char('k') => InputAction::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => InputAction::MoveDown,
        KeyCode::Enter | KeyCode::Char(' ') => InputAction::PickCursor,
        KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Char('?') => InputAction::ToggleHelp,
        KeyCode::Char('d') => InputAction::Draw,
        KeyCode::Char('a') => InputAction::DrawAgain,
        KeyCode::Char(digit @ '1'..='9') => {
            InputAction::PickSlot(digit as usize - '1' as usize)
        }
        _ => InputAction::None,
    }
}
