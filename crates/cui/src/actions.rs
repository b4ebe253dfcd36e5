use crate::app::App;
use crate::input::InputAction;
use jigong_core::{Clock, KeyValueStore};

pub fn dispatch<S: KeyValueStore, C: Clock>(app: &mut App<S, C>, action: InputAction) {
    match action {
        InputAction::None => {}
        InputAction::Quit => app.should_quit = true,
        InputAction::ToggleHelp => app.show_help = !app.show_help,
        InputAction::Close => app.close_overlay(),
        InputAction::MoveUp => app.move_cursor(false),
        InputAction::MoveDown => app.move_cursor(true),
        InputAction::Draw => app.draw(),
        InputAction::DrawAgain => app.draw_again(),
        InputAction::PickCursor => app.pick_cursor(),
        InputAction::PickSlot(slot) => app.pick(slot),
    }
}
