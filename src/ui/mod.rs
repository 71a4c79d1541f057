pub mod done_pane;
pub mod input_form;
pub mod keybindings;
pub mod layout;
pub mod list_pane;
pub mod modal;
pub mod styles;

use crate::app::{AppState, Screen};
use done_pane::render_done_pane;
use input_form::render_input_form;
use keybindings::render_keybindings;
use layout::create_layout;
use list_pane::render_list_pane;
use modal::{render_load_failed, render_signed_out};
use ratatui::Frame;

/// Main render function - draws the entire UI and records row positions
/// for mouse hit-testing
pub fn render(f: &mut Frame, app: &mut AppState) {
    let size = f.size();

    match &app.screen {
        Screen::SignedOut => {
            render_signed_out(f, size);
            return;
        }
        Screen::LoadFailed(message) => {
            render_load_failed(f, message, size);
            return;
        }
        Screen::Ready => {}
    }

    let layout = create_layout(size);

    render_keybindings(f, app, layout.keybindings_area);
    render_input_form(f, app, layout.composer_area);

    let mut rows = render_list_pane(f, app, layout.active_area);
    rows.extend(render_done_pane(f, app, layout.completed_area));

    app.hit_rows = rows;
    app.composer_area = Some(layout.composer_area);
}
