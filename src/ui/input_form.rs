use crate::app::{AppState, Focus};
use crate::ui::styles::{border_style, focused_border_style, hint_style, modal_title_style, title_style};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the new-task field
pub fn render_input_form(f: &mut Frame, app: &AppState, area: Rect) {
    let focused = app.focus == Focus::Composer && app.gestures.editing_id().is_none();
    let text = app.gestures.composer();

    let line = if text.is_empty() && !focused {
        Line::from(Span::styled("Press a to add a task", hint_style()))
    } else {
        Line::from(vec![
            Span::raw("> "),
            Span::styled(text.to_string(), modal_title_style()),
            if focused {
                Span::styled("█", modal_title_style()) // Cursor
            } else {
                Span::raw("")
            },
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            focused_border_style()
        } else {
            border_style()
        })
        .title(Span::styled(" New task ", title_style()));

    f.render_widget(Paragraph::new(line).block(block), area);
}
