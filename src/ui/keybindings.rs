use crate::app::{AppState, Focus};
use crate::ui::styles::hint_style;
use ratatui::{layout::Rect, text::{Line, Span}, widgets::Paragraph, Frame};

/// Render the keybindings hint bar
pub fn render_keybindings(f: &mut Frame, app: &AppState, area: Rect) {
    let hints = if app.gestures.editing_id().is_some() {
        Line::from(vec![
            Span::raw(" Enter save   "),
            Span::raw("Esc cancel   "),
            Span::raw("Backspace on empty deletes"),
        ])
    } else if app.focus == Focus::Composer {
        Line::from(vec![
            Span::raw(" Enter add   "),
            Span::raw("Esc/Tab back to list"),
        ])
    } else {
        let mut spans = vec![
            Span::raw(" ↑/↓ select   "),
            Span::raw("Shift+↑/↓ reorder   "),
            Span::raw("Space done   "),
            Span::raw("e edit   "),
            Span::raw("d delete   "),
            Span::raw("a add   "),
            Span::raw("swipe/drag sideways delete   "),
        ];
        if app.store.can_undo() {
            spans.push(Span::raw(format!("u undo ({})   ", app.store.undo_len())));
        }
        spans.push(Span::raw("q quit"));
        Line::from(spans)
    };

    let paragraph = Paragraph::new(hints).style(hint_style());
    f.render_widget(paragraph, area);
}
