use crate::app::{AppState, HitRow};
use crate::ui::list_pane::render_rows;
use ratatui::{layout::Rect, Frame};

/// Render the completed tasks pane, most recently finished first
pub fn render_done_pane(f: &mut Frame, app: &AppState, area: Rect) -> Vec<HitRow> {
    let views = app.store.views();
    let selected = app
        .selected_index
        .checked_sub(views.active.len())
        .filter(|i| *i < views.completed.len());

    let title = format!(" Done ({}) ", views.completed.len());
    render_rows(f, app, area, &views.completed, selected, title)
}
