use crate::app::{AppState, Focus, HitRow};
use crate::domain::Task;
use crate::input::ItemMode;
use crate::ui::styles::{
    border_style, default_style, done_style, done_title_style, focused_border_style, reorder_style,
    selected_style, selection_style, swipe_armed_style, swipe_style, title_style,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Terminal columns of swipe trail drawn for an offset
pub(crate) fn trail_width(offset: f32, column_units: f32) -> usize {
    if column_units <= 0.0 {
        return 0;
    }
    (offset.abs() / column_units).round() as usize
}

/// One task row: swipe trail, marker, then the title or its editor
pub(crate) fn task_line(task: &Task, app: &AppState) -> Line<'static> {
    let mut spans = Vec::new();

    let offset = app.gestures.offset(task.id);
    let trail = trail_width(offset, app.column_units);
    let trail_style = if app.gestures.past_threshold(task.id) {
        swipe_armed_style()
    } else {
        swipe_style()
    };

    if offset > 0.0 && trail > 0 {
        spans.push(Span::styled(format!("{} ", "»".repeat(trail)), trail_style));
    }

    if task.is_completed {
        spans.push(Span::styled("✓ ", done_style()));
    } else {
        spans.push(Span::styled("○ ", default_style()));
    }

    match app.gestures.mode(task.id) {
        ItemMode::Editing { draft, select_all: true } => {
            spans.push(Span::styled(draft, selection_style()));
        }
        ItemMode::Editing { draft, .. } => {
            spans.push(Span::raw(draft));
            spans.push(Span::styled("█", default_style()));
        }
        _ => {
            let style = if task.is_completed {
                done_title_style()
            } else {
                default_style()
            };
            spans.push(Span::styled(task.title.clone(), style));
        }
    }

    if offset < 0.0 && trail > 0 {
        spans.push(Span::styled(format!(" {}", "«".repeat(trail)), trail_style));
    }

    if app.gestures.reordering_id() == Some(task.id) {
        spans.push(Span::styled("  ↕", reorder_style()));
    }

    Line::from(spans)
}

/// Draw `tasks` in a bordered list and report where each visible row landed
pub(crate) fn render_rows(
    f: &mut Frame,
    app: &AppState,
    area: Rect,
    tasks: &[&Task],
    selected: Option<usize>,
    title: String,
) -> Vec<HitRow> {
    let items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let style = if Some(idx) == selected {
                selected_style()
            } else {
                default_style()
            };
            ListItem::new(task_line(task, app)).style(style)
        })
        .collect();

    let border = if app.focus == Focus::List {
        focused_border_style()
    } else {
        border_style()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, title_style()));
    let inner = block.inner(area);

    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(List::new(items).block(block), area, &mut state);

    visible_rows(tasks, inner, state.offset())
}

fn visible_rows(tasks: &[&Task], inner: Rect, offset: usize) -> Vec<HitRow> {
    tasks
        .iter()
        .skip(offset)
        .take(inner.height as usize)
        .enumerate()
        .map(|(line, task)| HitRow {
            id: task.id,
            area: Rect::new(inner.x, inner.y + line as u16, inner.width, 1),
            active: task.is_active(),
        })
        .collect()
}

/// Render the active task list, following the reorder preview while a row is held
pub fn render_list_pane(f: &mut Frame, app: &AppState, area: Rect) -> Vec<HitRow> {
    let views = app.store.views();

    let (tasks, selected) = match app.gestures.reorder_preview() {
        Some(preview) => {
            let tasks: Vec<&Task> = preview
                .iter()
                .filter_map(|id| app.store.get(*id))
                .filter(|t| t.is_active())
                .collect();
            let held = app.gestures.reordering_id();
            let selected = tasks.iter().position(|t| Some(t.id) == held);
            (tasks, selected)
        }
        None => {
            let selected = (app.selected_index < views.active.len()).then_some(app.selected_index);
            (views.active.clone(), selected)
        }
    };

    let title = match &app.user {
        Some(user) => format!(" To do ({}) · {} ", tasks.len(), user.email),
        None => format!(" To do ({}) ", tasks.len()),
    };

    render_rows(f, app, area, &tasks, selected, title)
}
