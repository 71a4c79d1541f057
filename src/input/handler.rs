use crate::app::{AppState, Focus, HitRow};
use crate::input::gesture::{Intent, Key};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::Instant;
use uuid::Uuid;

/// Direction a held pointer has committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Left button held over a task row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerPress {
    pub id: Uuid,
    pub origin: (u16, u16),
    pub last_column: u16,
    pub axis: Option<Axis>,
    pub meta: bool,
}

/// Ctrl, Alt, Super and Meta all count as the "meta" click modifier
pub fn is_meta(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(
        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META,
    )
}

fn text_key(key: KeyEvent) -> Option<Key> {
    match key.code {
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Char(c)),
        _ => None,
    }
}

/// Handle keyboard input events. Returns true when the app should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    if !app.is_ready() {
        return Ok(matches!(key.code, KeyCode::Char('q') | KeyCode::Esc));
    }

    if key.code == KeyCode::Esc && app.press.is_some() {
        app.cancel_press();
        return Ok(false);
    }

    if let Some(id) = app.gestures.editing_id() {
        handle_editing(app, id, key);
        return Ok(false);
    }

    match app.focus {
        Focus::Composer => {
            handle_composer(app, key);
            Ok(false)
        }
        Focus::List => Ok(handle_list(app, key)),
    }
}

/// Keys while a row's title is being edited in place
fn handle_editing(app: &mut AppState, id: Uuid, key: KeyEvent) {
    match key.code {
        KeyCode::Tab => app.blur_editing_except(None),
        KeyCode::Up | KeyCode::Down => {
            app.blur_editing_except(None);
            if key.code == KeyCode::Up {
                app.move_selection_up();
            } else {
                app.move_selection_down();
            }
        }
        _ => {
            if let Some(intent) = text_key(key).and_then(|k| app.gestures.on_item_key(id, k)) {
                app.dispatch(intent);
            }
        }
    }
}

/// Keys while the new-task field has focus
fn handle_composer(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Tab | KeyCode::Down => app.focus = Focus::List,
        _ => {
            if let Some(intent) = text_key(key).and_then(|k| app.gestures.on_composer_key(k)) {
                app.dispatch(intent);
            }
        }
    }
}

fn handle_list(app: &mut AppState, key: KeyEvent) -> bool {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    match key.code {
        KeyCode::Up if shift => app.shift_selected(-1),
        KeyCode::Down if shift => app.shift_selected(1),
        KeyCode::Up => app.move_selection_up(),
        KeyCode::Down => app.move_selection_down(),

        KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dispatch(Intent::Undo)
        }
        KeyCode::Char('u') | KeyCode::Char('U') => app.dispatch(Intent::Undo),

        KeyCode::Char(' ') => {
            if let Some(id) = app.selected_id() {
                app.dispatch(Intent::ToggleComplete { id });
            }
        }
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Delete => {
            if let Some(id) = app.selected_id() {
                app.dispatch(Intent::Delete { id });
            }
        }
        KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
            if let Some(id) = app.selected_id() {
                app.edit(id);
            }
        }

        KeyCode::Char('a') | KeyCode::Char('i') | KeyCode::Tab => app.focus_composer(),

        KeyCode::Char('q') | KeyCode::Char('Q') => return true,

        _ => {}
    }
    false
}

/// Handle mouse and trackpad events
pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent, now: Instant) {
    if !app.is_ready() {
        return;
    }

    let (column, row) = (mouse.column, mouse.row);
    let step = app.wheel_step;

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => press(app, column, row, is_meta(mouse.modifiers)),
        MouseEventKind::Drag(MouseButton::Left) => drag(app, column, row),
        MouseEventKind::Up(MouseButton::Left) => release(app),
        MouseEventKind::ScrollLeft => wheel(app, column, row, -step, 0.0, now),
        MouseEventKind::ScrollRight => wheel(app, column, row, step, 0.0, now),
        MouseEventKind::ScrollUp => wheel(app, column, row, 0.0, -step, now),
        MouseEventKind::ScrollDown => wheel(app, column, row, 0.0, step, now),
        _ => {}
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

fn press(app: &mut AppState, column: u16, row: u16, meta: bool) {
    let Some(hit) = app.hit_test(column, row) else {
        app.press = None;
        if app.composer_area.is_some_and(|area| contains(area, column, row)) {
            app.focus_composer();
        } else {
            app.blur_editing_except(None);
        }
        return;
    };

    app.press = Some(PointerPress {
        id: hit.id,
        origin: (column, row),
        last_column: column,
        axis: None,
        meta,
    });
}

fn drag(app: &mut AppState, column: u16, row: u16) {
    let Some(mut press) = app.press else {
        return;
    };

    if press.axis.is_none() {
        let dx = column.abs_diff(press.origin.0);
        let dy = row.abs_diff(press.origin.1);
        if dx == 0 && dy == 0 {
            return;
        }
        if dx >= dy {
            press.axis = Some(Axis::Horizontal);
            app.gestures.on_drag_start(press.id);
        } else {
            press.axis = Some(Axis::Vertical);
            let order = app.store.views().active_ids();
            app.gestures.begin_reorder(press.id, order);
        }
    }

    match press.axis {
        Some(Axis::Horizontal) => {
            let columns = f32::from(column) - f32::from(press.last_column);
            app.gestures.on_drag_move(press.id, columns * app.column_units);
            press.last_column = column;
        }
        Some(Axis::Vertical) => {
            if let Some(index) = reorder_index(app, row) {
                app.gestures.move_reorder(index);
            }
        }
        None => {}
    }
    app.press = Some(press);
}

/// Preview position under the pointer, clamped to the visible active rows
fn reorder_index(app: &AppState, row: u16) -> Option<usize> {
    let preview = app.gestures.reorder_preview()?;
    let active: Vec<&HitRow> = app.hit_rows.iter().filter(|h| h.active).collect();

    let target = active.iter().find(|h| h.area.y == row).or_else(|| {
        if row < active.first()?.area.y {
            active.first()
        } else {
            active.last()
        }
    })?;
    preview.iter().position(|id| *id == target.id)
}

fn release(app: &mut AppState) {
    let Some(press) = app.press.take() else {
        return;
    };

    match press.axis {
        None => click(app, press.id, press.meta),
        Some(Axis::Horizontal) => {
            if let Some(intent) = app.gestures.on_drag_end(press.id) {
                app.dispatch(intent);
            }
        }
        Some(Axis::Vertical) => {
            if let Some(intent) = app.gestures.end_reorder() {
                app.dispatch(intent);
                app.select(press.id);
            }
        }
    }
}

fn click(app: &mut AppState, id: Uuid, meta: bool) {
    let Some(title) = app.store.get(id).map(|t| t.title.clone()) else {
        return;
    };

    app.blur_editing_except(Some(id));
    app.focus = Focus::List;
    app.select(id);
    if let Some(intent) = app.gestures.on_click(id, &title, meta) {
        app.dispatch(intent);
    }
}

fn wheel(app: &mut AppState, column: u16, row: u16, dx: f32, dy: f32, now: Instant) {
    if let Some(hit) = app.hit_test(column, row) {
        app.gestures.on_wheel(hit.id, dx, dy, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{ready_app, task};
    use crate::config::Config;
    use crate::input::ItemMode;
    use crate::sync::{MemorySync, User};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        }
    }

    fn type_keys(app: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    /// Lay rows out one per line from y = 2, active first
    fn place_rows(app: &mut AppState) {
        let views = app.store.views();
        let rows: Vec<HitRow> = views
            .rows()
            .enumerate()
            .map(|(i, t)| HitRow {
                id: t.id,
                area: Rect::new(1, 2 + i as u16, 40, 1),
                active: t.is_active(),
            })
            .collect();
        app.hit_rows = rows;
    }

    fn active_titles(app: &AppState) -> Vec<String> {
        app.store
            .views()
            .active
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    #[test]
    fn test_handle_quit() {
        let (mut app, _) = ready_app(Vec::new());
        assert!(handle_key(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert!(handle_key(&mut app, key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap());
    }

    #[test]
    fn test_signed_out_only_quits() {
        let mut app = AppState::new(Box::new(MemorySync::signed_out()), &Config::default());

        assert!(!handle_key(&mut app, key(KeyCode::Char('a'))).unwrap());
        assert!(handle_key(&mut app, key(KeyCode::Esc)).unwrap());
    }

    #[test]
    fn test_handle_add_task() {
        let (mut app, _) = ready_app(Vec::new());

        handle_key(&mut app, key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.focus, Focus::Composer);

        // 'q' is text here, not quit
        type_keys(&mut app, "Buy quinoa");
        assert!(!handle_key(&mut app, key(KeyCode::Enter)).unwrap());

        assert_eq!(active_titles(&app), vec!["Buy quinoa"]);
        assert_eq!(app.gestures.composer(), "");
        assert_eq!(app.focus, Focus::Composer);
    }

    #[test]
    fn test_handle_navigation() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);

        handle_key(&mut app, key(KeyCode::Down)).unwrap();
        assert_eq!(app.selected_index, 1);
        handle_key(&mut app, key(KeyCode::Down)).unwrap();
        assert_eq!(app.selected_index, 1);
        handle_key(&mut app, key(KeyCode::Up)).unwrap();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_space_toggles_and_u_undoes() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);

        handle_key(&mut app, key(KeyCode::Char(' '))).unwrap();
        assert_eq!(active_titles(&app), vec!["B"]);

        handle_key(&mut app, key(KeyCode::Char('u'))).unwrap();
        assert_eq!(active_titles(&app), vec!["A", "B"]);
    }

    #[test]
    fn test_delete_and_ctrl_z() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);

        handle_key(&mut app, key(KeyCode::Delete)).unwrap();
        assert_eq!(active_titles(&app), vec!["B"]);

        handle_key(&mut app, key_with(KeyCode::Char('z'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(active_titles(&app), vec!["A", "B"]);
    }

    #[test]
    fn test_keyboard_rename() {
        let (mut app, _) = ready_app(vec![task("Old", 0)]);

        handle_key(&mut app, key(KeyCode::Char('e'))).unwrap();
        type_keys(&mut app, "New title");
        handle_key(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(active_titles(&app), vec!["New title"]);
        assert_eq!(app.gestures.editing_id(), None);
    }

    #[test]
    fn test_escape_cancels_rename() {
        let (mut app, _) = ready_app(vec![task("Keep", 0)]);

        handle_key(&mut app, key(KeyCode::Enter)).unwrap();
        type_keys(&mut app, "Nope");
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();

        assert_eq!(active_titles(&app), vec!["Keep"]);
    }

    #[test]
    fn test_shift_down_reorders() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);

        handle_key(&mut app, key_with(KeyCode::Down, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(active_titles(&app), vec!["B", "A"]);
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_click_then_type_replaces_title() {
        let (mut app, _) = ready_app(vec![task("Old", 0)]);
        place_rows(&mut app);
        let id = app.hit_rows[0].id;

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 2), Instant::now());
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2), Instant::now());
        assert_eq!(app.gestures.editing_id(), Some(id));

        type_keys(&mut app, "Fresh");
        // clicking empty space blurs and commits
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 20), Instant::now());

        assert_eq!(active_titles(&app), vec!["Fresh"]);
    }

    #[test]
    fn test_meta_click_toggles() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);
        place_rows(&mut app);

        let mut down = mouse(MouseEventKind::Down(MouseButton::Left), 5, 2);
        down.modifiers = KeyModifiers::ALT;
        handle_mouse(&mut app, down, Instant::now());
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2), Instant::now());

        assert_eq!(active_titles(&app), vec!["B"]);
        assert_eq!(app.gestures.editing_id(), None);
    }

    #[test]
    fn test_horizontal_drag_deletes() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);
        place_rows(&mut app);
        let now = Instant::now();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 10, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 20, 2), now);
        assert_eq!(app.gestures.offset(app.hit_rows[0].id), 180.0);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 20, 2), now);

        assert_eq!(active_titles(&app), vec!["B"]);
    }

    #[test]
    fn test_short_drag_does_not_edit_or_delete() {
        let (mut app, _) = ready_app(vec![task("A", 0)]);
        place_rows(&mut app);
        let id = app.hit_rows[0].id;
        let now = Instant::now();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 10, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 5, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2), now);

        assert_eq!(active_titles(&app), vec!["A"]);
        assert_eq!(app.gestures.mode(id), ItemMode::Idle);
    }

    #[test]
    fn test_vertical_drag_reorders() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1), task("C", 2)]);
        place_rows(&mut app);
        let now = Instant::now();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 4), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 5, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2), now);

        assert_eq!(active_titles(&app), vec!["C", "A", "B"]);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_escape_drops_held_row() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1), task("C", 2)]);
        place_rows(&mut app);
        let now = Instant::now();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 4), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 5, 2), now);
        assert!(!handle_key(&mut app, key(KeyCode::Esc)).unwrap());
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 2), now);

        assert_eq!(active_titles(&app), vec!["A", "B", "C"]);
        assert_eq!(app.gestures.reordering_id(), None);
    }

    #[test]
    fn test_escape_snaps_back_sideways_drag() {
        let (mut app, _) = ready_app(vec![task("A", 0)]);
        place_rows(&mut app);
        let id = app.hit_rows[0].id;
        let now = Instant::now();

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 2, 2), now);
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 30, 2), now);
        handle_key(&mut app, key(KeyCode::Esc)).unwrap();
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 30, 2), now);

        assert_eq!(active_titles(&app), vec!["A"]);
        assert_eq!(app.gestures.mode(id), ItemMode::Idle);
        assert_eq!(app.gestures.offset(id), 0.0);
    }

    #[test]
    fn test_trackpad_swipe_deletes_after_quiet_period() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);
        place_rows(&mut app);
        let t0 = Instant::now();

        for i in 0..6 {
            handle_mouse(
                &mut app,
                mouse(MouseEventKind::ScrollLeft, 5, 3),
                t0 + Duration::from_millis(i * 10),
            );
        }
        app.tick(t0 + Duration::from_millis(100));
        assert_eq!(active_titles(&app), vec!["A", "B"]);

        app.tick(t0 + Duration::from_millis(300));
        assert_eq!(active_titles(&app), vec!["A"]);
    }

    #[test]
    fn test_vertical_scroll_is_not_a_swipe() {
        let (mut app, _) = ready_app(vec![task("A", 0)]);
        place_rows(&mut app);
        let t0 = Instant::now();

        for _ in 0..10 {
            handle_mouse(&mut app, mouse(MouseEventKind::ScrollDown, 5, 2), t0);
        }
        app.tick(t0 + Duration::from_secs(1));

        assert_eq!(active_titles(&app), vec!["A"]);
    }

    #[test]
    fn test_click_composer_focuses_it() {
        let sync = MemorySync::signed_in(User::guest());
        let mut app = AppState::new(Box::new(sync), &Config::default());
        app.composer_area = Some(Rect::new(0, 1, 40, 3));

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 3, 2), Instant::now());
        assert_eq!(app.focus, Focus::Composer);
    }
}
