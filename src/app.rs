use crate::config::Config;
use crate::domain::{Clock, SystemClock, TaskStore};
use crate::input::{GestureConfig, GestureInterpreter, Intent, PointerPress};
use crate::sync::{SyncAdapter, User};
use ratatui::layout::Rect;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Which top-level view is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// No account; nothing may touch the store
    SignedOut,
    /// Initial query failed; terminal for this session
    LoadFailed(String),
    Ready,
}

/// Where keyboard input goes when no row is being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Composer,
}

/// A task row as last drawn, for mouse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRow {
    pub id: Uuid,
    pub area: Rect,
    pub active: bool,
}

/// Main application state
pub struct AppState {
    pub screen: Screen,
    pub store: TaskStore,
    pub gestures: GestureInterpreter,
    sync: Box<dyn SyncAdapter>,
    pub user: Option<User>,
    pub selected_index: usize,
    pub focus: Focus,
    pub hit_rows: Vec<HitRow>,
    pub composer_area: Option<Rect>,
    pub press: Option<PointerPress>,
    /// Swipe distance per terminal column
    pub column_units: f32,
    /// Swipe distance per horizontal scroll notch
    pub wheel_step: f32,
}

impl AppState {
    pub fn new(sync: Box<dyn SyncAdapter>, config: &Config) -> Self {
        Self::with_clock(sync, config, Box::new(SystemClock))
    }

    /// Resolve the account, then load its tasks
    pub fn with_clock(mut sync: Box<dyn SyncAdapter>, config: &Config, clock: Box<dyn Clock>) -> Self {
        let user = sync.current_user();

        let (screen, tasks) = match &user {
            None => {
                info!("no account; showing sign-in notice");
                (Screen::SignedOut, Vec::new())
            }
            Some(user) => match sync.query() {
                Ok(tasks) => {
                    info!(email = %user.email, count = tasks.len(), "tasks loaded");
                    (Screen::Ready, tasks)
                }
                Err(err) => {
                    warn!(error = %err, "failed to load tasks");
                    (Screen::LoadFailed(err.to_string()), Vec::new())
                }
            },
        };

        let mut app = Self {
            screen,
            store: TaskStore::with_clock(tasks, clock, config.undo_limit),
            gestures: GestureInterpreter::new(GestureConfig::from(config)),
            sync,
            user,
            selected_index: 0,
            focus: Focus::List,
            hit_rows: Vec::new(),
            composer_area: None,
            press: None,
            column_units: config.column_units,
            wheel_step: config.wheel_step,
        };
        app.flush();
        app
    }

    pub fn is_ready(&self) -> bool {
        self.screen == Screen::Ready
    }

    /// Apply one intent, hand the resulting writes to the backend, then drop
    /// interaction state for rows that no longer exist
    pub fn dispatch(&mut self, intent: Intent) {
        if !self.is_ready() {
            debug!(?intent, "ignoring intent outside the task list");
            return;
        }

        match intent {
            Intent::Add { title } => {
                self.store.add(&title);
            }
            Intent::Rename { id, title } => self.store.rename(id, &title),
            Intent::Delete { id } => self.store.delete(id),
            Intent::ToggleComplete { id } => self.store.toggle_complete(id),
            Intent::Reorder { order } => self.store.reorder(&order),
            Intent::Undo => {
                if !self.store.undo() {
                    debug!("nothing to undo");
                }
            }
        }

        self.flush();
        self.prune();
    }

    /// Resolve debounced swipes and pick up snapshots from other sessions
    pub fn tick(&mut self, now: Instant) {
        if !self.is_ready() {
            return;
        }

        for intent in self.gestures.tick(now) {
            self.dispatch(intent);
        }

        if let Some(snapshot) = self.sync.poll_remote() {
            self.store.replace_all(snapshot);
            self.flush();
            self.prune();
        }
    }

    fn flush(&mut self) {
        let mutations = self.store.take_outbox();
        if !mutations.is_empty() {
            self.sync.transact(mutations);
        }
    }

    fn prune(&mut self) {
        let live: HashSet<Uuid> = self.store.tasks().iter().map(|t| t.id).collect();
        self.gestures.retain(&live);
        self.gestures.refresh_reorder(&self.store.views().active_ids());
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.store.views().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Id of the highlighted row (active rows first, then completed)
    pub fn selected_id(&self) -> Option<Uuid> {
        self.store
            .views()
            .rows()
            .nth(self.selected_index)
            .map(|t| t.id)
    }

    pub fn select(&mut self, id: Uuid) {
        if let Some(index) = self.store.views().rows().position(|t| t.id == id) {
            self.selected_index = index;
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.store.views().len() {
            self.selected_index += 1;
        }
    }

    /// Swap the selected active task with its neighbour
    pub fn shift_selected(&mut self, delta: isize) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let mut order = self.store.views().active_ids();
        let Some(from) = order.iter().position(|x| *x == id) else {
            return;
        };
        let to = from as isize + delta;
        if to < 0 || to as usize >= order.len() {
            return;
        }

        order.swap(from, to as usize);
        self.dispatch(Intent::Reorder { order });
        self.select(id);
    }

    /// Open the in-place editor on a row
    pub fn edit(&mut self, id: Uuid) {
        let Some(title) = self.store.get(id).map(|t| t.title.clone()) else {
            return;
        };
        self.blur_editing_except(Some(id));
        self.focus = Focus::List;
        self.select(id);
        if let Some(intent) = self.gestures.on_click(id, &title, false) {
            self.dispatch(intent);
        }
    }

    /// Commit whichever row is being edited, unless it is `keep`
    pub fn blur_editing_except(&mut self, keep: Option<Uuid>) {
        let Some(id) = self.gestures.editing_id() else {
            return;
        };
        if Some(id) == keep {
            return;
        }
        if let Some(intent) = self.gestures.on_blur(id) {
            self.dispatch(intent);
        }
    }

    /// Let go of a held row without acting on it
    pub fn cancel_press(&mut self) {
        let Some(press) = self.press.take() else {
            return;
        };
        self.gestures.cancel_drag(press.id);
        self.gestures.cancel_reorder();
    }

    pub fn focus_composer(&mut self) {
        self.blur_editing_except(None);
        self.focus = Focus::Composer;
    }

    pub fn hit_test(&self, column: u16, row: u16) -> Option<HitRow> {
        self.hit_rows
            .iter()
            .find(|hit| {
                row == hit.area.y && column >= hit.area.x && column < hit.area.x + hit.area.width
            })
            .copied()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::clock::StepClock;
    use crate::domain::{Mutation, Task};
    use crate::sync::MemorySync;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    pub(crate) fn task(title: &str, sort_order: usize) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, sort_order as u32).unwrap();
        Task::new(title.to_string(), sort_order, at)
    }

    pub(crate) fn ready_app(tasks: Vec<Task>) -> (AppState, MemorySync) {
        let sync = MemorySync::signed_in(User::from_email("sam@example.com")).with_tasks(tasks);
        let app = AppState::with_clock(
            Box::new(sync.clone()),
            &Config::default(),
            Box::new(StepClock::new()),
        );
        (app, sync)
    }

    fn titles(app: &AppState) -> (Vec<String>, Vec<String>) {
        let views = app.store.views();
        (
            views.active.iter().map(|t| t.title.clone()).collect(),
            views.completed.iter().map(|t| t.title.clone()).collect(),
        )
    }

    #[test]
    fn test_signed_out_screen() {
        let mut app = AppState::new(Box::new(MemorySync::signed_out()), &Config::default());
        assert_eq!(app.screen, Screen::SignedOut);

        app.dispatch(Intent::Add {
            title: "Ignored".to_string(),
        });
        assert!(app.store.tasks().is_empty());
    }

    #[test]
    fn test_load_failure_screen() {
        let sync = MemorySync::signed_in(User::guest());
        sync.fail_queries("backend down");
        let app = AppState::new(Box::new(sync), &Config::default());

        assert_eq!(
            app.screen,
            Screen::LoadFailed("Sync unavailable: backend down".to_string())
        );
    }

    #[test]
    fn test_loads_existing_tasks() {
        let (app, _) = ready_app(vec![task("First", 0), task("Second", 1)]);
        assert_eq!(app.screen, Screen::Ready);
        assert_eq!(app.user.as_ref().map(|u| u.email.as_str()), Some("sam@example.com"));
        assert_eq!(titles(&app).0, vec!["First", "Second"]);
    }

    #[test]
    fn test_dispatch_flushes_outbox() {
        let (mut app, sync) = ready_app(Vec::new());

        app.dispatch(Intent::Add {
            title: "Buy milk".to_string(),
        });

        let transactions = sync.transactions();
        assert_eq!(transactions.len(), 1);
        assert!(matches!(transactions[0][..], [Mutation::Create { .. }]));
        assert_eq!(sync.records().len(), 1);
    }

    #[test]
    fn test_no_op_intent_sends_nothing() {
        let (mut app, sync) = ready_app(Vec::new());

        app.dispatch(Intent::Add {
            title: "   ".to_string(),
        });
        app.dispatch(Intent::Undo);

        assert!(sync.transactions().is_empty());
    }

    #[test]
    fn test_toggle_and_undo_round_trip() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1), task("C", 2)]);
        let b = app.store.views().active_ids()[1];

        app.dispatch(Intent::ToggleComplete { id: b });
        let (active, completed) = titles(&app);
        assert_eq!(active, vec!["A", "C"]);
        assert_eq!(completed, vec!["B"]);

        app.dispatch(Intent::Undo);
        assert_eq!(titles(&app).0, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_delete_prunes_gesture_state() {
        let (mut app, _) = ready_app(vec![task("Doomed", 0)]);
        let id = app.store.views().active_ids()[0];
        let t0 = Instant::now();

        app.gestures.on_wheel(id, 100.0, 0.0, t0);
        app.dispatch(Intent::Delete { id });

        assert_eq!(app.gestures.next_deadline(), None);
    }

    #[test]
    fn test_tick_resolves_swipe() {
        let (mut app, _) = ready_app(vec![task("Swiped", 0), task("Kept", 1)]);
        let id = app.store.views().active_ids()[0];
        let t0 = Instant::now();

        app.gestures.on_wheel(id, 200.0, 0.0, t0);
        app.tick(t0 + Duration::from_millis(50));
        assert_eq!(app.store.tasks().len(), 2);

        app.tick(t0 + Duration::from_millis(200));
        assert_eq!(titles(&app).0, vec!["Kept"]);
    }

    #[test]
    fn test_tick_swaps_remote_snapshot() {
        let (mut app, sync) = ready_app(vec![task("Local", 0)]);
        app.selected_index = 0;

        sync.push_remote(vec![task("From phone", 0), task("Also remote", 1)]);
        app.tick(Instant::now());

        assert_eq!(titles(&app).0, vec!["From phone", "Also remote"]);
    }

    #[test]
    fn test_remote_snapshot_keeps_live_draft() {
        let (mut app, sync) = ready_app(vec![task("Editing", 0)]);
        let editing = app.store.tasks()[0].clone();
        app.edit(editing.id);
        app.gestures
            .on_item_key(editing.id, crate::input::Key::Char('x'));

        sync.push_remote(vec![editing.clone(), task("New remote", 1)]);
        app.tick(Instant::now());

        assert_eq!(app.gestures.editing_id(), Some(editing.id));
    }

    #[test]
    fn test_remote_snapshot_keeps_held_reorder() {
        let (mut app, sync) = ready_app(vec![task("A", 0), task("B", 1)]);
        let local = app.store.views().active.iter().map(|t| (*t).clone()).collect::<Vec<_>>();
        let b = local[1].id;

        app.gestures.begin_reorder(b, app.store.views().active_ids());
        app.gestures.move_reorder(0);

        let mut remote = local.clone();
        remote.push(task("Remote C", 2));
        sync.push_remote(remote);
        app.tick(Instant::now());

        let intent = app.gestures.end_reorder().unwrap();
        app.dispatch(intent);
        assert_eq!(titles(&app).0, vec!["B", "A", "Remote C"]);
    }

    #[test]
    fn test_gappy_load_is_settled_and_written_back() {
        let (app, sync) = ready_app(vec![task("A", 0), task("B", 4)]);

        let orders: Vec<usize> = app.store.views().active.iter().map(|t| t.sort_order).collect();
        assert_eq!(orders, vec![0, 1]);
        assert_eq!(sync.transactions().len(), 1);
    }

    #[test]
    fn test_cancel_press_abandons_held_row() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);
        let ids = app.store.views().active_ids();
        app.press = Some(PointerPress {
            id: ids[1],
            origin: (5, 3),
            last_column: 5,
            axis: None,
            meta: false,
        });
        app.gestures.begin_reorder(ids[1], ids.clone());
        app.gestures.move_reorder(0);

        app.cancel_press();

        assert_eq!(app.press, None);
        assert_eq!(app.gestures.reorder_preview(), None);
        assert_eq!(titles(&app).0, vec!["A", "B"]);
    }

    #[test]
    fn test_shift_selected_reorders() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1), task("C", 2)]);
        app.selected_index = 2;

        app.shift_selected(-1);
        assert_eq!(titles(&app).0, vec!["A", "C", "B"]);
        assert_eq!(app.selected_index, 1);

        // cannot move past the top
        app.selected_index = 0;
        app.shift_selected(-1);
        assert_eq!(titles(&app).0, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_selection_clamped_after_delete() {
        let (mut app, _) = ready_app(vec![task("A", 0), task("B", 1)]);
        app.selected_index = 1;
        let b = app.selected_id().unwrap();

        app.dispatch(Intent::Delete { id: b });
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_focus_composer_commits_edit() {
        let (mut app, _) = ready_app(vec![task("Old", 0)]);
        let id = app.store.tasks()[0].id;

        app.edit(id);
        for c in "New".chars() {
            app.gestures.on_item_key(id, crate::input::Key::Char(c));
        }
        app.focus_composer();

        assert_eq!(app.focus, Focus::Composer);
        assert_eq!(app.store.get(id).map(|t| t.title.as_str()), Some("New"));
    }
}
