use crate::config::Config;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Thresholds for swipe-to-delete
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Offsets are clamped to `-max_offset..=max_offset`
    pub max_offset: f32,
    /// Distance at which a released swipe deletes
    pub commit_threshold: f32,
    /// Quiet period that ends a trackpad swipe
    pub debounce: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig::from(&Config::default())
    }
}

impl From<&Config> for GestureConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_offset: config.max_swipe_offset,
            commit_threshold: config.swipe_commit_threshold,
            debounce: config.swipe_debounce(),
        }
    }
}

impl GestureConfig {
    fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(-self.max_offset, self.max_offset)
    }

    fn commits(&self, offset: f32) -> bool {
        offset.abs() >= self.commit_threshold
    }
}

/// A discrete user action, independent of the device that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add { title: String },
    Rename { id: Uuid, title: String },
    Delete { id: Uuid },
    ToggleComplete { id: Uuid },
    Reorder { order: Vec<Uuid> },
    Undo,
}

/// Keys the text fields react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Escape,
    Char(char),
}

/// Per-row interaction state
#[derive(Debug, Clone, PartialEq)]
pub enum ItemMode {
    Idle,
    /// In-place edit; `select_all` until the first keystroke replaces the text
    Editing { draft: String, select_all: bool },
    /// Pointer held and moving horizontally
    Dragging { offset: f32 },
}

/// Two-finger horizontal swipe, resolved after a quiet period instead of a
/// release event. Each new delta replaces the pending deadline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwipeAccumulator {
    offset: f32,
    deadline: Option<Instant>,
}

impl SwipeAccumulator {
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    fn push(&mut self, dx: f32, now: Instant, config: &GestureConfig) {
        self.offset = config.clamp(self.offset + dx);
        self.deadline = Some(now + config.debounce);
    }

    /// `Some(commit)` once the deadline has passed; always resets to zero
    fn resolve(&mut self, now: Instant, config: &GestureConfig) -> Option<bool> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                let commit = config.commits(self.offset);
                self.reset();
                Some(commit)
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.offset = 0.0;
        self.deadline = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ItemGesture {
    mode: ItemMode,
    swipe: SwipeAccumulator,
}

impl Default for ItemGesture {
    fn default() -> Self {
        Self {
            mode: ItemMode::Idle,
            swipe: SwipeAccumulator::default(),
        }
    }
}

impl ItemGesture {
    fn is_idle(&self) -> bool {
        self.mode == ItemMode::Idle && !self.swipe.is_pending()
    }
}

#[derive(Debug, Clone)]
struct ReorderDrag {
    id: Uuid,
    order: Vec<Uuid>,
}

/// Turns key, pointer and trackpad input into [`Intent`]s.
///
/// Text being typed lives here, not in the task store, so a remote snapshot
/// swap never clobbers an edit in progress.
pub struct GestureInterpreter {
    config: GestureConfig,
    composer: String,
    items: HashMap<Uuid, ItemGesture>,
    reorder: Option<ReorderDrag>,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            composer: String::new(),
            items: HashMap::new(),
            reorder: None,
        }
    }

    /// Text in the new-task field
    pub fn composer(&self) -> &str {
        &self.composer
    }

    pub fn on_composer_key(&mut self, key: Key) -> Option<Intent> {
        match key {
            Key::Enter => Some(Intent::Add {
                title: std::mem::take(&mut self.composer),
            }),
            Key::Backspace => {
                self.composer.pop();
                None
            }
            Key::Char(c) => {
                self.composer.push(c);
                None
            }
            Key::Escape => None,
        }
    }

    pub fn mode(&self, id: Uuid) -> ItemMode {
        self.items
            .get(&id)
            .map(|g| g.mode.clone())
            .unwrap_or(ItemMode::Idle)
    }

    pub fn editing_id(&self) -> Option<Uuid> {
        self.items
            .iter()
            .find(|(_, g)| matches!(g.mode, ItemMode::Editing { .. }))
            .map(|(id, _)| *id)
    }

    /// Horizontal displacement to draw for a row
    pub fn offset(&self, id: Uuid) -> f32 {
        match self.items.get(&id) {
            Some(ItemGesture {
                mode: ItemMode::Dragging { offset },
                ..
            }) => *offset,
            Some(g) => g.swipe.offset(),
            None => 0.0,
        }
    }

    /// Whether releasing now would delete the row
    pub fn past_threshold(&self, id: Uuid) -> bool {
        self.config.commits(self.offset(id))
    }

    /// Plain click edits; meta-click toggles completion and wins over editing
    pub fn on_click(&mut self, id: Uuid, title: &str, meta: bool) -> Option<Intent> {
        if meta {
            return Some(Intent::ToggleComplete { id });
        }

        let gesture = self.items.entry(id).or_default();
        if gesture.mode == ItemMode::Idle {
            gesture.mode = ItemMode::Editing {
                draft: title.to_string(),
                select_all: true,
            };
            gesture.swipe.reset();
        }
        None
    }

    pub fn on_item_key(&mut self, id: Uuid, key: Key) -> Option<Intent> {
        let gesture = self.items.get_mut(&id)?;
        let ItemMode::Editing { draft, select_all } = &mut gesture.mode else {
            return None;
        };

        match key {
            Key::Enter => {
                let title = std::mem::take(draft);
                gesture.mode = ItemMode::Idle;
                Some(Intent::Rename { id, title })
            }
            Key::Escape => {
                gesture.mode = ItemMode::Idle;
                None
            }
            Key::Backspace if draft.is_empty() => {
                gesture.mode = ItemMode::Idle;
                Some(Intent::Delete { id })
            }
            Key::Backspace => {
                if *select_all {
                    draft.clear();
                    *select_all = false;
                } else {
                    draft.pop();
                }
                None
            }
            Key::Char(c) => {
                if *select_all {
                    draft.clear();
                    *select_all = false;
                }
                draft.push(c);
                None
            }
        }
    }

    /// Focus left the edit field; commits like Enter
    pub fn on_blur(&mut self, id: Uuid) -> Option<Intent> {
        match self.items.get(&id).map(|g| &g.mode) {
            Some(ItemMode::Editing { .. }) => self.on_item_key(id, Key::Enter),
            _ => None,
        }
    }

    pub fn on_drag_start(&mut self, id: Uuid) {
        let gesture = self.items.entry(id).or_default();
        if gesture.mode == ItemMode::Idle {
            gesture.mode = ItemMode::Dragging { offset: 0.0 };
            gesture.swipe.reset();
        }
    }

    pub fn on_drag_move(&mut self, id: Uuid, dx: f32) {
        let config = self.config;
        if let Some(ItemGesture {
            mode: ItemMode::Dragging { offset },
            ..
        }) = self.items.get_mut(&id)
        {
            *offset = config.clamp(*offset + dx);
        }
    }

    /// Release: delete past the threshold, otherwise snap back
    pub fn on_drag_end(&mut self, id: Uuid) -> Option<Intent> {
        let gesture = self.items.get_mut(&id)?;
        let ItemMode::Dragging { offset } = gesture.mode else {
            return None;
        };
        gesture.mode = ItemMode::Idle;

        self.config
            .commits(offset)
            .then_some(Intent::Delete { id })
    }

    /// Pointer drag abandoned without a release; snap back, never delete
    pub fn cancel_drag(&mut self, id: Uuid) {
        if let Some(gesture) = self.items.get_mut(&id) {
            if matches!(gesture.mode, ItemMode::Dragging { .. }) {
                gesture.mode = ItemMode::Idle;
            }
        }
    }

    /// Trackpad scroll over a row; only horizontal-dominant motion counts
    pub fn on_wheel(&mut self, id: Uuid, dx: f32, dy: f32, now: Instant) {
        if dx.abs() <= dy.abs() {
            return;
        }
        let config = self.config;
        let gesture = self.items.entry(id).or_default();
        if gesture.mode != ItemMode::Idle {
            return;
        }
        gesture.swipe.push(dx, now, &config);
    }

    /// Resolve trackpad swipes whose quiet period has elapsed
    pub fn tick(&mut self, now: Instant) -> Vec<Intent> {
        let config = self.config;
        let mut intents = Vec::new();

        for (id, gesture) in self.items.iter_mut() {
            if gesture.swipe.resolve(now, &config) == Some(true) {
                intents.push(Intent::Delete { id: *id });
            }
        }
        self.items.retain(|_, g| !g.is_idle());
        intents
    }

    /// Next pending swipe deadline, for sizing the event poll
    pub fn next_deadline(&self) -> Option<Instant> {
        self.items.values().filter_map(|g| g.swipe.deadline).min()
    }

    /// Row went away: drop its state and any pending swipe
    pub fn unmount(&mut self, id: Uuid) {
        self.items.remove(&id);
        if self.reorder.as_ref().is_some_and(|r| r.id == id) {
            self.reorder = None;
        }
    }

    /// Keep state only for rows that still exist
    pub fn retain(&mut self, live: &HashSet<Uuid>) {
        let gone: Vec<Uuid> = self
            .items
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for id in gone {
            self.unmount(id);
        }
    }

    /// Bring a held row's preview in line with a changed active list. The
    /// arrangement made so far is kept; rows new to the list go last.
    pub fn refresh_reorder(&mut self, active: &[Uuid]) {
        let Some(drag) = &mut self.reorder else {
            return;
        };
        if !active.contains(&drag.id) {
            self.reorder = None;
            return;
        }

        drag.order.retain(|id| active.contains(id));
        let unseen: Vec<Uuid> = active
            .iter()
            .filter(|id| !drag.order.contains(id))
            .copied()
            .collect();
        drag.order.extend(unseen);
    }

    /// Pick up an active row; `active_order` is the current active list
    pub fn begin_reorder(&mut self, id: Uuid, active_order: Vec<Uuid>) {
        if !active_order.contains(&id) || self.mode(id) != ItemMode::Idle {
            return;
        }
        self.reorder = Some(ReorderDrag {
            id,
            order: active_order,
        });
    }

    /// Move the held row to `index` in the preview ordering
    pub fn move_reorder(&mut self, index: usize) {
        let Some(drag) = &mut self.reorder else {
            return;
        };
        let Some(from) = drag.order.iter().position(|x| *x == drag.id) else {
            return;
        };
        let id = drag.order.remove(from);
        let to = index.min(drag.order.len());
        drag.order.insert(to, id);
    }

    pub fn reordering_id(&self) -> Option<Uuid> {
        self.reorder.as_ref().map(|r| r.id)
    }

    /// Ordering to draw while a row is held
    pub fn reorder_preview(&self) -> Option<&[Uuid]> {
        self.reorder.as_ref().map(|r| r.order.as_slice())
    }

    /// Drop the row, submitting the full new active ordering
    pub fn end_reorder(&mut self) -> Option<Intent> {
        self.reorder
            .take()
            .map(|drag| Intent::Reorder { order: drag.order })
    }

    pub fn cancel_reorder(&mut self) {
        self.reorder = None;
    }
}
