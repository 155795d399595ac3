use ratatui::layout::{Position, Rect};
use std::path::{Path, PathBuf};

use crate::analysis::{Analysis, AttributeSummary};
use crate::config::EtConfig;
use crate::error::{self, Error};
use crate::persist;
use crate::tree::model::ROOT_LABEL;
use crate::tree::{CheckState, GroupingKey, NodeRef, TreeEvent, TreeModel};
use crate::ui::pool::VirtualRenderer;

/// What keyboard input is currently routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Editing the comma-separated grouping key list
    Grouping,
}

/// Node shown in the detail panel, recomputed when focus or selection changes
#[derive(Debug, Clone)]
pub struct Detail {
    pub title: String,
    pub state: CheckState,
    pub selected: usize,
    pub total: usize,
    /// "leaf" or the key that splits this node
    pub kind: String,
    pub leaves: usize,
    /// Size of the focus set (the panel shows its first node)
    pub focused: usize,
    pub analysis: String,
    pub rows: Vec<(String, String)>,
}

/// Top-level application state
pub struct App {
    pub model: TreeModel,
    pub renderer: VirtualRenderer,
    pub config: EtConfig,

    /// Dataset the store was loaded from
    pub data_path: PathBuf,
    pub selection_path: PathBuf,

    pub input_mode: InputMode,
    /// Text buffer for the grouping key list being typed
    pub grouping_input: String,
    /// Applied key lists (most recent first, in-memory only)
    pub grouping_history: Vec<String>,

    analysis: Box<dyn Analysis>,
    pub detail: Option<Detail>,

    /// Inner area of the tree panel from the last paint, for mouse hit-testing
    pub tree_area: Rect,

    /// Selection changed since the last save
    pub dirty: bool,
    pub should_quit: bool,

    /// Transient notification shown in the corner
    pub message: Option<String>,
    /// Ticks since the notification appeared (for auto-clearing)
    pub message_ticks: u8,
}

impl App {
    pub fn new(model: TreeModel, config: EtConfig, data_path: PathBuf, selection_path: PathBuf) -> Self {
        let renderer = VirtualRenderer::new(
            config.display.pool_capacity,
            u16::from(config.display.indent_width),
        );
        let analysis = Box::new(AttributeSummary::new(config.display.summary_paths.clone()));
        let mut app = Self {
            model,
            renderer,
            config,
            data_path,
            selection_path,
            input_mode: InputMode::Normal,
            grouping_input: String::new(),
            grouping_history: Vec::new(),
            analysis,
            detail: None,
            tree_area: Rect::default(),
            dirty: false,
            should_quit: false,
            message: None,
            message_ticks: 0,
        };
        let result = app.renderer.draw(&mut app.model);
        app.check(result);
        app.refresh_detail();
        app.dirty = false;
        app
    }

    pub fn dataset_name(&self) -> String {
        file_label(&self.data_path)
    }

    /// Active keys as typed, outermost first
    pub fn keys_label(&self) -> String {
        self.model
            .keys()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(",")
    }

    // ── Core dispatch ──

    /// Settle the outcome of a tree operation and drain its events.
    ///
    /// A stale node handle is a bug in this layer: fatal in debug builds,
    /// logged and dropped in release builds.
    fn check(&mut self, result: error::Result<()>) {
        match result {
            Ok(()) => {}
            Err(e @ Error::NodeInvalidated { .. }) => {
                if cfg!(debug_assertions) {
                    panic!("{}", e);
                }
                log::error!("ignoring stale node operation: {}", e);
            }
            Err(e) => {
                log::warn!("{}", e);
                self.notify(&e.to_string());
            }
        }
        self.process_events();
    }

    /// Drain model notifications and update derived app state
    pub fn process_events(&mut self) {
        let mut detail_stale = false;
        for event in self.model.take_events() {
            match event {
                TreeEvent::SelectionChanged { selected_count, .. } => {
                    log::debug!("selection changed ({} selected under node)", selected_count);
                    self.dirty = true;
                    detail_stale = true;
                }
                TreeEvent::FocusChanged { nodes } => {
                    log::trace!("focus changed: {} nodes", nodes.len());
                    detail_stale = true;
                }
                TreeEvent::ExpansionChanged { node, expanded } => {
                    log::trace!("{:?} expanded={}", node, expanded);
                }
                TreeEvent::Rebuilt { generation } => {
                    log::debug!("tree generation {} is live", generation);
                    detail_stale = true;
                }
            }
        }
        if detail_stale {
            self.refresh_detail();
        }
    }

    fn refresh_detail(&mut self) {
        let node = self.renderer.focused().next().or(self.renderer.cursor());
        self.detail = match node.map(|n| self.describe(n)) {
            Some(Ok(detail)) => Some(detail),
            Some(Err(e)) => {
                log::error!("detail panel: {}", e);
                None
            }
            None => None,
        };
    }

    fn describe(&self, node: NodeRef) -> error::Result<Detail> {
        let path = self.model.path(node)?;
        let title = if path.is_empty() {
            ROOT_LABEL.to_string()
        } else {
            path.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" / ")
        };
        let kind = if self.model.is_leaf(node)? {
            "leaf".to_string()
        } else {
            format!("split by {}", self.model.split_key(node)?.unwrap_or_default())
        };
        let epochs = self.model.all_epochs(node, true)?;
        Ok(Detail {
            title,
            state: self.model.check_state(node)?,
            selected: self.model.selected_count(node)?,
            total: self.model.epoch_count(node)?,
            kind,
            leaves: self.model.leaf_nodes(node)?.len(),
            focused: self.renderer.focused().count(),
            analysis: self.analysis.name().to_string(),
            rows: self.analysis.run(self.model.store(), &epochs),
        })
    }

    // ── Navigation ──

    pub fn move_cursor(&mut self, delta: isize) {
        self.renderer.move_cursor(&mut self.model, delta);
        self.process_events();
    }

    pub fn page(&mut self, down: bool) {
        let height = self.tree_area.height.max(1) as isize;
        self.move_cursor(if down { height } else { -height });
    }

    pub fn cursor_first(&mut self) {
        self.renderer.cursor_first(&mut self.model);
        self.process_events();
    }

    pub fn cursor_last(&mut self) {
        self.renderer.cursor_last(&mut self.model);
        self.process_events();
    }

    pub fn expand(&mut self) {
        let result = self.renderer.expand(&mut self.model);
        self.check(result);
    }

    pub fn collapse(&mut self) {
        let result = self.renderer.collapse(&mut self.model);
        self.check(result);
    }

    pub fn toggle_expanded(&mut self) {
        let result = self.renderer.toggle_expanded(&mut self.model);
        self.check(result);
    }

    // ── Selection ──

    pub fn toggle_checked(&mut self) {
        let result = self.renderer.toggle_checked(&mut self.model);
        self.check(result);
    }

    pub fn select_all(&mut self, selected: bool) {
        if !self.model.select_all(selected) {
            return;
        }
        let result = self.renderer.refresh(&self.model);
        self.check(result);
        self.notify(if selected { "All epochs selected" } else { "Selection cleared" });
    }

    /// Route a left click at terminal cell (`column`, `row`)
    pub fn click(&mut self, column: u16, row: u16, additive: bool) {
        let area = self.tree_area;
        if !area.contains(Position { x: column, y: row }) {
            return;
        }
        let Some(index) = self.renderer.row_at(usize::from(row - area.y)) else {
            return;
        };
        let Some(part) = self.renderer.hit_test(index, column - area.x) else {
            return;
        };
        let result = self.renderer.click(&mut self.model, index, part, additive);
        self.check(result);
    }

    // ── Grouping ──

    pub fn start_grouping(&mut self) {
        self.grouping_input = self.keys_label();
        self.input_mode = InputMode::Grouping;
    }

    pub fn cancel_grouping(&mut self) {
        self.grouping_input.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Cycle the input through previously applied key lists
    pub fn recall_grouping(&mut self) {
        if self.grouping_history.is_empty() {
            return;
        }
        let next = match self.grouping_history.iter().position(|h| h == &self.grouping_input) {
            Some(i) => (i + 1) % self.grouping_history.len(),
            None => 0,
        };
        self.grouping_input = self.grouping_history[next].clone();
    }

    /// Rebuild with a new key list. On failure the current tree stays live.
    ///
    /// When the new list keeps a prefix of the old one, the cursor returns
    /// to the same group as far as that prefix reaches.
    pub fn apply_grouping(&mut self, list: &str) -> bool {
        let keys = match GroupingKey::parse_list(list) {
            Ok(keys) => keys,
            Err(e) => {
                self.notify(&e.to_string());
                return false;
            }
        };
        let old_keys: Vec<String> = self.model.keys().iter().map(|k| k.name().to_string()).collect();
        let mut old_path = match self.renderer.cursor() {
            Some(node) => self.model.path(node).unwrap_or_default(),
            None => Vec::new(),
        };
        if let Err(e) = self.model.rebuild(keys) {
            log::warn!("rebuild rejected: {}", e);
            self.notify(&e.to_string());
            return false;
        }

        let list = self.keys_label();
        self.grouping_history.retain(|h| h != &list);
        self.grouping_history.insert(0, list.clone());

        let result = self.renderer.draw(&mut self.model);
        self.check(result);

        let shared = old_keys
            .iter()
            .zip(self.model.keys())
            .take_while(|(old, new)| old.as_str() == new.name())
            .count();
        old_path.truncate(shared);
        if !old_path.is_empty() {
            if let Some(node) = self.model.find_path(&old_path) {
                let result = self.renderer.reveal(&mut self.model, node);
                self.check(result);
            }
        }

        if list.is_empty() {
            self.notify("Grouping cleared");
        } else {
            self.notify(&format!("Grouped by {} ({} nodes)", list, self.model.node_count()));
        }
        true
    }

    // ── Persistence ──

    pub fn save_selection(&mut self) {
        match persist::save_selection(&self.selection_path, &self.model) {
            Ok(()) => {
                self.dirty = false;
                let name = file_label(&self.selection_path);
                self.notify(&format!("Saved selection to {}", name));
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.notify(&format!("Save failed: {}", e));
            }
        }
    }

    /// Quit, writing the selection first when autosave is on
    pub fn quit(&mut self) {
        if self.dirty && self.config.selection.autosave {
            self.save_selection();
        }
        self.should_quit = true;
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.message = Some(msg.to_string());
        self.message_ticks = 0;
    }

    /// Tick called on every event loop iteration; used for notification auto-clear
    pub fn tick(&mut self) {
        if self.message.is_some() {
            self.message_ticks += 1;
            if self.message_ticks > 20 {
                self.message = None;
                self.message_ticks = 0;
            }
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::model::tests::make_model;

    fn make_app(keys: &str) -> App {
        let mut config = EtConfig::default();
        config.display.summary_paths = vec!["type".into()];
        App::new(
            make_model(keys),
            config,
            PathBuf::from("/tmp/run.json"),
            PathBuf::from("/tmp/run.json.selection.json"),
        )
    }

    #[test]
    fn detail_starts_on_root() {
        let app = make_app("type");
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.title, ROOT_LABEL);
        assert_eq!((detail.selected, detail.total), (6, 6));
        assert_eq!(detail.rows[1], ("type".to_string(), "A ×2, B ×3, C ×1".to_string()));
        assert!(!app.dirty);
    }

    #[test]
    fn checking_updates_detail_and_marks_dirty() {
        let mut app = make_app("type");
        app.move_cursor(2); // B
        app.toggle_checked();
        assert!(app.dirty);
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.title, "B");
        assert_eq!(detail.state, CheckState::Unchecked);
        assert_eq!(detail.rows[0].1, "0");
        assert_eq!(app.model.selected_count(app.model.root()).unwrap(), 3);
    }

    #[test]
    fn select_all_and_none() {
        let mut app = make_app("type");
        app.select_all(false);
        assert_eq!(app.model.store().selected_len(), 0);
        assert_eq!(app.renderer.rows()[0].check, CheckState::Unchecked);
        app.select_all(true);
        assert_eq!(app.model.store().selected_len(), 6);
        assert_eq!(app.message.as_deref(), Some("All epochs selected"));
    }

    #[test]
    fn regrouping_replaces_tree_and_records_history() {
        let mut app = make_app("type");
        app.move_cursor(1);
        assert!(app.apply_grouping("protocol, type"));
        assert_eq!(app.model.generation(), 2);
        assert_eq!(app.keys_label(), "protocol,type");
        assert_eq!(app.grouping_history, vec!["protocol,type"]);
        assert_eq!(app.renderer.cursor(), Some(app.model.root()));
        assert_eq!(app.detail.as_ref().unwrap().title, ROOT_LABEL);
        let labels: Vec<&str> = app.renderer.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["All epochs", "X", "Y"]);
    }

    #[test]
    fn regrouping_with_shared_prefix_keeps_cursor_group() {
        let mut app = make_app("type");
        app.move_cursor(2); // B
        assert!(app.apply_grouping("type,protocol"));
        let cursor = app.renderer.cursor().unwrap();
        assert_eq!(app.model.label(cursor).unwrap(), "B");
        assert_eq!(cursor.generation(), 2);
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.title, "B");
        assert_eq!(detail.kind, "split by protocol");
        assert_eq!(detail.leaves, 2);
    }

    #[test]
    fn recall_cycles_through_history() {
        let mut app = make_app("type");
        app.apply_grouping("protocol");
        app.apply_grouping("type,protocol");
        app.start_grouping();
        assert_eq!(app.grouping_input, "type,protocol");
        app.recall_grouping();
        assert_eq!(app.grouping_input, "protocol");
        app.recall_grouping();
        assert_eq!(app.grouping_input, "type,protocol");
        app.cancel_grouping();
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn bad_grouping_keeps_current_tree() {
        let mut app = make_app("type");
        assert!(!app.apply_grouping("@nope"));
        assert_eq!(app.model.generation(), 1);
        assert!(app.message.as_deref().unwrap().contains("@nope"));
        assert_eq!(app.renderer.rows().len(), 4);
    }

    #[test]
    fn mouse_click_maps_through_viewport() {
        let mut app = make_app("type");
        app.tree_area = Rect::new(0, 1, 30, 10);
        // row 3 on screen is B; B's check box starts after indent + expander
        app.click(4, 3, false);
        assert_eq!(app.model.selected_count(app.model.root()).unwrap(), 3);
        // outside the panel
        app.click(40, 3, false);
        assert_eq!(app.model.selected_count(app.model.root()).unwrap(), 3);
        // label click focuses C
        app.click(12, 4, false);
        assert_eq!(app.detail.as_ref().unwrap().title, "C");
    }

    #[test]
    fn quit_autosaves_dirty_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = make_app("type");
        app.selection_path = dir.path().join("sel.json");
        app.quit();
        assert!(app.should_quit);
        assert!(!app.selection_path.exists());

        app.toggle_checked();
        app.quit();
        let file = persist::load_selection(&app.selection_path).unwrap().unwrap();
        assert!(file.entries.iter().all(|e| !e.selected));
        assert!(!app.dirty);
    }

    #[test]
    fn notification_clears_after_ticks() {
        let mut app = make_app("type");
        app.notify("hello");
        for _ in 0..20 {
            app.tick();
        }
        assert!(app.message.is_some());
        app.tick();
        assert!(app.message.is_none());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "used after rebuild")]
    fn stale_handles_are_fatal_in_debug_builds() {
        let mut app = make_app("type");
        app.check(Err(Error::NodeInvalidated { held: 1, live: 2 }));
    }
}
