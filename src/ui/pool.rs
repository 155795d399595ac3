//! Virtualized tree rendering over a recycled pool of row widgets.
//!
//! `draw` flattens the nodes whose ancestors are all expanded and binds
//! pool rows to them in traversal order. Rows past the visible count are
//! hidden, never dropped. The pool doubles when it runs short and never
//! shrinks, so large trees pay the allocation once per session.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::tree::{CheckState, NodeRef, SplitValue, TreeEvent, TreeModel};

/// Columns taken by the expand affordance (`▸ `)
pub const EXPANDER_WIDTH: u16 = 2;
/// Columns taken by the check affordance (`[x] `)
pub const CHECKBOX_WIDTH: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expander {
    /// Node has no children
    None,
    Collapsed,
    Expanded,
}

/// Region of a row that received a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPart {
    Expander,
    Checkbox,
    Label,
}

/// One reusable visual row.
#[derive(Debug, Clone)]
pub struct RowWidget {
    pub node: Option<NodeRef>,
    pub visible: bool,
    pub label: String,
    /// Bucket for epochs the key had no value for
    pub unknown: bool,
    pub indent: u16,
    pub selected: usize,
    pub total: usize,
    pub expander: Expander,
    pub check: CheckState,
    pub focused: bool,
}

impl RowWidget {
    fn hidden() -> Self {
        Self {
            node: None,
            visible: false,
            label: String::new(),
            unknown: false,
            indent: 0,
            selected: 0,
            total: 0,
            expander: Expander::None,
            check: CheckState::Unchecked,
            focused: false,
        }
    }

    fn bind(&mut self, model: &TreeModel, node: NodeRef, indent_width: u16, focused: bool) -> Result<()> {
        let depth = model.depth(node)?;
        self.node = Some(node);
        self.visible = true;
        self.label = model.label(node)?;
        self.unknown = model.split_value(node)?.is_some_and(SplitValue::is_unknown);
        self.indent = u16::try_from(depth).unwrap_or(u16::MAX).saturating_mul(indent_width);
        self.expander = if model.child_count(node)? == 0 {
            Expander::None
        } else if model.is_expanded(node)? {
            Expander::Expanded
        } else {
            Expander::Collapsed
        };
        self.focused = focused;
        self.refresh(model)
    }

    fn refresh(&mut self, model: &TreeModel) -> Result<()> {
        if let Some(node) = self.node {
            self.selected = model.selected_count(node)?;
            self.total = model.epoch_count(node)?;
            self.check = model.check_state(node)?;
        }
        Ok(())
    }

    fn unbind(&mut self) {
        self.node = None;
        self.visible = false;
        self.focused = false;
    }

    /// Which affordance sits at `column` (relative to the row start)
    pub fn part_at(&self, column: u16) -> RowPart {
        let expander_end = self.indent.saturating_add(EXPANDER_WIDTH);
        let checkbox_end = expander_end.saturating_add(CHECKBOX_WIDTH);
        if column >= self.indent && column < expander_end && self.expander != Expander::None {
            RowPart::Expander
        } else if column >= expander_end && column < checkbox_end {
            RowPart::Checkbox
        } else {
            RowPart::Label
        }
    }
}

/// Fixed set of row widgets reused across draws.
#[derive(Debug, Clone)]
pub struct WidgetPool {
    rows: Vec<RowWidget>,
    bound: usize,
    growth_events: u64,
}

impl WidgetPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: vec![RowWidget::hidden(); capacity.max(1)],
            bound: 0,
            growth_events: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    /// Rows bound by the last draw
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Times a draw found the pool too small
    pub fn growth_events(&self) -> u64 {
        self.growth_events
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[RowWidget] {
        &self.rows
    }

    /// Double the pool until `needed` rows fit. Returns whether it grew.
    fn reserve(&mut self, needed: usize) -> bool {
        let mut capacity = self.rows.len();
        if needed <= capacity {
            return false;
        }
        while capacity < needed {
            capacity *= 2;
        }
        log::debug!("widget pool exhausted: {} -> {} rows ({} visible)", self.rows.len(), capacity, needed);
        self.rows.resize(capacity, RowWidget::hidden());
        self.growth_events += 1;
        true
    }
}

/// Maps the live tree onto a [`WidgetPool`] and turns row input into
/// model operations.
#[derive(Debug, Clone)]
pub struct VirtualRenderer {
    pool: WidgetPool,
    visible: Vec<NodeRef>,
    focused: BTreeSet<NodeRef>,
    cursor: Option<NodeRef>,
    generation: u64,
    indent_width: u16,
    scroll: usize,
}

impl VirtualRenderer {
    pub fn new(pool_capacity: usize, indent_width: u16) -> Self {
        Self {
            pool: WidgetPool::new(pool_capacity),
            visible: Vec::new(),
            focused: BTreeSet::new(),
            cursor: None,
            generation: 0,
            indent_width,
            scroll: 0,
        }
    }

    pub fn pool(&self) -> &WidgetPool {
        &self.pool
    }

    /// Bound rows in draw order
    pub fn rows(&self) -> &[RowWidget] {
        &self.pool.rows[..self.pool.bound]
    }

    #[cfg(test)]
    pub fn visible(&self) -> &[NodeRef] {
        &self.visible
    }

    pub fn focused(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.focused.iter().copied()
    }

    pub fn cursor(&self) -> Option<NodeRef> {
        self.cursor
    }

    /// Draw-order position of the cursor
    pub fn cursor_row(&self) -> Option<usize> {
        let cursor = self.cursor?;
        self.visible.iter().position(|&n| n == cursor)
    }

    #[cfg(test)]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    // ── Drawing ──

    /// Re-flatten the visible nodes and bind them to pool rows.
    pub fn draw(&mut self, model: &mut TreeModel) -> Result<()> {
        if model.generation() != self.generation {
            self.generation = model.generation();
            self.cursor = None;
            self.scroll = 0;
            if !self.focused.is_empty() {
                self.focused.clear();
                model.notify(TreeEvent::FocusChanged { nodes: Vec::new() });
            }
        }

        self.visible = visible_nodes(model)?;
        self.pool.reserve(self.visible.len());

        let count = self.visible.len();
        for (row, &node) in self.pool.rows.iter_mut().zip(&self.visible) {
            row.bind(model, node, self.indent_width, self.focused.contains(&node))?;
        }
        for row in &mut self.pool.rows[count..] {
            row.unbind();
        }
        self.pool.bound = count;

        self.cursor = match self.cursor {
            Some(cursor) => Some(self.nearest_visible(model, cursor)?),
            None => self.visible.first().copied(),
        };
        Ok(())
    }

    /// Update check state and counts of bound rows without re-flattening
    pub fn refresh(&mut self, model: &TreeModel) -> Result<()> {
        for row in &mut self.pool.rows[..self.pool.bound] {
            row.refresh(model)?;
        }
        Ok(())
    }

    /// Climb to the closest ancestor that is still visible
    fn nearest_visible(&self, model: &TreeModel, mut node: NodeRef) -> Result<NodeRef> {
        while !self.visible.contains(&node) {
            match model.parent(node)? {
                Some(parent) => node = parent,
                None => break,
            }
        }
        Ok(node)
    }

    /// First row to paint so the cursor stays inside a viewport of `height` rows
    pub fn scroll_for(&mut self, height: usize) -> usize {
        let total = self.pool.bound;
        if height == 0 || total <= height {
            self.scroll = 0;
            return 0;
        }
        if let Some(row) = self.cursor_row() {
            if row < self.scroll {
                self.scroll = row;
            } else if row >= self.scroll + height {
                self.scroll = row + 1 - height;
            }
        }
        self.scroll = self.scroll.min(total - height);
        self.scroll
    }

    /// Bound row shown at `offset` rows below the top of the viewport
    pub fn row_at(&self, offset: usize) -> Option<usize> {
        let row = self.scroll + offset;
        (row < self.pool.bound).then_some(row)
    }

    // ── Pointer dispatch ──

    /// Affordance under `column` of bound row `row`, if that row is bound
    pub fn hit_test(&self, row: usize, column: u16) -> Option<RowPart> {
        self.rows().get(row).map(|r| r.part_at(column))
    }

    /// Route a click on bound row `row`. `additive` adds the node to the
    /// focus set instead of replacing it.
    pub fn click(&mut self, model: &mut TreeModel, row: usize, part: RowPart, additive: bool) -> Result<()> {
        let Some(node) = self.rows().get(row).and_then(|r| r.node) else {
            return Ok(());
        };
        match part {
            RowPart::Expander => self.toggle_node(model, node),
            RowPart::Checkbox => self.check_node(model, node),
            RowPart::Label => {
                self.cursor = Some(node);
                let mut focus = if additive { self.focused.clone() } else { BTreeSet::new() };
                if additive && focus.contains(&node) {
                    focus.remove(&node);
                } else {
                    focus.insert(node);
                }
                self.set_focus(model, focus);
                Ok(())
            }
        }
    }

    // ── Keyboard dispatch ──

    /// Move the cursor by `delta` rows in draw order and focus it
    pub fn move_cursor(&mut self, model: &mut TreeModel, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let current = self.cursor_row().unwrap_or(0);
        let last = self.visible.len() - 1;
        let target = current.saturating_add_signed(delta).min(last);
        let node = self.visible[target];
        self.focus_cursor(model, node);
    }

    pub fn cursor_first(&mut self, model: &mut TreeModel) {
        self.move_cursor(model, isize::MIN);
    }

    pub fn cursor_last(&mut self, model: &mut TreeModel) {
        self.move_cursor(model, isize::MAX);
    }

    /// Collapse the cursor node; on a collapsed node or a leaf, step out to the parent
    pub fn collapse(&mut self, model: &mut TreeModel) -> Result<()> {
        let Some(node) = self.cursor else {
            return Ok(());
        };
        if model.set_expanded(node, false)? {
            return self.draw(model);
        }
        if let Some(parent) = model.parent(node)? {
            self.focus_cursor(model, parent);
        }
        Ok(())
    }

    /// Expand the cursor node; on an already expanded node, step into its first child
    pub fn expand(&mut self, model: &mut TreeModel) -> Result<()> {
        let Some(node) = self.cursor else {
            return Ok(());
        };
        if model.child_count(node)? == 0 {
            return Ok(());
        }
        if model.set_expanded(node, true)? {
            return self.draw(model);
        }
        if let Some(child) = model.child_at(node, 0)? {
            self.focus_cursor(model, child);
        }
        Ok(())
    }

    /// Expand every ancestor of `node`, redraw, and put the cursor on it
    pub fn reveal(&mut self, model: &mut TreeModel, node: NodeRef) -> Result<()> {
        let mut ancestor = model.parent(node)?;
        while let Some(a) = ancestor {
            model.set_expanded(a, true)?;
            ancestor = model.parent(a)?;
        }
        self.draw(model)?;
        self.focus_cursor(model, node);
        Ok(())
    }

    pub fn toggle_expanded(&mut self, model: &mut TreeModel) -> Result<()> {
        match self.cursor {
            Some(node) => self.toggle_node(model, node),
            None => Ok(()),
        }
    }

    pub fn toggle_checked(&mut self, model: &mut TreeModel) -> Result<()> {
        match self.cursor {
            Some(node) => self.check_node(model, node),
            None => Ok(()),
        }
    }

    fn toggle_node(&mut self, model: &mut TreeModel, node: NodeRef) -> Result<()> {
        if model.child_count(node)? == 0 {
            return Ok(());
        }
        model.toggle_expanded(node)?;
        self.draw(model)
    }

    /// Checked goes to unchecked; unchecked and indeterminate go to checked
    fn check_node(&mut self, model: &mut TreeModel, node: NodeRef) -> Result<()> {
        let target = model.check_state(node)? != CheckState::Checked;
        if model.set_selected(node, target, true)? {
            self.refresh(model)?;
        }
        Ok(())
    }

    fn focus_cursor(&mut self, model: &mut TreeModel, node: NodeRef) {
        self.cursor = Some(node);
        self.set_focus(model, BTreeSet::from([node]));
    }

    fn set_focus(&mut self, model: &mut TreeModel, focus: BTreeSet<NodeRef>) {
        if focus == self.focused {
            return;
        }
        self.focused = focus;
        for row in &mut self.pool.rows[..self.pool.bound] {
            row.focused = row.node.is_some_and(|n| self.focused.contains(&n));
        }
        model.notify(TreeEvent::FocusChanged {
            nodes: self.focused.iter().copied().collect(),
        });
    }
}

/// Nodes whose ancestors are all expanded, in pre-order
fn visible_nodes(model: &TreeModel) -> Result<Vec<NodeRef>> {
    let mut out = Vec::new();
    let mut stack = vec![model.root()];
    while let Some(node) = stack.pop() {
        out.push(node);
        if model.is_expanded(node)? {
            stack.extend(model.children(node)?.into_iter().rev());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::model::tests::make_model;

    fn drawn(model: &mut TreeModel, capacity: usize) -> VirtualRenderer {
        let mut renderer = VirtualRenderer::new(capacity, 2);
        renderer.draw(model).unwrap();
        renderer
    }

    fn labels(renderer: &VirtualRenderer) -> Vec<String> {
        renderer.rows().iter().map(|r| r.label.clone()).collect()
    }

    /// Count nodes whose ancestors are all expanded, straight from the model
    fn expected_visible(model: &TreeModel, node: NodeRef) -> usize {
        let mut count = 1;
        if model.is_expanded(node).unwrap() {
            for child in model.children(node).unwrap() {
                count += expected_visible(model, child);
            }
        }
        count
    }

    #[test]
    fn initial_draw_shows_root_and_first_level() {
        let mut model = make_model("type,protocol");
        let renderer = drawn(&mut model, 8);
        assert_eq!(labels(&renderer), vec!["All epochs", "A", "B", "C"]);
        let rows = renderer.rows();
        assert_eq!(rows[0].expander, Expander::Expanded);
        assert_eq!(rows[1].expander, Expander::Collapsed);
        assert_eq!(rows[1].indent, 2);
        assert_eq!(rows[1].check, CheckState::Checked);
        assert_eq!(renderer.cursor(), Some(model.root()));
    }

    #[test]
    fn pool_doubles_when_visible_nodes_exceed_capacity() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 2);
        assert_eq!(renderer.pool().capacity(), 4);
        assert_eq!(renderer.pool().growth_events(), 1);

        for child in model.children(model.root()).unwrap() {
            model.set_expanded(child, true).unwrap();
        }
        renderer.draw(&mut model).unwrap();
        // root + 3 types + 5 leaves
        assert_eq!(renderer.pool().bound(), 9);
        assert_eq!(renderer.pool().capacity(), 16);
        assert_eq!(renderer.pool().growth_events(), 2);
    }

    #[test]
    fn collapse_hides_rows_but_keeps_pool() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 2);
        for child in model.children(model.root()).unwrap() {
            model.set_expanded(child, true).unwrap();
        }
        renderer.draw(&mut model).unwrap();
        let capacity = renderer.pool().capacity();

        model.set_expanded(model.root(), false).unwrap();
        renderer.draw(&mut model).unwrap();
        assert_eq!(renderer.pool().bound(), 1);
        assert_eq!(renderer.pool().capacity(), capacity);
        let hidden = &renderer.pool().rows()[1..];
        assert!(hidden.iter().all(|r| !r.visible && r.node.is_none()));
    }

    #[test]
    fn bound_rows_track_visible_nodes_through_toggles() {
        let mut model = make_model("protocol,type");
        let mut renderer = drawn(&mut model, 1);
        for step in 0..12 {
            let rows = renderer.visible().to_vec();
            let target = rows[step % rows.len()];
            let _ = model.toggle_expanded(target).unwrap();
            renderer.draw(&mut model).unwrap();
            let expected = expected_visible(&model, model.root());
            assert_eq!(renderer.pool().bound(), expected);
            let visible_rows = renderer.pool().rows().iter().filter(|r| r.visible).count();
            assert_eq!(visible_rows, expected);
        }
    }

    #[test]
    fn expander_click_toggles_and_redraws() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);
        renderer.click(&mut model, 2, RowPart::Expander, false).unwrap();
        assert_eq!(labels(&renderer), vec!["All epochs", "A", "B", "X", "Y", "C"]);
        assert_eq!(renderer.rows()[2].expander, Expander::Expanded);

        // leaves have no expander; clicking there is ignored
        renderer.click(&mut model, 3, RowPart::Expander, false).unwrap();
        assert_eq!(renderer.rows().len(), 6);
    }

    #[test]
    fn checkbox_click_updates_selection_and_rows() {
        let mut model = make_model("type");
        let mut renderer = drawn(&mut model, 8);
        model.take_events();

        renderer.click(&mut model, 2, RowPart::Checkbox, false).unwrap();
        assert_eq!(model.selected_count(model.root()).unwrap(), 3);
        assert_eq!(renderer.rows()[0].check, CheckState::Indeterminate);
        assert_eq!(renderer.rows()[2].check, CheckState::Unchecked);
        assert_eq!(renderer.rows()[0].selected, 3);

        let events = model.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TreeEvent::SelectionChanged { selected_count: 0, .. }));

        // indeterminate root becomes fully checked
        renderer.click(&mut model, 0, RowPart::Checkbox, false).unwrap();
        assert_eq!(renderer.rows()[0].check, CheckState::Checked);
    }

    #[test]
    fn label_click_focuses_without_touching_selection() {
        let mut model = make_model("type");
        let mut renderer = drawn(&mut model, 8);
        let b = renderer.visible()[2];
        let c = renderer.visible()[3];

        renderer.click(&mut model, 2, RowPart::Label, false).unwrap();
        renderer.click(&mut model, 3, RowPart::Label, true).unwrap();
        assert_eq!(renderer.focused().collect::<Vec<_>>(), vec![b, c]);
        assert!(renderer.rows()[2].focused && renderer.rows()[3].focused);
        assert_eq!(renderer.cursor(), Some(c));
        assert_eq!(model.selected_count(model.root()).unwrap(), 6);

        let events = model.take_events();
        assert_eq!(
            events,
            vec![
                TreeEvent::FocusChanged { nodes: vec![b] },
                TreeEvent::FocusChanged { nodes: vec![b, c] },
            ]
        );
    }

    #[test]
    fn keyboard_moves_in_draw_order() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);

        renderer.move_cursor(&mut model, 2); // B
        renderer.expand(&mut model).unwrap();
        renderer.move_cursor(&mut model, 1); // first child of B, not C
        let b = model
            .child_by_split_value(model.root(), &SplitValue::text("B"))
            .unwrap()
            .unwrap();
        let bx = model.child_at(b, 0).unwrap().unwrap();
        assert_eq!(renderer.cursor(), Some(bx));

        renderer.cursor_last(&mut model);
        assert_eq!(model.label(renderer.cursor().unwrap()).unwrap(), "C");
        renderer.cursor_first(&mut model);
        assert_eq!(renderer.cursor(), Some(model.root()));
    }

    #[test]
    fn keyboard_check_and_collapse() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);
        renderer.move_cursor(&mut model, 1); // A
        renderer.toggle_checked(&mut model).unwrap();
        assert_eq!(model.selected_count(model.root()).unwrap(), 4);

        renderer.expand(&mut model).unwrap();
        assert_eq!(renderer.rows().len(), 6);
        renderer.collapse(&mut model).unwrap();
        assert_eq!(renderer.rows().len(), 4);
    }

    #[test]
    fn expand_and_collapse_step_between_levels() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);
        let root = model.root();

        // root is already expanded: step into A
        renderer.expand(&mut model).unwrap();
        let a = model.child_at(root, 0).unwrap().unwrap();
        assert_eq!(renderer.cursor(), Some(a));

        renderer.expand(&mut model).unwrap();
        renderer.expand(&mut model).unwrap();
        let ax = model.child_at(a, 0).unwrap().unwrap();
        assert_eq!(renderer.cursor(), Some(ax));

        // leaf: step out, then collapse
        renderer.collapse(&mut model).unwrap();
        assert_eq!(renderer.cursor(), Some(a));
        renderer.collapse(&mut model).unwrap();
        assert!(!model.is_expanded(a).unwrap());
        assert_eq!(renderer.cursor(), Some(a));
    }

    #[test]
    fn reveal_expands_ancestors() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);
        let c = model.child_at(model.root(), 2).unwrap().unwrap();
        let cy = model.child_at(c, 0).unwrap().unwrap();
        renderer.reveal(&mut model, cy).unwrap();
        assert!(model.is_expanded(c).unwrap());
        assert_eq!(renderer.cursor_row(), Some(4));
        assert_eq!(renderer.focused().collect::<Vec<_>>(), vec![cy]);
    }

    #[test]
    fn unknown_bucket_rows_are_flagged() {
        let mut model = make_model("missing");
        let renderer = drawn(&mut model, 8);
        assert!(!renderer.rows()[0].unknown);
        assert!(renderer.rows()[1].unknown);
        assert_eq!(renderer.rows()[1].label, "(unknown)");
    }

    #[test]
    fn collapsing_an_ancestor_moves_cursor_up() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 8);
        renderer.move_cursor(&mut model, 1);
        renderer.expand(&mut model).unwrap();
        renderer.move_cursor(&mut model, 1); // A/X
        model.set_expanded(model.root(), false).unwrap();
        renderer.draw(&mut model).unwrap();
        assert_eq!(renderer.cursor(), Some(model.root()));
    }

    #[test]
    fn rebuild_resets_focus_and_cursor() {
        let mut model = make_model("type");
        let mut renderer = drawn(&mut model, 8);
        renderer.click(&mut model, 1, RowPart::Label, false).unwrap();
        model.take_events();

        model.rebuild(crate::tree::GroupingKey::parse_list("protocol").unwrap()).unwrap();
        renderer.draw(&mut model).unwrap();
        assert_eq!(renderer.focused().count(), 0);
        assert_eq!(renderer.cursor(), Some(model.root()));
        assert_eq!(labels(&renderer), vec!["All epochs", "X", "Y"]);
        assert!(model
            .take_events()
            .contains(&TreeEvent::FocusChanged { nodes: Vec::new() }));
    }

    #[test]
    fn part_at_follows_indent() {
        let mut model = make_model("type");
        let renderer = drawn(&mut model, 8);
        let root = &renderer.rows()[0];
        assert_eq!(root.part_at(0), RowPart::Expander);
        assert_eq!(root.part_at(2), RowPart::Checkbox);
        assert_eq!(root.part_at(6), RowPart::Label);

        assert_eq!(renderer.hit_test(0, 3), Some(RowPart::Checkbox));
        assert_eq!(renderer.hit_test(9, 0), None);

        let leaf = &renderer.rows()[1];
        assert_eq!(leaf.part_at(2), RowPart::Label); // no expander on a leaf
        assert_eq!(leaf.part_at(4), RowPart::Checkbox);
        assert_eq!(leaf.part_at(1), RowPart::Label);
    }

    #[test]
    fn scroll_keeps_cursor_in_viewport() {
        let mut model = make_model("type,protocol");
        let mut renderer = drawn(&mut model, 4);
        for child in model.children(model.root()).unwrap() {
            model.set_expanded(child, true).unwrap();
        }
        renderer.draw(&mut model).unwrap();

        assert_eq!(renderer.scroll_for(4), 0);
        renderer.move_cursor(&mut model, 6);
        assert_eq!(renderer.scroll_for(4), 3);
        assert_eq!(renderer.row_at(0), Some(3));
        renderer.move_cursor(&mut model, -5);
        assert_eq!(renderer.scroll_for(4), 1);
        assert_eq!(renderer.row_at(10), None);
    }
}
