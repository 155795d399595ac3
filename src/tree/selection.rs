//! Tri-state selection with incrementally maintained counts.
//!
//! The per-epoch flag in the store is the only stored selection state.
//! Node counts are running totals over those flags: a subtree write
//! recounts that subtree bottom-up, then shifts every strict ancestor by
//! the net delta, so ancestors cost O(depth).

use std::collections::BTreeMap;

use super::model::{EpochTree, NodeKind, NodeRef, TreeEvent, TreeModel};
use crate::epoch::{EpochId, EpochStore};
use crate::error::Result;

impl TreeModel {
    /// Include or exclude the epochs under `node`.
    ///
    /// `recursive` writes every descendant leaf. Without it only a leaf's
    /// own epochs can change; an internal node is left untouched. Returns
    /// whether anything changed. One `SelectionChanged` event is queued per
    /// effective call, none for a no-op.
    pub fn set_selected(&mut self, node: NodeRef, selected: bool, recursive: bool) -> Result<bool> {
        let index = self.resolve(node)?;
        if !self.tree.apply_selection(&mut self.store, index, selected, recursive) {
            return Ok(false);
        }
        let selected_count = self.tree.nodes[index].selected_count;
        self.events.push(TreeEvent::SelectionChanged {
            node,
            selected_count,
        });
        Ok(true)
    }

    /// Select or clear everything
    pub fn select_all(&mut self, selected: bool) -> bool {
        let root = self.root();
        self.set_selected(root, selected, true).unwrap_or(false)
    }

    /// Apply a saved identity -> selected mapping as one batch, then
    /// recount the whole tree once. Identities not in the store are
    /// skipped. Returns how many entries were applied.
    pub fn restore_selection(&mut self, selection: &BTreeMap<EpochId, bool>) -> usize {
        let mut applied = 0;
        let mut unknown = 0;
        for (id, &selected) in selection {
            match self.store.index_of(id) {
                Some(index) => {
                    self.store.set_selected(index, selected);
                    applied += 1;
                }
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            log::warn!("skipped {} saved selections for unknown epochs", unknown);
        }
        self.tree.recount(&self.store);

        let root = self.root();
        let selected_count = self.tree.nodes[self.tree.root].selected_count;
        self.events.push(TreeEvent::SelectionChanged {
            node: root,
            selected_count,
        });
        applied
    }
}

impl EpochTree {
    pub(crate) fn apply_selection(
        &mut self,
        store: &mut EpochStore,
        index: usize,
        selected: bool,
        recursive: bool,
    ) -> bool {
        let node = &self.nodes[index];
        let target = if selected { node.epoch_count } else { 0 };
        if node.selected_count == target {
            return false;
        }
        if !recursive && matches!(node.kind, NodeKind::Internal { .. }) {
            log::debug!("non-recursive selection on internal node {} ignored", index);
            return false;
        }

        let before = node.selected_count;
        for i in self.pre_order(index).into_iter().rev() {
            let count = match &self.nodes[i].kind {
                NodeKind::Leaf { epochs } => {
                    for &e in epochs {
                        store.set_selected(e, selected);
                    }
                    if selected {
                        self.nodes[i].epoch_count
                    } else {
                        0
                    }
                }
                NodeKind::Internal { children, .. } => {
                    children.iter().map(|&c| self.nodes[c].selected_count).sum()
                }
            };
            self.nodes[i].selected_count = count;
        }
        let after = self.nodes[index].selected_count;

        let mut cursor = self.nodes[index].parent;
        while let Some(p) = cursor {
            let ancestor = &mut self.nodes[p];
            ancestor.selected_count = ancestor.selected_count + after - before;
            cursor = ancestor.parent;
        }
        true
    }

    /// Recompute every count from the store in one bottom-up pass.
    pub(crate) fn recount(&mut self, store: &EpochStore) {
        for i in self.pre_order(self.root).into_iter().rev() {
            let count = match &self.nodes[i].kind {
                NodeKind::Leaf { epochs } => epochs.iter().filter(|&&e| store.is_selected(e)).count(),
                NodeKind::Internal { children, .. } => {
                    children.iter().map(|&c| self.nodes[c].selected_count).sum()
                }
            };
            self.nodes[i].selected_count = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::grouping::SplitValue;
    use crate::tree::model::tests::make_model;
    use crate::tree::model::CheckState;

    /// Every internal count equals the sum of its children, and every
    /// leaf count matches the store.
    fn assert_counts_consistent(model: &TreeModel) {
        let tree = &model.tree;
        for (i, node) in tree.nodes.iter().enumerate() {
            let expected = match &node.kind {
                NodeKind::Leaf { epochs } => epochs.iter().filter(|&&e| model.store.is_selected(e)).count(),
                NodeKind::Internal { children, .. } => {
                    children.iter().map(|&c| tree.nodes[c].selected_count).sum()
                }
            };
            assert_eq!(node.selected_count, expected, "node {}", i);
        }
    }

    fn child(model: &TreeModel, parent: NodeRef, value: &str) -> NodeRef {
        model
            .child_by_split_value(parent, &SplitValue::text(value))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn deselecting_a_leaf_updates_root_and_extraction() {
        let mut model = make_model("type");
        let root = model.root();
        let b = child(&model, root, "B");

        assert!(model.set_selected(b, false, true).unwrap());
        assert_eq!(model.selected_count(root).unwrap(), 3);
        assert_eq!(model.check_state(root).unwrap(), CheckState::Indeterminate);
        assert_eq!(model.check_state(b).unwrap(), CheckState::Unchecked);

        let selected = model.all_epochs(root, true).unwrap();
        let b_ids = model.all_epochs(b, false).unwrap();
        assert_eq!(selected.len(), 3);
        assert!(b_ids.iter().all(|id| !selected.contains(id)));
        assert!(model.all_epochs(b, true).unwrap().is_empty());
        assert_counts_consistent(&model);
    }

    #[test]
    fn branch_deselect_then_reselect_restores_counts() {
        let mut model = make_model("type,protocol");
        let root = model.root();
        let a = child(&model, root, "A");
        let before = model.selected_count(root).unwrap();

        model.set_selected(a, false, true).unwrap();
        assert_eq!(model.selected_count(root).unwrap(), before - 2);
        assert_counts_consistent(&model);

        model.set_selected(a, true, true).unwrap();
        assert_eq!(model.selected_count(root).unwrap(), before);
        assert_eq!(model.check_state(root).unwrap(), CheckState::Checked);
        assert_counts_consistent(&model);
    }

    #[test]
    fn no_lost_update_after_select_all() {
        let mut model = make_model("type,protocol");
        let root = model.root();
        model.select_all(true);
        let b = child(&model, root, "B");
        let leaf = child(&model, b, "X");
        let ancestors = [root, b];
        let before: Vec<usize> = ancestors.iter().map(|&n| model.selected_count(n).unwrap()).collect();

        model.set_selected(leaf, false, true).unwrap();
        assert_eq!(model.selected_count(b).unwrap(), 1);
        model.set_selected(leaf, true, true).unwrap();

        let after: Vec<usize> = ancestors.iter().map(|&n| model.selected_count(n).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn matching_state_is_a_silent_no_op() {
        let mut model = make_model("type");
        let root = model.root();
        let a = child(&model, root, "A");
        assert!(!model.set_selected(a, true, true).unwrap());
        assert!(model.take_events().is_empty());
    }

    #[test]
    fn one_event_per_call_regardless_of_subtree_size() {
        let mut model = make_model("type,protocol");
        let root = model.root();
        model.set_selected(root, false, true).unwrap();
        assert_eq!(
            model.take_events(),
            vec![TreeEvent::SelectionChanged {
                node: root,
                selected_count: 0
            }]
        );
    }

    #[test]
    fn non_recursive_only_touches_leaves() {
        let mut model = make_model("type,protocol");
        let root = model.root();
        let a = child(&model, root, "A");
        assert!(!model.set_selected(a, false, false).unwrap());
        assert_eq!(model.selected_count(root).unwrap(), 6);

        let ax = child(&model, a, "X");
        assert!(model.set_selected(ax, false, false).unwrap());
        assert_eq!(model.selected_count(a).unwrap(), 1);
        assert_eq!(model.selected_count(root).unwrap(), 5);
        assert_counts_consistent(&model);
    }

    #[test]
    fn indeterminate_node_can_be_fully_checked() {
        let mut model = make_model("type,protocol");
        let root = model.root();
        let b = child(&model, root, "B");
        let bx = child(&model, b, "X");
        model.set_selected(bx, false, true).unwrap();
        assert_eq!(model.check_state(b).unwrap(), CheckState::Indeterminate);

        model.set_selected(b, true, true).unwrap();
        assert_eq!(model.check_state(b).unwrap(), CheckState::Checked);
        assert_eq!(model.selected_count(root).unwrap(), 6);
    }

    #[test]
    fn arbitrary_sequence_keeps_counts_consistent() {
        let mut model = make_model("protocol,type");
        let mut toggle = false;
        for _ in 0..4 {
            for leaf in model.leaf_nodes(model.root()).unwrap() {
                model.set_selected(leaf, toggle, true).unwrap();
                assert_counts_consistent(&model);
                toggle = !toggle;
            }
            let x = child(&model, model.root(), "X");
            model.set_selected(x, toggle, true).unwrap();
            assert_counts_consistent(&model);
        }
    }

    #[test]
    fn selection_survives_rebuild() {
        let mut model = make_model("type");
        let b = child(&model, model.root(), "B");
        model.set_selected(b, false, true).unwrap();

        model.rebuild(crate::tree::GroupingKey::parse_list("protocol").unwrap()).unwrap();
        assert_eq!(model.selected_count(model.root()).unwrap(), 3);
        assert_counts_consistent(&model);
    }

    #[test]
    fn restore_applies_batch_and_recounts() {
        let mut model = make_model("type");
        let mut saved = BTreeMap::new();
        saved.insert(EpochId::Int(1), false);
        saved.insert(EpochId::Int(4), false);
        saved.insert(EpochId::Int(99), false);

        assert_eq!(model.restore_selection(&saved), 2);
        assert_eq!(model.selected_count(model.root()).unwrap(), 4);
        let a = child(&model, model.root(), "A");
        assert_eq!(model.check_state(a).unwrap(), CheckState::Indeterminate);
        assert_counts_consistent(&model);
        assert_eq!(model.take_events().len(), 1);
    }
}
