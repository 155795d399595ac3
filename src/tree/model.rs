use std::fmt;

use super::grouping::{self, GroupingKey, SplitValue};
use crate::epoch::{EpochId, EpochStore};
use crate::error::{Error, Result};

/// Label shown for the root node
pub const ROOT_LABEL: &str = "All epochs";

// ── Arena ──

/// Internal vs leaf payload. Every consumer matches both arms.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Internal {
        /// Name of the key that produced the children
        split_key: String,
        children: Vec<usize>,
    },
    Leaf {
        /// Store indices, never copies of epochs
        epochs: Vec<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Back reference for upward count propagation; ownership is top-down
    pub(crate) parent: Option<usize>,
    pub(crate) depth: usize,
    /// `None` only for the root
    pub(crate) split_value: Option<SplitValue>,
    pub(crate) kind: NodeKind,
    pub(crate) epoch_count: usize,
    pub(crate) selected_count: usize,
    pub(crate) expanded: bool,
}

/// One complete grouping result. Replaced wholesale on rebuild.
#[derive(Debug, Clone)]
pub struct EpochTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: usize,
}

impl EpochTree {
    pub(crate) fn child_indices(&self, index: usize) -> &[usize] {
        match &self.nodes[index].kind {
            NodeKind::Internal { children, .. } => children,
            NodeKind::Leaf { .. } => &[],
        }
    }

    /// Pre-order walk of the subtree rooted at `index`
    pub(crate) fn pre_order(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.child_indices(i).iter().rev());
        }
        out
    }

    pub(crate) fn leaves_under(&self, index: usize) -> Vec<usize> {
        self.pre_order(index)
            .into_iter()
            .filter(|&i| matches!(self.nodes[i].kind, NodeKind::Leaf { .. }))
            .collect()
    }
}

// ── Handles & events ──

/// Handle to a node of one specific tree generation.
///
/// Handles do not survive a rebuild: using one afterwards fails with
/// [`Error::NodeInvalidated`]. Re-fetch nodes from [`TreeModel::root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    generation: u64,
    index: usize,
}

impl NodeRef {
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tri-state check box, derived from counts and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Checked,
    Indeterminate,
}

impl CheckState {
    pub fn from_counts(selected: usize, total: usize) -> Self {
        if selected == 0 {
            CheckState::Unchecked
        } else if selected >= total {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }
}

/// Notifications for the UI host, drained with [`TreeModel::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent {
    Rebuilt { generation: u64 },
    SelectionChanged { node: NodeRef, selected_count: usize },
    ExpansionChanged { node: NodeRef, expanded: bool },
    FocusChanged { nodes: Vec<NodeRef> },
}

// ── Model ──

/// The live tree bound to the epoch inventory.
///
/// Owns the store, so all selection writes pass through one place.
pub struct TreeModel {
    pub(crate) store: EpochStore,
    pub(crate) tree: EpochTree,
    keys: Vec<GroupingKey>,
    generation: u64,
    pub(crate) events: Vec<TreeEvent>,
}

impl fmt::Debug for TreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("epochs", &self.store.len())
            .field("nodes", &self.tree.nodes.len())
            .field("keys", &self.keys)
            .field("generation", &self.generation)
            .finish()
    }
}

impl TreeModel {
    pub fn new(store: EpochStore, keys: Vec<GroupingKey>) -> Result<Self> {
        let tree = grouping::build(&store, &keys)?;
        Ok(Self {
            store,
            tree,
            keys,
            generation: 1,
            events: Vec::new(),
        })
    }

    /// Replace the tree with one grouped by `keys`.
    ///
    /// On error the previous tree stays live and its handles stay valid.
    /// On success every previously returned [`NodeRef`] is invalidated.
    pub fn rebuild(&mut self, keys: Vec<GroupingKey>) -> Result<()> {
        let tree = grouping::build(&self.store, &keys)?;
        self.tree = tree;
        self.keys = keys;
        self.generation += 1;
        log::info!(
            "rebuilt tree generation {} ({} nodes)",
            self.generation,
            self.tree.nodes.len()
        );
        self.events.push(TreeEvent::Rebuilt {
            generation: self.generation,
        });
        Ok(())
    }

    pub fn store(&self) -> &EpochStore {
        &self.store
    }

    pub fn keys(&self) -> &[GroupingKey] {
        &self.keys
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node_count(&self) -> usize {
        self.tree.nodes.len()
    }

    pub fn root(&self) -> NodeRef {
        self.handle(self.tree.root)
    }

    pub(crate) fn handle(&self, index: usize) -> NodeRef {
        NodeRef {
            generation: self.generation,
            index,
        }
    }

    pub(crate) fn resolve(&self, node: NodeRef) -> Result<usize> {
        if node.generation != self.generation {
            return Err(Error::NodeInvalidated {
                held: node.generation,
                live: self.generation,
            });
        }
        Ok(node.index)
    }

    fn node(&self, node: NodeRef) -> Result<&Node> {
        Ok(&self.tree.nodes[self.resolve(node)?])
    }

    // ── Navigation ──

    pub fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let index = self.resolve(node)?;
        Ok(self
            .tree
            .child_indices(index)
            .iter()
            .map(|&c| self.handle(c))
            .collect())
    }

    pub fn child_count(&self, node: NodeRef) -> Result<usize> {
        Ok(self.tree.child_indices(self.resolve(node)?).len())
    }

    pub fn child_at(&self, node: NodeRef, position: usize) -> Result<Option<NodeRef>> {
        let index = self.resolve(node)?;
        Ok(self
            .tree
            .child_indices(index)
            .get(position)
            .map(|&c| self.handle(c)))
    }

    pub fn child_by_split_value(
        &self,
        node: NodeRef,
        value: &SplitValue,
    ) -> Result<Option<NodeRef>> {
        let index = self.resolve(node)?;
        Ok(self
            .tree
            .child_indices(index)
            .iter()
            .find(|&&c| self.tree.nodes[c].split_value.as_ref() == Some(value))
            .map(|&c| self.handle(c)))
    }

    pub fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        Ok(self.node(node)?.parent.map(|p| self.handle(p)))
    }

    /// Every leaf under `node`, in pre-order (children left to right).
    pub fn leaf_nodes(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let index = self.resolve(node)?;
        Ok(self
            .tree
            .leaves_under(index)
            .into_iter()
            .map(|l| self.handle(l))
            .collect())
    }

    /// Identities of every epoch under `node`, in leaf pre-order.
    ///
    /// With `only_selected` the filter reads the store's selection flags
    /// directly. This is the only sanctioned way to obtain the selected
    /// epochs of a node; an empty result is valid.
    pub fn all_epochs(&self, node: NodeRef, only_selected: bool) -> Result<Vec<EpochId>> {
        let index = self.resolve(node)?;
        let mut out = Vec::with_capacity(self.tree.nodes[index].epoch_count);
        for leaf in self.tree.leaves_under(index) {
            if let NodeKind::Leaf { epochs } = &self.tree.nodes[leaf].kind {
                out.extend(
                    epochs
                        .iter()
                        .filter(|&&e| !only_selected || self.store.is_selected(e))
                        .map(|&e| self.store.id(e).clone()),
                );
            }
        }
        Ok(out)
    }

    pub fn depth(&self, node: NodeRef) -> Result<usize> {
        Ok(self.node(node)?.depth)
    }

    pub fn epoch_count(&self, node: NodeRef) -> Result<usize> {
        Ok(self.node(node)?.epoch_count)
    }

    pub fn selected_count(&self, node: NodeRef) -> Result<usize> {
        Ok(self.node(node)?.selected_count)
    }

    pub fn check_state(&self, node: NodeRef) -> Result<CheckState> {
        let n = self.node(node)?;
        Ok(CheckState::from_counts(n.selected_count, n.epoch_count))
    }

    pub fn is_leaf(&self, node: NodeRef) -> Result<bool> {
        Ok(matches!(self.node(node)?.kind, NodeKind::Leaf { .. }))
    }

    /// Key that split this node's children; `None` for leaves
    pub fn split_key(&self, node: NodeRef) -> Result<Option<&str>> {
        Ok(match &self.node(node)?.kind {
            NodeKind::Internal { split_key, .. } => Some(split_key.as_str()),
            NodeKind::Leaf { .. } => None,
        })
    }

    pub fn split_value(&self, node: NodeRef) -> Result<Option<&SplitValue>> {
        Ok(self.node(node)?.split_value.as_ref())
    }

    pub fn label(&self, node: NodeRef) -> Result<String> {
        Ok(match &self.node(node)?.split_value {
            Some(value) => value.to_string(),
            None => ROOT_LABEL.to_string(),
        })
    }

    /// Split values from the root down to `node` (empty for the root)
    pub fn path(&self, node: NodeRef) -> Result<Vec<SplitValue>> {
        let mut index = self.resolve(node)?;
        let mut out = Vec::new();
        while let Some(parent) = self.tree.nodes[index].parent {
            if let Some(value) = &self.tree.nodes[index].split_value {
                out.push(value.clone());
            }
            index = parent;
        }
        out.reverse();
        Ok(out)
    }

    /// Follow split values down from the root of the live tree
    pub fn find_path(&self, path: &[SplitValue]) -> Option<NodeRef> {
        let mut node = self.root();
        for value in path {
            node = self.child_by_split_value(node, value).ok()??;
        }
        Some(node)
    }

    // ── Expansion ──

    pub fn is_expanded(&self, node: NodeRef) -> Result<bool> {
        Ok(self.node(node)?.expanded)
    }

    /// Returns whether the flag changed
    pub fn set_expanded(&mut self, node: NodeRef, expanded: bool) -> Result<bool> {
        let index = self.resolve(node)?;
        let slot = &mut self.tree.nodes[index].expanded;
        if *slot == expanded {
            return Ok(false);
        }
        *slot = expanded;
        self.events.push(TreeEvent::ExpansionChanged { node, expanded });
        Ok(true)
    }

    /// Flip the flag; returns the new state
    pub fn toggle_expanded(&mut self, node: NodeRef) -> Result<bool> {
        let expanded = !self.is_expanded(node)?;
        self.set_expanded(node, expanded)?;
        Ok(expanded)
    }

    // ── Events ──

    pub fn notify(&mut self, event: TreeEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }
}
