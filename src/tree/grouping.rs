//! Recursive partition of the epoch inventory into a tree.
//!
//! `build` is a pure function of the store's attributes and the key list:
//! it never mutates the store, and the only store state it reads besides
//! attributes is the selection flags, to seed the running counts.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::model::{EpochTree, Node, NodeKind};
use crate::epoch::cell_type::full_cell_type_name;
use crate::epoch::{Epoch, EpochStore};
use crate::error::{Error, Result};

/// The value a grouping key extracted for one epoch.
#[derive(Debug, Clone)]
pub enum SplitValue {
    /// Missing path or JSON null. Collected into one trailing bucket.
    Unknown,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Hashable form of a split value; two epochs share a bucket iff equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Bucket {
    Unknown,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl SplitValue {
    /// Convert an attribute value. Arrays and objects have no stable
    /// ordering and are rejected.
    pub fn from_json(value: Option<&Value>) -> std::result::Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(SplitValue::Unknown),
            Some(Value::Bool(b)) => Ok(SplitValue::Bool(*b)),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(SplitValue::Number)
                .ok_or_else(|| format!("number {} cannot be ordered", n)),
            Some(Value::String(s)) => Ok(SplitValue::Text(s.clone())),
            Some(Value::Array(_)) => Err("array values cannot be grouped".to_string()),
            Some(Value::Object(_)) => Err("object values cannot be grouped".to_string()),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        SplitValue::Text(s.into())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SplitValue::Unknown)
    }

    fn bucket(&self) -> Bucket {
        match self {
            SplitValue::Unknown => Bucket::Unknown,
            SplitValue::Bool(b) => Bucket::Bool(*b),
            // -0.0 and 0.0 compare equal, so they must share a bucket
            SplitValue::Number(n) if *n == 0.0 => Bucket::Number(0.0f64.to_bits()),
            SplitValue::Number(n) => Bucket::Number(n.to_bits()),
            SplitValue::Text(s) => Bucket::Text(s.clone()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            SplitValue::Bool(_) => 0,
            SplitValue::Number(_) => 1,
            SplitValue::Text(_) => 2,
            SplitValue::Unknown => 3,
        }
    }

    fn check_orderable(self) -> std::result::Result<Self, String> {
        match self {
            SplitValue::Number(n) if !n.is_finite() => Err(format!("{} cannot be ordered", n)),
            other => Ok(other),
        }
    }
}

impl PartialEq for SplitValue {
    fn eq(&self, other: &Self) -> bool {
        self.bucket() == other.bucket()
    }
}

impl fmt::Display for SplitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitValue::Unknown => write!(f, "(unknown)"),
            SplitValue::Bool(b) => write!(f, "{}", b),
            SplitValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            SplitValue::Number(n) => write!(f, "{}", n),
            SplitValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Caller-supplied extractor. Must not mutate the epoch.
pub type KeyFn = Rc<dyn Fn(&Epoch) -> std::result::Result<SplitValue, String>>;

/// One level of the grouping hierarchy.
#[derive(Clone)]
pub enum GroupingKey {
    /// Dotted attribute path into the epoch's attribute bag
    Path(String),
    /// Named pure function over one epoch
    Computed { name: String, extract: KeyFn },
}

impl fmt::Debug for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingKey::Path(p) => f.debug_tuple("Path").field(p).finish(),
            GroupingKey::Computed { name, .. } => {
                f.debug_struct("Computed").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

/// Built-in computed keys, addressed as `@name`
const BUILTIN_KEYS: &[&str] = &["cell_type", "date", "block"];

impl GroupingKey {
    pub fn path(path: impl Into<String>) -> Self {
        GroupingKey::Path(path.into())
    }

    pub fn computed(
        name: impl Into<String>,
        extract: impl Fn(&Epoch) -> std::result::Result<SplitValue, String> + 'static,
    ) -> Self {
        GroupingKey::Computed {
            name: name.into(),
            extract: Rc::new(extract),
        }
    }

    /// Display name; also the string `parse` accepts back.
    pub fn name(&self) -> &str {
        match self {
            GroupingKey::Path(p) => p,
            GroupingKey::Computed { name, .. } => name,
        }
    }

    /// Parse one key: `@name` selects a built-in computed key, anything
    /// else is an attribute path.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidKey("empty key".to_string()));
        }
        match text.strip_prefix('@') {
            Some(name) => builtin(name).ok_or_else(|| {
                Error::InvalidKey(format!(
                    "unknown built-in '@{}' (available: {})",
                    name,
                    BUILTIN_KEYS
                        .iter()
                        .map(|k| format!("@{}", k))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }),
            None if text.split('.').any(str::is_empty) => {
                Err(Error::InvalidKey(format!("malformed path '{}'", text)))
            }
            None => Ok(GroupingKey::path(text)),
        }
    }

    /// Parse a comma-separated key list. Empty segments are skipped.
    pub fn parse_list(list: &str) -> Result<Vec<Self>> {
        list.split(',')
            .filter(|s| !s.trim().is_empty())
            .map(GroupingKey::parse)
            .collect()
    }

    pub fn extract(&self, epoch: &Epoch) -> std::result::Result<SplitValue, String> {
        match self {
            GroupingKey::Path(path) => SplitValue::from_json(epoch.attribute(path)),
            GroupingKey::Computed { extract, .. } => extract(epoch),
        }
    }
}

fn builtin(name: &str) -> Option<GroupingKey> {
    let key = match name {
        "cell_type" => GroupingKey::computed("@cell_type", |epoch| {
            match epoch.attribute("cell.type") {
                Some(Value::String(code)) => Ok(SplitValue::Text(full_cell_type_name(code))),
                other => SplitValue::from_json(other).and_then(|v| match v {
                    SplitValue::Unknown => Ok(v),
                    _ => Err("cell.type is not a string".to_string()),
                }),
            }
        }),
        "date" => GroupingKey::computed("@date", |epoch| match epoch.attribute("start_time") {
            Some(Value::String(ts)) if ts.is_empty() => Ok(SplitValue::Unknown),
            Some(Value::String(ts)) => Ok(SplitValue::Text(ts.chars().take(10).collect())),
            None | Some(Value::Null) => Ok(SplitValue::Unknown),
            Some(_) => Err("start_time is not a string".to_string()),
        }),
        "block" => GroupingKey::computed("@block", |epoch| match epoch.attribute("block.label") {
            Some(Value::String(label)) if !label.is_empty() => Ok(SplitValue::text(label.clone())),
            _ => SplitValue::from_json(epoch.attribute("block.id")),
        }),
        _ => return None,
    };
    Some(key)
}

/// Build a tree by partitioning every epoch in `store` by `keys`, in order.
///
/// Either the whole tree is returned or an error; nothing partial escapes.
pub fn build(store: &EpochStore, keys: &[GroupingKey]) -> Result<EpochTree> {
    let mut nodes = Vec::new();
    let all: Vec<usize> = (0..store.len()).collect();
    let root = grow(&mut nodes, store, keys, all, None, None, 0)?;
    log::debug!(
        "built tree: {} nodes, {} epochs, keys [{}]",
        nodes.len(),
        store.len(),
        keys.iter().map(GroupingKey::name).collect::<Vec<_>>().join(", ")
    );
    Ok(EpochTree { nodes, root })
}

fn grow(
    nodes: &mut Vec<Node>,
    store: &EpochStore,
    keys: &[GroupingKey],
    epochs: Vec<usize>,
    parent: Option<usize>,
    split_value: Option<SplitValue>,
    depth: usize,
) -> Result<usize> {
    let index = nodes.len();
    nodes.push(Node {
        parent,
        depth,
        split_value,
        kind: NodeKind::Leaf { epochs: Vec::new() },
        epoch_count: epochs.len(),
        selected_count: epochs.iter().filter(|&&e| store.is_selected(e)).count(),
        expanded: parent.is_none(),
    });

    let Some((key, rest)) = keys.split_first() else {
        nodes[index].kind = NodeKind::Leaf { epochs };
        return Ok(index);
    };

    let groups = partition(store, key, epochs)?;
    let mut children = Vec::with_capacity(groups.len());
    for (value, members) in groups {
        children.push(grow(nodes, store, rest, members, Some(index), Some(value), depth + 1)?);
    }
    nodes[index].kind = NodeKind::Internal {
        split_key: key.name().to_string(),
        children,
    };
    Ok(index)
}

/// Stable group-by: members keep their input order within a bucket.
fn partition(
    store: &EpochStore,
    key: &GroupingKey,
    epochs: Vec<usize>,
) -> Result<Vec<(SplitValue, Vec<usize>)>> {
    let mut slots: HashMap<Bucket, usize> = HashMap::new();
    let mut groups: Vec<(SplitValue, Vec<usize>)> = Vec::new();

    for index in epochs {
        let epoch = store.epoch(index);
        let value = key
            .extract(epoch)
            .and_then(SplitValue::check_orderable)
            .map_err(|reason| Error::GroupingFailed {
                key: key.name().to_string(),
                epoch: epoch.id.clone(),
                reason,
            })?;
        match slots.entry(value.bucket()) {
            Entry::Occupied(slot) => groups[*slot.get()].1.push(index),
            Entry::Vacant(slot) => {
                slot.insert(groups.len());
                groups.push((value, vec![index]));
            }
        }
    }

    let numeric = groups
        .iter()
        .all(|(v, _)| matches!(v, SplitValue::Number(_) | SplitValue::Unknown));
    groups.sort_by(|(a, _), (b, _)| compare_split_values(a, b, numeric));
    Ok(groups)
}

/// Sibling order: unknown last, numbers ascending when every sibling is
/// numeric, otherwise string form with a type tie-break.
fn compare_split_values(a: &SplitValue, b: &SplitValue, numeric: bool) -> Ordering {
    match (a, b) {
        (SplitValue::Unknown, SplitValue::Unknown) => Ordering::Equal,
        (SplitValue::Unknown, _) => Ordering::Greater,
        (_, SplitValue::Unknown) => Ordering::Less,
        (SplitValue::Number(x), SplitValue::Number(y)) if numeric => x.total_cmp(y),
        _ => a
            .to_string()
            .cmp(&b.to_string())
            .then_with(|| a.type_rank().cmp(&b.type_rank())),
    }
}
