use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{Error, Result};

/// Stable identity of an epoch. Exports use integer ids; hand-written
/// datasets may use strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EpochId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpochId::Int(n) => write!(f, "{}", n),
            EpochId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EpochId {
    fn from(n: i64) -> Self {
        EpochId::Int(n)
    }
}

impl From<i32> for EpochId {
    fn from(n: i32) -> Self {
        EpochId::Int(i64::from(n))
    }
}

impl From<&str> for EpochId {
    fn from(s: &str) -> Self {
        EpochId::Text(s.to_string())
    }
}

/// One recorded epoch: an identity plus a nested attribute bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Epoch {
    pub id: EpochId,
    pub attributes: Value,
}

impl Epoch {
    pub fn new(id: impl Into<EpochId>, attributes: Value) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Look up a dotted attribute path (`cell.type`, `responses.0.units`).
    /// Returns `None` when any segment is missing.
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }
}

fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Flat inventory of epochs, immutable after load except for the
/// per-epoch selection flag.
///
/// The flag vector is the single writable location of "is this epoch
/// included". Tree nodes hold store indices and read through here.
#[derive(Debug, Clone)]
pub struct EpochStore {
    epochs: Vec<Epoch>,
    index: HashMap<EpochId, usize>,
    selected: Vec<bool>,
}

impl EpochStore {
    /// Build a store; every epoch starts selected.
    pub fn new(epochs: Vec<Epoch>) -> Result<Self> {
        let mut index = HashMap::with_capacity(epochs.len());
        for (i, epoch) in epochs.iter().enumerate() {
            if index.insert(epoch.id.clone(), i).is_some() {
                return Err(Error::DuplicateEpoch(epoch.id.clone()));
            }
        }
        let selected = vec![true; epochs.len()];
        Ok(Self {
            epochs,
            index,
            selected,
        })
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epoch(&self, index: usize) -> &Epoch {
        &self.epochs[index]
    }

    pub fn id(&self, index: usize) -> &EpochId {
        &self.epochs[index].id
    }

    pub fn index_of(&self, id: &EpochId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.iter()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected[index]
    }

    pub fn selected_len(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    /// Write one selection flag. Returns whether the flag changed.
    /// Only the selection controller calls this, so tree counts never drift.
    pub(crate) fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        let slot = &mut self.selected[index];
        if *slot == selected {
            return false;
        }
        *slot = selected;
        true
    }

    /// Full identity -> selected mapping for external serialization.
    pub fn selection_map(&self) -> BTreeMap<EpochId, bool> {
        self.epochs
            .iter()
            .zip(&self.selected)
            .map(|(e, s)| (e.id.clone(), *s))
            .collect()
    }

    /// SHA-256 over the ordered identity list
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for epoch in self.iter() {
            hasher.update(epoch.id.to_string().as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}
