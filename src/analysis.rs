//! Consumers of a node's selected epochs.
//!
//! Analyses receive the identities from `TreeModel::all_epochs(node, true)`
//! and look epochs up through the store; they never read leaf lists.

use std::collections::BTreeMap;

use crate::epoch::{EpochId, EpochStore};
use crate::tree::SplitValue;

pub trait Analysis {
    fn name(&self) -> &str;

    /// Summarize `epochs` as label/value rows. An empty slice is a valid
    /// input and must not be treated as a failure.
    fn run(&self, store: &EpochStore, epochs: &[EpochId]) -> Vec<(String, String)>;
}

/// Distinct values of a few attribute paths across the given epochs.
pub struct AttributeSummary {
    paths: Vec<String>,
    /// Values listed per path before collapsing into a count
    max_listed: usize,
}

impl AttributeSummary {
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths,
            max_listed: 4,
        }
    }
}

impl Analysis for AttributeSummary {
    fn name(&self) -> &str {
        "Attributes"
    }

    fn run(&self, store: &EpochStore, epochs: &[EpochId]) -> Vec<(String, String)> {
        let mut rows = vec![("epochs".to_string(), epochs.len().to_string())];
        for path in &self.paths {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for id in epochs {
                let Some(index) = store.index_of(id) else {
                    continue;
                };
                let label = match SplitValue::from_json(store.epoch(index).attribute(path)) {
                    Ok(value) => value.to_string(),
                    Err(_) => "(complex)".to_string(),
                };
                *counts.entry(label).or_default() += 1;
            }
            let value = match counts.len() {
                0 => "-".to_string(),
                n if n > self.max_listed => format!("{} distinct", n),
                _ => counts
                    .iter()
                    .map(|(v, c)| format!("{} ×{}", v, c))
                    .collect::<Vec<_>>()
                    .join(", "),
            };
            rows.push((path.clone(), value));
        }
        rows
    }
}
