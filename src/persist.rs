use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::epoch::EpochId;
use crate::tree::TreeModel;

const FORMAT_VERSION: u32 = 1;

/// On-disk selection state: one entry per epoch identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionFile {
    pub format_version: u32,
    /// Fingerprint of the dataset the selection was taken from
    pub dataset: String,
    pub entries: Vec<SelectionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionEntry {
    pub id: EpochId,
    pub selected: bool,
}

impl SelectionFile {
    pub fn from_model(model: &TreeModel) -> Self {
        let store = model.store();
        Self {
            format_version: FORMAT_VERSION,
            dataset: store.fingerprint(),
            entries: store
                .selection_map()
                .into_iter()
                .map(|(id, selected)| SelectionEntry { id, selected })
                .collect(),
        }
    }

    /// Restore into `model` as one batch. A fingerprint mismatch is only a
    /// warning: entries whose identity exists are still applied.
    pub fn apply(&self, model: &mut TreeModel) -> usize {
        if self.dataset != model.store().fingerprint() {
            log::warn!("selection file was saved for a different dataset; applying matching epochs only");
        }
        let map: BTreeMap<EpochId, bool> = self
            .entries
            .iter()
            .map(|e| (e.id.clone(), e.selected))
            .collect();
        model.restore_selection(&map)
    }
}

/// `<data>.selection.json` beside the dataset
pub fn default_selection_path(data: &Path) -> PathBuf {
    let mut name = data.file_name().unwrap_or_default().to_os_string();
    name.push(".selection.json");
    data.with_file_name(name)
}

pub fn save_selection(path: &Path, model: &TreeModel) -> Result<()> {
    let file = SelectionFile::from_model(model);
    let content = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, format!("{}\n", content))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("saved selection of {} epochs to {}", file.entries.len(), path.display());
    Ok(())
}

/// Load a selection file; `Ok(None)` when it does not exist yet.
pub fn load_selection(path: &Path) -> Result<Option<SelectionFile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let file: SelectionFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if file.format_version != FORMAT_VERSION {
        log::warn!(
            "{} has format_version {}, expected {}",
            path.display(),
            file.format_version,
            FORMAT_VERSION
        );
    }
    Ok(Some(file))
}
