use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-dataset config file, looked up beside the data file
pub const LOCAL_CONFIG_NAME: &str = ".etree.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtConfig {
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

/// [grouping] section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Keys applied on startup, outermost first (paths or `@builtin`)
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Columns of indentation per tree level
    #[serde(default = "default_indent_width")]
    pub indent_width: u8,
    #[serde(default = "default_true")]
    pub show_counts: bool,
    /// Initial row widget pool size; grows by doubling
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Attribute paths summarized in the detail panel
    #[serde(default = "default_summary_paths")]
    pub summary_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Write the selection file on quit
    #[serde(default = "default_true")]
    pub autosave: bool,
}

fn default_true() -> bool {
    true
}

fn default_keys() -> Vec<String> {
    vec!["cell.type".into(), "block.protocol_name".into()]
}

fn default_indent_width() -> u8 {
    2
}

fn default_pool_capacity() -> usize {
    64
}

fn default_summary_paths() -> Vec<String> {
    vec![
        "experiment.exp_name".into(),
        "cell.type".into(),
        "block.protocol_name".into(),
    ]
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            keys: default_keys(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            indent_width: default_indent_width(),
            show_counts: true,
            pool_capacity: default_pool_capacity(),
            summary_paths: default_summary_paths(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { autosave: true }
    }
}

/// Load config by merging global defaults with per-dataset overrides.
/// Priority: `<data dir>/.etree.toml` > `~/.config/etree/config.toml` > built-in defaults.
/// Fields within a section override independently.
pub fn load_config(data_dir: &Path) -> EtConfig {
    let global_table = dirs::config_dir()
        .map(|d| d.join("etree/config.toml"))
        .and_then(|p| read_table(&p));
    let local_table = read_table(&data_dir.join(LOCAL_CONFIG_NAME));
    merge_tables(global_table, local_table)
}

fn read_table(path: &Path) -> Option<toml::map::Map<String, toml::Value>> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<toml::Table>(&content) {
        Ok(table) => Some(table),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {}", path.display(), e);
            None
        }
    }
}

fn merge_tables(
    global: Option<toml::map::Map<String, toml::Value>>,
    local: Option<toml::map::Map<String, toml::Value>>,
) -> EtConfig {
    let merged = match (global, local) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            global
        }
        (Some(table), None) | (None, Some(table)) => table,
        (None, None) => return EtConfig::default(),
    };

    toml::Value::Table(merged).try_into().unwrap_or_else(|e| {
        log::warn!("invalid config values, using defaults: {}", e);
        EtConfig::default()
    })
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(
    base: &mut toml::map::Map<String, toml::Value>,
    overlay: toml::map::Map<String, toml::Value>,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> toml::map::Map<String, toml::Value> {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn defaults_without_any_file() {
        let config = merge_tables(None, None);
        assert_eq!(config.grouping.keys, vec!["cell.type", "block.protocol_name"]);
        assert_eq!(config.display.indent_width, 2);
        assert!(config.selection.autosave);
    }

    #[test]
    fn local_fields_override_global_independently() {
        let global = table("[display]\nindent_width = 4\nshow_counts = false\n");
        let local = table("[display]\nindent_width = 3\n[grouping]\nkeys = [\"@date\"]\n");
        let config = merge_tables(Some(global), Some(local));
        assert_eq!(config.display.indent_width, 3);
        assert!(!config.display.show_counts);
        assert_eq!(config.display.pool_capacity, 64);
        assert_eq!(config.grouping.keys, vec!["@date"]);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let local = table("[display]\nindent_width = \"wide\"\n");
        let config = merge_tables(None, Some(local));
        assert_eq!(config.display.indent_width, 2);
    }

    #[test]
    fn load_config_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LOCAL_CONFIG_NAME),
            "[selection]\nautosave = false\n",
        )
        .unwrap();
        let config = load_config(dir.path());
        assert!(!config.selection.autosave);
    }

    #[test]
    fn local_grouping_keys_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(LOCAL_CONFIG_NAME),
            "[grouping]\nkeys = [\"@date\"]\n",
        )
        .unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.grouping.keys, vec!["@date"]);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCAL_CONFIG_NAME);
        std::fs::write(&path, "[display\nindent_width = 3\n").unwrap();
        assert!(read_table(&path).is_none());
    }
}
