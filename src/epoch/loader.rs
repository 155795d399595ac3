use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use super::{Epoch, EpochId, EpochStore};

/// Epoch-level fields holding bulk sample arrays
const EPOCH_BULK_FIELDS: &[&str] = &["frame_times_ms"];

/// Per-device lists whose entries carry sample arrays next to the opaque
/// references (`h5_path`) the tree keeps.
const SAMPLE_LISTS: &[&str] = &["responses", "stimuli"];
const SAMPLE_BULK_FIELDS: &[&str] = &["data", "spike_times"];

/// Nesting of the export format, outermost first: (list field, attribute name)
const EXPORT_LEVELS: &[(&str, &str)] = &[
    ("cells", "cell"),
    ("epoch_groups", "group"),
    ("epoch_blocks", "block"),
];

/// Load an epoch dataset from a JSON file
pub fn load_store(path: &Path) -> Result<EpochStore> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let epochs = parse_epochs(value)
        .with_context(|| format!("Invalid epoch dataset {}", path.display()))?;
    log::info!("loaded {} epochs from {}", epochs.len(), path.display());
    Ok(EpochStore::new(epochs)?)
}

/// Accepts a bare array of records, an object with an `epochs` array,
/// or the nested `experiments` export.
pub fn parse_epochs(value: Value) -> Result<Vec<Epoch>> {
    match value {
        Value::Array(records) => parse_flat(records),
        Value::Object(mut root) => {
            if let Some(Value::Array(experiments)) = root.remove("experiments") {
                if let Some(version) = root.get("format_version") {
                    log::debug!("nested export, format_version {}", version);
                }
                flatten_export(experiments)
            } else if let Some(Value::Array(records)) = root.remove("epochs") {
                parse_flat(records)
            } else {
                bail!("expected an `epochs` or `experiments` array")
            }
        }
        _ => bail!("expected a JSON array or object at top level"),
    }
}

fn parse_flat(records: Vec<Value>) -> Result<Vec<Epoch>> {
    records
        .into_iter()
        .enumerate()
        .map(|(pos, record)| {
            let Value::Object(mut map) = record else {
                bail!("record {} is not an object", pos);
            };
            let id = take_id(&mut map, pos)?;
            let attributes = match map.remove("attributes") {
                Some(attrs @ Value::Object(_)) if map.is_empty() => attrs,
                Some(attrs) => {
                    map.insert("attributes".to_string(), attrs);
                    Value::Object(map)
                }
                None => Value::Object(map),
            };
            Ok(Epoch::new(id, strip_bulk(attributes)))
        })
        .collect()
}

fn take_id(map: &mut Map<String, Value>, pos: usize) -> Result<EpochId> {
    match map.remove("id") {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) => Ok(EpochId::Int(id)),
            None => bail!("record {} has a non-integer id {}", pos, n),
        },
        Some(Value::String(s)) => Ok(EpochId::Text(s)),
        Some(other) => bail!("record {} has an unsupported id {}", pos, other),
        None => bail!("record {} has no id", pos),
    }
}

/// Flatten experiments -> cells -> epoch_groups -> epoch_blocks -> epochs
/// into one record per epoch. Each ancestor level contributes its scalar
/// fields under its own attribute name.
fn flatten_export(experiments: Vec<Value>) -> Result<Vec<Epoch>> {
    let mut out = Vec::new();
    for experiment in experiments {
        let Value::Object(experiment) = experiment else {
            bail!("experiment entry is not an object");
        };
        let mut context = Map::new();
        descend(experiment, "experiment", 0, &mut context, &mut out)?;
    }
    Ok(out)
}

fn descend(
    mut level: Map<String, Value>,
    name: &str,
    depth: usize,
    context: &mut Map<String, Value>,
    out: &mut Vec<Epoch>,
) -> Result<()> {
    let child_field = EXPORT_LEVELS.get(depth).map(|(field, _)| *field).unwrap_or("epochs");
    let children = match level.remove(child_field) {
        Some(Value::Array(items)) => items,
        Some(_) => bail!("`{}` under {} is not an array", child_field, name),
        None => Vec::new(),
    };
    context.insert(name.to_string(), Value::Object(level));

    if depth == EXPORT_LEVELS.len() {
        for (pos, epoch) in children.into_iter().enumerate() {
            let Value::Object(mut fields) = epoch else {
                bail!("epoch {} under {} is not an object", pos, name);
            };
            let id = take_id(&mut fields, out.len())?;
            let mut attributes = context.clone();
            attributes.extend(fields);
            out.push(Epoch::new(id, strip_bulk(Value::Object(attributes))));
        }
    } else {
        let (_, child_name) = EXPORT_LEVELS[depth];
        for child in children {
            let Value::Object(child) = child else {
                bail!("{} entry under {} is not an object", child_name, name);
            };
            descend(child, child_name, depth + 1, context, out)?;
        }
    }

    context.remove(name);
    Ok(())
}

fn strip_bulk(value: Value) -> Value {
    let Value::Object(mut epoch) = value else {
        return value;
    };
    remove_arrays(&mut epoch, EPOCH_BULK_FIELDS);
    for list in SAMPLE_LISTS {
        if let Some(Value::Array(entries)) = epoch.get_mut(*list) {
            for entry in entries.iter_mut() {
                if let Value::Object(entry) = entry {
                    remove_arrays(entry, SAMPLE_BULK_FIELDS);
                }
            }
        }
    }
    Value::Object(epoch)
}

/// Scalars under the same names are ordinary attributes and stay
fn remove_arrays(map: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if matches!(map.get(*field), Some(Value::Array(_))) {
            map.remove(*field);
        }
    }
}
