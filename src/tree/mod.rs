//! Grouping engine, tree model and selection controller.

pub mod grouping;
pub mod model;
mod selection;

pub use grouping::{GroupingKey, SplitValue};
pub use model::{CheckState, NodeRef, TreeEvent, TreeModel};
