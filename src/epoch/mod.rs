pub mod cell_type;
pub mod loader;
mod store;

pub use loader::load_store;
pub use store::{Epoch, EpochId, EpochStore};
