//! Undo/redo history of pixel and layer edits.

mod action;
pub mod codec;
mod manager;
pub mod replay;

pub use action::HistoryAction;
pub use codec::{CompressedPixels, compress, decompress};
pub use manager::{HistoryManager, HistoryStatus};
pub use replay::apply_action;
