pub mod engine;
pub mod cursor;

pub use engine::QueryEngine;
pub use cursor::{CorrelationCursors, CursorPair, CursorScope};
