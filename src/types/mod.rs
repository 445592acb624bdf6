//! Type definitions for the fraud detection pipeline

pub mod prediction;
pub mod table;

pub use prediction::FlagPrediction;
pub use table::{ColumnKind, Table, Value};
