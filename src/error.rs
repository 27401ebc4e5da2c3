use thiserror::Error;

use crate::game::types::{GameMode, Pos};

/// Contract violations raised by the rules engine.
///
/// Ordinary gameplay conditions (a non-adjacent swap, an empty item slot)
/// are reported through outcome values instead.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("cell {pos} is outside the {size}x{size} board")]
    OutOfBounds { pos: Pos, size: usize },

    #[error("unknown item id `{0}`")]
    UnknownItem(String),

    #[error("unknown game mode `{0}`")]
    UnknownMode(String),

    #[error("level {level} is not selectable (highest reached: {max})")]
    InvalidLevel { level: u32, max: u32 },

    #[error("operation requires {expected} mode")]
    WrongMode { expected: GameMode },

    #[error("malformed board layout: {0}")]
    Layout(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the record/settings persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
