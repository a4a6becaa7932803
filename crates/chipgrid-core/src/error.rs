//! Error types for chipgrid

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChipgridError {
    #[error("Step {index} out of range (capacity {capacity})")]
    StepOutOfRange { index: usize, capacity: usize },
    #[error("Invalid effect id: {0:?}")]
    InvalidEffectId(String),
    #[error("Instrument number out of range: {0}")]
    InstrumentOutOfRange(u8),
    #[error("Instrument already registered: {0}")]
    DuplicateInstrument(u8),
    #[error("Pattern {number} not found on track {track}")]
    PatternNotFound { track: usize, number: u32 },
    #[error("Track not found: {0}")]
    TrackNotFound(usize),
    #[error("Order not found: {0}")]
    OrderNotFound(usize),
    #[error("Malformed song: {0}")]
    MalformedSong(String),
}

pub type Result<T> = std::result::Result<T, ChipgridError>;
