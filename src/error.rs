/// Error types shared by the pitch grid, the touch router and the voices
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("cell {index} is outside a {num_cols}x{num_rows} grid")]
    OutOfRange {
        index: usize,
        num_cols: usize,
        num_rows: usize,
    },

    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid cell {0}")]
    InvalidCell(usize),

    #[error("voice unavailable: {0}")]
    VoiceUnavailable(String),

    #[error("MIDI error: {0}")]
    Midi(String),
}

pub type Result<T> = std::result::Result<T, Error>;
