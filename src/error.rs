use std::io;

/// Everything that can go wrong while setting up or persisting a run. Ticking never fails.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("walk controller needs at least {required} motors, got {got}")]
    TooFewMotors { required: usize, got: usize },
    #[error("invalid parameter: {0}")]
    InvalidParams(String),
    #[error("weights do not chain: {input_rows}x{input_cols} input into {output_rows}x{output_cols} output")]
    Shape {
        input_rows: usize,
        input_cols: usize,
        output_rows: usize,
        output_cols: usize,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
