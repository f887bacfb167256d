use brine_jsgen_schema::CodecError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsgenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Failed to parse file {}: {source}", path.display())]
    ScanFailed {
        path:   PathBuf,
        #[source]
        source: Box<JsgenError>,
    },

    #[error("Verifier error: {0}")]
    VerifierError(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
