use thiserror::Error;

/// Failures raised by the JSON reader/builder and the dynamic codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Unexpected end of input at offset {0}")]
    UnexpectedEof(usize),

    #[error("Expected {expected} but found {found:?} at offset {offset}")]
    UnexpectedChar {
        expected: &'static str,
        found:    char,
        offset:   usize,
    },

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("Containers nested deeper than {depth} levels at offset {offset}")]
    NestingTooDeep {
        depth:  usize,
        offset: usize,
    },

    #[error("Builder call not valid in the current state: {0}")]
    InvalidState(&'static str),

    #[error("No model named \"{0}\" in the registry")]
    UnknownModel(String),

    #[error("Value for field \"{0}\" does not match its declared type")]
    TypeMismatch(String),

    #[error("Field \"{field}\" holds {len} elements but {count} were given")]
    CounterOutOfRange {
        field:   String,
        counter: String,
        count:   usize,
        len:     usize,
    },
}
