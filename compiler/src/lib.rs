//! brine-jsgen-compiler
//!
//! This crate implements:
//!  1) A tokenizer for C header text,
//!  2) Extraction of `JSON`-annotated struct declarations into [Model]s,
//!     including the `alias` / `sized_by` / `ignore` / `json_literal` field annotations,
//!  3) A verifier (colliding names, uncounted arrays, misplaced json literals),
//!  4) C code generation (`compile_models_to_c` → `String`),
//!  5) The batch driver over files and directories, and the `JsgenError` type.
//!
//! [Model]: brine_jsgen_schema::Model

pub mod error;
pub mod utils;
pub mod tokenizer;
pub mod annotations;
pub mod parser;
pub mod verifier;
pub mod compiler;
pub mod gen_c;

pub use compiler::{compile_paths, compile_source, GenerateOptions};
pub use gen_c::compile_models_to_c;
pub use parser::parse_source;
