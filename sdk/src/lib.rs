//! brine-jsgen
//!
//! Entry point for generating JSON parse/stringify C code from annotated
//! C structs, and for running the same semantics from Rust.
//!
//! - The compiler pipeline (re-exported from `brine-jsgen-compiler`)
//! - The model, JSON reader/builder and dynamic `Value` codec (from `brine-jsgen-schema`)
//! - Helpers used by the command line tool

pub use brine_jsgen_compiler::error::JsgenError;
pub use brine_jsgen_compiler::{compile_models_to_c, compile_paths, compile_source, parse_source, GenerateOptions};
pub use brine_jsgen_compiler::compiler::{build_registry, DEFAULT_EXTENSION, DEFAULT_OUTPUT};
pub use brine_jsgen_schema::{CodecError, Field, JsonBuilder, JsonParser, Model, Registry, Repr, Value};

/// Renders the extracted models as pretty-printed JSON.
pub fn models_to_json(registry: &Registry) -> Result<String, JsgenError> {
    Ok(serde_json::to_string_pretty(registry)?)
}

/// Parses `json` as the model named `simple_name` (or a JSON array of them
/// when `list` is set) and writes it back out the way the generated
/// `stringify_*` functions would.
pub fn restringify(
    registry:    &Registry,
    simple_name: &str,
    json:        &str,
    indent:      usize,
    list:        bool,
) -> Result<String, JsgenError> {
    let output = if list {
        let values = Value::decode_list(registry, simple_name, json)?;
        Value::encode_list(registry, &values, indent)?
    } else {
        Value::decode(registry, simple_name, json)?.encode_indent(registry, indent)?
    };
    Ok(output)
}

pub mod error {
    pub use brine_jsgen_compiler::error::JsgenError;
    pub use brine_jsgen_schema::CodecError;
}

pub mod schema {
    pub use brine_jsgen_schema::{Field, Model, Registry, Value};
}
