use crate::model::Field;
use serde::Serialize;

/// Fractional digits written for floating-point fields.
pub const NUMBER_PRECISION: usize = 5;

pub const INTEGER_TYPES: [&str; 13] = [
    "int", "long", "short", "unsigned", "size_t", "int8_t", "int16_t", "int32_t", "int64_t",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t",
];
pub const FLOAT_TYPES: [&str; 2] = ["float", "double"];

/// How a field's value is represented in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Repr {
    Integer,
    Number,
    Boolean,
    String,
    /// Another record with its own generated parse/stringify pair.
    Nested,
}

/// The parser reads every numeric token the same way, while the builder
/// writes integers and floats with different primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Parse,
    Stringify,
}

fn lookup(type_: &str, direction: Direction) -> Option<Repr> {
    if INTEGER_TYPES.contains(&type_) {
        return Some(match direction {
            Direction::Parse     => Repr::Number,
            Direction::Stringify => Repr::Integer,
        });
    }
    if FLOAT_TYPES.contains(&type_) {
        return Some(Repr::Number);
    }
    match type_ {
        "bool"  => Some(Repr::Boolean),
        "char*" => Some(Repr::String),
        _ => None,
    }
}

/// Resolves a declared type. One trailing `*` is stripped before a second
/// lookup, so `int*` resolves like `int`; deeper pointers are not modelled.
pub fn resolve(type_: &str, direction: Direction) -> Repr {
    let type_ = type_.trim();
    if let Some(repr) = lookup(type_, direction) {
        return repr;
    }
    if let Some(stripped) = type_.strip_suffix('*') {
        if let Some(repr) = lookup(stripped.trim_end(), direction) {
            return repr;
        }
    }
    Repr::Nested
}

/// Representation of the field as a whole.
pub fn resolve_field(field: &Field, direction: Direction) -> Repr {
    if field.is_fixed_string() {
        return Repr::String;
    }
    resolve(&field.type_, direction)
}

/// Representation of one element of an array field.
pub fn resolve_element(field: &Field, direction: Direction) -> Repr {
    resolve(&field.base_type, direction)
}
