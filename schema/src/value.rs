use crate::{
    error::CodecError,
    jsb::JsonBuilder,
    jsp::{JsonParser, Scalar},
    model::{Field, Model, Registry},
    repr::{resolve_element, resolve_field, Direction, Repr, NUMBER_PRECISION},
};

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// This type holds one record's data, interpreted through its [Model].
///
/// Decoding and encoding follow the generated C functions exactly: counters
/// are filled in from array and string lengths, NULL pointers are left out of
/// the output, and arrays without a counter always encode as `[]`. Object
/// fields are keyed by field name (not JSON key); a missing entry stands for a
/// zero-initialized struct member.
#[derive(Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
    /// Raw JSON text captured from a `json_literal` field.
    Literal(String),
    Array(Vec<Value<'a>>),
    Object(&'a str, HashMap<&'a str, Value<'a>>),
}

fn find_model<'r>(registry: &'r Registry, simple_name: &str) -> Result<&'r Model, CodecError> {
    registry
        .get(simple_name)
        .ok_or_else(|| CodecError::UnknownModel(simple_name.to_string()))
}

impl<'a> Value<'a> {
    /// Returns `false` for anything but a [Bool](#variant.Bool).
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// Integer view of an [Int](#variant.Int) or [Number](#variant.Number).
    /// Returns `0` for other value kinds.
    pub fn as_int(&self) -> i64 {
        match *self {
            Value::Int(value) => value,
            Value::Number(value) => value as i64,
            _ => 0,
        }
    }

    /// Floating-point view of a [Number](#variant.Number) or [Int](#variant.Int).
    /// Returns `0.0` for other value kinds.
    pub fn as_number(&self) -> f64 {
        match *self {
            Value::Number(value) => value,
            Value::Int(value) => value as f64,
            _ => 0.0,
        }
    }

    /// Text of a [String](#variant.String) or [Literal](#variant.Literal).
    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) | Value::Literal(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// Returns an empty slice for anything but an [Array](#variant.Array).
    pub fn as_array(&self) -> &[Value<'a>] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Length of an [Array](#variant.Array), `0` for other value kinds.
    pub fn len(&self) -> usize {
        self.as_array().len()
    }

    /// Appends to an [Array](#variant.Array). Does nothing for other value kinds.
    pub fn push(&mut self, value: Value<'a>) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }

    /// Reads a field out of an [Object](#variant.Object) by field name.
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        match *self {
            Value::Object(_, ref fields) => fields.get(name),
            _ => None,
        }
    }

    /// Updates a field on an [Object](#variant.Object). Does nothing for other
    /// value kinds.
    pub fn set(&mut self, name: &'a str, value: Value<'a>) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.insert(name, value);
        }
    }

    /// Resets a field of an [Object](#variant.Object) to its zero value.
    pub fn remove(&mut self, name: &str) {
        if let Value::Object(_, ref mut fields) = *self {
            fields.remove(name);
        }
    }

    /// Parses one record of the model named `simple_name` from `json`.
    pub fn decode(registry: &'a Registry, simple_name: &str, json: &str) -> Result<Value<'a>, CodecError> {
        let model = find_model(registry, simple_name)?;
        Value::decode_model(registry, model, &mut JsonParser::new(json))
    }

    /// Parses a JSON array of records. Any element failure fails the whole
    /// list.
    pub fn decode_list(
        registry: &'a Registry,
        simple_name: &str,
        json: &str,
    ) -> Result<Vec<Value<'a>>, CodecError> {
        let model = find_model(registry, simple_name)?;
        let mut jsp = JsonParser::new(json);

        jsp.begin_array()?;
        let len = jsp.array_len()?;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(Value::decode_model(registry, model, &mut jsp)?);
        }
        jsp.end_array()?;

        Ok(values)
    }

    /// Parses the object at the current position of `jsp`. Keys are matched
    /// against the JSON keys of non-counter fields in declaration order;
    /// anything else is skipped.
    pub fn decode_model(
        registry: &'a Registry,
        model: &'a Model,
        jsp: &mut JsonParser,
    ) -> Result<Value<'a>, CodecError> {
        jsp.begin_object()?;

        let mut fields = HashMap::new();
        while let Some(key) = jsp.key()? {
            match model.json_fields().find(|f| f.json_key() == key) {
                Some(field) => Value::decode_field(registry, model, field, jsp, &mut fields)?,
                None => jsp.skip()?,
            }
        }

        jsp.end_object()?;
        Ok(Value::Object(model.simple_name.as_str(), fields))
    }

    fn decode_field(
        registry: &'a Registry,
        model: &'a Model,
        field: &'a Field,
        jsp: &mut JsonParser,
        fields: &mut HashMap<&'a str, Value<'a>>,
    ) -> Result<(), CodecError> {
        let name = field.name.as_str();
        let counter = field
            .counter_field
            .as_deref()
            .and_then(|c| model.field(c))
            .map(|c| c.name.as_str());

        match resolve_field(field, Direction::Parse) {
            Repr::String if field.is_json_literal && field.is_nullable() => {
                let value = if jsp.take_null()? {
                    Value::Null
                } else {
                    let raw = jsp.raw_value()?;
                    if raw.starts_with('{') || raw.starts_with('[') {
                        Value::Literal(raw.to_string())
                    } else {
                        Value::Null
                    }
                };
                fields.insert(name, value);
            }

            Repr::String if field.is_fixed_string() => match jsp.value()? {
                Scalar::String(text) => {
                    fields.insert(name, Value::String(bounded_copy(&text, field)));
                }
                Scalar::Null => {}
                _ => return Err(CodecError::TypeMismatch(field.name.clone())),
            },

            Repr::String => {
                let text = match jsp.value()? {
                    Scalar::String(text) => text.into_owned(),
                    Scalar::Null => String::new(),
                    _ => return Err(CodecError::TypeMismatch(field.name.clone())),
                };
                if let Some(counter) = counter {
                    fields.insert(counter, Value::Int(text.len() as i64));
                }
                let value = if text.is_empty() { Value::Null } else { Value::String(text) };
                fields.insert(name, value);
            }

            _ if field.is_array => {
                let elements = Value::decode_array(registry, field, jsp)?;
                if let Some(counter) = counter {
                    fields.insert(counter, Value::Int(elements.len() as i64));
                }
                fields.insert(name, Value::Array(elements));
            }

            Repr::Nested => {
                let value = if field.is_nullable() && jsp.take_null()? {
                    Value::Null
                } else {
                    let nested = find_model(registry, &field.base_type)?;
                    Value::decode_model(registry, nested, jsp)?
                };
                fields.insert(name, value);
            }

            _ => {
                let value = if field.is_nullable() && jsp.take_null()? {
                    Value::Null
                } else {
                    let repr = resolve_field(field, Direction::Stringify);
                    decode_scalar(&field.name, repr, jsp)?
                };
                fields.insert(name, value);
            }
        }

        Ok(())
    }

    fn decode_array(
        registry: &'a Registry,
        field: &'a Field,
        jsp: &mut JsonParser,
    ) -> Result<Vec<Value<'a>>, CodecError> {
        let repr = resolve_element(field, Direction::Stringify);
        let nested = match repr {
            Repr::Nested => Some(find_model(registry, &field.base_type)?),
            _ => None,
        };
        let element = |jsp: &mut JsonParser| match nested {
            Some(model) => Value::decode_model(registry, model, jsp),
            None => decode_scalar(&field.name, repr, jsp),
        };

        jsp.begin_array()?;
        let mut elements = Vec::new();
        if let Some(counter) = &field.counter_field {
            let len = jsp.array_len()?;
            if let Some(capacity) = field.capacity() {
                if len > capacity {
                    return Err(CodecError::CounterOutOfRange {
                        field:   field.name.clone(),
                        counter: counter.clone(),
                        count:   len,
                        len:     capacity,
                    });
                }
            }
            elements.reserve(len);
            for _ in 0..len {
                elements.push(element(jsp)?);
            }
        } else {
            let capacity = field.capacity();
            while jsp.has_more_elements() {
                if let Some(capacity) = capacity.filter(|&c| elements.len() >= c) {
                    return Err(CodecError::CounterOutOfRange {
                        field:   field.name.clone(),
                        counter: String::new(),
                        count:   elements.len() + 1,
                        len:     capacity,
                    });
                }
                elements.push(element(jsp)?);
            }
        }
        jsp.end_array()?;

        Ok(elements)
    }

    /// Writes this record as compact JSON.
    pub fn encode(&self, registry: &Registry) -> Result<String, CodecError> {
        self.encode_indent(registry, 0)
    }

    /// Writes this record with `indent` spaces per nesting level (`0` for
    /// compact output).
    pub fn encode_indent(&self, registry: &Registry, indent: usize) -> Result<String, CodecError> {
        let mut jsb = JsonBuilder::with_indent(indent);
        self.encode_jsb(registry, &mut jsb)?;
        jsb.finish()
    }

    /// Writes a list of records as a JSON array.
    pub fn encode_list(registry: &Registry, values: &[Value], indent: usize) -> Result<String, CodecError> {
        let mut jsb = JsonBuilder::with_indent(indent);
        jsb.begin_array()?;
        for value in values {
            value.encode_jsb(registry, &mut jsb)?;
        }
        jsb.end_array()?;
        jsb.finish()
    }

    /// Writes this record to the end of `jsb`. Only objects can be encoded
    /// at the top level.
    pub fn encode_jsb(&self, registry: &Registry, jsb: &mut JsonBuilder) -> Result<(), CodecError> {
        match self {
            Value::Object(name, fields) => encode_model(registry, find_model(registry, name)?, fields, jsb),
            _ => Err(CodecError::TypeMismatch(format!("{:?}", self))),
        }
    }
}

/// `strncpy(dst, src, sizeof(dst) - 1)` for `char name[N]` fields.
fn bounded_copy(text: &str, field: &Field) -> String {
    let Some(capacity) = field.capacity() else {
        return text.to_string();
    };
    let mut end = text.len().min(capacity.saturating_sub(1));
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn decode_scalar<'a>(name: &str, repr: Repr, jsp: &mut JsonParser) -> Result<Value<'a>, CodecError> {
    match (repr, jsp.value()?) {
        (Repr::Integer, Scalar::Number(value)) => Ok(Value::Int(value as i64)),
        (Repr::Number, Scalar::Number(value)) => Ok(Value::Number(value)),
        (Repr::Boolean, Scalar::Bool(value)) => Ok(Value::Bool(value)),
        (Repr::String, Scalar::String(value)) => Ok(Value::String(value.into_owned())),
        _ => Err(CodecError::TypeMismatch(name.to_string())),
    }
}

fn encode_model(
    registry: &Registry,
    model: &Model,
    fields: &HashMap<&str, Value>,
    jsb: &mut JsonBuilder,
) -> Result<(), CodecError> {
    jsb.begin_object()?;
    for field in model.json_fields() {
        let value = fields.get(field.name.as_str());
        // NULL pointers are left out rather than written as null
        if field.is_nullable() && matches!(value, None | Some(Value::Null)) {
            continue;
        }
        jsb.key(field.json_key())?;
        encode_field(registry, field, value, fields, jsb)?;
    }
    jsb.end_object()
}

fn encode_field(
    registry: &Registry,
    field: &Field,
    value: Option<&Value>,
    fields: &HashMap<&str, Value>,
    jsb: &mut JsonBuilder,
) -> Result<(), CodecError> {
    match resolve_field(field, Direction::Stringify) {
        Repr::String if field.is_json_literal && field.is_nullable() => {
            let text = value.map(|v| v.as_string()).unwrap_or("");
            if text.is_empty() {
                jsb.null()
            } else {
                jsb.raw(text)
            }
        }

        Repr::String => encode_scalar(jsb, &field.name, Repr::String, value),

        _ if field.is_array => {
            jsb.begin_array()?;
            // Arrays without a counter have no known length and stay empty
            if let Some(counter) = &field.counter_field {
                let count = fields.get(counter.as_str()).map(|v| v.as_int()).unwrap_or(0).max(0) as usize;
                let elements = value.map(|v| v.as_array()).unwrap_or(&[]);
                if count > elements.len() {
                    return Err(CodecError::CounterOutOfRange {
                        field:   field.name.clone(),
                        counter: counter.clone(),
                        count,
                        len:     elements.len(),
                    });
                }
                let repr = resolve_element(field, Direction::Stringify);
                for element in &elements[..count] {
                    match (repr, element) {
                        (Repr::Nested, Value::Object(_, nested)) => {
                            encode_model(registry, find_model(registry, &field.base_type)?, nested, jsb)?
                        }
                        (Repr::Nested, _) => return Err(CodecError::TypeMismatch(field.name.clone())),
                        (repr, element) => encode_scalar(jsb, &field.name, repr, Some(element))?,
                    }
                }
            }
            jsb.end_array()
        }

        Repr::Nested => match value {
            Some(Value::Null) => jsb.null(),
            Some(Value::Object(_, nested)) => {
                encode_model(registry, find_model(registry, &field.base_type)?, nested, jsb)
            }
            None => encode_model(registry, find_model(registry, &field.base_type)?, &HashMap::new(), jsb),
            Some(_) => Err(CodecError::TypeMismatch(field.name.clone())),
        },

        repr => encode_scalar(jsb, &field.name, repr, value),
    }
}

/// Integers go through `jsb_int(Jsb *, int)` in C, so they are cut to 32 bits
/// here as well.
fn encode_scalar(jsb: &mut JsonBuilder, name: &str, repr: Repr, value: Option<&Value>) -> Result<(), CodecError> {
    match (repr, value) {
        (Repr::Integer, None) => jsb.int(0),
        (Repr::Integer, Some(Value::Int(v))) => jsb.int(*v as i32 as i64),
        (Repr::Integer, Some(Value::Number(v))) => jsb.int(*v as i64 as i32 as i64),
        (Repr::Number, None) => jsb.number(0.0, NUMBER_PRECISION),
        (Repr::Number, Some(Value::Number(v))) => jsb.number(*v, NUMBER_PRECISION),
        (Repr::Number, Some(Value::Int(v))) => jsb.number(*v as f64, NUMBER_PRECISION),
        (Repr::Boolean, None) => jsb.bool(false),
        (Repr::Boolean, Some(Value::Bool(v))) => jsb.bool(*v),
        (Repr::String, None | Some(Value::Null)) => jsb.string(Some("")),
        (Repr::String, Some(Value::String(v))) => jsb.string(Some(v)),
        _ => Err(CodecError::TypeMismatch(name.to_string())),
    }
}

impl<'a> Index<usize> for Value<'a> {
    type Output = Value<'a>;

    /// A convenience method that adds support for `self[index]` expressions.
    /// It will panic if this value isn't an [Array](#variant.Array) or if the
    /// provided index is out of bounds.
    fn index(&self, index: usize) -> &Value<'a> {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("indexing a value that is not an array"),
        }
    }
}

impl<'a> fmt::Debug for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => fmt::Debug::fmt(&value, f),
            Value::Int(value) => fmt::Debug::fmt(&value, f),
            Value::Number(value) => fmt::Debug::fmt(&value, f),
            Value::String(ref value) => fmt::Debug::fmt(value, f),
            Value::Literal(ref value) => write!(f, "{}", value),
            Value::Array(ref values) => fmt::Debug::fmt(values, f),

            Value::Object(name, ref fields) => {
                let mut keys: Vec<_> = fields.keys().collect();
                let mut first = true;
                keys.sort();
                write!(f, "{} {{", name)?;

                for key in keys {
                    if first {
                        first = false;
                    } else {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, fields[key])?;
                }

                write!(f, "}}")
            }
        }
    }
}
