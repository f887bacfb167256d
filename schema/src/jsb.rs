use crate::error::CodecError;

pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Start,
    Array,
    Object,
    End,
}

/// A streaming JSON writer.
///
/// Keys are followed by `": "`, values are separated by a bare `,`, and a
/// non-zero indent switches on one-value-per-line pretty printing.
///
/// Example usage:
///
/// ```
/// let mut jsb = brine_jsgen_schema::JsonBuilder::new();
/// jsb.begin_object().unwrap();
/// jsb.key("message").unwrap();
/// jsb.string(Some("hi")).unwrap();
/// jsb.key("n").unwrap();
/// jsb.number(2.5, 2).unwrap();
/// jsb.end_object().unwrap();
/// assert_eq!(jsb.finish().unwrap(), r#"{"message": "hi","n": 2.50}"#);
/// ```
///
#[derive(Debug, Clone)]
pub struct JsonBuilder {
    buffer:   String,
    state:    Vec<State>,
    is_first: bool,
    is_key:   bool,
    indent:   usize,
}

impl Default for JsonBuilder {
    fn default() -> Self {
        JsonBuilder::new()
    }
}

impl JsonBuilder {
    /// Creates a builder producing compact output.
    pub fn new() -> JsonBuilder {
        JsonBuilder::with_indent(0)
    }

    /// Creates a builder that puts every value on its own line, indented by
    /// `indent` spaces per nesting level.
    pub fn with_indent(indent: usize) -> JsonBuilder {
        JsonBuilder {
            buffer:   String::new(),
            state:    vec![State::Start],
            is_first: true,
            is_key:   false,
            indent,
        }
    }

    fn level(&self) -> usize {
        self.state.len() - 1
    }

    fn top(&self) -> State {
        self.state.last().copied().unwrap_or(State::Start)
    }

    /// Output written so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Returns the document once every container has been closed.
    pub fn finish(self) -> Result<String, CodecError> {
        if self.level() != 0 {
            return Err(CodecError::InvalidState("unclosed object or array"));
        }
        Ok(self.buffer)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.state.truncate(1);
        self.state[0] = State::Start;
        self.is_first = true;
    }

    /// Values are valid at the start of the document, after a key, or inside
    /// an array.
    fn check_value(&self) -> Result<(), CodecError> {
        match self.top() {
            State::Array => Ok(()),
            State::Object if self.is_key => Ok(()),
            State::Start if self.is_first => Ok(()),
            _ => Err(CodecError::InvalidState("value not expected here")),
        }
    }

    fn newline(&mut self) {
        if self.indent > 0 && !self.is_key && !self.buffer.is_empty() {
            self.buffer.push('\n');
            for _ in 0..self.level() * self.indent {
                self.buffer.push(' ');
            }
        }
    }

    fn separator(&mut self) {
        if !self.is_first {
            self.buffer.push(',');
        }
        self.newline();
    }

    fn push_escaped(&mut self, text: &str) {
        self.buffer.push('"');
        for c in text.chars() {
            match c {
                '\n' => self.buffer.push_str("\\n"),
                '\t' => self.buffer.push_str("\\t"),
                '"' | '\\' => {
                    self.buffer.push('\\');
                    self.buffer.push(c);
                }
                '\u{8}' | '\r' => {}
                _ => self.buffer.push(c),
            }
        }
        self.buffer.push('"');
    }

    fn begin(&mut self, state: State, open: char) -> Result<(), CodecError> {
        if self.level() == 0 {
            self.reset();
        }
        self.check_value()?;
        if self.level() + 1 >= MAX_NESTING {
            return Err(CodecError::InvalidState("nesting too deep"));
        }
        self.separator();
        self.buffer.push(open);
        self.state.push(state);
        self.is_first = true;
        self.is_key = false;
        Ok(())
    }

    fn end(&mut self, state: State, close: char) -> Result<(), CodecError> {
        if self.level() < 1 || self.top() != state {
            return Err(CodecError::InvalidState("closing a container that is not open"));
        }
        self.state.pop();
        self.newline();
        self.buffer.push(close);
        if self.level() == 0 {
            self.state[0] = State::End;
        }
        self.is_first = false;
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<(), CodecError> {
        self.begin(State::Object, '{')
    }

    pub fn end_object(&mut self) -> Result<(), CodecError> {
        self.end(State::Object, '}')
    }

    pub fn begin_array(&mut self) -> Result<(), CodecError> {
        self.begin(State::Array, '[')
    }

    pub fn end_array(&mut self) -> Result<(), CodecError> {
        self.end(State::Array, ']')
    }

    pub fn key(&mut self, key: &str) -> Result<(), CodecError> {
        if self.top() != State::Object || self.is_key {
            return Err(CodecError::InvalidState("key not expected here"));
        }
        self.separator();
        self.push_escaped(key);
        self.buffer.push_str(": ");
        self.is_first = true;
        self.is_key = true;
        Ok(())
    }

    fn scalar(&mut self, text: &str, escape: bool) -> Result<(), CodecError> {
        self.check_value()?;
        self.separator();
        if escape {
            self.push_escaped(text);
        } else {
            self.buffer.push_str(text);
        }
        self.is_first = false;
        self.is_key = false;
        Ok(())
    }

    /// Writes a string, or `null` for `None`.
    pub fn string(&mut self, value: Option<&str>) -> Result<(), CodecError> {
        match value {
            Some(text) => self.scalar(text, true),
            None => self.null(),
        }
    }

    pub fn int(&mut self, value: i64) -> Result<(), CodecError> {
        self.scalar(&value.to_string(), false)
    }

    /// Writes a number with a fixed count of fractional digits.
    pub fn number(&mut self, value: f64, precision: usize) -> Result<(), CodecError> {
        self.scalar(&format!("{:.*}", precision, value), false)
    }

    pub fn bool(&mut self, value: bool) -> Result<(), CodecError> {
        self.scalar(if value { "true" } else { "false" }, false)
    }

    pub fn null(&mut self) -> Result<(), CodecError> {
        self.scalar("null", false)
    }

    /// Splices pre-formed JSON text into the output as the next value.
    pub fn raw(&mut self, json: &str) -> Result<(), CodecError> {
        self.scalar(json, false)
    }
}

#[cfg(test)]
fn build(indent: usize, cb: fn(&mut JsonBuilder) -> Result<(), CodecError>) -> String {
    let mut jsb = JsonBuilder::with_indent(indent);
    cb(&mut jsb).unwrap();
    jsb.finish().unwrap()
}

#[test]
fn nested_compact() {
    let out = build(0, |jsb| {
        jsb.begin_object()?;
        jsb.key("data")?;
        jsb.begin_array()?;
        jsb.string(Some("item1"))?;
        jsb.int(2)?;
        jsb.number(2.432, 2)?;
        jsb.bool(true)?;
        jsb.null()?;
        jsb.end_array()?;
        jsb.key("empty")?;
        jsb.begin_object()?;
        jsb.end_object()?;
        jsb.end_object()
    });
    assert_eq!(out, r#"{"data": ["item1",2,2.43,true,null],"empty": {}}"#);
}

#[test]
fn pretty_print() {
    let out = build(4, |jsb| {
        jsb.begin_object()?;
        jsb.key("message")?;
        jsb.string(Some("Hello, World!"))?;
        jsb.key("data")?;
        jsb.begin_array()?;
        jsb.int(1)?;
        jsb.begin_object()?;
        jsb.key("key1")?;
        jsb.string(Some("value1"))?;
        jsb.end_object()?;
        jsb.end_array()?;
        jsb.end_object()
    });
    let expected = "{\n    \"message\": \"Hello, World!\",\n    \"data\": [\n        1,\n        {\n            \"key1\": \"value1\"\n        }\n    ]\n}";
    assert_eq!(out, expected);
}

#[test]
fn escaping() {
    let out = build(0, |jsb| {
        jsb.begin_array()?;
        jsb.string(Some("a\"b\\c\nd\te\rf"))?;
        jsb.string(None)?;
        jsb.end_array()
    });
    assert_eq!(out, r#"["a\"b\\c\nd\tef",null]"#);
}

#[test]
fn raw_splice_keeps_separators() {
    let out = build(0, |jsb| {
        jsb.begin_object()?;
        jsb.key("a")?;
        jsb.raw(r#"{"x":[1, 2]}"#)?;
        jsb.key("b")?;
        jsb.int(1)?;
        jsb.end_object()
    });
    assert_eq!(out, r#"{"a": {"x":[1, 2]},"b": 1}"#);
}

#[test]
fn misuse_is_rejected() {
    let mut jsb = JsonBuilder::new();
    jsb.begin_object().unwrap();
    assert!(jsb.int(1).is_err());
    jsb.key("a").unwrap();
    assert!(jsb.key("b").is_err());
    assert!(jsb.end_array().is_err());
    jsb.int(1).unwrap();
    assert!(jsb.clone().finish().is_err());
    jsb.end_object().unwrap();
    assert!(jsb.end_object().is_err());
}
