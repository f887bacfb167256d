use crate::error::CodecError;
use std::borrow::Cow;

/// Deepest container nesting the reader accepts.
pub const MAX_DEPTH: usize = 128;

/// A scalar read by [JsonParser::value]. Containers are reported without
/// being consumed so the caller can enter them with `begin_object` /
/// `begin_array`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar<'a> {
    String(Cow<'a, str>),
    Number(f64),
    Bool(bool),
    Null,
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug, Clone)]
struct Frame {
    kind:    Container,
    count:   usize,
    /// A key (objects) or separator (arrays) was consumed and its value has
    /// not been read yet.
    pending: bool,
}

/// A pull-style JSON reader over a string slice.
///
/// Example usage:
///
/// ```
/// use brine_jsgen_schema::{JsonParser, Scalar};
/// let mut jsp = JsonParser::new(r#"{"id": 7, "tags": ["a", "b"]}"#);
/// jsp.begin_object().unwrap();
/// assert_eq!(jsp.key().unwrap().as_deref(), Some("id"));
/// assert_eq!(jsp.value(), Ok(Scalar::Number(7.0)));
/// assert_eq!(jsp.key().unwrap().as_deref(), Some("tags"));
/// jsp.begin_array().unwrap();
/// assert_eq!(jsp.array_len(), Ok(2));
/// ```
///
#[derive(Debug, Clone)]
pub struct JsonParser<'a> {
    data:  &'a str,
    index: usize,
    stack: Vec<Frame>,
}

impl<'a> JsonParser<'a> {
    pub fn new(data: &'a str) -> JsonParser<'a> {
        JsonParser { data, index: 0, stack: Vec::new() }
    }

    /// The complete input text.
    pub fn buffer(&self) -> &'a str {
        self.data
    }

    /// Current byte offset into [buffer](#method.buffer).
    pub fn offset(&self) -> usize {
        self.index
    }

    fn peek(&self) -> Option<u8> {
        self.data.as_bytes().get(self.index).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.index += 1;
        }
    }

    fn unexpected(&self, expected: &'static str) -> CodecError {
        match self.data[self.index..].chars().next() {
            Some(found) => CodecError::UnexpectedChar { expected, found, offset: self.index },
            None => CodecError::UnexpectedEof(self.index),
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<(), CodecError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.index += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_word(&mut self, word: &'static str) -> Result<(), CodecError> {
        if self.data[self.index..].starts_with(word) {
            self.index += word.len();
            Ok(())
        } else {
            Err(self.unexpected(word))
        }
    }

    /// Consumes the array separator for the next element, once.
    fn before_value(&mut self) -> Result<(), CodecError> {
        let Some(top) = self.stack.last() else {
            return Ok(());
        };
        if top.pending {
            return Ok(());
        }
        match top.kind {
            Container::Object => Err(CodecError::InvalidState("object value read without a key")),
            Container::Array => {
                if top.count > 0 {
                    self.expect(b',', "\",\"")?;
                }
                if let Some(top) = self.stack.last_mut() {
                    top.count += 1;
                    top.pending = true;
                }
                Ok(())
            }
        }
    }

    fn finish_value(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.pending = false;
        }
    }

    fn begin(&mut self, kind: Container, open: u8, expected: &'static str) -> Result<(), CodecError> {
        self.before_value()?;
        if self.stack.len() >= MAX_DEPTH {
            self.skip_ws();
            return Err(CodecError::NestingTooDeep { depth: MAX_DEPTH, offset: self.index });
        }
        self.expect(open, expected)?;
        self.stack.push(Frame { kind, count: 0, pending: false });
        Ok(())
    }

    fn end(&mut self, kind: Container, close: u8, expected: &'static str) -> Result<(), CodecError> {
        match self.stack.last() {
            Some(top) if top.kind == kind => {}
            _ => return Err(CodecError::InvalidState("closing a container that is not open")),
        }
        self.expect(close, expected)?;
        self.stack.pop();
        self.finish_value();
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<(), CodecError> {
        self.begin(Container::Object, b'{', "\"{\"")
    }

    pub fn end_object(&mut self) -> Result<(), CodecError> {
        self.end(Container::Object, b'}', "\"}\"")
    }

    pub fn begin_array(&mut self) -> Result<(), CodecError> {
        self.begin(Container::Array, b'[', "\"[\"")
    }

    pub fn end_array(&mut self) -> Result<(), CodecError> {
        self.end(Container::Array, b']', "\"]\"")
    }

    /// Reads the next key of the current object, or `None` once the closing
    /// brace is reached. The brace itself is left for [end_object](#method.end_object).
    pub fn key(&mut self) -> Result<Option<Cow<'a, str>>, CodecError> {
        let count = match self.stack.last() {
            Some(top) if top.kind == Container::Object && !top.pending => top.count,
            _ => return Err(CodecError::InvalidState("key read outside of an object")),
        };
        self.skip_ws();
        if self.peek() == Some(b'}') {
            return Ok(None);
        }
        if count > 0 {
            self.expect(b',', "\",\"")?;
            self.skip_ws();
        }
        if self.peek() != Some(b'"') {
            return Err(self.unexpected("object key"));
        }
        let key = self.read_string()?;
        self.expect(b':', "\":\"")?;
        if let Some(top) = self.stack.last_mut() {
            top.count += 1;
            top.pending = true;
        }
        Ok(Some(key))
    }

    /// True while the current array has elements left to read.
    pub fn has_more_elements(&mut self) -> bool {
        self.skip_ws();
        matches!(self.stack.last(), Some(top) if top.kind == Container::Array)
            && !matches!(self.peek(), Some(b']') | None)
    }

    /// Counts the elements left in the current array without consuming them.
    pub fn array_len(&self) -> Result<usize, CodecError> {
        let mut lookahead = self.clone();
        let mut len = 0;
        while lookahead.has_more_elements() {
            lookahead.skip()?;
            len += 1;
        }
        Ok(len)
    }

    /// Reads the next value. Objects and arrays are only reported.
    pub fn value(&mut self) -> Result<Scalar<'a>, CodecError> {
        self.before_value()?;
        self.skip_ws();
        let scalar = match self.peek() {
            Some(b'{') => return Ok(Scalar::Object),
            Some(b'[') => return Ok(Scalar::Array),
            Some(b'"') => Scalar::String(self.read_string()?),
            Some(b't') => {
                self.expect_word("true")?;
                Scalar::Bool(true)
            }
            Some(b'f') => {
                self.expect_word("false")?;
                Scalar::Bool(false)
            }
            Some(b'n') => {
                self.expect_word("null")?;
                Scalar::Null
            }
            Some(b'-' | b'0'..=b'9') => Scalar::Number(self.read_number()?),
            _ => return Err(self.unexpected("value")),
        };
        self.finish_value();
        Ok(scalar)
    }

    /// Consumes a `null` if it is the next value.
    pub fn take_null(&mut self) -> Result<bool, CodecError> {
        self.before_value()?;
        self.skip_ws();
        if self.data[self.index..].starts_with("null") {
            self.index += 4;
            self.finish_value();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Skips the next value, whatever it is.
    pub fn skip(&mut self) -> Result<(), CodecError> {
        self.before_value()?;
        self.skip_ws();
        match self.peek() {
            Some(b'{') => {
                self.begin_object()?;
                while self.key()?.is_some() {
                    self.skip()?;
                }
                self.end_object()
            }
            Some(b'[') => {
                self.begin_array()?;
                while self.has_more_elements() {
                    self.skip()?;
                }
                self.end_array()
            }
            _ => self.value().map(|_| ()),
        }
    }

    /// Skips the next value and returns its exact source text.
    pub fn raw_value(&mut self) -> Result<&'a str, CodecError> {
        self.before_value()?;
        self.skip_ws();
        let start = self.index;
        self.skip()?;
        Ok(&self.data[start..self.index])
    }

    fn read_number(&mut self) -> Result<f64, CodecError> {
        let start = self.index;
        let bytes = self.data.as_bytes();
        let mut end = start;
        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }
        while let Some(b) = bytes.get(end) {
            match b {
                b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-' => end += 1,
                _ => break,
            }
        }
        let text = &self.data[start..end];
        let number = text
            .parse::<f64>()
            .map_err(|_| CodecError::InvalidNumber(text.to_string()))?;
        self.index = end;
        Ok(number)
    }

    fn read_hex4(&mut self) -> Result<u32, CodecError> {
        let digits = self
            .data
            .get(self.index..self.index + 4)
            .ok_or(CodecError::UnexpectedEof(self.index))?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidEscape(self.index));
        }
        let code = u32::from_str_radix(digits, 16).map_err(|_| CodecError::InvalidEscape(self.index))?;
        self.index += 4;
        Ok(code)
    }

    fn read_string(&mut self) -> Result<Cow<'a, str>, CodecError> {
        // Opening quote
        self.index += 1;
        let start = self.index;
        let bytes = self.data.as_bytes();

        // Borrow when there is nothing to unescape
        while let Some(&b) = bytes.get(self.index) {
            match b {
                b'"' => {
                    let text = &self.data[start..self.index];
                    self.index += 1;
                    return Ok(Cow::Borrowed(text));
                }
                b'\\' => break,
                _ => self.index += 1,
            }
        }

        let mut out = String::from(&self.data[start..self.index]);
        loop {
            let Some(c) = self.data[self.index..].chars().next() else {
                return Err(CodecError::UnexpectedEof(self.index));
            };
            self.index += c.len_utf8();
            match c {
                '"' => return Ok(Cow::Owned(out)),
                '\\' => {
                    let Some(escape) = self.peek() else {
                        return Err(CodecError::UnexpectedEof(self.index));
                    };
                    self.index += 1;
                    match escape {
                        b'"'  => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/'  => out.push('/'),
                        b'b'  => out.push('\u{8}'),
                        b'f'  => out.push('\u{c}'),
                        b'n'  => out.push('\n'),
                        b'r'  => out.push('\r'),
                        b't'  => out.push('\t'),
                        b'u'  => {
                            let at = self.index - 2;
                            let mut code = self.read_hex4()?;
                            if (0xD800..0xDC00).contains(&code) && self.data[self.index..].starts_with("\\u") {
                                self.index += 2;
                                let low = self.read_hex4()?;
                                code = 0x10000 + ((code - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                            }
                            out.push(char::from_u32(code).ok_or(CodecError::InvalidEscape(at))?);
                        }
                        _ => return Err(CodecError::InvalidEscape(self.index - 2)),
                    }
                }
                _ => out.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_keys_and_scalars() {
        let mut jsp = JsonParser::new(r#" { "a" : 1.5 , "b":true, "c":null, "d":"x\"y" } "#);
        jsp.begin_object().unwrap();
        assert_eq!(jsp.key().unwrap().as_deref(), Some("a"));
        assert_eq!(jsp.value(), Ok(Scalar::Number(1.5)));
        assert_eq!(jsp.key().unwrap().as_deref(), Some("b"));
        assert_eq!(jsp.value(), Ok(Scalar::Bool(true)));
        assert_eq!(jsp.key().unwrap().as_deref(), Some("c"));
        assert_eq!(jsp.value(), Ok(Scalar::Null));
        assert_eq!(jsp.key().unwrap().as_deref(), Some("d"));
        assert_eq!(jsp.value(), Ok(Scalar::String(Cow::Owned("x\"y".to_string()))));
        assert_eq!(jsp.key(), Ok(None));
        jsp.end_object().unwrap();
    }

    #[test]
    fn array_len_does_not_consume() {
        let mut jsp = JsonParser::new(r#"[1, {"a": [2, 3]}, "s", []]"#);
        jsp.begin_array().unwrap();
        assert_eq!(jsp.array_len(), Ok(4));
        assert_eq!(jsp.value(), Ok(Scalar::Number(1.0)));
        assert_eq!(jsp.array_len(), Ok(3));
        jsp.skip().unwrap();
        assert_eq!(jsp.value(), Ok(Scalar::String(Cow::Borrowed("s"))));
        assert!(jsp.has_more_elements());
        jsp.skip().unwrap();
        assert!(!jsp.has_more_elements());
        jsp.end_array().unwrap();
    }

    #[test]
    fn raw_value_returns_exact_span() {
        let mut jsp = JsonParser::new(r#"{"meta": {"k": "}", "n": [1,2]} , "z": 0}"#);
        jsp.begin_object().unwrap();
        jsp.key().unwrap();
        assert_eq!(jsp.raw_value(), Ok(r#"{"k": "}", "n": [1,2]}"#));
        assert_eq!(jsp.key().unwrap().as_deref(), Some("z"));
        assert_eq!(jsp.value(), Ok(Scalar::Number(0.0)));
    }

    #[test]
    fn container_reported_then_entered() {
        let mut jsp = JsonParser::new(r#"[{"a": 1}, null]"#);
        jsp.begin_array().unwrap();
        assert_eq!(jsp.take_null(), Ok(false));
        assert_eq!(jsp.value(), Ok(Scalar::Object));
        jsp.begin_object().unwrap();
        jsp.key().unwrap();
        jsp.skip().unwrap();
        assert_eq!(jsp.key(), Ok(None));
        jsp.end_object().unwrap();
        assert_eq!(jsp.take_null(), Ok(true));
        jsp.end_array().unwrap();
    }

    #[test]
    fn unicode_escapes() {
        let mut jsp = JsonParser::new(r#""é🍕""#);
        assert_eq!(jsp.value(), Ok(Scalar::String(Cow::Owned("é🍕".to_string()))));
    }

    #[test]
    fn hex_escapes_need_four_hex_digits() {
        let mut jsp = JsonParser::new(r#""\u+041""#);
        assert_eq!(jsp.value(), Err(CodecError::InvalidEscape(3)));

        let mut jsp = JsonParser::new(r#""\u0041\u00e9""#);
        assert_eq!(jsp.value(), Ok(Scalar::String(Cow::Owned("Aé".to_string()))));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let deep = "[".repeat(10_000);
        let mut jsp = JsonParser::new(&deep);
        assert_eq!(
            jsp.skip(),
            Err(CodecError::NestingTooDeep { depth: MAX_DEPTH, offset: MAX_DEPTH })
        );

        let limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        let mut jsp = JsonParser::new(&limit);
        assert_eq!(jsp.skip(), Ok(()));
    }

    #[test]
    fn errors_carry_offsets() {
        let mut jsp = JsonParser::new(r#"{"a" 1}"#);
        jsp.begin_object().unwrap();
        assert_eq!(
            jsp.key(),
            Err(CodecError::UnexpectedChar { expected: "\":\"", found: '1', offset: 5 })
        );

        let mut jsp = JsonParser::new("[1,");
        jsp.begin_array().unwrap();
        jsp.value().unwrap();
        assert_eq!(jsp.value(), Err(CodecError::UnexpectedEof(3)));
    }
}
