use regex::Regex;
use lazy_static::lazy_static;
use crate::utils::{quote, error};
use crate::error::JsgenError;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(concat!(
        r"(//[^\n]*",
        r"|/\*(?s:.*?)\*/|/\*",
        r#"|"(?:[^"\\\n]|\\.)*"|""#,
        r"|'(?:[^'\\\n]|\\.)*'|'",
        r"|(?:\d|\.\d)(?:[eEpP][+-]|[A-Za-z0-9_.])*",
        r"|[A-Za-z_][A-Za-z0-9_]*",
        r"|\.\.\.|<<=|>>=|->|\+\+|--|<<|>>|<=|>=|==|!=|&&|\|\||##|[-+*/%&|^]=",
        r"|\s+|\S)",
    )).unwrap();
    pub static ref WHITESPACE_RX: Regex = Regex::new(r"^\s+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    StringLiteral,
    CharLiteral,
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:   TokenKind,
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == text
    }

    /// Contents of a string literal with escapes resolved. Any other token
    /// yields its text unchanged.
    pub fn string_value(&self) -> String {
        if self.kind != TokenKind::StringLiteral || self.text.len() < 2 {
            return self.text.clone();
        }
        unescape(&self.text[1..self.text.len() - 1])
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('x') => {
                let mut code = 0u32;
                while let Some(digit) = chars.peek().and_then(|d| d.to_digit(16)) {
                    code = code.wrapping_mul(16).wrapping_add(digit);
                    chars.next();
                }
                out.extend(char::from_u32(code));
            }
            Some(d @ '0'..='7') => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(code));
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

fn classify(part: &str) -> TokenKind {
    let mut chars = part.chars();
    match (chars.next(), chars.next()) {
        (Some('"'), _) => TokenKind::StringLiteral,
        (Some('\''), _) => TokenKind::CharLiteral,
        (Some(c), _) if c.is_ascii_digit() => TokenKind::Number,
        (Some('.'), Some(c)) if c.is_ascii_digit() => TokenKind::Number,
        (Some(c), _) if c.is_ascii_alphabetic() || c == '_' => TokenKind::Identifier,
        _ => TokenKind::Punct,
    }
}

/// Splits C source text into tokens, dropping whitespace and comments.
/// Preprocessor lines are tokenized like any other text. The last token is
/// always [TokenKind::Eof].
pub fn tokenize_source(text: &str) -> Result<Vec<Token>, JsgenError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;

    for mat in TOKEN_REGEX.find_iter(text) {
        let part = mat.as_str();

        if part == "/*" {
            return Err(error("Unterminated block comment", line, column));
        }
        if part == "\"" || part == "'" {
            return Err(error(
                &format!("Unterminated literal starting with {}", quote(part)),
                line,
                column,
            ));
        }

        if !WHITESPACE_RX.is_match(part) && !part.starts_with("//") && !part.starts_with("/*") {
            tokens.push(Token {
                kind:   classify(part),
                text:   part.to_string(),
                line,
                column,
            });
        }

        // Update line/column
        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }
    }

    tokens.push(Token {
        kind:   TokenKind::Eof,
        text:   "".to_string(),
        line,
        column,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let input = "int x = 10;";
        let expected = vec![
            Token { kind: TokenKind::Identifier, text: "int".into(), line: 1, column: 1 },
            Token { kind: TokenKind::Identifier, text: "x".into(),   line: 1, column: 5 },
            Token { kind: TokenKind::Punct,      text: "=".into(),   line: 1, column: 7 },
            Token { kind: TokenKind::Number,     text: "10".into(),  line: 1, column: 9 },
            Token { kind: TokenKind::Punct,      text: ";".into(),   line: 1, column: 11 },
            Token { kind: TokenKind::Eof,        text: "".into(),    line: 1, column: 12 },
        ];
        let got = tokenize_source(input).unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let input = "// leading\nstruct /* inline\n comment */ role {\n};";
        let got = tokenize_source(input).unwrap();
        assert_eq!(texts(&got), vec!["struct", "role", "{", "}", ";", ""]);
        assert_eq!((got[1].line, got[1].column), (3, 13));
        assert_eq!((got[2].line, got[2].column), (3, 18));
    }

    #[test]
    fn test_tokenize_punctuation() {
        let input = "#define X(a) a->b ... x++ y<<=2 .5 1.0e+3";
        let got = tokenize_source(input).unwrap();
        assert_eq!(
            texts(&got),
            vec!["#", "define", "X", "(", "a", ")", "a", "->", "b", "...", "x", "++", "y", "<<=", "2", ".5", "1.0e+3", ""]
        );
        assert_eq!(got[15].kind, TokenKind::Number);
        assert_eq!(got[16].kind, TokenKind::Number);
    }

    #[test]
    fn test_string_value() {
        let got = tokenize_source(r#"alias("a\"b\n") 'c' "\x41\101""#).unwrap();
        assert_eq!(got[2].kind, TokenKind::StringLiteral);
        assert_eq!(got[2].string_value(), "a\"b\n");
        assert_eq!(got[4].kind, TokenKind::CharLiteral);
        assert_eq!(got[5].string_value(), "AA");
        assert_eq!(got[0].string_value(), "alias");
    }

    #[test]
    fn test_tokenize_unterminated() {
        for input in ["char *s = \"abc;", "/* never closed", "char c = 'x;"] {
            let err = tokenize_source(input).unwrap_err();
            assert!(
                matches!(err, JsgenError::ParseError { .. }),
                "expected a ParseError but got {:?}",
                err
            );
        }
        let err = tokenize_source("int a;\n  \"oops").unwrap_err();
        assert!(matches!(err, JsgenError::ParseError { line: 2, column: 3, .. }));
    }
}
