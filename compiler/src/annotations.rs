use crate::tokenizer::{Token, TokenKind};
use brine_jsgen_schema::Model;
use log::warn;

/// Field annotations recognized inside an annotated record body. Each one
/// applies to the most recently declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Alias,
    SizedBy,
    Ignore,
    JsonLiteral,
}

impl Annotation {
    /// Accepts both the short and the `jsgen_` prefixed spelling.
    pub fn from_keyword(text: &str) -> Option<Annotation> {
        match text.strip_prefix("jsgen_").unwrap_or(text) {
            "alias"        => Some(Annotation::Alias),
            "sized_by"     => Some(Annotation::SizedBy),
            "ignore"       => Some(Annotation::Ignore),
            "json_literal" => Some(Annotation::JsonLiteral),
            _ => None,
        }
    }
}

fn eat_punct(tokens: &[Token], index: &mut usize, text: &str) -> bool {
    match tokens.get(*index) {
        Some(token) if token.is_punct(text) => {
            *index += 1;
            true
        }
        _ => false,
    }
}

/// Reads `( "text" )`. A bare identifier is accepted in place of the string
/// literal. The closing parenthesis is optional.
fn read_argument(tokens: &[Token], index: &mut usize) -> Option<String> {
    if !eat_punct(tokens, index, "(") {
        return None;
    }
    let token = tokens.get(*index)?;
    let value = match token.kind {
        TokenKind::StringLiteral => token.string_value(),
        TokenKind::Identifier => token.text.clone(),
        _ => return None,
    };
    *index += 1;
    eat_punct(tokens, index, ")");
    Some(value)
}

/// Consumes the annotation's arguments starting at `index` and applies it to
/// the last field of `model`. Misuse is reported and otherwise ignored.
pub fn apply_annotation(
    annotation: Annotation,
    keyword:    &Token,
    tokens:     &[Token],
    index:      &mut usize,
    model:      &mut Model,
    has_field:  bool,
) {
    let argument = match annotation {
        Annotation::Alias | Annotation::SizedBy => match read_argument(tokens, index) {
            Some(argument) => Some(argument),
            None => {
                warn!(
                    "{} at line {}, column {} expects a string argument, ignoring it",
                    keyword.text, keyword.line, keyword.column
                );
                return;
            }
        },
        Annotation::Ignore => {
            if eat_punct(tokens, index, "(") {
                eat_punct(tokens, index, ")");
            }
            None
        }
        Annotation::JsonLiteral => None,
    };

    if annotation == Annotation::Ignore && has_field && model.fields.pop().is_some() {
        return;
    }
    let field = match model.fields.last_mut() {
        Some(field) if has_field => field,
        _ => {
            warn!(
                "{} at line {}, column {} is not preceded by a field, ignoring it",
                keyword.text, keyword.line, keyword.column
            );
            return;
        }
    };

    match (annotation, argument) {
        (Annotation::Alias, Some(alias)) => field.alias = Some(alias),
        (Annotation::SizedBy, Some(counter)) => {
            field.counter_field = Some(counter);
            field.is_array = true;
            field.is_pointer = true;
        }
        (Annotation::JsonLiteral, _) => field.is_json_literal = true,
        _ => {}
    }
}
