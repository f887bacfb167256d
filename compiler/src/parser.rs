use crate::{
    annotations::{apply_annotation, Annotation},
    error::JsgenError,
    tokenizer::{tokenize_source, Token, TokenKind},
};
use brine_jsgen_schema::{Field, Model};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

lazy_static! {
    static ref ENABLE_KEYWORD: Regex = Regex::new(r"^(?:JSGEN_)?JSON([SP]?)$").unwrap();
}

/// Returns the `(parse, stringify)` flags an enabling keyword stands for.
fn enabling_flags(text: &str) -> Option<(bool, bool)> {
    let caps = ENABLE_KEYWORD.captures(text)?;
    match caps.get(1).map(|m| m.as_str()) {
        Some("S") => Some((false, true)),
        Some("P") => Some((true, false)),
        _ => Some((true, true)),
    }
}

/// Token-at-a-time recognizer for annotated struct declarations. Everything
/// outside an enabled declaration is skipped.
struct Extractor<'t> {
    tokens:           &'t [Token],
    index:            usize,
    level:            i32,
    can_generate:     bool,
    in_typedef:       bool,
    in_struct:        bool,
    in_nested_struct: bool,
    has_field:        bool,
    model:            Model,
    models:           Vec<Model>,
}

impl<'t> Extractor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Extractor {
            tokens,
            index:            0,
            level:            0,
            can_generate:     false,
            in_typedef:       false,
            in_struct:        false,
            in_nested_struct: false,
            has_field:        false,
            model:            Model::default(),
            models:           Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    fn run(mut self) -> Vec<Model> {
        while let Some(token) = self.next() {
            if token.kind == TokenKind::Eof {
                break;
            }
            if !self.can_generate && !token.is_identifier() {
                continue;
            }
            match (token.kind, token.text.as_str()) {
                (TokenKind::Identifier, _) => self.handle_identifier(token),
                (TokenKind::Punct, "{") => self.level += 1,
                (TokenKind::Punct, "}") => self.level -= 1,
                (TokenKind::Punct, ";") => self.handle_semicolon(),
                _ => {}
            }
        }

        if self.in_struct {
            debug!(
                "dropping unfinished declaration {:?} at end of input",
                self.model.name
            );
        }
        self.models
    }

    fn handle_identifier(&mut self, token: &'t Token) {
        if let Some((parse, stringify)) = enabling_flags(&token.text) {
            self.can_generate = true;
            self.model.parse = parse;
            self.model.stringify = stringify;
            return;
        }
        if !self.can_generate {
            return;
        }

        // `const` is transparent: the next token is handled in its place
        let token = if token.text == "const" {
            match self.peek() {
                Some(next) if next.is_identifier() => {
                    self.index += 1;
                    next
                }
                _ => return,
            }
        } else {
            token
        };

        if token.text == "typedef" {
            self.in_typedef = true;
        } else if token.text == "struct" {
            if self.in_struct {
                self.in_nested_struct = true;
            } else {
                self.in_struct = true;
            }
        } else if let Some(annotation) = Annotation::from_keyword(&token.text) {
            apply_annotation(
                annotation,
                token,
                self.tokens,
                &mut self.index,
                &mut self.model,
                self.has_field,
            );
        } else if self.in_struct && self.level == 0 {
            self.model.name = if self.in_typedef {
                token.text.clone()
            } else {
                format!("struct {}", token.text)
            };
            self.model.simple_name = token.text.clone();
        } else if self.in_struct && self.level == 1 {
            self.parse_field(token);
            self.in_nested_struct = false;
            self.has_field = true;
        }
    }

    /// Reads `type [*] name [ [...] ]` starting at the type token. The cursor
    /// ends up right after the field name so terminators and annotations are
    /// still seen by the main loop.
    fn parse_field(&mut self, type_token: &Token) {
        let mut type_ = String::new();
        if self.in_nested_struct {
            type_.push_str("struct ");
        }
        type_.push_str(&type_token.text);

        if self.peek().is_some_and(|t| t.is_punct("*")) {
            type_.push('*');
            self.index += 1;
        }

        let name = match self.peek() {
            Some(token) if token.is_identifier() => {
                self.index += 1;
                token.text.as_str()
            }
            _ => return,
        };
        let mut field = Field::new(name, &type_);

        let resume = self.index;
        if self.peek().is_some_and(|t| t.is_punct("[")) {
            self.index += 1;
            let mut len = String::new();
            while let Some(token) = self.next() {
                if token.is_punct("]") || token.kind == TokenKind::Eof {
                    break;
                }
                len.push_str(&token.text);
            }
            field.is_array = true;
            field.is_pointer = true;
            field.array_len = Some(len);
        }
        self.index = resume;

        self.model.fields.push(field);
    }

    fn handle_semicolon(&mut self) {
        self.in_nested_struct = false;
        if self.level != 0 || !self.in_struct {
            return;
        }

        let mut model = std::mem::take(&mut self.model);
        for issue in model.resolve_counters() {
            warn!("{}: {}", model.name, issue);
        }
        if model.simple_name.is_empty() {
            warn!("skipping an annotated struct without a name");
        } else {
            self.models.push(model);
        }

        self.in_struct = false;
        self.in_typedef = false;
        self.can_generate = false;
        self.has_field = false;
    }
}

/// Extracts every annotated struct declaration from `tokens`, in source order.
pub fn extract_models(tokens: &[Token]) -> Vec<Model> {
    Extractor::new(tokens).run()
}

/// Tokenizes `text` and extracts its annotated struct declarations.
pub fn parse_source(text: &str) -> Result<Vec<Model>, JsgenError> {
    let tokens = tokenize_source(text)?;
    Ok(extract_models(&tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabling_flags() {
        assert_eq!(enabling_flags("JSON"), Some((true, true)));
        assert_eq!(enabling_flags("JSGEN_JSONS"), Some((false, true)));
        assert_eq!(enabling_flags("JSONP"), Some((true, false)));
        assert_eq!(enabling_flags("JSONX"), None);
        assert_eq!(enabling_flags("json"), None);
    }

    #[test]
    fn test_tagged_struct_and_typedef() {
        let models = parse_source(
            r#"
            JSON struct role { int id; };
            JSONS typedef struct user_s { long id; } User;
            "#,
        )
        .unwrap();

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "struct role");
        assert_eq!(models[0].simple_name, "role");
        assert!(models[0].parse && models[0].stringify);
        assert_eq!(models[1].name, "User");
        assert_eq!(models[1].simple_name, "User");
        assert!(!models[1].parse && models[1].stringify);
    }

    #[test]
    fn test_unannotated_structs_are_skipped() {
        let models = parse_source(
            r#"
            struct plain { int a; };
            typedef struct { int b; } Plain;
            JSONP struct kept { int c; };
            "#,
        )
        .unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].simple_name, "kept");
        assert!(models[0].parse && !models[0].stringify);
    }

    #[test]
    fn test_field_shapes() {
        let models = parse_source(
            r#"
            JSON typedef struct {
                const char *name;
                struct role *role;
                struct role main;
                char code[8];
                int grid[N + 1];
                double score;
            } Shapes;
            "#,
        )
        .unwrap();
        let fields = &models[0].fields;
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "role", "main", "code", "grid", "score"]);

        assert_eq!(fields[0].type_, "char*");
        assert!(fields[0].is_pointer);

        assert_eq!(fields[1].type_, "struct role*");
        assert_eq!(fields[1].base_type, "role");
        assert!(fields[1].is_nested_struct);

        assert_eq!(fields[2].type_, "struct role");
        assert!(!fields[2].is_pointer);

        assert!(fields[3].is_fixed_string());
        assert_eq!(fields[3].array_len.as_deref(), Some("8"));

        assert!(fields[4].is_array && fields[4].is_pointer);
        assert_eq!(fields[4].array_len.as_deref(), Some("N+1"));
        assert!(fields[4].is_bare_array());

        assert_eq!(fields[5].type_, "double");
    }

    #[test]
    fn test_annotations_and_counters() {
        let models = parse_source(
            r#"
            JSON typedef struct {
                float *values sized_by("value_count");
                size_t value_count;
                bool is_active alias("active");
                char *secret jsgen_ignore();
                char *meta json_literal;
            } Item;
            "#,
        )
        .unwrap();
        let model = &models[0];
        let names: Vec<_> = model.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["values", "value_count", "is_active", "meta"]);

        assert_eq!(model.fields[0].counter_field.as_deref(), Some("value_count"));
        assert!(model.fields[0].is_array);
        assert!(model.fields[1].is_counter_field);
        assert_eq!(model.fields[2].json_key(), "active");
        assert!(model.fields[3].is_json_literal);
    }

    #[test]
    fn test_unresolved_counter_is_kept() {
        let models = parse_source(r#"JSON struct bag { int *items sized_by("n"); };"#).unwrap();
        let field = &models[0].fields[0];
        assert_eq!(field.counter_field.as_deref(), Some("n"));
        assert!(!models[0].fields.iter().any(|f| f.is_counter_field));
    }

    #[test]
    fn test_unfinished_declaration_is_dropped() {
        let models = parse_source("JSON struct open { int a;").unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn test_preprocessor_lines_are_harmless() {
        let models = parse_source(
            r#"
            #include "jsgen.h"
            #define MAX 4
            JSON struct point { int x; int y; };
            "#,
        )
        .unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].fields.len(), 2);
    }
}
