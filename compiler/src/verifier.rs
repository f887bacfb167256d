use std::collections::HashMap;
use brine_jsgen_schema::Model;
use log::warn;
use crate::{
    utils::quote,
    error::JsgenError,
};

/// Reports problems that still produce compilable output as warnings.
/// With `strict` set, arrays without a `sized_by` counter are rejected
/// because their stringify side can only ever write `[]`.
pub fn verify_models(models: &[Model], strict: bool) -> Result<(), JsgenError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    // 1) Generated function names must be unique across the batch
    for model in models {
        if let Some(first) = seen.insert(model.simple_name.as_str(), model.name.as_str()) {
            warn!(
                "The name {} is used by both {} and {}, generated functions will collide",
                quote(&model.simple_name),
                quote(first),
                quote(&model.name)
            );
        }
    }

    // 2) Field level checks
    for model in models {
        for field in &model.fields {
            if field.is_json_literal && field.type_ != "char*" {
                warn!(
                    "Field {} of {} is marked json_literal but has type {}, it is treated as a plain field",
                    quote(&field.name),
                    quote(&model.name),
                    quote(&field.type_)
                );
            }

            if field.is_bare_array() {
                if strict {
                    return Err(JsgenError::VerifierError(format!(
                        "Field {} of {} is an array without a sized_by counter",
                        quote(&field.name),
                        quote(&model.name)
                    )));
                }
                if model.stringify {
                    warn!(
                        "Field {} of {} has no sized_by counter and always stringifies as []",
                        quote(&field.name),
                        quote(&model.name)
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn test_warnings_do_not_fail() {
        let models = parse_source(
            r#"
            JSON struct a { int x; };
            JSON typedef struct { int y; int *meta json_literal; } a;
            "#,
        )
        .unwrap();
        assert!(verify_models(&models, false).is_ok());
    }

    #[test]
    fn test_strict_rejects_bare_arrays() {
        let models = parse_source("JSON struct grid { int cells[4]; char label[8]; };").unwrap();
        assert!(verify_models(&models, false).is_ok());

        let err = verify_models(&models, true).unwrap_err();
        match err {
            JsgenError::VerifierError(msg) => assert!(msg.contains("\"cells\""), "{}", msg),
            other => panic!("expected a VerifierError but got {:?}", other),
        }
    }

    #[test]
    fn test_strict_accepts_counted_arrays() {
        let models = parse_source(r#"JSON struct bag { int *items sized_by("n"); int n; };"#).unwrap();
        assert!(verify_models(&models, true).is_ok());
    }
}
