use brine_jsgen_schema::{resolve_element, resolve_field, Direction, Field, Model, Repr, NUMBER_PRECISION};
use crate::utils::c_string;

const INDENT: &str = "    ";

/// Line-oriented output buffer with a running indent level.
struct CodeWriter {
    lines:  Vec<String>,
    indent: usize,
}

impl CodeWriter {
    fn new() -> Self {
        CodeWriter { lines: Vec::new(), indent: 0 }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", INDENT.repeat(self.indent), text));
        }
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Writes `text` and indents everything after it.
    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// `} else {` style lines that end one block and start the next.
    fn reopen(&mut self, text: impl AsRef<str>) {
        self.close(text);
        self.indent += 1;
    }

    fn finish(self) -> String {
        let mut code = self.lines.join("\n");
        code.push('\n');
        code
    }
}

const PREAMBLE: &str = r#"#include "jsb.h"
#include "jsp.h"
#include <stdbool.h>
#include <string.h>

#ifndef JSGEN_ALLOCATOR
#define JSGEN_ALLOCATOR
typedef struct {
    unsigned char *data;
    size_t capacity;
    size_t used;
} JsGenAllocator;

static inline void *jsgen_malloc(JsGenAllocator *a, size_t size) {
    size_t aligned = (size + 7) & ~(size_t)7;
    if (a == NULL || aligned < size || aligned > a->capacity - a->used) return NULL;
    void *ptr = a->data + a->used;
    a->used += aligned;
    memset(ptr, 0, size);
    return ptr;
}

static inline void jsgen_reset(JsGenAllocator *a) {
    if (a != NULL) a->used = 0;
}
#endif
"#;

/// Compiles every model into one C source unit holding the parse and
/// stringify functions, in registry order.
pub fn compile_models_to_c(models: &[Model]) -> String {
    let mut w = CodeWriter::new();

    for line in PREAMBLE.lines() {
        w.line(line);
    }
    w.blank();

    // Prototypes let models refer to each other regardless of order
    for model in models {
        if model.parse {
            w.line(format!("int _parse_{}(Jsp *jsp, {} *out, JsGenAllocator *a);", model.simple_name, model.name));
        }
        if model.stringify {
            w.line(format!("int _stringify_{}(Jsb *jsb, {} *in);", model.simple_name, model.name));
        }
    }
    if !models.is_empty() {
        w.blank();
    }

    for model in models {
        if model.parse {
            generate_parse(&mut w, model);
        }
        if model.stringify {
            generate_stringify(&mut w, model);
        }
    }

    w.finish()
}

fn generate_parse(w: &mut CodeWriter, model: &Model) {
    let s = &model.simple_name;
    let n = &model.name;

    w.open(format!("int _parse_{}(Jsp *jsp, {} *out, JsGenAllocator *a) {{", s, n));
    w.line("(void)a;");
    w.line("int err = jsp_begin_object(jsp);");
    w.line("if (err) return err;");
    w.open("while (jsp_key(jsp) == 0) {");

    let mut first = true;
    for field in model.json_fields() {
        let head = format!("if (strcmp(jsp->string, {}) == 0) {{", c_string(field.json_key()));
        if first {
            w.open(head);
            first = false;
        } else {
            w.reopen(format!("}} else {}", head));
        }
        parse_field_body(w, model, field);
    }
    if first {
        w.line("err = jsp_skip(jsp);");
        w.line("if (err) return err;");
    } else {
        w.reopen("} else {");
        w.line("err = jsp_skip(jsp);");
        w.line("if (err) return err;");
        w.close("}");
    }

    w.close("}");
    w.line("return jsp_end_object(jsp);");
    w.close("}");
    w.blank();

    w.open(format!("int parse_{}(const char *json, {} *out, JsGenAllocator *a) {{", s, n));
    w.line("Jsp jsp = {0};");
    w.line("int err = jsp_init(&jsp, json, strlen(json));");
    w.line("if (err) return err;");
    w.line(format!("err = _parse_{}(&jsp, out, a);", s));
    w.line("jsp_free(&jsp);");
    w.line("return err;");
    w.close("}");
    w.blank();

    w.open(format!(
        "int _parse_{}_list(Jsp *jsp, {} **out, size_t *out_count, JsGenAllocator *a) {{",
        s, n
    ));
    w.line("*out = NULL;");
    w.line("*out_count = 0;");
    w.line("int err = jsp_begin_array(jsp);");
    w.line("if (err) return err;");
    w.line("size_t len = jsp_array_length(jsp);");
    w.line(format!("{} *items = jsgen_malloc(a, sizeof({}) * len);", n, n));
    w.line("if (len > 0 && items == NULL) return -1;");
    w.open("for (size_t i = 0; i < len; i++) {");
    w.line(format!("err = _parse_{}(jsp, &items[i], a);", s));
    w.line("if (err) return err;");
    w.close("}");
    w.line("err = jsp_end_array(jsp);");
    w.line("if (err) return err;");
    w.line("*out = items;");
    w.line("*out_count = len;");
    w.line("return 0;");
    w.close("}");
    w.blank();

    w.open(format!(
        "int parse_{}_list(const char *json, {} **out, size_t *out_count, JsGenAllocator *a) {{",
        s, n
    ));
    w.line("Jsp jsp = {0};");
    w.line("int err = jsp_init(&jsp, json, strlen(json));");
    w.line("if (err) return err;");
    w.line(format!("err = _parse_{}_list(&jsp, out, out_count, a);", s));
    w.line("jsp_free(&jsp);");
    w.line("return err;");
    w.close("}");
    w.blank();
}

/// Name of the `Jsp` member holding a scalar of this representation.
fn jsp_member(repr: Repr) -> &'static str {
    match repr {
        Repr::Boolean => "boolean",
        Repr::String => "string",
        _ => "number",
    }
}

/// `jsp->type` tag a scalar of this representation must carry.
fn jsp_type(repr: Repr) -> &'static str {
    match repr {
        Repr::Boolean => "JSP_TYPE_BOOLEAN",
        Repr::String => "JSP_TYPE_STRING",
        _ => "JSP_TYPE_NUMBER",
    }
}

/// Rejects a value of the wrong JSON type instead of reading a stale member.
fn type_guard(w: &mut CodeWriter, repr: Repr, allow_null: bool) {
    if allow_null {
        w.line(format!(
            "if (jsp->type != {} && jsp->type != JSP_TYPE_NULL) return -1;",
            jsp_type(repr)
        ));
    } else {
        w.line(format!("if (jsp->type != {}) return -1;", jsp_type(repr)));
    }
}

fn parse_field_body(w: &mut CodeWriter, model: &Model, field: &Field) {
    let target = format!("out->{}", field.name);
    let counter = field
        .counter_field
        .as_deref()
        .filter(|c| model.field(c).is_some())
        .map(|c| format!("out->{}", c));

    match resolve_field(field, Direction::Parse) {
        Repr::String if field.is_json_literal && field.is_nullable() => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            w.open("if (jsp->type == JSP_TYPE_OBJECT || jsp->type == JSP_TYPE_ARRAY) {");
            w.line("size_t start = jsp->off - 1;");
            w.line("int depth = 1;");
            w.line("bool in_string = false;");
            w.open("while (jsp->off < jsp->length && depth > 0) {");
            w.line("char c = jsp->buffer[jsp->off];");
            w.open("if (in_string) {");
            w.line("if (c == '\\\\') jsp->off++;");
            w.line("else if (c == '\"') in_string = false;");
            w.reopen("} else if (c == '\"') {");
            w.line("in_string = true;");
            w.reopen("} else if (c == '{' || c == '[') {");
            w.line("depth++;");
            w.reopen("} else if (c == '}' || c == ']') {");
            w.line("depth--;");
            w.close("}");
            w.line("jsp->off++;");
            w.close("}");
            w.line("size_t span = jsp->off - start;");
            w.line(format!("{} = jsgen_malloc(a, span + 1);", target));
            w.line(format!("if ({} == NULL) return -1;", target));
            w.line(format!("memcpy({}, &jsp->buffer[start], span);", target));
            w.line(format!("{}[span] = '\\0';", target));
            w.line("jsp_skip_end(jsp);");
            w.reopen("} else {");
            w.line(format!("{} = NULL;", target));
            w.close("}");
        }

        Repr::String if field.is_fixed_string() => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            type_guard(w, Repr::String, true);
            w.line(format!(
                "if (jsp->string) strncpy({}, jsp->string, sizeof({}) - 1);",
                target, target
            ));
        }

        Repr::String => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            type_guard(w, Repr::String, true);
            w.line("size_t s_len = jsp->string ? strlen(jsp->string) : 0;");
            if let Some(counter) = &counter {
                w.line(format!("{} = s_len;", counter));
            }
            w.open("if (s_len > 0) {");
            w.line(format!("{} = jsgen_malloc(a, s_len + 1);", target));
            w.line(format!("if ({} == NULL) return -1;", target));
            w.line(format!("memcpy({}, jsp->string, s_len + 1);", target));
            w.reopen("} else {");
            w.line(format!("{} = NULL;", target));
            w.close("}");
        }

        _ if field.is_array => {
            w.line("err = jsp_begin_array(jsp);");
            w.line("if (err) return err;");
            if field.has_counter() {
                w.line("size_t len = jsp_array_length(jsp);");
                if let Some(counter) = &counter {
                    w.line(format!("{} = len;", counter));
                }
                if field.array_len.is_some() {
                    w.line(format!("if (len > sizeof({}) / sizeof({}[0])) return -1;", target, target));
                } else {
                    w.line(format!("{} = jsgen_malloc(a, sizeof(*{}) * len);", target, target));
                    w.line(format!("if (len > 0 && {} == NULL) return -1;", target));
                }
                w.open("for (size_t i = 0; i < len; i++) {");
                parse_element(w, field, &target);
                w.close("}");
            } else {
                w.line("size_t i = 0;");
                w.open("while (jsp_array_has_more(jsp)) {");
                if field.array_len.is_some() {
                    w.line(format!("if (i >= sizeof({}) / sizeof({}[0])) return -1;", target, target));
                }
                parse_element(w, field, &target);
                w.line("i++;");
                w.close("}");
            }
            w.line("err = jsp_end_array(jsp);");
            w.line("if (err) return err;");
        }

        Repr::Nested if field.is_nullable() => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            w.open("if (jsp->type == JSP_TYPE_NULL) {");
            w.line(format!("{} = NULL;", target));
            w.reopen("} else {");
            w.line(format!("{} = jsgen_malloc(a, sizeof(*{}));", target, target));
            w.line(format!("if ({} == NULL) return -1;", target));
            w.line(format!("err = _parse_{}(jsp, {}, a);", field.base_type, target));
            w.line("if (err) return err;");
            w.close("}");
        }

        Repr::Nested => {
            w.line(format!("err = _parse_{}(jsp, &{}, a);", field.base_type, target));
            w.line("if (err) return err;");
        }

        repr if field.is_nullable() => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            w.open("if (jsp->type == JSP_TYPE_NULL) {");
            w.line(format!("{} = NULL;", target));
            w.reopen("} else {");
            type_guard(w, repr, false);
            w.line(format!("{} = jsgen_malloc(a, sizeof(*{}));", target, target));
            w.line(format!("if ({} == NULL) return -1;", target));
            w.line(format!("*{} = jsp->{};", target, jsp_member(repr)));
            w.close("}");
        }

        repr => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            type_guard(w, repr, false);
            w.line(format!("{} = jsp->{};", target, jsp_member(repr)));
        }
    }
}

fn parse_element(w: &mut CodeWriter, field: &Field, target: &str) {
    match resolve_element(field, Direction::Parse) {
        Repr::Nested => {
            w.line(format!("err = _parse_{}(jsp, &{}[i], a);", field.base_type, target));
            w.line("if (err) return err;");
        }
        repr => {
            w.line("err = jsp_value(jsp);");
            w.line("if (err) return err;");
            type_guard(w, repr, false);
            w.line(format!("{}[i] = jsp->{};", target, jsp_member(repr)));
        }
    }
}

fn generate_stringify(w: &mut CodeWriter, model: &Model) {
    let s = &model.simple_name;
    let n = &model.name;

    w.open(format!("int _stringify_{}(Jsb *jsb, {} *in) {{", s, n));
    w.line("if (jsb_begin_object(jsb)) return -1;");
    for field in model.json_fields() {
        stringify_field(w, model, field);
    }
    w.line("return jsb_end_object(jsb);");
    w.close("}");
    w.blank();

    w.open(format!("char *stringify_{}_indent({} *in, int indent) {{", s, n));
    w.line("Jsb jsb = {.pp = indent};");
    w.open(format!("if (_stringify_{}(&jsb, in)) {{", s));
    w.line("jsb_free(&jsb);");
    w.line("return NULL;");
    w.close("}");
    w.line("return jsb_get(&jsb);");
    w.close("}");
    w.blank();
    w.line(format!("#define stringify_{}(in) stringify_{}_indent((in), 0)", s, s));
    w.blank();

    w.open(format!("char *stringify_{}_list_indent({} *in, size_t count, int indent) {{", s, n));
    w.line("Jsb jsb = {.pp = indent};");
    w.line("int err = jsb_begin_array(&jsb);");
    w.open("for (size_t i = 0; !err && i < count; i++) {");
    w.line(format!("err = _stringify_{}(&jsb, &in[i]);", s));
    w.close("}");
    w.line("if (!err) err = jsb_end_array(&jsb);");
    w.open("if (err) {");
    w.line("jsb_free(&jsb);");
    w.line("return NULL;");
    w.close("}");
    w.line("return jsb_get(&jsb);");
    w.close("}");
    w.blank();
    w.line(format!(
        "#define stringify_{}_list(in, count) stringify_{}_list_indent((in), (count), 0)",
        s, s
    ));
    w.blank();
}

/// Writes a scalar through the builder primitive matching its representation.
fn jsb_scalar(repr: Repr, value: &str) -> String {
    match repr {
        Repr::Integer => format!("if (jsb_int(jsb, {})) return -1;", value),
        Repr::Number => format!("if (jsb_number(jsb, {}, {})) return -1;", value, NUMBER_PRECISION),
        Repr::Boolean => format!("if (jsb_bool(jsb, {})) return -1;", value),
        _ => format!("if (jsb_string(jsb, {})) return -1;", value),
    }
}

fn stringify_field(w: &mut CodeWriter, model: &Model, field: &Field) {
    let source = format!("in->{}", field.name);
    let nullable = field.is_nullable();

    if nullable {
        w.open(format!("if ({} != NULL) {{", source));
    }
    w.line(format!("if (jsb_key(jsb, {})) return -1;", c_string(field.json_key())));

    match resolve_field(field, Direction::Stringify) {
        Repr::String if field.is_json_literal && nullable => {
            w.open(format!("if ({}[0] != '\\0') {{", source));
            w.line(format!("if (jsb_raw(jsb, {})) return -1;", source));
            w.reopen("} else {");
            w.line("if (jsb_null(jsb)) return -1;");
            w.close("}");
        }

        Repr::String => w.line(jsb_scalar(Repr::String, &source)),

        _ if field.is_array => {
            w.line("if (jsb_begin_array(jsb)) return -1;");
            let counter = field.counter_field.as_deref().filter(|c| model.field(c).is_some());
            if let Some(counter) = counter {
                w.open(format!("for (size_t i = 0; i < (size_t)in->{}; ++i) {{", counter));
                match resolve_element(field, Direction::Stringify) {
                    Repr::Nested => w.line(format!(
                        "if (_stringify_{}(jsb, &{}[i])) return -1;",
                        field.base_type, source
                    )),
                    repr => w.line(jsb_scalar(repr, &format!("{}[i]", source))),
                }
                w.close("}");
            }
            w.line("if (jsb_end_array(jsb)) return -1;");
        }

        Repr::Nested if nullable => {
            w.line(format!("if (_stringify_{}(jsb, {})) return -1;", field.base_type, source));
        }

        Repr::Nested => {
            w.line(format!("if (_stringify_{}(jsb, &{})) return -1;", field.base_type, source));
        }

        repr if nullable => w.line(jsb_scalar(repr, &format!("*{}", source))),

        repr => w.line(jsb_scalar(repr, &source)),
    }

    if nullable {
        w.close("}");
    }
}
