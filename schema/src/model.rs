use serde::Serialize;
use std::fmt;

/// One member of an annotated record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Field {
    pub name:             String,
    pub alias:            Option<String>,
    /// Declared type with at most one trailing `*`, e.g. `struct role*`.
    pub type_:            String,
    /// Bare identifier of the type, e.g. `role`.
    pub base_type:        String,
    pub is_pointer:       bool,
    pub is_array:         bool,
    /// Text between the brackets of a bare array declaration.
    pub array_len:        Option<String>,
    pub counter_field:    Option<String>,
    pub is_counter_field: bool,
    pub is_json_literal:  bool,
    pub is_nested_struct: bool,
}

impl Field {
    /// Builds a field from its name and declared type. `type_` may carry a
    /// `struct ` prefix and a single trailing `*`.
    pub fn new(name: &str, type_: &str) -> Field {
        let type_ = type_.trim();
        let base_type = type_
            .trim_end_matches('*')
            .trim_start_matches("struct ")
            .trim()
            .to_string();
        Field {
            name: name.to_string(),
            type_: type_.to_string(),
            base_type,
            is_pointer: type_.ends_with('*'),
            is_nested_struct: type_.starts_with("struct "),
            ..Field::default()
        }
    }

    /// Key used for this field in JSON text.
    pub fn json_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn has_counter(&self) -> bool {
        self.counter_field.is_some()
    }

    /// `char name[N]`: a fixed-size character buffer, handled as a string
    /// rather than as an array.
    pub fn is_fixed_string(&self) -> bool {
        self.base_type == "char" && self.is_array && !self.has_counter() && !self.type_.ends_with('*')
    }

    /// Pointer storage that can be NULL. Bracket arrays are marked as pointers
    /// but are never NULL.
    pub fn is_nullable(&self) -> bool {
        self.is_pointer && self.array_len.is_none()
    }

    /// Element count of bracket storage, when the brackets hold a plain
    /// number.
    pub fn capacity(&self) -> Option<usize> {
        self.array_len.as_deref()?.trim().parse().ok()
    }

    /// Array declared with brackets but no `sized_by` counter.
    pub fn is_bare_array(&self) -> bool {
        self.is_array && !self.has_counter() && !self.is_fixed_string()
    }
}

/// Problem found while linking `sized_by` references inside a model.
#[derive(Debug, Clone, PartialEq)]
pub enum CounterIssue {
    /// No sibling field carries the referenced name.
    Missing { field: String, counter: String },
    /// The referenced field has a counter of its own.
    Chained { field: String, counter: String },
}

impl fmt::Display for CounterIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CounterIssue::Missing { field, counter } => write!(
                f,
                "field \"{}\" is sized by \"{}\", which is not a field of the same struct",
                field, counter
            ),
            CounterIssue::Chained { field, counter } => write!(
                f,
                "field \"{}\" is sized by \"{}\", which has a counter of its own",
                field, counter
            ),
        }
    }
}

/// The extracted schema of one annotated record type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    /// C type name: `struct role` for tagged records, `User` for typedefs.
    pub name:        String,
    /// Bare identifier used in generated function names.
    pub simple_name: String,
    pub stringify:   bool,
    pub parse:       bool,
    pub fields:      Vec<Field>,
}

impl Model {
    /// A model with both parse and stringify generation enabled.
    pub fn new(name: &str, simple_name: &str) -> Model {
        Model {
            name:        name.to_string(),
            simple_name: simple_name.to_string(),
            stringify:   true,
            parse:       true,
            fields:      Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that appear as keys in JSON, in declaration order.
    pub fn json_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_counter_field)
    }

    /// Links every `sized_by` reference to its sibling and flags the sibling
    /// as a counter field. References that cannot be linked are left as they
    /// are and reported back.
    pub fn resolve_counters(&mut self) -> Vec<CounterIssue> {
        let mut issues = Vec::new();

        for i in 0..self.fields.len() {
            let Some(counter) = self.fields[i].counter_field.clone() else {
                continue;
            };
            let field = self.fields[i].name.clone();

            match self.fields.iter().position(|f| f.name == counter) {
                None => issues.push(CounterIssue::Missing { field, counter }),
                Some(j) if self.fields[j].has_counter() => {
                    issues.push(CounterIssue::Chained { field, counter })
                }
                Some(j) => self.fields[j].is_counter_field = true,
            }
        }

        issues
    }
}

/// All models collected during one generation run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    models: Vec<Model>,
}

impl Registry {
    pub fn new(models: Vec<Model>) -> Registry {
        Registry { models }
    }

    pub fn push(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn extend(&mut self, models: impl IntoIterator<Item = Model>) {
        self.models.extend(models);
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Looks a model up by the bare identifier that nested fields refer to.
    pub fn get(&self, simple_name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.simple_name == simple_name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    pub fn into_models(self) -> Vec<Model> {
        self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_new_splits_type() {
        let field = Field::new("role", "struct role*");
        assert_eq!(field.base_type, "role");
        assert!(field.is_pointer);
        assert!(field.is_nested_struct);

        let field = Field::new("id", "int");
        assert_eq!(field.base_type, "int");
        assert!(!field.is_pointer);
        assert_eq!(field.json_key(), "id");
    }

    #[test]
    fn resolve_counters_marks_sibling() {
        let mut model = Model::new("Bag", "Bag");
        let mut items = Field::new("items", "int*");
        items.is_array = true;
        items.counter_field = Some("n".to_string());
        model.fields.push(items);
        model.fields.push(Field::new("n", "size_t"));

        assert!(model.resolve_counters().is_empty());
        assert!(model.fields[1].is_counter_field);
        assert_eq!(model.json_fields().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["items"]);
    }

    #[test]
    fn resolve_counters_reports_missing_and_chained() {
        let mut model = Model::new("Bag", "Bag");
        let mut a = Field::new("a", "int*");
        a.counter_field = Some("b".to_string());
        let mut b = Field::new("b", "int*");
        b.counter_field = Some("nope".to_string());
        model.fields.push(a);
        model.fields.push(b);

        let issues = model.resolve_counters();
        assert_eq!(
            issues,
            vec![
                CounterIssue::Chained { field: "a".into(), counter: "b".into() },
                CounterIssue::Missing { field: "b".into(), counter: "nope".into() },
            ]
        );
        assert!(model.fields.iter().all(|f| !f.is_counter_field));
    }
}
