//! Runtime side of jsgen: the extracted record model, the type resolver, and
//! Rust ports of the JSON reader/builder that generated C code talks to.
//!
//! The dynamic [Value] codec executes a [Model] with exactly the semantics of
//! the generated `parse_*` / `stringify_*` functions.
//!
//! ```
//! use brine_jsgen_schema::*;
//!
//! let mut point = Model::new("Point", "Point");
//! point.fields.push(Field::new("x", "int"));
//! point.fields.push(Field::new("y", "int"));
//! let registry = Registry::new(vec![point]);
//!
//! let value = Value::decode(&registry, "Point", r#"{"x": 1, "y": -2}"#).unwrap();
//! assert_eq!(format!("{:?}", value), "Point {x: 1, y: -2}");
//! assert_eq!(value.encode(&registry).unwrap(), r#"{"x": 1,"y": -2}"#);
//! ```

pub mod error;
pub mod jsb;
pub mod jsp;
pub mod model;
pub mod repr;
pub mod value;

pub use error::*;
pub use jsb::*;
pub use jsp::*;
pub use model::*;
pub use repr::*;
pub use value::*;
