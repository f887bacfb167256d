// example/src/main.rs

use brine_jsgen::*;

const HEADER: &str = include_str!("../include/models.h");

const USER_JSON: &str = r#"{
    "id": 7,
    "name": "Ada",
    "active": true,
    "score": 9.5,
    "roles": [{"id": 1, "name": "admin"}, {"id": 2, "name": null}],
    "password": "hunter2",
    "meta": {"theme": "dark", "tags": ["a", "b"]},
    "code": "ABCDEFGHIJ"
}"#;

fn main() -> Result<(), JsgenError> {
    let (registry, code) = compile_source(HEADER, &GenerateOptions::default())?;

    println!("// {} models extracted", registry.len());
    println!("{}", code);

    // Same semantics as parse_User followed by stringify_User
    let user = Value::decode(&registry, "User", USER_JSON)?;
    println!("decoded: {:?}", user);
    println!("name:    {}", user.get("name").map(|v| v.as_string()).unwrap_or_default());
    println!("roles:   {}", user.get("roles").map(|v| v.len()).unwrap_or_default());

    println!("{}", user.encode_indent(&registry, 2)?);
    println!("{}", restringify(&registry, "role", r#"[{"id": 3}]"#, 0, true)?);

    Ok(())
}
