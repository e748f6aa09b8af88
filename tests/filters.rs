use json_shape::ast;
use json_shape::filters::starts_with;
use json_shape::parser::{decode_sync, is};
use serde_json::json;

#[test]
fn starts_with_guard() {
    let schema = starts_with(ast::string(), "a");
    assert!(is(&schema, &json!("a")));
    assert!(is(&schema, &json!("ab")));

    assert!(!is(&schema, &json!("")));
    assert!(!is(&schema, &json!("b")));
}

#[test]
fn starts_with_message() {
    let schema = starts_with(ast::string(), "a");
    let err = decode_sync(&schema, json!("b")).unwrap_err();
    assert_eq!(err.to_string(), r#"Expected a string starting with "a", actual "b""#);
}
