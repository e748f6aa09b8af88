//! Built-in transforms between an encoded and a decoded representation.
use std::sync::Arc;

use serde_json::Value;

use crate::ast::{self, Annotations, Ast, Leaf};
use crate::filters;
use crate::parse_result::{ParseError, ParseResult};

/// Trims surrounding whitespace on decode; encoding passes through.
pub fn trim() -> Arc<Ast> {
    ast::transform(
        ast::string(),
        filters::trimmed(ast::string()),
        |v| match v {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        },
        |v| v,
    )
}

/// Lowercases on decode; encoding passes through.
pub fn lowercase() -> Arc<Ast> {
    ast::transform(
        ast::string(),
        filters::lowercased(ast::string()),
        |v| match v {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        },
        |v| v,
    )
}

/// `"1.5"` ⇄ `1.5`. Unparseable strings fail with a `Type` error.
pub fn number_from_string() -> Arc<Ast> {
    let decode = Leaf::new(|input, _options, owner| {
        let parsed = input.as_str().and_then(|s| s.trim().parse::<f64>().ok());
        match parsed.and_then(serde_json::Number::from_f64) {
            Some(n) => ParseResult::success(prefer_integer(n)),
            None => ParseResult::fail(ParseError::type_error_with_message(
                owner.clone(),
                input.clone(),
                format!("Expected a string containing a number, actual {input}"),
            )),
        }
    });
    let encode = Leaf::new(|input, _options, _owner| {
        let text = match &input {
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        ParseResult::success(Value::String(text))
    });
    ast::annotate(
        &ast::transform_result(ast::string(), ast::number(), decode, encode),
        Annotations::identifier("NumberFromString"),
    )
}

/// JSON text ⇄ the value it encodes.
pub fn parse_json(to: Arc<Ast>) -> Arc<Ast> {
    let decode = Leaf::new(|input, _options, owner| {
        let Some(text) = input.as_str() else {
            return ParseResult::fail(ParseError::type_error(owner.clone(), input));
        };
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ParseResult::success(value),
            Err(err) => ParseResult::fail(ParseError::type_error_with_message(
                owner.clone(),
                input.clone(),
                format!("Expected a JSON document, actual {input}: {err}"),
            )),
        }
    });
    let encode = Leaf::new(|input, _options, owner| match serde_json::to_string(&input) {
        Ok(text) => ParseResult::success(Value::String(text)),
        Err(err) => ParseResult::fail(ParseError::type_error_with_message(
            owner.clone(),
            input,
            err.to_string(),
        )),
    });
    ast::transform_result(ast::string(), to, decode, encode)
}

fn prefer_integer(n: serde_json::Number) -> Value {
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
        _ => Value::Number(n),
    }
}
