//! Built-in declarations: kinds the structural nodes cannot express.
use std::sync::Arc;

use chrono::DateTime;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::ast::{self, Annotations, Ast, DeclarationId, DeclareFn, Leaf};
use crate::parse_result::{ParseError, ParseResult};
use crate::parser::Interpreter;

static DATE_ID: Lazy<DeclarationId> = Lazy::new(DeclarationId::new);
static UNIQUE_ARRAY_ID: Lazy<DeclarationId> = Lazy::new(DeclarationId::new);

pub fn date_id() -> DeclarationId {
    *DATE_ID
}

pub fn unique_array_id() -> DeclarationId {
    *UNIQUE_ARRAY_ID
}

/// An RFC 3339 date-time string. Both directions only validate.
pub fn date() -> Arc<Ast> {
    let check = DeclareFn::new(|_params| {
        Leaf::new(|input, _options, owner| {
            let valid = input.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
            if valid {
                ParseResult::success(input)
            } else {
                ParseResult::fail(ParseError::type_error(owner.clone(), input))
            }
        })
    });
    ast::declare_with_id(date_id(), Vec::new(), check.clone(), check, Annotations::identifier("Date"))
}

/// An array of `item` whose elements are pairwise distinct after parsing.
pub fn unique_array(item: Arc<Ast>) -> Arc<Ast> {
    let build = DeclareFn::new(|params: &[Interpreter]| {
        let item = &params[0];
        let items = Interpreter::new(ast::array(item.ast().clone()), item.direction());
        Leaf::new(move |input, options, owner| {
            let owner = owner.clone();
            items.run(input, options).flat_map(move |value| {
                if has_duplicates(&value) {
                    let message = format!("Expected an array of unique items, actual {value}");
                    ParseResult::fail(ParseError::type_error_with_message(owner, value, message))
                } else {
                    ParseResult::success(value)
                }
            })
        })
    });
    ast::declare_with_id(
        unique_array_id(),
        vec![item],
        build.clone(),
        build,
        Annotations::identifier("UniqueArray"),
    )
}

fn has_duplicates(value: &Value) -> bool {
    let Some(xs) = value.as_array() else { return false };
    xs.iter().enumerate().any(|(i, x)| xs[..i].contains(x))
}
