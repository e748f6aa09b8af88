//! Deterministic rendering of error trees.
//!
//! Each leaf is printed with the path accumulated from the `Index`/`Key`
//! wrappers above it (`/a/0 is forbidden`). Siblings are joined with `, `
//! in the order they were reported. A `UnionMember` starts a fresh path:
//! its members render as `union member: <inner>`.
use crate::parse_result::{ParseError, ParseErrors};

pub fn format_errors(errors: &ParseErrors) -> String {
    join(errors, "")
}

pub fn format_error(error: &ParseError) -> String {
    render(error, "")
}

fn join(errors: &ParseErrors, path: &str) -> String {
    errors
        .iter()
        .map(|e| render(e, path))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render(error: &ParseError, path: &str) -> String {
    match error {
        ParseError::Index { index, errors } => join(errors, &format!("{path}/{index}")),
        ParseError::Key { key, errors } => join(errors, &format!("{path}/{key}")),
        ParseError::UnionMember { errors } => {
            with_path(path, format!("union member: {}", join(errors, "")))
        }
        ParseError::Type { expected, actual, message } => {
            let text = match (message, &expected.annotations.message) {
                (Some(m), _) => m.clone(),
                (None, Some(f)) => f(actual),
                (None, None) => format!("Expected {expected}, actual {actual}"),
            };
            with_path(path, text)
        }
        ParseError::Forbidden { .. } => with_path(path, "is forbidden".to_string()),
        ParseError::Missing => with_path(path, "is missing".to_string()),
        ParseError::Unexpected { .. } => with_path(path, "is unexpected".to_string()),
    }
}

fn with_path(path: &str, text: String) -> String {
    if path.is_empty() { text } else { format!("{path} {text}") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Annotations, annotate, string};
    use serde_json::json;

    fn forbidden() -> ParseErrors {
        ParseErrors::one(ParseError::forbidden("test"))
    }

    #[test]
    fn leaf_without_path() {
        assert_eq!(format_errors(&forbidden()), "is forbidden");
    }

    #[test]
    fn paths_accumulate_without_spaces() {
        let inner = ParseErrors::one(ParseError::index(0, forbidden()));
        let outer = ParseErrors::one(ParseError::key("a", inner));
        assert_eq!(format_errors(&outer), "/a/0 is forbidden");
    }

    #[test]
    fn union_members_join_in_order() {
        let errors = ParseErrors::from_vec(vec![
            ParseError::union_member(forbidden()),
            ParseError::union_member(forbidden()),
        ])
        .unwrap();
        assert_eq!(
            format_errors(&errors),
            "union member: is forbidden, union member: is forbidden"
        );
    }

    #[test]
    fn custom_messages() {
        let named = annotate(
            &string(),
            Annotations::default().with_message(|v| format!("{v} is not a name")),
        );
        let e = ParseErrors::one(ParseError::type_error(named.clone(), json!(1)));
        assert_eq!(format_errors(&e), "1 is not a name");
        let e = ParseErrors::one(ParseError::type_error_with_message(named, json!(1), "nope"));
        assert_eq!(format_errors(&e), "nope");
    }

    #[test]
    fn formatting_is_idempotent() {
        let errors = ParseErrors::from_vec(vec![
            ParseError::key("a", ParseErrors::one(ParseError::Missing)),
            ParseError::index(3, ParseErrors::one(ParseError::unexpected(json!(true)))),
        ])
        .unwrap();
        let once = format_errors(&errors);
        assert_eq!(once, format_errors(&errors));
        assert_eq!(once, "/a is missing, /3 is unexpected");
    }
}
