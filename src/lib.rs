//! Declarative schema interpreter for untyped JSON values.
//!
//! A schema is an immutable [`ast::Ast`] tree. The [`parser`] walks it
//! against a `serde_json::Value` in either direction (decode: external to
//! internal, encode: back again) and returns a [`ParseResult`]: a value, a
//! path-qualified error tree, or a pending computation when a leaf check is
//! asynchronous. Synchronous parses refuse asynchronous leaves with a
//! `Forbidden` error instead of running them.
//!
//! ```
//! use json_shape::ast::{self, Property};
//! use json_shape::{filters, parser};
//! use serde_json::json;
//!
//! let person = ast::struct_([
//!     ("name", Property::required(filters::non_empty(ast::string()))),
//!     ("age", Property::optional(ast::number())),
//! ]);
//! assert!(parser::decode_sync(&person, json!({"name": "Ada"})).is_ok());
//!
//! let err = parser::decode_sync(&person, json!({"age": "x"})).unwrap_err();
//! assert_eq!(err.to_string(), r#"/name is missing, /age Expected number, actual "x""#);
//! ```
pub mod ast;
pub mod declarations;
pub mod error;
pub mod filters;
pub mod format;
pub mod parse_result;
pub mod parser;
pub mod path_de;
pub mod transforms;

pub use ast::Ast;
pub use error::{Error, ParseFailure};
pub use format::format_errors;
pub use parse_result::{ParseError, ParseErrors, ParseResult};
pub use parser::{Direction, ErrorPolicy, ExcessPropertyPolicy, Execution, Interpreter, ParseOptions};
