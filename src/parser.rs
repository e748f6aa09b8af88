//! AST interpreter.
//!
//! `interpret` walks one node against an owned input and returns a single
//! [`ParseResult`] for the whole subtree. The same walk serves both
//! directions; only transforms, refinements and declarations look at the
//! direction. Every leaf call goes through [`guard`], which enforces the
//! execution mode: in a synchronous parse a suspending leaf is refused
//! before its effect is polled.
//!
//! The public entry points at the bottom (`decode_sync`, `decode_async`, …)
//! wrap `interpret` for callers that want a plain `Result`.
pub mod options;
pub(crate) mod sequence;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::ast::{self, Ast, AstKind, Keyword, Record, Refinement, Struct, Transform, Tuple, Union};
use crate::error::{Error, ParseFailure};
use crate::parse_result::{ParseError, ParseErrors, ParseResult};
use sequence::{Collect, FirstSuccess, Step};

pub use options::{Direction, ErrorPolicy, ExcessPropertyPolicy, Execution, ParseOptions};

// ————————————————————————————————————————————————————————————————————————————
// INTERPRETER HANDLE
// ————————————————————————————————————————————————————————————————————————————

/// A node bound to a direction. Declarations receive one per type parameter.
#[derive(Debug, Clone)]
pub struct Interpreter {
    ast: Arc<Ast>,
    direction: Direction,
}

impl Interpreter {
    pub fn new(ast: Arc<Ast>, direction: Direction) -> Self {
        Interpreter { ast, direction }
    }

    pub fn decoder(ast: Arc<Ast>) -> Self {
        Self::new(ast, Direction::Decode)
    }

    pub fn encoder(ast: Arc<Ast>) -> Self {
        Self::new(ast, Direction::Encode)
    }

    pub fn ast(&self) -> &Arc<Ast> {
        &self.ast
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn run(&self, input: Value, options: &ParseOptions) -> ParseResult {
        interpret(&self.ast, input, self.direction, options)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPATCH
// ————————————————————————————————————————————————————————————————————————————

pub fn interpret(
    ast: &Arc<Ast>,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    match &ast.kind {
        AstKind::Declaration(decl) => {
            let type_parameters: Vec<Interpreter> = decl
                .type_parameters
                .iter()
                .map(|p| Interpreter::new(p.clone(), direction))
                .collect();
            let leaf = match direction {
                Direction::Decode => decl.decode.call(&type_parameters),
                Direction::Encode => decl.encode.call(&type_parameters),
            };
            guard(leaf.call(input, options, ast), options)
        }
        AstKind::Literal(lit) => {
            if lit.matches(&input) {
                ParseResult::success(input)
            } else {
                ParseResult::fail(ParseError::type_error(ast.clone(), input))
            }
        }
        AstKind::Keyword(kw) => {
            if kw.accepts(&input) {
                ParseResult::success(input)
            } else {
                ParseResult::fail(ParseError::type_error(ast.clone(), input))
            }
        }
        AstKind::Tuple(tuple) => parse_tuple(ast, tuple, input, direction, options),
        AstKind::Struct(s) => parse_struct(ast, s, input, direction, options),
        AstKind::Record(record) => parse_record(ast, record, input, direction, options),
        AstKind::Union(union) => parse_union(union, input, direction, options),
        AstKind::Lazy(suspended) => interpret(suspended.force(), input, direction, options),
        AstKind::Refinement(refinement) => {
            parse_refinement(ast, refinement, input, direction, options)
        }
        AstKind::Transform(transform) => {
            parse_transform(ast, transform, input, direction, options)
        }
    }
}

/// Enforces the execution mode on a leaf's result. A pending result in a
/// synchronous parse is dropped unpolled, so its effect never starts.
fn guard(result: ParseResult, options: &ParseOptions) -> ParseResult {
    match result {
        ParseResult::Pending(_) if !options.allows_suspension() => {
            tracing::debug!("refusing asynchronous effect in a synchronous parse");
            ParseResult::fail(ParseError::forbidden(
                "cannot run an asynchronous effect in a synchronous parse",
            ))
        }
        other => other,
    }
}

fn child(
    ast: &Arc<Ast>,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> impl FnOnce() -> ParseResult + Send + use<> {
    let ast = ast.clone();
    let options = *options;
    move || interpret(&ast, input, direction, &options)
}

// ---------------------------------- Tuple --------------------------------- //

fn parse_tuple(
    ast: &Arc<Ast>,
    tuple: &Tuple,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let Value::Array(items) = input else {
        return ParseResult::fail(ParseError::type_error(ast.clone(), input));
    };

    let mut steps: Vec<Step<usize, Value>> = Vec::with_capacity(items.len().max(tuple.elements.len()));
    let mut items = items.into_iter();

    for (i, element) in tuple.elements.iter().enumerate() {
        match items.next() {
            Some(value) => steps.push(Step::new(i, child(&element.ast, value, direction, options))),
            None if element.optional => {}
            None => steps.push(Step::failed(i, ParseError::Missing)),
        }
    }

    let offset = tuple.elements.len();
    for (j, value) in items.enumerate() {
        let i = offset + j;
        match &tuple.rest {
            Some(rest) => steps.push(Step::new(i, child(rest, value, direction, options))),
            None => steps.push(Step::failed(i, ParseError::unexpected(value))),
        }
    }

    sequence::drive(Collect::new(options.errors, ParseError::index), steps).map(Value::Array)
}

// --------------------------------- Struct --------------------------------- //

fn parse_struct(
    ast: &Arc<Ast>,
    s: &Struct,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let Value::Object(map) = input else {
        return ParseResult::fail(ParseError::type_error(ast.clone(), input));
    };
    let mut entries: IndexMap<String, Value> = map.into_iter().collect();

    let mut steps: Vec<Step<String, (String, Value)>> = Vec::with_capacity(s.properties.len());
    for (key, property) in &s.properties {
        match entries.shift_remove(key) {
            Some(value) => {
                let run = child(&property.ast, value, direction, options);
                let out_key = key.clone();
                steps.push(Step::new(key.clone(), move || run().map(move |v| (out_key, v))));
            }
            None if property.optional => {}
            None => steps.push(Step::failed(key.clone(), ParseError::Missing)),
        }
    }

    if !entries.is_empty() {
        match options.on_excess_property {
            ExcessPropertyPolicy::Strip => {
                tracing::debug!(count = entries.len(), "stripping undeclared keys");
            }
            ExcessPropertyPolicy::Fail => {
                for (key, value) in entries {
                    steps.push(Step::failed(key, ParseError::unexpected(value)));
                }
            }
        }
    }

    sequence::drive(Collect::new(options.errors, |k: String, e| ParseError::key(k, e)), steps)
        .map(|pairs| Value::Object(pairs.into_iter().collect::<Map<String, Value>>()))
}

// --------------------------------- Record --------------------------------- //

fn parse_record(
    ast: &Arc<Ast>,
    record: &Record,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let Value::Object(map) = input else {
        return ParseResult::fail(ParseError::type_error(ast.clone(), input));
    };
    let plain_keys = matches!(record.key.kind, AstKind::Keyword(Keyword::String))
        && record.key.annotations.is_empty();
    let key_shape = (!plain_keys).then(|| key_input_shape(&record.key, direction));

    let mut steps: Vec<Step<String, (String, Value)>> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let value_ast = record.value.clone();
        let opts = *options;
        match &key_shape {
            None => {
                let out_key = key.clone();
                steps.push(Step::new(key, move || {
                    interpret(&value_ast, value, direction, &opts).map(move |v| (out_key, v))
                }));
            }
            Some(shape) => {
                let key_ast = record.key.clone();
                let shape = shape.clone();
                let raw_key = key.clone();
                steps.push(Step::new(key, move || {
                    let key_input = record_key_input(&shape, raw_key);
                    interpret(&key_ast, key_input, direction, &opts).flat_map(move |decoded_key| {
                        let out_key = key_to_string(decoded_key);
                        interpret(&value_ast, value, direction, &opts).map(move |v| (out_key, v))
                    })
                }));
            }
        }
    }

    sequence::drive(Collect::new(options.errors, |k: String, e| ParseError::key(k, e)), steps)
        .map(|pairs| Value::Object(pairs.into_iter().collect::<Map<String, Value>>()))
}

/// The key node's input side in `direction`, without refinements or transform
/// functions.
fn key_input_shape(key: &Arc<Ast>, direction: Direction) -> Arc<Ast> {
    match direction {
        Direction::Decode => ast::from_side(key),
        Direction::Encode => ast::from_side(&ast::reverse(key)),
    }
}

/// Object keys are always text. When the key's input side takes a number,
/// boolean or null but not the text itself, the text is read as JSON, so a
/// key stringified by decoding parses back when encoding.
fn record_key_input(shape: &Arc<Ast>, raw: String) -> Value {
    let accepts = |v: &Value| {
        interpret(shape, v.clone(), Direction::Decode, &ParseOptions::default()).is_success()
    };
    let text = Value::String(raw);
    if accepts(&text) {
        return text;
    }
    match text.as_str().map(|s| serde_json::from_str::<Value>(s)) {
        Some(Ok(parsed @ (Value::Number(_) | Value::Bool(_) | Value::Null))) if accepts(&parsed) => {
            parsed
        }
        _ => text,
    }
}

fn key_to_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ---------------------------------- Union --------------------------------- //

fn parse_union(
    union: &Union,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let input = Arc::new(input);
    let steps: Vec<Step<usize, Value>> = union
        .members()
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let member = member.clone();
            let input = input.clone();
            let opts = *options;
            Step::new(i, move || {
                let value = Arc::try_unwrap(input).unwrap_or_else(|shared| (*shared).clone());
                interpret(&member, value, direction, &opts)
            })
        })
        .collect();
    drop(input);
    sequence::drive(FirstSuccess::default(), steps)
}

// ------------------------------- Refinement ------------------------------- //

fn parse_refinement(
    ast: &Arc<Ast>,
    refinement: &Refinement,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let forward = (direction == Direction::Decode) != refinement.reversed;
    let check = refinement.check.clone();
    let owner = ast.clone();
    let opts = *options;
    if forward {
        interpret(&refinement.from, input, direction, options)
            .flat_map(move |value| guard(check.call(value, &opts, &owner), &opts))
    } else {
        let from = refinement.from.clone();
        guard(check.call(input, options, ast), options)
            .flat_map(move |value| interpret(&from, value, direction, &opts))
    }
}

// -------------------------------- Transform ------------------------------- //

fn parse_transform(
    ast: &Arc<Ast>,
    transform: &Transform,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> ParseResult {
    let (first, mapping, last) = match direction {
        Direction::Decode => (&transform.from, transform.decode.clone(), transform.to.clone()),
        Direction::Encode => (&transform.to, transform.encode.clone(), transform.from.clone()),
    };
    let owner = ast.clone();
    let opts = *options;
    interpret(first, input, direction, options)
        .flat_map(move |value| guard(mapping.call(value, &opts, &owner), &opts))
        .flat_map(move |value| interpret(&last, value, direction, &opts))
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Decodes `input`, honoring `options` as given.
pub fn decode(ast: &Arc<Ast>, input: Value, options: &ParseOptions) -> ParseResult {
    tracing::trace!(schema = %ast, "decode");
    interpret(ast, input, Direction::Decode, options)
}

/// Encodes `value`, honoring `options` as given.
pub fn encode(ast: &Arc<Ast>, value: Value, options: &ParseOptions) -> ParseResult {
    tracing::trace!(schema = %ast, "encode");
    interpret(ast, value, Direction::Encode, options)
}

pub fn decode_sync(ast: &Arc<Ast>, input: Value) -> Result<Value, ParseFailure> {
    decode_sync_with(ast, input, &ParseOptions::default())
}

/// Synchronous decode; any suspending leaf fails with `Forbidden`.
pub fn decode_sync_with(
    ast: &Arc<Ast>,
    input: Value,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    run_sync(ast, input, Direction::Decode, options)
}

pub fn encode_sync(ast: &Arc<Ast>, value: Value) -> Result<Value, ParseFailure> {
    encode_sync_with(ast, value, &ParseOptions::default())
}

pub fn encode_sync_with(
    ast: &Arc<Ast>,
    value: Value,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    run_sync(ast, value, Direction::Encode, options)
}

/// Decode allowing asynchronous leaves; awaits every suspended check.
pub async fn decode_async(
    ast: &Arc<Ast>,
    input: Value,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    run_async(ast, input, Direction::Decode, options).await
}

pub async fn encode_async(
    ast: &Arc<Ast>,
    value: Value,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    run_async(ast, value, Direction::Encode, options).await
}

/// Checks `value` against the decoded side of the schema.
pub fn validate_sync(ast: &Arc<Ast>, value: Value) -> Result<Value, ParseFailure> {
    decode_sync(&ast::to_side(ast), value)
}

/// Type guard: does `value` already have the decoded shape?
pub fn is(ast: &Arc<Ast>, value: &Value) -> bool {
    validate_sync(ast, value.clone()).is_ok()
}

/// Decodes synchronously, then deserializes the result into `T`.
pub fn decode_into<T: DeserializeOwned>(ast: &Arc<Ast>, input: Value) -> Result<T, Error> {
    let value = decode_sync(ast, input)?;
    crate::path_de::from_value_with_path(value)
}

fn run_sync(
    ast: &Arc<Ast>,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    let options = options.with_execution(Execution::Sync);
    match interpret(ast, input, direction, &options).into_immediate() {
        Ok(outcome) => outcome.map_err(failure),
        // every leaf is guarded, so a synchronous walk never suspends
        Err(_) => unreachable!("synchronous parse produced a pending result"),
    }
}

async fn run_async(
    ast: &Arc<Ast>,
    input: Value,
    direction: Direction,
    options: &ParseOptions,
) -> Result<Value, ParseFailure> {
    let options = options.with_execution(Execution::All);
    interpret(ast, input, direction, &options).resolve().await.map_err(failure)
}

fn failure(errors: ParseErrors) -> ParseFailure {
    tracing::trace!(count = errors.len(), "parse failed");
    ParseFailure { errors }
}

// ------------------------------- Tests ------------------------------------ //
