//! Result algebra for the interpreter.
//!
//! A parse either succeeds with a value, fails with a non-empty tree of
//! errors, or is *pending*: a suspended computation that resolves to one of
//! the other two. Pending futures are lazy, so a pending result that is
//! dropped before being polled never runs its body.
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::ast::Ast;

// ————————————————————————————————————————————————————————————————————————————
// ERRORS
// ————————————————————————————————————————————————————————————————————————————

/// One node of an error tree.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// The value's runtime kind or content does not match `expected`.
    Type {
        expected: Arc<Ast>,
        actual: Value,
        /// Overrides the default `Expected …, actual …` text.
        message: Option<String>,
    },
    /// A leaf tried to suspend in a parse that only allows synchronous work.
    Forbidden { reason: String },
    Index { index: usize, errors: ParseErrors },
    Key { key: String, errors: ParseErrors },
    UnionMember { errors: ParseErrors },
    Missing,
    Unexpected { actual: Value },
}

impl ParseError {
    pub fn type_error(expected: Arc<Ast>, actual: Value) -> Self {
        ParseError::Type { expected, actual, message: None }
    }

    pub fn type_error_with_message(
        expected: Arc<Ast>,
        actual: Value,
        message: impl Into<String>,
    ) -> Self {
        ParseError::Type { expected, actual, message: Some(message.into()) }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        ParseError::Forbidden { reason: reason.into() }
    }

    pub fn index(index: usize, errors: ParseErrors) -> Self {
        ParseError::Index { index, errors }
    }

    pub fn key(key: impl Into<String>, errors: ParseErrors) -> Self {
        ParseError::Key { key: key.into(), errors }
    }

    pub fn union_member(errors: ParseErrors) -> Self {
        ParseError::UnionMember { errors }
    }

    pub fn unexpected(actual: Value) -> Self {
        ParseError::Unexpected { actual }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format_error(self))
    }
}

/// Non-empty, ordered sequence of sibling errors.
#[derive(Debug, Clone)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn one(error: ParseError) -> Self {
        Self { errors: vec![error] }
    }

    /// `None` when `errors` is empty.
    pub fn from_vec(errors: Vec<ParseError>) -> Option<Self> {
        if errors.is_empty() { None } else { Some(Self { errors }) }
    }

    pub fn first(&self) -> &ParseError {
        &self.errors[0]
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }

    pub fn as_slice(&self) -> &[ParseError] {
        &self.errors
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        ParseErrors::one(error)
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;
    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;
    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format_errors(self))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESULT
// ————————————————————————————————————————————————————————————————————————————

pub enum ParseResult<T = Value> {
    Success(T),
    Failure(ParseErrors),
    Pending(BoxFuture<'static, Result<T, ParseErrors>>),
}

impl<T: Send + 'static> ParseResult<T> {
    pub fn success(value: T) -> Self {
        ParseResult::Success(value)
    }

    pub fn fail(error: ParseError) -> Self {
        ParseResult::Failure(ParseErrors::one(error))
    }

    pub fn failures(errors: ParseErrors) -> Self {
        ParseResult::Failure(errors)
    }

    /// Wraps a suspended computation. The future is not polled here.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, ParseErrors>> + Send + 'static,
    {
        ParseResult::Pending(Box::pin(future))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ParseResult::Failure(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ParseResult::Pending(_))
    }

    pub fn map<U, F>(self, f: F) -> ParseResult<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        match self {
            ParseResult::Success(value) => ParseResult::Success(f(value)),
            ParseResult::Failure(errors) => ParseResult::Failure(errors),
            ParseResult::Pending(future) => {
                ParseResult::pending(async move { future.await.map(f) })
            }
        }
    }

    pub fn map_errors<F>(self, f: F) -> ParseResult<T>
    where
        F: FnOnce(ParseErrors) -> ParseErrors + Send + 'static,
    {
        match self {
            ParseResult::Success(value) => ParseResult::Success(value),
            ParseResult::Failure(errors) => ParseResult::Failure(f(errors)),
            ParseResult::Pending(future) => {
                ParseResult::pending(async move { future.await.map_err(f) })
            }
        }
    }

    /// Sequences a second step after a success. The continuation only runs
    /// once this result has resolved successfully.
    pub fn flat_map<U, F>(self, f: F) -> ParseResult<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> ParseResult<U> + Send + 'static,
    {
        match self {
            ParseResult::Success(value) => f(value),
            ParseResult::Failure(errors) => ParseResult::Failure(errors),
            ParseResult::Pending(future) => ParseResult::pending(async move {
                let value = future.await?;
                f(value).resolve().await
            }),
        }
    }

    /// Awaits the outcome. Immediate results resolve without yielding.
    pub async fn resolve(self) -> Result<T, ParseErrors> {
        match self {
            ParseResult::Success(value) => Ok(value),
            ParseResult::Failure(errors) => Err(errors),
            ParseResult::Pending(future) => future.await,
        }
    }

    /// The outcome if it is already known, otherwise the result itself.
    pub fn into_immediate(self) -> Result<Result<T, ParseErrors>, Self> {
        match self {
            ParseResult::Success(value) => Ok(Ok(value)),
            ParseResult::Failure(errors) => Ok(Err(errors)),
            pending @ ParseResult::Pending(_) => Err(pending),
        }
    }
}

impl<T> From<Result<T, ParseErrors>> for ParseResult<T> {
    fn from(result: Result<T, ParseErrors>) -> Self {
        match result {
            Ok(value) => ParseResult::Success(value),
            Err(errors) => ParseResult::Failure(errors),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ParseResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseResult::Success(value) => f.debug_tuple("Success").field(value).finish(),
            ParseResult::Failure(errors) => f.debug_tuple("Failure").field(errors).finish(),
            ParseResult::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn errors_from_empty_vec_is_none() {
        assert!(ParseErrors::from_vec(Vec::new()).is_none());
        let errors = ParseErrors::from_vec(vec![ParseError::Missing]).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors.first(), ParseError::Missing));
    }

    #[test]
    fn flat_map_short_circuits_on_failure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let result: ParseResult = ParseResult::fail(ParseError::Missing).flat_map(move |v| {
            flag.store(true, Ordering::SeqCst);
            ParseResult::success(v)
        });
        assert!(result.is_failure());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn dropping_pending_never_runs_body() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let result: ParseResult = ParseResult::pending(async move {
            flag.store(true, Ordering::SeqCst);
            Ok(json!(1))
        });
        assert!(result.is_pending());
        drop(result);
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn pending_map_resolves_after_await() {
        let result: ParseResult = ParseResult::pending(async {
            tokio::task::yield_now().await;
            Ok(json!(2))
        });
        let mapped = result.map(|v| json!(v.as_i64().unwrap() * 10));
        assert_eq!(mapped.resolve().await.unwrap(), json!(20));
    }

    #[test]
    fn into_immediate_keeps_pending() {
        let ready: ParseResult = ParseResult::success(json!("a"));
        assert_eq!(ready.into_immediate().unwrap().unwrap(), json!("a"));
        let pending: ParseResult = ParseResult::pending(async { Ok(json!(null)) });
        assert!(pending.into_immediate().is_err());
    }
}
