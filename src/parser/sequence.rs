//! Ordered evaluation of sibling children.
//!
//! Children run one at a time in declaration order. The driver stays
//! synchronous until a child suspends; from then on the remaining children
//! run inside a single future. Children after a `Break` are never started,
//! so under the first-error policy no side effect of a later sibling occurs.
use std::ops::ControlFlow;

use serde_json::Value;

use crate::parse_result::{ParseError, ParseErrors, ParseResult};
use crate::parser::ErrorPolicy;

pub(crate) type Thunk<T> = Box<dyn FnOnce() -> ParseResult<T> + Send>;

pub(crate) struct Step<K, T> {
    key: K,
    run: Thunk<T>,
}

impl<K, T: Send + 'static> Step<K, T> {
    pub fn new<F>(key: K, run: F) -> Self
    where
        F: FnOnce() -> ParseResult<T> + Send + 'static,
    {
        Step { key, run: Box::new(run) }
    }

    /// A step whose outcome is already a failure.
    pub fn failed(key: K, error: ParseError) -> Self {
        Step { key, run: Box::new(move || ParseResult::fail(error)) }
    }
}

/// Accumulates child outcomes for one composite node.
pub(crate) trait Fold: Send + 'static {
    type Key: Send + 'static;
    type Item: Send + 'static;
    type Output: Send + 'static;

    fn accept(&mut self, key: Self::Key, outcome: Result<Self::Item, ParseErrors>) -> ControlFlow<()>;
    fn finish(self) -> Result<Self::Output, ParseErrors>;
}

pub(crate) fn drive<F: Fold>(mut fold: F, steps: Vec<Step<F::Key, F::Item>>) -> ParseResult<F::Output> {
    let mut steps = steps.into_iter();
    while let Some(Step { key, run }) = steps.next() {
        let outcome = match run() {
            ParseResult::Success(value) => Ok(value),
            ParseResult::Failure(errors) => Err(errors),
            ParseResult::Pending(future) => {
                return ParseResult::pending(async move {
                    let mut key = key;
                    let mut outcome = future.await;
                    loop {
                        if fold.accept(key, outcome).is_break() {
                            break;
                        }
                        match steps.next() {
                            Some(step) => {
                                key = step.key;
                                outcome = (step.run)().resolve().await;
                            }
                            None => break,
                        }
                    }
                    fold.finish()
                });
            }
        };
        if fold.accept(key, outcome).is_break() {
            break;
        }
    }
    fold.finish().into()
}

// ---------------------------- Collect-all fold ---------------------------- //

/// Keeps every success in order and wraps each failure with its path segment.
pub(crate) struct Collect<K, T> {
    policy: ErrorPolicy,
    wrap: fn(K, ParseErrors) -> ParseError,
    values: Vec<T>,
    errors: Vec<ParseError>,
}

impl<K, T> Collect<K, T> {
    pub fn new(policy: ErrorPolicy, wrap: fn(K, ParseErrors) -> ParseError) -> Self {
        Collect { policy, wrap, values: Vec::new(), errors: Vec::new() }
    }
}

impl<K, T> Fold for Collect<K, T>
where
    K: Send + 'static,
    T: Send + 'static,
{
    type Key = K;
    type Item = T;
    type Output = Vec<T>;

    fn accept(&mut self, key: K, outcome: Result<T, ParseErrors>) -> ControlFlow<()> {
        match outcome {
            Ok(value) => {
                self.values.push(value);
                ControlFlow::Continue(())
            }
            Err(errors) => {
                self.errors.push((self.wrap)(key, errors));
                match self.policy {
                    ErrorPolicy::All => ControlFlow::Continue(()),
                    ErrorPolicy::First => ControlFlow::Break(()),
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<T>, ParseErrors> {
        match ParseErrors::from_vec(self.errors) {
            None => Ok(self.values),
            Some(errors) => Err(errors),
        }
    }
}

// --------------------------- First-success fold --------------------------- //

/// Stops at the first success; otherwise reports every member's failure.
#[derive(Default)]
pub(crate) struct FirstSuccess {
    winner: Option<Value>,
    errors: Vec<ParseError>,
}

impl Fold for FirstSuccess {
    type Key = usize;
    type Item = Value;
    type Output = Value;

    fn accept(&mut self, _member: usize, outcome: Result<Value, ParseErrors>) -> ControlFlow<()> {
        match outcome {
            Ok(value) => {
                self.winner = Some(value);
                ControlFlow::Break(())
            }
            Err(errors) => {
                self.errors.push(ParseError::union_member(errors));
                ControlFlow::Continue(())
            }
        }
    }

    fn finish(self) -> Result<Value, ParseErrors> {
        if let Some(value) = self.winner {
            return Ok(value);
        }
        let errors = ParseErrors::from_vec(self.errors);
        Err(errors.unwrap_or_else(|| unreachable!("unions have at least one member")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(
        counter: &Arc<AtomicUsize>,
        result: Result<Value, ParseError>,
    ) -> impl FnOnce() -> ParseResult + Send + use<> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            match result {
                Ok(v) => ParseResult::success(v),
                Err(e) => ParseResult::fail(e),
            }
        }
    }

    #[test]
    fn collect_all_keeps_order_and_every_error() {
        let ran = Arc::new(AtomicUsize::new(0));
        let steps = vec![
            Step::new(0usize, counting(&ran, Err(ParseError::Missing))),
            Step::new(1, counting(&ran, Ok(json!(1)))),
            Step::new(2, counting(&ran, Err(ParseError::Missing))),
        ];
        let result = drive(Collect::new(ErrorPolicy::All, ParseError::index), steps);
        let ParseResult::Failure(errors) = result else { panic!("expected failure") };
        let indices: Vec<usize> = errors
            .iter()
            .map(|e| match e {
                ParseError::Index { index, .. } => *index,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(indices, [0, 2]);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn first_error_stops_before_later_siblings() {
        let ran = Arc::new(AtomicUsize::new(0));
        let steps = vec![
            Step::new(0usize, counting(&ran, Err(ParseError::Missing))),
            Step::new(1, counting(&ran, Err(ParseError::Missing))),
        ];
        let result = drive(Collect::new(ErrorPolicy::First, ParseError::index), steps);
        assert!(result.is_failure());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_success_skips_remaining_members() {
        let ran = Arc::new(AtomicUsize::new(0));
        let steps = vec![
            Step::new(0usize, counting(&ran, Err(ParseError::Missing))),
            Step::new(1, counting(&ran, Ok(json!("b")))),
            Step::new(2, counting(&ran, Ok(json!("c")))),
        ];
        let result = drive(FirstSuccess::default(), steps);
        assert_eq!(result.into_immediate().unwrap().unwrap(), json!("b"));
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn suspended_child_keeps_declaration_order() {
        let steps: Vec<Step<usize, Value>> = vec![
            Step::new(0, || {
                ParseResult::pending(async {
                    tokio::task::yield_now().await;
                    Err(ParseErrors::one(ParseError::Missing))
                })
            }),
            Step::new(1, || ParseResult::fail(ParseError::unexpected(json!(9)))),
        ];
        let result = drive(Collect::new(ErrorPolicy::All, ParseError::index), steps);
        assert!(result.is_pending());
        let errors = result.resolve().await.unwrap_err();
        assert!(matches!(errors.first(), ParseError::Index { index: 0, .. }));
        assert!(matches!(errors.as_slice()[1], ParseError::Index { index: 1, .. }));
    }
}
