//! Refinement constructors for common checks.
//!
//! Each filter wraps `from` in a refinement whose description names the
//! check, so a failure reads e.g. `Expected a string starting with "a",
//! actual "b"`.
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::ast::{self, Annotations, Ast, Leaf};
use crate::parse_result::{ParseError, ParseResult};

/// Refines `from` with a synchronous predicate.
pub fn filter<P>(from: Arc<Ast>, predicate: P, annotations: Annotations) -> Arc<Ast>
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let check = Leaf::new(move |input, _options, owner| {
        if predicate(&input) {
            ParseResult::success(input)
        } else {
            ParseResult::fail(ParseError::type_error(owner.clone(), input))
        }
    });
    ast::refinement(from, check, annotations)
}

fn described<P>(from: Arc<Ast>, description: String, predicate: P) -> Arc<Ast>
where
    P: Fn(&Value) -> bool + Send + Sync + 'static,
{
    filter(from, predicate, Annotations::description(description))
}

fn str_check(value: &Value, f: impl Fn(&str) -> bool) -> bool {
    value.as_str().is_some_and(f)
}

fn num_check(value: &Value, f: impl Fn(f64) -> bool) -> bool {
    value.as_f64().is_some_and(f)
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

// ------------------------------- Strings ---------------------------------- //

pub fn min_length(from: Arc<Ast>, min: usize) -> Arc<Ast> {
    described(
        from,
        format!("a string at least {min} character{} long", plural(min)),
        move |v| str_check(v, |s| char_count(s) >= min),
    )
}

pub fn max_length(from: Arc<Ast>, max: usize) -> Arc<Ast> {
    described(
        from,
        format!("a string at most {max} character{} long", plural(max)),
        move |v| str_check(v, |s| char_count(s) <= max),
    )
}

pub fn length(from: Arc<Ast>, len: usize) -> Arc<Ast> {
    described(
        from,
        format!("a string {len} character{} long", plural(len)),
        move |v| str_check(v, |s| char_count(s) == len),
    )
}

pub fn non_empty(from: Arc<Ast>) -> Arc<Ast> {
    min_length(from, 1)
}

pub fn starts_with(from: Arc<Ast>, prefix: impl Into<String>) -> Arc<Ast> {
    let prefix = prefix.into();
    let description = format!("a string starting with {:?}", prefix);
    described(from, description, move |v| str_check(v, |s| s.starts_with(prefix.as_str())))
}

pub fn ends_with(from: Arc<Ast>, suffix: impl Into<String>) -> Arc<Ast> {
    let suffix = suffix.into();
    let description = format!("a string ending with {:?}", suffix);
    described(from, description, move |v| str_check(v, |s| s.ends_with(suffix.as_str())))
}

pub fn includes(from: Arc<Ast>, needle: impl Into<String>) -> Arc<Ast> {
    let needle = needle.into();
    let description = format!("a string including {:?}", needle);
    described(from, description, move |v| str_check(v, |s| s.contains(needle.as_str())))
}

pub fn pattern(from: Arc<Ast>, regex: Regex) -> Arc<Ast> {
    let description = format!("a string matching the pattern {}", regex.as_str());
    described(from, description, move |v| str_check(v, |s| regex.is_match(s)))
}

pub fn trimmed(from: Arc<Ast>) -> Arc<Ast> {
    described(from, "a string with no leading or trailing whitespace".to_string(), |v| {
        str_check(v, |s| s.trim() == s)
    })
}

pub fn lowercased(from: Arc<Ast>) -> Arc<Ast> {
    described(from, "a lowercase string".to_string(), |v| str_check(v, |s| s.to_lowercase() == s))
}

// ------------------------------- Numbers ---------------------------------- //

pub fn greater_than(from: Arc<Ast>, min: f64) -> Arc<Ast> {
    described(from, format!("a number greater than {min}"), move |v| num_check(v, |n| n > min))
}

pub fn greater_than_or_equal_to(from: Arc<Ast>, min: f64) -> Arc<Ast> {
    described(from, format!("a number greater than or equal to {min}"), move |v| {
        num_check(v, |n| n >= min)
    })
}

pub fn less_than(from: Arc<Ast>, max: f64) -> Arc<Ast> {
    described(from, format!("a number less than {max}"), move |v| num_check(v, |n| n < max))
}

pub fn less_than_or_equal_to(from: Arc<Ast>, max: f64) -> Arc<Ast> {
    described(from, format!("a number less than or equal to {max}"), move |v| {
        num_check(v, |n| n <= max)
    })
}

pub fn between(from: Arc<Ast>, min: f64, max: f64) -> Arc<Ast> {
    described(from, format!("a number between {min} and {max}"), move |v| {
        num_check(v, |n| n >= min && n <= max)
    })
}

pub fn int(from: Arc<Ast>) -> Arc<Ast> {
    described(from, "an integer".to_string(), |v| {
        v.is_i64() || v.is_u64() || num_check(v, |n| n.fract() == 0.0)
    })
}

pub fn positive(from: Arc<Ast>) -> Arc<Ast> {
    described(from, "a positive number".to_string(), |v| num_check(v, |n| n > 0.0))
}

pub fn non_negative(from: Arc<Ast>) -> Arc<Ast> {
    described(from, "a non-negative number".to_string(), |v| num_check(v, |n| n >= 0.0))
}

pub fn multiple_of(from: Arc<Ast>, divisor: f64) -> Arc<Ast> {
    described(from, format!("a number divisible by {divisor}"), move |v| {
        num_check(v, |n| divides(divisor, n))
    })
}

/// Compares in decimal: both operands are scaled by ten to the larger count
/// of fraction digits, so `0.3` is a multiple of `0.1`. Operands too large to
/// scale fall back to a relative tolerance on the quotient.
fn divides(divisor: f64, n: f64) -> bool {
    if divisor == 0.0 || !divisor.is_finite() || !n.is_finite() {
        return false;
    }
    let places = fraction_digits(n).max(fraction_digits(divisor));
    match (scaled(n, places), scaled(divisor, places)) {
        (Some(n), Some(d)) if d != 0 => n % d == 0,
        _ => {
            let q = n / divisor;
            q.round() != 0.0 && (q - q.round()).abs() <= 1e-9 * q.abs()
        }
    }
}

fn fraction_digits(x: f64) -> usize {
    x.to_string().split_once('.').map_or(0, |(_, frac)| frac.len())
}

fn scaled(x: f64, places: usize) -> Option<i128> {
    format!("{x:.places$}").replace('.', "").parse().ok()
}

// -------------------------------- Arrays ---------------------------------- //

pub fn min_items(from: Arc<Ast>, min: usize) -> Arc<Ast> {
    described(
        from,
        format!("an array of at least {min} item{}", plural(min)),
        move |v| v.as_array().is_some_and(|xs| xs.len() >= min),
    )
}

pub fn max_items(from: Arc<Ast>, max: usize) -> Arc<Ast> {
    described(
        from,
        format!("an array of at most {max} item{}", plural(max)),
        move |v| v.as_array().is_some_and(|xs| xs.len() <= max),
    )
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{array, number, string};
    use crate::parser::{decode_sync, is};
    use serde_json::json;

    #[test]
    fn min_length_message() {
        let ast = min_length(string(), 2);
        let err = decode_sync(&ast, json!("a")).unwrap_err();
        assert_eq!(err.to_string(), r#"Expected a string at least 2 characters long, actual "a""#);
        assert!(is(&ast, &json!("ab")));
    }

    #[test]
    fn base_failure_skips_the_check() {
        let ast = min_length(string(), 2);
        let err = decode_sync(&ast, json!(5)).unwrap_err();
        assert_eq!(err.to_string(), "Expected string, actual 5");
    }

    #[test]
    fn pattern_and_affixes() {
        let ast = pattern(string(), Regex::new(r"^\d{3}$").unwrap());
        assert!(is(&ast, &json!("123")));
        assert!(!is(&ast, &json!("12a")));
        assert!(is(&ends_with(string(), ".rs"), &json!("main.rs")));
        assert!(!is(&includes(string(), "--"), &json!("a-b")));
        assert!(!is(&trimmed(string()), &json!(" a")));
    }

    #[test]
    fn number_bounds() {
        let ast = between(int(number()), 1.0, 10.0);
        assert!(is(&ast, &json!(3)));
        assert!(!is(&ast, &json!(3.5)));
        assert!(!is(&ast, &json!(11)));
        assert!(is(&multiple_of(number(), 0.5), &json!(2.5)));
        assert!(is(&multiple_of(number(), 0.1), &json!(0.3)));
        assert!(is(&multiple_of(number(), 0.1), &json!(0.7)));
        assert!(is(&multiple_of(number(), 0.01), &json!(-1.23)));
        assert!(!is(&multiple_of(number(), 0.1), &json!(0.35)));
        assert!(!is(&multiple_of(number(), 3.0), &json!(1e-17)));
        assert!(is(&multiple_of(number(), 1e10), &json!(1e40)));
        assert!(!is(&multiple_of(number(), 3.0), &json!(1e-300)));
        assert!(is(&multiple_of(number(), 0.1), &json!(0)));
        assert!(!is(&positive(number()), &json!(0)));
        assert!(is(&non_negative(number()), &json!(0)));
        assert!(!is(&less_than(number(), 0.0), &json!(0)));
    }

    #[test]
    fn array_bounds() {
        let ast = max_items(min_items(array(number()), 1), 2);
        assert!(!is(&ast, &json!([])));
        assert!(is(&ast, &json!([1, 2])));
        assert!(!is(&ast, &json!([1, 2, 3])));
    }
}
