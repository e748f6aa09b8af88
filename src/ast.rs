//! Schema AST.
//!
//! Pure data: a closed set of node kinds plus the leaf functions supplied by
//! schema authors. Nothing here validates anything; the interpreter in
//! [`crate::parser`] walks these nodes. Nodes are immutable once built and are
//! shared as `Arc<Ast>`.
pub mod annotations;
pub mod display;
pub mod sides;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::{Lazy as LazyStatic, OnceCell};
use ordered_float::OrderedFloat;
use serde_json::Value;
use uuid::Uuid;

use crate::parse_result::ParseResult;
use crate::parser::{Interpreter, ParseOptions};

pub use annotations::{Annotations, MessageFn};
pub use sides::{from_side, reverse, to_side};

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct Ast {
    pub kind: AstKind,
    pub annotations: Annotations,
}

#[derive(Debug, Clone)]
pub enum AstKind {
    Declaration(Declaration),
    Literal(Literal),
    Keyword(Keyword),
    Tuple(Tuple),
    Struct(Struct),
    Record(Record),
    Union(Union),
    Lazy(Suspended),
    Refinement(Refinement),
    Transform(Transform),
}

impl Ast {
    pub fn new(kind: AstKind) -> Arc<Ast> {
        Arc::new(Ast { kind, annotations: Annotations::default() })
    }

    pub fn with_annotations(kind: AstKind, annotations: Annotations) -> Arc<Ast> {
        Arc::new(Ast { kind, annotations })
    }
}

/// Opaque identity of a declaration kind. Two declarations with the same
/// shape but different ids are different kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationId(Uuid);

impl DeclarationId {
    pub fn new() -> Self {
        DeclarationId(Uuid::new_v4())
    }
}

impl Default for DeclarationId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclarationId,
    pub type_parameters: Vec<Arc<Ast>>,
    pub decode: DeclareFn,
    pub encode: DeclareFn,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl Literal {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Null, Value::Null) => true,
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => b.as_f64() == Some(a.0),
            (Literal::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => json_num_pref_i64(n.0),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(OrderedFloat(n))
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(OrderedFloat(n as f64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Unknown,
    Any,
    Never,
    Null,
    String,
    Number,
    Boolean,
    Object,
}

impl Keyword {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Keyword::Unknown | Keyword::Any => true,
            Keyword::Never => false,
            Keyword::Null => value.is_null(),
            Keyword::String => value.is_string(),
            Keyword::Number => value.is_number(),
            Keyword::Boolean => value.is_boolean(),
            Keyword::Object => value.is_object(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::Unknown => "unknown",
            Keyword::Any => "any",
            Keyword::Never => "never",
            Keyword::Null => "null",
            Keyword::String => "string",
            Keyword::Number => "number",
            Keyword::Boolean => "boolean",
            Keyword::Object => "object",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub ast: Arc<Ast>,
    pub optional: bool,
}

impl Element {
    pub fn required(ast: Arc<Ast>) -> Self {
        Element { ast, optional: false }
    }
    pub fn optional(ast: Arc<Ast>) -> Self {
        Element { ast, optional: true }
    }
}

#[derive(Debug, Clone)]
pub struct Tuple {
    pub elements: Vec<Element>,
    pub rest: Option<Arc<Ast>>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub ast: Arc<Ast>,
    pub optional: bool,
}

impl Property {
    pub fn required(ast: Arc<Ast>) -> Self {
        Property { ast, optional: false }
    }
    pub fn optional(ast: Arc<Ast>) -> Self {
        Property { ast, optional: true }
    }
}

#[derive(Debug, Clone)]
pub struct Struct {
    /// Declaration order is kept; keys are unique.
    pub properties: IndexMap<String, Property>,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub key: Arc<Ast>,
    pub value: Arc<Ast>,
}

/// Ordered, non-empty set of alternatives.
#[derive(Debug, Clone)]
pub struct Union {
    members: Vec<Arc<Ast>>,
}

impl Union {
    /// Panics on an empty member list.
    pub fn new(members: Vec<Arc<Ast>>) -> Self {
        assert!(!members.is_empty(), "a union needs at least one member");
        Union { members }
    }

    pub fn members(&self) -> &[Arc<Ast>] {
        &self.members
    }
}

/// A node produced on first use; lets a schema refer to itself.
#[derive(Clone)]
pub struct Suspended {
    thunk: Arc<dyn Fn() -> Arc<Ast> + Send + Sync>,
    resolved: Arc<OnceCell<Arc<Ast>>>,
}

impl Suspended {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Arc<Ast> + Send + Sync + 'static,
    {
        Suspended { thunk: Arc::new(thunk), resolved: Arc::new(OnceCell::new()) }
    }

    pub fn force(&self) -> &Arc<Ast> {
        self.resolved.get_or_init(|| (self.thunk)())
    }
}

impl fmt::Debug for Suspended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.resolved.get().is_some() { "resolved" } else { "unresolved" };
        write!(f, "Suspended({state})")
    }
}

#[derive(Debug, Clone)]
pub struct Refinement {
    pub from: Arc<Ast>,
    pub check: Leaf,
    /// When set the check runs before `from` on decode and after it on encode.
    pub reversed: bool,
}

#[derive(Debug, Clone)]
pub struct Transform {
    pub from: Arc<Ast>,
    pub to: Arc<Ast>,
    pub decode: Leaf,
    pub encode: Leaf,
}

// ————————————————————————————————————————————————————————————————————————————
// LEAF FUNCTIONS
// ————————————————————————————————————————————————————————————————————————————

type LeafFn = dyn Fn(Value, &ParseOptions, &Arc<Ast>) -> ParseResult + Send + Sync;

/// Author-supplied validating/mapping step. Receives the input, the options
/// of the running parse, and the node that owns it.
#[derive(Clone)]
pub struct Leaf(Arc<LeafFn>);

impl Leaf {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, &ParseOptions, &Arc<Ast>) -> ParseResult + Send + Sync + 'static,
    {
        Leaf(Arc::new(f))
    }

    /// A leaf that returns its input unchanged.
    pub fn identity() -> Self {
        Leaf::new(|input, _, _| ParseResult::success(input))
    }

    pub fn call(&self, input: Value, options: &ParseOptions, owner: &Arc<Ast>) -> ParseResult {
        (self.0)(input, options, owner)
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Leaf(..)")
    }
}

type DeclareDyn = dyn Fn(&[Interpreter]) -> Leaf + Send + Sync;

/// Builds a declaration's leaf from interpreters for its type parameters.
#[derive(Clone)]
pub struct DeclareFn(Arc<DeclareDyn>);

impl DeclareFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Interpreter]) -> Leaf + Send + Sync + 'static,
    {
        DeclareFn(Arc::new(f))
    }

    pub fn call(&self, type_parameters: &[Interpreter]) -> Leaf {
        (self.0)(type_parameters)
    }
}

impl fmt::Debug for DeclareFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeclareFn(..)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

macro_rules! keyword_node {
    ($static_name:ident, $fn_name:ident, $kw:expr) => {
        static $static_name: LazyStatic<Arc<Ast>> =
            LazyStatic::new(|| Ast::new(AstKind::Keyword($kw)));

        pub fn $fn_name() -> Arc<Ast> {
            $static_name.clone()
        }
    };
}

keyword_node!(UNKNOWN, unknown, Keyword::Unknown);
keyword_node!(ANY, any, Keyword::Any);
keyword_node!(NEVER, never, Keyword::Never);
keyword_node!(NULL, null, Keyword::Null);
keyword_node!(STRING, string, Keyword::String);
keyword_node!(NUMBER, number, Keyword::Number);
keyword_node!(BOOLEAN, boolean, Keyword::Boolean);
keyword_node!(OBJECT, object, Keyword::Object);

pub fn literal(value: impl Into<Literal>) -> Arc<Ast> {
    Ast::new(AstKind::Literal(value.into()))
}

pub fn tuple(elements: Vec<Element>, rest: Option<Arc<Ast>>) -> Arc<Ast> {
    Ast::new(AstKind::Tuple(Tuple { elements, rest }))
}

/// Variable-length homogeneous array.
pub fn array(item: Arc<Ast>) -> Arc<Ast> {
    tuple(Vec::new(), Some(item))
}

/// Later duplicates of a key replace the earlier property in place.
pub fn struct_<K, I>(properties: I) -> Arc<Ast>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Property)>,
{
    let properties = properties.into_iter().map(|(k, p)| (k.into(), p)).collect();
    Ast::new(AstKind::Struct(Struct { properties }))
}

pub fn record(key: Arc<Ast>, value: Arc<Ast>) -> Arc<Ast> {
    Ast::new(AstKind::Record(Record { key, value }))
}

/// A single member is returned as-is. Panics on zero members.
pub fn union(mut members: Vec<Arc<Ast>>) -> Arc<Ast> {
    if members.len() == 1 {
        return members.remove(0);
    }
    Ast::new(AstKind::Union(Union::new(members)))
}

pub fn lazy<F>(thunk: F) -> Arc<Ast>
where
    F: Fn() -> Arc<Ast> + Send + Sync + 'static,
{
    Ast::new(AstKind::Lazy(Suspended::new(thunk)))
}

pub fn refinement(from: Arc<Ast>, check: Leaf, annotations: Annotations) -> Arc<Ast> {
    Ast::with_annotations(
        AstKind::Refinement(Refinement { from, check, reversed: false }),
        annotations,
    )
}

pub fn refinement_with(
    from: Arc<Ast>,
    check: Leaf,
    reversed: bool,
    annotations: Annotations,
) -> Arc<Ast> {
    Ast::with_annotations(AstKind::Refinement(Refinement { from, check, reversed }), annotations)
}

/// Transform whose mapping functions may fail or suspend.
pub fn transform_result(from: Arc<Ast>, to: Arc<Ast>, decode: Leaf, encode: Leaf) -> Arc<Ast> {
    Ast::new(AstKind::Transform(Transform { from, to, decode, encode }))
}

/// Transform with infallible, synchronous mapping functions.
pub fn transform<D, E>(from: Arc<Ast>, to: Arc<Ast>, decode: D, encode: E) -> Arc<Ast>
where
    D: Fn(Value) -> Value + Send + Sync + 'static,
    E: Fn(Value) -> Value + Send + Sync + 'static,
{
    transform_result(
        from,
        to,
        Leaf::new(move |input, _, _| ParseResult::success(decode(input))),
        Leaf::new(move |input, _, _| ParseResult::success(encode(input))),
    )
}

/// New declaration kind with a fresh id.
pub fn declare(
    type_parameters: Vec<Arc<Ast>>,
    decode: DeclareFn,
    encode: DeclareFn,
    annotations: Annotations,
) -> Arc<Ast> {
    declare_with_id(DeclarationId::new(), type_parameters, decode, encode, annotations)
}

pub fn declare_with_id(
    id: DeclarationId,
    type_parameters: Vec<Arc<Ast>>,
    decode: DeclareFn,
    encode: DeclareFn,
    annotations: Annotations,
) -> Arc<Ast> {
    Ast::with_annotations(
        AstKind::Declaration(Declaration { id, type_parameters, decode, encode }),
        annotations,
    )
}

/// Copy of `ast` with `annotations` layered over its own.
pub fn annotate(ast: &Arc<Ast>, annotations: Annotations) -> Arc<Ast> {
    Arc::new(Ast {
        kind: ast.kind.clone(),
        annotations: ast.annotations.merge(&annotations),
    })
}

// Helper: prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn numeric_literal_matches_by_value() {
        let one = Literal::from(1i64);
        assert!(one.matches(&json!(1)));
        assert!(one.matches(&json!(1.0)));
        assert!(!one.matches(&json!("1")));
        assert_eq!(one.to_value(), json!(1));
        assert_eq!(Literal::from(1.5).to_value(), json!(1.5));
    }

    #[test]
    fn declaration_ids_are_distinct() {
        let a = DeclarationId::new();
        let b = DeclarationId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn construction_does_not_invoke_declaration_functions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let decode = DeclareFn::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Leaf::identity()
        });
        let _ast = declare(vec![string()], decode.clone(), decode, Annotations::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_member_union_collapses() {
        let s = string();
        let u = union(vec![s.clone()]);
        assert!(Arc::ptr_eq(&s, &u));
    }

    #[test]
    #[should_panic(expected = "at least one member")]
    fn empty_union_panics() {
        let _ = union(Vec::new());
    }

    #[test]
    fn struct_keeps_declaration_order() {
        let ast = struct_([
            ("b", Property::required(string())),
            ("a", Property::optional(number())),
        ]);
        let AstKind::Struct(s) = &ast.kind else { panic!("expected struct") };
        let keys: Vec<&str> = s.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn lazy_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let ast = lazy(move || {
            c.fetch_add(1, Ordering::SeqCst);
            string()
        });
        let AstKind::Lazy(s) = &ast.kind else { panic!("expected lazy") };
        s.force();
        s.force();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
